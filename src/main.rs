// src/main.rs
use clap::Parser;
use ethash_miner_rs::chain::{ChainReader, LocalChain};
use ethash_miner_rs::cli::{self, Action, RunOptions};
use ethash_miner_rs::oracle::ethash::{Ethash, EthashParams};
use ethash_miner_rs::types::{Header, SearchOutcome, parse_h256, parse_nonce};
use ethash_miner_rs::utils::{init_logging, init_verbose_logging};
use ethash_miner_rs::{Config, MinerError, PowEngine, StatsReporter, config};
use ethereum_types::{H256, U256};
use sha3::{Digest, Keccak256};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main entry point for the Ethash miner
///
/// # Returns
/// - `Ok(())` on successful execution
/// - `Err(MinerError)` if any operation fails
///
/// # Flow
/// 1. Parses command line arguments
/// 2. Delegates to appropriate subcommand handler
/// 3. Propagates any errors upward
fn main() -> Result<(), MinerError> {
    let cli = cli::Commands::parse();

    match cli.action {
        Action::Mine(opts) => mine(opts),
        Action::Verify(opts) => verify(opts),
        Action::Dag(opts) => generate_dag(opts),
        Action::Bench(opts) => run_benchmark(opts),
        Action::Config(opts) => generate_config(opts),
    }
}

/// Mines blocks on an in-process chain, verifying each one
///
/// # Operations
/// 1. Initializes logging
/// 2. Loads configuration and applies CLI overrides
/// 3. Sets up statistics reporting
/// 4. Searches, seals and verifies `opts.blocks` blocks
/// 5. Releases the DAG and cache
fn mine(opts: cli::MineOptions) -> Result<(), MinerError> {
    init_logging();

    let mut config = load_config(&opts.run)?;
    if opts.no_turbo {
        config.miner.turbo = false;
    }

    let chain = Arc::new(LocalChain::new(opts.height));
    let engine = create_engine(&config, chain.clone())?;

    // Statistics reporting, stopped when the sender drops
    let reporter = StatsReporter::new(engine.hash_rate_meter(), config.stats.report_interval());
    let _stats = reporter.start_reporting();

    let mut parent = H256::zero();
    for _ in 0..opts.blocks {
        let number = chain.current_height() + 1;
        let mut header = Header {
            number,
            difficulty: opts.difficulty,
            hash_no_nonce: header_hash(&parent, number),
            ..Header::default()
        };

        let cancel = match opts.timeout {
            Some(secs) => crossbeam_channel::after(Duration::from_secs(secs)),
            None => crossbeam_channel::never(),
        };
        let start = Instant::now();
        match engine.search(&header, &cancel)? {
            SearchOutcome::Found(solution) => header.seal(&solution),
            SearchOutcome::Cancelled => {
                log::warn!("Gave up on block {} after {:?}", number, start.elapsed());
                break;
            }
        }

        let valid = engine.verify(&header)?;
        log::info!(
            "Block {} sealed in {:?}: nonce 0x{} mix {:?} valid: {}",
            number,
            start.elapsed(),
            hex::encode(header.nonce.to_be_bytes()),
            header.mix_digest,
            valid
        );
        if !valid {
            return Err(MinerError::InputError(format!(
                "mined block {} failed verification",
                number
            )));
        }

        parent = header_hash(&header.mix_digest, header.nonce);
        chain.advance();
    }

    engine.stop();
    Ok(())
}

/// Verifies one proof given on the command line
///
/// Prints `valid` or `invalid`; an invalid proof exits with status 1.
fn verify(opts: cli::VerifyOptions) -> Result<(), MinerError> {
    init_logging();

    let config = load_config(&opts.run)?;
    let chain = Arc::new(LocalChain::new(opts.height));
    let engine = create_engine(&config, chain)?;

    let nonce_bytes = hex::decode(opts.nonce.trim_start_matches("0x"))?;
    let seed_hash = match &opts.seed {
        Some(seed) => parse_h256(seed)?,
        None => engine.seed_hash(opts.height),
    };
    let header = Header {
        number: opts.height,
        difficulty: opts.difficulty,
        hash_no_nonce: parse_h256(&opts.header)?,
        seed_hash,
        mix_digest: parse_h256(&opts.mix)?,
        nonce: parse_nonce(&nonce_bytes)?,
    };

    let valid = engine.verify(&header)?;
    engine.stop();

    println!("{}", if valid { "valid" } else { "invalid" });
    if !valid {
        std::process::exit(1);
    }
    Ok(())
}

/// Loads or generates the DAG for a height and leaves it on disk
fn generate_dag(opts: cli::DagOptions) -> Result<(), MinerError> {
    init_logging();

    let config = load_config(&opts.run)?;
    let chain = Arc::new(LocalChain::new(opts.height));
    let engine = create_engine(&config, chain)?;

    let start = Instant::now();
    let dataset = engine.ensure_dataset()?;
    log::info!(
        "DAG for epoch {} ({} bytes) ready in {:?} at {}",
        dataset.epoch(),
        dataset.bytes().len(),
        start.elapsed(),
        config.dag.path.display()
    );
    Ok(())
}

/// Runs the hash-rate benchmark
///
/// # Operations
/// 1. Initializes verbose logging
/// 2. Loads or generates the DAG
/// 3. Searches an unreachable target until the deadline channel fires
/// 4. Reports total hashes and the average rate
fn run_benchmark(opts: cli::BenchOptions) -> Result<(), MinerError> {
    init_verbose_logging();

    let config = load_config(&opts.run)?;
    let chain = Arc::new(LocalChain::new(opts.height));
    let engine = create_engine(&config, chain)?;
    engine.ensure_dataset()?;

    log::info!(
        "Starting {} benchmark for {} seconds",
        config.sizing,
        opts.duration
    );
    log::logger().flush();

    let header = Header {
        number: opts.height,
        difficulty: U256::MAX,
        hash_no_nonce: header_hash(&H256::zero(), opts.height),
        ..Header::default()
    };
    let meter = engine.hash_rate_meter();
    let deadline = crossbeam_channel::after(Duration::from_secs(opts.duration));

    let start = Instant::now();
    let outcome = engine.search(&header, &deadline)?;
    let elapsed = start.elapsed().as_secs_f64();

    // Report final results
    log::info!("Benchmark results:");
    log::info!("Total hashes: {}", meter.total());
    log::info!("Average hashrate: {:.2} H/s", meter.total() as f64 / elapsed);
    if let SearchOutcome::Found(solution) = outcome {
        log::info!("Hit the target by luck at nonce {}", solution.nonce);
    }
    log::logger().flush();

    engine.stop();
    Ok(())
}

/// Generates configuration template file
fn generate_config(opts: cli::ConfigOptions) -> Result<(), MinerError> {
    let template = config::generate_template();
    std::fs::write(&opts.output, template)?;
    println!("Wrote {}", opts.output.display());
    Ok(())
}

/// Loads the configuration file (if any) and applies CLI overrides
fn load_config(opts: &RunOptions) -> Result<Config, MinerError> {
    let mut config = match &opts.config {
        Some(path) => config::load(path)?,
        None => Config::default(),
    };
    if let Some(sizing) = opts.sizing {
        config.sizing = sizing;
    }
    if let Some(path) = &opts.dag_path {
        config.dag.path = path.clone();
    }

    let threads = opts.threads.unwrap_or_else(num_cpus::get);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .map_err(|e| MinerError::ConfigError(format!("Thread pool setup failed: {}", e)))?;
    log::debug!("Using {} threads for DAG generation", threads);

    Ok(config)
}

/// Creates an engine with the Ethash oracle sized by the config
fn create_engine(config: &Config, chain: Arc<LocalChain>) -> Result<PowEngine, MinerError> {
    let oracle = Arc::new(Ethash::new(EthashParams::from(config.sizing)));
    PowEngine::new(oracle, chain, config)
}

/// Deterministic stand-in for a header hash on the local chain
fn header_hash(parent: &H256, number: u64) -> H256 {
    let digest = Keccak256::new()
        .chain_update(parent.as_bytes())
        .chain_update(number.to_be_bytes())
        .finalize();
    H256::from_slice(&digest)
}
