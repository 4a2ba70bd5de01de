// src/oracle/ethash.rs
//! Ethash proof-of-work
//!
//! Implements the Ethash cache, dataset and hashimoto functions behind the
//! [`HashOracle`] interface. Sizes follow the Ethash growth table, rounded
//! down so the row count is prime; the growth constants are configurable so
//! the same algorithm runs on kilobyte-sized buffers for development.

use crate::epoch::epoch_number;
use crate::oracle::{HashOracle, SizingParams};
use crate::types::SizingProfile;
use byteorder::{ByteOrder, LittleEndian};
use ethereum_types::H256;
use rayon::prelude::*;
use sha3::{Digest, Keccak256, Keccak512};

const MIX_BYTES: usize = 128;
const HASH_BYTES: usize = 64;
const HASH_WORDS: usize = HASH_BYTES / 4;
const MIX_WORDS: usize = MIX_BYTES / 4;
const DATASET_PARENTS: u32 = 256;
const CACHE_ROUNDS: usize = 3;
const ACCESSES: usize = 64;
const FNV_PRIME: u32 = 0x0100_0193;

/// Growth table for cache and dataset sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthashParams {
    /// Cache bytes at epoch 0
    pub cache_bytes_init: u64,
    /// Cache bytes added per epoch
    pub cache_bytes_growth: u64,
    /// Dataset bytes at epoch 0
    pub dataset_bytes_init: u64,
    /// Dataset bytes added per epoch
    pub dataset_bytes_growth: u64,
}

impl EthashParams {
    /// The Ethereum size table: 16 MiB cache, 1 GiB dataset at epoch 0
    pub const fn mainnet() -> Self {
        Self {
            cache_bytes_init: 1 << 24,
            cache_bytes_growth: 1 << 17,
            dataset_bytes_init: 1 << 30,
            dataset_bytes_growth: 1 << 23,
        }
    }

    /// Kilobyte-sized table for local chains and tests
    pub const fn dev() -> Self {
        Self {
            cache_bytes_init: 1 << 10,
            cache_bytes_growth: 1 << 7,
            dataset_bytes_init: 1 << 15,
            dataset_bytes_growth: 1 << 10,
        }
    }
}

impl From<SizingProfile> for EthashParams {
    fn from(profile: SizingProfile) -> Self {
        match profile {
            SizingProfile::Mainnet => EthashParams::mainnet(),
            SizingProfile::Dev => EthashParams::dev(),
        }
    }
}

/// Ethash hash oracle
#[derive(Debug, Clone, Copy)]
pub struct Ethash {
    params: EthashParams,
}

impl Ethash {
    /// Creates an oracle with the given size table
    pub fn new(params: EthashParams) -> Self {
        Self { params }
    }

    /// Cache size in bytes for an epoch ordinal
    pub fn cache_size(&self, epoch_number: u64) -> usize {
        let mut sz = self.params.cache_bytes_init + self.params.cache_bytes_growth * epoch_number;
        sz -= HASH_BYTES as u64;
        while !is_prime(sz / HASH_BYTES as u64) {
            sz -= 2 * HASH_BYTES as u64;
        }
        sz as usize
    }

    /// Dataset size in bytes for an epoch ordinal
    pub fn dataset_size(&self, epoch_number: u64) -> usize {
        let mut sz =
            self.params.dataset_bytes_init + self.params.dataset_bytes_growth * epoch_number;
        sz -= MIX_BYTES as u64;
        while !is_prime(sz / MIX_BYTES as u64) {
            sz -= 2 * MIX_BYTES as u64;
        }
        sz as usize
    }
}

impl Default for Ethash {
    fn default() -> Self {
        Self::new(EthashParams::mainnet())
    }
}

impl HashOracle for Ethash {
    fn sizing_params(&self, epoch: u64) -> SizingParams {
        let number = epoch_number(epoch);
        SizingParams {
            epoch,
            cache_size: self.cache_size(number),
            dataset_size: self.dataset_size(number),
        }
    }

    fn build_cache(&self, _params: &SizingParams, seed: &H256, cache: &mut [u8]) {
        make_cache(cache, seed);
    }

    fn build_dataset(&self, _params: &SizingParams, cache: &[u8], dataset: &mut [u8]) {
        dataset
            .par_chunks_mut(HASH_BYTES)
            .enumerate()
            .for_each(|(i, item)| item.copy_from_slice(&calc_dataset_item(cache, i as u32)));
    }

    fn full_hash(
        &self,
        dataset: &[u8],
        params: &SizingParams,
        header: &H256,
        nonce: u64,
    ) -> (H256, H256) {
        let (mix, result) = hashimoto(header, nonce, params.dataset_size, |i| {
            let mut item = [0u8; HASH_BYTES];
            item.copy_from_slice(&dataset[i * HASH_BYTES..(i + 1) * HASH_BYTES]);
            item
        });
        (result, mix)
    }

    fn light_hash(&self, cache: &[u8], params: &SizingParams, header: &H256, nonce: u64) -> H256 {
        hashimoto_light(cache, params, header, nonce).1
    }

    fn light_hash_with_mix(
        &self,
        cache: &[u8],
        params: &SizingParams,
        header: &H256,
        nonce: u64,
    ) -> Option<(H256, H256)> {
        let (mix, result) = hashimoto_light(cache, params, header, nonce);
        Some((result, mix))
    }
}

/// Seed hash for an epoch ordinal: Keccak-256 applied `epoch_number` times
/// to 32 zero bytes
pub fn seed_hash(epoch_number: u64) -> H256 {
    let mut seed = [0u8; 32];
    for _ in 0..epoch_number {
        seed = keccak_256(&seed);
    }
    H256::from(seed)
}

fn keccak_512(data: &[u8]) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(&Keccak512::digest(data));
    out
}

fn keccak_256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Keccak256::digest(data));
    out
}

fn fnv(v1: u32, v2: u32) -> u32 {
    v1.wrapping_mul(FNV_PRIME) ^ v2
}

fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    let mut d = 2u64;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 1;
    }
    true
}

fn make_cache(cache: &mut [u8], seed: &H256) {
    let n = cache.len() / HASH_BYTES;

    cache[..HASH_BYTES].copy_from_slice(&keccak_512(seed.as_bytes()));
    for i in 1..n {
        let (prev, next) = cache.split_at_mut(i * HASH_BYTES);
        next[..HASH_BYTES].copy_from_slice(&keccak_512(&prev[(i - 1) * HASH_BYTES..]));
    }

    for _ in 0..CACHE_ROUNDS {
        for i in 0..n {
            let v = LittleEndian::read_u32(&cache[i * HASH_BYTES..]) as usize % n;
            let u = (i + n - 1) % n;
            let mut temp = [0u8; HASH_BYTES];
            for (k, t) in temp.iter_mut().enumerate() {
                *t = cache[u * HASH_BYTES + k] ^ cache[v * HASH_BYTES + k];
            }
            cache[i * HASH_BYTES..(i + 1) * HASH_BYTES].copy_from_slice(&keccak_512(&temp));
        }
    }
}

fn calc_dataset_item(cache: &[u8], i: u32) -> [u8; HASH_BYTES] {
    let n = (cache.len() / HASH_BYTES) as u32;
    let start = (i % n) as usize * HASH_BYTES;

    let mut mix = [0u8; HASH_BYTES];
    mix.copy_from_slice(&cache[start..start + HASH_BYTES]);
    let head = LittleEndian::read_u32(&mix) ^ i;
    LittleEndian::write_u32(&mut mix, head);
    let mix = keccak_512(&mix);

    let mut words = [0u32; HASH_WORDS];
    LittleEndian::read_u32_into(&mix, &mut words);
    for j in 0..DATASET_PARENTS {
        let parent = fnv(i ^ j, words[j as usize % HASH_WORDS]) % n;
        let offset = parent as usize * HASH_BYTES;
        for (k, w) in words.iter_mut().enumerate() {
            *w = fnv(*w, LittleEndian::read_u32(&cache[offset + k * 4..]));
        }
    }

    let mut bytes = [0u8; HASH_BYTES];
    LittleEndian::write_u32_into(&words, &mut bytes);
    keccak_512(&bytes)
}

fn hashimoto_light(cache: &[u8], params: &SizingParams, header: &H256, nonce: u64) -> (H256, H256) {
    hashimoto(header, nonce, params.dataset_size, |i| {
        calc_dataset_item(cache, i as u32)
    })
}

/// Main Ethash loop over a dataset lookup
///
/// # Returns
/// `(mix_digest, result)`
fn hashimoto<F>(header: &H256, nonce: u64, full_size: usize, lookup: F) -> (H256, H256)
where
    F: Fn(usize) -> [u8; HASH_BYTES],
{
    let rows = (full_size / MIX_BYTES) as u32;

    let mut seed = [0u8; 40];
    seed[..32].copy_from_slice(header.as_bytes());
    seed[32..].copy_from_slice(&nonce.to_le_bytes());
    let seed = keccak_512(&seed);
    let seed_head = LittleEndian::read_u32(&seed);

    let mut mix = [0u32; MIX_WORDS];
    for (i, w) in mix.iter_mut().enumerate() {
        *w = LittleEndian::read_u32(&seed[(i % HASH_WORDS) * 4..]);
    }

    let mut temp = [0u32; MIX_WORDS];
    for i in 0..ACCESSES {
        let parent = fnv(i as u32 ^ seed_head, mix[i % MIX_WORDS]) % rows;
        for k in 0..MIX_BYTES / HASH_BYTES {
            let item = lookup(2 * parent as usize + k);
            LittleEndian::read_u32_into(&item, &mut temp[k * HASH_WORDS..(k + 1) * HASH_WORDS]);
        }
        for (m, t) in mix.iter_mut().zip(temp.iter()) {
            *m = fnv(*m, *t);
        }
    }

    let mut cmix = [0u8; 32];
    for (i, w) in mix.chunks_exact(4).enumerate() {
        let reduced = fnv(fnv(fnv(w[0], w[1]), w[2]), w[3]);
        LittleEndian::write_u32(&mut cmix[i * 4..], reduced);
    }

    let mut tail = [0u8; 96];
    tail[..64].copy_from_slice(&seed);
    tail[64..].copy_from_slice(&cmix);
    (H256::from(cmix), H256::from(keccak_256(&tail)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epoch::EPOCH_LENGTH;
    use hex_literal::hex;

    fn dev_pair(ethash: &Ethash, epoch: u64) -> (SizingParams, Vec<u8>, Vec<u8>) {
        let params = ethash.sizing_params(epoch);
        let mut cache = vec![0u8; params.cache_size];
        ethash.build_cache(&params, &seed_hash(epoch_number(epoch)), &mut cache);
        let mut dataset = vec![0u8; params.dataset_size];
        ethash.build_dataset(&params, &cache, &mut dataset);
        (params, cache, dataset)
    }

    #[test]
    fn test_mainnet_sizes() {
        let ethash = Ethash::default();
        assert_eq!(ethash.cache_size(0), 16_776_896);
        assert_eq!(ethash.dataset_size(0), 1_073_739_904);
        assert_eq!(ethash.cache_size(1), 16_907_456);
        assert_eq!(ethash.dataset_size(1), 1_082_130_304);
    }

    #[test]
    fn test_dev_sizes_follow_epoch_id() {
        let ethash = Ethash::new(EthashParams::dev());
        let p0 = ethash.sizing_params(0);
        let p1 = ethash.sizing_params(EPOCH_LENGTH);
        assert_eq!((p0.cache_size, p0.dataset_size), (832, 32_128));
        assert_eq!((p1.cache_size, p1.dataset_size), (1_088, 33_664));
        assert_eq!(p1.epoch, EPOCH_LENGTH);
    }

    #[test]
    fn test_seed_hash() {
        assert_eq!(seed_hash(0), H256::zero());
        assert_eq!(
            seed_hash(1),
            H256::from(hex!(
                "290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563"
            ))
        );
        assert_eq!(seed_hash(2), H256::from(keccak_256(seed_hash(1).as_bytes())));
    }

    #[test]
    fn test_full_and_light_hash_agree() {
        let ethash = Ethash::new(EthashParams::dev());
        let (params, cache, dataset) = dev_pair(&ethash, EPOCH_LENGTH);
        let header = H256::repeat_byte(0xab);

        for nonce in [0u64, 1, 0xdead_beef, u64::MAX] {
            let (full_result, full_mix) = ethash.full_hash(&dataset, &params, &header, nonce);
            let light_result = ethash.light_hash(&cache, &params, &header, nonce);
            assert_eq!(full_result, light_result);
            assert_eq!(
                ethash.light_hash_with_mix(&cache, &params, &header, nonce),
                Some((full_result, full_mix))
            );
        }
    }

    #[test]
    fn test_hashimoto_known_answer() {
        // go-ethereum's reference vector: 1 KiB cache and 32 KiB dataset from the zero seed
        let params = SizingParams {
            epoch: 0,
            cache_size: 1024,
            dataset_size: 32 * 1024,
        };
        let mut cache = vec![0u8; params.cache_size];
        make_cache(&mut cache, &H256::zero());
        let header = H256::from(hex!(
            "c9149cc0386e689d789a1c2f3d5d169a61a6218ed30e74414dc736e442ef3d1f"
        ));
        let mix = H256::from(hex!(
            "e4073cffaef931d37117cefd9afd27ea0f1cad6a981dd2605c4a1ac97c519800"
        ));
        let result = H256::from(hex!(
            "d3539235ee2e6f8db665c0a72169f55b7f6c605712330b778ec3944f0eb5a557"
        ));

        assert_eq!(hashimoto_light(&cache, &params, &header, 0), (mix, result));

        let ethash = Ethash::default();
        let mut dataset = vec![0u8; params.dataset_size];
        ethash.build_dataset(&params, &cache, &mut dataset);
        assert_eq!(ethash.full_hash(&dataset, &params, &header, 0), (result, mix));
    }

    #[test]
    fn test_hash_depends_on_nonce_and_header() {
        let ethash = Ethash::new(EthashParams::dev());
        let (params, _cache, dataset) = dev_pair(&ethash, 0);
        let a = ethash.full_hash(&dataset, &params, &H256::zero(), 1);
        let b = ethash.full_hash(&dataset, &params, &H256::zero(), 2);
        let c = ethash.full_hash(&dataset, &params, &H256::repeat_byte(1), 1);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_cache_depends_on_seed() {
        let ethash = Ethash::new(EthashParams::dev());
        let params = ethash.sizing_params(0);
        let mut a = vec![0u8; params.cache_size];
        let mut b = vec![0u8; params.cache_size];
        ethash.build_cache(&params, &seed_hash(0), &mut a);
        ethash.build_cache(&params, &seed_hash(1), &mut b);
        assert_ne!(a, b);
        assert!(a.iter().any(|&byte| byte != 0));
    }
}
