// src/types.rs
use crate::utils::error::MinerError;
use clap::ValueEnum;
use ethereum_types::{H256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which Ethash size table to use
///
/// Mainnet sizes need a gigabyte of DAG; the dev profile keeps everything
/// in kilobytes for local runs and tests.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizingProfile {
    /// Real Ethash growth table (1 GiB dataset at epoch 0)
    #[default]
    #[value(name = "mainnet")]
    Mainnet,

    /// Tiny cache and dataset, same algorithm
    #[value(name = "dev")]
    Dev,
}

impl fmt::Display for SizingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizingProfile::Mainnet => write!(f, "mainnet"),
            SizingProfile::Dev => write!(f, "dev"),
        }
    }
}

impl FromStr for SizingProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(SizingProfile::Mainnet),
            "dev" => Ok(SizingProfile::Dev),
            _ => Err(format!("Unknown sizing profile: {}", s)),
        }
    }
}

/// What the miner and verifier need to know about a block
pub trait PowBlock {
    /// Header hash computed without the nonce and mix digest
    fn hash_no_nonce(&self) -> H256;
    /// Block difficulty
    fn difficulty(&self) -> U256;
    /// Block height
    fn number(&self) -> u64;
    /// Seed hash the block claims for its epoch
    fn seed_hash(&self) -> H256;
    /// Mix digest sealed into the block
    fn mix_digest(&self) -> H256;
    /// Nonce sealed into the block
    fn nonce(&self) -> u64;
}

/// Minimal block header carrying the proof-of-work fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    /// Block height
    pub number: u64,
    /// Block difficulty
    pub difficulty: U256,
    /// Header hash without nonce
    pub hash_no_nonce: H256,
    /// Seed hash for the block's epoch
    pub seed_hash: H256,
    /// Mix digest from the winning hash
    pub mix_digest: H256,
    /// Winning nonce
    pub nonce: u64,
}

impl Header {
    /// Copies a search result into the header
    pub fn seal(&mut self, solution: &Solution) {
        self.nonce = solution.nonce;
        self.mix_digest = solution.mix_digest;
        self.seed_hash = solution.seed_hash;
    }
}

impl PowBlock for Header {
    fn hash_no_nonce(&self) -> H256 {
        self.hash_no_nonce
    }

    fn difficulty(&self) -> U256 {
        self.difficulty
    }

    fn number(&self) -> u64 {
        self.number
    }

    fn seed_hash(&self) -> H256 {
        self.seed_hash
    }

    fn mix_digest(&self) -> H256 {
        self.mix_digest
    }

    fn nonce(&self) -> u64 {
        self.nonce
    }
}

/// A nonce that meets the target, with the values a block needs to seal it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Solution {
    /// Winning nonce
    pub nonce: u64,
    /// Mix digest produced alongside the winning result
    pub mix_digest: H256,
    /// Seed hash of the block's epoch
    pub seed_hash: H256,
}

/// Terminal state of a search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A nonce meeting the target was found
    Found(Solution),
    /// The cancel signal fired first
    Cancelled,
}

/// Computes the target `U256::MAX / difficulty`
///
/// # Errors
/// `InputError` for a zero difficulty.
pub fn target_for(difficulty: U256) -> Result<U256, MinerError> {
    if difficulty.is_zero() {
        return Err(MinerError::InputError("difficulty must be non-zero".into()));
    }
    Ok(U256::MAX / difficulty)
}

/// Decodes an 8-byte big-endian nonce
pub fn parse_nonce(bytes: &[u8]) -> Result<u64, MinerError> {
    let raw: [u8; 8] = bytes.try_into().map_err(|_| {
        MinerError::InputError(format!("nonce must be 8 bytes, got {}", bytes.len()))
    })?;
    Ok(u64::from_be_bytes(raw))
}

/// Parses a 32-byte hash from hex, with or without a `0x` prefix
pub fn parse_h256(s: &str) -> Result<H256, MinerError> {
    let bytes = hex::decode(s.trim_start_matches("0x"))?;
    if bytes.len() != 32 {
        return Err(MinerError::InputError(format!(
            "expected 32 bytes of hex, got {}",
            bytes.len()
        )));
    }
    Ok(H256::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_for_difficulty_one_is_max() {
        assert_eq!(target_for(U256::one()).unwrap(), U256::MAX);
        assert_eq!(target_for(U256::from(2)).unwrap(), U256::MAX / 2);
    }

    #[test]
    fn test_target_for_zero_difficulty() {
        assert!(matches!(
            target_for(U256::zero()),
            Err(MinerError::InputError(_))
        ));
    }

    #[test]
    fn test_parse_nonce() {
        assert_eq!(parse_nonce(&[0, 0, 0, 0, 0, 0, 1, 2]).unwrap(), 0x0102);
        assert!(matches!(parse_nonce(&[1, 2, 3]), Err(MinerError::InputError(_))));
        assert!(parse_nonce(&[0u8; 9]).is_err());
    }

    #[test]
    fn test_parse_h256() {
        let hex = "0x290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563";
        let h = parse_h256(hex).unwrap();
        assert_eq!(h.as_bytes()[0], 0x29);
        assert!(parse_h256("abcd").is_err());
        assert!(parse_h256("zz").is_err());
    }

    #[test]
    fn test_seal_copies_solution() {
        let mut header = Header::default();
        let solution = Solution {
            nonce: 7,
            mix_digest: H256::repeat_byte(1),
            seed_hash: H256::repeat_byte(2),
        };
        header.seal(&solution);
        assert_eq!(header.nonce(), 7);
        assert_eq!(header.mix_digest(), H256::repeat_byte(1));
        assert_eq!(header.seed_hash(), H256::repeat_byte(2));
    }

    #[test]
    fn test_sizing_profile_parse() {
        assert_eq!("DEV".parse::<SizingProfile>().unwrap(), SizingProfile::Dev);
        assert_eq!(SizingProfile::Mainnet.to_string(), "mainnet");
        assert!("huge".parse::<SizingProfile>().is_err());
    }
}
