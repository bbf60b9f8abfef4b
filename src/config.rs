use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::packing::{Packing, DEFAULT_BITNESS};
use crate::weighted_min_hash::WeightedMinHasher;

fn default_bitness() -> u32 {
    DEFAULT_BITNESS
}

/// Everything needed to rebuild the same hasher in another process.
///
/// ```toml
/// dim = 1000
/// sample_size = 128
/// seed = 7
/// bitness = 32
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HasherConfig {
    pub dim: usize,
    pub sample_size: usize,
    pub seed: u64,
    #[serde(default = "default_bitness")]
    pub bitness: u32,
}

impl HasherConfig {
    pub fn new(dim: usize, sample_size: usize, seed: u64) -> Self {
        HasherConfig {
            dim,
            sample_size,
            seed,
            bitness: DEFAULT_BITNESS,
        }
    }

    pub fn with_bitness(mut self, bitness: u32) -> Self {
        self.bitness = bitness;
        self
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::UnsupportedConfiguration(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::UnsupportedConfiguration(e.to_string()))
    }

    /// Checks the configuration and draws the hasher's parameter tables.
    pub fn build(&self) -> Result<WeightedMinHasher> {
        Packing::try_from(self.bitness)?;
        let mut hasher = WeightedMinHasher::new(self.dim, self.sample_size, self.seed)?;
        hasher.set_bitness(self.bitness);
        Ok(hasher)
    }
}
