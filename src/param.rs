use rand::distributions::Uniform;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Gamma};
use tracing::debug;

use crate::error::{Error, Result};
use crate::fastlog;

/// Fixed-point scale of the stored betas: a draw from `[0, 1)` is kept as
/// `(u * BETA_SCALE) as u16`, trading about 5 decimal digits of precision
/// for a quarter of the memory of an `f32` table.
pub const BETA_SCALE: f32 = 65536.0;

const GAMMA_SHAPE: f64 = 2.0;
const GAMMA_SCALE: f64 = 1.0;

/// Per-sample sampling parameters, one row per hash function and one column per feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    dim: usize,
    sample_size: usize,
    rs: Vec<f32>,
    ln_cs: Vec<f32>,
    betas: Vec<u16>,
}

impl Params {
    /// Draws all tables from a generator seeded with `seed`.
    ///
    /// The draw order is fixed: every `r` row by row, then every `c` (stored as `ln c`),
    /// then every beta. Equal seeds give bit-identical tables.
    pub fn generate(dim: usize, sample_size: usize, seed: u64) -> Result<Self> {
        if dim == 0 {
            return Err(Error::UnsupportedConfiguration(
                "dim must be positive".to_string(),
            ));
        }
        if sample_size == 0 {
            return Err(Error::UnsupportedConfiguration(
                "sample size must be positive".to_string(),
            ));
        }
        let cells = dim.checked_mul(sample_size).ok_or_else(|| {
            Error::UnsupportedConfiguration(format!(
                "table of {} x {} cells does not fit in memory",
                sample_size, dim
            ))
        })?;
        debug!(dim, sample_size, seed, "generating weighted minhash parameters");

        let mut rng = StdRng::seed_from_u64(seed);
        let gamma = Gamma::new(GAMMA_SHAPE, GAMMA_SCALE)?;

        let rs: Vec<f32> = (0..cells).map(|_| gamma.sample(&mut rng) as f32).collect();
        let ln_cs: Vec<f32> = (0..cells)
            .map(|_| fastlog::ln(gamma.sample(&mut rng) as f32))
            .collect();
        let uniform = Uniform::new(0.0f64, 1.0);
        let betas: Vec<u16> = (0..cells)
            .map(|_| (uniform.sample(&mut rng) * BETA_SCALE as f64) as u16)
            .collect();

        Ok(Params {
            dim,
            sample_size,
            rs,
            ln_cs,
            betas,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    fn row(&self, sample: usize) -> std::ops::Range<usize> {
        let start = sample * self.dim;
        start..start + self.dim
    }

    pub fn rs(&self, sample: usize) -> &[f32] {
        &self.rs[self.row(sample)]
    }

    pub fn ln_cs(&self, sample: usize) -> &[f32] {
        &self.ln_cs[self.row(sample)]
    }

    /// Quantized betas of one sample; divide by [`BETA_SCALE`] to get the draw back.
    pub fn betas(&self, sample: usize) -> &[u16] {
        &self.betas[self.row(sample)]
    }
}
