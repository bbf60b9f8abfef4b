//! Weighted MinHash by Ioffe's consistent weighted sampling.
//!
//! For every hash function `s` and active feature `j` with weight `v`:
//!
//! ```text
//! t    = floor(ln v / r[s][j] + beta[s][j])
//! ln_y = (t - beta[s][j]) * r[s][j]
//! ln_a = ln c[s][j] - ln_y - r[s][j]
//! ```
//!
//! and the feature with the smallest `ln_a` is selected. Working with `ln a` instead of
//! `a` keeps the comparison finite for any weight. The probability that two bags select
//! the same `(k, t)` for a hash function equals their weighted Jaccard similarity.
//!
//! - Ioffe (2010). "Improved consistent sampling, weighted minhash and L1 sketching."

use rayon::prelude::*;
use tracing::{debug, trace, warn};

use crate::error::{Error, InputFault, Result};
use crate::fastlog;
use crate::hasher::Hasher;
use crate::packing::{Packing, DEFAULT_BITNESS};
use crate::param::{Params, BETA_SCALE};

/// A sparse weighted bag of features, as parallel `values` and `indices`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseBag {
    pub values: Vec<f32>,
    pub indices: Vec<usize>,
}

impl SparseBag {
    pub fn new(values: Vec<f32>, indices: Vec<usize>) -> Self {
        SparseBag { values, indices }
    }
}

/// Computes Weighted MinHash sketches over a fixed feature space.
///
/// The parameter tables are drawn once in [`WeightedMinHasher::new`] and only read
/// afterwards, so one hasher can serve any number of threads by reference.
#[derive(Debug, Clone)]
pub struct WeightedMinHasher {
    params: Params,
    bitness: u32,
}

impl WeightedMinHasher {
    /// `dim` is the bag size, `sample_size` the sketch length and `seed` fixes every
    /// random draw.
    pub fn new(dim: usize, sample_size: usize, seed: u64) -> Result<Self> {
        let hasher = WeightedMinHasher {
            params: Params::generate(dim, sample_size, seed)?,
            bitness: DEFAULT_BITNESS,
        };
        hasher.check_index_capacity();
        Ok(hasher)
    }

    pub fn dim(&self) -> usize {
        self.params.dim()
    }

    pub fn sample_size(&self) -> usize {
        self.params.sample_size()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn bitness(&self) -> u32 {
        self.bitness
    }

    /// Sets the word size. Only 16, 32 and 64 can be hashed with; any other value makes
    /// [`WeightedMinHasher::hash`] fail with [`Error::UnsupportedConfiguration`].
    pub fn set_bitness(&mut self, bits: u32) {
        self.bitness = bits;
        self.check_index_capacity();
    }

    pub fn packing(&self) -> Result<Packing> {
        Packing::try_from(self.bitness)
    }

    fn check_index_capacity(&self) {
        if let Ok(packing) = self.packing() {
            if self.dim() as u64 > packing.index_capacity() {
                warn!(
                    dim = self.dim(),
                    bitness = self.bitness,
                    "feature indices do not fit the {} index field and will be truncated",
                    packing
                );
            }
        }
    }

    /// Calculates the Weighted MinHash of a bag given as parallel `values` and `indices`.
    ///
    /// Returns exactly `sample_size` words. Zero values carry no weight and are
    /// skipped; a bag without any nonzero value is rejected with [`Error::EmptyInput`].
    pub fn hash(&self, values: &[f32], indices: &[usize]) -> Result<Vec<u64>> {
        let packing = self.packing()?;
        if let Err(err) = self.validate(values, indices) {
            debug!(%err, "rejecting vector");
            return Err(err);
        }
        let active = values.iter().filter(|&&v| v > 0.0).count();
        if active == 0 {
            debug!(len = values.len(), "rejecting vector without active features");
            return Err(Error::EmptyInput);
        }
        trace!(active, %packing, "hashing vector");

        let vlogs: Vec<f32> = values.iter().map(|&v| fastlog::ln(v)).collect();
        let hashes = (0..self.sample_size())
            .map(|s| {
                let (k, t) = self.sample(s, values, &vlogs, indices);
                packing.pack(k, t as i64)
            })
            .collect();
        Ok(hashes)
    }

    /// Hashes many bags in parallel. Each sketch equals the one [`WeightedMinHasher::hash`]
    /// returns for the same bag. On failure the error of the lowest failing bag is
    /// returned, wrapped in [`Error::InBag`].
    pub fn hash_batch(&self, bags: &[SparseBag]) -> Result<Vec<Vec<u64>>> {
        let results: Vec<Result<Vec<u64>>> = bags
            .par_iter()
            .enumerate()
            .map(|(bag, b)| {
                self.hash(&b.values, &b.indices).map_err(|source| Error::InBag {
                    bag,
                    source: Box::new(source),
                })
            })
            .collect();
        results.into_iter().collect()
    }

    fn validate(&self, values: &[f32], indices: &[usize]) -> Result<()> {
        if values.len() != indices.len() {
            return Err(Error::invalid(
                values.len().min(indices.len()),
                InputFault::LengthMismatch {
                    values: values.len(),
                    indices: indices.len(),
                },
            ));
        }
        for (i, &v) in values.iter().enumerate() {
            check_value(i, v)?;
        }
        let dim = self.dim();
        for (i, &index) in indices.iter().enumerate() {
            if index >= dim {
                return Err(Error::invalid(i, InputFault::IndexOutOfRange { index, dim }));
            }
        }
        Ok(())
    }

    // ties keep the first feature seen
    fn sample(&self, s: usize, values: &[f32], vlogs: &[f32], indices: &[usize]) -> (usize, f32) {
        let rs = self.params.rs(s);
        let ln_cs = self.params.ln_cs(s);
        let betas = self.params.betas(s);

        let mut min_ln_a = f32::INFINITY;
        let mut k = 0;
        let mut min_t = 0.0;
        for ((&value, &vlog), &j) in values.iter().zip(vlogs).zip(indices) {
            if value == 0.0 {
                continue;
            }
            let r = rs[j];
            let beta = betas[j] as f32 / BETA_SCALE;
            let t = (vlog / r + beta).floor();
            let ln_y = (t - beta) * r;
            let ln_a = ln_cs[j] - ln_y - r;
            if ln_a < min_ln_a {
                min_ln_a = ln_a;
                k = j;
                min_t = t;
            }
        }
        (k, min_t)
    }
}

fn check_value(position: usize, v: f32) -> Result<()> {
    if v.is_nan() {
        return Err(Error::invalid(position, InputFault::NotANumber));
    }
    if v < 0.0 {
        return Err(Error::invalid(position, InputFault::NegativeValue(v)));
    }
    if v.is_infinite() {
        return Err(Error::invalid(position, InputFault::NotFinite(v)));
    }
    Ok(())
}

impl Hasher for WeightedMinHasher {
    fn sample_size(&self) -> usize {
        WeightedMinHasher::sample_size(self)
    }

    fn hash(&self, weights: &[f32]) -> Result<Vec<u64>> {
        let dim = self.dim();
        if weights.len() > dim {
            return Err(Error::invalid(
                dim,
                InputFault::IndexOutOfRange { index: dim, dim },
            ));
        }
        let mut values = Vec::new();
        let mut indices = Vec::new();
        for (i, &w) in weights.iter().enumerate() {
            check_value(i, w)?;
            if w > 0.0 {
                values.push(w);
                indices.push(i);
            }
        }
        WeightedMinHasher::hash(self, &values, &indices)
    }

    fn hash_sparse(&self, weights: &[f32], indices: &[usize]) -> Result<Vec<u64>> {
        WeightedMinHasher::hash(self, weights, indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_and_sparse_agree() {
        let hasher = WeightedMinHasher::new(8, 16, 5).unwrap();
        let h: &dyn Hasher = &hasher;
        assert_eq!(
            h.hash(&[0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap(),
            h.hash_sparse(&[0.5], &[0]).unwrap()
        );
        assert_eq!(
            h.hash(&[0.0, 0.5, 0.0, 0.4, 0.0, 0.3, 0.0, 0.2]).unwrap(),
            h.hash_sparse(&[0.5, 0.4, 0.3, 0.2], &[1, 3, 5, 7]).unwrap()
        );
        assert_eq!(
            h.hash(&[0.0, 0.5, 0.0, 0.4]).unwrap(),
            h.hash_sparse(&[0.5, 0.4], &[1, 3]).unwrap()
        );
        assert_eq!(h.sample_size(), 16);
    }

    #[test]
    fn repeated_calls_match() {
        let hasher = WeightedMinHasher::new(4, 2, 1).unwrap();
        let first = hasher.hash(&[1.0, 2.0], &[0, 2]).unwrap();
        let second = hasher.hash(&[1.0, 2.0], &[0, 2]).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn unit_weight_selects_its_index() {
        // ln 1 = 0 and beta < 1, so t is 0 for every hash function.
        let mut hasher = WeightedMinHasher::new(10, 32, 9).unwrap();
        assert_eq!(hasher.hash(&[1.0], &[6]).unwrap(), vec![6; 32]);
        hasher.set_bitness(16);
        assert_eq!(hasher.hash(&[1.0], &[6]).unwrap(), vec![6; 32]);
    }

    #[test]
    fn selected_index_is_active() {
        let hasher = WeightedMinHasher::new(20, 64, 11).unwrap();
        let indices = [2, 5, 11, 19];
        let packing = hasher.packing().unwrap();
        for word in hasher.hash(&[0.3, 4.0, 1.5, 0.0], &indices).unwrap() {
            let (k, _) = packing.unpack(word);
            assert!([2, 5, 11].contains(&(k as usize)), "k = {}", k);
        }
    }

    #[test]
    fn input_order_does_not_matter_without_ties() {
        let hasher = WeightedMinHasher::new(6, 32, 2).unwrap();
        assert_eq!(
            hasher.hash(&[1.0, 2.0, 3.0], &[0, 3, 5]).unwrap(),
            hasher.hash(&[3.0, 1.0, 2.0], &[5, 0, 3]).unwrap()
        );
    }

    #[test]
    fn bitness_changes_layout() {
        let mut hasher = WeightedMinHasher::new(100, 8, 4).unwrap();
        let wide = hasher.hash(&[3.0, 40.0], &[17, 90]).unwrap();
        hasher.set_bitness(32);
        let narrow = hasher.hash(&[3.0, 40.0], &[17, 90]).unwrap();
        for (w, n) in wide.iter().zip(&narrow) {
            let (wk, wt) = Packing::Bits64.unpack_signed(*w);
            let (nk, nt) = Packing::Bits32.unpack_signed(*n);
            assert_eq!(wk, nk);
            assert_eq!(wt, nt);
            assert!(*n < 1 << 32);
        }
    }

    #[test]
    fn rejects_bad_input() {
        let hasher = WeightedMinHasher::new(4, 2, 1).unwrap();
        let err = hasher.hash(&[1.0, -2.0], &[0, 1]).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidInput {
                position: 1,
                fault: InputFault::NegativeValue(v)
            } if v == -2.0
        ));
        let err = hasher.hash(&[1.0, 2.0, 3.0], &[0, 1, 4]).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidInput {
                position: 2,
                fault: InputFault::IndexOutOfRange { index: 4, dim: 4 }
            }
        ));
        let err = hasher.hash(&[f32::NAN], &[0]).unwrap_err();
        assert_eq!(err.position(), Some(0));
        let err = hasher.hash(&[1.0, 2.0], &[0]).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidInput {
                position: 1,
                fault: InputFault::LengthMismatch { values: 2, indices: 1 }
            }
        ));
    }

    #[test]
    fn rejects_empty_bag() {
        let hasher = WeightedMinHasher::new(4, 2, 1).unwrap();
        assert!(matches!(hasher.hash(&[], &[]), Err(Error::EmptyInput)));
        assert!(matches!(
            hasher.hash(&[0.0, 0.0], &[1, 3]),
            Err(Error::EmptyInput)
        ));
        let h: &dyn Hasher = &hasher;
        assert!(matches!(h.hash(&[0.0; 4]), Err(Error::EmptyInput)));
    }

    #[test]
    fn unsupported_bitness() {
        let mut hasher = WeightedMinHasher::new(4, 2, 1).unwrap();
        hasher.set_bitness(24);
        assert_eq!(hasher.bitness(), 24);
        assert!(matches!(
            hasher.hash(&[1.0], &[0]),
            Err(Error::UnsupportedConfiguration(_))
        ));
    }

    #[test]
    fn batch_matches_single_calls() {
        let hasher = WeightedMinHasher::new(32, 16, 77).unwrap();
        let bags: Vec<SparseBag> = (0..20)
            .map(|i| SparseBag::new(vec![1.0 + i as f32, 0.5], vec![i, 31 - i]))
            .collect();
        let batch = hasher.hash_batch(&bags).unwrap();
        for (bag, sketch) in bags.iter().zip(&batch) {
            assert_eq!(&hasher.hash(&bag.values, &bag.indices).unwrap(), sketch);
        }

        let mut bad = bags;
        bad[7].indices[0] = 40;
        let err = hasher.hash_batch(&bad).unwrap_err();
        assert_eq!(err.bag(), Some(7));
        assert_eq!(err.position(), Some(0));
    }

    #[test]
    fn batch_reports_lowest_failing_bag() {
        let hasher = WeightedMinHasher::new(16, 4, 3).unwrap();
        // bag 0 is slow to validate and fails on its last index; later bags fail at once
        let n = 200_000;
        let mut first = SparseBag::new(vec![1.0; n], vec![5; n]);
        first.indices[n - 1] = 16;
        let mut bags = vec![first];
        bags.extend((0..64).map(|_| SparseBag::new(vec![-1.0], vec![0])));

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(4)
            .build()
            .unwrap();
        for _ in 0..10 {
            let err = pool.install(|| hasher.hash_batch(&bags)).unwrap_err();
            assert_eq!(err.bag(), Some(0));
            match err {
                Error::InBag { source, .. } => assert!(matches!(
                    *source,
                    Error::InvalidInput {
                        position,
                        fault: InputFault::IndexOutOfRange { index: 16, dim: 16 }
                    } if position == n - 1
                )),
                other => panic!("unexpected error: {}", other),
            }
        }
    }

    #[test]
    fn rejects_infinite_weight() {
        let hasher = WeightedMinHasher::new(4, 3, 1).unwrap();
        let err = hasher.hash(&[1.0, f32::INFINITY], &[0, 2]).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidInput {
                position: 1,
                fault: InputFault::NotFinite(v)
            } if v.is_infinite()
        ));
        let err = hasher.hash(&[f32::NEG_INFINITY], &[0]).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidInput {
                position: 0,
                fault: InputFault::NegativeValue(_)
            }
        ));
        let h: &dyn Hasher = &hasher;
        let err = h.hash(&[0.0, 0.0, f32::INFINITY]).unwrap_err();
        assert_eq!(err.position(), Some(2));
        assert!(hasher.hash(&[f32::MAX], &[3]).is_ok());
    }
}
