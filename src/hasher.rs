use crate::error::Result;

/// A locality-sensitive hasher over weighted feature vectors.
pub trait Hasher {
    /// Number of words in every sketch.
    fn sample_size(&self) -> usize;
    /// Hashes a dense vector; every nonzero weight is an active feature at its position.
    fn hash(&self, weights: &[f32]) -> Result<Vec<u64>>;
    /// Hashes a sparse vector given as parallel `weights` and `indices`.
    fn hash_sparse(&self, weights: &[f32], indices: &[usize]) -> Result<Vec<u64>>;
}
