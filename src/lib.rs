//! Weighted MinHash sketches of sparse weighted feature bags.
//!
//! A [`WeightedMinHasher`] draws its sampling parameters once from a seed and then maps
//! any bag of `(value, index)` features to `sample_size` packed words. The share of equal
//! words between two sketches estimates the weighted Jaccard similarity of the bags.
//!
//! ```
//! use wmh::WeightedMinHasher;
//!
//! let hasher = WeightedMinHasher::new(1000, 128, 7)?;
//! let a = hasher.hash(&[1.0, 2.5, 0.3], &[4, 17, 512])?;
//! let b = hasher.hash(&[1.0, 2.5, 0.3], &[4, 17, 512])?;
//! assert_eq!(a, b);
//! assert_eq!(a.len(), 128);
//! # Ok::<(), wmh::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod fastlog;
pub mod hasher;
pub mod packing;
pub mod param;
pub mod weighted_min_hash;

pub use config::HasherConfig;
pub use error::{Error, InputFault, Result};
pub use hasher::Hasher;
pub use packing::Packing;
pub use param::{Params, BETA_SCALE};
pub use weighted_min_hash::{SparseBag, WeightedMinHasher};
