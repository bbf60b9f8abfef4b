use thiserror::Error;

/// What is wrong with one element of an input vector.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InputFault {
    #[error("negative value in the vector: {0}")]
    NegativeValue(f32),

    #[error("value is not a number")]
    NotANumber,

    #[error("value is not finite: {0}")]
    NotFinite(f32),

    #[error("index is out of range: {index} (dim = {dim})")]
    IndexOutOfRange { index: usize, dim: usize },

    #[error("values and indices differ in length: {values} != {indices}")]
    LengthMismatch { values: usize, indices: usize },
}

/// Errors returned by hasher construction and hashing.
///
/// Every variant aborts only the call that produced it; the hasher stays usable.
#[derive(Debug, Error)]
pub enum Error {
    /// A value or index of the input vector is rejected.
    #[error("invalid input @ {position}: {fault}")]
    InvalidInput { position: usize, fault: InputFault },

    /// The vector has no nonzero feature to sample from.
    #[error("the vector has no active features")]
    EmptyInput,

    /// Bitness, dimension or sample size cannot be used.
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// A bag of a batch failed; `bag` is its position in the batch.
    #[error("bag {bag}: {source}")]
    InBag {
        bag: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("sampler setup failed: {0}")]
    Sampling(#[from] rand_distr::GammaError),
}

impl Error {
    pub(crate) fn invalid(position: usize, fault: InputFault) -> Self {
        Error::InvalidInput { position, fault }
    }

    /// Position of the offending element inside its bag.
    pub fn position(&self) -> Option<usize> {
        match self {
            Error::InvalidInput { position, .. } => Some(*position),
            Error::InBag { source, .. } => source.position(),
            _ => None,
        }
    }

    /// Batch position of the failing bag for errors from `hash_batch`.
    pub fn bag(&self) -> Option<usize> {
        match self {
            Error::InBag { bag, .. } => Some(*bag),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
