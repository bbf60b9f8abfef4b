//! Bit layouts of a sketch word.
//!
//! Each word holds the selected feature index `k` in its low half and the sampled
//! exponent `t` in the next half. Both fields are truncated to the half width; a
//! negative `t` is kept in two's complement inside its field.

use std::fmt;

use crate::error::Error;

/// Bit width used when none is configured.
pub const DEFAULT_BITNESS: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Packing {
    Bits16,
    Bits32,
    #[default]
    Bits64,
}

impl Packing {
    pub fn bits(self) -> u32 {
        match self {
            Packing::Bits16 => 16,
            Packing::Bits32 => 32,
            Packing::Bits64 => 64,
        }
    }

    pub fn field_bits(self) -> u32 {
        self.bits() / 2
    }

    fn field_mask(self) -> u64 {
        (1u64 << self.field_bits()) - 1
    }

    /// Number of distinct feature indices the `k` field can hold.
    pub fn index_capacity(self) -> u64 {
        1u64 << self.field_bits()
    }

    pub fn pack(self, k: usize, t: i64) -> u64 {
        let mask = self.field_mask();
        (k as u64 & mask) | ((t as u64 & mask) << self.field_bits())
    }

    pub fn unpack(self, word: u64) -> (u64, u64) {
        let mask = self.field_mask();
        (word & mask, (word >> self.field_bits()) & mask)
    }

    /// Like [`Packing::unpack`], reading the `t` field as a signed number.
    pub fn unpack_signed(self, word: u64) -> (u64, i64) {
        let (k, t) = self.unpack(word);
        let shift = 64 - self.field_bits();
        (k, ((t << shift) as i64) >> shift)
    }
}

impl TryFrom<u32> for Packing {
    type Error = Error;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            16 => Ok(Packing::Bits16),
            32 => Ok(Packing::Bits32),
            64 => Ok(Packing::Bits64),
            _ => Err(Error::UnsupportedConfiguration(format!(
                "unsupported bitness value: {}",
                bits
            ))),
        }
    }
}

impl fmt::Display for Packing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}
