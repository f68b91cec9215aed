//! Uniform random draws for weighted selection.

use rand::rngs::OsRng;
use rand::RngCore;

/// Failure to obtain randomness from the underlying source.
#[derive(Debug, thiserror::Error)]
pub enum EntropyError {
    /// The operating system generator could not be read.
    #[error("secure random source unavailable: {0}")]
    Unavailable(#[from] rand::Error),
    /// A draw was requested over an empty range.
    #[error("cannot draw from an empty range")]
    EmptyRange,
}

/// A source of uniformly distributed integers.
///
/// Implementations must be safe to share across request tasks without
/// external synchronization.
pub trait EntropySource: Send + Sync {
    /// Draw an integer uniformly distributed in `[0, bound)`.
    fn draw_below(&self, bound: u64) -> Result<u64, EntropyError>;
}

/// Draws from the operating system CSPRNG.
///
/// Rejection sampling keeps the result free of modulo bias.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn draw_below(&self, bound: u64) -> Result<u64, EntropyError> {
        if bound == 0 {
            return Err(EntropyError::EmptyRange);
        }
        // Largest multiple of `bound` representable; values at or above it
        // would over-weight the low residues.
        let limit = u64::MAX - (u64::MAX % bound);
        let mut buf = [0u8; 8];
        loop {
            OsRng.try_fill_bytes(&mut buf)?;
            let value = u64::from_le_bytes(buf);
            if value < limit {
                return Ok(value % bound);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_stay_in_range() {
        for bound in [1u64, 2, 3, 7, 100, 1 << 33] {
            for _ in 0..200 {
                assert!(OsEntropy.draw_below(bound).unwrap() < bound);
            }
        }
    }

    #[test]
    fn empty_range_is_an_error() {
        assert!(matches!(OsEntropy.draw_below(0), Err(EntropyError::EmptyRange)));
    }
}
