//! Deterministic duel seed streams.
//!
//! The engine derives all of a duel's randomness from the 32-bit seed passed
//! to `create_duel`. A `SeedStream` turns one master seed into a reproducible
//! sequence of duel seeds, so a batch of duels can be replayed exactly.
//!
//! ```
//! use ocg_host::host::SeedStream;
//!
//! let mut a = SeedStream::new(42);
//! let mut b = SeedStream::new(42);
//! assert_eq!(a.next_seed(), b.next_seed());
//!
//! // Forks are independent but just as reproducible.
//! let mut fa = a.fork();
//! let mut fb = b.fork();
//! assert_eq!(fa.next_seed(), fb.next_seed());
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Reproducible source of duel seeds.
#[derive(Clone, Debug)]
pub struct SeedStream {
    inner: ChaCha8Rng,
    master: u64,
    fork_counter: u64,
}

impl SeedStream {
    /// Create a stream from a master seed.
    #[must_use]
    pub fn new(master: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(master),
            master,
            fork_counter: 0,
        }
    }

    /// The master seed this stream was created from.
    #[must_use]
    pub fn master(&self) -> u64 {
        self.master
    }

    /// Next duel seed.
    pub fn next_seed(&mut self) -> u32 {
        self.inner.gen()
    }

    /// Split off an independent stream, e.g. one per worker.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        self.fork_counter += 1;
        let fork_seed = self
            .master
            .wrapping_add(self.fork_counter.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        Self::new(fork_seed)
    }
}

impl Iterator for SeedStream {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        Some(self.next_seed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let a: Vec<u32> = SeedStream::new(7).take(16).collect();
        let b: Vec<u32> = SeedStream::new(7).take(16).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_masters_differ() {
        let a: Vec<u32> = SeedStream::new(1).take(8).collect();
        let b: Vec<u32> = SeedStream::new(2).take(8).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_forks_are_distinct() {
        let mut stream = SeedStream::new(99);
        let first: Vec<u32> = stream.fork().take(8).collect();
        let second: Vec<u32> = stream.fork().take(8).collect();
        let parent: Vec<u32> = stream.take(8).collect();

        assert_ne!(first, second);
        assert_ne!(first, parent);
    }
}
