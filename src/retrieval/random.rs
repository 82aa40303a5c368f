//! Injectable randomness for delays and user-agent rotation.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of random choices used by the retrieval path.
pub trait RandomSource: Send + Sync {
    /// Uniform index in `0..len`. `len` must be non-zero.
    fn index(&self, len: usize) -> usize;

    /// Uniform value in `low..=high`.
    fn between(&self, low: u64, high: u64) -> u64;
}

/// Thread-local OS-seeded randomness.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn index(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }

    fn between(&self, low: u64, high: u64) -> u64 {
        if high <= low {
            return low;
        }
        rand::thread_rng().gen_range(low..=high)
    }
}

/// Deterministic randomness from a fixed seed.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        match self.rng.lock() {
            Ok(mut rng) => f(&mut rng),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

impl RandomSource for SeededRandom {
    fn index(&self, len: usize) -> usize {
        self.with_rng(|rng| rng.gen_range(0..len))
    }

    fn between(&self, low: u64, high: u64) -> u64 {
        if high <= low {
            return low;
        }
        self.with_rng(|rng| rng.gen_range(low..=high))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_is_repeatable() {
        let a = SeededRandom::new(42);
        let b = SeededRandom::new(42);
        let xs: Vec<u64> = (0..10).map(|_| a.between(100, 200)).collect();
        let ys: Vec<u64> = (0..10).map(|_| b.between(100, 200)).collect();
        assert_eq!(xs, ys);
        assert!(xs.iter().all(|x| (100..=200).contains(x)));
    }

    #[test]
    fn test_between_degenerate_range() {
        assert_eq!(ThreadRandom.between(5, 5), 5);
        assert_eq!(SeededRandom::new(1).between(9, 3), 9);
    }

    #[test]
    fn test_index_in_bounds() {
        let random = SeededRandom::new(7);
        for _ in 0..50 {
            assert!(random.index(4) < 4);
        }
    }
}
