//! Park-Miller Linear Congruential Generator (MINSTD)
//!
//! Deterministic, allocation-free randomness for the candidate carver, so a
//! seed always reproduces the same maze on every platform.
//!
//! Constants:
//! - Multiplier (a): 48271
//! - Modulus (m): 2^31 - 1 = 2147483647
//!
//! Reference: https://en.wikipedia.org/wiki/Lehmer_random_number_generator

const A: u64 = 48271;
const M: u64 = 2147483647; // 2^31 - 1

/// Park-Miller Linear Congruential Generator
pub struct SimpleLCG {
    state: u32,
}

impl SimpleLCG {
    /// Create a generator; a zero seed (a fixed point of the recurrence) becomes 1
    pub fn new(seed: u32) -> Self {
        // Seeds at or above M would alias smaller seeds after the first step
        let seed = (seed as u64 % M) as u32;
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn advance(&mut self) -> u64 {
        self.state = ((self.state as u64 * A) % M) as u32;
        self.state as u64
    }

    /// Uniform index in `[0, len)`; `len` must be non-zero
    pub fn choice_index(&mut self, len: usize) -> usize {
        ((self.advance() * len as u64) / M) as usize
    }

    /// Fisher-Yates shuffle driven by [`choice_index`](Self::choice_index)
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.choice_index(i + 1);
            items.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let mut rng1 = SimpleLCG::new(12345);
        let mut rng2 = SimpleLCG::new(12345);
        for _ in 0..100 {
            assert_eq!(rng1.choice_index(1000), rng2.choice_index(1000));
        }
    }

    #[test]
    fn test_seed_zero() {
        // Same sequence as seed 1
        let mut zero = SimpleLCG::new(0);
        let mut one = SimpleLCG::new(1);
        assert_eq!(zero.choice_index(1_000_000), one.choice_index(1_000_000));
        // 48271 / (2^31 - 1) * 1000 rounds down to 0
        let mut fresh = SimpleLCG::new(0);
        assert_eq!(fresh.choice_index(1000), 0);
    }

    #[test]
    fn test_choice_index_range() {
        let mut rng = SimpleLCG::new(11111);
        for _ in 0..1000 {
            let val = rng.choice_index(6);
            assert!(val < 6, "choice_index {} not below 6", val);
        }
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = SimpleLCG::new(2918957128);
        let mut items = [0, 1, 2, 3, 4, 5, 6, 7];
        rng.shuffle(&mut items);
        let mut sorted = items;
        sorted.sort_unstable();
        assert_eq!(sorted, [0, 1, 2, 3, 4, 5, 6, 7]);
    }
}
