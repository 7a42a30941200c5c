//! Random sources.
//!
//! Every consumer takes the generator as `&mut R` and never builds its own,
//! so one seeded handle drives a whole key generation run.

use xrand::{Rng, RngCore};

pub trait Rand: Default {
    fn rand(&mut self, random: &mut [u8]);

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.rand(&mut buf);
        u64::from_le_bytes(buf)
    }

    /// uniform random integer in the closed range `[low, high]`
    ///
    /// panics if `low > high`
    fn gen_range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low <= high, "invalid range [{low}, {high}]");
        RandCore(self).gen_range(low..=high)
    }
}

/// 把`Rand`接到`xrand`的采样器上
struct RandCore<'a, R>(&'a mut R);

impl<R: Rand> RngCore for RandCore<'_, R> {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.0.rand(&mut buf);
        u32::from_le_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.rand(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), xrand::Error> {
        self.0.rand(dest);
        Ok(())
    }
}

mod default_rand;
pub use default_rand::DefaultRand;

mod seeded_rand;
pub use seeded_rand::SeededRand;

#[cfg(test)]
mod tests {
    use crate::{Rand, SeededRand};

    #[test]
    fn range_is_inclusive() {
        let mut rng = SeededRand::new(7);
        let (mut lo_hit, mut hi_hit) = (false, false);
        for _ in 0..2000 {
            let x = rng.gen_range_u64(4, 9);
            assert!((4..=9).contains(&x), "{x} out of range");
            lo_hit |= x == 4;
            hi_hit |= x == 9;
        }
        assert!(lo_hit && hi_hit, "range bounds never drawn");
    }

    #[test]
    fn single_point_range() {
        let mut rng = SeededRand::new(1);
        for _ in 0..16 {
            assert_eq!(rng.gen_range_u64(12, 12), 12);
        }
    }

    #[test]
    fn full_range() {
        let mut rng = SeededRand::new(3);
        let _ = rng.gen_range_u64(0, u64::MAX);
    }

    #[test]
    fn range_is_uniform() {
        let mut rng = SeededRand::new(11);
        let mut hits = [0usize; 5];
        for _ in 0..5000 {
            hits[(rng.gen_range_u64(100, 104) - 100) as usize] += 1;
        }
        for (i, &h) in hits.iter().enumerate() {
            assert!((800..1200).contains(&h), "value {} drawn {h} times", 100 + i);
        }
    }

    #[test]
    #[should_panic]
    fn empty_range() {
        let mut rng = SeededRand::new(5);
        let _ = rng.gen_range_u64(9, 4);
    }
}
