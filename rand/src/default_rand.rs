use crate::Rand;
use xrand::rngs::OsRng;
use xrand::RngCore;

/// 默认使用OsRng <br>
/// not reproducible, for production key generation
#[derive(Copy, Clone, Default)]
pub struct DefaultRand {
    rng: OsRng,
}

impl Rand for DefaultRand {
    fn rand(&mut self, random: &mut [u8]) {
        self.rng.fill_bytes(random);
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }
}
