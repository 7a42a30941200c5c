use crate::ss::{block_size_of, PrivateKey, PublicKey};
use crate::{CipherError, Rand};
use num_bigint::BigUint;
use num_traits::Zero;
use utils::BigUintExt;

/// `p`的长度范围是`[total_bits/5, 2*total_bits/5]`, 至少需要2比特
const MIN_PUBLIC_BITS: usize = 10;

#[derive(Clone, Debug)]
pub struct PrimeFactors {
    pub p: BigUint,
    pub q: BigUint,
    // n = p^2 * q
    pub n: BigUint,
}

/// 生成公钥的素因子, `test_rounds`为Miller-Rabin检测轮数.
///
/// 不满足$p \neq q$, $p \nmid q-1$, $q \nmid p-1$时从头重新生成. `max_attempts`限制重新生成的
/// 次数(同时也限制每次素数搜索的候选数), `None`表示直到成功为止.
pub fn make_public<R: Rand>(
    total_bits: usize,
    test_rounds: usize,
    max_attempts: Option<usize>,
    rng: &mut R,
) -> Result<PrimeFactors, CipherError> {
    if total_bits < MIN_PUBLIC_BITS {
        return Err(CipherError::InvalidPrimeBits(total_bits));
    }

    let (lo, hi) = (total_bits / 5, 2 * total_bits / 5);
    let mut attempts = 0usize;
    loop {
        if max_attempts.is_some_and(|m| attempts >= m) {
            return Err(CipherError::AttemptsExhausted(attempts));
        }
        attempts += 1;

        let p_bits = rng.gen_range_u64(lo as u64, hi as u64) as usize;
        let p = gen_prime(p_bits, test_rounds, max_attempts, rng)?;

        let p2_bits = (&p * &p).bits() as usize;
        let q_bits = total_bits.saturating_sub(p2_bits);
        if q_bits < 2 {
            log::debug!("q has only {q_bits} bits left, retry");
            continue;
        }
        let q = gen_prime(q_bits, test_rounds, max_attempts, rng)?;

        if p == q || ((&q - 1u32) % &p).is_zero() || ((&p - 1u32) % &q).is_zero() {
            log::debug!("rejected p={p:#x}, q={q:#x} at attempt {attempts}");
            continue;
        }

        let n = &p * &p * &q;
        log::debug!(
            "accepted {}-bits p and {}-bits q after {attempts} attempts",
            p.bits(),
            q.bits()
        );
        return Ok(PrimeFactors { p, q, n });
    }
}

fn gen_prime<R: Rand>(
    bits_len: usize,
    test_rounds: usize,
    max_attempts: Option<usize>,
    rng: &mut R,
) -> Result<BigUint, CipherError> {
    BigUintExt::<BigUint>::generate_prime_within(bits_len, test_rounds, max_attempts, rng).map_err(
        |e| {
            log::debug!("{e}");
            CipherError::AttemptsExhausted(max_attempts.unwrap_or_default())
        },
    )
}

/// 由素因子计算私钥: $d = (p^2 q)^{-1} \mod lcm(p-1, q-1)$, 模数为$pq$
pub fn make_private(p: &BigUint, q: &BigUint) -> Result<PrivateKey, CipherError> {
    let pq = p * q;
    let n = &pq * p;
    let (pm1, qm1) = (p - 1u32, q - 1u32);
    let lambda = BigUintExt(&pm1).lcm(&qm1);

    let d = BigUintExt(&n)
        .modinv(&lambda)
        .ok_or(CipherError::ModularInverseNotFound)?;
    let block_size = block_size_of(&pq);

    Ok(PrivateKey::new_uncheck(pq, d, block_size))
}

#[derive(Clone, Debug)]
pub struct KeyPair {
    factors: PrimeFactors,
    public: PublicKey,
    private: PrivateKey,
}

impl KeyPair {
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    pub fn factors(&self) -> &PrimeFactors {
        &self.factors
    }
}

#[derive(Clone, Debug)]
pub struct KeyPairBuilder {
    total_bits: usize,
    test_rounds: usize,
    user: String,
    max_attempts: Option<usize>,
}

impl KeyPairBuilder {
    pub const MIN_BITS: usize = 24;

    pub fn new(total_bits: usize) -> Self {
        Self {
            total_bits,
            test_rounds: 50,
            user: String::new(),
            max_attempts: None,
        }
    }

    /// Miller-Rabin检测轮数
    pub fn test_rounds(mut self, rounds: usize) -> Self {
        self.test_rounds = rounds;
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// 块大小小于2字节的密钥无法携带数据, 重新生成
    pub fn build<R: Rand>(&self, rng: &mut R) -> Result<KeyPair, CipherError> {
        if self.total_bits < Self::MIN_BITS {
            return Err(CipherError::InvalidKeySize {
                min: Self::MIN_BITS,
                real: self.total_bits,
            });
        }

        if self.user.contains(|c| c == '\n' || c == '\r') {
            return Err(CipherError::InvalidKeyFormat(
                "owner cannot contain line breaks".to_string(),
            ));
        }

        let mut attempts = 0usize;
        loop {
            if self.max_attempts.is_some_and(|m| attempts >= m) {
                return Err(CipherError::AttemptsExhausted(attempts));
            }
            attempts += 1;

            let factors = make_public(self.total_bits, self.test_rounds, self.max_attempts, rng)?;
            let private = make_private(&factors.p, &factors.q)?;
            if private.block_size() < 2 {
                log::debug!(
                    "block size {} of {}-bits pq is unusable, regenerate",
                    private.block_size(),
                    private.modulus().bits()
                );
                continue;
            }

            let public = PublicKey::new_uncheck(
                factors.n.clone(),
                self.user.clone(),
                private.block_size(),
            );

            return Ok(KeyPair {
                factors,
                public,
                private,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{make_private, make_public, KeyPairBuilder};
    use crate::{CipherError, DefaultRand, SeededRand};
    use num_bigint::BigUint;
    use num_traits::{One, Zero};
    use utils::BigUintExt;

    #[test]
    fn public_factors_invariant() {
        let mut rng = SeededRand::new(42);
        for total_bits in [10usize, 16, 24, 32, 48, 64] {
            for _ in 0..5 {
                let f = make_public(total_bits, 20, None, &mut rng).unwrap();
                assert_ne!(f.p, f.q);
                assert!(!((&f.q - 1u32) % &f.p).is_zero());
                assert!(!((&f.p - 1u32) % &f.q).is_zero());
                assert_eq!(f.n, &f.p * &f.p * &f.q);
                assert!(BigUintExt(&f.p).probably_prime_test(20, &mut rng));
                assert!(BigUintExt(&f.q).probably_prime_test(20, &mut rng));

                let p_bits = f.p.bits() as usize;
                assert!(p_bits >= total_bits / 5 && p_bits <= 2 * total_bits / 5);
            }
        }
    }

    #[test]
    fn private_exponent() {
        let mut rng = SeededRand::new(7);
        for total_bits in [24usize, 40, 64] {
            let f = make_public(total_bits, 20, None, &mut rng).unwrap();
            let sk = make_private(&f.p, &f.q).unwrap();

            let pq = &f.p * &f.q;
            assert_eq!(sk.modulus(), &pq);
            // 私钥推导的n与公钥一致
            assert_eq!(sk.modulus() * &f.p, f.n);

            let lambda = BigUintExt(&f.p - 1u32).lcm(&(&f.q - 1u32));
            assert!(((sk.exponent() * &f.n) % &lambda).is_one());
        }
    }

    #[test]
    fn no_inverse() {
        // p = 2: lcm(1, 2) = 2, n = 12 是偶数
        assert!(matches!(
            make_private(&BigUint::from(2u8), &BigUint::from(3u8)),
            Err(CipherError::ModularInverseNotFound)
        ));
    }

    #[test]
    fn too_few_bits() {
        let mut rng = SeededRand::new(1);
        assert!(matches!(
            make_public(9, 10, None, &mut rng),
            Err(CipherError::InvalidPrimeBits(9))
        ));
        assert!(matches!(
            KeyPairBuilder::new(23).build(&mut rng),
            Err(CipherError::InvalidKeySize { min: 24, real: 23 })
        ));
    }

    #[test]
    fn attempts_exhausted() {
        let mut rng = SeededRand::new(1);
        assert!(matches!(
            make_public(64, 10, Some(0), &mut rng),
            Err(CipherError::AttemptsExhausted(0))
        ));
        assert!(matches!(
            KeyPairBuilder::new(64).max_attempts(0).build(&mut rng),
            Err(CipherError::AttemptsExhausted(0))
        ));
    }

    #[test]
    fn owner_line_break() {
        let mut rng = SeededRand::new(1);
        assert!(matches!(
            KeyPairBuilder::new(32).user("a\nb").build(&mut rng),
            Err(CipherError::InvalidKeyFormat(_))
        ));
    }

    #[test]
    fn key_pair_primitive() {
        let mut rng = SeededRand::new(42);
        for total_bits in [24usize, 32, 64] {
            let kp = KeyPairBuilder::new(total_bits)
                .test_rounds(10)
                .user("alice")
                .build(&mut rng)
                .unwrap();
            let (pk, sk) = (kp.public_key(), kp.private_key());
            assert_eq!(pk.user(), "alice");
            assert!(pk.block_size() >= 2);
            assert_eq!(pk.block_size(), sk.block_size());
            assert_eq!(sk.modulus() * &kp.factors().p, *pk.modulus());

            for m in [0u32, 1, 2, 0xff, 0xfffe] {
                let m = BigUint::from(m);
                let c = pk.encrypt_uncheck(&m);
                assert_eq!(sk.decrypt_uncheck(&c), m, "{total_bits}-bits key");
            }
        }
    }

    #[test]
    fn os_entropy_keys() {
        let mut rng = DefaultRand::default();
        let kp = KeyPairBuilder::new(128).test_rounds(19).build(&mut rng).unwrap();
        let (pk, sk) = (kp.public_key(), kp.private_key());

        let m = BigUint::from(0x1234_5678u32);
        assert_eq!(sk.decrypt_uncheck(&pk.encrypt_uncheck(&m)), m);
    }

    #[test]
    fn same_seed_same_keys() {
        let gen = |seed| {
            let mut rng = SeededRand::new(seed);
            KeyPairBuilder::new(48)
                .test_rounds(10)
                .build(&mut rng)
                .unwrap()
        };
        let (a, b) = (gen(9), gen(9));
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.private_key(), b.private_key());
    }
}
