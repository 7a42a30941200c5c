use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{Euclid, One, Zero};
use rand::Rand;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::ops::Deref;

pub struct BigUintExt<T: Borrow<BigUint>>(pub T);

impl<T: Borrow<BigUint>> Deref for BigUintExt<T> {
    type Target = BigUint;
    fn deref(&self) -> &Self::Target {
        self.0.borrow()
    }
}

impl<T: Borrow<BigUint>> PartialEq<BigUint> for BigUintExt<T> {
    fn eq(&self, other: &BigUint) -> bool {
        self.deref().eq(other)
    }
}

impl<T: Borrow<BigUint>> PartialOrd<BigUint> for BigUintExt<T> {
    fn partial_cmp(&self, other: &BigUint) -> Option<Ordering> {
        self.deref().partial_cmp(other)
    }
}

impl<T: Borrow<BigUint>> BigUintExt<T> {
    /// Euclid: gcd(a, 0) = a, gcd(0, b) = b
    pub fn gcd(&self, other: &BigUint) -> BigUint {
        let (mut a, mut b) = (self.deref().clone(), other.clone());
        while !b.is_zero() {
            let r = &a % &b;
            a = b;
            b = r;
        }
        a
    }

    /// lcm(a, b) = a * b / gcd(a, b), lcm(a, 0) = 0
    pub fn lcm(&self, other: &BigUint) -> BigUint {
        if self.is_zero() || other.is_zero() {
            return BigUint::zero();
        }

        let mut l = self.deref() * other;
        l /= self.gcd(other);
        l
    }

    /// <<算法导论>>
    /// 扩展欧几里得算法, 跟踪Bezout系数: self * x + modulus * y = gcd(self, modulus)
    ///
    /// returns the `x` in `[0, modulus)` such that `self * x = 1 \mod modulus`,
    /// or `None` when `gcd(self, modulus) != 1` (or `modulus == 0`).
    pub fn modinv(&self, modulus: &BigUint) -> Option<BigUint> {
        if modulus.is_zero() {
            return None;
        }

        let n = BigInt::from(modulus.clone());
        let (mut r0, mut r1) = (n.clone(), BigInt::from(self.deref() % modulus));
        let (mut t0, mut t1) = (BigInt::zero(), BigInt::one());

        while !r1.is_zero() {
            let q = &r0 / &r1;
            let r2 = &r0 - &q * &r1;
            let t2 = &t0 - &q * &t1;
            (r0, r1) = (r1, r2);
            (t0, t1) = (t1, t2);
        }

        if !r0.is_one() {
            return None;
        }

        t0.rem_euclid(&n).to_biguint()
    }

    /// $self^{exp} \mod modulus$, right-to-left binary exponentiation.
    ///
    /// `pow_mod(x, 0, m) = 1 mod m`; panics if `modulus == 0`.
    pub fn pow_mod(&self, exp: &BigUint, modulus: &BigUint) -> BigUint {
        let mut result = BigUint::one() % modulus;
        let mut base = self.deref() % modulus;

        let bits = exp.bits();
        for i in 0..bits {
            if exp.bit(i) {
                result *= &base;
                result %= modulus;
            }

            // 最高位之后不需要再平方
            if i + 1 < bits {
                base = &base * &base;
                base %= modulus;
            }
        }

        result
    }

    /// uniform random number in `[0, self)`, `self` must be non-zero
    pub fn gen_random<R: Rand>(&self, rng: &mut R) -> BigUint {
        let bits = self.bits() as usize;
        let mut n = vec![0u8; (bits + 7) >> 3];
        let b = bits & 7;

        loop {
            rng.rand(n.as_mut_slice());
            // 清除大于bits的位, 降低拒绝概率
            if b != 0 {
                if let Some(x) = n.last_mut() {
                    *x &= (1u8 << b) - 1;
                }
            }

            let r = BigUint::from_bytes_le(n.as_slice());
            if self.deref() > &r {
                return r;
            }
        }
    }

    /// probability prime test by the Miller-Rabin algorithm.
    ///
    /// every round draws a fresh witness uniformly from `[2, n-2]`, for a composite `n`
    /// the probability of passing all `test_rounds` rounds is at most $4^{-test\_rounds}$.
    ///
    /// note: the test targets multi-bit candidates, `3` is answered directly since its
    /// witness range is empty.
    pub fn probably_prime_test<Rng: Rand>(&self, test_rounds: usize, rng: &mut Rng) -> bool {
        let n = self.deref();
        if n.is_zero() || n.is_one() {
            return false;
        } else if n.is_even() {
            return n == &BigUint::from(2u8);
        } else if n == &BigUint::from(3u8) {
            return true;
        }

        // n - 1 = 2^s * r
        let n_m1 = n - 1u32;
        let s = n_m1.trailing_zeros().unwrap_or(0);
        let r = &n_m1 >> s;

        let span = BigUintExt(n - 3u32);
        for _ in 0..test_rounds {
            let a = span.gen_random(rng) + 2u32;
            if self.miller_rabin_witness(s, &r, &n_m1, &a) {
                return false;
            }
        }

        true
    }

    /// 判断`a`是否能证明`n`是合数, n - 1 = 2^s * r, a在[2, n-2]之间
    fn miller_rabin_witness(&self, s: u64, r: &BigUint, n_m1: &BigUint, a: &BigUint) -> bool {
        let n = self.deref();
        let mut y = BigUintExt(a).pow_mod(r, n);
        if y.is_one() || &y == n_m1 {
            return false;
        }

        let two = BigUint::from(2u8);
        let mut j = 1;
        while j < s && &y != n_m1 {
            y = BigUintExt(&y).pow_mod(&two, n);
            if y.is_one() {
                // nontrivial square root of 1
                return true;
            }
            j += 1;
        }

        &y != n_m1
    }

    /// uniform random number of at most `bits_len` bits
    pub fn gen_bits<Rng: Rand>(bits_len: usize, rng: &mut Rng) -> BigUint {
        let mut n = vec![0u8; (bits_len + 7) >> 3];
        rng.rand(n.as_mut_slice());

        let b = bits_len & 7;
        if b != 0 {
            if let Some(x) = n.last_mut() {
                *x &= (1u8 << b) - 1;
            }
        }

        BigUint::from_bytes_le(n.as_slice())
    }

    /// generate a number p with the bits length of `bits_len`, such that p is prime
    /// with high probability that is related to the number of `test_round_num`.
    ///
    /// the candidate is `2^(bits_len-1)` plus `bits_len-1` random bits, so the result
    /// always has exactly `bits_len` bits. The search only stops on success.
    pub fn generate_prime<Rng: Rand>(
        bits_len: usize,
        test_round_num: usize,
        rng: &mut Rng,
    ) -> Result<BigUint, String> {
        Self::generate_prime_within(bits_len, test_round_num, None, rng)
    }

    /// same as [`Self::generate_prime`], gives up after `max_attempts` candidates if specified
    pub fn generate_prime_within<Rng: Rand>(
        bits_len: usize,
        test_round_num: usize,
        max_attempts: Option<usize>,
        rng: &mut Rng,
    ) -> Result<BigUint, String> {
        if bits_len < 2 {
            return Err("prime size must at least 2-bits".to_string());
        }

        let floor = BigUint::one() << (bits_len - 1);
        let mut attempts = 0usize;
        loop {
            if max_attempts.is_some_and(|m| attempts >= m) {
                return Err(format!(
                    "no {bits_len}-bits prime found in {attempts} attempts"
                ));
            }
            attempts += 1;

            let mut p = BigUintExt::<BigUint>::gen_bits(bits_len - 1, rng);
            p += &floor;

            if BigUintExt(&p).probably_prime_test(test_round_num, rng) {
                return Ok(p);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::BigUintExt;
    use num_bigint::BigUint;
    use num_traits::{Num, One, Zero};
    use rand::SeededRand;

    fn big(x: u64) -> BigUint {
        BigUint::from(x)
    }

    #[test]
    fn gcd_identities() {
        let cases = [(0u64, 0u64), (12, 0), (0, 18), (12, 18), (17, 5), (1024, 96), (99, 99)];
        for (a, b) in cases {
            let (a, b) = (big(a), big(b));
            assert_eq!(BigUintExt(&a).gcd(&BigUint::zero()), a);
            assert_eq!(BigUintExt(&BigUint::zero()).gcd(&b), b);
            assert_eq!(BigUintExt(&a).gcd(&a), a);
            assert_eq!(BigUintExt(&a).gcd(&b), BigUintExt(&b).gcd(&a));
        }
        assert_eq!(BigUintExt(big(12)).gcd(&big(18)), big(6));
        assert_eq!(BigUintExt(big(17)).gcd(&big(5)), big(1));
    }

    #[test]
    fn lcm_small() {
        assert_eq!(BigUintExt(big(4)).lcm(&big(6)), big(12));
        assert_eq!(BigUintExt(big(7)).lcm(&big(0)), big(0));
        assert_eq!(BigUintExt(big(10)).lcm(&big(22)), big(110));
    }

    #[test]
    fn modinv_coprime() {
        for n in [2u64, 7, 26, 97, 120, 65536] {
            let n = big(n);
            for a in 1u64..60 {
                let a = big(a);
                let g = BigUintExt(&a).gcd(&n);
                match BigUintExt(&a).modinv(&n) {
                    Some(x) => {
                        assert!(g.is_one());
                        assert!(x < n);
                        assert_eq!((&a * &x) % &n, BigUint::one() % &n, "a={a} n={n}");
                    }
                    None => assert!(!g.is_one(), "a={a} n={n} must be invertible"),
                }
            }
        }
        assert_eq!(BigUintExt(big(3)).modinv(&big(7)), Some(big(5)));
        assert_eq!(BigUintExt(big(17)).modinv(&big(3120)), Some(big(2753)));
    }

    #[test]
    fn modinv_not_exist() {
        assert_eq!(BigUintExt(big(6)).modinv(&big(9)), None);
        assert_eq!(BigUintExt(big(0)).modinv(&big(9)), None);
        assert_eq!(BigUintExt(big(4)).modinv(&big(0)), None);
    }

    #[test]
    fn pow_mod_identities() {
        for m in [2u64, 3, 10, 97, 1 << 20] {
            let m = big(m);
            for a in [0u64, 1, 2, 5, 99, 123456] {
                let a = big(a);
                assert_eq!(BigUintExt(&a).pow_mod(&BigUint::zero(), &m), BigUint::one() % &m);
                assert_eq!(BigUintExt(&a).pow_mod(&BigUint::one(), &m), &a % &m);
            }
        }
        assert_eq!(BigUintExt(big(7)).pow_mod(&big(0), &big(1)), big(0));
    }

    #[test]
    fn pow_mod_matches_modpow() {
        let m = BigUint::from_str_radix("f123456789abcdef0123456789abcdef1", 16).unwrap();
        let e = BigUint::from_str_radix("10001fffffffffff", 16).unwrap();
        for b in [2u64, 3, 65537, u64::MAX] {
            let b = big(b);
            assert_eq!(BigUintExt(&b).pow_mod(&e, &m), b.modpow(&e, &m));
        }
        // 3^5 mod 7 = 243 mod 7 = 5
        assert_eq!(BigUintExt(big(3)).pow_mod(&big(5), &big(7)), big(5));
    }

    #[test]
    fn small_numbers() {
        let mut rng = SeededRand::new(0);
        assert!(!BigUintExt(big(0)).probably_prime_test(1, &mut rng));
        assert!(!BigUintExt(big(1)).probably_prime_test(1, &mut rng));
        assert!(BigUintExt(big(2)).probably_prime_test(1, &mut rng));
        for p in [3u64, 5, 7, 11] {
            assert!(BigUintExt(big(p)).probably_prime_test(1, &mut rng), "{p}");
        }
        for c in [4u64, 6, 8, 9, 15] {
            assert!(!BigUintExt(big(c)).probably_prime_test(1, &mut rng), "{c}");
        }
        for even in (4u64..200).step_by(2) {
            assert!(!BigUintExt(big(even)).probably_prime_test(5, &mut rng));
        }
    }

    #[test]
    fn matches_trial_division() {
        let is_prime = |n: u64| n >= 2 && (2..).take_while(|d| d * d <= n).all(|d| n % d != 0);
        let mut rng = SeededRand::new(5);
        for n in 5u64..3000 {
            assert_eq!(
                BigUintExt(big(n)).probably_prime_test(20, &mut rng),
                is_prime(n),
                "`{n}` misclassified"
            );
        }
    }

    #[test]
    fn composite_validate() {
        let cases = [
            "21284175091214687912771199898307297748211672914763848041968395774954376176754",
            "6084766654921918907427900243509372380954290099172559290432744450051395395951",
            "84594350493221918389213352992032324280367711247940675652888030554255915464401",
            "82793403787388584738507275144194252681",
            // Carmichael numbers
            "561",
            "41041",
            "825265",
            // strong pseudoprime to prime bases 2 through 29
            "1195068768795265792518361315725116351898245581",
            "3673744903",
            "3281593591",
            "2385076987",
            "2738053141",
            "80579735209",
        ];

        let (test_rounds, mut rng) = (10, SeededRand::new(11));
        for s in cases {
            let composite = BigUint::from_str_radix(s, 10).unwrap();
            assert!(
                !BigUintExt(composite).probably_prime_test(test_rounds, &mut rng),
                "composite `{}` test failed",
                s
            );
        }
    }

    #[test]
    fn prime_validate() {
        let cases = [
            "13756265695458089029",
            "13496181268022124907",
            "10953742525620032441",
            "17908251027575790097",
            "18699199384836356663",
            "98920366548084643601728869055592650835572950932266967461790948584315647051443",
            "94560208308847015747498523884063394671606671904944666360068158221458669711639",
            // Curve25519: 2^255-19
            "57896044618658097711785492504343953926634992332820282019728792003956564819949",
        ];

        let (test_rounds, mut rng) = (10usize, SeededRand::new(12));
        for s in cases {
            let prime = BigUint::from_str_radix(s, 10).unwrap();
            assert!(
                BigUintExt(prime).probably_prime_test(test_rounds, &mut rng),
                "prime `{}` test failed",
                s
            );
        }
    }

    #[test]
    fn gen_bits_bound() {
        let mut rng = SeededRand::new(9);
        for bits in [0usize, 1, 3, 8, 13, 64] {
            for _ in 0..50 {
                let x = BigUintExt::<BigUint>::gen_bits(bits, &mut rng);
                assert!(x.bits() as usize <= bits);
            }
        }
    }

    #[test]
    fn gen_random_bound() {
        let mut rng = SeededRand::new(10);
        for bound in [1u64, 2, 3, 255, 256, 1000] {
            let bound = BigUintExt(big(bound));
            for _ in 0..50 {
                assert!(bound > bound.gen_random(&mut rng));
            }
        }
    }

    #[test]
    fn gen_small_prime() {
        let mut rng = SeededRand::new(42);
        let test_rounds = 19;
        for bits_len in 2..24 {
            let p = BigUintExt::<BigUint>::generate_prime(bits_len, test_rounds, &mut rng).unwrap();
            assert_eq!(p.bits() as usize, bits_len);
            assert!(BigUintExt(&p).probably_prime_test(test_rounds, &mut rng));
        }
    }

    #[test]
    fn gen_prime_invalid_size() {
        let mut rng = SeededRand::new(42);
        assert!(BigUintExt::<BigUint>::generate_prime(1, 10, &mut rng).is_err());
        assert!(BigUintExt::<BigUint>::generate_prime(0, 10, &mut rng).is_err());
    }

    #[test]
    fn gen_prime_attempts_exhausted() {
        let mut rng = SeededRand::new(42);
        let r = BigUintExt::<BigUint>::generate_prime_within(256, 10, Some(0), &mut rng);
        assert!(r.is_err());
    }
}
