//! Number-theoretic primitives for RSA key generation.
//!
//! Primality is decided by trial division, which is exact but only practical
//! for the small primes the demo configuration uses.

use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{CryptoError, Result};

/// Default cap on prime sampling attempts.
pub const DEFAULT_MAX_PRIME_ATTEMPTS: u32 = 10_000;

/// Inclusive range primes are sampled from.
///
/// Deserialization applies the same check as [`PrimeRange::new`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPrimeRange")]
pub struct PrimeRange {
    low: BigUint,
    high: BigUint,
}

#[derive(Deserialize)]
struct RawPrimeRange {
    low: BigUint,
    high: BigUint,
}

impl TryFrom<RawPrimeRange> for PrimeRange {
    type Error = CryptoError;

    fn try_from(raw: RawPrimeRange) -> Result<Self> {
        Self::new(raw.low, raw.high)
    }
}

impl PrimeRange {
    /// Create a range `[low, high]`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParameter`] if `low > high`.
    pub fn new(low: impl Into<BigUint>, high: impl Into<BigUint>) -> Result<Self> {
        let (low, high) = (low.into(), high.into());
        if low > high {
            return Err(CryptoError::InvalidParameter(format!(
                "prime range [{low}, {high}] is empty"
            )));
        }
        Ok(Self { low, high })
    }

    /// The `[100, 500]` range used by the demo configuration.
    #[must_use]
    pub fn insecure_demo() -> Self {
        Self {
            low: BigUint::from(100u32),
            high: BigUint::from(500u32),
        }
    }

    /// Lower bound (inclusive).
    #[must_use]
    pub fn low(&self) -> &BigUint {
        &self.low
    }

    /// Upper bound (inclusive).
    #[must_use]
    pub fn high(&self) -> &BigUint {
        &self.high
    }

    /// Whether `n` lies in the range.
    #[must_use]
    pub fn contains(&self, n: &BigUint) -> bool {
        *n >= self.low && *n <= self.high
    }

    fn sample<R: RngCore + CryptoRng>(&self, rng: &mut R) -> BigUint {
        rng.gen_biguint_range(&self.low, &(&self.high + 1u32))
    }
}

/// Trial-division primality test.
#[must_use]
pub fn is_prime(n: &BigUint) -> bool {
    let two = BigUint::from(2u32);
    if *n < two {
        return false;
    }
    if *n == two {
        return true;
    }
    if n.is_even() {
        return false;
    }

    let limit = n.sqrt();
    let mut divisor = BigUint::from(3u32);
    while divisor <= limit {
        if (n % &divisor).is_zero() {
            return false;
        }
        divisor += 2u32;
    }
    true
}

/// Sample uniformly from `range` until a prime turns up.
///
/// # Errors
///
/// Returns [`CryptoError::PrimeGenerationExhausted`] after `max_attempts` misses.
pub fn generate_prime<R: RngCore + CryptoRng>(
    range: &PrimeRange,
    max_attempts: u32,
    rng: &mut R,
) -> Result<BigUint> {
    for attempt in 1..=max_attempts {
        let candidate = range.sample(rng);
        if is_prime(&candidate) {
            tracing::debug!(attempts = attempt, bits = candidate.bits(), "found prime");
            return Ok(candidate);
        }
    }

    tracing::warn!(
        low = %range.low,
        high = %range.high,
        max_attempts,
        "prime generation exhausted"
    );
    Err(CryptoError::PrimeGenerationExhausted {
        attempts: max_attempts,
    })
}

/// Smallest `e >= 3` with `gcd(e, phi) == 1`.
///
/// # Errors
///
/// Returns [`CryptoError::NoValidExponent`] if no such `e < phi` exists.
pub fn choose_e(phi: &BigUint) -> Result<BigUint> {
    let mut e = BigUint::from(3u32);
    while e < *phi {
        if e.gcd(phi).is_one() {
            tracing::debug!(e = %e, "chose public exponent");
            return Ok(e);
        }
        e += 1u32;
    }
    Err(CryptoError::NoValidExponent)
}

/// Modular inverse of `e` modulo `phi` via the extended Euclidean algorithm,
/// normalized into `[0, phi)`.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidParameter`] if `phi` is zero or `e` is not
/// invertible modulo `phi`.
pub fn mod_inverse(e: &BigUint, phi: &BigUint) -> Result<BigUint> {
    if phi.is_zero() {
        return Err(CryptoError::InvalidParameter("modulus is zero".into()));
    }

    let modulus = BigInt::from(phi.clone());
    let (mut old_r, mut r) = (BigInt::from(e.clone()), modulus.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());

    while !r.is_zero() {
        let q = &old_r / &r;
        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, next_s);
    }

    if !old_r.is_one() {
        return Err(CryptoError::InvalidParameter(format!(
            "{e} has no inverse modulo {phi}"
        )));
    }

    old_s
        .mod_floor(&modulus)
        .to_biguint()
        .ok_or_else(|| CryptoError::InvalidParameter("negative inverse".into()))
}
