//! Textbook RSA.
//!
//! Keys are built from two sampled primes; encryption and decryption are bare
//! modular exponentiation with no padding scheme. The scheme is deterministic
//! and malleable and is only used to carry Diffie-Hellman public values.

use std::fmt;

use num_bigint::BigUint;
use num_traits::One;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::number::{self, DEFAULT_MAX_PRIME_ATTEMPTS, PrimeRange};
use crate::{CryptoError, Result};

/// Prime upper bounds below this many bits require `allow_insecure`.
pub const MIN_SECURE_PRIME_BITS: u64 = 512;

/// Parameters for RSA key generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyGenConfig {
    /// Range both primes are drawn from
    pub prime_range: PrimeRange,
    /// Attempts allowed per prime before giving up
    pub max_prime_attempts: u32,
    /// Accept demo-sized primes
    pub allow_insecure: bool,
}

impl KeyGenConfig {
    /// Demo configuration: primes in `[100, 500]`.
    ///
    /// Produces moduli of roughly 14 to 18 bits. Never use outside tests and demos.
    #[must_use]
    pub fn insecure_demo() -> Self {
        Self {
            prime_range: PrimeRange::insecure_demo(),
            max_prime_attempts: DEFAULT_MAX_PRIME_ATTEMPTS,
            allow_insecure: true,
        }
    }

    /// Check the configuration before generating keys.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InsecureParameters`] for small prime ranges without
    /// opt-in, and [`CryptoError::InvalidParameter`] for a zero attempt cap.
    pub fn validate(&self) -> Result<()> {
        if self.max_prime_attempts == 0 {
            return Err(CryptoError::InvalidParameter(
                "max_prime_attempts must be at least 1".into(),
            ));
        }
        if self.prime_range.high().bits() < MIN_SECURE_PRIME_BITS {
            if !self.allow_insecure {
                return Err(CryptoError::InsecureParameters(format!(
                    "prime upper bound {} is below {MIN_SECURE_PRIME_BITS} bits",
                    self.prime_range.high()
                )));
            }
            tracing::warn!(
                high = %self.prime_range.high(),
                "generating RSA keys from an insecure demo-sized prime range"
            );
        }
        Ok(())
    }
}

/// Textbook RSA encryption: `message^other_e mod other_n`.
///
/// # Errors
///
/// Returns [`CryptoError::MessageOutOfRange`] if `message >= other_n`, where the
/// result would wrap and could not be decrypted back.
pub fn encrypt(message: &BigUint, other_e: &BigUint, other_n: &BigUint) -> Result<BigUint> {
    if message >= other_n {
        return Err(CryptoError::MessageOutOfRange);
    }
    Ok(message.modpow(other_e, other_n))
}

/// RSA public key `(e, n)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPublicKey")]
pub struct RsaPublicKey {
    e: BigUint,
    n: BigUint,
}

#[derive(Deserialize)]
struct RawPublicKey {
    e: BigUint,
    n: BigUint,
}

impl TryFrom<RawPublicKey> for RsaPublicKey {
    type Error = CryptoError;

    fn try_from(raw: RawPublicKey) -> Result<Self> {
        Self::new(raw.e, raw.n)
    }
}

impl RsaPublicKey {
    /// Build a public key received from a peer.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParameter`] if `n < 2` or `e < 1`.
    pub fn new(e: BigUint, n: BigUint) -> Result<Self> {
        if n < BigUint::from(2u32) || e < BigUint::one() {
            return Err(CryptoError::InvalidParameter(format!(
                "invalid RSA public key (e={e}, n={n})"
            )));
        }
        Ok(Self { e, n })
    }

    /// Public exponent.
    #[must_use]
    pub fn e(&self) -> &BigUint {
        &self.e
    }

    /// Modulus.
    #[must_use]
    pub fn n(&self) -> &BigUint {
        &self.n
    }

    /// Encrypt `message` to the holder of this key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MessageOutOfRange`] if `message >= n`.
    pub fn encrypt(&self, message: &BigUint) -> Result<BigUint> {
        encrypt(message, &self.e, &self.n)
    }
}

/// RSA key pair with its generating primes.
#[derive(Clone)]
pub struct RsaKeyPair {
    p: BigUint,
    q: BigUint,
    n: BigUint,
    phi: BigUint,
    e: BigUint,
    d: BigUint,
}

impl RsaKeyPair {
    /// Generate a key pair from two distinct primes sampled from the config's range.
    ///
    /// # Errors
    ///
    /// Propagates validation errors, [`CryptoError::PrimeGenerationExhausted`] and
    /// [`CryptoError::NoValidExponent`].
    pub fn generate<R: RngCore + CryptoRng>(config: &KeyGenConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;

        let range = &config.prime_range;
        let p = number::generate_prime(range, config.max_prime_attempts, rng)?;

        let mut q = number::generate_prime(range, config.max_prime_attempts, rng)?;
        let mut redraws = 0u32;
        while q == p {
            redraws += 1;
            if redraws >= config.max_prime_attempts {
                return Err(CryptoError::PrimeGenerationExhausted { attempts: redraws });
            }
            q = number::generate_prime(range, config.max_prime_attempts, rng)?;
        }

        Self::from_primes(p, q)
    }

    /// Build a key pair from known primes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParameter`] if either value is not prime or
    /// both are equal, and [`CryptoError::NoValidExponent`] if no `e` exists.
    pub fn from_primes(p: BigUint, q: BigUint) -> Result<Self> {
        if !number::is_prime(&p) || !number::is_prime(&q) {
            return Err(CryptoError::InvalidParameter(format!(
                "RSA factors must be prime (p={p}, q={q})"
            )));
        }
        if p == q {
            return Err(CryptoError::InvalidParameter(
                "RSA factors must be distinct".into(),
            ));
        }

        let n = &p * &q;
        let phi = (&p - 1u32) * (&q - 1u32);
        let e = number::choose_e(&phi)?;
        let d = number::mod_inverse(&e, &phi)?;

        tracing::debug!(n = %n, e = %e, "generated RSA key pair");

        Ok(Self { p, q, n, phi, e, d })
    }

    /// Public half of the key pair.
    #[must_use]
    pub fn public_key(&self) -> RsaPublicKey {
        RsaPublicKey {
            e: self.e.clone(),
            n: self.n.clone(),
        }
    }

    /// Decrypt with the private exponent: `ciphertext^d mod n`.
    #[must_use]
    pub fn decrypt(&self, ciphertext: &BigUint) -> BigUint {
        ciphertext.modpow(&self.d, &self.n)
    }

    /// Modulus `n = p * q`.
    #[must_use]
    pub fn n(&self) -> &BigUint {
        &self.n
    }

    /// Public exponent.
    #[must_use]
    pub fn e(&self) -> &BigUint {
        &self.e
    }

    /// Totient `(p - 1)(q - 1)`.
    #[must_use]
    pub fn phi(&self) -> &BigUint {
        &self.phi
    }

    /// Private exponent.
    ///
    /// # Security
    ///
    /// Exposes the secret exponent. Intended for verification only.
    #[must_use]
    pub fn private_exponent(&self) -> &BigUint {
        &self.d
    }

    /// The generating primes `(p, q)`.
    #[must_use]
    pub fn primes(&self) -> (&BigUint, &BigUint) {
        (&self.p, &self.q)
    }
}

impl fmt::Debug for RsaKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaKeyPair")
            .field("e", &self.e)
            .field("n", &self.n)
            .finish_non_exhaustive()
    }
}
