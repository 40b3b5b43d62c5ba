//! Finite-field Diffie-Hellman key agreement.
//!
//! Both parties share `(g, p)`, draw a private exponent from `[2, p - 2]` and
//! publish `g^x mod p`. Raising the peer's value to one's own exponent yields
//! the same `g^(ab) mod p` on both sides.

use std::fmt;

use num_bigint::{BigUint, RandBigInt};
use num_traits::Zero;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{CryptoError, Result};

/// Base used by the demo deployment.
pub const DEMO_BASE: u32 = 5;

/// Prime modulus used by the demo deployment.
pub const DEMO_MODULUS: u32 = 2357;

/// Smallest modulus leaving a non-empty private range `[2, p - 2]`.
const MIN_MODULUS: u32 = 5;

/// Shared group parameters `(g, p)`.
///
/// Deserialization applies the same checks as [`DhParams::new`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDhParams")]
pub struct DhParams {
    base: BigUint,
    modulus: BigUint,
}

#[derive(Deserialize)]
struct RawDhParams {
    base: BigUint,
    modulus: BigUint,
}

impl TryFrom<RawDhParams> for DhParams {
    type Error = CryptoError;

    fn try_from(raw: RawDhParams) -> Result<Self> {
        Self::new(raw.base, raw.modulus)
    }
}

impl DhParams {
    /// Build parameters agreed with the peer.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParameter`] if `modulus < 5` or the base is
    /// outside `[2, modulus - 1]`.
    pub fn new(base: impl Into<BigUint>, modulus: impl Into<BigUint>) -> Result<Self> {
        let (base, modulus) = (base.into(), modulus.into());
        if modulus < BigUint::from(MIN_MODULUS) {
            return Err(CryptoError::InvalidParameter(format!(
                "DH modulus {modulus} is too small"
            )));
        }
        if base < BigUint::from(2u32) || base >= modulus {
            return Err(CryptoError::InvalidParameter(format!(
                "DH base {base} is outside [2, {modulus})"
            )));
        }
        Ok(Self { base, modulus })
    }

    /// The `(5, 2357)` group of the demo deployment.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            base: BigUint::from(DEMO_BASE),
            modulus: BigUint::from(DEMO_MODULUS),
        }
    }

    /// Generator `g`.
    #[must_use]
    pub fn base(&self) -> &BigUint {
        &self.base
    }

    /// Modulus `p`.
    #[must_use]
    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// Draw a private exponent uniformly from `[2, p - 2]`.
    pub fn generate_private<R: RngCore + CryptoRng>(&self, rng: &mut R) -> DhPrivate {
        // exclusive upper bound p - 1
        let upper = &self.modulus - 1u32;
        DhPrivate(rng.gen_biguint_range(&BigUint::from(2u32), &upper))
    }

    /// Public value `g^x mod p`.
    #[must_use]
    pub fn public_value(&self, private: &DhPrivate) -> BigUint {
        self.base.modpow(&private.0, &self.modulus)
    }

    /// Shared secret `peer_public^x mod p`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParameter`] if `peer_public` is zero or not
    /// reduced modulo `p`.
    pub fn shared_secret(
        &self,
        private: &DhPrivate,
        peer_public: &BigUint,
    ) -> Result<SharedSecret> {
        if peer_public.is_zero() || *peer_public >= self.modulus {
            return Err(CryptoError::InvalidParameter(format!(
                "peer DH value {peer_public} is outside [1, {})",
                self.modulus
            )));
        }
        Ok(SharedSecret(peer_public.modpow(&private.0, &self.modulus)))
    }
}

/// Private DH exponent.
#[derive(Clone, PartialEq, Eq)]
pub struct DhPrivate(BigUint);

impl DhPrivate {
    /// Wrap a known exponent.
    #[must_use]
    pub fn from_exponent(exponent: BigUint) -> Self {
        Self(exponent)
    }

    /// The raw exponent.
    ///
    /// # Security
    ///
    /// Exposes the secret exponent.
    #[must_use]
    pub fn exponent(&self) -> &BigUint {
        &self.0
    }
}

impl fmt::Debug for DhPrivate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DhPrivate(..)")
    }
}

/// Agreed DH value, consumed by key derivation.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret(BigUint);

impl SharedSecret {
    /// The agreed integer.
    #[must_use]
    pub fn value(&self) -> &BigUint {
        &self.0
    }

    /// Base-10 rendering fed to the KDF.
    #[must_use]
    pub fn to_decimal(&self) -> String {
        self.0.to_str_radix(10)
    }
}

impl From<BigUint> for SharedSecret {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}
