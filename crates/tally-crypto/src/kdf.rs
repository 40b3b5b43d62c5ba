//! Session key derivation.
//!
//! The DH shared secret is rendered as its decimal string and fed to
//! HKDF-SHA256 with no salt and the fixed info label `"AES key derivation"`,
//! producing the 16-byte AES-128 session key.

use std::fmt;

use hkdf::Hkdf;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::dh::SharedSecret;
use crate::{AES_KEY_SIZE, CryptoError, KDF_INFO, Result};

/// AES-128 session key, wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; AES_KEY_SIZE]);

impl SessionKey {
    /// Wrap raw key bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; AES_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; AES_KEY_SIZE] {
        &self.0
    }

    /// Short public identifier for logs: first 4 bytes of SHA-256(key), hex.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::Digest;
        let digest = Sha256::digest(self.0);
        hex::encode(&digest[..4])
    }
}

impl PartialEq for SessionKey {
    fn eq(&self, other: &Self) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl Eq for SessionKey {}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionKey({})", self.fingerprint())
    }
}

/// Derive the session key from a DH shared secret.
///
/// # Errors
///
/// Returns [`CryptoError::KeyDerivationFailed`] if HKDF rejects the output length.
pub fn derive_aes_key(shared_secret: &SharedSecret) -> Result<SessionKey> {
    let mut ikm = shared_secret.to_decimal().into_bytes();
    let hk = Hkdf::<Sha256>::new(None, &ikm);

    let mut okm = [0u8; AES_KEY_SIZE];
    let expanded = hk.expand(KDF_INFO, &mut okm);
    ikm.zeroize();
    expanded.map_err(|_| CryptoError::KeyDerivationFailed)?;

    let key = SessionKey::from_bytes(okm);
    okm.zeroize();
    tracing::debug!(fingerprint = %key.fingerprint(), "derived session key");
    Ok(key)
}
