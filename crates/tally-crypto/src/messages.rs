//! Handshake wire messages.
//!
//! Messages are JSON objects tagged by `type`. Big integers travel as decimal
//! strings and ciphertext envelopes as lowercase hex.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::dh::DhParams;
use crate::rsa::RsaPublicKey;
use crate::{CryptoError, Result};

/// One step of the handshake or an encrypted application message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HandshakeMessage {
    /// Sender's RSA public key
    RsaPublicKey {
        /// Public exponent
        #[serde(with = "decimal")]
        e: BigUint,
        /// Modulus
        #[serde(with = "decimal")]
        n: BigUint,
    },
    /// DH group parameters proposed by the initiator
    DhParameters {
        /// Generator
        #[serde(with = "decimal")]
        base: BigUint,
        /// Prime modulus
        #[serde(with = "decimal")]
        modulus: BigUint,
    },
    /// Sender's DH public value, RSA-encrypted to the receiver
    EncryptedDhPublic {
        /// RSA ciphertext
        #[serde(with = "decimal")]
        value: BigUint,
    },
    /// `IV || ciphertext` envelope under the session key
    Ciphertext {
        /// Envelope bytes
        #[serde(with = "hex_bytes")]
        envelope: Vec<u8>,
    },
}

impl HandshakeMessage {
    /// Short name of the message kind, for logs and errors.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RsaPublicKey { .. } => "rsa_public_key",
            Self::DhParameters { .. } => "dh_parameters",
            Self::EncryptedDhPublic { .. } => "encrypted_dh_public",
            Self::Ciphertext { .. } => "ciphertext",
        }
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidMessage`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| CryptoError::InvalidMessage(e.to_string()))
    }

    /// Parse from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidMessage`] for malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CryptoError::InvalidMessage(e.to_string()))
    }

    /// Extract a validated RSA public key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidMessage`] for any other message kind.
    pub fn into_rsa_public_key(self) -> Result<RsaPublicKey> {
        match self {
            Self::RsaPublicKey { e, n } => RsaPublicKey::new(e, n),
            other => Err(unexpected("rsa_public_key", &other)),
        }
    }

    /// Extract validated DH parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidMessage`] for any other message kind.
    pub fn into_dh_params(self) -> Result<DhParams> {
        match self {
            Self::DhParameters { base, modulus } => DhParams::new(base, modulus),
            other => Err(unexpected("dh_parameters", &other)),
        }
    }

    /// Extract the RSA-encrypted DH public value.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidMessage`] for any other message kind.
    pub fn into_encrypted_dh_public(self) -> Result<BigUint> {
        match self {
            Self::EncryptedDhPublic { value } => Ok(value),
            other => Err(unexpected("encrypted_dh_public", &other)),
        }
    }

    /// Extract a ciphertext envelope.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidMessage`] for any other message kind.
    pub fn into_envelope(self) -> Result<Vec<u8>> {
        match self {
            Self::Ciphertext { envelope } => Ok(envelope),
            other => Err(unexpected("ciphertext", &other)),
        }
    }
}

impl From<&RsaPublicKey> for HandshakeMessage {
    fn from(key: &RsaPublicKey) -> Self {
        Self::RsaPublicKey {
            e: key.e().clone(),
            n: key.n().clone(),
        }
    }
}

impl From<&DhParams> for HandshakeMessage {
    fn from(params: &DhParams) -> Self {
        Self::DhParameters {
            base: params.base().clone(),
            modulus: params.modulus().clone(),
        }
    }
}

fn unexpected(expected: &str, got: &HandshakeMessage) -> CryptoError {
    CryptoError::InvalidMessage(format!("expected {expected}, got {}", got.kind()))
}

mod decimal {
    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let s = String::deserialize(deserializer)?;
        BigUint::parse_bytes(s.as_bytes(), 10)
            .ok_or_else(|| de::Error::custom(format!("invalid decimal integer: {s:?}")))
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(de::Error::custom)
    }
}
