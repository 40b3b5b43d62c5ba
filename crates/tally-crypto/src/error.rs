//! Cryptographic error types.

use thiserror::Error;

/// Cryptographic errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Block cipher input is not a 16-byte / 4x4 block
    #[error("invalid block shape: expected {expected} bytes, got {actual}")]
    InvalidBlockShape {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Invalid key length
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Envelope is too short or not block aligned
    #[error("invalid ciphertext length: {0}")]
    InvalidCiphertextLength(usize),

    /// Malformed PKCS#7 trailer after CBC decryption
    #[error("invalid padding")]
    PaddingError,

    /// Decrypted plaintext is not valid UTF-8
    #[error("decrypted plaintext is not valid UTF-8")]
    InvalidUtf8,

    /// Handshake operation invoked before its prerequisite stage
    #[error("key material not ready: {0}")]
    KeyNotReady(&'static str),

    /// No public exponent coprime to phi(n) was found
    #[error("no valid public exponent found")]
    NoValidExponent,

    /// Prime sampling hit its attempt cap
    #[error("prime generation exhausted after {attempts} attempts")]
    PrimeGenerationExhausted {
        /// Attempts made before giving up
        attempts: u32,
    },

    /// Key derivation failed
    #[error("key derivation failed")]
    KeyDerivationFailed,

    /// Invalid parameter
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Demo-sized parameters requested without opting in
    #[error("insecure parameters rejected: {0}")]
    InsecureParameters(String),

    /// RSA message is not smaller than the modulus
    #[error("message out of range for modulus")]
    MessageOutOfRange,

    /// Random number generation failed
    #[error("random number generation failed")]
    RandomFailed,

    /// No session registered for the peer
    #[error("unknown peer: {0}")]
    UnknownPeer(String),

    /// Invalid message format
    #[error("invalid message format: {0}")]
    InvalidMessage(String),
}
