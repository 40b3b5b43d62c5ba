//! # TALLY Crypto
//!
//! Cryptographic core for the TALLY vote-collection system.
//!
//! This crate provides:
//! - A from-scratch AES-128 block cipher (FIPS-197) and its GF(2^8) arithmetic
//! - CBC chaining with PKCS#7 padding and a self-describing `IV || ciphertext` envelope
//! - Number-theoretic primitives (trial-division primality, modular inverse)
//! - Textbook RSA and finite-field Diffie-Hellman
//! - HKDF-SHA256 derivation of the 128-bit session key
//! - A two-party handshake state machine and a multi-peer session table
//!
//! ## Cryptographic Suite
//!
//! | Function | Algorithm | Notes |
//! |----------|-----------|-------|
//! | Block cipher | AES-128 | Table S-box, not constant time |
//! | Mode | CBC + PKCS#7 | Random IV per message, no MAC |
//! | Key transport | Textbook RSA | No padding, demo-sized primes |
//! | Key agreement | Finite-field DH | Caller-chosen (g, p) |
//! | KDF | HKDF-SHA256 | info = `"AES key derivation"`, no salt |
//!
//! ## Security
//!
//! The RSA and DH layers reproduce a teaching protocol: primes come from a small
//! range, RSA is unpadded and the ciphertext envelope is unauthenticated. Key
//! generation refuses small prime ranges unless
//! [`rsa::KeyGenConfig::allow_insecure`] is set.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aes;
pub mod cbc;
pub mod dh;
pub mod error;
pub mod gf;
pub mod kdf;
pub mod messages;
pub mod number;
pub mod participant;
pub mod peers;
pub mod random;
pub mod rsa;
pub mod session;
pub mod token;

pub use error::CryptoError;
pub use participant::Participant;
pub use peers::PeerSessions;

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// AES-128 key size in bytes
pub const AES_KEY_SIZE: usize = 16;

/// CBC initialization vector size in bytes
pub const IV_SIZE: usize = 16;

/// Number of AES-128 rounds
pub const AES_ROUNDS: usize = 10;

/// HKDF info label used when deriving the session key
pub const KDF_INFO: &[u8] = b"AES key derivation";

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, CryptoError>;
