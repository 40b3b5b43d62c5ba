//! Secure random number generation.
//!
//! All randomness comes from the operating system CSPRNG.

use crate::{BLOCK_SIZE, CryptoError, IV_SIZE};

/// Fill a buffer with random bytes from the OS CSPRNG.
///
/// # Errors
///
/// Returns [`CryptoError::RandomFailed`] if the underlying OS CSPRNG fails.
pub fn fill_random(buf: &mut [u8]) -> Result<(), CryptoError> {
    getrandom::getrandom(buf).map_err(|_| CryptoError::RandomFailed)
}

/// Generate a fresh CBC initialization vector.
///
/// # Errors
///
/// Returns [`CryptoError::RandomFailed`] if the underlying OS CSPRNG fails.
pub fn random_iv() -> Result<[u8; IV_SIZE], CryptoError> {
    let mut iv = [0u8; IV_SIZE];
    fill_random(&mut iv)?;
    Ok(iv)
}

/// Generate a random 16-byte block.
///
/// # Errors
///
/// Returns [`CryptoError::RandomFailed`] if the underlying OS CSPRNG fails.
pub fn random_block() -> Result<[u8; BLOCK_SIZE], CryptoError> {
    let mut buf = [0u8; BLOCK_SIZE];
    fill_random(&mut buf)?;
    Ok(buf)
}
