//! CBC chaining, PKCS#7 padding and the `IV || ciphertext` envelope.
//!
//! Messages are padded to a multiple of 16 bytes, chained through AES-128 with
//! a random IV and framed as:
//!
//! ```text
//! +----------------+-----------------------------+
//! |   IV (16 B)    |  ciphertext (16 * k B, k>0) |
//! +----------------+-----------------------------+
//! ```
//!
//! The envelope carries no MAC. Tampering is only caught when it corrupts the
//! padding trailer or the UTF-8 encoding of the recovered text.

use subtle::{Choice, ConstantTimeEq};

use crate::aes::Aes128;
use crate::random::random_iv;
use crate::{AES_KEY_SIZE, BLOCK_SIZE, CryptoError, IV_SIZE, Result};

/// Apply PKCS#7 padding to a multiple of the block size.
///
/// A full block of padding is appended when the input is already aligned.
#[must_use]
pub fn pad(data: &[u8]) -> Vec<u8> {
    let pad_len = BLOCK_SIZE - data.len() % BLOCK_SIZE;
    let mut out = Vec::with_capacity(data.len() + pad_len);
    out.extend_from_slice(data);
    out.resize(data.len() + pad_len, pad_len as u8);
    out
}

/// Strip and validate a PKCS#7 trailer.
///
/// # Errors
///
/// Returns [`CryptoError::PaddingError`] if the input is empty or unaligned, the
/// last byte is outside `1..=16`, or the trailer bytes disagree with it.
pub fn unpad(data: &[u8]) -> Result<&[u8]> {
    if data.is_empty() || data.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::PaddingError);
    }

    let pad_byte = data[data.len() - 1];
    let pad_len = usize::from(pad_byte);
    if pad_len == 0 || pad_len > BLOCK_SIZE {
        return Err(CryptoError::PaddingError);
    }

    let trailer = &data[data.len() - pad_len..];
    let mut valid = Choice::from(1u8);
    for byte in trailer {
        valid &= byte.ct_eq(&pad_byte);
    }
    if !bool::from(valid) {
        return Err(CryptoError::PaddingError);
    }

    Ok(&data[..data.len() - pad_len])
}

/// CBC-encrypt `plaintext` after padding it. Returns the ciphertext only.
#[must_use]
pub fn encrypt_with_iv(cipher: &Aes128, iv: &[u8; IV_SIZE], plaintext: &[u8]) -> Vec<u8> {
    let mut buf = pad(plaintext);
    let mut chain = *iv;

    for chunk in buf.chunks_exact_mut(BLOCK_SIZE) {
        let mut block = [0u8; BLOCK_SIZE];
        for (out, (p, c)) in block.iter_mut().zip(chunk.iter().zip(chain.iter())) {
            *out = p ^ c;
        }
        cipher.encrypt_block(&mut block);
        chunk.copy_from_slice(&block);
        chain = block;
    }

    buf
}

/// CBC-decrypt `ciphertext` and strip its padding.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidCiphertextLength`] if the ciphertext is empty
/// or not block aligned, and [`CryptoError::PaddingError`] on a bad trailer.
pub fn decrypt_with_iv(
    cipher: &Aes128,
    iv: &[u8; IV_SIZE],
    ciphertext: &[u8],
) -> Result<Vec<u8>> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::InvalidCiphertextLength(ciphertext.len()));
    }

    let mut out = Vec::with_capacity(ciphertext.len());
    let mut chain = *iv;

    for chunk in ciphertext.chunks_exact(BLOCK_SIZE) {
        let mut block = [0u8; BLOCK_SIZE];
        block.copy_from_slice(chunk);
        let next_chain = block;
        cipher.decrypt_block(&mut block);
        for (byte, c) in block.iter_mut().zip(chain.iter()) {
            *byte ^= c;
        }
        out.extend_from_slice(&block);
        chain = next_chain;
    }

    let len = unpad(&out)?.len();
    out.truncate(len);
    Ok(out)
}

/// Encrypt text under `key` with a fresh random IV, returning `IV || ciphertext`.
///
/// # Errors
///
/// Returns [`CryptoError::RandomFailed`] if no IV could be drawn.
pub fn seal(key: &[u8; AES_KEY_SIZE], plaintext: &str) -> Result<Vec<u8>> {
    let iv = random_iv()?;
    Ok(seal_with_iv(key, &iv, plaintext.as_bytes()))
}

/// Encrypt raw bytes under `key` with a caller-chosen IV, returning `IV || ciphertext`.
#[must_use]
pub fn seal_with_iv(key: &[u8; AES_KEY_SIZE], iv: &[u8; IV_SIZE], plaintext: &[u8]) -> Vec<u8> {
    let cipher = Aes128::new(key);
    let ciphertext = encrypt_with_iv(&cipher, iv, plaintext);

    let mut envelope = Vec::with_capacity(IV_SIZE + ciphertext.len());
    envelope.extend_from_slice(iv);
    envelope.extend_from_slice(&ciphertext);
    envelope
}

/// Split an envelope into IV and ciphertext, decrypt and unpad, returning raw bytes.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidCiphertextLength`] for envelopes shorter than
/// two blocks or not block aligned, and [`CryptoError::PaddingError`] on a bad trailer.
pub fn open_bytes(key: &[u8; AES_KEY_SIZE], envelope: &[u8]) -> Result<Vec<u8>> {
    if envelope.len() < IV_SIZE + BLOCK_SIZE || envelope.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::InvalidCiphertextLength(envelope.len()));
    }

    let (iv, ciphertext) = envelope.split_at(IV_SIZE);
    let mut iv_bytes = [0u8; IV_SIZE];
    iv_bytes.copy_from_slice(iv);

    let cipher = Aes128::new(key);
    decrypt_with_iv(&cipher, &iv_bytes, ciphertext)
}

/// Decrypt an envelope and decode the plaintext as UTF-8.
///
/// # Errors
///
/// As [`open_bytes`], plus [`CryptoError::InvalidUtf8`] if the recovered bytes
/// are not text.
pub fn open(key: &[u8; AES_KEY_SIZE], envelope: &[u8]) -> Result<String> {
    let bytes = open_bytes(key, envelope)?;
    String::from_utf8(bytes).map_err(|_| CryptoError::InvalidUtf8)
}
