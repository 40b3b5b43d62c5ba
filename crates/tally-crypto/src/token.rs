//! Voter tokens.
//!
//! A token is one AES-128 encryption of a random block under a random key,
//! rendered as 32 lowercase hex characters. Neither input is kept, so the token
//! is an unlinkable random identifier.

use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::aes::{self, State};
use crate::{AES_KEY_SIZE, BLOCK_SIZE};

/// Length of a token in hex characters.
pub const TOKEN_LEN: usize = BLOCK_SIZE * 2;

/// Generate a fresh token from a random state and key.
pub fn generate_token<R: RngCore + CryptoRng>(rng: &mut R) -> String {
    let mut block = [0u8; BLOCK_SIZE];
    let mut key = [0u8; AES_KEY_SIZE];
    rng.fill_bytes(&mut block);
    rng.fill_bytes(&mut key);

    let token = token_from_parts(State::from_bytes(&block), &key);
    block.zeroize();
    key.zeroize();

    tracing::debug!(prefix = &token[..16], "generated token");
    token
}

/// Token for a given state and key.
#[must_use]
pub fn token_from_parts(state: State, key: &[u8; AES_KEY_SIZE]) -> String {
    hex::encode(aes::encrypt(state, key).to_bytes())
}
