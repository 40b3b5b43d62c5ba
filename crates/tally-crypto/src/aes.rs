//! AES-128 block cipher (FIPS-197).
//!
//! The cipher state is a 4x4 byte matrix indexed `[row][col]`. Blocks and keys
//! map onto it column by column (`state[r][c] = bytes[r + 4c]`), so ShiftRows
//! rotates the rows and MixColumns mixes the columns exactly as in FIPS-197.
//!
//! Two layers are exposed:
//! - The round transforms and [`encrypt`]/[`decrypt`] on a [`State`], which
//!   derive the key schedule on every call.
//! - [`Aes128`], which caches one [`RoundKeys`] schedule and is what the CBC
//!   layer uses.
//!
//! Slice-accepting entry points ([`encrypt_block`], [`decrypt_block`],
//! [`State::try_from_slice`]) reject anything that is not exactly 16 bytes.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::gf::gmul;
use crate::{AES_KEY_SIZE, AES_ROUNDS, BLOCK_SIZE, CryptoError, Result};

/// Forward substitution box.
const SBOX: [u8; 256] = [
    0x63, 0x7c, 0x77, 0x7b, 0xf2, 0x6b, 0x6f, 0xc5, 0x30, 0x01, 0x67, 0x2b, 0xfe, 0xd7, 0xab, 0x76,
    0xca, 0x82, 0xc9, 0x7d, 0xfa, 0x59, 0x47, 0xf0, 0xad, 0xd4, 0xa2, 0xaf, 0x9c, 0xa4, 0x72, 0xc0,
    0xb7, 0xfd, 0x93, 0x26, 0x36, 0x3f, 0xf7, 0xcc, 0x34, 0xa5, 0xe5, 0xf1, 0x71, 0xd8, 0x31, 0x15,
    0x04, 0xc7, 0x23, 0xc3, 0x18, 0x96, 0x05, 0x9a, 0x07, 0x12, 0x80, 0xe2, 0xeb, 0x27, 0xb2, 0x75,
    0x09, 0x83, 0x2c, 0x1a, 0x1b, 0x6e, 0x5a, 0xa0, 0x52, 0x3b, 0xd6, 0xb3, 0x29, 0xe3, 0x2f, 0x84,
    0x53, 0xd1, 0x00, 0xed, 0x20, 0xfc, 0xb1, 0x5b, 0x6a, 0xcb, 0xbe, 0x39, 0x4a, 0x4c, 0x58, 0xcf,
    0xd0, 0xef, 0xaa, 0xfb, 0x43, 0x4d, 0x33, 0x85, 0x45, 0xf9, 0x02, 0x7f, 0x50, 0x3c, 0x9f, 0xa8,
    0x51, 0xa3, 0x40, 0x8f, 0x92, 0x9d, 0x38, 0xf5, 0xbc, 0xb6, 0xda, 0x21, 0x10, 0xff, 0xf3, 0xd2,
    0xcd, 0x0c, 0x13, 0xec, 0x5f, 0x97, 0x44, 0x17, 0xc4, 0xa7, 0x7e, 0x3d, 0x64, 0x5d, 0x19, 0x73,
    0x60, 0x81, 0x4f, 0xdc, 0x22, 0x2a, 0x90, 0x88, 0x46, 0xee, 0xb8, 0x14, 0xde, 0x5e, 0x0b, 0xdb,
    0xe0, 0x32, 0x3a, 0x0a, 0x49, 0x06, 0x24, 0x5c, 0xc2, 0xd3, 0xac, 0x62, 0x91, 0x95, 0xe4, 0x79,
    0xe7, 0xc8, 0x37, 0x6d, 0x8d, 0xd5, 0x4e, 0xa9, 0x6c, 0x56, 0xf4, 0xea, 0x65, 0x7a, 0xae, 0x08,
    0xba, 0x78, 0x25, 0x2e, 0x1c, 0xa6, 0xb4, 0xc6, 0xe8, 0xdd, 0x74, 0x1f, 0x4b, 0xbd, 0x8b, 0x8a,
    0x70, 0x3e, 0xb5, 0x66, 0x48, 0x03, 0xf6, 0x0e, 0x61, 0x35, 0x57, 0xb9, 0x86, 0xc1, 0x1d, 0x9e,
    0xe1, 0xf8, 0x98, 0x11, 0x69, 0xd9, 0x8e, 0x94, 0x9b, 0x1e, 0x87, 0xe9, 0xce, 0x55, 0x28, 0xdf,
    0x8c, 0xa1, 0x89, 0x0d, 0xbf, 0xe6, 0x42, 0x68, 0x41, 0x99, 0x2d, 0x0f, 0xb0, 0x54, 0xbb, 0x16,
];

/// Inverse substitution box.
const INV_SBOX: [u8; 256] = [
    0x52, 0x09, 0x6a, 0xd5, 0x30, 0x36, 0xa5, 0x38, 0xbf, 0x40, 0xa3, 0x9e, 0x81, 0xf3, 0xd7, 0xfb,
    0x7c, 0xe3, 0x39, 0x82, 0x9b, 0x2f, 0xff, 0x87, 0x34, 0x8e, 0x43, 0x44, 0xc4, 0xde, 0xe9, 0xcb,
    0x54, 0x7b, 0x94, 0x32, 0xa6, 0xc2, 0x23, 0x3d, 0xee, 0x4c, 0x95, 0x0b, 0x42, 0xfa, 0xc3, 0x4e,
    0x08, 0x2e, 0xa1, 0x66, 0x28, 0xd9, 0x24, 0xb2, 0x76, 0x5b, 0xa2, 0x49, 0x6d, 0x8b, 0xd1, 0x25,
    0x72, 0xf8, 0xf6, 0x64, 0x86, 0x68, 0x98, 0x16, 0xd4, 0xa4, 0x5c, 0xcc, 0x5d, 0x65, 0xb6, 0x92,
    0x6c, 0x70, 0x48, 0x50, 0xfd, 0xed, 0xb9, 0xda, 0x5e, 0x15, 0x46, 0x57, 0xa7, 0x8d, 0x9d, 0x84,
    0x90, 0xd8, 0xab, 0x00, 0x8c, 0xbc, 0xd3, 0x0a, 0xf7, 0xe4, 0x58, 0x05, 0xb8, 0xb3, 0x45, 0x06,
    0xd0, 0x2c, 0x1e, 0x8f, 0xca, 0x3f, 0x0f, 0x02, 0xc1, 0xaf, 0xbd, 0x03, 0x01, 0x13, 0x8a, 0x6b,
    0x3a, 0x91, 0x11, 0x41, 0x4f, 0x67, 0xdc, 0xea, 0x97, 0xf2, 0xcf, 0xce, 0xf0, 0xb4, 0xe6, 0x73,
    0x96, 0xac, 0x74, 0x22, 0xe7, 0xad, 0x35, 0x85, 0xe2, 0xf9, 0x37, 0xe8, 0x1c, 0x75, 0xdf, 0x6e,
    0x47, 0xf1, 0x1a, 0x71, 0x1d, 0x29, 0xc5, 0x89, 0x6f, 0xb7, 0x62, 0x0e, 0xaa, 0x18, 0xbe, 0x1b,
    0xfc, 0x56, 0x3e, 0x4b, 0xc6, 0xd2, 0x79, 0x20, 0x9a, 0xdb, 0xc0, 0xfe, 0x78, 0xcd, 0x5a, 0xf4,
    0x1f, 0xdd, 0xa8, 0x33, 0x88, 0x07, 0xc7, 0x31, 0xb1, 0x12, 0x10, 0x59, 0x27, 0x80, 0xec, 0x5f,
    0x60, 0x51, 0x7f, 0xa9, 0x19, 0xb5, 0x4a, 0x0d, 0x2d, 0xe5, 0x7a, 0x9f, 0x93, 0xc9, 0x9c, 0xef,
    0xa0, 0xe0, 0x3b, 0x4d, 0xae, 0x2a, 0xf5, 0xb0, 0xc8, 0xeb, 0xbb, 0x3c, 0x83, 0x53, 0x99, 0x61,
    0x17, 0x2b, 0x04, 0x7e, 0xba, 0x77, 0xd6, 0x26, 0xe1, 0x69, 0x14, 0x63, 0x55, 0x21, 0x0c, 0x7d,
];

/// Round constants for key expansion.
const RCON: [u8; AES_ROUNDS] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x1b, 0x36];

/// Number of round keys in an AES-128 schedule.
pub const ROUND_KEY_COUNT: usize = AES_ROUNDS + 1;

/// 4x4 AES state, indexed `[row][col]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Zeroize)]
pub struct State(pub [[u8; 4]; 4]);

impl State {
    /// Lay 16 bytes into the state column by column.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; BLOCK_SIZE]) -> Self {
        let mut state = [[0u8; 4]; 4];
        for (i, byte) in bytes.iter().enumerate() {
            state[i % 4][i / 4] = *byte;
        }
        Self(state)
    }

    /// Build a state from a slice, rejecting anything but 16 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidBlockShape`] if `bytes.len() != 16`.
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self> {
        let block: &[u8; BLOCK_SIZE] =
            bytes.try_into().map_err(|_| CryptoError::InvalidBlockShape {
                expected: BLOCK_SIZE,
                actual: bytes.len(),
            })?;
        Ok(Self::from_bytes(block))
    }

    /// Read the state back out column by column.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; BLOCK_SIZE] {
        let mut out = [0u8; BLOCK_SIZE];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = self.0[i % 4][i / 4];
        }
        out
    }

    /// Column `c` as a 4-byte word.
    #[must_use]
    pub fn column(&self, c: usize) -> [u8; 4] {
        [self.0[0][c], self.0[1][c], self.0[2][c], self.0[3][c]]
    }

    fn set_column(&mut self, c: usize, word: [u8; 4]) {
        for (r, byte) in word.into_iter().enumerate() {
            self.0[r][c] = byte;
        }
    }
}

/// Expanded key schedule: eleven round keys shaped like the state.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct RoundKeys([State; ROUND_KEY_COUNT]);

impl RoundKeys {
    /// Round key `round` (0..=10).
    #[must_use]
    pub fn round(&self, round: usize) -> &State {
        &self.0[round]
    }

    /// All round keys in order.
    #[must_use]
    pub fn as_slice(&self) -> &[State] {
        &self.0
    }
}

/// Substitute every byte through the S-box.
pub fn sub_bytes(state: &mut State) {
    for row in &mut state.0 {
        for byte in row.iter_mut() {
            *byte = SBOX[usize::from(*byte)];
        }
    }
}

/// Substitute every byte through the inverse S-box.
pub fn inv_sub_bytes(state: &mut State) {
    for row in &mut state.0 {
        for byte in row.iter_mut() {
            *byte = INV_SBOX[usize::from(*byte)];
        }
    }
}

/// Rotate row `r` left by `r` positions; row 0 is untouched.
pub fn shift_rows(state: &mut State) {
    for (r, row) in state.0.iter_mut().enumerate().skip(1) {
        row.rotate_left(r);
    }
}

/// Rotate row `r` right by `r` positions.
pub fn inv_shift_rows(state: &mut State) {
    for (r, row) in state.0.iter_mut().enumerate().skip(1) {
        row.rotate_right(r);
    }
}

fn mix_single_column(col: [u8; 4]) -> [u8; 4] {
    [
        gmul(col[0], 2) ^ gmul(col[1], 3) ^ col[2] ^ col[3],
        col[0] ^ gmul(col[1], 2) ^ gmul(col[2], 3) ^ col[3],
        col[0] ^ col[1] ^ gmul(col[2], 2) ^ gmul(col[3], 3),
        gmul(col[0], 3) ^ col[1] ^ col[2] ^ gmul(col[3], 2),
    ]
}

fn inv_mix_single_column(col: [u8; 4]) -> [u8; 4] {
    [
        gmul(col[0], 0x0e) ^ gmul(col[1], 0x0b) ^ gmul(col[2], 0x0d) ^ gmul(col[3], 0x09),
        gmul(col[0], 0x09) ^ gmul(col[1], 0x0e) ^ gmul(col[2], 0x0b) ^ gmul(col[3], 0x0d),
        gmul(col[0], 0x0d) ^ gmul(col[1], 0x09) ^ gmul(col[2], 0x0e) ^ gmul(col[3], 0x0b),
        gmul(col[0], 0x0b) ^ gmul(col[1], 0x0d) ^ gmul(col[2], 0x09) ^ gmul(col[3], 0x0e),
    ]
}

/// Multiply each column by the MDS matrix {2,3,1,1}.
pub fn mix_columns(state: &mut State) {
    for c in 0..4 {
        let mixed = mix_single_column(state.column(c));
        state.set_column(c, mixed);
    }
}

/// Multiply each column by the inverse MDS matrix {14,11,13,9}.
pub fn inv_mix_columns(state: &mut State) {
    for c in 0..4 {
        let mixed = inv_mix_single_column(state.column(c));
        state.set_column(c, mixed);
    }
}

/// XOR the state with a round key.
pub fn add_round_key(state: &mut State, round_key: &State) {
    for (row, key_row) in state.0.iter_mut().zip(round_key.0.iter()) {
        for (byte, key_byte) in row.iter_mut().zip(key_row.iter()) {
            *byte ^= key_byte;
        }
    }
}

/// Expand a 16-byte key into the eleven round keys.
#[must_use]
pub fn key_expansion(key: &[u8; AES_KEY_SIZE]) -> RoundKeys {
    let mut keys = [State::default(); ROUND_KEY_COUNT];
    keys[0] = State::from_bytes(key);

    for i in 0..AES_ROUNDS {
        let prev = keys[i];
        let mut next = State::default();

        // RotWord + SubWord + Rcon on the last column of the previous key
        let mut word = prev.column(3);
        word.rotate_left(1);
        for byte in &mut word {
            *byte = SBOX[usize::from(*byte)];
        }
        word[0] ^= RCON[i];

        let mut col = xor_word(prev.column(0), word);
        next.set_column(0, col);
        for c in 1..4 {
            col = xor_word(col, prev.column(c));
            next.set_column(c, col);
        }
        keys[i + 1] = next;
    }

    let schedule = RoundKeys(keys);
    keys.zeroize();
    schedule
}

fn xor_word(a: [u8; 4], b: [u8; 4]) -> [u8; 4] {
    [a[0] ^ b[0], a[1] ^ b[1], a[2] ^ b[2], a[3] ^ b[3]]
}

fn encrypt_with_schedule(state: &mut State, keys: &RoundKeys) {
    add_round_key(state, keys.round(0));
    for round in 1..AES_ROUNDS {
        sub_bytes(state);
        shift_rows(state);
        mix_columns(state);
        add_round_key(state, keys.round(round));
    }
    sub_bytes(state);
    shift_rows(state);
    add_round_key(state, keys.round(AES_ROUNDS));
}

fn decrypt_with_schedule(state: &mut State, keys: &RoundKeys) {
    add_round_key(state, keys.round(AES_ROUNDS));
    inv_shift_rows(state);
    inv_sub_bytes(state);
    for round in (1..AES_ROUNDS).rev() {
        add_round_key(state, keys.round(round));
        inv_mix_columns(state);
        inv_shift_rows(state);
        inv_sub_bytes(state);
    }
    add_round_key(state, keys.round(0));
}

/// Encrypt one state under `key`, expanding the schedule for this call.
#[must_use]
pub fn encrypt(mut state: State, key: &[u8; AES_KEY_SIZE]) -> State {
    let keys = key_expansion(key);
    encrypt_with_schedule(&mut state, &keys);
    state
}

/// Decrypt one state under `key`, expanding the schedule for this call.
#[must_use]
pub fn decrypt(mut state: State, key: &[u8; AES_KEY_SIZE]) -> State {
    let keys = key_expansion(key);
    decrypt_with_schedule(&mut state, &keys);
    state
}

fn key_from_slice(key: &[u8]) -> Result<&[u8; AES_KEY_SIZE]> {
    key.try_into().map_err(|_| CryptoError::InvalidKeyLength {
        expected: AES_KEY_SIZE,
        actual: key.len(),
    })
}

/// Encrypt a 16-byte block given as a slice.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidBlockShape`] or [`CryptoError::InvalidKeyLength`]
/// if either input is not 16 bytes.
pub fn encrypt_block(block: &[u8], key: &[u8]) -> Result<[u8; BLOCK_SIZE]> {
    let state = State::try_from_slice(block)?;
    let key = key_from_slice(key)?;
    Ok(encrypt(state, key).to_bytes())
}

/// Decrypt a 16-byte block given as a slice.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidBlockShape`] or [`CryptoError::InvalidKeyLength`]
/// if either input is not 16 bytes.
pub fn decrypt_block(block: &[u8], key: &[u8]) -> Result<[u8; BLOCK_SIZE]> {
    let state = State::try_from_slice(block)?;
    let key = key_from_slice(key)?;
    Ok(decrypt(state, key).to_bytes())
}

/// AES-128 with a cached key schedule.
#[derive(Clone)]
pub struct Aes128 {
    keys: RoundKeys,
}

impl Aes128 {
    /// Expand `key` once for repeated block operations.
    #[must_use]
    pub fn new(key: &[u8; AES_KEY_SIZE]) -> Self {
        Self {
            keys: key_expansion(key),
        }
    }

    /// Create from a key slice.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] if `key.len() != 16`.
    pub fn from_slice(key: &[u8]) -> Result<Self> {
        Ok(Self::new(key_from_slice(key)?))
    }

    /// Encrypt one block in place.
    pub fn encrypt_block(&self, block: &mut [u8; BLOCK_SIZE]) {
        let mut state = State::from_bytes(block);
        encrypt_with_schedule(&mut state, &self.keys);
        *block = state.to_bytes();
        state.zeroize();
    }

    /// Decrypt one block in place.
    pub fn decrypt_block(&self, block: &mut [u8; BLOCK_SIZE]) {
        let mut state = State::from_bytes(block);
        decrypt_with_schedule(&mut state, &self.keys);
        *block = state.to_bytes();
        state.zeroize();
    }

    /// The expanded schedule.
    #[must_use]
    pub fn round_keys(&self) -> &RoundKeys {
        &self.keys
    }
}
