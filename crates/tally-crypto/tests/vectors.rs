//! Known-answer tests from published specifications.
//!
//! This module contains test vectors from:
//! - FIPS-197 (AES-128 cipher example and appendix C.1)
//! - NIST SP 800-38A F.2.1 / F.2.2 (CBC-AES128)
//! - HKDF-SHA256 (RFC 5869 construction) with the session-key label

use num_bigint::BigUint;
use tally_crypto::aes::{self, Aes128, State};
use tally_crypto::cbc;
use tally_crypto::dh::SharedSecret;
use tally_crypto::kdf;

fn decode_hex<const N: usize>(hex: &str) -> [u8; N] {
    hex::decode(hex).unwrap().try_into().unwrap()
}

// ============================================================================
// FIPS-197 Test Vectors (AES-128)
// ============================================================================

#[test]
fn test_aes128_fips197_appendix_c1() {
    let key: [u8; 16] = decode_hex("000102030405060708090a0b0c0d0e0f");
    let plaintext: [u8; 16] = decode_hex("00112233445566778899aabbccddeeff");
    let expected: [u8; 16] = decode_hex("69c4e0d86a7b0430d8cdb78070b4c55a");

    let ciphertext = aes::encrypt_block(&plaintext, &key).unwrap();
    assert_eq!(ciphertext, expected);
    assert_eq!(aes::decrypt_block(&ciphertext, &key).unwrap(), plaintext);
}

#[test]
fn test_aes128_fips197_cipher_example() {
    // Appendix B
    let key: [u8; 16] = decode_hex("2b7e151628aed2a6abf7158809cf4f3c");
    let plaintext: [u8; 16] = decode_hex("3243f6a8885a308d313198a2e0370734");
    let expected: [u8; 16] = decode_hex("3925841d02dc09fbdc118597196a0b32");

    let state = aes::encrypt(State::from_bytes(&plaintext), &key);
    assert_eq!(state.to_bytes(), expected);
    assert_eq!(aes::decrypt(state, &key).to_bytes(), plaintext);
}

#[test]
fn test_aes128_key_expansion_appendix_a1() {
    let key: [u8; 16] = decode_hex("2b7e151628aed2a6abf7158809cf4f3c");
    let schedule = aes::key_expansion(&key);

    // round 1 key = w[4..8], round 10 key = w[40..44]
    let round1: [u8; 16] = decode_hex("a0fafe1788542cb123a339392a6c7605");
    let round10: [u8; 16] = decode_hex("d014f9a8c9ee2589e13f0cc8b6630ca6");
    assert_eq!(schedule.round(0).to_bytes(), key);
    assert_eq!(schedule.round(1).to_bytes(), round1);
    assert_eq!(schedule.round(10).to_bytes(), round10);
}

// ============================================================================
// NIST SP 800-38A Test Vectors (CBC-AES128)
// ============================================================================

const SP800_38A_KEY: &str = "2b7e151628aed2a6abf7158809cf4f3c";
const SP800_38A_IV: &str = "000102030405060708090a0b0c0d0e0f";
const SP800_38A_PLAINTEXT: &str = concat!(
    "6bc1bee22e409f96e93d7e117393172a",
    "ae2d8a571e03ac9c9eb76fac45af8e51",
    "30c81c46a35ce411e5fbc1191a0a52ef",
    "f69f2445df4f9b17ad2b417be66c3710",
);
const SP800_38A_CIPHERTEXT: &str = concat!(
    "7649abac8119b246cee98e9b12e9197d",
    "5086cb9b507219ee95db113a917678b2",
    "73bed6b8e3c1743b7116e69e22229516",
    "3ff1caa1681fac09120eca307586e1a7",
);

#[test]
fn test_cbc_aes128_sp800_38a_encrypt() {
    let cipher = Aes128::new(&decode_hex(SP800_38A_KEY));
    let iv: [u8; 16] = decode_hex(SP800_38A_IV);
    let plaintext = hex::decode(SP800_38A_PLAINTEXT).unwrap();

    let ciphertext = cbc::encrypt_with_iv(&cipher, &iv, &plaintext);

    // aligned input gains one full padding block
    assert_eq!(ciphertext.len(), plaintext.len() + 16);
    assert_eq!(hex::encode(&ciphertext[..64]), SP800_38A_CIPHERTEXT);
}

#[test]
fn test_cbc_aes128_sp800_38a_envelope() {
    let key: [u8; 16] = decode_hex(SP800_38A_KEY);
    let iv: [u8; 16] = decode_hex(SP800_38A_IV);
    let plaintext = hex::decode(SP800_38A_PLAINTEXT).unwrap();

    let envelope = cbc::seal_with_iv(&key, &iv, &plaintext);
    assert_eq!(&envelope[..16], &iv);
    assert_eq!(hex::encode(&envelope[16..80]), SP800_38A_CIPHERTEXT);
    assert_eq!(cbc::open_bytes(&key, &envelope).unwrap(), plaintext);
}

// ============================================================================
// HKDF-SHA256 Session Key Vectors
// ============================================================================

#[test]
fn test_session_key_vectors() {
    // HKDF-SHA256(ikm = decimal(secret), salt = none, info = "AES key derivation", L = 16)
    let cases = [
        (2u64, "5d297d38ec71559afd40e54e9527b531"),
        (1234, "c6bd32976b7b01c0670bfedd217c29ec"),
        (987_654_321, "496fbe624c465233f33d880428bad35f"),
    ];

    for (secret, expected) in cases {
        let key = kdf::derive_aes_key(&SharedSecret::from(BigUint::from(secret))).unwrap();
        assert_eq!(hex::encode(key.as_bytes()), expected, "secret {secret}");
    }
}

#[test]
fn test_session_key_fingerprint() {
    let key = kdf::derive_aes_key(&SharedSecret::from(BigUint::from(2u32))).unwrap();
    assert_eq!(key.fingerprint(), "605a37dc");
}
