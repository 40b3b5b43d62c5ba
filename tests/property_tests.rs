//! Property-based tests for TALLY
//!
//! Uses proptest to verify invariants across large input spaces.

use proptest::prelude::*;

// ============================================================================
// AES Block Cipher Properties
// ============================================================================

mod aes_properties {
    use super::*;
    use tally_crypto::aes::{self, Aes128, State};

    proptest! {
        /// Decrypting an encrypted block restores it for every key
        #[test]
        fn block_roundtrip(key in any::<[u8; 16]>(), block in any::<[u8; 16]>()) {
            let ciphertext = aes::encrypt_block(&block, &key).unwrap();
            prop_assert_eq!(aes::decrypt_block(&ciphertext, &key).unwrap(), block);
        }

        /// The cached key schedule matches the one-shot functions
        #[test]
        fn cached_schedule_matches_one_shot(
            key in any::<[u8; 16]>(),
            block in any::<[u8; 16]>(),
        ) {
            let mut cached = block;
            Aes128::new(&key).encrypt_block(&mut cached);
            prop_assert_eq!(cached, aes::encrypt(State::from_bytes(&block), &key).to_bytes());
        }

        /// Each round transform is undone by its inverse
        #[test]
        fn round_steps_invert(block in any::<[u8; 16]>(), round_key in any::<[u8; 16]>()) {
            let original = State::from_bytes(&block);
            let rk = State::from_bytes(&round_key);

            let mut s = original;
            aes::sub_bytes(&mut s);
            aes::inv_sub_bytes(&mut s);
            prop_assert_eq!(s, original);

            aes::shift_rows(&mut s);
            aes::inv_shift_rows(&mut s);
            prop_assert_eq!(s, original);

            aes::mix_columns(&mut s);
            aes::inv_mix_columns(&mut s);
            prop_assert_eq!(s, original);

            aes::add_round_key(&mut s, &rk);
            aes::add_round_key(&mut s, &rk);
            prop_assert_eq!(s, original);
        }

        /// Blocks of any length other than 16 are rejected
        #[test]
        fn wrong_block_length_rejected(len in 0usize..64) {
            prop_assume!(len != 16);
            let data = vec![0u8; len];
            prop_assert!(aes::encrypt_block(&data, &[0u8; 16]).is_err());
            prop_assert!(aes::encrypt_block(&[0u8; 16], &data).is_err());
        }
    }
}

// ============================================================================
// GF(2^8) Properties
// ============================================================================

mod gf_properties {
    use super::*;
    use tally_crypto::gf::gmul;

    proptest! {
        /// Multiplication is commutative and distributes over XOR
        #[test]
        fn field_laws(a in any::<u8>(), b in any::<u8>(), c in any::<u8>()) {
            prop_assert_eq!(gmul(a, b), gmul(b, a));
            prop_assert_eq!(gmul(a, b ^ c), gmul(a, b) ^ gmul(a, c));
            prop_assert_eq!(gmul(a, 1), a);
            prop_assert_eq!(gmul(a, 0), 0);
        }
    }
}

// ============================================================================
// CBC Envelope Properties
// ============================================================================

mod cbc_properties {
    use super::*;
    use tally_crypto::cbc;

    proptest! {
        /// Sealing then opening restores any text
        #[test]
        fn envelope_roundtrip(key in any::<[u8; 16]>(), text in ".{0,200}") {
            let envelope = cbc::seal(&key, &text).unwrap();
            prop_assert_eq!(cbc::open(&key, &envelope).unwrap(), text);
        }

        /// Envelopes are IV plus whole blocks, always padded
        #[test]
        fn envelope_length(
            key in any::<[u8; 16]>(),
            data in prop::collection::vec(any::<u8>(), 0..200),
        ) {
            let envelope = cbc::seal_with_iv(&key, &[7u8; 16], &data);
            prop_assert_eq!(envelope.len(), 16 + (data.len() / 16 + 1) * 16);
        }

        /// Two seals of the same text differ but have equal length
        #[test]
        fn fresh_iv_per_seal(key in any::<[u8; 16]>(), text in ".{0,64}") {
            let a = cbc::seal(&key, &text).unwrap();
            let b = cbc::seal(&key, &text).unwrap();
            prop_assert_ne!(&a, &b);
            prop_assert_eq!(a.len(), b.len());
        }

        /// Unpadding accepts exactly what padding produced
        #[test]
        fn pad_unpad(data in prop::collection::vec(any::<u8>(), 0..100)) {
            let padded = cbc::pad(&data);
            prop_assert_eq!(padded.len() % 16, 0);
            prop_assert_eq!(cbc::unpad(&padded).unwrap(), &data[..]);
        }

        /// Opening arbitrary bytes never panics
        #[test]
        fn open_garbage(
            key in any::<[u8; 16]>(),
            data in prop::collection::vec(any::<u8>(), 0..96),
        ) {
            let _ = cbc::open(&key, &data);
        }
    }
}

// ============================================================================
// Number Theory and RSA Properties
// ============================================================================

mod rsa_properties {
    use super::*;
    use num_bigint::BigUint;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tally_crypto::number::{self, DEFAULT_MAX_PRIME_ATTEMPTS, PrimeRange};
    use tally_crypto::rsa::{KeyGenConfig, RsaKeyPair};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Generated primes are prime, odd and in range
        #[test]
        fn generated_primes_in_range(
            seed in any::<u64>(),
            low in 3u32..2000,
            width in 50u32..2000,
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let range = PrimeRange::new(low, low + width).unwrap();
            let p = number::generate_prime(&range, DEFAULT_MAX_PRIME_ATTEMPTS, &mut rng).unwrap();
            prop_assert!(number::is_prime(&p));
            prop_assert!(range.contains(&p));
            prop_assert_eq!(&p % 2u32, BigUint::from(1u32));
        }

        /// Key pairs satisfy e * d = 1 mod phi and decrypt every message below n
        #[test]
        fn textbook_rsa_correct(seed in any::<u64>(), m in any::<u32>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let keys = RsaKeyPair::generate(&KeyGenConfig::insecure_demo(), &mut rng).unwrap();
            prop_assert_eq!((keys.e() * keys.private_exponent()) % keys.phi(), BigUint::from(1u32));

            let m = BigUint::from(m) % keys.n();
            let c = keys.public_key().encrypt(&m).unwrap();
            prop_assert_eq!(keys.decrypt(&c), m);
        }

        /// Modular inverse satisfies its defining identity
        #[test]
        fn mod_inverse_identity(e in 1u64..10_000, phi in 2u64..10_000) {
            let (e, phi) = (BigUint::from(e), BigUint::from(phi));
            match number::mod_inverse(&e, &phi) {
                Ok(d) => {
                    prop_assert!(d < phi);
                    prop_assert_eq!((&e * &d) % &phi, BigUint::from(1u32) % &phi);
                }
                Err(_) => prop_assert_ne!(num_integer::Integer::gcd(&e, &phi), BigUint::from(1u32)),
            }
        }
    }
}

// ============================================================================
// Diffie-Hellman and Handshake Properties
// ============================================================================

mod dh_properties {
    use super::*;
    use num_bigint::BigUint;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tally_crypto::dh::{DhParams, DhPrivate};
    use tally_integration_tests::fixtures::TwoPartyFixture;

    const SMALL_PRIMES: [u32; 8] = [23, 47, 101, 499, 1009, 2357, 7919, 65_537];

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Both sides compute the same shared secret
        #[test]
        fn shared_secret_agreement(
            idx in 0usize..8,
            g in 2u32..1000,
            a in 2u32..100_000,
            b in 2u32..100_000,
        ) {
            let p = SMALL_PRIMES[idx];
            let params = DhParams::new(2 + g % (p - 2), p).unwrap();
            let a = DhPrivate::from_exponent(BigUint::from(a));
            let b = DhPrivate::from_exponent(BigUint::from(b));

            let s_a = params.shared_secret(&a, &params.public_value(&b)).unwrap();
            let s_b = params.shared_secret(&b, &params.public_value(&a)).unwrap();
            prop_assert_eq!(s_a.value(), s_b.value());
        }

        /// Private exponents stay inside [2, p - 2]
        #[test]
        fn private_exponent_range(seed in any::<u64>(), idx in 0usize..8) {
            let p = SMALL_PRIMES[idx];
            let params = DhParams::new(2u32, p).unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            let x = params.generate_private(&mut rng);
            prop_assert!(*x.exponent() >= BigUint::from(2u32));
            prop_assert!(*x.exponent() <= BigUint::from(p - 2));
        }

        /// A full handshake always yields matching keys and a working channel
        #[test]
        fn handshake_always_agrees(seed in any::<u64>(), text in ".{0,64}") {
            let mut fixture = TwoPartyFixture::new(seed).unwrap();
            fixture.establish().unwrap();
            prop_assert_eq!(
                fixture.alice.session().key().unwrap(),
                fixture.bob.session().key().unwrap()
            );
            let envelope = fixture.alice.aes_encrypt(&text).unwrap();
            prop_assert_eq!(fixture.bob.aes_decrypt(&envelope).unwrap(), text);
        }
    }
}
