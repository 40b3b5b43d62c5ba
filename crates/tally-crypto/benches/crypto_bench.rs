//! Performance benchmarks for tally-crypto.
//!
//! Run with: `cargo bench -p tally-crypto`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use num_bigint::BigUint;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tally_crypto::aes::{self, Aes128};
use tally_crypto::cbc;
use tally_crypto::dh::{DhParams, SharedSecret};
use tally_crypto::kdf;
use tally_crypto::number::{self, PrimeRange};
use tally_crypto::rsa::{KeyGenConfig, RsaKeyPair};
use tally_crypto::{Participant, PeerSessions};

// ============================================================================
// AES Benchmarks
// ============================================================================

fn bench_key_expansion(c: &mut Criterion) {
    let key = [0x42u8; 16];
    c.bench_function("aes_key_expansion", |b| {
        b.iter(|| aes::key_expansion(black_box(&key)))
    });
}

fn bench_block_encrypt(c: &mut Criterion) {
    let cipher = Aes128::new(&[0x42u8; 16]);
    c.bench_function("aes_block_encrypt", |b| {
        b.iter(|| {
            let mut block = [0xAAu8; 16];
            cipher.encrypt_block(black_box(&mut block));
            block
        })
    });
    c.bench_function("aes_block_decrypt", |b| {
        b.iter(|| {
            let mut block = [0xAAu8; 16];
            cipher.decrypt_block(black_box(&mut block));
            block
        })
    });
}

// ============================================================================
// CBC Benchmarks
// ============================================================================

fn bench_cbc_seal(c: &mut Criterion) {
    let mut group = c.benchmark_group("cbc_seal");
    let key = [0x42u8; 16];
    let iv = [0x24u8; 16];

    for size in [16, 256, 1024, 4096] {
        let plaintext = vec![0xAA; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| cbc::seal_with_iv(black_box(&key), black_box(&iv), black_box(&plaintext)))
        });
    }

    group.finish();
}

fn bench_cbc_open(c: &mut Criterion) {
    let mut group = c.benchmark_group("cbc_open");
    let key = [0x42u8; 16];
    let iv = [0x24u8; 16];

    for size in [16, 256, 1024, 4096] {
        let envelope = cbc::seal_with_iv(&key, &iv, &vec![0xAA; size]);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| cbc::open_bytes(black_box(&key), black_box(&envelope)))
        });
    }

    group.finish();
}

// ============================================================================
// Number Theory and RSA Benchmarks
// ============================================================================

fn bench_generate_prime(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let range = PrimeRange::insecure_demo();
    c.bench_function("generate_prime_demo_range", |b| {
        b.iter(|| number::generate_prime(&range, number::DEFAULT_MAX_PRIME_ATTEMPTS, &mut rng))
    });
}

fn bench_rsa_keygen(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(2);
    let config = KeyGenConfig::insecure_demo();
    c.bench_function("rsa_keygen_demo", |b| {
        b.iter(|| RsaKeyPair::generate(black_box(&config), &mut rng))
    });
}

// ============================================================================
// Key Agreement Benchmarks
// ============================================================================

fn bench_dh_and_kdf(c: &mut Criterion) {
    let params = DhParams::demo();
    let mut rng = StdRng::seed_from_u64(3);
    let private = params.generate_private(&mut rng);
    let peer = params.public_value(&params.generate_private(&mut rng));

    c.bench_function("dh_shared_secret_demo", |b| {
        b.iter(|| params.shared_secret(black_box(&private), black_box(&peer)))
    });

    let secret = SharedSecret::from(BigUint::from(1729u32));
    c.bench_function("hkdf_session_key", |b| {
        b.iter(|| kdf::derive_aes_key(black_box(&secret)))
    });
}

fn bench_full_handshake(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(4);
    let config = KeyGenConfig::insecure_demo();
    let alice_keys = RsaKeyPair::generate(&config, &mut rng).unwrap();
    let bob_keys = RsaKeyPair::generate(&config, &mut rng).unwrap();

    c.bench_function("handshake_two_party", |b| {
        b.iter(|| {
            let mut alice = Participant::with_keys("Alice", alice_keys.clone());
            let mut bob = Participant::with_keys("Bob", bob_keys.clone());
            bob.receive_public_key(alice.public_key_message()).unwrap();
            alice.receive_public_key(bob.public_key_message()).unwrap();
            bob.receive_parameters(alice.propose_parameters(DhParams::demo()))
                .unwrap();
            let from_alice = alice.offer_dh_public(&mut rng).unwrap();
            let from_bob = bob.offer_dh_public(&mut rng).unwrap();
            bob.receive_dh_public(from_alice).unwrap();
            alice.receive_dh_public(from_bob).unwrap();
            alice
        })
    });

    c.bench_function("peer_sessions_begin", |b| {
        let sessions = PeerSessions::new("hub", alice_keys.clone());
        b.iter(|| sessions.begin(black_box("voter"), DhParams::demo()))
    });
}

criterion_group!(aes_benches, bench_key_expansion, bench_block_encrypt,);

criterion_group!(cbc_benches, bench_cbc_seal, bench_cbc_open,);

criterion_group!(rsa_benches, bench_generate_prime, bench_rsa_keygen,);

criterion_group!(handshake_benches, bench_dh_and_kdf, bench_full_handshake,);

criterion_main!(aes_benches, cbc_benches, rsa_benches, handshake_benches);
