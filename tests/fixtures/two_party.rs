//! Two-party test fixture for integration testing
//!
//! Provides a reusable Alice/Bob pair with demo-sized RSA identities:
//! - Message-driven handshake over JSON
//! - Access to both participants for tampering and stage checks
//!
//! # Example
//!
//! ```no_run
//! use tally_integration_tests::fixtures::TwoPartyFixture;
//!
//! let mut fixture = TwoPartyFixture::new(7).unwrap();
//! fixture.establish().unwrap();
//! let envelope = fixture.alice.aes_encrypt("hello").unwrap();
//! assert_eq!(fixture.bob.aes_decrypt(&envelope).unwrap(), "hello");
//! ```

use rand::SeedableRng;
use rand::rngs::StdRng;
use tally_crypto::Participant;
use tally_crypto::Result;
use tally_crypto::dh::DhParams;
use tally_crypto::messages::HandshakeMessage;
use tally_crypto::rsa::KeyGenConfig;

/// Alice (initiator) and Bob (responder) with a deterministic RNG
pub struct TwoPartyFixture {
    pub alice: Participant,
    pub bob: Participant,
    pub rng: StdRng,
    params: DhParams,
}

impl TwoPartyFixture {
    /// Create both participants from `seed` using the demo group
    pub fn new(seed: u64) -> Result<Self> {
        Self::with_params(seed, DhParams::demo())
    }

    /// Create both participants from `seed` using the given group
    pub fn with_params(seed: u64, params: DhParams) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let config = KeyGenConfig::insecure_demo();
        let alice = Participant::new("Alice", &config, &mut rng)?;
        let bob = Participant::new("Bob", &config, &mut rng)?;
        Ok(Self {
            alice,
            bob,
            rng,
            params,
        })
    }

    /// Run the full handshake, passing every message through JSON
    pub fn establish(&mut self) -> Result<()> {
        self.bob
            .receive_public_key(wire(&self.alice.public_key_message())?)?;
        self.alice
            .receive_public_key(wire(&self.bob.public_key_message())?)?;

        let proposal = self.alice.propose_parameters(self.params.clone());
        self.bob.receive_parameters(wire(&proposal)?)?;

        let from_alice = self.alice.offer_dh_public(&mut self.rng)?;
        let from_bob = self.bob.offer_dh_public(&mut self.rng)?;
        self.bob.receive_dh_public(wire(&from_alice)?)?;
        self.alice.receive_dh_public(wire(&from_bob)?)?;
        Ok(())
    }
}

/// Serialize and parse a message as it would cross the network
pub fn wire(msg: &HandshakeMessage) -> Result<HandshakeMessage> {
    HandshakeMessage::from_json(&msg.to_json()?)
}
