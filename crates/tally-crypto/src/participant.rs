//! A named handshake participant.
//!
//! A [`Participant`] owns an RSA identity and a single [`Session`]. The
//! step-by-step methods mirror the handshake operations one to one; the
//! message methods drive the same steps from [`HandshakeMessage`]s.
//!
//! The handshake between an initiator (Alice) and a responder (Bob):
//!
//! 1. Both exchange RSA public keys.
//! 2. Alice proposes DH parameters; both install them.
//! 3. Both generate a DH private value.
//! 4. Both compute their DH public value.
//! 5. Both RSA-encrypt their public value under the peer's key and send it.
//! 6. Both RSA-decrypt the received value.
//! 7. Both compute the shared secret.
//! 8. Both derive the AES session key.

use num_bigint::BigUint;
use rand_core::{CryptoRng, RngCore};

use crate::dh::{DhParams, SharedSecret};
use crate::kdf::SessionKey;
use crate::messages::HandshakeMessage;
use crate::rsa::{self, KeyGenConfig, RsaKeyPair, RsaPublicKey};
use crate::session::{Session, Stage};
use crate::{CryptoError, Result};

/// A party to the handshake.
#[derive(Debug)]
pub struct Participant {
    name: String,
    keys: RsaKeyPair,
    session: Session,
}

impl Participant {
    /// Create a participant with a freshly generated RSA key pair.
    ///
    /// # Errors
    ///
    /// Propagates key generation errors.
    pub fn new<R: RngCore + CryptoRng>(
        name: impl Into<String>,
        config: &KeyGenConfig,
        rng: &mut R,
    ) -> Result<Self> {
        let keys = RsaKeyPair::generate(config, rng)?;
        Ok(Self::with_keys(name, keys))
    }

    /// Create a participant around an existing key pair.
    #[must_use]
    pub fn with_keys(name: impl Into<String>, keys: RsaKeyPair) -> Self {
        let name = name.into();
        tracing::debug!(participant = %name, n = %keys.n(), "participant created");
        Self {
            name,
            keys,
            session: Session::new(),
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// RSA public key to hand to peers.
    #[must_use]
    pub fn public_key(&self) -> RsaPublicKey {
        self.keys.public_key()
    }

    /// RSA key pair.
    #[must_use]
    pub fn keys(&self) -> &RsaKeyPair {
        &self.keys
    }

    /// Handshake state.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current handshake stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.session.stage()
    }

    /// Record the peer's RSA public key.
    pub fn set_peer_key(&mut self, key: RsaPublicKey) {
        self.session.set_peer_key(key);
    }

    /// Install DH group parameters.
    pub fn set_dh_parameters(&mut self, params: DhParams) {
        self.session.set_parameters(params);
    }

    /// Draw the DH private value.
    ///
    /// # Errors
    ///
    /// See [`Session::generate_private`].
    pub fn generate_dh_private<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> Result<()> {
        self.session.generate_private(rng)
    }

    /// Compute the DH public value.
    ///
    /// # Errors
    ///
    /// See [`Session::calculate_public`].
    pub fn calculate_dh_public(&mut self) -> Result<BigUint> {
        self.session.calculate_public()
    }

    /// RSA-encrypt `message` under a peer's public key `(other_e, other_n)`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CryptoError::MessageOutOfRange`] if `message >= other_n`.
    pub fn rsa_encrypt(
        &self,
        message: &BigUint,
        other_e: &BigUint,
        other_n: &BigUint,
    ) -> Result<BigUint> {
        rsa::encrypt(message, other_e, other_n)
    }

    /// RSA-decrypt with the own private key.
    #[must_use]
    pub fn rsa_decrypt(&self, ciphertext: &BigUint) -> BigUint {
        self.keys.decrypt(ciphertext)
    }

    /// Compute the shared secret from the peer's DH public value.
    ///
    /// # Errors
    ///
    /// See [`Session::calculate_shared_secret`].
    pub fn calculate_shared_secret(&mut self, peer_public: &BigUint) -> Result<SharedSecret> {
        self.session.calculate_shared_secret(peer_public)
    }

    /// Derive and install the AES session key.
    ///
    /// # Errors
    ///
    /// See [`Session::derive_key`].
    pub fn derive_aes_key(&mut self, secret: &SharedSecret) -> Result<SessionKey> {
        let key = self.session.derive_key(secret)?.clone();
        tracing::info!(participant = %self.name, key = %key.fingerprint(), "session key derived");
        Ok(key)
    }

    /// Encrypt text under the session key.
    ///
    /// # Errors
    ///
    /// See [`Session::encrypt`].
    pub fn aes_encrypt(&self, plaintext: &str) -> Result<Vec<u8>> {
        self.session.encrypt(plaintext)
    }

    /// Decrypt an envelope under the session key.
    ///
    /// # Errors
    ///
    /// See [`Session::decrypt`].
    pub fn aes_decrypt(&self, envelope: &[u8]) -> Result<String> {
        self.session.decrypt(envelope)
    }

    // -- message-driven handshake --

    /// Step 1: announce the own RSA public key.
    #[must_use]
    pub fn public_key_message(&self) -> HandshakeMessage {
        HandshakeMessage::from(&self.keys.public_key())
    }

    /// Step 1: accept the peer's RSA public key.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CryptoError::InvalidMessage`] for the wrong message kind.
    pub fn receive_public_key(&mut self, msg: HandshakeMessage) -> Result<()> {
        let key = msg.into_rsa_public_key()?;
        tracing::debug!(participant = %self.name, n = %key.n(), "received peer public key");
        self.session.set_peer_key(key);
        Ok(())
    }

    /// Step 2 (initiator): install `params` and return the message proposing them.
    pub fn propose_parameters(&mut self, params: DhParams) -> HandshakeMessage {
        let msg = HandshakeMessage::from(&params);
        self.session.set_parameters(params);
        msg
    }

    /// Step 2 (responder): install the proposed parameters.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CryptoError::InvalidMessage`] for the wrong message kind
    /// and [`crate::CryptoError::InvalidParameter`] for an unusable group.
    pub fn receive_parameters(&mut self, msg: HandshakeMessage) -> Result<()> {
        let params = msg.into_dh_params()?;
        self.session.set_parameters(params);
        Ok(())
    }

    /// Steps 3 to 5: generate the DH key and send the public value sealed
    /// under the peer's RSA key.
    ///
    /// Once the public value exists, calling this again reseals it, e.g. after
    /// a failed attempt or a new peer key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotReady`] before parameters and the peer key
    /// are known, and [`CryptoError::MessageOutOfRange`] if the peer modulus
    /// cannot hold the DH value.
    pub fn offer_dh_public<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
    ) -> Result<HandshakeMessage> {
        if self.session.peer_key().is_none() {
            return Err(CryptoError::KeyNotReady("peer RSA public key not received"));
        }
        match self.session.stage() {
            Stage::DhPublicComputed => {}
            Stage::DhParamsSet => {
                self.session.generate_private(rng)?;
                self.session.calculate_public()?;
            }
            Stage::DhPrivateGenerated => {
                self.session.calculate_public()?;
            }
            _ => return Err(CryptoError::KeyNotReady("DH parameters must be set first")),
        }
        let value = self.session.sealed_public_for_peer()?;
        Ok(HandshakeMessage::EncryptedDhPublic { value })
    }

    /// Steps 6 to 8: open the peer's sealed DH value and derive the session key.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CryptoError::KeyNotReady`] before the own public value is
    /// computed, plus message and parameter errors.
    pub fn receive_dh_public(&mut self, msg: HandshakeMessage) -> Result<()> {
        let sealed = msg.into_encrypted_dh_public()?;
        let key = self.session.accept_sealed_public(&self.keys, &sealed)?;
        tracing::info!(participant = %self.name, key = %key.fingerprint(), "session key derived");
        Ok(())
    }

    /// Encrypt text into a ciphertext message.
    ///
    /// # Errors
    ///
    /// See [`Session::encrypt`].
    pub fn seal(&self, plaintext: &str) -> Result<HandshakeMessage> {
        let envelope = self.session.encrypt(plaintext)?;
        Ok(HandshakeMessage::Ciphertext { envelope })
    }

    /// Decrypt a ciphertext message.
    ///
    /// # Errors
    ///
    /// See [`Session::decrypt`].
    pub fn open(&self, msg: HandshakeMessage) -> Result<String> {
        let envelope = msg.into_envelope()?;
        self.session.decrypt(&envelope)
    }
}
