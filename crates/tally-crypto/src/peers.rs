//! Per-peer session registry.
//!
//! One RSA identity can run independent handshakes with many peers. Each peer
//! gets its own [`Session`] and therefore its own DH exponent and session key.
//!
//! ```text
//!                  ┌──────────────────────────┐
//!   peer id ──────▶│  PeerSessions (DashMap)  │
//!                  └────────────┬─────────────┘
//!                               │
//!             ┌─────────────────┼─────────────────┐
//!             ▼                 ▼                 ▼
//!        Session(bob)     Session(carol)    Session(dave)
//! ```
//!
//! # Thread Safety
//!
//! Entries live in a `DashMap`, so all operations take `&self` and can be
//! called from several tasks at once. Operations on one peer never touch the
//! state of another.

use dashmap::DashMap;
use dashmap::mapref::one::RefMut;
use num_bigint::BigUint;
use rand_core::{CryptoRng, RngCore};

use crate::dh::DhParams;
use crate::rsa::{RsaKeyPair, RsaPublicKey};
use crate::session::{Session, Stage};
use crate::{CryptoError, Result};

/// Handshake sessions keyed by peer id.
#[derive(Debug)]
pub struct PeerSessions {
    name: String,
    keys: RsaKeyPair,
    sessions: DashMap<String, Session>,
}

impl PeerSessions {
    /// Create an empty registry for the given identity.
    #[must_use]
    pub fn new(name: impl Into<String>, keys: RsaKeyPair) -> Self {
        Self {
            name: name.into(),
            keys,
            sessions: DashMap::new(),
        }
    }

    /// Local display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local RSA public key.
    #[must_use]
    pub fn public_key(&self) -> RsaPublicKey {
        self.keys.public_key()
    }

    /// Record a peer's RSA public key, registering the peer if new.
    pub fn accept_peer_key(&self, peer: &str, key: RsaPublicKey) {
        tracing::debug!(local = %self.name, peer, "peer public key accepted");
        self.sessions
            .entry(peer.to_owned())
            .or_default()
            .set_peer_key(key);
    }

    /// Install DH parameters for a peer, registering the peer if new.
    ///
    /// An established session is restarted.
    pub fn begin(&self, peer: &str, params: DhParams) {
        tracing::debug!(local = %self.name, peer, "handshake started");
        self.sessions
            .entry(peer.to_owned())
            .or_default()
            .set_parameters(params);
    }

    /// Start a fresh handshake with an established peer.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnknownPeer`] if the peer is not registered.
    pub fn rekey(&self, peer: &str, params: DhParams) -> Result<()> {
        self.session_mut(peer)?.set_parameters(params);
        tracing::info!(local = %self.name, peer, "rekey started");
        Ok(())
    }

    /// Draw the DH private value for a peer.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnknownPeer`] or the session's stage errors.
    pub fn generate_private<R: RngCore + CryptoRng>(
        &self,
        peer: &str,
        rng: &mut R,
    ) -> Result<()> {
        self.session_mut(peer)?.generate_private(rng)
    }

    /// Compute the DH public value for a peer.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnknownPeer`] or the session's stage errors.
    pub fn calculate_public(&self, peer: &str) -> Result<BigUint> {
        self.session_mut(peer)?.calculate_public()
    }

    /// The own DH public value sealed under the peer's RSA key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnknownPeer`], or [`CryptoError::KeyNotReady`]
    /// before the public value and the peer key are known.
    pub fn encrypt_dh_public_for(&self, peer: &str) -> Result<BigUint> {
        self.session_mut(peer)?.sealed_public_for_peer()
    }

    /// Open the peer's sealed DH value, compute the secret and derive the key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnknownPeer`] or the session's stage errors.
    pub fn receive_encrypted_dh_public(&self, peer: &str, sealed: &BigUint) -> Result<()> {
        let mut session = self.session_mut(peer)?;
        let key = session.accept_sealed_public(&self.keys, sealed)?;
        tracing::info!(local = %self.name, peer, key = %key.fingerprint(), "session established");
        Ok(())
    }

    /// Compute the shared secret and derive the key from a plain DH value.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnknownPeer`] or the session's stage errors.
    pub fn establish(&self, peer: &str, peer_public: &BigUint) -> Result<()> {
        let mut session = self.session_mut(peer)?;
        let secret = session.calculate_shared_secret(peer_public)?;
        let key = session.derive_key(&secret)?;
        tracing::info!(local = %self.name, peer, key = %key.fingerprint(), "session established");
        Ok(())
    }

    /// Encrypt text for a peer.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnknownPeer`] or [`CryptoError::KeyNotReady`].
    pub fn encrypt_for(&self, peer: &str, plaintext: &str) -> Result<Vec<u8>> {
        self.session(peer, |s| s.encrypt(plaintext))
    }

    /// Decrypt an envelope received from a peer.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnknownPeer`], [`CryptoError::KeyNotReady`] or
    /// envelope errors.
    pub fn decrypt_from(&self, peer: &str, envelope: &[u8]) -> Result<String> {
        self.session(peer, |s| s.decrypt(envelope))
    }

    /// Handshake stage for a peer.
    #[must_use]
    pub fn stage(&self, peer: &str) -> Option<Stage> {
        self.sessions.get(peer).map(|s| s.stage())
    }

    /// Forget a peer. Returns whether it was registered.
    pub fn remove(&self, peer: &str) -> bool {
        let removed = self.sessions.remove(peer).is_some();
        if removed {
            tracing::debug!(local = %self.name, peer, "session removed");
        }
        removed
    }

    /// Peers with a derived session key, sorted.
    #[must_use]
    pub fn established_peers(&self) -> Vec<String> {
        let mut peers: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().is_established())
            .map(|entry| entry.key().clone())
            .collect();
        peers.sort();
        peers
    }

    /// Number of registered peers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no peers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn session_mut(&self, peer: &str) -> Result<RefMut<'_, String, Session>> {
        self.sessions
            .get_mut(peer)
            .ok_or_else(|| CryptoError::UnknownPeer(peer.to_owned()))
    }

    fn session<T>(&self, peer: &str, f: impl FnOnce(&Session) -> Result<T>) -> Result<T> {
        let session = self
            .sessions
            .get(peer)
            .ok_or_else(|| CryptoError::UnknownPeer(peer.to_owned()))?;
        f(session.value())
    }
}
