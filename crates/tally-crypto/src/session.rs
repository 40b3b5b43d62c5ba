//! Handshake state for one secure channel.
//!
//! A [`Session`] walks through the stages below in order. Every operation
//! checks that its predecessor has run and fails with
//! [`CryptoError::KeyNotReady`] otherwise.
//!
//! ```text
//! Initialized
//!     | set_parameters
//! DhParamsSet
//!     | generate_private
//! DhPrivateGenerated
//!     | calculate_public
//! DhPublicComputed
//!     | calculate_shared_secret
//! SharedSecretComputed
//!     | derive_key
//! KeyDerived  --set_parameters-->  DhParamsSet (rekey)
//! ```
//!
//! The peer's RSA public key is tracked beside the stage: it is exchanged first
//! and only needed when sealing our DH value for the peer.

use std::fmt;

use num_bigint::BigUint;
use rand_core::{CryptoRng, RngCore};

use crate::cbc;
use crate::dh::{DhParams, DhPrivate, SharedSecret};
use crate::kdf::{self, SessionKey};
use crate::rsa::{RsaKeyPair, RsaPublicKey};
use crate::{CryptoError, Result};

/// Observable handshake stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Identity keys exist, no DH state yet
    Initialized,
    /// Group parameters agreed
    DhParamsSet,
    /// Private exponent drawn
    DhPrivateGenerated,
    /// Own public value computed
    DhPublicComputed,
    /// Shared secret computed, awaiting key derivation
    SharedSecretComputed,
    /// Session key installed; channel ready
    KeyDerived,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initialized => "initialized",
            Self::DhParamsSet => "dh-params-set",
            Self::DhPrivateGenerated => "dh-private-generated",
            Self::DhPublicComputed => "dh-public-computed",
            Self::SharedSecretComputed => "shared-secret-computed",
            Self::KeyDerived => "key-derived",
        };
        f.write_str(name)
    }
}

enum HandshakeState {
    Initialized,
    DhParamsSet {
        params: DhParams,
    },
    DhPrivateGenerated {
        params: DhParams,
        private: DhPrivate,
    },
    DhPublicComputed {
        params: DhParams,
        private: DhPrivate,
        public: BigUint,
    },
    SharedSecretComputed {
        secret: SharedSecret,
    },
    KeyDerived {
        key: SessionKey,
    },
}

impl HandshakeState {
    fn stage(&self) -> Stage {
        match self {
            Self::Initialized => Stage::Initialized,
            Self::DhParamsSet { .. } => Stage::DhParamsSet,
            Self::DhPrivateGenerated { .. } => Stage::DhPrivateGenerated,
            Self::DhPublicComputed { .. } => Stage::DhPublicComputed,
            Self::SharedSecretComputed { .. } => Stage::SharedSecretComputed,
            Self::KeyDerived { .. } => Stage::KeyDerived,
        }
    }
}

/// Per-channel handshake and session-key state.
pub struct Session {
    state: HandshakeState,
    peer_key: Option<RsaPublicKey>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Fresh session with no DH state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: HandshakeState::Initialized,
            peer_key: None,
        }
    }

    /// Current stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    /// Whether the session key has been derived.
    #[must_use]
    pub fn is_established(&self) -> bool {
        self.stage() == Stage::KeyDerived
    }

    /// Record the peer's RSA public key.
    pub fn set_peer_key(&mut self, key: RsaPublicKey) {
        self.peer_key = Some(key);
    }

    /// The peer's RSA public key, if received.
    #[must_use]
    pub fn peer_key(&self) -> Option<&RsaPublicKey> {
        self.peer_key.as_ref()
    }

    /// Agree on group parameters. Restarts the handshake from any stage and
    /// discards a previously derived key.
    pub fn set_parameters(&mut self, params: DhParams) {
        if self.is_established() {
            tracing::info!("rekeying established session");
        }
        tracing::debug!(base = %params.base(), modulus = %params.modulus(), "DH parameters set");
        self.state = HandshakeState::DhParamsSet { params };
    }

    /// Group parameters, once set and until the shared secret is computed.
    #[must_use]
    pub fn parameters(&self) -> Option<&DhParams> {
        match &self.state {
            HandshakeState::DhParamsSet { params }
            | HandshakeState::DhPrivateGenerated { params, .. }
            | HandshakeState::DhPublicComputed { params, .. } => Some(params),
            _ => None,
        }
    }

    /// Draw the private DH exponent.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotReady`] unless the stage is `DhParamsSet`.
    pub fn generate_private<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> Result<()> {
        match std::mem::replace(&mut self.state, HandshakeState::Initialized) {
            HandshakeState::DhParamsSet { params } => {
                let private = params.generate_private(rng);
                tracing::debug!("DH private value generated");
                self.state = HandshakeState::DhPrivateGenerated { params, private };
                Ok(())
            }
            other => {
                self.state = other;
                Err(CryptoError::KeyNotReady("DH parameters must be set first"))
            }
        }
    }

    /// Compute and remember the own public value `g^x mod p`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotReady`] unless the stage is `DhPrivateGenerated`.
    pub fn calculate_public(&mut self) -> Result<BigUint> {
        match std::mem::replace(&mut self.state, HandshakeState::Initialized) {
            HandshakeState::DhPrivateGenerated { params, private } => {
                let public = params.public_value(&private);
                tracing::debug!(public = %public, "DH public value computed");
                self.state = HandshakeState::DhPublicComputed {
                    params,
                    private,
                    public: public.clone(),
                };
                Ok(public)
            }
            other => {
                self.state = other;
                Err(CryptoError::KeyNotReady("DH private value must be generated first"))
            }
        }
    }

    /// The own DH public value.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotReady`] unless the stage is `DhPublicComputed`.
    pub fn public_value(&self) -> Result<&BigUint> {
        match &self.state {
            HandshakeState::DhPublicComputed { public, .. } => Ok(public),
            _ => Err(CryptoError::KeyNotReady("DH public value not computed")),
        }
    }

    /// RSA-encrypt the own DH public value under the peer's key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotReady`] if the public value or the peer key is
    /// missing, and [`CryptoError::MessageOutOfRange`] if the peer modulus is too
    /// small. The stage is unchanged either way, so sealing can be retried.
    pub fn sealed_public_for_peer(&self) -> Result<BigUint> {
        let public = self.public_value()?;
        let peer = self
            .peer_key
            .as_ref()
            .ok_or(CryptoError::KeyNotReady("peer RSA public key not received"))?;
        peer.encrypt(public)
    }

    /// Combine the peer's DH public value with the own private exponent.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotReady`] unless the stage is `DhPublicComputed`,
    /// and [`CryptoError::InvalidParameter`] for an unreduced peer value. On
    /// error the stage is unchanged.
    ///
    /// The secret is kept until [`Session::derive_key`] consumes it.
    pub fn calculate_shared_secret(&mut self, peer_public: &BigUint) -> Result<SharedSecret> {
        let secret = match &self.state {
            HandshakeState::DhPublicComputed {
                params, private, ..
            } => params.shared_secret(private, peer_public)?,
            _ => {
                return Err(CryptoError::KeyNotReady(
                    "DH public value must be computed first",
                ));
            }
        };
        tracing::debug!("DH shared secret computed");
        self.state = HandshakeState::SharedSecretComputed {
            secret: secret.clone(),
        };
        Ok(secret)
    }

    /// Derive and install the session key from the shared secret.
    ///
    /// `secret` must be the value [`Session::calculate_shared_secret`] returned.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotReady`] unless the stage is `SharedSecretComputed`,
    /// and [`CryptoError::InvalidParameter`] if `secret` is not the one computed
    /// by this session. On error the stage is unchanged.
    pub fn derive_key(&mut self, secret: &SharedSecret) -> Result<&SessionKey> {
        let HandshakeState::SharedSecretComputed { secret: computed } = &self.state else {
            return Err(CryptoError::KeyNotReady(
                "shared secret must be computed first",
            ));
        };
        if computed != secret {
            return Err(CryptoError::InvalidParameter(
                "shared secret does not belong to this handshake".to_string(),
            ));
        }
        self.install_key()
    }

    /// Derive the session key from the stored shared secret.
    fn install_key(&mut self) -> Result<&SessionKey> {
        let key = match &self.state {
            HandshakeState::SharedSecretComputed { secret } => kdf::derive_aes_key(secret)?,
            _ => {
                return Err(CryptoError::KeyNotReady(
                    "shared secret must be computed first",
                ));
            }
        };
        self.state = HandshakeState::KeyDerived { key };
        self.key()
    }

    /// Finish the handshake from the peer's DH value sealed under our RSA key.
    ///
    /// # Errors
    ///
    /// As [`Session::calculate_shared_secret`] and [`Session::derive_key`].
    pub fn accept_sealed_public(
        &mut self,
        identity: &RsaKeyPair,
        sealed: &BigUint,
    ) -> Result<&SessionKey> {
        let peer_public = identity.decrypt(sealed);
        self.calculate_shared_secret(&peer_public)?;
        self.install_key()
    }

    /// The session key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotReady`] before the key is derived.
    pub fn key(&self) -> Result<&SessionKey> {
        match &self.state {
            HandshakeState::KeyDerived { key } => Ok(key),
            _ => Err(CryptoError::KeyNotReady("session key not derived")),
        }
    }

    /// Encrypt text into an `IV || ciphertext` envelope.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotReady`] before the key is derived.
    pub fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>> {
        let key = self.key()?;
        let envelope = cbc::seal(key.as_bytes(), plaintext)?;
        tracing::trace!(len = envelope.len(), "sealed message");
        Ok(envelope)
    }

    /// Decrypt an `IV || ciphertext` envelope to text.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotReady`] before the key is derived, and the
    /// envelope errors of [`cbc::open`].
    pub fn decrypt(&self, envelope: &[u8]) -> Result<String> {
        let key = self.key()?;
        cbc::open(key.as_bytes(), envelope)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("stage", &self.stage())
            .field("peer_key", &self.peer_key)
            .finish()
    }
}
