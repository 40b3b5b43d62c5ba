//! Two-party handshake over in-process channels.
//!
//! Alice (initiator) and Bob (responder) run as separate tokio tasks and talk
//! only through `mpsc` channels carrying JSON-encoded [`HandshakeMessage`]s.
//!
//! ```text
//! Alice                                   Bob
//!   |-- rsa_public_key ------------------->|
//!   |<------------------- rsa_public_key --|
//!   |-- dh_parameters -------------------->|
//!   |-- encrypted_dh_public -------------->|
//!   |<-------------- encrypted_dh_public --|
//!   |-- ciphertext ----------------------->|
//!   |<----------------------- ciphertext --|   (per message)
//! ```

use anyhow::{Context, anyhow};
use rand::rngs::OsRng;
use tally_crypto::Participant;
use tally_crypto::dh::DhParams;
use tally_crypto::messages::HandshakeMessage;
use tally_crypto::rsa::KeyGenConfig;
use tokio::sync::mpsc;

/// Channel capacity per direction
const CHANNEL_CAPACITY: usize = 16;

/// One encrypted round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// Plaintext Bob recovered from Alice's envelope
    pub received: String,
    /// Plaintext Alice recovered from Bob's reply
    pub reply: String,
}

/// Outcome of a handshake run
#[derive(Debug)]
pub struct Report {
    /// Alice's session key fingerprint
    pub initiator_key: String,
    /// Bob's session key fingerprint
    pub responder_key: String,
    /// Decrypted traffic, in order
    pub exchanges: Vec<Exchange>,
}

impl Report {
    /// Whether both sides derived the same key
    pub fn keys_match(&self) -> bool {
        self.initiator_key == self.responder_key
    }
}

/// JSON message link to the other task
struct Link {
    tx: mpsc::Sender<String>,
    rx: mpsc::Receiver<String>,
}

impl Link {
    fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (b_tx, a_rx) = mpsc::channel(CHANNEL_CAPACITY);
        (
            Self { tx: a_tx, rx: a_rx },
            Self { tx: b_tx, rx: b_rx },
        )
    }

    async fn send(&self, msg: &HandshakeMessage) -> anyhow::Result<()> {
        tracing::trace!(kind = msg.kind(), "send");
        self.tx
            .send(msg.to_json()?)
            .await
            .map_err(|_| anyhow!("peer closed the channel"))
    }

    async fn recv(&mut self) -> anyhow::Result<Option<HandshakeMessage>> {
        match self.rx.recv().await {
            Some(json) => Ok(Some(HandshakeMessage::from_json(&json)?)),
            None => Ok(None),
        }
    }

    async fn expect(&mut self) -> anyhow::Result<HandshakeMessage> {
        self.recv()
            .await?
            .ok_or_else(|| anyhow!("peer closed the channel mid-handshake"))
    }
}

/// Run the handshake between freshly keyed participants, then send `messages`.
///
/// # Errors
///
/// Returns an error if key generation fails or either side aborts.
pub async fn run(
    key_config: KeyGenConfig,
    params: DhParams,
    messages: Vec<String>,
) -> anyhow::Result<Report> {
    let alice = Participant::new("Alice", &key_config, &mut OsRng)?;
    let bob = Participant::new("Bob", &key_config, &mut OsRng)?;
    let (alice_link, bob_link) = Link::pair();

    let bob_task = tokio::spawn(responder(bob, bob_link));
    let (initiator_key, replies) = initiator(alice, alice_link, params, messages).await?;
    let (responder_key, received) = bob_task.await.context("responder task panicked")??;

    tracing::info!(count = received.len(), "responder finished");
    if received.len() != replies.len() {
        anyhow::bail!(
            "responder decrypted {} messages but sent {} replies",
            received.len(),
            replies.len()
        );
    }
    let exchanges = received
        .into_iter()
        .zip(replies)
        .map(|(received, reply)| Exchange { received, reply })
        .collect();

    Ok(Report {
        initiator_key,
        responder_key,
        exchanges,
    })
}

async fn initiator(
    mut alice: Participant,
    mut link: Link,
    params: DhParams,
    messages: Vec<String>,
) -> anyhow::Result<(String, Vec<String>)> {
    // 1. public keys
    link.send(&alice.public_key_message()).await?;
    alice.receive_public_key(link.expect().await?)?;

    // 2. parameters
    let proposal = alice.propose_parameters(params);
    link.send(&proposal).await?;

    // 3-5. DH key, sealed under Bob's RSA key
    let offer = alice.offer_dh_public(&mut OsRng)?;
    link.send(&offer).await?;

    // 6-8. Bob's value, shared secret, session key
    alice.receive_dh_public(link.expect().await?)?;
    let fingerprint = alice.session().key()?.fingerprint();

    let mut replies = Vec::with_capacity(messages.len());
    for text in &messages {
        link.send(&alice.seal(text)?).await?;
        replies.push(alice.open(link.expect().await?)?);
    }

    // dropping the link ends the responder loop
    Ok((fingerprint, replies))
}

async fn responder(
    mut bob: Participant,
    mut link: Link,
) -> anyhow::Result<(String, Vec<String>)> {
    // 1. public keys
    bob.receive_public_key(link.expect().await?)?;
    link.send(&bob.public_key_message()).await?;

    // 2. parameters
    bob.receive_parameters(link.expect().await?)?;

    // 3-5. own DH key, computed before the peer's value arrives
    let offer = bob.offer_dh_public(&mut OsRng)?;

    // 6-8
    bob.receive_dh_public(link.expect().await?)?;
    link.send(&offer).await?;
    let fingerprint = bob.session().key()?.fingerprint();

    let mut received = Vec::new();
    while let Some(msg) = link.recv().await? {
        let text = bob.open(msg)?;
        tracing::debug!(len = text.len(), "responder decrypted message");
        link.send(&bob.seal(&format!("received: {text}"))?).await?;
        received.push(text);
    }

    Ok((fingerprint, received))
}
