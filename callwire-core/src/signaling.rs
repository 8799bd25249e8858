//! Signaling transport
//!
//! Offers, answers and hang-ups travel between the two peers over an
//! out-of-band transport (the messenger's notification channel in production,
//! an in-memory channel in loopback runs). The negotiation payload itself is
//! the `{desc, candidates}` JSON string; the envelope adds gathering metadata
//! and the sender's diagnostics.

use crate::diagnostics::ConnectionDiagnostics;
use crate::types::{CallId, PeerId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{sleep, Instant};

/// Offer or answer with the metadata of its gathering phase
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Negotiation {
    /// Call attempt this negotiation belongs to
    pub call_id: CallId,
    /// Serialized `{desc, candidates}` payload
    pub payload: String,
    /// Time spent gathering, in milliseconds
    pub gathering_ms: u64,
    /// Gathering ended with the end-of-candidates signal rather than early
    pub collected_all: bool,
    /// Sender's connection snapshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<ConnectionDiagnostics>,
}

/// Message carried by the signaling transport
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SignalingEnvelope {
    /// Caller's offer
    Offer(Negotiation),
    /// Callee's answer
    Answer(Negotiation),
    /// Remote hung up
    #[serde(rename_all = "camelCase")]
    Bye {
        /// Call being ended, if known
        call_id: Option<CallId>,
        /// Optional reason
        reason: Option<String>,
    },
}

impl SignalingEnvelope {
    /// Short name for tracing
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Offer(_) => "offer",
            Self::Answer(_) => "answer",
            Self::Bye { .. } => "bye",
        }
    }
}

/// Signaling transport trait
///
/// Delivery is at-most-once and may be delayed; messages between one pair of
/// peers are not assumed to be ordered.
#[async_trait]
pub trait SignalingTransport: Send + Sync {
    /// Transport error type
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send an envelope to a peer
    async fn send(&self, peer: &PeerId, envelope: SignalingEnvelope) -> Result<(), Self::Error>;

    /// Wait for the next envelope and its sender
    async fn receive(&self) -> Result<(PeerId, SignalingEnvelope), Self::Error>;
}

/// Minimum time between received messages (100 msg/sec)
const MIN_MESSAGE_INTERVAL: Duration = Duration::from_millis(10);

/// Signaling handler with receive rate limiting and error backoff
pub struct SignalingHandler<T: SignalingTransport> {
    transport: Arc<T>,
    last_receive_time: Mutex<Instant>,
    error_count: Mutex<u32>,
}

impl<T: SignalingTransport> SignalingHandler<T> {
    /// Create new signaling handler
    #[must_use]
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            last_receive_time: Mutex::new(Instant::now()),
            error_count: Mutex::new(0),
        }
    }

    /// Send an envelope to a peer
    ///
    /// # Errors
    ///
    /// Returns error if sending fails
    #[tracing::instrument(skip(self, envelope), fields(peer = %peer, kind = envelope.kind()))]
    pub async fn send(&self, peer: &PeerId, envelope: SignalingEnvelope) -> Result<(), T::Error> {
        tracing::debug!("Sending signaling envelope");
        self.transport.send(peer, envelope).await
    }

    /// Receive the next envelope with rate limiting and backoff
    ///
    /// # Errors
    ///
    /// Returns error if receiving fails
    #[tracing::instrument(skip(self))]
    pub async fn receive(&self) -> Result<(PeerId, SignalingEnvelope), T::Error> {
        {
            let mut last_time = self.last_receive_time.lock().await;
            let elapsed = last_time.elapsed();
            if elapsed < MIN_MESSAGE_INTERVAL {
                let pause = MIN_MESSAGE_INTERVAL - elapsed;
                tracing::trace!(sleep_ms = pause.as_millis(), "Rate limiting applied");
                sleep(pause).await;
            }
            *last_time = Instant::now();
        }

        match self.transport.receive().await {
            Ok((peer, envelope)) => {
                *self.error_count.lock().await = 0;
                tracing::debug!(peer = %peer, kind = envelope.kind(), "Received signaling envelope");
                Ok((peer, envelope))
            }
            Err(e) => {
                let count = {
                    let mut error_count = self.error_count.lock().await;
                    *error_count += 1;
                    *error_count
                };
                let backoff = Duration::from_millis(100 * u64::from(count.min(10)));
                tracing::warn!(
                    error_count = count,
                    backoff_ms = backoff.as_millis(),
                    error = %e,
                    "Error receiving envelope, backing off"
                );
                sleep(backoff).await;
                Err(e)
            }
        }
    }
}

/// In-memory transport errors
#[derive(Error, Debug)]
pub enum ChannelTransportError {
    /// Envelope addressed to a peer this endpoint is not connected to
    #[error("Unknown peer: {0}")]
    UnknownPeer(PeerId),

    /// Other endpoint dropped
    #[error("Channel closed")]
    Closed,

    /// Envelope did not survive the JSON round trip
    #[error("Invalid envelope: {0}")]
    Codec(#[from] serde_json::Error),
}

/// One end of an in-memory transport pair
///
/// Envelopes are serialized to JSON on send and parsed on receive, exactly as
/// they would be on a real wire.
pub struct ChannelTransport {
    local: PeerId,
    remote: PeerId,
    tx: mpsc::UnboundedSender<(PeerId, String)>,
    rx: Mutex<mpsc::UnboundedReceiver<(PeerId, String)>>,
}

impl ChannelTransport {
    /// Create two connected endpoints
    #[must_use]
    pub fn pair(a: PeerId, b: PeerId) -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        (
            Self {
                local: a.clone(),
                remote: b.clone(),
                tx: a_tx,
                rx: Mutex::new(a_rx),
            },
            Self {
                local: b,
                remote: a,
                tx: b_tx,
                rx: Mutex::new(b_rx),
            },
        )
    }

    /// This endpoint's identity
    #[must_use]
    pub fn local_peer(&self) -> &PeerId {
        &self.local
    }
}

#[async_trait]
impl SignalingTransport for ChannelTransport {
    type Error = ChannelTransportError;

    async fn send(&self, peer: &PeerId, envelope: SignalingEnvelope) -> Result<(), Self::Error> {
        if peer != &self.remote {
            return Err(ChannelTransportError::UnknownPeer(peer.clone()));
        }
        let wire = serde_json::to_string(&envelope)?;
        self.tx
            .send((self.local.clone(), wire))
            .map_err(|_| ChannelTransportError::Closed)
    }

    async fn receive(&self) -> Result<(PeerId, SignalingEnvelope), Self::Error> {
        let (peer, wire) = self
            .rx
            .lock()
            .await
            .recv()
            .await
            .ok_or(ChannelTransportError::Closed)?;
        Ok((peer, serde_json::from_str(&wire)?))
    }
}
