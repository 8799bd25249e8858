//! Peer connection abstraction
//!
//! [`PeerConnectionBackend`] is the narrow surface the connection manager needs
//! from an `RTCPeerConnection`. The default implementation lives in
//! [`crate::webrtc_backend`]; tests drive the manager through fakes.
//!
//! Events raised by a connection are delivered to a [`PeerEventHandler`]
//! supplied when the connection is created. The manager binds each handler to
//! the generation of the connection it created, so events from a connection
//! that has since been torn down are recognized and dropped.

use crate::media::MediaStream;
use crate::types::{ConnectionState, IceCandidate, SessionDescription, SignalingState};
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Peer connection errors
#[derive(Error, Debug, Clone)]
pub enum PeerError {
    /// ICE server configuration rejected or unparsable
    #[error("Invalid ICE configuration: {0}")]
    InvalidConfiguration(String),

    /// Offer/answer creation or application failed
    #[error("Negotiation failed: {0}")]
    Negotiation(String),

    /// Remote candidate rejected
    #[error("Invalid ICE candidate: {0}")]
    InvalidCandidate(String),

    /// Attaching local media failed
    #[error("Media attachment failed: {0}")]
    Media(String),
}

/// One STUN/TURN server entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceServer {
    /// Server URLs (`stun:` / `turn:` / `turns:`)
    #[serde(deserialize_with = "one_or_many")]
    pub urls: Vec<String>,
    /// TURN username
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// TURN credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// ICE server configuration, in browser `RTCConfiguration` JSON shape
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceConfiguration {
    /// STUN/TURN servers
    #[serde(default)]
    pub ice_servers: Vec<IceServer>,
    /// Pre-gathered candidate pool size hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ice_candidate_pool_size: Option<u8>,
}

impl IceConfiguration {
    /// Parse the JSON string handed out by the settings API
    ///
    /// # Errors
    ///
    /// Returns error if the string is not a valid configuration
    pub fn from_json(s: &str) -> Result<Self, PeerError> {
        serde_json::from_str(s).map_err(|e| PeerError::InvalidConfiguration(e.to_string()))
    }

    /// Whether any TURN server is configured
    #[must_use]
    pub fn has_relay(&self) -> bool {
        self.ice_servers
            .iter()
            .flat_map(|s| s.urls.iter())
            .any(|u| u.starts_with("turn:") || u.starts_with("turns:"))
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(url) => vec![url],
        OneOrMany::Many(urls) => urls,
    })
}

/// Event raised by a peer connection
#[derive(Debug, Clone)]
pub enum PeerEvent {
    /// New local candidate; `None` is the end-of-candidates sentinel
    IceCandidate(Option<IceCandidate>),
    /// Aggregate connection state changed
    ConnectionState(ConnectionState),
    /// Remote track arrived as part of the given stream
    Track(Arc<MediaStream>),
}

/// Async callback receiving connection events
pub type PeerEventHandler = Arc<dyn Fn(PeerEvent) -> BoxFuture<'static, ()> + Send + Sync>;

/// Narrow view of an `RTCPeerConnection`
#[async_trait]
pub trait PeerConnectionBackend: Send + Sync {
    /// Create a local offer
    async fn create_offer(&self) -> Result<SessionDescription, PeerError>;

    /// Create a local answer to the applied remote offer
    async fn create_answer(&self) -> Result<SessionDescription, PeerError>;

    /// Apply a local description; starts candidate gathering
    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), PeerError>;

    /// Apply a remote description
    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), PeerError>;

    /// Add one remote candidate
    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), PeerError>;

    /// Current local description, including candidates gathered so far
    async fn local_description(&self) -> Option<SessionDescription>;

    /// Current signaling state
    fn signaling_state(&self) -> SignalingState;

    /// Current aggregate connection state
    fn connection_state(&self) -> ConnectionState;

    /// Send the tracks of a local stream to the remote peer
    async fn add_stream(&self, stream: Arc<MediaStream>) -> Result<(), PeerError>;

    /// Close the connection
    async fn close(&self) -> Result<(), PeerError>;
}

/// Creates fresh peer connections
#[async_trait]
pub trait PeerConnectionFactory: Send + Sync {
    /// Create a connection gathering against `config` and reporting its
    /// events to `events`
    ///
    /// ICE servers are fixed for the lifetime of a connection.
    async fn create(
        &self,
        config: &IceConfiguration,
        events: PeerEventHandler,
    ) -> Result<Arc<dyn PeerConnectionBackend>, PeerError>;
}
