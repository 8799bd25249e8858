//! Call types and wire data structures
//!
//! The signaling payload exchanged between peers is a JSON object of the form
//! `{ "desc": { "type": "offer", "sdp": "..." }, "candidates": [ ... ] }`.
//! Field names follow the browser `RTCSessionDescriptionInit` and
//! `RTCIceCandidateInit` dictionaries so both ends stay byte compatible.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Payload (de)serialization errors
#[derive(Error, Debug)]
pub enum PayloadError {
    /// Malformed JSON or missing fields
    #[error("Malformed signaling payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Unique identifier for a call attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub Uuid);

impl CallId {
    /// Create a new random call ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the remote peer on the signaling transport
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(pub String);

impl PeerId {
    /// Create a new peer identifier
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PeerId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// SDP type string carried in `desc.type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    /// Local or remote offer
    Offer,
    /// Provisional answer
    Pranswer,
    /// Final answer
    Answer,
    /// Rollback to the last stable state
    Rollback,
    /// Any type string this client does not understand
    #[serde(other)]
    Unspecified,
}

impl std::fmt::Display for SdpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Offer => "offer",
            Self::Pranswer => "pranswer",
            Self::Answer => "answer",
            Self::Rollback => "rollback",
            Self::Unspecified => "unspecified",
        };
        f.write_str(s)
    }
}

/// Session description (SDP plus its type)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    /// Offer or answer
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    /// Raw SDP body
    pub sdp: String,
}

impl SessionDescription {
    /// Build an offer description
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    /// Build an answer description
    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

/// Network path type of an ICE candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateType {
    /// Local interface address
    Host,
    /// Server reflexive (address seen by a STUN server)
    Srflx,
    /// Peer reflexive (learned from connectivity checks)
    Prflx,
    /// Allocated on a TURN relay
    Relay,
}

impl CandidateType {
    /// Parse the value of a `typ` attribute
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "host" => Some(Self::Host),
            "srflx" => Some(Self::Srflx),
            "prflx" => Some(Self::Prflx),
            "relay" => Some(Self::Relay),
            _ => None,
        }
    }
}

/// ICE candidate as exchanged in the signaling payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    /// `candidate:` attribute line
    pub candidate: String,
    /// Media stream identification tag
    #[serde(default)]
    pub sdp_mid: Option<String>,
    /// Index of the m-line the candidate belongs to
    #[serde(default, rename = "sdpMLineIndex")]
    pub sdp_mline_index: Option<u16>,
    /// ICE ufrag the candidate was gathered under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

impl IceCandidate {
    /// Create a candidate from its attribute line
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: Some("0".to_string()),
            sdp_mline_index: Some(0),
            username_fragment: None,
        }
    }

    /// Type of network path, read from the `typ` token of the attribute line
    ///
    /// Returns `None` for malformed lines or unknown types.
    pub fn candidate_type(&self) -> Option<CandidateType> {
        let mut tokens = self.candidate.split_whitespace();
        while let Some(token) = tokens.next() {
            if token == "typ" {
                return tokens.next().and_then(CandidateType::parse);
            }
        }
        None
    }
}

/// Offer or answer payload sent over the signaling transport
///
/// `desc` is optional only because a connection may not have a local
/// description yet when a snapshot is taken; a well-behaved peer always
/// sends one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalingPayload {
    /// Local session description at the time of the snapshot
    pub desc: Option<SessionDescription>,
    /// Candidates gathered so far, in arrival order
    #[serde(default)]
    pub candidates: Vec<IceCandidate>,
}

impl SignalingPayload {
    /// Serialize to the wire JSON string
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String, PayloadError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a wire JSON string
    ///
    /// # Errors
    ///
    /// Returns error if the string is not a valid payload
    pub fn from_json(s: &str) -> Result<Self, PayloadError> {
        Ok(serde_json::from_str(s)?)
    }

    /// SDP type of the carried description, if any
    pub fn sdp_type(&self) -> Option<SdpType> {
        self.desc.as_ref().map(|d| d.sdp_type)
    }
}

/// Signaling state of the underlying peer connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalingState {
    /// No offer/answer exchange in progress
    Stable,
    /// Local offer applied, waiting for the answer
    HaveLocalOffer,
    /// Remote offer applied, answer not yet created
    HaveRemoteOffer,
    /// Local provisional answer applied
    HaveLocalPranswer,
    /// Remote provisional answer applied
    HaveRemotePranswer,
    /// Connection closed
    Closed,
}

/// Aggregate connection state of the underlying peer connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Freshly created
    New,
    /// ICE/DTLS in progress
    Connecting,
    /// Media can flow
    Connected,
    /// Transport lost connectivity
    Disconnected,
    /// Transport failed
    Failed,
    /// Connection closed
    Closed,
}

/// Which side of the offer/answer exchange a gathering phase belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegotiationRole {
    /// Gathering for a local offer
    Offer,
    /// Gathering for a local answer
    Answer,
}
