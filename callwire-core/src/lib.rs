//! Callwire - peer-to-peer call signaling core
//!
//! This library negotiates one-to-one audio/video calls between two clients.
//! Media flows directly between the peers; the server is only used to relay
//! offers and answers and to receive diagnostics. It features:
//!
//! - **Bounded ICE gathering**: candidates are collected until the browser
//!   signals completion, the collected mix is good enough, or a timer forces
//!   finalization
//! - **Single-shot finalization**: every gathering phase resolves exactly once
//! - **Media fallback**: camera/microphone capture degrades through a ladder
//!   of constraint profiles
//! - **Diagnostics**: connection, ICE server and media failures are journaled
//!   and reported with a connection snapshot
//!
//! # Examples
//!
//! ```rust,no_run
//! use callwire_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let (alice, _bob) = ChannelTransport::pair(PeerId::new("alice"), PeerId::new("bob"));
//! let signaling = Arc::new(SignalingHandler::new(Arc::new(alice)));
//!
//! let service = Arc::new(
//!     ConnectionService::builder(signaling)
//!         .with_config(CallConfig::default())
//!         .build()?,
//! );
//! service.start();
//!
//! let call_id = service.start_outgoing_call(PeerId::new("bob"), None).await?;
//! # let _ = call_id;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::all)]
#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

/// Wire types and identifiers
pub mod types;

/// Gathering deadline timer
pub mod timer;

/// ICE candidate classification and gathering policy
pub mod metrics;

/// Local media model and capture
pub mod media;

/// Peer connection abstraction
pub mod peer;

/// Server-side collaborators
pub mod api;

/// Diagnostics snapshots and error journal
pub mod diagnostics;

/// Configuration
pub mod config;

/// Per-call connection state
pub mod connection_manager;

/// Signaling envelopes and transports
pub mod signaling;

/// End-to-end call orchestration
pub mod service;

/// `webrtc` crate backend (requires webrtc-backend feature)
#[cfg(feature = "webrtc-backend")]
pub mod webrtc_backend;

// Re-export main types at crate root
pub use api::{
    ApiError, CallAction, CallSettings, CallStateStore, CallUiState, ConnectionReport,
    DiagnosticsApi, InMemoryCallStore, SettingsApi, StaticSettings, TracingDiagnostics,
};
pub use config::CallConfig;
pub use connection_manager::{
    ConnectionEvent, ConnectionManager, GatheringCompletion, GatheringHandle, GatheringResult,
    ManagerError, ManagerState,
};
pub use diagnostics::{ConnectionDiagnostics, ErrorLogger, ErrorRecord, PlatformInfo, WebRtcErrorType};
pub use media::{
    MediaConstraints, MediaDevices, MediaError, MediaKind, MediaStream, MediaTrack,
    SyntheticMediaDevices, VideoSink,
};
pub use metrics::{GatheringRequirement, IceCandidateMetrics};
pub use peer::{
    IceConfiguration, IceServer, PeerConnectionBackend, PeerConnectionFactory, PeerError,
    PeerEvent, PeerEventHandler,
};
pub use service::{
    ConnectionService, ConnectionServiceBuilder, EndReason, GatheringSummary, MediaSinks,
    ServiceError, ServiceEvent,
};
pub use signaling::{
    ChannelTransport, ChannelTransportError, Negotiation, SignalingEnvelope, SignalingHandler,
    SignalingTransport,
};
pub use timer::{GatheringTimer, TimerError};
pub use types::*;
#[cfg(feature = "webrtc-backend")]
pub use webrtc_backend::{WebRtcBackendFactory, WebRtcPeerConnection};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::api::{CallStateStore, DiagnosticsApi, InMemoryCallStore, SettingsApi};
    pub use crate::config::CallConfig;
    pub use crate::connection_manager::{ConnectionEvent, ConnectionManager, ManagerError};
    pub use crate::media::{MediaDevices, SyntheticMediaDevices, VideoSink};
    pub use crate::service::{ConnectionService, MediaSinks, ServiceError, ServiceEvent};
    pub use crate::signaling::{ChannelTransport, SignalingEnvelope, SignalingHandler, SignalingTransport};
    pub use crate::types::{CallId, PeerId, SdpType, SignalingPayload};
    #[cfg(feature = "webrtc-backend")]
    pub use crate::webrtc_backend::WebRtcBackendFactory;
}
