//! Backend collaborators consumed by the call core
//!
//! The settings and diagnostics endpoints live behind the messenger's REST
//! API; the call UI state lives in the application store. The core only sees
//! these traits.

use crate::diagnostics::{ConnectionDiagnostics, WebRtcErrorType};
use crate::types::PeerId;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

/// REST API errors
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// Server answered with an error status
    #[error("Server returned {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },
}

/// Call settings handed out by the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSettings {
    /// ICE server configuration as a JSON string
    pub ice_server_configuration: String,
}

/// Source of call settings
#[async_trait]
pub trait SettingsApi: Send + Sync {
    /// Fetch current call settings
    async fn get_call_settings(&self) -> Result<CallSettings, ApiError>;
}

/// Settings source that always returns the same value
#[derive(Debug, Clone, Default)]
pub struct StaticSettings(pub CallSettings);

#[async_trait]
impl SettingsApi for StaticSettings {
    async fn get_call_settings(&self) -> Result<CallSettings, ApiError> {
        Ok(self.0.clone())
    }
}

/// Connection outcome report sent to the diagnostics endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionReport {
    /// Remote peer, when known
    pub peer: Option<PeerId>,
    /// Snapshot at the time of the transition
    pub diagnostics: ConnectionDiagnostics,
}

/// Diagnostics sink on the server
#[async_trait]
pub trait DiagnosticsApi: Send + Sync {
    /// The peer connection reached `connected`
    async fn log_connection_established(&self, report: ConnectionReport) -> Result<(), ApiError>;

    /// The peer connection reached `failed`
    async fn log_connection_failed(&self, report: ConnectionReport) -> Result<(), ApiError>;

    /// A connection, ICE server or media error occurred
    async fn log_webrtc_error(
        &self,
        error_type: WebRtcErrorType,
        message: String,
        stack_trace: String,
        diagnostics: ConnectionDiagnostics,
    ) -> Result<(), ApiError>;
}

/// Diagnostics sink that only traces
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

#[async_trait]
impl DiagnosticsApi for TracingDiagnostics {
    async fn log_connection_established(&self, report: ConnectionReport) -> Result<(), ApiError> {
        tracing::info!(peer = ?report.peer, state = ?report.diagnostics.connection_state, "Connection established");
        Ok(())
    }

    async fn log_connection_failed(&self, report: ConnectionReport) -> Result<(), ApiError> {
        tracing::warn!(peer = ?report.peer, local = ?report.diagnostics.local_candidates, remote = ?report.diagnostics.remote_candidates, "Connection failed");
        Ok(())
    }

    async fn log_webrtc_error(
        &self,
        error_type: WebRtcErrorType,
        message: String,
        _stack_trace: String,
        _diagnostics: ConnectionDiagnostics,
    ) -> Result<(), ApiError> {
        tracing::error!(error_type = ?error_type, "{}", message);
        Ok(())
    }
}

/// Call UI state held by the application store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallUiState {
    /// A call is in progress
    pub active: bool,
    /// Remote peer of the active call
    pub peer: Option<PeerId>,
    /// Local camera enabled
    pub video_enabled: bool,
    /// Local microphone enabled
    pub audio_enabled: bool,
}

impl Default for CallUiState {
    fn default() -> Self {
        Self {
            active: false,
            peer: None,
            video_enabled: true,
            audio_enabled: true,
        }
    }
}

/// Store actions dispatched by the call core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallAction {
    /// Return to the idle state
    Reset,
    /// A call with the given peer started
    Started(PeerId),
    /// Camera switched on/off
    ToggleVideo(bool),
    /// Microphone switched on/off
    ToggleAudio(bool),
}

/// Application store for call UI state
pub trait CallStateStore: Send + Sync {
    /// Current state
    fn current(&self) -> CallUiState;

    /// Apply an action
    fn dispatch(&self, action: CallAction);
}

/// Reducer-backed in-memory store with change notifications
pub struct InMemoryCallStore {
    state: RwLock<CallUiState>,
    changes: broadcast::Sender<CallUiState>,
}

impl InMemoryCallStore {
    /// Create a store in the idle state
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            state: RwLock::new(CallUiState::default()),
            changes,
        }
    }

    /// Subscribe to state changes
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CallUiState> {
        self.changes.subscribe()
    }

    fn reduce(state: &CallUiState, action: CallAction) -> CallUiState {
        match action {
            CallAction::Reset => CallUiState::default(),
            CallAction::Started(peer) => CallUiState {
                active: true,
                peer: Some(peer),
                ..state.clone()
            },
            CallAction::ToggleVideo(video_enabled) => CallUiState {
                video_enabled,
                ..state.clone()
            },
            CallAction::ToggleAudio(audio_enabled) => CallUiState {
                audio_enabled,
                ..state.clone()
            },
        }
    }
}

impl Default for InMemoryCallStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CallStateStore for InMemoryCallStore {
    fn current(&self) -> CallUiState {
        self.state.read().clone()
    }

    fn dispatch(&self, action: CallAction) {
        tracing::trace!(action = ?action, "Dispatching call action");
        let next = {
            let mut state = self.state.write();
            *state = Self::reduce(&state, action);
            state.clone()
        };
        let _ = self.changes.send(next);
    }
}
