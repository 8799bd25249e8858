//! Connection diagnostics and error capture
//!
//! Every connection, ICE server and media failure is traced, kept in a small
//! in-memory journal and, when reportable, forwarded to the diagnostics API
//! together with a [`ConnectionDiagnostics`] snapshot.

use crate::api::DiagnosticsApi;
use crate::metrics::IceCandidateMetrics;
use crate::types::{ConnectionState, SignalingState};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

/// Category of a reported error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebRtcErrorType {
    /// Negotiation or transport failure
    Connection,
    /// ICE server misconfiguration
    IceServer,
    /// Camera/microphone acquisition failure
    Media,
}

/// Client platform description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformInfo {
    /// Operating system
    pub os: String,
    /// CPU architecture
    pub arch: String,
    /// Client name and version
    pub client: String,
}

impl PlatformInfo {
    /// Describe the running client
    #[must_use]
    pub fn current() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            client: format!("callwire/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Point-in-time view of the call connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDiagnostics {
    /// Aggregate connection state, if a connection exists
    pub connection_state: Option<ConnectionState>,
    /// Signaling state, if a connection exists
    pub signaling_state: Option<SignalingState>,
    /// Whether local gathering is still in progress
    pub is_gathering: bool,
    /// Local candidate mix of the current negotiation
    pub local_candidates: IceCandidateMetrics,
    /// Remote candidate mix applied so far
    pub remote_candidates: IceCandidateMetrics,
    /// Local camera/microphone captured
    pub media_captured: bool,
    /// Remote stream attached
    pub has_remote_stream: bool,
    /// Client platform
    pub platform: PlatformInfo,
    /// Snapshot time
    pub timestamp: DateTime<Utc>,
}

impl ConnectionDiagnostics {
    /// Snapshot with no connection at all
    #[must_use]
    pub fn empty() -> Self {
        Self {
            connection_state: None,
            signaling_state: None,
            is_gathering: false,
            local_candidates: IceCandidateMetrics::default(),
            remote_candidates: IceCandidateMetrics::default(),
            media_captured: false,
            has_remote_stream: false,
            platform: PlatformInfo::current(),
            timestamp: Utc::now(),
        }
    }
}

/// One captured error
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    /// Error category
    pub error_type: WebRtcErrorType,
    /// Display message
    pub message: String,
    /// Error source chain, outermost first
    pub stack_trace: String,
    /// Connection snapshot at capture time
    pub diagnostics: Option<ConnectionDiagnostics>,
    /// Whether the record was forwarded to the diagnostics API
    pub reported: bool,
    /// Capture time
    pub timestamp: DateTime<Utc>,
}

fn source_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut chain = vec![error.to_string()];
    let mut source = error.source();
    while let Some(e) = source {
        chain.push(e.to_string());
        source = e.source();
    }
    chain.join("\n  caused by: ")
}

/// Error journal with optional forwarding to the diagnostics API
#[derive(Clone)]
pub struct ErrorLogger {
    journal: Arc<Mutex<VecDeque<ErrorRecord>>>,
    capacity: usize,
    api: Option<Arc<dyn DiagnosticsApi>>,
}

impl ErrorLogger {
    /// Journal-only logger
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            journal: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
            api: None,
        }
    }

    /// Logger that also reports to the diagnostics API
    #[must_use]
    pub fn with_api(capacity: usize, api: Arc<dyn DiagnosticsApi>) -> Self {
        Self {
            api: Some(api),
            ..Self::new(capacity)
        }
    }

    fn push(&self, record: ErrorRecord) {
        let mut journal = self.journal.lock();
        if journal.len() == self.capacity {
            journal.pop_front();
        }
        journal.push_back(record);
    }

    /// Record a non-fatal failure locally without reporting it
    pub fn note(&self, error_type: WebRtcErrorType, error: &(dyn std::error::Error + Send + Sync + 'static)) {
        tracing::warn!(error_type = ?error_type, error = %error, "WebRTC error noted");
        self.push(ErrorRecord {
            error_type,
            message: error.to_string(),
            stack_trace: source_chain(error),
            diagnostics: None,
            reported: false,
            timestamp: Utc::now(),
        });
    }

    /// Record a failure and forward it to the diagnostics API
    ///
    /// A failing diagnostics API is traced and otherwise ignored.
    pub async fn capture(
        &self,
        error_type: WebRtcErrorType,
        error: &(dyn std::error::Error + Send + Sync + 'static),
        diagnostics: ConnectionDiagnostics,
    ) {
        let message = error.to_string();
        let stack_trace = source_chain(error);
        tracing::error!(error_type = ?error_type, error = %message, "WebRTC error captured");

        let reported = match &self.api {
            Some(api) => match api
                .log_webrtc_error(error_type, message.clone(), stack_trace.clone(), diagnostics.clone())
                .await
            {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to report WebRTC error");
                    false
                }
            },
            None => false,
        };

        self.push(ErrorRecord {
            error_type,
            message,
            stack_trace,
            diagnostics: Some(diagnostics),
            reported,
            timestamp: Utc::now(),
        });
    }

    /// Journal contents, oldest first
    #[must_use]
    pub fn records(&self) -> Vec<ErrorRecord> {
        self.journal.lock().iter().cloned().collect()
    }

    /// Number of journal entries of one type
    #[must_use]
    pub fn count(&self, error_type: WebRtcErrorType) -> usize {
        self.journal
            .lock()
            .iter()
            .filter(|r| r.error_type == error_type)
            .count()
    }

    /// Drop all journal entries
    pub fn clear(&self) {
        self.journal.lock().clear();
    }
}

impl Default for ErrorLogger {
    fn default() -> Self {
        Self::new(50)
    }
}

impl std::fmt::Debug for ErrorLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorLogger")
            .field("entries", &self.journal.lock().len())
            .field("capacity", &self.capacity)
            .field("reports", &self.api.is_some())
            .finish()
    }
}
