//! Peer connection, media and ICE gathering state for one call at a time
//!
//! # State machine
//!
//! ```text
//!            initiate_offer / handle_offer_and_create_answer
//!   Idle ──────────────────────────────────────────────► Gathering(role)
//!    ▲                                                        │
//!    │ reinitialize                 end-of-candidates, or     │
//!    │                              request_complete_gathering│
//!    │                              with a satisfying mix     ▼
//!    └──────────────────────────────────────────────────── Stable
//! ```
//!
//! Each peer connection the manager creates gets a generation number. Events
//! are delivered to a handler bound to that generation; once
//! [`ConnectionManager::reinitialize`] has moved on to a new generation, late
//! events from the old connection are dropped.
//!
//! A gathering phase finalizes at most once. The result is delivered through
//! the [`GatheringHandle`] returned when the phase started and broadcast as
//! [`ConnectionEvent::GatheringCompleted`].

use crate::config::CallConfig;
use crate::diagnostics::{ConnectionDiagnostics, ErrorLogger, PlatformInfo, WebRtcErrorType};
use crate::media::{MediaConstraints, MediaDevices, MediaError, MediaKind, MediaStream, VideoSink};
use crate::metrics::{GatheringRequirement, IceCandidateMetrics};
use crate::peer::{
    IceConfiguration, PeerConnectionBackend, PeerConnectionFactory, PeerError, PeerEvent,
    PeerEventHandler,
};
use crate::types::{
    ConnectionState, IceCandidate, NegotiationRole, SessionDescription, SignalingPayload,
    SignalingState,
};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::{broadcast, oneshot};

/// Connection manager errors
#[derive(Error, Debug)]
pub enum ManagerError {
    /// Peer connection operation failed
    #[error("Peer connection error: {0}")]
    Peer(#[from] PeerError),

    /// Every media constraint profile failed
    #[error("Media capture failed: {0}")]
    Media(#[from] MediaError),

    /// No constraint profiles configured
    #[error("No media constraint profiles configured")]
    NoConstraintProfiles,

    /// Gathering phase torn down before it finalized
    #[error("Gathering aborted by connection reset")]
    GatheringAborted,
}

impl ManagerError {
    /// Diagnostics category for reporting
    #[must_use]
    pub fn error_type(&self) -> WebRtcErrorType {
        match self {
            Self::Peer(PeerError::InvalidConfiguration(_)) => WebRtcErrorType::IceServer,
            Self::Media(_) | Self::NoConstraintProfiles | Self::Peer(PeerError::Media(_)) => {
                WebRtcErrorType::Media
            }
            _ => WebRtcErrorType::Connection,
        }
    }
}

/// Lifecycle state of the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManagerState {
    /// No negotiation in progress
    Idle,
    /// Collecting local candidates for an offer or answer
    Gathering(NegotiationRole),
    /// Local description and candidates finalized
    Stable,
}

/// How a gathering phase ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatheringCompletion {
    /// Browser signaled end-of-candidates
    Natural,
    /// Stopped early through `request_complete_gathering`
    Forced,
}

/// Finalized gathering phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatheringResult {
    /// Offer or answer
    pub role: NegotiationRole,
    /// Final `{desc, candidates}` payload
    pub payload: SignalingPayload,
    /// How the phase ended
    pub completion: GatheringCompletion,
}

impl GatheringResult {
    /// True when the browser reported that every candidate was gathered
    #[must_use]
    pub fn collected_all(&self) -> bool {
        self.completion == GatheringCompletion::Natural
    }
}

/// Events observable by any number of subscribers
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// Cumulative snapshot after each new local candidate
    CandidatesReceived(SignalingPayload),
    /// Gathering phase finalized
    GatheringCompleted(GatheringResult),
    /// Underlying connection state changed
    ConnectionStateChanged(ConnectionState),
    /// A remote stream was attached to the remote sink
    RemoteStreamAttached {
        /// Stream ID
        stream_id: String,
    },
}

/// Resolves once with the result of one gathering phase
///
/// Fails with [`ManagerError::GatheringAborted`] if the manager is
/// reinitialized first.
#[derive(Debug)]
pub struct GatheringHandle {
    role: NegotiationRole,
    rx: oneshot::Receiver<GatheringResult>,
}

impl GatheringHandle {
    /// Role of the phase this handle belongs to
    #[must_use]
    pub fn role(&self) -> NegotiationRole {
        self.role
    }
}

impl Future for GatheringHandle {
    type Output = Result<GatheringResult, ManagerError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|r| r.map_err(|_| ManagerError::GatheringAborted))
    }
}

struct State {
    generation: u64,
    connection: Option<Arc<dyn PeerConnectionBackend>>,
    // ICE servers the current and any future connection are built with
    ice: IceConfiguration,
    phase: ManagerState,
    is_gathering: bool,
    local_candidates: Vec<IceCandidate>,
    remote_candidates: Vec<IceCandidate>,
    completion: Option<oneshot::Sender<GatheringResult>>,
    local_stream: Option<Arc<MediaStream>>,
    remote_stream: Option<Arc<MediaStream>>,
    remote_sink: Option<Arc<dyn VideoSink>>,
    media_captured: bool,
}

impl State {
    fn new() -> Self {
        Self {
            generation: 0,
            connection: None,
            ice: IceConfiguration::default(),
            phase: ManagerState::Idle,
            is_gathering: false,
            local_candidates: Vec::new(),
            remote_candidates: Vec::new(),
            completion: None,
            local_stream: None,
            remote_stream: None,
            remote_sink: None,
            media_captured: false,
        }
    }
}

struct Inner {
    factory: Arc<dyn PeerConnectionFactory>,
    devices: Arc<dyn MediaDevices>,
    requirement: GatheringRequirement,
    profiles: Vec<MediaConstraints>,
    errors: ErrorLogger,
    state: Mutex<State>,
    create_lock: tokio::sync::Mutex<()>,
    events: broadcast::Sender<ConnectionEvent>,
}

/// Owner of the single peer connection and the local/remote streams
///
/// Cloning yields another handle to the same manager.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    /// Create a manager; the first peer connection is created on demand
    #[must_use]
    pub fn new(
        factory: Arc<dyn PeerConnectionFactory>,
        devices: Arc<dyn MediaDevices>,
        config: &CallConfig,
        errors: ErrorLogger,
    ) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(Inner {
                factory,
                devices,
                requirement: config.gathering_requirement,
                profiles: config.constraint_profiles.clone(),
                errors,
                state: Mutex::new(State::new()),
                create_lock: tokio::sync::Mutex::new(()),
                events,
            }),
        }
    }

    /// Subscribe to connection events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.inner.events.subscribe()
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> ManagerState {
        self.inner.state.lock().phase
    }

    /// Whether a gathering phase is open
    #[must_use]
    pub fn is_gathering(&self) -> bool {
        self.inner.state.lock().is_gathering
    }

    /// Whether local media has been captured
    #[must_use]
    pub fn is_media_captured(&self) -> bool {
        self.inner.state.lock().media_captured
    }

    /// Local candidates of the current negotiation, in arrival order
    #[must_use]
    pub fn local_candidates(&self) -> Vec<IceCandidate> {
        self.inner.state.lock().local_candidates.clone()
    }

    /// Captured local stream
    #[must_use]
    pub fn local_stream(&self) -> Option<Arc<MediaStream>> {
        self.inner.state.lock().local_stream.clone()
    }

    /// Attached remote stream
    #[must_use]
    pub fn remote_stream(&self) -> Option<Arc<MediaStream>> {
        self.inner.state.lock().remote_stream.clone()
    }

    /// Journal of captured errors
    #[must_use]
    pub fn error_logger(&self) -> &ErrorLogger {
        &self.inner.errors
    }

    /// Start an outgoing negotiation
    ///
    /// Applies the ICE configuration, opens a new gathering phase and sets a
    /// fresh local offer. A connection built with different ICE servers is
    /// replaced first, carrying over any captured local stream. Candidates then arrive as
    /// [`ConnectionEvent::CandidatesReceived`].
    ///
    /// # Errors
    ///
    /// Returns error if the connection cannot be created or the offer cannot
    /// be created or applied
    #[tracing::instrument(skip_all)]
    pub async fn initiate_offer(&self, config: &IceConfiguration) -> Result<GatheringHandle, ManagerError> {
        let conn = self.inner.connection_for(config).await?;

        let handle = self.inner.begin_gathering(NegotiationRole::Offer);
        let res = async {
            let offer = conn.create_offer().await?;
            conn.set_local_description(offer).await?;
            Ok::<_, ManagerError>(())
        }
        .await;

        if let Err(e) = res {
            tracing::error!(error = %e, "Failed to create local offer");
            self.inner.abort_gathering();
            return Err(e);
        }
        tracing::debug!("Local offer set, gathering");
        Ok(handle)
    }

    /// Answer a remote offer
    ///
    /// `remote_candidates` may be `None` or empty when the offer arrived
    /// without candidates.
    ///
    /// # Errors
    ///
    /// Returns error if the remote offer or a candidate cannot be applied, or
    /// the answer cannot be created
    #[tracing::instrument(skip_all, fields(remote_candidates = remote_candidates.as_ref().map_or(0, Vec::len)))]
    pub async fn handle_offer_and_create_answer(
        &self,
        config: &IceConfiguration,
        remote_desc: SessionDescription,
        remote_candidates: Option<Vec<IceCandidate>>,
    ) -> Result<GatheringHandle, ManagerError> {
        let conn = self.inner.connection_for(config).await?;

        let handle = self.inner.begin_gathering(NegotiationRole::Answer);
        let res = async {
            conn.set_remote_description(remote_desc).await?;
            self.inner
                .apply_remote_candidates(&conn, remote_candidates.unwrap_or_default())
                .await?;
            let answer = conn.create_answer().await?;
            conn.set_local_description(answer).await?;
            Ok::<_, ManagerError>(())
        }
        .await;

        if let Err(e) = res {
            tracing::error!(error = %e, "Failed to answer remote offer");
            self.inner.abort_gathering();
            return Err(e);
        }
        tracing::debug!("Local answer set, gathering");
        Ok(handle)
    }

    /// Finalize gathering early if the collected mix is good enough
    ///
    /// Does nothing while fewer than the minimum number of candidates has been
    /// collected, or while the mix does not meet the requirement. Returns
    /// `true` only for the call that actually finalized the phase.
    pub async fn request_complete_gathering(&self) -> bool {
        let generation = {
            let state = self.inner.state.lock();
            if !state.is_gathering {
                return false;
            }
            if !self.inner.requirement.has_minimum_count(&state.local_candidates) {
                tracing::debug!(
                    collected = state.local_candidates.len(),
                    required = self.inner.requirement.minimum_count(),
                    "Too few candidates to complete gathering"
                );
                return false;
            }
            let metrics = IceCandidateMetrics::classify(&state.local_candidates);
            if !self.inner.requirement.is_met_by(&metrics) {
                tracing::debug!(?metrics, "Candidate mix does not meet requirement yet");
                return false;
            }
            state.generation
        };
        self.inner.finalize(generation, GatheringCompletion::Forced).await
    }

    /// Finalize gathering with whatever has been collected
    ///
    /// Used when the gathering deadline has passed. Skips the requirement
    /// check but never finalizes an empty candidate list; returns `true`
    /// only for the call that actually finalized the phase.
    pub async fn force_complete_gathering(&self) -> bool {
        let generation = {
            let state = self.inner.state.lock();
            if !state.is_gathering {
                return false;
            }
            if state.local_candidates.is_empty() {
                tracing::debug!("No candidates yet, cannot force gathering complete");
                return false;
            }
            state.generation
        };
        self.inner.finalize(generation, GatheringCompletion::Forced).await
    }

    /// Apply the remote answer to an outstanding local offer
    ///
    /// A no-op returning `Ok(false)` unless the connection is in
    /// `have-local-offer`, so stray, duplicate or late answers are ignored.
    ///
    /// # Errors
    ///
    /// Returns error if the description or a candidate cannot be applied
    #[tracing::instrument(skip_all)]
    pub async fn set_remote_answer_and_candidates(
        &self,
        remote_desc: SessionDescription,
        remote_candidates: Option<Vec<IceCandidate>>,
    ) -> Result<bool, ManagerError> {
        let Some(conn) = self.inner.current_connection() else {
            tracing::warn!("Remote answer without a peer connection, ignoring");
            return Ok(false);
        };
        let signaling = conn.signaling_state();
        if signaling != SignalingState::HaveLocalOffer {
            tracing::warn!(?signaling, "Remote answer while no local offer is outstanding, ignoring");
            return Ok(false);
        }

        conn.set_remote_description(remote_desc).await?;
        self.inner
            .apply_remote_candidates(&conn, remote_candidates.unwrap_or_default())
            .await?;
        tracing::debug!("Remote answer applied");
        Ok(true)
    }

    /// Capture camera and microphone and attach them to the call
    ///
    /// Constraint profiles are tried most specific first; each failed
    /// attempt is journaled, and only when all fail is the error reported.
    ///
    /// # Errors
    ///
    /// Returns error if no profile can be captured or the stream cannot be
    /// attached to the connection
    #[tracing::instrument(skip_all)]
    pub async fn start_media_capture(
        &self,
        local_sink: Arc<dyn VideoSink>,
        remote_sink: Arc<dyn VideoSink>,
    ) -> Result<Arc<MediaStream>, ManagerError> {
        let conn = self.inner.ensure_connection().await?;

        let existing_remote = {
            let mut state = self.inner.state.lock();
            state.remote_sink = Some(Arc::clone(&remote_sink));
            state.remote_stream.clone()
        };
        if existing_remote.is_some() {
            remote_sink.attach(existing_remote);
        }

        let stream = match self.capture_with_fallback().await {
            Ok(stream) => stream,
            Err(e) => {
                self.inner
                    .errors
                    .capture(e.error_type(), &e, self.get_diagnostics())
                    .await;
                return Err(e);
            }
        };

        local_sink.attach(Some(Arc::clone(&stream)));
        conn.add_stream(Arc::clone(&stream)).await?;

        {
            let mut state = self.inner.state.lock();
            state.local_stream = Some(Arc::clone(&stream));
            state.media_captured = true;
        }
        tracing::info!(stream_id = %stream.id(), tracks = stream.tracks().len(), "Local media captured");
        Ok(stream)
    }

    async fn capture_with_fallback(&self) -> Result<Arc<MediaStream>, ManagerError> {
        let mut last_error = None;
        for (attempt, profile) in self.inner.profiles.iter().enumerate() {
            match self.inner.devices.get_user_media(profile).await {
                Ok(stream) => {
                    tracing::debug!(attempt, "Constraint profile accepted");
                    return Ok(stream);
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Constraint profile failed, degrading");
                    self.inner.errors.note(WebRtcErrorType::Media, &e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.map_or(ManagerError::NoConstraintProfiles, ManagerError::Media))
    }

    /// Point (possibly new) sinks at the already captured streams
    ///
    /// Never captures media again; a missing stream leaves its sink untouched.
    pub fn reconnect_video_elements(&self, local_sink: Arc<dyn VideoSink>, remote_sink: Arc<dyn VideoSink>) {
        let (local, remote) = {
            let mut state = self.inner.state.lock();
            state.remote_sink = Some(Arc::clone(&remote_sink));
            (state.local_stream.clone(), state.remote_stream.clone())
        };
        if local.is_some() {
            local_sink.attach(local);
        }
        if remote.is_some() {
            remote_sink.attach(remote);
        }
        tracing::debug!("Video sinks reconnected");
    }

    /// Enable or disable all local video tracks
    pub fn set_video_enabled(&self, enabled: bool) {
        self.set_kind_enabled(MediaKind::Video, enabled);
    }

    /// Enable or disable all local audio tracks
    pub fn set_audio_enabled(&self, enabled: bool) {
        self.set_kind_enabled(MediaKind::Audio, enabled);
    }

    fn set_kind_enabled(&self, kind: MediaKind, enabled: bool) {
        let Some(stream) = self.local_stream() else {
            return;
        };
        for track in stream.tracks_of(kind) {
            track.set_enabled(enabled);
        }
        tracing::debug!(%kind, enabled, "Local tracks toggled");
    }

    /// Tear down the current call and prepare a fresh connection
    ///
    /// Stops local tracks, closes the connection, forgets the remote stream and
    /// candidates, and aborts any open gathering phase. Safe to call when
    /// nothing was ever started.
    #[tracing::instrument(skip(self))]
    pub async fn reinitialize(&self) {
        let (conn, local) = {
            let mut state = self.inner.state.lock();
            state.generation += 1;
            state.phase = ManagerState::Idle;
            state.is_gathering = false;
            state.completion = None;
            state.local_candidates.clear();
            state.remote_candidates.clear();
            state.remote_stream = None;
            state.media_captured = false;
            (state.connection.take(), state.local_stream.take())
        };

        if let Some(stream) = local {
            stream.stop_all();
        }
        if let Some(conn) = conn {
            if let Err(e) = conn.close().await {
                tracing::warn!(error = %e, "Failed to close peer connection");
            }
        }

        if let Err(e) = self.inner.ensure_connection().await {
            tracing::warn!(error = %e, "Failed to prepare new peer connection, will retry on demand");
        }
        tracing::info!("Connection manager reinitialized");
    }

    /// Snapshot for error reporting
    #[must_use]
    pub fn get_diagnostics(&self) -> ConnectionDiagnostics {
        self.inner.diagnostics()
    }
}

impl Inner {
    fn current_connection(&self) -> Option<Arc<dyn PeerConnectionBackend>> {
        self.state.lock().connection.clone()
    }

    async fn ensure_connection(self: &Arc<Self>) -> Result<Arc<dyn PeerConnectionBackend>, PeerError> {
        let _creating = self.create_lock.lock().await;

        if let Some(conn) = self.current_connection() {
            return Ok(conn);
        }
        self.create_connection().await
    }

    /// Connection whose gatherer uses `config`, rebuilt if the servers changed
    async fn connection_for(
        self: &Arc<Self>,
        config: &IceConfiguration,
    ) -> Result<Arc<dyn PeerConnectionBackend>, PeerError> {
        let _creating = self.create_lock.lock().await;

        let stale = {
            let mut state = self.state.lock();
            if state.ice == *config {
                if let Some(conn) = &state.connection {
                    return Ok(Arc::clone(conn));
                }
                None
            } else {
                state.ice = config.clone();
                state.generation += 1;
                state.connection.take()
            }
        };

        let Some(stale) = stale else {
            return self.create_connection().await;
        };
        tracing::debug!(ice_servers = config.ice_servers.len(), "ICE servers changed, rebuilding peer connection");
        if let Err(e) = stale.close().await {
            tracing::warn!(error = %e, "Failed to close peer connection");
        }

        let conn = self.create_connection().await?;
        let local = self.state.lock().local_stream.clone();
        if let Some(stream) = local {
            conn.add_stream(stream).await?;
        }
        Ok(conn)
    }

    async fn create_connection(self: &Arc<Self>) -> Result<Arc<dyn PeerConnectionBackend>, PeerError> {
        let (generation, ice) = {
            let state = self.state.lock();
            (state.generation, state.ice.clone())
        };

        let conn = self
            .factory
            .create(&ice, Self::event_handler(self, generation))
            .await?;

        let mut state = self.state.lock();
        if state.generation == generation {
            state.connection = Some(Arc::clone(&conn));
        }
        tracing::debug!(generation, "Peer connection created");
        Ok(conn)
    }

    fn event_handler(self: &Arc<Self>, generation: u64) -> PeerEventHandler {
        let weak: Weak<Self> = Arc::downgrade(self);
        Arc::new(move |event| -> BoxFuture<'static, ()> {
            let weak = weak.clone();
            Box::pin(async move {
                if let Some(inner) = weak.upgrade() {
                    inner.on_peer_event(generation, event).await;
                }
            })
        })
    }

    fn begin_gathering(&self, role: NegotiationRole) -> GatheringHandle {
        let (tx, rx) = oneshot::channel();
        let mut state = self.state.lock();
        state.local_candidates.clear();
        state.is_gathering = true;
        state.phase = ManagerState::Gathering(role);
        state.completion = Some(tx);
        GatheringHandle { role, rx }
    }

    fn abort_gathering(&self) {
        let mut state = self.state.lock();
        state.is_gathering = false;
        state.completion = None;
        state.phase = ManagerState::Idle;
    }

    async fn apply_remote_candidates(
        &self,
        conn: &Arc<dyn PeerConnectionBackend>,
        candidates: Vec<IceCandidate>,
    ) -> Result<(), PeerError> {
        for candidate in candidates {
            conn.add_ice_candidate(candidate.clone()).await?;
            self.state.lock().remote_candidates.push(candidate);
        }
        Ok(())
    }

    async fn on_peer_event(&self, generation: u64, event: PeerEvent) {
        if self.state.lock().generation != generation {
            tracing::trace!(generation, "Dropping event from a previous connection");
            return;
        }

        match event {
            PeerEvent::IceCandidate(None) => {
                tracing::debug!("End of candidates");
                self.finalize(generation, GatheringCompletion::Natural).await;
            }
            PeerEvent::IceCandidate(Some(candidate)) => self.on_local_candidate(candidate).await,
            PeerEvent::ConnectionState(connection_state) => {
                tracing::info!(?connection_state, "Peer connection state changed");
                let _ = self
                    .events
                    .send(ConnectionEvent::ConnectionStateChanged(connection_state));
            }
            PeerEvent::Track(stream) => self.on_remote_stream(stream),
        }
    }

    async fn on_local_candidate(&self, candidate: IceCandidate) {
        let (conn, candidates) = {
            let mut state = self.state.lock();
            if !state.is_gathering {
                tracing::trace!("Candidate outside a gathering phase, ignoring");
                return;
            }
            state.local_candidates.push(candidate);
            (state.connection.clone(), state.local_candidates.clone())
        };
        tracing::trace!(count = candidates.len(), "Local candidate gathered");

        let desc = match conn {
            Some(conn) => conn.local_description().await,
            None => None,
        };
        let _ = self
            .events
            .send(ConnectionEvent::CandidatesReceived(SignalingPayload { desc, candidates }));
    }

    fn on_remote_stream(&self, stream: Arc<MediaStream>) {
        let sink = {
            let mut state = self.state.lock();
            if state
                .remote_stream
                .as_ref()
                .is_some_and(|current| current.id() == stream.id())
            {
                return;
            }
            state.remote_stream = Some(Arc::clone(&stream));
            state.remote_sink.clone()
        };
        if let Some(sink) = sink {
            sink.attach(Some(Arc::clone(&stream)));
        }
        tracing::info!(stream_id = %stream.id(), "Remote stream attached");
        let _ = self.events.send(ConnectionEvent::RemoteStreamAttached {
            stream_id: stream.id().to_string(),
        });
    }

    /// Single exit from a gathering phase; returns `true` if this call closed it.
    async fn finalize(&self, generation: u64, completion: GatheringCompletion) -> bool {
        let (conn, candidates, sender, role) = {
            let mut state = self.state.lock();
            if state.generation != generation || !state.is_gathering {
                return false;
            }
            let role = match state.phase {
                ManagerState::Gathering(role) => role,
                _ => NegotiationRole::Offer,
            };
            state.is_gathering = false;
            state.phase = ManagerState::Stable;
            (
                state.connection.clone(),
                state.local_candidates.clone(),
                state.completion.take(),
                role,
            )
        };

        let desc = match conn {
            Some(conn) => conn.local_description().await,
            None => None,
        };
        let result = GatheringResult {
            role,
            payload: SignalingPayload { desc, candidates },
            completion,
        };
        tracing::info!(
            ?role,
            ?completion,
            candidates = result.payload.candidates.len(),
            "Gathering finalized"
        );

        if let Some(sender) = sender {
            let _ = sender.send(result.clone());
        }
        let _ = self.events.send(ConnectionEvent::GatheringCompleted(result));
        true
    }

    fn diagnostics(&self) -> ConnectionDiagnostics {
        let state = self.state.lock();
        ConnectionDiagnostics {
            connection_state: state.connection.as_ref().map(|c| c.connection_state()),
            signaling_state: state.connection.as_ref().map(|c| c.signaling_state()),
            is_gathering: state.is_gathering,
            local_candidates: IceCandidateMetrics::classify(&state.local_candidates),
            remote_candidates: IceCandidateMetrics::classify(&state.remote_candidates),
            media_captured: state.media_captured,
            has_remote_stream: state.remote_stream.is_some(),
            platform: PlatformInfo::current(),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ConnectionManager")
            .field("generation", &state.generation)
            .field("phase", &state.phase)
            .field("candidates", &state.local_candidates.len())
            .field("media_captured", &state.media_captured)
            .finish()
    }
}
