//! Call orchestration
//!
//! [`ConnectionService`] runs the offer/answer protocol on top of a
//! [`ConnectionManager`]: it fetches ICE settings, bounds each gathering phase
//! with a [`GatheringTimer`], ships the finalized payload over the signaling
//! transport and reacts to connection state changes.

use crate::api::{
    ApiError, CallAction, CallSettings, CallStateStore, ConnectionReport, DiagnosticsApi,
    InMemoryCallStore, SettingsApi, StaticSettings, TracingDiagnostics,
};
use crate::config::CallConfig;
use crate::connection_manager::{ConnectionEvent, ConnectionManager, GatheringHandle, GatheringResult, ManagerError};
use crate::diagnostics::{ErrorLogger, WebRtcErrorType};
use crate::media::{MediaDevices, SyntheticMediaDevices, VideoSink};
use crate::peer::{IceConfiguration, PeerConnectionFactory};
use crate::signaling::{Negotiation, SignalingEnvelope, SignalingHandler, SignalingTransport};
use crate::timer::{GatheringTimer, TimerError};
use crate::types::{
    CallId, ConnectionState, IceCandidate, PayloadError, PeerId, SdpType, SessionDescription,
    SignalingPayload,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Service errors
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Initialization error
    #[error("Initialization error: {0}")]
    InitError(String),

    /// Call settings could not be fetched
    #[error("Settings error: {0}")]
    Settings(#[from] ApiError),

    /// Connection manager operation failed
    #[error(transparent)]
    Manager(#[from] ManagerError),

    /// Remote payload could not be parsed
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// Gathering timer could not be started
    #[error(transparent)]
    Timer(#[from] TimerError),

    /// Signaling transport failed
    #[error("Signaling error: {0}")]
    Signaling(String),

    /// Remote offer without a usable session description
    #[error("Unexpected remote description: {0}")]
    UnexpectedDescription(String),
}

/// Why a call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// Ended by the local user
    Local,
    /// Remote peer sent `bye`
    RemoteHangup,
    /// Underlying connection reported `disconnected`
    Disconnected,
}

/// Events published by the service
#[derive(Debug, Clone)]
pub enum ServiceEvent {
    /// A remote offer arrived and awaits `handle_incoming_call`
    IncomingCall {
        /// Caller's call ID
        call_id: CallId,
        /// Caller
        peer: PeerId,
        /// Serialized offer payload
        payload: String,
    },
    /// Finalized offer sent
    OfferSent {
        /// Call ID
        call_id: CallId,
        /// Callee
        peer: PeerId,
        /// Gathering metadata
        summary: GatheringSummary,
    },
    /// Finalized answer sent
    AnswerSent {
        /// Call ID
        call_id: CallId,
        /// Caller
        peer: PeerId,
        /// Gathering metadata
        summary: GatheringSummary,
    },
    /// Connection reached `connected`
    CallEstablished {
        /// Remote peer
        peer: Option<PeerId>,
    },
    /// Connection reached `failed`
    ConnectionFailed {
        /// Remote peer
        peer: Option<PeerId>,
    },
    /// Call torn down
    CallEnded {
        /// Ended call, if one was active
        call_id: Option<CallId>,
        /// Why
        reason: EndReason,
    },
}

/// How a gathering phase went
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatheringSummary {
    /// Time from offer/answer creation to finalization, in ms
    pub gathering_ms: u64,
    /// Finalized by end-of-candidates rather than forced
    pub collected_all: bool,
    /// Candidates shipped in the payload
    pub candidates: usize,
}

/// Local and remote video outputs of a call
#[derive(Clone)]
pub struct MediaSinks {
    /// Local preview
    pub local: Arc<dyn VideoSink>,
    /// Remote video
    pub remote: Arc<dyn VideoSink>,
}

#[derive(Debug, Clone)]
struct ActiveCall {
    call_id: CallId,
    peer: PeerId,
}

/// Orchestrates one call at a time over a single [`ConnectionManager`]
pub struct ConnectionService<T: SignalingTransport> {
    manager: ConnectionManager,
    signaling: Arc<SignalingHandler<T>>,
    settings: Arc<dyn SettingsApi>,
    diagnostics: Arc<dyn DiagnosticsApi>,
    store: Arc<dyn CallStateStore>,
    config: CallConfig,
    errors: ErrorLogger,
    active: Mutex<Option<ActiveCall>>,
    monitor: Mutex<Option<JoinHandle<()>>>,
    event_sender: broadcast::Sender<ServiceEvent>,
}

impl<T: SignalingTransport + 'static> ConnectionService<T> {
    /// Create a service builder
    #[must_use]
    pub fn builder(signaling: Arc<SignalingHandler<T>>) -> ConnectionServiceBuilder<T> {
        ConnectionServiceBuilder::new(signaling)
    }

    /// The connection manager this service drives
    #[must_use]
    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Application store
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CallStateStore> {
        &self.store
    }

    /// Subscribe to service events
    #[must_use]
    pub fn subscribe_events(&self) -> broadcast::Receiver<ServiceEvent> {
        self.event_sender.subscribe()
    }

    /// ID and peer of the call in progress
    #[must_use]
    pub fn active_call(&self) -> Option<(CallId, PeerId)> {
        self.active
            .lock()
            .as_ref()
            .map(|c| (c.call_id, c.peer.clone()))
    }

    /// Start watching connection state changes
    ///
    /// `connected` and `failed` are reported to the diagnostics API;
    /// `disconnected` ends the call. Calling `start` twice replaces the
    /// previous monitor.
    #[tracing::instrument(skip(self))]
    pub fn start(self: &Arc<Self>) {
        let mut events = self.manager.subscribe();
        let weak: Weak<Self> = Arc::downgrade(self);

        let task = tokio::spawn(async move {
            loop {
                let state = match events.recv().await {
                    Ok(ConnectionEvent::ConnectionStateChanged(state)) => state,
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Connection monitor lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                let Some(service) = weak.upgrade() else {
                    break;
                };
                service.on_connection_state(state).await;
            }
            tracing::debug!("Connection monitor stopped");
        });

        if let Some(previous) = self.monitor.lock().replace(task) {
            previous.abort();
        }
        tracing::info!("Connection service started");
    }

    /// Stop the monitor and end any call in progress
    #[tracing::instrument(skip(self))]
    pub async fn shutdown(&self) {
        if let Some(task) = self.monitor.lock().take() {
            task.abort();
        }
        if self.active.lock().is_some() {
            self.end_call().await;
        }
        tracing::info!("Connection service stopped");
    }

    /// Call a peer
    ///
    /// Captures media first when sinks are given, then creates the offer,
    /// waits for gathering (bounded by the configured timeout) and sends the
    /// finalized offer.
    ///
    /// # Errors
    ///
    /// Returns error if settings, media, negotiation or sending fails
    #[tracing::instrument(skip(self, media), fields(peer = %peer))]
    pub async fn start_outgoing_call(
        &self,
        peer: PeerId,
        media: Option<MediaSinks>,
    ) -> Result<CallId, ServiceError> {
        let call_id = CallId::new();
        tracing::info!(%call_id, "Starting outgoing call");
        self.begin_call(call_id, &peer);

        let summary = match self.place_offer(call_id, &peer, media).await {
            Ok(summary) => summary,
            Err(e) => {
                self.abandon_call(call_id).await;
                return Err(e);
            }
        };

        let _ = self.event_sender.send(ServiceEvent::OfferSent {
            call_id,
            peer,
            summary,
        });
        Ok(call_id)
    }

    /// Answer a remote offer
    ///
    /// # Errors
    ///
    /// Returns error if the offer is malformed, or if settings, media,
    /// negotiation or sending fails
    #[tracing::instrument(skip(self, offer, media), fields(peer = %peer, %call_id))]
    pub async fn handle_incoming_call(
        &self,
        peer: PeerId,
        call_id: CallId,
        offer: &str,
        media: Option<MediaSinks>,
    ) -> Result<(), ServiceError> {
        let payload = SignalingPayload::from_json(offer)?;
        let desc = match payload.desc {
            Some(desc) if desc.sdp_type == SdpType::Offer => desc,
            Some(desc) => {
                return Err(ServiceError::UnexpectedDescription(desc.sdp_type.to_string()));
            }
            None => return Err(ServiceError::UnexpectedDescription("missing".to_string())),
        };
        tracing::info!(candidates = payload.candidates.len(), "Handling incoming call");
        self.begin_call(call_id, &peer);

        let summary = match self.place_answer(call_id, &peer, desc, payload.candidates, media).await {
            Ok(summary) => summary,
            Err(e) => {
                self.abandon_call(call_id).await;
                return Err(e);
            }
        };

        let _ = self.event_sender.send(ServiceEvent::AnswerSent {
            call_id,
            peer,
            summary,
        });
        Ok(())
    }

    /// Apply the remote answer to the outstanding offer
    ///
    /// Payloads whose description is not an answer are dropped and `Ok(false)`
    /// is returned; so is an answer arriving when no offer is outstanding.
    ///
    /// # Errors
    ///
    /// Returns error if the payload is malformed or cannot be applied
    #[tracing::instrument(skip_all)]
    pub async fn establish_connection(&self, answer: &str) -> Result<bool, ServiceError> {
        let payload = SignalingPayload::from_json(answer)?;
        let Some(desc) = payload.desc.filter(|d| d.sdp_type == SdpType::Answer) else {
            tracing::debug!("Dropping payload that is not an answer");
            return Ok(false);
        };

        match self
            .manager
            .set_remote_answer_and_candidates(desc, Some(payload.candidates))
            .await
        {
            Ok(applied) => Ok(applied),
            Err(e) => Err(self.report(e).await),
        }
    }

    /// End the current call, notifying the remote peer if configured
    pub async fn end_call(&self) {
        self.finish_call(EndReason::Local, self.config.notify_remote_on_end)
            .await;
    }

    /// Enable or disable the camera
    pub fn set_video_enabled(&self, enabled: bool) {
        self.manager.set_video_enabled(enabled);
        self.store.dispatch(CallAction::ToggleVideo(enabled));
    }

    /// Enable or disable the microphone
    pub fn set_audio_enabled(&self, enabled: bool) {
        self.manager.set_audio_enabled(enabled);
        self.store.dispatch(CallAction::ToggleAudio(enabled));
    }

    /// Route one received envelope
    ///
    /// Offers are published as [`ServiceEvent::IncomingCall`]; answers and
    /// `bye` from anyone but the current peer are ignored.
    ///
    /// # Errors
    ///
    /// Returns error if an answer from the current peer cannot be applied
    #[tracing::instrument(skip(self, envelope), fields(from = %from, kind = envelope.kind()))]
    pub async fn process_envelope(&self, from: PeerId, envelope: SignalingEnvelope) -> Result<(), ServiceError> {
        match envelope {
            SignalingEnvelope::Offer(offer) => {
                tracing::info!(call_id = %offer.call_id, gathering_ms = offer.gathering_ms, collected_all = offer.collected_all, "Incoming call");
                let _ = self.event_sender.send(ServiceEvent::IncomingCall {
                    call_id: offer.call_id,
                    peer: from,
                    payload: offer.payload,
                });
            }
            SignalingEnvelope::Answer(answer) => {
                if !self.is_current_peer(&from) {
                    tracing::warn!("Answer from a peer we are not calling, ignoring");
                    return Ok(());
                }
                tracing::info!(gathering_ms = answer.gathering_ms, collected_all = answer.collected_all, "Remote answer received");
                self.establish_connection(&answer.payload).await?;
            }
            SignalingEnvelope::Bye { reason, .. } => {
                if !self.is_current_peer(&from) {
                    tracing::debug!("Bye for a call that is not active, ignoring");
                    return Ok(());
                }
                tracing::info!(?reason, "Remote hung up");
                self.finish_call(EndReason::RemoteHangup, false).await;
            }
        }
        Ok(())
    }

    /// Receive the next envelope from the transport and route it
    ///
    /// # Errors
    ///
    /// Returns error if receiving fails or the envelope cannot be applied
    pub async fn receive_and_process(&self) -> Result<(), ServiceError> {
        let (from, envelope) = self
            .signaling
            .receive()
            .await
            .map_err(|e| ServiceError::Signaling(e.to_string()))?;
        self.process_envelope(from, envelope).await
    }

    fn begin_call(&self, call_id: CallId, peer: &PeerId) {
        *self.active.lock() = Some(ActiveCall {
            call_id,
            peer: peer.clone(),
        });
        self.store.dispatch(CallAction::Started(peer.clone()));
    }

    async fn place_offer(
        &self,
        call_id: CallId,
        peer: &PeerId,
        media: Option<MediaSinks>,
    ) -> Result<GatheringSummary, ServiceError> {
        if let Some(sinks) = media {
            self.manager.start_media_capture(sinks.local, sinks.remote).await?;
        }

        let ice = self.ice_configuration().await?;
        let events = self.manager.subscribe();
        let handle = match self.manager.initiate_offer(&ice).await {
            Ok(handle) => handle,
            Err(e) => return Err(self.report(e).await),
        };

        let (result, summary) = self.await_gathering(handle, events).await?;
        self.send_negotiation(peer, call_id, &result, summary, SdpType::Offer)
            .await?;
        Ok(summary)
    }

    async fn place_answer(
        &self,
        call_id: CallId,
        peer: &PeerId,
        desc: SessionDescription,
        candidates: Vec<IceCandidate>,
        media: Option<MediaSinks>,
    ) -> Result<GatheringSummary, ServiceError> {
        if let Some(sinks) = media {
            self.manager.start_media_capture(sinks.local, sinks.remote).await?;
        }

        let ice = self.ice_configuration().await?;
        let events = self.manager.subscribe();
        let handle = match self
            .manager
            .handle_offer_and_create_answer(&ice, desc, Some(candidates))
            .await
        {
            Ok(handle) => handle,
            Err(e) => return Err(self.report(e).await),
        };

        let (result, summary) = self.await_gathering(handle, events).await?;
        self.send_negotiation(peer, call_id, &result, summary, SdpType::Answer)
            .await?;
        Ok(summary)
    }

    /// Roll back a call that failed before its description was sent
    async fn abandon_call(&self, call_id: CallId) {
        {
            let mut active = self.active.lock();
            if active.as_ref().map(|c| c.call_id) != Some(call_id) {
                return;
            }
            *active = None;
        }
        tracing::warn!(%call_id, "Call setup failed, resetting");
        self.manager.reinitialize().await;
        self.store.dispatch(CallAction::Reset);
    }

    fn is_current_peer(&self, peer: &PeerId) -> bool {
        self.active.lock().as_ref().is_some_and(|c| &c.peer == peer)
    }

    async fn finish_call(&self, reason: EndReason, notify_remote: bool) {
        let active = self.active.lock().take();

        if let (true, Some(call)) = (notify_remote, active.as_ref()) {
            let bye = SignalingEnvelope::Bye {
                call_id: Some(call.call_id),
                reason: Some("hangup".to_string()),
            };
            if let Err(e) = self.signaling.send(&call.peer, bye).await {
                tracing::warn!(error = %e, "Failed to notify remote peer");
            }
        }

        self.manager.reinitialize().await;
        self.store.dispatch(CallAction::Reset);

        let call_id = active.map(|c| c.call_id);
        tracing::info!(?call_id, ?reason, "Call ended");
        let _ = self
            .event_sender
            .send(ServiceEvent::CallEnded { call_id, reason });
    }

    async fn ice_configuration(&self) -> Result<IceConfiguration, ServiceError> {
        let settings = match self.settings.get_call_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                self.errors
                    .capture(WebRtcErrorType::IceServer, &e, self.manager.get_diagnostics())
                    .await;
                return Err(e.into());
            }
        };
        match IceConfiguration::from_json(&settings.ice_server_configuration) {
            Ok(config) => Ok(config),
            Err(e) => Err(self.report(e.into()).await),
        }
    }

    /// Capture a negotiation failure and hand it back for propagation
    async fn report(&self, error: ManagerError) -> ServiceError {
        match &error {
            ManagerError::GatheringAborted => {}
            // Media failures are captured by the manager
            e if e.error_type() == WebRtcErrorType::Media => {}
            e => {
                self.errors
                    .capture(e.error_type(), e, self.manager.get_diagnostics())
                    .await;
            }
        }
        ServiceError::Manager(error)
    }

    /// Wait for the gathering phase behind `handle` to finalize
    ///
    /// When the timer fires the phase is finalized with whatever candidates
    /// have arrived, regardless of the required mix. If none have arrived yet
    /// the phase finalizes on the first one.
    async fn await_gathering(
        &self,
        mut handle: GatheringHandle,
        mut events: broadcast::Receiver<ConnectionEvent>,
    ) -> Result<(GatheringResult, GatheringSummary), ServiceError> {
        let started = Instant::now();
        let (fired_tx, mut fired_rx) = oneshot::channel();
        let timer = GatheringTimer::start(self.config.gathering_timeout_ms, move || {
            let _ = fired_tx.send(());
        })?;

        let mut deadline_passed = false;
        let mut events_open = true;
        let outcome = loop {
            tokio::select! {
                res = &mut handle => break res,
                _ = &mut fired_rx, if !deadline_passed => {
                    deadline_passed = true;
                    tracing::info!(timeout_ms = self.config.gathering_timeout_ms, "Gathering deadline reached");
                    self.manager.force_complete_gathering().await;
                }
                event = events.recv(), if deadline_passed && events_open => match event {
                    Ok(ConnectionEvent::CandidatesReceived(_)) | Err(RecvError::Lagged(_)) => {
                        self.manager.force_complete_gathering().await;
                    }
                    Ok(_) => {}
                    Err(RecvError::Closed) => events_open = false,
                },
            }
        };
        timer.clear();

        let result = match outcome {
            Ok(result) => result,
            Err(e) => return Err(self.report(e).await),
        };
        let summary = GatheringSummary {
            gathering_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            collected_all: result.collected_all(),
            candidates: result.payload.candidates.len(),
        };
        tracing::info!(
            gathering_ms = summary.gathering_ms,
            collected_all = summary.collected_all,
            candidates = summary.candidates,
            "Gathering finished"
        );
        Ok((result, summary))
    }

    async fn send_negotiation(
        &self,
        peer: &PeerId,
        call_id: CallId,
        result: &GatheringResult,
        summary: GatheringSummary,
        kind: SdpType,
    ) -> Result<(), ServiceError> {
        let negotiation = Negotiation {
            call_id,
            payload: result.payload.to_json()?,
            gathering_ms: summary.gathering_ms,
            collected_all: summary.collected_all,
            diagnostics: Some(self.manager.get_diagnostics()),
        };
        let envelope = if kind == SdpType::Answer {
            SignalingEnvelope::Answer(negotiation)
        } else {
            SignalingEnvelope::Offer(negotiation)
        };
        self.signaling
            .send(peer, envelope)
            .await
            .map_err(|e| ServiceError::Signaling(e.to_string()))
    }

    async fn on_connection_state(&self, state: ConnectionState) {
        let peer = self.active.lock().as_ref().map(|c| c.peer.clone());
        match state {
            ConnectionState::Connected => {
                let report = ConnectionReport {
                    peer: peer.clone(),
                    diagnostics: self.manager.get_diagnostics(),
                };
                if let Err(e) = self.diagnostics.log_connection_established(report).await {
                    tracing::warn!(error = %e, "Failed to log established connection");
                }
                let _ = self.event_sender.send(ServiceEvent::CallEstablished { peer });
            }
            ConnectionState::Failed => {
                let report = ConnectionReport {
                    peer: peer.clone(),
                    diagnostics: self.manager.get_diagnostics(),
                };
                if let Err(e) = self.diagnostics.log_connection_failed(report).await {
                    tracing::warn!(error = %e, "Failed to log connection failure");
                }
                let _ = self.event_sender.send(ServiceEvent::ConnectionFailed { peer });
            }
            ConnectionState::Disconnected => {
                self.finish_call(EndReason::Disconnected, false).await;
            }
            _ => {}
        }
    }
}

/// Builder for [`ConnectionService`]
pub struct ConnectionServiceBuilder<T: SignalingTransport> {
    signaling: Arc<SignalingHandler<T>>,
    config: CallConfig,
    factory: Option<Arc<dyn PeerConnectionFactory>>,
    devices: Option<Arc<dyn MediaDevices>>,
    settings: Option<Arc<dyn SettingsApi>>,
    diagnostics: Option<Arc<dyn DiagnosticsApi>>,
    store: Option<Arc<dyn CallStateStore>>,
}

impl<T: SignalingTransport + 'static> ConnectionServiceBuilder<T> {
    /// Create new builder
    #[must_use]
    pub fn new(signaling: Arc<SignalingHandler<T>>) -> Self {
        Self {
            signaling,
            config: CallConfig::default(),
            factory: None,
            devices: None,
            settings: None,
            diagnostics: None,
            store: None,
        }
    }

    /// Set configuration
    #[must_use]
    pub fn with_config(mut self, config: CallConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the peer connection factory
    #[must_use]
    pub fn with_peer_factory(mut self, factory: Arc<dyn PeerConnectionFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Set the media device source
    #[must_use]
    pub fn with_media_devices(mut self, devices: Arc<dyn MediaDevices>) -> Self {
        self.devices = Some(devices);
        self
    }

    /// Set the settings source
    #[must_use]
    pub fn with_settings(mut self, settings: Arc<dyn SettingsApi>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Set the diagnostics sink
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsApi>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Set the application store
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn CallStateStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[cfg(feature = "webrtc-backend")]
    fn default_factory() -> Option<Arc<dyn PeerConnectionFactory>> {
        Some(Arc::new(crate::webrtc_backend::WebRtcBackendFactory::default()))
    }

    #[cfg(not(feature = "webrtc-backend"))]
    fn default_factory() -> Option<Arc<dyn PeerConnectionFactory>> {
        None
    }

    /// Build the service
    ///
    /// # Errors
    ///
    /// Returns error if no peer connection factory is set and the crate was
    /// built without the `webrtc-backend` feature
    pub fn build(self) -> Result<ConnectionService<T>, ServiceError> {
        let factory = self
            .factory
            .or_else(Self::default_factory)
            .ok_or_else(|| ServiceError::InitError("no peer connection factory".to_string()))?;
        let devices = self
            .devices
            .unwrap_or_else(|| Arc::new(SyntheticMediaDevices::new()));
        let settings = self.settings.unwrap_or_else(|| {
            Arc::new(StaticSettings(CallSettings {
                ice_server_configuration: r#"{"iceServers":[]}"#.to_string(),
            }))
        });
        let diagnostics: Arc<dyn DiagnosticsApi> =
            self.diagnostics.unwrap_or_else(|| Arc::new(TracingDiagnostics));
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryCallStore::new()));

        let errors = ErrorLogger::with_api(self.config.error_journal_capacity, Arc::clone(&diagnostics));
        let manager = ConnectionManager::new(factory, devices, &self.config, errors.clone());
        let (event_sender, _) = broadcast::channel(256);

        Ok(ConnectionService {
            manager,
            signaling: self.signaling,
            settings,
            diagnostics,
            store,
            config: self.config,
            errors,
            active: Mutex::new(None),
            monitor: Mutex::new(None),
            event_sender,
        })
    }
}
