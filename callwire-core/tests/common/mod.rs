//! Fakes for the collaborators of the connection manager and service
#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use callwire_core::api::{ApiError, CallSettings, ConnectionReport, DiagnosticsApi, SettingsApi};
use callwire_core::diagnostics::{ConnectionDiagnostics, ErrorLogger, WebRtcErrorType};
use callwire_core::media::{MediaConstraints, MediaDevices, MediaError, MediaKind, MediaStream, MediaTrack, VideoSink};
use callwire_core::peer::{
    IceConfiguration, PeerConnectionBackend, PeerConnectionFactory, PeerError, PeerEvent,
    PeerEventHandler,
};
use callwire_core::types::{ConnectionState, IceCandidate, SdpType, SessionDescription, SignalingState};
use callwire_core::{CallConfig, ConnectionManager};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub fn host() -> IceCandidate {
    IceCandidate::new("candidate:1 1 udp 2130706431 192.168.1.10 50000 typ host")
}

pub fn srflx() -> IceCandidate {
    IceCandidate::new("candidate:2 1 udp 1694498815 203.0.113.7 50001 typ srflx raddr 192.168.1.10 rport 50000")
}

pub fn prflx() -> IceCandidate {
    IceCandidate::new("candidate:3 1 udp 1862270975 198.51.100.2 50002 typ prflx raddr 192.168.1.10 rport 50000")
}

pub fn relay() -> IceCandidate {
    IceCandidate::new("candidate:4 1 udp 16777215 198.51.100.9 3478 typ relay raddr 203.0.113.7 rport 50001")
}

#[derive(Default)]
struct FakeState {
    local: Option<SessionDescription>,
    signaling: Option<SignalingState>,
    connection: Option<ConnectionState>,
    remote_descriptions: Vec<SessionDescription>,
    added_candidates: Vec<IceCandidate>,
    streams: Vec<String>,
    closed: bool,
}

/// Peer connection that replays a scripted candidate sequence
///
/// The script runs inline at the end of `set_local_description`, after the
/// local description is stored, mimicking a browser that starts gathering
/// as soon as the description is applied.
pub struct FakePeerConnection {
    id: usize,
    config: IceConfiguration,
    events: PeerEventHandler,
    script: Vec<Option<IceCandidate>>,
    fail_offers: bool,
    state: Mutex<FakeState>,
}

impl FakePeerConnection {
    /// Deliver an event as if the connection raised it
    pub async fn emit(&self, event: PeerEvent) {
        (self.events)(event).await;
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// ICE servers the connection was built with
    pub fn configuration(&self) -> IceConfiguration {
        self.config.clone()
    }

    pub fn remote_descriptions(&self) -> Vec<SessionDescription> {
        self.state.lock().remote_descriptions.clone()
    }

    pub fn added_candidates(&self) -> Vec<IceCandidate> {
        self.state.lock().added_candidates.clone()
    }

    pub fn streams(&self) -> Vec<String> {
        self.state.lock().streams.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

#[async_trait]
impl PeerConnectionBackend for FakePeerConnection {
    async fn create_offer(&self) -> Result<SessionDescription, PeerError> {
        if self.fail_offers {
            return Err(PeerError::Negotiation("scripted offer failure".to_string()));
        }
        Ok(SessionDescription::offer(format!("v=0 fake-offer-{}", self.id)))
    }

    async fn create_answer(&self) -> Result<SessionDescription, PeerError> {
        if self.signaling_state() != SignalingState::HaveRemoteOffer {
            return Err(PeerError::Negotiation("no remote offer".to_string()));
        }
        Ok(SessionDescription::answer(format!("v=0 fake-answer-{}", self.id)))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), PeerError> {
        {
            let mut state = self.state.lock();
            state.signaling = Some(match desc.sdp_type {
                SdpType::Offer => SignalingState::HaveLocalOffer,
                _ => SignalingState::Stable,
            });
            state.local = Some(desc);
        }
        for candidate in &self.script {
            self.emit(PeerEvent::IceCandidate(candidate.clone())).await;
        }
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), PeerError> {
        let mut state = self.state.lock();
        state.signaling = Some(match desc.sdp_type {
            SdpType::Offer => SignalingState::HaveRemoteOffer,
            _ => SignalingState::Stable,
        });
        state.remote_descriptions.push(desc);
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), PeerError> {
        self.state.lock().added_candidates.push(candidate);
        Ok(())
    }

    async fn local_description(&self) -> Option<SessionDescription> {
        self.state.lock().local.clone()
    }

    fn signaling_state(&self) -> SignalingState {
        self.state.lock().signaling.unwrap_or(SignalingState::Stable)
    }

    fn connection_state(&self) -> ConnectionState {
        self.state.lock().connection.unwrap_or(ConnectionState::New)
    }

    async fn add_stream(&self, stream: Arc<MediaStream>) -> Result<(), PeerError> {
        self.state.lock().streams.push(stream.id().to_string());
        Ok(())
    }

    async fn close(&self) -> Result<(), PeerError> {
        let mut state = self.state.lock();
        state.closed = true;
        state.signaling = Some(SignalingState::Closed);
        state.connection = Some(ConnectionState::Closed);
        Ok(())
    }
}

/// Factory handing out [`FakePeerConnection`]s and remembering them
#[derive(Default)]
pub struct FakeFactory {
    script: Mutex<Vec<Option<IceCandidate>>>,
    fail_offers: bool,
    created: Mutex<Vec<Arc<FakePeerConnection>>>,
}

impl FakeFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Connections replay `script` after each local description
    pub fn with_script(script: Vec<Option<IceCandidate>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            ..Self::default()
        })
    }

    pub fn failing_offers() -> Arc<Self> {
        Arc::new(Self {
            fail_offers: true,
            ..Self::default()
        })
    }

    /// Script for connections created from now on
    pub fn set_script(&self, script: Vec<Option<IceCandidate>>) {
        *self.script.lock() = script;
    }

    pub fn count(&self) -> usize {
        self.created.lock().len()
    }

    pub fn connection(&self, index: usize) -> Arc<FakePeerConnection> {
        Arc::clone(&self.created.lock()[index])
    }

    pub fn latest(&self) -> Arc<FakePeerConnection> {
        Arc::clone(self.created.lock().last().unwrap())
    }
}

#[async_trait]
impl PeerConnectionFactory for FakeFactory {
    async fn create(
        &self,
        config: &IceConfiguration,
        events: PeerEventHandler,
    ) -> Result<Arc<dyn PeerConnectionBackend>, PeerError> {
        let mut created = self.created.lock();
        let conn = Arc::new(FakePeerConnection {
            id: created.len(),
            config: config.clone(),
            events,
            script: self.script.lock().clone(),
            fail_offers: self.fail_offers,
            state: Mutex::new(FakeState::default()),
        });
        created.push(Arc::clone(&conn));
        Ok(conn)
    }
}

/// Media devices rejecting the first `fail_first` requests
pub struct FakeMediaDevices {
    fail_first: usize,
    calls: AtomicUsize,
    requested: Mutex<Vec<MediaConstraints>>,
}

impl FakeMediaDevices {
    pub fn new(fail_first: usize) -> Arc<Self> {
        Arc::new(Self {
            fail_first,
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<MediaConstraints> {
        self.requested.lock().clone()
    }
}

#[async_trait]
impl MediaDevices for FakeMediaDevices {
    async fn get_user_media(&self, constraints: &MediaConstraints) -> Result<Arc<MediaStream>, MediaError> {
        self.requested.lock().push(constraints.clone());
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_first {
            return Err(MediaError::Overconstrained(format!("profile {n} rejected")));
        }
        Ok(Arc::new(MediaStream::with_tracks(
            format!("camera-{n}"),
            vec![
                Arc::new(MediaTrack::new(format!("mic-{n}"), MediaKind::Audio)),
                Arc::new(MediaTrack::new(format!("cam-{n}"), MediaKind::Video)),
            ],
        )))
    }
}

/// Video element stand-in recording every attachment
#[derive(Default)]
pub struct RecordingSink {
    attached: Mutex<Vec<Option<Arc<MediaStream>>>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn attachments(&self) -> usize {
        self.attached.lock().len()
    }

    pub fn current(&self) -> Option<Arc<MediaStream>> {
        self.attached.lock().last().cloned().flatten()
    }
}

impl VideoSink for RecordingSink {
    fn attach(&self, stream: Option<Arc<MediaStream>>) {
        self.attached.lock().push(stream);
    }
}

/// Diagnostics API recording every call
#[derive(Default)]
pub struct RecordingDiagnostics {
    pub established: Mutex<Vec<ConnectionReport>>,
    pub failed: Mutex<Vec<ConnectionReport>>,
    pub errors: Mutex<Vec<(WebRtcErrorType, String)>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn error_types(&self) -> Vec<WebRtcErrorType> {
        self.errors.lock().iter().map(|(t, _)| *t).collect()
    }
}

#[async_trait]
impl DiagnosticsApi for RecordingDiagnostics {
    async fn log_connection_established(&self, report: ConnectionReport) -> Result<(), ApiError> {
        self.established.lock().push(report);
        Ok(())
    }

    async fn log_connection_failed(&self, report: ConnectionReport) -> Result<(), ApiError> {
        self.failed.lock().push(report);
        Ok(())
    }

    async fn log_webrtc_error(
        &self,
        error_type: WebRtcErrorType,
        message: String,
        _stack_trace: String,
        _diagnostics: ConnectionDiagnostics,
    ) -> Result<(), ApiError> {
        self.errors.lock().push((error_type, message));
        Ok(())
    }
}

/// Settings source that always fails
pub struct FailingSettings;

#[async_trait]
impl SettingsApi for FailingSettings {
    async fn get_call_settings(&self) -> Result<CallSettings, ApiError> {
        Err(ApiError::Status {
            status: 503,
            message: "settings unavailable".to_string(),
        })
    }
}

pub fn stun_config() -> IceConfiguration {
    IceConfiguration::from_json(r#"{"iceServers":[{"urls":"stun:stun.example.org:3478"}]}"#).unwrap()
}

pub fn manager_with(
    factory: Arc<FakeFactory>,
    devices: Arc<FakeMediaDevices>,
    diagnostics: Arc<RecordingDiagnostics>,
) -> ConnectionManager {
    ConnectionManager::new(
        factory,
        devices,
        &CallConfig::default(),
        ErrorLogger::with_api(50, diagnostics),
    )
}
