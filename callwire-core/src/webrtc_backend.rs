//! Peer connections backed by the `webrtc` crate

use crate::media::{MediaKind, MediaStream, MediaTrack};
use crate::peer::{
    IceConfiguration, PeerConnectionBackend, PeerConnectionFactory, PeerError, PeerEvent,
    PeerEventHandler,
};
use crate::types::{ConnectionState, IceCandidate, SdpType, SessionDescription, SignalingState};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

fn to_rtc_configuration(config: &IceConfiguration) -> RTCConfiguration {
    RTCConfiguration {
        ice_servers: config
            .ice_servers
            .iter()
            .map(|s| RTCIceServer {
                urls: s.urls.clone(),
                username: s.username.clone().unwrap_or_default(),
                credential: s.credential.clone().unwrap_or_default(),
                ..Default::default()
            })
            .collect(),
        ice_candidate_pool_size: config.ice_candidate_pool_size.unwrap_or_default(),
        ..Default::default()
    }
}

fn to_rtc_description(desc: SessionDescription) -> Result<RTCSessionDescription, PeerError> {
    let res = match desc.sdp_type {
        SdpType::Offer => RTCSessionDescription::offer(desc.sdp),
        SdpType::Answer => RTCSessionDescription::answer(desc.sdp),
        SdpType::Pranswer => RTCSessionDescription::pranswer(desc.sdp),
        other => {
            return Err(PeerError::Negotiation(format!(
                "Unsupported description type: {other}"
            )))
        }
    };
    res.map_err(|e| PeerError::Negotiation(format!("Invalid SDP: {e}")))
}

fn from_rtc_description(desc: RTCSessionDescription) -> SessionDescription {
    let sdp_type = match desc.sdp_type {
        RTCSdpType::Offer => SdpType::Offer,
        RTCSdpType::Pranswer => SdpType::Pranswer,
        RTCSdpType::Answer => SdpType::Answer,
        RTCSdpType::Rollback => SdpType::Rollback,
        RTCSdpType::Unspecified => SdpType::Unspecified,
    };
    SessionDescription {
        sdp_type,
        sdp: desc.sdp,
    }
}

fn map_connection_state(state: RTCPeerConnectionState) -> ConnectionState {
    match state {
        RTCPeerConnectionState::Connecting => ConnectionState::Connecting,
        RTCPeerConnectionState::Connected => ConnectionState::Connected,
        RTCPeerConnectionState::Disconnected => ConnectionState::Disconnected,
        RTCPeerConnectionState::Failed => ConnectionState::Failed,
        RTCPeerConnectionState::Closed => ConnectionState::Closed,
        RTCPeerConnectionState::New | RTCPeerConnectionState::Unspecified => ConnectionState::New,
    }
}

fn map_signaling_state(state: RTCSignalingState) -> SignalingState {
    match state {
        RTCSignalingState::HaveLocalOffer => SignalingState::HaveLocalOffer,
        RTCSignalingState::HaveRemoteOffer => SignalingState::HaveRemoteOffer,
        RTCSignalingState::HaveLocalPranswer => SignalingState::HaveLocalPranswer,
        RTCSignalingState::HaveRemotePranswer => SignalingState::HaveRemotePranswer,
        RTCSignalingState::Closed => SignalingState::Closed,
        RTCSignalingState::Stable | RTCSignalingState::Unspecified => SignalingState::Stable,
    }
}

fn codec_for(kind: MediaKind) -> RTCRtpCodecCapability {
    match kind {
        MediaKind::Audio => RTCRtpCodecCapability {
            mime_type: "audio/opus".to_string(),
            clock_rate: 48000,
            channels: 2,
            sdp_fmtp_line: String::new(),
            rtcp_feedback: vec![],
        },
        MediaKind::Video => RTCRtpCodecCapability {
            mime_type: "video/VP8".to_string(),
            clock_rate: 90000,
            channels: 0,
            sdp_fmtp_line: String::new(),
            rtcp_feedback: vec![],
        },
    }
}

/// `RTCPeerConnection` behind the [`PeerConnectionBackend`] seam
pub struct WebRtcPeerConnection {
    pc: Arc<RTCPeerConnection>,
}

impl WebRtcPeerConnection {
    fn wire_events(&self, events: &PeerEventHandler) {
        let handler = Arc::clone(events);
        self.pc.on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let candidate = match candidate {
                    Some(c) => match c.to_json() {
                        Ok(init) => Some(IceCandidate {
                            candidate: init.candidate,
                            sdp_mid: init.sdp_mid,
                            sdp_mline_index: init.sdp_mline_index,
                            username_fragment: init.username_fragment,
                        }),
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to serialize local candidate");
                            return;
                        }
                    },
                    None => None,
                };
                handler(PeerEvent::IceCandidate(candidate)).await;
            })
        }));

        let handler = Arc::clone(events);
        self.pc
            .on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
                let handler = Arc::clone(&handler);
                Box::pin(async move {
                    handler(PeerEvent::ConnectionState(map_connection_state(state))).await;
                })
            }));

        let handler = Arc::clone(events);
        let remote_streams: Arc<Mutex<HashMap<String, Arc<MediaStream>>>> = Arc::default();
        self.pc.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let handler = Arc::clone(&handler);
                let kind = match track.kind() {
                    RTPCodecType::Video => MediaKind::Video,
                    _ => MediaKind::Audio,
                };
                let stream = {
                    let mut streams = remote_streams.lock();
                    let stream = streams
                        .entry(track.stream_id())
                        .or_insert_with(|| Arc::new(MediaStream::new(track.stream_id())));
                    stream.add_track(Arc::new(MediaTrack::new(track.id(), kind)));
                    Arc::clone(stream)
                };
                tracing::debug!(stream_id = %stream.id(), %kind, "Remote track received");
                Box::pin(async move {
                    handler(PeerEvent::Track(stream)).await;
                })
            },
        ));
    }
}

#[async_trait]
impl PeerConnectionBackend for WebRtcPeerConnection {
    async fn create_offer(&self) -> Result<SessionDescription, PeerError> {
        self.pc
            .create_offer(None)
            .await
            .map(from_rtc_description)
            .map_err(|e| PeerError::Negotiation(format!("Failed to create offer: {e}")))
    }

    async fn create_answer(&self) -> Result<SessionDescription, PeerError> {
        self.pc
            .create_answer(None)
            .await
            .map(from_rtc_description)
            .map_err(|e| PeerError::Negotiation(format!("Failed to create answer: {e}")))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), PeerError> {
        self.pc
            .set_local_description(to_rtc_description(desc)?)
            .await
            .map_err(|e| PeerError::Negotiation(format!("Failed to set local description: {e}")))
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), PeerError> {
        self.pc
            .set_remote_description(to_rtc_description(desc)?)
            .await
            .map_err(|e| PeerError::Negotiation(format!("Failed to set remote description: {e}")))
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), PeerError> {
        self.pc
            .add_ice_candidate(RTCIceCandidateInit {
                candidate: candidate.candidate,
                sdp_mid: candidate.sdp_mid,
                sdp_mline_index: candidate.sdp_mline_index,
                username_fragment: candidate.username_fragment,
            })
            .await
            .map_err(|e| PeerError::InvalidCandidate(e.to_string()))
    }

    async fn local_description(&self) -> Option<SessionDescription> {
        self.pc.local_description().await.map(from_rtc_description)
    }

    fn signaling_state(&self) -> SignalingState {
        map_signaling_state(self.pc.signaling_state())
    }

    fn connection_state(&self) -> ConnectionState {
        map_connection_state(self.pc.connection_state())
    }

    async fn add_stream(&self, stream: Arc<MediaStream>) -> Result<(), PeerError> {
        for track in stream.tracks() {
            let local: Arc<dyn TrackLocal + Send + Sync> = Arc::new(TrackLocalStaticSample::new(
                codec_for(track.kind()),
                track.id().to_string(),
                stream.id().to_string(),
            ));
            self.pc
                .add_track(local)
                .await
                .map_err(|e| PeerError::Media(format!("Failed to add {} track: {e}", track.kind())))?;
            tracing::debug!(track_id = %track.id(), kind = %track.kind(), "Local track added");
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), PeerError> {
        self.pc
            .close()
            .await
            .map_err(|e| PeerError::Negotiation(format!("Failed to close: {e}")))
    }
}

/// Builds [`WebRtcPeerConnection`]s with the default codecs and interceptors
#[derive(Debug, Clone, Copy, Default)]
pub struct WebRtcBackendFactory;

#[async_trait]
impl PeerConnectionFactory for WebRtcBackendFactory {
    async fn create(
        &self,
        config: &IceConfiguration,
        events: PeerEventHandler,
    ) -> Result<Arc<dyn PeerConnectionBackend>, PeerError> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| PeerError::Negotiation(format!("Failed to register codecs: {e}")))?;

        let registry = register_default_interceptors(Registry::new(), &mut media_engine)
            .map_err(|e| PeerError::Negotiation(format!("Failed to register interceptors: {e}")))?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let pc = api
            .new_peer_connection(to_rtc_configuration(config))
            .await
            .map_err(|e| PeerError::InvalidConfiguration(format!("Failed to create peer connection: {e}")))?;

        let conn = WebRtcPeerConnection { pc: Arc::new(pc) };
        conn.wire_events(&events);
        tracing::debug!(ice_servers = config.ice_servers.len(), "WebRTC peer connection created");
        Ok(Arc::new(conn))
    }
}
