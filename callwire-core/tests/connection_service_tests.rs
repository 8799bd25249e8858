//! Call orchestration over an in-memory signaling channel
#![allow(clippy::unwrap_used, clippy::panic)]

mod common;

use callwire_core::api::{CallSettings, CallStateStore, CallUiState, InMemoryCallStore, SettingsApi, StaticSettings};
use callwire_core::diagnostics::WebRtcErrorType;
use callwire_core::peer::{PeerError, PeerEvent};
use callwire_core::service::{ConnectionService, EndReason, MediaSinks, ServiceError, ServiceEvent};
use callwire_core::signaling::{ChannelTransport, Negotiation, SignalingEnvelope, SignalingHandler, SignalingTransport};
use callwire_core::types::{CallId, ConnectionState, PeerId, SdpType, SessionDescription, SignalingPayload};
use callwire_core::{CallConfig, ManagerError};
use common::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

struct Peer {
    service: Arc<ConnectionService<ChannelTransport>>,
    factory: Arc<FakeFactory>,
    diagnostics: Arc<RecordingDiagnostics>,
    store: Arc<InMemoryCallStore>,
}

fn alice() -> PeerId {
    PeerId::new("alice")
}

fn bob() -> PeerId {
    PeerId::new("bob")
}

fn stun_settings() -> Arc<dyn SettingsApi> {
    Arc::new(StaticSettings(CallSettings {
        ice_server_configuration: r#"{"iceServers":[{"urls":"stun:stun.example.org:3478"}]}"#.to_string(),
    }))
}

fn timeout_config(ms: u64) -> CallConfig {
    CallConfig::default().with_gathering_timeout(Duration::from_millis(ms))
}

fn peer_with(
    transport: ChannelTransport,
    factory: Arc<FakeFactory>,
    config: CallConfig,
    settings: Arc<dyn SettingsApi>,
    devices: Arc<FakeMediaDevices>,
) -> Peer {
    let diagnostics = RecordingDiagnostics::new();
    let store = Arc::new(InMemoryCallStore::new());
    let service = ConnectionService::builder(Arc::new(SignalingHandler::new(Arc::new(transport))))
        .with_config(config)
        .with_peer_factory(factory.clone())
        .with_media_devices(devices)
        .with_settings(settings)
        .with_diagnostics(diagnostics.clone())
        .with_store(store.clone())
        .build()
        .unwrap();
    Peer {
        service: Arc::new(service),
        factory,
        diagnostics,
        store,
    }
}

fn peer(transport: ChannelTransport, factory: Arc<FakeFactory>, config: CallConfig) -> Peer {
    peer_with(transport, factory, config, stun_settings(), FakeMediaDevices::new(0))
}

fn offer_json(candidates: Vec<callwire_core::types::IceCandidate>) -> String {
    SignalingPayload {
        desc: Some(SessionDescription::offer("v=0 remote-offer")),
        candidates,
    }
    .to_json()
    .unwrap()
}

fn answer_json(candidates: Vec<callwire_core::types::IceCandidate>) -> String {
    SignalingPayload {
        desc: Some(SessionDescription::answer("v=0 remote-answer")),
        candidates,
    }
    .to_json()
    .unwrap()
}

async fn next_negotiation(transport: &ChannelTransport) -> (SdpType, Negotiation) {
    match transport.receive().await.unwrap().1 {
        SignalingEnvelope::Offer(n) => (SdpType::Offer, n),
        SignalingEnvelope::Answer(n) => (SdpType::Answer, n),
        other => panic!("expected a negotiation, got {other:?}"),
    }
}

async fn wait_for<F>(events: &mut broadcast::Receiver<ServiceEvent>, mut pred: F) -> ServiceEvent
where
    F: FnMut(&ServiceEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.unwrap();
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_outgoing_call_forced_by_timeout() {
    let (alice_t, bob_t) = ChannelTransport::pair(alice(), bob());
    let a = peer(
        alice_t,
        FakeFactory::with_script(vec![Some(host()), Some(srflx()), Some(relay())]),
        timeout_config(1000),
    );
    let mut events = a.service.subscribe_events();

    let call_id = a.service.start_outgoing_call(bob(), None).await.unwrap();

    let (kind, offer) = next_negotiation(&bob_t).await;
    assert_eq!(kind, SdpType::Offer);
    assert_eq!(offer.call_id, call_id);
    assert!(!offer.collected_all);
    assert!(offer.gathering_ms >= 1000);
    assert!(offer.diagnostics.is_some());

    let payload = SignalingPayload::from_json(&offer.payload).unwrap();
    assert_eq!(payload.sdp_type(), Some(SdpType::Offer));
    assert_eq!(payload.candidates, vec![host(), srflx(), relay()]);

    match events.try_recv().unwrap() {
        ServiceEvent::OfferSent { peer, summary, .. } => {
            assert_eq!(peer, bob());
            assert_eq!(summary.candidates, 3);
            assert!(!summary.collected_all);
        }
        other => panic!("unexpected event {other:?}"),
    }

    let state = a.store.current();
    assert!(state.active);
    assert_eq!(state.peer, Some(bob()));
    assert_eq!(a.service.active_call(), Some((call_id, bob())));
}

#[tokio::test(start_paused = true)]
async fn test_outgoing_call_completes_naturally_before_deadline() {
    let (alice_t, bob_t) = ChannelTransport::pair(alice(), bob());
    let a = peer(alice_t, FakeFactory::with_script(vec![Some(host()), None]), timeout_config(1000));

    a.service.start_outgoing_call(bob(), None).await.unwrap();

    let (_, offer) = next_negotiation(&bob_t).await;
    assert!(offer.collected_all);
    assert!(offer.gathering_ms < 1000);
    assert_eq!(SignalingPayload::from_json(&offer.payload).unwrap().candidates, vec![host()]);
}

#[tokio::test(start_paused = true)]
async fn test_short_mix_is_sent_at_deadline() {
    let (alice_t, bob_t) = ChannelTransport::pair(alice(), bob());
    let factory = FakeFactory::with_script(vec![Some(host()), Some(host())]);
    let a = peer(alice_t, Arc::clone(&factory), timeout_config(500));

    a.service.start_outgoing_call(bob(), None).await.unwrap();

    let (_, offer) = next_negotiation(&bob_t).await;
    assert!(!offer.collected_all);
    assert!(offer.gathering_ms >= 500);
    let payload = SignalingPayload::from_json(&offer.payload).unwrap();
    assert_eq!(payload.candidates, vec![host(), host()]);
    assert!(!a.service.manager().is_gathering());
}

#[tokio::test(start_paused = true)]
async fn test_deadline_without_candidates_sends_first_arrival() {
    let (alice_t, bob_t) = ChannelTransport::pair(alice(), bob());
    let factory = FakeFactory::with_script(vec![]);
    let a = peer(alice_t, Arc::clone(&factory), timeout_config(500));

    let service = Arc::clone(&a.service);
    let call = tokio::spawn(async move { service.start_outgoing_call(bob(), None).await });

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(a.service.manager().is_gathering());

    factory.latest().emit(PeerEvent::IceCandidate(Some(host()))).await;
    call.await.unwrap().unwrap();

    let (_, offer) = next_negotiation(&bob_t).await;
    assert!(!offer.collected_all);
    let payload = SignalingPayload::from_json(&offer.payload).unwrap();
    assert_eq!(payload.candidates, vec![host()]);
}

#[test]
fn test_service_futures_are_send() {
    fn assert_send<T: Send>(_: &T) {}

    let (alice_t, _bob_t) = ChannelTransport::pair(alice(), bob());
    let a = peer(alice_t, FakeFactory::new(), CallConfig::default());

    let outgoing = a.service.start_outgoing_call(bob(), None);
    assert_send(&outgoing);
    let incoming = a
        .service
        .handle_incoming_call(alice(), CallId::new(), "{}", None);
    assert_send(&incoming);
    let answer = a.service.establish_connection("{}");
    assert_send(&answer);
    let inbound = a.service.receive_and_process();
    assert_send(&inbound);
}

#[tokio::test]
async fn test_incoming_call_sends_answer() {
    let (bob_t, alice_t) = ChannelTransport::pair(bob(), alice());
    let b = peer(bob_t, FakeFactory::with_script(vec![None]), CallConfig::default());
    let mut events = b.service.subscribe_events();
    let call_id = CallId::new();

    b.service
        .handle_incoming_call(alice(), call_id, &offer_json(vec![host(), relay()]), None)
        .await
        .unwrap();

    let (kind, answer) = next_negotiation(&alice_t).await;
    assert_eq!(kind, SdpType::Answer);
    assert_eq!(answer.call_id, call_id);
    assert!(answer.collected_all);
    let payload = SignalingPayload::from_json(&answer.payload).unwrap();
    assert_eq!(payload.sdp_type(), Some(SdpType::Answer));
    assert!(payload.candidates.is_empty());

    let conn = b.factory.latest();
    assert_eq!(conn.added_candidates(), vec![host(), relay()]);
    assert_eq!(conn.remote_descriptions(), vec![SessionDescription::offer("v=0 remote-offer")]);
    assert!(matches!(events.try_recv().unwrap(), ServiceEvent::AnswerSent { .. }));
    assert_eq!(b.store.current().peer, Some(alice()));
}

#[tokio::test]
async fn test_incoming_call_with_malformed_offer_fails_before_any_work() {
    let (bob_t, _alice_t) = ChannelTransport::pair(bob(), alice());
    let b = peer(bob_t, FakeFactory::new(), CallConfig::default());

    let err = b
        .service
        .handle_incoming_call(alice(), CallId::new(), "{not json", None)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Payload(_)));
    assert_eq!(b.factory.count(), 0);
    assert!(!b.store.current().active);
}

#[tokio::test]
async fn test_incoming_call_rejects_answer_shaped_offer() {
    let (bob_t, _alice_t) = ChannelTransport::pair(bob(), alice());
    let b = peer(bob_t, FakeFactory::new(), CallConfig::default());

    let err = b
        .service
        .handle_incoming_call(alice(), CallId::new(), &answer_json(vec![]), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::UnexpectedDescription(_)));
}

#[tokio::test]
async fn test_establish_connection_ignores_offer_payload() {
    let (alice_t, _bob_t) = ChannelTransport::pair(alice(), bob());
    let a = peer(alice_t, FakeFactory::with_script(vec![None]), CallConfig::default());
    a.service.start_outgoing_call(bob(), None).await.unwrap();

    let applied = a.service.establish_connection(&offer_json(vec![host()])).await.unwrap();

    assert!(!applied);
    let conn = a.factory.latest();
    assert!(conn.remote_descriptions().is_empty());
    assert!(conn.added_candidates().is_empty());
}

#[tokio::test]
async fn test_establish_connection_applies_answer_in_order() {
    let (alice_t, _bob_t) = ChannelTransport::pair(alice(), bob());
    let a = peer(alice_t, FakeFactory::with_script(vec![None]), CallConfig::default());
    a.service.start_outgoing_call(bob(), None).await.unwrap();

    let applied = a
        .service
        .establish_connection(&answer_json(vec![srflx(), host()]))
        .await
        .unwrap();

    assert!(applied);
    let conn = a.factory.latest();
    assert_eq!(conn.remote_descriptions(), vec![SessionDescription::answer("v=0 remote-answer")]);
    assert_eq!(conn.added_candidates(), vec![srflx(), host()]);
}

#[tokio::test]
async fn test_establish_connection_propagates_malformed_json() {
    let (alice_t, _bob_t) = ChannelTransport::pair(alice(), bob());
    let a = peer(alice_t, FakeFactory::new(), CallConfig::default());

    let err = a.service.establish_connection("[1, 2").await.unwrap_err();
    assert!(matches!(err, ServiceError::Payload(_)));
}

#[tokio::test]
async fn test_end_call_notifies_remote_and_resets() {
    let (alice_t, bob_t) = ChannelTransport::pair(alice(), bob());
    let a = peer(alice_t, FakeFactory::with_script(vec![None]), CallConfig::default());
    let mut events = a.service.subscribe_events();
    let call_id = a.service.start_outgoing_call(bob(), None).await.unwrap();

    a.service.end_call().await;

    next_negotiation(&bob_t).await;
    match bob_t.receive().await.unwrap().1 {
        SignalingEnvelope::Bye { call_id: ended, .. } => assert_eq!(ended, Some(call_id)),
        other => panic!("expected bye, got {other:?}"),
    }
    assert_eq!(a.store.current(), CallUiState::default());
    assert_eq!(a.factory.count(), 2);
    assert!(a.factory.connection(0).is_closed());
    assert!(a.service.active_call().is_none());

    let ended = wait_for(&mut events, |e| matches!(e, ServiceEvent::CallEnded { .. })).await;
    match ended {
        ServiceEvent::CallEnded { call_id: ended, reason } => {
            assert_eq!(ended, Some(call_id));
            assert_eq!(reason, EndReason::Local);
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_end_call_without_remote_notification() {
    let (alice_t, bob_t) = ChannelTransport::pair(alice(), bob());
    let config = CallConfig {
        notify_remote_on_end: false,
        ..CallConfig::default()
    };
    let a = peer(alice_t, FakeFactory::with_script(vec![None]), config);
    a.service.start_outgoing_call(bob(), None).await.unwrap();

    a.service.end_call().await;

    next_negotiation(&bob_t).await;
    let next = tokio::time::timeout(Duration::from_millis(50), bob_t.receive()).await;
    assert!(next.is_err());
}

#[tokio::test]
async fn test_bye_only_accepted_from_current_peer() {
    let (alice_t, _bob_t) = ChannelTransport::pair(alice(), bob());
    let a = peer(alice_t, FakeFactory::with_script(vec![None]), CallConfig::default());
    let mut events = a.service.subscribe_events();
    a.service.start_outgoing_call(bob(), None).await.unwrap();

    a.service
        .process_envelope(PeerId::new("carol"), SignalingEnvelope::Bye { call_id: None, reason: None })
        .await
        .unwrap();
    assert!(a.service.active_call().is_some());

    a.service
        .process_envelope(bob(), SignalingEnvelope::Bye { call_id: None, reason: Some("hangup".into()) })
        .await
        .unwrap();
    assert!(a.service.active_call().is_none());
    assert!(!a.store.current().active);

    let ended = wait_for(&mut events, |e| matches!(e, ServiceEvent::CallEnded { .. })).await;
    assert!(matches!(ended, ServiceEvent::CallEnded { reason: EndReason::RemoteHangup, .. }));
}

#[tokio::test]
async fn test_offer_envelope_announces_incoming_call() {
    let (bob_t, _alice_t) = ChannelTransport::pair(bob(), alice());
    let b = peer(bob_t, FakeFactory::new(), CallConfig::default());
    let mut events = b.service.subscribe_events();
    let call_id = CallId::new();

    b.service
        .process_envelope(
            alice(),
            SignalingEnvelope::Offer(Negotiation {
                call_id,
                payload: offer_json(vec![host()]),
                gathering_ms: 40,
                collected_all: true,
                diagnostics: None,
            }),
        )
        .await
        .unwrap();

    match events.try_recv().unwrap() {
        ServiceEvent::IncomingCall { call_id: id, peer, payload } => {
            assert_eq!(id, call_id);
            assert_eq!(peer, alice());
            assert_eq!(payload, offer_json(vec![host()]));
        }
        other => panic!("unexpected event {other:?}"),
    }
    // nothing is negotiated until the call is handled
    assert_eq!(b.factory.count(), 0);
}

#[tokio::test]
async fn test_answer_from_unknown_peer_is_ignored() {
    let (alice_t, _bob_t) = ChannelTransport::pair(alice(), bob());
    let a = peer(alice_t, FakeFactory::with_script(vec![None]), CallConfig::default());
    a.service.start_outgoing_call(bob(), None).await.unwrap();

    let answer = |payload| {
        SignalingEnvelope::Answer(Negotiation {
            call_id: CallId::new(),
            payload,
            gathering_ms: 10,
            collected_all: true,
            diagnostics: None,
        })
    };

    a.service
        .process_envelope(PeerId::new("carol"), answer(answer_json(vec![host()])))
        .await
        .unwrap();
    assert!(a.factory.latest().remote_descriptions().is_empty());

    a.service
        .process_envelope(bob(), answer(answer_json(vec![host()])))
        .await
        .unwrap();
    assert_eq!(a.factory.latest().remote_descriptions().len(), 1);
}

#[tokio::test]
async fn test_connection_state_monitor() {
    let (alice_t, _bob_t) = ChannelTransport::pair(alice(), bob());
    let a = peer(alice_t, FakeFactory::with_script(vec![None]), CallConfig::default());
    a.service.start();
    let mut events = a.service.subscribe_events();
    a.service.start_outgoing_call(bob(), None).await.unwrap();
    let conn = a.factory.latest();

    conn.emit(PeerEvent::ConnectionState(ConnectionState::Connected)).await;
    wait_for(&mut events, |e| matches!(e, ServiceEvent::CallEstablished { .. })).await;
    assert_eq!(a.diagnostics.established.lock().len(), 1);
    assert_eq!(a.diagnostics.established.lock()[0].peer, Some(bob()));

    conn.emit(PeerEvent::ConnectionState(ConnectionState::Failed)).await;
    wait_for(&mut events, |e| matches!(e, ServiceEvent::ConnectionFailed { .. })).await;
    assert_eq!(a.diagnostics.failed.lock().len(), 1);

    conn.emit(PeerEvent::ConnectionState(ConnectionState::Disconnected)).await;
    let ended = wait_for(&mut events, |e| matches!(e, ServiceEvent::CallEnded { .. })).await;
    assert!(matches!(ended, ServiceEvent::CallEnded { reason: EndReason::Disconnected, .. }));
    assert!(!a.store.current().active);
    assert!(conn.is_closed());
}

#[tokio::test]
async fn test_shutdown_stops_monitor_and_ends_call() {
    let (alice_t, _bob_t) = ChannelTransport::pair(alice(), bob());
    let a = peer(alice_t, FakeFactory::with_script(vec![None]), CallConfig::default());
    a.service.start();
    a.service.start_outgoing_call(bob(), None).await.unwrap();

    a.service.shutdown().await;
    assert!(a.service.active_call().is_none());

    a.factory
        .latest()
        .emit(PeerEvent::ConnectionState(ConnectionState::Connected))
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(a.diagnostics.established.lock().is_empty());
}

#[tokio::test]
async fn test_invalid_ice_configuration_is_reported() {
    let (alice_t, _bob_t) = ChannelTransport::pair(alice(), bob());
    let settings: Arc<dyn SettingsApi> = Arc::new(StaticSettings(CallSettings {
        ice_server_configuration: "stun:not-json".to_string(),
    }));
    let a = peer_with(alice_t, FakeFactory::new(), CallConfig::default(), settings, FakeMediaDevices::new(0));

    let err = a.service.start_outgoing_call(bob(), None).await.unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Manager(ManagerError::Peer(PeerError::InvalidConfiguration(_)))
    ));
    assert_eq!(a.diagnostics.error_types(), vec![WebRtcErrorType::IceServer]);
}

#[tokio::test]
async fn test_settings_failure_is_reported() {
    let (alice_t, _bob_t) = ChannelTransport::pair(alice(), bob());
    let a = peer_with(
        alice_t,
        FakeFactory::new(),
        CallConfig::default(),
        Arc::new(FailingSettings),
        FakeMediaDevices::new(0),
    );

    let err = a.service.start_outgoing_call(bob(), None).await.unwrap_err();

    assert!(matches!(err, ServiceError::Settings(_)));
    assert_eq!(a.diagnostics.error_types(), vec![WebRtcErrorType::IceServer]);
    assert_eq!(a.service.active_call(), None);
    assert!(!a.store.current().active);
    assert_eq!(a.store.current().peer, None);
}

#[tokio::test]
async fn test_failed_offer_is_rolled_back() {
    let (alice_t, _bob_t) = ChannelTransport::pair(alice(), bob());
    let factory = FakeFactory::failing_offers();
    let a = peer(alice_t, Arc::clone(&factory), CallConfig::default());

    a.service.start_outgoing_call(bob(), None).await.unwrap_err();

    assert_eq!(a.service.active_call(), None);
    assert_eq!(a.store.current(), CallUiState::default());
    assert!(!a.service.manager().is_gathering());
    assert!(factory.connection(0).is_closed());
}

#[tokio::test]
async fn test_failed_incoming_call_is_rolled_back() {
    let (bob_t, _alice_t) = ChannelTransport::pair(bob(), alice());
    let b = peer_with(
        bob_t,
        FakeFactory::with_script(vec![None]),
        CallConfig::default(),
        stun_settings(),
        FakeMediaDevices::new(usize::MAX),
    );
    let mut events = b.service.subscribe_events();

    let err = b
        .service
        .handle_incoming_call(
            alice(),
            CallId::new(),
            &offer_json(vec![host()]),
            Some(MediaSinks {
                local: RecordingSink::new(),
                remote: RecordingSink::new(),
            }),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Manager(ManagerError::Media(_))));
    assert_eq!(b.service.active_call(), None);
    assert!(!b.store.current().active);
    assert!(!b.service.manager().is_media_captured());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_offer_failure_is_reported_as_connection_error() {
    let (alice_t, _bob_t) = ChannelTransport::pair(alice(), bob());
    let a = peer(alice_t, FakeFactory::failing_offers(), CallConfig::default());

    let err = a.service.start_outgoing_call(bob(), None).await.unwrap_err();

    assert!(matches!(err, ServiceError::Manager(ManagerError::Peer(PeerError::Negotiation(_)))));
    assert_eq!(a.diagnostics.error_types(), vec![WebRtcErrorType::Connection]);
}

#[tokio::test]
async fn test_media_is_captured_before_gathering() {
    let (alice_t, _bob_t) = ChannelTransport::pair(alice(), bob());
    let factory = FakeFactory::with_script(vec![None]);
    let a = peer_with(
        alice_t,
        Arc::clone(&factory),
        CallConfig::default(),
        stun_settings(),
        FakeMediaDevices::new(2),
    );
    let local = RecordingSink::new();

    a.service
        .start_outgoing_call(
            bob(),
            Some(MediaSinks {
                local: local.clone(),
                remote: RecordingSink::new(),
            }),
        )
        .await
        .unwrap();

    assert!(a.service.manager().is_media_captured());
    assert_eq!(factory.latest().streams().len(), 1);
    assert!(local.current().is_some());
    assert_eq!(a.service.manager().error_logger().count(WebRtcErrorType::Media), 2);
    assert!(a.diagnostics.errors.lock().is_empty());
}

#[tokio::test]
async fn test_toggles_update_store() {
    let (alice_t, _bob_t) = ChannelTransport::pair(alice(), bob());
    let a = peer(alice_t, FakeFactory::new(), CallConfig::default());

    a.service.set_video_enabled(false);
    a.service.set_audio_enabled(false);

    let state = a.store.current();
    assert!(!state.video_enabled);
    assert!(!state.audio_enabled);
}

#[tokio::test]
async fn test_two_services_complete_a_call() {
    let (alice_t, bob_t) = ChannelTransport::pair(alice(), bob());
    let a = peer(alice_t, FakeFactory::with_script(vec![Some(host()), None]), CallConfig::default());
    let b = peer(bob_t, FakeFactory::with_script(vec![Some(srflx()), None]), CallConfig::default());
    let mut b_events = b.service.subscribe_events();

    let call_id = a.service.start_outgoing_call(bob(), None).await.unwrap();

    b.service.receive_and_process().await.unwrap();
    let (id, from, payload) = match b_events.try_recv().unwrap() {
        ServiceEvent::IncomingCall { call_id, peer, payload } => (call_id, peer, payload),
        other => panic!("unexpected event {other:?}"),
    };
    assert_eq!(id, call_id);
    b.service.handle_incoming_call(from, id, &payload, None).await.unwrap();

    a.service.receive_and_process().await.unwrap();

    let a_conn = a.factory.latest();
    let b_conn = b.factory.latest();
    assert_eq!(b_conn.added_candidates(), vec![host()]);
    assert_eq!(a_conn.added_candidates(), vec![srflx()]);
    assert_eq!(a_conn.remote_descriptions()[0].sdp_type, SdpType::Answer);
    assert_eq!(b_conn.remote_descriptions()[0].sdp_type, SdpType::Offer);
}
