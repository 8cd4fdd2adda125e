use nearby_client::{AgentConfig, ViewEvent};
use nearby_core::{
    ClientEvent, IceCandidate, Participant, ParticipantId, ServerEvent, SessionDescription,
};
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{FakeBackend, OfflineAgent, QUIET_MS, drain, wait_for, wait_until};

/// Join, then have `other` appear on top of us.
async fn agent_offering_to_neighbour(backend: FakeBackend) -> (OfflineAgent, ParticipantId) {
    let mut agent = OfflineAgent::spawn(AgentConfig::default(), backend).unwrap();
    agent.join();
    let other = ParticipantId::new();
    agent.deliver(ServerEvent::UserJoined(Participant::joined(other)));

    wait_for(&mut agent.view, "SessionStarted", |e| {
        *e == ViewEvent::SessionStarted { remote: other }
    })
    .await
    .unwrap();
    (agent, other)
}

#[tokio::test]
async fn test_neighbour_gets_offer_then_candidates() {
    init_tracing();

    let (mut agent, other) = agent_offering_to_neighbour(FakeBackend::new()).await;

    let offer = wait_for(&mut agent.outbound, "offer", |e| {
        matches!(e, ClientEvent::Offer { .. })
    })
    .await
    .unwrap();
    assert!(matches!(offer, ClientEvent::Offer { target_id, .. } if target_id == other));

    let candidate = agent.outbound.recv().await.unwrap();
    assert!(matches!(
        candidate,
        ClientEvent::IceCandidate { target_id, .. } if target_id == other
    ));

    agent
        .deliver(ServerEvent::Answer {
            sender_id: other,
            answer: SessionDescription::answer("remote answer"),
        });
    wait_for(&mut agent.view, "SessionConnected", |e| {
        *e == ViewEvent::SessionConnected { remote: other }
    })
    .await
    .unwrap();
    wait_for(&mut agent.view, "RemoteMedia", |e| {
        matches!(e, ViewEvent::RemoteMedia { remote, kind } if *remote == other && kind == "video")
    })
    .await
    .unwrap();

    agent.handle.shutdown();
    agent.task.await.unwrap();
}

#[tokio::test]
async fn test_leave_tears_session_down() {
    init_tracing();

    let (mut agent, other) = agent_offering_to_neighbour(FakeBackend::new()).await;
    wait_for(&mut agent.outbound, "offer", |e| {
        matches!(e, ClientEvent::Offer { .. })
    })
    .await
    .unwrap();

    agent.deliver(ServerEvent::UserLeft(other));
    wait_for(&mut agent.view, "MediaCleared", |e| {
        *e == ViewEvent::MediaCleared { remote: other }
    })
    .await
    .unwrap();
    assert_eq!(
        agent.view.recv().await,
        Some(ViewEvent::ParticipantRemoved { id: other })
    );
    assert_eq!(agent.log.live_captures(), 0);
    assert_eq!(agent.log.live_transports(), 0);

    agent.handle.shutdown();
    agent.task.await.unwrap();
}

#[tokio::test]
async fn test_unanswered_offer_waits_for_stop_trigger() {
    init_tracing();

    let (mut agent, other) = agent_offering_to_neighbour(FakeBackend::new()).await;
    wait_for(&mut agent.outbound, "offer", |e| {
        matches!(e, ClientEvent::Offer { .. })
    })
    .await
    .unwrap();

    // Nobody answers: the session just sits there.
    let view = drain(&mut agent.view, QUIET_MS).await;
    assert!(
        !view
            .iter()
            .any(|e| matches!(e, ViewEvent::SessionConnected { .. } | ViewEvent::MediaCleared { .. }))
    );
    assert_eq!(agent.log.live_captures(), 1);

    agent.deliver(ServerEvent::UpdatePosition {
        id: other,
        x: 500.0,
        y: 500.0,
    });
    wait_for(&mut agent.view, "MediaCleared", |e| {
        *e == ViewEvent::MediaCleared { remote: other }
    })
    .await
    .unwrap();
    assert_eq!(agent.log.live_captures(), 0);

    agent.handle.shutdown();
    agent.task.await.unwrap();
}

#[tokio::test]
async fn test_incoming_offer_is_answered() {
    init_tracing();

    let mut agent = OfflineAgent::spawn(AgentConfig::default(), FakeBackend::new()).unwrap();
    agent.join();
    let caller = ParticipantId::new();
    let early = IceCandidate::new("candidate:early");

    agent.deliver(ServerEvent::Offer {
        sender_id: caller,
        offer: SessionDescription::offer("remote offer"),
    });
    agent.deliver(ServerEvent::IceCandidate {
        sender_id: caller,
        candidate: early.clone(),
    });

    let answer = wait_for(&mut agent.outbound, "answer", |e| {
        matches!(e, ClientEvent::Answer { .. })
    })
    .await
    .unwrap();
    assert!(matches!(answer, ClientEvent::Answer { target_id, .. } if target_id == caller));

    wait_for(&mut agent.view, "SessionConnected", |e| {
        *e == ViewEvent::SessionConnected { remote: caller }
    })
    .await
    .unwrap();

    let log = agent.log.clone();
    wait_until("early candidate applied", || {
        log.remote_candidates.lock().unwrap().contains(&early)
    })
    .await
    .unwrap();

    agent.handle.shutdown();
    agent.task.await.unwrap();
}

#[tokio::test]
async fn test_capture_failure_reports_session_failed() {
    init_tracing();

    let (mut agent, other) = agent_offering_to_neighbour(FakeBackend::without_camera()).await;

    let failed = wait_for(&mut agent.view, "SessionFailed", |e| {
        matches!(e, ViewEvent::SessionFailed { .. })
    })
    .await
    .unwrap();
    assert!(matches!(
        failed,
        ViewEvent::SessionFailed { remote, ref reason } if remote == other && reason.contains("camera")
    ));

    let sent = drain(&mut agent.outbound, QUIET_MS).await;
    assert!(!sent.iter().any(|e| matches!(e, ClientEvent::Offer { .. })));

    agent.handle.shutdown();
    agent.task.await.unwrap();
}

#[tokio::test]
async fn test_closed_relay_link_ends_agent_and_releases_media() {
    init_tracing();

    let (mut agent, _other) = agent_offering_to_neighbour(FakeBackend::new()).await;
    wait_for(&mut agent.outbound, "offer", |e| {
        matches!(e, ClientEvent::Offer { .. })
    })
    .await
    .unwrap();
    assert_eq!(agent.log.live_captures(), 1);

    drop(agent.server);
    tokio::time::timeout(Duration::from_secs(5), agent.task)
        .await
        .expect("agent kept running")
        .unwrap();
    assert_eq!(agent.log.live_captures(), 0);
}

#[tokio::test]
async fn test_non_finite_move_is_dropped() {
    init_tracing();

    let (mut agent, other) = agent_offering_to_neighbour(FakeBackend::new()).await;
    wait_for(&mut agent.outbound, "offer", |e| {
        matches!(e, ClientEvent::Offer { .. })
    })
    .await
    .unwrap();
    drain(&mut agent.outbound, QUIET_MS).await;
    drain(&mut agent.view, QUIET_MS).await;

    agent.handle.move_to(f64::NAN, f64::NAN);
    agent.handle.move_to(f64::INFINITY, 200.0);

    let sent = drain(&mut agent.outbound, QUIET_MS).await;
    assert!(!sent.iter().any(|e| matches!(e, ClientEvent::UpdatePosition { .. })));
    let view = drain(&mut agent.view, QUIET_MS).await;
    assert!(
        !view
            .iter()
            .any(|e| matches!(e, ViewEvent::ParticipantMoved { .. } | ViewEvent::MediaCleared { .. }))
    );
    assert_eq!(agent.log.live_captures(), 1);

    // The local entry kept its last finite position, so moving away still stops the call.
    agent.handle.move_to(500.0, 500.0);
    let moved = wait_for(&mut agent.outbound, "updatePosition", |e| {
        matches!(e, ClientEvent::UpdatePosition { .. })
    })
    .await
    .unwrap();
    assert!(matches!(moved, ClientEvent::UpdatePosition { x, y, .. } if x == 500.0 && y == 500.0));
    wait_for(&mut agent.view, "MediaCleared", |e| {
        *e == ViewEvent::MediaCleared { remote: other }
    })
    .await
    .unwrap();
    assert_eq!(agent.log.live_captures(), 0);

    agent.handle.shutdown();
    agent.task.await.unwrap();
}
