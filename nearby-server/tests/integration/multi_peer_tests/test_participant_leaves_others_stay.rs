use nearby_core::{ClientEvent, ServerEvent};

use crate::integration::init_tracing;
use crate::utils::{TestClient, TestRelay};

#[tokio::test]
async fn test_participant_leaves_others_stay() {
    init_tracing();

    let relay = TestRelay::spawn().await.expect("Failed to start relay");
    let mut alice = TestClient::connect(relay.addr).await.expect("alice");
    let mut bob = TestClient::connect(relay.addr).await.expect("bob");
    let carol = TestClient::connect(relay.addr).await.expect("carol");
    let alice_id = alice.id;
    let carol_id = carol.id;

    for client in [&mut alice, &mut bob] {
        client
            .wait_for("userJoined(carol)", |e| {
                matches!(e, ServerEvent::UserJoined(p) if p.id == carol_id)
            })
            .await
            .expect("missed carol");
    }

    carol.close().await.unwrap();

    for client in [&mut alice, &mut bob] {
        client
            .wait_for("userLeft(carol)", |e| *e == ServerEvent::UserLeft(carol_id))
            .await
            .expect("missed carol leaving");
    }

    // Remaining participants keep talking.
    alice
        .send(&ClientEvent::UpdatePosition {
            id: Some(alice_id),
            x: 120.0,
            y: 90.0,
        })
        .await
        .unwrap();
    bob.wait_for("alice's move", |e| {
        *e == ServerEvent::UpdatePosition {
            id: alice_id,
            x: 120.0,
            y: 90.0,
        }
    })
    .await
    .expect("bob missed alice's move");

    let remaining = relay.wait_for_count(2).await.unwrap();
    assert!(remaining.iter().all(|p| p.id != carol_id));

    alice.close().await.unwrap();
    bob.close().await.unwrap();
    relay.stop().await;
}
