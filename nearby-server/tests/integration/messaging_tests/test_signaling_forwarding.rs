use nearby_core::{ClientEvent, IceCandidate, ServerEvent, SessionDescription};

use crate::integration::init_tracing;
use crate::utils::{SILENCE_MS, TestClient, TestRelay};

#[tokio::test]
async fn test_signaling_reaches_only_the_target() {
    init_tracing();

    let relay = TestRelay::spawn().await.expect("Failed to start relay");
    let mut alice = TestClient::connect(relay.addr).await.expect("alice");
    let mut bob = TestClient::connect(relay.addr).await.expect("bob");
    let mut carol = TestClient::connect(relay.addr).await.expect("carol");
    let alice_id = alice.id;
    let bob_id = bob.id;
    let carol_id = carol.id;

    for client in [&mut alice, &mut bob, &mut carol] {
        client
            .wait_for("statusUpdate(carol)", |e| {
                matches!(e, ServerEvent::StatusUpdate { id, .. } if *id == carol_id)
            })
            .await
            .expect("missed carol's arrival");
    }

    let offer = SessionDescription::offer("v=0 offer");
    alice
        .send(&ClientEvent::Offer {
            target_id: bob_id,
            offer: offer.clone(),
        })
        .await
        .unwrap();
    assert_eq!(
        bob.next_event().await.unwrap(),
        ServerEvent::Offer {
            sender_id: alice_id,
            offer
        }
    );

    let answer = SessionDescription::answer("v=0 answer");
    bob.send(&ClientEvent::Answer {
        target_id: alice_id,
        answer: answer.clone(),
    })
    .await
    .unwrap();
    assert_eq!(
        alice.next_event().await.unwrap(),
        ServerEvent::Answer {
            sender_id: bob_id,
            answer
        }
    );

    let candidate = IceCandidate::new("candidate:1 1 udp 2122260223 10.0.0.1 5000 typ host");
    bob.send(&ClientEvent::IceCandidate {
        target_id: alice_id,
        candidate: candidate.clone(),
    })
    .await
    .unwrap();
    assert_eq!(
        alice.next_event().await.unwrap(),
        ServerEvent::IceCandidate {
            sender_id: bob_id,
            candidate
        }
    );

    carol
        .expect_silence(SILENCE_MS)
        .await
        .expect("bystander saw signaling");

    alice.close().await.unwrap();
    bob.close().await.unwrap();
    carol.close().await.unwrap();
    relay.stop().await;
}
