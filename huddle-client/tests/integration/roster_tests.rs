use crate::{create_test_room, roster_entry, wait_for, wait_for_event};
use huddle_client::{NegotiationState, RoomEvent, RoomState};
use huddle_core::ServerEnvelope;

#[tokio::test]
async fn test_roster_tracks_joins_and_leaves() -> anyhow::Result<()> {
    let room = create_test_room();
    room.join_with_roster("AB12CD", "alice", "alice", vec![roster_entry("bob", "bobby")])
        .await;

    for (id, name) in [("carol", "carol"), ("dave", "dave")] {
        room.relay_tx
            .send(ServerEnvelope::UserJoined {
                id: id.into(),
                name: name.to_owned(),
            })
            .await?;
    }
    room.relay_tx
        .send(ServerEnvelope::UserLeft {
            id: "bob".into(),
            name: "bobby".to_owned(),
        })
        .await?;

    let snapshot = wait_for(&room.handle, |s| {
        s.roster.len() == 3 && !s.roster.iter().any(|p| p.id.as_str() == "bob")
    })
    .await;

    let mut ids: Vec<_> = snapshot.roster.iter().map(|p| p.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["alice", "carol", "dave"]);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_user_joined_is_ignored() -> anyhow::Result<()> {
    let room = create_test_room();
    room.join_with_roster("AB12CD", "alice", "alice", vec![]).await;

    for _ in 0..2 {
        room.relay_tx
            .send(ServerEnvelope::UserJoined {
                id: "bob".into(),
                name: "bobby".to_owned(),
            })
            .await?;
    }

    wait_for(&room.handle, |s| s.roster.len() == 2).await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let after = room.handle.snapshot().await?;
    assert_eq!(after.roster.len(), 2, "redelivery adds nothing");
    Ok(())
}

#[tokio::test]
async fn test_second_offer_renegotiates_on_the_same_session() -> anyhow::Result<()> {
    let room = create_test_room();
    room.join_with_roster("AB12CD", "alice", "alice", vec![]).await;
    room.relay_tx
        .send(ServerEnvelope::UserJoined {
            id: "bob".into(),
            name: "bobby".to_owned(),
        })
        .await?;

    for sdp in ["offer-from-bob", "renegotiation-from-bob"] {
        room.relay_tx
            .send(ServerEnvelope::Offer {
                from: "bob".into(),
                sdp: sdp.to_owned(),
            })
            .await?;
    }

    let snapshot = wait_for(&room.handle, |s| {
        s.peer_state(&"bob".into()) == Some(NegotiationState::Stable)
    })
    .await;
    assert_eq!(snapshot.peers.len(), 1, "renegotiation reuses the session");
    let deadline = std::time::Instant::now()
        + std::time::Duration::from_millis(crate::WAIT_TIMEOUT_MS);
    while room.output.answers_to("bob").await.len() < 2 {
        assert!(std::time::Instant::now() < deadline, "second answer never sent");
        tokio::time::sleep(std::time::Duration::from_millis(crate::POLL_INTERVAL_MS)).await;
    }
    Ok(())
}

#[tokio::test]
async fn test_user_left_closes_the_session() -> anyhow::Result<()> {
    let mut room = create_test_room();
    room.join_with_roster("AB12CD", "bob", "bobby", vec![roster_entry("alice", "alice")])
        .await;
    wait_for(&room.handle, |s| !s.peers.is_empty()).await;

    room.relay_tx
        .send(ServerEnvelope::UserLeft {
            id: "alice".into(),
            name: "alice".to_owned(),
        })
        .await?;

    wait_for_event(&mut room.events, |e| {
        matches!(e, RoomEvent::ParticipantLeft(p) if p.id.as_str() == "alice")
    })
    .await;
    let snapshot = wait_for(&room.handle, |s| s.peers.is_empty()).await;
    assert_eq!(snapshot.roster.len(), 1);
    let transport = room.factory.transport_for(&"alice".into()).expect("created");
    assert!(transport.calls().contains(&"close".to_owned()));
    Ok(())
}

#[tokio::test]
async fn test_user_left_for_unknown_id_is_a_noop() -> anyhow::Result<()> {
    let mut room = create_test_room();
    room.join_with_roster("AB12CD", "alice", "alice", vec![roster_entry("bob", "bobby")])
        .await;

    room.relay_tx
        .send(ServerEnvelope::UserLeft {
            id: "ghost".into(),
            name: "ghost".to_owned(),
        })
        .await?;

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let snapshot = room.handle.snapshot().await?;
    assert_eq!(snapshot.state, RoomState::Joined);
    assert_eq!(snapshot.roster.len(), 2);
    // Nobody the presentation layer saw join may be reported as leaving.
    while let Ok(event) = room.events.try_recv() {
        assert!(
            !matches!(event, RoomEvent::ParticipantLeft(_)),
            "departure event for a participant that never joined: {event:?}"
        );
    }
    Ok(())
}
