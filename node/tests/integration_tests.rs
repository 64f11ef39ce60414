//! Integration tests driving the node through its public surface:
//! requester opens → validators vote → notifications → queries → persistence.
//!
//! Time comes from a `NullClock` and notifications are captured with an
//! `EventRecorder`, so every scenario is deterministic.

use std::sync::Arc;

use snapshots_consensus::{RoundEvent, RoundState};
use snapshots_governance::GovernanceEvent;
use snapshots_node::{ErrorKind, NodeConfig, NodeEvent, NodeState, SnapshotsNode};
use snapshots_nullables::{EventRecorder, NullClock};
use snapshots_types::{Fingerprint, Identity, RoundId, Timestamp};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const START: u64 = 1_700_000_000;

fn id(name: &str) -> Identity {
    Identity::new(name)
}

fn round(name: &str) -> RoundId {
    RoundId::new(name)
}

fn fp(byte: u8) -> Fingerprint {
    Fingerprint::new([byte; 32])
}

fn owner() -> Identity {
    id("owner")
}

fn requester() -> Identity {
    id("requester")
}

fn config(validators: &[&str]) -> NodeConfig {
    NodeConfig {
        owner: owner(),
        validators: validators.iter().map(|v| id(v)).collect(),
        requesters: vec![requester()],
        ..NodeConfig::default()
    }
}

struct Harness {
    node: SnapshotsNode,
    clock: Arc<NullClock>,
    events: EventRecorder<NodeEvent>,
}

fn harness(validators: &[&str]) -> Harness {
    let clock = Arc::new(NullClock::new(START));
    let state = NodeState::genesis(&config(validators)).expect("genesis");
    let mut node = SnapshotsNode::new(state, clock.clone());
    let events = EventRecorder::new();
    node.subscribe(events.listener());
    Harness {
        node,
        clock,
        events,
    }
}

fn round_events(recorder: &EventRecorder<NodeEvent>) -> Vec<RoundEvent> {
    recorder
        .events()
        .into_iter()
        .filter_map(|e| match e {
            NodeEvent::Round(r) => Some(r),
            _ => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Round lifecycle
// ---------------------------------------------------------------------------

#[test]
fn two_thirds_majority_then_finalized_valid() {
    let h = harness(&["v1", "v2", "v3"]);
    let r = round("r1");
    let a = fp(0xaa);

    let opened = h.node.open_round(&requester(), r.clone(), "db", "main").unwrap();
    assert!(matches!(
        opened,
        RoundEvent::RoundOpened {
            potential_votes: 3,
            required_votes: 2,
            ..
        }
    ));

    assert!(h.node.submit_vote(&id("v1"), &r, a).unwrap().is_empty());
    let events = h.node.submit_vote(&id("v2"), &r, a).unwrap();
    assert_eq!(
        events,
        vec![RoundEvent::MajorityReached {
            id: r.clone(),
            value: a
        }]
    );
    assert_eq!(h.node.round_state(&r), Some(RoundState::Completed));

    // Votes keep being accepted after the majority.
    let events = h.node.submit_vote(&id("v3"), &r, fp(0xbb)).unwrap();
    assert_eq!(
        events,
        vec![RoundEvent::RoundFinalized {
            id: r.clone(),
            is_valid: true
        }]
    );

    assert!(h.node.verify(&r));
    assert_eq!(h.node.consensus_of(&r), a);
    assert_eq!(h.node.winning_count(&r), 2);
    assert_eq!(h.node.round_state(&r), Some(RoundState::Finalized));

    let view = h.node.round(&r).unwrap();
    assert_eq!(view.total_votes, 3);
    assert_eq!(view.tally.len(), 2);

    assert_eq!(round_events(&h.events).len(), 3);
    assert_eq!(h.node.metrics().votes_accepted.get(), 3);
    assert_eq!(h.node.metrics().majorities_reached.get(), 1);
    assert_eq!(h.node.metrics().rounds_finalized.get(), 1);
}

#[test]
fn three_distinct_values_finalize_invalid() {
    let h = harness(&["v1", "v2", "v3"]);
    let r = round("r1");
    h.node.open_round(&requester(), r.clone(), "db", "").unwrap();

    h.node.submit_vote(&id("v1"), &r, fp(1)).unwrap();
    h.node.submit_vote(&id("v2"), &r, fp(2)).unwrap();
    let events = h.node.submit_vote(&id("v3"), &r, fp(3)).unwrap();

    assert_eq!(
        events,
        vec![RoundEvent::RoundFinalized {
            id: r.clone(),
            is_valid: false
        }]
    );
    assert!(!h.node.verify(&r));
    assert_eq!(h.node.consensus_of(&r), Fingerprint::ZERO);
    assert_eq!(h.node.winning_count(&r), 0);
}

#[test]
fn single_validator_majority_and_finalization_in_one_vote() {
    let h = harness(&["v1"]);
    let r = round("solo");
    h.node.open_round(&requester(), r.clone(), "db", "").unwrap();

    let events = h.node.submit_vote(&id("v1"), &r, fp(5)).unwrap();
    assert_eq!(
        events,
        vec![
            RoundEvent::MajorityReached {
                id: r.clone(),
                value: fp(5)
            },
            RoundEvent::RoundFinalized {
                id: r.clone(),
                is_valid: true
            },
        ]
    );
}

#[test]
fn vote_after_window_expires_is_rejected() {
    let h = harness(&["v1", "v2", "v3"]);
    let r = round("r1");
    h.node.open_round(&requester(), r.clone(), "db", "").unwrap();
    h.node.submit_vote(&id("v1"), &r, fp(1)).unwrap();

    h.clock.advance(121);
    let err = h.node.submit_vote(&id("v2"), &r, fp(1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WindowExpired);

    let view = h.node.round(&r).unwrap();
    assert_eq!(view.total_votes, 1);
    assert_eq!(view.state, RoundState::Expired);
    assert!(!h.node.verify(&r));
}

#[test]
fn window_boundary_is_exclusive() {
    let h = harness(&["v1", "v2"]);
    let r = round("r1");
    h.node.open_round(&requester(), r.clone(), "db", "").unwrap();

    h.clock.advance(119);
    assert!(h.node.submit_vote(&id("v1"), &r, fp(1)).is_ok());
    h.clock.advance(1);
    assert_eq!(
        h.node.submit_vote(&id("v2"), &r, fp(1)).unwrap_err().kind(),
        ErrorKind::WindowExpired
    );
}

#[test]
fn duplicate_vote_rejected_whatever_the_value() {
    let h = harness(&["v1", "v2", "v3"]);
    let r = round("r1");
    h.node.open_round(&requester(), r.clone(), "db", "").unwrap();
    h.node.submit_vote(&id("v1"), &r, fp(1)).unwrap();

    for value in [fp(1), fp(2)] {
        let err = h.node.submit_vote(&id("v1"), &r, value).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateVote);
    }
    assert_eq!(h.node.round(&r).unwrap().total_votes, 1);
}

#[test]
fn invalid_round_inputs_rejected() {
    let h = harness(&["v1"]);
    h.node.open_round(&requester(), round("r1"), "db", "").unwrap();

    let dup = h.node.open_round(&requester(), round("r1"), "other", "").unwrap_err();
    assert_eq!(dup.kind(), ErrorKind::DuplicateRound);

    let empty_topic = h.node.open_round(&requester(), round("r2"), "", "").unwrap_err();
    assert_eq!(empty_topic.kind(), ErrorKind::InvalidInput);

    let empty_id = h.node.open_round(&requester(), round(""), "db", "").unwrap_err();
    assert_eq!(empty_id.kind(), ErrorKind::InvalidInput);

    let zero = h.node.submit_vote(&id("v1"), &round("r1"), Fingerprint::ZERO).unwrap_err();
    assert_eq!(zero.kind(), ErrorKind::InvalidInput);

    let missing = h.node.submit_vote(&id("v1"), &round("nope"), fp(1)).unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);

    assert_eq!(h.node.history_of("db"), vec![round("r1")]);
}

#[test]
fn open_without_validators_fails() {
    let h = harness(&[]);
    let err = h
        .node
        .open_round(&requester(), round("r1"), "db", "")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoValidators);
    assert!(h.node.history_of("db").is_empty());
}

#[test]
fn two_rounds_on_one_topic_keep_separate_tallies() {
    let h = harness(&["v1", "v2", "v3"]);
    h.node.open_round(&requester(), round("a"), "db", "").unwrap();
    h.node.open_round(&requester(), round("b"), "db", "").unwrap();
    h.node.open_round(&requester(), round("c"), "files", "").unwrap();

    h.node.submit_vote(&id("v1"), &round("a"), fp(1)).unwrap();
    h.node.submit_vote(&id("v2"), &round("a"), fp(1)).unwrap();
    h.node.submit_vote(&id("v1"), &round("b"), fp(2)).unwrap();

    assert_eq!(h.node.consensus_of(&round("a")), fp(1));
    assert_eq!(h.node.consensus_of(&round("b")), Fingerprint::ZERO);
    assert_eq!(h.node.round(&round("b")).unwrap().total_votes, 1);
    assert_eq!(h.node.history_of("db"), vec![round("a"), round("b")]);
    assert_eq!(h.node.history_of("files"), vec![round("c")]);
    assert!(h.node.history_of("unknown").is_empty());
}

#[test]
fn unknown_round_queries_return_defaults() {
    let h = harness(&["v1"]);
    let r = round("ghost");
    assert!(!h.node.verify(&r));
    assert_eq!(h.node.consensus_of(&r), Fingerprint::ZERO);
    assert_eq!(h.node.winning_count(&r), 0);
    assert!(h.node.round(&r).is_none());
}

// ---------------------------------------------------------------------------
// Access control and pause
// ---------------------------------------------------------------------------

#[test]
fn roles_are_enforced() {
    let h = harness(&["v1"]);
    let r = round("r1");

    let err = h.node.open_round(&id("v1"), r.clone(), "db", "").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    h.node.open_round(&requester(), r.clone(), "db", "").unwrap();
    let err = h.node.submit_vote(&requester(), &r, fp(1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    for result in [
        h.node.add_validator(&id("v1"), id("v9")),
        h.node.add_requester(&requester(), id("r9")),
        h.node.set_majority(&id("v1"), 1, 2),
        h.node.set_default_window(&requester(), 60),
        h.node.set_paused(&id("v1"), true),
    ] {
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Unauthorized);
    }
}

#[test]
fn pause_blocks_state_changes_until_unpaused() {
    let h = harness(&["v1", "v2", "v3"]);
    let r = round("r1");
    h.node.open_round(&requester(), r.clone(), "db", "").unwrap();
    h.node.submit_vote(&id("v1"), &r, fp(1)).unwrap();
    let before = h.node.round(&r).unwrap();

    assert_eq!(
        h.node.set_paused(&owner(), true).unwrap(),
        Some(GovernanceEvent::PauseUpdated { paused: true })
    );
    assert!(h.node.is_paused());

    let paused = [
        h.node.open_round(&requester(), round("r2"), "db", "").map(|_| ()),
        h.node.submit_vote(&id("v2"), &r, fp(1)).map(|_| ()),
        h.node.add_validator(&owner(), id("v4")).map(|_| ()),
        h.node.set_majority(&owner(), 1, 2).map(|_| ()),
        h.node.transfer_ownership(&owner(), id("heir")).map(|_| ()),
    ];
    for result in paused {
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Paused);
    }
    assert_eq!(h.node.round(&r).unwrap(), before);

    h.node.set_paused(&owner(), false).unwrap();
    assert!(h.node.submit_vote(&id("v2"), &r, fp(1)).is_ok());
    assert!(h.node.verify(&r));
}

// ---------------------------------------------------------------------------
// Management changes never touch open rounds
// ---------------------------------------------------------------------------

#[test]
fn policy_change_applies_only_to_later_rounds() {
    let h = harness(&["v1", "v2", "v3", "v4"]);
    h.node.open_round(&requester(), round("before"), "db", "").unwrap();

    let event = h.node.set_majority(&owner(), 1, 2).unwrap();
    assert_eq!(
        event,
        Some(GovernanceEvent::MajorityUpdated {
            numerator: 1,
            denominator: 2
        })
    );
    h.node.set_default_window(&owner(), 30).unwrap();
    h.node.open_round(&requester(), round("after"), "db", "").unwrap();

    let before = h.node.round(&round("before")).unwrap();
    let after = h.node.round(&round("after")).unwrap();
    assert_eq!(before.required_votes, 3);
    assert_eq!(before.window_secs, 120);
    assert_eq!(after.required_votes, 2);
    assert_eq!(after.window_secs, 30);
}

#[test]
fn invalid_policy_rejected() {
    let h = harness(&["v1"]);
    for (n, d) in [(1, 0), (0, 3), (4, 3)] {
        let err = h.node.set_majority(&owner(), n, d).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPolicy);
    }
    let err = h.node.set_default_window(&owner(), 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPolicy);
    assert_eq!(h.node.policy().numerator(), 2);
}

#[test]
fn removing_a_validator_keeps_open_round_terms() {
    let h = harness(&["v1", "v2", "v3"]);
    let r = round("r1");
    h.node.open_round(&requester(), r.clone(), "db", "").unwrap();

    h.node.remove_validator(&owner(), &id("v3")).unwrap();
    assert_eq!(h.node.validator_count(), 2);

    let view = h.node.round(&r).unwrap();
    assert_eq!(view.potential_votes, 3);
    assert_eq!(view.required_votes, 2);

    assert_eq!(
        h.node.submit_vote(&id("v3"), &r, fp(1)).unwrap_err().kind(),
        ErrorKind::Unauthorized
    );
    h.node.submit_vote(&id("v1"), &r, fp(1)).unwrap();
    h.node.submit_vote(&id("v2"), &r, fp(1)).unwrap();
    assert!(h.node.verify(&r));
    // Only 2 of the 3 potential votes can still arrive.
    assert_eq!(h.node.round_state(&r), Some(RoundState::Completed));
}

#[test]
fn late_validator_cannot_push_round_past_potential() {
    let h = harness(&["v1"]);
    let r = round("r1");
    h.node.open_round(&requester(), r.clone(), "db", "").unwrap();
    h.node.submit_vote(&id("v1"), &r, fp(1)).unwrap();

    h.node.add_validator(&owner(), id("v2")).unwrap();
    let err = h.node.submit_vote(&id("v2"), &r, fp(1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RoundFinalized);
    assert_eq!(h.node.round(&r).unwrap().total_votes, 1);
}

#[test]
fn membership_notifications_only_on_change() {
    let h = harness(&["v1"]);
    h.node.add_validator(&owner(), id("v2")).unwrap();
    h.node.add_validator(&owner(), id("v2")).unwrap();
    h.node.remove_validator(&owner(), &id("v2")).unwrap();
    h.node.remove_validator(&owner(), &id("v2")).unwrap();
    h.node.add_requester(&owner(), id("r2")).unwrap();

    let governance: Vec<_> = h
        .events
        .events()
        .into_iter()
        .filter_map(|e| match e {
            NodeEvent::Governance(g) => Some(g),
            _ => None,
        })
        .collect();
    assert_eq!(
        governance,
        vec![
            GovernanceEvent::ValidatorAdded { validator: id("v2") },
            GovernanceEvent::ValidatorRemoved { validator: id("v2") },
            GovernanceEvent::RequesterAdded { requester: id("r2") },
        ]
    );
    assert_eq!(h.node.requester_count(), 2);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn state_survives_save_and_load() {
    let h = harness(&["v1", "v2", "v3"]);
    let r = round("r1");
    h.node.open_round(&requester(), r.clone(), "db", "main").unwrap();
    h.node.submit_vote(&id("v1"), &r, fp(4)).unwrap();
    h.node.submit_vote(&id("v2"), &r, fp(4)).unwrap();
    h.node.store_hash("doc", fp(9)).unwrap();
    h.node.set_paused(&owner(), true).unwrap();

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("state.bin");
    h.node.snapshot().save(&path).unwrap();

    let loaded = NodeState::load(&path).unwrap();
    let restored = SnapshotsNode::new(loaded, h.clock.clone());
    assert!(restored.verify(&r));
    assert_eq!(restored.consensus_of(&r), fp(4));
    assert_eq!(restored.history_of("db"), vec![r.clone()]);
    assert!(restored.is_paused());
    assert_eq!(restored.lookup_hash("doc").hash, fp(9));
    assert_eq!(restored.lookup_hash("doc").stored_at, Timestamp::new(START));

    restored.set_paused(&owner(), false).unwrap();
    let events = restored.submit_vote(&id("v3"), &r, fp(4)).unwrap();
    assert_eq!(
        events,
        vec![RoundEvent::RoundFinalized {
            id: r,
            is_valid: true
        }]
    );
}

#[test]
fn counters_are_rebuilt_from_saved_state() {
    let h = harness(&["v1", "v2", "v3"]);
    let r = round("r1");
    h.node.open_round(&requester(), r.clone(), "db", "").unwrap();
    h.node.open_round(&requester(), round("r2"), "db", "").unwrap();
    h.node.submit_vote(&id("v1"), &r, fp(4)).unwrap();
    h.node.submit_vote(&id("v2"), &r, fp(4)).unwrap();
    h.node.submit_vote(&id("v3"), &r, fp(5)).unwrap();
    h.node.submit_vote(&id("v1"), &round("r2"), fp(4)).unwrap();
    h.node.store_hash("doc", fp(9)).unwrap();

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("state.bin");
    h.node.snapshot().save(&path).unwrap();

    let restored = SnapshotsNode::new(NodeState::load(&path).unwrap(), h.clock.clone());
    let metrics = restored.metrics();
    assert_eq!(metrics.rounds_opened.get(), 2);
    assert_eq!(metrics.votes_accepted.get(), 4);
    assert_eq!(metrics.majorities_reached.get(), 1);
    assert_eq!(metrics.rounds_finalized.get(), 1);
    assert_eq!(metrics.hashes_stored.get(), 1);
    assert_eq!(metrics.validator_count.get(), 3);

    let text = metrics.encode();
    assert!(text.contains("snapshots_rounds_opened_total 2"));
    assert!(text.contains("snapshots_votes_accepted_total 4"));

    // counting carries on from the restored totals
    restored.submit_vote(&id("v2"), &round("r2"), fp(4)).unwrap();
    assert_eq!(restored.metrics().votes_accepted.get(), 5);
    assert_eq!(restored.metrics().majorities_reached.get(), 2);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_votes_are_serialized() {
    let names: Vec<String> = (0..30).map(|i| format!("v{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let h = harness(&refs);
    // 10 of 30: either value can win, whichever gets there first.
    h.node.set_majority(&owner(), 1, 3).unwrap();
    let r = round("busy");
    h.node.open_round(&requester(), r.clone(), "db", "").unwrap();

    let events = h.events;
    let node = Arc::new(h.node);
    let mut handles = Vec::new();
    for (i, name) in names.iter().enumerate() {
        let node = Arc::clone(&node);
        let voter = id(name);
        let r = r.clone();
        let value = if i % 2 == 0 { fp(2) } else { fp(1) };
        handles.push(tokio::task::spawn_blocking(move || {
            node.submit_vote(&voter, &r, value)
        }));
    }
    for handle in handles {
        handle.await.expect("task panicked").expect("vote accepted");
    }

    let view = node.round(&r).unwrap();
    assert_eq!(view.total_votes, 30);
    assert_eq!(view.required_votes, 10);
    assert_eq!(view.state, RoundState::Finalized);
    let winner = node.consensus_of(&r);
    assert!(winner == fp(1) || winner == fp(2));
    assert_eq!(node.winning_count(&r), 15);

    let round_events = round_events(&events);
    let majorities: Vec<(usize, Fingerprint)> = round_events
        .iter()
        .enumerate()
        .filter_map(|(i, e)| match e {
            RoundEvent::MajorityReached { value, .. } => Some((i, *value)),
            _ => None,
        })
        .collect();
    assert_eq!(majorities.len(), 1);
    let (majority_at, announced) = majorities[0];
    assert_eq!(announced, winner);

    let finalized: Vec<usize> = round_events
        .iter()
        .enumerate()
        .filter_map(|(i, e)| matches!(e, RoundEvent::RoundFinalized { .. }).then_some(i))
        .collect();
    assert_eq!(finalized, vec![round_events.len() - 1]);
    assert!(majority_at < finalized[0]);
    assert!(matches!(
        round_events.last(),
        Some(RoundEvent::RoundFinalized { is_valid: true, .. })
    ));
}
