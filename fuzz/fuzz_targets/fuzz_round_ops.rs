#![no_main]

use std::collections::HashMap;
use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use snapshots_node::{NodeConfig, NodeState, SnapshotsNode};
use snapshots_nullables::NullClock;
use snapshots_types::{Fingerprint, Identity, RoundId};

const OWNER: &str = "owner";

#[derive(Arbitrary, Debug)]
enum Op {
    Open { requester: u8, round: u8, topic: u8 },
    Vote { validator: u8, round: u8, value: u8 },
    AddValidator { who: u8 },
    RemoveValidator { who: u8 },
    SetMajority { numerator: u8, denominator: u8 },
    SetWindow { secs: u8 },
    Pause(bool),
    Advance { secs: u8 },
}

fn member(n: u8) -> Identity {
    Identity::new(format!("m{}", n % 8))
}

fn round(n: u8) -> RoundId {
    RoundId::new(format!("r{}", n % 6))
}

// Drive the node with arbitrary operations; it must never panic and every
// round must keep its vote bookkeeping consistent.
fuzz_target!(|ops: Vec<Op>| {
    let config = NodeConfig {
        owner: Identity::new(OWNER),
        validators: (0..4).map(member).collect(),
        requesters: (0..8).map(member).collect(),
        ..NodeConfig::default()
    };
    let Ok(state) = NodeState::genesis(&config) else {
        return;
    };
    let clock = Arc::new(NullClock::new(1_000));
    let node = SnapshotsNode::new(state, clock.clone());
    let owner = Identity::new(OWNER);
    let mut frozen: HashMap<RoundId, Fingerprint> = HashMap::new();

    for op in ops {
        match op {
            Op::Open { requester, round: r, topic } => {
                let _ = node.open_round(&member(requester), round(r), format!("t{}", topic % 3), "");
            }
            Op::Vote { validator, round: r, value } => {
                let _ = node.submit_vote(&member(validator), &round(r), Fingerprint::new([value % 4; 32]));
            }
            Op::AddValidator { who } => {
                let _ = node.add_validator(&owner, member(who));
            }
            Op::RemoveValidator { who } => {
                let _ = node.remove_validator(&owner, &member(who));
            }
            Op::SetMajority { numerator, denominator } => {
                let _ = node.set_majority(&owner, u32::from(numerator), u32::from(denominator));
            }
            Op::SetWindow { secs } => {
                let _ = node.set_default_window(&owner, u64::from(secs));
            }
            Op::Pause(paused) => {
                let _ = node.set_paused(&owner, paused);
            }
            Op::Advance { secs } => clock.advance(u64::from(secs)),
        }

        for n in 0..6 {
            let id = round(n);
            let Some(view) = node.round(&id) else {
                continue;
            };
            assert!(view.total_votes <= view.potential_votes);
            assert!(view.required_votes >= 1 && view.required_votes <= view.potential_votes);
            assert_eq!(view.tally.iter().map(|t| t.votes).sum::<u32>(), view.total_votes);
            if view.is_valid {
                assert!(view.winning_count >= view.required_votes);
                let first = *frozen.entry(id).or_insert(view.consensus_value);
                assert_eq!(first, view.consensus_value);
            }
        }
    }
});
