#![no_main]

use libfuzzer_sys::fuzz_target;

use snapshots_node::NodeState;

// Arbitrary state-file bytes must decode to an error or to a state whose
// rounds are well formed and that re-encodes to the same value.
fuzz_target!(|data: &[u8]| {
    let Ok(state) = NodeState::from_bytes(data) else {
        return;
    };
    for round in state.ledger.rounds() {
        assert!(round.total_votes() <= round.potential_votes());
        assert!(round.winning_count() <= round.total_votes());
    }
    let bytes = state.to_bytes().expect("decoded state re-encodes");
    let again = NodeState::from_bytes(&bytes).expect("re-encoded state decodes");
    assert_eq!(again, state);
});
