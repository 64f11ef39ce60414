//! Prometheus metrics for the snapshot quorum node.
//!
//! [`NodeMetrics`] owns a dedicated [`Registry`]; [`NodeMetrics::encode`]
//! renders it in the Prometheus text exposition format.

use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

/// Central collection of all node-level Prometheus metrics.
pub struct NodeMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Rounds successfully opened.
    pub rounds_opened: IntCounter,
    /// Validator votes recorded.
    pub votes_accepted: IntCounter,
    /// Rounds in which a fingerprint reached the required vote count.
    pub majorities_reached: IntCounter,
    /// Rounds in which every potential voter voted.
    pub rounds_finalized: IntCounter,
    /// Hashes written to the companion store.
    pub hashes_stored: IntCounter,
    /// Rejected operations, labelled by operation and error kind.
    pub operations_rejected: IntCounterVec,

    // ── Gauges ──────────────────────────────────────────────────────────
    pub validator_count: IntGauge,
    pub requester_count: IntGauge,
    /// 1 while the system is paused, 0 otherwise.
    pub paused: IntGauge,
}

impl NodeMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        let rounds_opened = register_int_counter_with_registry!(
            Opts::new("snapshots_rounds_opened_total", "Total voting rounds opened"),
            registry
        )
        .expect("failed to register rounds_opened counter");

        let votes_accepted = register_int_counter_with_registry!(
            Opts::new(
                "snapshots_votes_accepted_total",
                "Total validator votes recorded"
            ),
            registry
        )
        .expect("failed to register votes_accepted counter");

        let majorities_reached = register_int_counter_with_registry!(
            Opts::new(
                "snapshots_majorities_reached_total",
                "Total rounds that reached a majority"
            ),
            registry
        )
        .expect("failed to register majorities_reached counter");

        let rounds_finalized = register_int_counter_with_registry!(
            Opts::new(
                "snapshots_rounds_finalized_total",
                "Total rounds in which every potential vote was cast"
            ),
            registry
        )
        .expect("failed to register rounds_finalized counter");

        let hashes_stored = register_int_counter_with_registry!(
            Opts::new(
                "snapshots_hashes_stored_total",
                "Total hashes written to the companion store"
            ),
            registry
        )
        .expect("failed to register hashes_stored counter");

        let operations_rejected = register_int_counter_vec_with_registry!(
            Opts::new(
                "snapshots_operations_rejected_total",
                "Total operations rejected, by operation and error kind"
            ),
            &["operation", "kind"],
            registry
        )
        .expect("failed to register operations_rejected counter");

        let validator_count = register_int_gauge_with_registry!(
            Opts::new("snapshots_validator_count", "Current number of validators"),
            registry
        )
        .expect("failed to register validator_count gauge");

        let requester_count = register_int_gauge_with_registry!(
            Opts::new("snapshots_requester_count", "Current number of requesters"),
            registry
        )
        .expect("failed to register requester_count gauge");

        let paused = register_int_gauge_with_registry!(
            Opts::new("snapshots_paused", "1 while the system is paused"),
            registry
        )
        .expect("failed to register paused gauge");

        Self {
            registry,
            rounds_opened,
            votes_accepted,
            majorities_reached,
            rounds_finalized,
            hashes_stored,
            operations_rejected,
            validator_count,
            requester_count,
            paused,
        }
    }

    pub fn record_rejection(&self, operation: &str, kind: &str) {
        self.operations_rejected
            .with_label_values(&[operation, kind])
            .inc();
    }

    /// Render every metric in the Prometheus text format.
    pub fn encode(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!("failed to encode metrics: {e}");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}
