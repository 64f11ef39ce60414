//! snapshots: command-line front end for a snapshot quorum node.
//!
//! Each invocation loads the state file, applies one operation through
//! [`SnapshotsNode`], prints notifications as JSON lines and writes the state
//! back only if the operation succeeded.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;
use snapshots_node::{NodeConfig, NodeError, NodeEvent, NodeState, SnapshotsNode};
use snapshots_types::{Fingerprint, Identity, RoundId, SystemClock};
use snapshots_utils::{format_duration, LogFormat};

#[derive(Parser)]
#[command(name = "snapshots", about = "Quorum voting on snapshot fingerprints")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    /// State file to load and save.
    #[arg(long, env = "SNAPSHOTS_STATE_FILE")]
    state: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "SNAPSHOTS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "SNAPSHOTS_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Create the state file from the configuration.
    Init {
        /// Overwrite an existing state file.
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
    /// Open a voting round (requester only).
    OpenRound {
        #[arg(long = "as", value_name = "ID")]
        caller: Identity,
        round: RoundId,
        topic: String,
        #[arg(long, default_value = "")]
        selector: String,
    },
    /// Submit a fingerprint for a round (validator only).
    Vote {
        #[arg(long = "as", value_name = "ID")]
        caller: Identity,
        round: RoundId,
        hash: Fingerprint,
    },
    /// Whether a round reached a majority.
    Verify { round: RoundId },
    /// The consensus fingerprint of a round and its vote count.
    Consensus { round: RoundId },
    /// Everything known about a round.
    Round { round: RoundId },
    /// Round ids opened on a topic, oldest first.
    History { topic: String },
    /// Manage validators (owner only).
    Validator {
        #[command(subcommand)]
        action: MemberAction,
    },
    /// Manage requesters (owner only).
    Requester {
        #[command(subcommand)]
        action: MemberAction,
    },
    /// Set the majority fraction for new rounds (owner only).
    Majority {
        #[arg(long = "as", value_name = "ID")]
        caller: Identity,
        numerator: u32,
        denominator: u32,
    },
    /// Set the voting window for new rounds, in seconds (owner only).
    Window {
        #[arg(long = "as", value_name = "ID")]
        caller: Identity,
        secs: u64,
    },
    /// Halt every state change except unpausing (owner only).
    Pause {
        #[arg(long = "as", value_name = "ID")]
        caller: Identity,
    },
    /// Resume normal operation (owner only).
    Unpause {
        #[arg(long = "as", value_name = "ID")]
        caller: Identity,
    },
    /// Hand the owner role to another identity (owner only).
    TransferOwnership {
        #[arg(long = "as", value_name = "ID")]
        caller: Identity,
        new_owner: Identity,
    },
    /// Bind an id to a hash in the write-once store.
    StoreHash { id: String, hash: Fingerprint },
    /// Look up a stored hash; zero values if absent.
    LookupHash { id: String },
    /// Print Prometheus metrics for the loaded state.
    Metrics,
}

#[derive(clap::Subcommand)]
enum MemberAction {
    Add {
        #[arg(long = "as", value_name = "ID")]
        caller: Identity,
        member: Identity,
    },
    Remove {
        #[arg(long = "as", value_name = "ID")]
        caller: Identity,
        member: Identity,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => NodeConfig::default(),
    };
    if let Some(state) = cli.state {
        config.state_file = state;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }

    snapshots_utils::init_logging(config.log_format, &config.log_level);
    if let Some(path) = &cli.config {
        tracing::debug!("loaded config from {}", path.display());
    }

    match cli.command {
        Command::Init { force } => init(&config, force),
        Command::Config => {
            print!("{}", config.to_toml_string());
            Ok(())
        }
        command => execute(&config, command),
    }
}

fn init(config: &NodeConfig, force: bool) -> anyhow::Result<()> {
    let path = &config.state_file;
    if path.exists() && !force {
        bail!(
            "state file {} already exists (use --force to overwrite)",
            path.display()
        );
    }
    let state = NodeState::genesis(config).map_err(rejected)?;
    state
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        validators = state.membership.validator_count(),
        requesters = state.membership.requester_count(),
        "state initialised"
    );
    print_json(&serde_json::json!({
        "owner": state.gate.owner(),
        "validators": state.membership.validators(),
        "requesters": state.membership.requesters(),
        "majority": [state.policy.numerator(), state.policy.denominator()],
        "window_secs": state.policy.default_window_secs(),
    }));
    Ok(())
}

/// Load the node, run one command and persist the state if it changed.
fn execute(config: &NodeConfig, command: Command) -> anyhow::Result<()> {
    let path = &config.state_file;
    let state = NodeState::load(path).with_context(|| {
        format!(
            "failed to load state {} (run `snapshots init` first)",
            path.display()
        )
    })?;
    let mut node = SnapshotsNode::new(state, Arc::new(SystemClock));
    node.subscribe(Box::new(|event: &NodeEvent| print_json(event)));

    if apply(&node, command)? {
        node.into_state()
            .save(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

/// Returns whether the command may have modified state.
fn apply(node: &SnapshotsNode, command: Command) -> anyhow::Result<bool> {
    match command {
        Command::OpenRound {
            caller,
            round,
            topic,
            selector,
        } => {
            node.open_round(&caller, round, topic, selector)
                .map_err(rejected)?;
            Ok(true)
        }
        Command::Vote {
            caller,
            round,
            hash,
        } => {
            node.submit_vote(&caller, &round, hash).map_err(rejected)?;
            Ok(true)
        }
        Command::Verify { round } => {
            print_json(&serde_json::json!({
                "round": round,
                "is_valid": node.verify(&round),
            }));
            Ok(false)
        }
        Command::Consensus { round } => {
            print_json(&serde_json::json!({
                "round": round,
                "value": node.consensus_of(&round),
                "votes": node.winning_count(&round),
            }));
            Ok(false)
        }
        Command::Round { round } => {
            let Some(view) = node.round(&round) else {
                bail!("round {round} not found");
            };
            let remaining = view
                .closes_at
                .as_secs()
                .saturating_sub(snapshots_types::Timestamp::now().as_secs());
            tracing::debug!(round = %round, "window closes in {}", format_duration(remaining));
            print_json(&view);
            Ok(false)
        }
        Command::History { topic } => {
            print_json(&node.history_of(&topic));
            Ok(false)
        }
        Command::Validator { action } => {
            let result = match action {
                MemberAction::Add { caller, member } => node.add_validator(&caller, member),
                MemberAction::Remove { caller, member } => node.remove_validator(&caller, &member),
            };
            result.map_err(rejected)?;
            Ok(true)
        }
        Command::Requester { action } => {
            let result = match action {
                MemberAction::Add { caller, member } => node.add_requester(&caller, member),
                MemberAction::Remove { caller, member } => node.remove_requester(&caller, &member),
            };
            result.map_err(rejected)?;
            Ok(true)
        }
        Command::Majority {
            caller,
            numerator,
            denominator,
        } => {
            node.set_majority(&caller, numerator, denominator)
                .map_err(rejected)?;
            Ok(true)
        }
        Command::Window { caller, secs } => {
            node.set_default_window(&caller, secs).map_err(rejected)?;
            Ok(true)
        }
        Command::Pause { caller } => {
            node.set_paused(&caller, true).map_err(rejected)?;
            Ok(true)
        }
        Command::Unpause { caller } => {
            node.set_paused(&caller, false).map_err(rejected)?;
            Ok(true)
        }
        Command::TransferOwnership { caller, new_owner } => {
            node.transfer_ownership(&caller, new_owner)
                .map_err(rejected)?;
            Ok(true)
        }
        Command::StoreHash { id, hash } => {
            node.store_hash(&id, hash).map_err(rejected)?;
            Ok(true)
        }
        Command::LookupHash { id } => {
            let record = node.lookup_hash(&id);
            print_json(&serde_json::json!({
                "id": id,
                "hash": record.hash,
                "stored_at": record.stored_at,
            }));
            Ok(false)
        }
        Command::Metrics => {
            print!("{}", node.metrics().encode());
            Ok(false)
        }
        Command::Init { .. } | Command::Config => Ok(false),
    }
}

/// Prefix the error with its kind so scripts can match on it.
fn rejected(e: NodeError) -> anyhow::Error {
    anyhow::anyhow!("[{}] {e}", e.kind())
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!("failed to encode output: {e}"),
    }
}
