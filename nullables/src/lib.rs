//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies of the node (the clock, notification observers) are
//! abstracted behind traits or callbacks. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Record what happened for later assertions
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod events;

pub use clock::NullClock;
pub use events::EventRecorder;
