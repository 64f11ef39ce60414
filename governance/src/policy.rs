//! Majority policy: the agreement fraction and default voting window.
//!
//! Rounds copy the threshold and window out of the policy when they open, so
//! a later change only affects rounds opened after it.

use crate::access::OwnerCapability;
use crate::error::GovernanceError;
use crate::event::GovernanceEvent;
use serde::{Deserialize, Serialize};

/// Default fraction of validators that must agree: two thirds.
pub const DEFAULT_NUMERATOR: u32 = 2;
pub const DEFAULT_DENOMINATOR: u32 = 3;

/// Default voting window in seconds.
pub const DEFAULT_WINDOW_SECS: u64 = 120;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorityPolicy {
    numerator: u32,
    denominator: u32,
    default_window_secs: u64,
}

impl Default for MajorityPolicy {
    fn default() -> Self {
        Self {
            numerator: DEFAULT_NUMERATOR,
            denominator: DEFAULT_DENOMINATOR,
            default_window_secs: DEFAULT_WINDOW_SECS,
        }
    }
}

impl MajorityPolicy {
    pub fn new(
        numerator: u32,
        denominator: u32,
        default_window_secs: u64,
    ) -> Result<Self, GovernanceError> {
        let policy = Self {
            numerator,
            denominator,
            default_window_secs,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Check `0 < numerator <= denominator` and a non-zero window.
    pub fn validate(&self) -> Result<(), GovernanceError> {
        validate_fraction(self.numerator, self.denominator)?;
        validate_window(self.default_window_secs)
    }

    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    pub fn default_window_secs(&self) -> u64 {
        self.default_window_secs
    }

    /// Minimum number of agreeing votes out of `potential_votes`:
    /// `ceil(potential_votes * numerator / denominator)`.
    pub fn required_votes(&self, potential_votes: u32) -> u32 {
        let product = u64::from(potential_votes) * u64::from(self.numerator);
        let denominator = u64::from(self.denominator);
        ((product + denominator - 1) / denominator) as u32
    }

    pub fn set_majority(
        &mut self,
        cap: &OwnerCapability,
        numerator: u32,
        denominator: u32,
    ) -> Result<Option<GovernanceEvent>, GovernanceError> {
        validate_fraction(numerator, denominator)?;
        if self.numerator == numerator && self.denominator == denominator {
            return Ok(None);
        }
        self.numerator = numerator;
        self.denominator = denominator;
        tracing::info!(owner = %cap.owner(), numerator, denominator, "majority updated");
        Ok(Some(GovernanceEvent::MajorityUpdated {
            numerator,
            denominator,
        }))
    }

    pub fn set_default_window(
        &mut self,
        cap: &OwnerCapability,
        window_secs: u64,
    ) -> Result<Option<GovernanceEvent>, GovernanceError> {
        validate_window(window_secs)?;
        if self.default_window_secs == window_secs {
            return Ok(None);
        }
        self.default_window_secs = window_secs;
        tracing::info!(owner = %cap.owner(), window_secs, "default window updated");
        Ok(Some(GovernanceEvent::WindowUpdated { window_secs }))
    }
}

fn validate_fraction(numerator: u32, denominator: u32) -> Result<(), GovernanceError> {
    if denominator == 0 {
        return Err(GovernanceError::InvalidPolicy(
            "denominator must be greater than zero".into(),
        ));
    }
    if numerator == 0 {
        return Err(GovernanceError::InvalidPolicy(
            "numerator must be greater than zero".into(),
        ));
    }
    if numerator > denominator {
        return Err(GovernanceError::InvalidPolicy(format!(
            "numerator {numerator} exceeds denominator {denominator}"
        )));
    }
    Ok(())
}

fn validate_window(window_secs: u64) -> Result<(), GovernanceError> {
    if window_secs == 0 {
        return Err(GovernanceError::InvalidPolicy(
            "voting window must be greater than zero".into(),
        ));
    }
    Ok(())
}
