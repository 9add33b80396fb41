//! Scheduler configuration.
//!
//! Run-level knobs that are not part of the plant description: horizon,
//! ramp-up pricing, how units share the order pool, and how the first
//! run of a unit treats safety stock.

use serde::{Deserialize, Serialize};

use crate::economics::RampPricing;
use crate::error::{PlanningError, PlanningResult};

/// Default planning horizon: 30 days of hourly intervals.
pub const DEFAULT_HORIZON_HOURS: f64 = 30.0 * 24.0;

/// How the units share the order pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Every step, all active units propose and the best proposal plant-wide
    /// is committed.
    #[default]
    Competitive,
    /// Units are planned to completion one after another, in index order;
    /// later units only see what earlier ones left.
    Sequential,
}

/// Safety-stock handling for a unit's very first grade run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialStockPolicy {
    /// The first run starts immediately; no stock top-up.
    #[default]
    Exempt,
    /// The first run first produces up to the grade's minimum safety stock,
    /// rounded up to a whole hour, before any order starts.
    TopUp,
}

/// Configuration for a planning run.
///
/// # Example
/// ```
/// use u_plant_schedule::config::{SchedulerConfig, Strategy};
///
/// let config = SchedulerConfig::new()
///     .with_horizon(240.0)
///     .with_strategy(Strategy::Sequential);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Planning horizon (hours).
    pub horizon_hours: f64,
    /// Ramp-up pricing.
    pub ramp: RampPricing,
    /// Order pool arbitration strategy.
    pub strategy: Strategy,
    /// First-run stock handling.
    pub initial_stock_policy: InitialStockPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            horizon_hours: DEFAULT_HORIZON_HOURS,
            ramp: RampPricing::default(),
            strategy: Strategy::default(),
            initial_stock_policy: InitialStockPolicy::default(),
        }
    }
}

impl SchedulerConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the horizon.
    pub fn with_horizon(mut self, hours: f64) -> Self {
        self.horizon_hours = hours;
        self
    }

    /// Sets the ramp-up pricing.
    pub fn with_ramp(mut self, ramp: RampPricing) -> Self {
        self.ramp = ramp;
        self
    }

    /// Sets the arbitration strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the first-run stock policy.
    pub fn with_initial_stock_policy(mut self, policy: InitialStockPolicy) -> Self {
        self.initial_stock_policy = policy;
        self
    }

    /// Rejects horizons and ramp parameters the scheduler cannot use.
    pub fn validate(&self) -> PlanningResult<()> {
        if !self.horizon_hours.is_finite() || self.horizon_hours <= 0.0 {
            return Err(PlanningError::InvalidHorizon(self.horizon_hours));
        }
        if !self.ramp.window_hours.is_finite() || self.ramp.window_hours < 0.0 {
            return Err(PlanningError::InvalidRamp(format!(
                "window must be a non-negative number of hours, got {}",
                self.ramp.window_hours
            )));
        }
        if !(self.ramp.penalty_factor > 0.0 && self.ramp.penalty_factor <= 1.0) {
            return Err(PlanningError::InvalidRamp(format!(
                "penalty factor must be in (0, 1], got {}",
                self.ramp.penalty_factor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert!((config.horizon_hours - 720.0).abs() < 1e-9);
        assert!((config.ramp.window_hours - 3.0).abs() < 1e-9);
        assert!((config.ramp.penalty_factor - 0.7).abs() < 1e-9);
        assert_eq!(config.strategy, Strategy::Competitive);
        assert_eq!(config.initial_stock_policy, InitialStockPolicy::Exempt);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SchedulerConfig =
            serde_json::from_str(r#"{"horizon_hours": 48.0, "strategy": "sequential"}"#).unwrap();
        assert!((config.horizon_hours - 48.0).abs() < 1e-9);
        assert_eq!(config.strategy, Strategy::Sequential);
        assert_eq!(config.ramp, RampPricing::default());
    }

    #[test]
    fn test_invalid_horizon() {
        for horizon in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let err = SchedulerConfig::new().with_horizon(horizon).validate();
            assert!(matches!(err, Err(PlanningError::InvalidHorizon(_))));
        }
    }

    #[test]
    fn test_invalid_ramp() {
        let bad_penalty = SchedulerConfig::new().with_ramp(RampPricing::new(3.0, 0.0));
        assert!(matches!(bad_penalty.validate(), Err(PlanningError::InvalidRamp(_))));

        let bad_window = SchedulerConfig::new().with_ramp(RampPricing::new(-1.0, 0.7));
        assert!(matches!(bad_window.validate(), Err(PlanningError::InvalidRamp(_))));

        let no_window = SchedulerConfig::new().with_ramp(RampPricing::new(0.0, 1.0));
        assert!(no_window.validate().is_ok());
    }
}
