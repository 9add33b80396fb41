//! JSON input and output formats.
//!
//! [`PlantData`] mirrors the plant description files exchanged with the
//! rest of the planning tooling; [`PlanReport`] is what a planning run
//! writes back.
//!
//! # Input Layout
//!
//! ```text
//! {
//!   "n_grades": 3, "n_units": 2,
//!   "prod_flow": [..],              // grade-major, n_grades * n_units
//!   "man_cost":  [..],              // grade-major, n_grades * n_units
//!   "s_min": [..], "t_min": [..],   // per grade
//!   "not_allowed_transitions": {"0": [2]},
//!   "unique_grades": [1], "unique_unit": 0,
//!   "only_consecutive": {"0": 1},   // 0 must be followed by 1
//!   "only_predecessor": {"1": 0},   // optional, inverse of the above
//!   "grades_after_10_days": [2],
//!   "orders": {"firm": {"o1": [grade, tons, price, priority]}, "estimated": {}}
//! }
//! ```
//!
//! Integer map keys are JSON strings. `intervals_per_day` (24) and
//! `embargo_days` (10) are optional.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::error::{PlanningError, PlanningResult};
use crate::models::{
    GradeId, GradeRun, OrderAssignment, OrderBook, OrderId, Plan, Plant, TransitionRules, UnitId,
    DEFAULT_EMBARGO_DAYS, DEFAULT_INTERVALS_PER_DAY,
};
use crate::validation::validate_plant_data;

/// Plant description as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantData {
    pub n_grades: usize,
    pub n_units: usize,
    /// Flow rates (t/h), grade-major.
    pub prod_flow: Vec<f64>,
    /// Cost rates ($/h), grade-major.
    pub man_cost: Vec<f64>,
    #[serde(default)]
    pub not_allowed_transitions: BTreeMap<GradeId, Vec<GradeId>>,
    #[serde(default)]
    pub unique_grades: Vec<GradeId>,
    #[serde(default)]
    pub unique_unit: UnitId,
    /// Minimum safety stock per grade (t).
    pub s_min: Vec<f64>,
    /// Minimum run time per grade (h).
    pub t_min: Vec<f64>,
    #[serde(default)]
    pub only_consecutive: BTreeMap<GradeId, GradeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only_predecessor: Option<BTreeMap<GradeId, GradeId>>,
    #[serde(default)]
    pub grades_after_10_days: Vec<GradeId>,
    pub orders: OrderBook,
    #[serde(default = "default_intervals_per_day")]
    pub intervals_per_day: u32,
    #[serde(default = "default_embargo_days")]
    pub embargo_days: u32,
}

fn default_intervals_per_day() -> u32 {
    DEFAULT_INTERVALS_PER_DAY
}

fn default_embargo_days() -> u32 {
    DEFAULT_EMBARGO_DAYS
}

impl PlantData {
    /// Required predecessors, taken from `only_predecessor` or derived from
    /// `only_consecutive`.
    pub fn predecessor_map(&self) -> BTreeMap<GradeId, GradeId> {
        match &self.only_predecessor {
            Some(map) => map.clone(),
            None => self
                .only_consecutive
                .iter()
                .map(|(&prev, &next)| (next, prev))
                .collect(),
        }
    }

    /// Builds the plant this data describes, without validating it.
    pub fn to_plant(&self) -> Plant {
        let mut rules = TransitionRules::new()
            .with_exclusive(self.unique_unit, self.unique_grades.iter().copied())
            .with_embargo(
                f64::from(self.embargo_days) * f64::from(self.intervals_per_day),
                self.grades_after_10_days.iter().copied(),
            );
        for (&from, successors) in &self.not_allowed_transitions {
            for &to in successors {
                rules.forbid(from, to);
            }
        }
        for (grade, pred) in self.predecessor_map() {
            rules.set_predecessor(grade, pred);
        }

        Plant::from_parts(
            self.n_grades,
            self.n_units,
            self.prod_flow.clone(),
            self.man_cost.clone(),
            self.t_min.clone(),
            self.s_min.clone(),
            rules,
            self.orders.clone(),
            self.intervals_per_day,
        )
    }

    /// Describes an existing plant.
    pub fn from_plant(plant: &Plant) -> Self {
        let rules = &plant.rules;
        let predecessors: BTreeMap<GradeId, GradeId> = rules.predecessors().collect();
        let intervals_per_day = plant.intervals_per_day.max(1);
        Self {
            n_grades: plant.n_grades(),
            n_units: plant.n_units(),
            prod_flow: plant.flow_matrix().to_vec(),
            man_cost: plant.cost_matrix().to_vec(),
            not_allowed_transitions: rules
                .forbidden_pairs()
                .map(|(from, set)| (from, set.iter().copied().collect()))
                .collect(),
            unique_grades: rules.exclusive_grades.iter().copied().collect(),
            unique_unit: rules.exclusive_unit,
            s_min: plant.min_stocks().to_vec(),
            t_min: plant.min_runs().to_vec(),
            only_consecutive: predecessors.iter().map(|(&g, &p)| (p, g)).collect(),
            only_predecessor: Some(predecessors),
            grades_after_10_days: rules.embargoed.iter().copied().collect(),
            orders: plant.orders.clone(),
            intervals_per_day,
            embargo_days: (rules.embargo_hours / f64::from(intervals_per_day)).round() as u32,
        }
    }
}

impl Plant {
    /// Validates `data` and builds the plant.
    ///
    /// # Errors
    /// [`PlanningError::InvalidConfig`] listing every problem found.
    pub fn from_data(data: &PlantData) -> PlanningResult<Self> {
        validate_plant_data(data).map_err(PlanningError::InvalidConfig)?;
        Ok(data.to_plant())
    }
}

impl TryFrom<PlantData> for Plant {
    type Error = PlanningError;

    fn try_from(data: PlantData) -> PlanningResult<Self> {
        Plant::from_data(&data)
    }
}

/// Reads plant data from a JSON file.
pub fn load_plant_data(path: impl AsRef<Path>) -> PlanningResult<PlantData> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Reads and validates a plant from a JSON file.
pub fn load_plant(path: impl AsRef<Path>) -> PlanningResult<Plant> {
    Plant::from_data(&load_plant_data(path)?)
}

/// Writes plant data as pretty-printed JSON.
pub fn save_plant_data(path: impl AsRef<Path>, data: &PlantData) -> PlanningResult<()> {
    fs::write(path, serde_json::to_string_pretty(data)?)?;
    Ok(())
}

/// Result of a planning run as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanReport {
    /// Planning horizon (hours).
    pub horizon: f64,
    /// Grade runs per unit.
    pub grades_plan: BTreeMap<UnitId, Vec<GradeRun>>,
    /// Order assignments per unit.
    pub orders_plan: BTreeMap<UnitId, Vec<OrderAssignment>>,
    /// Every assigned order.
    pub orders_completed: BTreeSet<OrderId>,
    /// Safety stock built per grade (t).
    pub stocks: Vec<f64>,
    pub revenue: f64,
    pub cost: f64,
    /// Revenue minus manufacturing cost. Every unit is charged to the
    /// horizon, so this goes negative when units stop early and sit idle.
    pub benefit: f64,
    /// Sum of assignment benefits; never negative.
    pub committed_benefit: f64,
}

impl PlanReport {
    /// Summarizes a plan for `plant`.
    pub fn new(plan: &Plan, plant: &Plant) -> Self {
        let revenue = plan.total_revenue();
        let cost = plan.manufacturing_cost(plant);
        Self {
            horizon: plan.horizon,
            grades_plan: plan.grades_plan.clone(),
            orders_plan: plan.orders_plan.clone(),
            orders_completed: plan.orders_completed.clone(),
            stocks: plan.stocks.clone(),
            revenue,
            cost,
            benefit: revenue - cost,
            committed_benefit: plan.committed_benefit(),
        }
    }
}

/// Writes a plan report as pretty-printed JSON.
pub fn save_plan_report(path: impl AsRef<Path>, report: &PlanReport) -> PlanningResult<()> {
    fs::write(path, serde_json::to_string_pretty(report)?)?;
    Ok(())
}
