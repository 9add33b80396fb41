//! Production plan (solution) model.
//!
//! A plan records, per unit, the sequence of grade runs and the orders
//! produced inside them, plus the plant-wide completed-order set and the
//! safety stock built along the way.
//!
//! # Time Representation
//! All times are hours from the start of the planning horizon (t=0).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{GradeId, OrderId, Plant, UnitId};

/// A contiguous production run of one grade on one unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeRun {
    /// Grade produced.
    pub grade: GradeId,
    /// Run start (hours).
    pub start: f64,
}

/// An order committed to a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAssignment {
    /// Assigned order.
    pub order_id: OrderId,
    /// Grade of the order.
    pub grade: GradeId,
    /// Production start (hours).
    pub start: f64,
    /// Production end (hours).
    pub end: f64,
    /// Revenue minus the cost of the production hours.
    pub benefit: f64,
    /// Revenue after ramp-up pricing.
    pub revenue: f64,
}

/// A complete production plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Planning horizon (hours).
    pub horizon: f64,
    /// Grade runs per unit, ordered by start.
    pub grades_plan: BTreeMap<UnitId, Vec<GradeRun>>,
    /// Order assignments per unit, ordered by start.
    pub orders_plan: BTreeMap<UnitId, Vec<OrderAssignment>>,
    /// Every order assigned anywhere in the plant.
    pub orders_completed: BTreeSet<OrderId>,
    /// Safety stock built per grade (tons), summed over units.
    pub stocks: Vec<f64>,
}

/// A constraint violation found in a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Unit the violation was found on (`None` for plant-wide checks).
    pub unit: Option<UnitId>,
    /// Human-readable description.
    pub message: String,
}

/// Classification of plan violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// An order was assigned more than once, or the completed set disagrees
    /// with the assignments.
    DuplicateOrder,
    /// Records are out of time order or outside `[0, horizon]`.
    TimeOrder,
    /// A grade follows a grade it is forbidden after, or misses its
    /// required predecessor.
    IllegalTransition,
    /// A non-final run is shorter than its grade's minimum.
    MinimumRun,
    /// An exclusive grade ran on a unit other than its exclusive unit.
    ExclusiveUnit,
    /// An embargoed grade started inside the embargo window.
    Embargo,
    /// An order was produced outside a run of its own grade.
    RunMismatch,
    /// The committed orders lose money overall.
    NegativeBenefit,
}

impl Violation {
    /// Creates a violation.
    pub fn new(
        violation_type: ViolationType,
        unit: Option<UnitId>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            violation_type,
            unit,
            message: message.into(),
        }
    }
}

impl OrderAssignment {
    /// Production duration (hours).
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl Plan {
    /// Creates an empty plan with a slot for every unit.
    pub fn new(horizon: f64, n_units: usize, n_grades: usize) -> Self {
        Self {
            horizon,
            grades_plan: (0..n_units).map(|u| (u, Vec::new())).collect(),
            orders_plan: (0..n_units).map(|u| (u, Vec::new())).collect(),
            orders_completed: BTreeSet::new(),
            stocks: vec![0.0; n_grades],
        }
    }

    /// Merges one unit's records into the plan.
    pub fn add_unit(
        &mut self,
        unit: UnitId,
        grade_runs: Vec<GradeRun>,
        assignments: Vec<OrderAssignment>,
        stocks: &[f64],
    ) {
        self.orders_completed
            .extend(assignments.iter().map(|a| a.order_id.clone()));
        if self.stocks.len() < stocks.len() {
            self.stocks.resize(stocks.len(), 0.0);
        }
        for (total, s) in self.stocks.iter_mut().zip(stocks) {
            *total += s;
        }
        self.grades_plan.insert(unit, grade_runs);
        self.orders_plan.insert(unit, assignments);
    }

    /// Grade runs of a unit.
    pub fn grade_runs(&self, unit: UnitId) -> &[GradeRun] {
        self.grades_plan.get(&unit).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Order assignments of a unit.
    pub fn assignments(&self, unit: UnitId) -> &[OrderAssignment] {
        self.orders_plan.get(&unit).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every assignment across all units.
    pub fn all_assignments(&self) -> impl Iterator<Item = &OrderAssignment> {
        self.orders_plan.values().flatten()
    }

    /// The unit an order was assigned to.
    pub fn unit_for_order(&self, order_id: &str) -> Option<UnitId> {
        self.orders_plan
            .iter()
            .find(|(_, list)| list.iter().any(|a| a.order_id == order_id))
            .map(|(&unit, _)| unit)
    }

    /// Number of assignments across all units.
    pub fn assignment_count(&self) -> usize {
        self.orders_plan.values().map(Vec::len).sum()
    }

    /// Number of grade changes across all units (first runs excluded).
    pub fn grade_change_count(&self) -> usize {
        self.grades_plan
            .values()
            .map(|runs| runs.len().saturating_sub(1))
            .sum()
    }

    /// Sum of assignment revenues.
    pub fn total_revenue(&self) -> f64 {
        self.all_assignments().map(|a| a.revenue).sum()
    }

    /// Sum of assignment benefits (revenue minus order production cost).
    pub fn committed_benefit(&self) -> f64 {
        self.all_assignments().map(|a| a.benefit).sum()
    }

    /// Manufacturing cost of one unit.
    ///
    /// Each run is charged from its start to the next run's start; the last
    /// run is charged to the horizon.
    pub fn unit_cost(&self, plant: &Plant, unit: UnitId) -> f64 {
        let runs = self.grade_runs(unit);
        runs.iter()
            .enumerate()
            .map(|(i, run)| {
                let end = runs.get(i + 1).map_or(self.horizon, |next| next.start);
                plant.cost_rate(run.grade, unit) * (end - run.start).max(0.0)
            })
            .sum()
    }

    /// Manufacturing cost across all units.
    pub fn manufacturing_cost(&self, plant: &Plant) -> f64 {
        self.grades_plan
            .keys()
            .map(|&unit| self.unit_cost(plant, unit))
            .sum()
    }

    /// Total revenue minus manufacturing cost.
    pub fn total_benefit(&self, plant: &Plant) -> f64 {
        self.total_revenue() - self.manufacturing_cost(plant)
    }
}
