//! Plant configuration.
//!
//! Immutable description of a multi-unit plant: how fast and at what cost
//! each unit produces each grade, per-grade run and stock minimums, the
//! transition rules, and the order book.
//!
//! # Matrix Layout
//! Per grade×unit values are stored grade-major: `index = grade * n_units + unit`.

use serde::{Deserialize, Serialize};

use super::{GradeId, Order, OrderBook, OrderId, TransitionRules, UnitId};

/// Hours per planning interval day.
pub const DEFAULT_INTERVALS_PER_DAY: u32 = 24;

/// Days before embargoed grades may start.
pub const DEFAULT_EMBARGO_DAYS: u32 = 10;

/// A multi-unit plant and its firm/estimated orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    n_grades: usize,
    n_units: usize,
    /// Production flow (tons/hour), grade-major.
    prod_flow: Vec<f64>,
    /// Manufacturing cost ($/hour), grade-major.
    man_cost: Vec<f64>,
    /// Minimum run duration per grade (hours).
    min_run: Vec<f64>,
    /// Minimum safety stock per grade (tons).
    min_stock: Vec<f64>,
    /// Transition rules.
    pub rules: TransitionRules,
    /// Orders to plan.
    pub orders: OrderBook,
    /// Planning intervals per day (hours).
    pub intervals_per_day: u32,
}

impl Plant {
    /// Creates a plant where every grade runs at `flow` t/h for `cost` $/h on
    /// every unit, with no minimums, no rules and no orders.
    pub fn uniform(n_grades: usize, n_units: usize, flow: f64, cost: f64) -> Self {
        let cells = n_grades * n_units;
        Self {
            n_grades,
            n_units,
            prod_flow: vec![flow; cells],
            man_cost: vec![cost; cells],
            min_run: vec![0.0; n_grades],
            min_stock: vec![0.0; n_grades],
            rules: TransitionRules::new().with_embargo(
                f64::from(DEFAULT_EMBARGO_DAYS * DEFAULT_INTERVALS_PER_DAY),
                std::iter::empty(),
            ),
            orders: OrderBook::new(),
            intervals_per_day: DEFAULT_INTERVALS_PER_DAY,
        }
    }

    /// Creates a plant from already-shaped parts.
    ///
    /// Shapes are not checked here; run [`crate::validation::validate_plant`]
    /// before scheduling.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        n_grades: usize,
        n_units: usize,
        prod_flow: Vec<f64>,
        man_cost: Vec<f64>,
        min_run: Vec<f64>,
        min_stock: Vec<f64>,
        rules: TransitionRules,
        orders: OrderBook,
        intervals_per_day: u32,
    ) -> Self {
        Self {
            n_grades,
            n_units,
            prod_flow,
            man_cost,
            min_run,
            min_stock,
            rules,
            orders,
            intervals_per_day,
        }
    }

    /// Sets the flow rate of one grade on one unit.
    pub fn with_flow(mut self, grade: GradeId, unit: UnitId, flow: f64) -> Self {
        let idx = self.index(grade, unit);
        self.prod_flow[idx] = flow;
        self
    }

    /// Sets the cost rate of one grade on one unit.
    pub fn with_cost(mut self, grade: GradeId, unit: UnitId, cost: f64) -> Self {
        let idx = self.index(grade, unit);
        self.man_cost[idx] = cost;
        self
    }

    /// Sets the minimum run duration of a grade.
    pub fn with_min_run(mut self, grade: GradeId, hours: f64) -> Self {
        self.min_run[grade] = hours;
        self
    }

    /// Sets the minimum safety stock of a grade.
    pub fn with_min_stock(mut self, grade: GradeId, tons: f64) -> Self {
        self.min_stock[grade] = tons;
        self
    }

    /// Replaces the transition rules.
    pub fn with_rules(mut self, rules: TransitionRules) -> Self {
        self.rules = rules;
        self
    }

    /// Adds a firm order.
    pub fn with_order(mut self, id: impl Into<OrderId>, order: Order) -> Self {
        self.orders.firm.insert(id.into(), order);
        self
    }

    /// Replaces the order book.
    pub fn with_orders(mut self, orders: OrderBook) -> Self {
        self.orders = orders;
        self
    }

    #[inline]
    fn index(&self, grade: GradeId, unit: UnitId) -> usize {
        grade * self.n_units + unit
    }

    /// Number of grades.
    #[inline]
    pub fn n_grades(&self) -> usize {
        self.n_grades
    }

    /// Number of units.
    #[inline]
    pub fn n_units(&self) -> usize {
        self.n_units
    }

    /// Production flow of `grade` on `unit` (tons/hour).
    #[inline]
    pub fn flow(&self, grade: GradeId, unit: UnitId) -> f64 {
        self.prod_flow[self.index(grade, unit)]
    }

    /// Manufacturing cost of `grade` on `unit` ($/hour).
    #[inline]
    pub fn cost_rate(&self, grade: GradeId, unit: UnitId) -> f64 {
        self.man_cost[self.index(grade, unit)]
    }

    /// Minimum run duration of `grade` (hours).
    #[inline]
    pub fn min_run(&self, grade: GradeId) -> f64 {
        self.min_run[grade]
    }

    /// Minimum safety stock of `grade` (tons).
    #[inline]
    pub fn min_stock(&self, grade: GradeId) -> f64 {
        self.min_stock[grade]
    }

    /// Raw flow matrix (grade-major).
    pub fn flow_matrix(&self) -> &[f64] {
        &self.prod_flow
    }

    /// Raw cost matrix (grade-major).
    pub fn cost_matrix(&self) -> &[f64] {
        &self.man_cost
    }

    /// Minimum run durations.
    pub fn min_runs(&self) -> &[f64] {
        &self.min_run
    }

    /// Minimum safety stocks.
    pub fn min_stocks(&self) -> &[f64] {
        &self.min_stock
    }

    /// See [`TransitionRules::is_legal_transition`].
    pub fn is_legal_transition(
        &self,
        grade: GradeId,
        time: f64,
        unit: UnitId,
        current: Option<GradeId>,
    ) -> bool {
        self.rules.is_legal_transition(grade, time, unit, current)
    }

    /// See [`TransitionRules::possible_transitions`].
    pub fn possible_transitions(
        &self,
        time: f64,
        unit: UnitId,
        current: Option<GradeId>,
    ) -> Vec<GradeId> {
        self.rules
            .possible_transitions(self.n_grades, time, unit, current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_plant() {
        let plant = Plant::uniform(3, 2, 10.0, 1.0);
        assert_eq!(plant.n_grades(), 3);
        assert_eq!(plant.n_units(), 2);
        assert_eq!(plant.flow_matrix().len(), 6);
        assert!((plant.flow(2, 1) - 10.0).abs() < 1e-9);
        assert!((plant.cost_rate(0, 0) - 1.0).abs() < 1e-9);
        assert!((plant.rules.embargo_hours - 240.0).abs() < 1e-9);
    }

    #[test]
    fn test_grade_major_layout() {
        let plant = Plant::uniform(2, 3, 1.0, 1.0)
            .with_flow(1, 2, 7.0)
            .with_cost(0, 1, 4.0);
        assert!((plant.flow_matrix()[5] - 7.0).abs() < 1e-9);
        assert!((plant.cost_matrix()[1] - 4.0).abs() < 1e-9);
        assert!((plant.flow(1, 2) - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_minimums_and_orders() {
        let plant = Plant::uniform(2, 1, 5.0, 2.0)
            .with_min_run(1, 4.0)
            .with_min_stock(0, 12.0)
            .with_order("o1", Order::new(1, 10.0, 50.0));
        assert!((plant.min_run(1) - 4.0).abs() < 1e-9);
        assert!((plant.min_stock(0) - 12.0).abs() < 1e-9);
        assert_eq!(plant.orders.firm_count(), 1);
    }

    #[test]
    fn test_oracle_delegates_to_rules() {
        let plant = Plant::uniform(3, 1, 1.0, 1.0)
            .with_rules(TransitionRules::new().with_forbidden(0, 2));
        assert!(!plant.is_legal_transition(2, 0.0, 0, Some(0)));
        assert_eq!(plant.possible_transitions(0.0, 0, Some(0)), vec![0, 1]);
    }
}
