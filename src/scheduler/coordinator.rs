//! Cross-unit coordination.
//!
//! Drives one [`UnitScheduler`] per unit over a shared pool of firm
//! orders. The coordinator is the only writer of the completed-order set;
//! units learn about taken orders through [`UnitScheduler::exclude`].
//!
//! # Strategies
//!
//! - **Competitive**: every step, each active unit proposes its best next
//!   group; the highest ratio plant-wide is committed and its orders are
//!   broadcast to every unit. Ties go to the lowest unit index.
//! - **Sequential**: units are planned to completion one at a time in
//!   index order, each starting from what earlier units left.
//!
//! Both stop when every unit is complete or no unit can propose anything.
//! Orders are never reassigned once committed.

use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use super::unit::{Proposal, StopReason, UnitScheduler};
use crate::config::{SchedulerConfig, Strategy};
use crate::error::{PlanningError, PlanningResult};
use crate::models::{OrderId, Plan, Plant};
use crate::validation::validate_plant;

/// Greedy multi-unit production planner.
///
/// # Example
///
/// ```
/// use u_plant_schedule::config::SchedulerConfig;
/// use u_plant_schedule::models::{Order, Plant};
/// use u_plant_schedule::scheduler::PlantScheduler;
///
/// let plant = Plant::uniform(2, 1, 10.0, 1.0).with_order("o1", Order::new(0, 20.0, 100.0));
/// let scheduler = PlantScheduler::new(&plant, SchedulerConfig::new().with_horizon(10.0)).unwrap();
/// let plan = scheduler.run();
///
/// assert!(plan.orders_completed.contains("o1"));
/// assert!((plan.total_revenue() - 70.0).abs() < 1e-9);
/// assert!((plan.total_benefit(&plant) - 60.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct PlantScheduler<'a> {
    plant: &'a Plant,
    config: SchedulerConfig,
}

impl<'a> PlantScheduler<'a> {
    /// Validates the configuration and the plant.
    ///
    /// # Errors
    /// - [`PlanningError::InvalidHorizon`] / [`PlanningError::InvalidRamp`]
    ///   for unusable run parameters
    /// - [`PlanningError::InvalidConfig`] listing every plant problem
    pub fn new(plant: &'a Plant, config: SchedulerConfig) -> PlanningResult<Self> {
        config.validate()?;
        validate_plant(plant).map_err(PlanningError::InvalidConfig)?;
        Ok(Self { plant, config })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Builds a complete plan.
    pub fn run(&self) -> Plan {
        if self.plant.orders.firm.is_empty() {
            warn!("plant has no firm orders; the plan will be empty");
        }

        let units = match self.config.strategy {
            Strategy::Competitive => self.run_competitive(),
            Strategy::Sequential => self.run_sequential(),
        };

        let mut plan = Plan::new(
            self.config.horizon_hours,
            self.plant.n_units(),
            self.plant.n_grades(),
        );
        for unit in units {
            unit.record_into(&mut plan);
        }

        info!(
            strategy = ?self.config.strategy,
            orders = plan.orders_completed.len(),
            firm = self.plant.orders.firm_count(),
            revenue = plan.total_revenue(),
            benefit = plan.total_benefit(self.plant),
            "planning finished"
        );
        plan
    }

    fn new_unit(&self, unit: usize) -> UnitScheduler<'a> {
        UnitScheduler::new(self.plant, unit, self.config)
    }

    fn run_competitive(&self) -> Vec<UnitScheduler<'a>> {
        let mut units: Vec<_> = (0..self.plant.n_units())
            .map(|u| self.new_unit(u))
            .collect();
        let mut completed: BTreeSet<OrderId> = BTreeSet::new();
        let mut steps = 0usize;

        loop {
            let mut best: Option<Proposal> = None;
            for unit in units.iter_mut().filter(|u| !u.is_complete()) {
                match unit.propose_best() {
                    None => unit.stop(StopReason::NoCandidates),
                    Some(p) => {
                        if best.as_ref().is_none_or(|b| p.ratio() > b.ratio()) {
                            best = Some(p);
                        }
                    }
                }
            }

            let Some(proposal) = best else {
                info!(steps, completed = completed.len(), "no unit can propose");
                break;
            };

            debug!(
                step = steps,
                unit = proposal.unit,
                grade = proposal.grade,
                ratio = proposal.ratio(),
                "selected proposal"
            );
            let assigned = units[proposal.unit].commit(&proposal);
            record_completed(&mut completed, &assigned);
            for unit in &mut units {
                unit.exclude(&assigned);
            }
            steps += 1;
        }

        units
    }

    fn run_sequential(&self) -> Vec<UnitScheduler<'a>> {
        let mut completed: BTreeSet<OrderId> = BTreeSet::new();
        let mut units = Vec::with_capacity(self.plant.n_units());

        for u in 0..self.plant.n_units() {
            let mut unit = self.new_unit(u);
            unit.exclude(&completed);
            while !unit.is_complete() {
                match unit.propose_best() {
                    None => unit.stop(StopReason::NoCandidates),
                    Some(p) => {
                        let assigned = unit.commit(&p);
                        record_completed(&mut completed, &assigned);
                    }
                }
            }
            units.push(unit);
        }

        units
    }
}

/// Adds newly assigned orders to the write-once completed set.
fn record_completed(completed: &mut BTreeSet<OrderId>, assigned: &[OrderId]) {
    for id in assigned {
        let fresh = completed.insert(id.clone());
        debug_assert!(fresh, "order '{id}' committed twice");
    }
}

/// Validates and plans in one call.
pub fn schedule(plant: &Plant, config: SchedulerConfig) -> PlanningResult<Plan> {
    Ok(PlantScheduler::new(plant, config)?.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::RandomPlantSpec;
    use crate::models::{GradeRun, Order, TransitionRules};
    use crate::scheduler::PlanKpi;
    use crate::validation::check_plan;

    fn config(horizon: f64) -> SchedulerConfig {
        SchedulerConfig::new().with_horizon(horizon)
    }

    #[test]
    fn test_single_order_scenario() {
        let plant = Plant::uniform(2, 1, 10.0, 1.0).with_order("a", Order::new(0, 20.0, 100.0));
        let plan = schedule(&plant, config(10.0)).unwrap();

        assert_eq!(plan.grade_runs(0), &[GradeRun { grade: 0, start: 0.0 }]);
        let a = &plan.assignments(0)[0];
        assert!((a.end - 2.0).abs() < 1e-9);
        assert!((a.revenue - 70.0).abs() < 1e-9);
        assert!((a.benefit - 68.0).abs() < 1e-9);
        // Grade 0 runs the whole 10 h horizon at 1 $/h.
        assert!((plan.manufacturing_cost(&plant) - 10.0).abs() < 1e-9);
        assert!((plan.total_benefit(&plant) - 60.0).abs() < 1e-9);
        assert!(check_plan(&plant, &plan).is_empty());
    }

    #[test]
    fn test_tie_goes_to_first_unit() {
        let plant = Plant::uniform(1, 2, 10.0, 1.0).with_order("a", Order::new(0, 20.0, 100.0));
        let plan = schedule(&plant, config(100.0)).unwrap();
        assert_eq!(plan.unit_for_order("a"), Some(0));
        assert!(plan.assignments(1).is_empty());
        assert_eq!(plan.orders_completed.len(), 1);
    }

    #[test]
    fn test_broadcast_removes_order_from_other_units() {
        let plant = Plant::uniform(1, 2, 10.0, 1.0).with_order("a", Order::new(0, 20.0, 100.0));
        let cfg = config(100.0);
        let mut u0 = UnitScheduler::new(&plant, 0, cfg);
        let mut u1 = UnitScheduler::new(&plant, 1, cfg);

        let p0 = u0.propose_best().unwrap();
        let p1 = u1.propose_best().unwrap();
        assert!((p0.ratio() - p1.ratio()).abs() < 1e-12);

        let assigned = u0.commit(&p0);
        u1.exclude(&assigned);
        assert!(u1.propose_best().is_none());
    }

    #[test]
    fn test_best_ratio_wins_across_units() {
        // Unit 1 is cheaper, so it wins the order.
        let plant = Plant::uniform(1, 2, 10.0, 5.0)
            .with_cost(0, 1, 1.0)
            .with_order("a", Order::new(0, 20.0, 100.0));
        let plan = schedule(&plant, config(100.0)).unwrap();
        assert_eq!(plan.unit_for_order("a"), Some(1));
    }

    #[test]
    fn test_exclusive_grade_stays_on_its_unit() {
        let plant = Plant::uniform(1, 2, 10.0, 5.0)
            .with_cost(0, 1, 1.0)
            .with_rules(TransitionRules::new().with_exclusive(0, [0]))
            .with_order("a", Order::new(0, 20.0, 100.0));
        let plan = schedule(&plant, config(100.0)).unwrap();
        assert_eq!(plan.unit_for_order("a"), Some(0));
        assert!(plan.grade_runs(1).is_empty());
    }

    #[test]
    fn test_sequential_fills_units_in_order() {
        let plant = Plant::uniform(1, 2, 10.0, 1.0)
            .with_order("a", Order::new(0, 20.0, 100.0))
            .with_order("b", Order::new(0, 20.0, 90.0))
            .with_order("c", Order::new(0, 20.0, 80.0));
        let cfg = config(4.0).with_strategy(Strategy::Sequential);
        let plan = schedule(&plant, cfg).unwrap();

        assert_eq!(plan.assignments(0).len(), 2);
        assert_eq!(plan.unit_for_order("c"), Some(1));
        assert_eq!(plan.orders_completed.len(), 3);
        assert!(check_plan(&plant, &plan).is_empty());
    }

    #[test]
    fn test_running_unit_beats_fresh_start() {
        let plant = Plant::uniform(1, 2, 10.0, 1.0)
            .with_order("a", Order::new(0, 20.0, 100.0))
            .with_order("b", Order::new(0, 20.0, 90.0));
        let plan = schedule(&plant, config(100.0)).unwrap();
        // Unit 0 has 1 h of ramp window left for b (ratio 37.25); unit 1
        // would start b fully penalized (ratio 30.5).
        assert_eq!(plan.unit_for_order("a"), Some(0));
        assert_eq!(plan.unit_for_order("b"), Some(0));
        assert!(plan.assignments(1).is_empty());
    }

    #[test]
    fn test_no_firm_orders() {
        let plant = Plant::uniform(2, 2, 10.0, 1.0);
        let plan = schedule(&plant, config(100.0)).unwrap();
        assert_eq!(plan.assignment_count(), 0);
        assert!(plan.grades_plan.values().all(Vec::is_empty));
    }

    #[test]
    fn test_rejects_invalid_input() {
        let plant = Plant::uniform(1, 1, 0.0, 1.0);
        assert!(matches!(
            PlantScheduler::new(&plant, config(100.0)),
            Err(PlanningError::InvalidConfig(_))
        ));
        let plant = Plant::uniform(1, 1, 10.0, 1.0);
        assert!(matches!(
            PlantScheduler::new(&plant, config(0.0)),
            Err(PlanningError::InvalidHorizon(_))
        ));
    }

    #[test]
    fn test_random_plants_are_feasible() {
        let spec = RandomPlantSpec::default();
        for seed in 0..5 {
            let plant = Plant::from_data(&spec.generate(seed)).unwrap();
            for strategy in [Strategy::Competitive, Strategy::Sequential] {
                let plan = schedule(&plant, SchedulerConfig::new().with_strategy(strategy)).unwrap();
                let violations = check_plan(&plant, &plan);
                assert!(violations.is_empty(), "seed {seed} {strategy:?}: {violations:?}");
                assert!(plan.total_revenue() >= 0.0);
                assert!(plan.assignment_count() > 0);
            }
        }
    }

    #[test]
    fn test_random_plants_benefit() {
        let spec = RandomPlantSpec::default();
        for seed in 0..10 {
            let plant = Plant::from_data(&spec.generate(seed)).unwrap();
            for strategy in [Strategy::Competitive, Strategy::Sequential] {
                let plan = schedule(&plant, SchedulerConfig::new().with_strategy(strategy)).unwrap();
                let committed = plan.committed_benefit();
                assert!(committed >= 0.0, "seed {seed} {strategy:?}: {committed}");
                // Idle hours to the horizon are charged, so total benefit
                // trails committed benefit by at least the unpaid run time.
                let total = plan.total_benefit(&plant);
                assert!(total <= committed + 1e-9, "seed {seed} {strategy:?}");
                let kpi = PlanKpi::calculate(&plan, &plant);
                assert!((kpi.benefit - total).abs() < 1e-9);
                assert!((kpi.committed_benefit - committed).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_top_up_plans_are_feasible() {
        let spec = RandomPlantSpec::default();
        let plant = Plant::from_data(&spec.generate(42)).unwrap();
        let cfg = SchedulerConfig::new()
            .with_initial_stock_policy(crate::config::InitialStockPolicy::TopUp);
        let plan = schedule(&plant, cfg).unwrap();
        assert!(check_plan(&plant, &plan).is_empty());
        assert!(plan.stocks.iter().any(|&s| s > 0.0));
    }

    #[test]
    fn test_deterministic() {
        let plant = Plant::from_data(&RandomPlantSpec::default().generate(7)).unwrap();
        let a = schedule(&plant, SchedulerConfig::new()).unwrap();
        let b = schedule(&plant, SchedulerConfig::new()).unwrap();
        assert_eq!(a, b);
    }
}
