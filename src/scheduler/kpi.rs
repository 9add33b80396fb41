//! Plan quality metrics (KPIs).
//!
//! Computes production planning indicators from a finished plan and the
//! plant it was built for.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Revenue | Sum of order revenues after ramp-up pricing |
//! | Manufacturing Cost | Cost rate × run length, last run to the horizon |
//! | Benefit | Revenue − manufacturing cost |
//! | Committed Benefit | Sum of per-order benefits |
//! | Fill Rate | Completed firm tons / all firm tons |
//! | Utilization | Order hours / horizon, per unit |
//! | Grade Changes | Runs after the first, summed over units |

use std::collections::BTreeMap;

use crate::models::{Plan, Plant, UnitId};

/// Plan performance indicators.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanKpi {
    pub revenue: f64,
    pub manufacturing_cost: f64,
    /// Revenue minus manufacturing cost; negative when units idle to the
    /// horizon.
    pub benefit: f64,
    /// Sum of assignment benefits (excludes idle and padding hours). Never
    /// negative for a plan built by the scheduler.
    pub committed_benefit: f64,
    /// Firm orders assigned.
    pub orders_completed: usize,
    /// Firm orders left unassigned.
    pub orders_pending: usize,
    /// Fraction of firm tonnage produced (0.0..1.0).
    pub fill_rate: f64,
    /// Per-unit share of the horizon spent on orders.
    pub utilization_by_unit: BTreeMap<UnitId, f64>,
    /// Average unit utilization (0.0..1.0).
    pub avg_utilization: f64,
    pub grade_changes: usize,
}

impl PlanKpi {
    /// Computes KPIs for `plan` on `plant`.
    pub fn calculate(plan: &Plan, plant: &Plant) -> Self {
        let revenue = plan.total_revenue();
        let manufacturing_cost = plan.manufacturing_cost(plant);

        let firm = &plant.orders.firm;
        let completed_tons: f64 = plan
            .orders_completed
            .iter()
            .filter_map(|id| firm.get(id))
            .map(|o| o.tons)
            .sum();
        let firm_tons = plant.orders.firm_tons();
        let fill_rate = if firm_tons > 0.0 {
            completed_tons / firm_tons
        } else {
            1.0
        };
        let orders_completed = plan
            .orders_completed
            .iter()
            .filter(|id| firm.contains_key(*id))
            .count();

        let utilization_by_unit: BTreeMap<UnitId, f64> = plan
            .orders_plan
            .iter()
            .map(|(&unit, assignments)| {
                let busy: f64 = assignments.iter().map(|a| a.duration()).sum();
                let share = if plan.horizon > 0.0 {
                    busy / plan.horizon
                } else {
                    0.0
                };
                (unit, share)
            })
            .collect();
        let avg_utilization = if utilization_by_unit.is_empty() {
            0.0
        } else {
            utilization_by_unit.values().sum::<f64>() / utilization_by_unit.len() as f64
        };

        Self {
            revenue,
            manufacturing_cost,
            benefit: revenue - manufacturing_cost,
            committed_benefit: plan.committed_benefit(),
            orders_completed,
            orders_pending: firm.len() - orders_completed,
            fill_rate,
            utilization_by_unit,
            avg_utilization,
            grade_changes: plan.grade_change_count(),
        }
    }

    /// Whether the plan meets the given quality thresholds.
    pub fn meets_thresholds(&self, min_fill_rate: f64, min_benefit: f64) -> bool {
        self.fill_rate >= min_fill_rate && self.benefit >= min_benefit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GradeRun, Order, OrderAssignment};

    fn assignment(id: &str, grade: usize, start: f64, end: f64, revenue: f64) -> OrderAssignment {
        OrderAssignment {
            order_id: id.into(),
            grade,
            start,
            end,
            benefit: revenue - (end - start),
            revenue,
        }
    }

    fn sample() -> (Plan, Plant) {
        let plant = Plant::uniform(2, 2, 10.0, 1.0)
            .with_order("a", Order::new(0, 20.0, 100.0))
            .with_order("b", Order::new(1, 30.0, 90.0))
            .with_order("c", Order::new(1, 50.0, 80.0));
        let mut plan = Plan::new(10.0, 2, 2);
        plan.add_unit(
            0,
            vec![
                GradeRun { grade: 0, start: 0.0 },
                GradeRun { grade: 1, start: 2.0 },
            ],
            vec![
                assignment("a", 0, 0.0, 2.0, 70.0),
                assignment("b", 1, 2.0, 5.0, 80.0),
            ],
            &[0.0, 0.0],
        );
        (plan, plant)
    }

    #[test]
    fn test_kpi_basic() {
        let (plan, plant) = sample();
        let kpi = PlanKpi::calculate(&plan, &plant);
        assert!((kpi.revenue - 150.0).abs() < 1e-9);
        assert!((kpi.manufacturing_cost - 10.0).abs() < 1e-9);
        assert!((kpi.benefit - 140.0).abs() < 1e-9);
        assert!((kpi.committed_benefit - 145.0).abs() < 1e-9);
        assert_eq!(kpi.orders_completed, 2);
        assert_eq!(kpi.orders_pending, 1);
        assert!((kpi.fill_rate - 0.5).abs() < 1e-9);
        assert_eq!(kpi.grade_changes, 1);
    }

    #[test]
    fn test_kpi_utilization() {
        let (plan, plant) = sample();
        let kpi = PlanKpi::calculate(&plan, &plant);
        assert!((kpi.utilization_by_unit[&0] - 0.5).abs() < 1e-9);
        assert!(kpi.utilization_by_unit[&1].abs() < 1e-9);
        assert!((kpi.avg_utilization - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_kpi_empty() {
        let plant = Plant::uniform(1, 1, 10.0, 1.0);
        let kpi = PlanKpi::calculate(&Plan::new(24.0, 1, 1), &plant);
        assert!((kpi.fill_rate - 1.0).abs() < 1e-9);
        assert_eq!(kpi.orders_completed, 0);
        assert!(kpi.avg_utilization.abs() < 1e-9);
    }

    #[test]
    fn test_meets_thresholds() {
        let (plan, plant) = sample();
        let kpi = PlanKpi::calculate(&plan, &plant);
        assert!(kpi.meets_thresholds(0.5, 100.0));
        assert!(!kpi.meets_thresholds(0.9, 100.0));
    }
}
