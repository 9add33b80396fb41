//! Greedy production schedulers and KPI evaluation.
//!
//! Provides the per-unit constructive scheduler, the cross-unit
//! coordinator, and plan quality metrics.
//!
//! # Algorithm
//!
//! Each unit greedily picks the grade and order group with the highest
//! benefit per hour it can legally produce next. The [`PlantScheduler`]
//! arbitrates between units so that every firm order is produced at most
//! once. It is not optimal, but it always yields a feasible plan.
//!
//! # KPI
//!
//! [`PlanKpi`] reports revenue, manufacturing cost, benefit, fill rate,
//! utilization and grade changes.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4
//! - Kallrath (2002), "Planning and scheduling in the process industry"

mod coordinator;
mod grouping;
mod kpi;
mod unit;

pub use coordinator::{schedule, PlantScheduler};
pub use grouping::{select_order_group, GroupRequest, GroupedOrder, OrderGroup};
pub use kpi::PlanKpi;
pub use unit::{Changeover, Proposal, StopReason, UnitPhase, UnitScheduler};
