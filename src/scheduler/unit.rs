//! Per-unit constructive scheduler.
//!
//! Each production unit is driven by its own [`UnitScheduler`], a state
//! machine that walks forward in time choosing what to produce next.
//!
//! # States
//!
//! ```text
//! Initial ──commit──▶ Running(g) ──commit──▶ Running(g') ──...──▶ Complete
//! ```
//!
//! # Step
//!
//! 1. [`propose_best`](UnitScheduler::propose_best): while the transition
//!    lock is active only the current grade is considered, otherwise every
//!    grade the transition oracle admits. Each candidate grade gets an
//!    order group (see [`super::grouping`]); the best group ratio wins.
//! 2. [`commit`](UnitScheduler::commit): credits leftover stock, updates
//!    the ramp-up and lock timers, records the grade run and the order
//!    assignments, and advances the clock.
//!
//! A unit completes when its clock reaches the horizon, when it commits an
//! unprofitable proposal, or when it has nothing left to propose.
//!
//! # Hourly Granularity
//! Grade runs end on whole hours: switching away from a grade rounds the
//! clock up to the next hour and credits the extra output to stock.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use super::grouping::{select_order_group, GroupRequest, OrderGroup};
use crate::config::{InitialStockPolicy, SchedulerConfig};
use crate::models::{
    GradeId, GradeRun, Order, OrderAssignment, OrderId, Plan, Plant, UnitId,
};

/// Floating-point slack for timer and horizon comparisons (hours).
const TIME_SLACK: f64 = 1e-9;

/// Lifecycle of a unit scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitPhase {
    /// No grade produced yet.
    Initial,
    /// Producing the given grade.
    Running(GradeId),
    /// Finished; proposes nothing further.
    Complete,
}

/// Why a unit stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The clock reached the horizon.
    Horizon,
    /// The best proposal lost money.
    Unprofitable,
    /// No grade had an order that fits.
    NoCandidates,
}

/// Where a proposed run and its orders start, and what stock it credits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Changeover {
    /// Start of the grade run.
    pub run_start: f64,
    /// Start of the first order (later than `run_start` after a stock top-up).
    pub orders_start: f64,
    /// Tons credited to a grade's stock: the leftover hour of the previous
    /// grade, or the top-up of the new one.
    pub stock_credit: Option<(GradeId, f64)>,
}

/// A unit's best next move.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    /// Proposing unit.
    pub unit: UnitId,
    /// Grade to produce.
    pub grade: GradeId,
    /// Orders to produce.
    pub group: OrderGroup,
    /// Timing and stock effects of starting the group.
    pub changeover: Changeover,
}

impl Proposal {
    /// Group benefit per hour.
    #[inline]
    pub fn ratio(&self) -> f64 {
        self.group.ratio
    }
}

/// Rounds up to a whole hour, ignoring floating-point noise.
pub(crate) fn ceil_hour(time: f64) -> f64 {
    let nearest = time.round();
    if (time - nearest).abs() < TIME_SLACK {
        nearest
    } else {
        time.ceil()
    }
}

/// Constructive scheduler for one unit.
#[derive(Debug, Clone)]
pub struct UnitScheduler<'a> {
    plant: &'a Plant,
    unit: UnitId,
    config: SchedulerConfig,
    /// Firm orders per grade, ascending id.
    orders_by_grade: BTreeMap<GradeId, Vec<(&'a OrderId, &'a Order)>>,
    /// Orders taken by any unit.
    excluded: BTreeSet<OrderId>,
    clock: f64,
    phase: UnitPhase,
    stop_reason: Option<StopReason>,
    stocks: Vec<f64>,
    ramp_left: f64,
    lock_left: f64,
    grade_runs: Vec<GradeRun>,
    assignments: Vec<OrderAssignment>,
}

impl<'a> UnitScheduler<'a> {
    /// Creates the scheduler for `unit` at time 0 with no grade.
    pub fn new(plant: &'a Plant, unit: UnitId, config: SchedulerConfig) -> Self {
        let orders_by_grade = plant
            .orders
            .firm_by_grade()
            .into_iter()
            .map(|(grade, ids)| {
                let refs = ids
                    .iter()
                    .filter_map(|id| plant.orders.firm.get_key_value(id.as_str()))
                    .collect();
                (grade, refs)
            })
            .collect();

        Self {
            plant,
            unit,
            config,
            orders_by_grade,
            excluded: BTreeSet::new(),
            clock: 0.0,
            phase: UnitPhase::Initial,
            stop_reason: None,
            stocks: vec![0.0; plant.n_grades()],
            ramp_left: 0.0,
            lock_left: 0.0,
            grade_runs: Vec::new(),
            assignments: Vec::new(),
        }
    }

    /// Unit index.
    pub fn unit(&self) -> UnitId {
        self.unit
    }

    /// Current time (hours).
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Current phase.
    pub fn phase(&self) -> UnitPhase {
        self.phase
    }

    /// Grade currently produced.
    pub fn current_grade(&self) -> Option<GradeId> {
        match self.phase {
            UnitPhase::Running(grade) => Some(grade),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase == UnitPhase::Complete
    }

    /// Why the unit completed, once it has.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Stock built per grade (tons).
    pub fn stocks(&self) -> &[f64] {
        &self.stocks
    }

    /// Hours of ramp-up window left on the current grade.
    pub fn ramp_left(&self) -> f64 {
        self.ramp_left
    }

    /// Hours before another grade change is allowed.
    pub fn lock_left(&self) -> f64 {
        self.lock_left
    }

    pub fn grade_runs(&self) -> &[GradeRun] {
        &self.grade_runs
    }

    pub fn assignments(&self) -> &[OrderAssignment] {
        &self.assignments
    }

    /// Removes orders from this unit's candidates.
    pub fn exclude<'b>(&mut self, order_ids: impl IntoIterator<Item = &'b OrderId>) {
        self.excluded.extend(order_ids.into_iter().cloned());
    }

    /// Open firm orders of `grade`, ascending id.
    fn open_orders(&self, grade: GradeId) -> impl Iterator<Item = (&'a OrderId, &'a Order)> + '_ {
        self.orders_by_grade
            .get(&grade)
            .into_iter()
            .flatten()
            .copied()
            .filter(|(id, _)| !self.excluded.contains(*id))
    }

    /// Timing and stock effects of producing `grade` next.
    fn changeover(&self, grade: GradeId) -> Changeover {
        let clock = self.clock;
        match self.phase {
            UnitPhase::Running(prev) if prev != grade => {
                let start = ceil_hour(clock);
                let leftover = (start - clock) * self.plant.flow(prev, self.unit);
                Changeover {
                    run_start: start,
                    orders_start: start,
                    stock_credit: (leftover > 0.0).then_some((prev, leftover)),
                }
            }
            UnitPhase::Initial if self.config.initial_stock_policy == InitialStockPolicy::TopUp => {
                let flow = self.plant.flow(grade, self.unit);
                let deficit = (self.plant.min_stock(grade) - self.stocks[grade]).max(0.0);
                if deficit <= 0.0 {
                    return Changeover {
                        run_start: clock,
                        orders_start: clock,
                        stock_credit: None,
                    };
                }
                let orders_start = ceil_hour(clock + deficit / flow);
                Changeover {
                    run_start: clock,
                    orders_start,
                    stock_credit: Some((grade, (orders_start - clock) * flow)),
                }
            }
            _ => Changeover {
                run_start: clock,
                orders_start: clock,
                stock_credit: None,
            },
        }
    }

    /// Best next grade and order group, or `None` if nothing fits.
    ///
    /// The proposal may carry a negative benefit; committing it stops the
    /// unit.
    pub fn propose_best(&self) -> Option<Proposal> {
        let current = match self.phase {
            UnitPhase::Complete => return None,
            UnitPhase::Initial => None,
            UnitPhase::Running(grade) => Some(grade),
        };
        let candidates = match current {
            Some(grade) if self.lock_left > TIME_SLACK => vec![grade],
            _ => self
                .plant
                .possible_transitions(self.clock, self.unit, current),
        };

        let horizon = self.config.horizon_hours;
        let mut best: Option<Proposal> = None;
        for grade in candidates {
            let changeover = self.changeover(grade);
            let available = horizon - changeover.orders_start;
            if available <= TIME_SLACK {
                continue;
            }
            let (ramp_left, min_time) = if current == Some(grade) {
                (self.ramp_left, self.lock_left)
            } else {
                (self.config.ramp.window_hours, self.plant.min_run(grade))
            };
            let request = GroupRequest {
                unit: self.unit,
                ramp_left,
                min_time,
                available,
            };
            let Some(group) =
                select_order_group(self.plant, self.open_orders(grade), request, &self.config.ramp)
            else {
                continue;
            };
            if best.as_ref().is_none_or(|b| group.ratio > b.ratio()) {
                best = Some(Proposal {
                    unit: self.unit,
                    grade,
                    group,
                    changeover,
                });
            }
        }

        if let Some(p) = &best {
            debug!(
                unit = self.unit,
                grade = p.grade,
                ratio = p.ratio(),
                orders = p.group.orders.len(),
                "best proposal"
            );
        }
        best
    }

    /// Applies a proposal from [`propose_best`](Self::propose_best).
    ///
    /// Returns the ids of the orders now assigned to this unit; empty if
    /// the proposal was unprofitable, the unit is already complete, or the
    /// proposal no longer matches the unit's state. A stale proposal is
    /// skipped and leaves the unit unchanged.
    pub fn commit(&mut self, proposal: &Proposal) -> Vec<OrderId> {
        if self.is_complete() {
            return Vec::new();
        }
        if let Err(reason) = self.check_current(proposal) {
            warn!(unit = self.unit, grade = proposal.grade, reason, "skipping stale proposal");
            return Vec::new();
        }
        if proposal.group.benefit < 0.0 {
            self.stop(StopReason::Unprofitable);
            return Vec::new();
        }

        let horizon = self.config.horizon_hours;
        let grade = proposal.grade;
        let group = &proposal.group;
        let changeover = proposal.changeover;

        if let Some((stock_grade, tons)) = changeover.stock_credit {
            self.stocks[stock_grade] += tons;
        }
        if changeover.orders_start >= horizon {
            self.clock = horizon;
            self.stop(StopReason::Horizon);
            return Vec::new();
        }

        if self.current_grade() == Some(grade) {
            self.ramp_left = (self.ramp_left - group.time).max(0.0);
            self.lock_left = settle(self.lock_left - group.time);
        } else {
            let flow = self.plant.flow(grade, self.unit);
            let stock_build = (self.plant.min_stock(grade) - self.stocks[grade]).max(0.0) / flow;
            self.ramp_left = (self.config.ramp.window_hours - group.time).max(0.0);
            self.lock_left = settle(self.plant.min_run(grade).max(stock_build) - group.time);
            self.grade_runs.push(GradeRun {
                grade,
                start: changeover.run_start,
            });
        }

        let mut start = changeover.orders_start;
        let mut assigned = Vec::with_capacity(group.orders.len());
        for order in &group.orders {
            self.assignments.push(OrderAssignment {
                order_id: order.order_id.clone(),
                grade,
                start,
                end: start + order.time,
                benefit: order.benefit,
                revenue: order.revenue,
            });
            start += order.time;
            assigned.push(order.order_id.clone());
        }
        self.excluded.extend(assigned.iter().cloned());

        self.clock = (changeover.orders_start + group.time).min(horizon);
        self.phase = UnitPhase::Running(grade);

        debug!(
            unit = self.unit,
            grade,
            start = changeover.orders_start,
            clock = self.clock,
            orders = assigned.len(),
            benefit = group.benefit,
            "committed order group"
        );

        if self.clock >= horizon - TIME_SLACK {
            self.stop(StopReason::Horizon);
        }
        assigned
    }

    /// Whether `proposal` could have come from `propose_best` right now.
    fn check_current(&self, proposal: &Proposal) -> Result<(), &'static str> {
        if proposal.unit != self.unit {
            return Err("proposal is for another unit");
        }
        if proposal.changeover != self.changeover(proposal.grade) {
            return Err("proposal was built at another clock or grade");
        }
        let locked_out = matches!(
            self.phase,
            UnitPhase::Running(current) if current != proposal.grade && self.lock_left > TIME_SLACK
        );
        if locked_out {
            return Err("grade change while locked");
        }
        if proposal.group.order_ids().any(|id| self.excluded.contains(id)) {
            return Err("proposal holds an order already taken");
        }
        Ok(())
    }

    /// Marks the unit complete.
    pub fn stop(&mut self, reason: StopReason) {
        if self.is_complete() {
            return;
        }
        self.phase = UnitPhase::Complete;
        self.stop_reason = Some(reason);
        info!(
            unit = self.unit,
            ?reason,
            clock = self.clock,
            orders = self.assignments.len(),
            "unit complete"
        );
    }

    /// Moves this unit's records into `plan`.
    pub fn record_into(self, plan: &mut Plan) {
        plan.add_unit(self.unit, self.grade_runs, self.assignments, &self.stocks);
    }
}

/// Floors a timer at zero, absorbing floating-point noise.
fn settle(hours: f64) -> f64 {
    if hours > TIME_SLACK {
        hours
    } else {
        0.0
    }
}
