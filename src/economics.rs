//! Order economics.
//!
//! Pure functions pricing the production of an order on a unit: how long
//! it takes, what it costs, what it earns after ramp-up pricing, and its
//! benefit per hour (the greedy scoring key).
//!
//! # Ramp-up Pricing
//! For the first `window_hours` after a grade change, output sells at
//! `penalty_factor` of list price. An order straddling the end of the
//! window is priced pro rata:
//!
//! ```text
//! revenue = price * (penalty * t_low / t + (t - t_low) / t),   t_low = min(ramp_left, t)
//! ```

use serde::{Deserialize, Serialize};

use crate::models::{GradeId, Order, Plant, UnitId};

/// Ramp-up pricing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RampPricing {
    /// Hours after a grade change sold at the penalized price.
    pub window_hours: f64,
    /// Fraction of list price earned inside the window.
    pub penalty_factor: f64,
}

impl Default for RampPricing {
    fn default() -> Self {
        Self {
            window_hours: 3.0,
            penalty_factor: 0.7,
        }
    }
}

impl RampPricing {
    /// Creates ramp pricing with the given window and penalty.
    pub fn new(window_hours: f64, penalty_factor: f64) -> Self {
        Self {
            window_hours,
            penalty_factor,
        }
    }

    /// Fraction of list price earned by `time` hours of production when
    /// `ramp_left` hours of the window remain.
    pub fn price_factor(&self, time: f64, ramp_left: f64) -> f64 {
        let time_low = ramp_left.max(0.0).min(time);
        let time_normal = time - time_low;
        self.penalty_factor * (time_low / time) + time_normal / time
    }
}

/// Economics of producing one order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderEconomics {
    /// Benefit per production hour.
    pub ratio: f64,
    /// Production time (hours).
    pub time: f64,
    /// Revenue minus manufacturing cost.
    pub benefit: f64,
    /// Revenue after ramp-up pricing.
    pub revenue: f64,
}

/// Time and cost to produce `tons` of `grade` on `unit`.
///
/// `time = tons / flow`, `cost = cost_rate * time`.
#[inline]
pub fn order_time_cost(plant: &Plant, tons: f64, grade: GradeId, unit: UnitId) -> (f64, f64) {
    let time = tons / plant.flow(grade, unit);
    let cost = plant.cost_rate(grade, unit) * time;
    (time, cost)
}

/// Prices `order` on `unit` with `ramp_left` hours of ramp-up window left.
///
/// Requires `order.tons > 0` and a positive flow rate; both are enforced
/// by plant validation.
///
/// # Example
/// ```
/// use u_plant_schedule::economics::{order_benefit, RampPricing};
/// use u_plant_schedule::models::{Order, Plant};
///
/// let plant = Plant::uniform(2, 1, 10.0, 1.0);
/// let order = Order::new(0, 20.0, 100.0);
/// let econ = order_benefit(&plant, &order, 0, 3.0, &RampPricing::default());
/// assert!((econ.time - 2.0).abs() < 1e-9);
/// assert!((econ.revenue - 70.0).abs() < 1e-9);
/// assert!((econ.benefit - 68.0).abs() < 1e-9);
/// assert!((econ.ratio - 34.0).abs() < 1e-9);
/// ```
pub fn order_benefit(
    plant: &Plant,
    order: &Order,
    unit: UnitId,
    ramp_left: f64,
    pricing: &RampPricing,
) -> OrderEconomics {
    let (time, cost) = order_time_cost(plant, order.tons, order.grade, unit);
    let revenue = order.price * pricing.price_factor(time, ramp_left);
    let benefit = revenue - cost;
    OrderEconomics {
        ratio: benefit / time,
        time,
        benefit,
        revenue,
    }
}
