//! Greedy order-group selection.
//!
//! After a grade change a unit owes a minimum run time. The orders that
//! fill that time are chosen together as a *group*, greedily by benefit
//! per hour.
//!
//! # Algorithm
//!
//! 1. With no minimum time, the group is the single best-ratio order.
//! 2. Otherwise, repeatedly take the best-ratio remaining order, shrink the
//!    ramp-up budget by that order's duration, and re-price the rest, until
//!    the group covers the minimum or no candidate is left.
//! 3. Orders are never split. A group that falls short of the minimum is
//!    padded to it (idle run time earns nothing), and its ratio is taken
//!    over the padded time.
//!
//! Orders that would not finish within the available time are never
//! candidates, and padding stops at the available time.
//!
//! Candidates are scanned in the order given; ties keep the first.

use crate::economics::{order_benefit, OrderEconomics, RampPricing};
use crate::models::{Order, OrderId, Plant, UnitId};

/// One order inside a group, priced at the moment it was picked.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedOrder {
    /// Order identifier.
    pub order_id: OrderId,
    /// Benefit per hour when picked.
    pub ratio: f64,
    /// Production time (hours).
    pub time: f64,
    /// Revenue minus manufacturing cost.
    pub benefit: f64,
    /// Revenue after ramp-up pricing.
    pub revenue: f64,
}

/// A batch of same-grade orders committed together.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderGroup {
    /// Orders in production sequence.
    pub orders: Vec<GroupedOrder>,
    /// Aggregate benefit per (padded) hour.
    pub ratio: f64,
    /// Run time the group occupies, including padding (hours).
    pub time: f64,
    /// Aggregate benefit.
    pub benefit: f64,
    /// Aggregate revenue.
    pub revenue: f64,
}

impl OrderGroup {
    fn single(order_id: &OrderId, econ: OrderEconomics) -> Self {
        Self {
            orders: vec![GroupedOrder::new(order_id, econ)],
            ratio: econ.ratio,
            time: econ.time,
            benefit: econ.benefit,
            revenue: econ.revenue,
        }
    }

    /// Ids of the orders in the group.
    pub fn order_ids(&self) -> impl Iterator<Item = &OrderId> {
        self.orders.iter().map(|o| &o.order_id)
    }

    /// Production time of the orders themselves, excluding padding.
    pub fn production_time(&self) -> f64 {
        self.orders.iter().map(|o| o.time).sum()
    }
}

impl GroupedOrder {
    fn new(order_id: &OrderId, econ: OrderEconomics) -> Self {
        Self {
            order_id: order_id.clone(),
            ratio: econ.ratio,
            time: econ.time,
            benefit: econ.benefit,
            revenue: econ.revenue,
        }
    }
}

/// Parameters of a single group selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupRequest {
    /// Unit that would produce the group.
    pub unit: UnitId,
    /// Hours of ramp-up window left when the group starts.
    pub ramp_left: f64,
    /// Minimum run time the group must cover (0 = no minimum).
    pub min_time: f64,
    /// Hours available before the horizon.
    pub available: f64,
}

/// Selects the best order group among `candidates`.
///
/// Returns `None` if no candidate fits in the available time.
pub fn select_order_group<'a>(
    plant: &Plant,
    candidates: impl IntoIterator<Item = (&'a OrderId, &'a Order)>,
    request: GroupRequest,
    pricing: &RampPricing,
) -> Option<OrderGroup> {
    let mut pool: Vec<(&OrderId, &Order)> = candidates.into_iter().collect();

    if request.min_time <= 0.0 {
        let (idx, econ) = best_candidate(plant, &pool, request.unit, request.ramp_left, request.available, pricing)?;
        return Some(OrderGroup::single(pool[idx].0, econ));
    }

    let mut ramp_left = request.ramp_left;
    let mut orders = Vec::new();
    let mut time = 0.0;
    let mut benefit = 0.0;
    let mut revenue = 0.0;

    while time < request.min_time {
        let capacity = request.available - time;
        let Some((idx, econ)) = best_candidate(plant, &pool, request.unit, ramp_left, capacity, pricing)
        else {
            break;
        };
        let (order_id, _) = pool.remove(idx);
        orders.push(GroupedOrder::new(order_id, econ));
        time += econ.time;
        benefit += econ.benefit;
        revenue += econ.revenue;
        ramp_left = (ramp_left - econ.time).max(0.0);
    }

    if orders.is_empty() {
        return None;
    }

    let padded = time.max(request.min_time.min(request.available));
    Some(OrderGroup {
        orders,
        ratio: benefit / padded,
        time: padded,
        benefit,
        revenue,
    })
}

/// Best-ratio candidate that fits in `capacity` hours.
fn best_candidate(
    plant: &Plant,
    pool: &[(&OrderId, &Order)],
    unit: UnitId,
    ramp_left: f64,
    capacity: f64,
    pricing: &RampPricing,
) -> Option<(usize, OrderEconomics)> {
    let mut best: Option<(usize, OrderEconomics)> = None;
    for (idx, (_, order)) in pool.iter().enumerate() {
        let econ = order_benefit(plant, order, unit, ramp_left, pricing);
        if econ.time > capacity + 1e-9 {
            continue;
        }
        if best.is_none_or(|(_, b)| econ.ratio > b.ratio) {
            best = Some((idx, econ));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plant() -> Plant {
        Plant::uniform(1, 1, 10.0, 1.0)
    }

    fn request(min_time: f64) -> GroupRequest {
        GroupRequest {
            unit: 0,
            ramp_left: 3.0,
            min_time,
            available: 100.0,
        }
    }

    fn book(entries: &[(&str, f64, f64)]) -> Vec<(OrderId, Order)> {
        entries
            .iter()
            .map(|&(id, tons, price)| (id.to_string(), Order::new(0, tons, price)))
            .collect()
    }

    fn refs(orders: &[(OrderId, Order)]) -> impl Iterator<Item = (&OrderId, &Order)> {
        orders.iter().map(|(id, o)| (id, o))
    }

    fn ids(group: &OrderGroup) -> Vec<&str> {
        group.order_ids().map(String::as_str).collect()
    }

    #[test]
    fn test_single_best_without_minimum() {
        let orders = book(&[("a", 20.0, 100.0), ("b", 20.0, 150.0), ("c", 10.0, 40.0)]);
        let group = select_order_group(&plant(), refs(&orders), request(0.0), &RampPricing::default()).unwrap();
        assert_eq!(ids(&group), vec!["b"]);
        // 2 h fully penalized: 105 revenue, 2 cost
        assert!((group.time - 2.0).abs() < 1e-9);
        assert!((group.benefit - 103.0).abs() < 1e-9);
        assert!((group.ratio - 51.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_candidates() {
        let orders = book(&[]);
        assert!(select_order_group(&plant(), refs(&orders), request(0.0), &RampPricing::default()).is_none());
        assert!(select_order_group(&plant(), refs(&orders), request(5.0), &RampPricing::default()).is_none());
    }

    #[test]
    fn test_group_fills_minimum_time() {
        // Each order 2 h; a 5 h minimum needs three of them (6 h, overshoot allowed).
        let orders = book(&[
            ("a", 20.0, 100.0),
            ("b", 20.0, 110.0),
            ("c", 20.0, 120.0),
            ("d", 20.0, 90.0),
        ]);
        let group = select_order_group(&plant(), refs(&orders), request(5.0), &RampPricing::default()).unwrap();
        assert_eq!(ids(&group), vec!["c", "b", "a"]);
        assert!((group.time - 6.0).abs() < 1e-9);
        assert!((group.production_time() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_ramp_budget_shrinks_by_order_time() {
        // c (2 h) takes 2 h of the 3 h window; b then gets 1 h penalized, a none.
        let orders = book(&[("a", 20.0, 100.0), ("b", 20.0, 110.0), ("c", 20.0, 120.0)]);
        let group = select_order_group(&plant(), refs(&orders), request(6.0), &RampPricing::default()).unwrap();
        let c = &group.orders[0];
        let b = &group.orders[1];
        let a = &group.orders[2];
        assert!((c.revenue - 120.0 * 0.7).abs() < 1e-9);
        assert!((b.revenue - 110.0 * 0.85).abs() < 1e-9);
        assert!((a.revenue - 100.0).abs() < 1e-9);
        let expected_revenue = 84.0 + 93.5 + 100.0;
        assert!((group.revenue - expected_revenue).abs() < 1e-9);
        assert!((group.benefit - (expected_revenue - 6.0)).abs() < 1e-9);
    }

    #[test]
    fn test_short_group_is_padded() {
        // One 2 h order against a 5 h minimum: ratio spread over 5 h.
        let orders = book(&[("a", 20.0, 100.0)]);
        let group = select_order_group(&plant(), refs(&orders), request(5.0), &RampPricing::default()).unwrap();
        assert!((group.time - 5.0).abs() < 1e-9);
        assert!((group.production_time() - 2.0).abs() < 1e-9);
        assert!((group.benefit - 68.0).abs() < 1e-9);
        assert!((group.ratio - 68.0 / 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_orders_must_fit_available_time() {
        let orders = book(&[("big", 100.0, 1000.0), ("small", 10.0, 20.0)]);
        let mut req = request(0.0);
        req.available = 5.0;
        let group = select_order_group(&plant(), refs(&orders), req, &RampPricing::default()).unwrap();
        assert_eq!(ids(&group), vec!["small"]);

        req.available = 0.5;
        assert!(select_order_group(&plant(), refs(&orders), req, &RampPricing::default()).is_none());
    }

    #[test]
    fn test_padding_capped_at_available() {
        let orders = book(&[("a", 20.0, 100.0)]);
        let mut req = request(8.0);
        req.available = 4.0;
        let group = select_order_group(&plant(), refs(&orders), req, &RampPricing::default()).unwrap();
        assert!((group.time - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_tie_keeps_first_candidate() {
        let orders = book(&[("x", 20.0, 100.0), ("y", 20.0, 100.0)]);
        let group = select_order_group(&plant(), refs(&orders), request(0.0), &RampPricing::default()).unwrap();
        assert_eq!(ids(&group), vec!["x"]);
    }
}
