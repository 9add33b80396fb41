//! Customer order model.
//!
//! An order asks for a tonnage of one grade at a fixed price. Orders are
//! never split: a single unit produces the whole tonnage or nobody does.
//!
//! # Categories
//! Orders arrive in two books. `firm` orders are committed demand and are
//! the only ones the scheduler consumes. `estimated` orders are forecast
//! demand carried through for reporting.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::GradeId;

/// Opaque order identifier.
pub type OrderId = String;

/// A customer order for a single grade.
///
/// Serialized as the tuple `[grade, tons, price, priority]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(GradeId, f64, f64, f64)", into = "(GradeId, f64, f64, f64)")]
pub struct Order {
    /// Grade (product type) to produce.
    pub grade: GradeId,
    /// Requested quantity (tons, > 0).
    pub tons: f64,
    /// Price paid for the whole order ($, > 0).
    pub price: f64,
    /// Customer priority. Carried, not used in scoring.
    pub priority: f64,
}

impl Order {
    /// Creates a new order with zero priority.
    pub fn new(grade: GradeId, tons: f64, price: f64) -> Self {
        Self {
            grade,
            tons,
            price,
            priority: 0.0,
        }
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }
}

impl From<(GradeId, f64, f64, f64)> for Order {
    fn from((grade, tons, price, priority): (GradeId, f64, f64, f64)) -> Self {
        Self {
            grade,
            tons,
            price,
            priority,
        }
    }
}

impl From<Order> for (GradeId, f64, f64, f64) {
    fn from(order: Order) -> Self {
        (order.grade, order.tons, order.price, order.priority)
    }
}

/// Firm and estimated orders, keyed by id.
///
/// Ordered maps keep iteration (and therefore tie-breaking) deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    /// Committed demand consumed by the scheduler.
    #[serde(default)]
    pub firm: BTreeMap<OrderId, Order>,
    /// Forecast demand. Not scheduled.
    #[serde(default)]
    pub estimated: BTreeMap<OrderId, Order>,
}

impl OrderBook {
    /// Creates an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: adds a firm order.
    pub fn with_firm(mut self, id: impl Into<OrderId>, order: Order) -> Self {
        self.firm.insert(id.into(), order);
        self
    }

    /// Builder: adds an estimated order.
    pub fn with_estimated(mut self, id: impl Into<OrderId>, order: Order) -> Self {
        self.estimated.insert(id.into(), order);
        self
    }

    /// Looks up a firm order.
    pub fn firm_order(&self, id: &str) -> Option<&Order> {
        self.firm.get(id)
    }

    /// Groups firm order ids by grade.
    pub fn firm_by_grade(&self) -> BTreeMap<GradeId, BTreeSet<OrderId>> {
        let mut by_grade: BTreeMap<GradeId, BTreeSet<OrderId>> = BTreeMap::new();
        for (id, order) in &self.firm {
            by_grade.entry(order.grade).or_default().insert(id.clone());
        }
        by_grade
    }

    /// Total firm tonnage.
    pub fn firm_tons(&self) -> f64 {
        self.firm.values().map(|o| o.tons).sum()
    }

    /// Number of firm orders.
    pub fn firm_count(&self) -> usize {
        self.firm.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_builder() {
        let order = Order::new(2, 10.0, 120.0).with_priority(0.5);
        assert_eq!(order.grade, 2);
        assert!((order.tons - 10.0).abs() < 1e-9);
        assert!((order.price - 120.0).abs() < 1e-9);
        assert!((order.priority - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_order_tuple_format() {
        let order: Order = serde_json::from_str("[1, 12.5, 40.0, 0.3]").unwrap();
        assert_eq!(order, Order::new(1, 12.5, 40.0).with_priority(0.3));

        let json = serde_json::to_string(&order).unwrap();
        assert_eq!(json, "[1,12.5,40.0,0.3]");
    }

    #[test]
    fn test_firm_by_grade() {
        let book = OrderBook::new()
            .with_firm("a", Order::new(0, 5.0, 10.0))
            .with_firm("b", Order::new(1, 5.0, 10.0))
            .with_firm("c", Order::new(0, 7.0, 10.0))
            .with_estimated("x", Order::new(1, 1.0, 1.0));

        let by_grade = book.firm_by_grade();
        assert_eq!(by_grade.len(), 2);
        assert_eq!(by_grade[&0].iter().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(by_grade[&1].len(), 1);
        assert_eq!(book.firm_count(), 3);
        assert!((book.firm_tons() - 17.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_estimated_defaults() {
        let book: OrderBook = serde_json::from_str(r#"{"firm": {"7": [0, 1.0, 2.0, 0.0]}}"#).unwrap();
        assert_eq!(book.firm_count(), 1);
        assert!(book.estimated.is_empty());
        assert!(book.firm_order("7").is_some());
    }
}
