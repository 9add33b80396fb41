//! Seeded random plant data.
//!
//! Produces [`PlantData`] instances for benchmarks, demos and end-to-end
//! tests. The same seed always yields the same data, and the data always
//! passes [`validate_plant_data`](crate::validation::validate_plant_data).
//!
//! # Defaults
//!
//! | Parameter | Default |
//! |-----------|---------|
//! | Grades × units | 20 × 3 |
//! | Flow rate | 1–10 t/h |
//! | Cost rate | 1–11 $/h |
//! | Forbidden successors per grade | 0–3 |
//! | Minimum run | 1–7 h |
//! | Minimum stock | 2–15 t |
//! | Only-consecutive probability | 0.25 |
//! | Orders | 100 of 5–15 t at 12–50 $ |
//! | Embargoed grades | 1–9 |
//! | Exclusive grades | 5, on unit 0 |

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;

use crate::io::PlantData;
use crate::models::{GradeId, Order, OrderBook, UnitId, DEFAULT_EMBARGO_DAYS, DEFAULT_INTERVALS_PER_DAY};

/// Parameters of a random plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomPlantSpec {
    pub n_grades: usize,
    pub n_units: usize,
    /// Flow rate range (t/h).
    pub flow: Range<f64>,
    /// Cost rate range ($/h).
    pub cost: Range<f64>,
    /// Forbidden successors per grade are drawn from `0..max_forbidden`.
    pub max_forbidden: usize,
    /// Minimum run range (h).
    pub min_run: Range<f64>,
    /// Minimum stock range (t).
    pub min_stock: Range<f64>,
    /// Chance that a grade gets a required successor.
    pub only_consecutive_p: f64,
    pub n_orders: usize,
    /// Order size range (t).
    pub order_tons: Range<f64>,
    /// Order price range ($).
    pub order_price: Range<f64>,
    /// Embargoed grade count is drawn from `1..max_embargoed`.
    pub max_embargoed: usize,
    pub n_exclusive: usize,
    pub exclusive_unit: UnitId,
}

impl Default for RandomPlantSpec {
    fn default() -> Self {
        Self {
            n_grades: 20,
            n_units: 3,
            flow: 1.0..10.0,
            cost: 1.0..11.0,
            max_forbidden: 4,
            min_run: 1.0..7.0,
            min_stock: 2.0..15.0,
            only_consecutive_p: 0.25,
            n_orders: 100,
            order_tons: 5.0..15.0,
            order_price: 12.0..50.0,
            max_embargoed: 10,
            n_exclusive: 5,
            exclusive_unit: 0,
        }
    }
}

impl RandomPlantSpec {
    /// Sets the plant size.
    pub fn with_size(mut self, n_grades: usize, n_units: usize) -> Self {
        self.n_grades = n_grades;
        self.n_units = n_units;
        self
    }

    /// Sets the number of firm orders.
    pub fn with_orders(mut self, n_orders: usize) -> Self {
        self.n_orders = n_orders;
        self
    }

    /// Generates plant data from `seed`.
    pub fn generate(&self, seed: u64) -> PlantData {
        let mut rng = StdRng::seed_from_u64(seed);
        let n_grades = self.n_grades;
        let cells = n_grades * self.n_units;

        let prod_flow = draw_many(&mut rng, &self.flow, cells);
        let man_cost = draw_many(&mut rng, &self.cost, cells);
        let not_allowed_transitions = self.forbidden_transitions(&mut rng);
        let t_min = draw_many(&mut rng, &self.min_run, n_grades);
        let s_min = draw_many(&mut rng, &self.min_stock, n_grades);
        let only_consecutive = self.only_consecutive(&mut rng);
        let only_predecessor = only_consecutive.iter().map(|(&p, &g)| (g, p)).collect();

        let mut orders = OrderBook::new();
        if n_grades > 0 {
            for i in 0..self.n_orders {
                let tons = draw(&mut rng, &self.order_tons);
                let price = draw(&mut rng, &self.order_price);
                let priority = rng.random::<f64>();
                let grade = rng.random_range(0..n_grades);
                orders
                    .firm
                    .insert(i.to_string(), Order::new(grade, tons, price).with_priority(priority));
            }
        }

        let n_embargoed = if self.max_embargoed > 1 {
            rng.random_range(1..self.max_embargoed).min(n_grades)
        } else {
            0
        };
        let mut grades_after_10_days = sample(&mut rng, n_grades, n_embargoed).into_vec();
        grades_after_10_days.sort_unstable();

        let n_exclusive = self.n_exclusive.min(n_grades);
        let mut unique_grades = sample(&mut rng, n_grades, n_exclusive).into_vec();
        unique_grades.sort_unstable();

        PlantData {
            n_grades,
            n_units: self.n_units,
            prod_flow,
            man_cost,
            not_allowed_transitions,
            unique_grades,
            unique_unit: self.exclusive_unit,
            s_min,
            t_min,
            only_consecutive,
            only_predecessor: Some(only_predecessor),
            grades_after_10_days,
            orders,
            intervals_per_day: DEFAULT_INTERVALS_PER_DAY,
            embargo_days: DEFAULT_EMBARGO_DAYS,
        }
    }

    fn forbidden_transitions(&self, rng: &mut StdRng) -> BTreeMap<GradeId, Vec<GradeId>> {
        let n = self.n_grades;
        (0..n)
            .map(|grade| {
                let others: Vec<GradeId> = (0..n).filter(|&g| g != grade).collect();
                let count = if self.max_forbidden > 0 {
                    rng.random_range(0..self.max_forbidden).min(others.len())
                } else {
                    0
                };
                let mut picked: Vec<GradeId> = sample(&mut *rng, others.len(), count)
                    .into_iter()
                    .map(|i| others[i])
                    .collect();
                picked.sort_unstable();
                (grade, picked)
            })
            .collect()
    }

    /// Required successors, each grade claimed by at most one predecessor.
    fn only_consecutive(&self, rng: &mut StdRng) -> BTreeMap<GradeId, GradeId> {
        let n = self.n_grades;
        let mut successors: BTreeMap<GradeId, GradeId> = BTreeMap::new();
        for grade in 0..n {
            if rng.random::<f64>() >= self.only_consecutive_p {
                continue;
            }
            let free: Vec<GradeId> = (0..n)
                .filter(|&g| g != grade && !successors.values().any(|&s| s == g))
                .collect();
            if let Some(&next) = free.choose(&mut *rng) {
                successors.insert(grade, next);
            }
        }
        successors
    }
}

fn draw(rng: &mut StdRng, range: &Range<f64>) -> f64 {
    if range.start < range.end {
        rng.random_range(range.clone())
    } else {
        range.start
    }
}

fn draw_many(rng: &mut StdRng, range: &Range<f64>, n: usize) -> Vec<f64> {
    (0..n).map(|_| draw(rng, range)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_plant_data;
    use std::collections::BTreeSet;

    #[test]
    fn test_default_shape() {
        let data = RandomPlantSpec::default().generate(1);
        assert_eq!(data.n_grades, 20);
        assert_eq!(data.n_units, 3);
        assert_eq!(data.prod_flow.len(), 60);
        assert_eq!(data.man_cost.len(), 60);
        assert_eq!(data.t_min.len(), 20);
        assert_eq!(data.orders.firm.len(), 100);
        assert_eq!(data.unique_grades.len(), 5);
        assert!((1..10).contains(&data.grades_after_10_days.len()));
    }

    #[test]
    fn test_values_in_range() {
        let spec = RandomPlantSpec::default();
        let data = spec.generate(2);
        assert!(data.prod_flow.iter().all(|f| spec.flow.contains(f)));
        assert!(data.man_cost.iter().all(|c| spec.cost.contains(c)));
        assert!(data.orders.firm.values().all(|o| {
            spec.order_tons.contains(&o.tons) && spec.order_price.contains(&o.price) && o.grade < 20
        }));
        assert!(data.not_allowed_transitions.values().all(|v| v.len() <= 3));
        for (grade, forbidden) in &data.not_allowed_transitions {
            assert!(!forbidden.contains(grade));
        }
    }

    #[test]
    fn test_generated_data_is_valid() {
        for seed in 0..20 {
            let data = RandomPlantSpec::default().generate(seed);
            assert!(validate_plant_data(&data).is_ok(), "seed {seed}");
            let successors: BTreeSet<_> = data.only_consecutive.values().collect();
            assert_eq!(successors.len(), data.only_consecutive.len());
        }
    }

    #[test]
    fn test_seed_determinism() {
        let spec = RandomPlantSpec::default();
        assert_eq!(spec.generate(5), spec.generate(5));
        assert_ne!(spec.generate(5), spec.generate(6));
    }

    #[test]
    fn test_small_plant() {
        let data = RandomPlantSpec::default().with_size(2, 1).with_orders(4).generate(3);
        assert_eq!(data.unique_grades.len(), 2);
        assert!(data.grades_after_10_days.len() <= 2);
        assert_eq!(data.orders.firm.len(), 4);
        assert!(validate_plant_data(&data).is_ok());
    }
}
