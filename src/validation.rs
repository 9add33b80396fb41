//! Input validation and plan feasibility checks.
//!
//! Two directions:
//! - **Before planning**: [`validate_plant`] / [`validate_plant_data`] check
//!   structural integrity of the plant description. Detects:
//!   - Matrix and vector sizes that disagree with the declared counts
//!   - Non-positive flow rates, negative costs and minimums
//!   - Grade and unit references out of range
//!   - Invalid orders (non-positive tons or price, unknown grade)
//!   - Only-consecutive / only-predecessor maps that are not inverses
//! - **After planning**: [`check_plan`] audits a plan against every plant
//!   rule and reports [`Violation`]s.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::io::PlantData;
use crate::models::{GradeId, Plan, Plant, Violation, ViolationType};

/// Tolerance for comparing times in hours.
const TIME_EPSILON: f64 = 1e-6;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A matrix or vector length disagrees with the declared dimensions.
    DimensionMismatch,
    /// The plant declares no grades or no units.
    EmptyPlant,
    /// A flow rate is zero, negative or not finite.
    NonPositiveFlow,
    /// A cost, minimum run or minimum stock is negative or not finite.
    NegativeValue,
    /// A grade reference is outside `[0, n_grades)`.
    GradeOutOfRange,
    /// A unit reference is outside `[0, n_units)`.
    UnitOutOfRange,
    /// An order has non-positive tons or price.
    InvalidOrder,
    /// Succession maps are not mutual inverses, or a grade precedes itself.
    InconsistentSuccession,
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Validates a plant before scheduling.
///
/// Checks:
/// 1. At least one grade and one unit
/// 2. Flow/cost matrices hold `n_grades * n_units` cells, minimum vectors `n_grades`
/// 3. Flow rates positive and finite; costs and minimums non-negative
/// 4. Every grade referenced by the rules is in range, and the exclusive unit exists
/// 5. No grade is its own required predecessor
/// 6. Every firm and estimated order has a known grade and positive tons and price
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_plant(plant: &Plant) -> ValidationResult {
    let mut errors = Vec::new();
    let n_grades = plant.n_grades();
    let n_units = plant.n_units();

    if n_grades == 0 || n_units == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyPlant,
            format!("plant needs at least one grade and one unit (n_grades={n_grades}, n_units={n_units})"),
        ));
    }

    let cells = n_grades * n_units;
    let shapes_ok = check_len(&mut errors, "prod_flow", plant.flow_matrix().len(), cells)
        & check_len(&mut errors, "man_cost", plant.cost_matrix().len(), cells)
        & check_len(&mut errors, "t_min", plant.min_runs().len(), n_grades)
        & check_len(&mut errors, "s_min", plant.min_stocks().len(), n_grades);

    if shapes_ok {
        for grade in 0..n_grades {
            for unit in 0..n_units {
                let flow = plant.flow(grade, unit);
                if !(flow.is_finite() && flow > 0.0) {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::NonPositiveFlow,
                        format!("prod_flow[grade {grade}, unit {unit}] = {flow}"),
                    ));
                }
                check_non_negative(&mut errors, "man_cost", grade, plant.cost_rate(grade, unit));
            }
            check_non_negative(&mut errors, "t_min", grade, plant.min_run(grade));
            check_non_negative(&mut errors, "s_min", grade, plant.min_stock(grade));
        }
    }

    let rules = &plant.rules;
    for (from, set) in rules.forbidden_pairs() {
        check_grade(&mut errors, n_grades, "not_allowed_transitions", from);
        for &to in set {
            check_grade(&mut errors, n_grades, "not_allowed_transitions", to);
        }
    }
    for (grade, pred) in rules.predecessors() {
        check_grade(&mut errors, n_grades, "only_predecessor", grade);
        check_grade(&mut errors, n_grades, "only_predecessor", pred);
        if grade == pred {
            errors.push(ValidationError::new(
                ValidationErrorKind::InconsistentSuccession,
                format!("grade {grade} is its own required predecessor"),
            ));
        }
    }
    for &grade in &rules.exclusive_grades {
        check_grade(&mut errors, n_grades, "unique_grades", grade);
    }
    if !rules.exclusive_grades.is_empty() && rules.exclusive_unit >= n_units {
        errors.push(ValidationError::new(
            ValidationErrorKind::UnitOutOfRange,
            format!(
                "unique_unit {} is outside [0, {n_units})",
                rules.exclusive_unit
            ),
        ));
    }
    for &grade in &rules.embargoed {
        check_grade(&mut errors, n_grades, "grades_after_10_days", grade);
    }

    let books = [("firm", &plant.orders.firm), ("estimated", &plant.orders.estimated)];
    for (category, book) in books {
        for (id, order) in book {
            if order.grade >= n_grades {
                errors.push(ValidationError::new(
                    ValidationErrorKind::GradeOutOfRange,
                    format!("{category} order '{id}' references unknown grade {}", order.grade),
                ));
            }
            if !(order.tons.is_finite() && order.tons > 0.0) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidOrder,
                    format!("{category} order '{id}' has non-positive tons {}", order.tons),
                ));
            }
            if !(order.price.is_finite() && order.price > 0.0) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidOrder,
                    format!("{category} order '{id}' has non-positive price {}", order.price),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates raw input data: succession map consistency plus every
/// [`validate_plant`] check on the plant it describes.
pub fn validate_plant_data(data: &PlantData) -> ValidationResult {
    let mut errors = Vec::new();

    if let Some(only_predecessor) = &data.only_predecessor {
        let inverse: BTreeMap<GradeId, GradeId> = data
            .only_consecutive
            .iter()
            .map(|(&prev, &next)| (next, prev))
            .collect();
        if inverse.len() != data.only_consecutive.len() || &inverse != only_predecessor {
            errors.push(ValidationError::new(
                ValidationErrorKind::InconsistentSuccession,
                "only_predecessor is not the inverse of only_consecutive",
            ));
        }
    } else {
        let successors: BTreeSet<GradeId> = data.only_consecutive.values().copied().collect();
        if successors.len() != data.only_consecutive.len() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InconsistentSuccession,
                "two grades name the same only-consecutive successor",
            ));
        }
    }

    if let Err(mut plant_errors) = validate_plant(&data.to_plant()) {
        errors.append(&mut plant_errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_len(errors: &mut Vec<ValidationError>, field: &str, actual: usize, expected: usize) -> bool {
    if actual == expected {
        return true;
    }
    errors.push(ValidationError::new(
        ValidationErrorKind::DimensionMismatch,
        format!("{field} has {actual} entries, expected {expected}"),
    ));
    false
}

fn check_non_negative(errors: &mut Vec<ValidationError>, field: &str, grade: GradeId, value: f64) {
    if !(value.is_finite() && value >= 0.0) {
        errors.push(ValidationError::new(
            ValidationErrorKind::NegativeValue,
            format!("{field} for grade {grade} = {value}"),
        ));
    }
}

fn check_grade(errors: &mut Vec<ValidationError>, n_grades: usize, field: &str, grade: GradeId) {
    if grade >= n_grades {
        errors.push(ValidationError::new(
            ValidationErrorKind::GradeOutOfRange,
            format!("{field} references grade {grade}, outside [0, {n_grades})"),
        ));
    }
}

/// Audits a plan against the plant's rules.
///
/// Checks:
/// 1. Every order is assigned at most once and `orders_completed` matches the assignments
/// 2. Runs and assignments are time-ordered and inside `[0, horizon]`
/// 3. Each assignment lies inside a run of its own grade
/// 4. Consecutive runs respect forbidden successors and required predecessors
/// 5. Every run except a unit's last lasts at least its grade's minimum
/// 6. Exclusive grades run only on the exclusive unit
/// 7. Embargoed grades start no earlier than the embargo window end
/// 8. Committed benefit is non-negative
///
/// # Returns
/// All violations found; empty means the plan is feasible.
pub fn check_plan(plant: &Plant, plan: &Plan) -> Vec<Violation> {
    let mut violations = Vec::new();
    let rules = &plant.rules;

    // Exclusivity across units
    let mut seen = BTreeSet::new();
    for a in plan.all_assignments() {
        if !seen.insert(a.order_id.as_str()) {
            violations.push(Violation::new(
                ViolationType::DuplicateOrder,
                None,
                format!("order '{}' assigned more than once", a.order_id),
            ));
        }
    }
    let completed: BTreeSet<&str> = plan.orders_completed.iter().map(String::as_str).collect();
    if completed != seen {
        violations.push(Violation::new(
            ViolationType::DuplicateOrder,
            None,
            format!(
                "completed set has {} orders, assignments cover {}",
                completed.len(),
                seen.len()
            ),
        ));
    }

    for (&unit, runs) in &plan.grades_plan {
        let mut prev_start = 0.0;
        for (i, run) in runs.iter().enumerate() {
            if run.start < prev_start - TIME_EPSILON || run.start > plan.horizon + TIME_EPSILON {
                violations.push(Violation::new(
                    ViolationType::TimeOrder,
                    Some(unit),
                    format!("run {i} (grade {}) starts at {}", run.grade, run.start),
                ));
            }
            prev_start = run.start;

            if !rules.allowed_on_unit(run.grade, unit) {
                violations.push(Violation::new(
                    ViolationType::ExclusiveUnit,
                    Some(unit),
                    format!(
                        "grade {} is exclusive to unit {}",
                        run.grade, rules.exclusive_unit
                    ),
                ));
            }
            if rules.is_embargoed(run.grade, run.start + TIME_EPSILON) {
                violations.push(Violation::new(
                    ViolationType::Embargo,
                    Some(unit),
                    format!(
                        "grade {} starts at {} inside the embargo window",
                        run.grade, run.start
                    ),
                ));
            }

            let prev_grade = i.checked_sub(1).map(|p| runs[p].grade);
            if let Some(from) = prev_grade {
                if rules
                    .forbidden_after(from)
                    .is_some_and(|set| set.contains(&run.grade))
                {
                    violations.push(Violation::new(
                        ViolationType::IllegalTransition,
                        Some(unit),
                        format!("grade {} may not follow grade {from}", run.grade),
                    ));
                }
            }
            if let Some(pred) = rules.required_predecessor(run.grade) {
                if prev_grade != Some(pred) {
                    violations.push(Violation::new(
                        ViolationType::IllegalTransition,
                        Some(unit),
                        format!("grade {} must follow grade {pred}", run.grade),
                    ));
                }
            }

            if let Some(next) = runs.get(i + 1) {
                let elapsed = next.start - run.start;
                if elapsed < plant.min_run(run.grade) - TIME_EPSILON {
                    violations.push(Violation::new(
                        ViolationType::MinimumRun,
                        Some(unit),
                        format!(
                            "grade {} ran {elapsed:.3} h, minimum is {}",
                            run.grade,
                            plant.min_run(run.grade)
                        ),
                    ));
                }
            }
        }
    }

    for (&unit, assignments) in &plan.orders_plan {
        let runs = plan.grade_runs(unit);
        let mut prev_end = 0.0;
        for a in assignments {
            if a.start < prev_end - TIME_EPSILON
                || a.end < a.start
                || a.end > plan.horizon + TIME_EPSILON
            {
                violations.push(Violation::new(
                    ViolationType::TimeOrder,
                    Some(unit),
                    format!("order '{}' runs [{}, {}]", a.order_id, a.start, a.end),
                ));
            }
            prev_end = a.end;

            let active = runs
                .iter()
                .rev()
                .find(|r| r.start <= a.start + TIME_EPSILON);
            if active.map(|r| r.grade) != Some(a.grade) {
                violations.push(Violation::new(
                    ViolationType::RunMismatch,
                    Some(unit),
                    format!(
                        "order '{}' (grade {}) is outside a grade {} run",
                        a.order_id, a.grade, a.grade
                    ),
                ));
            }
        }
    }

    let benefit = plan.committed_benefit();
    if benefit < 0.0 {
        violations.push(Violation::new(
            ViolationType::NegativeBenefit,
            None,
            format!("committed benefit is {benefit}"),
        ));
    }

    violations
}
