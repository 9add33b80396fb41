//! Grade transition constraints.
//!
//! Decides which grade a unit may switch to, given what it is producing
//! now and the current time. The rules are plant-wide and immutable for a
//! planning run.
//!
//! # Rules
//!
//! | Rule | Effect |
//! |------|--------|
//! | Forbidden successors | `from → to` never allowed |
//! | Required predecessor | `to` may only follow one specific grade |
//! | Exclusive unit | listed grades run on one unit only |
//! | Embargo | listed grades cannot start before day `embargo_days` |
//!
//! Staying on the current grade is always allowed.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{GradeId, UnitId};

/// Plant-wide grade transition rules and the transition oracle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionRules {
    /// `from` → grades that may not follow it.
    forbidden: BTreeMap<GradeId, BTreeSet<GradeId>>,
    /// `to` → the only grade allowed directly before it.
    only_predecessor: BTreeMap<GradeId, GradeId>,
    /// Unit reserved for the exclusive grades.
    pub exclusive_unit: UnitId,
    /// Grades that may only run on `exclusive_unit`.
    pub exclusive_grades: BTreeSet<GradeId>,
    /// Grades that cannot start before the embargo window closes.
    pub embargoed: BTreeSet<GradeId>,
    /// Embargo window length in hours.
    pub embargo_hours: f64,
}

impl TransitionRules {
    /// Creates an empty rule set (every transition legal).
    pub fn new() -> Self {
        Self::default()
    }

    /// Forbids `to` directly after `from`.
    pub fn forbid(&mut self, from: GradeId, to: GradeId) {
        self.forbidden.entry(from).or_default().insert(to);
    }

    /// Builder: forbids `to` directly after `from`.
    pub fn with_forbidden(mut self, from: GradeId, to: GradeId) -> Self {
        self.forbid(from, to);
        self
    }

    /// Requires `grade` to be preceded by `predecessor`.
    pub fn set_predecessor(&mut self, grade: GradeId, predecessor: GradeId) {
        self.only_predecessor.insert(grade, predecessor);
    }

    /// Builder: requires `grade` to be preceded by `predecessor`.
    pub fn with_predecessor(mut self, grade: GradeId, predecessor: GradeId) -> Self {
        self.set_predecessor(grade, predecessor);
        self
    }

    /// Builder: restricts `grades` to `unit`.
    pub fn with_exclusive(mut self, unit: UnitId, grades: impl IntoIterator<Item = GradeId>) -> Self {
        self.exclusive_unit = unit;
        self.exclusive_grades = grades.into_iter().collect();
        self
    }

    /// Builder: embargoes `grades` for the first `hours` of the horizon.
    pub fn with_embargo(mut self, hours: f64, grades: impl IntoIterator<Item = GradeId>) -> Self {
        self.embargo_hours = hours;
        self.embargoed = grades.into_iter().collect();
        self
    }

    /// Grades forbidden directly after `from`.
    pub fn forbidden_after(&self, from: GradeId) -> Option<&BTreeSet<GradeId>> {
        self.forbidden.get(&from)
    }

    /// The grade required directly before `grade`, if any.
    pub fn required_predecessor(&self, grade: GradeId) -> Option<GradeId> {
        self.only_predecessor.get(&grade).copied()
    }

    /// The grade that must directly follow `grade`'s run, if `grade` is the
    /// required predecessor of some grade.
    pub fn only_consecutive(&self, grade: GradeId) -> Option<GradeId> {
        self.only_predecessor
            .iter()
            .find(|(_, &pred)| pred == grade)
            .map(|(&succ, _)| succ)
    }

    /// Every `(grade, predecessor)` pair.
    pub fn predecessors(&self) -> impl Iterator<Item = (GradeId, GradeId)> + '_ {
        self.only_predecessor.iter().map(|(&g, &p)| (g, p))
    }

    /// Every `(from, forbidden set)` pair.
    pub fn forbidden_pairs(&self) -> impl Iterator<Item = (GradeId, &BTreeSet<GradeId>)> + '_ {
        self.forbidden.iter().map(|(&g, set)| (g, set))
    }

    /// Whether `grade` is embargoed at `time`.
    #[inline]
    pub fn is_embargoed(&self, grade: GradeId, time: f64) -> bool {
        time < self.embargo_hours && self.embargoed.contains(&grade)
    }

    /// Whether `grade` may run on `unit` at all.
    #[inline]
    pub fn allowed_on_unit(&self, grade: GradeId, unit: UnitId) -> bool {
        !self.exclusive_grades.contains(&grade) || unit == self.exclusive_unit
    }

    /// Transition oracle: may `unit` switch from `current` to `grade` at `time`?
    ///
    /// `current` is `None` before the unit's first run. Callers handle the
    /// same-grade case; this only judges actual changes. A grade with a
    /// required predecessor is never legal as a unit's first grade.
    pub fn is_legal_transition(
        &self,
        grade: GradeId,
        time: f64,
        unit: UnitId,
        current: Option<GradeId>,
    ) -> bool {
        if self.is_embargoed(grade, time) {
            return false;
        }
        if let Some(from) = current {
            if self
                .forbidden
                .get(&from)
                .is_some_and(|set| set.contains(&grade))
            {
                return false;
            }
        }
        if let Some(pred) = self.required_predecessor(grade) {
            if Some(pred) != current {
                return false;
            }
        }
        self.allowed_on_unit(grade, unit)
    }

    /// The current grade plus every grade the oracle admits, ascending.
    pub fn possible_transitions(
        &self,
        n_grades: usize,
        time: f64,
        unit: UnitId,
        current: Option<GradeId>,
    ) -> Vec<GradeId> {
        (0..n_grades)
            .filter(|&g| Some(g) == current || self.is_legal_transition(g, time, unit, current))
            .collect()
    }
}
