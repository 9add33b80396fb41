//! Production planning domain models.
//!
//! Provides the data types for describing a multi-unit plant, its orders,
//! and the plans computed for it.
//!
//! # Domain Mappings
//!
//! | u-plant-schedule | Steel / Chemicals | Food | Paper |
//! |------------------|-------------------|------|-------|
//! | Grade | Steel grade / resin | Recipe | Paper grade |
//! | Unit | Line / reactor | Filler | Paper machine |
//! | Order | Sales order | Batch order | Roll order |
//! | Plan | Campaign plan | Production plan | Machine schedule |

mod constraint;
mod order;
mod plant;
mod schedule;

pub use constraint::TransitionRules;
pub use order::{Order, OrderBook, OrderId};
pub use plant::{Plant, DEFAULT_EMBARGO_DAYS, DEFAULT_INTERVALS_PER_DAY};
pub use schedule::{GradeRun, OrderAssignment, Plan, Violation, ViolationType};

/// Grade (product type) index in `[0, n_grades)`.
pub type GradeId = usize;

/// Production unit index in `[0, n_units)`.
pub type UnitId = usize;
