//! Greedy production planning for multi-unit plants.
//!
//! Assigns a shared pool of customer orders to production units over a
//! fixed horizon, choosing which grade each unit produces and when, so as
//! to maximize revenue minus manufacturing cost under transition, stock,
//! exclusivity and embargo rules.
//!
//! # Modules
//!
//! - **`models`**: Domain types (`Plant`, `Order`, `OrderBook`,
//!   `TransitionRules`, `Plan`, `GradeRun`, `OrderAssignment`)
//! - **`economics`**: Order time, cost, revenue and benefit per hour
//! - **`scheduler`**: Per-unit greedy scheduler, cross-unit coordinator, KPIs
//! - **`config`**: Run parameters (horizon, ramp-up pricing, strategy)
//! - **`validation`**: Input integrity checks and plan feasibility audit
//! - **`io`**: JSON plant input and plan report output
//! - **`generator`**: Seeded random plants
//!
//! # Example
//!
//! ```
//! use u_plant_schedule::config::SchedulerConfig;
//! use u_plant_schedule::models::{Order, Plant};
//! use u_plant_schedule::scheduler::schedule;
//! use u_plant_schedule::validation::check_plan;
//!
//! let plant = Plant::uniform(2, 2, 10.0, 1.0)
//!     .with_order("o1", Order::new(0, 20.0, 100.0))
//!     .with_order("o2", Order::new(1, 30.0, 120.0));
//! let plan = schedule(&plant, SchedulerConfig::new().with_horizon(48.0)).unwrap();
//!
//! assert_eq!(plan.orders_completed.len(), 2);
//! assert!(check_plan(&plant, &plan).is_empty());
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Kallrath (2002), "Planning and scheduling in the process industry"

pub mod config;
pub mod economics;
pub mod error;
pub mod generator;
pub mod io;
pub mod models;
pub mod scheduler;
pub mod validation;
