//! Planning error types.
//!
//! Only configuration and I/O problems are errors. Running out of orders,
//! unprofitable proposals and reaching the horizon end a unit's plan
//! normally and never surface here.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can occur before or around a planning run.
#[derive(Debug, Error)]
pub enum PlanningError {
    #[error("invalid plant configuration: {}", join_errors(.0))]
    InvalidConfig(Vec<ValidationError>),

    #[error("invalid horizon: {0} (must be a positive number of hours)")]
    InvalidHorizon(f64),

    #[error("invalid ramp-up pricing: {0}")]
    InvalidRamp(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type PlanningResult<T> = Result<T, PlanningError>;

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_invalid_config_message_lists_problems() {
        let err = PlanningError::InvalidConfig(vec![
            ValidationError::new(ValidationErrorKind::NonPositiveFlow, "flow[0,0] = 0"),
            ValidationError::new(ValidationErrorKind::GradeOutOfRange, "grade 9"),
        ]);
        let msg = err.to_string();
        assert!(msg.starts_with("invalid plant configuration"));
        assert!(msg.contains("flow[0,0] = 0"));
        assert!(msg.contains("; "));
    }

    #[test]
    fn test_horizon_message() {
        let msg = PlanningError::InvalidHorizon(-1.0).to_string();
        assert!(msg.contains("-1"));
    }
}
