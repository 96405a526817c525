//! Error types for the crate.
//!
//! Search failures and terminal states are normal outcomes and never show up
//! here. These errors only come out of the validating entry points.

use thiserror::Error;

/// Main error type.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid parameter {name} = {value} (expected {expected})")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("transition probabilities for action {action} in state {state} sum to {sum}, not 1")]
    InvalidProbabilities {
        state: String,
        action: String,
        sum: f64,
    },

    #[error("step cost {cost} is not positive")]
    NonPositiveStepCost { cost: f64 },

    #[error("action at step {step} is not available from the state reached so far")]
    IllegalAction { step: usize },

    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Convenience alias for results using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
