//! Agent configuration.
//!
//! These structs only describe the shape of the knobs each agent takes and
//! sensible defaults. Picking values for a particular game is up to the caller.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Hyperparameters shared by the reinforcement learners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningParams {
    /// Learning rate. 0.0 freezes the learned values.
    pub alpha: f64,

    /// Probability of taking a uniformly random action instead of the policy action.
    pub epsilon: f64,

    /// Discount rate applied to the value of the next state.
    pub gamma: f64,

    /// Number of training episodes. Once that many episodes have been
    /// stopped, the learner turns exploration and learning off. With zero,
    /// that happens when the first episode stops.
    pub num_training: usize,
}

impl Default for LearningParams {
    fn default() -> Self {
        Self {
            alpha: 0.2,
            epsilon: 0.05,
            gamma: 0.8,
            num_training: 0,
        }
    }
}

impl LearningParams {
    pub fn new(alpha: f64, epsilon: f64, gamma: f64) -> Self {
        Self {
            alpha,
            epsilon,
            gamma,
            num_training: 0,
        }
    }

    /// Parameters for playing with already learned values: greedy and frozen.
    pub fn for_evaluation() -> Self {
        Self {
            alpha: 0.0,
            epsilon: 0.0,
            ..Self::default()
        }
    }

    /// Builder-style setter for the training episode budget.
    pub fn with_num_training(mut self, num_training: usize) -> Self {
        self.num_training = num_training;
        self
    }

    /// Checks that every rate lies in `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        check_unit("alpha", self.alpha)?;
        check_unit("epsilon", self.epsilon)?;
        check_unit("gamma", self.gamma)?;
        Ok(())
    }
}

fn check_unit(name: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidParameter {
            name,
            value,
            expected: "a value in [0, 1]",
        })
    }
}

/// Configuration for the adversarial tree-search agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeSearchConfig {
    /// Number of full rounds (every agent moves once) to look ahead.
    pub depth: usize,
}

impl Default for TreeSearchConfig {
    fn default() -> Self {
        Self { depth: 2 }
    }
}

impl TreeSearchConfig {
    pub fn with_depth(depth: usize) -> Self {
        Self { depth }
    }

    pub fn validate(&self) -> Result<()> {
        if self.depth == 0 {
            return Err(Error::InvalidParameter {
                name: "depth",
                value: 0.0,
                expected: "a depth of at least 1",
            });
        }
        Ok(())
    }
}

/// Everything an application needs to build its agents, loadable from JSON.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub search: TreeSearchConfig,
    pub learning: LearningParams,
}

impl AgentConfig {
    /// Parses and validates a JSON configuration. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: AgentConfig = serde_json::from_str(json)?;
        config.search.validate()?;
        config.learning.validate()?;
        Ok(config)
    }
}
