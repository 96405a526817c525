//! Search and decision-making algorithms for grid-based agent games.
//!
//! - [`search`]: depth-first, breadth-first, uniform-cost and A* graph search
//!   over any [`search::SearchProblem`].
//! - [`multiagent`]: minimax, alpha-beta and expectimax agents for any
//!   multi-agent [`game::GameState`].
//! - [`learning`]: tabular and approximate Q-learning, and value iteration
//!   over an [`learning::Mdp`].
//! - [`capture`]: self-training feature agents for the capture game.
//!
//! The game itself is not part of this crate: implement the traits above
//! for your own states and actions.

pub mod capture;
pub mod config;
pub mod error;
pub mod game;
pub mod learning;
pub mod multiagent;
pub mod search;

pub use config::{AgentConfig, LearningParams, TreeSearchConfig};
pub use error::{Error, Result};
