//! Self-training agents for the two-team capture game.
//!
//! A [`SelfTrainingAgent`] starts from hand-tuned feature weights and keeps
//! refining them during play: every action it chooses is immediately fed
//! back as a transition, using the simulator to predict the successor and
//! the reward. The capture game's feature extraction lives with the game.

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::config::LearningParams;
use crate::learning::{ActionSpace, ApproximateQAgent, FeatureExtractor, ReinforcementLearner, ValueEstimation};

/// An environment that can also predict the outcome of an action.
pub trait Simulator: ActionSpace {
    fn successor(&self, state: &Self::State, action: &Self::Action) -> Self::State;

    /// Shaped reward the agent gives itself for taking `action` in `state`.
    fn reward(&self, state: &Self::State, action: &Self::Action) -> f64;
}

/// Which half of a capture team an agent plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureRole {
    /// Crosses over to eat the opponent's food.
    Offense,
    /// Stays home and hunts invaders.
    Defense,
}

impl CaptureRole {
    /// The starting weights for this role.
    pub fn initial_weights(&self) -> FxHashMap<String, f64> {
        match self {
            Self::Offense => offensive_weights(),
            Self::Defense => defensive_weights(),
        }
    }
}

fn named(weights: &[(&str, f64)]) -> FxHashMap<String, f64> {
    weights.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

/// Starting weights of the offensive agent.
pub fn offensive_weights() -> FxHashMap<String, f64> {
    named(&[
        ("successorScore", -576.0),
        ("distanceToFood", 150.0),
        ("ateFood", 1500.0),
        ("ghostDistance", -851.0),
    ])
}

/// Starting weights of the defensive agent.
pub fn defensive_weights() -> FxHashMap<String, f64> {
    named(&[
        ("onDefense", 543.0),
        ("invaderDistance", -176.24),
        ("captured", 499.0),
        ("foeDistance", -94.4),
    ])
}

/// Learning parameters of the capture agents: greedy, α = 0.2, γ = 0.9.
pub fn capture_params() -> LearningParams {
    LearningParams::new(0.2, 0.0, 0.9)
}

/// A feature-weighted Q agent that learns from its own moves.
#[derive(Debug, Clone)]
pub struct SelfTrainingAgent<E, X>
where
    E: Simulator,
    X: FeatureExtractor<E::State, E::Action, Feature = String>,
{
    role: CaptureRole,
    learner: ApproximateQAgent<E, X>,
}

impl<E, X> SelfTrainingAgent<E, X>
where
    E: Simulator,
    X: FeatureExtractor<E::State, E::Action, Feature = String>,
{
    /// Creates an agent for `role` with that role's starting weights and [`capture_params`].
    pub fn new(env: E, extractor: X, role: CaptureRole) -> Self {
        Self::with_params(env, extractor, role, capture_params())
    }

    pub fn with_params(env: E, extractor: X, role: CaptureRole, params: LearningParams) -> Self {
        let learner = ApproximateQAgent::new(env, extractor, params).with_weights(role.initial_weights());
        Self { role, learner }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.learner = self.learner.with_seed(seed);
        self
    }

    pub fn role(&self) -> CaptureRole {
        self.role
    }

    pub fn learner(&self) -> &ApproximateQAgent<E, X> {
        &self.learner
    }

    /// Picks an action epsilon-greedily, learns from its predicted outcome,
    /// then returns it. `None` (and no learning) without legal actions.
    pub fn choose_action(&mut self, state: &E::State) -> Option<E::Action> {
        let action = self.learner.get_action(state)?;
        let next = self.learner.env().successor(state, &action);
        let reward = self.learner.env().reward(state, &action);

        trace!(role = ?self.role, reward, "self-training update");
        self.learner.update(state, &action, &next, reward);
        Some(action)
    }
}
