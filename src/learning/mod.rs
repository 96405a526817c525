//! Value-based learning and planning agents.
//!
//! - [`QLearningAgent`]: tabular Q-learning from observed transitions.
//! - [`ApproximateQAgent`]: Q-values as a linear function of features.
//! - [`ValueIterationAgent`]: batch value iteration over a known [`Mdp`].
//!
//! The two learners share action selection through [`LearnerCore`]: they
//! only differ in how a Q-value is computed and updated.

pub mod approximate;
pub mod qlearning;
pub mod value_iteration;

use std::hash::Hash;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::LearningParams;

pub use approximate::{ApproximateQAgent, BiasExtractor, FeatureExtractor, FeatureVector, IdentityExtractor};
pub use qlearning::{QLearningAgent, QTable};
pub use value_iteration::{Mdp, ValueIterationAgent};

/// The environment's side of learning: which actions are legal where.
///
/// A state without legal actions is terminal.
pub trait ActionSpace {
    type State: Clone + Eq + Hash;
    type Action: Clone + Eq + Hash;

    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action>;
}

/// Anything that can value states and actions and act on those values.
pub trait ValueEstimation {
    type State;
    type Action;

    /// Q(state, action).
    fn q_value(&self, state: &Self::State, action: &Self::Action) -> f64;

    /// max over legal actions of Q(state, action); 0.0 without legal actions.
    fn value(&self, state: &Self::State) -> f64;

    /// The action achieving [`ValueEstimation::value`]; `None` without legal actions.
    fn policy(&mut self, state: &Self::State) -> Option<Self::Action>;

    /// The action to take in `state`; `None` without legal actions.
    fn get_action(&mut self, state: &Self::State) -> Option<Self::Action>;
}

/// A learner fed one transition at a time by the environment driver.
pub trait ReinforcementLearner: ValueEstimation {
    /// Observes one real transition. Called once per environment step, by the driver.
    fn update(
        &mut self,
        state: &Self::State,
        action: &Self::Action,
        next_state: &Self::State,
        reward: f64,
    );

    fn start_episode(&mut self);

    fn stop_episode(&mut self);

    fn episodes_so_far(&self) -> usize;

    /// Whether the training budget is still running.
    fn is_in_training(&self) -> bool;
}

/// Hyperparameters, randomness and episode bookkeeping shared by the learners.
#[derive(Debug, Clone)]
pub struct LearnerCore {
    params: LearningParams,
    rng: StdRng,
    episodes_so_far: usize,
    episode_rewards: f64,
}

impl LearnerCore {
    pub fn new(params: LearningParams) -> Self {
        Self {
            params,
            rng: StdRng::from_entropy(),
            episodes_so_far: 0,
            episode_rewards: 0.0,
        }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn params(&self) -> &LearningParams {
        &self.params
    }

    pub fn alpha(&self) -> f64 {
        self.params.alpha
    }

    pub fn epsilon(&self) -> f64 {
        self.params.epsilon
    }

    pub fn gamma(&self) -> f64 {
        self.params.gamma
    }

    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.params.epsilon = epsilon;
    }

    pub fn set_alpha(&mut self, alpha: f64) {
        self.params.alpha = alpha;
    }

    /// Largest Q-value among `actions`, 0.0 if there are none.
    pub fn best_value<A>(actions: &[A], q: impl Fn(&A) -> f64) -> f64 {
        actions
            .iter()
            .map(q)
            .fold(None, |best: Option<f64>, v| Some(best.map_or(v, |b| b.max(v))))
            .unwrap_or(0.0)
    }

    /// An action with the largest Q-value, uniformly at random among ties.
    pub fn best_action<A: Clone>(&mut self, actions: &[A], q: impl Fn(&A) -> f64) -> Option<A> {
        let scored: Vec<(&A, f64)> = actions.iter().map(|a| (a, q(a))).collect();
        let best = scored
            .iter()
            .map(|(_, v)| *v)
            .fold(f64::NEG_INFINITY, f64::max);
        let tied: Vec<&A> = scored
            .into_iter()
            .filter(|(_, v)| *v == best)
            .map(|(a, _)| a)
            .collect();
        tied.choose(&mut self.rng).map(|a| (*a).clone())
    }

    /// With probability epsilon a uniformly random action, otherwise [`LearnerCore::best_action`].
    /// The coin is flipped exactly once. A non-finite epsilon never explores.
    pub fn epsilon_greedy<A: Clone>(&mut self, actions: &[A], q: impl Fn(&A) -> f64) -> Option<A> {
        if actions.is_empty() {
            return None;
        }
        let epsilon = if self.params.epsilon.is_finite() {
            self.params.epsilon.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if self.rng.gen_bool(epsilon) {
            actions.choose(&mut self.rng).cloned()
        } else {
            self.best_action(actions, q)
        }
    }

    pub fn observe_reward(&mut self, reward: f64) {
        self.episode_rewards += reward;
    }

    pub fn episode_rewards(&self) -> f64 {
        self.episode_rewards
    }

    pub fn episodes_so_far(&self) -> usize {
        self.episodes_so_far
    }

    /// Whether fewer than `num_training` episodes have been stopped. A zero
    /// budget is never in training, and learning stops after the first episode.
    pub fn is_in_training(&self) -> bool {
        self.episodes_so_far < self.params.num_training
    }

    pub fn start_episode(&mut self) {
        self.episode_rewards = 0.0;
    }

    /// Counts the episode; once the training budget is spent, stops
    /// exploring and learning.
    pub fn stop_episode(&mut self) {
        self.episodes_so_far += 1;
        debug!(
            episode = self.episodes_so_far,
            rewards = self.episode_rewards,
            "episode finished"
        );

        if !self.is_in_training() {
            if self.params.epsilon != 0.0 || self.params.alpha != 0.0 {
                info!(
                    episodes = self.episodes_so_far,
                    "training finished, exploration and learning turned off"
                );
            }
            self.params.epsilon = 0.0;
            self.params.alpha = 0.0;
        }
    }
}
