//! Approximate Q-learning with a linear function of features.
//!
//! Feature vectors are open-ended maps from a feature key to its value.
//! Keys the agent has never seen are simply worth a weight of 0.0, so
//! extractors may introduce new features at any time.

use std::hash::Hash;

use rustc_hash::FxHashMap;
use tracing::trace;

use super::{ActionSpace, LearnerCore, ReinforcementLearner, ValueEstimation};
use crate::config::LearningParams;

/// Feature key to feature value.
pub type FeatureVector<F> = FxHashMap<F, f64>;

/// Turns a (state, action) pair into features.
pub trait FeatureExtractor<S, A> {
    type Feature: Clone + Eq + Hash;

    fn features(&self, state: &S, action: &A) -> FeatureVector<Self::Feature>;
}

/// One feature per (state, action) pair. Makes the approximate agent tabular.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityExtractor;

impl<S: Clone + Eq + Hash, A: Clone + Eq + Hash> FeatureExtractor<S, A> for IdentityExtractor {
    type Feature = (S, A);

    fn features(&self, state: &S, action: &A) -> FeatureVector<(S, A)> {
        let mut features = FeatureVector::default();
        features.insert((state.clone(), action.clone()), 1.0);
        features
    }
}

/// A single `"bias"` feature shared by every pair: one global scalar Q-value.
#[derive(Debug, Clone, Copy, Default)]
pub struct BiasExtractor;

impl<S, A> FeatureExtractor<S, A> for BiasExtractor {
    type Feature = String;

    fn features(&self, _state: &S, _action: &A) -> FeatureVector<String> {
        let mut features = FeatureVector::default();
        features.insert("bias".to_string(), 1.0);
        features
    }
}

/// An approximate Q-learning agent.
///
/// Q(s,a) = Σ_f w_f · f(s,a). An update moves every weight present in the
/// feature vector of (s,a) by α · correction · f(s,a), where
/// correction = r + γ V(s') - Q(s,a). Weights of absent features stay put.
///
/// Only `update` registers a feature: it inserts each unseen feature at 0.0
/// before applying the step. Reading a Q-value treats an unseen feature as
/// 0.0 without inserting it, so [`ApproximateQAgent::weights`] lists exactly
/// the features that went through an update or came from `with_weights`.
///
/// Action selection is identical to [`super::QLearningAgent`].
#[derive(Debug, Clone)]
pub struct ApproximateQAgent<E, X>
where
    E: ActionSpace,
    X: FeatureExtractor<E::State, E::Action>,
{
    env: E,
    extractor: X,
    weights: FxHashMap<X::Feature, f64>,
    core: LearnerCore,
}

impl<E, X> ApproximateQAgent<E, X>
where
    E: ActionSpace,
    X: FeatureExtractor<E::State, E::Action>,
{
    pub fn new(env: E, extractor: X, params: LearningParams) -> Self {
        Self {
            env,
            extractor,
            weights: FxHashMap::default(),
            core: LearnerCore::new(params),
        }
    }

    /// Starts from the given weights instead of all zeros.
    pub fn with_weights<I>(mut self, weights: I) -> Self
    where
        I: IntoIterator<Item = (X::Feature, f64)>,
    {
        self.weights.extend(weights);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.core.reseed(seed);
        self
    }

    pub fn weights(&self) -> &FxHashMap<X::Feature, f64> {
        &self.weights
    }

    /// The weight of `feature`, 0.0 if it was never registered.
    pub fn weight(&self, feature: &X::Feature) -> f64 {
        self.weights.get(feature).copied().unwrap_or(0.0)
    }

    pub fn extractor(&self) -> &X {
        &self.extractor
    }

    pub fn core(&self) -> &LearnerCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut LearnerCore {
        &mut self.core
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    fn dot(weights: &FxHashMap<X::Feature, f64>, features: &FeatureVector<X::Feature>) -> f64 {
        features
            .iter()
            .map(|(f, v)| weights.get(f).copied().unwrap_or(0.0) * v)
            .sum()
    }
}

impl<E, X> ValueEstimation for ApproximateQAgent<E, X>
where
    E: ActionSpace,
    X: FeatureExtractor<E::State, E::Action>,
{
    type State = E::State;
    type Action = E::Action;

    fn q_value(&self, state: &E::State, action: &E::Action) -> f64 {
        Self::dot(&self.weights, &self.extractor.features(state, action))
    }

    fn value(&self, state: &E::State) -> f64 {
        let actions = self.env.legal_actions(state);
        LearnerCore::best_value(&actions, |a| self.q_value(state, a))
    }

    fn policy(&mut self, state: &E::State) -> Option<E::Action> {
        let actions = self.env.legal_actions(state);
        let (weights, extractor) = (&self.weights, &self.extractor);
        self.core
            .best_action(&actions, |a| Self::dot(weights, &extractor.features(state, a)))
    }

    fn get_action(&mut self, state: &E::State) -> Option<E::Action> {
        let actions = self.env.legal_actions(state);
        let (weights, extractor) = (&self.weights, &self.extractor);
        self.core
            .epsilon_greedy(&actions, |a| Self::dot(weights, &extractor.features(state, a)))
    }
}

impl<E, X> ReinforcementLearner for ApproximateQAgent<E, X>
where
    E: ActionSpace,
    X: FeatureExtractor<E::State, E::Action>,
{
    fn update(&mut self, state: &E::State, action: &E::Action, next_state: &E::State, reward: f64) {
        let features = self.extractor.features(state, action);
        let target = reward + self.core.gamma() * self.value(next_state);
        let correction = target - Self::dot(&self.weights, &features);
        let step = self.core.alpha() * correction;

        trace!(correction, features = features.len(), "weight update");
        self.core.observe_reward(reward);
        for (feature, value) in features {
            *self.weights.entry(feature).or_insert(0.0) += step * value;
        }
    }

    fn start_episode(&mut self) {
        self.core.start_episode();
    }

    fn stop_episode(&mut self) {
        self.core.stop_episode();
    }

    fn episodes_so_far(&self) -> usize {
        self.core.episodes_so_far()
    }

    fn is_in_training(&self) -> bool {
        self.core.is_in_training()
    }
}
