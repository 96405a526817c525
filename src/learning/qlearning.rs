//! Tabular Q-learning.

use std::hash::Hash;

use rustc_hash::FxHashMap;
use tracing::trace;

use super::{ActionSpace, LearnerCore, ReinforcementLearner, ValueEstimation};
use crate::config::LearningParams;

/// Q-values keyed by state, then action. Unseen pairs are worth 0.0.
///
/// The table only grows: entries are never evicted.
#[derive(Debug, Clone)]
pub struct QTable<S, A> {
    values: FxHashMap<S, FxHashMap<A, f64>>,
}

impl<S, A> Default for QTable<S, A> {
    fn default() -> Self {
        Self {
            values: FxHashMap::default(),
        }
    }
}

impl<S: Eq + Hash, A: Eq + Hash> QTable<S, A> {
    pub fn get(&self, state: &S, action: &A) -> f64 {
        self.values
            .get(state)
            .and_then(|row| row.get(action))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn set(&mut self, state: S, action: A, value: f64) {
        self.values.entry(state).or_default().insert(action, value);
    }

    /// Number of (state, action) pairs stored.
    pub fn len(&self) -> usize {
        self.values.values().map(FxHashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&S, &A, f64)> {
        self.values
            .iter()
            .flat_map(|(s, row)| row.iter().map(move |(a, v)| (s, a, *v)))
    }
}

/// A Q-learning agent.
///
/// With probability epsilon it takes a random legal action, otherwise the
/// best one according to its table. `update` performs the off-policy
/// TD(0) backup
///
/// Q(s,a) ← (1 - α) Q(s,a) + α [r + γ max_a' Q(s',a')]
#[derive(Debug, Clone)]
pub struct QLearningAgent<E: ActionSpace> {
    env: E,
    table: QTable<E::State, E::Action>,
    core: LearnerCore,
}

impl<E: ActionSpace> QLearningAgent<E> {
    pub fn new(env: E, params: LearningParams) -> Self {
        Self {
            env,
            table: QTable::default(),
            core: LearnerCore::new(params),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.core.reseed(seed);
        self
    }

    pub fn table(&self) -> &QTable<E::State, E::Action> {
        &self.table
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
}

impl<E: ActionSpace> ValueEstimation for QLearningAgent<E> {
    type State = E::State;
    type Action = E::Action;

    fn q_value(&self, state: &E::State, action: &E::Action) -> f64 {
        self.table.get(state, action)
    }

    fn value(&self, state: &E::State) -> f64 {
        let actions = self.env.legal_actions(state);
        LearnerCore::best_value(&actions, |a| self.q_value(state, a))
    }

    fn policy(&mut self, state: &E::State) -> Option<E::Action> {
        let actions = self.env.legal_actions(state);
        let table = &self.table;
        self.core.best_action(&actions, |a| table.get(state, a))
    }

    fn get_action(&mut self, state: &E::State) -> Option<E::Action> {
        let actions = self.env.legal_actions(state);
        let table = &self.table;
        self.core.epsilon_greedy(&actions, |a| table.get(state, a))
    }
}

impl<E: ActionSpace> ReinforcementLearner for QLearningAgent<E> {
    fn update(&mut self, state: &E::State, action: &E::Action, next_state: &E::State, reward: f64) {
        let alpha = self.core.alpha();
        let old = self.q_value(state, action);
        let sample = reward + self.core.gamma() * self.value(next_state);
        let new = (1.0 - alpha) * old + alpha * sample;

        trace!(old, new, td_error = sample - old, "q-value update");
        self.core.observe_reward(reward);
        self.table.set(state.clone(), action.clone(), new);
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
