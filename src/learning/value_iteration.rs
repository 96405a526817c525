//! Value iteration over a fully known Markov decision process.
use std::fmt::Debug;
use std::hash::Hash;

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use super::ValueEstimation;
use crate::error::{Error, Result};

/// Tolerance for a transition distribution to count as summing to one.
const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// A Markov decision process with a finite, enumerable state space.
pub trait Mdp {
    type State: Clone + Eq + Hash;
    type Action: Clone;

    fn states(&self) -> Vec<Self::State>;

    /// Actions available in `state`. Empty for terminal states.
    fn possible_actions(&self, state: &Self::State) -> Vec<Self::Action>;

    /// Next states of taking `action` in `state` with their probabilities.
    /// The probabilities should sum to one.
    fn transition_states_and_probs(
        &self,
        state: &Self::State,
        action: &Self::Action,
    ) -> Vec<(Self::State, f64)>;

    fn reward(&self, state: &Self::State, action: &Self::Action, next_state: &Self::State) -> f64;

    fn is_terminal(&self, state: &Self::State) -> bool;
}

/// Runs a fixed number of synchronous value-iteration sweeps at construction
/// and answers value, Q-value and policy queries from the final table.
///
/// Every sweep computes a fresh table from the previous one only; no state
/// ever sees a value from the sweep in progress.
#[derive(Debug, Clone)]
pub struct ValueIterationAgent<M: Mdp> {
    mdp: M,
    discount_rate: f64,
    iterations: usize,
    values: FxHashMap<M::State, f64>,
}

impl<M: Mdp> ValueIterationAgent<M> {
    pub fn new(mdp: M, discount_rate: f64, iterations: usize) -> Self {
        let states = mdp.states();
        let mut values: FxHashMap<M::State, f64> = states.iter().map(|s| (s.clone(), 0.0)).collect();

        for iteration in 0..iterations {
            let next: FxHashMap<M::State, f64> = states
                .iter()
                .map(|s| (s.clone(), best_backup(&mdp, &values, discount_rate, s)))
                .collect();
            debug!(
                iteration,
                delta = max_change(&values, &next),
                "value iteration sweep"
            );
            values = next;
        }

        info!(
            states = states.len(),
            iterations, discount_rate, "value iteration finished"
        );

        Self {
            mdp,
            discount_rate,
            iterations,
            values,
        }
    }

    /// Like [`ValueIterationAgent::new`], but first checks that every
    /// transition distribution sums to one.
    pub fn try_new(mdp: M, discount_rate: f64, iterations: usize) -> Result<Self>
    where
        M::State: Debug,
        M::Action: Debug,
    {
        if !(0.0..=1.0).contains(&discount_rate) {
            return Err(Error::InvalidParameter {
                name: "discount_rate",
                value: discount_rate,
                expected: "a value in [0, 1]",
            });
        }

        for state in mdp.states() {
            for action in mdp.possible_actions(&state) {
                let sum: f64 = mdp
                    .transition_states_and_probs(&state, &action)
                    .iter()
                    .map(|(_, p)| p)
                    .sum();
                if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
                    return Err(Error::InvalidProbabilities {
                        state: format!("{state:?}"),
                        action: format!("{action:?}"),
                        sum,
                    });
                }
            }
        }

        Ok(Self::new(mdp, discount_rate, iterations))
    }

    pub fn discount_rate(&self) -> f64 {
        self.discount_rate
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn mdp(&self) -> &M {
        &self.mdp
    }

    pub fn values(&self) -> &FxHashMap<M::State, f64> {
        &self.values
    }
}

impl<M> ValueIterationAgent<M>
where
    M: Mdp + Sync,
    M::State: Send + Sync,
{
    /// Same result as [`ValueIterationAgent::new`], with each sweep spread
    /// over the rayon thread pool.
    pub fn new_parallel(mdp: M, discount_rate: f64, iterations: usize) -> Self {
        let states = mdp.states();
        let mut values: FxHashMap<M::State, f64> = states.iter().map(|s| (s.clone(), 0.0)).collect();

        for iteration in 0..iterations {
            let next: FxHashMap<M::State, f64> = states
                .par_iter()
                .map(|s| (s.clone(), best_backup(&mdp, &values, discount_rate, s)))
                .collect();
            debug!(
                iteration,
                delta = max_change(&values, &next),
                "parallel value iteration sweep"
            );
            values = next;
        }

        info!(
            states = states.len(),
            iterations, discount_rate, "parallel value iteration finished"
        );

        Self {
            mdp,
            discount_rate,
            iterations,
            values,
        }
    }
}

/// Σ_s' P(s'|s,a) [R(s,a,s') + γ V(s')]
fn backup<M: Mdp>(
    mdp: &M,
    values: &FxHashMap<M::State, f64>,
    discount_rate: f64,
    state: &M::State,
    action: &M::Action,
) -> f64 {
    mdp.transition_states_and_probs(state, action)
        .iter()
        .map(|(next, p)| {
            let v = values.get(next).copied().unwrap_or(0.0);
            p * (mdp.reward(state, action, next) + discount_rate * v)
        })
        .sum()
}

/// Best backup over the actions of `state`; 0.0 without actions.
fn best_backup<M: Mdp>(
    mdp: &M,
    values: &FxHashMap<M::State, f64>,
    discount_rate: f64,
    state: &M::State,
) -> f64 {
    mdp.possible_actions(state)
        .iter()
        .map(|a| backup(mdp, values, discount_rate, state, a))
        .fold(None, |best: Option<f64>, q| Some(best.map_or(q, |b| b.max(q))))
        .unwrap_or(0.0)
}

fn max_change<S: Eq + Hash>(old: &FxHashMap<S, f64>, new: &FxHashMap<S, f64>) -> f64 {
    new.iter()
        .map(|(s, v)| (v - old.get(s).copied().unwrap_or(0.0)).abs())
        .fold(0.0, f64::max)
}

impl<M: Mdp> ValueEstimation for ValueIterationAgent<M> {
    type State = M::State;
    type Action = M::Action;

    /// Derived on demand from the final value table.
    fn q_value(&self, state: &M::State, action: &M::Action) -> f64 {
        backup(&self.mdp, &self.values, self.discount_rate, state, action)
    }

    /// The final table's value; 0.0 for a state the MDP did not list.
    fn value(&self, state: &M::State) -> f64 {
        self.values.get(state).copied().unwrap_or(0.0)
    }

    /// The first action (in [`Mdp::possible_actions`] order) with the largest Q-value.
    fn policy(&mut self, state: &M::State) -> Option<M::Action> {
        if self.mdp.is_terminal(state) {
            return None;
        }

        let mut best: Option<(M::Action, f64)> = None;
        for action in self.mdp.possible_actions(state) {
            let q = self.q_value(state, &action);
            match &best {
                Some((_, b)) if *b >= q => {}
                _ => best = Some((action, q)),
            }
        }
        best.map(|(a, _)| a)
    }

    /// Always the policy action: value iteration does not explore.
    fn get_action(&mut self, state: &M::State) -> Option<M::Action> {
        self.policy(state)
    }
}
