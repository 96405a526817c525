//! This module's primary struct is [`SearchAgent`], which picks an action for
//! agent 0 by searching a fixed number of rounds ahead.
//!
//! The algorithm is chosen by the type parameter:
//! [`MinimaxAgent`], [`AlphaBetaAgent`] and [`ExpectimaxAgent`].
//! The searching agent is always agent 0 of the [`GameState`].
use std::fmt;
use std::marker::PhantomData;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::config::TreeSearchConfig;
use crate::game::*;

/// A static evaluation of a state, higher is better for agent 0.
pub type EvaluationFn<G> = Box<dyn Fn(&G) -> f64 + Send + Sync>;

/// The values of agent 0's candidate actions at the root.
#[derive(Debug, Clone, PartialEq)]
pub struct RootEvaluation<A> {
    /// One entry per candidate action, in legal-action order.
    pub values: Vec<(A, f64)>,
    /// Number of tree nodes visited, the root included.
    pub nodes: usize,
}

impl<A> RootEvaluation<A> {
    /// The largest action value, or `None` without candidates.
    pub fn best_value(&self) -> Option<f64> {
        self.values
            .iter()
            .map(|(_, v)| *v)
            .fold(None, |best, v| match best {
                Some(b) if b >= v => Some(b),
                _ => Some(v),
            })
    }

    /// Every action whose value equals the best one.
    pub fn best_actions(&self) -> Vec<&A> {
        match self.best_value() {
            Some(best) => self
                .values
                .iter()
                .filter(|(_, v)| *v == best)
                .map(|(a, _)| a)
                .collect(),
            None => Vec::new(),
        }
    }
}

/// A tree-search algorithm that [`SearchAgent`] can run.
pub trait Algorithm: Sized {
    const NAME: &'static str;

    /// Values every root candidate of `state`.
    fn evaluate_root<G: GameState>(agent: &SearchAgent<G, Self>, state: &G) -> RootEvaluation<G::Action>;
}

/// Plain minimax: every agent but 0 minimizes.
#[derive(Debug, Clone, Copy)]
pub struct Minimax;

/// Minimax with alpha-beta pruning. Returns the same best value as [`Minimax`].
#[derive(Debug, Clone, Copy)]
pub struct AlphaBeta;

/// Every agent but 0 moves uniformly at random.
#[derive(Debug, Clone, Copy)]
pub struct Expectimax;

pub type MinimaxAgent<G> = SearchAgent<G, Minimax>;
pub type AlphaBetaAgent<G> = SearchAgent<G, AlphaBeta>;
pub type ExpectimaxAgent<G> = SearchAgent<G, Expectimax>;

/// A depth-limited game-tree search agent.
///
/// The search depth counts full rounds: with depth 1 agent 0 moves, every
/// other agent replies once, and the resulting state is evaluated. States
/// at the depth limit or where the game is over are scored with the
/// evaluation function, which defaults to [`GameState::score`].
///
/// Among equally good root actions one is picked uniformly at random, so
/// construct the agent with [`SearchAgent::with_seed`] for reproducible play.
pub struct SearchAgent<G: GameState, K> {
    depth: usize,
    evaluation: EvaluationFn<G>,
    rng: StdRng,
    _algorithm: PhantomData<K>,
}

impl<G: GameState, K> fmt::Debug for SearchAgent<G, K>
where
    K: Algorithm,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchAgent")
            .field("algorithm", &K::NAME)
            .field("depth", &self.depth)
            .finish()
    }
}

impl<G: GameState + 'static, K: Algorithm> SearchAgent<G, K> {
    /// Creates an agent that evaluates cutoff states by their score.
    pub fn new(config: TreeSearchConfig) -> Self {
        Self::with_evaluation(config, |state: &G| state.score())
    }
}

impl<G: GameState, K: Algorithm> SearchAgent<G, K> {
    /// Creates an agent with a custom evaluation function.
    pub fn with_evaluation<F>(config: TreeSearchConfig, evaluation: F) -> Self
    where
        F: Fn(&G) -> f64 + Send + Sync + 'static,
    {
        Self {
            depth: config.depth,
            evaluation: Box::new(evaluation),
            rng: StdRng::from_entropy(),
            _algorithm: PhantomData,
        }
    }

    /// Seeds the tie-breaking generator.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The values of agent 0's root actions, see [`Algorithm::evaluate_root`].
    pub fn evaluate_root(&self, state: &G) -> RootEvaluation<G::Action> {
        K::evaluate_root(self, state)
    }

    /// Returns the best action for agent 0, or `None` if it has no legal action.
    pub fn get_action(&mut self, state: &G) -> Option<G::Action> {
        let evaluation = self.evaluate_root(state);
        let best = evaluation.best_actions();
        let chosen = best.choose(&mut self.rng).map(|a| (*a).clone());

        debug!(
            algorithm = K::NAME,
            depth = self.depth,
            nodes = evaluation.nodes,
            candidates = evaluation.values.len(),
            ties = best.len(),
            best = evaluation.best_value(),
            "tree search finished"
        );

        chosen
    }

    fn evaluate(&self, state: &G) -> f64 {
        (self.evaluation)(state)
    }

    fn is_cutoff(&self, state: &G, turn: Turn) -> bool {
        turn.depth >= self.depth || state.is_terminal()
    }

    /// Legal actions of `agent`, without the stop action for agent 0 unless
    /// stopping is all it can do.
    fn candidate_actions(state: &G, agent: usize) -> Vec<G::Action> {
        let legal = state.legal_actions(agent);
        if agent != 0 {
            return legal;
        }
        let moving: Vec<G::Action> = legal.iter().filter(|a| !G::is_stop(a)).cloned().collect();
        if moving.is_empty() {
            legal
        } else {
            moving
        }
    }

    /// Shared root loop for the algorithms without pruning.
    fn evaluate_root_with(&self, state: &G, model: OpponentModel) -> RootEvaluation<G::Action> {
        let mut nodes = 1;
        let next = Turn::root().advance(state.num_agents());
        let values = Self::candidate_actions(state, 0)
            .into_iter()
            .map(|action| {
                let child = state.generate_successor(0, &action);
                let value = self.value(&child, next, model, &mut nodes);
                (action, value)
            })
            .collect();
        RootEvaluation { values, nodes }
    }

    /// Minimax or expectimax value of `state` with `turn.agent` to move.
    fn value(&self, state: &G, turn: Turn, model: OpponentModel, nodes: &mut usize) -> f64 {
        *nodes += 1;
        if self.is_cutoff(state, turn) {
            return self.evaluate(state);
        }

        let actions = Self::candidate_actions(state, turn.agent);
        if actions.is_empty() {
            return self.evaluate(state);
        }

        let next = turn.advance(state.num_agents());
        let role = turn.role(model);
        let count = actions.len() as f64;
        let folded = actions.iter().fold(role.identity(), |acc, action| {
            let child = state.generate_successor(turn.agent, action);
            let v = self.value(&child, next, model, nodes);
            match role {
                AgentRole::Maximizer => acc.max(v),
                AgentRole::Minimizer => acc.min(v),
                AgentRole::Chance => acc + v,
            }
        });

        match role {
            AgentRole::Chance => folded / count,
            _ => folded,
        }
    }

    /// Fail-soft alpha-beta.
    ///
    /// Pruning only happens on a strict bound violation, so a returned value
    /// inside `[alpha, beta]` is exact and equal root values are true ties.
    fn alpha_beta(&self, state: &G, turn: Turn, mut alpha: f64, mut beta: f64, nodes: &mut usize) -> f64 {
        *nodes += 1;
        if self.is_cutoff(state, turn) {
            return self.evaluate(state);
        }

        let actions = Self::candidate_actions(state, turn.agent);
        if actions.is_empty() {
            return self.evaluate(state);
        }

        let next = turn.advance(state.num_agents());
        match turn.role(OpponentModel::Adversarial) {
            AgentRole::Maximizer => {
                let mut value = f64::NEG_INFINITY;
                for action in &actions {
                    let child = state.generate_successor(turn.agent, action);
                    value = value.max(self.alpha_beta(&child, next, alpha, beta, nodes));
                    if value > beta {
                        return value;
                    }
                    alpha = alpha.max(value);
                }
                value
            }
            _ => {
                let mut value = f64::INFINITY;
                for action in &actions {
                    let child = state.generate_successor(turn.agent, action);
                    value = value.min(self.alpha_beta(&child, next, alpha, beta, nodes));
                    if value < alpha {
                        return value;
                    }
                    beta = beta.min(value);
                }
                value
            }
        }
    }
}

impl Algorithm for Minimax {
    const NAME: &'static str = "minimax";

    fn evaluate_root<G: GameState>(agent: &SearchAgent<G, Self>, state: &G) -> RootEvaluation<G::Action> {
        agent.evaluate_root_with(state, OpponentModel::Adversarial)
    }
}

impl Algorithm for Expectimax {
    const NAME: &'static str = "expectimax";

    fn evaluate_root<G: GameState>(agent: &SearchAgent<G, Self>, state: &G) -> RootEvaluation<G::Action> {
        agent.evaluate_root_with(state, OpponentModel::Stochastic)
    }
}

impl Algorithm for AlphaBeta {
    const NAME: &'static str = "alpha-beta";

    /// The root is a max node whose alpha grows with the best action found so
    /// far. Actions proven worse than it carry an upper bound, not their
    /// exact minimax value.
    fn evaluate_root<G: GameState>(agent: &SearchAgent<G, Self>, state: &G) -> RootEvaluation<G::Action> {
        let mut nodes = 1;
        let next = Turn::root().advance(state.num_agents());
        let mut alpha = f64::NEG_INFINITY;
        let mut values = Vec::new();

        for action in SearchAgent::<G, Self>::candidate_actions(state, 0) {
            let child = state.generate_successor(0, &action);
            let value = agent.alpha_beta(&child, next, alpha, f64::INFINITY, &mut nodes);
            alpha = alpha.max(value);
            values.push((action, value));
        }

        RootEvaluation { values, nodes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::*;

    /// An explicit game tree. Leaves carry their score; inner nodes list
    /// (action, child) pairs for whoever is to move.
    #[derive(Debug, Clone)]
    enum Tree {
        Leaf(f64),
        Node(Vec<(char, Tree)>),
    }

    #[derive(Debug, Clone)]
    struct TreeGame {
        tree: Tree,
        agents: usize,
    }

    impl GameState for TreeGame {
        type Action = char;

        fn legal_actions(&self, _agent: usize) -> Vec<char> {
            match &self.tree {
                Tree::Leaf(_) => Vec::new(),
                Tree::Node(children) => children.iter().map(|(a, _)| *a).collect(),
            }
        }

        fn generate_successor(&self, _agent: usize, action: &char) -> Self {
            let tree = match &self.tree {
                Tree::Node(children) => children
                    .iter()
                    .find(|(a, _)| a == action)
                    .map(|(_, t)| t.clone())
                    .unwrap_or(Tree::Leaf(f64::NAN)),
                Tree::Leaf(v) => Tree::Leaf(*v),
            };
            TreeGame {
                tree,
                agents: self.agents,
            }
        }

        fn is_terminal(&self) -> bool {
            matches!(self.tree, Tree::Leaf(_))
        }

        fn num_agents(&self) -> usize {
            self.agents
        }

        fn score(&self) -> f64 {
            match self.tree {
                Tree::Leaf(v) => v,
                Tree::Node(_) => 0.0,
            }
        }

        fn is_stop(action: &char) -> bool {
            *action == 's'
        }
    }

    fn node(children: Vec<(char, Tree)>) -> Tree {
        Tree::Node(children)
    }

    fn leaf(v: f64) -> Tree {
        Tree::Leaf(v)
    }

    /// The textbook two-ply tree: minimax value 3 via action `a`.
    fn textbook() -> TreeGame {
        TreeGame {
            agents: 2,
            tree: node(vec![
                ('a', node(vec![('x', leaf(3.0)), ('y', leaf(12.0)), ('z', leaf(8.0))])),
                ('b', node(vec![('x', leaf(2.0)), ('y', leaf(4.0)), ('z', leaf(6.0))])),
                ('c', node(vec![('x', leaf(14.0)), ('y', leaf(5.0)), ('z', leaf(2.0))])),
            ]),
        }
    }

    #[test]
    fn minimax_textbook() {
        let mut agent = MinimaxAgent::new(TreeSearchConfig::with_depth(1)).with_seed(7);
        let eval = agent.evaluate_root(&textbook());
        assert_float_eq!(eval.best_value().unwrap(), 3.0, abs <= 1e-12);
        assert_eq!(agent.get_action(&textbook()), Some('a'));
        assert_eq!(eval.nodes, 13);
    }

    #[test]
    fn alpha_beta_prunes_textbook() {
        let mut agent = AlphaBetaAgent::new(TreeSearchConfig::with_depth(1)).with_seed(7);
        let eval = agent.evaluate_root(&textbook());
        assert_float_eq!(eval.best_value().unwrap(), 3.0, abs <= 1e-12);
        // Action `b` is cut after its first reply (2 < 3).
        assert_eq!(eval.nodes, 11);
        assert_eq!(agent.get_action(&textbook()), Some('a'));
    }

    #[test]
    fn expectimax_averages_chance_nodes() {
        let mut agent = ExpectimaxAgent::new(TreeSearchConfig::with_depth(1)).with_seed(7);
        let eval = agent.evaluate_root(&textbook());
        // Means: a = 23/3, b = 4, c = 7.
        assert_float_eq!(eval.values[0].1, 23.0 / 3.0, abs <= 1e-12);
        assert_float_eq!(eval.values[1].1, 4.0, abs <= 1e-12);
        assert_float_eq!(eval.values[2].1, 7.0, abs <= 1e-12);
        assert_eq!(agent.get_action(&textbook()), Some('a'));
    }

    #[test]
    fn stop_is_never_chosen_when_another_move_exists() {
        let game = TreeGame {
            agents: 2,
            tree: node(vec![
                ('s', node(vec![('x', leaf(100.0))])),
                ('a', node(vec![('x', leaf(1.0))])),
            ]),
        };
        let mut agent = MinimaxAgent::new(TreeSearchConfig::with_depth(1)).with_seed(1);
        assert_eq!(agent.get_action(&game), Some('a'));
    }

    #[test]
    fn stop_alone_is_returned() {
        let game = TreeGame {
            agents: 2,
            tree: node(vec![('s', node(vec![('x', leaf(1.0))]))]),
        };
        let mut agent = AlphaBetaAgent::new(TreeSearchConfig::with_depth(1)).with_seed(1);
        assert_eq!(agent.get_action(&game), Some('s'));
    }

    #[test]
    fn no_legal_action_is_none() {
        let game = TreeGame {
            agents: 2,
            tree: leaf(5.0),
        };
        let mut agent = ExpectimaxAgent::new(TreeSearchConfig::default()).with_seed(1);
        assert_eq!(agent.get_action(&game), None);
    }

    #[test]
    fn custom_evaluation_applies_at_depth_cutoff() {
        // Depth 1 stops before agent 0 moves again, so the inner nodes get evaluated.
        let game = TreeGame {
            agents: 2,
            tree: node(vec![
                ('a', node(vec![('x', node(vec![('a', leaf(-50.0))]))])),
                ('b', node(vec![('x', node(vec![('a', leaf(50.0))]))])),
            ]),
        };
        let agent = MinimaxAgent::with_evaluation(TreeSearchConfig::with_depth(1), |_: &TreeGame| 1.0);
        let eval = agent.evaluate_root(&game);
        assert!(eval.values.iter().all(|(_, v)| *v == 1.0));

        let mut deeper = MinimaxAgent::new(TreeSearchConfig::with_depth(2)).with_seed(3);
        assert_eq!(deeper.get_action(&game), Some('b'));
    }

    #[test]
    fn agent_can_search_on_another_thread() {
        let threshold = 4.0;
        let agent = AlphaBetaAgent::with_evaluation(TreeSearchConfig::with_depth(1), move |g: &TreeGame| {
            g.score().min(threshold)
        })
        .with_seed(2);
        let handle = std::thread::spawn(move || agent.evaluate_root(&textbook()).best_value());
        assert_eq!(handle.join().unwrap(), Some(3.0));
    }

    #[test]
    fn ties_are_broken_among_best_actions_only() {
        let game = TreeGame {
            agents: 2,
            tree: node(vec![
                ('a', node(vec![('x', leaf(5.0))])),
                ('b', node(vec![('x', leaf(1.0))])),
                ('c', node(vec![('x', leaf(5.0))])),
            ]),
        };
        let mut agent = MinimaxAgent::new(TreeSearchConfig::with_depth(1)).with_seed(11);
        let mut seen = Vec::new();
        for _ in 0..64 {
            let action = agent.get_action(&game).unwrap();
            assert_ne!(action, 'b');
            if !seen.contains(&action) {
                seen.push(action);
            }
        }
        assert_eq!(seen.len(), 2);
    }
}
