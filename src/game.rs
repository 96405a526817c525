//! Holds the base trait for a multi-agent game that the tree-search agents can play.
//! To use the [`crate::multiagent`] agents, implement [`GameState`] for your game.

/// The part an agent plays in a search tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRole {
    /// Picks the child with the largest value.
    Maximizer,
    /// Picks the child with the smallest value.
    Minimizer,
    /// Moves uniformly at random: its value is the mean of its children.
    Chance,
}

impl AgentRole {
    /// The value a node of this role starts folding its children from.
    pub const fn identity(&self) -> f64 {
        match self {
            Self::Maximizer => f64::NEG_INFINITY,
            Self::Minimizer => f64::INFINITY,
            Self::Chance => 0.0,
        }
    }
}

/// How non-root agents are modelled by a search algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpponentModel {
    /// Every other agent plays against agent 0 (minimax, alpha-beta).
    Adversarial,
    /// Every other agent moves uniformly at random (expectimax).
    Stochastic,
}

/// Position in the round-robin of agents while walking the search tree.
///
/// One unit of `depth` is one full round in which every agent has moved
/// once. The depth grows exactly when play wraps from the last agent back
/// to agent 0, whatever the number of agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Turn {
    pub agent: usize,
    pub depth: usize,
}

impl Turn {
    /// Agent 0 to move, nothing searched yet.
    pub const fn root() -> Self {
        Self { agent: 0, depth: 0 }
    }

    /// The turn after the current agent has moved.
    pub const fn advance(self, num_agents: usize) -> Self {
        if self.agent + 1 >= num_agents {
            Self {
                agent: 0,
                depth: self.depth + 1,
            }
        } else {
            Self {
                agent: self.agent + 1,
                depth: self.depth,
            }
        }
    }

    pub const fn role(&self, model: OpponentModel) -> AgentRole {
        match (self.agent, model) {
            (0, _) => AgentRole::Maximizer,
            (_, OpponentModel::Adversarial) => AgentRole::Minimizer,
            (_, OpponentModel::Stochastic) => AgentRole::Chance,
        }
    }
}

/// A turn-based game with any number of agents. Agent 0 is the maximizer.
///
/// To implement this trait, you must implement [`GameState::legal_actions`],
/// [`GameState::generate_successor`], [`GameState::is_terminal`],
/// [`GameState::num_agents`] and [`GameState::score`]. Games with a
/// "do nothing" move that the searching agent should never pick implement
/// [`GameState::is_stop`] as well.
pub trait GameState: Sized + Clone {
    type Action: Clone + PartialEq;

    /// The actions `agent` may take in this state.
    fn legal_actions(&self, agent: usize) -> Vec<Self::Action>;

    /// The state after `agent` takes `action`.
    fn generate_successor(&self, agent: usize, action: &Self::Action) -> Self;

    /// Whether the game is over (won or lost).
    fn is_terminal(&self) -> bool;

    fn num_agents(&self) -> usize;

    /// The game score, used as the default evaluation function.
    fn score(&self) -> f64;

    /// Whether `action` is the no-op sentinel. Agent 0 never picks it during search.
    fn is_stop(_action: &Self::Action) -> bool {
        false
    }
}
