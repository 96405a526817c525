//! Generic graph search over a [`SearchProblem`].
//!
//! All four strategies share [`graph_search`]; they only differ in the
//! [`Frontier`] they hand it and in how a node's priority is computed.
//! Failing to reach a goal is a normal outcome and yields an empty plan.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::hash::Hash;

use rustc_hash::FxHashSet;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};

/// One outgoing edge of a state.
#[derive(Debug, Clone, PartialEq)]
pub struct Successor<S, A> {
    pub state: S,
    pub action: A,
    pub cost: f64,
}

impl<S, A> Successor<S, A> {
    pub fn new(state: S, action: A, cost: f64) -> Self {
        Self {
            state,
            action,
            cost,
        }
    }
}

/// A problem that the search functions can solve.
///
/// States are only ever compared, hashed and cloned; the search never
/// looks inside them. Step costs are expected to be strictly positive.
pub trait SearchProblem {
    type State: Clone + Eq + Hash;
    type Action: Clone;

    fn starting_state(&self) -> Self::State;

    fn is_goal(&self, state: &Self::State) -> bool;

    /// The states reachable from `state` in one step, with the action and cost of each.
    fn successor_states(
        &self,
        state: &Self::State,
    ) -> impl IntoIterator<Item = Successor<Self::State, Self::Action>>;
}

/// A frontier entry: a state together with the plan and cost that reached it.
#[derive(Debug, Clone)]
pub struct Node<S, A> {
    pub state: S,
    pub actions: Vec<A>,
    pub cost: f64,
}

/// The container of discovered but unexpanded nodes. Its pop order is the strategy.
pub trait Frontier<T> {
    /// Adds an item. Containers without an ordering ignore `priority`.
    fn push(&mut self, item: T, priority: f64);

    fn pop(&mut self) -> Option<T>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// LIFO frontier (depth-first).
#[derive(Debug)]
pub struct Stack<T>(Vec<T>);

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> Frontier<T> for Stack<T> {
    fn push(&mut self, item: T, _priority: f64) {
        self.0.push(item);
    }

    fn pop(&mut self) -> Option<T> {
        self.0.pop()
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

/// FIFO frontier (breadth-first).
#[derive(Debug)]
pub struct Queue<T>(VecDeque<T>);

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self(VecDeque::new())
    }
}

impl<T> Frontier<T> for Queue<T> {
    fn push(&mut self, item: T, _priority: f64) {
        self.0.push_back(item);
    }

    fn pop(&mut self) -> Option<T> {
        self.0.pop_front()
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

struct Prioritized<T> {
    priority: f64,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Prioritized<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Prioritized<T> {}

impl<T> PartialOrd for Prioritized<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Prioritized<T> {
    // BinaryHeap is a max-heap: reversed so the lowest priority, then the
    // oldest insertion, comes out first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-priority frontier. Equal priorities pop in insertion order.
pub struct PriorityQueue<T> {
    heap: BinaryHeap<Prioritized<T>>,
    next_seq: u64,
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<T> Frontier<T> for PriorityQueue<T> {
    fn push(&mut self, item: T, priority: f64) {
        self.heap.push(Prioritized {
            priority,
            seq: self.next_seq,
            item,
        });
        self.next_seq += 1;
    }

    fn pop(&mut self) -> Option<T> {
        self.heap.pop().map(|p| p.item)
    }

    fn len(&self) -> usize {
        self.heap.len()
    }
}

/// Result of a search: the plan, its cost and how many states were expanded.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome<A> {
    pub actions: Vec<A>,
    pub cost: f64,
    pub expanded: usize,
    pub found: bool,
}

impl<A> SearchOutcome<A> {
    fn failure(expanded: usize) -> Self {
        Self {
            actions: Vec::new(),
            cost: 0.0,
            expanded,
            found: false,
        }
    }
}

/// The shared graph-search template.
///
/// The goal test runs when a node leaves the frontier. A state is expanded at
/// most once, and successors that were already expanded are not pushed again.
pub fn graph_search<P, F, Pr>(problem: &P, mut frontier: F, priority: Pr) -> SearchOutcome<P::Action>
where
    P: SearchProblem,
    F: Frontier<Node<P::State, P::Action>>,
    Pr: Fn(&Node<P::State, P::Action>) -> f64,
{
    let start = problem.starting_state();
    if problem.is_goal(&start) {
        debug!("starting state is already a goal");
        return SearchOutcome {
            actions: Vec::new(),
            cost: 0.0,
            expanded: 0,
            found: true,
        };
    }

    let root = Node {
        state: start,
        actions: Vec::new(),
        cost: 0.0,
    };
    let root_priority = priority(&root);
    frontier.push(root, root_priority);

    let mut visited: FxHashSet<P::State> = FxHashSet::default();
    let mut expanded = 0;

    while let Some(node) = frontier.pop() {
        if problem.is_goal(&node.state) {
            debug!(
                expanded,
                length = node.actions.len(),
                cost = node.cost,
                "goal reached"
            );
            return SearchOutcome {
                actions: node.actions,
                cost: node.cost,
                expanded,
                found: true,
            };
        }

        if !visited.insert(node.state.clone()) {
            continue;
        }
        expanded += 1;
        trace!(
            expanded,
            depth = node.actions.len(),
            cost = node.cost,
            frontier = frontier.len(),
            "expanding node"
        );

        for successor in problem.successor_states(&node.state) {
            if visited.contains(&successor.state) {
                continue;
            }
            if successor.cost <= 0.0 {
                warn!(cost = successor.cost, "non-positive step cost");
            }

            let mut actions = Vec::with_capacity(node.actions.len() + 1);
            actions.extend(node.actions.iter().cloned());
            actions.push(successor.action);

            let child = Node {
                state: successor.state,
                actions,
                cost: node.cost + successor.cost,
            };
            let child_priority = priority(&child);
            frontier.push(child, child_priority);
        }
    }

    debug!(expanded, "frontier exhausted without reaching a goal");
    SearchOutcome::failure(expanded)
}

/// Which frontier discipline to run, for use with [`solve`].
pub enum Strategy<'h, P: SearchProblem> {
    DepthFirst,
    BreadthFirst,
    UniformCost,
    AStar(&'h dyn Fn(&P::State, &P) -> f64),
}

/// Runs `strategy` on `problem` and returns the full [`SearchOutcome`].
pub fn solve<P: SearchProblem>(problem: &P, strategy: Strategy<'_, P>) -> SearchOutcome<P::Action> {
    match strategy {
        Strategy::DepthFirst => graph_search(problem, Stack::default(), |_| 0.0),
        Strategy::BreadthFirst => graph_search(problem, Queue::default(), |_| 0.0),
        Strategy::UniformCost => graph_search(problem, PriorityQueue::default(), |n| n.cost),
        Strategy::AStar(heuristic) => graph_search(problem, PriorityQueue::default(), |n| {
            n.cost + heuristic(&n.state, problem)
        }),
    }
}

/// Searches the deepest nodes first. The plan is not guaranteed to be shortest.
pub fn depth_first_search<P: SearchProblem>(problem: &P) -> Vec<P::Action> {
    solve(problem, Strategy::DepthFirst).actions
}

/// Searches the shallowest nodes first; returns a plan with the fewest actions.
pub fn breadth_first_search<P: SearchProblem>(problem: &P) -> Vec<P::Action> {
    solve(problem, Strategy::BreadthFirst).actions
}

/// Searches the node of least total cost first.
pub fn uniform_cost_search<P: SearchProblem>(problem: &P) -> Vec<P::Action> {
    solve(problem, Strategy::UniformCost).actions
}

/// Searches the node with the lowest cost plus heuristic first.
///
/// The plan is optimal when `heuristic` is consistent.
pub fn a_star_search<P, H>(problem: &P, heuristic: H) -> Vec<P::Action>
where
    P: SearchProblem,
    H: Fn(&P::State, &P) -> f64,
{
    solve(problem, Strategy::AStar(&heuristic)).actions
}

/// The trivial heuristic. A* with it behaves like uniform-cost search.
pub fn null_heuristic<S, P>(_state: &S, _problem: &P) -> f64 {
    0.0
}

/// Replays `actions` from the starting state, following the first successor
/// that matches each action, and returns the final state and total cost.
pub fn replay<P>(problem: &P, actions: &[P::Action]) -> Result<(P::State, f64)>
where
    P: SearchProblem,
    P::Action: PartialEq,
{
    let mut state = problem.starting_state();
    let mut cost = 0.0;

    for (step, action) in actions.iter().enumerate() {
        let successor = problem
            .successor_states(&state)
            .into_iter()
            .find(|s| &s.action == action)
            .ok_or(Error::IllegalAction { step })?;
        if successor.cost <= 0.0 {
            return Err(Error::NonPositiveStepCost {
                cost: successor.cost,
            });
        }
        cost += successor.cost;
        state = successor.state;
    }

    Ok((state, cost))
}
