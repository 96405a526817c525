use std::rc::Rc;

use pacsearch::game::GameState;
use pacsearch::learning::{ActionSpace, Mdp};
use pacsearch::search::{SearchProblem, Successor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A 46-step unit-cost maze from 'S' to 'G'.
#[allow(dead_code)]
pub const MAZE: &str = "\
%%%%%%%%%%%%%%%%%%%%
%......%.........%.%
%.%%%%.%.%%%%%%%.%.%
%.%..........%...%.%
%.%.%%%%%%%%.%.%%%.%
%...%......%...%...%
%%%.%.%%%%.%%%.%.%%%
%S..%....%.......%.%
%%%%%%%%.%%%%%%%%%.%
%G................%%
%%%%%%%%%%%%%%%%%%%%";

/// Going straight east costs 28 in 4 steps; the detour costs 8 in 8 steps.
#[allow(dead_code)]
pub const TOLL_ROAD: &str = "\
%%%%%%%
%S999G%
%.%%%.%
%.....%
%%%%%%%";

/// The goal is walled off.
#[allow(dead_code)]
pub const SEALED: &str = "\
%%%%%%
%S.%G%
%..%.%
%%%%%%";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Heading {
    North,
    South,
    East,
    West,
}

impl Heading {
    pub const ALL: [Heading; 4] = [Self::North, Self::South, Self::East, Self::West];

    fn delta(&self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::South => (0, 1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
        }
    }
}

/// A grid maze. '%' is a wall, a digit is the cost of stepping onto that
/// square, anything else costs 1.
#[derive(Debug, Clone)]
pub struct GridMaze {
    cells: Vec<Vec<char>>,
    pub start: (i32, i32),
    pub goal: (i32, i32),
}

#[allow(dead_code)]
impl GridMaze {
    pub fn parse(layout: &str) -> Self {
        let cells: Vec<Vec<char>> = layout.lines().map(|l| l.chars().collect()).collect();
        let find = |target: char| {
            cells
                .iter()
                .enumerate()
                .find_map(|(y, row)| row.iter().position(|c| *c == target).map(|x| (x as i32, y as i32)))
                .unwrap_or_else(|| panic!("layout has no '{target}'"))
        };
        let (start, goal) = (find('S'), find('G'));
        Self { cells, start, goal }
    }

    fn at(&self, (x, y): (i32, i32)) -> char {
        if x < 0 || y < 0 {
            return '%';
        }
        self.cells
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
            .unwrap_or('%')
    }

    pub fn manhattan(state: &(i32, i32), maze: &GridMaze) -> f64 {
        ((state.0 - maze.goal.0).abs() + (state.1 - maze.goal.1).abs()) as f64
    }
}

impl SearchProblem for GridMaze {
    type State = (i32, i32);
    type Action = Heading;

    fn starting_state(&self) -> (i32, i32) {
        self.start
    }

    fn is_goal(&self, state: &(i32, i32)) -> bool {
        *state == self.goal
    }

    fn successor_states(&self, &(x, y): &(i32, i32)) -> impl IntoIterator<Item = Successor<(i32, i32), Heading>> {
        Heading::ALL.into_iter().filter_map(move |h| {
            let (dx, dy) = h.delta();
            let next = (x + dx, y + dy);
            match self.at(next) {
                '%' => None,
                c => Some(Successor::new(next, h, c.to_digit(10).map_or(1.0, f64::from))),
            }
        })
    }
}

/// The 4x3 gridworld. (1, 1) is a wall, (3, 2) exits with +1 and (3, 1) with -1.
/// y grows upward.
#[derive(Clone, Copy, Debug)]
pub struct Gridworld {
    pub noise: f64,
    pub living_reward: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    At(i32, i32),
    Terminal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Move {
    North,
    South,
    East,
    West,
    Exit,
}

#[allow(dead_code)]
impl Gridworld {
    pub const WALL: (i32, i32) = (1, 1);

    pub fn deterministic() -> Self {
        Self {
            noise: 0.0,
            living_reward: 0.0,
        }
    }

    pub fn noisy() -> Self {
        Self {
            noise: 0.2,
            living_reward: 0.0,
        }
    }

    fn exit_reward(&self, pos: (i32, i32)) -> Option<f64> {
        match pos {
            (3, 2) => Some(1.0),
            (3, 1) => Some(-1.0),
            _ => None,
        }
    }

    fn is_open(&self, (x, y): (i32, i32)) -> bool {
        (0..4).contains(&x) && (0..3).contains(&y) && (x, y) != Self::WALL
    }

    fn step(&self, (x, y): (i32, i32), m: Move) -> Cell {
        let (dx, dy) = match m {
            Move::North => (0, 1),
            Move::South => (0, -1),
            Move::East => (1, 0),
            Move::West => (-1, 0),
            Move::Exit => (0, 0),
        };
        if self.is_open((x + dx, y + dy)) {
            Cell::At(x + dx, y + dy)
        } else {
            Cell::At(x, y)
        }
    }

    /// Samples the outcome of `action` in `state`.
    pub fn sample(&self, state: &Cell, action: &Move, rng: &mut impl Rng) -> Cell {
        let outcomes = self.transition_states_and_probs(state, action);
        let mut roll: f64 = rng.gen();
        for (next, p) in &outcomes {
            if roll < *p {
                return *next;
            }
            roll -= p;
        }
        outcomes.last().map_or(Cell::Terminal, |(next, _)| *next)
    }
}

impl Mdp for Gridworld {
    type State = Cell;
    type Action = Move;

    fn states(&self) -> Vec<Cell> {
        let mut states = vec![Cell::Terminal];
        for x in 0..4 {
            for y in 0..3 {
                if self.is_open((x, y)) {
                    states.push(Cell::At(x, y));
                }
            }
        }
        states
    }

    fn possible_actions(&self, state: &Cell) -> Vec<Move> {
        match *state {
            Cell::Terminal => Vec::new(),
            Cell::At(x, y) if self.exit_reward((x, y)).is_some() => vec![Move::Exit],
            Cell::At(..) => vec![Move::North, Move::South, Move::East, Move::West],
        }
    }

    fn transition_states_and_probs(&self, state: &Cell, action: &Move) -> Vec<(Cell, f64)> {
        let Cell::At(x, y) = *state else {
            return Vec::new();
        };
        let sideways = match action {
            Move::Exit => return vec![(Cell::Terminal, 1.0)],
            Move::North | Move::South => [Move::East, Move::West],
            Move::East | Move::West => [Move::North, Move::South],
        };

        let mut outcomes: Vec<(Cell, f64)> = Vec::new();
        for (m, p) in [
            (*action, 1.0 - self.noise),
            (sideways[0], self.noise / 2.0),
            (sideways[1], self.noise / 2.0),
        ] {
            if p <= 0.0 {
                continue;
            }
            let next = self.step((x, y), m);
            match outcomes.iter_mut().find(|(c, _)| *c == next) {
                Some((_, q)) => *q += p,
                None => outcomes.push((next, p)),
            }
        }
        outcomes
    }

    fn reward(&self, state: &Cell, action: &Move, _next: &Cell) -> f64 {
        match (*state, *action) {
            (Cell::At(x, y), Move::Exit) => self.exit_reward((x, y)).unwrap_or(0.0),
            _ => self.living_reward,
        }
    }

    fn is_terminal(&self, state: &Cell) -> bool {
        *state == Cell::Terminal
    }
}

impl ActionSpace for Gridworld {
    type State = Cell;
    type Action = Move;

    fn legal_actions(&self, state: &Cell) -> Vec<Move> {
        self.possible_actions(state)
    }
}

/// A node of an explicit game tree. Every node has a score; a node
/// without children is terminal.
#[derive(Debug)]
pub struct Tree {
    pub score: f64,
    pub children: Vec<Rc<Tree>>,
}

/// Shape of a random game tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeShape {
    pub agents: usize,
    pub plies: usize,
    pub max_branching: usize,
    /// Non-root agents get exactly one action.
    pub forced_opponents: bool,
    /// Chance that an inner node is terminal anyway.
    pub early_end: f64,
}

#[allow(dead_code)]
pub fn random_tree(shape: TreeShape, seed: u64) -> Rc<Tree> {
    let mut rng = StdRng::seed_from_u64(seed);
    grow(&shape, 0, &mut rng)
}

fn grow(shape: &TreeShape, ply: usize, rng: &mut StdRng) -> Rc<Tree> {
    // small integer scores so that ties are common
    let score = rng.gen_range(-5..=5) as f64;
    let ends = ply == shape.plies || (ply > 0 && rng.gen_bool(shape.early_end));
    let children = if ends {
        Vec::new()
    } else {
        let branching = if shape.forced_opponents && ply % shape.agents != 0 {
            1
        } else {
            rng.gen_range(1..=shape.max_branching)
        };
        (0..branching).map(|_| grow(shape, ply + 1, rng)).collect()
    };
    Rc::new(Tree { score, children })
}

/// Plays an explicit [`Tree`]: the action is the index of the child.
#[derive(Debug, Clone)]
pub struct TreeGame {
    pub node: Rc<Tree>,
    pub agents: usize,
}

impl GameState for TreeGame {
    type Action = usize;

    fn legal_actions(&self, _agent: usize) -> Vec<usize> {
        (0..self.node.children.len()).collect()
    }

    fn generate_successor(&self, _agent: usize, action: &usize) -> Self {
        Self {
            node: Rc::clone(&self.node.children[*action]),
            agents: self.agents,
        }
    }

    fn is_terminal(&self) -> bool {
        self.node.children.is_empty()
    }

    fn num_agents(&self) -> usize {
        self.agents
    }

    fn score(&self) -> f64 {
        self.node.score
    }
}
