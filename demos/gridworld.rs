extern crate pacsearch;

use pacsearch::learning::{
    ActionSpace, Mdp, QLearningAgent, ReinforcementLearner, ValueEstimation, ValueIterationAgent,
};
use pacsearch::LearningParams;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;

// y grows upward: the +1 exit is in the top right corner
const WIDTH: i32 = 4;
const HEIGHT: i32 = 3;
const WALL: (i32, i32) = (1, 1);
const EXITS: [((i32, i32), f64); 2] = [((3, 2), 1.0), ((3, 1), -1.0)];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Cell {
    At(i32, i32),
    // where every exit leads
    Terminal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Move {
    North,
    South,
    East,
    West,
    Exit,
}

impl Move {
    fn delta(&self) -> (i32, i32) {
        match self {
            Self::North => (0, 1),
            Self::South => (0, -1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
            Self::Exit => (0, 0),
        }
    }

    // the two directions a noisy move slips into
    fn sideways(&self) -> [Move; 2] {
        match self {
            Self::North | Self::South => [Self::East, Self::West],
            _ => [Self::North, Self::South],
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Gridworld {
    noise: f64,
    living_reward: f64,
}

impl Gridworld {
    fn exit_reward(&self, (x, y): (i32, i32)) -> Option<f64> {
        EXITS.iter().find(|(pos, _)| *pos == (x, y)).map(|(_, r)| *r)
    }

    fn is_open(&self, (x, y): (i32, i32)) -> bool {
        (0..WIDTH).contains(&x) && (0..HEIGHT).contains(&y) && (x, y) != WALL
    }

    fn step(&self, (x, y): (i32, i32), m: Move) -> Cell {
        let (dx, dy) = m.delta();
        let next = (x + dx, y + dy);
        if self.is_open(next) {
            Cell::At(next.0, next.1)
        } else {
            Cell::At(x, y)
        }
    }
}

impl Mdp for Gridworld {
    type State = Cell;
    type Action = Move;

    fn states(&self) -> Vec<Cell> {
        let mut states = vec![Cell::Terminal];
        for x in 0..WIDTH {
            for y in 0..HEIGHT {
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
        if *action == Move::Exit {
            return vec![(Cell::Terminal, 1.0)];
        }

        let [left, right] = action.sideways();
        let mut outcomes: Vec<(Cell, f64)> = Vec::new();
        for (m, p) in [
            (*action, 1.0 - self.noise),
            (left, self.noise / 2.0),
            (right, self.noise / 2.0),
        ] {
            let next = self.step((x, y), m);
            match outcomes.iter_mut().find(|(c, _)| *c == next) {
                Some((_, q)) => *q += p,
                None => outcomes.push((next, p)),
            }
        }
        outcomes.retain(|(_, p)| *p > 0.0);
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

fn print_values(title: &str, value: impl Fn(&Cell) -> f64, policy: impl Fn(&Cell) -> Option<Move>) {
    println!("{title}");
    for y in (0..HEIGHT).rev() {
        let row: Vec<String> = (0..WIDTH)
            .map(|x| {
                if (x, y) == WALL {
                    return format!("{:^14}", "#####");
                }
                let cell = Cell::At(x, y);
                let arrow = match policy(&cell) {
                    Some(Move::North) => "^",
                    Some(Move::South) => "v",
                    Some(Move::East) => ">",
                    Some(Move::West) => "<",
                    Some(Move::Exit) => "x",
                    None => " ",
                };
                format!("{:>8.3} {arrow:<5}", value(&cell))
            })
            .collect();
        println!("{}", row.join("|"));
    }
}

fn main() {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    let world = Gridworld {
        noise: 0.2,
        living_reward: 0.0,
    };

    let mut planner = ValueIterationAgent::try_new(world, 0.9, 100).expect("valid gridworld");
    let parallel = ValueIterationAgent::new_parallel(world, 0.9, 100);
    for (state, v) in planner.values() {
        assert!((v - parallel.value(state)).abs() < 1e-12);
    }
    let policies: Vec<(Cell, Option<Move>)> = world
        .states()
        .into_iter()
        .map(|s| (s, planner.policy(&s)))
        .collect();
    let lookup = |c: &Cell| policies.iter().find(|(s, _)| s == c).and_then(|(_, m)| *m);
    print_values("Value iteration, 100 sweeps:", |c| planner.value(c), lookup);

    // the learner only sees sampled transitions, never the model
    let episodes = 2000;
    let params = LearningParams::new(0.5, 0.3, 0.9).with_num_training(episodes);
    let mut learner = QLearningAgent::new(world, params).with_seed(7);
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..episodes {
        learner.start_episode();
        let mut state = Cell::At(0, 0);
        while let Some(action) = learner.get_action(&state) {
            let outcomes = world.transition_states_and_probs(&state, &action);
            let pick = WeightedIndex::new(outcomes.iter().map(|(_, p)| *p)).expect("non-empty distribution");
            let next = outcomes[pick.sample(&mut rng)].0;
            let reward = world.reward(&state, &action, &next);
            learner.update(&state, &action, &next, reward);
            state = next;
        }
        learner.stop_episode();
    }
    assert!(!learner.is_in_training());

    let greedy: Vec<(Cell, Option<Move>)> = world
        .states()
        .into_iter()
        .map(|s| (s, learner.policy(&s)))
        .collect();
    let lookup = |c: &Cell| greedy.iter().find(|(s, _)| s == c).and_then(|(_, m)| *m);
    print_values(
        &format!("Q-learning, {episodes} episodes:"),
        |c| learner.value(c),
        lookup,
    );
}
