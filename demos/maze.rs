extern crate pacsearch;

use pacsearch::search::{self, SearchProblem, Strategy, Successor};

// '%' is a wall, 'P' the start and 'G' the food pellet to reach
const LAYOUT: &str = "\
%%%%%%%%%%%%%%%%%%%%
%......%.........%.%
%.%%%%.%.%%%%%%%.%.%
%.%..........%...%.%
%.%.%%%%%%%%.%.%%%.%
%...%......%...%...%
%%%.%.%%%%.%%%.%.%%%
%P..%....%.......%.%
%%%%%%%%.%%%%%%%%%.%
%G................%%
%%%%%%%%%%%%%%%%%%%%";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    const ALL: [Direction; 4] = [Self::North, Self::South, Self::East, Self::West];

    fn delta(&self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::South => (0, 1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
        }
    }
}

type Position = (i32, i32);

struct Maze {
    walls: Vec<Vec<bool>>,
    start: Position,
    goal: Position,
}

impl Maze {
    fn parse(layout: &str) -> Self {
        let mut start = (0, 0);
        let mut goal = (0, 0);
        let walls = layout
            .lines()
            .enumerate()
            .map(|(y, line)| {
                line.chars()
                    .enumerate()
                    .map(|(x, c)| {
                        match c {
                            'P' => start = (x as i32, y as i32),
                            'G' => goal = (x as i32, y as i32),
                            _ => (),
                        }
                        c == '%'
                    })
                    .collect()
            })
            .collect();
        Maze { walls, start, goal }
    }

    fn is_wall(&self, (x, y): Position) -> bool {
        self.walls
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
            .unwrap_or(true)
    }
}

impl SearchProblem for Maze {
    type State = Position;
    type Action = Direction;

    fn starting_state(&self) -> Position {
        self.start
    }

    fn is_goal(&self, state: &Position) -> bool {
        *state == self.goal
    }

    fn successor_states(&self, &(x, y): &Position) -> impl IntoIterator<Item = Successor<Position, Direction>> {
        Direction::ALL.into_iter().filter_map(move |d| {
            let (dx, dy) = d.delta();
            let next = (x + dx, y + dy);
            (!self.is_wall(next)).then(|| Successor::new(next, d, 1.0))
        })
    }
}

fn manhattan(state: &Position, problem: &Maze) -> f64 {
    ((state.0 - problem.goal.0).abs() + (state.1 - problem.goal.1).abs()) as f64
}

fn main() {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    let maze = Maze::parse(LAYOUT);
    println!("Searching from {:?} to {:?}.", maze.start, maze.goal);

    let runs = [
        ("depth-first", search::solve(&maze, Strategy::DepthFirst)),
        ("breadth-first", search::solve(&maze, Strategy::BreadthFirst)),
        ("uniform-cost", search::solve(&maze, Strategy::UniformCost)),
        ("A* (manhattan)", search::solve(&maze, Strategy::AStar(&manhattan))),
    ];

    for (name, outcome) in &runs {
        println!(
            "{name:>15}: found {}, {} actions, cost {}, {} nodes expanded",
            outcome.found,
            outcome.actions.len(),
            outcome.cost,
            outcome.expanded
        );
        let (end, _) = search::replay(&maze, &outcome.actions).expect("plan replays");
        assert_eq!(end, maze.goal);
    }

    // the last three are optimal, and A* should not expand more than UCS
    assert_eq!(runs[1].1.cost, runs[2].1.cost);
    assert_eq!(runs[2].1.cost, runs[3].1.cost);
    assert!(runs[3].1.expanded <= runs[2].1.expanded);
}
