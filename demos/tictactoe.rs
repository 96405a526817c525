extern crate pacsearch;

use pacsearch::game::GameState;
use pacsearch::multiagent::{AlphaBetaAgent, ExpectimaxAgent, MinimaxAgent};
use pacsearch::TreeSearchConfig;
use rand::seq::SliceRandom;

// X is agent 0 (the searching agent), O is agent 1
#[derive(Hash, Clone, Eq, PartialEq, Copy, Debug)]
enum Square {
    X,
    O,
    Empty,
}

type Board = [Square; 9];

#[derive(Hash, Clone, Eq, PartialEq, Debug)]
struct TicTacToe {
    board: Board,
}

impl TicTacToe {
    pub fn new() -> Self {
        TicTacToe {
            board: [Square::Empty; 9],
        }
    }

    pub fn do_move(&self, agent: usize, loc: usize) -> Self {
        let mut new_board = self.board;
        new_board[loc] = if agent == 0 { Square::X } else { Square::O };
        TicTacToe { board: new_board }
    }

    // returns Some(X), Some(O), and Some(Empty) on X win, O win, and draw, respectively
    // returns None if the game is not over
    pub fn check_over(&self) -> Option<Square> {
        const LINES: [(usize, usize); 8] = [
            (0, 1), // horizontal wins
            (3, 1),
            (6, 1),
            (0, 3), // vertical wins
            (1, 3),
            (2, 3),
            (0, 4), // diagonal wins
            (2, 2),
        ];

        for (start, step) in LINES {
            let b = &self.board;
            if b[start] != Square::Empty && b[start] == b[start + step] && b[start] == b[start + 2 * step] {
                return Some(b[start]);
            }
        }

        if self.board.iter().all(|s| s != &Square::Empty) {
            return Some(Square::Empty);
        }

        None
    }

    pub fn board_string(&self) -> String {
        let cells: Vec<char> = self
            .board
            .iter()
            .map(|c| match c {
                Square::X => 'X',
                Square::O => 'O',
                Square::Empty => ' ',
            })
            .collect();
        let division = "---------\n";
        let mut board_str = String::from("\n");
        for row in 0..3 {
            let r = &cells[row * 3..row * 3 + 3];
            board_str += format!("{} | {} | {}\n", r[0], r[1], r[2]).as_str();
            if row < 2 {
                board_str += division;
            }
        }
        board_str
    }
}

impl GameState for TicTacToe {
    type Action = usize;

    fn legal_actions(&self, _agent: usize) -> Vec<usize> {
        if self.check_over().is_some() {
            return Vec::new();
        }
        (0..9).filter(|&i| self.board[i] == Square::Empty).collect()
    }

    fn generate_successor(&self, agent: usize, action: &usize) -> Self {
        self.do_move(agent, *action)
    }

    fn is_terminal(&self) -> bool {
        self.check_over().is_some()
    }

    fn num_agents(&self) -> usize {
        2
    }

    fn score(&self) -> f64 {
        match self.check_over() {
            Some(Square::X) => 1.0,
            Some(Square::O) => -1.0,
            _ => 0.0,
        }
    }
}

fn main() {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    // empty board; 5 rounds cover the 9 plies of a full game
    let root = TicTacToe::new();
    let config = TreeSearchConfig::with_depth(5);

    let minimax = MinimaxAgent::<TicTacToe>::new(config).with_seed(1);
    let now = std::time::Instant::now();
    let plain = minimax.evaluate_root(&root);
    println!(
        "Minimax: value {:?}, {} nodes, {} ms",
        plain.best_value(),
        plain.nodes,
        now.elapsed().as_millis()
    );

    let mut alpha_beta = AlphaBetaAgent::<TicTacToe>::new(config).with_seed(1);
    let now = std::time::Instant::now();
    let pruned = alpha_beta.evaluate_root(&root);
    println!(
        "Alpha-beta: value {:?}, {} nodes, {} ms",
        pruned.best_value(),
        pruned.nodes,
        now.elapsed().as_millis()
    );

    // TicTacToe is a draw between perfect players
    assert_eq!(plain.best_value(), Some(0.0));
    assert_eq!(pruned.best_value(), plain.best_value());
    assert!(pruned.nodes <= plain.nodes);

    // an X in the top left and an O in the middle right: X can force a win
    let x_o_board = root.do_move(0, 0).do_move(1, 5);
    assert_eq!(alpha_beta.evaluate_root(&x_o_board).best_value(), Some(1.0));

    // alpha-beta X against an O that moves at random
    let mut rng = rand::thread_rng();
    let mut game = root.clone();
    println!("Alpha-beta X against a random O.{}", game.board_string());
    while !game.is_terminal() {
        let Some(x) = alpha_beta.get_action(&game) else { break };
        game = game.do_move(0, x);
        println!("{}", game.board_string());
        if game.is_terminal() {
            break;
        }
        let moves = game.legal_actions(1);
        if let Some(o) = moves.choose(&mut rng) {
            game = game.do_move(1, *o);
            println!("{}", game.board_string());
        }
    }
    // a random O can never beat a perfect X
    assert!(game.score() >= 0.0);

    let expectimax = ExpectimaxAgent::<TicTacToe>::new(TreeSearchConfig::with_depth(3)).with_seed(1);
    let eval = expectimax.evaluate_root(&root);
    println!("Expectimax against a random O values the opening at {:?}", eval.best_value());
}
