mod board;
mod bot_controller;
mod controller;
mod probe;
mod runner;
mod trap;
mod types;
mod win_detector;

pub use board::Board;
pub use bot_controller::{MEDIUM_MISTAKE_PROBABILITY, SearchEngine, calculate_minimax_move};
pub use controller::{ControllerState, GameController, GameMode, MoveReport};
pub use runner::{BoxedSync, GameEvent, GameRunner, GameUpdate, OnlineSettings};
pub use trap::find_trap;
pub use types::{BOARD_SIZE, CELL_COUNT, Cell, Difficulty, Mark, Outcome, Position, WinningLine};
pub use win_detector::{check_win, check_win_with_line, winning_cells};
