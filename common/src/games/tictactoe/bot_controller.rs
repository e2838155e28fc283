use crate::games::session_rng::{RandomSource, SessionRng};
use super::board::Board;
use super::probe::Probe;
use super::trap::find_trap;
use super::types::{Difficulty, Mark, Outcome, Position};

const WIN_SCORE: i32 = 10;

/// Chance that a medium bot throws its move away on a random cell.
pub const MEDIUM_MISTAKE_PROBABILITY: f64 = 0.25;

pub struct SearchEngine<R: RandomSource = SessionRng> {
    rng: R,
}

impl SearchEngine<SessionRng> {
    pub fn from_seed(seed: u64) -> Self {
        Self::new(SessionRng::new(seed))
    }
}

impl<R: RandomSource> SearchEngine<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Picks a move for `mark`. `board` is scratch space: probes are placed
    /// and undone during the search and the board comes back unchanged.
    /// Returns `None` when there is nothing left to play.
    pub fn choose_move(
        &mut self,
        board: &mut Board,
        difficulty: Difficulty,
        mark: Mark,
    ) -> Option<Position> {
        let available_moves = board.legal_moves();
        if available_moves.is_empty() || board.terminal_state().is_terminal() {
            return None;
        }

        match difficulty {
            Difficulty::Easy => Some(self.random_move(&available_moves)),
            Difficulty::Medium => {
                if self.rng.chance(MEDIUM_MISTAKE_PROBABILITY) {
                    Some(self.random_move(&available_moves))
                } else {
                    calculate_minimax_move(board, mark)
                }
            }
            Difficulty::Hard => {
                find_trap(board, mark).or_else(|| calculate_minimax_move(board, mark))
            }
        }
    }

    fn random_move(&mut self, available_moves: &[Position]) -> Position {
        available_moves[self.rng.pick_index(available_moves.len())]
    }
}

/// Exhaustive minimax. Ties go to the earliest move in row-major order.
pub fn calculate_minimax_move(board: &mut Board, bot_mark: Mark) -> Option<Position> {
    let mut best_move = None;
    let mut best_score = i32::MIN;

    for position in board.legal_moves() {
        let Ok(mut probe) = Probe::place(board, position, bot_mark) else {
            continue;
        };
        let score = minimax(&mut probe, 0, false, bot_mark, best_score, i32::MAX);
        drop(probe);

        if best_move.is_none() || score > best_score {
            best_score = score;
            best_move = Some(position);
        }
    }

    best_move
}

/// Scores the position for `bot_mark`: `10 - depth` for its wins,
/// `depth - 10` for losses, 0 for a draw. Alpha-beta bounds only skip
/// branches that cannot change which root move wins.
fn minimax(
    board: &mut Board,
    depth: i32,
    is_maximizing: bool,
    bot_mark: Mark,
    mut alpha: i32,
    mut beta: i32,
) -> i32 {
    match board.terminal_state() {
        Outcome::InProgress => {}
        Outcome::Draw => return 0,
        outcome => {
            return if outcome.winner() == Some(bot_mark) {
                WIN_SCORE - depth
            } else {
                depth - WIN_SCORE
            };
        }
    }

    let moves = board.legal_moves();

    if is_maximizing {
        let mut max_eval = i32::MIN;
        for position in moves {
            let Ok(mut probe) = Probe::place(board, position, bot_mark) else {
                continue;
            };
            let eval = minimax(&mut probe, depth + 1, false, bot_mark, alpha, beta);
            drop(probe);

            max_eval = max_eval.max(eval);
            alpha = alpha.max(eval);
            if beta <= alpha {
                break;
            }
        }
        if max_eval == i32::MIN { 0 } else { max_eval }
    } else {
        let opponent_mark = bot_mark.opponent();
        let mut min_eval = i32::MAX;
        for position in moves {
            let Ok(mut probe) = Probe::place(board, position, opponent_mark) else {
                continue;
            };
            let eval = minimax(&mut probe, depth + 1, true, bot_mark, alpha, beta);
            drop(probe);

            min_eval = min_eval.min(eval);
            beta = beta.min(eval);
            if beta <= alpha {
                break;
            }
        }
        if min_eval == i32::MAX { 0 } else { min_eval }
    }
}
