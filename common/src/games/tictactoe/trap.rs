use super::board::Board;
use super::probe::Probe;
use super::types::{Mark, Position};
use super::win_detector::winning_cells;

/// Looks for a move that leaves `mark` with a win the opponent cannot stop
/// with a single reply. An immediate win always comes first; otherwise the
/// first fork of two threats in row-major order is returned. The board is
/// left exactly as it was received.
pub fn find_trap(board: &mut Board, mark: Mark) -> Option<Position> {
    if board.terminal_state().is_terminal() {
        return None;
    }

    if let Some(&win) = winning_cells(board.cells(), mark).first() {
        return Some(win);
    }

    for candidate in board.legal_moves() {
        let Ok(mut probe) = Probe::place(board, candidate, mark) else {
            continue;
        };

        let mut threats = 0;
        if wins_or_threatens(&probe, mark) {
            threats += 1;
        }
        if survives_every_block(&mut probe, mark) {
            threats += 1;
        }
        drop(probe);

        if threats >= 2 {
            return Some(candidate);
        }
    }

    None
}

fn wins_or_threatens(board: &Board, mark: Mark) -> bool {
    board.terminal_state().winner() == Some(mark) || has_winning_continuation(board, mark)
}

/// True when, whatever single cell the opponent takes next, `mark` still
/// has a winning continuation and the opponent has not won with that reply.
fn survives_every_block(board: &mut Board, mark: Mark) -> bool {
    let outcome = board.terminal_state();
    if outcome.winner() == Some(mark) {
        return true;
    }
    if outcome.is_terminal() {
        return false;
    }

    let opponent = mark.opponent();
    for reply in board.legal_moves() {
        let Ok(probe) = Probe::place(board, reply, opponent) else {
            return false;
        };
        if probe.terminal_state().winner() == Some(opponent) {
            return false;
        }
        if !has_winning_continuation(&probe, mark) {
            return false;
        }
    }
    true
}

fn has_winning_continuation(board: &Board, mark: Mark) -> bool {
    !winning_cells(board.cells(), mark).is_empty()
}
