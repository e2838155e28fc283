use crate::error::{GameError, MoveRejection};
use crate::games::session_rng::{RandomSource, SessionRng};
use crate::log;
use super::board::Board;
use super::bot_controller::SearchEngine;
use super::types::{Difficulty, Mark, Outcome, Position, WinningLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    PlayerVsComputer { human: Mark, difficulty: Difficulty },
    PlayerVsPlayer,
    /// Turn order is derived from the number of occupied cells.
    Online,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    WaitingForPlayer(Mark),
    WaitingForComputer,
    GameOver(Outcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveReport {
    pub position: Position,
    pub mark: Mark,
    pub outcome: Outcome,
}

/// Owns the live board for one match at a time.
pub struct GameController<R: RandomSource = SessionRng> {
    board: Board,
    mode: GameMode,
    state: ControllerState,
    engine: SearchEngine<R>,
    history: Vec<MoveReport>,
    match_number: u64,
}

impl GameController<SessionRng> {
    pub fn new(mode: GameMode) -> Self {
        Self::with_engine(mode, SearchEngine::new(SessionRng::from_random()))
    }

    pub fn with_seed(mode: GameMode, seed: u64) -> Self {
        Self::with_engine(mode, SearchEngine::from_seed(seed))
    }
}

impl<R: RandomSource> GameController<R> {
    pub fn with_engine(mode: GameMode, engine: SearchEngine<R>) -> Self {
        let board = Board::new();
        let state = initial_state(mode, &board);
        Self {
            board,
            mode,
            state,
            engine,
            history: Vec::new(),
            match_number: 1,
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn current_state(&self) -> ControllerState {
        self.state
    }

    pub fn current_outcome(&self) -> Outcome {
        self.board.terminal_state()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn history(&self) -> &[MoveReport] {
        &self.history
    }

    pub fn winning_line(&self) -> Option<WinningLine> {
        self.board.winning_line()
    }

    /// Incremented by every `reset`.
    pub fn match_number(&self) -> u64 {
        self.match_number
    }

    /// Checks a move without applying it.
    pub fn validate_move(&self, position: Position, mark: Mark) -> Result<(), GameError> {
        match self.state {
            ControllerState::WaitingForPlayer(expected) if expected == mark => {}
            ControllerState::GameOver(_) => {
                return Err(GameError::invalid_move(position, MoveRejection::GameOver));
            }
            ControllerState::WaitingForPlayer(_) | ControllerState::WaitingForComputer => {
                return Err(GameError::invalid_move(position, MoveRejection::NotYourTurn));
            }
        }

        match self.board.get(position) {
            None => Err(GameError::invalid_move(position, MoveRejection::OutOfBounds)),
            Some(Some(_)) => Err(GameError::invalid_move(position, MoveRejection::Occupied)),
            Some(None) => Ok(()),
        }
    }

    pub fn submit_move(&mut self, position: Position, mark: Mark) -> Result<MoveReport, GameError> {
        self.validate_move(position, mark)?;
        self.apply_move(position, mark)
    }

    /// Runs the search engine for the computer's side and applies its move.
    pub fn request_computer_move(&mut self) -> Result<MoveReport, GameError> {
        if self.state != ControllerState::WaitingForComputer {
            return Err(GameError::InvalidState(format!(
                "computer move requested while in {:?}",
                self.state
            )));
        }
        let GameMode::PlayerVsComputer { human, difficulty } = self.mode else {
            return Err(GameError::InvalidState(
                "computer moves only exist in player-vs-computer mode".to_string(),
            ));
        };

        let computer = human.opponent();
        let mut scratch = self.board.clone();
        let chosen = self.engine.choose_move(&mut scratch, difficulty, computer);
        debug_assert_eq!(scratch, self.board);

        let Some(position) = chosen else {
            return Err(GameError::InvalidState(
                "search engine found no legal move".to_string(),
            ));
        };

        self.apply_move(position, computer)
    }

    /// Clears the board and returns to the mode's initial state.
    /// Valid at any point, including mid-match.
    pub fn reset(&mut self) {
        self.board = Board::new();
        self.state = initial_state(self.mode, &self.board);
        self.history.clear();
        self.match_number += 1;
        log!("Match {} started ({:?})", self.match_number, self.mode);
    }

    fn apply_move(&mut self, position: Position, mark: Mark) -> Result<MoveReport, GameError> {
        self.board.place(position, mark)?;

        let outcome = self.board.terminal_state();
        self.state = if outcome.is_terminal() {
            ControllerState::GameOver(outcome)
        } else {
            self.next_state(mark)
        };

        let report = MoveReport {
            position,
            mark,
            outcome,
        };
        self.history.push(report);
        Ok(report)
    }

    fn next_state(&self, last_mark: Mark) -> ControllerState {
        match self.mode {
            GameMode::PlayerVsComputer { human, .. } => {
                if last_mark == human {
                    ControllerState::WaitingForComputer
                } else {
                    ControllerState::WaitingForPlayer(human)
                }
            }
            GameMode::PlayerVsPlayer => ControllerState::WaitingForPlayer(last_mark.opponent()),
            GameMode::Online => ControllerState::WaitingForPlayer(self.board.next_mark_by_count()),
        }
    }
}

fn initial_state(mode: GameMode, board: &Board) -> ControllerState {
    match mode {
        GameMode::PlayerVsComputer { human: Mark::X, .. } => ControllerState::WaitingForPlayer(Mark::X),
        GameMode::PlayerVsComputer { human: Mark::O, .. } => ControllerState::WaitingForComputer,
        GameMode::PlayerVsPlayer => ControllerState::WaitingForPlayer(Mark::X),
        GameMode::Online => ControllerState::WaitingForPlayer(board.next_mark_by_count()),
    }
}
