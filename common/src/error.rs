use std::fmt;

use crate::games::tictactoe::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    OutOfBounds,
    Occupied,
    NotYourTurn,
    GameOver,
}

impl fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveRejection::OutOfBounds => write!(f, "position out of bounds"),
            MoveRejection::Occupied => write!(f, "cell is already marked"),
            MoveRejection::NotYourTurn => write!(f, "not your turn"),
            MoveRejection::GameOver => write!(f, "game is already over"),
        }
    }
}

/// Every failure leaves the board and the online session as they were.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    InvalidMove {
        position: Position,
        reason: MoveRejection,
    },
    InvalidState(String),
    TransportUnavailable(String),
}

impl GameError {
    pub fn invalid_move(position: Position, reason: MoveRejection) -> Self {
        GameError::InvalidMove { position, reason }
    }

    pub fn rejection(&self) -> Option<MoveRejection> {
        match self {
            GameError::InvalidMove { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::InvalidMove { position, reason } => {
                write!(f, "Invalid move at {}: {}", position, reason)
            }
            GameError::InvalidState(message) => write!(f, "Invalid state: {}", message),
            GameError::TransportUnavailable(message) => {
                write!(f, "Transport unavailable: {}", message)
            }
        }
    }
}

impl std::error::Error for GameError {}

impl From<std::io::Error> for GameError {
    fn from(e: std::io::Error) -> Self {
        GameError::TransportUnavailable(format!("IO error: {}", e))
    }
}

impl From<prost::DecodeError> for GameError {
    fn from(e: prost::DecodeError) -> Self {
        GameError::TransportUnavailable(format!("Decode error: {}", e))
    }
}
