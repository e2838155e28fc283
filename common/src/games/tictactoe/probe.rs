use std::ops::{Deref, DerefMut};

use crate::error::GameError;
use super::board::Board;
use super::types::{Mark, Position};

/// A mark placed for lookahead. The cell is cleared again when the probe
/// drops, so every return path out of a search restores the board.
pub(crate) struct Probe<'a> {
    board: &'a mut Board,
    position: Position,
}

impl<'a> Probe<'a> {
    pub(crate) fn place(
        board: &'a mut Board,
        position: Position,
        mark: Mark,
    ) -> Result<Self, GameError> {
        board.place(position, mark)?;
        Ok(Self { board, position })
    }
}

impl Deref for Probe<'_> {
    type Target = Board;

    fn deref(&self) -> &Board {
        &*self.board
    }
}

impl DerefMut for Probe<'_> {
    fn deref_mut(&mut self) -> &mut Board {
        &mut *self.board
    }
}

impl Drop for Probe<'_> {
    fn drop(&mut self) {
        self.board.clear(self.position);
    }
}
