use std::fmt;

use crate::error::{GameError, MoveRejection};
use super::types::{BOARD_SIZE, CELL_COUNT, Cell, Mark, Outcome, Position, WinningLine};
use super::win_detector::{check_win, check_win_with_line};

/// The 3x3 grid, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Board {
    cells: [Cell; CELL_COUNT],
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [None; CELL_COUNT],
        }
    }

    /// Builds a board from a layout such as `"X.. .X. ..O"`.
    /// Whitespace is ignored; `.`, `_` and `-` mark empty cells.
    pub fn from_layout(layout: &str) -> Result<Self, String> {
        let symbols: Vec<char> = layout.chars().filter(|c| !c.is_whitespace()).collect();
        if symbols.len() != CELL_COUNT {
            return Err(format!(
                "Board layout needs {} cells, got {}",
                CELL_COUNT,
                symbols.len()
            ));
        }

        let mut board = Self::new();
        for (index, symbol) in symbols.into_iter().enumerate() {
            board.cells[index] = match symbol {
                'X' | 'x' => Some(Mark::X),
                'O' | 'o' => Some(Mark::O),
                '.' | '_' | '-' => None,
                other => return Err(format!("Unexpected board symbol '{}'", other)),
            };
        }
        Ok(board)
    }

    pub fn get(&self, position: Position) -> Option<Cell> {
        if !position.is_on_board() {
            return None;
        }
        Some(self.cells[position.index()])
    }

    pub fn cells(&self) -> &[Cell; CELL_COUNT] {
        &self.cells
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(BOARD_SIZE)
    }

    /// Empty cells in row-major order. Search tie-breaking relies on this order.
    pub fn legal_moves(&self) -> Vec<Position> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(index, _)| Position::from_index(index))
            .collect()
    }

    pub fn place(&mut self, position: Position, mark: Mark) -> Result<(), GameError> {
        if !position.is_on_board() {
            return Err(GameError::invalid_move(position, MoveRejection::OutOfBounds));
        }
        let cell = &mut self.cells[position.index()];
        if cell.is_some() {
            return Err(GameError::invalid_move(position, MoveRejection::Occupied));
        }
        *cell = Some(mark);
        Ok(())
    }

    /// Undoes a search probe. Not reachable from the controller's public API.
    pub(crate) fn clear(&mut self, position: Position) {
        if position.is_on_board() {
            self.cells[position.index()] = None;
        }
    }

    /// Always scans the grid; marks may arrive out of local turn order.
    pub fn terminal_state(&self) -> Outcome {
        if let Some(mark) = check_win(&self.cells) {
            return Outcome::won_by(mark);
        }
        if self.is_full() {
            Outcome::Draw
        } else {
            Outcome::InProgress
        }
    }

    pub fn winning_line(&self) -> Option<WinningLine> {
        check_win_with_line(&self.cells)
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_some())
    }

    /// Whose turn it is when turn order is inferred from occupancy:
    /// an even count means X, an odd count means O.
    pub fn next_mark_by_count(&self) -> Mark {
        if self.occupied_count() % 2 == 0 {
            Mark::X
        } else {
            Mark::O
        }
    }

    /// Same grid with every X and O exchanged.
    pub fn swapped(&self) -> Board {
        let mut swapped = self.clone();
        for cell in swapped.cells.iter_mut() {
            *cell = cell.map(Mark::opponent);
        }
        swapped
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row_index, row) in self.rows().enumerate() {
            let line: Vec<String> = row
                .iter()
                .map(|cell| cell.map_or('.', Mark::symbol).to_string())
                .collect();
            write!(f, "{}", line.join(" "))?;
            if row_index + 1 < BOARD_SIZE {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
