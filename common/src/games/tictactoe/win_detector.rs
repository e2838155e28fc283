use super::types::{BOARD_SIZE, CELL_COUNT, Cell, Mark, Position, WinningLine};

/// Rows, then columns, then the two diagonals. Scan order is the
/// precedence used when several lines are complete at once.
const LINES: [[usize; BOARD_SIZE]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

pub fn check_win(cells: &[Cell; CELL_COUNT]) -> Option<Mark> {
    check_win_with_line(cells).map(|line| line.mark)
}

pub fn check_win_with_line(cells: &[Cell; CELL_COUNT]) -> Option<WinningLine> {
    for line in &LINES {
        let Some(mark) = cells[line[0]] else {
            continue;
        };
        if line.iter().all(|&index| cells[index] == Some(mark)) {
            return Some(WinningLine::new(
                mark,
                Position::from_index(line[0]),
                Position::from_index(line[BOARD_SIZE - 1]),
            ));
        }
    }
    None
}

/// Cells that would complete a line for `mark` if it were placed there.
pub fn winning_cells(cells: &[Cell; CELL_COUNT], mark: Mark) -> Vec<Position> {
    let mut found: Vec<Position> = Vec::new();
    for line in &LINES {
        let owned = line.iter().filter(|&&i| cells[i] == Some(mark)).count();
        let empty: Vec<usize> = line.iter().copied().filter(|&i| cells[i].is_none()).collect();
        if owned == BOARD_SIZE - 1 && empty.len() == 1 {
            let position = Position::from_index(empty[0]);
            if !found.contains(&position) {
                found.push(position);
            }
        }
    }
    found.sort_by_key(|p| p.index());
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(layout: &str) -> [Cell; CELL_COUNT] {
        let mut result = [None; CELL_COUNT];
        for (i, ch) in layout.chars().filter(|c| !c.is_whitespace()).enumerate() {
            result[i] = match ch {
                'X' => Some(Mark::X),
                'O' => Some(Mark::O),
                _ => None,
            };
        }
        result
    }

    #[test]
    fn test_rows_take_precedence_over_columns() {
        // Row 0 and column 0 both belong to X; the row is reported.
        let line = check_win_with_line(&cells("XXX X.. X..")).unwrap();
        assert_eq!(line.start, Position::new(0, 0));
        assert_eq!(line.end, Position::new(0, 2));
    }

    #[test]
    fn test_anti_diagonal() {
        let line = check_win_with_line(&cells("..O .O. O..")).unwrap();
        assert_eq!(line.mark, Mark::O);
        assert_eq!(line.start, Position::new(0, 2));
        assert_eq!(line.end, Position::new(2, 0));
    }

    #[test]
    fn test_no_winner_on_mixed_line() {
        assert_eq!(check_win(&cells("XOX OXO OXO")), None);
    }

    #[test]
    fn test_winning_cells_deduplicates_shared_cell() {
        // (0,2) completes both row 0 and the anti-diagonal for X.
        let found = winning_cells(&cells("XX. .X. X.."), Mark::X);
        assert!(found.contains(&Position::new(0, 2)));
        assert_eq!(found.iter().filter(|p| **p == Position::new(0, 2)).count(), 1);
    }
}
