use tictactoe_common::games::tictactoe::{
    Board, ControllerState, GameEvent, GameUpdate, Mark, Outcome, Position,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Event(GameEvent),
    Help,
    Quit,
}

/// Parses one line of terminal input. Cells are given as `row col`, 0-based.
pub fn parse_command(line: &str) -> Result<ConsoleCommand, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        ["reset" | "restart" | "r"] => Ok(ConsoleCommand::Event(GameEvent::Reset)),
        ["menu" | "m"] => Ok(ConsoleCommand::Event(GameEvent::ReturnToMenu)),
        ["quit" | "exit" | "q"] => Ok(ConsoleCommand::Quit),
        ["help" | "h" | "?"] => Ok(ConsoleCommand::Help),
        ["remote", row, col] => {
            let position = parse_position(row, col)?;
            Ok(ConsoleCommand::Event(GameEvent::RemoteMoveArrived(position)))
        }
        [row, col] => {
            let position = parse_position(row, col)?;
            Ok(ConsoleCommand::Event(GameEvent::PlayerClicked(position)))
        }
        [] => Err("empty input".to_string()),
        _ => Err(format!("unrecognised input '{}'", line.trim())),
    }
}

fn parse_position(row: &str, col: &str) -> Result<Position, String> {
    let row = row.parse::<usize>().map_err(|_| format!("'{}' is not a row number", row))?;
    let col = col.parse::<usize>().map_err(|_| format!("'{}' is not a column number", col))?;
    Ok(Position::new(row, col))
}

pub fn help_text() -> &'static str {
    "Enter `row col` (0-2) to place a mark, `reset` to restart, `menu` to leave the match, `quit` to exit."
}

pub fn render_board(board: &Board) -> String {
    let mut out = String::from("    0 1 2\n");
    for (row_index, line) in board.to_string().lines().enumerate() {
        out.push_str(&format!("  {} {}\n", row_index, line));
    }
    out
}

fn turn_indicator(state: ControllerState, local_mark: Option<Mark>) -> String {
    match (state, local_mark) {
        (ControllerState::WaitingForPlayer(mark), Some(local)) if mark == local => {
            format!("Your Turn ({})", mark)
        }
        (ControllerState::WaitingForPlayer(mark), Some(_)) => format!("Opponent's Turn ({})", mark),
        (ControllerState::WaitingForPlayer(mark), None) => format!("{}'s Turn", mark),
        (ControllerState::WaitingForComputer, _) => "Computer is thinking...".to_string(),
        (ControllerState::GameOver(outcome), _) => outcome.to_string(),
    }
}

/// Text shown for one update. `local_mark` is set in online matches.
pub fn render_update(update: &GameUpdate, local_mark: Option<Mark>) -> String {
    match update {
        GameUpdate::MarkAssigned(mark) => format!("Assigned mark: {}", mark),
        GameUpdate::MatchStarted { match_number, state } => format!(
            "Match {} started.\n{}{}",
            match_number,
            render_board(&Board::new()),
            turn_indicator(*state, local_mark)
        ),
        GameUpdate::MoveApplied { report, board, state } => {
            let mut text = format!("{} played {}\n{}", report.mark, report.position, render_board(board));
            if let (Outcome::XWon | Outcome::OWon, Some(line)) = (report.outcome, board.winning_line()) {
                text.push_str(&format!("Winning line {} -> {}\n", line.start, line.end));
            }
            text.push_str(&turn_indicator(*state, local_mark));
            text
        }
        GameUpdate::MoveRejected { position, error } => format!("Move {} rejected: {}", position, error),
        GameUpdate::Notice(message) => format!("Server: {}", message),
        GameUpdate::Error(error) => format!("Error: {}", error),
        GameUpdate::Closed => "Left the match.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tictactoe_common::games::tictactoe::MoveReport;

    #[test]
    fn test_parse_cell_and_commands() {
        assert_eq!(
            parse_command(" 1 2 "),
            Ok(ConsoleCommand::Event(GameEvent::PlayerClicked(Position::new(1, 2))))
        );
        assert_eq!(
            parse_command("remote 0 0"),
            Ok(ConsoleCommand::Event(GameEvent::RemoteMoveArrived(Position::new(0, 0))))
        );
        assert_eq!(parse_command("reset"), Ok(ConsoleCommand::Event(GameEvent::Reset)));
        assert_eq!(parse_command("q"), Ok(ConsoleCommand::Quit));
        assert!(parse_command("a b").is_err());
        assert!(parse_command("").is_err());
    }

    #[test]
    fn test_render_board_has_coordinates() {
        let board = Board::from_layout("X.. .O. ...").unwrap();
        let rendered = render_board(&board);
        assert!(rendered.starts_with("    0 1 2\n"));
        assert!(rendered.contains("  0 X . ."));
        assert!(rendered.contains("  1 . O ."));
    }

    #[test]
    fn test_render_win_shows_banner_and_line() {
        let board = Board::from_layout("XXX OO. ...").unwrap();
        let update = GameUpdate::MoveApplied {
            report: MoveReport {
                position: Position::new(0, 2),
                mark: Mark::X,
                outcome: Outcome::XWon,
            },
            board,
            state: ControllerState::GameOver(Outcome::XWon),
        };
        let text = render_update(&update, None);
        assert!(text.contains("Winning line (0, 0) -> (0, 2)"));
        assert!(text.ends_with("X Wins!"));
    }

    #[test]
    fn test_online_turn_indicator() {
        assert_eq!(
            turn_indicator(ControllerState::WaitingForPlayer(Mark::O), Some(Mark::O)),
            "Your Turn (O)"
        );
        assert_eq!(
            turn_indicator(ControllerState::WaitingForPlayer(Mark::X), Some(Mark::O)),
            "Opponent's Turn (X)"
        );
    }

    #[test]
    fn test_render_server_notice() {
        let update = GameUpdate::Notice("Waiting for opponent".to_string());
        assert_eq!(render_update(&update, None), "Server: Waiting for opponent");
    }
}
