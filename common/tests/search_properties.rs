use std::collections::HashSet;

use tictactoe_common::games::tictactoe::{
    Board, ControllerState, Difficulty, GameController, GameMode, Mark, Outcome, Position,
    SearchEngine, winning_cells,
};

#[test]
fn test_hard_vs_hard_always_draws() {
    for seed in 0..4 {
        let mut board = Board::new();
        let mut engine_x = SearchEngine::from_seed(seed);
        let mut engine_o = SearchEngine::from_seed(seed + 100);
        let mut current_mark = Mark::X;
        let mut moves = 0;

        while !board.terminal_state().is_terminal() {
            let engine = if current_mark == Mark::X { &mut engine_x } else { &mut engine_o };
            let position = engine
                .choose_move(&mut board, Difficulty::Hard, current_mark)
                .expect("a non-terminal board always has a move");
            board.place(position, current_mark).unwrap();
            current_mark = current_mark.opponent();
            moves += 1;
        }

        assert_eq!(board.terminal_state(), Outcome::Draw);
        assert!(moves <= 9);
    }
}

/// Plays every possible human line against the computer and checks the
/// computer never ends up losing.
fn explore(controller: &GameController, human: Mark, games: &mut usize) {
    match controller.current_state() {
        ControllerState::GameOver(outcome) => {
            *games += 1;
            assert_ne!(
                outcome.winner(),
                Some(human),
                "computer lost with history {:?}",
                controller.history()
            );
        }
        ControllerState::WaitingForComputer => {
            let mut next = replay(controller);
            next.request_computer_move().unwrap();
            explore(&next, human, games);
        }
        ControllerState::WaitingForPlayer(mark) => {
            for position in controller.board().legal_moves() {
                let mut next = replay(controller);
                next.submit_move(position, mark).unwrap();
                explore(&next, human, games);
            }
        }
    }
}

fn replay(controller: &GameController) -> GameController {
    let mut copy = GameController::with_seed(controller.mode(), 0);
    for report in controller.history() {
        if copy.current_state() == ControllerState::WaitingForComputer {
            copy.request_computer_move().unwrap();
        } else {
            copy.submit_move(report.position, report.mark).unwrap();
        }
    }
    copy
}

#[test]
fn test_hard_never_loses_after_any_opening() {
    let mode = GameMode::PlayerVsComputer {
        human: Mark::X,
        difficulty: Difficulty::Hard,
    };

    let mut games = 0;
    for row in 0..3 {
        for col in 0..3 {
            let mut controller = GameController::with_seed(mode, 0);
            controller.submit_move(Position::new(row, col), Mark::X).unwrap();
            explore(&controller, Mark::X, &mut games);
        }
    }
    assert!(games > 0);
}

#[test]
fn test_hard_never_loses_when_moving_first() {
    let mode = GameMode::PlayerVsComputer {
        human: Mark::O,
        difficulty: Difficulty::Hard,
    };

    let mut games = 0;
    explore(&GameController::with_seed(mode, 0), Mark::O, &mut games);
    assert!(games > 0);
}

#[test]
fn test_hard_never_leaves_an_immediate_loss() {
    // Whenever the opponent threatens to complete a line, Hard either wins
    // on the spot or blocks.
    let layouts = ["XX. .O. ...", "X.. X.. .O.", "..X .X. ..O", "OX. .X. ..."];
    let mut engine = SearchEngine::from_seed(4);
    for layout in layouts {
        let mut board = Board::from_layout(layout).unwrap();
        let position = engine.choose_move(&mut board, Difficulty::Hard, Mark::O).unwrap();
        board.place(position, Mark::O).unwrap();

        let threats = tictactoe_common::games::tictactoe::winning_cells(board.cells(), Mark::X);
        assert!(
            board.terminal_state() == Outcome::OWon || threats.is_empty(),
            "layout {} left {:?} open after {}",
            layout,
            threats,
            position
        );
    }
}

#[test]
fn test_easy_and_medium_only_play_legal_moves() {
    for difficulty in [Difficulty::Easy, Difficulty::Medium] {
        for seed in 0..20 {
            let mut engine = SearchEngine::from_seed(seed);
            let mut board = Board::new();
            let mut current_mark = Mark::X;
            while let Some(position) = engine.choose_move(&mut board, difficulty, current_mark) {
                board.place(position, current_mark).unwrap();
                current_mark = current_mark.opponent();
            }
            assert!(board.terminal_state().is_terminal());
        }
    }
}

fn collect_open_boards(board: &mut Board, seen: &mut HashSet<Board>, open: &mut Vec<Board>) {
    if board.terminal_state().is_terminal() || !seen.insert(board.clone()) {
        return;
    }
    open.push(board.clone());
    let mark = board.next_mark_by_count();
    for position in board.legal_moves() {
        let mut next = board.clone();
        next.place(position, mark).unwrap();
        collect_open_boards(&mut next, seen, open);
    }
}

#[test]
fn test_hard_takes_an_available_win() {
    let mut seen = HashSet::new();
    let mut open = Vec::new();
    collect_open_boards(&mut Board::new(), &mut seen, &mut open);

    let mut engine = SearchEngine::from_seed(9);
    let mut checked = 0;
    for mut board in open {
        let mark = board.next_mark_by_count();
        let wins = winning_cells(board.cells(), mark);
        if wins.is_empty() {
            continue;
        }
        let chosen = engine
            .choose_move(&mut board, Difficulty::Hard, mark)
            .expect("open board has a move");
        assert!(wins.contains(&chosen), "{} played {} on\n{}", mark, chosen, board);
        checked += 1;
    }
    assert!(checked > 0);
}
