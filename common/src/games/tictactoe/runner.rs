use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::error::GameError;
use crate::games::session_rng::{RandomSource, SessionRng};
use crate::sync::{SyncProtocol, Transport};
use crate::{log, log_error};
use super::board::Board;
use super::controller::{ControllerState, GameController, GameMode, MoveReport};
use super::types::{Mark, Position};

pub type BoxedSync = SyncProtocol<Box<dyn Transport>>;

/// Input posted by the UI, handled strictly in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    PlayerClicked(Position),
    RemoteMoveArrived(Position),
    Reset,
    ReturnToMenu,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameUpdate {
    MarkAssigned(Mark),
    MatchStarted {
        match_number: u64,
        state: ControllerState,
    },
    MoveApplied {
        report: MoveReport,
        board: Board,
        state: ControllerState,
    },
    MoveRejected {
        position: Position,
        error: GameError,
    },
    /// Informational server message (session start, session error, waiting).
    Notice(String),
    Error(GameError),
    Closed,
}

#[derive(Debug, Clone, Copy)]
pub struct OnlineSettings {
    pub handshake_timeout: Duration,
    pub tick_interval: Duration,
}

impl Default for OnlineSettings {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(10),
            tick_interval: Duration::from_millis(33),
        }
    }
}

enum Flow {
    Continue,
    Exit,
}

/// Drives one controller from a queue of UI events until the UI leaves.
pub struct GameRunner<R: RandomSource + 'static = SessionRng> {
    controller: GameController<R>,
    sync: Option<BoxedSync>,
    online: OnlineSettings,
    updates: mpsc::UnboundedSender<GameUpdate>,
}

impl<R: RandomSource + 'static> GameRunner<R> {
    pub fn new(controller: GameController<R>, updates: mpsc::UnboundedSender<GameUpdate>) -> Self {
        Self {
            controller,
            sync: None,
            online: OnlineSettings::default(),
            updates,
        }
    }

    pub fn with_sync(mut self, sync: BoxedSync, online: OnlineSettings) -> Self {
        self.sync = Some(sync);
        self.online = online;
        self
    }

    pub async fn run(self, mut events: mpsc::UnboundedReceiver<GameEvent>) {
        let GameRunner {
            mut controller,
            mut sync,
            online,
            updates,
        } = self;
        let mut deferred = VecDeque::new();

        let handshake_result = match sync.as_mut() {
            Some(protocol) => {
                Some(handshake(protocol, &mut events, &mut deferred, &updates, online).await)
            }
            None => None,
        };
        match handshake_result {
            None => {}
            Some(Ok(Some(mark))) => emit(&updates, GameUpdate::MarkAssigned(mark)),
            Some(Ok(None)) => {
                finish(sync, &updates);
                return;
            }
            Some(Err(e)) => {
                log_error!("Handshake failed: {}", e);
                emit(&updates, GameUpdate::Error(e));
                finish(sync, &updates);
                return;
            }
        }

        emit(
            &updates,
            GameUpdate::MatchStarted {
                match_number: controller.match_number(),
                state: controller.current_state(),
            },
        );

        let mut ticker = tokio::time::interval(online.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut sync_stalled = false;

        loop {
            if controller.current_state() == ControllerState::WaitingForComputer {
                match computer_turn(controller, &mut events, &mut deferred, &updates).await {
                    Some(returned) => {
                        controller = returned;
                        continue;
                    }
                    None => break,
                }
            }

            let event = match deferred.pop_front() {
                Some(event) => event,
                None => {
                    tokio::select! {
                        event = events.recv() => match event {
                            Some(event) => event,
                            None => break,
                        },
                        _ = ticker.tick(), if sync.is_some() && !sync_stalled => {
                            if let Some(protocol) = sync.as_mut() {
                                sync_stalled = sync_tick(protocol, &mut controller, &updates);
                            }
                            continue;
                        }
                    }
                }
            };

            if let Flow::Exit = handle_event(event, &mut controller, sync.as_mut(), &updates) {
                break;
            }
        }

        finish(sync, &updates);
    }
}

fn emit(updates: &mpsc::UnboundedSender<GameUpdate>, update: GameUpdate) {
    // The UI may already be gone while the runner winds down.
    let _ = updates.send(update);
}

fn emit_notices(protocol: &BoxedSync, updates: &mpsc::UnboundedSender<GameUpdate>) {
    for notice in protocol.take_notices() {
        emit(updates, GameUpdate::Notice(notice));
    }
}

fn finish(sync: Option<BoxedSync>, updates: &mpsc::UnboundedSender<GameUpdate>) {
    if let Some(protocol) = sync {
        protocol.teardown();
    }
    emit(updates, GameUpdate::Closed);
}

/// `Ok(None)` when the UI left before a mark arrived.
async fn handshake(
    protocol: &mut BoxedSync,
    events: &mut mpsc::UnboundedReceiver<GameEvent>,
    deferred: &mut VecDeque<GameEvent>,
    updates: &mpsc::UnboundedSender<GameUpdate>,
    online: OnlineSettings,
) -> Result<Option<Mark>, GameError> {
    let inbox = Arc::clone(protocol.inbox());
    let wait = inbox.wait_for_mark(online.handshake_timeout);
    tokio::pin!(wait);
    let mut notice_poll = tokio::time::interval(online.tick_interval);
    notice_poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            result = &mut wait => {
                emit_notices(protocol, updates);
                result?;
                return Ok(protocol.poll_mark());
            }
            _ = notice_poll.tick() => emit_notices(protocol, updates),
            event = events.recv() => match event {
                Some(GameEvent::ReturnToMenu) | None => {
                    log!("Left room {} before the match started", protocol.room());
                    return Ok(None);
                }
                Some(GameEvent::PlayerClicked(position)) => {
                    emit(updates, GameUpdate::MoveRejected {
                        position,
                        error: GameError::InvalidState("waiting for mark assignment".to_string()),
                    });
                }
                Some(GameEvent::RemoteMoveArrived(position)) => protocol.buffer_remote_move(position),
                Some(other) => deferred.push_back(other),
            }
        }
    }
}

/// Returns the controller once the move is applied, or `None` when the
/// match was abandoned while the search was still running.
async fn computer_turn<R: RandomSource + 'static>(
    mut controller: GameController<R>,
    events: &mut mpsc::UnboundedReceiver<GameEvent>,
    deferred: &mut VecDeque<GameEvent>,
    updates: &mpsc::UnboundedSender<GameUpdate>,
) -> Option<GameController<R>> {
    let mut search = tokio::task::spawn_blocking(move || {
        let result = controller.request_computer_move();
        (controller, result)
    });

    loop {
        tokio::select! {
            joined = &mut search => {
                return match joined {
                    Ok((controller, Ok(report))) => {
                        emit(updates, applied(report, &controller));
                        Some(controller)
                    }
                    Ok((_, Err(e))) => {
                        log_error!("Computer move failed: {}", e);
                        emit(updates, GameUpdate::Error(e));
                        None
                    }
                    Err(e) => {
                        log_error!("Computer move task failed: {}", e);
                        emit(updates, GameUpdate::Error(GameError::InvalidState(
                            "computer move task failed".to_string(),
                        )));
                        None
                    }
                };
            }
            event = events.recv() => match event {
                Some(GameEvent::ReturnToMenu) | None => {
                    log!("Match abandoned during computer move");
                    return None;
                }
                Some(other) => deferred.push_back(other),
            }
        }
    }
}

/// Returns true once the connection is gone and ticking should stop.
fn sync_tick<R: RandomSource>(
    protocol: &mut BoxedSync,
    controller: &mut GameController<R>,
    updates: &mpsc::UnboundedSender<GameUpdate>,
) -> bool {
    emit_notices(protocol, updates);
    match protocol.tick(controller) {
        Ok(Some(report)) => {
            emit(updates, applied(report, controller));
            false
        }
        Ok(None) => false,
        Err(GameError::InvalidMove { position, reason }) => {
            emit(
                updates,
                GameUpdate::MoveRejected {
                    position,
                    error: GameError::InvalidMove { position, reason },
                },
            );
            false
        }
        Err(e) => {
            emit(updates, GameUpdate::Error(e));
            true
        }
    }
}

fn handle_event<R: RandomSource>(
    event: GameEvent,
    controller: &mut GameController<R>,
    sync: Option<&mut BoxedSync>,
    updates: &mpsc::UnboundedSender<GameUpdate>,
) -> Flow {
    match event {
        GameEvent::PlayerClicked(position) => {
            let result = match sync {
                Some(protocol) => protocol.submit_local_move(controller, position),
                None => {
                    let mark = local_mark(controller);
                    controller.submit_move(position, mark)
                }
            };
            match result {
                Ok(report) => emit(updates, applied(report, controller)),
                Err(error) => emit(updates, GameUpdate::MoveRejected { position, error }),
            }
            Flow::Continue
        }
        GameEvent::RemoteMoveArrived(position) => {
            match sync {
                Some(protocol) => protocol.buffer_remote_move(position),
                None => emit(
                    updates,
                    GameUpdate::Error(GameError::InvalidState(
                        "remote moves only arrive in online mode".to_string(),
                    )),
                ),
            }
            Flow::Continue
        }
        GameEvent::Reset => {
            controller.reset();
            if let Some(protocol) = sync {
                protocol.inbox().take_pending_move();
            }
            emit(
                updates,
                GameUpdate::MatchStarted {
                    match_number: controller.match_number(),
                    state: controller.current_state(),
                },
            );
            Flow::Continue
        }
        GameEvent::ReturnToMenu => Flow::Exit,
    }
}

fn local_mark<R: RandomSource>(controller: &GameController<R>) -> Mark {
    match (controller.current_state(), controller.mode()) {
        (ControllerState::WaitingForPlayer(mark), _) => mark,
        (_, GameMode::PlayerVsComputer { human, .. }) => human,
        _ => controller.board().next_mark_by_count(),
    }
}

fn applied<R: RandomSource>(report: MoveReport, controller: &GameController<R>) -> GameUpdate {
    GameUpdate::MoveApplied {
        report,
        board: controller.board().clone(),
        state: controller.current_state(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MoveRejection;
    use crate::identifiers::RoomId;
    use crate::sync::{ChannelTransport, ClientMessage, Inbox, ServerMessage, WireMark, client_message};
    use crate::games::tictactoe::{Difficulty, Outcome};

    fn spawn_runner(
        runner: GameRunner,
    ) -> (mpsc::UnboundedSender<GameEvent>, tokio::task::JoinHandle<()>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(runner.run(event_rx));
        (event_tx, handle)
    }

    async fn next_update(updates: &mut mpsc::UnboundedReceiver<GameUpdate>) -> GameUpdate {
        tokio::time::timeout(Duration::from_secs(5), updates.recv())
            .await
            .expect("timed out waiting for update")
            .expect("update channel closed")
    }

    #[tokio::test]
    async fn test_pvp_events_are_applied_in_order() {
        let (update_tx, mut updates) = mpsc::unbounded_channel();
        let controller = GameController::with_seed(GameMode::PlayerVsPlayer, 1);
        let (events, handle) = spawn_runner(GameRunner::new(controller, update_tx));

        events.send(GameEvent::PlayerClicked(Position::new(0, 0))).unwrap();
        events.send(GameEvent::PlayerClicked(Position::new(0, 0))).unwrap();
        events.send(GameEvent::PlayerClicked(Position::new(1, 1))).unwrap();
        events.send(GameEvent::ReturnToMenu).unwrap();

        assert!(matches!(next_update(&mut updates).await, GameUpdate::MatchStarted { match_number: 1, .. }));
        assert!(matches!(
            next_update(&mut updates).await,
            GameUpdate::MoveApplied { report: MoveReport { mark: Mark::X, .. }, .. }
        ));
        let GameUpdate::MoveRejected { error, .. } = next_update(&mut updates).await else {
            panic!("Expected MoveRejected");
        };
        assert_eq!(error.rejection(), Some(MoveRejection::Occupied));
        assert!(matches!(
            next_update(&mut updates).await,
            GameUpdate::MoveApplied { report: MoveReport { mark: Mark::O, .. }, .. }
        ));
        assert_eq!(next_update(&mut updates).await, GameUpdate::Closed);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_computer_answers_player_move() {
        let (update_tx, mut updates) = mpsc::unbounded_channel();
        let controller = GameController::with_seed(
            GameMode::PlayerVsComputer {
                human: Mark::X,
                difficulty: Difficulty::Hard,
            },
            5,
        );
        let (events, handle) = spawn_runner(GameRunner::new(controller, update_tx));

        events.send(GameEvent::PlayerClicked(Position::new(0, 0))).unwrap();

        next_update(&mut updates).await;
        next_update(&mut updates).await;
        let GameUpdate::MoveApplied { report, state, board } = next_update(&mut updates).await else {
            panic!("Expected computer move");
        };
        assert_eq!(report.mark, Mark::O);
        assert_eq!(state, ControllerState::WaitingForPlayer(Mark::X));
        assert_eq!(board.occupied_count(), 2);

        events.send(GameEvent::ReturnToMenu).unwrap();
        assert_eq!(next_update(&mut updates).await, GameUpdate::Closed);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_computer_opens_when_human_plays_o() {
        let (update_tx, mut updates) = mpsc::unbounded_channel();
        let controller = GameController::with_seed(
            GameMode::PlayerVsComputer {
                human: Mark::O,
                difficulty: Difficulty::Easy,
            },
            5,
        );
        let (events, handle) = spawn_runner(GameRunner::new(controller, update_tx));

        assert!(matches!(
            next_update(&mut updates).await,
            GameUpdate::MatchStarted { state: ControllerState::WaitingForComputer, .. }
        ));
        assert!(matches!(
            next_update(&mut updates).await,
            GameUpdate::MoveApplied { report: MoveReport { mark: Mark::X, .. }, .. }
        ));

        drop(events);
        assert_eq!(next_update(&mut updates).await, GameUpdate::Closed);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_reset_starts_next_match() {
        let (update_tx, mut updates) = mpsc::unbounded_channel();
        let controller = GameController::with_seed(GameMode::PlayerVsPlayer, 1);
        let (events, handle) = spawn_runner(GameRunner::new(controller, update_tx));

        events.send(GameEvent::PlayerClicked(Position::new(2, 2))).unwrap();
        events.send(GameEvent::Reset).unwrap();
        events.send(GameEvent::ReturnToMenu).unwrap();

        next_update(&mut updates).await;
        next_update(&mut updates).await;
        assert_eq!(
            next_update(&mut updates).await,
            GameUpdate::MatchStarted {
                match_number: 2,
                state: ControllerState::WaitingForPlayer(Mark::X),
            }
        );
        assert_eq!(next_update(&mut updates).await, GameUpdate::Closed);
        handle.await.unwrap();
    }

    fn online_runner(
        inbox: Arc<Inbox>,
        update_tx: mpsc::UnboundedSender<GameUpdate>,
    ) -> (GameRunner, mpsc::UnboundedReceiver<ClientMessage>) {
        let (transport, outgoing) = ChannelTransport::pair();
        let transport: Box<dyn Transport> = Box::new(transport);
        let sync = SyncProtocol::join(RoomId::from("ROOM9"), transport, inbox).unwrap();
        let controller = GameController::with_seed(GameMode::Online, 1);
        let settings = OnlineSettings {
            handshake_timeout: Duration::from_secs(5),
            tick_interval: Duration::from_millis(5),
        };
        (
            GameRunner::new(controller, update_tx).with_sync(sync, settings),
            outgoing,
        )
    }

    #[tokio::test]
    async fn test_online_match_relays_and_applies_moves() {
        let (update_tx, mut updates) = mpsc::unbounded_channel();
        let inbox = Arc::new(Inbox::new());
        let (runner, mut outgoing) = online_runner(inbox.clone(), update_tx);
        let (events, handle) = spawn_runner(runner);

        events.send(GameEvent::PlayerClicked(Position::new(0, 0))).unwrap();
        let GameUpdate::MoveRejected { error, .. } = next_update(&mut updates).await else {
            panic!("Expected input to be blocked before the handshake");
        };
        assert!(matches!(error, GameError::InvalidState(_)));

        inbox.deliver(ServerMessage::mark_assigned(WireMark::A));
        assert_eq!(next_update(&mut updates).await, GameUpdate::MarkAssigned(Mark::X));
        next_update(&mut updates).await;

        events.send(GameEvent::PlayerClicked(Position::new(1, 1))).unwrap();
        assert!(matches!(next_update(&mut updates).await, GameUpdate::MoveApplied { .. }));

        inbox.deliver(ServerMessage::opponent_move(0, 2));
        let GameUpdate::MoveApplied { report, .. } = next_update(&mut updates).await else {
            panic!("Expected remote move");
        };
        assert_eq!(report.position, Position::new(0, 2));
        assert_eq!(report.mark, Mark::O);
        assert_eq!(report.outcome, Outcome::InProgress);

        events.send(GameEvent::ReturnToMenu).unwrap();
        assert_eq!(next_update(&mut updates).await, GameUpdate::Closed);
        handle.await.unwrap();

        let mut sent = Vec::new();
        while let Ok(message) = outgoing.try_recv() {
            sent.push(message);
        }
        assert!(matches!(sent[0].message, Some(client_message::Message::JoinRoom(_))));
        assert_eq!(sent.len(), 2);
        assert!(inbox.assigned_mark().is_none());
    }

    #[tokio::test]
    async fn test_server_notices_reach_the_ui() {
        let (update_tx, mut updates) = mpsc::unbounded_channel();
        let inbox = Arc::new(Inbox::new());
        let (runner, _outgoing) = online_runner(inbox.clone(), update_tx);
        let (events, handle) = spawn_runner(runner);

        inbox.deliver(ServerMessage::waiting("Waiting for opponent"));
        assert_eq!(
            next_update(&mut updates).await,
            GameUpdate::Notice("Waiting for opponent".to_string())
        );

        inbox.deliver(ServerMessage::mark_assigned(WireMark::B));
        assert_eq!(next_update(&mut updates).await, GameUpdate::MarkAssigned(Mark::O));
        assert!(matches!(next_update(&mut updates).await, GameUpdate::MatchStarted { .. }));

        inbox.deliver(ServerMessage::waiting("Opponent reconnecting"));
        assert_eq!(
            next_update(&mut updates).await,
            GameUpdate::Notice("Opponent reconnecting".to_string())
        );

        events.send(GameEvent::ReturnToMenu).unwrap();
        assert_eq!(next_update(&mut updates).await, GameUpdate::Closed);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_return_to_menu_during_handshake_closes() {
        let (update_tx, mut updates) = mpsc::unbounded_channel();
        let inbox = Arc::new(Inbox::new());
        let (runner, _outgoing) = online_runner(inbox, update_tx);
        let (events, handle) = spawn_runner(runner);

        events.send(GameEvent::ReturnToMenu).unwrap();

        assert_eq!(next_update(&mut updates).await, GameUpdate::Closed);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_handshake_timeout_is_reported() {
        let (update_tx, mut updates) = mpsc::unbounded_channel();
        let (transport, _outgoing) = ChannelTransport::pair();
        let transport: Box<dyn Transport> = Box::new(transport);
        let sync = SyncProtocol::join(RoomId::from("ROOM9"), transport, Arc::new(Inbox::new())).unwrap();
        let runner = GameRunner::new(GameController::with_seed(GameMode::Online, 1), update_tx).with_sync(
            sync,
            OnlineSettings {
                handshake_timeout: Duration::from_millis(20),
                tick_interval: Duration::from_millis(5),
            },
        );
        let (_events, handle) = spawn_runner(runner);

        assert!(matches!(
            next_update(&mut updates).await,
            GameUpdate::Error(GameError::TransportUnavailable(_))
        ));
        assert_eq!(next_update(&mut updates).await, GameUpdate::Closed);
        handle.await.unwrap();
    }
}
