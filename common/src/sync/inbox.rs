use std::sync::Mutex;
use std::time::Duration;

use ringbuffer::{AllocRingBuffer, RingBuffer};
use tokio::sync::Notify;

use crate::error::GameError;
use crate::games::tictactoe::{Mark, Position};
use crate::log;
use super::messages::{ServerMessage, server_message};

pub const NOTICE_BUFFER_SIZE: usize = 32;

struct InboxState {
    assigned_mark: Option<Mark>,
    pending_remote_move: Option<Position>,
    notices: AllocRingBuffer<String>,
    unread_notices: usize,
    disconnected: bool,
}

impl InboxState {
    fn push_notice(&mut self, notice: String) {
        self.notices.enqueue(notice);
        self.unread_notices = (self.unread_notices + 1).min(NOTICE_BUFFER_SIZE);
    }
}

/// Everything the network listener hands over to the game loop.
/// All reads and writes go through one lock.
pub struct Inbox {
    state: Mutex<InboxState>,
    changed: Notify,
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Inbox {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(InboxState {
                assigned_mark: None,
                pending_remote_move: None,
                notices: AllocRingBuffer::new(NOTICE_BUFFER_SIZE),
                unread_notices: 0,
                disconnected: false,
            }),
            changed: Notify::new(),
        }
    }

    pub fn deliver(&self, message: ServerMessage) {
        let Some(message) = message.message else {
            return;
        };

        let mut state = self.state.lock().unwrap();
        match message {
            server_message::Message::MarkAssigned(assigned) => {
                match (state.assigned_mark, assigned.mark().to_mark()) {
                    (Some(existing), _) => {
                        log!("Ignoring repeated mark assignment, already playing {}", existing);
                    }
                    (None, Some(mark)) => {
                        log!("Assigned mark: {}", mark);
                        state.assigned_mark = Some(mark);
                    }
                    (None, None) => {
                        log!("Ignoring mark assignment with unknown mark {}", assigned.mark);
                    }
                }
            }
            server_message::Message::OpponentMove(opponent_move) => {
                let position = opponent_move.position();
                if let Some(previous) = state.pending_remote_move.replace(position) {
                    log!("Remote move {} replaced unconsumed {}", position, previous);
                } else {
                    log!("Received move {}", position);
                }
            }
            server_message::Message::SessionStart(start) => {
                let notice = format!("Game starting! {}", start.message);
                log!("{}", notice);
                state.push_notice(notice);
            }
            server_message::Message::SessionError(error) => {
                let notice = format!("Error: {}", error.message);
                log!("{}", notice);
                state.push_notice(notice);
            }
            server_message::Message::Waiting(waiting) => {
                log!("{}", waiting.message);
                state.push_notice(waiting.message);
            }
        }
        drop(state);

        self.changed.notify_waiters();
    }

    /// Posts a remote move that arrived through some other channel than the listener.
    pub fn buffer_move(&self, position: Position) {
        let mut state = self.state.lock().unwrap();
        state.pending_remote_move = Some(position);
    }

    pub fn take_pending_move(&self) -> Option<Position> {
        self.state.lock().unwrap().pending_remote_move.take()
    }

    pub fn pending_move(&self) -> Option<Position> {
        self.state.lock().unwrap().pending_remote_move
    }

    pub fn assigned_mark(&self) -> Option<Mark> {
        self.state.lock().unwrap().assigned_mark
    }

    /// Notices delivered since the previous call, oldest first.
    pub fn take_unread_notices(&self) -> Vec<String> {
        let mut state = self.state.lock().unwrap();
        let mut notices = state.notices.to_vec();
        let unread = notices.split_off(notices.len() - state.unread_notices);
        state.unread_notices = 0;
        unread
    }

    pub fn mark_disconnected(&self) {
        self.state.lock().unwrap().disconnected = true;
        self.changed.notify_waiters();
    }

    pub fn is_disconnected(&self) -> bool {
        self.state.lock().unwrap().disconnected
    }

    /// Drops the pending move and the assignment so a new join starts clean.
    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        state.assigned_mark = None;
        state.pending_remote_move = None;
        state.notices.clear();
        state.unread_notices = 0;
        state.disconnected = false;
    }

    /// Waits until a mark is assigned. Never waits longer than `timeout`.
    pub async fn wait_for_mark(&self, timeout: Duration) -> Result<Mark, GameError> {
        let wait = async {
            loop {
                let changed = self.changed.notified();
                {
                    let state = self.state.lock().unwrap();
                    if let Some(mark) = state.assigned_mark {
                        return Ok(mark);
                    }
                    if state.disconnected {
                        return Err(GameError::TransportUnavailable(
                            "connection closed before a mark was assigned".to_string(),
                        ));
                    }
                }
                changed.await;
            }
        };

        tokio::time::timeout(timeout, wait).await.map_err(|_| {
            GameError::TransportUnavailable(format!(
                "no mark assigned within {} ms",
                timeout.as_millis()
            ))
        })?
    }
}
