use std::sync::Arc;
use std::time::Duration;

use crate::error::GameError;
use crate::games::RandomSource;
use crate::games::tictactoe::{GameController, Mark, MoveReport, Position};
use crate::identifiers::RoomId;
use crate::{log, log_error};
use super::inbox::Inbox;
use super::messages::ClientMessage;
use super::transport::Transport;

/// The marks of an established online match. Fixed once assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub room: RoomId,
    pub local_mark: Mark,
    pub remote_mark: Mark,
}

/// Keeps the local board in step with the remote player's.
///
/// Whose turn it is comes from the number of occupied cells, never from
/// local bookkeeping.
pub struct SyncProtocol<T: Transport> {
    room: RoomId,
    transport: T,
    inbox: Arc<Inbox>,
    session: Option<Session>,
}

impl<T: Transport> SyncProtocol<T> {
    /// Announces the room to the server. The session is established once the
    /// server assigns a mark.
    pub fn join(room: RoomId, transport: T, inbox: Arc<Inbox>) -> Result<Self, GameError> {
        transport.send(ClientMessage::join_room(room.as_str()))?;
        log!("Joined room {}", room);
        Ok(Self {
            room,
            transport,
            inbox,
            session: None,
        })
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn inbox(&self) -> &Arc<Inbox> {
        &self.inbox
    }

    /// Returns the local mark if the handshake has completed. Never blocks.
    pub fn poll_mark(&mut self) -> Option<Mark> {
        if self.session.is_none()
            && let Some(mark) = self.inbox.assigned_mark()
        {
            self.establish(mark);
        }
        self.session.as_ref().map(|session| session.local_mark)
    }

    pub async fn await_mark(&mut self, timeout: Duration) -> Result<Mark, GameError> {
        if let Some(mark) = self.poll_mark() {
            return Ok(mark);
        }
        let mark = self.inbox.wait_for_mark(timeout).await?;
        self.establish(mark);
        Ok(mark)
    }

    fn establish(&mut self, mark: Mark) {
        self.session = Some(Session {
            room: self.room.clone(),
            local_mark: mark,
            remote_mark: mark.opponent(),
        });
    }

    /// Applies a local move and relays it. A move the controller would
    /// reject is not sent; a move that cannot be sent is not applied.
    pub fn submit_local_move<R: RandomSource>(
        &mut self,
        controller: &mut GameController<R>,
        position: Position,
    ) -> Result<MoveReport, GameError> {
        let Some(local_mark) = self.poll_mark() else {
            return Err(GameError::InvalidState(
                "no mark assigned yet, local input is blocked".to_string(),
            ));
        };

        controller.validate_move(position, local_mark)?;
        self.transport
            .send(ClientMessage::move_to(self.room.as_str(), position))?;
        let report = controller.submit_move(position, local_mark)?;
        log!("Sent move {} to room {}", position, self.room);
        Ok(report)
    }

    /// Applies the buffered remote move when it is the remote side's turn.
    pub fn tick<R: RandomSource>(
        &mut self,
        controller: &mut GameController<R>,
    ) -> Result<Option<MoveReport>, GameError> {
        if self.inbox.is_disconnected() {
            return Err(GameError::TransportUnavailable(
                "disconnected from the server".to_string(),
            ));
        }

        let Some(local_mark) = self.poll_mark() else {
            return Ok(None);
        };
        let remote_mark = local_mark.opponent();

        if controller.current_outcome().is_terminal()
            || controller.board().next_mark_by_count() != remote_mark
        {
            return Ok(None);
        }

        let Some(position) = self.inbox.take_pending_move() else {
            return Ok(None);
        };

        match controller.submit_move(position, remote_mark) {
            Ok(report) => Ok(Some(report)),
            Err(e) => {
                log_error!("Rejected remote move: {}", e);
                Err(e)
            }
        }
    }

    pub fn buffer_remote_move(&self, position: Position) {
        self.inbox.buffer_move(position);
    }

    /// Informational server messages not yet shown to the player.
    pub fn take_notices(&self) -> Vec<String> {
        self.inbox.take_unread_notices()
    }

    /// Closes the connection and forgets the session and any pending move.
    pub fn teardown(self) {
        self.transport.close();
        self.inbox.clear();
        log!("Left room {}", self.room);
    }
}
