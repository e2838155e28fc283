//! Wire messages exchanged with the relay server.

use crate::games::tictactoe::{Mark, Position};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum WireMark {
    Unspecified = 0,
    /// Moves first.
    A = 1,
    B = 2,
}

impl WireMark {
    pub fn to_mark(self) -> Option<Mark> {
        match self {
            WireMark::A => Some(Mark::X),
            WireMark::B => Some(Mark::O),
            WireMark::Unspecified => None,
        }
    }
}

impl From<Mark> for WireMark {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::X => WireMark::A,
            Mark::O => WireMark::B,
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MarkAssigned {
    #[prost(enumeration = "WireMark", tag = "1")]
    pub mark: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OpponentMove {
    #[prost(uint32, tag = "1")]
    pub row: u32,
    #[prost(uint32, tag = "2")]
    pub col: u32,
}

impl OpponentMove {
    pub fn position(&self) -> Position {
        Position::new(self.row as usize, self.col as usize)
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SessionStart {
    #[prost(string, tag = "1")]
    pub message: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SessionError {
    #[prost(string, tag = "1")]
    pub message: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Waiting {
    #[prost(string, tag = "1")]
    pub message: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ServerMessage {
    #[prost(oneof = "server_message::Message", tags = "1, 2, 3, 4, 5")]
    pub message: Option<server_message::Message>,
}

pub mod server_message {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Message {
        #[prost(message, tag = "1")]
        MarkAssigned(super::MarkAssigned),
        #[prost(message, tag = "2")]
        OpponentMove(super::OpponentMove),
        #[prost(message, tag = "3")]
        SessionStart(super::SessionStart),
        #[prost(message, tag = "4")]
        SessionError(super::SessionError),
        #[prost(message, tag = "5")]
        Waiting(super::Waiting),
    }
}

impl ServerMessage {
    pub fn mark_assigned(mark: WireMark) -> Self {
        Self {
            message: Some(server_message::Message::MarkAssigned(MarkAssigned {
                mark: mark.into(),
            })),
        }
    }

    pub fn opponent_move(row: u32, col: u32) -> Self {
        Self {
            message: Some(server_message::Message::OpponentMove(OpponentMove { row, col })),
        }
    }

    pub fn waiting(message: &str) -> Self {
        Self {
            message: Some(server_message::Message::Waiting(Waiting {
                message: message.to_string(),
            })),
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct JoinRoom {
    #[prost(string, tag = "1")]
    pub room: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Move {
    #[prost(string, tag = "1")]
    pub room: String,
    #[prost(uint32, tag = "2")]
    pub row: u32,
    #[prost(uint32, tag = "3")]
    pub col: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ClientMessage {
    #[prost(oneof = "client_message::Message", tags = "1, 2")]
    pub message: Option<client_message::Message>,
}

pub mod client_message {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Message {
        #[prost(message, tag = "1")]
        JoinRoom(super::JoinRoom),
        #[prost(message, tag = "2")]
        Move(super::Move),
    }
}

impl ClientMessage {
    pub fn join_room(room: &str) -> Self {
        Self {
            message: Some(client_message::Message::JoinRoom(JoinRoom {
                room: room.to_string(),
            })),
        }
    }

    pub fn move_to(room: &str, position: Position) -> Self {
        Self {
            message: Some(client_message::Message::Move(Move {
                room: room.to_string(),
                row: position.row as u32,
                col: position.col as u32,
            })),
        }
    }
}
