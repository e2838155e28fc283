mod inbox;
mod messages;
mod protocol;
mod tcp_transport;
mod transport;

pub use inbox::{Inbox, NOTICE_BUFFER_SIZE};
pub use messages::{
    ClientMessage, JoinRoom, MarkAssigned, Move, OpponentMove, ServerMessage, SessionError,
    SessionStart, Waiting, WireMark, client_message, server_message,
};
pub use protocol::{Session, SyncProtocol};
pub use tcp_transport::{MAX_FRAME_SIZE, TcpTransport, read_frame, write_frame};
pub use transport::{ChannelTransport, Transport};
