use std::sync::{Arc, Mutex};
use std::time::Duration;

use prost::Message;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::GameError;
use crate::{log, log_error};
use super::inbox::Inbox;
use super::messages::{ClientMessage, ServerMessage};
use super::transport::Transport;

pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Length-prefixed prost frames over a TCP stream.
pub struct TcpTransport {
    sender: mpsc::UnboundedSender<ClientMessage>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl TcpTransport {
    pub async fn connect(
        address: &str,
        inbox: Arc<Inbox>,
        timeout: Duration,
    ) -> Result<Self, GameError> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect(address))
            .await
            .map_err(|_| {
                GameError::TransportUnavailable(format!("connecting to {} timed out", address))
            })??;
        stream.set_nodelay(true)?;

        log!("Connected to {}", address);

        Ok(Self::from_stream(stream, inbox))
    }

    pub fn from_stream(stream: TcpStream, inbox: Arc<Inbox>) -> Self {
        let (mut reader, mut writer) = stream.into_split();
        let (sender, mut receiver) = mpsc::unbounded_channel::<ClientMessage>();

        let writer_task = tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                if let Err(e) = write_frame(&mut writer, &message.encode_to_vec()).await {
                    log_error!("Failed to send message: {}", e);
                    break;
                }
            }
        });

        let listener_task = tokio::spawn(async move {
            loop {
                match read_frame(&mut reader).await {
                    Ok(Some(frame)) => match ServerMessage::decode(frame.as_slice()) {
                        Ok(message) => inbox.deliver(message),
                        Err(e) => log_error!("Failed to decode ServerMessage: {}", e),
                    },
                    Ok(None) => {
                        log!("Disconnected from the server.");
                        break;
                    }
                    Err(e) => {
                        log_error!("Connection lost: {}", e);
                        break;
                    }
                }
            }
            inbox.mark_disconnected();
        });

        Self {
            sender,
            tasks: Mutex::new(vec![writer_task, listener_task]),
        }
    }
}

impl Transport for TcpTransport {
    fn send(&self, message: ClientMessage) -> Result<(), GameError> {
        self.sender
            .send(message)
            .map_err(|_| GameError::TransportUnavailable("connection closed".to_string()))
    }

    fn close(&self) {
        for task in self.tasks.lock().unwrap().drain(..) {
            task.abort();
        }
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.close();
    }
}

pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), GameError>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > MAX_FRAME_SIZE {
        return Err(GameError::TransportUnavailable(format!(
            "frame of {} bytes exceeds limit",
            payload.len()
        )));
    }
    writer.write_u32(payload.len() as u32).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// `Ok(None)` on a clean end of stream between frames.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, GameError>
where
    R: AsyncRead + Unpin,
{
    let length = match reader.read_u32().await {
        Ok(length) => length as usize,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if length > MAX_FRAME_SIZE {
        return Err(GameError::TransportUnavailable(format!(
            "incoming frame of {} bytes exceeds limit",
            length
        )));
    }

    let mut frame = vec![0u8; length];
    reader.read_exact(&mut frame).await?;
    Ok(Some(frame))
}
