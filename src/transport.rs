//! Transport trait for message sources

use std::path::Path;

use tokio::sync::mpsc;
use tokio::time::{Duration, Interval, interval};
use tracing::{debug, info, trace};

use crate::capture::CaptureReader;
use crate::connection::ConnectionEvent;
use crate::{RemoteError, Result};

/// One item delivered by a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Text message from the server
    Text(String),
    /// Binary message from the server (font texture or frame)
    Binary(Vec<u8>),
    /// Lifecycle change of the underlying socket
    Event(ConnectionEvent),
}

/// Trait for message sources
///
/// Transports abstract over the live socket, in-process channels and
/// capture replay. They own the connection and its timing; the driver only
/// pulls messages and pushes text back.
#[async_trait::async_trait]
pub trait Transport: Send + 'static {
    /// Get the next message
    ///
    /// Returns:
    /// - `Ok(Some(message))` - Message available
    /// - `Ok(None)` - Stream ended (normal termination)
    /// - `Err(e)` - Error occurred
    ///
    /// Must be cancel-safe: the driver races it against input events and
    /// shutdown, and a dropped call must not lose a message.
    async fn next_message(&mut self) -> Result<Option<Message>>;

    /// Send a text message to the server
    async fn send_text(&mut self, text: &str) -> Result<()>;
}

/// Transport fed through tokio channels.
///
/// Used to embed an externally managed socket: the socket task pushes
/// received messages into [`ChannelHandle::inbound`] and forwards whatever
/// arrives on [`ChannelHandle::outbound`].
pub struct ChannelTransport {
    inbound: mpsc::Receiver<Message>,
    outbound: mpsc::Sender<String>,
}

/// Socket-side ends of a [`ChannelTransport`].
pub struct ChannelHandle {
    pub inbound: mpsc::Sender<Message>,
    pub outbound: mpsc::Receiver<String>,
}

impl ChannelTransport {
    /// Create a transport and its socket-side handle with `buffer` slots per direction.
    pub fn pair(buffer: usize) -> (Self, ChannelHandle) {
        let (inbound_tx, inbound_rx) = mpsc::channel(buffer);
        let (outbound_tx, outbound_rx) = mpsc::channel(buffer);
        (
            Self { inbound: inbound_rx, outbound: outbound_tx },
            ChannelHandle { inbound: inbound_tx, outbound: outbound_rx },
        )
    }
}

#[async_trait::async_trait]
impl Transport for ChannelTransport {
    async fn next_message(&mut self) -> Result<Option<Message>> {
        Ok(self.inbound.recv().await)
    }

    async fn send_text(&mut self, text: &str) -> Result<()> {
        self.outbound
            .send(text.to_string())
            .await
            .map_err(|_| RemoteError::connection_failed("outbound channel closed"))
    }
}

/// Replay transport that plays back a capture file
pub struct ReplayTransport {
    /// Capture file reader
    reader: CaptureReader,

    /// Record pacing, `None` for as fast as possible
    interval: Option<Interval>,

    /// Whether the synthetic `Opened` event was delivered
    opened: bool,

    /// Text the client tried to send
    sent: Vec<String>,
}

impl ReplayTransport {
    /// Create a replay transport from a capture file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(CaptureReader::open(path)?))
    }

    pub fn new(reader: CaptureReader) -> Self {
        Self { reader, interval: None, opened: false, sent: Vec::new() }
    }

    /// Pace records at `rate` per second.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_rate(mut self, rate: f64) -> Self {
        let rate = rate.clamp(0.1, 1000.0);
        self.interval = Some(interval(Duration::from_secs_f64(1.0 / rate)));
        debug!("Replay paced at {} messages/s", rate);
        self
    }

    /// Text messages sent by the client so far.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }
}

#[async_trait::async_trait]
impl Transport for ReplayTransport {
    async fn next_message(&mut self) -> Result<Option<Message>> {
        if !self.opened {
            self.opened = true;
            info!("Replaying capture {}", self.reader.path().display());
            return Ok(Some(Message::Event(ConnectionEvent::Opened)));
        }

        if self.reader.is_finished() {
            debug!("Reached end of capture after {} records", self.reader.current_record());
            return Ok(None);
        }

        // Wait before reading so a cancelled call leaves the record in place.
        if let Some(interval) = self.interval.as_mut() {
            interval.tick().await;
        }

        let Some(message) = self.reader.read_next()? else {
            return Ok(None);
        };
        trace!("Replay record {}", self.reader.current_record());
        Ok(Some(message))
    }

    async fn send_text(&mut self, text: &str) -> Result<()> {
        trace!("Replay swallowing outbound text {}", text);
        self.sent.push(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureWriter;
    use crate::test_utils::triangle_frame;

    fn capture() -> CaptureReader {
        let mut writer = CaptureWriter::new(Vec::new()).unwrap();
        writer.write_text("ImInit").unwrap();
        writer.write_binary(&triangle_frame(1)).unwrap();
        CaptureReader::from_bytes(writer.finish().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn channel_transport_relays_both_directions() {
        let (mut transport, mut handle) = ChannelTransport::pair(4);

        handle.inbound.send(Message::Text("ImInit".to_string())).await.unwrap();
        assert_eq!(
            transport.next_message().await.unwrap(),
            Some(Message::Text("ImInit".to_string()))
        );

        transport.send_text("ImKeyUp=13").await.unwrap();
        assert_eq!(handle.outbound.recv().await.as_deref(), Some("ImKeyUp=13"));

        drop(handle);
        assert_eq!(transport.next_message().await.unwrap(), None);
        assert!(transport.send_text("ImInit").await.is_err());
    }

    #[tokio::test]
    async fn replay_opens_then_plays_records() {
        let mut transport = ReplayTransport::new(capture());

        assert_eq!(
            transport.next_message().await.unwrap(),
            Some(Message::Event(ConnectionEvent::Opened))
        );
        assert_eq!(
            transport.next_message().await.unwrap(),
            Some(Message::Text("ImInit".to_string()))
        );
        assert_eq!(
            transport.next_message().await.unwrap(),
            Some(Message::Binary(triangle_frame(1)))
        );
        assert_eq!(transport.next_message().await.unwrap(), None);

        transport.send_text("ImInit").await.unwrap();
        assert_eq!(transport.sent(), &["ImInit".to_string()]);
    }

    #[tokio::test]
    async fn paced_replay_still_delivers_everything() {
        let mut transport = ReplayTransport::new(capture()).with_rate(60.0);
        let mut count = 0;
        while transport.next_message().await.unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 3);
    }
}
