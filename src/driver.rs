//! Driver pumps transport messages through a render session

use futures::Stream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::connection::{ConnectionEvent, ConnectionState};
use crate::control::WindowChoice;
use crate::input::InputCommand;
use crate::render::RenderBackend;
use crate::session::{BinaryOutcome, RenderSession, SessionStats};
use crate::transport::{Message, Transport};

/// Consecutive transport failures tolerated before the driver gives up.
const MAX_ERRORS: u32 = 10;

/// Buffered UI events between the embedding application and the driver.
const UI_EVENT_BUFFER: usize = 64;

/// Local UI activity forwarded to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Send an input command as is
    Input(InputCommand),
    /// Pointer moved in local canvas pixels
    PointerMoved { x: f32, y: f32, left: bool, right: bool },
    /// Ctrl-drag started at a position, or ended
    CameraDrag(Option<(f32, f32)>),
    /// Window drop-down selection
    FocusWindow(WindowChoice),
    /// Local canvas resized
    Resize { width: u32, height: u32 },
}

/// Why the driver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverExit {
    /// The transport ended its stream
    StreamEnded,
    /// The cancellation token fired
    Cancelled,
    /// Too many consecutive transport errors
    TooManyErrors,
}

/// Everything the driver owned, handed back when it stops.
pub struct DriverOutput<B> {
    pub session: RenderSession,
    pub backend: B,
    pub exit: DriverExit,
}

/// Result of spawning the driver task
pub struct DriverChannels<B> {
    /// Receiver for connection state changes
    pub state: watch::Receiver<ConnectionState>,
    /// Receiver for session counters, updated after every message
    pub stats: watch::Receiver<SessionStats>,
    /// Sender for local UI events
    pub events: mpsc::Sender<UiEvent>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
    /// Driver task, yielding the session and backend once it stops
    pub task: JoinHandle<DriverOutput<B>>,
}

impl<B> DriverChannels<B> {
    /// Connection states as a stream, starting with the current one.
    pub fn state_changes(&self) -> impl Stream<Item = ConnectionState> + 'static {
        WatchStream::new(self.state.clone())
    }
}

/// Driver spawns and manages the message pump task
///
/// The pump owns the transport, the session and the backend. One message is
/// decoded and rendered at a time; cancellation is only observed between
/// messages.
pub struct Driver;

impl Driver {
    /// Spawn the pump for `transport`, feeding `session` and drawing with `backend`.
    pub fn spawn<T, B>(transport: T, session: RenderSession, backend: B) -> DriverChannels<B>
    where
        T: Transport,
        B: RenderBackend + Send + 'static,
    {
        let (state_tx, state_rx) = watch::channel(session.state());
        let (stats_tx, stats_rx) = watch::channel(session.stats());
        let (events_tx, events_rx) = mpsc::channel(UI_EVENT_BUFFER);
        let cancel = CancellationToken::new();

        let pump = Pump { transport, session, backend, state_tx, stats_tx, error_count: 0 };
        let cancel_pump = cancel.clone();
        let task = tokio::spawn(async move { pump.run(events_rx, cancel_pump).await });

        DriverChannels { state: state_rx, stats: stats_rx, events: events_tx, cancel, task }
    }
}

struct Pump<T, B> {
    transport: T,
    session: RenderSession,
    backend: B,
    state_tx: watch::Sender<ConnectionState>,
    stats_tx: watch::Sender<SessionStats>,
    error_count: u32,
}

impl<T, B> Pump<T, B>
where
    T: Transport,
    B: RenderBackend + Send + 'static,
{
    async fn run(
        mut self,
        mut events: mpsc::Receiver<UiEvent>,
        cancel: CancellationToken,
    ) -> DriverOutput<B> {
        info!("Message pump started");
        let mut message_count = 0u64;
        let mut events_open = true;

        let exit = loop {
            if cancel.is_cancelled() {
                info!("Message pump cancelled");
                break DriverExit::Cancelled;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Message pump cancelled while waiting");
                    break DriverExit::Cancelled;
                }
                event = events.recv(), if events_open => match event {
                    Some(event) => self.handle_ui_event(event).await,
                    None => {
                        debug!("UI event sender dropped");
                        events_open = false;
                    }
                },
                result = self.transport.next_message() => match result {
                    Ok(Some(message)) => {
                        message_count += 1;
                        self.error_count = 0;
                        self.handle_message(message).await;
                    }
                    Ok(None) => {
                        info!("Transport stream ended after {} messages", message_count);
                        if self.session.state() != ConnectionState::Disconnected {
                            self.session.connection_event(ConnectionEvent::Closed);
                            self.session.render(&mut self.backend);
                        }
                        break DriverExit::StreamEnded;
                    }
                    Err(e) => {
                        self.error_count += 1;
                        error!("Transport error ({}/{}): {}", self.error_count, MAX_ERRORS, e);

                        if self.error_count >= MAX_ERRORS {
                            error!("Too many transport errors, shutting down");
                            break DriverExit::TooManyErrors;
                        }

                        // Exponential backoff: 20ms, 40ms, 80ms, ... capped at 320ms
                        let backoff =
                            std::time::Duration::from_millis(10 * (1 << self.error_count.min(5)));
                        tokio::time::sleep(backoff).await;
                    }
                },
            }

            self.publish();
        };

        self.publish();
        info!("Message pump ended ({:?}, {} messages)", exit, message_count);
        DriverOutput { session: self.session, backend: self.backend, exit }
    }

    async fn handle_message(&mut self, message: Message) {
        match message {
            Message::Event(event) => {
                let opened = event == ConnectionEvent::Opened
                    && self.session.state().next(&event) == Some(ConnectionState::Connected);
                self.session.connection_event(event);
                if opened {
                    self.send(&InputCommand::Init).await;
                }
                self.session.render(&mut self.backend);
            }
            Message::Text(text) => {
                let was_active = self.session.state().is_active();
                if self.session.handle_text(&text).is_active() && !was_active {
                    self.session.render(&mut self.backend);
                }
            }
            Message::Binary(data) => {
                match self.session.handle_binary(data, &mut self.backend) {
                    Ok(BinaryOutcome::Frame(summary)) => {
                        trace!("Frame with {} lists", summary.list_count);
                        self.session.render(&mut self.backend);
                    }
                    Ok(BinaryOutcome::Texture) => {}
                    // Already logged by the session; the previous frame stays on screen.
                    Err(_) => {}
                }
            }
        }
    }

    async fn handle_ui_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Input(command) => self.send(&command).await,
            UiEvent::PointerMoved { x, y, left, right } => {
                match self.session.pointer_moved(x, y, left, right) {
                    Some(command) => self.send(&command).await,
                    None => {
                        self.session.render(&mut self.backend);
                    }
                }
            }
            UiEvent::CameraDrag(anchor) => self.session.set_camera_drag(anchor),
            UiEvent::FocusWindow(choice) => {
                self.session.focus_window(choice);
                self.session.render(&mut self.backend);
            }
            UiEvent::Resize { width, height } => {
                self.session.resize_canvas(width, height);
                self.session.render(&mut self.backend);
            }
        }
    }

    async fn send(&mut self, command: &InputCommand) {
        let Some(text) = self.session.outbound(command) else {
            trace!("Dropping {} while {}", command.name(), self.session.state());
            return;
        };
        if let Err(e) = self.transport.send_text(&text).await {
            warn!("Failed to send {}: {}", command.name(), e);
        }
    }

    fn publish(&self) {
        self.state_tx.send_if_modified(|state| {
            let current = self.session.state();
            let changed = *state != current;
            *state = current;
            changed
        });
        self.stats_tx.send_if_modified(|stats| {
            let current = self.session.stats();
            let changed = *stats != current;
            *stats = current;
            changed
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::test_utils::{RecordingBackend, triangle_frame};
    use crate::transport::ChannelTransport;
    use crate::{RemoteError, Result};
    use futures::StreamExt;
    use std::time::Duration;

    fn session() -> RenderSession {
        let config = ClientConfig { max_draw_lists: 4, max_triangles: 16, ..Default::default() };
        RenderSession::new(config).unwrap()
    }

    #[tokio::test]
    async fn handshake_activates_and_frames_render() {
        let _ = tracing_subscriber::fmt::try_init();
        let (transport, mut handle) = ChannelTransport::pair(8);
        let channels = Driver::spawn(transport, session(), RecordingBackend::new());

        handle.inbound.send(Message::Event(ConnectionEvent::Opened)).await.unwrap();
        assert_eq!(handle.outbound.recv().await.as_deref(), Some("ImInit"));

        handle.inbound.send(Message::Text("ImInit".to_string())).await.unwrap();
        handle.inbound.send(Message::Binary(triangle_frame(2))).await.unwrap();

        let mut stats = channels.stats.clone();
        tokio::time::timeout(Duration::from_secs(1), stats.wait_for(|s| s.frames == 1))
            .await
            .expect("frame should be processed")
            .unwrap();
        assert_eq!(*channels.state.borrow(), ConnectionState::Active);

        drop(handle);
        let output = channels.task.await.unwrap();
        assert_eq!(output.exit, DriverExit::StreamEnded);
        assert_eq!(output.backend.draws(), vec![0..3, 0..3]);
        assert_eq!(output.session.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn input_is_forwarded_only_when_active() {
        let (transport, mut handle) = ChannelTransport::pair(8);
        let channels = Driver::spawn(transport, session(), RecordingBackend::new());
        let press = InputCommand::MousePress { left: true, right: false };

        channels.events.send(UiEvent::Input(press.clone())).await.unwrap();
        handle.inbound.send(Message::Event(ConnectionEvent::Opened)).await.unwrap();
        assert_eq!(handle.outbound.recv().await.as_deref(), Some("ImInit"));

        handle.inbound.send(Message::Text("ImInit".to_string())).await.unwrap();
        let mut state = channels.state.clone();
        state.wait_for(|s| s.is_active()).await.unwrap();

        channels.events.send(UiEvent::Input(press)).await.unwrap();
        assert_eq!(handle.outbound.recv().await.as_deref(), Some("ImMousePress=1,0"));

        channels.cancel.cancel();
        assert_eq!(channels.task.await.unwrap().exit, DriverExit::Cancelled);
    }

    #[tokio::test]
    async fn state_stream_reports_transitions() {
        let (transport, handle) = ChannelTransport::pair(8);
        let channels = Driver::spawn(transport, session(), RecordingBackend::new());
        let mut states = Box::pin(channels.state_changes());

        assert_eq!(states.next().await, Some(ConnectionState::Disconnected));
        handle.inbound.send(Message::Event(ConnectionEvent::Opened)).await.unwrap();
        assert_eq!(states.next().await, Some(ConnectionState::Connected));

        channels.cancel.cancel();
        channels.task.await.unwrap();
    }

    #[tokio::test]
    async fn reopening_repeats_the_handshake() {
        let (transport, mut handle) = ChannelTransport::pair(8);
        let channels = Driver::spawn(transport, session(), RecordingBackend::new());

        handle.inbound.send(Message::Event(ConnectionEvent::Opened)).await.unwrap();
        assert_eq!(handle.outbound.recv().await.as_deref(), Some("ImInit"));
        handle.inbound.send(Message::Text("ImInit".to_string())).await.unwrap();
        handle.inbound.send(Message::Binary(triangle_frame(1))).await.unwrap();
        let mut stats = channels.stats.clone();
        stats.wait_for(|s| s.frames == 1).await.unwrap();

        handle.inbound.send(Message::Event(ConnectionEvent::Opened)).await.unwrap();
        assert_eq!(handle.outbound.recv().await.as_deref(), Some("ImInit"));
        let mut state = channels.state.clone();
        state.wait_for(|s| *s == ConnectionState::Connected).await.unwrap();

        channels.cancel.cancel();
        let output = channels.task.await.unwrap();
        assert_eq!(output.session.store().live_list_count(), 0);
    }

    struct FailingTransport;

    #[async_trait::async_trait]
    impl Transport for FailingTransport {
        async fn next_message(&mut self) -> Result<Option<Message>> {
            Err(RemoteError::connection_failed("socket reset"))
        }

        async fn send_text(&mut self, _text: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn repeated_transport_errors_stop_the_driver() {
        let channels = Driver::spawn(FailingTransport, session(), RecordingBackend::new());
        let output = tokio::time::timeout(Duration::from_secs(10), channels.task)
            .await
            .expect("driver should give up")
            .unwrap();
        assert_eq!(output.exit, DriverExit::TooManyErrors);
    }
}
