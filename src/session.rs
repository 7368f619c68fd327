//! Owned state of one remote display client.
//!
//! A [`RenderSession`] ties the frame codec, the geometry pool, the font
//! texture and the connection state together. The transport feeds it one
//! message at a time; nothing inside it is shared or global.
//!
//! ## Usage Example
//!
//! ```rust
//! use remote_imgui::{ClientConfig, ConnectionEvent, ConnectionState, RenderSession};
//!
//! let mut session = RenderSession::new(ClientConfig::default()).unwrap();
//! session.connection_event(ConnectionEvent::Opened);
//! session.handle_text("ImInit");
//! assert_eq!(session.state(), ConnectionState::Active);
//! ```

use tracing::{debug, info, warn};

use crate::codec::{Decoded, FrameCodec};
use crate::config::ClientConfig;
use crate::connection::{ConnectionEvent, ConnectionState};
use crate::control::{ControlSurface, NoControl, WindowChoice, WindowSelector};
use crate::decoder::FrameSummary;
use crate::geometry::GeometryStore;
use crate::input::InputCommand;
use crate::render::{ClippedRenderer, RenderBackend, RenderStats};
use crate::types::{FontTexture, MessageKind};
use crate::Result;

/// Server reply that completes the handshake.
const INIT_REPLY: &str = "ImInit";

/// Running counters of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Frames decoded and committed
    pub frames: u64,
    /// Of which were delta frames
    pub delta_frames: u64,
    /// Binary messages dropped because they failed to decode
    pub dropped: u64,
    /// Font textures received
    pub textures: u64,
    /// Summary of the last committed frame
    pub last_frame: FrameSummary,
}

/// Outcome of [`RenderSession::handle_binary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOutcome {
    /// A new font texture was uploaded to the backend
    Texture,
    /// A frame was committed and should be rendered
    Frame(FrameSummary),
}

/// Display client state for one connection at a time.
pub struct RenderSession {
    config: ClientConfig,
    codec: FrameCodec,
    store: GeometryStore,
    renderer: ClippedRenderer,
    state: ConnectionState,
    status: String,
    font_texture: Option<FontTexture>,
    selector: WindowSelector,
    control: Box<dyn ControlSurface>,
    stats: SessionStats,
}

impl RenderSession {
    /// Allocate the geometry pool described by `config`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "Allocating geometry pool: {} lists x {} triangles",
            config.max_draw_lists, config.max_triangles
        );

        Ok(Self {
            codec: FrameCodec::new(config.compressed),
            store: GeometryStore::new(config.max_draw_lists, config.max_triangles),
            renderer: ClippedRenderer::new(&config),
            state: ConnectionState::Disconnected,
            status: ConnectionState::Disconnected.to_string(),
            font_texture: None,
            selector: WindowSelector::new(),
            control: Box::new(NoControl),
            stats: SessionStats::default(),
            config,
        })
    }

    /// Route status and window-count notifications to `control`.
    pub fn with_control<C>(mut self, control: C) -> Self
    where
        C: ControlSurface + 'static,
    {
        self.control = Box::new(control);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Last status line sent to the control surface.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn store(&self) -> &GeometryStore {
        &self.store
    }

    pub fn font_texture(&self) -> Option<&FontTexture> {
        self.font_texture.as_ref()
    }

    pub fn selector(&self) -> &WindowSelector {
        &self.selector
    }

    /// Apply a transport lifecycle event.
    ///
    /// Opening, closing or failing the socket drops the displayed geometry
    /// and the delta patch base; the next connection starts from a key frame.
    pub fn connection_event(&mut self, event: ConnectionEvent) -> ConnectionState {
        let Some(next) = self.state.next(&event) else {
            warn!("Ignoring {:?} while {}", event, self.state);
            return self.state;
        };

        if next != self.state {
            info!("Connection state: {} -> {}", self.state, next);
        }
        self.state = next;

        if event.resets_session() {
            self.store.clear();
            self.codec.reset();
        }

        self.status = event.status(&self.config.server_uri);
        self.control.connection_status_changed(&self.status);
        self.state
    }

    /// Handle a text message from the server.
    pub fn handle_text(&mut self, text: &str) -> ConnectionState {
        if text == INIT_REPLY {
            info!("{} acknowledged", INIT_REPLY);
            return self.connection_event(ConnectionEvent::InitAcknowledged);
        }
        debug!("Unknown text message: {}", text);
        self.state
    }

    /// Decode a binary message.
    ///
    /// Frames are decoded in every state so the delta chain stays intact.
    /// A failed message is logged and dropped: the previous frame keeps
    /// rendering and the error is returned for the caller's bookkeeping.
    pub fn handle_binary<B>(&mut self, message: Vec<u8>, backend: &mut B) -> Result<BinaryOutcome>
    where
        B: RenderBackend + ?Sized,
    {
        match self.codec.decode(message, &mut self.store) {
            Ok(Decoded::FontTexture(texture)) => {
                backend.upload_font_texture(&texture);
                self.font_texture = Some(texture);
                self.stats.textures += 1;
                Ok(BinaryOutcome::Texture)
            }
            Ok(Decoded::Frame { kind, summary }) => {
                self.stats.frames += 1;
                if kind == MessageKind::FrameDiff {
                    self.stats.delta_frames += 1;
                }
                self.stats.last_frame = summary;
                if self.selector.set_window_count(summary.window_count) {
                    self.control.window_count_changed(summary.window_count);
                }
                Ok(BinaryOutcome::Frame(summary))
            }
            Err(e) => {
                self.stats.dropped += 1;
                if e.awaits_key_frame() {
                    warn!("Dropped frame, waiting for next key frame: {}", e);
                } else {
                    warn!("Dropped message: {}", e);
                }
                Err(e)
            }
        }
    }

    /// Draw the live geometry, or the inactive clear when not `Active`.
    pub fn render<B>(&self, backend: &mut B) -> RenderStats
    where
        B: RenderBackend + ?Sized,
    {
        self.renderer.render(
            self.state.is_active(),
            &self.store,
            self.selector.camera_offset(),
            backend,
        )
    }

    /// Text to send for `command`, or `None` if the session cannot send it now.
    ///
    /// `ImInit` goes out once the socket is open; everything else only while
    /// `Active`.
    pub fn outbound(&self, command: &InputCommand) -> Option<String> {
        let allowed = match command {
            InputCommand::Init => self.state.is_open(),
            _ => self.state.is_active(),
        };
        allowed.then(|| command.to_string())
    }

    /// Pointer moved to local `(x, y)`.
    ///
    /// While a camera drag is in progress the camera follows and nothing is
    /// sent; otherwise the position is mapped into source pixels.
    pub fn pointer_moved(
        &mut self,
        x: f32,
        y: f32,
        left: bool,
        right: bool,
    ) -> Option<InputCommand> {
        if self.selector.drag_to(x, y) {
            return None;
        }
        let (x, y) = self.selector.to_remote(x, y);
        Some(InputCommand::MouseMove { x, y, left, right })
    }

    /// Start (ctrl held) or stop dragging the camera.
    pub fn set_camera_drag(&mut self, dragging: Option<(f32, f32)>) {
        match dragging {
            Some((x, y)) => self.selector.begin_drag(x, y),
            None => self.selector.end_drag(),
        }
    }

    /// Focus the camera on a window from the drop-down.
    pub fn focus_window(&mut self, choice: WindowChoice) -> [f32; 2] {
        self.selector.focus(
            choice,
            &self.store,
            self.config.canvas_width as f32,
            self.config.canvas_height as f32,
        )
    }

    /// Track a resized local canvas.
    pub fn resize_canvas(&mut self, width: u32, height: u32) {
        self.config.canvas_width = width;
        self.config.canvas_height = height;
        self.renderer.set_canvas_height(height);
    }
}
