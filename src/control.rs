//! Control-panel boundary and window focusing.
//!
//! The control panel itself (status label, window drop-down) lives outside the
//! crate. The session notifies it through [`ControlSurface`] and keeps the
//! camera state behind the window drop-down in a [`WindowSelector`].

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::geometry::GeometryStore;
use crate::{RemoteError, Result};

/// Pixels left between the focused window's corner and the canvas edge.
const FOCUS_MARGIN: f32 = 50.0;

/// Receiver of the notifications the control panel displays.
pub trait ControlSurface: Send {
    /// Connection status text changed ("Connecting to ...", "Connected", ...).
    fn connection_status_changed(&mut self, status: &str);

    /// Number of windows in the first draw list changed.
    fn window_count_changed(&mut self, count: usize);
}

/// Control surface that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoControl;

impl ControlSurface for NoControl {
    fn connection_status_changed(&mut self, _status: &str) {}

    fn window_count_changed(&mut self, _count: usize) {}
}

/// Entry of the window drop-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowChoice {
    /// Camera at the canvas origin
    Origin,
    /// 1-based window number
    Window(usize),
}

impl fmt::Display for WindowChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowChoice::Origin => f.write_str("Origin"),
            WindowChoice::Window(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for WindowChoice {
    type Err = RemoteError;

    fn from_str(value: &str) -> Result<Self> {
        if value == "Origin" {
            return Ok(WindowChoice::Origin);
        }
        value
            .parse::<usize>()
            .ok()
            .filter(|&n| n > 0)
            .map(WindowChoice::Window)
            .ok_or_else(|| RemoteError::InvalidCommand { input: value.to_string() })
    }
}

/// Camera offset state driven by window focus and ctrl-drag.
#[derive(Debug, Clone, Default)]
pub struct WindowSelector {
    window_count: usize,
    camera_offset: [f32; 2],
    drag_anchor: Option<[f32; 2]>,
}

impl WindowSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window_count(&self) -> usize {
        self.window_count
    }

    /// Record the window count of a decoded frame; returns whether it changed.
    pub fn set_window_count(&mut self, count: usize) -> bool {
        if self.window_count == count {
            return false;
        }
        debug!("Window count changed: {} -> {}", self.window_count, count);
        self.window_count = count;
        true
    }

    /// Drop-down entries: the origin followed by every window.
    pub fn choices(&self) -> Vec<WindowChoice> {
        std::iter::once(WindowChoice::Origin)
            .chain((1..=self.window_count).map(WindowChoice::Window))
            .collect()
    }

    /// Camera translation applied to every draw.
    pub fn camera_offset(&self) -> [f32; 2] {
        self.camera_offset
    }

    /// Move the camera to `choice`.
    ///
    /// Window `n` is the `n`-th command across the live lists in render order.
    /// Its clip corner is mapped through `canvas_width × canvas_height` with a
    /// fixed margin. An unknown window leaves the camera where it is.
    pub fn focus(
        &mut self,
        choice: WindowChoice,
        store: &GeometryStore,
        canvas_width: f32,
        canvas_height: f32,
    ) -> [f32; 2] {
        match choice {
            WindowChoice::Origin => self.camera_offset = [0.0, 0.0],
            WindowChoice::Window(n) => {
                let command = store
                    .live_lists()
                    .iter()
                    .flat_map(|slot| slot.commands())
                    .nth(n.saturating_sub(1));
                match command {
                    Some(command) => {
                        let clip = command.clip_rect;
                        self.camera_offset = [
                            (-FOCUS_MARGIN + (clip.min_x + 1.0) * canvas_width / 2.0).round(),
                            (-FOCUS_MARGIN + (clip.min_y + 1.0) * canvas_height / 2.0).round(),
                        ];
                    }
                    None => debug!("Window {} not in the current frame", n),
                }
            }
        }
        self.camera_offset
    }

    /// Start a camera drag at pointer position `(x, y)`.
    pub fn begin_drag(&mut self, x: f32, y: f32) {
        self.drag_anchor = Some([x, y]);
    }

    /// Continue a drag; the camera follows the pointer in the opposite direction.
    ///
    /// Returns `false` when no drag is in progress.
    pub fn drag_to(&mut self, x: f32, y: f32) -> bool {
        let Some([ax, ay]) = self.drag_anchor else {
            return false;
        };
        self.camera_offset[0] += ax - x;
        self.camera_offset[1] += ay - y;
        self.drag_anchor = Some([x, y]);
        true
    }

    pub fn end_drag(&mut self) {
        self.drag_anchor = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    /// Map a local pointer position into source canvas pixels.
    pub fn to_remote(&self, x: f32, y: f32) -> (i32, i32) {
        ((x + self.camera_offset[0]).round() as i32, (y + self.camera_offset[1]).round() as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::ByteCursor;
    use crate::decoder::DrawListDecoder;
    use crate::test_utils::{FrameBuilder, ListBuilder};

    fn store_with_clips(clips: &[[f32; 4]]) -> GeometryStore {
        let list = clips.iter().fold(ListBuilder::new(), |list, clip| list.command(0, *clip));
        let frame = FrameBuilder::key().list(list).build();
        let mut store = GeometryStore::new(2, 8);
        let mut cursor = ByteCursor::new(&frame);
        cursor.skip(1).unwrap();
        DrawListDecoder::decode(&mut cursor, &mut store).unwrap();
        store
    }

    #[test]
    fn choices_list_origin_then_windows() {
        let mut selector = WindowSelector::new();
        assert!(selector.set_window_count(2));
        assert!(!selector.set_window_count(2));
        assert_eq!(
            selector.choices(),
            vec![WindowChoice::Origin, WindowChoice::Window(1), WindowChoice::Window(2)]
        );
    }

    #[test]
    fn focusing_a_window_offsets_the_camera() {
        let store = store_with_clips(&[[0.0, 0.0, 10.0, 10.0], [99.0, 49.0, 120.0, 80.0]]);
        let mut selector = WindowSelector::new();

        let offset = selector.focus(WindowChoice::Window(2), &store, 200.0, 100.0);
        assert_eq!(offset, [(-50.0f32 + 100.0 * 100.0).round(), -50.0 + 50.0 * 50.0]);

        assert_eq!(selector.focus(WindowChoice::Origin, &store, 200.0, 100.0), [0.0, 0.0]);
    }

    #[test]
    fn unknown_window_keeps_camera() {
        let store = store_with_clips(&[[0.0, 0.0, 10.0, 10.0]]);
        let mut selector = WindowSelector::new();
        selector.focus(WindowChoice::Window(1), &store, 100.0, 100.0);
        let before = selector.camera_offset();

        assert_eq!(selector.focus(WindowChoice::Window(5), &store, 100.0, 100.0), before);
    }

    #[test]
    fn drag_moves_camera_against_pointer() {
        let mut selector = WindowSelector::new();
        assert!(!selector.drag_to(5.0, 5.0));

        selector.begin_drag(100.0, 100.0);
        selector.drag_to(90.0, 120.0);
        selector.drag_to(80.0, 120.0);
        selector.end_drag();

        assert_eq!(selector.camera_offset(), [20.0, -20.0]);
        assert_eq!(selector.to_remote(1.0, 1.0), (21, -19));
        assert!(!selector.is_dragging());
    }

    #[test]
    fn choices_parse_from_drop_down_values() {
        assert_eq!("Origin".parse::<WindowChoice>().unwrap(), WindowChoice::Origin);
        assert_eq!("3".parse::<WindowChoice>().unwrap(), WindowChoice::Window(3));
        assert!("0".parse::<WindowChoice>().is_err());
        assert_eq!(WindowChoice::Window(3).to_string(), "3");
    }
}
