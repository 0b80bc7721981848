use image::RgbaImage;
use smol_str::SmolStr;

use crate::Cursor;
use crate::geometry::{Point, Size};
use crate::view::ViewId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

impl MouseButton {
    /// Numeric code: 1 left, 2 right, 3 middle, 0 anything else.
    pub const fn code(self) -> u8 {
        match self {
            Self::Left => 1,
            Self::Right => 2,
            Self::Middle => 3,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    Down,
    Up,
    Move,
    Enter,
    Leave,
}

/// Raw pointer input delivered by the host, in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseInput {
    pub kind: MouseEventKind,
    pub button: Option<MouseButton>,
    pub position: Point,
    pub timestamp_ms: f64,
}

impl MouseInput {
    pub fn down(button: MouseButton, position: Point, timestamp_ms: f64) -> Self {
        Self {
            kind: MouseEventKind::Down,
            button: Some(button),
            position,
            timestamp_ms,
        }
    }

    pub fn up(button: MouseButton, position: Point, timestamp_ms: f64) -> Self {
        Self {
            kind: MouseEventKind::Up,
            button: Some(button),
            position,
            timestamp_ms,
        }
    }

    pub fn moved(position: Point, timestamp_ms: f64) -> Self {
        Self {
            kind: MouseEventKind::Move,
            button: None,
            position,
            timestamp_ms,
        }
    }
}

/// Mouse event as delivered to one view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub timestamp_ms: f64,
    pub button: Option<MouseButton>,
    pub position_in_view: Point,
    pub position_in_window: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelPhase {
    /// Discrete wheel notch without gesture tracking.
    None,
    Began,
    Changed,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelInput {
    pub position: Point,
    pub delta: Point,
    pub phase: WheelPhase,
}

/// Custom bitmap attached to a cursor change.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorImage {
    pub image: RgbaImage,
    pub scale: f32,
    pub size: Size,
    pub hotspot: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CursorChange {
    /// Cursor keyword as reported by the surface, e.g. `"pointer"`.
    pub name: SmolStr,
    pub cursor: Cursor,
    pub image: Option<CursorImage>,
}

impl CursorChange {
    pub fn named(name: &str) -> Self {
        Self {
            name: SmolStr::new(name),
            cursor: Cursor::from_name(name),
            image: None,
        }
    }

    pub fn custom(image: CursorImage) -> Self {
        Self {
            name: SmolStr::new_static("custom"),
            cursor: Cursor::Custom,
            image: Some(image),
        }
    }
}

/// Events originating inside a hosted surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    CursorChanged(CursorChange),
    /// Hovered link target; `location` is in window pixels.
    UpdateTargetUrl { url: String, location: Point },
    EnterHtmlFullScreen,
    LeaveHtmlFullScreen,
}

/// Everything the tree reports back to the host, drained with
/// `ViewTree::take_events`.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Mouse { view: ViewId, event: MouseEvent },
    CaptureLost { view: ViewId },
    SizeChanged { view: ViewId, old: Size, new: Size },
    ChildViewDetached { parent: ViewId, child: ViewId },
    DidScroll { view: ViewId },
    WillStartLiveScroll { view: ViewId },
    DidLiveScroll { view: ViewId },
    DidEndLiveScroll { view: ViewId },
    Surface { view: ViewId, event: SurfaceEvent },
}

impl ViewEvent {
    pub fn view(&self) -> ViewId {
        match self {
            Self::Mouse { view, .. }
            | Self::CaptureLost { view }
            | Self::SizeChanged { view, .. }
            | Self::DidScroll { view }
            | Self::WillStartLiveScroll { view }
            | Self::DidLiveScroll { view }
            | Self::DidEndLiveScroll { view }
            | Self::Surface { view, .. } => *view,
            Self::ChildViewDetached { parent, .. } => *parent,
        }
    }
}
