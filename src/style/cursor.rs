/// Cursor shapes a hosted surface can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Default,
    None,
    ContextMenu,
    Help,
    Pointer,
    Progress,
    Wait,
    Cell,
    Crosshair,
    Text,
    VerticalText,
    Alias,
    Copy,
    Move,
    NoDrop,
    NotAllowed,
    Grab,
    Grabbing,
    EResize,
    NResize,
    NeResize,
    NwResize,
    SResize,
    SeResize,
    SwResize,
    WResize,
    EwResize,
    NsResize,
    NeswResize,
    NwseResize,
    ColResize,
    RowResize,
    AllScroll,
    ZoomIn,
    ZoomOut,
    /// A surface-provided bitmap, see `CursorImage`.
    Custom,
}

impl Cursor {
    /// Maps a CSS cursor keyword. Unknown names fall back to `Default`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "none" => Self::None,
            "context-menu" => Self::ContextMenu,
            "help" => Self::Help,
            "pointer" | "hand" => Self::Pointer,
            "progress" => Self::Progress,
            "wait" => Self::Wait,
            "cell" => Self::Cell,
            "crosshair" => Self::Crosshair,
            "text" => Self::Text,
            "vertical-text" => Self::VerticalText,
            "alias" => Self::Alias,
            "copy" => Self::Copy,
            "move" => Self::Move,
            "no-drop" => Self::NoDrop,
            "not-allowed" => Self::NotAllowed,
            "grab" => Self::Grab,
            "grabbing" => Self::Grabbing,
            "e-resize" => Self::EResize,
            "n-resize" => Self::NResize,
            "ne-resize" => Self::NeResize,
            "nw-resize" => Self::NwResize,
            "s-resize" => Self::SResize,
            "se-resize" => Self::SeResize,
            "sw-resize" => Self::SwResize,
            "w-resize" => Self::WResize,
            "ew-resize" => Self::EwResize,
            "ns-resize" => Self::NsResize,
            "nesw-resize" => Self::NeswResize,
            "nwse-resize" => Self::NwseResize,
            "col-resize" => Self::ColResize,
            "row-resize" => Self::RowResize,
            "all-scroll" => Self::AllScroll,
            "zoom-in" => Self::ZoomIn,
            "zoom-out" => Self::ZoomOut,
            "custom" => Self::Custom,
            _ => Self::Default,
        }
    }
}
