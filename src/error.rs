use crate::geometry::Rect;
use crate::view::ViewId;

/// Errors reported synchronously by tree operations.
///
/// A rejected operation never reaches the compositor; the node keeps its
/// last committed state.
#[derive(thiserror::Error, Debug)]
pub enum ViewError {
    /// Adding `child` under `parent` would make the tree cyclic.
    #[error("adding {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: ViewId, child: ViewId },

    /// A bounds component was NaN or infinite.
    #[error("invalid bounds {0:?}: every component must be finite")]
    InvalidBounds(Rect),

    /// A scale factor or anchor was non-finite or non-positive.
    #[error("invalid scale ({scale_x}, {scale_y})")]
    InvalidScale { scale_x: f32, scale_y: f32 },

    /// A numeric property was outside its accepted range.
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: f64 },

    /// The operation needs a realized backing store.
    #[error("{0:?} is not attached to a realized root surface")]
    DetachedOperation(ViewId),

    /// The handle refers to a destroyed node or to another tree.
    #[error("unknown view {0:?}")]
    UnknownView(ViewId),

    #[error("{0:?} is not a scroll view")]
    NotScrollView(ViewId),

    #[error("{0:?} does not host a surface")]
    NotHostedSurface(ViewId),

    /// Hosted surfaces are leaves and never take children.
    #[error("{0:?} is a leaf view and cannot have children")]
    LeafView(ViewId),

    #[error("scroll view {0:?} has no content view")]
    NoContentView(ViewId),

    #[error("scroll view {0:?} was not created with scaled content")]
    ZoomUnavailable(ViewId),

    #[error("invalid color: {0}")]
    InvalidColor(String),

    #[error("invalid anchor: {0}")]
    InvalidAnchor(String),

    /// The frame capture collaborator failed or is missing.
    #[error("frame capture failed: {0}")]
    Capture(String),

    #[error("failed to decode captured frame")]
    ImageDecode(#[from] image::ImageError),
}

pub type ViewResult<T> = Result<T, ViewError>;

impl ViewError {
    pub fn invalid_value(name: &'static str, value: f64) -> Self {
        Self::InvalidValue { name, value }
    }

    pub fn capture(message: impl Into<String>) -> Self {
        Self::Capture(message.into())
    }
}
