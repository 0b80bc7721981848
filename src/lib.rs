//! Retained-mode view compositing: a tree of rectangular views with
//! stacking, scaling, clipping, scroll containers and embedded surfaces,
//! presented through an animated layer store ticked by `advance_frame`.

mod error;
pub mod geometry;
mod style;
pub mod transition;
pub mod ui;
pub mod view;

pub use error::*;
pub use geometry::{Anchor, AnchorPoint, Insets, Point, Rect, Scale, Size};
pub use style::*;
pub use transition::{Animation, CubicBezier, RunResult, TimeFunction};
pub use view::*;
