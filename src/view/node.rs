use std::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;
use glam::Vec2;

use super::scroll::ScrollState;
use super::surface::SurfaceState;
use super::{NativeId, ViewId};
use crate::geometry::{Insets, Point, Rect, Scale};
use crate::style::{Color, RoundedCorners};

fn next_view_id() -> u64 {
    static NEXT_ID: AtomicU64 = AtomicU64::new(1);
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ViewFlags: u8 {
        const VISIBLE = 1 << 0;
        const MOUSE_EVENTS = 1 << 1;
        const MOUSE_TRACKING = 1 << 2;
        const CLICK_THROUGH = 1 << 3;
        const FOCUSABLE = 1 << 4;
    }
}

impl Default for ViewFlags {
    fn default() -> Self {
        Self::VISIBLE
    }
}

bitflags! {
    /// Bounds components that follow the parent's size during a layout pass.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Autoresize: u8 {
        const WIDTH = 1 << 0;
        const HEIGHT = 1 << 1;
    }
}

/// Scale transform of a node.
///
/// `frame_scale` is the part already baked into `bounds` by adjust-frame
/// scaling; the remainder is a paint-time transform about `anchor`, which is
/// kept relative to the bounds origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleState {
    pub scale: Scale,
    pub frame_scale: Scale,
    pub anchor: Point,
}

impl Default for ScaleState {
    fn default() -> Self {
        Self {
            scale: Scale::IDENTITY,
            frame_scale: Scale::IDENTITY,
            anchor: Point::ZERO,
        }
    }
}

impl ScaleState {
    pub fn visual_scale(&self) -> Scale {
        self.scale.relative_to(self.frame_scale)
    }

    pub fn view_bounds(&self, bounds: &Rect) -> Rect {
        let visual = self.visual_scale();
        if visual == Scale::IDENTITY {
            return *bounds;
        }
        let anchor = bounds.origin() + self.anchor;
        bounds.scaled_about(anchor, visual.x, visual.y)
    }
}

pub(crate) enum ViewKind {
    Container,
    Scroll(Box<ScrollState>),
    Surface(Box<SurfaceState>),
}

/// One node of the view tree.
pub struct ViewNode {
    pub(crate) id: u64,
    pub(crate) native_id: Option<NativeId>,
    pub(crate) parent: Option<ViewId>,
    pub(crate) children: Vec<ViewId>,
    pub(crate) native_order: Vec<ViewId>,
    pub(crate) bounds: Rect,
    pub(crate) transform: ScaleState,
    pub(crate) z_index: i32,
    pub(crate) clipping_insets: Insets,
    pub(crate) background_color: Option<Color>,
    pub(crate) rounded_corners: RoundedCorners,
    pub(crate) opacity: f32,
    pub(crate) flags: ViewFlags,
    pub(crate) autoresize: Autoresize,
    pub(crate) kind: ViewKind,
}

impl ViewNode {
    pub(crate) fn new(kind: ViewKind) -> Self {
        Self {
            id: next_view_id(),
            native_id: None,
            parent: None,
            children: Vec::new(),
            native_order: Vec::new(),
            bounds: Rect::ZERO,
            transform: ScaleState::default(),
            z_index: 0,
            clipping_insets: Insets::ZERO,
            background_color: None,
            rounded_corners: RoundedCorners::NONE,
            opacity: 1.0,
            flags: ViewFlags::default(),
            autoresize: Autoresize::empty(),
            kind,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn native_id(&self) -> Option<NativeId> {
        self.native_id
    }

    pub fn parent(&self) -> Option<ViewId> {
        self.parent
    }

    /// Target bounds; in-flight animations are not reflected.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Rectangle actually occupied after the scale transform.
    pub fn view_bounds(&self) -> Rect {
        self.transform.view_bounds(&self.bounds)
    }

    pub fn scale_x(&self) -> f32 {
        self.transform.scale.x
    }

    pub fn scale_y(&self) -> f32 {
        self.transform.scale.y
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn clipping_insets(&self) -> Insets {
        self.clipping_insets
    }

    pub fn background_color(&self) -> Option<Color> {
        self.background_color
    }

    pub fn rounded_corners(&self) -> RoundedCorners {
        self.rounded_corners
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn is_visible(&self) -> bool {
        self.flags.contains(ViewFlags::VISIBLE)
    }

    pub fn is_click_through(&self) -> bool {
        self.flags.contains(ViewFlags::CLICK_THROUGH)
    }

    pub fn is_focusable(&self) -> bool {
        self.flags.contains(ViewFlags::FOCUSABLE)
    }

    pub fn flags(&self) -> ViewFlags {
        self.flags
    }

    pub fn autoresize(&self) -> Autoresize {
        self.autoresize
    }

    pub fn is_scroll_view(&self) -> bool {
        matches!(self.kind, ViewKind::Scroll(_))
    }

    pub fn is_hosted_surface(&self) -> bool {
        matches!(self.kind, ViewKind::Surface(_))
    }

    pub(crate) fn scroll(&self) -> Option<&ScrollState> {
        match &self.kind {
            ViewKind::Scroll(state) => Some(state),
            _ => None,
        }
    }

    pub(crate) fn scroll_mut(&mut self) -> Option<&mut ScrollState> {
        match &mut self.kind {
            ViewKind::Scroll(state) => Some(state),
            _ => None,
        }
    }

    pub(crate) fn surface(&self) -> Option<&SurfaceState> {
        match &self.kind {
            ViewKind::Surface(state) => Some(state),
            _ => None,
        }
    }

    pub(crate) fn surface_mut(&mut self) -> Option<&mut SurfaceState> {
        match &mut self.kind {
            ViewKind::Surface(state) => Some(state),
            _ => None,
        }
    }

    /// Local clip rectangle applied to children.
    pub(crate) fn child_clip_rect(&self) -> Rect {
        Rect::from_origin_size(Point::ZERO, self.bounds.size()).inset(self.clipping_insets)
    }

    /// Maps a point in this node's local space into its children's space.
    pub(crate) fn local_to_child_space(&self, local: Vec2) -> Vec2 {
        match self.scroll() {
            Some(scroll) => local / scroll.zoom_factor + scroll.scroll_position.to_vec2(),
            None => local,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_per_node() {
        let a = ViewNode::new(ViewKind::Container);
        let b = ViewNode::new(ViewKind::Container);
        assert_ne!(a.id(), b.id());
        assert!(a.native_id().is_none());
        assert!(a.is_visible());
        assert_eq!(a.z_index(), 0);
    }

    #[test]
    fn view_bounds_follow_paint_scale_about_anchor() {
        let bounds = Rect::new(10.0, 10.0, 100.0, 50.0);
        let state = ScaleState {
            scale: Scale::new(0.5, 0.5),
            frame_scale: Scale::IDENTITY,
            anchor: Point::new(50.0, 25.0),
        };
        assert_eq!(state.view_bounds(&bounds), Rect::new(35.0, 22.5, 50.0, 25.0));

        let baked = ScaleState {
            frame_scale: Scale::new(0.5, 0.5),
            ..state
        };
        assert_eq!(baked.view_bounds(&bounds), bounds);
    }

    #[test]
    fn child_clip_rect_applies_insets_locally() {
        let mut node = ViewNode::new(ViewKind::Container);
        node.bounds = Rect::new(200.0, 300.0, 100.0, 80.0);
        node.clipping_insets = Insets::new(10.0, 5.0, 10.0, 5.0);
        assert_eq!(node.child_clip_rect(), Rect::new(5.0, 10.0, 90.0, 60.0));
    }
}
