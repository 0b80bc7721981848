use glam::Vec2;

use super::{ViewId, ViewTree};
use crate::error::ViewResult;
use crate::geometry::{Point, Rect};

/// Axis-aligned affine map: `p * scale + offset`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Affine {
    pub offset: Vec2,
    pub scale: Vec2,
}

impl Affine {
    pub const IDENTITY: Self = Self {
        offset: Vec2::ZERO,
        scale: Vec2::ONE,
    };

    pub fn apply(&self, point: Vec2) -> Vec2 {
        point * self.scale + self.offset
    }

    pub fn map_point(&self, point: Point) -> Point {
        Point::from_vec2(self.apply(point.to_vec2()))
    }

    pub fn map_rect(&self, rect: &Rect) -> Rect {
        let a = self.apply(Vec2::new(rect.x, rect.y));
        let b = self.apply(Vec2::new(rect.right(), rect.bottom()));
        let min = a.min(b);
        let max = a.max(b);
        Rect::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    /// Scales are always positive and finite, so the inverse exists.
    pub fn invert(&self) -> Self {
        let scale = Vec2::ONE / self.scale;
        Self {
            offset: -self.offset * scale,
            scale,
        }
    }

    /// `self` first, then `next`.
    pub fn then(&self, next: &Affine) -> Self {
        Self {
            offset: self.offset * next.scale + next.offset,
            scale: self.scale * next.scale,
        }
    }
}

/// Which copy of the geometry to walk: the model the caller set, or the
/// compositor's presented layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum GeometrySource {
    Model,
    Presented,
}

impl ViewTree {
    /// Maps `view`'s local space into its parent's child space.
    pub(crate) fn local_to_parent(&self, view: ViewId, source: GeometrySource) -> Affine {
        let Some(node) = self.nodes.get(view) else {
            return Affine::IDENTITY;
        };
        let (bounds, scale) = match (source, self.compositor.layer(view)) {
            (GeometrySource::Presented, Some(layer)) => (layer.bounds, layer.scale),
            _ => (node.bounds, node.transform.visual_scale()),
        };
        let anchor = node.transform.anchor.to_vec2();
        let scale = Vec2::new(scale.x, scale.y);
        Affine {
            offset: bounds.origin().to_vec2() + anchor - anchor * scale,
            scale,
        }
    }

    /// Maps a parent's child space into the parent's local space. Only scroll
    /// containers move their children.
    pub(crate) fn child_to_local(&self, parent: ViewId, source: GeometrySource) -> Affine {
        let Some(scroll) = self.nodes.get(parent).and_then(|node| node.scroll()) else {
            return Affine::IDENTITY;
        };
        let offset = match (source, self.compositor.layer(parent)) {
            (GeometrySource::Presented, Some(layer)) => layer.scroll_offset,
            _ => scroll.scroll_position,
        };
        let zoom = Vec2::splat(scroll.zoom_factor);
        Affine {
            offset: -offset.to_vec2() * zoom,
            scale: zoom,
        }
    }

    /// Maps `view`'s local space to window space. For detached subtrees the
    /// result is relative to the topmost ancestor's parent space.
    pub(crate) fn local_to_window(&self, view: ViewId, source: GeometrySource) -> Affine {
        let mut transform = self.local_to_parent(view, source);
        let mut current = self.nodes.get(view).and_then(|node| node.parent);
        while let Some(parent) = current {
            transform = transform
                .then(&self.child_to_local(parent, source))
                .then(&self.local_to_parent(parent, source));
            current = self.nodes.get(parent).and_then(|node| node.parent);
        }
        transform
    }

    /// Origin of `from` expressed in `view`'s local coordinates.
    pub fn offset_from_view(&self, view: ViewId, from: ViewId) -> ViewResult<Point> {
        self.node(view)?;
        self.node(from)?;
        let from_origin = self
            .local_to_window(from, GeometrySource::Model)
            .map_point(Point::ZERO);
        let to_local = self.local_to_window(view, GeometrySource::Model).invert();
        Ok(to_local.map_point(from_origin))
    }

    /// Window origin expressed in `view`'s local coordinates.
    pub fn offset_from_window(&self, view: ViewId) -> ViewResult<Point> {
        self.node(view)?;
        let to_local = self.local_to_window(view, GeometrySource::Model).invert();
        Ok(to_local.map_point(Point::ZERO))
    }

    /// `view`'s bounds in window coordinates, after scaling.
    pub fn window_rect(&self, view: ViewId) -> ViewResult<Rect> {
        let size = self.node(view)?.bounds.size();
        let local = Rect::from_origin_size(Point::ZERO, size);
        Ok(self
            .local_to_window(view, GeometrySource::Model)
            .map_rect(&local))
    }
}
