use super::tree::BoundsOrigin;
use super::{ViewId, ViewTree};
use crate::error::{ViewError, ViewResult};
use crate::geometry::{Point, Rect, Size};

/// The window content slot every realized tree hangs from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RootSurface {
    pub(crate) content_view: Option<ViewId>,
    pub(crate) size: Size,
    pub(crate) shown: bool,
    pub(crate) realized: bool,
}

impl RootSurface {
    pub fn content_view(&self) -> Option<ViewId> {
        self.content_view
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    /// Has backing storage; stays true while hidden, until closed.
    pub fn is_realized(&self) -> bool {
        self.realized
    }
}

impl ViewTree {
    pub fn root(&self) -> &RootSurface {
        &self.root
    }

    /// Installs `view` as the window content. It is detached from any parent
    /// and sized to fill the surface.
    pub fn set_root_content_view(&mut self, view: ViewId) -> ViewResult<()> {
        self.node(view)?;
        if self.root.content_view == Some(view) {
            return Ok(());
        }
        if let Some(previous) = self.root.content_view.take() {
            self.release_native_ids(previous);
            self.forget_interaction_state(previous);
        }
        self.detach_from_parent(view);
        self.root.content_view = Some(view);
        if self.root.realized {
            self.assign_native_ids(view);
        }
        self.fill_root(view)?;
        self.sync_surface_visibility(view);
        tracing::debug!(?view, "root content view set");
        Ok(())
    }

    pub fn root_content_view(&self) -> Option<ViewId> {
        self.root.content_view
    }

    /// Realizes the surface and shows it. Native ids are handed out to the
    /// whole content tree.
    pub fn show_root(&mut self) {
        if !self.root.realized {
            self.root.realized = true;
            if let Some(content) = self.root.content_view {
                self.assign_native_ids(content);
            }
        }
        self.root.shown = true;
        if let Some(content) = self.root.content_view {
            self.sync_surface_visibility(content);
        }
        self.compositor.request_redraw();
        tracing::debug!(size = ?self.root.size, "root surface shown");
    }

    /// Hides without releasing backing storage.
    pub fn hide_root(&mut self) {
        self.root.shown = false;
        if let Some(content) = self.root.content_view {
            self.sync_surface_visibility(content);
        }
        tracing::debug!("root surface hidden");
    }

    /// Releases backing storage; the content view stays installed.
    pub fn close_root(&mut self) {
        self.root.shown = false;
        self.root.realized = false;
        if let Some(content) = self.root.content_view {
            self.release_native_ids(content);
            self.forget_interaction_state(content);
            self.sync_surface_visibility(content);
        }
        tracing::debug!("root surface closed");
    }

    pub fn resize_root(&mut self, size: Size) {
        if !size.is_finite() {
            tracing::warn!(?size, "rejected non-finite root size");
            return;
        }
        self.root.size = Size::new(size.width, size.height);
        if let Some(content) = self.root.content_view
            && let Err(err) = self.fill_root(content)
        {
            tracing::warn!(%err, "root content view could not be resized");
        }
    }

    pub fn root_size(&self) -> Size {
        self.root.size
    }

    fn fill_root(&mut self, view: ViewId) -> ViewResult<()> {
        let bounds = Rect::from_origin_size(Point::ZERO, self.root.size);
        self.apply_bounds(view, bounds, None, None, BoundsOrigin::Layout)
    }

    /// Attached below the root content view of a realized surface.
    pub fn is_realized(&self, view: ViewId) -> bool {
        if !self.root.realized {
            return false;
        }
        let mut current = view;
        while let Some(parent) = self.nodes.get(current).and_then(|node| node.parent) {
            current = parent;
        }
        self.nodes.contains_key(current) && self.root.content_view == Some(current)
    }

    pub(crate) fn require_realized(&self, view: ViewId) -> ViewResult<()> {
        if self.node(view)?.native_id.is_none() {
            return Err(ViewError::DetachedOperation(view));
        }
        Ok(())
    }

    pub(crate) fn assign_native_ids(&mut self, view: ViewId) {
        for id in self.subtree(view) {
            let node = &mut self.nodes[id];
            if node.native_id.is_none() {
                let native = self.compositor.native_ids.allocate();
                node.native_id = Some(native);
                tracing::trace!(view = ?id, native = native.0, "native id assigned");
            }
        }
    }

    pub(crate) fn release_native_ids(&mut self, view: ViewId) {
        for id in self.subtree(view) {
            if let Some(native) = self.nodes[id].native_id.take() {
                self.compositor.native_ids.release(native);
                tracing::trace!(view = ?id, native = native.0, "native id released");
            }
        }
    }
}
