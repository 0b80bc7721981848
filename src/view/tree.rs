use slotmap::SlotMap;

use super::compositor::{Compositor, Layer, LayerCommand};
use super::input::InputState;
use super::node::{Autoresize, ScaleState, ViewFlags, ViewKind, ViewNode};
use super::root::RootSurface;
use super::surface::FrameCapturer;
use super::{TreeConfig, ViewId};
use crate::error::{ViewError, ViewResult};
use crate::geometry::{AnchorPoint, Insets, Rect, Scale, Size, adjust_frame_about_anchor};
use crate::style::{Color, RoundedCorners};
use crate::transition::Animation;
use crate::ui::ViewEvent;

/// Arguments of `ViewTree::set_scale`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleOptions {
    pub scale_x: f32,
    pub scale_y: f32,
    pub anchor: AnchorPoint,
    /// Rewrite bounds around the anchor instead of scaling only the paint.
    pub adjust_frame: bool,
    pub animation: Option<Animation>,
}

impl ScaleOptions {
    pub fn new(scale_x: f32, scale_y: f32) -> Self {
        Self {
            scale_x,
            scale_y,
            anchor: AnchorPoint::default(),
            adjust_frame: true,
            animation: None,
        }
    }

    pub fn anchor(mut self, anchor: AnchorPoint) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn adjust_frame(mut self, adjust_frame: bool) -> Self {
        self.adjust_frame = adjust_frame;
        self
    }

    pub fn animation(mut self, animation: Animation) -> Self {
        self.animation = Some(animation);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BoundsOrigin {
    Direct,
    Layout,
}

/// Owner of every view node, the root surface and the compositor.
///
/// All mutation happens through `&mut self` on one thread. Presentation
/// catches up on `advance_frame`.
pub struct ViewTree {
    pub(crate) config: TreeConfig,
    pub(crate) nodes: SlotMap<ViewId, ViewNode>,
    pub(crate) root: RootSurface,
    pub(crate) compositor: Compositor,
    pub(crate) events: Vec<ViewEvent>,
    pub(crate) focused: Option<ViewId>,
    pub(crate) capture: Option<ViewId>,
    pub(crate) input: InputState,
    pub(crate) capturer: Option<Box<dyn FrameCapturer>>,
}

impl Default for ViewTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewTree {
    pub fn new() -> Self {
        Self::with_config(TreeConfig::from_env())
    }

    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            config,
            nodes: SlotMap::with_key(),
            root: RootSurface::default(),
            compositor: Compositor::new(&config),
            events: Vec::new(),
            focused: None,
            capture: None,
            input: InputState::default(),
            capturer: None,
        }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn create_view(&mut self) -> ViewId {
        self.insert_node(ViewKind::Container)
    }

    pub(crate) fn insert_node(&mut self, kind: ViewKind) -> ViewId {
        let node = ViewNode::new(kind);
        let layer = Layer::from_node(&node);
        let view = self.nodes.insert(node);
        self.compositor.insert_layer(view, layer);
        tracing::trace!(?view, "view created");
        view
    }

    pub fn contains(&self, view: ViewId) -> bool {
        self.nodes.contains_key(view)
    }

    pub fn node(&self, view: ViewId) -> ViewResult<&ViewNode> {
        self.nodes.get(view).ok_or(ViewError::UnknownView(view))
    }

    pub(crate) fn node_mut(&mut self, view: ViewId) -> ViewResult<&mut ViewNode> {
        self.nodes.get_mut(view).ok_or(ViewError::UnknownView(view))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drains events produced since the last call.
    pub fn take_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }

    /// True when `ancestor` is `view` itself or above it.
    pub fn is_ancestor_or_self(&self, ancestor: ViewId, view: ViewId) -> bool {
        let mut current = Some(view);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id).and_then(|node| node.parent);
        }
        false
    }

    /// Every node below and including `view`, parents before children.
    pub(crate) fn subtree(&self, view: ViewId) -> Vec<ViewId> {
        let mut out = Vec::new();
        let mut stack = vec![view];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Attaches `child` under `parent`, detaching it from any previous parent.
    ///
    /// `index` positions the child in insertion order; the default is the end.
    /// Adding to a scroll view replaces its content view.
    pub fn add_child_view(
        &mut self,
        parent: ViewId,
        child: ViewId,
        index: Option<usize>,
    ) -> ViewResult<()> {
        self.node(child)?;
        if self.node(parent)?.is_scroll_view() {
            return self.set_content_view(parent, child);
        }
        self.attach_child(parent, child, index)
    }

    pub(crate) fn attach_child(
        &mut self,
        parent: ViewId,
        child: ViewId,
        index: Option<usize>,
    ) -> ViewResult<()> {
        if self.node(parent)?.is_hosted_surface() {
            tracing::warn!(?parent, ?child, "rejected child view under a hosted surface");
            return Err(ViewError::LeafView(parent));
        }
        self.node(child)?;
        if self.is_ancestor_or_self(child, parent) {
            tracing::warn!(?parent, ?child, "rejected child view that would create a cycle");
            return Err(ViewError::Cycle { parent, child });
        }
        if self.root.content_view == Some(child) {
            self.root.content_view = None;
            self.release_native_ids(child);
        }
        if self.nodes[child].parent.is_some() {
            self.detach_from_parent(child);
        }

        let parent_node = &mut self.nodes[parent];
        match index {
            Some(index) => {
                let index = index.min(parent_node.children.len());
                parent_node.children.insert(index, child);
                let native_index = index.min(parent_node.native_order.len());
                parent_node.native_order.insert(native_index, child);
            }
            None => {
                parent_node.children.push(child);
                parent_node.native_order.push(child);
            }
        }
        self.nodes[child].parent = Some(parent);

        if self.is_realized(parent) {
            self.assign_native_ids(child);
        }
        self.sync_surface_visibility(child);
        self.compositor.request_redraw();
        tracing::debug!(?parent, ?child, "child view attached");
        Ok(())
    }

    /// No-op when `child` is not a direct child of `parent`.
    pub fn remove_child_view(&mut self, parent: ViewId, child: ViewId) -> ViewResult<()> {
        self.node(parent)?;
        if self.node(child)?.parent != Some(parent) {
            return Ok(());
        }
        self.detach_from_parent(child);
        Ok(())
    }

    pub(crate) fn detach_from_parent(&mut self, child: ViewId) {
        let Some(parent) = self.nodes.get(child).and_then(|node| node.parent) else {
            return;
        };
        let mut lost_content = false;
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.retain(|id| *id != child);
            parent_node.native_order.retain(|id| *id != child);
            if let Some(scroll) = parent_node.scroll_mut()
                && scroll.content_view == Some(child)
            {
                scroll.content_view = None;
                lost_content = true;
            }
        }
        self.nodes[child].parent = None;
        if lost_content {
            self.reclamp_scroll(parent);
        }
        self.release_native_ids(child);
        self.forget_interaction_state(child);
        self.sync_surface_visibility(child);
        self.events.push(ViewEvent::ChildViewDetached { parent, child });
        self.compositor.request_redraw();
        tracing::debug!(?parent, ?child, "child view detached");
    }

    /// Removes `view` from the tree. Its children survive as detached roots.
    pub fn destroy_view(&mut self, view: ViewId) -> ViewResult<()> {
        self.node(view)?;
        self.detach_from_parent(view);
        if self.root.content_view == Some(view) {
            self.root.content_view = None;
            self.release_native_ids(view);
        }
        let children = self.nodes[view].children.clone();
        for child in children {
            self.detach_from_parent(child);
        }
        self.forget_interaction_state(view);
        if let Some(scroll) = self.nodes[view].scroll_mut() {
            for pending in scroll.pending.drain(..) {
                pending.resolve(Err(ViewError::UnknownView(view)));
            }
        }
        self.compositor.remove_layer(view);
        self.nodes.remove(view);
        tracing::debug!(?view, "view destroyed");
        Ok(())
    }

    pub(crate) fn forget_interaction_state(&mut self, view: ViewId) {
        let contains = |target: Option<ViewId>, tree: &Self| {
            target.is_some_and(|target| tree.is_ancestor_or_self(view, target))
        };
        if contains(self.capture, self) {
            if let Some(lost) = self.capture.take() {
                self.events.push(ViewEvent::CaptureLost { view: lost });
            }
        }
        if contains(self.focused, self) {
            self.focused = None;
        }
        if contains(self.input.pressed, self) {
            self.input.pressed = None;
        }
        if contains(self.input.hovered, self) {
            self.input.hovered = None;
        }
    }

    pub fn set_bounds(&mut self, view: ViewId, bounds: Rect) -> ViewResult<()> {
        self.apply_bounds(view, bounds, None, None, BoundsOrigin::Direct)
    }

    /// Animates to `bounds`. `bounds()` reports the target immediately.
    pub fn animate_bounds(
        &mut self,
        view: ViewId,
        bounds: Rect,
        animation: Animation,
    ) -> ViewResult<()> {
        self.apply_bounds(view, bounds, Some(animation), None, BoundsOrigin::Direct)
    }

    /// Like `animate_bounds`, but the presentation first jumps to `from`.
    pub fn animate_bounds_from(
        &mut self,
        view: ViewId,
        from: Rect,
        bounds: Rect,
        animation: Animation,
    ) -> ViewResult<()> {
        if !from.is_finite() {
            return Err(ViewError::InvalidBounds(from));
        }
        self.apply_bounds(view, bounds, Some(animation), Some(from), BoundsOrigin::Direct)
    }

    pub(crate) fn apply_bounds(
        &mut self,
        view: ViewId,
        bounds: Rect,
        animation: Option<Animation>,
        from: Option<Rect>,
        origin: BoundsOrigin,
    ) -> ViewResult<()> {
        if !bounds.is_finite() {
            tracing::warn!(?view, ?bounds, "rejected non-finite bounds");
            return Err(ViewError::InvalidBounds(bounds));
        }
        if let Some(animation) = animation
            && !animation.is_valid()
        {
            return Err(ViewError::invalid_value(
                "animation duration",
                animation.duration_seconds as f64,
            ));
        }
        // Normalizes negative extents.
        let bounds = Rect::new(bounds.x, bounds.y, bounds.width, bounds.height);
        let node = self.node_mut(view)?;
        if origin == BoundsOrigin::Layout
            && node.surface().is_some_and(|surface| surface.block_resizing)
        {
            tracing::trace!(?view, "layout bounds ignored while resizing is blocked");
            return Ok(());
        }
        let old = node.bounds;
        node.bounds = bounds;
        if let Some(surface) = node.surface_mut() {
            surface.surface.set_bounds(bounds);
        }
        self.compositor.queue(LayerCommand::Bounds {
            view,
            from,
            to: bounds,
            animation,
        });

        if old.size() != bounds.size() {
            self.events.push(ViewEvent::SizeChanged {
                view,
                old: old.size(),
                new: bounds.size(),
            });
            self.reclamp_scroll(view);
            self.layout_children(view, old.size(), bounds.size(), animation);
        }
        Ok(())
    }

    /// Layout pass: children follow their parent's size per `Autoresize`.
    fn layout_children(
        &mut self,
        view: ViewId,
        old: Size,
        new: Size,
        animation: Option<Animation>,
    ) {
        let dw = new.width - old.width;
        let dh = new.height - old.height;
        let children = self.nodes[view].children.clone();
        for child in children {
            let node = &self.nodes[child];
            let autoresize = node.autoresize;
            if autoresize.is_empty() {
                continue;
            }
            let mut next = node.bounds;
            if autoresize.contains(Autoresize::WIDTH) {
                next.width = (next.width + dw).max(0.0);
            }
            if autoresize.contains(Autoresize::HEIGHT) {
                next.height = (next.height + dh).max(0.0);
            }
            if let Err(err) =
                self.apply_bounds(child, next, animation, None, BoundsOrigin::Layout)
            {
                tracing::warn!(?child, %err, "layout pass skipped child");
            }
        }
    }

    pub fn set_autoresize(&mut self, view: ViewId, autoresize: Autoresize) -> ViewResult<()> {
        self.node_mut(view)?.autoresize = autoresize;
        Ok(())
    }

    pub fn set_scale(&mut self, view: ViewId, options: ScaleOptions) -> ViewResult<()> {
        let scale = Scale::new(options.scale_x, options.scale_y);
        if !scale.is_valid() || !options.anchor.is_finite() {
            tracing::warn!(?view, ?scale, "rejected invalid scale");
            return Err(ViewError::InvalidScale {
                scale_x: options.scale_x,
                scale_y: options.scale_y,
            });
        }
        if let Some(animation) = options.animation
            && !animation.is_valid()
        {
            return Err(ViewError::invalid_value(
                "animation duration",
                animation.duration_seconds as f64,
            ));
        }
        let node = self.node(view)?;
        let bounds = node.bounds;
        let previous = node.transform;
        let anchor = options.anchor.resolve(&bounds);

        if options.adjust_frame {
            let factor = scale.relative_to(previous.frame_scale);
            let next = adjust_frame_about_anchor(&bounds, anchor, factor);
            self.nodes[view].transform = ScaleState {
                scale,
                frame_scale: scale,
                anchor: anchor - next.origin(),
            };
            self.compositor.queue(LayerCommand::Scale {
                view,
                to: Scale::IDENTITY,
                animation: options.animation,
            });
            self.apply_bounds(view, next, options.animation, None, BoundsOrigin::Direct)?;
        } else {
            let state = ScaleState {
                scale,
                frame_scale: previous.frame_scale,
                anchor: anchor - bounds.origin(),
            };
            self.nodes[view].transform = state;
            self.compositor.queue(LayerCommand::Scale {
                view,
                to: state.visual_scale(),
                animation: options.animation,
            });
        }
        tracing::debug!(?view, ?scale, adjust_frame = options.adjust_frame, "scale applied");
        Ok(())
    }

    /// Drops the scale transform; bounds stay as they are.
    pub fn reset_scaling(&mut self, view: ViewId) -> ViewResult<()> {
        self.node_mut(view)?.transform = ScaleState::default();
        self.compositor.queue(LayerCommand::Scale {
            view,
            to: Scale::IDENTITY,
            animation: None,
        });
        Ok(())
    }

    pub fn set_opacity(
        &mut self,
        view: ViewId,
        opacity: f32,
        animation: Option<Animation>,
    ) -> ViewResult<()> {
        if !opacity.is_finite() || !(0.0..=1.0).contains(&opacity) {
            return Err(ViewError::invalid_value("opacity", opacity as f64));
        }
        self.node_mut(view)?.opacity = opacity;
        self.compositor.queue(LayerCommand::Opacity {
            view,
            to: opacity,
            animation,
        });
        Ok(())
    }

    /// Takes effect on the next `rearrange_child_views` of the parent.
    pub fn set_z_index(&mut self, view: ViewId, z_index: i32) -> ViewResult<()> {
        self.node_mut(view)?.z_index = z_index;
        Ok(())
    }

    pub fn set_clipping_insets(&mut self, view: ViewId, insets: Insets) -> ViewResult<()> {
        if !insets.is_finite() {
            return Err(ViewError::invalid_value("clipping inset", f64::NAN));
        }
        self.node_mut(view)?.clipping_insets = insets;
        self.compositor.request_redraw();
        Ok(())
    }

    pub fn set_rounded_corners(&mut self, view: ViewId, corners: RoundedCorners) -> ViewResult<()> {
        if !corners.radius.is_finite() || corners.radius < 0.0 {
            return Err(ViewError::invalid_value("corner radius", corners.radius as f64));
        }
        self.node_mut(view)?.rounded_corners = corners;
        self.compositor.request_redraw();
        Ok(())
    }

    /// Accepts `#rgb`, `#rgba`, `#rrggbb` and `#rrggbbaa`.
    pub fn set_background_color(&mut self, view: ViewId, color: &str) -> ViewResult<()> {
        let color = Color::parse_hex(color)?;
        self.set_background(view, Some(color))
    }

    pub fn set_background(&mut self, view: ViewId, color: Option<Color>) -> ViewResult<()> {
        let node = self.node_mut(view)?;
        node.background_color = color;
        if let (Some(surface), Some(color)) = (node.surface_mut(), color) {
            surface.surface.set_background_color(color);
        }
        self.compositor.request_redraw();
        Ok(())
    }

    pub fn set_visible(&mut self, view: ViewId, visible: bool) -> ViewResult<()> {
        let node = self.node_mut(view)?;
        if node.is_visible() == visible {
            return Ok(());
        }
        node.flags.set(ViewFlags::VISIBLE, visible);
        if !visible {
            self.forget_interaction_state(view);
        }
        self.sync_surface_visibility(view);
        self.compositor.request_redraw();
        Ok(())
    }

    /// Visible itself and through every ancestor.
    pub fn is_tree_visible(&self, view: ViewId) -> bool {
        let mut current = Some(view);
        while let Some(id) = current {
            match self.nodes.get(id) {
                Some(node) if node.is_visible() => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    pub fn enable_mouse_events(&mut self, view: ViewId) -> ViewResult<()> {
        self.node_mut(view)?.flags.insert(ViewFlags::MOUSE_EVENTS);
        Ok(())
    }

    /// Tracking also turns on mouse events.
    pub fn set_mouse_tracking_enabled(&mut self, view: ViewId, enabled: bool) -> ViewResult<()> {
        let node = self.node_mut(view)?;
        node.flags.set(ViewFlags::MOUSE_TRACKING, enabled);
        if enabled {
            node.flags.insert(ViewFlags::MOUSE_EVENTS);
        }
        Ok(())
    }

    /// Set on the view or inherited from an ancestor.
    pub fn are_mouse_events_enabled(&self, view: ViewId) -> bool {
        self.any_ancestor_flag(view, ViewFlags::MOUSE_EVENTS | ViewFlags::MOUSE_TRACKING)
    }

    pub fn is_mouse_tracking_enabled(&self, view: ViewId) -> bool {
        self.any_ancestor_flag(view, ViewFlags::MOUSE_TRACKING)
    }

    fn any_ancestor_flag(&self, view: ViewId, flags: ViewFlags) -> bool {
        let mut current = Some(view);
        while let Some(id) = current {
            let Some(node) = self.nodes.get(id) else {
                return false;
            };
            if node.flags.intersects(flags) {
                return true;
            }
            current = node.parent;
        }
        false
    }

    /// Only the view itself passes hits through; descendants still hit.
    pub fn set_click_through(&mut self, view: ViewId, click_through: bool) -> ViewResult<()> {
        let node = self.node_mut(view)?;
        node.flags.set(ViewFlags::CLICK_THROUGH, click_through);
        if let Some(surface) = node.surface_mut() {
            surface.surface.set_click_through(click_through);
        }
        Ok(())
    }

    pub fn set_focusable(&mut self, view: ViewId, focusable: bool) -> ViewResult<()> {
        self.node_mut(view)?.flags.set(ViewFlags::FOCUSABLE, focusable);
        if !focusable && self.focused == Some(view) {
            self.focused = None;
        }
        Ok(())
    }

    /// Focuses `view` when it is focusable and tree-visible. Returns whether
    /// focus moved.
    pub fn focus(&mut self, view: ViewId) -> ViewResult<bool> {
        if !self.node(view)?.is_focusable() || !self.is_tree_visible(view) {
            return Ok(false);
        }
        self.focused = Some(view);
        self.reveal_focused(view);
        Ok(true)
    }

    pub fn has_focus(&self, view: ViewId) -> bool {
        self.focused == Some(view)
    }

    pub fn focused_view(&self) -> Option<ViewId> {
        self.focused
    }

    /// Routes all mouse input to `view` until released.
    pub fn set_capture(&mut self, view: ViewId) -> ViewResult<()> {
        self.node(view)?;
        if let Some(previous) = self.capture.replace(view)
            && previous != view
        {
            self.events.push(ViewEvent::CaptureLost { view: previous });
        }
        Ok(())
    }

    pub fn release_capture(&mut self, view: ViewId) -> ViewResult<()> {
        self.node(view)?;
        if self.capture == Some(view) {
            self.capture = None;
            self.events.push(ViewEvent::CaptureLost { view });
        }
        Ok(())
    }

    pub fn has_capture(&self, view: ViewId) -> bool {
        self.capture == Some(view)
    }

    pub fn set_frame_capturer(&mut self, capturer: Box<dyn FrameCapturer>) {
        self.capturer = Some(capturer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Anchor;

    fn tree() -> ViewTree {
        ViewTree::with_config(TreeConfig::new())
    }

    fn chain(tree: &mut ViewTree, depth: usize) -> Vec<ViewId> {
        let views: Vec<ViewId> = (0..depth).map(|_| tree.create_view()).collect();
        for pair in views.windows(2) {
            tree.add_child_view(pair[0], pair[1], None)
                .expect("chain attach should succeed");
        }
        views
    }

    #[test]
    fn add_ancestor_as_child_is_rejected_at_any_depth() {
        for depth in 1..6 {
            let mut tree = tree();
            let views = chain(&mut tree, depth);
            let leaf = *views.last().expect("chain is not empty");
            for ancestor in &views {
                let before: Vec<_> =
                    views.iter().map(|v| tree.node(*v).unwrap().parent()).collect();
                let err = tree
                    .add_child_view(leaf, *ancestor, None)
                    .expect_err("ancestor cannot become a descendant");
                assert!(matches!(err, ViewError::Cycle { .. }));
                let after: Vec<_> = views.iter().map(|v| tree.node(*v).unwrap().parent()).collect();
                assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn reparenting_detaches_from_previous_parent() {
        let mut tree = tree();
        let a = tree.create_view();
        let b = tree.create_view();
        let child = tree.create_view();
        tree.add_child_view(a, child, None).unwrap();
        tree.add_child_view(b, child, None).unwrap();

        assert!(tree.get_views(a).unwrap().is_empty());
        assert_eq!(tree.get_views(b).unwrap(), vec![child]);
        assert_eq!(tree.node(child).unwrap().parent(), Some(b));
        assert!(tree
            .take_events()
            .contains(&ViewEvent::ChildViewDetached { parent: a, child }));
    }

    #[test]
    fn insert_at_index_and_remove_non_child_is_noop() {
        let mut tree = tree();
        let parent = tree.create_view();
        let [a, b, c] = [tree.create_view(), tree.create_view(), tree.create_view()];
        tree.add_child_view(parent, a, None).unwrap();
        tree.add_child_view(parent, b, None).unwrap();
        tree.add_child_view(parent, c, Some(0)).unwrap();
        assert_eq!(tree.get_views(parent).unwrap(), vec![c, a, b]);

        let stranger = tree.create_view();
        tree.remove_child_view(parent, stranger).unwrap();
        assert_eq!(tree.get_views(parent).unwrap().len(), 3);

        tree.remove_child_view(parent, a).unwrap();
        assert_eq!(tree.get_views(parent).unwrap(), vec![c, b]);
        assert_eq!(tree.node(a).unwrap().parent(), None);
    }

    #[test]
    fn non_finite_bounds_keep_prior_state() {
        let mut tree = tree();
        let view = tree.create_view();
        let good = Rect::new(1.0, 2.0, 3.0, 4.0);
        tree.set_bounds(view, good).unwrap();
        for bad in [
            Rect { x: f32::NAN, ..good },
            Rect { width: f32::INFINITY, ..good },
            Rect { y: f32::NEG_INFINITY, ..good },
        ] {
            assert!(matches!(tree.set_bounds(view, bad), Err(ViewError::InvalidBounds(_))));
            assert_eq!(tree.node(view).unwrap().bounds(), good);
        }
    }

    #[test]
    fn animated_bounds_report_target_immediately() {
        let mut tree = tree();
        let view = tree.create_view();
        tree.set_bounds(view, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        let target = Rect::new(50.0, 60.0, 300.0, 200.0);
        tree.animate_bounds(view, target, Animation::new(1.0)).unwrap();
        assert_eq!(tree.node(view).unwrap().bounds(), target);
    }

    #[test]
    fn adjust_frame_scale_keeps_center_anchor_fixed() {
        let mut tree = tree();
        let view = tree.create_view();
        let bounds = Rect::new(100.0, 100.0, 400.0, 200.0);
        tree.set_bounds(view, bounds).unwrap();
        tree.set_scale(view, ScaleOptions::new(0.5, 0.5)).unwrap();

        let node = tree.node(view).unwrap();
        assert_eq!(node.bounds(), Rect::new(200.0, 150.0, 200.0, 100.0));
        assert_eq!(node.bounds().center(), bounds.center());
        assert_eq!(node.view_bounds(), node.bounds());
        assert_eq!(node.scale_x(), 0.5);

        // Scaling back restores the original frame.
        tree.set_scale(view, ScaleOptions::new(1.0, 1.0)).unwrap();
        assert_eq!(tree.node(view).unwrap().bounds(), bounds);
    }

    #[test]
    fn paint_only_scale_keeps_bounds_and_reports_view_bounds() {
        let mut tree = tree();
        let view = tree.create_view();
        let bounds = Rect::new(0.0, 0.0, 200.0, 100.0);
        tree.set_bounds(view, bounds).unwrap();
        tree.set_scale(
            view,
            ScaleOptions::new(2.0, 2.0)
                .anchor(AnchorPoint::new(Anchor::Start, Anchor::Start))
                .adjust_frame(false),
        )
        .unwrap();

        let node = tree.node(view).unwrap();
        assert_eq!(node.bounds(), bounds);
        assert_eq!(node.view_bounds(), Rect::new(0.0, 0.0, 400.0, 200.0));
        assert_eq!(node.scale_y(), 2.0);

        tree.reset_scaling(view).unwrap();
        assert_eq!(tree.node(view).unwrap().view_bounds(), bounds);
        assert_eq!(tree.node(view).unwrap().scale_x(), 1.0);
    }

    #[test]
    fn invalid_scale_is_rejected() {
        let mut tree = tree();
        let view = tree.create_view();
        tree.set_bounds(view, Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        for (sx, sy) in [(f32::NAN, 1.0), (1.0, 0.0), (-1.0, 1.0)] {
            assert!(matches!(
                tree.set_scale(view, ScaleOptions::new(sx, sy)),
                Err(ViewError::InvalidScale { .. })
            ));
        }
        assert_eq!(tree.node(view).unwrap().bounds(), Rect::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn autoresize_children_follow_parent_size() {
        let mut tree = tree();
        let parent = tree.create_view();
        let child = tree.create_view();
        let fixed = tree.create_view();
        tree.set_bounds(parent, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        tree.set_bounds(child, Rect::new(10.0, 10.0, 80.0, 80.0)).unwrap();
        tree.set_bounds(fixed, Rect::new(0.0, 0.0, 20.0, 20.0)).unwrap();
        tree.set_autoresize(child, Autoresize::WIDTH | Autoresize::HEIGHT).unwrap();
        tree.add_child_view(parent, child, None).unwrap();
        tree.add_child_view(parent, fixed, None).unwrap();
        tree.take_events();

        tree.set_bounds(parent, Rect::new(0.0, 0.0, 150.0, 120.0)).unwrap();
        assert_eq!(tree.node(child).unwrap().bounds(), Rect::new(10.0, 10.0, 130.0, 100.0));
        assert_eq!(tree.node(fixed).unwrap().bounds(), Rect::new(0.0, 0.0, 20.0, 20.0));
        let events = tree.take_events();
        assert!(events.iter().any(
            |e| matches!(e, ViewEvent::SizeChanged { view, .. } if *view == child)
        ));
    }

    #[test]
    fn opacity_outside_unit_range_is_rejected() {
        let mut tree = tree();
        let view = tree.create_view();
        assert!(tree.set_opacity(view, 1.5, None).is_err());
        assert!(tree.set_opacity(view, f32::NAN, None).is_err());
        tree.set_opacity(view, 0.25, None).unwrap();
        assert_eq!(tree.node(view).unwrap().opacity(), 0.25);
    }

    #[test]
    fn mouse_flags_are_inherited_but_click_through_is_not() {
        let mut tree = tree();
        let views = chain(&mut tree, 3);
        tree.set_mouse_tracking_enabled(views[0], true).unwrap();
        tree.set_click_through(views[0], true).unwrap();
        assert!(tree.are_mouse_events_enabled(views[2]));
        assert!(tree.is_mouse_tracking_enabled(views[2]));
        assert!(!tree.node(views[2]).unwrap().is_click_through());
        assert!(tree.node(views[0]).unwrap().is_click_through());
    }

    #[test]
    fn capture_moves_between_views_with_capture_lost() {
        let mut tree = tree();
        let a = tree.create_view();
        let b = tree.create_view();
        tree.set_capture(a).unwrap();
        tree.set_capture(b).unwrap();
        assert!(tree.has_capture(b));
        assert!(!tree.has_capture(a));
        tree.release_capture(b).unwrap();
        assert_eq!(
            tree.take_events(),
            vec![ViewEvent::CaptureLost { view: a }, ViewEvent::CaptureLost { view: b }]
        );
    }

    #[test]
    fn focus_requires_focusable_and_visible_tree() {
        let mut tree = tree();
        let views = chain(&mut tree, 2);
        assert!(!tree.focus(views[1]).unwrap());
        tree.set_focusable(views[1], true).unwrap();
        tree.set_visible(views[0], false).unwrap();
        assert!(!tree.focus(views[1]).unwrap());
        tree.set_visible(views[0], true).unwrap();
        assert!(tree.focus(views[1]).unwrap());
        assert!(tree.has_focus(views[1]));
        tree.set_visible(views[0], false).unwrap();
        assert!(!tree.has_focus(views[1]));
    }

    #[test]
    fn destroy_keeps_children_alive_as_detached_roots() {
        let mut tree = tree();
        let views = chain(&mut tree, 3);
        tree.destroy_view(views[1]).unwrap();
        assert!(!tree.contains(views[1]));
        assert!(tree.get_views(views[0]).unwrap().is_empty());
        assert_eq!(tree.node(views[2]).unwrap().parent(), None);
        assert!(matches!(tree.set_bounds(views[1], Rect::ZERO), Err(ViewError::UnknownView(_))));
    }
}
