use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use glam::Vec2;

use super::compositor::LayerCommand;
use super::node::ViewKind;
use super::transform::GeometrySource;
use super::tree::BoundsOrigin;
use super::{ViewId, ViewTree};
use crate::error::{ViewError, ViewResult};
use crate::geometry::{Point, Rect, Size};
use crate::transition::Animation;
use crate::ui::ViewEvent;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrollBarMode {
    #[default]
    Enabled,
    Disabled,
    /// Scrollable but no visible bar.
    EnabledButHidden,
}

/// Rubber-band behavior at the edges. Presentational only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrollElasticity {
    #[default]
    Automatic,
    None,
    Allowed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollOptions {
    /// Enables `set_zoom_factor`.
    pub scaled_content: bool,
    pub horizontal_mode: ScrollBarMode,
    pub vertical_mode: ScrollBarMode,
    /// Animate programmatic scrolls with `TreeConfig::scroll_animation`.
    pub smooth_scroll: bool,
    /// Focus changes inside the content do not scroll this view.
    pub block_scroll_view_when_focus: bool,
}

/// Per-axis scroll target; `None` keeps the axis where it is.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollRequest {
    pub x: Option<f32>,
    pub y: Option<f32>,
}

impl ScrollRequest {
    pub fn to(point: Point) -> Self {
        Self {
            x: Some(point.x),
            y: Some(point.y),
        }
    }

    pub fn x(x: f32) -> Self {
        Self {
            x: Some(x),
            y: None,
        }
    }

    pub fn y(y: f32) -> Self {
        Self {
            x: None,
            y: Some(y),
        }
    }
}

#[derive(Default)]
struct CompletionState {
    result: Option<ViewResult<Point>>,
    waker: Option<Waker>,
}

/// Resolves with the committed, clamped scroll position once the compositor
/// has applied the request.
#[must_use = "the committed position is only observable through the completion"]
pub struct ScrollCompletion {
    state: Rc<RefCell<CompletionState>>,
}

impl ScrollCompletion {
    fn pending() -> (Self, PendingScroll) {
        let state = Rc::new(RefCell::new(CompletionState::default()));
        (
            Self {
                state: Rc::clone(&state),
            },
            PendingScroll { state },
        )
    }

    fn ready(result: ViewResult<Point>) -> Self {
        let (completion, pending) = Self::pending();
        pending.resolve(result);
        completion
    }

    pub fn is_resolved(&self) -> bool {
        self.state.borrow().result.is_some()
    }

    /// Takes the result without polling. Later calls return `None`.
    pub fn try_take(&self) -> Option<ViewResult<Point>> {
        self.state.borrow_mut().result.take()
    }
}

impl Future for ScrollCompletion {
    type Output = ViewResult<Point>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.state.borrow_mut();
        match state.result.take() {
            Some(result) => Poll::Ready(result),
            None => {
                state.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

/// Producer side of a `ScrollCompletion`.
pub(crate) struct PendingScroll {
    state: Rc<RefCell<CompletionState>>,
}

impl PendingScroll {
    pub(crate) fn resolve(self, result: ViewResult<Point>) {
        let waker = {
            let mut state = self.state.borrow_mut();
            state.result = Some(result);
            state.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

pub(crate) struct ScrollState {
    pub(crate) content_view: Option<ViewId>,
    /// Committed position; what the compositor shows once animations settle.
    pub(crate) scroll_position: Point,
    pub(crate) pending: Vec<PendingScroll>,
    pub(crate) pending_target: Option<Point>,
    pub(crate) pending_animation: Option<Animation>,
    pub(crate) zoom_factor: f32,
    pub(crate) options: ScrollOptions,
    pub(crate) horizontal_elasticity: ScrollElasticity,
    pub(crate) vertical_elasticity: ScrollElasticity,
    pub(crate) overlay_scrollbar: bool,
    pub(crate) scroll_events_enabled: bool,
    pub(crate) wheel_swapped: bool,
    pub(crate) wheel_factor: f32,
    pub(crate) did_scroll_pending: bool,
    pub(crate) clip_height: Option<(f32, f32)>,
    pub(crate) live_scrolling: bool,
}

impl ScrollState {
    fn new(options: ScrollOptions, wheel_factor: f32) -> Self {
        Self {
            content_view: None,
            scroll_position: Point::ZERO,
            pending: Vec::new(),
            pending_target: None,
            pending_animation: None,
            zoom_factor: 1.0,
            options,
            horizontal_elasticity: ScrollElasticity::default(),
            vertical_elasticity: ScrollElasticity::default(),
            overlay_scrollbar: false,
            scroll_events_enabled: false,
            wheel_swapped: false,
            wheel_factor,
            did_scroll_pending: false,
            clip_height: None,
            live_scrolling: false,
        }
    }

    pub(crate) fn maximum_scroll_position(content: Size, viewport: Size) -> Point {
        Point::new(
            (content.width - viewport.width).max(0.0),
            (content.height - viewport.height).max(0.0),
        )
    }

    pub(crate) fn clamp(position: Point, content: Size, viewport: Size) -> Point {
        let max = Self::maximum_scroll_position(content, viewport);
        Point::new(position.x.clamp(0.0, max.x), position.y.clamp(0.0, max.y))
    }

    /// Host wheel delta to content delta: swap, factor, then per-axis mode.
    pub(crate) fn translate_wheel_delta(&self, delta: Point) -> Point {
        let delta = if self.wheel_swapped {
            Point::new(delta.y, delta.x)
        } else {
            delta
        };
        let gate = |mode: ScrollBarMode, value: f32| match mode {
            ScrollBarMode::Disabled => 0.0,
            _ => value * self.wheel_factor,
        };
        Point::new(
            gate(self.options.horizontal_mode, delta.x),
            gate(self.options.vertical_mode, delta.y),
        )
    }
}

impl ViewTree {
    pub fn create_scroll_view(&mut self, options: ScrollOptions) -> ViewId {
        let state = ScrollState::new(options, self.config.default_wheel_factor);
        self.insert_node(ViewKind::Scroll(Box::new(state)))
    }

    pub(crate) fn scroll_state(&self, view: ViewId) -> ViewResult<&ScrollState> {
        self.node(view)?
            .scroll()
            .ok_or(ViewError::NotScrollView(view))
    }

    pub(crate) fn scroll_state_mut(&mut self, view: ViewId) -> ViewResult<&mut ScrollState> {
        self.node_mut(view)?
            .scroll_mut()
            .ok_or(ViewError::NotScrollView(view))
    }

    /// Replaces the content view. The previous one is detached.
    pub fn set_content_view(&mut self, view: ViewId, content: ViewId) -> ViewResult<()> {
        let previous = self.scroll_state(view)?.content_view;
        self.node(content)?;
        if previous == Some(content) {
            return Ok(());
        }
        if self.is_ancestor_or_self(content, view) {
            tracing::warn!(?view, ?content, "rejected content view that would create a cycle");
            return Err(ViewError::Cycle {
                parent: view,
                child: content,
            });
        }
        if let Some(previous) = previous {
            self.detach_from_parent(previous);
        }
        self.attach_child(view, content, None)?;
        self.scroll_state_mut(view)?.content_view = Some(content);
        self.reclamp_scroll(view);
        self.apply_clip_height(view);
        Ok(())
    }

    pub fn get_content_view(&self, view: ViewId) -> ViewResult<Option<ViewId>> {
        Ok(self.scroll_state(view)?.content_view)
    }

    fn content_view_of(&self, view: ViewId) -> ViewResult<ViewId> {
        self.scroll_state(view)?
            .content_view
            .ok_or(ViewError::NoContentView(view))
    }

    /// Resizes the content view; the scroll position is re-clamped at once.
    pub fn set_content_size(&mut self, view: ViewId, size: Size) -> ViewResult<()> {
        if !size.is_finite() {
            return Err(ViewError::invalid_value("content size", f64::NAN));
        }
        let content = self.content_view_of(view)?;
        let bounds = self.nodes[content].bounds.with_size(size);
        self.apply_bounds(content, bounds, None, None, BoundsOrigin::Direct)?;
        self.reclamp_scroll(view);
        self.apply_clip_height(view);
        Ok(())
    }

    pub fn get_content_size(&self, view: ViewId) -> ViewResult<Size> {
        let content = self.scroll_state(view)?.content_view;
        Ok(content
            .and_then(|content| self.nodes.get(content))
            .map_or(Size::ZERO, |node| node.bounds.size()))
    }

    pub(crate) fn viewport_size(&self, view: ViewId) -> Size {
        self.nodes
            .get(view)
            .map_or(Size::ZERO, |node| node.bounds.size())
    }

    /// Last committed position. Requests still waiting for a frame are not
    /// reflected.
    pub fn get_scroll_position(&self, view: ViewId) -> ViewResult<Point> {
        Ok(self.scroll_state(view)?.scroll_position)
    }

    pub fn get_maximum_scroll_position(&self, view: ViewId) -> ViewResult<Point> {
        let content = self.get_content_size(view)?;
        Ok(ScrollState::maximum_scroll_position(
            content,
            self.viewport_size(view),
        ))
    }

    /// Visible part of the content, in content coordinates.
    pub fn get_visible_rect(&self, view: ViewId) -> ViewResult<Rect> {
        let scroll = self.scroll_state(view)?;
        let viewport = self.viewport_size(view);
        Ok(Rect::new(
            scroll.scroll_position.x,
            scroll.scroll_position.y,
            viewport.width / scroll.zoom_factor,
            viewport.height / scroll.zoom_factor,
        ))
    }

    /// Queues a scroll. The returned completion resolves on the next
    /// `advance_frame` with the clamped position actually committed.
    pub fn set_scroll_position(
        &mut self,
        view: ViewId,
        request: ScrollRequest,
    ) -> ScrollCompletion {
        let animation = match self.scroll_state(view) {
            Ok(scroll) if scroll.options.smooth_scroll => Some(self.config.scroll_animation),
            _ => None,
        };
        self.request_scroll(view, request, animation)
    }

    /// Like `set_scroll_position`, animated with `animation` when given.
    pub fn scroll_to_point(
        &mut self,
        view: ViewId,
        point: Point,
        animation: Option<Animation>,
    ) -> ScrollCompletion {
        self.request_scroll(view, ScrollRequest::to(point), animation)
    }

    /// Scrolls so that `point` (content coordinates) sits in the middle of
    /// the viewport, as far as clamping allows.
    pub fn scroll_point_to_center(
        &mut self,
        view: ViewId,
        point: Point,
        animation: Option<Animation>,
    ) -> ScrollCompletion {
        let viewport = self.viewport_size(view);
        let zoom = self.scroll_state(view).map_or(1.0, |scroll| scroll.zoom_factor);
        let target = Point::new(
            point.x - viewport.width / zoom * 0.5,
            point.y - viewport.height / zoom * 0.5,
        );
        self.request_scroll(view, ScrollRequest::to(target), animation)
    }

    /// Scrolls the least distance that brings `rect` (content coordinates)
    /// into view. A rect larger than the viewport aligns to its start edge.
    pub fn scroll_rect_to_visible(&mut self, view: ViewId, rect: Rect) -> ScrollCompletion {
        if !rect.is_finite() {
            return ScrollCompletion::ready(Err(ViewError::InvalidBounds(rect)));
        }
        let visible = match self.get_visible_rect(view) {
            Ok(visible) => visible,
            Err(err) => return ScrollCompletion::ready(Err(err)),
        };
        let base = self
            .scroll_state(view)
            .ok()
            .and_then(|scroll| scroll.pending_target)
            .unwrap_or(visible.origin());
        let axis = |start: f32, extent: f32, position: f32, viewport: f32| {
            if start < position || extent > viewport {
                start
            } else if start + extent > position + viewport {
                start + extent - viewport
            } else {
                position
            }
        };
        let target = Point::new(
            axis(rect.x, rect.width, base.x, visible.width),
            axis(rect.y, rect.height, base.y, visible.height),
        );
        self.set_scroll_position(view, ScrollRequest::to(target))
    }

    pub(crate) fn request_scroll(
        &mut self,
        view: ViewId,
        request: ScrollRequest,
        animation: Option<Animation>,
    ) -> ScrollCompletion {
        // Infinities clamp at commit like any other out-of-range target.
        if request.x.is_some_and(f32::is_nan) || request.y.is_some_and(f32::is_nan) {
            return ScrollCompletion::ready(Err(ViewError::invalid_value(
                "scroll position",
                f64::NAN,
            )));
        }
        if let Err(err) = self.content_view_of(view) {
            tracing::debug!(?view, %err, "scroll request rejected");
            return ScrollCompletion::ready(Err(err));
        }
        let Ok(scroll) = self.scroll_state_mut(view) else {
            return ScrollCompletion::ready(Err(ViewError::NotScrollView(view)));
        };
        let base = scroll.pending_target.unwrap_or(scroll.scroll_position);
        scroll.pending_target = Some(Point::new(
            request.x.unwrap_or(base.x),
            request.y.unwrap_or(base.y),
        ));
        scroll.pending_animation = animation;
        let (completion, pending) = ScrollCompletion::pending();
        scroll.pending.push(pending);
        self.compositor.request_redraw();
        completion
    }

    /// Only for views created with `ScrollOptions::scaled_content`.
    pub fn set_zoom_factor(&mut self, view: ViewId, factor: f32) -> ViewResult<()> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(ViewError::invalid_value("zoom factor", factor as f64));
        }
        let scroll = self.scroll_state_mut(view)?;
        if !scroll.options.scaled_content {
            return Err(ViewError::ZoomUnavailable(view));
        }
        scroll.zoom_factor = factor;
        self.compositor.request_redraw();
        Ok(())
    }

    pub fn get_zoom_factor(&self, view: ViewId) -> ViewResult<f32> {
        let scroll = self.scroll_state(view)?;
        if !scroll.options.scaled_content {
            return Err(ViewError::ZoomUnavailable(view));
        }
        Ok(scroll.zoom_factor)
    }

    pub fn set_horizontal_scroll_bar_mode(
        &mut self,
        view: ViewId,
        mode: ScrollBarMode,
    ) -> ViewResult<()> {
        self.scroll_state_mut(view)?.options.horizontal_mode = mode;
        Ok(())
    }

    pub fn get_horizontal_scroll_bar_mode(&self, view: ViewId) -> ViewResult<ScrollBarMode> {
        Ok(self.scroll_state(view)?.options.horizontal_mode)
    }

    pub fn set_vertical_scroll_bar_mode(
        &mut self,
        view: ViewId,
        mode: ScrollBarMode,
    ) -> ViewResult<()> {
        self.scroll_state_mut(view)?.options.vertical_mode = mode;
        Ok(())
    }

    pub fn get_vertical_scroll_bar_mode(&self, view: ViewId) -> ViewResult<ScrollBarMode> {
        Ok(self.scroll_state(view)?.options.vertical_mode)
    }

    pub fn set_horizontal_scroll_elasticity(
        &mut self,
        view: ViewId,
        elasticity: ScrollElasticity,
    ) -> ViewResult<()> {
        self.scroll_state_mut(view)?.horizontal_elasticity = elasticity;
        Ok(())
    }

    pub fn get_horizontal_scroll_elasticity(&self, view: ViewId) -> ViewResult<ScrollElasticity> {
        Ok(self.scroll_state(view)?.horizontal_elasticity)
    }

    pub fn set_vertical_scroll_elasticity(
        &mut self,
        view: ViewId,
        elasticity: ScrollElasticity,
    ) -> ViewResult<()> {
        self.scroll_state_mut(view)?.vertical_elasticity = elasticity;
        Ok(())
    }

    pub fn get_vertical_scroll_elasticity(&self, view: ViewId) -> ViewResult<ScrollElasticity> {
        Ok(self.scroll_state(view)?.vertical_elasticity)
    }

    pub fn set_overlay_scrollbar(&mut self, view: ViewId, overlay: bool) -> ViewResult<()> {
        self.scroll_state_mut(view)?.overlay_scrollbar = overlay;
        self.compositor.request_redraw();
        Ok(())
    }

    pub fn is_overlay_scrollbar(&self, view: ViewId) -> ViewResult<bool> {
        Ok(self.scroll_state(view)?.overlay_scrollbar)
    }

    pub fn set_smooth_scroll(&mut self, view: ViewId, smooth: bool) -> ViewResult<()> {
        self.scroll_state_mut(view)?.options.smooth_scroll = smooth;
        Ok(())
    }

    pub fn set_block_scroll_view_when_focus(
        &mut self,
        view: ViewId,
        block: bool,
    ) -> ViewResult<()> {
        self.scroll_state_mut(view)?.options.block_scroll_view_when_focus = block;
        Ok(())
    }

    pub fn set_scroll_events_enabled(&mut self, view: ViewId, enabled: bool) -> ViewResult<()> {
        self.scroll_state_mut(view)?.scroll_events_enabled = enabled;
        Ok(())
    }

    pub fn is_scroll_events_enabled(&self, view: ViewId) -> ViewResult<bool> {
        Ok(self.scroll_state(view)?.scroll_events_enabled)
    }

    /// Vertical wheel input scrolls horizontally and vice versa.
    pub fn set_scroll_wheel_swapped(&mut self, view: ViewId, swapped: bool) -> ViewResult<()> {
        self.scroll_state_mut(view)?.wheel_swapped = swapped;
        Ok(())
    }

    pub fn is_scroll_wheel_swapped(&self, view: ViewId) -> ViewResult<bool> {
        Ok(self.scroll_state(view)?.wheel_swapped)
    }

    pub fn set_scroll_wheel_factor(&mut self, view: ViewId, factor: f32) -> ViewResult<()> {
        if !factor.is_finite() {
            return Err(ViewError::invalid_value("wheel factor", factor as f64));
        }
        self.scroll_state_mut(view)?.wheel_factor = factor;
        Ok(())
    }

    pub fn get_scroll_wheel_factor(&self, view: ViewId) -> ViewResult<f32> {
        Ok(self.scroll_state(view)?.wheel_factor)
    }

    /// The scroll view's height follows the content height within
    /// `[min_height, max_height]`.
    pub fn clip_height_to(
        &mut self,
        view: ViewId,
        min_height: f32,
        max_height: f32,
    ) -> ViewResult<()> {
        if !min_height.is_finite() || min_height < 0.0 {
            return Err(ViewError::invalid_value("min height", min_height as f64));
        }
        if !max_height.is_finite() || max_height < min_height {
            return Err(ViewError::invalid_value("max height", max_height as f64));
        }
        self.scroll_state_mut(view)?.clip_height = Some((min_height, max_height));
        self.apply_clip_height(view);
        Ok(())
    }

    pub fn get_clip_height(&self, view: ViewId) -> ViewResult<Option<(f32, f32)>> {
        Ok(self.scroll_state(view)?.clip_height)
    }

    fn apply_clip_height(&mut self, view: ViewId) {
        let Ok(Some((min, max))) = self.get_clip_height(view) else {
            return;
        };
        let Ok(content) = self.get_content_size(view) else {
            return;
        };
        let bounds = self.nodes[view].bounds;
        let height = content.height.clamp(min, max);
        if bounds.height != height {
            let next = Rect::new(bounds.x, bounds.y, bounds.width, height);
            if let Err(err) = self.apply_bounds(view, next, None, None, BoundsOrigin::Direct) {
                tracing::warn!(?view, %err, "clip height not applied");
            }
        }
    }

    /// Re-clamps `view` when it is a scroll view, or its scroll parent when
    /// it is a content view.
    pub(crate) fn reclamp_scroll(&mut self, view: ViewId) {
        let scroll_view = match self.nodes.get(view) {
            Some(node) if node.is_scroll_view() => view,
            Some(node) => match node.parent {
                Some(parent)
                    if self
                        .nodes
                        .get(parent)
                        .and_then(|parent| parent.scroll())
                        .is_some_and(|scroll| scroll.content_view == Some(view)) =>
                {
                    parent
                }
                _ => return,
            },
            None => return,
        };
        let content = self.get_content_size(scroll_view).unwrap_or(Size::ZERO);
        let viewport = self.viewport_size(scroll_view);
        let Some(scroll) = self.nodes[scroll_view].scroll_mut() else {
            return;
        };
        let clamped = ScrollState::clamp(scroll.scroll_position, content, viewport);
        if clamped == scroll.scroll_position {
            return;
        }
        scroll.scroll_position = clamped;
        scroll.did_scroll_pending = true;
        self.compositor.queue(LayerCommand::Scroll {
            view: scroll_view,
            to: clamped,
            animation: None,
        });
        tracing::debug!(view = ?scroll_view, ?clamped, "scroll position re-clamped");
    }

    /// Brings a newly focused view into sight of its nearest scroll ancestor.
    pub(crate) fn reveal_focused(&mut self, view: ViewId) {
        let mut current = self.nodes.get(view).and_then(|node| node.parent);
        while let Some(parent) = current {
            let Some(node) = self.nodes.get(parent) else {
                return;
            };
            if let Some(scroll) = node.scroll() {
                if scroll.options.block_scroll_view_when_focus
                    || scroll.content_view == Some(view)
                {
                    return;
                }
                let rect = self.rect_in_child_space(view, parent);
                drop(self.scroll_rect_to_visible(parent, rect));
                return;
            }
            current = node.parent;
        }
    }

    /// `view`'s local bounds mapped into `ancestor`'s child space.
    fn rect_in_child_space(&self, view: ViewId, ancestor: ViewId) -> Rect {
        let size = self.nodes[view].bounds.size();
        let to_window = self.local_to_window(view, GeometrySource::Model);
        let from_window = self
            .local_to_window(ancestor, GeometrySource::Model)
            .invert();
        let extent = Rect::from_origin_size(Point::ZERO, size);
        let local = from_window.map_rect(&to_window.map_rect(&extent));
        let node = &self.nodes[ancestor];
        let min = node.local_to_child_space(Vec2::new(local.x, local.y));
        let max = node.local_to_child_space(Vec2::new(local.right(), local.bottom()));
        Rect::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    /// Commits every pending request against current sizes and resolves its
    /// completions.
    pub(crate) fn commit_pending_scrolls(&mut self) {
        let views: Vec<ViewId> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.scroll().is_some_and(|scroll| !scroll.pending.is_empty()))
            .map(|(view, _)| view)
            .collect();
        for view in views {
            let content = self.get_content_size(view).unwrap_or(Size::ZERO);
            let has_content = self.content_view_of(view).is_ok();
            let viewport = self.viewport_size(view);
            let Some(scroll) = self.nodes[view].scroll_mut() else {
                continue;
            };
            let pending = std::mem::take(&mut scroll.pending);
            let target = scroll.pending_target.take();
            let animation = scroll.pending_animation.take();
            if !has_content {
                for request in pending {
                    request.resolve(Err(ViewError::NoContentView(view)));
                }
                continue;
            }
            let committed = match target {
                Some(target) => ScrollState::clamp(target, content, viewport),
                None => scroll.scroll_position,
            };
            if committed != scroll.scroll_position {
                scroll.scroll_position = committed;
                scroll.did_scroll_pending = true;
                self.compositor.queue(LayerCommand::Scroll {
                    view,
                    to: committed,
                    animation,
                });
                tracing::debug!(?view, ?committed, "scroll position committed");
            }
            for request in pending {
                request.resolve(Ok(committed));
            }
        }
    }

    /// One `DidScroll` per scroll view whose position changed this frame.
    pub(crate) fn flush_scroll_events(&mut self) {
        for (view, node) in self.nodes.iter_mut() {
            let Some(scroll) = node.scroll_mut() else {
                continue;
            };
            if std::mem::take(&mut scroll.did_scroll_pending) && scroll.scroll_events_enabled {
                self.events.push(ViewEvent::DidScroll { view });
            }
        }
    }
}
