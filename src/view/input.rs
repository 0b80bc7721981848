use glam::Vec2;

use super::scroll::ScrollRequest;
use super::transform::GeometrySource;
use super::{ViewId, ViewTree};
use crate::geometry::Point;
use crate::ui::{MouseEvent, MouseEventKind, MouseInput, ViewEvent, WheelInput, WheelPhase};

/// Pointer state carried between inputs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct InputState {
    /// Receives moves and the release while a button is held.
    pub(crate) pressed: Option<ViewId>,
    pub(crate) hovered: Option<ViewId>,
}

impl ViewTree {
    /// Topmost view under `point` (window coordinates) in committed stacking
    /// order. Click-through views let the hit fall to whatever is below.
    pub fn hit_test(&self, point: Point) -> Option<ViewId> {
        if !self.root.shown {
            return None;
        }
        let root = self.root.content_view?;
        self.hit_test_node(root, point.to_vec2())
    }

    fn hit_test_node(&self, view: ViewId, parent_point: Vec2) -> Option<ViewId> {
        let node = self.nodes.get(view)?;
        if !node.is_visible() || !node.view_bounds().contains(Point::from_vec2(parent_point)) {
            return None;
        }
        let local = self
            .local_to_parent(view, GeometrySource::Model)
            .invert()
            .apply(parent_point);
        if node.child_clip_rect().contains(Point::from_vec2(local)) {
            let child_point = node.local_to_child_space(local);
            for child in node.native_order.iter().rev() {
                if let Some(hit) = self.hit_test_node(*child, child_point) {
                    return Some(hit);
                }
            }
        }
        if node.is_click_through() {
            None
        } else {
            Some(view)
        }
    }

    fn mouse_event(&self, view: ViewId, kind: MouseEventKind, input: &MouseInput) -> ViewEvent {
        let position_in_view = self
            .local_to_window(view, GeometrySource::Model)
            .invert()
            .map_point(input.position);
        ViewEvent::Mouse {
            view,
            event: MouseEvent {
                kind,
                timestamp_ms: input.timestamp_ms,
                button: input.button,
                position_in_view,
                position_in_window: input.position,
            },
        }
    }

    /// Routes one pointer input. Returns the view the input was aimed at,
    /// whether or not it had mouse events enabled.
    ///
    /// An explicit capture wins, then the view holding the pressed button,
    /// then the hit-test result. Enter, leave and move need tracking; down and
    /// up need mouse events. Both flags are inherited from ancestors.
    pub fn dispatch_mouse(&mut self, input: MouseInput) -> Option<ViewId> {
        if input.kind == MouseEventKind::Leave {
            self.update_hover(None, &input);
            return None;
        }
        let hit = self.hit_test(input.position);
        self.update_hover(hit, &input);

        let target = self
            .capture
            .filter(|view| self.nodes.contains_key(*view))
            .or(match input.kind {
                MouseEventKind::Move | MouseEventKind::Up => self.input.pressed,
                _ => None,
            })
            .or(hit)?;

        match input.kind {
            MouseEventKind::Down => {
                self.input.pressed = Some(target);
                if self.are_mouse_events_enabled(target) {
                    let event = self.mouse_event(target, MouseEventKind::Down, &input);
                    self.events.push(event);
                }
            }
            MouseEventKind::Up => {
                self.input.pressed = None;
                if self.are_mouse_events_enabled(target) {
                    let event = self.mouse_event(target, MouseEventKind::Up, &input);
                    self.events.push(event);
                }
            }
            MouseEventKind::Move | MouseEventKind::Enter => {
                if self.is_mouse_tracking_enabled(target) {
                    let event = self.mouse_event(target, MouseEventKind::Move, &input);
                    self.events.push(event);
                }
            }
            MouseEventKind::Leave => {}
        }
        Some(target)
    }

    fn update_hover(&mut self, hovered: Option<ViewId>, input: &MouseInput) {
        let previous = self.input.hovered;
        if previous == hovered {
            return;
        }
        self.input.hovered = hovered;
        if let Some(previous) = previous.filter(|view| self.nodes.contains_key(*view))
            && self.is_mouse_tracking_enabled(previous)
        {
            let event = self.mouse_event(previous, MouseEventKind::Leave, input);
            self.events.push(event);
        }
        if let Some(hovered) = hovered
            && self.is_mouse_tracking_enabled(hovered)
        {
            let event = self.mouse_event(hovered, MouseEventKind::Enter, input);
            self.events.push(event);
        }
    }

    /// Scrolls the nearest scroll view under the pointer. `delta` is in
    /// content units, positive towards the end of the content. Returns the
    /// scroll view that took the input.
    pub fn dispatch_wheel(&mut self, input: WheelInput) -> Option<ViewId> {
        if !input.delta.is_finite() {
            tracing::warn!(delta = ?input.delta, "dropped non-finite wheel delta");
            return None;
        }
        let mut current = self.hit_test(input.position);
        let view = loop {
            let id = current?;
            let node = self.nodes.get(id)?;
            if node
                .scroll()
                .is_some_and(|scroll| scroll.content_view.is_some())
            {
                break id;
            }
            current = node.parent;
        };

        let scroll = self.scroll_state_mut(view).ok()?;
        let delta = scroll.translate_wheel_delta(input.delta);
        let base = scroll.pending_target.unwrap_or(scroll.scroll_position);
        let events_enabled = scroll.scroll_events_enabled;
        let live_event = match input.phase {
            WheelPhase::Began if !scroll.live_scrolling => {
                scroll.live_scrolling = true;
                Some(ViewEvent::WillStartLiveScroll { view })
            }
            WheelPhase::Began | WheelPhase::Changed if scroll.live_scrolling => {
                Some(ViewEvent::DidLiveScroll { view })
            }
            WheelPhase::Ended if scroll.live_scrolling => {
                scroll.live_scrolling = false;
                Some(ViewEvent::DidEndLiveScroll { view })
            }
            _ => None,
        };
        if let Some(event) = live_event.filter(|_| events_enabled) {
            self.events.push(event);
        }

        if delta != Point::ZERO {
            let target = Point::new(base.x + delta.x, base.y + delta.y);
            drop(self.request_scroll(view, ScrollRequest::to(target), None));
        }
        Some(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Insets, Rect, Size};
    use crate::ui::MouseButton;
    use crate::view::{ScrollOptions, TreeConfig};

    fn window() -> (ViewTree, ViewId) {
        let mut tree = ViewTree::with_config(TreeConfig::new());
        let root = tree.create_view();
        tree.resize_root(Size::new(400.0, 400.0));
        tree.set_root_content_view(root).unwrap();
        tree.show_root();
        (tree, root)
    }

    fn child(tree: &mut ViewTree, parent: ViewId, bounds: Rect) -> ViewId {
        let view = tree.create_view();
        tree.set_bounds(view, bounds).unwrap();
        tree.add_child_view(parent, view, None).unwrap();
        view
    }

    fn mouse_kinds(events: &[ViewEvent]) -> Vec<(ViewId, MouseEventKind)> {
        events
            .iter()
            .filter_map(|event| match event {
                ViewEvent::Mouse { view, event } => Some((*view, event.kind)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn hit_test_follows_committed_order() {
        let (mut tree, root) = window();
        let low = child(&mut tree, root, Rect::new(0.0, 0.0, 100.0, 100.0));
        let high = child(&mut tree, root, Rect::new(50.0, 50.0, 100.0, 100.0));
        tree.set_z_index(low, 5).unwrap();

        let overlap = Point::new(75.0, 75.0);
        assert_eq!(tree.hit_test(overlap), Some(high));
        tree.rearrange_child_views(root).unwrap();
        assert_eq!(tree.hit_test(overlap), Some(low));
        assert_eq!(tree.hit_test(Point::new(300.0, 300.0)), Some(root));
    }

    #[test]
    fn click_through_and_clip_insets() {
        let (mut tree, root) = window();
        let below = child(&mut tree, root, Rect::new(0.0, 0.0, 200.0, 200.0));
        let overlay = child(&mut tree, root, Rect::new(0.0, 0.0, 200.0, 200.0));
        let button = child(&mut tree, overlay, Rect::new(10.0, 10.0, 20.0, 20.0));
        tree.set_click_through(overlay, true).unwrap();

        assert_eq!(tree.hit_test(Point::new(100.0, 100.0)), Some(below));
        assert_eq!(tree.hit_test(Point::new(15.0, 15.0)), Some(button));

        tree.set_clipping_insets(overlay, Insets::uniform(12.0)).unwrap();
        assert_eq!(tree.hit_test(Point::new(11.0, 11.0)), Some(below));
        assert_eq!(tree.hit_test(Point::new(20.0, 20.0)), Some(button));
    }

    #[test]
    fn hit_test_maps_through_scroll_offset() {
        let (mut tree, root) = window();
        let scroll = tree.create_scroll_view(ScrollOptions::default());
        tree.set_bounds(scroll, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        tree.add_child_view(root, scroll, None).unwrap();
        let content = tree.create_view();
        tree.set_content_view(scroll, content).unwrap();
        tree.set_content_size(scroll, Size::new(100.0, 1000.0)).unwrap();
        let item = child(&mut tree, content, Rect::new(0.0, 500.0, 100.0, 50.0));

        assert_eq!(tree.hit_test(Point::new(10.0, 10.0)), Some(content));
        let _ = tree.set_scroll_position(scroll, ScrollRequest::y(490.0));
        tree.advance_frame(0.0);
        assert_eq!(tree.hit_test(Point::new(10.0, 20.0)), Some(item));
    }

    #[test]
    fn hover_and_clicks_respect_inherited_flags() {
        let (mut tree, root) = window();
        let a = child(&mut tree, root, Rect::new(0.0, 0.0, 100.0, 100.0));
        let b = child(&mut tree, root, Rect::new(200.0, 0.0, 100.0, 100.0));
        tree.set_mouse_tracking_enabled(a, true).unwrap();
        tree.take_events();

        tree.dispatch_mouse(MouseInput::moved(Point::new(10.0, 10.0), 1.0));
        tree.dispatch_mouse(MouseInput::moved(Point::new(210.0, 10.0), 2.0));
        assert_eq!(
            mouse_kinds(&tree.take_events()),
            vec![
                (a, MouseEventKind::Enter),
                (a, MouseEventKind::Move),
                (a, MouseEventKind::Leave),
            ]
        );

        assert_eq!(
            tree.dispatch_mouse(MouseInput::down(MouseButton::Left, Point::new(210.0, 10.0), 3.0)),
            Some(b)
        );
        assert!(tree.take_events().is_empty());

        tree.enable_mouse_events(root).unwrap();
        tree.dispatch_mouse(MouseInput::down(MouseButton::Left, Point::new(210.0, 10.0), 4.0));
        let events = tree.take_events();
        let ViewEvent::Mouse { view, event } = &events[0] else {
            panic!("expected a mouse event, got {events:?}");
        };
        assert_eq!(*view, b);
        assert_eq!(event.position_in_view, Point::new(10.0, 10.0));
        assert_eq!(event.button.map(MouseButton::code), Some(1));
    }

    #[test]
    fn drag_and_capture_route_to_owner() {
        let (mut tree, root) = window();
        let a = child(&mut tree, root, Rect::new(0.0, 0.0, 100.0, 100.0));
        let b = child(&mut tree, root, Rect::new(200.0, 0.0, 100.0, 100.0));
        tree.enable_mouse_events(root).unwrap();

        tree.dispatch_mouse(MouseInput::down(MouseButton::Left, Point::new(10.0, 10.0), 1.0));
        assert_eq!(tree.dispatch_mouse(MouseInput::moved(Point::new(250.0, 10.0), 2.0)), Some(a));
        assert_eq!(
            tree.dispatch_mouse(MouseInput::up(MouseButton::Left, Point::new(250.0, 10.0), 3.0)),
            Some(a)
        );
        assert_eq!(
            tree.dispatch_mouse(MouseInput::down(MouseButton::Left, Point::new(250.0, 10.0), 4.0)),
            Some(b)
        );
        tree.dispatch_mouse(MouseInput::up(MouseButton::Left, Point::new(250.0, 10.0), 5.0));

        tree.set_capture(a).unwrap();
        assert_eq!(
            tree.dispatch_mouse(MouseInput::down(MouseButton::Left, Point::new(250.0, 10.0), 6.0)),
            Some(a)
        );
    }

    #[test]
    fn wheel_scrolls_nearest_scroll_view_with_live_events() {
        let (mut tree, root) = window();
        let scroll = tree.create_scroll_view(ScrollOptions::default());
        tree.set_bounds(scroll, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        tree.add_child_view(root, scroll, None).unwrap();
        let content = tree.create_view();
        tree.set_content_view(scroll, content).unwrap();
        tree.set_content_size(scroll, Size::new(100.0, 1000.0)).unwrap();
        tree.set_scroll_events_enabled(scroll, true).unwrap();
        tree.set_scroll_wheel_factor(scroll, 2.0).unwrap();
        tree.take_events();

        let at = Point::new(50.0, 50.0);
        for (delta, phase) in [
            (0.0, WheelPhase::Began),
            (10.0, WheelPhase::Changed),
            (15.0, WheelPhase::Changed),
            (0.0, WheelPhase::Ended),
        ] {
            let input = WheelInput {
                position: at,
                delta: Point::new(0.0, delta),
                phase,
            };
            assert_eq!(tree.dispatch_wheel(input), Some(scroll));
        }
        tree.advance_frame(0.0);

        assert_eq!(tree.get_scroll_position(scroll).unwrap(), Point::new(0.0, 50.0));
        assert_eq!(
            tree.take_events(),
            vec![
                ViewEvent::WillStartLiveScroll { view: scroll },
                ViewEvent::DidLiveScroll { view: scroll },
                ViewEvent::DidLiveScroll { view: scroll },
                ViewEvent::DidEndLiveScroll { view: scroll },
                ViewEvent::DidScroll { view: scroll },
            ]
        );

        let outside = WheelInput {
            position: Point::new(300.0, 300.0),
            delta: Point::new(0.0, 10.0),
            phase: WheelPhase::None,
        };
        assert_eq!(tree.dispatch_wheel(outside), None);
    }
}
