use image::RgbaImage;

use super::node::ViewKind;
use super::tree::BoundsOrigin;
use super::{ViewId, ViewTree};
use crate::error::{ViewError, ViewResult};
use crate::geometry::Rect;
use crate::style::Color;
use crate::ui::{SurfaceEvent, ViewEvent};

/// An externally rendered surface (a web page, a video layer) embedded as a
/// leaf node.
///
/// The tree forwards geometry and visibility; the surface reports its own
/// events back through `take_events`, which is drained once per frame.
pub trait HostedSurface {
    fn bounds(&self) -> Rect;

    fn set_bounds(&mut self, bounds: Rect);

    fn set_visible(&mut self, visible: bool);

    /// Suspends rendering and script work while hidden.
    fn set_frozen(&mut self, _frozen: bool) {}

    /// False until the surface has produced its first frame.
    fn is_frame_ready(&self) -> bool {
        true
    }

    fn take_events(&mut self) -> Vec<SurfaceEvent>;

    fn set_background_color(&mut self, _color: Color) {}

    fn set_click_through(&mut self, _click_through: bool) {}
}

/// Grabs the last presented frame of a surface as encoded image bytes.
pub trait FrameCapturer {
    fn capture(&mut self, surface: &dyn HostedSurface) -> ViewResult<Vec<u8>>;
}

#[derive(Clone, Debug, Default)]
pub struct HideOptions {
    pub freeze: bool,
    /// Capture the current frame through the installed `FrameCapturer` and
    /// show it while hidden. Takes precedence over `placeholder`.
    pub capture_last_frame: bool,
    pub placeholder: Option<RgbaImage>,
}

/// What the compositor paints for a hosted surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfacePaint {
    Live,
    Placeholder,
    /// Shown but no frame produced yet.
    Pending,
    /// Hidden without a placeholder; only the node's background paints.
    Hidden,
}

pub(crate) struct SurfaceState {
    pub(crate) surface: Box<dyn HostedSurface>,
    pub(crate) placeholder: Option<RgbaImage>,
    pub(crate) hidden: bool,
    pub(crate) frozen: bool,
    pub(crate) block_resizing: bool,
    /// Last visibility forwarded to the surface.
    pub(crate) shown: bool,
}

impl SurfaceState {
    pub(crate) fn paint_source(&self) -> SurfacePaint {
        match (self.hidden, &self.placeholder) {
            (true, Some(_)) => SurfacePaint::Placeholder,
            (true, None) => SurfacePaint::Hidden,
            (false, _) if self.surface.is_frame_ready() => SurfacePaint::Live,
            (false, _) => SurfacePaint::Pending,
        }
    }
}

impl ViewTree {
    /// Wraps `surface` in a new detached leaf. The node adopts the surface's
    /// current bounds when they are finite.
    pub fn create_hosted_surface_view(&mut self, mut surface: Box<dyn HostedSurface>) -> ViewId {
        let initial = surface.bounds();
        surface.set_visible(false);
        let view = self.insert_node(ViewKind::Surface(Box::new(SurfaceState {
            surface,
            placeholder: None,
            hidden: false,
            frozen: false,
            block_resizing: false,
            shown: false,
        })));
        if initial.is_finite()
            && let Err(err) = self.apply_bounds(view, initial, None, None, BoundsOrigin::Direct)
        {
            tracing::warn!(?view, %err, "surface bounds not adopted");
        }
        view
    }

    fn surface_state(&self, view: ViewId) -> ViewResult<&SurfaceState> {
        self.node(view)?
            .surface()
            .ok_or(ViewError::NotHostedSurface(view))
    }

    fn surface_state_mut(&mut self, view: ViewId) -> ViewResult<&mut SurfaceState> {
        self.node_mut(view)?
            .surface_mut()
            .ok_or(ViewError::NotHostedSurface(view))
    }

    /// Hides the live surface behind a placeholder.
    ///
    /// Capturing needs a realized node and an installed capturer. On error
    /// the surface stays as it was.
    pub fn hide_surface(&mut self, view: ViewId, options: HideOptions) -> ViewResult<()> {
        self.surface_state(view)?;
        let placeholder = if options.capture_last_frame {
            self.require_realized(view)?;
            let Some(capturer) = self.capturer.as_mut() else {
                return Err(ViewError::capture("no frame capturer installed"));
            };
            let Some(state) = self.nodes[view].surface() else {
                return Err(ViewError::NotHostedSurface(view));
            };
            let bytes = capturer.capture(state.surface.as_ref())?;
            let image = image::load_from_memory(&bytes)?.to_rgba8();
            tracing::debug!(
                ?view,
                width = image.width(),
                height = image.height(),
                "surface frame captured"
            );
            Some(image)
        } else {
            options.placeholder
        };

        let state = self.surface_state_mut(view)?;
        state.placeholder = placeholder;
        state.hidden = true;
        if options.freeze && !state.frozen {
            state.frozen = true;
            state.surface.set_frozen(true);
        }
        self.sync_surface_visibility(view);
        self.compositor.request_redraw();
        Ok(())
    }

    /// Drops the placeholder, unfreezes and shows the live surface again.
    pub fn show_surface(&mut self, view: ViewId) -> ViewResult<()> {
        let state = self.surface_state_mut(view)?;
        state.placeholder = None;
        state.hidden = false;
        if state.frozen {
            state.frozen = false;
            state.surface.set_frozen(false);
        }
        self.sync_surface_visibility(view);
        self.compositor.request_redraw();
        Ok(())
    }

    pub fn is_surface_hidden(&self, view: ViewId) -> ViewResult<bool> {
        Ok(self.surface_state(view)?.hidden)
    }

    /// While set, the parent's layout pass leaves this node's bounds alone.
    pub fn set_block_resizing(&mut self, view: ViewId, block: bool) -> ViewResult<()> {
        self.surface_state_mut(view)?.block_resizing = block;
        Ok(())
    }

    pub fn is_resizing_blocked(&self, view: ViewId) -> ViewResult<bool> {
        Ok(self.surface_state(view)?.block_resizing)
    }

    pub fn surface_placeholder(&self, view: ViewId) -> ViewResult<Option<&RgbaImage>> {
        Ok(self.surface_state(view)?.placeholder.as_ref())
    }

    pub fn surface_paint_source(&self, view: ViewId) -> ViewResult<SurfacePaint> {
        Ok(self.surface_state(view)?.paint_source())
    }

    /// Forwards effective visibility to every surface under `view`.
    pub(crate) fn sync_surface_visibility(&mut self, view: ViewId) {
        for id in self.subtree(view) {
            if !self.nodes[id].is_hosted_surface() {
                continue;
            }
            let visible = self.root.shown && self.is_realized(id) && self.is_tree_visible(id);
            let Some(state) = self.nodes[id].surface_mut() else {
                continue;
            };
            let visible = visible && !state.hidden;
            if state.shown != visible {
                state.shown = visible;
                state.surface.set_visible(visible);
                tracing::trace!(view = ?id, visible, "surface visibility forwarded");
            }
        }
    }

    /// Queues everything the surfaces reported since the last frame.
    pub(crate) fn drain_surface_events(&mut self) {
        for (view, node) in self.nodes.iter_mut() {
            let Some(state) = node.surface_mut() else {
                continue;
            };
            for event in state.surface.take_events() {
                self.events.push(ViewEvent::Surface { view, event });
            }
        }
    }
}
