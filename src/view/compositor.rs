#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

use rustc_hash::{FxHashMap, FxHashSet};

use super::node::ViewNode;
use super::surface::SurfacePaint;
use super::transform::GeometrySource;
use super::{NativeId, TreeConfig, ViewId, ViewTree};
use crate::geometry::{Point, Rect, Scale};
use crate::style::{Color, RoundedCorners};
use crate::transition::{
    Animation, ChannelId, LayoutField, LayoutTransitionPlugin, RunResult, ScrollAxis,
    ScrollTransitionPlugin, StartTrackError, TrackField, TrackKey, TrackPlugin, TrackTarget,
    Transition, TransitionFrame, TransitionHost, TransitionPluginId, VisualField,
    VisualTransitionPlugin,
};

/// Presented state of one node, as currently on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Layer {
    pub bounds: Rect,
    /// Paint-time scale on top of `bounds`.
    pub scale: Scale,
    pub opacity: f32,
    pub scroll_offset: Point,
}

impl Layer {
    pub(crate) fn from_node(node: &ViewNode) -> Self {
        Self {
            bounds: node.bounds,
            scale: node.transform.visual_scale(),
            opacity: node.opacity,
            scroll_offset: node
                .scroll()
                .map_or(Point::ZERO, |scroll| scroll.scroll_position),
        }
    }
}

/// Tree mutation waiting for the next frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum LayerCommand {
    Bounds {
        view: ViewId,
        from: Option<Rect>,
        to: Rect,
        animation: Option<Animation>,
    },
    Scale {
        view: ViewId,
        to: Scale,
        animation: Option<Animation>,
    },
    Opacity {
        view: ViewId,
        to: f32,
        animation: Option<Animation>,
    },
    Scroll {
        view: ViewId,
        to: Point,
        animation: Option<Animation>,
    },
}

/// Hands out backing handles, reusing released ones first.
#[derive(Debug, Default)]
pub(crate) struct NativeIdAllocator {
    next: u32,
    free: Vec<NativeId>,
}

impl NativeIdAllocator {
    pub(crate) fn allocate(&mut self) -> NativeId {
        if let Some(id) = self.free.pop() {
            return id;
        }
        self.next += 1;
        NativeId(self.next)
    }

    pub(crate) fn release(&mut self, id: NativeId) {
        debug_assert!(!self.free.contains(&id), "native id released twice");
        self.free.push(id);
    }
}

struct TransitionHostAdapter<'a> {
    registered_channels: &'a FxHashSet<ChannelId>,
    claims: &'a mut FxHashMap<TrackKey<TrackTarget>, TransitionPluginId>,
}

impl TransitionHost<TrackTarget> for TransitionHostAdapter<'_> {
    fn is_channel_registered(&self, channel: ChannelId) -> bool {
        self.registered_channels.contains(&channel)
    }

    fn claim_track(&mut self, plugin_id: TransitionPluginId, key: TrackKey<TrackTarget>) {
        self.claims.insert(key, plugin_id);
    }

    fn release_track_claim(&mut self, plugin_id: TransitionPluginId, key: TrackKey<TrackTarget>) {
        if self.claims.get(&key).copied() == Some(plugin_id) {
            self.claims.remove(&key);
        }
    }

    fn release_all_claims(&mut self, plugin_id: TransitionPluginId) {
        self.claims.retain(|_, owner| *owner != plugin_id);
    }
}

/// Backing store: presented layers plus the animation tracks driving them.
pub(crate) struct Compositor {
    layers: FxHashMap<ViewId, Layer>,
    commands: Vec<LayerCommand>,
    transition_channels: FxHashSet<ChannelId>,
    transition_claims: FxHashMap<TrackKey<TrackTarget>, TransitionPluginId>,
    layout_transition_plugin: LayoutTransitionPlugin,
    visual_transition_plugin: VisualTransitionPlugin,
    scroll_transition_plugin: ScrollTransitionPlugin,
    pub(crate) native_ids: NativeIdAllocator,
    frame_stats: FrameStats,
    redraw_requested: bool,
}

impl Compositor {
    pub(crate) fn new(config: &TreeConfig) -> Self {
        let transition_channels = LayoutField::CHANNELS
            .iter()
            .chain(VisualField::CHANNELS)
            .chain(ScrollAxis::CHANNELS)
            .copied()
            .collect();
        Self {
            layers: FxHashMap::default(),
            commands: Vec::new(),
            transition_channels,
            transition_claims: FxHashMap::default(),
            layout_transition_plugin: LayoutTransitionPlugin::new(),
            visual_transition_plugin: VisualTransitionPlugin::new(),
            scroll_transition_plugin: ScrollTransitionPlugin::new(),
            native_ids: NativeIdAllocator::default(),
            frame_stats: FrameStats::new(config.trace_frames),
            redraw_requested: false,
        }
    }

    pub(crate) fn insert_layer(&mut self, view: ViewId, layer: Layer) {
        self.layers.insert(view, layer);
    }

    pub(crate) fn remove_layer(&mut self, view: ViewId) {
        self.layers.remove(&view);
        self.commands.retain(|command| command_target(command) != view);
        let mut host = TransitionHostAdapter {
            registered_channels: &self.transition_channels,
            claims: &mut self.transition_claims,
        };
        self.layout_transition_plugin.cancel_target(view, &mut host);
        self.visual_transition_plugin.cancel_target(view, &mut host);
        self.scroll_transition_plugin.cancel_target(view, &mut host);
    }

    pub(crate) fn layer(&self, view: ViewId) -> Option<&Layer> {
        self.layers.get(&view)
    }

    pub(crate) fn queue(&mut self, command: LayerCommand) {
        self.commands.push(command);
        self.request_redraw();
    }

    pub(crate) fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }

    pub(crate) fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    pub(crate) fn is_animating(&self) -> bool {
        self.layout_transition_plugin.has_tracks()
            || self.visual_transition_plugin.has_tracks()
            || self.scroll_transition_plugin.has_tracks()
    }

    /// Applies queued commands in order; later commands win.
    pub(crate) fn apply_commands(&mut self) {
        let commands = std::mem::take(&mut self.commands);
        for command in commands {
            let view = command_target(&command);
            let Some(layer) = self.layers.get_mut(&view) else {
                continue;
            };
            let mut host = TransitionHostAdapter {
                registered_channels: &self.transition_channels,
                claims: &mut self.transition_claims,
            };
            match command {
                LayerCommand::Bounds {
                    from,
                    to,
                    animation,
                    ..
                } => {
                    if let Some(from) = from {
                        self.layout_transition_plugin.cancel_target(view, &mut host);
                        layer.bounds = from;
                    }
                    let current = layer.bounds;
                    let fields = [
                        (LayoutField::X, current.x, to.x),
                        (LayoutField::Y, current.y, to.y),
                        (LayoutField::Width, current.width, to.width),
                        (LayoutField::Height, current.height, to.height),
                    ];
                    let snapped = drive_tracks(
                        &mut self.layout_transition_plugin,
                        &mut host,
                        view,
                        &fields,
                        animation,
                    );
                    for field in snapped {
                        set_layout_field(&mut layer.bounds, field, &to);
                    }
                }
                LayerCommand::Scale { to, animation, .. } => {
                    let fields = [
                        (VisualField::ScaleX, layer.scale.x, to.x),
                        (VisualField::ScaleY, layer.scale.y, to.y),
                    ];
                    for field in drive_tracks(
                        &mut self.visual_transition_plugin,
                        &mut host,
                        view,
                        &fields,
                        animation,
                    ) {
                        match field {
                            VisualField::ScaleX => layer.scale.x = to.x,
                            VisualField::ScaleY => layer.scale.y = to.y,
                            VisualField::Opacity => {}
                        }
                    }
                }
                LayerCommand::Opacity { to, animation, .. } => {
                    let fields = [(VisualField::Opacity, layer.opacity, to)];
                    if !drive_tracks(
                        &mut self.visual_transition_plugin,
                        &mut host,
                        view,
                        &fields,
                        animation,
                    )
                    .is_empty()
                    {
                        layer.opacity = to;
                    }
                }
                LayerCommand::Scroll { to, animation, .. } => {
                    let fields = [
                        (ScrollAxis::X, layer.scroll_offset.x, to.x),
                        (ScrollAxis::Y, layer.scroll_offset.y, to.y),
                    ];
                    for axis in drive_tracks(
                        &mut self.scroll_transition_plugin,
                        &mut host,
                        view,
                        &fields,
                        animation,
                    ) {
                        match axis {
                            ScrollAxis::X => layer.scroll_offset.x = to.x,
                            ScrollAxis::Y => layer.scroll_offset.y = to.y,
                        }
                    }
                }
            }
        }
    }

    pub(crate) fn run_transitions(&mut self, dt_seconds: f32) -> RunResult {
        let frame = TransitionFrame { dt_seconds };
        let mut host = TransitionHostAdapter {
            registered_channels: &self.transition_channels,
            claims: &mut self.transition_claims,
        };
        let result = self
            .layout_transition_plugin
            .run_tracks(frame, &mut host)
            .merge(self.visual_transition_plugin.run_tracks(frame, &mut host))
            .merge(self.scroll_transition_plugin.run_tracks(frame, &mut host));

        for sample in self.layout_transition_plugin.take_samples() {
            if let Some(layer) = self.layers.get_mut(&sample.target) {
                let bounds = &mut layer.bounds;
                match sample.field {
                    LayoutField::X => bounds.x = sample.value,
                    LayoutField::Y => bounds.y = sample.value,
                    LayoutField::Width => bounds.width = sample.value.max(0.0),
                    LayoutField::Height => bounds.height = sample.value.max(0.0),
                }
            }
        }
        for sample in self.visual_transition_plugin.take_samples() {
            if let Some(layer) = self.layers.get_mut(&sample.target) {
                match sample.field {
                    VisualField::ScaleX => layer.scale.x = sample.value,
                    VisualField::ScaleY => layer.scale.y = sample.value,
                    VisualField::Opacity => layer.opacity = sample.value.clamp(0.0, 1.0),
                }
            }
        }
        for sample in self.scroll_transition_plugin.take_samples() {
            if let Some(layer) = self.layers.get_mut(&sample.target) {
                match sample.field {
                    ScrollAxis::X => layer.scroll_offset.x = sample.value,
                    ScrollAxis::Y => layer.scroll_offset.y = sample.value,
                }
            }
        }
        if result.needs_paint {
            self.request_redraw();
        }
        result
    }
}

fn command_target(command: &LayerCommand) -> ViewId {
    match command {
        LayerCommand::Bounds { view, .. }
        | LayerCommand::Scale { view, .. }
        | LayerCommand::Opacity { view, .. }
        | LayerCommand::Scroll { view, .. } => *view,
    }
}

fn set_layout_field(bounds: &mut Rect, field: LayoutField, to: &Rect) {
    match field {
        LayoutField::X => bounds.x = to.x,
        LayoutField::Y => bounds.y = to.y,
        LayoutField::Width => bounds.width = to.width,
        LayoutField::Height => bounds.height = to.height,
    }
}

/// Starts or cancels tracks for `fields`. Returns the fields the caller must
/// set to their target directly.
fn drive_tracks<F: TrackField>(
    plugin: &mut TrackPlugin<F>,
    host: &mut dyn TransitionHost<TrackTarget>,
    view: ViewId,
    fields: &[(F, f32, f32)],
    animation: Option<Animation>,
) -> Vec<F> {
    let mut snapped = Vec::new();
    for &(field, from, to) in fields {
        let animate = animation.filter(|animation| animation.duration_seconds > f32::EPSILON);
        let Some(animation) = animate else {
            plugin.cancel_track(
                TrackKey {
                    target: view,
                    channel: field.channel_id(),
                },
                host,
            );
            snapped.push(field);
            continue;
        };
        let running = plugin.is_running(view, field);
        if !running && (to - from).abs() <= f32::EPSILON {
            snapped.push(field);
            continue;
        }
        let started: Result<(), StartTrackError<TrackTarget>> =
            plugin.start_track(host, view, field, from, to, animation);
        if let Err(err) = started {
            tracing::warn!(?view, ?field, %err, "animation track rejected, snapping to target");
            snapped.push(field);
        } else {
            tracing::trace!(?view, ?field, from, to, "animation track started");
        }
    }
    snapped
}

/// What a node paints, in window coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerSnapshot {
    pub view: ViewId,
    pub native_id: Option<NativeId>,
    pub rect: Rect,
    /// Intersection of every ancestor's child clip.
    pub clip: Rect,
    pub opacity: f32,
    pub background: Option<Color>,
    pub corners: RoundedCorners,
    pub content: LayerContent,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LayerContent {
    None,
    Surface(SurfacePaint),
}

impl ViewTree {
    /// Runs one compositor tick.
    ///
    /// Queued mutations are applied, animation tracks advance by
    /// `dt_seconds`, pending scroll requests are committed and their
    /// completions resolved, and surface events are collected.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn advance_frame(&mut self, dt_seconds: f32) -> RunResult {
        let started = Instant::now();
        let dt_seconds = if dt_seconds.is_finite() { dt_seconds.max(0.0) } else { 0.0 };

        self.commit_pending_scrolls();
        self.compositor.apply_commands();
        let result = self.compositor.run_transitions(dt_seconds);
        self.drain_surface_events();
        self.flush_scroll_events();

        self.compositor.frame_stats.record_frame(started.elapsed());
        RunResult {
            needs_layout: result.needs_layout,
            needs_paint: result.needs_paint || self.compositor.take_redraw_request(),
            keep_running: self.compositor.is_animating(),
        }
    }

    pub fn is_animating(&self) -> bool {
        self.compositor.is_animating()
    }

    pub fn presented_layer(&self, view: ViewId) -> Option<Layer> {
        self.compositor.layer(view).copied()
    }

    /// Bounds as currently on screen, possibly mid-animation.
    pub fn presented_bounds(&self, view: ViewId) -> Option<Rect> {
        self.presented_layer(view).map(|layer| layer.bounds)
    }

    /// Paint-time scale currently on screen. Adjust-frame scaling shows up in
    /// `presented_bounds` instead.
    pub fn presented_scale(&self, view: ViewId) -> Option<Scale> {
        self.presented_layer(view).map(|layer| layer.scale)
    }

    pub fn presented_opacity(&self, view: ViewId) -> Option<f32> {
        self.presented_layer(view).map(|layer| layer.opacity)
    }

    /// Paint list of the root surface in committed stacking order.
    pub fn layer_snapshots(&self) -> Vec<LayerSnapshot> {
        let mut out = Vec::new();
        if let Some(root) = self.root.content_view {
            let window = Rect::from_origin_size(Point::ZERO, self.root.size);
            self.collect_snapshots(root, window, 1.0, &mut out);
        }
        out
    }

    fn collect_snapshots(
        &self,
        view: ViewId,
        clip: Rect,
        parent_opacity: f32,
        out: &mut Vec<LayerSnapshot>,
    ) {
        let Some(node) = self.nodes.get(view) else {
            return;
        };
        let Some(layer) = self.compositor.layer(view) else {
            return;
        };
        if !node.is_visible() {
            return;
        }
        let to_window = self.local_to_window(view, GeometrySource::Presented);
        let local = Rect::from_origin_size(Point::ZERO, layer.bounds.size());
        let rect = to_window.map_rect(&local);
        let opacity = parent_opacity * layer.opacity;
        let content = match node.surface() {
            Some(surface) => LayerContent::Surface(surface.paint_source()),
            None => LayerContent::None,
        };
        out.push(LayerSnapshot {
            view,
            native_id: node.native_id,
            rect,
            clip,
            opacity,
            background: node.background_color,
            corners: node.rounded_corners,
            content,
        });

        let child_clip = Rect::from_origin_size(Point::ZERO, layer.bounds.size())
            .inset(node.clipping_insets);
        let child_clip = to_window.map_rect(&child_clip).intersect(&clip);
        for child in &node.native_order {
            self.collect_snapshots(*child, child_clip, opacity, out);
        }
    }
}

struct FrameStats {
    enabled: bool,
    last_report_at: Instant,
    frames: u32,
    total_frame_time: Duration,
}

impl FrameStats {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            last_report_at: Instant::now(),
            frames: 0,
            total_frame_time: Duration::ZERO,
        }
    }

    fn record_frame(&mut self, frame_time: Duration) {
        if !self.enabled {
            return;
        }

        self.frames += 1;
        self.total_frame_time += frame_time;

        let elapsed = self.last_report_at.elapsed();
        if elapsed < Duration::from_secs(1) {
            return;
        }

        let secs = elapsed.as_secs_f64().max(f64::EPSILON);
        let fps = self.frames as f64 / secs;
        let avg_ms = (self.total_frame_time.as_secs_f64() * 1000.0) / self.frames as f64;
        tracing::info!(fps, frame_avg_ms = avg_ms, frames = self.frames, "compositor frame stats");

        self.last_report_at = Instant::now();
        self.frames = 0;
        self.total_frame_time = Duration::ZERO;
    }
}
