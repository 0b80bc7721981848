use std::hash::Hash;

use rustc_hash::FxHashMap;

use super::{
    ChannelId, RunResult, StartTrackError, TimeFunction, TrackKey, TrackTarget,
    Transition, TransitionFrame, TransitionHost, TransitionPluginId, normalized_timeline_progress,
};

/// Timing of a single animated property change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Animation {
    pub duration_seconds: f32,
    pub delay_seconds: f32,
    pub timing: TimeFunction,
}

impl Default for Animation {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Animation {
    pub const fn new(duration_seconds: f32) -> Self {
        Self {
            duration_seconds,
            delay_seconds: 0.0,
            timing: TimeFunction::EaseOut,
        }
    }

    pub const fn delay(mut self, delay_seconds: f32) -> Self {
        self.delay_seconds = delay_seconds;
        self
    }

    pub const fn timing(mut self, timing: TimeFunction) -> Self {
        self.timing = timing;
        self
    }

    pub const fn linear(self) -> Self {
        self.timing(TimeFunction::Linear)
    }

    pub const fn ease_in(self) -> Self {
        self.timing(TimeFunction::EaseIn)
    }

    pub const fn ease_out(self) -> Self {
        self.timing(TimeFunction::EaseOut)
    }

    pub const fn ease_in_out(self) -> Self {
        self.timing(TimeFunction::EaseInOut)
    }

    pub fn is_valid(&self) -> bool {
        let timing_ok = match self.timing {
            TimeFunction::CubicBezier(curve) => curve.is_valid(),
            _ => true,
        };
        self.duration_seconds.is_finite()
            && self.duration_seconds >= 0.0
            && self.delay_seconds.is_finite()
            && self.delay_seconds >= 0.0
            && timing_ok
    }
}

/// A property family animated by one `TrackPlugin`.
pub trait TrackField: Copy + Eq + Hash + std::fmt::Debug {
    const PLUGIN_ID: TransitionPluginId;
    const CHANNELS: &'static [ChannelId];

    fn channel_id(self) -> ChannelId;

    fn from_channel(channel: ChannelId) -> Option<Self>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackSample<F> {
    pub target: TrackTarget,
    pub field: F,
    pub value: f32,
    pub finished: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct TrackState {
    from: f32,
    to: f32,
    current: f32,
    elapsed_seconds: f32,
    animation: Animation,
}

/// Scalar tracks for one property family, at most one per (view, field).
///
/// Starting a track over a running one retargets from the running track's
/// current value.
#[derive(Debug)]
pub struct TrackPlugin<F: TrackField> {
    plugin_id: TransitionPluginId,
    tracks: FxHashMap<TrackKey<TrackTarget>, TrackState>,
    frame_samples: Vec<TrackSample<F>>,
}

impl<F: TrackField> Default for TrackPlugin<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: TrackField> TrackPlugin<F> {
    pub fn new() -> Self {
        Self::with_plugin_id(F::PLUGIN_ID)
    }

    pub fn with_plugin_id(plugin_id: TransitionPluginId) -> Self {
        Self {
            plugin_id,
            tracks: FxHashMap::default(),
            frame_samples: Vec::new(),
        }
    }

    pub fn start_track(
        &mut self,
        host: &mut dyn TransitionHost<TrackTarget>,
        target: TrackTarget,
        field: F,
        from: f32,
        to: f32,
        animation: Animation,
    ) -> Result<(), StartTrackError<TrackTarget>> {
        if !from.is_finite() || !to.is_finite() {
            return Err(StartTrackError::InvalidInput("track endpoints must be finite"));
        }
        if !animation.is_valid() {
            return Err(StartTrackError::InvalidInput("animation timing is out of range"));
        }
        let key = TrackKey {
            target,
            channel: field.channel_id(),
        };
        let mut next_from = from;
        if let Some(existing) = self.tracks.get(&key) {
            let same_to = (existing.to - to).abs() <= 0.0001;
            if same_to {
                return Ok(());
            }
            next_from = existing.current;
        }
        if !host.is_channel_registered(key.channel) {
            return Err(StartTrackError::ChannelNotRegistered(key.channel));
        }
        host.claim_track(self.plugin_id, key);
        self.tracks.insert(
            key,
            TrackState {
                from: next_from,
                to,
                current: next_from,
                elapsed_seconds: 0.0,
                animation,
            },
        );
        Ok(())
    }

    pub fn is_running(&self, target: TrackTarget, field: F) -> bool {
        self.tracks.contains_key(&TrackKey {
            target,
            channel: field.channel_id(),
        })
    }

    pub fn current_value(&self, target: TrackTarget, field: F) -> Option<f32> {
        self.tracks
            .get(&TrackKey {
                target,
                channel: field.channel_id(),
            })
            .map(|state| state.current)
    }

    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    pub fn take_samples(&mut self) -> Vec<TrackSample<F>> {
        std::mem::take(&mut self.frame_samples)
    }
}

impl<F: TrackField> Transition<TrackTarget> for TrackPlugin<F> {
    fn plugin_id(&self) -> TransitionPluginId {
        self.plugin_id
    }

    fn observed_channels(&self, _target: TrackTarget) -> Vec<ChannelId> {
        F::CHANNELS.to_vec()
    }

    fn cancel_track(
        &mut self,
        key: TrackKey<TrackTarget>,
        host: &mut dyn TransitionHost<TrackTarget>,
    ) {
        self.tracks.remove(&key);
        host.release_track_claim(self.plugin_id, key);
    }

    fn run_tracks(
        &mut self,
        frame: TransitionFrame,
        host: &mut dyn TransitionHost<TrackTarget>,
    ) -> RunResult {
        self.frame_samples.clear();
        let mut finished = Vec::new();

        for (key, state) in &mut self.tracks {
            state.elapsed_seconds = (state.elapsed_seconds + frame.dt_seconds.max(0.0)).max(0.0);
            let Some(progress) = normalized_timeline_progress(
                state.elapsed_seconds,
                state.animation.delay_seconds,
                state.animation.duration_seconds,
            ) else {
                continue;
            };
            let Some(field) = F::from_channel(key.channel) else {
                continue;
            };
            let done = progress >= 1.0;
            let value = if done {
                state.to
            } else {
                let eased = state.animation.timing.sample(progress);
                state.from + (state.to - state.from) * eased
            };
            state.current = value;
            self.frame_samples.push(TrackSample {
                target: key.target,
                field,
                value,
                finished: done,
            });
            if done {
                finished.push(*key);
            }
        }

        for key in finished {
            self.tracks.remove(&key);
            host.release_track_claim(self.plugin_id, key);
        }

        RunResult {
            needs_layout: false,
            needs_paint: !self.frame_samples.is_empty(),
            keep_running: !self.tracks.is_empty(),
        }
    }
}
