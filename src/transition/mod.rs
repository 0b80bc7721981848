use std::fmt;

mod layout_transition;
mod scroll_transition;
mod time_function;
mod track;
mod visual_transition;
pub use layout_transition::*;
pub use scroll_transition::*;
pub use time_function::*;
pub use track::*;
pub use visual_transition::*;

/// Tracks are keyed by the view they animate.
pub type TrackTarget = crate::view::ViewId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TrackKey<TargetType> {
    pub target: TargetType,
    pub channel: ChannelId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct TransitionPluginId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionFrame {
    pub dt_seconds: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunResult {
    pub needs_layout: bool,
    pub needs_paint: bool,
    pub keep_running: bool,
}

impl RunResult {
    pub const fn merge(self, rhs: Self) -> Self {
        Self {
            needs_layout: self.needs_layout || rhs.needs_layout,
            needs_paint: self.needs_paint || rhs.needs_paint,
            keep_running: self.keep_running || rhs.keep_running,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StartTrackError<TargetType> {
    ChannelNotRegistered(ChannelId),
    InvalidInput(&'static str),
    #[doc(hidden)]
    __Marker(std::marker::PhantomData<TargetType>, std::convert::Infallible),
}

impl<TargetType: fmt::Debug> fmt::Display for StartTrackError<TargetType> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelNotRegistered(channel) => {
                write!(f, "channel not registered: {}", channel.0)
            }
            Self::InvalidInput(message) => write!(f, "invalid track input: {message}"),
            Self::__Marker(_, never) => match *never {},
        }
    }
}

impl<TargetType: fmt::Debug> std::error::Error for StartTrackError<TargetType> {}

/// Arbitrates which plugin owns a (target, channel) track.
pub trait TransitionHost<TargetType> {
    fn is_channel_registered(&self, channel: ChannelId) -> bool;

    /// Hands `key` to `plugin_id`, taking it from any previous owner.
    fn claim_track(&mut self, plugin_id: TransitionPluginId, key: TrackKey<TargetType>);

    fn release_track_claim(&mut self, plugin_id: TransitionPluginId, key: TrackKey<TargetType>);

    fn release_all_claims(&mut self, plugin_id: TransitionPluginId);
}

pub trait Transition<TargetType: Copy> {
    fn plugin_id(&self) -> TransitionPluginId;

    fn observed_channels(&self, target: TargetType) -> Vec<ChannelId>;

    fn cancel_track(
        &mut self,
        key: TrackKey<TargetType>,
        host: &mut dyn TransitionHost<TargetType>,
    );

    /// Drops every track of `target`, e.g. when the view is destroyed.
    fn cancel_target(&mut self, target: TargetType, host: &mut dyn TransitionHost<TargetType>) {
        for channel in self.observed_channels(target) {
            self.cancel_track(TrackKey { target, channel }, host);
        }
    }

    fn run_tracks(
        &mut self,
        frame: TransitionFrame,
        host: &mut dyn TransitionHost<TargetType>,
    ) -> RunResult;
}
