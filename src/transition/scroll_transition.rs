use super::{Animation, ChannelId, TrackField, TrackPlugin, TransitionPluginId};

pub const CHANNEL_SCROLL_X: ChannelId = ChannelId(10_001);
pub const CHANNEL_SCROLL_Y: ChannelId = ChannelId(10_002);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScrollAxis {
    X,
    Y,
}

impl TrackField for ScrollAxis {
    const PLUGIN_ID: TransitionPluginId = TransitionPluginId(1);
    const CHANNELS: &'static [ChannelId] = &[CHANNEL_SCROLL_X, CHANNEL_SCROLL_Y];

    fn channel_id(self) -> ChannelId {
        match self {
            Self::X => CHANNEL_SCROLL_X,
            Self::Y => CHANNEL_SCROLL_Y,
        }
    }

    fn from_channel(channel: ChannelId) -> Option<Self> {
        match channel {
            CHANNEL_SCROLL_X => Some(Self::X),
            CHANNEL_SCROLL_Y => Some(Self::Y),
            _ => None,
        }
    }
}

pub type ScrollTransitionPlugin = TrackPlugin<ScrollAxis>;

/// Animation used for smooth scrolling when the caller gives none.
pub const DEFAULT_SCROLL_ANIMATION: Animation = Animation::new(0.25).ease_out();
