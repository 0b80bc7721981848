use super::{ChannelId, TrackField, TrackPlugin, TransitionPluginId};

pub const CHANNEL_VISUAL_SCALE_X: ChannelId = ChannelId(21_001);
pub const CHANNEL_VISUAL_SCALE_Y: ChannelId = ChannelId(21_002);
pub const CHANNEL_VISUAL_OPACITY: ChannelId = ChannelId(21_003);

/// Paint-only properties: they never affect layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VisualField {
    ScaleX,
    ScaleY,
    Opacity,
}

impl TrackField for VisualField {
    const PLUGIN_ID: TransitionPluginId = TransitionPluginId(4);
    const CHANNELS: &'static [ChannelId] = &[
        CHANNEL_VISUAL_SCALE_X,
        CHANNEL_VISUAL_SCALE_Y,
        CHANNEL_VISUAL_OPACITY,
    ];

    fn channel_id(self) -> ChannelId {
        match self {
            Self::ScaleX => CHANNEL_VISUAL_SCALE_X,
            Self::ScaleY => CHANNEL_VISUAL_SCALE_Y,
            Self::Opacity => CHANNEL_VISUAL_OPACITY,
        }
    }

    fn from_channel(channel: ChannelId) -> Option<Self> {
        match channel {
            CHANNEL_VISUAL_SCALE_X => Some(Self::ScaleX),
            CHANNEL_VISUAL_SCALE_Y => Some(Self::ScaleY),
            CHANNEL_VISUAL_OPACITY => Some(Self::Opacity),
            _ => None,
        }
    }
}

pub type VisualTransitionPlugin = TrackPlugin<VisualField>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transition::test_support::{TestHost, frame, target};
    use crate::transition::{Animation, Transition};

    #[test]
    fn start_track_keeps_existing_when_destination_unchanged() {
        let mut plugin = VisualTransitionPlugin::new();
        let mut host = TestHost::with_channels(VisualField::CHANNELS);
        let view = target();

        plugin
            .start_track(
                &mut host,
                view,
                VisualField::Opacity,
                0.0,
                1.0,
                Animation::new(1.0).linear(),
            )
            .expect("first track should start");
        plugin.run_tracks(frame(0.5), &mut host);
        plugin
            .start_track(&mut host, view, VisualField::Opacity, 0.2, 1.0, Animation::new(0.25))
            .expect("same destination should be ignored");

        let current = plugin
            .current_value(view, VisualField::Opacity)
            .expect("track should still run");
        assert!((current - 0.5).abs() < 1e-3);

        plugin.run_tracks(frame(0.25), &mut host);
        let samples = plugin.take_samples();
        // Still on the original one-second timeline.
        assert!((samples[0].value - 0.75).abs() < 1e-3);
    }

    #[test]
    fn retarget_uses_current_value_as_from() {
        let mut plugin = VisualTransitionPlugin::new();
        let mut host = TestHost::with_channels(VisualField::CHANNELS);
        let view = target();

        plugin
            .start_track(
                &mut host,
                view,
                VisualField::ScaleX,
                1.0,
                2.0,
                Animation::new(1.0).linear(),
            )
            .expect("first track should start");
        plugin.run_tracks(frame(0.5), &mut host);
        let current_before = plugin
            .current_value(view, VisualField::ScaleX)
            .expect("track should exist after first frame");

        plugin
            .start_track(
                &mut host,
                view,
                VisualField::ScaleX,
                10.0,
                0.5,
                Animation::new(1.0).linear(),
            )
            .expect("second track should retarget");

        plugin.run_tracks(frame(0.0), &mut host);
        let samples = plugin.take_samples();
        assert!((samples[0].value - current_before).abs() < 1e-4);

        plugin.run_tracks(frame(1.0), &mut host);
        let samples = plugin.take_samples();
        assert_eq!(samples[0].value, 0.5);
        assert!(!plugin.is_running(view, VisualField::ScaleX));
    }

    #[test]
    fn cancel_target_drops_every_channel() {
        let mut plugin = VisualTransitionPlugin::new();
        let mut host = TestHost::with_channels(VisualField::CHANNELS);
        let view = target();
        for field in [VisualField::ScaleX, VisualField::ScaleY, VisualField::Opacity] {
            plugin
                .start_track(&mut host, view, field, 0.0, 1.0, Animation::new(1.0))
                .expect("track should start");
        }
        plugin.cancel_target(view, &mut host);
        assert!(!plugin.has_tracks());
        assert!(host.claims.is_empty());
    }
}
