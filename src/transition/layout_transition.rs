use super::{ChannelId, TrackField, TrackPlugin, TransitionPluginId};

pub const CHANNEL_LAYOUT_X: ChannelId = ChannelId(20_001);
pub const CHANNEL_LAYOUT_Y: ChannelId = ChannelId(20_002);
pub const CHANNEL_LAYOUT_WIDTH: ChannelId = ChannelId(20_003);
pub const CHANNEL_LAYOUT_HEIGHT: ChannelId = ChannelId(20_004);

/// Bounds components animated by `LayoutTransitionPlugin`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayoutField {
    X,
    Y,
    Width,
    Height,
}

impl TrackField for LayoutField {
    const PLUGIN_ID: TransitionPluginId = TransitionPluginId(2);
    const CHANNELS: &'static [ChannelId] = &[
        CHANNEL_LAYOUT_X,
        CHANNEL_LAYOUT_Y,
        CHANNEL_LAYOUT_WIDTH,
        CHANNEL_LAYOUT_HEIGHT,
    ];

    fn channel_id(self) -> ChannelId {
        match self {
            Self::X => CHANNEL_LAYOUT_X,
            Self::Y => CHANNEL_LAYOUT_Y,
            Self::Width => CHANNEL_LAYOUT_WIDTH,
            Self::Height => CHANNEL_LAYOUT_HEIGHT,
        }
    }

    fn from_channel(channel: ChannelId) -> Option<Self> {
        match channel {
            CHANNEL_LAYOUT_X => Some(Self::X),
            CHANNEL_LAYOUT_Y => Some(Self::Y),
            CHANNEL_LAYOUT_WIDTH => Some(Self::Width),
            CHANNEL_LAYOUT_HEIGHT => Some(Self::Height),
            _ => None,
        }
    }
}

pub type LayoutTransitionPlugin = TrackPlugin<LayoutField>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transition::test_support::{TestHost, frame, target};
    use crate::transition::{Animation, StartTrackError, Transition};

    #[test]
    fn width_track_interpolates_and_finishes_on_target() {
        let mut plugin = LayoutTransitionPlugin::new();
        let mut host = TestHost::with_channels(LayoutField::CHANNELS);
        let view = target();

        plugin
            .start_track(
                &mut host,
                view,
                LayoutField::Width,
                100.0,
                200.0,
                Animation::new(1.0).linear(),
            )
            .expect("track should start");

        plugin.run_tracks(frame(0.25), &mut host);
        let samples = plugin.take_samples();
        assert_eq!(samples.len(), 1);
        assert!((samples[0].value - 125.0).abs() < 1e-3);
        assert!(!samples[0].finished);

        let result = plugin.run_tracks(frame(1.0), &mut host);
        let samples = plugin.take_samples();
        assert_eq!(samples[0].value, 200.0);
        assert!(samples[0].finished);
        assert!(!result.keep_running);
        assert!(host.claims.is_empty());
    }

    #[test]
    fn unregistered_channel_is_rejected() {
        let mut plugin = LayoutTransitionPlugin::new();
        let mut host = TestHost::with_channels(&[CHANNEL_LAYOUT_X]);
        let err = plugin
            .start_track(&mut host, target(), LayoutField::Height, 0.0, 1.0, Animation::new(1.0))
            .expect_err("height channel is not registered");
        assert_eq!(err, StartTrackError::ChannelNotRegistered(CHANNEL_LAYOUT_HEIGHT));
    }

    #[test]
    fn non_finite_endpoint_is_invalid_input() {
        let mut plugin = LayoutTransitionPlugin::new();
        let mut host = TestHost::with_channels(LayoutField::CHANNELS);
        assert!(matches!(
            plugin.start_track(
                &mut host,
                target(),
                LayoutField::X,
                0.0,
                f32::NAN,
                Animation::new(1.0),
            ),
            Err(StartTrackError::InvalidInput(_))
        ));
    }

    #[test]
    fn delayed_track_emits_nothing_before_delay() {
        let mut plugin = LayoutTransitionPlugin::new();
        let mut host = TestHost::with_channels(LayoutField::CHANNELS);
        plugin
            .start_track(
                &mut host,
                target(),
                LayoutField::Y,
                0.0,
                10.0,
                Animation::new(1.0).delay(0.5),
            )
            .expect("track should start");
        let result = plugin.run_tracks(frame(0.25), &mut host);
        assert!(plugin.take_samples().is_empty());
        assert!(result.keep_running);
    }
}
