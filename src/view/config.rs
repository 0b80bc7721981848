use crate::transition::{Animation, DEFAULT_SCROLL_ANIMATION};

const TRACE_FPS_ENV: &str = "VIEWSTACK_TRACE_FPS";

/// Tree-wide settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeConfig {
    /// Used by smooth-scrolling scroll views when no animation is given.
    pub scroll_animation: Animation,
    /// Reports frame rate through `tracing` once per second.
    pub trace_frames: bool,
    /// Wheel factor given to newly created scroll views.
    pub default_wheel_factor: f32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeConfig {
    pub const fn new() -> Self {
        Self {
            scroll_animation: DEFAULT_SCROLL_ANIMATION,
            trace_frames: false,
            default_wheel_factor: 1.0,
        }
    }

    /// Defaults, with frame tracing enabled when `VIEWSTACK_TRACE_FPS` is set.
    pub fn from_env() -> Self {
        Self::new().trace_frames(std::env::var_os(TRACE_FPS_ENV).is_some())
    }

    pub const fn scroll_animation(mut self, animation: Animation) -> Self {
        self.scroll_animation = animation;
        self
    }

    pub const fn trace_frames(mut self, enabled: bool) -> Self {
        self.trace_frames = enabled;
        self
    }

    pub const fn default_wheel_factor(mut self, factor: f32) -> Self {
        self.default_wheel_factor = factor;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = TreeConfig::new()
            .scroll_animation(Animation::new(0.5).linear())
            .default_wheel_factor(2.0);
        assert_eq!(config.scroll_animation.duration_seconds, 0.5);
        assert_eq!(config.default_wheel_factor, 2.0);
        assert!(!config.trace_frames);
    }
}
