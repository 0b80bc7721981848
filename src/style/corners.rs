/// Per-corner rounding mask applied at paint time.
///
/// Only corners that opt in are rounded, all by the same radius. The mask has
/// no effect on layout or hit-testing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RoundedCorners {
    pub radius: f32,
    pub top_left: bool,
    pub top_right: bool,
    pub bottom_left: bool,
    pub bottom_right: bool,
}

impl RoundedCorners {
    pub const NONE: Self = Self {
        radius: 0.0,
        top_left: false,
        top_right: false,
        bottom_left: false,
        bottom_right: false,
    };

    pub const fn all(radius: f32) -> Self {
        Self {
            radius,
            top_left: true,
            top_right: true,
            bottom_left: true,
            bottom_right: true,
        }
    }

    /// Radii in `[top_left, top_right, bottom_right, bottom_left]` order.
    pub fn radii(&self) -> [f32; 4] {
        let pick = |on: bool| if on { self.radius.max(0.0) } else { 0.0 };
        [
            pick(self.top_left),
            pick(self.top_right),
            pick(self.bottom_right),
            pick(self.bottom_left),
        ]
    }

    pub fn is_rounded(&self) -> bool {
        self.radii().iter().any(|r| *r > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radii_only_include_enabled_corners() {
        let corners = RoundedCorners {
            radius: 8.0,
            top_left: true,
            bottom_right: true,
            ..RoundedCorners::NONE
        };
        assert_eq!(corners.radii(), [8.0, 0.0, 8.0, 0.0]);
        assert!(corners.is_rounded());
        assert!(!RoundedCorners { radius: 0.0, ..RoundedCorners::all(0.0) }.is_rounded());
    }
}
