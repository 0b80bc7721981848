use std::str::FromStr;

use crate::error::ViewError;

use super::{Point, Rect};

/// Position along one axis of a rectangle.
///
/// `Start` is left or top, `End` is right or bottom. `Percent` is a share of
/// the extent clamped to `[0, 100]`, `Offset` a literal distance from the
/// rectangle's origin on that axis.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Anchor {
    Start,
    #[default]
    Center,
    End,
    Percent(f32),
    Offset(f32),
}

impl Anchor {
    pub fn resolve(self, origin: f32, extent: f32) -> f32 {
        match self {
            Self::Start => origin,
            Self::Center => origin + extent * 0.5,
            Self::End => origin + extent,
            Self::Percent(percent) => origin + extent * percent.clamp(0.0, 100.0) / 100.0,
            Self::Offset(offset) => origin + offset,
        }
    }

    pub fn is_finite(self) -> bool {
        match self {
            Self::Percent(value) | Self::Offset(value) => value.is_finite(),
            _ => true,
        }
    }
}

impl FromStr for Anchor {
    type Err = ViewError;

    /// Bare numbers are percentages (`"30"`), a `px` suffix makes a literal
    /// offset (`"30px"`).
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim().to_ascii_lowercase();
        let parse = |text: &str| text.parse::<f32>().ok().filter(|v| v.is_finite());
        let anchor = match trimmed.as_str() {
            "left" | "top" => Some(Self::Start),
            "center" => Some(Self::Center),
            "right" | "bottom" => Some(Self::End),
            other => match other.strip_suffix("px") {
                Some(px) => parse(px.trim()).map(Self::Offset),
                None => parse(other).map(|p| Self::Percent(p.clamp(0.0, 100.0))),
            },
        };
        anchor.ok_or_else(|| ViewError::InvalidAnchor(raw.to_string()))
    }
}

/// Horizontal and vertical anchor pair.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnchorPoint {
    pub x: Anchor,
    pub y: Anchor,
}

impl AnchorPoint {
    pub const fn new(x: Anchor, y: Anchor) -> Self {
        Self { x, y }
    }

    /// Resolves against `bounds` in the same coordinate space as `bounds`.
    pub fn resolve(self, bounds: &Rect) -> Point {
        Point::new(
            self.x.resolve(bounds.x, bounds.width),
            self.y.resolve(bounds.y, bounds.height),
        )
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Per-axis scale factor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scale {
    pub x: f32,
    pub y: f32,
}

impl Default for Scale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Scale {
    pub const IDENTITY: Self = Self { x: 1.0, y: 1.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_valid(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.x > 0.0 && self.y > 0.0
    }

    pub fn relative_to(self, base: Scale) -> Scale {
        Scale::new(self.x / base.x, self.y / base.y)
    }
}

/// Frame produced by scaling `bounds` so that `anchor` stays fixed.
///
/// `origin' = anchor - (anchor - origin) * factor`, equivalently the origin
/// shifts by `-(anchor - origin) * (factor - 1)`.
pub fn adjust_frame_about_anchor(bounds: &Rect, anchor: Point, factor: Scale) -> Rect {
    bounds.scaled_about(anchor, factor.x, factor.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point, b: Point) {
        assert!((a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3, "{a:?} != {b:?}");
    }

    #[test]
    fn parses_symbolic_and_literal_anchors() {
        assert_eq!("left".parse::<Anchor>().unwrap(), Anchor::Start);
        assert_eq!("bottom".parse::<Anchor>().unwrap(), Anchor::End);
        assert_eq!("center".parse::<Anchor>().unwrap(), Anchor::Center);
        assert_eq!("30".parse::<Anchor>().unwrap(), Anchor::Percent(30.0));
        assert_eq!("250".parse::<Anchor>().unwrap(), Anchor::Percent(100.0));
        assert_eq!("30px".parse::<Anchor>().unwrap(), Anchor::Offset(30.0));
        assert_eq!(" Right ".parse::<Anchor>().unwrap(), Anchor::End);
        assert!("middle".parse::<Anchor>().is_err());
        assert!("NaN".parse::<Anchor>().is_err());
    }

    #[test]
    fn adjusted_frame_keeps_every_anchor_fixed() {
        let bounds = Rect::new(40.0, 60.0, 300.0, 200.0);
        let anchors = [
            Anchor::Start,
            Anchor::Center,
            Anchor::End,
            Anchor::Percent(30.0),
            Anchor::Offset(30.0),
        ];
        for ax in anchors {
            for ay in anchors {
                let anchor = AnchorPoint::new(ax, ay);
                let fixed = anchor.resolve(&bounds);
                for factor in [Scale::new(0.5, 0.5), Scale::new(2.0, 1.25), Scale::new(0.1, 3.0)] {
                    let next = adjust_frame_about_anchor(&bounds, fixed, factor);
                    // Literal offsets scale along with the view content.
                    let relocated = match (ax, ay) {
                        (Anchor::Offset(ox), Anchor::Offset(oy)) => {
                            Point::new(next.x + ox * factor.x, next.y + oy * factor.y)
                        }
                        (Anchor::Offset(ox), _) => {
                            Point::new(next.x + ox * factor.x, anchor.resolve(&next).y)
                        }
                        (_, Anchor::Offset(oy)) => {
                            Point::new(anchor.resolve(&next).x, next.y + oy * factor.y)
                        }
                        _ => anchor.resolve(&next),
                    };
                    assert_close(relocated, fixed);
                }
            }
        }
    }

    #[test]
    fn scale_validity_rejects_non_positive_and_non_finite() {
        assert!(Scale::new(0.5, 2.0).is_valid());
        assert!(!Scale::new(0.0, 1.0).is_valid());
        assert!(!Scale::new(f32::NAN, 1.0).is_valid());
        assert!(!Scale::new(1.0, f32::INFINITY).is_valid());
    }
}
