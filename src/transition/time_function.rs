/// Cubic Bézier easing curve through (0,0), (x1,y1), (x2,y2), (1,1).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBezier {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl CubicBezier {
    pub const EASE_IN: Self = Self::new(0.42, 0.0, 1.0, 1.0);
    pub const EASE_OUT: Self = Self::new(0.0, 0.0, 0.58, 1.0);
    pub const EASE_IN_OUT: Self = Self::new(0.42, 0.0, 0.58, 1.0);

    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// X control points must stay in `[0, 1]` for the curve to be a function of time.
    pub fn is_valid(&self) -> bool {
        [self.x1, self.y1, self.x2, self.y2].iter().all(|v| v.is_finite())
            && (0.0..=1.0).contains(&self.x1)
            && (0.0..=1.0).contains(&self.x2)
    }

    fn coefficients(p1: f32, p2: f32) -> (f32, f32, f32) {
        let c = 3.0 * p1;
        let b = 3.0 * (p2 - p1) - c;
        let a = 1.0 - c - b;
        (a, b, c)
    }

    fn curve(t: f32, p1: f32, p2: f32) -> f32 {
        let (a, b, c) = Self::coefficients(p1, p2);
        ((a * t + b) * t + c) * t
    }

    fn curve_derivative(t: f32, p1: f32, p2: f32) -> f32 {
        let (a, b, c) = Self::coefficients(p1, p2);
        (3.0 * a * t + 2.0 * b) * t + c
    }

    /// Finds the curve parameter whose x equals `x`.
    fn solve_x(&self, x: f32) -> f32 {
        const EPSILON: f32 = 1e-6;

        let mut t = x;
        for _ in 0..8 {
            let error = Self::curve(t, self.x1, self.x2) - x;
            if error.abs() < EPSILON {
                return t;
            }
            let slope = Self::curve_derivative(t, self.x1, self.x2);
            if slope.abs() < EPSILON {
                break;
            }
            t -= error / slope;
        }

        let (mut lo, mut hi) = (0.0f32, 1.0f32);
        t = x;
        for _ in 0..32 {
            let value = Self::curve(t, self.x1, self.x2);
            if (value - x).abs() < EPSILON {
                break;
            }
            if value < x {
                lo = t;
            } else {
                hi = t;
            }
            t = (lo + hi) * 0.5;
        }
        t
    }

    pub fn sample(&self, x: f32) -> f32 {
        let x = x.clamp(0.0, 1.0);
        if x <= 0.0 || x >= 1.0 {
            return x;
        }
        Self::curve(self.solve_x(x), self.y1, self.y2)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum TimeFunction {
    Linear,
    EaseIn,
    #[default]
    EaseOut,
    EaseInOut,
    CubicBezier(CubicBezier),
}

impl TimeFunction {
    /// Accepts `linear`, `easeIn`, `easeOut`, `easeInEaseOut` and `default`,
    /// case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "linear" => Some(Self::Linear),
            "easein" => Some(Self::EaseIn),
            "easeout" | "default" => Some(Self::EaseOut),
            "easeineaseout" | "easeinout" => Some(Self::EaseInOut),
            _ => None,
        }
    }

    pub fn sample(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => CubicBezier::EASE_IN.sample(t),
            Self::EaseOut => CubicBezier::EASE_OUT.sample(t),
            Self::EaseInOut => CubicBezier::EASE_IN_OUT.sample(t),
            Self::CubicBezier(curve) => curve.sample(t),
        }
    }
}

pub fn normalized_timeline_progress(
    elapsed_seconds: f32,
    delay_seconds: f32,
    duration_seconds: f32,
) -> Option<f32> {
    if elapsed_seconds < delay_seconds {
        return None;
    }
    if duration_seconds <= f32::EPSILON {
        return Some(1.0);
    }
    Some(((elapsed_seconds - delay_seconds) / duration_seconds).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_curves_hit_endpoints() {
        for timing in [
            TimeFunction::Linear,
            TimeFunction::EaseIn,
            TimeFunction::EaseOut,
            TimeFunction::EaseInOut,
        ] {
            assert_eq!(timing.sample(0.0), 0.0);
            assert_eq!(timing.sample(1.0), 1.0);
        }
    }

    #[test]
    fn ease_in_lags_and_ease_out_leads_linear() {
        assert!(TimeFunction::EaseIn.sample(0.5) < 0.5);
        assert!(TimeFunction::EaseOut.sample(0.5) > 0.5);
        assert!((TimeFunction::EaseInOut.sample(0.5) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn linear_control_points_match_linear_timing() {
        let curve = CubicBezier::new(0.25, 0.25, 0.75, 0.75);
        for step in 0..=10 {
            let t = step as f32 / 10.0;
            assert!((curve.sample(t) - t).abs() < 1e-3, "t={t}");
        }
    }

    #[test]
    fn from_name_is_case_insensitive() {
        assert_eq!(TimeFunction::from_name("easeInEaseOut"), Some(TimeFunction::EaseInOut));
        assert_eq!(TimeFunction::from_name(" Linear "), Some(TimeFunction::Linear));
        assert_eq!(TimeFunction::from_name("default"), Some(TimeFunction::EaseOut));
        assert_eq!(TimeFunction::from_name("bounce"), None);
    }

    #[test]
    fn progress_waits_for_delay() {
        assert_eq!(normalized_timeline_progress(0.1, 0.2, 1.0), None);
        assert_eq!(normalized_timeline_progress(0.7, 0.2, 1.0), Some(0.5));
        assert_eq!(normalized_timeline_progress(0.0, 0.0, 0.0), Some(1.0));
    }
}
