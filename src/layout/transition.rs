use serde::{Deserialize, Serialize};

/// Easing curve applied to transition progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Easing {
    Linear,
    /// Cubic ease-in-out; the default transition curve.
    #[default]
    CubicInOut,
}

impl Easing {
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::CubicInOut => {
                let t2 = t * 2.0;
                if t2 <= 1.0 {
                    t2 * t2 * t2 / 2.0
                } else {
                    let u = t2 - 2.0;
                    (u * u * u + 2.0) / 2.0
                }
            }
        }
    }
}

/// Geometry of one bar: band offset and horizontal extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarGeometry {
    pub y: f64,
    pub extent: f64,
}

impl BarGeometry {
    #[must_use]
    pub fn new(y: f64, extent: f64) -> Self {
        Self { y, extent }
    }

    #[must_use]
    fn lerp(self, to: Self, t: f64) -> Self {
        Self {
            y: self.y + (to.y - self.y) * t,
            extent: self.extent + (to.extent - self.extent) * t,
        }
    }
}

/// Interpolation of one element from its current geometry to a target.
///
/// Retargeting an in-flight tween restarts it from the geometry sampled at
/// the retarget time, so the newest target always wins without a jump.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tween {
    pub from: BarGeometry,
    pub to: BarGeometry,
    pub start_ms: f64,
    pub duration_ms: f64,
    pub easing: Easing,
}

impl Tween {
    #[must_use]
    pub fn new(from: BarGeometry, to: BarGeometry, start_ms: f64, duration_ms: f64) -> Self {
        Self {
            from,
            to,
            start_ms,
            duration_ms: duration_ms.max(0.0),
            easing: Easing::default(),
        }
    }

    #[must_use]
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    #[must_use]
    pub fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn sample(&self, now_ms: f64) -> BarGeometry {
        let t = self.easing.apply(self.progress(now_ms));
        self.from.lerp(self.to, t)
    }

    /// Redirects the tween toward `to`, starting from where it is at `now_ms`.
    pub fn retarget(&mut self, to: BarGeometry, now_ms: f64, duration_ms: f64) {
        self.from = self.sample(now_ms);
        self.to = to;
        self.start_ms = now_ms;
        self.duration_ms = duration_ms.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::{BarGeometry, Easing, Tween};

    #[test]
    fn cubic_in_out_is_symmetric() {
        let easing = Easing::CubicInOut;
        assert_eq!(easing.apply(0.0), 0.0);
        assert_eq!(easing.apply(1.0), 1.0);
        assert!((easing.apply(0.5) - 0.5).abs() <= 1e-12);
        assert!((easing.apply(0.25) + easing.apply(0.75) - 1.0).abs() <= 1e-12);
    }

    #[test]
    fn tween_reaches_target_after_duration() {
        let from = BarGeometry::new(0.0, 0.0);
        let to = BarGeometry::new(40.0, 100.0);
        let tween = Tween::new(from, to, 0.0, 750.0);
        assert_eq!(tween.sample(-10.0), from);
        assert_eq!(tween.sample(750.0), to);
        assert_eq!(tween.progress(800.0), 1.0);
    }

    #[test]
    fn retarget_starts_from_current_sample() {
        let mut tween = Tween::new(
            BarGeometry::new(0.0, 0.0),
            BarGeometry::new(0.0, 100.0),
            0.0,
            100.0,
        )
        .with_easing(Easing::Linear);
        tween.retarget(BarGeometry::new(0.0, 20.0), 50.0, 100.0);
        assert!((tween.from.extent - 50.0).abs() <= 1e-12);
        assert!((tween.sample(50.0).extent - 50.0).abs() <= 1e-12);
        assert!((tween.sample(150.0).extent - 20.0).abs() <= 1e-12);
    }
}
