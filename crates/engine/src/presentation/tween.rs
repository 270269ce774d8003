use std::f32::consts::PI;

use glam::Quat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    InSine,
    OutSine,
    #[default]
    InOutSine,
    InQuad,
    OutQuad,
    InOutQuad,
    OutCubic,
    InOutCubic,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InSine => 1.0 - (t * PI * 0.5).cos(),
            Self::OutSine => (t * PI * 0.5).sin(),
            Self::InOutSine => -((PI * t).cos() - 1.0) * 0.5,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) * 0.5
                }
            }
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) * 0.5
                }
            }
        }
    }
}

/// Time-bounded slerp between two rotations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationTween {
    from: Quat,
    to: Quat,
    duration: f32,
    elapsed: f32,
    easing: Easing,
}

impl RotationTween {
    pub fn new(from: Quat, to: Quat, duration_seconds: f32, easing: Easing) -> Self {
        Self {
            from,
            to,
            duration: duration_seconds.max(0.0),
            elapsed: 0.0,
            easing,
        }
    }

    pub fn target(&self) -> Quat {
        self.to
    }

    pub fn progress(&self) -> f32 {
        if self.duration <= f32::EPSILON {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    pub fn current(&self) -> Quat {
        self.from
            .slerp(self.to, self.easing.apply(self.progress()))
            .normalize()
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    /// Advances and returns the interpolated rotation.
    pub fn advance(&mut self, dt_seconds: f32) -> Quat {
        if dt_seconds.is_finite() && dt_seconds > 0.0 {
            self.elapsed = (self.elapsed + dt_seconds).min(self.duration);
        }
        self.current()
    }

    /// Freezes the tween where it is now; the returned rotation is final.
    pub fn complete_at_current(&mut self) -> Quat {
        let here = self.current();
        self.from = here;
        self.to = here;
        self.elapsed = self.duration;
        here
    }
}
