//! Easing curves shared by every gem animation.
//!
//! All curves take a normalized progress `t` and return an eased progress.
//! Inputs outside `[0, 1]` are clamped first, so callers never need to guard.
//! Some curves overshoot (`OutBack`, `OutElastic`) or undershoot (`InBack`)
//! the unit interval on purpose.

use std::f32::consts::PI;

const BACK_C1: f32 = 1.70158;
const BACK_C3: f32 = BACK_C1 + 1.0;

const ELASTIC_PERIOD: f32 = 0.3;
const ELASTIC_SHIFT: f32 = ELASTIC_PERIOD / 4.0;

/// Which of the two bounce curves the fall animations use.
///
/// `Strict` is the classic Penner curve that lands exactly on 1.0. `Soft` is
/// the flatter variant whose last segment settles at ~0.97; animations snap
/// to their exact target on completion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BounceVariant {
    #[default]
    Strict,
    Soft,
}

/// Easing id stored on animation tasks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Easing {
    Linear,
    OutCubic,
    OutBounce,
    OutBounceSoft,
    OutElastic,
    InBack,
    OutBack,
}

impl Easing {
    pub fn sample(self, t: f32) -> f32 {
        match self {
            Self::Linear => linear(t),
            Self::OutCubic => ease_out_cubic(t),
            Self::OutBounce => ease_out_bounce(t),
            Self::OutBounceSoft => ease_out_bounce_soft(t),
            Self::OutElastic => ease_out_elastic(t),
            Self::InBack => ease_in_back(t),
            Self::OutBack => ease_out_back(t),
        }
    }

    pub fn bounce(variant: BounceVariant) -> Self {
        match variant {
            BounceVariant::Strict => Self::OutBounce,
            BounceVariant::Soft => Self::OutBounceSoft,
        }
    }
}

#[inline]
fn unit(t: f32) -> f32 {
    if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }
}

pub fn linear(t: f32) -> f32 {
    unit(t)
}

pub fn ease_out_cubic(t: f32) -> f32 {
    let t = unit(t);
    1.0 - (1.0 - t).powi(3)
}

/// Four-segment bounce with factor 7.5625 and offsets 0 / 0.75 / 0.9375 / 0.984375.
pub fn ease_out_bounce(t: f32) -> f32 {
    let t = unit(t);
    const N: f32 = 7.5625;
    const D: f32 = 2.75;
    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let u = t - 1.5 / D;
        N * u * u + 0.75
    } else if t < 2.5 / D {
        let u = t - 2.25 / D;
        N * u * u + 0.9375
    } else {
        let u = t - 2.625 / D;
        N * u * u + 0.984375
    }
}

/// Flatter bounce with factor 7.5 and offsets 0 / 0.75 / 0.95 / 0.95.
pub fn ease_out_bounce_soft(t: f32) -> f32 {
    let t = unit(t);
    const N: f32 = 7.5;
    const D: f32 = 2.75;
    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let u = t - 1.5 / D;
        N * u * u + 0.75
    } else if t < 2.5 / D {
        let u = t - 2.25 / D;
        N * u * u + 0.95
    } else {
        let u = t - 2.6 / D;
        N * u * u + 0.95
    }
}

pub fn ease_out_elastic(t: f32) -> f32 {
    let t = unit(t);
    if t == 0.0 {
        return 0.0;
    }
    if t == 1.0 {
        return 1.0;
    }
    2f32.powf(-10.0 * t) * ((t - ELASTIC_SHIFT) * (2.0 * PI) / ELASTIC_PERIOD).sin() + 1.0
}

pub fn ease_in_back(t: f32) -> f32 {
    let t = unit(t);
    BACK_C3 * t * t * t - BACK_C1 * t * t
}

pub fn ease_out_back(t: f32) -> f32 {
    let t = unit(t);
    let u = t - 1.0;
    1.0 + BACK_C3 * u.powi(3) + BACK_C1 * u.powi(2)
}
