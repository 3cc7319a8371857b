//! Easing curves.
//!
//! Every curve maps progress `t` in `[0, 1]` to an eased parameter with
//! `f(0) = 0` and `f(1) = 1`. Back and elastic curves overshoot in between.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    #[default]
    Linear,
    /// Polynomial ease-in of the given power.
    PowerIn(f64),
    PowerOut(f64),
    PowerInOut(f64),
    SineInOut,
    /// Ease-in that pulls back by `overshoot` first.
    BackIn(f64),
    BackOut(f64),
    ElasticOut { amplitude: f64, period: f64 },
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match self {
            Ease::Linear => t,
            Ease::PowerIn(p) => t.powf(p),
            Ease::PowerOut(p) => 1.0 - (1.0 - t).powf(p),
            Ease::PowerInOut(p) => {
                if t < 0.5 {
                    (2.0 * t).powf(p) / 2.0
                } else {
                    1.0 - (2.0 * (1.0 - t)).powf(p) / 2.0
                }
            }
            Ease::SineInOut => -((PI * t).cos() - 1.0) / 2.0,
            Ease::BackIn(s) => t * t * ((s + 1.0) * t - s),
            Ease::BackOut(s) => {
                let u = t - 1.0;
                u * u * ((s + 1.0) * u + s) + 1.0
            }
            Ease::ElasticOut { amplitude, period } => {
                let a = amplitude.max(1.0);
                let p = if period > 0.0 { period } else { 0.3 };
                let s = p / (2.0 * PI) * (1.0 / a).asin();
                a * 2f64.powf(-10.0 * t) * ((t - s) * (2.0 * PI) / p).sin() + 1.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const ALL: [Ease; 8] = [
        Ease::Linear,
        Ease::PowerIn(2.0),
        Ease::PowerOut(2.0),
        Ease::PowerInOut(2.0),
        Ease::SineInOut,
        Ease::BackIn(1.7),
        Ease::BackOut(1.7),
        Ease::ElasticOut {
            amplitude: 1.0,
            period: 0.6,
        },
    ];

    #[test]
    fn every_curve_is_pinned_at_the_ends() {
        for ease in ALL {
            assert_abs_diff_eq!(ease.apply(0.0), 0.0);
            assert_abs_diff_eq!(ease.apply(1.0), 1.0);
            assert_abs_diff_eq!(ease.apply(-3.0), 0.0);
            assert_abs_diff_eq!(ease.apply(7.0), 1.0);
        }
    }

    #[test]
    fn power_in_out_is_symmetric() {
        let e = Ease::PowerInOut(2.0);
        assert_abs_diff_eq!(e.apply(0.5), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(e.apply(0.25) + e.apply(0.75), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn back_out_overshoots() {
        let peak = (1..100)
            .map(|i| Ease::BackOut(1.7).apply(i as f64 / 100.0))
            .fold(0.0, f64::max);
        assert!(peak > 1.0);
    }
}
