//! Preset particle factories.
//!
//! Ranges are uniform and expressed in terminal cells and seconds:
//!
//! | effect     | lifespan  | horizontal drift | end opacity | notes                      |
//! |------------|-----------|------------------|-------------|----------------------------|
//! | rising     | 3 – 7     | ±5               | 0.3 – 1.0   | bottom edge to above top   |
//! | bubbles    | 6 – 14    | ±7.5             | 0.1 – 0.6   | bottom edge to above top   |
//! | sparkles   | 1.8       | none             | 0           | anywhere, rises 2 rows     |
//! | balloons   | 3 – 5.5   | ±7.5             | 1           | eased out, below bottom    |
//! | hearts     | 3 – 7     | ±5               | 0           | bottom edge to above top   |
//! | splash     | 2.5       | ±2 jitter        | 0           | fixed anchors, ring growth |

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use super::{Drift, ParticleSpec, VisualAttrs};
use crate::timeline::Ease;
use crate::types::{Color, Point, TerminalContract};

/// Warm pinks, ambers and violets.
pub const WARM: [Color; 6] = [
    Color::rgb(236, 72, 153),
    Color::rgb(244, 114, 182),
    Color::rgb(251, 191, 36),
    Color::rgb(245, 158, 11),
    Color::rgb(139, 92, 246),
    Color::rgb(168, 85, 247),
];

/// Soft backdrop tints.
pub const PASTEL: [Color; 5] = [
    Color::rgb(236, 72, 153),
    Color::rgb(147, 51, 234),
    Color::rgb(59, 130, 246),
    Color::rgb(16, 185, 129),
    Color::rgb(245, 158, 11),
];

const SPARKLE_SHAPES: [char; 4] = ['*', '+', '✦', '✧'];
const HEART_SHAPES: [char; 3] = ['♥', '♡', '❥'];

fn uniform(rng: &mut ChaCha8Rng, lo: f64, hi: f64) -> f64 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

fn pick<T: Copy>(rng: &mut ChaCha8Rng, items: &[T]) -> T {
    items[rng.random_range(0..items.len())]
}

fn dims(area: TerminalContract) -> (f64, f64) {
    (f64::from(area.width.max(1)), f64::from(area.height.max(1)))
}

/// Small dots streaming up from the bottom edge.
pub fn rising(area: TerminalContract) -> impl FnMut(&mut ChaCha8Rng) -> ParticleSpec {
    let (w, h) = dims(area);
    move |rng| {
        let lifespan = uniform(rng, 3.0, 7.0);
        ParticleSpec {
            origin: Point::new(uniform(rng, 0.0, w), h),
            visual: VisualAttrs {
                shape: if lifespan < 5.0 { '•' } else { '·' },
                color: pick(rng, &WARM),
                size: uniform(rng, 0.8, 1.3),
            },
            drift: Drift {
                delta: Point::new(uniform(rng, -5.0, 5.0), -(h + 5.0)),
                ease: Ease::Linear,
                opacity: (1.0, uniform(rng, 0.3, 1.0)),
                growth: (1.0, 1.0),
            },
            lifespan,
            spawn_delay: 0.0,
        }
    }
}

/// Large faint bubbles for the backdrop.
pub fn bubbles(area: TerminalContract) -> impl FnMut(&mut ChaCha8Rng) -> ParticleSpec {
    let (w, h) = dims(area);
    move |rng| {
        let size = uniform(rng, 1.0, 4.0);
        ParticleSpec {
            origin: Point::new(uniform(rng, 0.0, w), h),
            visual: VisualAttrs {
                shape: if size < 2.5 { 'o' } else { 'O' },
                color: pick(rng, &PASTEL),
                size: 1.0,
            },
            drift: Drift {
                delta: Point::new(uniform(rng, -7.5, 7.5), -(h + 5.0)),
                ease: Ease::Linear,
                opacity: (0.5, uniform(rng, 0.1, 0.6)),
                growth: (1.0, 1.0),
            },
            lifespan: uniform(rng, 6.0, 14.0),
            spawn_delay: 0.0,
        }
    }
}

/// Twinkles that pop anywhere, lift a little and fade.
pub fn sparkles(area: TerminalContract) -> impl FnMut(&mut ChaCha8Rng) -> ParticleSpec {
    let (w, h) = dims(area);
    move |rng| ParticleSpec {
        origin: Point::new(uniform(rng, 0.0, w), uniform(rng, 0.0, h)),
        visual: VisualAttrs {
            shape: pick(rng, &SPARKLE_SHAPES),
            color: Color::rgb(253, 224, 71),
            size: uniform(rng, 0.6, 1.4),
        },
        drift: Drift {
            delta: Point::new(0.0, -2.0),
            ease: Ease::PowerOut(2.0),
            opacity: (1.0, 0.0),
            growth: (0.0, 1.5),
        },
        lifespan: 1.8,
        spawn_delay: 0.0,
    }
}

/// Balloons rising from just below the bottom edge.
pub fn balloons(area: TerminalContract) -> impl FnMut(&mut ChaCha8Rng) -> ParticleSpec {
    let (w, h) = dims(area);
    move |rng| ParticleSpec {
        origin: Point::new(uniform(rng, 0.0, w), h + 2.0),
        visual: VisualAttrs {
            shape: 'O',
            color: pick(rng, &WARM),
            size: uniform(rng, 1.0, 1.4),
        },
        drift: Drift {
            delta: Point::new(uniform(rng, -7.5, 7.5), -(h + 10.0)),
            ease: Ease::PowerOut(2.0),
            opacity: (1.0, 1.0),
            growth: (1.0, 1.0),
        },
        lifespan: uniform(rng, 3.0, 5.5),
        spawn_delay: 0.0,
    }
}

/// Hearts that float up and fade out.
pub fn hearts(area: TerminalContract) -> impl FnMut(&mut ChaCha8Rng) -> ParticleSpec {
    let (w, h) = dims(area);
    move |rng| ParticleSpec {
        origin: Point::new(uniform(rng, 0.0, w), h),
        visual: VisualAttrs {
            shape: pick(rng, &HEART_SHAPES),
            color: Color::rgb(236, 72, 153),
            size: 1.0,
        },
        drift: Drift {
            delta: Point::new(uniform(rng, -5.0, 5.0), -(h + 5.0)),
            ease: Ease::PowerOut(1.0),
            opacity: (1.0, 0.0),
            growth: (1.0, 1.0),
        },
        lifespan: uniform(rng, 3.0, 7.0),
        spawn_delay: 0.0,
    }
}

/// Rings that grow out of three fixed anchors in turn. Each spawn takes the
/// next anchor and its color from `palette`.
pub fn splash(area: TerminalContract, palette: [Color; 3]) -> impl FnMut(&mut ChaCha8Rng) -> ParticleSpec {
    let (w, h) = dims(area);
    let anchors = [
        Point::new(w * 0.25, h * 0.3),
        Point::new(w * 0.75, h * 0.7),
        Point::new(w * 0.5, h * 0.15),
    ];
    // Large enough to sweep past every edge.
    let reach = (w * w / 4.0 + h * h).sqrt() * 0.6;
    let mut next = 0usize;
    move |rng| {
        let i = next % anchors.len();
        next += 1;
        let anchor = anchors[i];
        ParticleSpec {
            origin: Point::new(
                anchor.x + uniform(rng, -2.0, 2.0),
                anchor.y + uniform(rng, -2.0, 2.0),
            ),
            visual: VisualAttrs {
                shape: '·',
                color: palette[i],
                size: 1.0,
            },
            drift: Drift {
                delta: Point::default(),
                ease: Ease::PowerOut(1.0),
                opacity: (1.0, 0.0),
                growth: (1.0, reach),
            },
            lifespan: 2.5,
            spawn_delay: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AREA: TerminalContract = TerminalContract {
        width: 80,
        height: 24,
    };

    fn sample<F: FnMut(&mut ChaCha8Rng) -> ParticleSpec>(mut f: F, seed: u64, n: usize) -> Vec<ParticleSpec> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n).map(|_| f(&mut rng)).collect()
    }

    #[test]
    fn rising_stays_within_documented_ranges() {
        for spec in sample(rising(AREA), 1, 200) {
            assert!((0.0..80.0).contains(&spec.origin.x));
            assert_eq!(spec.origin.y, 24.0);
            assert!((3.0..7.0).contains(&spec.lifespan));
            assert!((-5.0..5.0).contains(&spec.drift.delta.x));
            assert!((0.3..1.0).contains(&spec.drift.opacity.1));
            assert!(WARM.contains(&spec.visual.color));
        }
    }

    #[test]
    fn bubbles_and_hearts_leave_the_top_edge() {
        for spec in sample(bubbles(AREA), 2, 100).into_iter().chain(sample(hearts(AREA), 3, 100)) {
            assert!(spec.origin.y + spec.drift.delta.y < 0.0);
        }
    }

    #[test]
    fn sparkles_start_invisible_and_grow() {
        for spec in sample(sparkles(AREA), 4, 50) {
            assert_eq!(spec.drift.growth.0, 0.0);
            assert!(SPARKLE_SHAPES.contains(&spec.visual.shape));
            assert!((0.0..24.0).contains(&spec.origin.y));
        }
    }

    #[test]
    fn same_seed_same_particles() {
        assert_eq!(sample(balloons(AREA), 9, 20), sample(balloons(AREA), 9, 20));
        assert_ne!(sample(balloons(AREA), 9, 20), sample(balloons(AREA), 10, 20));
    }

    #[test]
    fn splash_cycles_through_anchors() {
        let palette = [Color::rgb(1, 0, 0), Color::rgb(2, 0, 0), Color::rgb(3, 0, 0)];
        let colors: Vec<Color> = sample(splash(AREA, palette), 5, 4)
            .iter()
            .map(|s| s.visual.color)
            .collect();
        assert_eq!(colors, [palette[0], palette[1], palette[2], palette[0]]);
    }
}
