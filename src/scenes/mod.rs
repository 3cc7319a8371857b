//! The show: five scenes and the backdrop that runs behind them.

mod cake;
mod dark_room;
mod particles;
mod photo;
mod welcome;

pub use cake::Cake;
pub use dark_room::DarkRoom;
pub use particles::Particles;
pub use photo::Photo;
pub use welcome::Welcome;

use rand_chacha::ChaCha8Rng;

use crate::emitter::{effects, EmissionPolicy, Emitter, EmitterError};
use crate::scheduler::Runtime;
use crate::scene::SceneDescriptor;
use crate::stage::{EntityId, Node, Prop};
use crate::timeline::{Ease, Step};
use crate::types::{Color, Point, TerminalContract};

const INK: Color = Color::rgb(75, 85, 99);
const PINK: Color = Color::rgb(219, 39, 119);
const VIOLET: Color = Color::rgb(147, 51, 234);
const GOLD: Color = Color::rgb(250, 204, 21);

/// Entrance bounce used by most scenes.
const SPRING: Ease = Ease::ElasticOut {
    amplitude: 1.0,
    period: 0.6,
};

/// Scenes in show order.
pub fn lineup() -> Vec<SceneDescriptor> {
    vec![
        SceneDescriptor::new("welcome", Welcome::default),
        SceneDescriptor::new("dark_room", DarkRoom::default),
        SceneDescriptor::new("particles", Particles::default),
        SceneDescriptor::new("cake", Cake::default),
        SceneDescriptor::new("photo", Photo::default),
    ]
}

/// Faint bubbles drifting up behind every scene, one every two seconds.
pub fn backdrop(runtime: &Runtime, area: TerminalContract, rng: ChaCha8Rng) -> Result<Emitter, EmitterError> {
    let emitter = Emitter::new(runtime, rng).layer(-10).label("backdrop");
    emitter.start(EmissionPolicy::Interval { period: 2.0 }, effects::bubbles(area))?;
    Ok(emitter)
}

/// A node and the position it animates into.
#[derive(Debug, Clone, Copy)]
struct Placed {
    id: EntityId,
    rest: Point,
}

/// Column that horizontally centers something `width` cells wide.
fn center_x(area: TerminalContract, width: usize) -> f64 {
    ((f64::from(area.width) - width as f64) / 2.0).floor().max(0.0)
}

fn art_width(lines: &[String]) -> usize {
    lines.iter().map(|l| l.chars().count()).max().unwrap_or(0)
}

/// `node` parked `drop` rows below `rest`, transparent and at `scale`,
/// ready for [`rise_in`].
fn parked(node: Node, rest: Point, drop: f64, scale: f64) -> Node {
    node.at(Point::new(rest.x, rest.y + drop))
        .with(Prop::Opacity, 0.0)
        .with(Prop::Scale, scale)
}

/// Bring a parked node to its resting place at full opacity and scale.
fn rise_in(p: Placed, duration: f64, ease: Ease) -> Step {
    Step::to(p.id, duration)
        .prop(Prop::Opacity, 1.0)
        .prop(Prop::Y, p.rest.y)
        .prop(Prop::Scale, 1.0)
        .ease(ease)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use rand::SeedableRng;

    use super::*;
    use crate::assets::NoAssets;
    use crate::scene::{Phase, SceneController, SceneEnv};
    use crate::timeline::Callback;

    const AREA: TerminalContract = TerminalContract {
        width: 80,
        height: 24,
    };

    fn env(rt: &Runtime) -> SceneEnv {
        SceneEnv {
            runtime: rt.clone(),
            area: AREA,
            assets: Rc::new(NoAssets),
            parent: None,
        }
    }

    /// Mount one scene, fire its trigger, and run until it asks to move on.
    fn run_scene(descriptor: &SceneDescriptor) -> f64 {
        let rt = Runtime::new();
        let finished = Rc::new(std::cell::Cell::new(None));
        let f = finished.clone();
        let clock = rt.clone();
        let on_next: Callback = Rc::new(move || f.set(Some(clock.now())));
        let scene =
            SceneController::mount(descriptor, &env(&rt), ChaCha8Rng::seed_from_u64(11), on_next).unwrap();

        rt.advance(0.0);
        scene.trigger().unwrap();
        let mut elapsed = 0.0;
        while finished.get().is_none() && elapsed < 30.0 {
            rt.advance(1.0 / 30.0);
            elapsed += 1.0 / 30.0;
        }
        assert_eq!(scene.phase(), Phase::Transitioning, "{} never finished", descriptor.id);

        scene.unmount();
        assert!(rt.stage.is_empty(), "{} left nodes behind", descriptor.id);
        assert_eq!(rt.scheduler.live_count(), 0, "{} left timelines running", descriptor.id);
        finished.get().unwrap_or_default()
    }

    #[test]
    fn every_scene_finishes_and_cleans_up() {
        for descriptor in lineup() {
            let at = run_scene(&descriptor);
            assert!(at > 1.0, "{} finished too early ({at}s)", descriptor.id);
        }
    }

    #[test]
    fn lineup_order() {
        let ids: Vec<String> = lineup().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, ["welcome", "dark_room", "particles", "cake", "photo"]);
    }

    #[test]
    fn backdrop_keeps_bubbling() {
        let rt = Runtime::new();
        let emitter = backdrop(&rt, AREA, ChaCha8Rng::seed_from_u64(5)).unwrap();
        rt.run_for(6.5, 0.1);
        assert_eq!(emitter.live_count(), 3);
        assert_eq!(emitter.flush(), 3);
        assert!(rt.stage.is_empty());
    }

    #[test]
    fn centering() {
        assert_eq!(center_x(AREA, 10), 35.0);
        assert_eq!(center_x(AREA, 100), 0.0);
    }
}
