//! Three scenes driven through the sequencer with a fake clock.

use std::cell::Cell;
use std::rc::Rc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use ascii_reel::assets::NoAssets;
use ascii_reel::emitter::{Drift, EmissionPolicy, ParticleSpec, VisualAttrs};
use ascii_reel::scene::{Choreography, Phase, SceneContext, SceneDescriptor, SceneEnv, SceneError};
use ascii_reel::scheduler::Runtime;
use ascii_reel::sequencer::{CrossfadeConfig, Sequencer, SequencerState};
use ascii_reel::stage::Node;
use ascii_reel::timeline::{Step, Timeline};
use ascii_reel::types::{Color, NamedColor, Point, TerminalContract};

const TICK: f64 = 0.05;

/// One line of text; on trigger it streams particles and finishes after
/// one second plus a half-second hold.
struct Card {
    text: &'static str,
    performed: Rc<Cell<usize>>,
}

impl Choreography for Card {
    fn mount(&mut self, cx: &mut SceneContext) -> Result<(), SceneError> {
        cx.spawn(Node::text(self.text).at(Point::new(1.0, 1.0)))?;
        Ok(())
    }

    fn perform(&mut self, cx: &mut SceneContext) -> Result<(), SceneError> {
        self.performed.set(self.performed.get() + 1);
        let emitter = cx.emitter(1);
        emitter.start(EmissionPolicy::Interval { period: 0.1 }, |_| ParticleSpec {
            origin: Point::new(5.0, 4.0),
            visual: VisualAttrs {
                shape: '*',
                color: Color::Named(NamedColor::Yellow),
                size: 1.0,
            },
            drift: Drift {
                delta: Point::new(0.0, -3.0),
                ..Drift::default()
            },
            lifespan: 5.0,
            spawn_delay: 0.0,
        })?;
        cx.finale(Timeline::builder().step(Step::wait(1.0)), 0.5)?;
        Ok(())
    }
}

struct Show {
    rt: Runtime,
    seq: Sequencer,
    performed: [Rc<Cell<usize>>; 3],
}

fn show() -> Show {
    let rt = Runtime::new();
    let performed: [Rc<Cell<usize>>; 3] = Default::default();
    let scenes = ["A", "B", "C"]
        .into_iter()
        .zip(performed.iter().cloned())
        .map(|(text, count)| {
            SceneDescriptor::new(text, move || Card {
                text,
                performed: count.clone(),
            })
        })
        .collect();
    let env = SceneEnv {
        runtime: rt.clone(),
        area: TerminalContract {
            width: 20,
            height: 8,
        },
        assets: Rc::new(NoAssets),
        parent: None,
    };
    let seq = Sequencer::start(scenes, env, CrossfadeConfig::default(), ChaCha8Rng::seed_from_u64(21)).unwrap();
    Show { rt, seq, performed }
}

fn at(index: usize) -> SequencerState {
    SequencerState {
        current_index: index,
        is_transitioning: false,
    }
}

#[test]
fn three_scene_walkthrough() {
    let Show { rt, seq, performed } = show();
    assert_eq!(seq.state(), at(0));
    assert_eq!(seq.active().unwrap().id(), "A");

    // A: trigger, let it stream particles, and let its finale hand over.
    let a = seq.active().unwrap();
    assert!(seq.trigger().unwrap());
    rt.run_for(1.0, TICK);
    assert!(a.live_particles() > 5);
    rt.run_for(0.6, TICK);
    assert!(seq.state().is_transitioning);
    rt.run_for(1.2, TICK);

    assert_eq!(seq.state(), at(1));
    assert_eq!(a.phase(), Phase::Transitioning);
    assert_eq!(a.live_particles(), 0);
    assert!(!rt.stage.contains(a.root()));
    // Only B's root and its line of text remain; nothing of A is still ticking.
    assert_eq!(rt.stage.len(), 2);
    assert_eq!(rt.scheduler.live_count(), 0);

    // B: a double press performs once and advances once.
    assert!(seq.trigger().unwrap());
    assert!(!seq.trigger().unwrap());
    rt.run_for(2.8, TICK);
    assert_eq!(performed[1].get(), 1);
    assert_eq!(seq.state(), at(2));

    // C: the last scene finishes and stays put.
    let c = seq.active().unwrap();
    assert!(seq.trigger().unwrap());
    rt.run_for(2.0, TICK);
    assert_eq!(c.phase(), Phase::Transitioning);
    assert!(!seq.advance().unwrap());
    rt.run_for(1.0, TICK);
    assert_eq!(seq.state(), at(2));
    assert_eq!(performed.iter().map(|p| p.get()).collect::<Vec<_>>(), [1, 1, 1]);

    seq.shutdown();
    assert!(rt.stage.is_empty());
    assert_eq!(rt.scheduler.live_count(), 0);
}

#[test]
fn advance_during_a_crossfade_is_ignored() {
    let Show { rt, seq, .. } = show();
    assert!(seq.advance().unwrap());
    rt.run_for(0.2, TICK);
    assert!(!seq.advance().unwrap());
    rt.run_for(1.0, TICK);
    assert_eq!(seq.state(), at(1));
}

#[test]
fn untriggered_scene_waits_forever() {
    let Show { rt, seq, performed } = show();
    rt.run_for(30.0, 0.5);
    assert_eq!(seq.state(), at(0));
    assert_eq!(performed[0].get(), 0);
    assert_eq!(seq.active().unwrap().phase(), Phase::Idle);
}
