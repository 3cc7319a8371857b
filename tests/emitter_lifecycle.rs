use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use ascii_reel::emitter::{effects, Drift, EmissionPolicy, Emitter, ParticleSpec, VisualAttrs};
use ascii_reel::scheduler::Runtime;
use ascii_reel::stage::Node;
use ascii_reel::types::{Color, Point, TerminalContract};

fn spark(_: &mut ChaCha8Rng) -> ParticleSpec {
    ParticleSpec {
        origin: Point::new(3.0, 3.0),
        visual: VisualAttrs {
            shape: '+',
            color: Color::rgb(255, 200, 0),
            size: 1.0,
        },
        drift: Drift::default(),
        lifespan: 3.0,
        spawn_delay: 0.0,
    }
}

#[test]
fn stopped_particles_finish_on_their_own() {
    let rt = Runtime::new();
    rt.stage.insert(None, Node::text("title")).unwrap();
    let baseline = rt.stage.len();

    let emitter = Emitter::new(&rt, ChaCha8Rng::seed_from_u64(1)).label("sparks");
    let handle = emitter.start(EmissionPolicy::Interval { period: 0.5 }, spark).unwrap();
    rt.run_for(1.6, 0.1);
    handle.stop();

    assert_eq!(handle.spawned(), 3);
    assert_eq!(emitter.live_count(), 3);
    assert_eq!(rt.stage.len(), baseline + 3);

    // Nothing new after the stop, and every particle removes itself.
    rt.run_for(3.5, 0.1);
    assert_eq!(handle.spawned(), 3);
    assert_eq!(emitter.live_count(), 0);
    assert_eq!(rt.stage.len(), baseline);
    assert_eq!(rt.scheduler.live_count(), 0);
}

#[test]
fn flush_is_immediate() {
    let rt = Runtime::new();
    let area = TerminalContract {
        width: 40,
        height: 12,
    };
    let emitter = Emitter::new(&rt, ChaCha8Rng::seed_from_u64(2));
    emitter
        .start(EmissionPolicy::Burst { count: 12, stagger: 0.05 }, effects::balloons(area))
        .unwrap();
    rt.run_for(1.0, 0.1);
    assert_eq!(emitter.live_count(), 12);

    assert_eq!(emitter.flush(), 12);
    assert!(rt.stage.is_empty());
    assert_eq!(rt.scheduler.live_count(), 0);
}

#[test]
fn burst_schedule_exhausts() {
    let rt = Runtime::new();
    let emitter = Emitter::new(&rt, ChaCha8Rng::seed_from_u64(3));
    let handle = emitter
        .start(EmissionPolicy::Burst { count: 4, stagger: 0.25 }, spark)
        .unwrap();
    rt.run_for(0.6, 0.1);
    assert_eq!(handle.spawned(), 3);
    assert!(!handle.is_exhausted());
    rt.run_for(0.3, 0.1);
    assert_eq!(handle.spawned(), 4);
    assert!(handle.is_exhausted());
}

#[test]
fn bad_policies_are_rejected() {
    let rt = Runtime::new();
    let emitter = Emitter::new(&rt, ChaCha8Rng::seed_from_u64(4));
    assert!(emitter.start(EmissionPolicy::Interval { period: 0.0 }, spark).is_err());
    assert!(emitter.start(EmissionPolicy::Burst { count: 3, stagger: -1.0 }, spark).is_err());
}
