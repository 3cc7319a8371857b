//! Emitter: short-lived decorative entities.
//!
//! Every floating thing in the show (particles, bubbles, sparkles, balloons,
//! hearts) goes through here: a `ParticleSpec` factory describes one entity,
//! an `EmissionPolicy` says when to make the next one. Each particle is a
//! stage node plus its own timeline whose last step removes the node, so
//! particles finish on their own after `stop()`. `flush()` is the forced
//! path used on scene teardown.

pub mod effects;

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use crate::scheduler::Runtime;
use crate::stage::{EntityId, Node, Prop};
use crate::timeline::{Ease, Step, Timeline, TimelineError};
use crate::types::{Color, Point};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EmissionPolicy {
    /// One spawn every `period` seconds, starting one period after `start`,
    /// until stopped.
    Interval { period: f64 },
    /// `count` spawns, the i-th at `i * stagger`, then done.
    Burst { count: usize, stagger: f64 },
}

#[derive(Debug, Error)]
pub enum EmitterError {
    #[error("emission period must be positive and finite (got {0})")]
    InvalidPeriod(f64),
    #[error("burst stagger must be non-negative and finite (got {0})")]
    InvalidStagger(f64),
    #[error(transparent)]
    Timeline(#[from] TimelineError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualAttrs {
    pub shape: char,
    pub color: Color,
    /// Base scale; the drift's growth multiplies it.
    pub size: f64,
}

/// How a particle moves and fades over its life.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drift {
    /// Total displacement from the origin, in cells.
    pub delta: Point,
    pub ease: Ease,
    /// Opacity at spawn and at death.
    pub opacity: (f64, f64),
    /// Scale multipliers at spawn and at death.
    pub growth: (f64, f64),
}

impl Default for Drift {
    fn default() -> Self {
        Drift {
            delta: Point::default(),
            ease: Ease::Linear,
            opacity: (1.0, 1.0),
            growth: (1.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSpec {
    /// Spawn position relative to the emitter's parent node.
    pub origin: Point,
    pub visual: VisualAttrs,
    pub drift: Drift,
    /// Seconds from appearing to removal.
    pub lifespan: f64,
    /// Seconds between the spawn and the particle appearing.
    pub spawn_delay: f64,
}

type Factory = Box<dyn FnMut(&mut ChaCha8Rng) -> ParticleSpec>;
type LiveMap = RefCell<BTreeMap<EntityId, Timeline>>;

struct Spawner {
    runtime: Runtime,
    parent: Option<EntityId>,
    layer: i32,
    label: String,
    rng: Rc<RefCell<ChaCha8Rng>>,
    factory: RefCell<Factory>,
    live: Rc<LiveMap>,
    spawned: Cell<usize>,
    stopped: Cell<bool>,
}

impl Spawner {
    fn spawn(&self) {
        if self.stopped.get() {
            return;
        }
        let spec = {
            let mut rng = self.rng.borrow_mut();
            let mut factory = self.factory.borrow_mut();
            (factory.as_mut())(&mut *rng)
        };

        let VisualAttrs { shape, color, size } = spec.visual;
        let drift = spec.drift;
        let node = Node::glyph(shape)
            .layer(self.layer)
            .at(spec.origin)
            .fg(color)
            .with(Prop::Opacity, drift.opacity.0)
            .with(Prop::Scale, size * drift.growth.0)
            .with(Prop::Visible, false);
        let Some(id) = self.runtime.stage.insert(self.parent, node) else {
            tracing::debug!(emitter = %self.label, "parent left the stage; spawn skipped");
            return;
        };

        let live: Weak<LiveMap> = Rc::downgrade(&self.live);
        let step = Step::to(id, spec.lifespan.max(0.0))
            .from_value(Prop::Visible, true)
            .prop(Prop::X, spec.origin.x + drift.delta.x)
            .prop(Prop::Y, spec.origin.y + drift.delta.y)
            .prop(Prop::Opacity, drift.opacity.1)
            .prop(Prop::Scale, size * drift.growth.1)
            .ease(drift.ease)
            .then_remove()
            .on_complete(move || {
                if let Some(live) = live.upgrade() {
                    live.borrow_mut().remove(&id);
                }
            });

        let built = Timeline::builder()
            .label(format!("{}:particle", self.label))
            .delay(spec.spawn_delay.max(0.0))
            .step(step)
            .build(&self.runtime);
        match built {
            Ok(timeline) => {
                self.live.borrow_mut().insert(id, timeline);
                self.spawned.set(self.spawned.get() + 1);
                tracing::trace!(emitter = %self.label, particle = %id, "spawned");
            }
            Err(e) => {
                tracing::warn!(emitter = %self.label, "dropping particle: {e}");
                self.runtime.stage.remove(id);
            }
        }
    }

    fn flush(&self) -> usize {
        let drained = std::mem::take(&mut *self.live.borrow_mut());
        let count = drained.len();
        for (id, timeline) in drained {
            timeline.cancel();
            self.runtime.stage.remove(id);
        }
        count
    }
}

/// Handle to one `start` call. Clones share the same schedule.
#[derive(Clone)]
pub struct EmitterHandle {
    spawner: Rc<Spawner>,
    schedule: Timeline,
}

impl EmitterHandle {
    /// Stop spawning. Particles already out keep going and remove themselves.
    pub fn stop(&self) {
        if !self.spawner.stopped.replace(true) {
            tracing::debug!(
                emitter = %self.spawner.label,
                spawned = self.spawner.spawned.get(),
                "emitter stopped"
            );
        }
        self.schedule.cancel();
    }

    /// Stop, then remove every live particle without letting it finish.
    /// Returns how many were removed.
    pub fn flush(&self) -> usize {
        self.stop();
        self.spawner.flush()
    }

    pub fn live_count(&self) -> usize {
        self.spawner.live.borrow().len()
    }

    /// Total spawns so far.
    pub fn spawned(&self) -> usize {
        self.spawner.spawned.get()
    }

    /// True once stopped or, for a burst, once the last spawn has happened.
    pub fn is_exhausted(&self) -> bool {
        self.spawner.stopped.get() || self.schedule.is_finished()
    }
}

/// Spawns particles under one parent node, sharing one random source across
/// every `start`.
pub struct Emitter {
    runtime: Runtime,
    parent: Option<EntityId>,
    layer: i32,
    label: String,
    rng: Rc<RefCell<ChaCha8Rng>>,
    handles: RefCell<Vec<EmitterHandle>>,
}

impl Emitter {
    pub fn new(runtime: &Runtime, rng: ChaCha8Rng) -> Self {
        Emitter {
            runtime: runtime.clone(),
            parent: None,
            layer: 0,
            label: "emitter".to_string(),
            rng: Rc::new(RefCell::new(rng)),
            handles: RefCell::new(Vec::new()),
        }
    }

    /// Insert particles under `parent` so they move and fade with it.
    pub fn under(mut self, parent: EntityId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Begin emitting. Each call owns exactly one spawn schedule.
    pub fn start<F>(&self, policy: EmissionPolicy, factory: F) -> Result<EmitterHandle, EmitterError>
    where
        F: FnMut(&mut ChaCha8Rng) -> ParticleSpec + 'static,
    {
        let spawner = Rc::new(Spawner {
            runtime: self.runtime.clone(),
            parent: self.parent,
            layer: self.layer,
            label: self.label.clone(),
            rng: self.rng.clone(),
            factory: RefCell::new(Box::new(factory)),
            live: Rc::new(RefCell::new(BTreeMap::new())),
            spawned: Cell::new(0),
            stopped: Cell::new(false),
        });

        let builder = Timeline::builder().label(format!("{}:schedule", self.label));
        let schedule = match policy {
            EmissionPolicy::Interval { period } => {
                if !period.is_finite() || period <= 0.0 {
                    return Err(EmitterError::InvalidPeriod(period));
                }
                let s = spawner.clone();
                builder
                    .step(Step::wait(period).on_complete(move || s.spawn()))
                    .repeat_forever()
                    .build(&self.runtime)?
            }
            EmissionPolicy::Burst { count, stagger } => {
                if !stagger.is_finite() || stagger < 0.0 {
                    return Err(EmitterError::InvalidStagger(stagger));
                }
                let steps = (0..count).map(|i| {
                    let s = spawner.clone();
                    Step::call(move || s.spawn()).at(i as f64 * stagger)
                });
                builder.steps(steps).build(&self.runtime)?
            }
        };

        tracing::debug!(emitter = %self.label, ?policy, "emitter started");
        let handle = EmitterHandle { spawner, schedule };
        let mut handles = self.handles.borrow_mut();
        handles.retain(|h| !h.is_exhausted() || h.live_count() > 0);
        handles.push(handle.clone());
        Ok(handle)
    }

    /// Schedules still tracked: running ones and spent ones with particles
    /// left on stage.
    pub fn schedules(&self) -> usize {
        self.handles.borrow().len()
    }

    /// Stop every schedule started from this emitter.
    pub fn stop(&self) {
        for handle in self.handles.borrow().iter() {
            handle.stop();
        }
    }

    /// Stop everything and remove every live particle. Returns how many were
    /// removed.
    pub fn flush(&self) -> usize {
        let handles = self.handles.borrow().clone();
        handles.iter().map(EmitterHandle::flush).sum()
    }

    pub fn live_count(&self) -> usize {
        self.handles.borrow().iter().map(EmitterHandle::live_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::types::NamedColor;

    fn dot(lifespan: f64) -> impl FnMut(&mut ChaCha8Rng) -> ParticleSpec {
        move |_| ParticleSpec {
            origin: Point::new(4.0, 10.0),
            visual: VisualAttrs {
                shape: 'o',
                color: Color::Named(NamedColor::Cyan),
                size: 1.0,
            },
            drift: Drift {
                delta: Point::new(0.0, -10.0),
                ..Drift::default()
            },
            lifespan,
            spawn_delay: 0.0,
        }
    }

    fn emitter(rt: &Runtime) -> Emitter {
        Emitter::new(rt, ChaCha8Rng::seed_from_u64(7)).label("test")
    }

    #[test]
    fn interval_spawns_once_per_period() {
        let rt = Runtime::new();
        let e = emitter(&rt);
        let handle = e.start(EmissionPolicy::Interval { period: 0.5 }, dot(10.0)).unwrap();

        rt.advance(0.4);
        assert_eq!(handle.spawned(), 0);
        rt.run_for(1.2, 0.1);
        assert_eq!(handle.spawned(), 3);
        assert_eq!(handle.live_count(), 3);
        assert_eq!(rt.stage.len(), 3);
        handle.flush();
    }

    #[test]
    fn burst_spawns_on_the_stagger_then_stops() {
        let rt = Runtime::new();
        let e = emitter(&rt);
        let handle = e
            .start(EmissionPolicy::Burst { count: 4, stagger: 0.25 }, dot(10.0))
            .unwrap();

        rt.advance(0.0);
        assert_eq!(handle.spawned(), 1);
        rt.advance(0.5);
        assert_eq!(handle.spawned(), 3);
        rt.advance(1.0);
        assert_eq!(handle.spawned(), 4);
        assert!(handle.is_exhausted());
        handle.stop();
        assert_eq!(handle.live_count(), 4);
    }

    #[test]
    fn particles_move_then_remove_themselves() {
        let rt = Runtime::new();
        let e = emitter(&rt);
        let handle = e
            .start(EmissionPolicy::Burst { count: 1, stagger: 0.0 }, dot(2.0))
            .unwrap();

        rt.advance(0.0);
        rt.advance(1.0);
        let sprites = rt.stage.snapshot();
        assert_eq!(sprites.len(), 1);
        assert!((sprites[0].position.y - 5.0).abs() < 1e-9);

        rt.advance(1.5);
        assert_eq!(handle.live_count(), 0);
        assert!(rt.stage.is_empty());
        assert_eq!(rt.scheduler.live_count(), 0);
    }

    #[test]
    fn spawn_delay_hides_the_particle_until_it_starts() {
        let rt = Runtime::new();
        let e = emitter(&rt);
        let mut base = dot(1.0);
        e.start(EmissionPolicy::Burst { count: 1, stagger: 0.0 }, move |rng| ParticleSpec {
            spawn_delay: 0.5,
            ..base(rng)
        })
        .unwrap();

        rt.advance(0.25);
        assert_eq!(rt.stage.len(), 1);
        assert!(rt.stage.snapshot().is_empty());
        rt.advance(0.5);
        assert_eq!(rt.stage.snapshot().len(), 1);
    }

    #[test]
    fn flush_removes_live_particles_without_waiting() {
        let rt = Runtime::new();
        let root = rt.stage.insert(None, Node::group()).unwrap();
        let e = emitter(&rt).under(root);
        e.start(EmissionPolicy::Interval { period: 0.1 }, dot(5.0)).unwrap();
        e.start(EmissionPolicy::Burst { count: 3, stagger: 0.0 }, dot(5.0)).unwrap();

        rt.run_for(0.55, 0.05);
        assert_eq!(e.live_count(), 8);
        assert_eq!(e.flush(), 8);
        assert_eq!(e.live_count(), 0);
        assert_eq!(rt.stage.len(), 1);

        rt.run_for(1.0, 0.1);
        assert_eq!(rt.stage.len(), 1);
        assert_eq!(rt.scheduler.live_count(), 0);
    }

    #[test]
    fn spent_schedules_are_dropped_on_the_next_start() {
        let rt = Runtime::new();
        let e = emitter(&rt);
        let burst = EmissionPolicy::Burst { count: 2, stagger: 0.1 };
        let first = e.start(burst, dot(1.0)).unwrap();
        rt.run_for(0.5, 0.1);
        assert!(first.is_exhausted());

        // Particles of the first burst are still alive, so it is kept.
        e.start(burst, dot(1.0)).unwrap();
        assert_eq!(e.schedules(), 2);

        rt.run_for(2.0, 0.1);
        let stopped = e.start(EmissionPolicy::Interval { period: 0.5 }, dot(1.0)).unwrap();
        assert_eq!(e.schedules(), 1);
        stopped.stop();
        e.start(burst, dot(1.0)).unwrap();
        assert_eq!(e.schedules(), 1);
        assert_eq!(rt.stage.len(), 0);
    }

    #[test]
    fn stop_is_idempotent() {
        let rt = Runtime::new();
        let e = emitter(&rt);
        let handle = e.start(EmissionPolicy::Interval { period: 1.0 }, dot(1.0)).unwrap();
        handle.stop();
        handle.stop();
        rt.run_for(3.0, 0.5);
        assert_eq!(handle.spawned(), 0);
    }

    #[test]
    fn invalid_policies_are_rejected() {
        let rt = Runtime::new();
        let e = emitter(&rt);
        assert!(matches!(
            e.start(EmissionPolicy::Interval { period: 0.0 }, dot(1.0)),
            Err(EmitterError::InvalidPeriod(_))
        ));
        assert!(matches!(
            e.start(EmissionPolicy::Burst { count: 2, stagger: -1.0 }, dot(1.0)),
            Err(EmitterError::InvalidStagger(_))
        ));
    }
}
