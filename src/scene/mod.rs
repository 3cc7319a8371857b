//! Scene controller.
//!
//! One controller per mounted scene. It owns the scene's root node, every
//! timeline and emitter the scene creates, and a three-phase state machine:
//!
//! ```text
//! Idle --trigger--> Animating --finale completes--> Transitioning
//! ```
//!
//! The trigger is accepted once; later triggers are ignored. Unmount cancels
//! and flushes everything the scene owns and removes its subtree, whatever
//! phase it reached.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use crate::assets::{self, AssetLoader};
use crate::emitter::{Emitter, EmitterError};
use crate::scheduler::Runtime;
use crate::stage::{EntityId, Node, Stage};
use crate::timeline::{Callback, Step, Timeline, TimelineBuilder, TimelineError};
use crate::types::TerminalContract;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Timeline(#[from] TimelineError),
    #[error(transparent)]
    Emitter(#[from] EmitterError),
    #[error("scene root is no longer on stage")]
    Detached,
    #[error("scene `{0}` started without a finale timeline")]
    MissingFinale(String),
    #[error("scene `{0}` declared more than one finale timeline")]
    DuplicateFinale(String),
    #[error("the show has no scenes")]
    NoScenes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Animating,
    Transitioning,
}

/// What starts a scene's choreography.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    /// The viewer's advance key.
    User,
    /// Starts by itself this many seconds after mounting.
    Auto { delay: f64 },
}

/// Per-scene content.
pub trait Choreography {
    fn trigger(&self) -> Trigger {
        Trigger::User
    }

    /// Build the scene's resting state. Entrance animations may start here.
    fn mount(&mut self, cx: &mut SceneContext) -> Result<(), SceneError>;

    /// Run the scene. Must declare exactly one finale with
    /// [`SceneContext::finale`].
    fn perform(&mut self, cx: &mut SceneContext) -> Result<(), SceneError>;
}

pub type SceneFactory = Rc<dyn Fn() -> Box<dyn Choreography>>;

#[derive(Clone)]
pub struct SceneDescriptor {
    pub id: String,
    pub factory: SceneFactory,
}

impl SceneDescriptor {
    pub fn new<C, F>(id: impl Into<String>, factory: F) -> Self
    where
        C: Choreography + 'static,
        F: Fn() -> C + 'static,
    {
        SceneDescriptor {
            id: id.into(),
            factory: Rc::new(move || Box::new(factory()) as Box<dyn Choreography>),
        }
    }
}

impl fmt::Debug for SceneDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneDescriptor").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Everything a scene needs from the show, shared by every mount.
#[derive(Clone)]
pub struct SceneEnv {
    pub runtime: Runtime,
    pub area: TerminalContract,
    pub assets: Rc<dyn AssetLoader>,
    /// Node scene roots are inserted under; top level when `None`.
    pub parent: Option<EntityId>,
}

/// A scene's view of the show while mounted. Timelines and emitters made
/// through it are owned by the scene and torn down with it.
pub struct SceneContext {
    scene: String,
    runtime: Runtime,
    root: EntityId,
    area: TerminalContract,
    assets: Rc<dyn AssetLoader>,
    rng: ChaCha8Rng,
    phase: Rc<Cell<Phase>>,
    on_next: Callback,
    timelines: Vec<Timeline>,
    emitters: Vec<Rc<Emitter>>,
    finale: Option<Timeline>,
}

impl SceneContext {
    pub fn scene(&self) -> &str {
        &self.scene
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn stage(&self) -> &Stage {
        &self.runtime.stage
    }

    pub fn root(&self) -> EntityId {
        self.root
    }

    pub fn area(&self) -> TerminalContract {
        self.area
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Load art by key, or the given stand-in when it cannot be loaded.
    pub fn art(&self, key: &str, fallback: &[&str]) -> Vec<String> {
        assets::load_or_fallback(self.assets.as_ref(), key, fallback)
    }

    /// Insert a node under the scene root.
    pub fn spawn(&self, node: Node) -> Result<EntityId, SceneError> {
        self.spawn_under(self.root, node)
    }

    pub fn spawn_under(&self, parent: EntityId, node: Node) -> Result<EntityId, SceneError> {
        self.runtime.stage.insert(Some(parent), node).ok_or(SceneError::Detached)
    }

    /// Build a timeline owned by this scene.
    pub fn timeline(&mut self, builder: TimelineBuilder) -> Result<Timeline, SceneError> {
        let timeline = builder.build(&self.runtime)?;
        self.timelines.push(timeline.clone());
        Ok(timeline)
    }

    /// Build the timeline whose completion ends the scene. The final state
    /// stays on screen for `hold` seconds before the scene hands over.
    /// Replaces any completion callback already set on `builder`.
    pub fn finale(&mut self, builder: TimelineBuilder, hold: f64) -> Result<Timeline, SceneError> {
        if self.finale.is_some() {
            return Err(SceneError::DuplicateFinale(self.scene.clone()));
        }
        let phase = self.phase.clone();
        let on_next = self.on_next.clone();
        let scene = self.scene.clone();
        let timeline = builder
            .step(Step::wait(hold))
            .on_complete(move || {
                if phase.get() != Phase::Animating {
                    return;
                }
                phase.set(Phase::Transitioning);
                tracing::info!(scene = %scene, "scene finished");
                on_next();
            })
            .build(&self.runtime)?;
        self.timelines.push(timeline.clone());
        self.finale = Some(timeline.clone());
        Ok(timeline)
    }

    /// An emitter whose particles live under the scene root. It gets its own
    /// random stream split off the scene's.
    pub fn emitter(&mut self, layer: i32) -> Rc<Emitter> {
        let label = format!("{}:emitter{}", self.scene, self.emitters.len());
        let rng = ChaCha8Rng::seed_from_u64(self.rng.next_u64());
        let emitter = Rc::new(
            Emitter::new(&self.runtime, rng)
                .under(self.root)
                .layer(layer)
                .label(label),
        );
        self.emitters.push(emitter.clone());
        emitter
    }
}

struct ControllerInner {
    choreography: Box<dyn Choreography>,
    cx: SceneContext,
    unmounted: bool,
}

/// Handle to a mounted scene. Clones refer to the same scene.
#[derive(Clone)]
pub struct SceneController {
    inner: Rc<RefCell<ControllerInner>>,
    phase: Rc<Cell<Phase>>,
    id: Rc<str>,
    root: EntityId,
}

impl SceneController {
    /// Create the scene root, let the choreography build its resting state,
    /// and arm the automatic trigger if the scene has one.
    pub fn mount(
        descriptor: &SceneDescriptor,
        env: &SceneEnv,
        rng: ChaCha8Rng,
        on_next: Callback,
    ) -> Result<Self, SceneError> {
        let root = env
            .runtime
            .stage
            .insert(env.parent, Node::group())
            .ok_or(SceneError::Detached)?;
        let phase = Rc::new(Cell::new(Phase::Idle));
        let mut cx = SceneContext {
            scene: descriptor.id.clone(),
            runtime: env.runtime.clone(),
            root,
            area: env.area,
            assets: env.assets.clone(),
            rng,
            phase: phase.clone(),
            on_next,
            timelines: Vec::new(),
            emitters: Vec::new(),
            finale: None,
        };

        let mut choreography = (descriptor.factory)();
        if let Err(e) = choreography.mount(&mut cx) {
            for timeline in &cx.timelines {
                timeline.cancel();
            }
            for emitter in &cx.emitters {
                emitter.flush();
            }
            env.runtime.stage.remove(root);
            return Err(e);
        }
        let trigger = choreography.trigger();

        let controller = SceneController {
            inner: Rc::new(RefCell::new(ControllerInner {
                choreography,
                cx,
                unmounted: false,
            })),
            phase,
            id: descriptor.id.as_str().into(),
            root,
        };

        if let Trigger::Auto { delay } = trigger {
            let weak: Weak<RefCell<ControllerInner>> = Rc::downgrade(&controller.inner);
            let phase = controller.phase.clone();
            let id = controller.id.clone();
            let timer = match Timeline::builder()
                .label(format!("{}:auto-trigger", descriptor.id))
                .step(Step::wait(delay.max(0.0)))
                .on_complete(move || {
                    let Some(inner) = weak.upgrade() else {
                        return;
                    };
                    let controller = SceneController {
                        inner,
                        phase: phase.clone(),
                        id: id.clone(),
                        root,
                    };
                    if let Err(e) = controller.trigger() {
                        tracing::debug!(scene = %id, "automatic trigger failed: {e}");
                    }
                })
                .build(&env.runtime)
            {
                Ok(timer) => timer,
                Err(e) => {
                    controller.unmount();
                    return Err(e.into());
                }
            };
            controller.inner.borrow_mut().cx.timelines.push(timer);
        }

        tracing::debug!(scene = %descriptor.id, root = %root, ?trigger, "scene mounted");
        Ok(controller)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn root(&self) -> EntityId {
        self.root
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    /// Start the choreography. Returns `Ok(false)` when the scene has
    /// already been triggered or unmounted.
    ///
    /// A scene that fails to start (its `perform` errors or declares no
    /// finale) is skipped: it moves to `Transitioning` and hands over as if
    /// it had finished. The error is still returned.
    pub fn trigger(&self) -> Result<bool, SceneError> {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        if inner.unmounted || self.phase.get() != Phase::Idle {
            tracing::debug!(scene = %self.id, phase = ?self.phase.get(), "trigger ignored");
            return Ok(false);
        }
        self.phase.set(Phase::Animating);
        tracing::info!(scene = %self.id, "scene triggered");

        let started = match inner.choreography.perform(&mut inner.cx) {
            Ok(()) if inner.cx.finale.is_none() => Err(SceneError::MissingFinale(self.id.to_string())),
            other => other,
        };
        let Err(e) = started else {
            return Ok(true);
        };

        self.phase.set(Phase::Transitioning);
        let on_next = inner.cx.on_next.clone();
        drop(guard);
        tracing::error!(scene = %self.id, "scene failed to start, skipping it: {e}");
        on_next();
        Err(e)
    }

    /// Live particles across every emitter the scene owns.
    pub fn live_particles(&self) -> usize {
        self.inner.borrow().cx.emitters.iter().map(|e| e.live_count()).sum()
    }

    /// Tear the scene down: cancel every timeline, flush every emitter and
    /// remove the scene's subtree. Safe to call more than once.
    pub fn unmount(&self) {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        if inner.unmounted {
            return;
        }
        inner.unmounted = true;

        let cx = &mut inner.cx;
        let timelines = cx.timelines.len();
        for timeline in cx.timelines.drain(..) {
            timeline.cancel();
        }
        let flushed: usize = cx.emitters.drain(..).map(|e| e.flush()).sum();
        cx.finale = None;
        let removed = cx.runtime.stage.remove(cx.root);
        tracing::debug!(
            scene = %self.id,
            timelines,
            flushed,
            removed,
            "scene unmounted"
        );
    }
}

impl fmt::Debug for SceneController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneController")
            .field("id", &self.id)
            .field("phase", &self.phase.get())
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}
