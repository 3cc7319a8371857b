//! Sequencer: the linear scene state machine.
//!
//! Holds the ordered scene list, mounts exactly one scene at a time and
//! cross-fades between them. `advance` is the only way forward; it is
//! ignored while a cross-fade is running and at the last scene. A scene that
//! finishes (or is skipped) while it is still fading in moves on as soon as
//! the fade ends. A scene that fails to mount is skipped.
//!
//! Cross-fade order:
//! 1. fade the current scene root to opacity 0
//! 2. unmount the old scene
//! 3. mount the next scene at opacity 0
//! 4. fade its root to opacity 1, then clear `is_transitioning`

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::scene::{SceneController, SceneDescriptor, SceneEnv, SceneError};
use crate::stage::{EntityId, Prop, Value};
use crate::timeline::{Callback, Ease, Step, Timeline};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossfadeConfig {
    /// Seconds for each half of the cross-fade.
    pub duration: f64,
    pub ease: Ease,
}

impl Default for CrossfadeConfig {
    fn default() -> Self {
        CrossfadeConfig {
            duration: 0.5,
            ease: Ease::PowerInOut(2.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerState {
    pub current_index: usize,
    pub is_transitioning: bool,
}

struct Inner {
    scenes: Vec<SceneDescriptor>,
    state: SequencerState,
    active: Option<SceneController>,
    env: SceneEnv,
    crossfade: CrossfadeConfig,
    rng: ChaCha8Rng,
    fade: Option<Timeline>,
    /// The mounted scene is fading in.
    incoming: bool,
    /// The incoming scene asked to move on before its fade finished.
    pending_advance: bool,
    shut_down: bool,
}

#[derive(Clone)]
pub struct Sequencer(Rc<RefCell<Inner>>);

impl Sequencer {
    /// Mount the first scene at full opacity.
    pub fn start(
        scenes: Vec<SceneDescriptor>,
        env: SceneEnv,
        crossfade: CrossfadeConfig,
        rng: ChaCha8Rng,
    ) -> Result<Self, SceneError> {
        if scenes.is_empty() {
            return Err(SceneError::NoScenes);
        }
        let sequencer = Sequencer(Rc::new(RefCell::new(Inner {
            scenes,
            state: SequencerState {
                current_index: 0,
                is_transitioning: false,
            },
            active: None,
            env,
            crossfade,
            rng,
            fade: None,
            incoming: false,
            pending_advance: false,
            shut_down: false,
        })));
        sequencer.mount_from(0, 1.0)?;
        Ok(sequencer)
    }

    pub fn state(&self) -> SequencerState {
        self.0.borrow().state
    }

    pub fn len(&self) -> usize {
        self.0.borrow().scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn scene_ids(&self) -> Vec<String> {
        self.0.borrow().scenes.iter().map(|s| s.id.clone()).collect()
    }

    /// The mounted scene, if any.
    pub fn active(&self) -> Option<SceneController> {
        self.0.borrow().active.clone()
    }

    /// Forward the viewer's advance action to the mounted scene.
    pub fn trigger(&self) -> Result<bool, SceneError> {
        match self.active() {
            Some(scene) => scene.trigger(),
            None => Ok(false),
        }
    }

    /// Cross-fade to the next scene. Returns `Ok(false)` when ignored.
    pub fn advance(&self) -> Result<bool, SceneError> {
        let (root, runtime, crossfade) = {
            let mut inner = self.0.borrow_mut();
            if inner.shut_down {
                return Ok(false);
            }
            if inner.state.is_transitioning {
                tracing::debug!("advance ignored: cross-fade in progress");
                return Ok(false);
            }
            if inner.state.current_index + 1 >= inner.scenes.len() {
                tracing::debug!(index = inner.state.current_index, "advance ignored: last scene");
                return Ok(false);
            }
            let Some(root) = inner.active.as_ref().map(SceneController::root) else {
                return Ok(false);
            };
            inner.state.is_transitioning = true;
            (root, inner.env.runtime.clone(), inner.crossfade)
        };

        let weak = Rc::downgrade(&self.0);
        let fade_out = Timeline::builder()
            .label("crossfade:out")
            .step(
                Step::to(root, crossfade.duration)
                    .prop(Prop::Opacity, 0.0)
                    .ease(crossfade.ease),
            )
            .on_complete(move || {
                if let Some(inner) = weak.upgrade() {
                    Sequencer(inner).swap();
                }
            })
            .build(&runtime);

        let mut inner = self.0.borrow_mut();
        match fade_out {
            Ok(timeline) => {
                inner.fade = Some(timeline);
                Ok(true)
            }
            Err(e) => {
                inner.state.is_transitioning = false;
                Err(e.into())
            }
        }
    }

    /// Tear down the mounted scene and stop any cross-fade. Further calls to
    /// `advance` and `trigger` are ignored.
    pub fn shutdown(&self) {
        let (fade, active) = {
            let mut inner = self.0.borrow_mut();
            if inner.shut_down {
                return;
            }
            inner.shut_down = true;
            inner.state.is_transitioning = false;
            inner.pending_advance = false;
            (inner.fade.take(), inner.active.take())
        };
        if let Some(fade) = fade {
            fade.cancel();
        }
        if let Some(scene) = active {
            scene.unmount();
        }
        tracing::info!("show stopped");
    }

    fn swap(&self) {
        let (old, next) = {
            let mut inner = self.0.borrow_mut();
            if inner.shut_down {
                return;
            }
            (inner.active.take(), inner.state.current_index + 1)
        };
        if let Some(old) = old {
            old.unmount();
        }

        let root = match self.mount_from(next, 0.0) {
            Ok(root) => root,
            Err(_) => {
                tracing::error!("no scene left that mounts, the show ends here");
                self.0.borrow_mut().state.is_transitioning = false;
                return;
            }
        };
        self.0.borrow_mut().incoming = true;

        let (runtime, crossfade) = {
            let inner = self.0.borrow();
            (inner.env.runtime.clone(), inner.crossfade)
        };
        let weak: Weak<RefCell<Inner>> = Rc::downgrade(&self.0);
        let fade_in = Timeline::builder()
            .label("crossfade:in")
            .step(
                Step::to(root, crossfade.duration)
                    .prop(Prop::Opacity, 1.0)
                    .ease(crossfade.ease),
            )
            .on_complete(move || {
                if let Some(inner) = weak.upgrade() {
                    Sequencer(inner).settle();
                }
            })
            .build(&runtime);

        match fade_in {
            Ok(timeline) => self.0.borrow_mut().fade = Some(timeline),
            Err(e) => {
                tracing::error!("cross-fade failed: {e}");
                runtime.stage.set(root, Prop::Opacity, Value::Number(1.0));
                self.settle();
            }
        }
    }

    /// The fade-in is over: accept advances again, and pass on an advance
    /// the incoming scene asked for in the meantime.
    fn settle(&self) {
        let pending = {
            let mut inner = self.0.borrow_mut();
            inner.state.is_transitioning = false;
            inner.incoming = false;
            inner.fade = None;
            std::mem::take(&mut inner.pending_advance)
        };
        if pending {
            tracing::debug!("passing on an advance requested during the fade-in");
            if let Err(e) = self.advance() {
                tracing::error!("advance failed: {e}");
            }
        }
    }

    /// A mounted scene is done with its turn. Requests from a scene that is
    /// no longer current, or that is already fading out, are dropped.
    fn request_advance(&self, index: usize) {
        {
            let mut inner = self.0.borrow_mut();
            if inner.shut_down || inner.state.current_index != index {
                return;
            }
            if inner.state.is_transitioning {
                if inner.incoming {
                    inner.pending_advance = true;
                }
                return;
            }
        }
        if let Err(e) = self.advance() {
            tracing::error!("advance failed: {e}");
        }
    }

    /// Mount the first scene from `index` on that mounts, skipping and
    /// logging the ones that fail. Errors only when none is left.
    fn mount_from(&self, mut index: usize, opacity: f64) -> Result<EntityId, SceneError> {
        let mut last = SceneError::NoScenes;
        while index < self.len() {
            match self.mount(index, opacity) {
                Ok(root) => return Ok(root),
                Err(e) => {
                    tracing::error!(index, "failed to mount scene, skipping it: {e}");
                    last = e;
                    index += 1;
                }
            }
        }
        Err(last)
    }

    /// Mount scene `index` with its root at `opacity`.
    fn mount(&self, index: usize, opacity: f64) -> Result<EntityId, SceneError> {
        let (descriptor, env, rng) = {
            let mut inner = self.0.borrow_mut();
            let descriptor = inner.scenes.get(index).cloned().ok_or(SceneError::NoScenes)?;
            let rng = ChaCha8Rng::seed_from_u64(inner.rng.next_u64());
            (descriptor, inner.env.clone(), rng)
        };

        let weak = Rc::downgrade(&self.0);
        let on_next: Callback = Rc::new(move || {
            if let Some(inner) = weak.upgrade() {
                Sequencer(inner).request_advance(index);
            }
        });

        let scene = SceneController::mount(&descriptor, &env, rng, on_next)?;
        let root = scene.root();
        env.runtime.stage.set(root, Prop::Opacity, Value::Number(opacity));

        let total = {
            let mut inner = self.0.borrow_mut();
            inner.active = Some(scene);
            inner.state.current_index = index;
            inner.scenes.len()
        };
        tracing::info!(scene = %descriptor.id, index, total, "scene mounted");
        Ok(root)
    }
}

impl std::fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("Sequencer")
            .field("state", &inner.state)
            .field("scenes", &inner.scenes.len())
            .finish_non_exhaustive()
    }
}
