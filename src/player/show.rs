use std::rc::Rc;

use anyhow::{Context, Result};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::assets::AssetLoader;
use crate::config::ShowConfig;
use crate::emitter::Emitter;
use crate::scene::{Phase, SceneDescriptor, SceneEnv};
use crate::scenes;
use crate::scheduler::Runtime;
use crate::sequencer::{Sequencer, SequencerState};
use crate::stage::Stage;
use crate::types::TerminalContract;

/// A running show without a terminal: the clock, the scene sequence and the
/// backdrop. The player drives one in real time; `dry-run` drives one at a
/// fixed step.
pub struct Show {
    runtime: Runtime,
    sequencer: Sequencer,
    backdrop: Emitter,
    area: TerminalContract,
    seed: u64,
}

/// Where the show is, for the status line and the dry-run log.
#[derive(Debug, Clone, PartialEq)]
pub struct ShowStatus {
    pub scene: String,
    pub index: usize,
    pub total: usize,
    pub phase: Option<Phase>,
    pub is_transitioning: bool,
}

impl Show {
    pub fn new(config: &ShowConfig, assets: Rc<dyn AssetLoader>, scenes: Vec<SceneDescriptor>) -> Result<Self> {
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let area = config.contract();
        let runtime = Runtime::new();

        let backdrop = scenes::backdrop(&runtime, area, ChaCha8Rng::seed_from_u64(rng.next_u64()))
            .context("failed to start the backdrop")?;
        let env = SceneEnv {
            runtime: runtime.clone(),
            area,
            assets,
            parent: None,
        };
        let sequencer = Sequencer::start(scenes, env, config.crossfade, ChaCha8Rng::seed_from_u64(rng.next_u64()))
            .context("failed to start the show")?;

        tracing::info!(seed, width = area.width, height = area.height, "show started");
        Ok(Show {
            runtime,
            sequencer,
            backdrop,
            area,
            seed,
        })
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn stage(&self) -> &Stage {
        &self.runtime.stage
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn area(&self) -> TerminalContract {
        self.area
    }

    /// The seed every random stream in this show was split from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn advance(&self, dt: f64) {
        self.runtime.advance(dt);
    }

    /// The viewer's advance action. Returns whether a scene started; one
    /// that fails to start has already been logged and skipped.
    pub fn trigger(&self) -> bool {
        self.sequencer.trigger().unwrap_or(false)
    }

    pub fn state(&self) -> SequencerState {
        self.sequencer.state()
    }

    pub fn status(&self) -> ShowStatus {
        let state = self.sequencer.state();
        let active = self.sequencer.active();
        ShowStatus {
            scene: active.as_ref().map(|s| s.id().to_string()).unwrap_or_default(),
            index: state.current_index,
            total: self.sequencer.len(),
            phase: active.map(|s| s.phase()),
            is_transitioning: state.is_transitioning,
        }
    }

    /// True once the last scene has played out, or no scene is left that
    /// could be shown.
    pub fn is_over(&self) -> bool {
        let status = self.status();
        match status.phase {
            Some(phase) => status.index + 1 == status.total && phase == Phase::Transitioning,
            None => !status.is_transitioning,
        }
    }

    /// Tear down the mounted scene and the backdrop.
    pub fn stop(&self) {
        self.sequencer.shutdown();
        let flushed = self.backdrop.flush();
        tracing::debug!(flushed, "backdrop cleared");
    }
}
