use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process;
use std::rc::Rc;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

use ascii_reel::{
    assets::DirAssets,
    config::ShowConfig,
    player::{Player, Show},
    scenes,
};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

const PLAY_USAGE: &str = "ascii-reel play [--config <config.json>]";
const DRY_RUN_USAGE: &str = "ascii-reel dry-run [--config <config.json>] [--seconds <n>]";
const SCENES_USAGE: &str = "ascii-reel scenes";

const DEFAULT_FILTER: &str = "ascii_reel=info";
/// Clock step used by `dry-run`.
const DRY_RUN_STEP: f64 = 1.0 / 30.0;

fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);

    match args.next().as_deref() {
        Some("play") => {
            let opts = Options::parse(args, PLAY_USAGE)?;
            play(&opts)
        }
        Some("dry-run") => {
            let opts = Options::parse(args, DRY_RUN_USAGE)?;
            dry_run(&opts)
        }
        Some("scenes") => {
            for (i, scene) in scenes::lineup().iter().enumerate() {
                println!("{}. {}", i + 1, scene.id);
            }
            Ok(())
        }
        _ => bail!(
            "ascii-reel: a scripted sequence of animated terminal scenes\n\nUsage:\n  {PLAY_USAGE}\n  {DRY_RUN_USAGE}\n  {SCENES_USAGE}"
        ),
    }
}

#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    seconds: Option<f64>,
}

impl Options {
    fn parse(mut args: impl Iterator<Item = String>, usage: &str) -> Result<Self> {
        let mut opts = Options::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    opts.config = Some(args.next().context(usage.to_string())?.into());
                }
                "--seconds" if usage == DRY_RUN_USAGE => {
                    let value = args.next().context(usage.to_string())?;
                    let seconds: f64 = value
                        .parse()
                        .with_context(|| format!("Invalid --seconds value `{value}`"))?;
                    if !seconds.is_finite() || seconds <= 0.0 {
                        bail!("--seconds must be positive, got {seconds}");
                    }
                    opts.seconds = Some(seconds);
                }
                other => bail!("Unexpected argument `{other}`\n\nUsage:\n  {usage}"),
            }
        }
        Ok(opts)
    }
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// The terminal belongs to the show while it plays, so logs go to a file.
fn init_file_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_show(config: &ShowConfig) -> Result<Show> {
    let assets = Rc::new(DirAssets::new(&config.asset_dir));
    Show::new(config, assets, scenes::lineup())
}

fn play(opts: &Options) -> Result<()> {
    let config = ShowConfig::load(opts.config.as_deref())?;
    init_file_logging(&config.log_file)?;

    let show = load_show(&config)?;
    let mut player = Player::new(show, &config);
    player.play()
}

/// Run the show headless at a fixed step, pressing advance on every tick,
/// and log each scene change.
fn dry_run(opts: &Options) -> Result<()> {
    init_stderr_logging();
    let config = ShowConfig::load(opts.config.as_deref())?;
    let show = load_show(&config)?;
    let limit = opts.seconds.unwrap_or(120.0);

    let mut elapsed = 0.0;
    let mut last = show.status();
    tracing::info!(scene = %last.scene, seed = show.seed(), "dry run started");
    while elapsed < limit && !show.is_over() {
        show.trigger();
        show.advance(DRY_RUN_STEP);
        elapsed += DRY_RUN_STEP;

        let status = show.status();
        if status.scene != last.scene || status.is_transitioning != last.is_transitioning {
            tracing::info!(
                elapsed,
                scene = %status.scene,
                index = status.index,
                transitioning = status.is_transitioning,
                "show moved"
            );
        }
        last = status;
    }

    let finished = show.is_over();
    let live = show.runtime().scheduler.live_count();
    show.stop();
    if finished {
        tracing::info!(elapsed, "dry run finished");
    } else {
        tracing::warn!(elapsed, scene = %last.scene, live, "dry run stopped before the end");
    }
    Ok(())
}
