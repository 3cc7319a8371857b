pub mod assets;
pub mod config;
pub mod emitter;
pub mod player;
pub mod renderer;
pub mod scene;
pub mod scenes;
pub mod scheduler;
pub mod sequencer;
pub mod stage;
pub mod timeline;
pub mod types;
