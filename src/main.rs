use std::path::PathBuf;
use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use clap::Parser;

use pocket_arcade::{GameConfig, GamePlugin};

/// Headless arcade billiards simulation.
#[derive(Parser, Debug)]
#[command(name = "pocket_arcade")]
struct Args {
    /// Base config file (RON); missing files fall back to built-in defaults.
    #[arg(long, default_value = "assets/config/game.ron")]
    config: PathBuf,
    /// Optional override file layered on top of the base config.
    #[arg(long)]
    config_local: Option<PathBuf>,
    /// Level id to load (overrides default_level_id from the config).
    #[arg(long)]
    level: Option<String>,
    /// Exit after this many seconds.
    #[arg(long)]
    auto_close: Option<f32>,
}

fn main() {
    let args = Args::parse();
    let mut layers = vec![args.config.clone()];
    if let Some(local) = &args.config_local {
        layers.push(local.clone());
    }
    let (mut cfg, used, errors) = GameConfig::load_layered(&layers);
    for e in &errors {
        eprintln!("config: {e}");
    }
    if !used.is_empty() {
        eprintln!("config layers: {}", used.join(", "));
    }
    for w in cfg.validate() {
        eprintln!("config warning: {w}");
    }
    if let Some(level) = args.level {
        cfg.default_level_id = level;
    }
    if let Some(secs) = args.auto_close {
        cfg.session.auto_close = secs;
    }

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(
            Duration::from_secs_f64(1.0 / 60.0),
        )))
        .add_plugins(LogPlugin::default())
        .insert_resource(cfg)
        .add_plugins(GamePlugin)
        .run();
}
