//! Headless server shell exercising the scheduler and drawing engine.

use std::path::PathBuf;

use clap::Parser;

mod app;
mod config;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "carve", about = "block-server drawing engine shell")]
struct Args {
    /// TOML config path; built-in defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override: ticks to run before shutdown.
    #[arg(long)]
    ticks: Option<u64>,
    /// Override: total block writes allowed per tick.
    #[arg(long)]
    blocks_per_tick: Option<usize>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => match Config::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::error!("failed to load {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };
    if let Some(t) = args.ticks {
        cfg.run_ticks = t;
    }
    if let Some(b) = args.blocks_per_tick {
        cfg.draw_blocks_per_tick = b;
    }

    app::App::new(cfg).run();
}
