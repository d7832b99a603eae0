//! Server-shell configuration loaded from TOML.

use std::error::Error;
use std::path::Path;

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub map_sx: usize,
    pub map_sy: usize,
    pub map_sz: usize,
    /// Main tick cadence for the draw pump.
    pub tick_interval_ms: u64,
    /// Total block writes allowed per tick across all pending operations.
    pub draw_blocks_per_tick: usize,
    /// Wall-clock guard for a single batch call.
    pub max_batch_time_ms: u64,
    /// Undo generations kept per player.
    pub undo_depth: usize,
    /// Ticks to run before clean shutdown.
    pub run_ticks: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            map_sx: 64,
            map_sy: 32,
            map_sz: 64,
            tick_interval_ms: 50,
            draw_blocks_per_tick: 512,
            max_batch_time_ms: 20,
            undo_depth: 16,
            run_ticks: 200,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg: Config = toml::from_str("draw_blocks_per_tick = 64").unwrap();
        assert_eq!(cfg.draw_blocks_per_tick, 64);
        assert_eq!(cfg.map_sx, Config::default().map_sx);
        assert_eq!(cfg.undo_depth, 16);
    }
}
