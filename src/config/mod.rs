use crate::detection::DEFAULT_FOV_RADIUS;
use crate::world::Region;
use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable naming the TOML config file
pub const CONFIG_PATH_ENV: &str = "SEARCHGRID_CONFIG";

/// Environment variable overriding `server.bind_addr`
pub const BIND_ADDR_ENV: &str = "SEARCHGRID_BIND_ADDR";

/// Complete searchgrid configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchGridConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
}

/// Listener and per-connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Path of the WebSocket endpoint
    #[serde(default = "default_ws_path")]
    pub ws_path: String,
    /// Frames queued per connection before broadcasts to it are dropped
    #[serde(default = "default_outbox_capacity")]
    pub outbox_capacity: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8765".to_string()
}

fn default_ws_path() -> String {
    "/ws".to_string()
}

fn default_outbox_capacity() -> usize {
    256
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            ws_path: default_ws_path(),
            outbox_capacity: default_outbox_capacity(),
        }
    }
}

/// World layout, generated once at startup
#[derive(Debug, Clone, Deserialize)]
pub struct WorldConfig {
    #[serde(default = "default_world_size")]
    pub world_size: f64,
    #[serde(default = "default_targets_per_region")]
    pub targets_per_region: usize,
    /// Minimum distance between a spawned target and its region's edge
    #[serde(default = "default_spawn_margin")]
    pub spawn_margin: f64,
    #[serde(default = "default_altitude")]
    pub default_altitude: f64,
    #[serde(default = "default_regions")]
    pub regions: Vec<Region>,
}

fn default_world_size() -> f64 {
    800.0
}

fn default_targets_per_region() -> usize {
    3
}

fn default_spawn_margin() -> f64 {
    50.0
}

fn default_altitude() -> f64 {
    40.0
}

/// Three agents: two quadrants along the bottom, one strip across the top
fn default_regions() -> Vec<Region> {
    vec![
        Region::new("D1", -400.0, 0.0, -400.0, 0.0),
        Region::new("D2", 0.0, 400.0, -400.0, 0.0),
        Region::new("D3", -400.0, 400.0, 0.0, 400.0),
    ]
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            world_size: default_world_size(),
            targets_per_region: default_targets_per_region(),
            spawn_margin: default_spawn_margin(),
            default_altitude: default_altitude(),
            regions: default_regions(),
        }
    }
}

/// Detection and alerting thresholds
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    #[serde(default = "default_fov_radius")]
    pub fov_radius: f64,
    /// Minimum classifier confidence for raising a detection event
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

fn default_fov_radius() -> f64 {
    DEFAULT_FOV_RADIUS
}

fn default_min_confidence() -> f64 {
    0.5
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            fov_radius: default_fov_radius(),
            min_confidence: default_min_confidence(),
        }
    }
}

impl SearchGridConfig {
    /// Apply `SEARCHGRID_BIND_ADDR` if set
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var(BIND_ADDR_ENV) {
            if !addr.trim().is_empty() {
                self.server.bind_addr = addr;
            }
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<SearchGridConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path))?;
    let config: SearchGridConfig =
        toml::from_str(&contents).with_context(|| format!("Failed to parse config file {}", path))?;
    Ok(config)
}

/// Load from `SEARCHGRID_CONFIG` when set, otherwise defaults; then apply env overrides
pub fn load_from_env() -> Result<SearchGridConfig> {
    let mut config = match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) => load_config(&path)?,
        Err(_) => SearchGridConfig::default(),
    };
    config.apply_env_overrides();
    Ok(config)
}
