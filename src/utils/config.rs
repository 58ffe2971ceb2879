use serde::{Deserialize, Serialize};
use crate::domain::health::HealthConfig;
use crate::domain::hitscan::DEFAULT_MAX_DISTANCE;

/// Match configuration - immutable after load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tick_rate_hz: u32,
    /// Seed for the arena's spread RNG
    pub rng_seed: u64,
    pub respawn_delay_secs: f32,
    pub hitscan_max_distance: f32,
    /// World units per second
    pub move_speed: f32,
    pub combatant_radius: f32,
    /// Shot origin height above the feet
    pub eye_height: f32,
    /// Weapon ids for slots 0..n
    pub default_loadout: Vec<u32>,
    pub health: HealthConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_rate_hz: 50, // 20ms per tick
            rng_seed: 0x5eed,
            respawn_delay_secs: 3.0,
            hitscan_max_distance: DEFAULT_MAX_DISTANCE,
            move_speed: 5.0,
            combatant_radius: 0.3,
            eye_height: 1.6,
            default_loadout: vec![1, 2],
            health: HealthConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Missing fields fall back to their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn tick_interval_ms(&self) -> u64 {
        1000 / self.tick_rate_hz.max(1) as u64
    }

    /// Fixed simulation delta in seconds
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_rate_hz.max(1) as f32
    }
}
