//! Authoritative combat simulation for the gungame arena: weapon fire
//! control, recoil and spread, hitscan against a grid level, and
//! shield/health damage resolution driven by a fixed-rate tick.

pub mod domain;
pub mod state;
pub mod tick;
pub mod utils;

pub use domain::geometry::LevelGeometry;
pub use domain::health::{HealthConfig, HealthSystem};
pub use domain::hitscan::{HitDetection, HitResult, HitscanQuery, LayerMask};
pub use domain::weapon::{FireOutcome, WeaponSystem};
pub use utils::config::Config;
pub use utils::weapondb::WeaponDb;
