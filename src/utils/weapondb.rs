use std::collections::HashMap;
use std::sync::Arc;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use crate::domain::recoil::{RecoilPattern, DEFAULT_RESET_AFTER_SECS};
use crate::domain::spread::SpreadProfile;

/// Trigger behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FireMode {
    Single,
    Burst,
    Auto,
}

/// Damage multiplier at a given range, in world units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FalloffPoint {
    pub range: f32,
    pub multiplier: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionDamage {
    pub body: f32,
    pub head: f32,
}

fn default_max_range() -> f32 {
    1000.0
}

/// Weapon tuning shared by every instance of a weapon type.
/// Never mutated once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponStats {
    pub id: u32,
    pub name: String,
    pub damage: RegionDamage,
    /// Rounds per minute
    pub rpm: f32,
    pub magazine_size: u32,
    pub max_reserve: u32,
    pub reload_time: f32,
    pub ads_time: f32,
    pub equip_time: f32,
    pub spread: SpreadProfile,
    pub recoil_pattern_id: u32,
    /// Ordered by ascending range
    pub falloff: Vec<FalloffPoint>,
    pub penetration: u32,
    pub fire_modes: Vec<FireMode>,
    #[serde(default)]
    pub burst_size: u32,
    #[serde(default)]
    pub burst_delay: f32,
    #[serde(default = "default_max_range")]
    pub max_range: f32,
}

impl WeaponStats {
    /// Minimum time between shots in milliseconds
    pub fn fire_interval_ms(&self) -> f32 {
        if self.rpm <= 0.0 {
            f32::INFINITY
        } else {
            60000.0 / self.rpm
        }
    }
}

/// On-disk layout of a weapon table
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WeaponTable {
    weapons: Vec<WeaponStats>,
    patterns: Vec<RecoilPattern>,
}

/// Immutable weapon database - loaded once at startup
/// and shared by Arc reference
#[derive(Debug, Clone)]
pub struct WeaponDb {
    weapons: HashMap<u32, Arc<WeaponStats>>,
    patterns: HashMap<u32, Arc<RecoilPattern>>,
}

impl WeaponDb {
    /// Built-in weapon table
    pub fn load() -> Self {
        let mut db = Self {
            weapons: HashMap::new(),
            patterns: HashMap::new(),
        };

        db.insert_pattern(RecoilPattern {
            id: 1,
            shots: vec![Vec2::new(0.0, 1.2), Vec2::new(0.1, 1.0), Vec2::new(-0.1, 1.0)],
            recovery_rate: 8.0,
            reset_after_secs: DEFAULT_RESET_AFTER_SECS,
        });

        db.insert_pattern(RecoilPattern {
            id: 2,
            shots: vec![
                Vec2::new(0.0, 0.8),
                Vec2::new(0.05, 0.9),
                Vec2::new(0.1, 1.0),
                Vec2::new(-0.15, 1.0),
                Vec2::new(-0.3, 0.9),
                Vec2::new(-0.2, 0.8),
                Vec2::new(0.25, 0.7),
                Vec2::new(0.4, 0.6),
            ],
            recovery_rate: 6.0,
            reset_after_secs: DEFAULT_RESET_AFTER_SECS,
        });

        db.insert_weapon(WeaponStats {
            id: 1,
            name: "Golden Friend".to_string(),
            damage: RegionDamage { body: 26.0, head: 52.0 },
            rpm: 300.0,
            magazine_size: 12,
            max_reserve: 48,
            reload_time: 1.2,
            ads_time: 0.15,
            equip_time: 0.3,
            spread: SpreadProfile {
                spread_min: 0.4,
                spread_max: 3.0,
                spread_per_shot: 0.5,
                spread_decay: 4.0,
                ..SpreadProfile::default()
            },
            recoil_pattern_id: 1,
            falloff: vec![
                FalloffPoint { range: 10.0, multiplier: 1.0 },
                FalloffPoint { range: 30.0, multiplier: 0.7 },
                FalloffPoint { range: 50.0, multiplier: 0.5 },
            ],
            penetration: 0,
            fire_modes: vec![FireMode::Single],
            burst_size: 0,
            burst_delay: 0.0,
            max_range: 150.0,
        });

        db.insert_weapon(WeaponStats {
            id: 2,
            name: "Prototype".to_string(),
            damage: RegionDamage { body: 20.0, head: 45.0 },
            rpm: 600.0,
            magazine_size: 30,
            max_reserve: 90,
            reload_time: 2.2,
            ads_time: 0.25,
            equip_time: 0.5,
            spread: SpreadProfile {
                spread_min: 0.6,
                spread_max: 5.0,
                spread_per_shot: 0.35,
                spread_decay: 3.0,
                ..SpreadProfile::default()
            },
            recoil_pattern_id: 2,
            falloff: vec![
                FalloffPoint { range: 20.0, multiplier: 1.0 },
                FalloffPoint { range: 60.0, multiplier: 0.8 },
                FalloffPoint { range: 120.0, multiplier: 0.6 },
            ],
            penetration: 1,
            fire_modes: vec![FireMode::Auto, FireMode::Burst, FireMode::Single],
            burst_size: 3,
            burst_delay: 0.3,
            max_range: 1000.0,
        });

        db
    }

    /// Parse a weapon table in the `data/weapons.json` layout
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let table: WeaponTable = serde_json::from_str(json)?;
        let mut db = Self {
            weapons: HashMap::new(),
            patterns: HashMap::new(),
        };
        for pattern in table.patterns {
            db.insert_pattern(pattern);
        }
        for weapon in table.weapons {
            db.insert_weapon(weapon);
        }
        Ok(db)
    }

    fn insert_weapon(&mut self, stats: WeaponStats) {
        self.weapons.insert(stats.id, Arc::new(stats));
    }

    fn insert_pattern(&mut self, pattern: RecoilPattern) {
        self.patterns.insert(pattern.id, Arc::new(pattern));
    }

    /// Get weapon by ID
    pub fn get(&self, id: u32) -> Option<&Arc<WeaponStats>> {
        self.weapons.get(&id)
    }

    pub fn pattern(&self, id: u32) -> Option<&Arc<RecoilPattern>> {
        self.patterns.get(&id)
    }

    /// Weapon stats together with the recoil pattern they reference
    pub fn get_with_pattern(&self, id: u32) -> Option<(Arc<WeaponStats>, Arc<RecoilPattern>)> {
        let stats = self.weapons.get(&id)?;
        let pattern = self.patterns.get(&stats.recoil_pattern_id)?;
        Some((stats.clone(), pattern.clone()))
    }

    /// Check if weapon exists
    pub fn contains(&self, id: u32) -> bool {
        self.weapons.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }

    /// Get default weapon ID (Golden Friend)
    pub fn default_weapon_id() -> u32 {
        1
    }
}
