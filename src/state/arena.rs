use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use crate::domain::geometry::LevelGeometry;
use crate::domain::hitscan::{HitTarget, Obstacle};
use crate::domain::weapon::WeaponSystem;
use crate::state::combatant::{Combatant, CombatantSyncState};
use crate::utils::buffers::SmallPlayerVec;
use crate::utils::config::Config;
use crate::utils::weapondb::WeaponDb;

/// One simulated match. Combatants iterate in id order.
#[derive(Debug)]
pub struct Arena {
    pub combatants: BTreeMap<u32, Combatant>,
    pub geometry: LevelGeometry,
    /// Extra line-of-sight blockers on top of the level walls
    pub obstacles: Vec<Obstacle>,
    pub spawn_points: Vec<Vec3>,
    pub rng: ChaCha8Rng,
    pub tick: u64,

    // Delta tracking for efficient state sync
    pub dirty_players: SmallPlayerVec,
    pub last_sync_state: HashMap<u32, CombatantSyncState>,

    config: Arc<Config>,
    weapons: Arc<WeaponDb>,
}

impl Arena {
    pub fn new(geometry: LevelGeometry, config: Arc<Config>, weapons: Arc<WeaponDb>) -> Self {
        Self {
            combatants: BTreeMap::new(),
            geometry,
            obstacles: Vec::new(),
            spawn_points: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            tick: 0,
            dirty_players: SmallPlayerVec::new(),
            last_sync_state: HashMap::new(),
            config,
            weapons,
        }
    }

    pub fn with_spawn_points(mut self, spawn_points: Vec<Vec3>) -> Self {
        self.spawn_points = spawn_points;
        self
    }

    pub fn with_obstacles(mut self, obstacles: Vec<Obstacle>) -> Self {
        self.obstacles = obstacles;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn weapons(&self) -> &WeaponDb {
        &self.weapons
    }

    /// Spawn point for a player, falling back to the level centre
    pub fn spawn_point_for(&self, player_id: u32) -> Vec3 {
        if self.spawn_points.is_empty() {
            return Vec3::new(
                self.geometry.width() as f32 / 2.0,
                0.0,
                self.geometry.depth() as f32 / 2.0,
            );
        }
        self.spawn_points[player_id as usize % self.spawn_points.len()]
    }

    /// Add a player with the configured default loadout
    pub fn add_combatant(
        &mut self,
        player_id: u32,
        name: String,
        spawn: Option<Vec3>,
    ) -> Result<(), &'static str> {
        if self.combatants.contains_key(&player_id) {
            return Err("Player already in arena");
        }

        let mut loadout = Vec::with_capacity(self.config.default_loadout.len());
        for &weapon_id in &self.config.default_loadout {
            let (stats, pattern) = self
                .weapons
                .get_with_pattern(weapon_id)
                .ok_or("Unknown weapon in loadout")?;
            loadout.push(WeaponSystem::new(stats, pattern));
        }
        if loadout.is_empty() {
            return Err("Empty loadout");
        }

        let spawn = spawn.unwrap_or_else(|| self.spawn_point_for(player_id));
        let combatant = Combatant::new(player_id, name, spawn, loadout, self.config.health);
        self.combatants.insert(player_id, combatant);
        self.mark_dirty(player_id);
        log::info!("Player {} joined arena at {:?}", player_id, spawn);
        Ok(())
    }

    pub fn remove_combatant(&mut self, player_id: u32) -> bool {
        self.last_sync_state.remove(&player_id);
        self.dirty_players.retain(|id| *id != player_id);
        let removed = self.combatants.remove(&player_id).is_some();
        if removed {
            log::info!("Player {} left arena", player_id);
        }
        removed
    }

    /// Hit candidates for every combatant, dead ones included
    pub fn hit_targets(&self) -> Vec<HitTarget> {
        self.combatants.values().map(|c| c.hit_target()).collect()
    }

    /// Mark a player as dirty (state changed)
    pub fn mark_dirty(&mut self, player_id: u32) {
        if !self.dirty_players.contains(&player_id) {
            self.dirty_players.push(player_id);
        }
    }

    /// Clear all dirty flags
    pub fn clear_dirty(&mut self) {
        self.dirty_players.clear();
    }
}
