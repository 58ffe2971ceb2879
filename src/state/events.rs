use glam::Vec3;
use serde::{Deserialize, Serialize};
use crate::domain::hitscan::HitRegion;
use crate::utils::weapondb::FireMode;

/// Discrete outcomes of one arena tick, in the order they happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    ShotFired {
        player_id: u32,
        weapon_id: u32,
        origin: Vec3,
        direction: Vec3,
        spread: f32,
    },
    DryFire {
        player_id: u32,
        weapon_id: u32,
    },
    ReloadStarted {
        player_id: u32,
        weapon_id: u32,
    },
    ReloadCompleted {
        player_id: u32,
        weapon_id: u32,
        current_ammo: u32,
        reserve_ammo: u32,
    },
    AdsProgress {
        player_id: u32,
        progress: f32,
    },
    FireModeChanged {
        player_id: u32,
        fire_mode: FireMode,
    },
    WeaponEquipped {
        player_id: u32,
        slot: usize,
        weapon_id: u32,
    },
    HitConfirmed {
        attacker_id: u32,
        target_id: u32,
        /// After falloff, before the shield
        damage: f32,
        shield_damage: f32,
        health_damage: f32,
        region: HitRegion,
        distance: f32,
    },
    EntityDied {
        player_id: u32,
        killer_id: Option<u32>,
    },
    EntityRespawned {
        player_id: u32,
        position: Vec3,
    },
}

impl CombatEvent {
    /// The combatant the event is about
    pub fn player_id(&self) -> u32 {
        match self {
            CombatEvent::ShotFired { player_id, .. }
            | CombatEvent::DryFire { player_id, .. }
            | CombatEvent::ReloadStarted { player_id, .. }
            | CombatEvent::ReloadCompleted { player_id, .. }
            | CombatEvent::AdsProgress { player_id, .. }
            | CombatEvent::FireModeChanged { player_id, .. }
            | CombatEvent::WeaponEquipped { player_id, .. }
            | CombatEvent::EntityDied { player_id, .. }
            | CombatEvent::EntityRespawned { player_id, .. } => *player_id,
            CombatEvent::HitConfirmed { target_id, .. } => *target_id,
        }
    }
}
