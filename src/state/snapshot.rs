use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use crate::domain::health::HealthSnapshot;
use crate::domain::spread::MovementState;
use crate::domain::weapon::WeaponSnapshot;

/// Full restorable state of one combatant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantSnapshot {
    pub id: u32,
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    // Last Move / Aim inputs, held until the next command
    pub velocity: Vec2,
    pub movement: MovementState,
    pub compensation: Vec2,
    pub active_slot: usize,
    pub weapons: Vec<WeaponSnapshot>,
    pub health: HealthSnapshot,
    pub respawn_timer: Option<f32>,
    pub kills: u32,
    pub deaths: u32,
}

pub fn encode(snapshot: &CombatantSnapshot) -> Result<Vec<u8>, bincode::Error> {
    bincode::serialize(snapshot)
}

pub fn decode(bytes: &[u8]) -> Result<CombatantSnapshot, bincode::Error> {
    bincode::deserialize(bytes)
}
