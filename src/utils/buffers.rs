use glam::Vec3;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use crate::utils::weapondb::FireMode;

/// Type alias for small collections that avoid allocations
pub type SmallPlayerVec = SmallVec<[u32; 8]>;
pub type SmallEventVec = SmallVec<[SyncEvent; 16]>;

/// Sync event for delta-based state updates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SyncEvent {
    HealthChanged { player_id: u32, health: f32, shield: f32 },
    AliveChanged { player_id: u32, is_alive: bool },
    AmmoChanged { player_id: u32, current_ammo: u32, reserve_ammo: u32 },
    WeaponChanged { player_id: u32, weapon_id: u32 },
    ReloadStateChanged { player_id: u32, is_reloading: bool },
    AdsChanged { player_id: u32, is_ads: bool },
    FireModeChanged { player_id: u32, fire_mode: FireMode },
    PositionChanged { player_id: u32, position: Vec3, yaw: f32, pitch: f32 },
}

/// Reusable buffer for bincode packet encoding
pub struct PacketBuffer {
    buffer: Vec<u8>,
}

impl PacketBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Replace the contents with the encoding of `value`
    pub fn encode<T: Serialize>(&mut self, value: &T) -> Result<&[u8], bincode::Error> {
        self.buffer.clear();
        bincode::serialize_into(&mut self.buffer, value)?;
        Ok(&self.buffer)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for PacketBuffer {
    fn default() -> Self {
        Self::new(1024)
    }
}
