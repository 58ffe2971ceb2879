use glam::{Vec2, Vec3};
use crate::domain::health::{HealthConfig, HealthSystem};
use crate::domain::hitscan::HitTarget;
use crate::domain::spread::MovementState;
use crate::domain::weapon::{FireContext, WeaponSystem};
use crate::state::snapshot::CombatantSnapshot;
use crate::utils::weapondb::FireMode;

const MAX_PITCH: f32 = 89.0 * std::f32::consts::PI / 180.0;

/// One player or bot in an arena
#[derive(Debug, Clone)]
pub struct Combatant {
    pub id: u32,
    pub name: String,
    /// Feet position. The level is flat so y stays at the spawn height.
    pub position: Vec3,
    pub velocity: Vec2,
    pub yaw: f32,
    pub pitch: f32,
    pub compensation: Vec2,
    pub movement: MovementState,
    pub health: HealthSystem,
    pub weapons: Vec<WeaponSystem>,
    pub active_slot: usize,
    pub spawn_point: Vec3,
    /// Seconds until respawn while dead
    pub respawn_timer: Option<f32>,
    pub kills: u32,
    pub deaths: u32,
}

/// Fields tracked for delta sync
#[derive(Debug, Clone, PartialEq)]
pub struct CombatantSyncState {
    pub id: u32,
    pub health: f32,
    pub shield: f32,
    pub is_alive: bool,
    pub weapon_id: u32,
    pub current_ammo: u32,
    pub reserve_ammo: u32,
    pub is_reloading: bool,
    pub is_ads: bool,
    pub fire_mode: FireMode,
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl Combatant {
    /// Spawn with the first loadout slot being drawn
    pub fn new(
        id: u32,
        name: String,
        spawn_point: Vec3,
        mut weapons: Vec<WeaponSystem>,
        health: HealthConfig,
    ) -> Self {
        if let Some(first) = weapons.first_mut() {
            first.equip();
        }
        Self {
            id,
            name,
            position: spawn_point,
            velocity: Vec2::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            compensation: Vec2::ZERO,
            movement: MovementState::grounded(),
            health: HealthSystem::new(health),
            weapons,
            active_slot: 0,
            spawn_point,
            respawn_timer: None,
            kills: 0,
            deaths: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health.is_alive()
    }

    pub fn active_weapon(&self) -> Option<&WeaponSystem> {
        self.weapons.get(self.active_slot)
    }

    pub fn active_weapon_mut(&mut self) -> Option<&mut WeaponSystem> {
        self.weapons.get_mut(self.active_slot)
    }

    pub fn fire_context(&self) -> FireContext {
        FireContext {
            movement: self.movement,
            compensation: self.compensation,
        }
    }

    pub fn set_aim(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Kick the view by a recoil vector in degrees of (yaw, pitch)
    pub fn apply_recoil(&mut self, recoil: Vec2) {
        self.set_aim(self.yaw + recoil.x.to_radians(), self.pitch + recoil.y.to_radians());
    }

    /// Unit view direction, yaw measured from +X towards +Z
    pub fn aim_direction(&self) -> Vec3 {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        Vec3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw)
    }

    pub fn eye_position(&self, eye_height: f32) -> Vec3 {
        self.position + Vec3::new(0.0, eye_height, 0.0)
    }

    pub fn hit_target(&self) -> HitTarget {
        HitTarget::player(self.id, self.position, self.is_alive())
    }

    /// Holster the current weapon and start drawing `slot`.
    /// Returns the weapon id being drawn.
    pub fn equip_slot(&mut self, slot: usize) -> Result<u32, &'static str> {
        if !self.is_alive() {
            return Err("Player is dead");
        }
        if slot >= self.weapons.len() {
            return Err("No weapon in slot");
        }
        if slot == self.active_slot {
            return Err("Slot already active");
        }

        if let Some(current) = self.active_weapon_mut() {
            current.unequip();
        }
        self.active_slot = slot;
        let weapon = &mut self.weapons[slot];
        weapon.equip();
        Ok(weapon.weapon_id())
    }

    /// Drop every in-flight weapon transition and start the respawn timer
    pub fn die(&mut self, respawn_delay: f32) {
        for weapon in &mut self.weapons {
            weapon.cancel_transitions();
        }
        self.velocity = Vec2::ZERO;
        self.deaths += 1;
        self.respawn_timer = Some(respawn_delay);
    }

    pub fn respawn(&mut self, position: Vec3) {
        self.health.respawn();
        for weapon in &mut self.weapons {
            weapon.unequip();
            weapon.reset();
        }
        if let Some(weapon) = self.active_weapon_mut() {
            weapon.equip();
        }
        self.position = position;
        self.velocity = Vec2::ZERO;
        self.compensation = Vec2::ZERO;
        self.movement = MovementState::grounded();
        self.respawn_timer = None;
    }

    pub fn to_sync_state(&self) -> CombatantSyncState {
        let weapon = self.active_weapon();
        CombatantSyncState {
            id: self.id,
            health: self.health.current_health(),
            shield: self.health.current_shield(),
            is_alive: self.is_alive(),
            weapon_id: weapon.map(|w| w.weapon_id()).unwrap_or(0),
            current_ammo: weapon.map(|w| w.current_ammo()).unwrap_or(0),
            reserve_ammo: weapon.map(|w| w.reserve_ammo()).unwrap_or(0),
            is_reloading: weapon.map(|w| w.is_reloading()).unwrap_or(false),
            is_ads: weapon.map(|w| w.is_ads()).unwrap_or(false),
            fire_mode: weapon.map(|w| w.fire_mode()).unwrap_or(FireMode::Single),
            position: self.position,
            yaw: self.yaw,
            pitch: self.pitch,
        }
    }

    pub fn snapshot(&self) -> CombatantSnapshot {
        CombatantSnapshot {
            id: self.id,
            position: self.position,
            yaw: self.yaw,
            pitch: self.pitch,
            velocity: self.velocity,
            movement: self.movement,
            compensation: self.compensation,
            active_slot: self.active_slot,
            weapons: self.weapons.iter().map(|w| w.snapshot()).collect(),
            health: self.health.snapshot(),
            respawn_timer: self.respawn_timer,
            kills: self.kills,
            deaths: self.deaths,
        }
    }

    /// Restore from a snapshot taken of a combatant with the same loadout
    pub fn restore(&mut self, snapshot: &CombatantSnapshot) -> Result<(), &'static str> {
        if snapshot.id != self.id {
            return Err("Snapshot is for a different player");
        }
        if snapshot.weapons.len() != self.weapons.len() || snapshot.active_slot >= self.weapons.len() {
            return Err("Snapshot loadout does not match");
        }
        for (weapon, weapon_snapshot) in self.weapons.iter_mut().zip(&snapshot.weapons) {
            weapon.restore(weapon_snapshot)?;
        }
        self.position = snapshot.position;
        self.set_aim(snapshot.yaw, snapshot.pitch);
        self.velocity = snapshot.velocity;
        self.movement = snapshot.movement;
        self.compensation = snapshot.compensation;
        self.active_slot = snapshot.active_slot;
        self.health.restore(&snapshot.health);
        self.respawn_timer = snapshot.respawn_timer;
        self.kills = snapshot.kills;
        self.deaths = snapshot.deaths;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::weapondb::WeaponDb;

    fn combatant(id: u32) -> Combatant {
        let db = WeaponDb::load();
        let loadout = [1, 2]
            .iter()
            .map(|&wid| {
                let (stats, pattern) = db.get_with_pattern(wid).unwrap();
                WeaponSystem::new(stats, pattern)
            })
            .collect();
        Combatant::new(id, format!("Bot{}", id), Vec3::new(2.5, 0.0, 2.5), loadout, HealthConfig::default())
    }

    #[test]
    fn test_spawns_drawing_first_slot() {
        let c = combatant(1);
        assert!(c.weapons[0].is_equipping());
        assert!(!c.weapons[1].is_equipping());
        assert_eq!(c.active_weapon().unwrap().weapon_id(), 1);
    }

    #[test]
    fn test_aim_direction_and_pitch_clamp() {
        let mut c = combatant(1);
        assert!((c.aim_direction() - Vec3::X).length() < 1e-6);
        c.set_aim(std::f32::consts::FRAC_PI_2, 0.0);
        assert!((c.aim_direction() - Vec3::Z).length() < 1e-6);
        c.set_aim(0.0, 3.0);
        assert_eq!(c.pitch, MAX_PITCH);
    }

    #[test]
    fn test_recoil_kicks_view_up() {
        let mut c = combatant(1);
        c.apply_recoil(Vec2::new(0.0, 2.0));
        assert!((c.pitch - 2.0_f32.to_radians()).abs() < 1e-6);
        assert!(c.aim_direction().y > 0.0);
    }

    #[test]
    fn test_equip_slot_cancels_reload() {
        let mut c = combatant(1);
        c.weapons[0].update(1.0);
        let ctx = c.fire_context();
        c.weapons[0].fire(&ctx);
        c.weapons[0].reload().unwrap();

        assert_eq!(c.equip_slot(1), Ok(2));
        assert!(!c.weapons[0].is_reloading());
        assert!(!c.weapons[0].is_equipped());
        assert_eq!(c.weapons[0].current_ammo(), 11);
        assert_eq!(c.equip_slot(1), Err("Slot already active"));
        assert_eq!(c.equip_slot(5), Err("No weapon in slot"));
    }

    #[test]
    fn test_die_and_respawn() {
        let mut c = combatant(1);
        c.weapons[0].update(1.0);
        c.weapons[0].set_ads(true);
        c.health.take_damage(500.0, 2);
        c.die(3.0);
        assert_eq!(c.deaths, 1);
        assert!(!c.weapons[0].is_ads());
        assert_eq!(c.equip_slot(1), Err("Player is dead"));

        c.respawn(Vec3::new(7.5, 0.0, 7.5));
        assert!(c.is_alive());
        assert_eq!(c.respawn_timer, None);
        assert_eq!(c.position, Vec3::new(7.5, 0.0, 7.5));
        assert!(c.active_weapon().unwrap().is_equipping());
    }

    #[test]
    fn test_snapshot_restore() {
        let mut a = combatant(4);
        a.weapons[0].update(1.0);
        a.set_aim(0.3, 0.1);
        a.health.take_damage(70.0, 9);
        a.velocity = Vec2::new(4.0, 1.0);
        a.movement = MovementState { is_sliding: true, is_grounded: true, ..Default::default() };
        a.compensation = Vec2::new(0.1, 0.5);
        let snapshot = a.snapshot();

        let mut b = combatant(4);
        b.restore(&snapshot).unwrap();
        assert_eq!(b.snapshot(), snapshot);
        assert_eq!(b.velocity, a.velocity);
        assert_eq!(b.movement, a.movement);
        assert_eq!(b.fire_context().compensation, Vec2::new(0.1, 0.5));

        let mut other = combatant(5);
        assert!(other.restore(&snapshot).is_err());
    }
}
