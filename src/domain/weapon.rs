use std::sync::Arc;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use crate::domain::recoil::{RecoilPattern, RecoilState};
use crate::domain::spread::{MovementState, SpreadRecoilModel};
use crate::utils::weapondb::{FalloffPoint, FireMode, WeaponStats};

/// Upper bound for the time-since-last-shot accumulator
const SHOT_TIMER_CAP: f32 = 60.0;
const COOLDOWN_EPSILON_MS: f32 = 1e-3;

pub type FalloffCurve = SmallVec<[FalloffPoint; 4]>;

/// Damage multiplier at `distance`, linearly interpolated between the
/// bracketing points. Clamped to the end points outside the curve.
pub fn falloff_multiplier(curve: &[FalloffPoint], distance: f32) -> f32 {
    let (first, last) = match (curve.first(), curve.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return 1.0,
    };
    if distance <= first.range {
        return first.multiplier;
    }
    if distance >= last.range {
        return last.multiplier;
    }
    for pair in curve.windows(2) {
        let (near, far) = (pair[0], pair[1]);
        if distance <= far.range {
            let span = far.range - near.range;
            if span <= 0.0 {
                return far.multiplier;
            }
            let t = (distance - near.range) / span;
            return near.multiplier + (far.multiplier - near.multiplier) * t;
        }
    }
    last.multiplier
}

/// Everything hit resolution needs to know about one shot
#[derive(Debug, Clone, PartialEq)]
pub struct BallisticDescriptor {
    pub weapon_id: u32,
    pub damage: f32,
    pub headshot_damage: f32,
    /// Cone half-angle in degrees
    pub spread: f32,
    pub recoil: Vec2,
    pub penetration: u32,
    pub max_range: f32,
    pub falloff: FalloffCurve,
}

impl BallisticDescriptor {
    pub fn damage_at(&self, distance: f32, is_headshot: bool) -> f32 {
        let base = if is_headshot { self.headshot_damage } else { self.damage };
        base * falloff_multiplier(&self.falloff, distance)
    }
}

/// Why a shot was refused while ammo was available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotReady {
    Unequipped,
    Equipping,
    Reloading,
    Cooldown,
    BurstLimit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FireOutcome {
    Fired(BallisticDescriptor),
    /// Trigger pulled on an empty magazine
    DryFire,
    NotReady(NotReady),
}

/// Per-shot inputs from the shooter
#[derive(Debug, Clone, Copy, Default)]
pub struct FireContext {
    pub movement: MovementState,
    pub compensation: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EquipState {
    Unequipped,
    Equipping,
    Equipped,
}

/// Transitions that finished during an update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeaponUpdate {
    pub reload_completed: bool,
    pub equip_completed: bool,
}

/// Flat weapon state for save/restore and reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponSnapshot {
    pub weapon_id: u32,
    pub current_ammo: u32,
    pub reserve_ammo: u32,
    pub is_reloading: bool,
    pub reload_elapsed: f32,
    pub is_ads: bool,
    pub ads_progress: f32,
    pub fire_mode: usize,
    pub is_equipped: bool,
    pub is_equipping: bool,
    pub equip_elapsed: f32,
    pub burst_shots: u32,
    pub time_since_shot: f32,
    pub current_spread: f32,
    pub recoil_index: usize,
    pub recoil_accumulated: Vec2,
    pub recoil_idle_time: f32,
    pub trigger_held: bool,
    pub trigger_pending: bool,
    pub trigger_spent: bool,
}

/// Fire control for one weapon owned by one entity
#[derive(Debug, Clone)]
pub struct WeaponSystem {
    stats: Arc<WeaponStats>,
    pattern: Arc<RecoilPattern>,

    current_ammo: u32,
    reserve_ammo: u32,
    fire_mode_index: usize,

    is_reloading: bool,
    reload_elapsed: f32,

    ads_active: bool,
    ads_progress: f32,

    equip_state: EquipState,
    equip_elapsed: f32,

    burst_shots: u32,
    time_since_shot: f32,

    // Trigger latch driven by fire-pressed / fire-released intents
    trigger_held: bool,
    trigger_pending: bool,
    trigger_spent: bool,

    spread: SpreadRecoilModel,
    recoil: RecoilState,
}

impl WeaponSystem {
    /// New weapon with a full magazine and reserve, not yet equipped
    pub fn new(stats: Arc<WeaponStats>, pattern: Arc<RecoilPattern>) -> Self {
        let spread = SpreadRecoilModel::new(stats.spread);
        Self {
            current_ammo: stats.magazine_size,
            reserve_ammo: stats.max_reserve,
            fire_mode_index: 0,
            is_reloading: false,
            reload_elapsed: 0.0,
            ads_active: false,
            ads_progress: 0.0,
            equip_state: EquipState::Unequipped,
            equip_elapsed: 0.0,
            burst_shots: 0,
            time_since_shot: SHOT_TIMER_CAP,
            trigger_held: false,
            trigger_pending: false,
            trigger_spent: false,
            spread,
            recoil: RecoilState::new(),
            stats,
            pattern,
        }
    }

    pub fn stats(&self) -> &WeaponStats {
        &self.stats
    }

    pub fn weapon_id(&self) -> u32 {
        self.stats.id
    }

    pub fn current_ammo(&self) -> u32 {
        self.current_ammo
    }

    pub fn reserve_ammo(&self) -> u32 {
        self.reserve_ammo
    }

    pub fn is_reloading(&self) -> bool {
        self.is_reloading
    }

    /// Reload progress in 0..1
    pub fn reload_progress(&self) -> f32 {
        if !self.is_reloading {
            return 0.0;
        }
        if self.stats.reload_time <= 0.0 {
            return 1.0;
        }
        (self.reload_elapsed / self.stats.reload_time).min(1.0)
    }

    pub fn is_ads(&self) -> bool {
        self.ads_active
    }

    pub fn ads_progress(&self) -> f32 {
        self.ads_progress
    }

    pub fn is_equipped(&self) -> bool {
        self.equip_state == EquipState::Equipped
    }

    pub fn is_equipping(&self) -> bool {
        self.equip_state == EquipState::Equipping
    }

    pub fn burst_shots(&self) -> u32 {
        self.burst_shots
    }

    pub fn current_spread(&self) -> f32 {
        self.spread.current_spread()
    }

    pub fn recoil_state(&self) -> &RecoilState {
        &self.recoil
    }

    pub fn fire_mode(&self) -> FireMode {
        self.stats
            .fire_modes
            .get(self.fire_mode_index)
            .copied()
            .unwrap_or(FireMode::Single)
    }

    /// Cooldown gate: enough time since the last shot for the weapon's rpm
    pub fn can_fire(&self) -> bool {
        self.time_since_shot * 1000.0 + COOLDOWN_EPSILON_MS >= self.stats.fire_interval_ms()
    }

    fn burst_cap(&self) -> u32 {
        self.stats.burst_size.max(1)
    }

    /// Try to fire one round
    pub fn fire(&mut self, ctx: &FireContext) -> FireOutcome {
        match self.equip_state {
            EquipState::Unequipped => return FireOutcome::NotReady(NotReady::Unequipped),
            EquipState::Equipping => return FireOutcome::NotReady(NotReady::Equipping),
            EquipState::Equipped => {}
        }
        if self.is_reloading {
            return FireOutcome::NotReady(NotReady::Reloading);
        }
        if !self.can_fire() {
            return FireOutcome::NotReady(NotReady::Cooldown);
        }
        if self.fire_mode() == FireMode::Burst && self.burst_shots >= self.burst_cap() {
            return FireOutcome::NotReady(NotReady::BurstLimit);
        }
        if self.current_ammo == 0 {
            return FireOutcome::DryFire;
        }

        self.current_ammo -= 1;
        self.time_since_shot = 0.0;
        if self.fire_mode() == FireMode::Burst {
            self.burst_shots += 1;
        }

        let is_ads = self.is_ads();
        let spread = self.spread.get_spread(is_ads, &ctx.movement);
        let recoil_scale = self.spread.get_recoil_multiplier(is_ads, &ctx.movement);
        let recoil = self.recoil.get_next_recoil(&self.pattern, ctx.compensation) * recoil_scale;
        self.spread.add_spread();

        log::debug!(
            "Weapon {} fired: ammo {}/{}, spread {:.3}",
            self.stats.id,
            self.current_ammo,
            self.reserve_ammo,
            spread
        );

        FireOutcome::Fired(BallisticDescriptor {
            weapon_id: self.stats.id,
            damage: self.stats.damage.body,
            headshot_damage: self.stats.damage.head,
            spread,
            recoil,
            penetration: self.stats.penetration,
            max_range: self.stats.max_range,
            falloff: self.stats.falloff.iter().copied().collect(),
        })
    }

    /// Fire-pressed intent
    pub fn pull_trigger(&mut self) {
        self.trigger_held = true;
        self.trigger_pending = true;
        self.trigger_spent = false;
    }

    /// Fire-released intent. A pending single shot or burst still completes.
    pub fn release_trigger(&mut self) {
        self.trigger_held = false;
    }

    pub fn trigger_held(&self) -> bool {
        self.trigger_held
    }

    /// Attempt a shot if the trigger state asks for one under the current
    /// fire mode. Returns None when the trigger is idle.
    pub fn poll_trigger(&mut self, ctx: &FireContext) -> Option<FireOutcome> {
        let mode = self.fire_mode();
        let wants = match mode {
            FireMode::Single | FireMode::Burst => self.trigger_pending,
            FireMode::Auto => self.trigger_held && !self.trigger_spent,
        };
        if !wants {
            return None;
        }

        let outcome = self.fire(ctx);
        match &outcome {
            FireOutcome::Fired(_) => {
                if mode == FireMode::Single
                    || (mode == FireMode::Burst && self.burst_shots >= self.burst_cap())
                {
                    self.trigger_pending = false;
                }
            }
            FireOutcome::DryFire => {
                self.trigger_pending = false;
                self.trigger_spent = true;
            }
            // buffered until the gate opens
            FireOutcome::NotReady(NotReady::Cooldown) | FireOutcome::NotReady(NotReady::BurstLimit) => {}
            FireOutcome::NotReady(_) => {
                self.trigger_pending = false;
            }
        }
        Some(outcome)
    }

    /// Start a timed reload
    pub fn reload(&mut self) -> Result<(), &'static str> {
        if !self.is_equipped() {
            return Err("Weapon not equipped");
        }
        if self.is_reloading {
            return Err("Already reloading");
        }
        if self.current_ammo >= self.stats.magazine_size {
            return Err("Magazine full");
        }
        if self.reserve_ammo == 0 {
            return Err("No reserve ammo");
        }

        self.is_reloading = true;
        self.reload_elapsed = 0.0;
        self.trigger_pending = false;
        Ok(())
    }

    fn finish_reload(&mut self) {
        let added = (self.stats.magazine_size - self.current_ammo).min(self.reserve_ammo);
        self.current_ammo += added;
        self.reserve_ammo -= added;
        self.is_reloading = false;
        self.reload_elapsed = 0.0;
        log::debug!(
            "Weapon {} reloaded {} rounds: {}/{}",
            self.stats.id,
            added,
            self.current_ammo,
            self.reserve_ammo
        );
    }

    /// Aim in or out. Progress ramps from wherever it currently is.
    /// Returns true if the aim target changed.
    pub fn set_ads(&mut self, active: bool) -> bool {
        if self.equip_state == EquipState::Unequipped || self.ads_active == active {
            return false;
        }
        self.ads_active = active;
        true
    }

    /// Cycle through supported modes in declaration order
    pub fn switch_fire_mode(&mut self) -> FireMode {
        let count = self.stats.fire_modes.len();
        if count > 1 {
            self.fire_mode_index = (self.fire_mode_index + 1) % count;
            self.reset_burst();
        }
        self.fire_mode()
    }

    /// Select a mode by index; out-of-range indices are ignored
    pub fn set_fire_mode(&mut self, index: usize) -> bool {
        if index >= self.stats.fire_modes.len() {
            log::debug!("Weapon {} has no fire mode {}", self.stats.id, index);
            return false;
        }
        if index != self.fire_mode_index {
            self.fire_mode_index = index;
            self.reset_burst();
        }
        true
    }

    fn reset_burst(&mut self) {
        self.burst_shots = 0;
        self.trigger_pending = false;
    }

    /// Begin the equip delay. Returns false if already equipped or equipping.
    pub fn equip(&mut self) -> bool {
        if self.equip_state != EquipState::Unequipped {
            return false;
        }
        self.equip_state = EquipState::Equipping;
        self.equip_elapsed = 0.0;
        if self.stats.equip_time <= 0.0 {
            self.equip_state = EquipState::Equipped;
        }
        true
    }

    /// Holster the weapon, discarding any pending reload or aim transition
    pub fn unequip(&mut self) {
        self.equip_state = EquipState::Unequipped;
        self.equip_elapsed = 0.0;
        self.cancel_transitions();
    }

    /// Drop in-flight reload/ADS/trigger state without side effects
    pub fn cancel_transitions(&mut self) {
        self.is_reloading = false;
        self.reload_elapsed = 0.0;
        self.ads_active = false;
        self.ads_progress = 0.0;
        self.trigger_held = false;
        self.trigger_pending = false;
        self.trigger_spent = false;
        self.burst_shots = 0;
    }

    /// Refill for a fresh life
    pub fn reset(&mut self) {
        self.cancel_transitions();
        self.current_ammo = self.stats.magazine_size;
        self.reserve_ammo = self.stats.max_reserve;
        self.time_since_shot = SHOT_TIMER_CAP;
        self.spread.reset();
        self.recoil.reset();
    }

    /// Advance all timers by one simulation step
    pub fn update(&mut self, dt: f32) -> WeaponUpdate {
        let mut result = WeaponUpdate::default();

        if self.equip_state == EquipState::Equipping {
            self.equip_elapsed += dt;
            if self.equip_elapsed >= self.stats.equip_time {
                self.equip_state = EquipState::Equipped;
                self.equip_elapsed = 0.0;
                result.equip_completed = true;
            }
        }

        self.time_since_shot = (self.time_since_shot + dt).min(SHOT_TIMER_CAP);

        // a finished burst resets even with the next pull already buffered
        let burst_over = !self.trigger_pending || self.burst_shots >= self.burst_cap();
        if self.burst_shots > 0 && burst_over && self.time_since_shot >= self.stats.burst_delay {
            self.burst_shots = 0;
        }

        if self.is_reloading {
            self.reload_elapsed += dt;
            if self.reload_elapsed >= self.stats.reload_time {
                self.finish_reload();
                result.reload_completed = true;
            }
        }

        let step = if self.stats.ads_time <= 0.0 { 1.0 } else { dt / self.stats.ads_time };
        self.ads_progress = if self.ads_active {
            (self.ads_progress + step).min(1.0)
        } else {
            (self.ads_progress - step).max(0.0)
        };

        self.spread.update(dt);
        self.recoil.update(&self.pattern, dt);

        result
    }

    pub fn snapshot(&self) -> WeaponSnapshot {
        WeaponSnapshot {
            weapon_id: self.stats.id,
            current_ammo: self.current_ammo,
            reserve_ammo: self.reserve_ammo,
            is_reloading: self.is_reloading,
            reload_elapsed: self.reload_elapsed,
            is_ads: self.ads_active,
            ads_progress: self.ads_progress,
            fire_mode: self.fire_mode_index,
            is_equipped: self.is_equipped(),
            is_equipping: self.is_equipping(),
            equip_elapsed: self.equip_elapsed,
            burst_shots: self.burst_shots,
            time_since_shot: self.time_since_shot,
            current_spread: self.spread.current_spread(),
            recoil_index: self.recoil.index,
            recoil_accumulated: self.recoil.accumulated,
            recoil_idle_time: self.recoil.idle_time,
            trigger_held: self.trigger_held,
            trigger_pending: self.trigger_pending,
            trigger_spent: self.trigger_spent,
        }
    }

    /// Overwrite runtime state from a snapshot of the same weapon type.
    /// Counters are clamped back into their valid ranges.
    pub fn restore(&mut self, snapshot: &WeaponSnapshot) -> Result<(), &'static str> {
        if snapshot.weapon_id != self.stats.id {
            return Err("Snapshot is for a different weapon");
        }
        self.current_ammo = snapshot.current_ammo.min(self.stats.magazine_size);
        self.reserve_ammo = snapshot.reserve_ammo.min(self.stats.max_reserve);
        self.is_reloading = snapshot.is_reloading;
        self.reload_elapsed = snapshot.reload_elapsed;
        self.ads_active = snapshot.is_ads;
        self.ads_progress = snapshot.ads_progress.clamp(0.0, 1.0);
        self.fire_mode_index = if snapshot.fire_mode < self.stats.fire_modes.len() {
            snapshot.fire_mode
        } else {
            0
        };
        self.equip_state = if snapshot.is_equipped {
            EquipState::Equipped
        } else if snapshot.is_equipping {
            EquipState::Equipping
        } else {
            EquipState::Unequipped
        };
        self.equip_elapsed = snapshot.equip_elapsed;
        self.burst_shots = snapshot.burst_shots;
        self.time_since_shot = snapshot.time_since_shot.min(SHOT_TIMER_CAP);
        self.spread.set_current_spread(snapshot.current_spread);
        self.recoil = RecoilState {
            index: snapshot.recoil_index,
            accumulated: snapshot.recoil_accumulated,
            idle_time: snapshot.recoil_idle_time,
        };
        self.trigger_held = snapshot.trigger_held;
        self.trigger_pending = snapshot.trigger_pending;
        self.trigger_spent = snapshot.trigger_spent;
        Ok(())
    }
}
