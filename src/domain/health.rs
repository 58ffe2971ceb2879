use serde::{Deserialize, Serialize};

/// Health and shield tuning shared by every combatant in a match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub max_health: f32,
    pub max_shield: f32,
    pub shields_enabled: bool,
    pub health_regen_delay: f32,
    /// Health per second, 0 disables
    pub health_regen_rate: f32,
    pub shield_regen_delay: f32,
    pub shield_regen_rate: f32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            max_shield: 50.0,
            shields_enabled: true,
            health_regen_delay: 5.0,
            health_regen_rate: 10.0,
            shield_regen_delay: 3.0,
            shield_regen_rate: 25.0,
        }
    }
}

/// Read-only view for HUD and scoring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthData {
    pub current_health: f32,
    pub max_health: f32,
    pub current_shield: f32,
    pub max_shield: f32,
    /// 0..100
    pub health_percent: f32,
    pub is_alive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub current_health: f32,
    pub current_shield: f32,
    pub is_alive: bool,
    pub time_since_last_damage: f32,
    pub last_damage_source: Option<u32>,
    pub last_damage_amount: f32,
}

/// Per-entity damage sink
#[derive(Debug, Clone)]
pub struct HealthSystem {
    config: HealthConfig,
    current_health: f32,
    current_shield: f32,
    is_alive: bool,
    time_since_last_damage: f32,
    last_damage_source: Option<u32>,
    last_damage_amount: f32,
}

impl HealthSystem {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            current_health: config.max_health,
            current_shield: if config.shields_enabled { config.max_shield } else { 0.0 },
            is_alive: config.max_health > 0.0,
            time_since_last_damage: 0.0,
            last_damage_source: None,
            last_damage_amount: 0.0,
            config,
        }
    }

    pub fn config(&self) -> &HealthConfig {
        &self.config
    }

    pub fn current_health(&self) -> f32 {
        self.current_health
    }

    pub fn current_shield(&self) -> f32 {
        self.current_shield
    }

    pub fn is_alive(&self) -> bool {
        self.is_alive
    }

    pub fn time_since_last_damage(&self) -> f32 {
        self.time_since_last_damage
    }

    pub fn last_damage_source(&self) -> Option<u32> {
        self.last_damage_source
    }

    pub fn last_damage_amount(&self) -> f32 {
        self.last_damage_amount
    }

    /// Apply damage to shield then health. Returns true if this call killed.
    pub fn take_damage(&mut self, amount: f32, source_id: u32) -> bool {
        if !self.is_alive || !(amount > 0.0) {
            return false;
        }

        let mut remaining = amount;
        if self.config.shields_enabled {
            let absorbed = remaining.min(self.current_shield);
            self.current_shield -= absorbed;
            remaining -= absorbed;
        }
        self.current_health = (self.current_health - remaining).max(0.0);

        self.last_damage_source = Some(source_id);
        self.last_damage_amount = amount;
        self.time_since_last_damage = 0.0;

        if self.current_health <= 0.0 {
            self.is_alive = false;
            log::debug!("Entity killed by {} ({} damage)", source_id, amount);
            return true;
        }
        false
    }

    /// Advance regen timers. Only time past each delay counts towards regen.
    pub fn update(&mut self, dt: f32) {
        if !self.is_alive || dt <= 0.0 {
            return;
        }
        let before = self.time_since_last_damage;
        self.time_since_last_damage += dt;
        let now = self.time_since_last_damage;

        let regen_time = |delay: f32| (now - before.max(delay)).max(0.0);

        let health_time = regen_time(self.config.health_regen_delay);
        if health_time > 0.0 {
            self.current_health = (self.current_health + self.config.health_regen_rate * health_time)
                .min(self.config.max_health);
        }

        if self.config.shields_enabled {
            let shield_time = regen_time(self.config.shield_regen_delay);
            if shield_time > 0.0 {
                self.current_shield = (self.current_shield + self.config.shield_regen_rate * shield_time)
                    .min(self.config.max_shield);
            }
        }
    }

    /// Restore health on a living entity. Returns the amount restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if !self.is_alive || !(amount > 0.0) {
            return 0.0;
        }
        let before = self.current_health;
        self.current_health = (self.current_health + amount).min(self.config.max_health);
        self.current_health - before
    }

    pub fn respawn(&mut self) {
        *self = Self::new(self.config);
    }

    pub fn get_health_data(&self) -> HealthData {
        let health_percent = if self.config.max_health > 0.0 {
            self.current_health / self.config.max_health * 100.0
        } else {
            0.0
        };
        HealthData {
            current_health: self.current_health,
            max_health: self.config.max_health,
            current_shield: self.current_shield,
            max_shield: self.config.max_shield,
            health_percent,
            is_alive: self.is_alive,
        }
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            current_health: self.current_health,
            current_shield: self.current_shield,
            is_alive: self.is_alive,
            time_since_last_damage: self.time_since_last_damage,
            last_damage_source: self.last_damage_source,
            last_damage_amount: self.last_damage_amount,
        }
    }

    /// Values are clamped and the alive flag is derived from health
    pub fn restore(&mut self, snapshot: &HealthSnapshot) {
        self.current_health = snapshot.current_health.clamp(0.0, self.config.max_health);
        self.current_shield = if self.config.shields_enabled {
            snapshot.current_shield.clamp(0.0, self.config.max_shield)
        } else {
            0.0
        };
        self.is_alive = self.current_health > 0.0;
        self.time_since_last_damage = snapshot.time_since_last_damage.max(0.0);
        self.last_damage_source = snapshot.last_damage_source;
        self.last_damage_amount = snapshot.last_damage_amount;
    }
}

impl Default for HealthSystem {
    fn default() -> Self {
        Self::new(HealthConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_shield() -> HealthSystem {
        HealthSystem::new(HealthConfig {
            shields_enabled: false,
            ..HealthConfig::default()
        })
    }

    #[test]
    fn test_shield_absorbs_first() {
        let mut h = HealthSystem::default();
        assert!(!h.take_damage(30.0, 1));
        assert_eq!(h.current_shield(), 20.0);
        assert_eq!(h.current_health(), 100.0);

        let mut fresh = HealthSystem::default();
        fresh.take_damage(70.0, 1);
        assert_eq!(fresh.current_shield(), 0.0);
        assert_eq!(fresh.current_health(), 80.0);
    }

    #[test]
    fn test_four_hits_kill() {
        let mut h = no_shield();
        let mut sequence = Vec::new();
        let mut deaths = Vec::new();
        for _ in 0..4 {
            deaths.push(h.take_damage(25.0, 3));
            sequence.push(h.current_health());
        }
        assert_eq!(sequence, vec![75.0, 50.0, 25.0, 0.0]);
        assert_eq!(deaths, vec![false, false, false, true]);
        assert!(!h.is_alive());
        assert_eq!(h.last_damage_source(), Some(3));
    }

    #[test]
    fn test_overkill_clamps_and_dead_rejects() {
        let mut h = no_shield();
        assert!(h.take_damage(500.0, 2));
        assert_eq!(h.current_health(), 0.0);
        assert!(!h.take_damage(10.0, 4));
        assert_eq!(h.last_damage_source(), Some(2));
        assert_eq!(h.heal(50.0), 0.0);
    }

    #[test]
    fn test_non_positive_damage_rejected() {
        let mut h = HealthSystem::default();
        h.update(1.0);
        assert!(!h.take_damage(0.0, 1));
        assert!(!h.take_damage(-5.0, 1));
        assert!(!h.take_damage(f32::NAN, 1));
        assert_eq!(h.time_since_last_damage(), 1.0);
        assert_eq!(h.last_damage_source(), None);
    }

    #[test]
    fn test_regen_waits_for_delay() {
        let mut h = no_shield();
        h.take_damage(50.0, 1);
        for _ in 0..4 {
            h.update(1.0);
        }
        assert_eq!(h.current_health(), 50.0);
        // one second past the five second delay
        h.update(2.0);
        assert_eq!(h.current_health(), 60.0);
        h.update(100.0);
        assert_eq!(h.current_health(), 100.0);
    }

    #[test]
    fn test_shield_and_health_regen_independent() {
        let mut h = HealthSystem::default();
        h.take_damage(70.0, 1);
        h.update(4.0);
        assert_eq!(h.current_shield(), 25.0);
        assert_eq!(h.current_health(), 80.0);
        h.update(2.0);
        assert_eq!(h.current_shield(), 50.0);
        assert_eq!(h.current_health(), 90.0);
    }

    #[test]
    fn test_damage_resets_regen_timer() {
        let mut h = no_shield();
        h.take_damage(30.0, 1);
        h.update(4.5);
        h.take_damage(10.0, 2);
        h.update(4.5);
        assert_eq!(h.current_health(), 60.0);
    }

    #[test]
    fn test_respawn_restores_and_clears() {
        let mut h = HealthSystem::default();
        h.take_damage(1000.0, 7);
        h.respawn();
        assert!(h.is_alive());
        assert_eq!(h.current_health(), 100.0);
        assert_eq!(h.current_shield(), 50.0);
        assert_eq!(h.last_damage_source(), None);
        assert_eq!(h.last_damage_amount(), 0.0);
        assert_eq!(h.time_since_last_damage(), 0.0);
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut h = no_shield();
        h.take_damage(30.0, 1);
        assert_eq!(h.heal(20.0), 20.0);
        assert_eq!(h.heal(20.0), 10.0);
        assert_eq!(h.current_health(), 100.0);
    }

    #[test]
    fn test_health_data() {
        let mut h = HealthSystem::default();
        h.take_damage(75.0, 1);
        let data = h.get_health_data();
        assert_eq!(data.current_health, 75.0);
        assert_eq!(data.health_percent, 75.0);
        assert_eq!(data.current_shield, 0.0);
        assert!(data.is_alive);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut a = HealthSystem::default();
        a.take_damage(60.0, 4);
        a.update(2.5);
        let snapshot = a.snapshot();

        let mut b = HealthSystem::default();
        b.restore(&snapshot);
        assert_eq!(b.snapshot(), snapshot);
        a.update(3.0);
        b.update(3.0);
        assert_eq!(a.snapshot(), b.snapshot());

        let mut corrupt = snapshot.clone();
        corrupt.current_health = -20.0;
        corrupt.is_alive = true;
        b.restore(&corrupt);
        assert_eq!(b.current_health(), 0.0);
        assert!(!b.is_alive());
    }
}
