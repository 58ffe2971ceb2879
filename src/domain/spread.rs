use serde::{Deserialize, Serialize};

/// Movement flags sampled from the player controller each tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementState {
    pub is_sliding: bool,
    pub is_sprinting: bool,
    pub is_crouching: bool,
    pub is_grounded: bool,
}

impl MovementState {
    pub fn grounded() -> Self {
        Self {
            is_grounded: true,
            ..Default::default()
        }
    }

    /// Collapse the flags to the single stance that drives multipliers.
    /// Priority: sliding > sprinting > crouching > airborne > grounded.
    pub fn stance(&self) -> Stance {
        if self.is_sliding {
            Stance::Sliding
        } else if self.is_sprinting {
            Stance::Sprinting
        } else if self.is_crouching {
            Stance::Crouching
        } else if !self.is_grounded {
            Stance::Airborne
        } else {
            Stance::Grounded
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stance {
    Sliding,
    Sprinting,
    Crouching,
    Airborne,
    Grounded,
}

/// One multiplier per stance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StanceMultipliers {
    pub sliding: f32,
    pub sprinting: f32,
    pub crouching: f32,
    pub airborne: f32,
    pub grounded: f32,
}

impl StanceMultipliers {
    pub fn get(&self, stance: Stance) -> f32 {
        match stance {
            Stance::Sliding => self.sliding,
            Stance::Sprinting => self.sprinting,
            Stance::Crouching => self.crouching,
            Stance::Airborne => self.airborne,
            Stance::Grounded => self.grounded,
        }
    }

    pub fn default_spread() -> Self {
        Self {
            sliding: 2.0,
            sprinting: 1.8,
            crouching: 0.7,
            airborne: 2.5,
            grounded: 1.0,
        }
    }

    pub fn default_recoil() -> Self {
        Self {
            sliding: 1.5,
            sprinting: 1.3,
            crouching: 0.75,
            airborne: 1.6,
            grounded: 1.0,
        }
    }
}

/// Spread bounds and multiplier tables for one weapon type.
/// Spread values are cone half-angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadProfile {
    pub spread_min: f32,
    pub spread_max: f32,
    pub spread_per_shot: f32,
    /// Degrees recovered per second
    pub spread_decay: f32,
    pub ads_spread_multiplier: f32,
    pub ads_recoil_multiplier: f32,
    #[serde(default = "StanceMultipliers::default_spread")]
    pub spread_multipliers: StanceMultipliers,
    #[serde(default = "StanceMultipliers::default_recoil")]
    pub recoil_multipliers: StanceMultipliers,
}

impl Default for SpreadProfile {
    fn default() -> Self {
        Self {
            spread_min: 0.5,
            spread_max: 4.0,
            spread_per_shot: 0.4,
            spread_decay: 3.0,
            ads_spread_multiplier: 0.4,
            ads_recoil_multiplier: 0.7,
            spread_multipliers: StanceMultipliers::default_spread(),
            recoil_multipliers: StanceMultipliers::default_recoil(),
        }
    }
}

/// Per-weapon bloom state
#[derive(Debug, Clone)]
pub struct SpreadRecoilModel {
    profile: SpreadProfile,
    current_spread: f32,
}

impl SpreadRecoilModel {
    pub fn new(profile: SpreadProfile) -> Self {
        Self {
            current_spread: profile.spread_min,
            profile,
        }
    }

    pub fn current_spread(&self) -> f32 {
        self.current_spread
    }

    /// Restore a previously captured spread value, clamped to the profile bounds
    pub fn set_current_spread(&mut self, spread: f32) {
        self.current_spread = spread.clamp(self.profile.spread_min, self.profile.spread_max);
    }

    /// Linear recovery towards the floor
    pub fn update(&mut self, dt: f32) {
        self.current_spread =
            (self.current_spread - self.profile.spread_decay * dt).max(self.profile.spread_min);
    }

    pub fn add_spread(&mut self) {
        self.current_spread =
            (self.current_spread + self.profile.spread_per_shot).min(self.profile.spread_max);
    }

    pub fn get_spread(&self, is_ads: bool, movement: &MovementState) -> f32 {
        let aim = if is_ads { self.profile.ads_spread_multiplier } else { 1.0 };
        self.current_spread * aim * self.profile.spread_multipliers.get(movement.stance())
    }

    pub fn get_recoil_multiplier(&self, is_ads: bool, movement: &MovementState) -> f32 {
        let aim = if is_ads { self.profile.ads_recoil_multiplier } else { 1.0 };
        aim * self.profile.recoil_multipliers.get(movement.stance())
    }

    /// Back to the resting spread, used on respawn
    pub fn reset(&mut self) {
        self.current_spread = self.profile.spread_min;
    }
}
