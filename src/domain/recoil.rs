use glam::Vec2;
use serde::{Deserialize, Serialize};

pub const DEFAULT_RESET_AFTER_SECS: f32 = 0.5;

fn default_reset_after() -> f32 {
    DEFAULT_RESET_AFTER_SECS
}

/// Immutable recoil table for one weapon type.
/// Each shot is a (yaw, pitch) kick in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoilPattern {
    pub id: u32,
    pub shots: Vec<Vec2>,
    /// Maximum degrees of accumulated kick recovered per second
    pub recovery_rate: f32,
    /// Idle time after which playback restarts from the first shot
    #[serde(default = "default_reset_after")]
    pub reset_after_secs: f32,
}

impl RecoilPattern {
    /// Shot `index`, holding on the last entry past the end of the table
    pub fn shot(&self, index: usize) -> Vec2 {
        match self.shots.last() {
            Some(last) => self.shots.get(index).copied().unwrap_or(*last),
            None => Vec2::ZERO,
        }
    }
}

/// Playback position within a recoil pattern
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecoilState {
    pub index: usize,
    pub accumulated: Vec2,
    pub idle_time: f32,
}

impl RecoilState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next kick minus the player's compensation. Advances the pattern.
    pub fn get_next_recoil(&mut self, pattern: &RecoilPattern, compensation: Vec2) -> Vec2 {
        let kick = pattern.shot(self.index) - compensation;
        self.index += 1;
        self.accumulated += kick;
        self.idle_time = 0.0;
        kick
    }

    /// Recover accumulated kick and restart the pattern after an idle gap
    pub fn update(&mut self, pattern: &RecoilPattern, dt: f32) {
        let magnitude = self.accumulated.length();
        let step = pattern.recovery_rate * dt;
        if magnitude <= step {
            self.accumulated = Vec2::ZERO;
        } else {
            self.accumulated -= self.accumulated / magnitude * step;
        }

        self.idle_time += dt;
        if self.idle_time > pattern.reset_after_secs {
            self.index = 0;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> RecoilPattern {
        RecoilPattern {
            id: 1,
            shots: vec![Vec2::new(0.0, 1.0), Vec2::new(0.5, 1.5), Vec2::new(-0.5, 2.0)],
            recovery_rate: 4.0,
            reset_after_secs: DEFAULT_RESET_AFTER_SECS,
        }
    }

    #[test]
    fn test_pattern_plays_in_order() {
        let p = pattern();
        let mut state = RecoilState::new();
        assert_eq!(state.get_next_recoil(&p, Vec2::ZERO), Vec2::new(0.0, 1.0));
        assert_eq!(state.get_next_recoil(&p, Vec2::ZERO), Vec2::new(0.5, 1.5));
        assert_eq!(state.get_next_recoil(&p, Vec2::ZERO), Vec2::new(-0.5, 2.0));
        assert_eq!(state.accumulated, Vec2::new(0.0, 4.5));
    }

    #[test]
    fn test_holds_last_entry() {
        let p = pattern();
        let mut state = RecoilState::new();
        for _ in 0..3 {
            state.get_next_recoil(&p, Vec2::ZERO);
        }
        assert_eq!(state.get_next_recoil(&p, Vec2::ZERO), Vec2::new(-0.5, 2.0));
        assert_eq!(state.get_next_recoil(&p, Vec2::ZERO), Vec2::new(-0.5, 2.0));
        assert_eq!(state.index, 5);
    }

    #[test]
    fn test_compensation_subtracted() {
        let p = pattern();
        let mut state = RecoilState::new();
        let kick = state.get_next_recoil(&p, Vec2::new(0.0, 0.25));
        assert_eq!(kick, Vec2::new(0.0, 0.75));
        assert_eq!(state.accumulated, Vec2::new(0.0, 0.75));
    }

    #[test]
    fn test_empty_pattern_is_zero() {
        let p = RecoilPattern {
            shots: Vec::new(),
            ..pattern()
        };
        let mut state = RecoilState::new();
        assert_eq!(state.get_next_recoil(&p, Vec2::ZERO), Vec2::ZERO);
    }

    #[test]
    fn test_decay_never_passes_zero() {
        let p = pattern();
        let mut state = RecoilState::new();
        state.get_next_recoil(&p, Vec2::ZERO);
        state.update(&p, 0.1);
        assert!((state.accumulated.y - 0.6).abs() < 1e-6);
        state.update(&p, 1.0);
        assert_eq!(state.accumulated, Vec2::ZERO);
    }

    #[test]
    fn test_index_resets_after_idle() {
        let p = pattern();
        let mut state = RecoilState::new();
        state.get_next_recoil(&p, Vec2::ZERO);
        state.get_next_recoil(&p, Vec2::ZERO);
        state.update(&p, 0.3);
        assert_eq!(state.index, 2);
        state.update(&p, 0.3);
        assert_eq!(state.index, 0);
    }
}
