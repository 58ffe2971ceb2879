use crate::state::arena::Arena;
use crate::utils::buffers::{SmallEventVec, SyncEvent};

/// Collect dirty events for delta-based state sync
/// Only includes changed fields compared to last sync state
pub fn collect_dirty_events(arena: &mut Arena) -> SmallEventVec {
    let mut events = SmallEventVec::new();

    for &player_id in &arena.dirty_players {
        let combatant = match arena.combatants.get(&player_id) {
            Some(c) => c,
            None => continue,
        };
        let current = combatant.to_sync_state();
        let last = arena.last_sync_state.get(&player_id);

        if last.map(|l| l.health != current.health || l.shield != current.shield).unwrap_or(true) {
            events.push(SyncEvent::HealthChanged {
                player_id,
                health: current.health,
                shield: current.shield,
            });
        }

        if last.map(|l| l.is_alive != current.is_alive).unwrap_or(true) {
            events.push(SyncEvent::AliveChanged { player_id, is_alive: current.is_alive });
        }

        if last
            .map(|l| l.current_ammo != current.current_ammo || l.reserve_ammo != current.reserve_ammo)
            .unwrap_or(true)
        {
            events.push(SyncEvent::AmmoChanged {
                player_id,
                current_ammo: current.current_ammo,
                reserve_ammo: current.reserve_ammo,
            });
        }

        if last.map(|l| l.weapon_id != current.weapon_id).unwrap_or(true) {
            events.push(SyncEvent::WeaponChanged { player_id, weapon_id: current.weapon_id });
        }

        if last.map(|l| l.is_reloading != current.is_reloading).unwrap_or(true) {
            events.push(SyncEvent::ReloadStateChanged {
                player_id,
                is_reloading: current.is_reloading,
            });
        }

        if last.map(|l| l.is_ads != current.is_ads).unwrap_or(true) {
            events.push(SyncEvent::AdsChanged { player_id, is_ads: current.is_ads });
        }

        if last.map(|l| l.fire_mode != current.fire_mode).unwrap_or(true) {
            events.push(SyncEvent::FireModeChanged { player_id, fire_mode: current.fire_mode });
        }

        if last
            .map(|l| l.position != current.position || l.yaw != current.yaw || l.pitch != current.pitch)
            .unwrap_or(true)
        {
            events.push(SyncEvent::PositionChanged {
                player_id,
                position: current.position,
                yaw: current.yaw,
                pitch: current.pitch,
            });
        }

        // Update last sync state
        arena.last_sync_state.insert(player_id, current);
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use glam::Vec3;
    use crate::domain::geometry::LevelGeometry;
    use crate::utils::config::Config;
    use crate::utils::weapondb::WeaponDb;

    fn arena() -> Arena {
        let mut arena = Arena::new(
            LevelGeometry::bordered(10, 10),
            Arc::new(Config::default()),
            Arc::new(WeaponDb::load()),
        );
        arena.add_combatant(1, "Test".to_string(), Some(Vec3::new(3.5, 0.0, 3.5))).unwrap();
        arena
    }

    #[test]
    fn test_collect_dirty_events_new_player() {
        let mut arena = arena();
        let events = collect_dirty_events(&mut arena);
        // every field is new
        assert_eq!(events.len(), 8);
        assert!(arena.last_sync_state.contains_key(&1));
    }

    #[test]
    fn test_collect_dirty_events_no_changes() {
        let mut arena = arena();
        collect_dirty_events(&mut arena);
        arena.clear_dirty();

        // Mark dirty but no actual changes
        arena.mark_dirty(1);
        assert!(collect_dirty_events(&mut arena).is_empty());
    }

    #[test]
    fn test_collect_dirty_events_only_changed_fields() {
        let mut arena = arena();
        collect_dirty_events(&mut arena);
        arena.clear_dirty();

        arena.combatants.get_mut(&1).unwrap().health.take_damage(60.0, 2);
        arena.mark_dirty(1);
        let events = collect_dirty_events(&mut arena);
        assert_eq!(
            events.into_vec(),
            vec![SyncEvent::HealthChanged { player_id: 1, health: 90.0, shield: 0.0 }]
        );
    }

    #[test]
    fn test_removed_player_skipped() {
        let mut arena = arena();
        arena.combatants.remove(&1);
        assert!(collect_dirty_events(&mut arena).is_empty());
    }
}
