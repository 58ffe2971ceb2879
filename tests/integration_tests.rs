use std::sync::Arc;
use glam::{Vec2, Vec3};
use tokio::sync::{mpsc, RwLock};
use gungamecore::domain::geometry::LevelGeometry;
use gungamecore::domain::spread::MovementState;
use gungamecore::state::snapshot;
use gungamecore::state::{Arena, CombatCommand, CombatEvent};
use gungamecore::tick::arena_tick::{arena_tick_loop, step};
use gungamecore::utils::buffers::SyncEvent;
use gungamecore::{Config, WeaponDb};

// Blackbox tests that drive the arena the way the tick loop does

const DT: f32 = 0.02;
const LEFT: Vec3 = Vec3::new(2.5, 0.0, 5.5);
const RIGHT: Vec3 = Vec3::new(12.5, 0.0, 5.5);

fn body_pitch() -> f32 {
    (-0.7_f32).atan2(10.0)
}

fn duel_arena(config: Config, weapons: WeaponDb) -> Arena {
    let mut arena = Arena::new(LevelGeometry::bordered(20, 10), Arc::new(config), Arc::new(weapons));
    arena.add_combatant(1, "Left".to_string(), Some(LEFT)).unwrap();
    arena.add_combatant(2, "Right".to_string(), Some(RIGHT)).unwrap();
    step(&mut arena, aim_commands(), DT);
    arena
}

fn aim_commands() -> Vec<CombatCommand> {
    vec![
        CombatCommand::Aim { player_id: 1, yaw: 0.0, pitch: body_pitch(), compensation: Default::default() },
        CombatCommand::Aim {
            player_id: 2,
            yaw: std::f32::consts::PI,
            pitch: body_pitch(),
            compensation: Default::default(),
        },
    ]
}

/// Rifles drawn at tick 0, both triggers held from tick 40
fn scripted_match(seed: u64, ticks: usize) -> (Vec<CombatEvent>, Arena) {
    let config = Config { rng_seed: seed, ..Config::default() };
    let mut arena = duel_arena(config, WeaponDb::load());
    let mut log = Vec::new();
    for i in 0..ticks {
        let mut commands = match i {
            0 => vec![
                CombatCommand::EquipWeapon { player_id: 1, slot: 1 },
                CombatCommand::EquipWeapon { player_id: 2, slot: 1 },
            ],
            40 => vec![
                CombatCommand::FirePressed { player_id: 1 },
                CombatCommand::FirePressed { player_id: 2 },
            ],
            _ => Vec::new(),
        };
        // pull back down against the recoil every tick
        commands.extend(aim_commands());
        log.extend(step(&mut arena, commands, DT));
    }
    (log, arena)
}

fn shot_directions(events: &[CombatEvent]) -> Vec<Vec3> {
    events
        .iter()
        .filter_map(|e| match e {
            CombatEvent::ShotFired { direction, .. } => Some(*direction),
            _ => None,
        })
        .collect()
}

#[test]
fn test_bundled_weapon_table_drives_arena() {
    let weapons = WeaponDb::from_json(include_str!("../data/weapons.json")).unwrap();
    let config = Config { default_loadout: vec![3], ..Config::default() };
    let mut arena = duel_arena(config, weapons);
    for _ in 0..50 {
        step(&mut arena, Vec::new(), DT);
    }

    let events = step(&mut arena, vec![CombatCommand::FirePressed { player_id: 1 }], DT);

    assert!(events.iter().any(|e| matches!(
        e,
        CombatEvent::HitConfirmed { attacker_id: 1, target_id: 2, damage, shield_damage, health_damage, .. }
            if *damage == 75.0 && *shield_damage == 50.0 && *health_damage == 25.0
    )));
    let target = &arena.combatants[&2];
    assert_eq!(target.health.current_shield(), 0.0);
    assert_eq!(target.health.current_health(), 75.0);
    assert_eq!(arena.combatants[&1].active_weapon().unwrap().current_ammo(), 4);
}

#[test]
fn test_match_is_deterministic() {
    let (events_a, arena_a) = scripted_match(42, 300);
    let (events_b, arena_b) = scripted_match(42, 300);

    assert_eq!(events_a, events_b);
    assert!(events_a.iter().any(|e| matches!(e, CombatEvent::EntityDied { .. })));
    for (a, b) in arena_a.combatants.values().zip(arena_b.combatants.values()) {
        assert_eq!(snapshot::encode(&a.snapshot()).unwrap(), snapshot::encode(&b.snapshot()).unwrap());
    }
}

#[test]
fn test_seed_changes_shot_directions() {
    let (events_a, _) = scripted_match(1, 60);
    let (events_b, _) = scripted_match(2, 60);

    let dirs_a = shot_directions(&events_a);
    let dirs_b = shot_directions(&events_b);
    assert!(!dirs_a.is_empty());
    assert_eq!(dirs_a.len(), dirs_b.len());
    assert_ne!(dirs_a, dirs_b);
}

#[test]
fn test_restored_snapshots_replay_identically() {
    let (_, mut original) = scripted_match(7, 60);
    // one side strafes on a slide, the other pulls against recoil
    step(
        &mut original,
        vec![
            CombatCommand::Move {
                player_id: 1,
                velocity: Vec2::new(0.0, 2.0),
                movement: MovementState { is_sliding: true, is_grounded: true, ..Default::default() },
            },
            CombatCommand::Aim {
                player_id: 2,
                yaw: std::f32::consts::PI,
                pitch: body_pitch(),
                compensation: Vec2::new(0.0, 0.4),
            },
        ],
        DT,
    );

    let mut replica = duel_arena(Config { rng_seed: 7, ..Config::default() }, WeaponDb::load());
    for combatant in original.combatants.values() {
        let bytes = snapshot::encode(&combatant.snapshot()).unwrap();
        let decoded = snapshot::decode(&bytes).unwrap();
        replica.combatants.get_mut(&combatant.id).unwrap().restore(&decoded).unwrap();
    }
    replica.rng = original.rng.clone();

    let start_z = original.combatants[&1].position.z;
    for _ in 0..120 {
        let a = step(&mut original, Vec::new(), DT);
        let b = step(&mut replica, Vec::new(), DT);
        assert_eq!(a, b);
    }
    assert!(original.combatants[&1].position.z > start_z);
    assert_eq!(original.combatants[&1].position, replica.combatants[&1].position);
    for (a, b) in original.combatants.values().zip(replica.combatants.values()) {
        assert_eq!(a.snapshot(), b.snapshot());
    }
}

#[test]
fn test_reload_cycle_conserves_ammo_through_arena() {
    let mut arena = duel_arena(Config::default(), WeaponDb::load());
    for _ in 0..50 {
        step(&mut arena, Vec::new(), DT);
    }
    for _ in 0..3 {
        step(&mut arena, vec![CombatCommand::FirePressed { player_id: 1 }], DT);
        for _ in 0..10 {
            step(&mut arena, Vec::new(), DT);
        }
    }
    let events = step(&mut arena, vec![CombatCommand::Reload { player_id: 1 }], DT);
    assert!(events.contains(&CombatEvent::ReloadStarted { player_id: 1, weapon_id: 1 }));

    let mut completed = None;
    for _ in 0..100 {
        for event in step(&mut arena, Vec::new(), DT) {
            if let CombatEvent::ReloadCompleted { current_ammo, reserve_ammo, .. } = event {
                completed = Some((current_ammo, reserve_ammo));
            }
        }
    }
    assert_eq!(completed, Some((12, 45)));
}

#[tokio::test]
async fn test_tick_loop_end_to_end() {
    let config = Arc::new(Config::default());
    let arena = Arena::new(LevelGeometry::bordered(20, 10), config.clone(), Arc::new(WeaponDb::load()));
    let arena = Arc::new(RwLock::new(arena));
    let (command_tx, command_rx) = mpsc::channel(64);
    let (output_tx, mut output_rx) = mpsc::channel(64);
    let handle = tokio::spawn(arena_tick_loop(arena.clone(), command_rx, output_tx, config));

    command_tx
        .send(CombatCommand::Join { player_id: 1, name: "Left".to_string(), spawn: Some(LEFT) })
        .await
        .unwrap();
    command_tx
        .send(CombatCommand::Join { player_id: 2, name: "Right".to_string(), spawn: Some(RIGHT) })
        .await
        .unwrap();
    command_tx
        .send(CombatCommand::Aim { player_id: 1, yaw: 0.0, pitch: body_pitch(), compensation: Default::default() })
        .await
        .unwrap();

    let mut hit = false;
    let mut health_synced = false;
    for _ in 0..200 {
        let output = output_rx.recv().await.unwrap();
        hit |= output
            .events
            .iter()
            .any(|e| matches!(e, CombatEvent::HitConfirmed { target_id: 2, .. }));
        health_synced |= output
            .sync
            .iter()
            .any(|s| matches!(s, SyncEvent::HealthChanged { player_id: 2, shield, .. } if *shield < 50.0));
        if hit && health_synced {
            break;
        }
        command_tx.send(CombatCommand::FirePressed { player_id: 1 }).await.unwrap();
    }
    assert!(hit);
    assert!(health_synced);

    drop(output_rx);
    handle.await.unwrap();
}

#[test]
fn test_config_json_pipeline() {
    let config = Config::from_json(
        r#"{ "rng_seed": 9, "default_loadout": [2], "health": { "max_shield": 0.0, "shields_enabled": false } }"#,
    )
    .unwrap();
    let mut arena = duel_arena(config, WeaponDb::load());
    assert_eq!(arena.combatants[&1].weapons.len(), 1);
    assert_eq!(arena.combatants[&2].health.current_shield(), 0.0);

    for _ in 0..30 {
        step(&mut arena, Vec::new(), DT);
    }
    step(&mut arena, vec![CombatCommand::FirePressed { player_id: 1 }], DT);
    assert_eq!(arena.combatants[&2].health.current_health(), 80.0);
}
