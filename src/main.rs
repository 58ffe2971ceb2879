use std::sync::Arc;
use glam::{Vec2, Vec3};
use tokio::sync::{mpsc, RwLock};
use gungamecore::domain::geometry::LevelGeometry;
use gungamecore::domain::hitscan::HitDetection;
use gungamecore::domain::spread::MovementState;
use gungamecore::state::snapshot;
use gungamecore::state::{Arena, CombatCommand, CombatEvent};
use gungamecore::tick::arena_tick::arena_tick_loop;
use gungamecore::utils::buffers::PacketBuffer;
use gungamecore::utils::config::Config;
use gungamecore::utils::weapondb::WeaponDb;

/// Ten seconds at the default tick rate
const DEMO_TICKS: u64 = 500;

const ARENA_MAP: &[&str] = &[
    "####################",
    "#..................#",
    "#....##......##....#",
    "#..................#",
    "#..................#",
    "#....##......##....#",
    "#..................#",
    "####################",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging()?;

    // Optional: config.json then weapons.json
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => Config::from_json(&std::fs::read_to_string(path)?)?,
        None => Config::default(),
    };
    let weapons = match args.next() {
        Some(path) => WeaponDb::from_json(&std::fs::read_to_string(path)?)?,
        None => WeaponDb::load(),
    };

    // Load immutable globals (zero contention)
    let config = Arc::new(config);
    let weapons = Arc::new(weapons);
    log::info!("Loaded {} weapons, ticking at {}Hz", weapons.len(), config.tick_rate_hz);

    let arena = Arena::new(LevelGeometry::from_rows(ARENA_MAP), config.clone(), weapons.clone())
        .with_spawn_points(vec![Vec3::new(2.5, 0.0, 3.5), Vec3::new(17.5, 0.0, 4.5)]);
    let arena = Arc::new(RwLock::new(arena));

    let (command_tx, command_rx) = mpsc::channel(256);
    let (output_tx, mut output_rx) = mpsc::channel(64);
    let tick_handle = tokio::spawn(arena_tick_loop(arena.clone(), command_rx, output_tx, config.clone()));

    for (player_id, name) in [(1, "Alpha"), (2, "Bravo")] {
        command_tx
            .send(CombatCommand::Join { player_id, name: name.to_string(), spawn: None })
            .await?;
    }
    command_tx.send(CombatCommand::EquipWeapon { player_id: 2, slot: 1 }).await?;

    let mut packet = PacketBuffer::default();
    let mut bytes_synced = 0usize;

    while let Some(output) = output_rx.recv().await {
        for event in &output.events {
            log_event(event);
        }
        for sync in &output.sync {
            bytes_synced += packet.encode(sync)?.len();
        }
        if output.tick >= DEMO_TICKS {
            break;
        }

        let commands = {
            let arena_guard = arena.read().await;
            bot_commands(&arena_guard, output.tick)
        };
        for cmd in commands {
            command_tx.send(cmd).await?;
        }
    }

    // Closing the output channel stops the tick loop
    drop(output_rx);
    tick_handle.await?;

    let arena_guard = arena.read().await;
    for combatant in arena_guard.combatants.values() {
        let bytes = snapshot::encode(&combatant.snapshot())?;
        log::info!(
            "{} ({}): {} kills, {} deaths, snapshot {} bytes",
            combatant.name,
            combatant.id,
            combatant.kills,
            combatant.deaths,
            bytes.len()
        );
    }
    log::info!("Synced {} bytes of state deltas over {} ticks", bytes_synced, arena_guard.tick);

    Ok(())
}

/// Aim at the nearest living opponent, strafe, and keep the trigger down
/// while they are visible
fn bot_commands(arena: &Arena, tick: u64) -> Vec<CombatCommand> {
    let eye_height = arena.config().eye_height;
    let detection = HitDetection::with_geometry(&arena.geometry);
    let mut commands = Vec::new();

    for bot in arena.combatants.values().filter(|c| c.is_alive()) {
        let player_id = bot.id;
        let eye = bot.eye_position(eye_height);

        let target = arena
            .combatants
            .values()
            .filter(|c| c.id != player_id && c.is_alive())
            .min_by(|a, b| {
                let da = a.position.distance_squared(bot.position);
                let db = b.position.distance_squared(bot.position);
                da.total_cmp(&db)
            });
        let target = match target {
            Some(t) => t,
            None => continue,
        };

        let chest = target.position + Vec3::new(0.0, 0.9, 0.0);
        let to_target = chest - eye;
        let horizontal = Vec2::new(to_target.x, to_target.z).length();
        commands.push(CombatCommand::Aim {
            player_id,
            yaw: to_target.z.atan2(to_target.x),
            pitch: to_target.y.atan2(horizontal),
            compensation: Vec2::new(0.0, 0.3),
        });

        let strafe = if (tick / 100 + player_id as u64) % 2 == 0 { 3.0 } else { -3.0 };
        commands.push(CombatCommand::Move {
            player_id,
            velocity: Vec2::new(0.0, strafe),
            movement: MovementState::grounded(),
        });

        if let Some(weapon) = bot.active_weapon() {
            if weapon.current_ammo() == 0 && weapon.reserve_ammo() > 0 && !weapon.is_reloading() {
                commands.push(CombatCommand::Reload { player_id });
                continue;
            }
        }

        if detection.has_line_of_sight(eye, chest, &arena.obstacles) {
            commands.push(CombatCommand::FirePressed { player_id });
        } else {
            commands.push(CombatCommand::FireReleased { player_id });
        }
    }

    commands
}

fn log_event(event: &CombatEvent) {
    match event {
        CombatEvent::EntityDied { player_id, killer_id } => {
            log::info!("Player {} eliminated by {:?}", player_id, killer_id);
        }
        CombatEvent::EntityRespawned { player_id, position } => {
            log::info!("Player {} respawned at {:?}", player_id, position);
        }
        CombatEvent::HitConfirmed { attacker_id, target_id, damage, shield_damage, health_damage, region, distance } => {
            log::debug!(
                "Hit {} -> {}: {:.1} damage ({:.1} shield, {:.1} health) to {:?} at {:.1}",
                attacker_id,
                target_id,
                damage,
                shield_damage,
                health_damage,
                region,
                distance
            );
        }
        CombatEvent::AdsProgress { .. } | CombatEvent::ShotFired { .. } => {
            log::trace!("{:?}", event);
        }
        other => log::debug!("{:?}", other),
    }
}

fn setup_logging() -> Result<(), Box<dyn std::error::Error>> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Utc::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stdout())
        .chain(fern::log_file("gungamecore.log")?)
        .apply()?;
    Ok(())
}
