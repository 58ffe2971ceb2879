use std::sync::Arc;
use glam::Vec2;
use smallvec::SmallVec;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, Duration};
use crate::domain::hitscan::{has_line_of_sight, HitDetection, HitRegion, HitscanQuery, LayerMask};
use crate::domain::weapon::FireOutcome;
use crate::state::arena::Arena;
use crate::state::commands::{drain_and_coalesce, CombatCommand};
use crate::state::events::CombatEvent;
use crate::tick::delta_sync;
use crate::utils::buffers::SmallEventVec;
use crate::utils::config::Config;

/// Damage resolved by hitscan but not yet applied
#[derive(Debug, Clone, Copy)]
struct PendingDamage {
    target_id: u32,
    attacker_id: u32,
    damage: f32,
    region: HitRegion,
    distance: f32,
}

/// Everything one tick produced
#[derive(Debug, Clone)]
pub struct TickOutput {
    pub tick: u64,
    pub events: Vec<CombatEvent>,
    pub sync: SmallEventVec,
}

/// Per-arena tick loop - processes commands and forwards tick output
/// Runs at fixed tick rate (50Hz by default) with a fixed delta
pub async fn arena_tick_loop(
    arena: Arc<RwLock<Arena>>,
    mut command_rx: mpsc::Receiver<CombatCommand>,
    output_tx: mpsc::Sender<TickOutput>,
    config: Arc<Config>,
) {
    let tick_interval = Duration::from_millis(config.tick_interval_ms());
    let dt = config.tick_dt();
    let mut tick_timer = interval(tick_interval);

    loop {
        tick_timer.tick().await;

        // 1. Drain commands (coalesce moves/aims - keep only latest)
        let commands = drain_and_coalesce(&mut command_rx);

        // 2. Acquire lock ONCE per tick
        let output = {
            let mut arena_guard = arena.write().await;
            let events = step(&mut arena_guard, commands, dt);
            let sync = delta_sync::collect_dirty_events(&mut arena_guard);
            arena_guard.clear_dirty();
            TickOutput {
                tick: arena_guard.tick,
                events,
                sync,
            }
        };

        if output_tx.send(output).await.is_err() {
            log::info!("Tick output receiver closed, stopping arena loop");
            break;
        }
    }
}

/// Advance the arena by one fixed step
pub fn step(arena: &mut Arena, commands: Vec<CombatCommand>, dt: f32) -> Vec<CombatEvent> {
    let mut events = Vec::new();

    // 1. Intents
    for cmd in commands {
        process_command(arena, cmd, &mut events);
    }

    // 2. Movement with per-axis sliding against walls
    move_combatants(arena, dt);

    // 3. Weapon, health and respawn timers
    advance_timers(arena, dt, &mut events);

    // 4. Shots, resolved against positions as of this tick
    let pending = resolve_shots(arena, &mut events);

    // 5. Damage, serially by (target, attacker)
    apply_damage(arena, pending, &mut events);

    arena.tick += 1;
    events
}

/// Process a single command
fn process_command(arena: &mut Arena, cmd: CombatCommand, events: &mut Vec<CombatEvent>) {
    let player_id = cmd.player_id();

    match cmd {
        CombatCommand::Join { player_id, name, spawn } => {
            if let Err(e) = arena.add_combatant(player_id, name, spawn) {
                log::warn!("Failed to add player {}: {}", player_id, e);
            }
            return;
        }
        CombatCommand::Leave { player_id } => {
            arena.remove_combatant(player_id);
            return;
        }
        _ => {}
    }

    let combatant = match arena.combatants.get_mut(&player_id) {
        Some(c) if c.is_alive() => c,
        Some(_) => {
            log::debug!("Ignoring command from dead player {}", player_id);
            return;
        }
        None => {
            log::debug!("Command for unknown player {}", player_id);
            return;
        }
    };

    match cmd {
        CombatCommand::FirePressed { .. } => {
            if let Some(weapon) = combatant.active_weapon_mut() {
                weapon.pull_trigger();
            }
        }
        CombatCommand::FireReleased { .. } => {
            if let Some(weapon) = combatant.active_weapon_mut() {
                weapon.release_trigger();
            }
        }
        CombatCommand::Reload { .. } => {
            if let Some(weapon) = combatant.active_weapon_mut() {
                match weapon.reload() {
                    Ok(()) => events.push(CombatEvent::ReloadStarted {
                        player_id,
                        weapon_id: weapon.weapon_id(),
                    }),
                    Err(e) => log::debug!("Reload failed for player {}: {}", player_id, e),
                }
            }
        }
        CombatCommand::ToggleAds { .. } => {
            if let Some(weapon) = combatant.active_weapon_mut() {
                let target = !weapon.is_ads();
                weapon.set_ads(target);
            }
        }
        CombatCommand::SwitchFireMode { .. } => {
            if let Some(weapon) = combatant.active_weapon_mut() {
                let before = weapon.fire_mode();
                let fire_mode = weapon.switch_fire_mode();
                if fire_mode != before {
                    events.push(CombatEvent::FireModeChanged { player_id, fire_mode });
                }
            }
        }
        CombatCommand::EquipWeapon { slot, .. } => {
            if let Err(e) = combatant.equip_slot(slot) {
                log::debug!("Weapon switch failed for player {}: {}", player_id, e);
            }
        }
        CombatCommand::Move { velocity, movement, .. } => {
            combatant.velocity = velocity;
            combatant.movement = movement;
        }
        CombatCommand::Aim { yaw, pitch, compensation, .. } => {
            combatant.set_aim(yaw, pitch);
            combatant.compensation = compensation;
        }
        CombatCommand::Join { .. } | CombatCommand::Leave { .. } => {}
    }

    arena.mark_dirty(player_id);
}

fn move_combatants(arena: &mut Arena, dt: f32) {
    let speed = arena.config().move_speed;
    let radius = arena.config().combatant_radius;
    let mut moved: SmallVec<[u32; 8]> = SmallVec::new();

    let Arena { combatants, geometry, .. } = &mut *arena;
    for combatant in combatants.values_mut() {
        if !combatant.is_alive() || combatant.velocity == Vec2::ZERO {
            continue;
        }
        let delta = combatant.velocity.clamp_length_max(speed) * dt;
        let from = Vec2::new(combatant.position.x, combatant.position.z);
        let to = geometry.try_move(from, delta, radius);
        if to != from {
            combatant.position.x = to.x;
            combatant.position.z = to.y;
            moved.push(combatant.id);
        }
    }

    for id in moved {
        arena.mark_dirty(id);
    }
}

fn advance_timers(arena: &mut Arena, dt: f32, events: &mut Vec<CombatEvent>) {
    let mut changed: SmallVec<[u32; 8]> = SmallVec::new();
    let mut respawns: SmallVec<[u32; 4]> = SmallVec::new();

    for combatant in arena.combatants.values_mut() {
        let player_id = combatant.id;

        if !combatant.is_alive() {
            if let Some(timer) = combatant.respawn_timer.as_mut() {
                *timer -= dt;
                if *timer <= 0.0 {
                    respawns.push(player_id);
                }
            }
            continue;
        }

        let health_before = (combatant.health.current_health(), combatant.health.current_shield());
        combatant.health.update(dt);
        if health_before != (combatant.health.current_health(), combatant.health.current_shield()) {
            changed.push(player_id);
        }

        let slot = combatant.active_slot;
        if let Some(weapon) = combatant.active_weapon_mut() {
            let ads_before = weapon.ads_progress();
            let update = weapon.update(dt);

            if update.reload_completed {
                events.push(CombatEvent::ReloadCompleted {
                    player_id,
                    weapon_id: weapon.weapon_id(),
                    current_ammo: weapon.current_ammo(),
                    reserve_ammo: weapon.reserve_ammo(),
                });
            }
            if update.equip_completed {
                events.push(CombatEvent::WeaponEquipped {
                    player_id,
                    slot,
                    weapon_id: weapon.weapon_id(),
                });
            }
            if weapon.ads_progress() != ads_before {
                events.push(CombatEvent::AdsProgress {
                    player_id,
                    progress: weapon.ads_progress(),
                });
            }
            if update.reload_completed || update.equip_completed {
                changed.push(player_id);
            }
        }
    }

    for player_id in respawns {
        let position = arena.spawn_point_for(player_id);
        if let Some(combatant) = arena.combatants.get_mut(&player_id) {
            combatant.respawn(position);
            log::info!("Player {} respawned", player_id);
            events.push(CombatEvent::EntityRespawned { player_id, position });
            changed.push(player_id);
        }
    }

    for id in changed {
        arena.mark_dirty(id);
    }
}

fn resolve_shots(arena: &mut Arena, events: &mut Vec<CombatEvent>) -> Vec<PendingDamage> {
    let targets = arena.hit_targets();
    let eye_height = arena.config().eye_height;
    let max_distance = arena.config().hitscan_max_distance;
    let mut pending = Vec::new();
    let mut shooters: SmallVec<[u32; 8]> = SmallVec::new();

    let Arena { combatants, geometry, obstacles, rng, .. } = &mut *arena;
    let detection = HitDetection::with_geometry(geometry);

    for combatant in combatants.values_mut() {
        if !combatant.is_alive() {
            continue;
        }
        let player_id = combatant.id;
        let ctx = combatant.fire_context();
        let origin = combatant.eye_position(eye_height);
        let direction = combatant.aim_direction();

        let outcome = match combatant.active_weapon_mut().and_then(|w| w.poll_trigger(&ctx)) {
            Some(outcome) => outcome,
            None => continue,
        };
        shooters.push(player_id);

        let descriptor = match outcome {
            FireOutcome::Fired(descriptor) => descriptor,
            FireOutcome::DryFire => {
                let weapon_id = combatant.active_weapon().map(|w| w.weapon_id()).unwrap_or(0);
                events.push(CombatEvent::DryFire { player_id, weapon_id });
                continue;
            }
            FireOutcome::NotReady(reason) => {
                log::trace!("Player {} trigger not ready: {:?}", player_id, reason);
                continue;
            }
        };

        // recoil affects the next shot, not this one
        combatant.apply_recoil(descriptor.recoil);

        let query = HitscanQuery::new(origin, direction)
            .with_spread(descriptor.spread)
            .with_max_distance(descriptor.max_range.min(max_distance))
            .with_layer_mask(LayerMask::PLAYER | LayerMask::PROP)
            .ignoring(player_id);
        let hit = detection.hitscan(&query, &targets, &mut *rng);

        events.push(CombatEvent::ShotFired {
            player_id,
            weapon_id: descriptor.weapon_id,
            origin,
            direction: hit.direction,
            spread: descriptor.spread,
        });

        let (target_id, region) = match (hit.target_id, hit.region) {
            (Some(target_id), Some(region)) => (target_id, region),
            _ => continue,
        };
        if !has_line_of_sight(origin, hit.point, obstacles) {
            log::debug!("Shot from {} at {} blocked by obstacle", player_id, target_id);
            continue;
        }

        pending.push(PendingDamage {
            target_id,
            attacker_id: player_id,
            damage: descriptor.damage_at(hit.distance, hit.is_headshot),
            region,
            distance: hit.distance,
        });
    }

    for id in shooters {
        arena.mark_dirty(id);
    }
    pending
}

fn apply_damage(arena: &mut Arena, mut pending: Vec<PendingDamage>, events: &mut Vec<CombatEvent>) {
    pending.sort_by_key(|p| (p.target_id, p.attacker_id));
    let respawn_delay = arena.config().respawn_delay_secs;

    for hit in pending {
        let (killed, shield_damage, health_damage) = match arena.combatants.get_mut(&hit.target_id) {
            Some(target) if target.is_alive() => {
                let shield_before = target.health.current_shield();
                let health_before = target.health.current_health();
                let killed = target.health.take_damage(hit.damage, hit.attacker_id);
                if killed {
                    target.die(respawn_delay);
                }
                (
                    killed,
                    shield_before - target.health.current_shield(),
                    health_before - target.health.current_health(),
                )
            }
            _ => {
                log::debug!("Discarding damage from {} to dead player {}", hit.attacker_id, hit.target_id);
                continue;
            }
        };

        events.push(CombatEvent::HitConfirmed {
            attacker_id: hit.attacker_id,
            target_id: hit.target_id,
            damage: hit.damage,
            shield_damage,
            health_damage,
            region: hit.region,
            distance: hit.distance,
        });
        arena.mark_dirty(hit.target_id);

        if killed {
            if let Some(attacker) = arena.combatants.get_mut(&hit.attacker_id) {
                attacker.kills += 1;
            }
            log::info!("Player {} killed by {}", hit.target_id, hit.attacker_id);
            events.push(CombatEvent::EntityDied {
                player_id: hit.target_id,
                killer_id: Some(hit.attacker_id),
            });
        }
    }
}
