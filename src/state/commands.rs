use std::collections::BTreeMap;
use glam::{Vec2, Vec3};
use tokio::sync::mpsc;
use crate::domain::spread::MovementState;

/// Intent sent from input handlers to the arena tick loop
#[derive(Debug, Clone, PartialEq)]
pub enum CombatCommand {
    // Player management
    Join {
        player_id: u32,
        name: String,
        spawn: Option<Vec3>,
    },
    Leave {
        player_id: u32,
    },

    // Trigger and weapon handling
    FirePressed {
        player_id: u32,
    },
    FireReleased {
        player_id: u32,
    },
    Reload {
        player_id: u32,
    },
    ToggleAds {
        player_id: u32,
    },
    SwitchFireMode {
        player_id: u32,
    },
    EquipWeapon {
        player_id: u32,
        slot: usize,
    },

    // Continuous input (only latest kept per player)
    Move {
        player_id: u32,
        /// Desired planar velocity on (x, z)
        velocity: Vec2,
        movement: MovementState,
    },
    Aim {
        player_id: u32,
        /// Radians from +X towards +Z
        yaw: f32,
        pitch: f32,
        /// Degrees of (yaw, pitch) the player pulls against recoil
        compensation: Vec2,
    },
}

impl CombatCommand {
    pub fn player_id(&self) -> u32 {
        match self {
            CombatCommand::Join { player_id, .. }
            | CombatCommand::Leave { player_id }
            | CombatCommand::FirePressed { player_id }
            | CombatCommand::FireReleased { player_id }
            | CombatCommand::Reload { player_id }
            | CombatCommand::ToggleAds { player_id }
            | CombatCommand::SwitchFireMode { player_id }
            | CombatCommand::EquipWeapon { player_id, .. }
            | CombatCommand::Move { player_id, .. }
            | CombatCommand::Aim { player_id, .. } => *player_id,
        }
    }
}

/// Keep only the latest Move and Aim per player. Discrete intents keep their
/// arrival order and come first, followed by moves then aims in player order.
pub fn coalesce<I>(commands: I) -> Vec<CombatCommand>
where
    I: IntoIterator<Item = CombatCommand>,
{
    let mut latest_moves: BTreeMap<u32, CombatCommand> = BTreeMap::new();
    let mut latest_aims: BTreeMap<u32, CombatCommand> = BTreeMap::new();
    let mut other_commands: Vec<CombatCommand> = Vec::new();

    for cmd in commands {
        match cmd {
            CombatCommand::Move { player_id, .. } => {
                latest_moves.insert(player_id, cmd);
            }
            CombatCommand::Aim { player_id, .. } => {
                latest_aims.insert(player_id, cmd);
            }
            _ => other_commands.push(cmd),
        }
    }

    other_commands.extend(latest_moves.into_values());
    other_commands.extend(latest_aims.into_values());
    other_commands
}

/// Drain everything currently queued and coalesce it
pub fn drain_and_coalesce(rx: &mut mpsc::Receiver<CombatCommand>) -> Vec<CombatCommand> {
    let mut drained = Vec::new();
    while let Ok(cmd) = rx.try_recv() {
        drained.push(cmd);
    }
    coalesce(drained)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn move_cmd(player_id: u32, x: f32) -> CombatCommand {
        CombatCommand::Move {
            player_id,
            velocity: Vec2::new(x, 0.0),
            movement: MovementState::grounded(),
        }
    }

    #[tokio::test]
    async fn test_move_coalescing() {
        let (tx, mut rx) = mpsc::channel(100);

        tx.send(move_cmd(1, 1.0)).await.unwrap();
        tx.send(move_cmd(1, 2.0)).await.unwrap();
        tx.send(move_cmd(1, 3.0)).await.unwrap();

        let commands = drain_and_coalesce(&mut rx);

        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0], move_cmd(1, 3.0));
    }

    #[tokio::test]
    async fn test_mixed_commands() {
        let (tx, mut rx) = mpsc::channel(100);

        tx.send(CombatCommand::FirePressed { player_id: 1 }).await.unwrap();
        tx.send(move_cmd(1, 1.0)).await.unwrap();
        tx.send(CombatCommand::Aim { player_id: 1, yaw: 0.5, pitch: 0.0, compensation: Vec2::ZERO })
            .await
            .unwrap();
        tx.send(CombatCommand::Reload { player_id: 1 }).await.unwrap();
        tx.send(move_cmd(1, 2.0)).await.unwrap();

        let commands = drain_and_coalesce(&mut rx);

        // FirePressed, Reload, then latest Move, then Aim
        assert_eq!(commands.len(), 4);
        assert!(matches!(commands[0], CombatCommand::FirePressed { .. }));
        assert!(matches!(commands[1], CombatCommand::Reload { .. }));
        assert_eq!(commands[2], move_cmd(1, 2.0));
        assert!(matches!(commands[3], CombatCommand::Aim { .. }));
    }

    #[test]
    fn test_multiple_players_sorted() {
        let commands = coalesce(vec![move_cmd(3, 1.0), move_cmd(1, 1.0), move_cmd(3, 5.0)]);
        let ids: Vec<u32> = commands.iter().map(|c| c.player_id()).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(commands[1], move_cmd(3, 5.0));
    }

    #[test]
    fn test_drain_empty_channel() {
        let (_tx, mut rx) = mpsc::channel::<CombatCommand>(4);
        assert!(drain_and_coalesce(&mut rx).is_empty());
    }

    #[test]
    fn test_drain_blocking_send() {
        let (tx, mut rx) = mpsc::channel(4);
        tokio_test::block_on(async {
            tx.send(CombatCommand::ToggleAds { player_id: 2 }).await.unwrap();
        });
        let commands = drain_and_coalesce(&mut rx);
        assert_eq!(commands, vec![CombatCommand::ToggleAds { player_id: 2 }]);
    }
}
