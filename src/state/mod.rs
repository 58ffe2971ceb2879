pub mod arena;
pub mod combatant;
pub mod commands;
pub mod events;
pub mod snapshot;

pub use arena::Arena;
pub use commands::CombatCommand;
pub use events::CombatEvent;
