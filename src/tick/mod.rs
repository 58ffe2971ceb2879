pub mod arena_tick;
pub mod delta_sync;
