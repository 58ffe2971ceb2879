pub mod geometry;
pub mod health;
pub mod hitscan;
pub mod recoil;
pub mod spread;
pub mod weapon;
