pub mod assets;
pub mod delivery;
