pub mod block;
pub mod coords;
pub mod inventory;
pub mod physics;
pub mod player;
pub mod water;
pub mod world;
pub mod worldgen;
