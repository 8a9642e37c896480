pub mod bridge;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod media_player;
pub mod volume;
