pub mod app;
pub mod core;
pub mod debug;
pub mod gameplay;
pub mod physics;

// Curated re-exports
pub use crate::core::components::{Ball, BallRadius, BallState, Building, BuildingState, CueBall};
pub use crate::core::config::config::GameConfig;
pub use app::game::GamePlugin;
