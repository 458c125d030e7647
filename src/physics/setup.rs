use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

use crate::core::config::GameConfig;

/// Wrapper configuring the black-box integrator. Table play is top-down, so
/// global gravity is neutralized per body via `GravityScale(0.0)` at spawn
/// rather than through the integrator's world settings.
pub struct PhysicsSetupPlugin;

impl Plugin for PhysicsSetupPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
            .add_systems(Startup, configure_solver);
    }
}

/// Solver configuration handed over once at initialization.
fn configure_solver(mut commands: Commands, cfg: Res<GameConfig>) {
    commands.insert_resource(TimestepMode::Variable {
        max_dt: cfg.solver.max_dt,
        time_scale: 1.0,
        substeps: cfg.solver.substeps,
    });
    info!(
        target: "physics",
        "solver configured: substeps={} max_dt={:.4}",
        cfg.solver.substeps,
        cfg.solver.max_dt
    );
}
