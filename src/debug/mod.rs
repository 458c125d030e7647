use bevy::prelude::*;

#[cfg(feature = "debug")]
use crate::core::components::{Ball, BallState, Building};
#[cfg(feature = "debug")]
use crate::core::config::GameConfig;
#[cfg(feature = "debug")]
use crate::gameplay::scoring::ScoreBoard;
#[cfg(feature = "debug")]
use crate::physics::rest::RestDetector;

pub struct DebugPlugin;

impl Plugin for DebugPlugin {
    fn build(&self, app: &mut App) {
        #[cfg(feature = "debug")]
        app.init_resource::<LogState>()
            .add_systems(Update, sim_stats_log);
        #[cfg(not(feature = "debug"))]
        let _ = app;
    }
}

#[cfg(feature = "debug")]
#[derive(Resource, Default)]
struct LogState {
    time_accum: f32,
    frame_counter: u64,
}

#[cfg(feature = "debug")]
fn sim_stats_log(
    time: Res<Time>,
    cfg: Res<GameConfig>,
    mut state: ResMut<LogState>,
    q_balls: Query<&BallState, With<Ball>>,
    q_buildings: Query<(), With<Building>>,
    score: Res<ScoreBoard>,
    rest: Res<RestDetector>,
) {
    state.frame_counter += 1;
    state.time_accum += time.delta_secs();
    if state.time_accum < cfg.session.log_interval {
        return;
    }
    state.time_accum = 0.0;
    let balls = q_balls.iter().filter(|s| s.active).count();
    info!(
        "SIM frame={} t={:.2}s balls={} buildings={} score={}/{} shots={} rest={:?}",
        state.frame_counter,
        time.elapsed_secs(),
        balls,
        q_buildings.iter().count(),
        score.score,
        score.target_score,
        score.shots_remaining,
        rest.phase
    );
}
