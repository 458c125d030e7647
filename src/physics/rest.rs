use bevy::prelude::*;
use bevy_rapier2d::prelude::Velocity;

use crate::core::components::{Ball, BallState};
use crate::core::config::GameConfig;
use crate::core::system::system_order::PostPhysicsAdjustSet;
use crate::physics::stability::stability_pass;

/// Reported exactly once per settle; the shot flow listens for it.
#[derive(Event, Debug, Clone, Copy)]
pub struct AllBallsStopped;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestPhase {
    Moving,
    Settling,
    Stopped,
}

/// Frame-counted consensus that every active ball sits below the rest
/// threshold. Externally resettable (a new shot forces re-entry into Moving).
#[derive(Resource, Debug, Clone)]
pub struct RestDetector {
    pub phase: RestPhase,
    pub consecutive_slow: u32,
}

impl Default for RestDetector {
    fn default() -> Self {
        Self {
            phase: RestPhase::Moving,
            consecutive_slow: 0,
        }
    }
}

impl RestDetector {
    pub fn reset(&mut self) {
        self.phase = RestPhase::Moving;
        self.consecutive_slow = 0;
    }

    /// Advances one frame of observation. Returns true exactly on the frame
    /// the detector enters Stopped; any fast frame zeroes the count outright.
    pub fn observe(&mut self, all_slow: bool, required: u32) -> bool {
        if !all_slow {
            self.phase = RestPhase::Moving;
            self.consecutive_slow = 0;
            return false;
        }
        if self.phase == RestPhase::Stopped {
            return false;
        }
        self.phase = RestPhase::Settling;
        self.consecutive_slow += 1;
        if self.consecutive_slow >= required {
            self.phase = RestPhase::Stopped;
            return true;
        }
        false
    }
}

pub struct RestDetectorPlugin;

impl Plugin for RestDetectorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RestDetector>()
            .add_event::<AllBallsStopped>()
            .add_systems(
                Update,
                detect_rest.after(stability_pass).in_set(PostPhysicsAdjustSet),
            );
    }
}

pub fn detect_rest(
    cfg: Res<GameConfig>,
    mut detector: ResMut<RestDetector>,
    mut q: Query<(&mut Velocity, &BallState), With<Ball>>,
    mut ev_stopped: EventWriter<AllBallsStopped>,
) {
    let all_slow = q
        .iter()
        .filter(|(_, state)| state.active)
        .all(|(vel, _)| vel.linvel.length() < cfg.speed.min_rest_speed);

    if detector.observe(all_slow, cfg.speed.rest_frames_required) {
        // Snap everything to exact zero: kills residual micro-jitter.
        for (mut vel, state) in q.iter_mut() {
            if state.active {
                vel.linvel = Vec2::ZERO;
            }
        }
        ev_stopped.write(AllBallsStopped);
    }
}
