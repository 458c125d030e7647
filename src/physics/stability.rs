use bevy::prelude::*;
use bevy_rapier2d::prelude::Velocity;

use crate::core::components::{Ball, BallState};
use crate::core::config::GameConfig;
use crate::core::system::system_order::PostPhysicsAdjustSet;

pub struct StabilityPlugin;

impl Plugin for StabilityPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, stability_pass.in_set(PostPhysicsAdjustSet));
    }
}

/// Post-integration stability correction, once per frame over every active
/// ball. Order per ball: non-finite guard, hard speed cap, grace countdown,
/// exponential damping, near-zero jitter suppression. The damping gates read
/// the post-cap speed, so a single pass never flips a gate on itself.
pub fn stability_pass(
    cfg: Res<GameConfig>,
    mut q: Query<(&mut Velocity, &mut BallState), With<Ball>>,
) {
    let sp = &cfg.speed;
    for (mut vel, mut state) in q.iter_mut() {
        if !state.active {
            continue;
        }
        let v = vel.linvel;

        // Corrupt solver output: snap to rest rather than propagate.
        if !v.x.is_finite() || !v.y.is_finite() {
            vel.linvel = Vec2::ZERO;
            continue;
        }

        let mut speed = v.length();
        if speed > sp.max_speed {
            vel.linvel = v * (sp.max_speed / speed);
            speed = sp.max_speed;
        }

        // Fresh shot / fresh impulse: hold off damping while the grace runs.
        if state.grace_frames > 0 {
            state.grace_frames -= 1;
            continue;
        }

        if speed > sp.min_rest_speed {
            vel.linvel *= sp.damping;
        }
        if speed > 0.0 && speed < sp.jitter_band {
            vel.linvel *= sp.jitter_damping;
        }
    }
}
