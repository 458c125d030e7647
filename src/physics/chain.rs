use bevy::prelude::*;
use bevy_rapier2d::prelude::Velocity;

use crate::core::components::{Ball, BallState};
use crate::core::config::GameConfig;
use crate::core::system::system_order::AbilitySet;
use crate::gameplay::abilities::{capture_ball_snapshot, BallSnapshot};
use crate::physics::collision::BallBallImpact;

pub struct ChainReactionPlugin;

impl Plugin for ChainReactionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            chain_reaction.after(capture_ball_snapshot).in_set(AbilitySet),
        );
    }
}

/// Radial push from high-impact collision points onto nearby balls. A
/// universal physics consequence of strong hits; runs in addition to any
/// chain-type ability, never through the ability tables.
pub fn chain_reaction(
    mut ev_impacts: EventReader<BallBallImpact>,
    cfg: Res<GameConfig>,
    snapshot: Res<BallSnapshot>,
    mut q: Query<(&mut Velocity, &BallState), With<Ball>>,
) {
    let cp = &cfg.chain_push;
    for ev in ev_impacts.read() {
        if ev.impact <= cp.trigger_threshold {
            continue;
        }
        let scale = (ev.impact / cp.impact_reference).min(cp.max_impact_scale);
        for entry in snapshot.0.iter() {
            if entry.entity == ev.a || entry.entity == ev.b {
                continue;
            }
            let delta = entry.pos - ev.midpoint;
            let dist = delta.length();
            if dist >= cp.radius || dist < 1.0 {
                continue;
            }
            // Falls off linearly with distance, scales with (capped) impact.
            let push = (delta / dist) * cp.strength * (1.0 - dist / cp.radius) * scale;
            if let Ok((mut vel, state)) = q.get_mut(entry.entity) {
                if state.active {
                    vel.linvel += push;
                }
            }
        }
    }
}
