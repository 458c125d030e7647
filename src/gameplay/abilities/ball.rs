use bevy::prelude::*;
use bevy_rapier2d::prelude::Velocity;
use rand::Rng;
use smallvec::SmallVec;

use crate::core::components::{Ball, BallState, Building};
use crate::core::config::GameConfig;
use crate::core::level::catalog::EntityCatalog;
use crate::core::level::layout::TableBounds;
use crate::gameplay::abilities::{BallAbility, BallSnapshot};
use crate::gameplay::cooldown::{now_ms, DeferredAction, DeferredActions};
use crate::gameplay::spawn::{spawn_ball_from_def, SpawnOpts};
use crate::physics::collision::BallBallImpact;

/// Deferred edits to balls other than the acting one. Applied after the event
/// loop so every pair resolves against the same pre-handler state, keeping the
/// outcome independent of contact-pair report order.
enum PendingOp {
    Push(Entity, Vec2),
    Slow(Entity, f32, u64),
}

fn heading_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

/// Ball-ball ability dispatch. Both participants get their handler invoked,
/// mirroring the symmetric dispatch of the collision router. Most handlers arm
/// the cooldown first and silently abort when a reset is still pending, the
/// defense against the integrator reporting one touch as several pairs.
pub fn ball_collision_abilities(
    mut ev_impacts: EventReader<BallBallImpact>,
    mut commands: Commands,
    time: Res<Time>,
    cfg: Res<GameConfig>,
    catalog: Res<EntityCatalog>,
    table: Res<TableBounds>,
    snapshot: Res<BallSnapshot>,
    mut sched: ResMut<DeferredActions>,
    mut q_balls: Query<
        (&mut Transform, &mut Velocity, &mut BallState),
        (With<Ball>, Without<Building>),
    >,
) {
    let now = now_ms(&time);
    let mut rng = rand::thread_rng();
    let mut pending: SmallVec<[PendingOp; 8]> = SmallVec::new();

    for ev in ev_impacts.read() {
        for (self_e, other_e) in [(ev.a, ev.b), (ev.b, ev.a)] {
            let Ok((mut tf, mut vel, mut state)) = q_balls.get_mut(self_e) else {
                continue;
            };
            if !state.active {
                continue;
            }
            let self_pos = tf.translation.truncate();
            match state.ability {
                BallAbility::None
                | BallAbility::Phase { .. }
                | BallAbility::ScoreMultiplier { .. } => {}

                BallAbility::Explode {
                    blast_radius,
                    blast_force,
                } => {
                    if !state.try_arm_cooldown() {
                        continue;
                    }
                    sched.schedule(now + state.cooldown_ms, self_e, DeferredAction::ResetBallTrigger);
                    for entry in snapshot.0.iter() {
                        if entry.entity == self_e {
                            continue;
                        }
                        let delta = entry.pos - self_pos;
                        let dist = delta.length();
                        if dist < blast_radius && dist > 0.0 {
                            let falloff = 1.0 - dist / blast_radius;
                            pending.push(PendingOp::Push(
                                entry.entity,
                                (delta / dist) * blast_force * falloff,
                            ));
                        }
                    }
                    debug!(target: "abilities", "explode at {self_pos} r={blast_radius}");
                }

                BallAbility::Split {
                    count,
                    child_radius,
                    spawn_offset_multiplier,
                    inherit_velocity_factor,
                } => {
                    // One-shot: the split flag survives the cooldown reset.
                    if state.has_split {
                        continue;
                    }
                    if !state.try_arm_cooldown() {
                        continue;
                    }
                    sched.schedule(now + state.cooldown_ms, self_e, DeferredAction::ResetBallTrigger);
                    state.has_split = true;
                    let Some(def) = catalog.ball("ball_basic") else {
                        continue;
                    };
                    let speed = vel.linvel.length();
                    let heading = heading_of(vel.linvel);
                    for i in 0..count.max(1) {
                        let angle = std::f32::consts::TAU * i as f32 / count.max(1) as f32
                            + heading
                            + std::f32::consts::FRAC_PI_2;
                        let dir = Vec2::from_angle(angle);
                        let offset = child_radius * spawn_offset_multiplier;
                        spawn_ball_from_def(
                            &mut commands,
                            &cfg,
                            def,
                            self_pos + dir * offset,
                            SpawnOpts {
                                velocity: dir * speed * inherit_velocity_factor,
                                radius_override: Some(child_radius),
                                is_cue: false,
                            },
                        );
                    }
                }

                BallAbility::Knockback {
                    extra_force,
                    knockback_multiplier,
                } => {
                    let Some(other) = snapshot.0.iter().find(|s| s.entity == other_e) else {
                        continue;
                    };
                    let delta = other.pos - self_pos;
                    let dist = delta.length().max(1.0);
                    pending.push(PendingOp::Push(
                        other_e,
                        (delta / dist) * extra_force * knockback_multiplier,
                    ));
                }

                BallAbility::Dash {
                    dash_force,
                    dash_angle_spread,
                } => {
                    if !state.try_arm_cooldown() {
                        continue;
                    }
                    sched.schedule(now + state.cooldown_ms, self_e, DeferredAction::ResetBallTrigger);
                    let heading =
                        heading_of(vel.linvel) + (rng.gen::<f32>() - 0.5) * dash_angle_spread;
                    vel.linvel += Vec2::from_angle(heading) * dash_force;
                }

                BallAbility::Slow {
                    slow_factor,
                    slow_duration_ms,
                } => {
                    if !state.try_arm_cooldown() {
                        continue;
                    }
                    sched.schedule(now + state.cooldown_ms, self_e, DeferredAction::ResetBallTrigger);
                    pending.push(PendingOp::Slow(other_e, slow_factor, slow_duration_ms));
                }

                BallAbility::TeleportRandom {
                    preserve_velocity_factor,
                    min_interval_ms,
                } => {
                    // Interval guard is separate from the cooldown; it also
                    // covers portal hops, stopping same-frame oscillation.
                    if let Some(last) = state.last_teleport_ms {
                        if now.saturating_sub(last) < min_interval_ms {
                            continue;
                        }
                    }
                    if !state.try_arm_cooldown() {
                        continue;
                    }
                    sched.schedule(now + state.cooldown_ms, self_e, DeferredAction::ResetBallTrigger);
                    state.last_teleport_ms = Some(now);
                    let dest = table.random_point(40.0, &mut rng);
                    tf.translation = dest.extend(tf.translation.z);
                    vel.linvel *= preserve_velocity_factor;
                }

                BallAbility::Chain {
                    chain_count,
                    chain_range,
                    chain_force,
                } => {
                    if !state.try_arm_cooldown() {
                        continue;
                    }
                    sched.schedule(now + state.cooldown_ms, self_e, DeferredAction::ResetBallTrigger);
                    // Seeded with the original pair so the arc never doubles
                    // straight back.
                    let mut visited: SmallVec<[Entity; 8]> = SmallVec::new();
                    visited.push(self_e);
                    visited.push(other_e);
                    let mut current = snapshot
                        .0
                        .iter()
                        .find(|s| s.entity == other_e)
                        .map(|s| s.pos)
                        .unwrap_or(self_pos);
                    for _ in 0..chain_count {
                        let mut nearest: Option<(Entity, Vec2, f32)> = None;
                        for entry in snapshot.0.iter() {
                            if visited.contains(&entry.entity) {
                                continue;
                            }
                            let d = entry.pos.distance(current);
                            if d < chain_range && nearest.map(|(_, _, nd)| d < nd).unwrap_or(true) {
                                nearest = Some((entry.entity, entry.pos, d));
                            }
                        }
                        let Some((hit, hit_pos, dist)) = nearest else {
                            break;
                        };
                        visited.push(hit);
                        pending.push(PendingOp::Push(
                            hit,
                            (hit_pos - current) / dist.max(1.0) * chain_force,
                        ));
                        current = hit_pos;
                    }
                }
            }
        }
    }

    for op in pending {
        match op {
            PendingOp::Push(e, dv) => {
                if let Ok((_, mut vel, state)) = q_balls.get_mut(e) {
                    if state.active {
                        vel.linvel += dv;
                    }
                }
            }
            PendingOp::Slow(e, factor, duration_ms) => {
                if let Ok((_, mut vel, mut state)) = q_balls.get_mut(e) {
                    if state.active {
                        vel.linvel *= factor;
                        state.slowed = true;
                        sched.schedule(now + duration_ms, e, DeferredAction::ClearSlow);
                    }
                }
            }
        }
    }
}
