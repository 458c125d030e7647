use std::collections::HashMap;

use bevy::prelude::*;
use bevy_rapier2d::prelude::Velocity;
use rand::Rng;

use crate::core::components::{Ball, BallState, Building, BuildingState, CueBall};
use crate::core::config::GameConfig;
use crate::core::level::catalog::EntityCatalog;
use crate::gameplay::abilities::BuildingBehavior;
use crate::gameplay::cooldown::{now_ms, DeferredAction, DeferredActions};
use crate::gameplay::scoring::{ScoreBoard, ScoreChanged};
use crate::gameplay::spawn::{spawn_ball_from_def, SpawnOpts};
use crate::physics::collision::{BallBuildingContact, BallRemovedForScore};

/// Redirect-style behaviors decline to act on a ball that is basically at
/// rest; kicking a stationary ball around reads as a glitch.
const MIN_ACT_SPEED: f32 = 6.0;

/// Building reactions to ball contact. A building whose record named an
/// unknown action has no behavior and the contact falls through silently.
pub fn building_contact_behaviors(
    mut ev_contacts: EventReader<BallBuildingContact>,
    mut commands: Commands,
    time: Res<Time>,
    cfg: Res<GameConfig>,
    catalog: Res<EntityCatalog>,
    mut sched: ResMut<DeferredActions>,
    mut score: ResMut<ScoreBoard>,
    mut ev_score: EventWriter<ScoreChanged>,
    mut q_buildings: Query<(Entity, &Transform, &mut BuildingState), (With<Building>, Without<Ball>)>,
    mut q_balls: Query<
        (&mut Transform, &mut Velocity, &mut BallState),
        (With<Ball>, Without<Building>),
    >,
) {
    let now = now_ms(&time);
    let mut rng = rand::thread_rng();
    // Frozen building positions; a portal's pair may sit anywhere in the batch.
    let building_pos: HashMap<Entity, Vec2> = q_buildings
        .iter()
        .map(|(e, tf, _)| (e, tf.translation.truncate()))
        .collect();

    for ev in ev_contacts.read() {
        let Ok((_, b_tf, mut b_state)) = q_buildings.get_mut(ev.building) else {
            continue;
        };
        let Ok((mut ball_tf, mut vel, mut ball_state)) = q_balls.get_mut(ev.ball) else {
            continue;
        };
        if !ball_state.active {
            continue;
        }

        // Ghost balls spend a pass instead of triggering the building.
        if ball_state.ghost_passes_remaining > 0 {
            ball_state.ghost_passes_remaining -= 1;
            continue;
        }

        let Some(behavior) = b_state.behavior.clone() else {
            continue;
        };
        let b_pos = b_tf.translation.truncate();
        match behavior {
            BuildingBehavior::Teleport {
                min_interval_ms,
                spawn_offset,
                preserve_velocity_factor,
            } => {
                let Some(target) = b_state.linked else {
                    continue;
                };
                let Some(&target_pos) = building_pos.get(&target) else {
                    continue;
                };
                if let Some(last) = ball_state.last_teleport_ms {
                    if now.saturating_sub(last) < min_interval_ms {
                        continue;
                    }
                }
                ball_state.last_teleport_ms = Some(now);
                let heading = vel.linvel.y.atan2(vel.linvel.x);
                let exit = target_pos + Vec2::from_angle(heading) * spawn_offset;
                ball_tf.translation = exit.extend(ball_tf.translation.z);
                vel.linvel *= preserve_velocity_factor;
                debug!(target: "abilities", "portal hop {:?} -> {:?}", ev.building, target);
            }

            BuildingBehavior::Bounce {
                base_force,
                impulse_multiplier,
            } => {
                let delta = ball_tf.translation.truncate() - b_pos;
                let dist = delta.length().max(1.0);
                vel.linvel += (delta / dist) * base_force * impulse_multiplier;
            }

            BuildingBehavior::Split {
                cooldown_ms,
                spawn_count,
                spawn_speed,
                spawn_ball_id,
            } => {
                if !b_state.try_arm_cooldown() {
                    continue;
                }
                sched.schedule(now + cooldown_ms, ev.building, DeferredAction::ResetBuildingTrigger);
                let Some(def) = catalog.ball(&spawn_ball_id) else {
                    warn!(target: "abilities", "splitter references unknown ball '{spawn_ball_id}'");
                    continue;
                };
                for _ in 0..spawn_count {
                    let dir = Vec2::from_angle(rng.gen::<f32>() * std::f32::consts::TAU);
                    spawn_ball_from_def(
                        &mut commands,
                        &cfg,
                        def,
                        b_pos + dir * 20.0,
                        SpawnOpts {
                            velocity: dir * spawn_speed,
                            ..Default::default()
                        },
                    );
                }
            }

            BuildingBehavior::Absorb {
                max_absorbs,
                speed_reduction,
                score_bonus,
            } => {
                if b_state.absorb_count >= max_absorbs {
                    continue;
                }
                b_state.absorb_count += 1;
                vel.linvel *= speed_reduction;
                if score_bonus > 0 {
                    score.add_score(score_bonus as u64);
                    ev_score.write(ScoreChanged {
                        total: score.score,
                        delta: score_bonus as u64,
                    });
                }
            }

            BuildingBehavior::Accelerate {
                boost_multiplier,
                max_exit_speed,
            } => {
                let speed = vel.linvel.length();
                if speed < MIN_ACT_SPEED {
                    continue;
                }
                let new_speed = (speed * boost_multiplier).min(max_exit_speed);
                vel.linvel = vel.linvel / speed * new_speed;
            }

            // Passive: the zone is polled at score time, the field every frame.
            BuildingBehavior::MultiplierZone { .. } | BuildingBehavior::Attract { .. } => {}

            BuildingBehavior::Deflect {
                deflect_angle,
                preserve_speed,
            } => {
                let speed = vel.linvel.length();
                if speed < MIN_ACT_SPEED {
                    continue;
                }
                let heading = vel.linvel.y.atan2(vel.linvel.x) + deflect_angle;
                let new_speed = if preserve_speed { speed } else { speed * 0.9 };
                vel.linvel = Vec2::from_angle(heading) * new_speed;
            }

            BuildingBehavior::Duplicate {
                cooldown_ms,
                max_duplicates,
                offset_angle,
                duplicate_speed_factor,
            } => {
                if !b_state.try_arm_cooldown() {
                    continue;
                }
                sched.schedule(now + cooldown_ms, ev.building, DeferredAction::ResetBuildingTrigger);
                if b_state.duplicate_count >= max_duplicates {
                    continue;
                }
                b_state.duplicate_count += 1;
                let Some(def) = catalog.ball(&ball_state.type_id) else {
                    continue;
                };
                let speed = vel.linvel.length();
                let heading = vel.linvel.y.atan2(vel.linvel.x) + offset_angle;
                let dir = Vec2::from_angle(heading);
                spawn_ball_from_def(
                    &mut commands,
                    &cfg,
                    def,
                    b_pos + dir * 20.0,
                    SpawnOpts {
                        velocity: dir * speed * duplicate_speed_factor,
                        ..Default::default()
                    },
                );
            }

            BuildingBehavior::Chaos {
                random_angle_range,
                speed_jitter_min,
                speed_jitter_max,
            } => {
                let speed = vel.linvel.length();
                if speed < MIN_ACT_SPEED {
                    continue;
                }
                let heading = rng.gen::<f32>() * random_angle_range;
                let jitter =
                    speed_jitter_min + rng.gen::<f32>() * (speed_jitter_max - speed_jitter_min);
                let new_speed = (speed * jitter).min(cfg.speed.max_speed * 0.9);
                vel.linvel = Vec2::from_angle(heading) * new_speed;
            }
        }
    }
}

/// Per-frame field pass (attract wells). Pull scales linearly toward the rim,
/// an extra per-frame damping bleeds speed inside the field, and the inner
/// kill radius consumes any non-cue ball for score credit.
pub fn building_field_tick(
    time: Res<Time>,
    q_buildings: Query<(&Transform, &BuildingState), (With<Building>, Without<Ball>)>,
    mut q_balls: Query<
        (Entity, &Transform, &mut Velocity, &BallState, Option<&CueBall>),
        (With<Ball>, Without<Building>),
    >,
    mut ev_removed: EventWriter<BallRemovedForScore>,
) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }
    for (b_tf, b_state) in q_buildings.iter() {
        let Some(BuildingBehavior::Attract {
            attract_radius,
            attract_strength,
            slow_factor,
            inner_kill_radius,
        }) = &b_state.behavior
        else {
            continue;
        };
        let (radius, strength, slow, kill) = (
            *attract_radius,
            *attract_strength,
            *slow_factor,
            *inner_kill_radius,
        );
        let center = b_tf.translation.truncate();
        for (entity, tf, mut vel, state, cue) in q_balls.iter_mut() {
            if !state.active {
                continue;
            }
            let pos = tf.translation.truncate();
            let delta = center - pos;
            let dist = delta.length();
            if dist >= radius || dist <= 3.0 {
                continue;
            }
            let falloff = 1.0 - dist / radius;
            vel.linvel += (delta / dist) * strength * falloff * dt;
            vel.linvel *= slow;
            if dist < kill && cue.is_none() {
                ev_removed.write(BallRemovedForScore { ball: entity });
            }
        }
    }
}
