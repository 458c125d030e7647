use bevy::prelude::*;
use bevy_rapier2d::prelude::{CollisionEvent, Velocity};

use crate::core::components::{Ball, BallState, Building, Cushion, Pocket};
use crate::core::config::GameConfig;
use crate::core::system::system_order::{AbilitySet, CollisionRouteSet};

// ---- Typed collision event stream (consumed by abilities and collaborators) ----

#[derive(Event, Debug, Clone, Copy)]
pub struct BallPocketed {
    pub ball: Entity,
    pub pocket: Entity,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct BallBallImpact {
    pub a: Entity,
    pub b: Entity,
    /// Relative-velocity norm scaled by the configured amplifier.
    pub impact: f32,
    pub midpoint: Vec2,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct BallWallImpact {
    pub ball: Entity,
    /// Post-contact speed of the ball alone.
    pub speed: f32,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct BallBuildingContact {
    pub ball: Entity,
    pub building: Entity,
}

/// A ball consumed by a field effect (attract inner radius) rather than a pocket.
#[derive(Event, Debug, Clone, Copy)]
pub struct BallRemovedForScore {
    pub ball: Entity,
}

pub struct CollisionRouterPlugin;

impl Plugin for CollisionRouterPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<BallPocketed>()
            .add_event::<BallBallImpact>()
            .add_event::<BallWallImpact>()
            .add_event::<BallBuildingContact>()
            .add_event::<BallRemovedForScore>()
            .add_systems(Update, route_contacts.in_set(CollisionRouteSet))
            .add_systems(Update, apply_post_impact_grace.in_set(AbilitySet));
    }
}

#[derive(Clone, Copy)]
enum BodyKind {
    Ball,
    Wall,
    Pocket,
    Building,
}

/// Classifies raw contact pairs from the integrator into the typed stream.
/// Pure classification and dispatch: no entity mutation happens here. A pair
/// whose entities cannot be resolved to live gameplay entities is dropped
/// silently: a stale body must never abort the step loop.
pub fn route_contacts(
    mut raw: EventReader<CollisionEvent>,
    cfg: Res<GameConfig>,
    q_balls: Query<(&Transform, &Velocity, &BallState), With<Ball>>,
    q_walls: Query<(), With<Cushion>>,
    q_pockets: Query<(), With<Pocket>>,
    q_buildings: Query<(), With<Building>>,
    mut ev_pocket: EventWriter<BallPocketed>,
    mut ev_ball: EventWriter<BallBallImpact>,
    mut ev_wall: EventWriter<BallWallImpact>,
    mut ev_building: EventWriter<BallBuildingContact>,
) {
    let kind_of = |e: Entity| -> Option<BodyKind> {
        if let Ok((_, _, state)) = q_balls.get(e) {
            return state.active.then_some(BodyKind::Ball);
        }
        if q_walls.get(e).is_ok() {
            return Some(BodyKind::Wall);
        }
        if q_pockets.get(e).is_ok() {
            return Some(BodyKind::Pocket);
        }
        if q_buildings.get(e).is_ok() {
            return Some(BodyKind::Building);
        }
        None
    };

    for ev in raw.read() {
        let CollisionEvent::Started(e1, e2, _flags) = ev else {
            continue;
        };
        let (Some(k1), Some(k2)) = (kind_of(*e1), kind_of(*e2)) else {
            continue;
        };
        match (k1, k2) {
            (BodyKind::Ball, BodyKind::Ball) => {
                let Ok((t1, v1, _)) = q_balls.get(*e1) else { continue };
                let Ok((t2, v2, _)) = q_balls.get(*e2) else { continue };
                let impact = (v1.linvel - v2.linvel).length() * cfg.impact.amplifier;
                let midpoint =
                    (t1.translation.truncate() + t2.translation.truncate()) * 0.5;
                ev_ball.write(BallBallImpact {
                    a: *e1,
                    b: *e2,
                    impact,
                    midpoint,
                });
            }
            (BodyKind::Ball, BodyKind::Pocket) | (BodyKind::Pocket, BodyKind::Ball) => {
                let (ball, pocket) = if matches!(k1, BodyKind::Ball) {
                    (*e1, *e2)
                } else {
                    (*e2, *e1)
                };
                ev_pocket.write(BallPocketed { ball, pocket });
            }
            (BodyKind::Ball, BodyKind::Wall) | (BodyKind::Wall, BodyKind::Ball) => {
                let ball = if matches!(k1, BodyKind::Ball) { *e1 } else { *e2 };
                let Ok((_, vel, _)) = q_balls.get(ball) else { continue };
                ev_wall.write(BallWallImpact {
                    ball,
                    speed: vel.linvel.length(),
                });
            }
            (BodyKind::Ball, BodyKind::Building) | (BodyKind::Building, BodyKind::Ball) => {
                let (ball, building) = if matches!(k1, BodyKind::Ball) {
                    (*e1, *e2)
                } else {
                    (*e2, *e1)
                };
                ev_building.write(BallBuildingContact { ball, building });
            }
            // Wall-wall and the like are impossible by construction; ignore.
            _ => {}
        }
    }
}

/// A fresh impulse must survive the damping pass for a few frames, so both
/// sides of a contact get their grace counter topped up here.
pub fn apply_post_impact_grace(
    mut ev_bb: EventReader<BallBallImpact>,
    mut ev_wall: EventReader<BallWallImpact>,
    cfg: Res<GameConfig>,
    mut q: Query<&mut BallState, With<Ball>>,
) {
    for ev in ev_bb.read() {
        for e in [ev.a, ev.b] {
            if let Ok(mut state) = q.get_mut(e) {
                state.grace_frames = state.grace_frames.max(cfg.impact.ball_hit_grace_frames);
            }
        }
    }
    for ev in ev_wall.read() {
        if let Ok(mut state) = q.get_mut(ev.ball) {
            state.grace_frames = state.grace_frames.max(cfg.impact.wall_hit_grace_frames);
        }
    }
}
