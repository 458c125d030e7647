use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

use crate::core::components::{Ball, BallRadius, BallState, Building, BuildingState, CueBall};
use crate::core::config::GameConfig;
use crate::core::level::catalog::{BallTypeDef, BuildingTypeDef};
use crate::core::system::system_order::SchedulerSet;
use crate::gameplay::abilities::BuildingBehavior;

// Collision filter layout, one group per entity kind.
pub const BALL_GROUP: Group = Group::GROUP_1;
pub const WALL_GROUP: Group = Group::GROUP_2;
pub const POCKET_GROUP: Group = Group::GROUP_3;
pub const BUILDING_GROUP: Group = Group::GROUP_4;
pub const SENSOR_GROUP: Group = Group::GROUP_5;

#[derive(Debug, Clone, Copy)]
pub struct SpawnOpts {
    pub velocity: Vec2,
    pub radius_override: Option<f32>,
    pub is_cue: bool,
}
impl Default for SpawnOpts {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            radius_override: None,
            is_cue: false,
        }
    }
}

/// Builds the full dynamic-body bundle for a ball from its type record.
/// Rotation is locked and gravity zeroed: top-down table, no rolling spin.
pub fn spawn_ball_from_def(
    commands: &mut Commands,
    cfg: &GameConfig,
    def: &BallTypeDef,
    pos: Vec2,
    opts: SpawnOpts,
) -> Entity {
    let d = &cfg.ball_defaults;
    let radius = opts.radius_override.or(def.radius).unwrap_or(d.radius);
    let mut ec = commands.spawn((
        (
            Transform::from_xyz(pos.x, pos.y, 0.0),
            GlobalTransform::default(),
            RigidBody::Dynamic,
            Collider::ball(radius),
            Velocity::linear(opts.velocity),
            Restitution::coefficient(def.restitution.unwrap_or(d.restitution)),
            Friction::coefficient(def.friction.unwrap_or(d.friction)),
            Damping {
                linear_damping: def.linear_damping.unwrap_or(d.linear_damping),
                angular_damping: 0.0,
            },
            GravityScale(0.0),
            LockedAxes::ROTATION_LOCKED,
            ColliderMassProperties::Mass(def.mass.unwrap_or(d.mass)),
            ActiveEvents::COLLISION_EVENTS,
            CollisionGroups::new(
                BALL_GROUP,
                BALL_GROUP | WALL_GROUP | POCKET_GROUP | BUILDING_GROUP | SENSOR_GROUP,
            ),
        ),
        (
            Ball,
            BallRadius(radius),
            BallState::new(def.id.clone(), def.ability, def.cooldown_ms, def.score_value),
        ),
    ));
    if opts.is_cue {
        ec.insert(CueBall);
    }
    ec.id()
}

/// Static (or sensor) rectangular body for a building. Angle applies at
/// creation only.
pub fn spawn_building_from_def(
    commands: &mut Commands,
    def: &BuildingTypeDef,
    pos: Vec2,
    angle: f32,
) -> Entity {
    let groups = if def.is_sensor {
        CollisionGroups::new(SENSOR_GROUP, BALL_GROUP)
    } else {
        CollisionGroups::new(BUILDING_GROUP, BALL_GROUP)
    };
    let mut ec = commands.spawn((
        (
            Transform {
                translation: pos.extend(0.0),
                rotation: Quat::from_rotation_z(angle),
                scale: Vec3::ONE,
            },
            GlobalTransform::default(),
            RigidBody::Fixed,
            Collider::cuboid(def.size.x * 0.5, def.size.y * 0.5),
            Restitution::coefficient(0.8),
            ActiveEvents::COLLISION_EVENTS,
            groups,
        ),
        (
            Building,
            BuildingState::new(def.id.clone(), def.behavior.clone(), def.size),
        ),
    ));
    if def.is_sensor {
        ec.insert(Sensor);
    }
    ec.id()
}

pub struct SpawnPlugin;

impl Plugin for SpawnPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, pair_portals.in_set(SchedulerSet));
    }
}

/// Links unpaired portal buildings two at a time, in placement order. An odd
/// portal stays queued as the single pending link slot until the next one is
/// placed. Links stay symmetric: both sides are written in the same pass.
pub fn pair_portals(mut q: Query<(Entity, &mut BuildingState), With<Building>>) {
    let mut unpaired: Vec<Entity> = q
        .iter()
        .filter(|(_, s)| {
            s.linked.is_none() && matches!(s.behavior, Some(BuildingBehavior::Teleport { .. }))
        })
        .map(|(e, _)| e)
        .collect();
    if unpaired.len() < 2 {
        return;
    }
    unpaired.sort_by_key(|e| e.index());
    for pair in unpaired.chunks_exact(2) {
        let (a, b) = (pair[0], pair[1]);
        if let Ok((_, mut sa)) = q.get_mut(a) {
            sa.linked = Some(b);
        }
        if let Ok((_, mut sb)) = q.get_mut(b) {
            sb.linked = Some(a);
        }
        info!(target: "level", "portal pair linked: {a:?} <-> {b:?}");
    }
}
