pub mod ball;
pub mod building;

use bevy::prelude::*;

use crate::core::components::{Ball, BallRadius, BallState, CueBall};
use crate::core::system::system_order::AbilitySet;

/// Opaque key-value parameters carried by a type record. Handlers pull what
/// they need with per-key defaults; unknown keys are ignored.
#[derive(Debug, Clone, Default)]
pub struct ParamBag(pub serde_json::Map<String, serde_json::Value>);

impl ParamBag {
    pub fn f32(&self, key: &str, default: f32) -> f32 {
        self.0
            .get(key)
            .and_then(serde_json::Value::as_f64)
            .map(|v| v as f32)
            .unwrap_or(default)
    }

    pub fn u32(&self, key: &str, default: u32) -> u32 {
        self.0
            .get(key)
            .and_then(serde_json::Value::as_u64)
            .map(|v| v as u32)
            .unwrap_or(default)
    }

    pub fn u64(&self, key: &str, default: u64) -> u64 {
        self.0
            .get(key)
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(default)
    }

    pub fn string(&self, key: &str, default: &str) -> String {
        self.0
            .get(key)
            .and_then(serde_json::Value::as_str)
            .unwrap_or(default)
            .to_string()
    }
}

/// Ball abilities, one variant per action name in the ball records. Parsed
/// once at spawn; the closed set replaces runtime string dispatch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BallAbility {
    None,
    Explode {
        blast_radius: f32,
        blast_force: f32,
    },
    Split {
        count: u32,
        child_radius: f32,
        spawn_offset_multiplier: f32,
        inherit_velocity_factor: f32,
    },
    Knockback {
        extra_force: f32,
        knockback_multiplier: f32,
    },
    Phase {
        passes: u32,
    },
    ScoreMultiplier {
        multiplier: f32,
    },
    Dash {
        dash_force: f32,
        dash_angle_spread: f32,
    },
    Slow {
        slow_factor: f32,
        slow_duration_ms: u64,
    },
    TeleportRandom {
        preserve_velocity_factor: f32,
        min_interval_ms: u64,
    },
    Chain {
        chain_count: u32,
        chain_range: f32,
        chain_force: f32,
    },
}

impl BallAbility {
    /// Unknown action names yield `None` here; the caller logs the capability
    /// gap and spawns the ball without an ability.
    pub fn parse(action: &str, p: &ParamBag) -> Option<Self> {
        match action {
            "none" => Some(Self::None),
            "explode" => Some(Self::Explode {
                blast_radius: p.f32("blastRadius", 120.0),
                blast_force: p.f32("blastForce", 360.0),
            }),
            "split" => Some(Self::Split {
                count: p.u32("count", 2),
                child_radius: p.f32("childRadius", 8.0),
                spawn_offset_multiplier: p.f32("spawnOffsetMultiplier", 1.5),
                inherit_velocity_factor: p.f32("inheritVelocityFactor", 0.7),
            }),
            "knockback" => Some(Self::Knockback {
                extra_force: p.f32("extraForce", 150.0),
                knockback_multiplier: p.f32("knockbackMultiplier", 2.0),
            }),
            "phase" => Some(Self::Phase {
                passes: p.u32("passesRemaining", 3),
            }),
            "score_multiplier" => Some(Self::ScoreMultiplier {
                multiplier: p.f32("multiplier", 2.0),
            }),
            "dash" => Some(Self::Dash {
                dash_force: p.f32("dashForce", 300.0),
                dash_angle_spread: p.f32("dashAngleSpread", 0.6),
            }),
            "slow" => Some(Self::Slow {
                slow_factor: p.f32("slowFactor", 0.4),
                slow_duration_ms: p.u64("slowDurationMs", 1500),
            }),
            "teleport_random" => Some(Self::TeleportRandom {
                preserve_velocity_factor: p.f32("preserveVelocityFactor", 0.8),
                min_interval_ms: p.u64("minIntervalMs", 600),
            }),
            "chain" => Some(Self::Chain {
                chain_count: p.u32("chainCount", 3),
                chain_range: p.f32("chainRange", 160.0),
                chain_force: p.f32("chainForce", 240.0),
            }),
            _ => None,
        }
    }
}

/// Building behaviors, one variant per action name in the building records.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildingBehavior {
    Teleport {
        min_interval_ms: u64,
        spawn_offset: f32,
        preserve_velocity_factor: f32,
    },
    Bounce {
        base_force: f32,
        impulse_multiplier: f32,
    },
    Split {
        cooldown_ms: u64,
        spawn_count: u32,
        spawn_speed: f32,
        spawn_ball_id: String,
    },
    Absorb {
        max_absorbs: u32,
        speed_reduction: f32,
        score_bonus: u32,
    },
    Accelerate {
        boost_multiplier: f32,
        max_exit_speed: f32,
    },
    MultiplierZone {
        multiplier: f32,
    },
    Deflect {
        deflect_angle: f32,
        preserve_speed: bool,
    },
    Attract {
        attract_radius: f32,
        attract_strength: f32,
        slow_factor: f32,
        inner_kill_radius: f32,
    },
    Duplicate {
        cooldown_ms: u64,
        max_duplicates: u32,
        offset_angle: f32,
        duplicate_speed_factor: f32,
    },
    Chaos {
        random_angle_range: f32,
        speed_jitter_min: f32,
        speed_jitter_max: f32,
    },
}

impl BuildingBehavior {
    pub fn parse(action: &str, p: &ParamBag) -> Option<Self> {
        match action {
            "teleport" => Some(Self::Teleport {
                min_interval_ms: p.u64("cooldownMs", 400),
                spawn_offset: p.f32("spawnOffset", 15.0),
                preserve_velocity_factor: p.f32("preserveVelocityFactor", 1.0),
            }),
            "bounce" => Some(Self::Bounce {
                base_force: p.f32("baseForce", 150.0),
                impulse_multiplier: p.f32("impulseMultiplier", 2.0),
            }),
            "split" => Some(Self::Split {
                cooldown_ms: p.u64("cooldownMs", 600),
                spawn_count: p.u32("spawnCount", 1),
                spawn_speed: p.f32("spawnSpeed", 150.0),
                spawn_ball_id: p.string("spawnBallId", "ball_basic"),
            }),
            "absorb" => Some(Self::Absorb {
                max_absorbs: p.u32("maxAbsorbs", 5),
                speed_reduction: p.f32("speedReduction", 0.3),
                score_bonus: p.u32("scoreBonus", 0),
            }),
            "accelerate" => Some(Self::Accelerate {
                boost_multiplier: p.f32("boostMultiplier", 2.0),
                max_exit_speed: p.f32("maxExitSpeed", 1150.0),
            }),
            "multiplier_zone" => Some(Self::MultiplierZone {
                multiplier: p.f32("multiplier", 2.0),
            }),
            "deflect" => Some(Self::Deflect {
                deflect_angle: p.f32("deflectAngle", 1.0472),
                preserve_speed: p.u32("preserveSpeed", 0) != 0,
            }),
            "attract" => Some(Self::Attract {
                attract_radius: p.f32("attractRadius", 100.0),
                attract_strength: p.f32("attractStrength", 400.0),
                slow_factor: p.f32("slowFactor", 0.94),
                inner_kill_radius: p.f32("innerKillRadius", 8.0),
            }),
            "duplicate" => Some(Self::Duplicate {
                cooldown_ms: p.u64("cooldownMs", 800),
                max_duplicates: p.u32("maxDuplicates", 2),
                offset_angle: p.f32("offsetAngle", 0.5236),
                duplicate_speed_factor: p.f32("duplicateSpeedFactor", 0.7),
            }),
            "chaos" => Some(Self::Chaos {
                random_angle_range: p.f32("randomAngleRange", std::f32::consts::TAU),
                speed_jitter_min: p.f32("speedJitterMin", 0.7),
                speed_jitter_max: p.f32("speedJitterMax", 1.4),
            }),
            _ => None,
        }
    }
}

/// One entry of the per-frame iteration snapshot.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotEntry {
    pub entity: Entity,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub is_cue: bool,
}

/// Iteration set captured at the head of the ability set. Handlers routinely
/// spawn and remove balls mid-batch; scans run against this frozen view so
/// ordering and liveness stay frame-consistent.
#[derive(Resource, Default, Debug, Clone)]
pub struct BallSnapshot(pub Vec<SnapshotEntry>);

/// Data-driven dispatch as a pipeline: snapshot first, then ball handlers,
/// then building handlers and the per-frame field pass.
pub struct AbilityTablesPlugin;

impl Plugin for AbilityTablesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BallSnapshot>().add_systems(
            Update,
            (
                capture_ball_snapshot,
                ball::ball_collision_abilities,
                building::building_contact_behaviors,
                building::building_field_tick,
            )
                .chain()
                .in_set(AbilitySet),
        );
    }
}

pub fn capture_ball_snapshot(
    mut snapshot: ResMut<BallSnapshot>,
    q: Query<
        (
            Entity,
            &Transform,
            &bevy_rapier2d::prelude::Velocity,
            &BallRadius,
            &BallState,
            Option<&CueBall>,
        ),
        With<Ball>,
    >,
) {
    snapshot.0.clear();
    for (entity, tf, vel, radius, state, cue) in q.iter() {
        if !state.active {
            continue;
        }
        snapshot.0.push(SnapshotEntry {
            entity,
            pos: tf.translation.truncate(),
            vel: vel.linvel,
            radius: radius.0,
            is_cue: cue.is_some(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(json: &str) -> ParamBag {
        ParamBag(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn parse_known_actions() {
        let a = BallAbility::parse("explode", &bag(r#"{"blastRadius": 90.0}"#)).unwrap();
        assert_eq!(
            a,
            BallAbility::Explode {
                blast_radius: 90.0,
                blast_force: 360.0
            }
        );
        let b = BuildingBehavior::parse("teleport", &bag("{}")).unwrap();
        assert_eq!(
            b,
            BuildingBehavior::Teleport {
                min_interval_ms: 400,
                spawn_offset: 15.0,
                preserve_velocity_factor: 1.0
            }
        );
    }

    #[test]
    fn unknown_action_is_a_gap_not_an_error() {
        assert!(BallAbility::parse("does_not_exist", &bag("{}")).is_none());
        assert!(BuildingBehavior::parse("does_not_exist", &bag("{}")).is_none());
    }

    #[test]
    fn bag_ignores_extra_keys_and_types() {
        let p = bag(r#"{"blastRadius": "oops", "unrelated": true}"#);
        assert_eq!(p.f32("blastRadius", 7.0), 7.0);
        assert_eq!(p.u32("missing", 3), 3);
    }
}
