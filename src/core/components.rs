use bevy::prelude::*;

use crate::gameplay::abilities::{BallAbility, BuildingBehavior};

/// Marker component identifying a ball entity (owns the physics body & collider).
#[derive(Component)]
pub struct Ball;

/// Marker for the player-controlled cue ball.
#[derive(Component)]
pub struct CueBall;

/// Logical radius used both for the collider and for area scans.
#[derive(Component, Debug, Deref, DerefMut, Copy, Clone)]
pub struct BallRadius(pub f32);

/// Static cushion segment bounding the table.
#[derive(Component)]
pub struct Cushion;

/// Pocket sensor region; purely geometric, no mutable state.
#[derive(Component)]
pub struct Pocket;

/// Marker for a placed building (static or sensor).
#[derive(Component)]
pub struct Building;

/// Per-ball gameplay state attached next to the physics body.
///
/// `active` goes false the moment a removal is decided, before the deferred
/// despawn applies; later events in the same frame batch must treat the ball
/// as gone.
#[derive(Component, Debug, Clone)]
pub struct BallState {
    pub type_id: String,
    pub ability: BallAbility,
    pub cooldown_ms: u64,
    pub can_trigger: bool,
    pub active: bool,
    /// Damping is suppressed while this counts down (fresh shot / fresh impulse).
    pub grace_frames: u8,
    pub ghost_passes_remaining: u32,
    pub has_split: bool,
    pub last_teleport_ms: Option<u64>,
    pub slowed: bool,
    pub score_value: u32,
    pub score_multiplier: f32,
}

impl BallState {
    pub fn new(type_id: impl Into<String>, ability: BallAbility, cooldown_ms: u64, score_value: u32) -> Self {
        let score_multiplier = match ability {
            BallAbility::ScoreMultiplier { multiplier } => multiplier,
            _ => 1.0,
        };
        let ghost_passes_remaining = match ability {
            BallAbility::Phase { passes } => passes,
            _ => 0,
        };
        Self {
            type_id: type_id.into(),
            ability,
            cooldown_ms,
            can_trigger: true,
            active: true,
            grace_frames: 0,
            ghost_passes_remaining,
            has_split: false,
            last_teleport_ms: None,
            slowed: false,
            score_value,
            score_multiplier,
        }
    }

    /// Flips the trigger gate. Returns false (handler aborts) when a reset is
    /// already pending; at most one pending reset per entity at a time.
    pub fn try_arm_cooldown(&mut self) -> bool {
        if !self.can_trigger {
            return false;
        }
        self.can_trigger = false;
        true
    }
}

/// Per-building gameplay state. Buildings never move once placed.
/// `behavior` is absent when the type record named an unknown action:
/// a capability gap, the building simply has no handlers.
#[derive(Component, Debug, Clone)]
pub struct BuildingState {
    pub type_id: String,
    pub behavior: Option<BuildingBehavior>,
    pub size: Vec2,
    pub can_trigger: bool,
    pub absorb_count: u32,
    pub duplicate_count: u32,
    /// Portal pairing; symmetric when present (a.linked == b iff b.linked == a).
    pub linked: Option<Entity>,
}

impl BuildingState {
    pub fn new(type_id: impl Into<String>, behavior: Option<BuildingBehavior>, size: Vec2) -> Self {
        Self {
            type_id: type_id.into(),
            behavior,
            size,
            can_trigger: true,
            absorb_count: 0,
            duplicate_count: 0,
            linked: None,
        }
    }

    pub fn try_arm_cooldown(&mut self) -> bool {
        if !self.can_trigger {
            return false;
        }
        self.can_trigger = false;
        true
    }
}
