use bevy::prelude::*;
use bevy_rapier2d::prelude::Velocity;

use crate::core::components::{Ball, BallState, Building, BuildingState, CueBall};
use crate::core::level::layout::{ActiveLevel, LevelFile};
use crate::core::system::system_order::AbilitySet;
use crate::gameplay::abilities::building::building_field_tick;
use crate::gameplay::abilities::BuildingBehavior;
use crate::physics::collision::{BallPocketed, BallRemovedForScore};

#[derive(Event, Debug, Clone, Copy)]
pub struct ScoreChanged {
    pub total: u64,
    pub delta: u64,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct CoinsChanged {
    pub coins: u64,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct ShotsChanged {
    pub remaining: u32,
}

/// Score, coins, combo and the shot budget for the active level.
#[derive(Resource, Debug, Clone, Default)]
pub struct ScoreBoard {
    pub score: u64,
    pub coins: u64,
    pub combo: u32,
    pub shots_remaining: u32,
    pub target_score: u64,
}

impl ScoreBoard {
    pub fn from_level(level: &LevelFile) -> Self {
        Self {
            score: 0,
            coins: level.start_coins,
            combo: 0,
            shots_remaining: level.max_shots,
            target_score: level.target_score,
        }
    }

    pub fn on_shot_fired(&mut self) {
        self.combo = 0;
        self.shots_remaining = self.shots_remaining.saturating_sub(1);
    }

    /// Base value x ball multiplier x combo bonus (+50% per successive pocket
    /// within one shot) x zone multiplier, rounded.
    pub fn score_ball(&mut self, base: u32, ball_multiplier: f32, zone_multiplier: f32) -> u64 {
        self.combo += 1;
        let mut points = base as f32 * ball_multiplier;
        points *= 1.0 + (self.combo - 1) as f32 * 0.5;
        points *= zone_multiplier;
        let points = points.round().max(0.0) as u64;
        self.score += points;
        points
    }

    pub fn add_score(&mut self, delta: u64) {
        self.score += delta;
    }

    pub fn add_coins(&mut self, amount: u64) {
        self.coins += amount;
    }

    pub fn spend_coins(&mut self, amount: u64) -> bool {
        if self.coins < amount {
            return false;
        }
        self.coins -= amount;
        true
    }

    pub fn is_level_complete(&self) -> bool {
        self.score >= self.target_score
    }
}

/// Zone multiplier lookup used at score time: first multiplier-zone building
/// whose rectangular footprint contains the position wins.
pub fn zone_multiplier_at<'a>(
    pos: Vec2,
    zones: impl IntoIterator<Item = (&'a Transform, &'a BuildingState)>,
) -> f32 {
    for (tf, state) in zones {
        let Some(BuildingBehavior::MultiplierZone { multiplier }) = &state.behavior else {
            continue;
        };
        let center = tf.translation.truncate();
        let half = state.size * 0.5;
        if pos.x > center.x - half.x
            && pos.x < center.x + half.x
            && pos.y > center.y - half.y
            && pos.y < center.y + half.y
        {
            return *multiplier;
        }
    }
    1.0
}

pub struct ScoringPlugin;

impl Plugin for ScoringPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ScoreBoard>()
            .add_event::<ScoreChanged>()
            .add_event::<CoinsChanged>()
            .add_event::<ShotsChanged>()
            .add_systems(
                Update,
                (resolve_pocketed, resolve_removed_for_score)
                    .chain()
                    .after(building_field_tick)
                    .in_set(AbilitySet),
            );
    }
}

/// Pocket outcome: the cue ball scratches back to its spot; any other ball is
/// scored (with zone and combo factors) and removed. The active flag flips
/// first so a duplicate report in the same batch finds the ball already gone.
pub fn resolve_pocketed(
    mut ev_pocketed: EventReader<BallPocketed>,
    mut commands: Commands,
    level: Res<ActiveLevel>,
    mut score: ResMut<ScoreBoard>,
    mut q_balls: Query<
        (&mut Transform, &mut Velocity, &mut BallState, Option<&CueBall>),
        (With<Ball>, Without<Building>),
    >,
    q_zones: Query<(&Transform, &BuildingState), With<Building>>,
    mut ev_score: EventWriter<ScoreChanged>,
) {
    for ev in ev_pocketed.read() {
        let Ok((mut tf, mut vel, mut state, cue)) = q_balls.get_mut(ev.ball) else {
            continue;
        };
        if !state.active {
            continue;
        }
        if cue.is_some() {
            tf.translation = level.cue_position.extend(0.0);
            vel.linvel = Vec2::ZERO;
            continue;
        }
        state.active = false;
        let pos = tf.translation.truncate();
        let zone = zone_multiplier_at(pos, q_zones.iter());
        let points = score.score_ball(state.score_value, state.score_multiplier, zone);
        ev_score.write(ScoreChanged {
            total: score.score,
            delta: points,
        });
        info!(
            target: "score",
            "pocketed '{}' +{} (combo x{}, zone x{zone}) -> {}",
            state.type_id,
            points,
            score.combo,
            score.score
        );
        commands.entity(ev.ball).despawn();
    }
}

/// Balls consumed by a field effect score through the same path as a pocket.
pub fn resolve_removed_for_score(
    mut ev_removed: EventReader<BallRemovedForScore>,
    mut commands: Commands,
    mut score: ResMut<ScoreBoard>,
    mut q_balls: Query<
        (&Transform, &mut BallState, Option<&CueBall>),
        (With<Ball>, Without<Building>),
    >,
    q_zones: Query<(&Transform, &BuildingState), With<Building>>,
    mut ev_score: EventWriter<ScoreChanged>,
) {
    for ev in ev_removed.read() {
        let Ok((tf, mut state, cue)) = q_balls.get_mut(ev.ball) else {
            continue;
        };
        if !state.active || cue.is_some() {
            continue;
        }
        state.active = false;
        let zone = zone_multiplier_at(tf.translation.truncate(), q_zones.iter());
        let points = score.score_ball(state.score_value, state.score_multiplier, zone);
        ev_score.write(ScoreChanged {
            total: score.score,
            delta: points,
        });
        info!(
            target: "score",
            "'{}' swallowed for score +{} -> {}",
            state.type_id,
            points,
            score.score
        );
        commands.entity(ev.ball).despawn();
    }
}
