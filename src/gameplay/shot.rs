use bevy::prelude::*;
use bevy_rapier2d::prelude::Velocity;

use crate::app::state::TablePhase;
use crate::core::components::{Ball, BallRadius, BallState, CueBall};
use crate::core::config::GameConfig;
use crate::core::level::catalog::EntityCatalog;
use crate::core::level::layout::TableBounds;
use crate::core::system::system_order::{PostPhysicsAdjustSet, SchedulerSet};
use crate::gameplay::scoring::{CoinsChanged, ScoreBoard, ShotsChanged};
use crate::gameplay::spawn::spawn_building_from_def;
use crate::physics::rest::{AllBallsStopped, RestDetector};

/// A shot request from the aiming collaborator; velocity already encodes
/// direction and drag power.
#[derive(Event, Debug, Clone, Copy)]
pub struct CueStruck {
    pub velocity: Vec2,
}

/// Build-phase purchase/placement request.
#[derive(Event, Debug, Clone)]
pub struct PlaceBuilding {
    pub type_id: String,
    pub pos: Vec2,
    pub angle: f32,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct StartPlay;

#[derive(Resource, Default, Debug)]
pub struct ShotState {
    pub in_progress: bool,
}

pub struct ShotPlugin;

impl Plugin for ShotPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<CueStruck>()
            .add_event::<PlaceBuilding>()
            .add_event::<StartPlay>()
            .init_resource::<ShotState>()
            .add_systems(
                Update,
                (
                    handle_place_building.run_if(in_state(TablePhase::Build)),
                    handle_start_play.run_if(in_state(TablePhase::Build)),
                    handle_cue_struck.run_if(in_state(TablePhase::Play)),
                )
                    .in_set(SchedulerSet),
            )
            .add_systems(Update, settle_shot.after(PostPhysicsAdjustSet));
    }
}

fn clamp_or_center(v: f32, min: f32, max: f32) -> f32 {
    if min <= max {
        v.clamp(min, max)
    } else {
        (min + max) * 0.5
    }
}

/// Applies the shot: NaN-guarded, speed-clamped, cue nudged out of any
/// overlap so the solver cannot swallow the impulse, grace frames armed and
/// the rest counter forced back into Moving.
pub fn handle_cue_struck(
    mut ev_struck: EventReader<CueStruck>,
    cfg: Res<GameConfig>,
    mut shot: ResMut<ShotState>,
    mut rest: ResMut<RestDetector>,
    mut score: ResMut<ScoreBoard>,
    mut ev_shots: EventWriter<ShotsChanged>,
    mut q_cue: Query<
        (&mut Transform, &mut Velocity, &mut BallState, &BallRadius),
        (With<Ball>, With<CueBall>),
    >,
    q_others: Query<(&Transform, &BallRadius), (With<Ball>, Without<CueBall>)>,
) {
    for ev in ev_struck.read() {
        if shot.in_progress {
            continue;
        }
        let Ok((mut tf, mut vel, mut state, radius)) = q_cue.single_mut() else {
            continue;
        };

        let mut v = ev.velocity;
        if !v.x.is_finite() {
            v.x = 0.0;
        }
        if !v.y.is_finite() {
            v.y = 0.0;
        }
        let speed = v.length();
        if speed > cfg.shot.max_launch_speed {
            v *= cfg.shot.max_launch_speed / speed;
        }

        let mut pos = tf.translation.truncate();
        for (o_tf, o_r) in q_others.iter() {
            let delta = pos - o_tf.translation.truncate();
            let dist = delta.length();
            let min_dist = radius.0 + o_r.0;
            if dist < min_dist {
                let overlap = min_dist - dist + 0.5;
                let n = if dist > 0.01 {
                    delta / dist
                } else {
                    Vec2::new(
                        if v.x >= 0.0 { 1.0 } else { -1.0 },
                        if v.y >= 0.0 { 1.0 } else { -1.0 },
                    )
                    .normalize()
                };
                pos += n * overlap;
            }
        }
        tf.translation = pos.extend(tf.translation.z);

        state.grace_frames = state.grace_frames.max(cfg.shot.grace_frames);
        vel.linvel = v;
        rest.reset();
        score.on_shot_fired();
        ev_shots.write(ShotsChanged {
            remaining: score.shots_remaining,
        });
        shot.in_progress = true;
        info!(
            target: "shot",
            "cue struck v=({:.1},{:.1}) shots_remaining={}",
            v.x,
            v.y,
            score.shots_remaining
        );
    }
}

/// The rest detector gates shot-to-shot flow: once everything stops, either
/// the level resolves or the table is ready for the next strike.
pub fn settle_shot(
    mut ev_stopped: EventReader<AllBallsStopped>,
    mut shot: ResMut<ShotState>,
    score: Res<ScoreBoard>,
    mut next: ResMut<NextState<TablePhase>>,
) {
    for _ in ev_stopped.read() {
        if !shot.in_progress {
            continue;
        }
        shot.in_progress = false;
        if score.is_level_complete() {
            info!(target: "shot", "target reached ({}/{})", score.score, score.target_score);
            next.set(TablePhase::Result);
        } else if score.shots_remaining == 0 {
            info!(target: "shot", "out of shots ({}/{})", score.score, score.target_score);
            next.set(TablePhase::Result);
        } else {
            debug!(target: "shot", "table settled; next shot ready");
        }
    }
}

pub fn handle_place_building(
    mut ev_place: EventReader<PlaceBuilding>,
    mut commands: Commands,
    catalog: Res<EntityCatalog>,
    table: Res<TableBounds>,
    mut score: ResMut<ScoreBoard>,
    mut ev_coins: EventWriter<CoinsChanged>,
) {
    for ev in ev_place.read() {
        let Some(def) = catalog.building(&ev.type_id) else {
            warn!(target: "shot", "placement of unknown building type '{}' ignored", ev.type_id);
            continue;
        };
        if !score.spend_coins(def.cost as u64) {
            debug!(target: "shot", "cannot afford '{}' (cost {}, coins {})", ev.type_id, def.cost, score.coins);
            continue;
        }
        ev_coins.write(CoinsChanged { coins: score.coins });
        let half = def.size * 0.5;
        let pos = Vec2::new(
            clamp_or_center(ev.pos.x, table.min.x + half.x, table.max.x - half.x),
            clamp_or_center(ev.pos.y, table.min.y + half.y, table.max.y - half.y),
        );
        spawn_building_from_def(&mut commands, def, pos, ev.angle);
        info!(target: "shot", "placed '{}' at ({:.0},{:.0})", ev.type_id, pos.x, pos.y);
    }
}

pub fn handle_start_play(
    mut ev_start: EventReader<StartPlay>,
    mut rest: ResMut<RestDetector>,
    mut next: ResMut<NextState<TablePhase>>,
) {
    if ev_start.read().next().is_some() {
        ev_start.clear();
        rest.reset();
        next.set(TablePhase::Play);
        info!(target: "shot", "entering play phase");
    }
}
