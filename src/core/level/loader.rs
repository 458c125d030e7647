use bevy::prelude::*;
use bevy_rapier2d::prelude::{
    ActiveEvents, Collider, CollisionGroups, Friction, Restitution, RigidBody, Sensor,
};
use std::{fs, path::Path};

use crate::core::components::{Cushion, Pocket};
use crate::core::config::GameConfig;
use crate::core::level::catalog::EntityCatalog;
use crate::core::level::layout::{ActiveLevel, LevelFile, TableBounds};
use crate::gameplay::scoring::ScoreBoard;
use crate::gameplay::spawn::{
    spawn_ball_from_def, spawn_building_from_def, SpawnOpts, BALL_GROUP, POCKET_GROUP, WALL_GROUP,
};

// Embedded copies keep headless runs and tests free of filesystem setup; disk
// files under assets/ override them when present.
const EMBEDDED_BALLS: &str = include_str!("../../../assets/data/balls.json");
const EMBEDDED_BUILDINGS: &str = include_str!("../../../assets/data/buildings.json");
const EMBEDDED_LEVEL: &str = include_str!("../../../assets/levels/break_in.ron");

/// Selection precedence: LEVEL_ID env override > game.ron default_level_id >
/// embedded default.
pub fn resolve_requested_level_id() -> Option<String> {
    std::env::var("LEVEL_ID").ok().filter(|s| !s.trim().is_empty())
}

/// Data-driven table construction: catalog records, level layout, cushions,
/// pockets and initial entities.
pub struct LevelLoaderPlugin;

impl Plugin for LevelLoaderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EntityCatalog>()
            .init_resource::<ActiveLevel>()
            .init_resource::<TableBounds>()
            .add_systems(Startup, load_level_data);
    }
}

fn read_or_embedded(path: &Path, embedded: &'static str, what: &str) -> String {
    match fs::read_to_string(path) {
        Ok(txt) => txt,
        Err(e) => {
            debug!(target: "level", "LevelLoader: {what} disk read failed ({e}); using embedded copy");
            embedded.to_string()
        }
    }
}

pub fn load_level_data(mut commands: Commands, cfg: Res<GameConfig>) {
    let crate_root = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into());
    let assets = Path::new(&crate_root).join("assets");

    // Catalog: disk records override the embedded copies; a malformed disk
    // file falls back to embedded rather than aborting the load.
    let balls_txt = read_or_embedded(&assets.join("data").join("balls.json"), EMBEDDED_BALLS, "ball records");
    let buildings_txt = read_or_embedded(
        &assets.join("data").join("buildings.json"),
        EMBEDDED_BUILDINGS,
        "building records",
    );
    let (catalog, warnings) = match EntityCatalog::from_json(&balls_txt, &buildings_txt) {
        Ok(v) => v,
        Err(e) => {
            error!("Catalog: disk records unusable ({e:#}); using embedded records");
            EntityCatalog::from_json(EMBEDDED_BALLS, EMBEDDED_BUILDINGS)
                .expect("parse embedded records failed")
        }
    };
    for w in &warnings {
        warn!(target: "level", "{w}");
    }

    // Level selection and load.
    let requested = resolve_requested_level_id();
    let chosen = requested
        .clone()
        .or_else(|| {
            let d = cfg.default_level_id.trim();
            (!d.is_empty()).then(|| d.to_string())
        })
        .unwrap_or_else(|| "break_in".into());
    let level_path = assets.join("levels").join(format!("{chosen}.ron"));
    let level = match LevelFile::load_from_file(&level_path) {
        Ok(lf) => lf,
        Err(e) => {
            warn!(
                target: "level",
                "LevelLoader: level '{}' not loadable ({e}); falling back to embedded default",
                chosen
            );
            LevelFile::parse(EMBEDDED_LEVEL).expect("parse embedded level failed")
        }
    };
    info!(
        target: "level",
        "LevelLoader: requested={:?} selected level id='{}' name='{}'",
        requested,
        level.id,
        level.name
    );

    // Cushions: four fixed bars around the interior, full outer span on the
    // horizontal pair so corners close.
    let t = &level.table;
    let c = t.cushion.max(2.0);
    let cushions = [
        (Vec2::new(t.x + t.w * 0.5, t.y - c * 0.5), Vec2::new(t.w * 0.5 + c, c * 0.5)),
        (Vec2::new(t.x + t.w * 0.5, t.y + t.h + c * 0.5), Vec2::new(t.w * 0.5 + c, c * 0.5)),
        (Vec2::new(t.x - c * 0.5, t.y + t.h * 0.5), Vec2::new(c * 0.5, t.h * 0.5)),
        (Vec2::new(t.x + t.w + c * 0.5, t.y + t.h * 0.5), Vec2::new(c * 0.5, t.h * 0.5)),
    ];
    for (i, (center, half)) in cushions.iter().enumerate() {
        commands.spawn((
            Name::new(format!("Cushion{i}")),
            Cushion,
            RigidBody::Fixed,
            Collider::cuboid(half.x, half.y),
            Restitution::coefficient(cfg.wall.restitution),
            Friction::coefficient(cfg.wall.friction),
            CollisionGroups::new(WALL_GROUP, BALL_GROUP),
            Transform::from_xyz(center.x, center.y, 0.0),
            GlobalTransform::default(),
        ));
    }

    for (i, p) in level.pockets.iter().enumerate() {
        commands.spawn((
            Name::new(format!("Pocket{i}")),
            Pocket,
            RigidBody::Fixed,
            Collider::ball(level.pocket_radius),
            Sensor,
            ActiveEvents::COLLISION_EVENTS,
            CollisionGroups::new(POCKET_GROUP, BALL_GROUP),
            Transform::from_xyz(p.x, p.y, 0.0),
            GlobalTransform::default(),
        ));
    }

    let mut placed_balls = 0usize;
    for bp in &level.initial_balls {
        match catalog.ball(&bp.id) {
            Some(def) => {
                spawn_ball_from_def(&mut commands, &cfg, def, bp.pos.into(), SpawnOpts::default());
                placed_balls += 1;
            }
            None => warn!(target: "level", "LevelLoader: unknown ball type '{}' skipped", bp.id),
        }
    }

    match catalog
        .ball(&level.cue_ball)
        .or_else(|| catalog.ball("ball_basic"))
    {
        Some(def) => {
            spawn_ball_from_def(
                &mut commands,
                &cfg,
                def,
                level.cue_position.into(),
                SpawnOpts {
                    is_cue: true,
                    ..Default::default()
                },
            );
        }
        None => error!("LevelLoader: no usable cue ball type in catalog"),
    }

    let mut placed_buildings = 0usize;
    for bp in &level.buildings {
        match catalog.building(&bp.id) {
            Some(def) => {
                spawn_building_from_def(&mut commands, def, bp.pos.into(), bp.angle);
                placed_buildings += 1;
            }
            None => warn!(target: "level", "LevelLoader: unknown building type '{}' skipped", bp.id),
        }
    }

    info!(
        target: "level",
        "LevelLoader: completed (pockets={}, balls={}, buildings={}, shots={})",
        level.pockets.len(),
        placed_balls,
        placed_buildings,
        level.max_shots
    );

    commands.insert_resource(TableBounds::from_table(t));
    commands.insert_resource(ScoreBoard::from_level(&level));
    commands.insert_resource(ActiveLevel {
        id: level.id,
        name: level.name,
        cue_position: level.cue_position.into(),
        cue_ball: level.cue_ball,
    });
    commands.insert_resource(catalog);
}
