use bevy::prelude::*;

use pocket_arcade::core::components::{Ball, Building, BuildingState, Cushion, CueBall, Pocket};
use pocket_arcade::core::level::catalog::EntityCatalog;
use pocket_arcade::core::level::layout::{ActiveLevel, TableBounds};
use pocket_arcade::core::level::LevelLoaderPlugin;
use pocket_arcade::gameplay::abilities::BuildingBehavior;
use pocket_arcade::gameplay::scoring::ScoreBoard;
use pocket_arcade::gameplay::spawn::SpawnPlugin;
use pocket_arcade::GameConfig;

fn count<F: bevy::ecs::query::QueryFilter>(app: &mut App) -> usize {
    let mut q = app.world_mut().query_filtered::<(), F>();
    q.iter(app.world()).count()
}

// Level selection reads the LEVEL_ID env var, which is process-global, so
// both scenarios run inside one test body.
#[test]
fn loader_builds_tables_from_data() {
    std::env::remove_var("LEVEL_ID");

    // Default selection: break_in.
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(GameConfig::default());
    app.add_plugins((LevelLoaderPlugin, SpawnPlugin));
    app.update();

    let catalog = app.world().get_resource::<EntityCatalog>().expect("catalog");
    assert_eq!(catalog.ball_count(), 10);
    assert_eq!(catalog.building_count(), 10);

    assert_eq!(app.world().resource::<ActiveLevel>().id, "break_in");
    let bounds = *app.world().resource::<TableBounds>();
    assert_eq!(bounds.min, Vec2::new(80.0, 60.0));
    assert_eq!(bounds.max, Vec2::new(880.0, 480.0));

    let board = app.world().resource::<ScoreBoard>();
    assert_eq!(board.shots_remaining, 5);
    assert_eq!(board.coins, 50);
    assert_eq!(board.target_score, 150);

    assert_eq!(count::<With<Pocket>>(&mut app), 6);
    assert_eq!(count::<With<Cushion>>(&mut app), 4);
    // Six placed balls plus the cue ball.
    assert_eq!(count::<With<Ball>>(&mut app), 7);
    assert_eq!(count::<With<CueBall>>(&mut app), 1);
    assert_eq!(count::<With<Building>>(&mut app), 2);

    // Env override: portal_park, portals linked pairwise by the spawn plugin.
    std::env::set_var("LEVEL_ID", "portal_park");
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(GameConfig::default());
    app.add_plugins((LevelLoaderPlugin, SpawnPlugin));
    app.update();
    std::env::remove_var("LEVEL_ID");

    assert_eq!(app.world().resource::<ActiveLevel>().id, "portal_park");
    assert_eq!(count::<With<Building>>(&mut app), 4);

    let mut q = app.world_mut().query::<(Entity, &BuildingState)>();
    let portals: Vec<(Entity, Option<Entity>)> = q
        .iter(app.world())
        .filter(|(_, s)| matches!(s.behavior, Some(BuildingBehavior::Teleport { .. })))
        .map(|(e, s)| (e, s.linked))
        .collect();
    assert_eq!(portals.len(), 2);
    // Symmetric pairing: a.linked == b and b.linked == a.
    assert_eq!(portals[0].1, Some(portals[1].0));
    assert_eq!(portals[1].1, Some(portals[0].0));
}
