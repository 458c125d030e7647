use bevy::ecs::system::RunSystemOnce;
use bevy::prelude::*;
use bevy_rapier2d::prelude::Velocity;

use pocket_arcade::core::components::{Ball, BallRadius, BallState, Building, BuildingState};
use pocket_arcade::core::level::catalog::EntityCatalog;
use pocket_arcade::gameplay::abilities::building::building_contact_behaviors;
use pocket_arcade::gameplay::abilities::{BallAbility, BuildingBehavior};
use pocket_arcade::gameplay::cooldown::DeferredActions;
use pocket_arcade::gameplay::scoring::{ScoreBoard, ScoreChanged};
use pocket_arcade::gameplay::spawn::pair_portals;
use pocket_arcade::physics::collision::BallBuildingContact;
use pocket_arcade::GameConfig;

fn test_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(GameConfig::default());
    app.init_resource::<EntityCatalog>();
    app.init_resource::<DeferredActions>();
    app.init_resource::<ScoreBoard>();
    app.add_event::<BallBuildingContact>();
    app.add_event::<ScoreChanged>();
    app
}

fn spawn_portal(app: &mut App, pos: Vec2, preserve: f32) -> Entity {
    app.world_mut()
        .spawn((
            Building,
            BuildingState::new(
                "portal",
                Some(BuildingBehavior::Teleport {
                    min_interval_ms: 400,
                    spawn_offset: 15.0,
                    preserve_velocity_factor: preserve,
                }),
                Vec2::new(26.0, 26.0),
            ),
            Transform::from_xyz(pos.x, pos.y, 0.0),
            GlobalTransform::default(),
        ))
        .id()
}

fn spawn_ball(app: &mut App, pos: Vec2, vel: Vec2) -> Entity {
    app.world_mut()
        .spawn((
            Ball,
            BallRadius(12.0),
            BallState::new("ball_basic", BallAbility::None, 300, 10),
            Transform::from_xyz(pos.x, pos.y, 0.0),
            GlobalTransform::default(),
            Velocity::linear(vel),
        ))
        .id()
}

#[test]
fn paired_portals_link_symmetrically() {
    let mut app = test_app();
    let a = spawn_portal(&mut app, Vec2::new(100.0, 100.0), 1.0);
    let b = spawn_portal(&mut app, Vec2::new(400.0, 300.0), 1.0);
    let c = spawn_portal(&mut app, Vec2::new(700.0, 200.0), 1.0);

    let _ = app.world_mut().run_system_once(pair_portals);

    let la = app.world().get::<BuildingState>(a).unwrap().linked;
    let lb = app.world().get::<BuildingState>(b).unwrap().linked;
    let lc = app.world().get::<BuildingState>(c).unwrap().linked;
    assert_eq!(la, Some(b));
    assert_eq!(lb, Some(a));
    // The odd portal stays in the single pending slot.
    assert_eq!(lc, None);
}

#[test]
fn teleport_exits_along_incoming_velocity_with_preserved_fraction() {
    let mut app = test_app();
    let a = spawn_portal(&mut app, Vec2::new(100.0, 100.0), 0.5);
    let b = spawn_portal(&mut app, Vec2::new(400.0, 300.0), 0.5);
    let _ = app.world_mut().run_system_once(pair_portals);
    let _ = (a, b);

    let ball = spawn_ball(&mut app, Vec2::new(100.0, 100.0), Vec2::new(100.0, 0.0));
    app.world_mut().send_event(BallBuildingContact { ball, building: a });
    let _ = app.world_mut().run_system_once(building_contact_behaviors);

    // Exit = linked position + fixed offset along the incoming direction.
    let pos = app.world().get::<Transform>(ball).unwrap().translation.truncate();
    assert!((pos - Vec2::new(415.0, 300.0)).length() < 1e-3, "got {pos}");
    // |v| = pre-teleport magnitude x preserve factor.
    let vel = app.world().get::<Velocity>(ball).unwrap().linvel;
    assert!((vel - Vec2::new(50.0, 0.0)).length() < 1e-3, "got {vel}");
    assert!(app.world().get::<BallState>(ball).unwrap().last_teleport_ms.is_some());
}

#[test]
fn teleport_interval_guard_blocks_immediate_bounce_back() {
    let mut app = test_app();
    let a = spawn_portal(&mut app, Vec2::new(100.0, 100.0), 1.0);
    let b = spawn_portal(&mut app, Vec2::new(400.0, 300.0), 1.0);
    let _ = app.world_mut().run_system_once(pair_portals);

    let ball = spawn_ball(&mut app, Vec2::new(100.0, 100.0), Vec2::new(100.0, 0.0));
    app.world_mut().send_event(BallBuildingContact { ball, building: a });
    let _ = app.world_mut().run_system_once(building_contact_behaviors);
    let after_first = app.world().get::<Transform>(ball).unwrap().translation.truncate();

    // Landing inside portal B the same instant must not warp straight back.
    app.world_mut()
        .resource_mut::<Events<BallBuildingContact>>()
        .clear();
    app.world_mut().send_event(BallBuildingContact { ball, building: b });
    let _ = app.world_mut().run_system_once(building_contact_behaviors);
    let after_second = app.world().get::<Transform>(ball).unwrap().translation.truncate();
    assert_eq!(after_first, after_second, "interval guard must hold the ball");
}

#[test]
fn unpaired_portal_is_inert() {
    let mut app = test_app();
    let solo = spawn_portal(&mut app, Vec2::new(100.0, 100.0), 1.0);
    let ball = spawn_ball(&mut app, Vec2::new(100.0, 100.0), Vec2::new(100.0, 0.0));
    app.world_mut().send_event(BallBuildingContact { ball, building: solo });
    let _ = app.world_mut().run_system_once(building_contact_behaviors);
    let pos = app.world().get::<Transform>(ball).unwrap().translation.truncate();
    assert_eq!(pos, Vec2::new(100.0, 100.0));
}
