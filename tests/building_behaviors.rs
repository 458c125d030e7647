use std::time::Duration;

use bevy::ecs::system::RunSystemOnce;
use bevy::prelude::*;
use bevy_rapier2d::prelude::Velocity;

use pocket_arcade::core::components::{Ball, BallRadius, BallState, Building, BuildingState, CueBall};
use pocket_arcade::core::level::catalog::EntityCatalog;
use pocket_arcade::gameplay::abilities::building::{building_contact_behaviors, building_field_tick};
use pocket_arcade::gameplay::abilities::{BallAbility, BuildingBehavior};
use pocket_arcade::gameplay::cooldown::DeferredActions;
use pocket_arcade::gameplay::scoring::{resolve_removed_for_score, ScoreBoard, ScoreChanged};
use pocket_arcade::physics::collision::{BallBuildingContact, BallRemovedForScore};
use pocket_arcade::GameConfig;

fn test_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(GameConfig::default());
    let balls = r#"[{"id": "ball_basic", "name": "Basic", "scoreValue": 10}]"#;
    let (catalog, _) = EntityCatalog::from_json(balls, "[]").unwrap();
    app.insert_resource(catalog);
    app.init_resource::<DeferredActions>();
    app.init_resource::<ScoreBoard>();
    app.add_event::<BallBuildingContact>();
    app.add_event::<BallRemovedForScore>();
    app.add_event::<ScoreChanged>();
    app
}

fn spawn_building(app: &mut App, pos: Vec2, behavior: BuildingBehavior) -> Entity {
    app.world_mut()
        .spawn((
            Building,
            BuildingState::new("test_building", Some(behavior), Vec2::new(30.0, 30.0)),
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

fn contact(app: &mut App, ball: Entity, building: Entity) {
    app.world_mut().send_event(BallBuildingContact { ball, building });
}

#[test]
fn splitter_cooldown_gates_duplicate_reports() {
    let mut app = test_app();
    let splitter = spawn_building(
        &mut app,
        Vec2::new(200.0, 200.0),
        BuildingBehavior::Split {
            cooldown_ms: 600,
            spawn_count: 1,
            spawn_speed: 150.0,
            spawn_ball_id: "ball_basic".into(),
        },
    );
    let ball = spawn_ball(&mut app, Vec2::new(190.0, 200.0), Vec2::new(80.0, 0.0));

    contact(&mut app, ball, splitter);
    contact(&mut app, ball, splitter);
    let _ = app.world_mut().run_system_once(building_contact_behaviors);

    let mut q = app.world_mut().query_filtered::<(), With<Ball>>();
    assert_eq!(q.iter(app.world()).count(), 2, "one trigger, one spawned ball");
}

#[test]
fn absorber_caps_out_and_credits_score() {
    let mut app = test_app();
    let absorber = spawn_building(
        &mut app,
        Vec2::new(200.0, 200.0),
        BuildingBehavior::Absorb {
            max_absorbs: 2,
            speed_reduction: 0.5,
            score_bonus: 5,
        },
    );
    let ball = spawn_ball(&mut app, Vec2::new(190.0, 200.0), Vec2::new(80.0, 0.0));

    for _ in 0..3 {
        contact(&mut app, ball, absorber);
        let _ = app.world_mut().run_system_once(building_contact_behaviors);
        app.world_mut()
            .resource_mut::<Events<BallBuildingContact>>()
            .clear();
    }

    // Third contact declined silently: cap reached.
    assert_eq!(
        app.world().get::<BuildingState>(absorber).unwrap().absorb_count,
        2
    );
    let v = app.world().get::<Velocity>(ball).unwrap().linvel.x;
    assert!((v - 20.0).abs() < 1e-3, "two halvings only, got {v}");
    assert_eq!(app.world().resource::<ScoreBoard>().score, 10);
}

#[test]
fn deflect_rotates_velocity_and_skips_resting_balls() {
    let mut app = test_app();
    let rotator = spawn_building(
        &mut app,
        Vec2::new(200.0, 200.0),
        BuildingBehavior::Deflect {
            deflect_angle: std::f32::consts::FRAC_PI_2,
            preserve_speed: true,
        },
    );
    let moving = spawn_ball(&mut app, Vec2::new(190.0, 200.0), Vec2::new(100.0, 0.0));
    let resting = spawn_ball(&mut app, Vec2::new(210.0, 200.0), Vec2::new(1.0, 0.0));

    contact(&mut app, moving, rotator);
    contact(&mut app, resting, rotator);
    let _ = app.world_mut().run_system_once(building_contact_behaviors);

    let v = app.world().get::<Velocity>(moving).unwrap().linvel;
    assert!((v - Vec2::new(0.0, 100.0)).length() < 1e-2, "90 deg turn, got {v}");
    // Below the minimum act speed nothing happens.
    assert_eq!(
        app.world().get::<Velocity>(resting).unwrap().linvel,
        Vec2::new(1.0, 0.0)
    );
}

#[test]
fn accelerate_boosts_up_to_exit_cap() {
    let mut app = test_app();
    let booster = spawn_building(
        &mut app,
        Vec2::new(200.0, 200.0),
        BuildingBehavior::Accelerate {
            boost_multiplier: 3.0,
            max_exit_speed: 250.0,
        },
    );
    let ball = spawn_ball(&mut app, Vec2::new(190.0, 200.0), Vec2::new(100.0, 0.0));
    contact(&mut app, ball, booster);
    let _ = app.world_mut().run_system_once(building_contact_behaviors);
    let v = app.world().get::<Velocity>(ball).unwrap().linvel;
    assert!((v.x - 250.0).abs() < 1e-2, "clamped to the exit cap, got {v}");
}

#[test]
fn attract_field_pulls_slows_and_consumes_at_the_core() {
    let mut app = test_app();
    spawn_building(
        &mut app,
        Vec2::ZERO,
        BuildingBehavior::Attract {
            attract_radius: 100.0,
            attract_strength: 400.0,
            slow_factor: 0.94,
            inner_kill_radius: 8.0,
        },
    );
    let orbiting = spawn_ball(&mut app, Vec2::new(50.0, 0.0), Vec2::ZERO);
    let doomed = spawn_ball(&mut app, Vec2::new(5.0, 0.0), Vec2::ZERO);
    let cue = spawn_ball(&mut app, Vec2::new(6.0, 0.0), Vec2::ZERO);
    app.world_mut().entity_mut(cue).insert(CueBall);
    let outside = spawn_ball(&mut app, Vec2::new(150.0, 0.0), Vec2::ZERO);

    app.world_mut()
        .resource_mut::<Time>()
        .advance_by(Duration::from_millis(16));
    let _ = app.world_mut().run_system_once(building_field_tick);

    // Pull points toward the well.
    assert!(app.world().get::<Velocity>(orbiting).unwrap().linvel.x < 0.0);
    assert_eq!(app.world().get::<Velocity>(outside).unwrap().linvel, Vec2::ZERO);

    // The core consumed the inner ball for score credit; the cue is exempt.
    let _ = app.world_mut().run_system_once(resolve_removed_for_score);
    assert!(app.world().get_entity(doomed).is_err(), "doomed ball removed");
    assert!(app.world().get_entity(cue).is_ok(), "cue ball survives the core");
    assert_eq!(app.world().resource::<ScoreBoard>().score, 10);
}

#[test]
fn ghost_ball_spends_passes_instead_of_triggering() {
    let mut app = test_app();
    let bumper = spawn_building(
        &mut app,
        Vec2::new(200.0, 200.0),
        BuildingBehavior::Bounce {
            base_force: 150.0,
            impulse_multiplier: 2.0,
        },
    );
    let ghost = spawn_ball(&mut app, Vec2::new(190.0, 200.0), Vec2::new(100.0, 0.0));
    app.world_mut().get_mut::<BallState>(ghost).unwrap().ghost_passes_remaining = 1;

    contact(&mut app, ghost, bumper);
    let _ = app.world_mut().run_system_once(building_contact_behaviors);
    // First pass: no bounce, one pass spent.
    assert_eq!(
        app.world().get::<Velocity>(ghost).unwrap().linvel,
        Vec2::new(100.0, 0.0)
    );
    assert_eq!(app.world().get::<BallState>(ghost).unwrap().ghost_passes_remaining, 0);

    app.world_mut()
        .resource_mut::<Events<BallBuildingContact>>()
        .clear();
    contact(&mut app, ghost, bumper);
    let _ = app.world_mut().run_system_once(building_contact_behaviors);
    // Passes exhausted: the bumper acts now.
    let v = app.world().get::<Velocity>(ghost).unwrap().linvel;
    assert!(v.x < 100.0 - 1.0 || v.length() > 100.0 + 1.0, "bounce applied, got {v}");
}
