use bevy::ecs::system::RunSystemOnce;
use bevy::prelude::*;
use bevy_rapier2d::prelude::Velocity;

use pocket_arcade::core::components::{Ball, BallRadius, BallState};
use pocket_arcade::gameplay::abilities::BallAbility;
use pocket_arcade::physics::stability::stability_pass;
use pocket_arcade::GameConfig;

fn test_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(GameConfig::default());
    app
}

fn spawn_ball(app: &mut App, vel: Vec2) -> Entity {
    app.world_mut()
        .spawn((
            Ball,
            BallRadius(12.0),
            BallState::new("ball_basic", BallAbility::None, 300, 10),
            Transform::from_xyz(0.0, 0.0, 0.0),
            GlobalTransform::default(),
            Velocity::linear(vel),
        ))
        .id()
}

#[test]
fn speed_never_exceeds_cap_after_pass() {
    let mut app = test_app();
    let cap = app.world().resource::<GameConfig>().speed.max_speed;
    // Pseudo-arbitrary pre-pass velocities across magnitude and direction.
    let mut entities = Vec::new();
    for i in 0..64 {
        let angle = i as f32 * 0.73;
        let mag = (i as f32 * 157.31) % 9000.0;
        entities.push(spawn_ball(&mut app, Vec2::from_angle(angle) * mag));
    }
    let _ = app.world_mut().run_system_once(stability_pass);
    for e in entities {
        let v = app.world().get::<Velocity>(e).unwrap().linvel;
        assert!(
            v.length() <= cap + 1e-3,
            "speed {} above cap {cap}",
            v.length()
        );
    }
}

#[test]
fn cap_preserves_direction() {
    let mut app = test_app();
    let e = spawn_ball(&mut app, Vec2::new(3000.0, 4000.0));
    let _ = app.world_mut().run_system_once(stability_pass);
    let v = app.world().get::<Velocity>(e).unwrap().linvel;
    let cap = app.world().resource::<GameConfig>().speed.max_speed;
    assert!((v.length() - cap).abs() < 1e-2);
    // Direction (0.6, 0.8) survives the rescale.
    assert!((v.x / v.length() - 0.6).abs() < 1e-4);
    assert!((v.y / v.length() - 0.8).abs() < 1e-4);
}

#[test]
fn non_finite_velocity_snaps_to_exact_zero() {
    let mut app = test_app();
    let nan = spawn_ball(&mut app, Vec2::new(f32::NAN, 3.0));
    let inf = spawn_ball(&mut app, Vec2::new(10.0, f32::INFINITY));
    let _ = app.world_mut().run_system_once(stability_pass);
    assert_eq!(app.world().get::<Velocity>(nan).unwrap().linvel, Vec2::ZERO);
    assert_eq!(app.world().get::<Velocity>(inf).unwrap().linvel, Vec2::ZERO);
}

#[test]
fn grace_frames_suppress_damping_then_expire() {
    let mut app = test_app();
    let e = spawn_ball(&mut app, Vec2::new(100.0, 0.0));
    app.world_mut().get_mut::<BallState>(e).unwrap().grace_frames = 2;

    let _ = app.world_mut().run_system_once(stability_pass);
    assert_eq!(app.world().get::<Velocity>(e).unwrap().linvel.x, 100.0);
    assert_eq!(app.world().get::<BallState>(e).unwrap().grace_frames, 1);

    let _ = app.world_mut().run_system_once(stability_pass);
    assert_eq!(app.world().get::<Velocity>(e).unwrap().linvel.x, 100.0);
    assert_eq!(app.world().get::<BallState>(e).unwrap().grace_frames, 0);

    // Grace spent: damping applies from here on.
    let _ = app.world_mut().run_system_once(stability_pass);
    let vx = app.world().get::<Velocity>(e).unwrap().linvel.x;
    assert!((vx - 99.6).abs() < 1e-3, "expected damped 99.6, got {vx}");
}

#[test]
fn jitter_band_gets_harsher_damping() {
    let mut app = test_app();
    // Below min_rest_speed (2.4): only the jitter factor applies.
    let slow = spawn_ball(&mut app, Vec2::new(1.2, 0.0));
    // Between min_rest_speed and the jitter band (4.8): both factors apply.
    let mid = spawn_ball(&mut app, Vec2::new(3.0, 0.0));
    // Above the band: plain damping only.
    let fast = spawn_ball(&mut app, Vec2::new(100.0, 0.0));

    let _ = app.world_mut().run_system_once(stability_pass);
    let v_slow = app.world().get::<Velocity>(slow).unwrap().linvel.x;
    let v_mid = app.world().get::<Velocity>(mid).unwrap().linvel.x;
    let v_fast = app.world().get::<Velocity>(fast).unwrap().linvel.x;
    assert!((v_slow - 1.2 * 0.95).abs() < 1e-4, "got {v_slow}");
    assert!((v_mid - 3.0 * 0.996 * 0.95).abs() < 1e-4, "got {v_mid}");
    assert!((v_fast - 99.6).abs() < 1e-3, "got {v_fast}");
}

#[test]
fn inactive_balls_are_left_alone() {
    let mut app = test_app();
    let e = spawn_ball(&mut app, Vec2::new(9000.0, 0.0));
    app.world_mut().get_mut::<BallState>(e).unwrap().active = false;
    let _ = app.world_mut().run_system_once(stability_pass);
    assert_eq!(app.world().get::<Velocity>(e).unwrap().linvel.x, 9000.0);
}
