use bevy::prelude::*;

use crate::core::config::GameConfig;

#[derive(Resource, Deref, DerefMut)]
struct SessionTimeout(Timer);

/// Headless runs stop themselves after `session.autoClose` seconds.
pub struct SessionPlugin;

impl Plugin for SessionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_timeout)
            .add_systems(Update, check_timeout);
    }
}

fn setup_timeout(mut commands: Commands, cfg: Res<GameConfig>) {
    let secs = cfg.session.auto_close;
    if secs > 0.0 {
        info!(target: "session", "auto close armed: {secs}s");
        commands.insert_resource(SessionTimeout(Timer::from_seconds(secs, TimerMode::Once)));
    }
}

fn check_timeout(
    time: Res<Time>,
    mut timer: Option<ResMut<SessionTimeout>>,
    mut ev_exit: EventWriter<AppExit>,
) {
    if let Some(t) = timer.as_mut() {
        t.tick(time.delta());
        if t.finished() {
            info!(target: "session", "auto close reached; exiting");
            ev_exit.write(AppExit::Success);
        }
    }
}
