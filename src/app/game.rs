use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

use crate::app::session::SessionPlugin;
use crate::app::state::TablePhase;
use crate::core::level::LevelLoaderPlugin;
use crate::core::system::system_order::{
    AbilitySet, CollisionRouteSet, PostPhysicsAdjustSet, SchedulerSet,
};
use crate::debug::DebugPlugin;
use crate::gameplay::abilities::AbilityTablesPlugin;
use crate::gameplay::cooldown::DeferredActionsPlugin;
use crate::gameplay::scoring::ScoringPlugin;
use crate::gameplay::shot::ShotPlugin;
use crate::gameplay::spawn::SpawnPlugin;
use crate::physics::chain::ChainReactionPlugin;
use crate::physics::collision::CollisionRouterPlugin;
use crate::physics::rest::RestDetectorPlugin;
use crate::physics::setup::PhysicsSetupPlugin;
use crate::physics::stability::StabilityPlugin;

pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            Update,
            (
                SchedulerSet,
                CollisionRouteSet.after(SchedulerSet),
                AbilitySet.after(CollisionRouteSet),
                PostPhysicsAdjustSet.after(AbilitySet),
            ),
        )
        .add_plugins(StatesPlugin)
        .init_state::<TablePhase>()
        .add_plugins((
            PhysicsSetupPlugin,
            CollisionRouterPlugin,
            DeferredActionsPlugin,
            AbilityTablesPlugin,
            ChainReactionPlugin,
            StabilityPlugin,
            RestDetectorPlugin,
            LevelLoaderPlugin,
            SpawnPlugin,
            ShotPlugin,
            ScoringPlugin,
            SessionPlugin,
            DebugPlugin,
        ));
    }
}
