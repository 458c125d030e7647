//! Central system ordering labels to make the per-frame sequence explicit.
//! Stages (high-level):
//! 1. SchedulerSet (drain due deferred actions before anything reacts this frame)
//! 2. CollisionRouteSet (classify last step's contact pairs into typed events)
//! 3. AbilitySet (ability dispatch, chain propagation, field ticks, pocket resolution)
//! 4. PostPhysicsAdjustSet (stability corrections, rest detection)
//! Rapier itself steps in its own schedule between frames.
use bevy::prelude::*;

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub struct SchedulerSet; // deferred one-shot actions fire before handlers run

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub struct CollisionRouteSet; // raw contact pairs -> typed collision events

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub struct AbilitySet; // entity-specific reactions (may spawn/remove entities)

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub struct PostPhysicsAdjustSet; // lightweight corrections after physics
