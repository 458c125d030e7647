use std::cmp::Reverse;
use std::collections::BinaryHeap;

use bevy::prelude::*;

use crate::core::components::{BallState, BuildingState};
use crate::core::system::system_order::SchedulerSet;

/// One-shot actions fired between frames by the scheduler. Kept as plain data
/// keyed by entity handle, never closures over entities that might already
/// be despawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DeferredAction {
    ResetBallTrigger,
    ResetBuildingTrigger,
    ClearSlow,
}

/// Priority queue of (fire-time, entity, action), drained as time advances.
/// There is no cancellation: an entry whose entity died fires as a no-op.
#[derive(Resource, Default)]
pub struct DeferredActions {
    heap: BinaryHeap<(Reverse<(u64, u64)>, Entity, DeferredAction)>,
    next_seq: u64,
}

impl DeferredActions {
    pub fn schedule(&mut self, fire_at_ms: u64, entity: Entity, action: DeferredAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push((Reverse((fire_at_ms, seq)), entity, action));
    }

    pub fn pop_due(&mut self, now_ms: u64) -> Option<(Entity, DeferredAction)> {
        let &(Reverse((at, _)), entity, action) = self.heap.peek()?;
        if at > now_ms {
            return None;
        }
        self.heap.pop();
        Some((entity, action))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

pub fn now_ms(time: &Time) -> u64 {
    time.elapsed().as_millis() as u64
}

pub struct DeferredActionsPlugin;

impl Plugin for DeferredActionsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DeferredActions>()
            .add_systems(Update, fire_due_actions.in_set(SchedulerSet));
    }
}

/// Drains due entries at the head of the frame, on the same thread as the
/// step. Liveness is re-checked at fire time; a dead entity is a silent no-op.
pub fn fire_due_actions(
    time: Res<Time>,
    mut actions: ResMut<DeferredActions>,
    mut q_balls: Query<&mut BallState>,
    mut q_buildings: Query<&mut BuildingState>,
) {
    let now = now_ms(&time);
    while let Some((entity, action)) = actions.pop_due(now) {
        match action {
            DeferredAction::ResetBallTrigger => {
                if let Ok(mut state) = q_balls.get_mut(entity) {
                    state.can_trigger = true;
                }
            }
            DeferredAction::ResetBuildingTrigger => {
                if let Ok(mut state) = q_buildings.get_mut(entity) {
                    state.can_trigger = true;
                }
            }
            DeferredAction::ClearSlow => {
                if let Ok(mut state) = q_balls.get_mut(entity) {
                    state.slowed = false;
                }
            }
        }
    }
}
