//! Global events used for cross-system communication.
//!
//! The stage emits these after it has finished mutating itself, so listeners
//! (audio, logging, gameplay extensions) never need access to the stage.

use bevy::prelude::*;

use crate::camera::CameraType;
use crate::stage::ObstacleRef;

/// Request to resolve a shot from outside the player's own fire input.
///
/// Weapon logic that is not part of the stage (turrets, scripted events)
/// sends these; the stage plugin feeds them into `Stage::apply_shot`.
#[derive(Event, Debug, Clone, Copy)]
pub struct ShotRequestEvent {
    pub source: Vec3,
    pub destination: Vec3,
}

/// Sent when a shot hit something and left a bullet hole.
#[derive(Event, Debug, Clone, Copy)]
pub struct ShotResolvedEvent {
    /// World-space impact point
    pub point: Vec3,
    /// Distance from the shot source to the impact point
    pub distance: f32,
    /// The wall or movable that was hit
    pub owner: ObstacleRef,
}

/// Sent when the player picks up an item.
#[derive(Event, Debug, Clone, Copy)]
pub struct ItemPickupEvent {
    /// Index of the item in the stage's item collection
    pub item: usize,
}

/// Sent after the active camera changed.
#[derive(Event, Debug, Clone, Copy)]
pub struct CameraChangedEvent {
    pub from: CameraType,
    pub to: CameraType,
}

/// Send an event if its queue is registered in the world.
///
/// Stages are also driven from bare worlds (tools, tests) that never
/// registered the event types; those simply drop the event.
pub fn emit<E: Event>(world: &mut World, event: E) {
    if let Some(mut events) = world.get_resource_mut::<Events<E>>() {
        events.send(event);
    }
}
