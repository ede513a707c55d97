//! Shooting Range - an interactive 3D target range in Bevy.
//!
//! A stage is built from a RON definition: walls, movable crates, spinning
//! pickups, lights, and an optional player. Shots are resolved against every
//! wall and movable, and the nearest hit leaves a bullet hole.
//!
//! # Architecture
//!
//! The game is organized into plugins, each handling a specific aspect:
//!
//! - **Core**: Game states, global events, pause handling
//! - **Stage**: Stage catalogue, lifecycle, game objects, shot resolution
//! - **Player**: Body/eye primitives, movement, fire input
//! - **Camera**: Free, stationary, follow, first-person, and orbit cameras
//! - **Audio**: Impact and pickup sounds
//! - **UI**: Stage HUD

pub mod audio;
pub mod camera;
pub mod core;
pub mod player;
pub mod stage;
pub mod ui;

use bevy::prelude::*;

/// Main game plugin that adds all sub-plugins.
pub struct ShootingRangePlugin;

impl Plugin for ShootingRangePlugin {
    fn build(&self, app: &mut App) {
        app
            // Core systems (must be first)
            .add_plugins(core::CorePlugin)

            // Stage loading and ticking
            .add_plugins(stage::StagePlugin)

            // Camera rigs
            .add_plugins(camera::CameraPlugin)

            // Sounds
            .add_plugins(audio::StageAudioPlugin);
    }
}
