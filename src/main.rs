//! Shooting Range - Entry Point
//!
//! Controls:
//! - WASD: Move, Shift: Sprint
//! - Q/E: Turn, R/F: Look up/down
//! - Space / Left mouse: Fire
//! - 1-5: Free, stationary, follow, first-person, orbit camera
//! - Arrows, PageUp/PageDown, Mouse: Fly the free camera
//! - N: Next stage
//! - Escape: Pause/Unpause

use bevy::prelude::*;
use bevy_kira_audio::AudioPlugin;
use bevy_rapier3d::prelude::*;

fn main() {
    App::new()
        // Bevy default plugins; kira replaces bevy's own audio
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Shooting Range".to_string(),
                        resolution: (1280.0, 720.0).into(),
                        ..default()
                    }),
                    ..default()
                })
                .disable::<bevy::audio::AudioPlugin>(),
        )

        // Audio
        .add_plugins(AudioPlugin)

        // Physics
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())

        // Our game plugin
        .add_plugins(shooting_range::ShootingRangePlugin)

        .run();
}
