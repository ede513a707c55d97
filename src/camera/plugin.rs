//! Camera plugin - per-frame rig updates and cursor handling.

use bevy::prelude::*;

use super::rigs::*;
use crate::core::{GameState, PlayState};

/// Drives whichever cameras the current stage has built.
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::InGame), grab_cursor)
            .add_systems(OnExit(GameState::InGame), release_cursor)
            .add_systems(OnEnter(PlayState::Paused), release_cursor)
            .add_systems(OnExit(PlayState::Paused), grab_cursor)
            .add_systems(
                Update,
                (mouse_look, fly_free_camera, update_locked_cameras)
                    .chain()
                    .run_if(in_state(PlayState::Running)),
            );
    }
}
