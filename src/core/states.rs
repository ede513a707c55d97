//! Game state definitions that control the overall flow of the application.
//!
//! States determine which systems run at any given time. Stage ticking only
//! happens while `PlayState::Running` is active, so pausing freezes the
//! stage without unloading it.

use bevy::prelude::*;

/// Main application states.
///
/// - Start in `Loading` while settings and stage files are read
/// - Move to `InGame` once the stage catalogue is available
#[derive(States, Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum GameState {
    /// Reading settings and stage definitions
    #[default]
    Loading,
    /// A stage is loaded and visible
    InGame,
}

/// Sub-states for gameplay - only active when `GameState::InGame`.
#[derive(SubStates, Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
#[source(GameState = GameState::InGame)]
pub enum PlayState {
    /// The stage ticks every frame
    #[default]
    Running,
    /// The stage stays loaded but does not tick
    Paused,
}
