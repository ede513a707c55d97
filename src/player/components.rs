//! Player-related components and configuration.

use bevy::prelude::*;
use serde::Deserialize;

/// Marker component for the player's body primitive.
#[derive(Component)]
pub struct PlayerBody;

/// Marker component for the player's eye primitive.
#[derive(Component)]
pub struct PlayerEye;

/// Maximum look pitch in radians (about 80 degrees), shared by the player and
/// the input-driven cameras.
pub const PITCH_LIMIT: f32 = 1.4;

/// Tracks player movement state for physics.
#[derive(Debug, Clone, Copy, Default)]
pub struct MovementState {
    pub vertical_velocity: f32,
}

/// Player controller tuning, part of the stage settings file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Base movement speed in units per second
    pub move_speed: f32,
    /// Sprint speed multiplier
    pub sprint_multiplier: f32,
    /// Keyboard turn speed in degrees per second
    pub turn_speed: f32,
    /// Gravity acceleration
    pub gravity: f32,
    /// Size of the body box
    pub body_size: (f32, f32, f32),
    /// Eye position above the body center
    pub eye_height: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            sprint_multiplier: 1.5,
            turn_speed: 120.0,
            gravity: 15.0,
            body_size: (0.6, 1.6, 0.6),
            eye_height: 0.6,
        }
    }
}
