//! Stage settings loaded from an external RON file.
//!
//! Allows tweaking debug aids, shot tuning and controls without recompiling.

use bevy::prelude::*;
use serde::Deserialize;
use std::fs;

use crate::player::PlayerConfig;

/// Settings loaded from assets/data/settings.ron.
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StageSettings {
    // Debug aids
    /// Draw a line for every resolved shot
    pub debug_shot_rays: bool,
    /// Draw colored X/Y/Z axes at the origin
    pub debug_axes: bool,
    pub axis_length: f32,
    // Shots
    pub shot_range: f32,
    pub shot_impulse: f32,
    pub decal_radius: f32,
    // Items
    /// Degrees an item turns every tick
    pub item_spin: f32,
    // Cameras
    /// Mouse look multiplier for input-controlled cameras
    pub mouse_sensitivity: f32,
    pub invert_y: bool,
    pub free_camera_speed: f32,
    /// Radians per second
    pub arc_rotate_speed: f32,
    /// Higher = the follow camera catches up faster
    pub follow_smoothing: f32,
    // Sounds (paths relative to assets/)
    pub impact_sound: Option<String>,
    pub pickup_sound: Option<String>,
    pub player: PlayerConfig,
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            debug_shot_rays: false,
            debug_axes: false,
            axis_length: 5.0,
            shot_range: 100.0,
            shot_impulse: 4.0,
            decal_radius: 0.08,
            item_spin: 1.0,
            mouse_sensitivity: 1.5,
            invert_y: false,
            free_camera_speed: 8.0,
            arc_rotate_speed: 0.3,
            follow_smoothing: 6.0,
            impact_sound: None,
            pickup_sound: None,
            player: PlayerConfig::default(),
        }
    }
}

impl StageSettings {
    pub const PATH: &'static str = "assets/data/settings.ron";

    /// Load settings from RON file, falling back to defaults.
    pub fn load() -> Self {
        match fs::read_to_string(Self::PATH) {
            Ok(contents) => match ron::from_str(&contents) {
                Ok(settings) => {
                    info!("Loaded stage settings from {}", Self::PATH);
                    settings
                }
                Err(e) => {
                    error!("Failed to parse {}: {}. Using defaults.", Self::PATH, e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Could not read {}: {}. Using defaults.", Self::PATH, e);
                Self::default()
            }
        }
    }
}

/// System to load stage settings at startup.
pub fn load_stage_settings(mut commands: Commands) {
    commands.insert_resource(StageSettings::load());
}
