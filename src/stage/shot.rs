//! Shot rays built from a fire action.

use bevy::prelude::*;

/// A finite ray from the shot source toward its destination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotRay {
    origin: Vec3,
    direction: Dir3,
    length: f32,
}

impl ShotRay {
    /// Ray from `source` to `destination`; `None` when the two coincide.
    pub fn between(source: Vec3, destination: Vec3) -> Option<Self> {
        let offset = destination - source;
        let length = offset.length();
        let direction = Dir3::new(offset).ok()?;
        Some(Self {
            origin: source,
            direction,
            length,
        })
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn direction(&self) -> Dir3 {
        self.direction
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn destination(&self) -> Vec3 {
        self.point_at(self.length)
    }

    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}
