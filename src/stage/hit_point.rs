//! Ray/obstacle intersection results and nearest-hit selection.

use bevy::prelude::*;

use super::object::ObstacleRef;

/// One successful intersection between a shot ray and an obstacle primitive.
///
/// The distance is derived from `source` and `point` at construction and can
/// never disagree with them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitPoint {
    point: Vec3,
    source: Vec3,
    owner: ObstacleRef,
    primitive: Entity,
    distance: f32,
}

impl HitPoint {
    pub fn new(point: Vec3, source: Vec3, owner: ObstacleRef, primitive: Entity) -> Self {
        Self {
            point,
            source,
            owner,
            primitive,
            distance: source.distance(point),
        }
    }

    /// Point of impact.
    pub fn point(&self) -> Vec3 {
        self.point
    }

    pub fn source(&self) -> Vec3 {
        self.source
    }

    /// The wall or movable the hit primitive belongs to.
    pub fn owner(&self) -> ObstacleRef {
        self.owner
    }

    /// The primitive that was hit.
    pub fn primitive(&self) -> Entity {
        self.primitive
    }

    /// Euclidean distance from the shot source to the impact point.
    pub fn distance(&self) -> f32 {
        self.distance
    }
}

/// Pick the candidate closest to its shot source.
///
/// Candidates at exactly equal distance resolve to the one that appears
/// first, so the result only depends on the order obstacles were queried in.
pub fn determine_nearest_hit_point(candidates: &[HitPoint]) -> Option<HitPoint> {
    let mut nearest: Option<HitPoint> = None;
    for candidate in candidates {
        match nearest {
            Some(current) if current.distance <= candidate.distance => {}
            _ => nearest = Some(*candidate),
        }
    }
    nearest
}
