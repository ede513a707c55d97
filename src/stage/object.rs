//! Game objects owned by a stage.
//!
//! Every object owns an ordered list of primitive handles and releases them
//! when disposed. Walls and movables answer shot queries; items spin and can
//! be picked up once; bots carry no behavior yet.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::hit_point::HitPoint;
use super::primitives::{despawn_primitive, placed, primitives_intersect};
use super::shot::ShotRay;

/// Base ownership unit for one or more primitives.
#[derive(Debug, Default)]
pub struct GameObject {
    primitives: Vec<Entity>,
}

impl GameObject {
    pub fn new(primitives: Vec<Entity>) -> Self {
        Self { primitives }
    }

    pub fn single(primitive: Entity) -> Self {
        Self::new(vec![primitive])
    }

    /// The owned primitives, in creation order.
    pub fn primitives(&self) -> &[Entity] {
        &self.primitives
    }

    /// Release every owned primitive exactly once.
    ///
    /// Handles already released elsewhere are skipped. The object gives up its
    /// handles, so disposing it again releases nothing.
    pub fn dispose(&mut self, world: &mut World) {
        for primitive in self.primitives.drain(..) {
            if !despawn_primitive(world, primitive) {
                debug!("Primitive {:?} was already released", primitive);
            }
        }
    }
}

/// Shared capabilities of everything a stage owns and ticks.
pub trait StageObject {
    fn object(&self) -> &GameObject;

    fn object_mut(&mut self) -> &mut GameObject;

    fn primitives(&self) -> &[Entity] {
        self.object().primitives()
    }

    /// Per-tick mutation. Most objects are static.
    fn render(&mut self, _world: &mut World) {}

    fn dispose(&mut self, world: &mut World) {
        self.object_mut().dispose(world);
    }
}

impl StageObject for GameObject {
    fn object(&self) -> &GameObject {
        self
    }

    fn object_mut(&mut self) -> &mut GameObject {
        self
    }
}

/// Obstacle kinds that answer shot queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObstacleKind {
    Wall,
    Movable,
}

/// Reference from a hit back to the obstacle that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObstacleRef {
    pub kind: ObstacleKind,
    /// Position in the stage's wall or movable collection
    pub index: usize,
}

/// A wall or movable.
#[derive(Debug)]
pub struct Obstacle {
    id: ObstacleRef,
    object: GameObject,
}

impl Obstacle {
    pub fn new(id: ObstacleRef, object: GameObject) -> Self {
        Self { id, object }
    }

    pub fn id(&self) -> ObstacleRef {
        self.id
    }

    pub fn kind(&self) -> ObstacleKind {
        self.id.kind
    }

    /// Intersect `ray` with every owned primitive.
    ///
    /// One hit per primitive the ray reaches; an empty result is a miss.
    pub fn apply_shot(&self, world: &World, ray: &ShotRay) -> Vec<HitPoint> {
        self.object
            .primitives()
            .iter()
            .filter_map(|&primitive| {
                let (shape, transform) = placed(world, primitive)?;
                let distance = shape.cast_ray(transform, ray)?;
                Some(HitPoint::new(
                    ray.point_at(distance),
                    ray.origin(),
                    self.id,
                    primitive,
                ))
            })
            .collect()
    }

    /// Push a movable primitive. Walls don't move.
    pub fn apply_impulse(&self, world: &mut World, primitive: Entity, impulse: Vec3, point: Vec3) {
        if self.kind() != ObstacleKind::Movable || !self.object.primitives().contains(&primitive) {
            return;
        }
        let Some(center) = world.get::<Transform>(primitive).map(|t| t.translation) else {
            return;
        };
        world
            .entity_mut(primitive)
            .insert(ExternalImpulse::at_point(impulse, point, center));
    }
}

impl StageObject for Obstacle {
    fn object(&self) -> &GameObject {
        &self.object
    }

    fn object_mut(&mut self) -> &mut GameObject {
        &mut self.object
    }
}

/// A spinning pickup.
#[derive(Debug)]
pub struct Item {
    object: GameObject,
    picked: bool,
    /// Current rotation around Y in degrees. Only ever grows.
    angle: f32,
    /// Degrees added every tick
    spin: f32,
}

impl Item {
    pub fn new(object: GameObject, spin: f32) -> Self {
        Self {
            object,
            picked: false,
            angle: 0.0,
            spin,
        }
    }

    pub fn is_picked(&self) -> bool {
        self.picked
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Test the item against `other`'s primitives and collect it on contact.
    ///
    /// Returns true only on the call that performed the pick; once picked the
    /// item never tests again.
    pub fn check_pick(&mut self, world: &mut World, other: &[Entity]) -> bool {
        if self.picked {
            return false;
        }

        let view: &World = world;
        let touching = self.object.primitives().iter().any(|&mine| {
            let Some(mine) = placed(view, mine) else {
                return false;
            };
            other.iter().any(|&theirs| {
                placed(view, theirs).is_some_and(|theirs| primitives_intersect(mine, theirs))
            })
        });
        if !touching {
            return false;
        }

        self.picked = true;
        for &primitive in self.object.primitives() {
            if let Some(mut visibility) = world.get_mut::<Visibility>(primitive) {
                *visibility = Visibility::Hidden;
            }
        }
        true
    }
}

impl StageObject for Item {
    fn object(&self) -> &GameObject {
        &self.object
    }

    fn object_mut(&mut self) -> &mut GameObject {
        &mut self.object
    }

    /// Advance the spin and set every primitive's rotation from scratch.
    fn render(&mut self, world: &mut World) {
        self.angle += self.spin;
        let rotation = Quat::from_euler(EulerRot::XYZ, 0.0, self.angle.to_radians(), 0.0);
        for &primitive in self.object.primitives() {
            if let Some(mut transform) = world.get_mut::<Transform>(primitive) {
                transform.rotation = rotation;
            }
        }
    }
}

/// Stage-owned character without behavior of its own.
#[derive(Debug)]
pub struct Bot {
    object: GameObject,
}

impl Bot {
    pub fn new(object: GameObject) -> Self {
        Self { object }
    }
}

impl StageObject for Bot {
    fn object(&self) -> &GameObject {
        &self.object
    }

    fn object_mut(&mut self) -> &mut GameObject {
        &mut self.object
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::primitives::{spawn_primitive, Primitive, PrimitiveDesc};

    fn cube(world: &mut World, at: Vec3) -> Entity {
        spawn_primitive(
            world,
            PrimitiveDesc::new(
                "cube",
                Primitive::cuboid(Vec3::ONE),
                Transform::from_translation(at),
            ),
        )
    }

    #[test]
    fn dispose_releases_everything_once() {
        let mut world = World::new();
        let a = cube(&mut world, Vec3::ZERO);
        let b = cube(&mut world, Vec3::X * 3.0);
        let mut object = GameObject::new(vec![a, b]);

        // Released behind the object's back.
        assert!(world.despawn(b));

        object.dispose(&mut world);
        assert!(!world.entities().contains(a));
        assert!(object.primitives().is_empty());
        object.dispose(&mut world);
    }

    #[test]
    fn wall_reports_one_hit_per_primitive() {
        let mut world = World::new();
        let near = cube(&mut world, Vec3::new(0.0, 0.0, -5.0));
        let far = cube(&mut world, Vec3::new(0.0, 0.0, -8.0));
        let aside = cube(&mut world, Vec3::new(4.0, 0.0, -5.0));
        let wall = Obstacle::new(
            ObstacleRef {
                kind: ObstacleKind::Wall,
                index: 3,
            },
            GameObject::new(vec![near, far, aside]),
        );

        let ray = ShotRay::between(Vec3::ZERO, Vec3::new(0.0, 0.0, -20.0)).unwrap();
        let hits = wall.apply_shot(&world, &ray);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].primitive(), near);
        assert!((hits[0].distance() - 4.5).abs() < 1e-4);
        assert_eq!(hits[1].primitive(), far);
        assert!(hits.iter().all(|hit| hit.owner().index == 3));
    }

    #[test]
    fn shot_query_leaves_obstacle_untouched() {
        let mut world = World::new();
        let primitive = cube(&mut world, Vec3::new(0.0, 0.0, -5.0));
        let movable = Obstacle::new(
            ObstacleRef {
                kind: ObstacleKind::Movable,
                index: 0,
            },
            GameObject::single(primitive),
        );
        let before = *world.get::<Transform>(primitive).unwrap();
        let ray = ShotRay::between(Vec3::ZERO, Vec3::new(0.0, 0.0, -20.0)).unwrap();
        assert_eq!(movable.apply_shot(&world, &ray).len(), 1);
        assert_eq!(*world.get::<Transform>(primitive).unwrap(), before);
    }

    #[test]
    fn impulse_only_moves_movables() {
        let mut world = World::new();
        let primitive = cube(&mut world, Vec3::new(0.0, 0.0, -5.0));
        let wall = Obstacle::new(
            ObstacleRef {
                kind: ObstacleKind::Wall,
                index: 0,
            },
            GameObject::single(primitive),
        );
        wall.apply_impulse(&mut world, primitive, Vec3::NEG_Z, Vec3::new(0.0, 0.0, -4.5));
        assert!(world.get::<ExternalImpulse>(primitive).is_none());

        let movable = Obstacle::new(
            ObstacleRef {
                kind: ObstacleKind::Movable,
                index: 0,
            },
            GameObject::single(primitive),
        );
        movable.apply_impulse(&mut world, primitive, Vec3::NEG_Z, Vec3::new(0.0, 0.0, -4.5));
        let impulse = world.get::<ExternalImpulse>(primitive).unwrap();
        assert_eq!(impulse.impulse, Vec3::NEG_Z);
    }

    #[test]
    fn item_rotation_is_absolute() {
        let mut world = World::new();
        let primitive = cube(&mut world, Vec3::ZERO);
        let mut item = Item::new(GameObject::single(primitive), 30.0);

        item.render(&mut world);
        item.render(&mut world);
        item.render(&mut world);
        assert_eq!(item.angle(), 90.0);

        let expected = Quat::from_rotation_y(90f32.to_radians());
        let rotation = world.get::<Transform>(primitive).unwrap().rotation;
        assert!(rotation.angle_between(expected) < 1e-4);
    }

    #[test]
    fn pick_is_one_way() {
        let mut world = World::new();
        let pickup = cube(&mut world, Vec3::ZERO);
        let player = cube(&mut world, Vec3::new(5.0, 0.0, 0.0));
        let mut item = Item::new(GameObject::single(pickup), 1.0);

        assert!(!item.check_pick(&mut world, &[player]));
        assert!(!item.is_picked());

        world.get_mut::<Transform>(player).unwrap().translation = Vec3::new(0.5, 0.0, 0.0);
        assert!(item.check_pick(&mut world, &[player]));
        assert!(item.is_picked());
        assert_eq!(world.get::<Visibility>(pickup), Some(&Visibility::Hidden));

        // Make it visible again; a picked item must not touch it anymore.
        *world.get_mut::<Visibility>(pickup).unwrap() = Visibility::Visible;
        assert!(!item.check_pick(&mut world, &[player]));
        assert!(item.is_picked());
        assert_eq!(world.get::<Visibility>(pickup), Some(&Visibility::Visible));
    }

    #[test]
    fn overlapping_primitives_pick_once() {
        let mut world = World::new();
        let left = cube(&mut world, Vec3::new(-0.3, 0.0, 0.0));
        let right = cube(&mut world, Vec3::new(0.3, 0.0, 0.0));
        let body = cube(&mut world, Vec3::ZERO);
        let eye = cube(&mut world, Vec3::new(0.0, 0.5, 0.0));
        let mut item = Item::new(GameObject::new(vec![left, right]), 1.0);

        // Every pair touches; the first one found settles it.
        assert!(item.check_pick(&mut world, &[body, eye]));
        assert!(item.is_picked());
        for primitive in [left, right] {
            assert_eq!(world.get::<Visibility>(primitive), Some(&Visibility::Hidden));
        }
        assert!(!item.check_pick(&mut world, &[body, eye]));
    }

    #[test]
    fn pick_against_nothing_is_a_no_op() {
        let mut world = World::new();
        let pickup = cube(&mut world, Vec3::ZERO);
        let mut item = Item::new(GameObject::single(pickup), 1.0);
        assert!(!item.check_pick(&mut world, &[]));
    }
}
