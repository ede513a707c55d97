//! Renderable primitives and the geometry queries run against them.
//!
//! A primitive is a plain entity carrying a [`Primitive`] shape, a
//! `Transform` and a `Visibility`. Meshes and materials are attached only when
//! the world has the asset stores for them, so stages can also be built in a
//! headless world.

use bevy::math::bounding::{Aabb3d, BoundingSphere, IntersectsVolume, RayCast3d};
use bevy::pbr::NotShadowCaster;
use bevy::prelude::*;
use bevy::render::render_resource::Face;
use bevy_rapier3d::prelude::*;

use super::shot::ShotRay;

/// Collision/render shape of a primitive, in local space before scaling.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Cuboid { half_extents: Vec3 },
    Sphere { radius: f32 },
}

impl Primitive {
    /// Box primitive from its full size.
    pub fn cuboid(size: Vec3) -> Self {
        Self::Cuboid {
            half_extents: size / 2.0,
        }
    }

    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// World-space axis-aligned bounds, accounting for rotation and scale.
    pub fn world_bounds(&self, transform: &Transform) -> Aabb3d {
        match *self {
            Primitive::Cuboid { half_extents } => {
                let half = half_extents * transform.scale.abs();
                let rotation = Mat3::from_quat(transform.rotation);
                let extent = rotation.x_axis.abs() * half.x
                    + rotation.y_axis.abs() * half.y
                    + rotation.z_axis.abs() * half.z;
                Aabb3d::new(transform.translation, extent)
            }
            Primitive::Sphere { radius } => {
                let radius = radius * transform.scale.abs().max_element();
                Aabb3d::new(transform.translation, Vec3::splat(radius))
            }
        }
    }

    /// Distance along `ray` to the first point of this primitive, if the ray
    /// reaches it before its end.
    ///
    /// Boxes are tested in their own rotated frame, so the result is exact for
    /// oriented boxes. A ray starting inside the primitive hits at distance 0.
    pub fn cast_ray(&self, transform: &Transform, ray: &ShotRay) -> Option<f32> {
        match *self {
            Primitive::Cuboid { half_extents } => {
                let inverse = transform.rotation.inverse();
                let local_origin = inverse * (ray.origin() - transform.translation);
                let local_direction = Dir3::new(inverse * ray.direction().as_vec3()).ok()?;
                let half = half_extents * transform.scale.abs();
                RayCast3d::new(local_origin, local_direction, ray.length())
                    .aabb_intersection_at(&Aabb3d::new(Vec3::ZERO, half))
            }
            Primitive::Sphere { radius } => {
                let radius = radius * transform.scale.abs().max_element();
                RayCast3d::new(ray.origin(), ray.direction(), ray.length())
                    .sphere_intersection_at(&BoundingSphere::new(transform.translation, radius))
            }
        }
    }

    /// Matching rapier collider.
    pub fn collider(&self) -> Collider {
        match *self {
            Primitive::Cuboid { half_extents } => {
                Collider::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            Primitive::Sphere { radius } => Collider::ball(radius),
        }
    }

    fn mesh(&self) -> Mesh {
        match *self {
            Primitive::Cuboid { half_extents } => Cuboid::from_size(half_extents * 2.0).into(),
            Primitive::Sphere { radius } => Sphere::new(radius).mesh().build(),
        }
    }
}

/// Do the world bounds of two placed primitives overlap?
pub fn primitives_intersect(
    a: (&Primitive, &Transform),
    b: (&Primitive, &Transform),
) -> bool {
    a.0.world_bounds(a.1).intersects(&b.0.world_bounds(b.1))
}

/// How a primitive participates in physics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Body {
    /// Visual only
    #[default]
    None,
    /// Immovable collider
    Fixed,
    /// Simulated body that reacts to impulses
    Dynamic,
    /// Trigger volume without contact response
    Sensor,
}

/// Everything needed to spawn one primitive.
#[derive(Debug, Clone)]
pub struct PrimitiveDesc {
    /// Prefix of the debug name; the entity handle is appended
    pub label: &'static str,
    pub primitive: Primitive,
    pub transform: Transform,
    pub color: Color,
    pub body: Body,
    pub unlit: bool,
    pub casts_shadows: bool,
}

impl PrimitiveDesc {
    pub fn new(label: &'static str, primitive: Primitive, transform: Transform) -> Self {
        Self {
            label,
            primitive,
            transform,
            color: Color::WHITE,
            body: Body::None,
            unlit: false,
            casts_shadows: true,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn unlit(mut self) -> Self {
        self.unlit = true;
        self
    }

    pub fn without_shadows(mut self) -> Self {
        self.casts_shadows = false;
        self
    }
}

/// Spawn a primitive and return its handle.
pub fn spawn_primitive(world: &mut World, desc: PrimitiveDesc) -> Entity {
    let entity = world
        .spawn((desc.primitive, desc.transform, Visibility::default()))
        .id();
    world
        .entity_mut(entity)
        .insert(Name::new(format!("{}-{}", desc.label, entity.index())));

    let mesh = world
        .get_resource_mut::<Assets<Mesh>>()
        .map(|mut meshes| meshes.add(desc.primitive.mesh()));
    let material = world
        .get_resource_mut::<Assets<StandardMaterial>>()
        .map(|mut materials| {
            materials.add(StandardMaterial {
                base_color: desc.color,
                unlit: desc.unlit,
                // Skyboxes and sprites are seen from either side
                double_sided: desc.unlit,
                cull_mode: (!desc.unlit).then_some(Face::Back),
                perceptual_roughness: 0.9,
                ..default()
            })
        });
    if let (Some(mesh), Some(material)) = (mesh, material) {
        world
            .entity_mut(entity)
            .insert((Mesh3d(mesh), MeshMaterial3d(material)));
    }

    if !desc.casts_shadows {
        world.entity_mut(entity).insert(NotShadowCaster);
    }

    match desc.body {
        Body::None => {}
        Body::Fixed => {
            world
                .entity_mut(entity)
                .insert((RigidBody::Fixed, desc.primitive.collider()));
        }
        Body::Dynamic => {
            world.entity_mut(entity).insert((
                RigidBody::Dynamic,
                desc.primitive.collider(),
                ExternalImpulse::default(),
            ));
        }
        Body::Sensor => {
            world
                .entity_mut(entity)
                .insert((desc.primitive.collider(), Sensor));
        }
    }

    entity
}

/// Release a primitive (and anything parented to it).
///
/// Returns false when the handle was already released elsewhere.
pub fn despawn_primitive(world: &mut World, entity: Entity) -> bool {
    if !world.entities().contains(entity) {
        return false;
    }
    world.entity_mut(entity).despawn_recursive();
    true
}

/// Shape and placement of a live primitive, if it still exists.
pub fn placed(world: &World, entity: Entity) -> Option<(&Primitive, &Transform)> {
    Some((world.get::<Primitive>(entity)?, world.get::<Transform>(entity)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ray(from: Vec3, to: Vec3) -> ShotRay {
        ShotRay::between(from, to).unwrap()
    }

    #[test]
    fn ray_hits_box_face() {
        let cube = Primitive::cuboid(Vec3::splat(2.0));
        let transform = Transform::from_xyz(0.0, 0.0, -10.0);
        let hit = cube.cast_ray(&transform, &ray(Vec3::ZERO, Vec3::new(0.0, 0.0, -20.0)));
        assert!((hit.unwrap() - 9.0).abs() < 1e-4);
    }

    #[test]
    fn ray_stops_at_its_length() {
        let cube = Primitive::cuboid(Vec3::splat(2.0));
        let transform = Transform::from_xyz(0.0, 0.0, -10.0);
        let hit = cube.cast_ray(&transform, &ray(Vec3::ZERO, Vec3::new(0.0, 0.0, -5.0)));
        assert!(hit.is_none());
    }

    #[test]
    fn ray_respects_box_rotation() {
        // A thin slab turned 90 degrees around Y faces the ray with its wide side.
        let slab = Primitive::cuboid(Vec3::new(4.0, 4.0, 0.2));
        let transform = Transform::from_xyz(5.0, 0.0, 0.0)
            .with_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        let hit = slab.cast_ray(&transform, &ray(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)));
        assert!((hit.unwrap() - 4.9).abs() < 1e-4);

        let offset = slab.cast_ray(
            &transform,
            &ray(Vec3::new(0.0, 0.0, 1.5), Vec3::new(10.0, 0.0, 1.5)),
        );
        assert!(offset.is_some(), "rotated slab is 4 wide along Z");

        let past = slab.cast_ray(
            &transform,
            &ray(Vec3::new(0.0, 0.0, 2.5), Vec3::new(10.0, 0.0, 2.5)),
        );
        assert!(past.is_none());
    }

    #[test]
    fn ray_hits_scaled_sphere() {
        let ball = Primitive::sphere(1.0);
        let transform = Transform::from_xyz(0.0, 10.0, 0.0).with_scale(Vec3::splat(2.0));
        let hit = ball.cast_ray(&transform, &ray(Vec3::ZERO, Vec3::new(0.0, 20.0, 0.0)));
        assert!((hit.unwrap() - 8.0).abs() < 1e-4);
    }

    #[test]
    fn rotated_bounds_grow() {
        let stick = Primitive::cuboid(Vec3::new(4.0, 0.2, 0.2));
        let transform =
            Transform::from_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        let bounds = stick.world_bounds(&transform);
        assert!((bounds.max.z - 2.0).abs() < 1e-4);
        assert!((bounds.max.x - 0.1).abs() < 1e-4);
    }

    #[test]
    fn overlapping_primitives_intersect() {
        let a = Primitive::cuboid(Vec3::ONE);
        let b = Primitive::sphere(0.5);
        let near = Transform::from_xyz(0.8, 0.0, 0.0);
        let far = Transform::from_xyz(1.2, 0.0, 0.0);
        assert!(primitives_intersect((&a, &Transform::IDENTITY), (&b, &near)));
        assert!(!primitives_intersect((&a, &Transform::IDENTITY), (&b, &far)));
    }

    #[test]
    fn spawn_and_release() {
        let mut world = World::new();
        let entity = spawn_primitive(
            &mut world,
            PrimitiveDesc::new("wall", Primitive::cuboid(Vec3::ONE), Transform::IDENTITY)
                .with_body(Body::Fixed),
        );
        assert!(world.get::<Collider>(entity).is_some());
        assert!(world.get::<Mesh3d>(entity).is_none());
        assert_eq!(
            world.get::<Name>(entity).map(|name| name.as_str().to_string()),
            Some(format!("wall-{}", entity.index()))
        );

        assert!(despawn_primitive(&mut world, entity));
        assert!(!despawn_primitive(&mut world, entity));
    }

    #[test]
    fn meshes_attached_when_assets_exist() {
        let mut world = World::new();
        world.init_resource::<Assets<Mesh>>();
        world.init_resource::<Assets<StandardMaterial>>();
        let entity = spawn_primitive(
            &mut world,
            PrimitiveDesc::new("ball", Primitive::sphere(0.5), Transform::IDENTITY)
                .without_shadows(),
        );
        assert!(world.get::<Mesh3d>(entity).is_some());
        assert!(world.get::<NotShadowCaster>(entity).is_some());
    }
}
