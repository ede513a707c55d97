//! Per-stage camera ownership and the single-active-camera state machine.

use std::collections::HashMap;

use bevy::prelude::*;
use bevy::render::camera::ClearColorConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::core::{emit, CameraChangedEvent};
use crate::player::PlayerTargets;
use crate::stage::{despawn_primitive, vec3, CameraLayout};

/// Which camera behavior is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum CameraType {
    /// Freely flying, input-driven camera
    #[default]
    FreeDebug,
    /// Fixed position, keeps the player in view
    Stationary,
    /// Trails behind the player
    Follow,
    /// Looks through the player's eye
    FirstPerson,
    /// Orbits around the player
    ArcRotate,
}

/// Which player primitive a camera locks onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetAnchor {
    ThirdPerson,
    FirstPerson,
}

impl CameraType {
    pub const ALL: [CameraType; 5] = [
        CameraType::FreeDebug,
        CameraType::Stationary,
        CameraType::Follow,
        CameraType::FirstPerson,
        CameraType::ArcRotate,
    ];

    /// Cameras that take mouse/keyboard control while active.
    pub fn accepts_input(self) -> bool {
        matches!(self, CameraType::FreeDebug | CameraType::FirstPerson)
    }

    pub fn anchor(self) -> Option<TargetAnchor> {
        match self {
            CameraType::FreeDebug => None,
            CameraType::FirstPerson => Some(TargetAnchor::FirstPerson),
            CameraType::Stationary | CameraType::Follow | CameraType::ArcRotate => {
                Some(TargetAnchor::ThirdPerson)
            }
        }
    }

    pub fn needs_player(self) -> bool {
        self.anchor().is_some()
    }

    /// Stationary and follow cameras re-lock to the player on every
    /// activation; the others lock once when built.
    pub fn relocks_on_activation(self) -> bool {
        matches!(self, CameraType::Stationary | CameraType::Follow)
    }

    pub fn label(self) -> &'static str {
        match self {
            CameraType::FreeDebug => "free",
            CameraType::Stationary => "stationary",
            CameraType::Follow => "follow",
            CameraType::FirstPerson => "first-person",
            CameraType::ArcRotate => "arc-rotate",
        }
    }
}

/// Camera activation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CameraError {
    #[error("{0:?} camera needs a player to lock onto")]
    MissingPlayer(CameraType),
}

/// Tags a camera entity with its behavior.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraRig(pub CameraType);

/// Present while the camera is bound to user input.
#[derive(Component, Debug)]
pub struct InputControl;

/// The primitive a camera tracks.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraLock {
    pub target: Entity,
}

/// Mouse-look angles of an input-driven camera, in radians.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct LookAngles {
    pub yaw: f32,
    pub pitch: f32,
}

impl LookAngles {
    pub fn from_rotation(rotation: Quat) -> Self {
        let (yaw, pitch, _) = rotation.to_euler(EulerRot::YXZ);
        Self { yaw, pitch }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }
}

/// Offset of a follow camera, in its target's frame.
#[derive(Component, Debug, Clone, Copy)]
pub struct FollowOffset(pub Vec3);

/// Orbit parameters of an arc-rotate camera.
#[derive(Component, Debug, Clone, Copy)]
pub struct Orbit {
    /// Radians around the target
    pub angle: f32,
    pub radius: f32,
}

/// All cameras of one stage. Exactly one of them is active.
#[derive(Debug)]
pub struct CameraSystem {
    cameras: HashMap<CameraType, Entity>,
    active: CameraType,
    layout: CameraLayout,
    clear_color: Color,
}

impl CameraSystem {
    /// Build and activate the layout's initial camera.
    pub fn new(
        world: &mut World,
        layout: &CameraLayout,
        clear_color: Color,
        targets: Option<PlayerTargets>,
    ) -> Result<Self, CameraError> {
        let initial = layout.initial;
        if initial.needs_player() && targets.is_none() {
            return Err(CameraError::MissingPlayer(initial));
        }

        let mut system = Self {
            cameras: HashMap::new(),
            active: initial,
            layout: layout.clone(),
            clear_color,
        };
        let entity = system.get_or_create(world, initial, targets);
        system.bind(world, entity, initial, targets);
        info!("Camera system ready, active camera: {}", initial.label());
        Ok(system)
    }

    pub fn active_type(&self) -> CameraType {
        self.active
    }

    /// Handle of the camera the renderer should use.
    pub fn active_camera(&self) -> Option<Entity> {
        self.cameras.get(&self.active).copied()
    }

    /// Camera of a type, if it was constructed.
    pub fn camera(&self, camera_type: CameraType) -> Option<Entity> {
        self.cameras.get(&camera_type).copied()
    }

    /// Switch the active camera.
    ///
    /// Input control moves from the old camera to the new one when they take
    /// input, stationary/follow cameras re-lock onto the player, and the
    /// active type is updated last. Calling it again with the active type
    /// leaves the same state behind.
    pub fn set_active_camera(
        &mut self,
        world: &mut World,
        camera_type: CameraType,
        targets: Option<PlayerTargets>,
    ) -> Result<(), CameraError> {
        if camera_type.needs_player() && targets.is_none() {
            return Err(CameraError::MissingPlayer(camera_type));
        }

        let previous = self.active;
        let entity = self.get_or_create(world, camera_type, targets);

        if let Some(old) = self.camera(previous) {
            if previous.accepts_input() && world.entities().contains(old) {
                world.entity_mut(old).remove::<InputControl>();
            }
            set_camera_active(world, old, false);
        }

        self.bind(world, entity, camera_type, targets);
        self.active = camera_type;

        if previous != camera_type {
            debug!("Camera {} -> {}", previous.label(), camera_type.label());
            emit(
                world,
                CameraChangedEvent {
                    from: previous,
                    to: camera_type,
                },
            );
        }
        Ok(())
    }

    /// Rotation the player should aim with, while looking through its eye.
    pub fn aim_rotation(&self, world: &World) -> Option<Quat> {
        if self.active != CameraType::FirstPerson {
            return None;
        }
        let entity = self.active_camera()?;
        world.get::<Transform>(entity).map(|transform| transform.rotation)
    }

    /// Release every constructed camera.
    pub fn dispose(&mut self, world: &mut World) {
        for (_, entity) in self.cameras.drain() {
            despawn_primitive(world, entity);
        }
    }

    /// Attach input and target lock to `entity` and make it the rendering camera.
    fn bind(
        &self,
        world: &mut World,
        entity: Entity,
        camera_type: CameraType,
        targets: Option<PlayerTargets>,
    ) {
        if camera_type.accepts_input() {
            world.entity_mut(entity).insert(InputControl);
        }
        if camera_type.relocks_on_activation() {
            if let Some(target) = targets.and_then(|targets| anchor_target(camera_type, targets)) {
                world.entity_mut(entity).insert(CameraLock { target });
            }
        }
        set_camera_active(world, entity, true);
    }

    fn get_or_create(
        &mut self,
        world: &mut World,
        camera_type: CameraType,
        targets: Option<PlayerTargets>,
    ) -> Entity {
        if let Some(entity) = self.camera(camera_type) {
            return entity;
        }

        let layout = &self.layout;
        let target_position = targets
            .and_then(|targets| anchor_target(camera_type, targets))
            .and_then(|target| world.get::<Transform>(target))
            .map_or(Vec3::ZERO, |transform| transform.translation);

        let transform = match camera_type {
            CameraType::FreeDebug => Transform::from_translation(vec3(layout.free_position))
                .looking_at(Vec3::ZERO, Vec3::Y),
            CameraType::Stationary => Transform::from_translation(vec3(layout.stationary_position))
                .looking_at(target_position, Vec3::Y),
            CameraType::Follow => {
                Transform::from_translation(target_position + vec3(layout.follow_offset))
                    .looking_at(target_position, Vec3::Y)
            }
            CameraType::FirstPerson => Transform::from_translation(target_position),
            CameraType::ArcRotate => {
                Transform::from_translation(orbit_position(target_position, 0.0, layout.arc_radius))
                    .looking_at(target_position, Vec3::Y)
            }
        };

        let entity = world
            .spawn((
                Camera3d::default(),
                Camera {
                    is_active: false,
                    clear_color: ClearColorConfig::Custom(self.clear_color),
                    ..default()
                },
                transform,
                CameraRig(camera_type),
                Name::new(format!("camera-{}", camera_type.label())),
            ))
            .id();

        match camera_type {
            CameraType::FreeDebug => {
                world
                    .entity_mut(entity)
                    .insert(LookAngles::from_rotation(transform.rotation));
            }
            CameraType::Stationary => {}
            CameraType::Follow => {
                world
                    .entity_mut(entity)
                    .insert(FollowOffset(vec3(layout.follow_offset)));
            }
            CameraType::FirstPerson => {
                let eye = targets.map(|targets| targets.first_person);
                let rotation = eye
                    .and_then(|eye| world.get::<Transform>(eye))
                    .map_or(Quat::IDENTITY, |transform| transform.rotation);
                world
                    .entity_mut(entity)
                    .insert(LookAngles::from_rotation(rotation));
                if let Some(target) = eye {
                    world.entity_mut(entity).insert(CameraLock { target });
                }
            }
            CameraType::ArcRotate => {
                world.entity_mut(entity).insert(Orbit {
                    angle: 0.0,
                    radius: layout.arc_radius,
                });
                if let Some(target) = targets.map(|targets| targets.third_person) {
                    world.entity_mut(entity).insert(CameraLock { target });
                }
            }
        }

        self.cameras.insert(camera_type, entity);
        entity
    }
}

fn anchor_target(camera_type: CameraType, targets: PlayerTargets) -> Option<Entity> {
    camera_type.anchor().map(|anchor| match anchor {
        TargetAnchor::ThirdPerson => targets.third_person,
        TargetAnchor::FirstPerson => targets.first_person,
    })
}

fn set_camera_active(world: &mut World, entity: Entity, active: bool) {
    if let Some(mut camera) = world.get_mut::<Camera>(entity) {
        camera.is_active = active;
    }
}

/// Point on an arc-rotate camera's orbit, slightly above its target.
pub fn orbit_position(center: Vec3, angle: f32, radius: f32) -> Vec3 {
    center + Vec3::new(angle.sin() * radius, radius * 0.5, angle.cos() * radius)
}
