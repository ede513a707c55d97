//! The stage's controllable player: body, eye, movement and fire input.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::components::*;
use crate::stage::{
    spawn_primitive, GameObject, PlayerSpawn, Primitive, PrimitiveDesc, StageObject,
};

/// Primitives the cameras lock onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerTargets {
    /// The body, seen from outside
    pub third_person: Entity,
    /// The eye, looked through
    pub first_person: Entity,
}

/// A shot the player fired this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireAction {
    pub source: Vec3,
    pub destination: Vec3,
}

/// The player owned by an interactive stage.
#[derive(Debug)]
pub struct Player {
    object: GameObject,
    body: Entity,
    eye: Entity,
    /// Radians around Y; 0 looks down -Z
    yaw: f32,
    /// Radians around X, clamped to `PITCH_LIMIT`
    pitch: f32,
    movement: MovementState,
    config: PlayerConfig,
}

impl Player {
    /// Spawn the body and eye primitives.
    pub fn spawn(world: &mut World, spawn: &PlayerSpawn, config: &PlayerConfig) -> Self {
        let position = Vec3::new(spawn.position.0, spawn.position.1, spawn.position.2);
        let yaw = spawn.yaw.to_radians();
        let size = Vec3::new(config.body_size.0, config.body_size.1, config.body_size.2);

        let body = spawn_primitive(
            world,
            PrimitiveDesc::new(
                "player",
                Primitive::cuboid(size),
                Transform::from_translation(position).with_rotation(Quat::from_rotation_y(yaw)),
            )
            .with_color(Color::srgb(0.2, 0.4, 0.8)),
        );
        let radius = size.x.min(size.z) / 2.0;
        world.entity_mut(body).insert((
            PlayerBody,
            RigidBody::KinematicPositionBased,
            Collider::capsule_y((size.y / 2.0 - radius).max(0.0), radius),
            KinematicCharacterController {
                offset: CharacterLength::Absolute(0.01),
                autostep: Some(CharacterAutostep {
                    max_height: CharacterLength::Absolute(0.4),
                    min_width: CharacterLength::Absolute(0.3),
                    include_dynamic_bodies: false,
                }),
                max_slope_climb_angle: 45_f32.to_radians(),
                min_slope_slide_angle: 30_f32.to_radians(),
                snap_to_ground: Some(CharacterLength::Absolute(0.5)),
                ..default()
            },
        ));

        let eye = spawn_primitive(
            world,
            PrimitiveDesc::new(
                "player-eye",
                Primitive::sphere(0.1),
                Transform::from_translation(position + Vec3::Y * config.eye_height)
                    .with_rotation(Quat::from_rotation_y(yaw)),
            )
            .without_shadows(),
        );
        world.entity_mut(eye).insert((PlayerEye, Visibility::Hidden));

        info!("Spawned player at {:?}", position);

        Self {
            object: GameObject::new(vec![body, eye]),
            body,
            eye,
            yaw,
            pitch: 0.0,
            movement: MovementState::default(),
            config: config.clone(),
        }
    }

    pub fn targets(&self) -> PlayerTargets {
        PlayerTargets {
            third_person: self.body,
            first_person: self.eye,
        }
    }

    pub fn body(&self) -> Entity {
        self.body
    }

    /// Look rotation (yaw then pitch).
    pub fn aim(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Where shots start.
    pub fn eye_position(&self, world: &World) -> Option<Vec3> {
        world
            .get::<Transform>(self.body)
            .map(|body| body.translation + Vec3::Y * self.config.eye_height)
    }

    /// Read keyboard and mouse state, drive the character controller, and
    /// report a shot if the fire button was pressed this tick.
    ///
    /// `aim_override` replaces keyboard aiming, e.g. with the rotation of an
    /// input-controlled first-person camera.
    pub fn handle_input(
        &mut self,
        world: &mut World,
        aim_override: Option<Quat>,
        shot_range: f32,
    ) -> Option<FireAction> {
        let dt = world.get_resource::<Time>().map_or(0.0, |time| time.delta_secs());
        let keyboard = world.get_resource::<ButtonInput<KeyCode>>()?;

        // Build input direction from WASD
        let mut direction = Vec3::ZERO;
        if keyboard.pressed(KeyCode::KeyW) {
            direction.z -= 1.0;
        }
        if keyboard.pressed(KeyCode::KeyS) {
            direction.z += 1.0;
        }
        if keyboard.pressed(KeyCode::KeyA) {
            direction.x -= 1.0;
        }
        if keyboard.pressed(KeyCode::KeyD) {
            direction.x += 1.0;
        }
        let axis = |negative: KeyCode, positive: KeyCode| {
            keyboard.pressed(positive) as i8 as f32 - keyboard.pressed(negative) as i8 as f32
        };
        let turn = axis(KeyCode::KeyE, KeyCode::KeyQ);
        let tilt = axis(KeyCode::KeyF, KeyCode::KeyR);
        let sprinting = keyboard.pressed(KeyCode::ShiftLeft);
        let mut fire = keyboard.just_pressed(KeyCode::Space);
        fire |= world
            .get_resource::<ButtonInput<MouseButton>>()
            .is_some_and(|mouse| mouse.just_pressed(MouseButton::Left));

        match aim_override {
            Some(rotation) => {
                let (yaw, pitch, _) = rotation.to_euler(EulerRot::YXZ);
                self.yaw = yaw;
                self.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
            }
            None => {
                let turn_rate = self.config.turn_speed.to_radians() * dt;
                self.yaw += turn * turn_rate;
                self.pitch = (self.pitch + tilt * turn_rate).clamp(-PITCH_LIMIT, PITCH_LIMIT);
            }
        }

        self.apply_movement(world, direction, sprinting, dt);

        if !fire {
            return None;
        }
        let source = self.eye_position(world)?;
        Some(FireAction {
            source,
            destination: source + self.aim() * Vec3::NEG_Z * shot_range,
        })
    }

    /// Uses Rapier's KinematicCharacterController for collision detection.
    fn apply_movement(&mut self, world: &mut World, direction: Vec3, sprinting: bool, dt: f32) {
        // Ground state from the controller's last move; assume grounded
        // before the physics step has produced one
        let is_grounded = world
            .get::<KinematicCharacterControllerOutput>(self.body)
            .map_or(true, |output| output.grounded);

        if is_grounded {
            if self.movement.vertical_velocity < 0.0 {
                self.movement.vertical_velocity = 0.0;
            }
        } else {
            self.movement.vertical_velocity -= self.config.gravity * dt;
        }

        // Normalize to prevent faster diagonal movement
        let direction = direction.normalize_or_zero();
        let movement = Quat::from_rotation_y(self.yaw) * direction;

        let speed = if sprinting {
            self.config.move_speed * self.config.sprint_multiplier
        } else {
            self.config.move_speed
        };

        let horizontal = movement * speed * dt;
        let vertical = Vec3::new(0.0, self.movement.vertical_velocity * dt, 0.0);

        if let Some(mut controller) = world.get_mut::<KinematicCharacterController>(self.body) {
            controller.translation = Some(horizontal + vertical);
        }
    }
}

impl StageObject for Player {
    fn object(&self) -> &GameObject {
        &self.object
    }

    fn object_mut(&mut self) -> &mut GameObject {
        &mut self.object
    }

    /// Face the body along the yaw and keep the eye on top of it.
    fn render(&mut self, world: &mut World) {
        let eye_position = {
            let Some(mut body) = world.get_mut::<Transform>(self.body) else {
                return;
            };
            body.rotation = Quat::from_rotation_y(self.yaw);
            body.translation + Vec3::Y * self.config.eye_height
        };

        let aim = self.aim();
        if let Some(mut eye) = world.get_mut::<Transform>(self.eye) {
            eye.translation = eye_position;
            eye.rotation = aim;
        }
    }
}
