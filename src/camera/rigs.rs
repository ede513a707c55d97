//! Per-frame camera behavior: mouse look, free flight, and target tracking.

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};

use super::system::{
    orbit_position, CameraLock, CameraRig, CameraType, FollowOffset, InputControl, LookAngles,
    Orbit,
};
use crate::player::PITCH_LIMIT;
use crate::stage::StageSettings;

/// Grab and hide cursor when entering a stage.
pub fn grab_cursor(mut window_query: Query<&mut Window, With<PrimaryWindow>>) {
    if let Ok(mut window) = window_query.get_single_mut() {
        window.cursor_options.grab_mode = CursorGrabMode::Locked;
        window.cursor_options.visible = false;
    }
}

/// Release cursor when leaving.
pub fn release_cursor(mut window_query: Query<&mut Window, With<PrimaryWindow>>) {
    if let Ok(mut window) = window_query.get_single_mut() {
        window.cursor_options.grab_mode = CursorGrabMode::None;
        window.cursor_options.visible = true;
    }
}

/// Turn input-controlled cameras with the mouse.
pub fn mouse_look(
    mut mouse_motion: EventReader<MouseMotion>,
    settings: Res<StageSettings>,
    mut cameras: Query<&mut LookAngles, With<InputControl>>,
) {
    let mut delta = Vec2::ZERO;
    for event in mouse_motion.read() {
        delta += event.delta;
    }

    if delta == Vec2::ZERO {
        return;
    }

    let sensitivity = settings.mouse_sensitivity * 0.001;
    let y_invert = if settings.invert_y { -1.0 } else { 1.0 };

    for mut angles in &mut cameras {
        *angles = turn(*angles, delta * sensitivity, y_invert);
    }
}

/// Apply a scaled mouse delta to look angles.
pub fn turn(angles: LookAngles, delta: Vec2, y_invert: f32) -> LookAngles {
    LookAngles {
        yaw: angles.yaw - delta.x,
        pitch: (angles.pitch - delta.y * y_invert).clamp(-PITCH_LIMIT, PITCH_LIMIT),
    }
}

/// Fly the free debug camera with the arrow keys and PageUp/PageDown.
pub fn fly_free_camera(
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    settings: Res<StageSettings>,
    mut cameras: Query<(&CameraRig, &LookAngles, &mut Transform), With<InputControl>>,
) {
    let axis = |negative: KeyCode, positive: KeyCode| {
        keyboard.pressed(positive) as i8 as f32 - keyboard.pressed(negative) as i8 as f32
    };
    let input = Vec3::new(
        axis(KeyCode::ArrowLeft, KeyCode::ArrowRight),
        axis(KeyCode::PageDown, KeyCode::PageUp),
        axis(KeyCode::ArrowUp, KeyCode::ArrowDown),
    );

    for (rig, angles, mut transform) in &mut cameras {
        if rig.0 != CameraType::FreeDebug {
            continue;
        }
        transform.rotation = angles.rotation();
        if input != Vec3::ZERO {
            transform.translation += fly_step(
                angles.rotation(),
                input,
                settings.free_camera_speed * time.delta_secs(),
            );
        }
    }
}

/// Movement of a free camera: X/Z in its own frame, Y always world-up.
pub fn fly_step(rotation: Quat, input: Vec3, distance: f32) -> Vec3 {
    let planar = rotation * Vec3::new(input.x, 0.0, input.z);
    (planar + Vec3::Y * input.y).normalize_or_zero() * distance
}

/// Move locked cameras relative to their target.
pub fn update_locked_cameras(
    time: Res<Time>,
    settings: Res<StageSettings>,
    targets: Query<&Transform, Without<CameraRig>>,
    mut cameras: Query<(
        &CameraRig,
        &CameraLock,
        &mut Transform,
        Option<&LookAngles>,
        Option<&FollowOffset>,
        Option<&mut Orbit>,
    )>,
) {
    let dt = time.delta_secs();

    for (rig, lock, mut transform, angles, offset, orbit) in &mut cameras {
        let Ok(target) = targets.get(lock.target) else {
            continue;
        };

        match rig.0 {
            CameraType::Stationary => {
                transform.look_at(target.translation, Vec3::Y);
            }
            CameraType::Follow => {
                let offset = offset.map_or(Vec3::new(0.0, 2.5, 6.0), |offset| offset.0);
                transform.translation = follow_position(
                    transform.translation,
                    target.translation + target.rotation * offset,
                    settings.follow_smoothing,
                    dt,
                );
                transform.look_at(target.translation, Vec3::Y);
            }
            CameraType::FirstPerson => {
                transform.translation = target.translation;
                transform.rotation = angles.map_or(target.rotation, LookAngles::rotation);
            }
            CameraType::ArcRotate => {
                let Some(mut orbit) = orbit else {
                    continue;
                };
                orbit.angle += settings.arc_rotate_speed * dt;
                transform.translation =
                    orbit_position(target.translation, orbit.angle, orbit.radius);
                transform.look_at(target.translation, Vec3::Y);
            }
            CameraType::FreeDebug => {}
        }
    }
}

/// Exponential approach toward `desired`, frame-rate independent.
pub fn follow_position(current: Vec3, desired: Vec3, smoothing: f32, dt: f32) -> Vec3 {
    let t = 1.0 - (-smoothing * dt).exp();
    current.lerp(desired, t)
}
