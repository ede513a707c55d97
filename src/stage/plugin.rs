//! Stage plugin - stage loading, ticking, transitions, and hotkeys.

use bevy::prelude::*;

use super::data::{load_stage_definitions, CurrentStage, StageRegistry};
use super::settings::{load_stage_settings, StageSettings};
use super::stage::{Stage, StageState};
use crate::camera::CameraType;
use crate::core::{GameState, PlayState, ShotRequestEvent};

/// Camera selected by each number key.
const CAMERA_KEYS: [(KeyCode, CameraType); 5] = [
    (KeyCode::Digit1, CameraType::FreeDebug),
    (KeyCode::Digit2, CameraType::Stationary),
    (KeyCode::Digit3, CameraType::Follow),
    (KeyCode::Digit4, CameraType::FirstPerson),
    (KeyCode::Digit5, CameraType::ArcRotate),
];

/// Stage plugin - owns the active stage for the lifetime of `GameState::InGame`.
pub struct StagePlugin;

impl Plugin for StagePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (load_stage_settings, load_stage_definitions).chain())
            .add_systems(Update, finish_loading.run_if(in_state(GameState::Loading)))
            .add_systems(OnEnter(GameState::InGame), enter_stage)
            .add_systems(OnExit(GameState::InGame), leave_stage)
            .add_systems(
                Update,
                (stage_hotkeys, resolve_shot_requests, tick_stage)
                    .chain()
                    .run_if(in_state(PlayState::Running)),
            );
    }
}

/// Start playing once settings and the stage catalogue are in place.
fn finish_loading(
    registry: Option<Res<StageRegistry>>,
    settings: Option<Res<StageSettings>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if registry.is_some() && settings.is_some() {
        next_state.set(GameState::InGame);
    }
}

fn enter_stage(world: &mut World) {
    if world.contains_resource::<Stage>() {
        return;
    }
    start_current_stage(world);
}

fn leave_stage(world: &mut World) {
    if let Some(mut stage) = world.remove_resource::<Stage>() {
        stage.unload(world);
    }
}

/// Create and initialize the stage `CurrentStage` points at.
pub fn start_current_stage(world: &mut World) {
    let index = world.get_resource::<CurrentStage>().map_or(0, |current| current.index);
    let Some(definition) = world
        .get_resource::<StageRegistry>()
        .and_then(|registry| registry.get(index))
        .cloned()
    else {
        error!("No stage definition at index {}", index);
        return;
    };
    let settings = world
        .get_resource::<StageSettings>()
        .cloned()
        .unwrap_or_default();

    let mut stage = Stage::new(definition, settings);
    match stage.init(world) {
        Ok(()) => world.insert_resource(stage),
        Err(e) => error!("Failed to start stage '{}': {}", stage.name(), e),
    }
}

/// Unload the current stage and start the next one in the catalogue.
pub fn advance_stage(world: &mut World) {
    if let Some(mut stage) = world.remove_resource::<Stage>() {
        stage.unload(world);
    }

    let count = world.get_resource::<StageRegistry>().map_or(0, StageRegistry::len);
    if count == 0 {
        return;
    }
    let mut current = world.get_resource_or_insert_with(CurrentStage::default);
    current.index = (current.index + 1) % count;
    info!("Advancing to stage #{}", current.index);

    start_current_stage(world);
}

/// Number keys switch cameras, N moves to the next stage.
fn stage_hotkeys(world: &mut World) {
    let Some(keyboard) = world.get_resource::<ButtonInput<KeyCode>>() else {
        return;
    };
    let camera = CAMERA_KEYS
        .into_iter()
        .find(|(key, _)| keyboard.just_pressed(*key))
        .map(|(_, camera_type)| camera_type);
    let next = keyboard.just_pressed(KeyCode::KeyN);

    if let Some(camera_type) = camera {
        if world.contains_resource::<Stage>() {
            world.resource_scope(|world, mut stage: Mut<Stage>| {
                if let Err(e) = stage.set_active_camera(world, camera_type) {
                    warn!("Cannot switch to the {} camera: {}", camera_type.label(), e);
                }
            });
        }
    }

    if next {
        advance_stage(world);
    }
}

/// Fire shots requested by other systems.
fn resolve_shot_requests(world: &mut World) {
    let requests: Vec<ShotRequestEvent> = world
        .get_resource_mut::<Events<ShotRequestEvent>>()
        .map(|mut events| events.drain().collect())
        .unwrap_or_default();
    if requests.is_empty() || !world.contains_resource::<Stage>() {
        return;
    }

    world.resource_scope(|world, mut stage: Mut<Stage>| {
        for request in requests {
            stage.apply_shot(world, request.source, request.destination);
        }
    });
}

fn tick_stage(world: &mut World) {
    if !world.contains_resource::<Stage>() {
        return;
    }
    world.resource_scope(|world, mut stage: Mut<Stage>| {
        if stage.state() == StageState::Active {
            stage.render(world);
        }
    });
}
