//! Stage module - game objects, shot resolution, and the stage lifecycle.

mod data;
mod error;
mod hit_point;
mod object;
mod plugin;
mod primitives;
mod settings;
mod shot;
#[allow(clippy::module_inception)]
mod stage;

pub use data::{
    color, vec3, BlockDef, CameraLayout, CurrentStage, ItemDef, LightDef, LightKind, ModelDef,
    PlayerSpawn, SkyboxDef, SpriteDef, StageDefinition, StageRegistry,
};
pub use error::{StageError, StageLoadError};
pub use hit_point::{determine_nearest_hit_point, HitPoint};
pub use object::{Bot, GameObject, Item, Obstacle, ObstacleKind, ObstacleRef, StageObject};
pub use plugin::{advance_stage, start_current_stage, StagePlugin};
pub use primitives::{
    despawn_primitive, placed, primitives_intersect, spawn_primitive, Body, Primitive,
    PrimitiveDesc,
};
pub use settings::StageSettings;
pub use shot::ShotRay;
pub use stage::{ShadowGenerator, Stage, StageState};
