//! Stage definitions and RON loading.

use bevy::prelude::*;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use super::error::StageLoadError;
use crate::camera::CameraType;

fn default_ambient_color() -> (f32, f32, f32) {
    (0.8, 0.8, 0.8)
}

fn default_clear_color() -> (f32, f32, f32) {
    (0.2, 0.2, 0.3)
}

fn default_block_color() -> (f32, f32, f32) {
    (0.5, 0.5, 0.5)
}

fn default_item_color() -> (f32, f32, f32) {
    (0.9, 0.75, 0.2)
}

fn default_true() -> bool {
    true
}

fn default_scale() -> f32 {
    1.0
}

/// Convert a RON tuple to a vector.
pub fn vec3(t: (f32, f32, f32)) -> Vec3 {
    Vec3::new(t.0, t.1, t.2)
}

/// Convert a RON tuple to an sRGB color.
pub fn color(t: (f32, f32, f32)) -> Color {
    Color::srgb(t.0, t.1, t.2)
}

/// Where the player enters the stage.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerSpawn {
    pub position: (f32, f32, f32),
    /// Facing in degrees around Y; 0 looks down -Z
    #[serde(default)]
    pub yaw: f32,
}

/// A box-shaped wall, movable, or bot.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockDef {
    pub position: (f32, f32, f32),
    pub size: (f32, f32, f32),
    /// Rotation around Y in degrees
    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "default_block_color")]
    pub color: (f32, f32, f32),
}

/// A pickup.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemDef {
    pub position: (f32, f32, f32),
    pub size: f32,
    #[serde(default = "default_item_color")]
    pub color: (f32, f32, f32),
}

/// An imported scene (glTF etc.).
#[derive(Debug, Clone, Deserialize)]
pub struct ModelDef {
    /// Asset path, including the sub-asset label (e.g. "models/crate.glb#Scene0")
    pub path: String,
    pub position: (f32, f32, f32),
    #[serde(default = "default_scale")]
    pub scale: f32,
}

/// Inverted-looking sky sphere around the stage.
#[derive(Debug, Clone, Deserialize)]
pub struct SkyboxDef {
    pub radius: f32,
    pub color: (f32, f32, f32),
}

/// A flat billboard-style quad.
#[derive(Debug, Clone, Deserialize)]
pub struct SpriteDef {
    pub position: (f32, f32, f32),
    pub size: (f32, f32),
    pub color: (f32, f32, f32),
}

/// Kind of light source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LightKind {
    Point,
    Directional,
}

/// A light source.
#[derive(Debug, Clone, Deserialize)]
pub struct LightDef {
    pub kind: LightKind,
    /// Position for point lights; the light looks from here toward the
    /// origin for directional lights
    pub position: (f32, f32, f32),
    pub intensity: f32,
    #[serde(default = "default_light_color")]
    pub color: (f32, f32, f32),
    #[serde(default = "default_light_range")]
    pub range: f32,
    #[serde(default)]
    pub shadows: bool,
}

fn default_light_color() -> (f32, f32, f32) {
    (1.0, 1.0, 1.0)
}

fn default_light_range() -> f32 {
    20.0
}

/// Camera placement for the stage.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraLayout {
    pub initial: CameraType,
    pub free_position: (f32, f32, f32),
    pub stationary_position: (f32, f32, f32),
    /// Offset from the target in the target's frame
    pub follow_offset: (f32, f32, f32),
    pub arc_radius: f32,
}

impl Default for CameraLayout {
    fn default() -> Self {
        Self {
            initial: CameraType::FreeDebug,
            free_position: (0.0, 5.0, 12.0),
            stationary_position: (8.0, 6.0, 8.0),
            follow_offset: (0.0, 2.5, 6.0),
            arc_radius: 10.0,
        }
    }
}

/// Complete description of one stage.
#[derive(Debug, Clone, Deserialize)]
pub struct StageDefinition {
    pub name: String,
    #[serde(default = "default_ambient_color")]
    pub ambient_color: (f32, f32, f32),
    #[serde(default = "default_clear_color")]
    pub clear_color: (f32, f32, f32),
    /// `None` makes a non-interactive presentation stage
    #[serde(default)]
    pub player: Option<PlayerSpawn>,
    #[serde(default)]
    pub walls: Vec<BlockDef>,
    #[serde(default)]
    pub movables: Vec<BlockDef>,
    #[serde(default)]
    pub items: Vec<ItemDef>,
    #[serde(default)]
    pub bots: Vec<BlockDef>,
    #[serde(default)]
    pub models: Vec<ModelDef>,
    #[serde(default)]
    pub skybox: Option<SkyboxDef>,
    #[serde(default)]
    pub sprites: Vec<SpriteDef>,
    #[serde(default)]
    pub lights: Vec<LightDef>,
    #[serde(default)]
    pub camera: CameraLayout,
    #[serde(default = "default_true")]
    pub hud: bool,
}

impl StageDefinition {
    /// An empty stage with only a name.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ambient_color: default_ambient_color(),
            clear_color: default_clear_color(),
            player: None,
            walls: Vec::new(),
            movables: Vec::new(),
            items: Vec::new(),
            bots: Vec::new(),
            models: Vec::new(),
            skybox: None,
            sprites: Vec::new(),
            lights: Vec::new(),
            camera: CameraLayout::default(),
            hud: true,
        }
    }

    /// Small built-in range used when no stage files are found.
    pub fn builtin_gallery() -> Self {
        let block = |position, size, color| BlockDef {
            position,
            size,
            rotation: 0.0,
            color,
        };
        Self {
            player: Some(PlayerSpawn {
                position: (0.0, 1.0, 6.0),
                yaw: 0.0,
            }),
            walls: vec![
                block((0.0, -0.25, 0.0), (30.0, 0.5, 30.0), (0.3, 0.3, 0.32)),
                block((0.0, 2.0, -12.0), (20.0, 4.0, 0.5), (0.45, 0.42, 0.4)),
            ],
            movables: vec![
                block((-2.0, 0.5, -4.0), (1.0, 1.0, 1.0), (0.6, 0.35, 0.2)),
                block((2.0, 0.5, -6.0), (1.0, 1.0, 1.0), (0.6, 0.35, 0.2)),
            ],
            items: vec![ItemDef {
                position: (0.0, 0.6, 2.0),
                size: 0.4,
                color: default_item_color(),
            }],
            lights: vec![LightDef {
                kind: LightKind::Directional,
                position: (6.0, 12.0, 8.0),
                intensity: 4000.0,
                color: default_light_color(),
                range: default_light_range(),
                shadows: true,
            }],
            camera: CameraLayout {
                initial: CameraType::Follow,
                ..default()
            },
            ..Self::empty("gallery")
        }
    }

    /// Parse and validate a definition.
    pub fn from_ron_str(path: &str, contents: &str) -> Result<Self, StageLoadError> {
        let definition: Self =
            ron::from_str(contents).map_err(|e| StageLoadError::ParseError {
                path: path.to_string(),
                details: e.to_string(),
            })?;
        definition.validate()?;
        Ok(definition)
    }

    /// Read, parse and validate a definition file.
    pub fn load(path: &Path) -> Result<Self, StageLoadError> {
        let display = path.display().to_string();
        if !path.exists() {
            return Err(StageLoadError::FileNotFound(display));
        }
        let contents = fs::read_to_string(path).map_err(|e| StageLoadError::ReadError {
            path: display.clone(),
            details: e.to_string(),
        })?;
        Self::from_ron_str(&display, &contents)
    }

    /// Reject definitions that cannot be built. Sizes are compared as
    /// `!(x > 0.0)` so NaN is rejected too.
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn validate(&self) -> Result<(), StageLoadError> {
        let invalid = |details: String| StageLoadError::InvalidDefinition {
            stage: self.name.clone(),
            details,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("stage name is empty".to_string()));
        }

        let blocks = [
            ("wall", &self.walls),
            ("movable", &self.movables),
            ("bot", &self.bots),
        ];
        for (label, list) in blocks {
            for (i, block) in list.iter().enumerate() {
                if !positive(vec3(block.size)) {
                    return Err(invalid(format!(
                        "{} #{} has non-positive size {:?}",
                        label, i, block.size
                    )));
                }
            }
        }

        for (i, item) in self.items.iter().enumerate() {
            if !(item.size > 0.0) {
                return Err(invalid(format!("item #{} has non-positive size", i)));
            }
        }

        for (i, sprite) in self.sprites.iter().enumerate() {
            if !(sprite.size.0 > 0.0 && sprite.size.1 > 0.0) {
                return Err(invalid(format!("sprite #{} has non-positive size", i)));
            }
        }

        if let Some(skybox) = &self.skybox {
            if !(skybox.radius > 0.0) {
                return Err(invalid("skybox radius must be positive".to_string()));
            }
        }

        if self.player.is_none() && self.camera.initial.needs_player() {
            return Err(invalid(format!(
                "initial camera {:?} needs a player",
                self.camera.initial
            )));
        }

        Ok(())
    }
}

fn positive(v: Vec3) -> bool {
    v.cmpgt(Vec3::ZERO).all()
}

/// Resource storing all loaded stage definitions, in play order.
#[derive(Resource, Default)]
pub struct StageRegistry {
    pub stages: Vec<StageDefinition>,
}

impl StageRegistry {
    /// Get a stage by position, wrapping around.
    pub fn get(&self, index: usize) -> Option<&StageDefinition> {
        if self.stages.is_empty() {
            return None;
        }
        self.stages.get(index % self.stages.len())
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Resource indicating which stage is (or will be) loaded.
#[derive(Resource, Default)]
pub struct CurrentStage {
    pub index: usize,
}

/// Load all stage definitions from assets/data/stages/.
pub fn load_stage_definitions(mut commands: Commands) {
    let mut registry = StageRegistry::default();
    let stages_path = Path::new("assets/data/stages");

    if stages_path.exists() {
        match fs::read_dir(stages_path) {
            Ok(entries) => {
                let mut paths: Vec<_> = entries
                    .flatten()
                    .map(|entry| entry.path())
                    .filter(|path| path.extension().is_some_and(|ext| ext == "ron"))
                    .collect();
                paths.sort();

                for path in paths {
                    match StageDefinition::load(&path) {
                        Ok(stage) => {
                            info!("Loaded stage: {}", stage.name);
                            registry.stages.push(stage);
                        }
                        Err(e) => error!("Skipping stage file: {}", e),
                    }
                }
            }
            Err(e) => error!("Failed to read stage directory {:?}: {}", stages_path, e),
        }
    } else {
        warn!("Stages directory not found: {:?}", stages_path);
    }

    if registry.is_empty() {
        warn!("No stages loaded, using the built-in gallery");
        registry.stages.push(StageDefinition::builtin_gallery());
    }

    info!("Loaded {} stage(s)", registry.len());
    commands.insert_resource(registry);
    commands.insert_resource(CurrentStage::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    const GALLERY: &str = r#"
(
    name: "test range",
    ambient_color: (1.0, 0.5, 0.0),
    player: Some((position: (0.0, 1.0, 0.0))),
    walls: [
        (position: (0.0, 0.0, -5.0), size: (4.0, 4.0, 0.5)),
    ],
    movables: [
        (
            position: (0.0, 0.5, -10.0),
            size: (1.0, 1.0, 1.0),
            rotation: 45.0,
            color: (1.0, 0.0, 0.0),
        ),
    ],
    items: [
        (position: (2.0, 0.5, 0.0), size: 0.5),
    ],
    lights: [
        (kind: Point, position: (0.0, 4.0, 0.0), intensity: 1000.0, shadows: true),
    ],
    camera: (initial: Follow),
)
"#;

    #[test]
    fn parses_stage_file() {
        let stage = StageDefinition::from_ron_str("test.ron", GALLERY).unwrap();
        assert_eq!(stage.name, "test range");
        assert_eq!(stage.walls.len(), 1);
        assert_eq!(stage.movables[0].rotation, 45.0);
        assert_eq!(stage.walls[0].color, default_block_color());
        assert_eq!(stage.items[0].size, 0.5);
        assert!(stage.lights[0].shadows);
        assert_eq!(stage.lights[0].range, default_light_range());
        assert_eq!(stage.camera.initial, CameraType::Follow);
        assert_eq!(stage.camera.arc_radius, CameraLayout::default().arc_radius);
        assert!(stage.hud);
        assert!(stage.bots.is_empty());
        assert!(stage.skybox.is_none());
    }

    #[test]
    fn rejects_bad_ron() {
        let err = StageDefinition::from_ron_str("bad.ron", "(name: ").unwrap_err();
        assert!(matches!(err, StageLoadError::ParseError { .. }));
    }

    #[test]
    fn rejects_flat_walls() {
        let mut stage = StageDefinition::empty("flat");
        stage.walls.push(BlockDef {
            position: (0.0, 0.0, 0.0),
            size: (1.0, 0.0, 1.0),
            rotation: 0.0,
            color: default_block_color(),
        });
        let err = stage.validate().unwrap_err();
        assert!(matches!(err, StageLoadError::InvalidDefinition { .. }));
        assert!(err.to_string().contains("wall #0"));
    }

    #[test]
    fn rejects_nan_sizes() {
        let mut stage = StageDefinition::empty("nan");
        stage.items.push(ItemDef {
            position: (0.0, 0.5, 0.0),
            size: f32::NAN,
            color: default_item_color(),
        });
        let err = stage.validate().unwrap_err();
        assert!(err.to_string().contains("item #0"));

        stage.items[0].size = 0.5;
        stage.sprites.push(SpriteDef {
            position: (0.0, 1.0, 0.0),
            size: (1.0, f32::NAN),
            color: (1.0, 1.0, 1.0),
        });
        let err = stage.validate().unwrap_err();
        assert!(err.to_string().contains("sprite #0"));

        stage.sprites.clear();
        stage.skybox = Some(SkyboxDef {
            radius: f32::NAN,
            color: (0.2, 0.3, 0.5),
        });
        let err = stage.validate().unwrap_err();
        assert!(err.to_string().contains("skybox"));

        stage.skybox = None;
        assert!(stage.validate().is_ok());
    }

    #[test]
    fn presentation_stage_cannot_start_on_player_camera() {
        let mut stage = StageDefinition::empty("showcase");
        stage.camera.initial = CameraType::FirstPerson;
        assert!(stage.validate().is_err());
        stage.camera.initial = CameraType::ArcRotate;
        assert!(stage.validate().is_err());
        stage.camera.initial = CameraType::FreeDebug;
        assert!(stage.validate().is_ok());
    }

    #[test]
    fn missing_file_is_reported() {
        let err = StageDefinition::load(Path::new("does/not/exist.ron")).unwrap_err();
        assert!(matches!(err, StageLoadError::FileNotFound(_)));
    }

    #[test]
    fn builtin_gallery_is_valid() {
        assert!(StageDefinition::builtin_gallery().validate().is_ok());
    }

    #[test]
    fn registry_wraps_around() {
        let registry = StageRegistry {
            stages: vec![StageDefinition::empty("a"), StageDefinition::empty("b")],
        };
        assert_eq!(registry.get(3).map(|s| s.name.as_str()), Some("b"));
        assert!(StageRegistry::default().get(0).is_none());
    }
}
