//! The stage: one level's objects, cameras, and HUD, from init to unload.

use bevy::pbr::NotShadowCaster;
use bevy::prelude::*;
use std::f32::consts::TAU;

use super::data::{color, vec3, BlockDef, LightKind, StageDefinition};
use super::error::StageError;
use super::hit_point::{determine_nearest_hit_point, HitPoint};
use super::object::{Bot, GameObject, Item, Obstacle, ObstacleKind, ObstacleRef, StageObject};
use super::primitives::{spawn_primitive, Body, Primitive, PrimitiveDesc};
use super::settings::StageSettings;
use super::shot::ShotRay;
use crate::camera::{CameraSystem, CameraType};
use crate::core::{emit, ItemPickupEvent, ShotResolvedEvent};
use crate::player::{Player, PlayerTargets};
use crate::ui::{Hud, HudInfo};

/// Lifecycle of a stage. `Unloaded` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageState {
    #[default]
    Uninitialized,
    Active,
    Unloaded,
}

/// A shadow-casting light and the primitives it casts shadows for.
#[derive(Debug)]
pub struct ShadowGenerator {
    light: Entity,
    casters: Vec<Entity>,
}

impl ShadowGenerator {
    pub fn light(&self) -> Entity {
        self.light
    }

    pub fn casters(&self) -> &[Entity] {
        &self.casters
    }
}

/// The active level. Exclusively owns everything it spawns.
#[derive(Resource, Debug)]
pub struct Stage {
    definition: StageDefinition,
    settings: StageSettings,
    state: StageState,
    player: Option<Player>,
    walls: Vec<Obstacle>,
    movables: Vec<Obstacle>,
    items: Vec<Item>,
    bots: Vec<Bot>,
    models: Vec<GameObject>,
    skybox: Option<GameObject>,
    sprites: Vec<GameObject>,
    lights: Vec<GameObject>,
    shadow_generators: Vec<ShadowGenerator>,
    cameras: Option<CameraSystem>,
    hud: Option<Hud>,
    debug_meshes: Vec<GameObject>,
    bullet_holes: Vec<GameObject>,
    items_picked: usize,
}

impl Stage {
    pub fn new(definition: StageDefinition, settings: StageSettings) -> Self {
        Self {
            definition,
            settings,
            state: StageState::Uninitialized,
            player: None,
            walls: Vec::new(),
            movables: Vec::new(),
            items: Vec::new(),
            bots: Vec::new(),
            models: Vec::new(),
            skybox: None,
            sprites: Vec::new(),
            lights: Vec::new(),
            shadow_generators: Vec::new(),
            cameras: None,
            hud: None,
            debug_meshes: Vec::new(),
            bullet_holes: Vec::new(),
            items_picked: 0,
        }
    }

    /// Build everything the definition describes.
    ///
    /// Creation order matters: cameras lock onto the player, and shadow
    /// generators collect the wall and movable primitives.
    pub fn init(&mut self, world: &mut World) -> Result<(), StageError> {
        if self.state != StageState::Uninitialized {
            return Err(StageError::InvalidTransition {
                operation: "init",
                state: self.state,
            });
        }

        let definition = self.definition.clone();
        info!("Initializing stage '{}'", definition.name);

        world.insert_resource(AmbientLight {
            color: color(definition.ambient_color),
            ..default()
        });
        world.insert_resource(ClearColor(color(definition.clear_color)));

        self.player = definition
            .player
            .as_ref()
            .map(|spawn| Player::spawn(world, spawn, &self.settings.player));

        if self.settings.debug_axes {
            let axes = spawn_axes(world, self.settings.axis_length);
            self.debug_meshes.push(axes);
        }

        self.walls = spawn_obstacles(world, ObstacleKind::Wall, &definition.walls);
        self.movables = spawn_obstacles(world, ObstacleKind::Movable, &definition.movables);

        self.items = definition
            .items
            .iter()
            .map(|item| {
                let primitive = spawn_primitive(
                    world,
                    PrimitiveDesc::new(
                        "item",
                        Primitive::cuboid(Vec3::splat(item.size)),
                        Transform::from_translation(vec3(item.position)),
                    )
                    .with_color(color(item.color))
                    .with_body(Body::Sensor),
                );
                Item::new(GameObject::single(primitive), self.settings.item_spin)
            })
            .collect();

        self.bots = definition
            .bots
            .iter()
            .map(|bot| Bot::new(GameObject::single(spawn_block(world, "bot", bot, Body::Fixed))))
            .collect();

        self.models = spawn_models(world, &definition);

        self.skybox = definition.skybox.as_ref().map(|skybox| {
            GameObject::single(spawn_primitive(
                world,
                PrimitiveDesc::new("skybox", Primitive::sphere(skybox.radius), Transform::IDENTITY)
                    .with_color(color(skybox.color))
                    .unlit()
                    .without_shadows(),
            ))
        });

        self.sprites = definition
            .sprites
            .iter()
            .map(|sprite| {
                GameObject::single(spawn_primitive(
                    world,
                    PrimitiveDesc::new(
                        "sprite",
                        Primitive::cuboid(Vec3::new(sprite.size.0, sprite.size.1, 0.01)),
                        Transform::from_translation(vec3(sprite.position)),
                    )
                    .with_color(color(sprite.color))
                    .unlit(),
                ))
            })
            .collect();

        if definition.hud {
            self.hud = Some(Hud::spawn(world, &definition.name));
        }

        let targets = self.player_targets();
        match CameraSystem::new(
            world,
            &definition.camera,
            color(definition.clear_color),
            targets,
        ) {
            Ok(cameras) => self.cameras = Some(cameras),
            Err(e) => {
                error!("Stage '{}' has no usable camera: {}", definition.name, e);
                self.release(world);
                self.state = StageState::Unloaded;
                return Err(e.into());
            }
        }

        self.lights = definition
            .lights
            .iter()
            .map(|light| {
                let entity = match light.kind {
                    LightKind::Point => world.spawn((
                        PointLight {
                            color: color(light.color),
                            intensity: light.intensity,
                            range: light.range,
                            shadows_enabled: light.shadows,
                            ..default()
                        },
                        Transform::from_translation(vec3(light.position)),
                    )),
                    LightKind::Directional => world.spawn((
                        DirectionalLight {
                            color: color(light.color),
                            illuminance: light.intensity,
                            shadows_enabled: light.shadows,
                            ..default()
                        },
                        Transform::from_translation(vec3(light.position))
                            .looking_at(Vec3::ZERO, Vec3::Y),
                    )),
                }
                .insert(Name::new("light"))
                .id();
                GameObject::single(entity)
            })
            .collect();

        let casters: Vec<Entity> = self
            .walls
            .iter()
            .chain(&self.movables)
            .flat_map(|obstacle| obstacle.primitives().iter().copied())
            .collect();
        self.shadow_generators = definition
            .lights
            .iter()
            .zip(&self.lights)
            .filter(|(light, _)| light.shadows)
            .filter_map(|(_, object)| object.primitives().first().copied())
            .map(|light| ShadowGenerator {
                light,
                casters: casters.clone(),
            })
            .collect();
        if !self.shadow_generators.is_empty() {
            self.exclude_from_shadows(world);
        }

        self.state = StageState::Active;
        info!(
            "Stage '{}' ready: {} walls, {} movables, {} items, {} bots",
            definition.name,
            self.walls.len(),
            self.movables.len(),
            self.items.len(),
            self.bots.len()
        );
        Ok(())
    }

    /// Per-tick update: HUD, then the player, then every item in order.
    pub fn render(&mut self, world: &mut World) {
        if self.state != StageState::Active {
            debug_assert!(false, "render on a {:?} stage", self.state);
            return;
        }

        if let (Some(hud), Some(cameras)) = (&self.hud, &self.cameras) {
            hud.update(
                world,
                &HudInfo {
                    stage_name: &self.definition.name,
                    camera: cameras.active_type(),
                    items_picked: self.items_picked,
                    items_total: self.items.len(),
                    bullet_holes: self.bullet_holes.len(),
                },
            );
        }

        let aim = self
            .cameras
            .as_ref()
            .and_then(|cameras| cameras.aim_rotation(world));
        let mut fired = None;
        if let Some(player) = &mut self.player {
            fired = player.handle_input(world, aim, self.settings.shot_range);
            player.render(world);
        }
        if let Some(shot) = fired {
            self.apply_shot(world, shot.source, shot.destination);
        }

        let picker: Option<Vec<Entity>> = self
            .player
            .as_ref()
            .map(|player| player.primitives().to_vec());
        let total = self.items.len();
        for (index, item) in self.items.iter_mut().enumerate() {
            item.render(world);
            let Some(picker) = &picker else {
                continue;
            };
            if item.check_pick(world, picker) {
                self.items_picked += 1;
                info!("Picked up item {} ({}/{})", index, self.items_picked, total);
                emit(world, ItemPickupEvent { item: index });
            }
        }
    }

    /// Resolve a shot from `source` toward `destination`.
    ///
    /// Every wall and movable is queried; the hit closest to `source` gets a
    /// bullet hole. A miss does nothing.
    pub fn apply_shot(&mut self, world: &mut World, source: Vec3, destination: Vec3) {
        if self.state != StageState::Active {
            debug!("Ignoring shot on a {:?} stage", self.state);
            return;
        }
        let Some(ray) = ShotRay::between(source, destination) else {
            return;
        };

        let view: &World = world;
        let candidates: Vec<HitPoint> = self
            .walls
            .iter()
            .chain(&self.movables)
            .flat_map(|obstacle| obstacle.apply_shot(view, &ray))
            .collect();
        let Some(nearest) = determine_nearest_hit_point(&candidates) else {
            debug!("Shot from {:?} missed", source);
            return;
        };

        if self.settings.debug_shot_rays {
            let line = spawn_shot_line(world, &ray);
            self.debug_meshes.push(line);
        }

        let (r, g, b) = self.definition.ambient_color;
        let decal = spawn_primitive(
            world,
            PrimitiveDesc::new(
                "bullet-hole",
                Primitive::sphere(self.settings.decal_radius),
                Transform::from_translation(nearest.point())
                    .with_rotation(Quat::from_rotation_y(rand::random::<f32>() * TAU)),
            )
            .with_color(Color::srgb(r * 0.15, g * 0.15, b * 0.15))
            .without_shadows(),
        );
        self.bullet_holes.push(GameObject::single(decal));

        let owner = nearest.owner();
        if owner.kind == ObstacleKind::Movable {
            if let Some(movable) = self.movables.get(owner.index) {
                movable.apply_impulse(
                    world,
                    nearest.primitive(),
                    ray.direction() * self.settings.shot_impulse,
                    nearest.point(),
                );
            }
        }

        debug!(
            "Shot hit {:?} #{} at {:?} ({:.2} away)",
            owner.kind,
            owner.index,
            nearest.point(),
            nearest.distance()
        );
        emit(
            world,
            ShotResolvedEvent {
                point: nearest.point(),
                distance: nearest.distance(),
                owner,
            },
        );
    }

    pub fn set_active_camera(
        &mut self,
        world: &mut World,
        camera_type: CameraType,
    ) -> Result<(), StageError> {
        let targets = self.player_targets();
        match (&mut self.cameras, self.state) {
            (Some(cameras), StageState::Active) => {
                cameras.set_active_camera(world, camera_type, targets)?;
                Ok(())
            }
            (_, state) => Err(StageError::InvalidTransition {
                operation: "switch cameras of",
                state,
            }),
        }
    }

    /// Dispose of everything the stage owns.
    ///
    /// Unloading twice only logs a warning.
    pub fn unload(&mut self, world: &mut World) {
        match self.state {
            StageState::Unloaded => {
                warn!("Stage '{}' is already unloaded", self.definition.name);
                return;
            }
            StageState::Uninitialized => {
                debug!("Unloading stage '{}' before init", self.definition.name);
            }
            StageState::Active => {
                info!("Unloading stage '{}'", self.definition.name);
            }
        }
        self.release(world);
        self.state = StageState::Unloaded;
    }

    fn release(&mut self, world: &mut World) {
        if let Some(mut player) = self.player.take() {
            player.dispose(world);
        }
        dispose_all(world, &mut self.walls);
        dispose_all(world, &mut self.movables);
        dispose_all(world, &mut self.items);
        dispose_all(world, &mut self.bots);
        dispose_all(world, &mut self.models);
        if let Some(mut skybox) = self.skybox.take() {
            skybox.dispose(world);
        }
        dispose_all(world, &mut self.sprites);
        self.shadow_generators.clear();
        dispose_all(world, &mut self.lights);
        if let Some(mut cameras) = self.cameras.take() {
            cameras.dispose(world);
        }
        if let Some(hud) = self.hud.take() {
            hud.dispose(world);
        }
        dispose_all(world, &mut self.debug_meshes);
        dispose_all(world, &mut self.bullet_holes);
    }

    /// Everything except walls and movables stays out of shadow maps.
    fn exclude_from_shadows(&self, world: &mut World) {
        let player = self.player.iter().flat_map(|player| player.primitives());
        let items = self.items.iter().flat_map(|item| item.primitives());
        let bots = self.bots.iter().flat_map(|bot| bot.primitives());
        let sprites = self.sprites.iter().flat_map(|sprite| sprite.primitives());
        let others: Vec<Entity> = player.chain(items).chain(bots).chain(sprites).copied().collect();
        for entity in others {
            if world.entities().contains(entity) {
                world.entity_mut(entity).insert(NotShadowCaster);
            }
        }
    }

    fn player_targets(&self) -> Option<PlayerTargets> {
        self.player.as_ref().map(Player::targets)
    }

    pub fn state(&self) -> StageState {
        self.state
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &StageDefinition {
        &self.definition
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    pub fn walls(&self) -> &[Obstacle] {
        &self.walls
    }

    pub fn movables(&self) -> &[Obstacle] {
        &self.movables
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn bots(&self) -> &[Bot] {
        &self.bots
    }

    pub fn models(&self) -> &[GameObject] {
        &self.models
    }

    pub fn skybox(&self) -> Option<&GameObject> {
        self.skybox.as_ref()
    }

    pub fn sprites(&self) -> &[GameObject] {
        &self.sprites
    }

    pub fn lights(&self) -> &[GameObject] {
        &self.lights
    }

    pub fn shadow_generators(&self) -> &[ShadowGenerator] {
        &self.shadow_generators
    }

    pub fn camera_system(&self) -> Option<&CameraSystem> {
        self.cameras.as_ref()
    }

    pub fn hud(&self) -> Option<&Hud> {
        self.hud.as_ref()
    }

    pub fn debug_meshes(&self) -> &[GameObject] {
        &self.debug_meshes
    }

    pub fn bullet_holes(&self) -> &[GameObject] {
        &self.bullet_holes
    }

    pub fn items_picked(&self) -> usize {
        self.items_picked
    }
}

fn dispose_all<T: StageObject>(world: &mut World, objects: &mut Vec<T>) {
    for mut object in objects.drain(..) {
        object.dispose(world);
    }
}

fn spawn_block(world: &mut World, label: &'static str, block: &BlockDef, body: Body) -> Entity {
    spawn_primitive(
        world,
        PrimitiveDesc::new(
            label,
            Primitive::cuboid(vec3(block.size)),
            Transform::from_translation(vec3(block.position))
                .with_rotation(Quat::from_rotation_y(block.rotation.to_radians())),
        )
        .with_color(color(block.color))
        .with_body(body),
    )
}

fn spawn_obstacles(world: &mut World, kind: ObstacleKind, blocks: &[BlockDef]) -> Vec<Obstacle> {
    let (label, body) = match kind {
        ObstacleKind::Wall => ("wall", Body::Fixed),
        ObstacleKind::Movable => ("movable", Body::Dynamic),
    };
    blocks
        .iter()
        .enumerate()
        .map(|(index, block)| {
            Obstacle::new(
                ObstacleRef { kind, index },
                GameObject::single(spawn_block(world, label, block, body)),
            )
        })
        .collect()
}

fn spawn_models(world: &mut World, definition: &StageDefinition) -> Vec<GameObject> {
    if definition.models.is_empty() {
        return Vec::new();
    }
    let Some(asset_server) = world.get_resource::<AssetServer>().cloned() else {
        warn!(
            "No asset server, skipping {} model(s) of stage '{}'",
            definition.models.len(),
            definition.name
        );
        return Vec::new();
    };

    definition
        .models
        .iter()
        .map(|model| {
            let entity = world
                .spawn((
                    SceneRoot(asset_server.load(model.path.clone())),
                    Transform::from_translation(vec3(model.position))
                        .with_scale(Vec3::splat(model.scale)),
                    Name::new(format!("model {}", model.path)),
                ))
                .id();
            GameObject::single(entity)
        })
        .collect()
}

/// Red X, green Y and blue Z from the origin.
fn spawn_axes(world: &mut World, length: f32) -> GameObject {
    let thickness = 0.02;
    let axes = [
        (Vec3::X, Color::srgb(1.0, 0.0, 0.0)),
        (Vec3::Y, Color::srgb(0.0, 1.0, 0.0)),
        (Vec3::Z, Color::srgb(0.0, 0.0, 1.0)),
    ];
    let primitives = axes
        .into_iter()
        .map(|(axis, axis_color)| {
            let size = Vec3::splat(thickness) + axis * (length - thickness);
            spawn_primitive(
                world,
                PrimitiveDesc::new(
                    "axis",
                    Primitive::cuboid(size),
                    Transform::from_translation(axis * length / 2.0),
                )
                .with_color(axis_color)
                .unlit()
                .without_shadows(),
            )
        })
        .collect();
    GameObject::new(primitives)
}

/// Thin box along the whole shot.
fn spawn_shot_line(world: &mut World, ray: &ShotRay) -> GameObject {
    let center = ray.point_at(ray.length() / 2.0);
    let primitive = spawn_primitive(
        world,
        PrimitiveDesc::new(
            "shot-ray",
            Primitive::cuboid(Vec3::new(0.01, 0.01, ray.length())),
            Transform::from_translation(center)
                .with_rotation(Quat::from_rotation_arc(Vec3::Z, ray.direction().as_vec3())),
        )
        .with_color(Color::srgb(1.0, 1.0, 0.0))
        .unlit()
        .without_shadows(),
    );
    GameObject::single(primitive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraError, CameraRig};
    use crate::stage::{ItemDef, LightDef, PlayerSpawn};
    use crate::ui::HudText;
    use bevy_rapier3d::prelude::ExternalImpulse;

    fn block(z: f32) -> BlockDef {
        BlockDef {
            position: (0.0, 0.0, z),
            size: (1.0, 1.0, 1.0),
            rotation: 0.0,
            color: (0.5, 0.5, 0.5),
        }
    }

    fn active(definition: StageDefinition, settings: StageSettings, world: &mut World) -> Stage {
        let mut stage = Stage::new(definition, settings);
        stage.init(world).unwrap();
        assert_eq!(stage.state(), StageState::Active);
        stage
    }

    fn primitive_count(world: &mut World) -> usize {
        world.query::<&Primitive>().iter(world).count()
    }

    fn far_shot() -> (Vec3, Vec3) {
        (Vec3::ZERO, Vec3::new(0.0, 0.0, -50.0))
    }

    #[test]
    fn nearest_obstacle_gets_the_decal() {
        let mut world = World::new();
        world.init_resource::<Events<ShotResolvedEvent>>();
        let mut definition = StageDefinition::empty("range");
        definition.walls.push(block(-5.5));
        definition.movables.push(block(-10.5));
        let mut stage = active(definition, StageSettings::default(), &mut world);

        let (source, destination) = far_shot();
        stage.apply_shot(&mut world, source, destination);

        assert_eq!(stage.bullet_holes().len(), 1);
        let decal = stage.bullet_holes()[0].primitives()[0];
        let position = world.get::<Transform>(decal).unwrap().translation;
        assert!(position.distance(Vec3::new(0.0, 0.0, -5.0)) < 1e-4);

        let movable = stage.movables()[0].primitives()[0];
        assert_eq!(world.get::<ExternalImpulse>(movable).unwrap().impulse, Vec3::ZERO);

        let events: Vec<_> = world
            .resource_mut::<Events<ShotResolvedEvent>>()
            .drain()
            .collect();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].owner,
            ObstacleRef {
                kind: ObstacleKind::Wall,
                index: 0
            }
        );
        assert!((events[0].distance - 5.0).abs() < 1e-4);
    }

    #[test]
    fn obstacle_behind_destination_is_missed() {
        let mut world = World::new();
        let mut definition = StageDefinition::empty("range");
        definition.movables.push(block(-20.0));
        let mut stage = active(definition, StageSettings::default(), &mut world);

        stage.apply_shot(&mut world, Vec3::ZERO, Vec3::new(0.0, 0.0, -10.0));
        assert!(stage.bullet_holes().is_empty());
    }

    #[test]
    fn empty_stage_never_gets_decals() {
        let mut world = World::new();
        let def = StageDefinition::empty("void");
        let mut stage = active(def, StageSettings::default(), &mut world);
        let before = primitive_count(&mut world);

        let (source, destination) = far_shot();
        stage.apply_shot(&mut world, source, destination);
        stage.apply_shot(&mut world, Vec3::ONE, Vec3::ONE);
        assert!(stage.bullet_holes().is_empty());
        assert_eq!(primitive_count(&mut world), before);
    }

    #[test]
    fn movable_hit_is_pushed_along_the_shot() {
        let mut world = World::new();
        let mut definition = StageDefinition::empty("range");
        definition.movables.push(block(-5.5));
        let settings = StageSettings {
            debug_shot_rays: true,
            ..default()
        };
        let mut stage = active(definition, settings, &mut world);

        let (source, destination) = far_shot();
        stage.apply_shot(&mut world, source, destination);

        let movable = stage.movables()[0].primitives()[0];
        let impulse = world.get::<ExternalImpulse>(movable).unwrap();
        let expected = Vec3::NEG_Z * StageSettings::default().shot_impulse;
        assert!(impulse.impulse.distance(expected) < 1e-4);
        assert_eq!(stage.debug_meshes().len(), 1);
    }

    #[test]
    fn init_then_unload_releases_everything() {
        let mut world = World::new();
        let mut definition = StageDefinition::empty("lobby");
        definition.player = Some(PlayerSpawn {
            position: (0.0, 1.0, 0.0),
            yaw: 0.0,
        });
        definition.camera.initial = CameraType::Follow;
        let mut stage = active(definition, StageSettings::default(), &mut world);
        let targets = stage.player().unwrap().targets();
        assert!(world.get_resource::<AmbientLight>().is_some());

        stage.unload(&mut world);
        assert_eq!(stage.state(), StageState::Unloaded);
        assert!(stage.player().is_none());
        assert!(!world.entities().contains(targets.third_person));
        assert!(!world.entities().contains(targets.first_person));
        assert_eq!(primitive_count(&mut world), 0);
        assert_eq!(world.query::<&CameraRig>().iter(&world).count(), 0);
        assert_eq!(world.query::<&Node>().iter(&world).count(), 0);

        // Second unload is ignored.
        stage.unload(&mut world);
        assert_eq!(stage.state(), StageState::Unloaded);
    }

    #[test]
    fn init_runs_once() {
        let mut world = World::new();
        let def = StageDefinition::empty("once");
        let mut stage = active(def, StageSettings::default(), &mut world);
        let err = stage.init(&mut world).unwrap_err();
        assert!(matches!(
            err,
            StageError::InvalidTransition {
                operation: "init",
                state: StageState::Active
            }
        ));
    }

    #[test]
    fn shadows_come_from_walls_and_movables() {
        let mut world = World::new();
        let mut definition = StageDefinition::builtin_gallery();
        definition.bots.push(block(3.0));
        let mut stage = active(definition, StageSettings::default(), &mut world);

        assert_eq!(stage.shadow_generators().len(), 1);
        let generator = &stage.shadow_generators()[0];
        assert!(world.get::<DirectionalLight>(generator.light()).is_some());
        assert_eq!(generator.casters().len(), 4);
        assert!(generator
            .casters()
            .iter()
            .all(|&caster| world.get::<NotShadowCaster>(caster).is_none()));

        let bot = stage.bots()[0].primitives()[0];
        assert!(world.get::<NotShadowCaster>(bot).is_some());
        let item = stage.items()[0].primitives()[0];
        assert!(world.get::<NotShadowCaster>(item).is_some());

        stage.unload(&mut world);
        assert_eq!(world.query::<&DirectionalLight>().iter(&world).count(), 0);
    }

    #[test]
    fn space_fires_at_the_back_wall_and_the_hud_counts_it() {
        let mut world = World::new();
        world.init_resource::<Events<ShotResolvedEvent>>();
        let mut input = ButtonInput::<KeyCode>::default();
        input.press(KeyCode::Space);
        world.insert_resource(input);
        let gallery = StageDefinition::builtin_gallery();
        let items = gallery.items.len();
        let mut stage = active(gallery, StageSettings::default(), &mut world);

        stage.render(&mut world);

        assert_eq!(stage.bullet_holes().len(), 1);
        let decal = stage.bullet_holes()[0].primitives()[0];
        let position = world.get::<Transform>(decal).unwrap().translation;
        assert!(position.distance(Vec3::new(0.0, 1.6, -11.75)) < 1e-3);
        let events: Vec<_> = world
            .resource_mut::<Events<ShotResolvedEvent>>()
            .drain()
            .collect();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].owner,
            ObstacleRef {
                kind: ObstacleKind::Wall,
                index: 1
            }
        );

        // Still held, but no longer just pressed: the next tick only refreshes.
        world.resource_mut::<ButtonInput<KeyCode>>().clear();
        stage.render(&mut world);
        assert_eq!(stage.bullet_holes().len(), 1);

        let text = world
            .query_filtered::<&Text, With<HudText>>()
            .single(&world)
            .0
            .clone();
        assert!(text.starts_with("gallery\ncamera: follow\n"));
        assert!(text.contains(&format!("items: 0/{}", items)));
        assert!(text.ends_with("bullet holes: 1"));
    }

    #[test]
    fn player_picks_up_overlapping_item() {
        let mut world = World::new();
        world.init_resource::<Events<ItemPickupEvent>>();
        let mut definition = StageDefinition::empty("pickup");
        definition.player = Some(PlayerSpawn {
            position: (0.0, 1.0, 0.0),
            yaw: 0.0,
        });
        definition.items.push(ItemDef {
            position: (0.0, 0.5, 0.0),
            size: 0.5,
            color: (1.0, 1.0, 0.0),
        });
        definition.items.push(ItemDef {
            position: (10.0, 0.5, 0.0),
            size: 0.5,
            color: (1.0, 1.0, 0.0),
        });
        let mut stage = active(definition, StageSettings::default(), &mut world);

        stage.render(&mut world);
        stage.render(&mut world);
        assert!(stage.items()[0].is_picked());
        assert!(!stage.items()[1].is_picked());
        assert_eq!(stage.items_picked(), 1);
        assert_eq!(stage.items()[1].angle(), 2.0 * StageSettings::default().item_spin);

        let picked: Vec<_> = world
            .resource_mut::<Events<ItemPickupEvent>>()
            .drain()
            .map(|event| event.item)
            .collect();
        assert_eq!(picked, vec![0]);
    }

    #[test]
    fn presentation_stage_spins_items_without_picking() {
        let mut world = World::new();
        let mut definition = StageDefinition::empty("showcase");
        definition.items.push(ItemDef {
            position: (0.0, 0.5, 0.0),
            size: 0.5,
            color: (1.0, 1.0, 0.0),
        });
        let mut stage = active(definition, StageSettings::default(), &mut world);
        stage.render(&mut world);
        assert_eq!(stage.items()[0].angle(), StageSettings::default().item_spin);
        assert!(!stage.items()[0].is_picked());
    }

    #[test]
    fn presentation_stage_rejects_player_cameras() {
        let mut world = World::new();
        let def = StageDefinition::empty("showcase");
        let mut stage = active(def, StageSettings::default(), &mut world);
        let err = stage
            .set_active_camera(&mut world, CameraType::FirstPerson)
            .unwrap_err();
        assert!(matches!(
            err,
            StageError::Camera(CameraError::MissingPlayer(CameraType::FirstPerson))
        ));
        assert_eq!(
            stage.camera_system().map(CameraSystem::active_type),
            Some(CameraType::FreeDebug)
        );
    }

    #[test]
    fn extras_are_built_and_released() {
        let mut world = World::new();
        let mut definition = StageDefinition::empty("extras");
        definition.skybox = Some(crate::stage::SkyboxDef {
            radius: 100.0,
            color: (0.1, 0.1, 0.3),
        });
        definition.sprites.push(crate::stage::SpriteDef {
            position: (0.0, 2.0, -3.0),
            size: (1.0, 2.0),
            color: (1.0, 1.0, 1.0),
        });
        definition.lights.push(LightDef {
            kind: LightKind::Point,
            position: (0.0, 4.0, 0.0),
            intensity: 1000.0,
            color: (1.0, 1.0, 1.0),
            range: 20.0,
            shadows: false,
        });
        definition.models.push(crate::stage::ModelDef {
            path: "models/crate.glb#Scene0".to_string(),
            position: (0.0, 0.0, 0.0),
            scale: 1.0,
        });
        let settings = StageSettings {
            debug_axes: true,
            ..default()
        };
        let mut stage = active(definition, settings, &mut world);

        assert!(stage.skybox().is_some());
        assert_eq!(stage.sprites().len(), 1);
        assert_eq!(stage.lights().len(), 1);
        assert!(stage.shadow_generators().is_empty());
        assert!(stage.models().is_empty());
        assert_eq!(stage.debug_meshes()[0].primitives().len(), 3);

        stage.unload(&mut world);
        assert_eq!(primitive_count(&mut world), 0);
        assert_eq!(world.query::<&PointLight>().iter(&world).count(), 0);
    }
}
