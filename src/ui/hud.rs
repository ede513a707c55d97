//! Stage HUD - stage name, active camera, pickups, and bullet holes.

use bevy::prelude::*;

use crate::camera::CameraType;

/// Marker for HUD root entity.
#[derive(Component)]
pub struct HudRoot;

/// Marker for the HUD's status text.
#[derive(Component)]
pub struct HudText;

/// Values shown by the HUD.
#[derive(Debug, Clone, PartialEq)]
pub struct HudInfo<'a> {
    pub stage_name: &'a str,
    pub camera: CameraType,
    pub items_picked: usize,
    pub items_total: usize,
    pub bullet_holes: usize,
}

impl HudInfo<'_> {
    pub fn text(&self) -> String {
        format!(
            "{}\ncamera: {}\nitems: {}/{}\nbullet holes: {}",
            self.stage_name,
            self.camera.label(),
            self.items_picked,
            self.items_total,
            self.bullet_holes
        )
    }
}

/// A stage's HUD overlay.
#[derive(Debug)]
pub struct Hud {
    root: Entity,
    text: Entity,
}

impl Hud {
    /// Spawn the HUD UI (top-left corner) plus a crosshair.
    pub fn spawn(world: &mut World, stage_name: &str) -> Self {
        let mut text = Entity::PLACEHOLDER;
        let root = world
            .spawn((
                Node {
                    width: Val::Percent(100.0),
                    height: Val::Percent(100.0),
                    flex_direction: FlexDirection::Column,
                    justify_content: JustifyContent::Start,
                    align_items: AlignItems::Start,
                    padding: UiRect::all(Val::Px(20.0)),
                    ..default()
                },
                HudRoot,
                Name::new("hud"),
            ))
            .with_children(|parent| {
                text = parent
                    .spawn((
                        Text::new(stage_name),
                        TextFont {
                            font_size: 16.0,
                            ..default()
                        },
                        TextColor(Color::srgb(0.8, 0.8, 0.8)),
                        HudText,
                    ))
                    .id();

                // Crosshair (center of screen)
                parent
                    .spawn(Node {
                        width: Val::Percent(100.0),
                        height: Val::Percent(100.0),
                        justify_content: JustifyContent::Center,
                        align_items: AlignItems::Center,
                        position_type: PositionType::Absolute,
                        ..default()
                    })
                    .with_children(|parent| {
                        parent.spawn((
                            Node {
                                width: Val::Px(4.0),
                                height: Val::Px(4.0),
                                ..default()
                            },
                            BackgroundColor(Color::srgba(1.0, 1.0, 1.0, 0.5)),
                        ));
                    });
            })
            .id();

        Self { root, text }
    }

    pub fn update(&self, world: &mut World, info: &HudInfo) {
        if let Some(mut text) = world.get_mut::<Text>(self.text) {
            let updated = info.text();
            if text.0 != updated {
                text.0 = updated;
            }
        }
    }

    pub fn dispose(&self, world: &mut World) {
        if world.entities().contains(self.root) {
            world.entity_mut(self.root).despawn_recursive();
        }
    }
}
