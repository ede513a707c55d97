//! Plays the optional stage sounds through kira.

use bevy::prelude::*;
use bevy_kira_audio::{Audio, AudioControl, AudioSource};

use crate::core::{GameState, ItemPickupEvent, PlayState, ShotResolvedEvent};
use crate::stage::StageSettings;

/// Sound handles loaded from the paths in `StageSettings`.
#[derive(Resource, Debug, Default)]
pub struct StageSounds {
    pub impact: Option<Handle<AudioSource>>,
    pub pickup: Option<Handle<AudioSource>>,
}

impl StageSounds {
    /// Load every configured sound with `load`.
    pub fn from_settings(
        settings: &StageSettings,
        mut load: impl FnMut(&str) -> Handle<AudioSource>,
    ) -> Self {
        Self {
            impact: settings.impact_sound.as_deref().map(&mut load),
            pickup: settings.pickup_sound.as_deref().map(&mut load),
        }
    }
}

/// Audio plugin. Expects `bevy_kira_audio::AudioPlugin` to be added by the app.
pub struct StageAudioPlugin;

impl Plugin for StageAudioPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<StageSounds>()
            .add_systems(OnEnter(GameState::InGame), load_stage_sounds)
            .add_systems(
                Update,
                (play_impact_sounds, play_pickup_sounds).run_if(in_state(PlayState::Running)),
            );
    }
}

fn load_stage_sounds(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    settings: Option<Res<StageSettings>>,
) {
    let Some(settings) = settings else {
        return;
    };
    let sounds = StageSounds::from_settings(&settings, |path| asset_server.load(path.to_string()));
    if sounds.impact.is_some() || sounds.pickup.is_some() {
        info!("Loaded stage sounds");
    }
    commands.insert_resource(sounds);
}

fn play_impact_sounds(
    mut events: EventReader<ShotResolvedEvent>,
    sounds: Res<StageSounds>,
    audio: Res<Audio>,
) {
    for _ in events.read() {
        if let Some(impact) = &sounds.impact {
            audio.play(impact.clone());
        }
    }
}

fn play_pickup_sounds(
    mut events: EventReader<ItemPickupEvent>,
    sounds: Res<StageSounds>,
    audio: Res<Audio>,
) {
    for _ in events.read() {
        if let Some(pickup) = &sounds.pickup {
            audio.play(pickup.clone());
        }
    }
}
