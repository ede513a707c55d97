//! Audio module - impact and pickup sounds.

mod plugin;

pub use plugin::{StageAudioPlugin, StageSounds};
