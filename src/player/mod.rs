//! Player module - the stage's controllable character.

mod components;
mod movement;

pub use components::*;
pub use movement::{FireAction, Player, PlayerTargets};
