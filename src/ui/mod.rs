//! User interface: the stage HUD.

mod hud;

pub use hud::{Hud, HudInfo, HudRoot, HudText};
