//! Stage cameras: one active at a time, switched by type.

mod plugin;
mod rigs;
mod system;

pub use plugin::CameraPlugin;
pub use system::*;
