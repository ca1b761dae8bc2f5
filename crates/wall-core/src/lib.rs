pub mod core;
pub mod error;
pub mod focus;
pub mod gate;
pub mod mpv;
pub mod sdk;
pub mod tiles;
pub mod wall;

pub use crate::core::{BroadcastMessage, SharedState, WallCore, WallEvent};
pub use error::WallError;
pub use wall::{SdkSignal, TileWall};
