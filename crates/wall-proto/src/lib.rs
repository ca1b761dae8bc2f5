pub mod config;
pub mod platform;
pub mod protocol;
pub mod sources;
pub mod store;
pub mod video_id;

pub use video_id::{normalize, normalize_opt, VideoId};
