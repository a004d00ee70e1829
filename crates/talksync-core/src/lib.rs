pub mod app_config;
pub mod talks;

pub use app_config::AppConfig;
pub use talks::{
    default_track_for, far_future, truncate_chars, PresentationType, DEFAULT_TRACK,
    LIGHTNING_TRACK, MAX_ROOM_NAME_LENGTH, MAX_TALK_TITLE_LENGTH, MAX_TRACK_NAME_LENGTH,
};
