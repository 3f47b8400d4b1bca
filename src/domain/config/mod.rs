//! Configuration domain module

mod app_config;
mod user_settings;

pub use app_config::{AppConfig, DEFAULT_MODEL};
pub use user_settings::{UserSettings, SETTINGS_KEYS};
