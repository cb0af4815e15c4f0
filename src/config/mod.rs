/// Database connection and migration management
pub mod database;

/// Job and server settings loaded from config.toml
pub mod settings;

pub use settings::{
    CleanupSettings, JobSettings, ServerSettings, Settings, cron_secret, load_default_settings,
    load_settings,
};
