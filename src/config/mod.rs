//! Configuration module for tally.
//!
//! Handles the database location, connection pragmas and log output.

mod settings;

pub use settings::{
    expand_env_vars, DatabaseSettings, JournalMode, LoggingSettings, Settings, SettingsError,
};
