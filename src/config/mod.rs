pub mod command;
pub mod credentials;
pub mod settings;
pub mod toml_config;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use command::Command;
pub use settings::{DeliveryTarget, DeliveryTargetKind, Settings, SettingsOverrides};
pub use toml_config::TomlConfig;
