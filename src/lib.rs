pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{Command, Settings, SettingsOverrides, TomlConfig};
pub use core::{engine::GradeEngine, grade_file::GradeFile};
pub use utils::error::{GradiatorError, Result};
