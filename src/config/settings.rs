use crate::adapters::outbox::DEFAULT_OUTBOX;
use crate::config::credentials::TransportSecret;
use crate::config::toml_config::TomlConfig;
use crate::core::aggregate::DuplicatePolicy;
use crate::core::summary::DEFAULT_DELIMITER;
use crate::utils::error::{GradiatorError, Result};
use crate::utils::validation::{
    validate_delimiter, validate_non_empty_string, validate_path, validate_required_field,
    Validate,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryTargetKind {
    /// Send over one authenticated SMTP session.
    Smtp,
    /// Write `<nick>.eml` files instead of sending.
    #[default]
    DryRun,
}

/// Where composed digests go, decided once per batch.
#[derive(Debug, Clone)]
pub enum DeliveryTarget {
    Smtp { secret: TransportSecret },
    DryRun { outbox: PathBuf },
}

/// Values given on the command line; they win over the config file.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub duplicates: Option<DuplicatePolicy>,
    pub delimiter: Option<char>,
    pub delivery: Option<DeliveryTargetKind>,
    pub outbox: Option<String>,
    pub password: Option<TransportSecret>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub duplicates: DuplicatePolicy,
    pub delimiter: char,
    pub delivery: DeliveryTarget,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            duplicates: DuplicatePolicy::default(),
            delimiter: DEFAULT_DELIMITER,
            delivery: DeliveryTarget::DryRun {
                outbox: PathBuf::from(DEFAULT_OUTBOX),
            },
        }
    }
}

impl Settings {
    /// Command line first, then config file, then defaults.
    pub fn resolve(file: Option<&TomlConfig>, overrides: SettingsOverrides) -> Result<Self> {
        let file = file.cloned().unwrap_or_default();

        let duplicates = overrides
            .duplicates
            .or(file.duplicates())
            .unwrap_or_default();
        let delimiter = overrides
            .delimiter
            .or(file.delimiter())
            .unwrap_or(DEFAULT_DELIMITER);

        let delivery = match overrides
            .delivery
            .or(file.delivery_target())
            .unwrap_or_default()
        {
            DeliveryTargetKind::Smtp => {
                let secret = overrides
                    .password
                    .filter(|p| !p.is_empty())
                    .or_else(|| file.password().cloned());
                DeliveryTarget::Smtp {
                    secret: validate_required_field("delivery.password", &secret)?.clone(),
                }
            }
            DeliveryTargetKind::DryRun => DeliveryTarget::DryRun {
                outbox: PathBuf::from(
                    overrides
                        .outbox
                        .or_else(|| file.outbox().map(str::to_string))
                        .unwrap_or_else(|| DEFAULT_OUTBOX.to_string()),
                ),
            },
        };

        let settings = Self {
            duplicates,
            delimiter,
            delivery,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self.delivery, DeliveryTarget::DryRun { .. })
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_delimiter("summary.delimiter", self.delimiter)?;
        match &self.delivery {
            DeliveryTarget::Smtp { secret } => {
                validate_non_empty_string("delivery.password", secret.expose()).map_err(|_| {
                    GradiatorError::MissingConfigError {
                        field: "delivery.password".to_string(),
                    }
                })
            }
            DeliveryTarget::DryRun { outbox } => {
                validate_path("delivery.outbox", &outbox.to_string_lossy())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_dry_run() {
        let settings = Settings::resolve(None, SettingsOverrides::default()).unwrap();

        assert!(settings.is_dry_run());
        assert_eq!(settings.delimiter, ';');
        assert_eq!(settings.duplicates, DuplicatePolicy::Overwrite);
        match settings.delivery {
            DeliveryTarget::DryRun { outbox } => assert_eq!(outbox, PathBuf::from("mails")),
            other => panic!("unexpected target: {other:?}"),
        }
    }

    #[test]
    fn test_smtp_requires_password() {
        let overrides = SettingsOverrides {
            delivery: Some(DeliveryTargetKind::Smtp),
            ..Default::default()
        };
        let err = Settings::resolve(None, overrides).unwrap_err();
        assert!(matches!(err, GradiatorError::MissingConfigError { .. }));

        let overrides = SettingsOverrides {
            delivery: Some(DeliveryTargetKind::Smtp),
            password: Some(TransportSecret::new("")),
            ..Default::default()
        };
        assert!(Settings::resolve(None, overrides).is_err());
    }

    #[test]
    fn test_password_alone_does_not_select_smtp() {
        let overrides = SettingsOverrides {
            password: Some(TransportSecret::new("s3cret")),
            ..Default::default()
        };
        let settings = Settings::resolve(None, overrides).unwrap();
        assert!(settings.is_dry_run());
    }

    #[test]
    fn test_command_line_wins_over_file() {
        let file = TomlConfig::from_toml_str(
            "[aggregation]\nduplicates = \"fail\"\n[summary]\ndelimiter = \",\"\n[delivery]\ntarget = \"smtp\"\npassword = \"from-file\"\n",
        )
        .unwrap();
        let overrides = SettingsOverrides {
            duplicates: Some(DuplicatePolicy::KeepFirst),
            ..Default::default()
        };

        let settings = Settings::resolve(Some(&file), overrides).unwrap();

        assert_eq!(settings.duplicates, DuplicatePolicy::KeepFirst);
        assert_eq!(settings.delimiter, ',');
        match settings.delivery {
            DeliveryTarget::Smtp { secret } => assert_eq!(secret.expose(), "from-file"),
            other => panic!("unexpected target: {other:?}"),
        }
    }

    #[test]
    fn test_resolved_secret_is_not_printed() {
        let overrides = SettingsOverrides {
            delivery: Some(DeliveryTargetKind::Smtp),
            password: Some(TransportSecret::new("hunter2")),
            ..Default::default()
        };

        let settings = Settings::resolve(None, overrides.clone()).unwrap();

        assert!(!format!("{:?}", overrides).contains("hunter2"));
        assert!(!format!("{:?}", settings).contains("hunter2"));
    }
}
