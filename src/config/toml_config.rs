use crate::config::credentials::TransportSecret;
use crate::config::settings::DeliveryTargetKind;
use crate::core::aggregate::DuplicatePolicy;
use crate::utils::error::{GradiatorError, Result};
use crate::utils::validation::{validate_delimiter, validate_path, Validate};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;
use zeroize::Zeroizing;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub aggregation: Option<AggregationConfig>,
    pub summary: Option<SummaryConfig>,
    pub delivery: Option<DeliveryConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AggregationConfig {
    pub duplicates: Option<DuplicatePolicy>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryConfig {
    pub delimiter: Option<char>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryConfig {
    pub target: Option<DeliveryTargetKind>,
    pub outbox: Option<String>,
    /// Usually `${SOME_ENV_VAR}`; the file itself should not hold the secret.
    pub password: Option<TransportSecret>,
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"))
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            Zeroizing::new(std::fs::read_to_string(path).map_err(|source| {
                GradiatorError::FileError {
                    path: path.to_path_buf(),
                    source,
                }
            })?);
        let config = Self::from_toml_str(&content)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        // may hold the substituted SMTP password
        let processed_content = Zeroizing::new(Self::substitute_env_vars(content));

        toml::from_str(&processed_content).map_err(|e| GradiatorError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn duplicates(&self) -> Option<DuplicatePolicy> {
        self.aggregation.as_ref().and_then(|a| a.duplicates)
    }

    pub fn delimiter(&self) -> Option<char> {
        self.summary.as_ref().and_then(|s| s.delimiter)
    }

    pub fn delivery_target(&self) -> Option<DeliveryTargetKind> {
        self.delivery.as_ref().and_then(|d| d.target)
    }

    pub fn outbox(&self) -> Option<&str> {
        self.delivery.as_ref().and_then(|d| d.outbox.as_deref())
    }

    /// The password, unless it is still an unresolved `${VAR}` placeholder.
    pub fn password(&self) -> Option<&TransportSecret> {
        self.delivery
            .as_ref()
            .and_then(|d| d.password.as_ref())
            .filter(|p| !env_var_pattern().is_match(p.expose()))
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(delimiter) = self.delimiter() {
            validate_delimiter("summary.delimiter", delimiter)?;
        }
        if let Some(outbox) = self.outbox() {
            validate_path("delivery.outbox", outbox)?;
        }
        Ok(())
    }
}
