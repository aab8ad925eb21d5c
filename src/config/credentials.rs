use crate::domain::model::Sender;
use crate::utils::error::{GradiatorError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_range, Validate};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::Path;
use zeroize::Zeroizing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportProtocol {
    /// TLS from the first byte (`ssl` / `tls`).
    ImplicitTls,
    /// Plain connection upgraded with STARTTLS.
    StartTls,
}

impl std::str::FromStr for TransportProtocol {
    type Err = GradiatorError;

    fn from_str(tag: &str) -> Result<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "ssl" | "tls" => Ok(TransportProtocol::ImplicitTls),
            "starttls" => Ok(TransportProtocol::StartTls),
            other => Err(GradiatorError::InvalidConfigValueError {
                field: "protocol".to_string(),
                value: other.to_string(),
                reason: "expected 'ssl', 'tls' or 'starttls'".to_string(),
            }),
        }
    }
}

/// SMTP password. Wiped from memory when dropped, never printed.
#[derive(Clone)]
pub struct TransportSecret(Zeroizing<String>);

impl TransportSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::str::FromStr for TransportSecret {
    type Err = std::convert::Infallible;

    fn from_str(secret: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::new(secret))
    }
}

impl<'de> Deserialize<'de> for TransportSecret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

impl fmt::Debug for TransportSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TransportSecret(***)")
    }
}

/// Contents of a credentials file: one value per line in this order.
///
/// ```text
/// Tutor Team
/// tutor@uni.example
/// tutor
/// smtp.uni.example
/// 587
/// starttls
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailCredentials {
    pub sender_name: String,
    pub sender_address: String,
    pub username: String,
    pub host: String,
    pub port: u16,
    pub protocol: TransportProtocol,
}

impl MailCredentials {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| GradiatorError::FileError {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut lines = content.lines().map(str::trim);
        let mut next = |field: &str| -> Result<String> {
            lines
                .next()
                .map(str::to_string)
                .ok_or_else(|| GradiatorError::MissingConfigError {
                    field: format!("credentials.{}", field),
                })
        };

        let sender_name = next("sender_name")?;
        let sender_address = next("sender_address")?;
        let username = next("username")?;
        let host = next("host")?;
        let port_text = next("port")?;
        let protocol = next("protocol")?.parse::<TransportProtocol>()?;

        let port: u32 = port_text
            .parse()
            .map_err(|_| GradiatorError::InvalidConfigValueError {
                field: "credentials.port".to_string(),
                value: port_text.clone(),
                reason: "not a number".to_string(),
            })?;
        validate_range("credentials.port", port, 1, u32::from(u16::MAX))?;

        let credentials = Self {
            sender_name,
            sender_address,
            username,
            host,
            port: port as u16,
            protocol,
        };
        credentials.validate()?;
        Ok(credentials)
    }

    pub fn sender(&self) -> Sender {
        Sender {
            name: self.sender_name.clone(),
            address: self.sender_address.clone(),
        }
    }
}

impl Validate for MailCredentials {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("credentials.sender_address", &self.sender_address)?;
        validate_non_empty_string("credentials.username", &self.username)?;
        validate_non_empty_string("credentials.host", &self.host)?;
        Ok(())
    }
}
