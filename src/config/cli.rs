use crate::config::credentials::TransportSecret;
use crate::config::settings::{DeliveryTargetKind, SettingsOverrides};
use crate::core::aggregate::DuplicatePolicy;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "gradiator", version)]
#[command(about = "Collects tutor grade files, prints point tables and mails feedback digests")]
#[command(after_help = "Commands run in the given order and share one roster and grade file set.")]
pub struct CliConfig {
    /// TOML file with [aggregation], [summary] and [delivery] sections
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, help = "Send via SMTP or write .eml files")]
    pub delivery: Option<DeliveryTargetKind>,

    #[arg(long, help = "Directory for dry-run messages")]
    pub outbox: Option<String>,

    #[arg(long, value_enum, help = "How to treat a task graded twice for one student")]
    pub duplicates: Option<DuplicatePolicy>,

    #[arg(long, help = "Field delimiter of the summary table")]
    pub delimiter: Option<char>,

    #[arg(long, env = "GRADIATOR_SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<TransportSecret>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub log_json: bool,

    /// ingest-roster CSV | crawl-directory DIR | print-summary-table | print-roster-listing |
    /// send-digests CREDENTIALS HEADER SUBJECT
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    pub commands: Vec<String>,
}

impl CliConfig {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            duplicates: self.duplicates,
            delimiter: self.delimiter,
            delivery: self.delivery,
            outbox: self.outbox.clone(),
            password: self.smtp_password.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags_and_commands() {
        let config = CliConfig::try_parse_from([
            "gradiator",
            "--duplicates",
            "keep-first",
            "--delimiter",
            ",",
            "-v",
            "ingest-roster",
            "students.csv",
            "print-summary-table",
        ])
        .unwrap();

        assert!(config.verbose);
        assert_eq!(config.commands, vec!["ingest-roster", "students.csv", "print-summary-table"]);

        let overrides = config.overrides();
        assert_eq!(overrides.duplicates, Some(DuplicatePolicy::KeepFirst));
        assert_eq!(overrides.delimiter, Some(','));
        assert!(overrides.delivery.is_none());
    }

    #[test]
    fn test_options_before_commands() {
        let config = CliConfig::try_parse_from([
            "gradiator",
            "--delivery",
            "dry-run",
            "send-digests",
            "creds.txt",
            "header.txt",
            "Blatt 2 (Korrektur)",
        ])
        .unwrap();

        assert_eq!(config.delivery, Some(DeliveryTargetKind::DryRun));
        assert_eq!(config.commands.last().unwrap(), "Blatt 2 (Korrektur)");
    }

    #[test]
    fn test_password_is_kept_out_of_debug_output() {
        let config = CliConfig::try_parse_from([
            "gradiator",
            "--delivery",
            "smtp",
            "--smtp-password",
            "hunter2",
            "print-summary-table",
        ])
        .unwrap();

        let overrides = config.overrides();
        assert_eq!(
            overrides.password.as_ref().map(TransportSecret::expose),
            Some("hunter2")
        );
        assert!(!format!("{:?}", config).contains("hunter2"));
        assert!(!format!("{:?}", overrides).contains("hunter2"));
    }

    #[test]
    fn test_commands_are_required() {
        assert!(CliConfig::try_parse_from(["gradiator"]).is_err());
    }
}
