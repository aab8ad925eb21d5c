use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GradiatorError {
    #[error("{}:{line}: malformed line {content:?}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("{}: missing field '{field}'", .path.display())]
    FieldNotFound { path: PathBuf, field: String },

    #[error("{}: field '{field}' has invalid value {value:?}: {reason}", .path.display())]
    FieldFormat {
        path: PathBuf,
        field: String,
        value: String,
        reason: String,
    },

    #[error(
        "student '{nick}' is assigned task '{task}' twice ({} and {})",
        .first.display(),
        .second.display()
    )]
    DuplicateAssignment {
        nick: String,
        task: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("points of student '{nick}' overflow when adding {}", .path.display())]
    PointsOverflow { nick: String, path: PathBuf },

    #[error("student nick {nick:?} cannot name a message file: {reason}")]
    InvalidNick { nick: String, reason: String },

    #[error("student '{nick}' is not in the roster")]
    UnknownStudent { nick: String },

    #[error("{}: roster row {row}: {reason}", .path.display())]
    Roster {
        path: PathBuf,
        row: u64,
        reason: String,
    },

    #[error("cannot read attachment {}: {source}", .path.display())]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    FileError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SMTP transport error: {0}")]
    TransportError(#[from] lettre::transport::smtp::Error),

    #[error("SMTP session with {host} is already closed")]
    SessionClosed { host: String },

    #[error("Message composition error: {0}")]
    MessageError(#[from] lettre::error::Error),

    #[error("Invalid mail address: {0}")]
    AddressError(#[from] lettre::address::AddressError),

    #[error("Directory walk error: {0}")]
    WalkError(#[from] walkdir::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ({value:?}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Command error: {message}")]
    CommandError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Data,
    Configuration,
    Transport,
    System,
}

impl GradiatorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            GradiatorError::Parse { .. }
            | GradiatorError::FieldNotFound { .. }
            | GradiatorError::FieldFormat { .. }
            | GradiatorError::DuplicateAssignment { .. }
            | GradiatorError::UnknownStudent { .. }
            | GradiatorError::PointsOverflow { .. }
            | GradiatorError::InvalidNick { .. }
            | GradiatorError::Roster { .. }
            | GradiatorError::Attachment { .. }
            | GradiatorError::CsvError(_) => ErrorCategory::Data,
            GradiatorError::ConfigError { .. }
            | GradiatorError::MissingConfigError { .. }
            | GradiatorError::InvalidConfigValueError { .. }
            | GradiatorError::CommandError { .. }
            | GradiatorError::AddressError(_) => ErrorCategory::Configuration,
            GradiatorError::TransportError(_)
            | GradiatorError::SessionClosed { .. }
            | GradiatorError::MessageError(_) => ErrorCategory::Transport,
            GradiatorError::FileError { .. }
            | GradiatorError::WalkError(_)
            | GradiatorError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Data => 1,
            ErrorCategory::Configuration => 2,
            ErrorCategory::Transport => 3,
            ErrorCategory::System => 4,
        }
    }

    /// Offending grade file, when the error is tied to one.
    pub fn grade_file(&self) -> Option<&std::path::Path> {
        match self {
            GradiatorError::Parse { path, .. }
            | GradiatorError::FieldNotFound { path, .. }
            | GradiatorError::FieldFormat { path, .. }
            | GradiatorError::PointsOverflow { path, .. } => Some(path.as_path()),
            GradiatorError::DuplicateAssignment { second, .. } => Some(second.as_path()),
            _ => None,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            GradiatorError::TransportError(e) => format!("Mail delivery failed: {}", e),
            GradiatorError::WalkError(e) => match e.path() {
                Some(path) => format!("Cannot read directory {}: {}", path.display(), e),
                None => format!("Cannot walk directory tree: {}", e),
            },
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            GradiatorError::Parse { .. } => {
                "Topic lines must end with ':' and content lines must be indented"
            }
            GradiatorError::FieldNotFound { .. } => {
                "Every grade file needs a 'Studenten:' and a 'Punktzahl:' topic"
            }
            GradiatorError::FieldFormat { .. } => {
                "Points are written as 'achieved/total', students as 'nick1, nick2'"
            }
            GradiatorError::DuplicateAssignment { .. } => {
                "Remove one of the files or run with --duplicates overwrite"
            }
            GradiatorError::PointsOverflow { .. } => {
                "Check the 'Punktzahl:' values of this student for typos"
            }
            GradiatorError::InvalidNick { .. } => {
                "Nicks must not be empty or contain '/', '\\', '.' or '..'"
            }
            GradiatorError::UnknownStudent { .. } => {
                "Run ingest-roster with a roster containing this nick first"
            }
            GradiatorError::Roster { .. } | GradiatorError::CsvError(_) => {
                "Roster rows need 11 ';'-separated fields"
            }
            GradiatorError::Attachment { .. } => {
                "Check the file names listed under 'datei:' in the grade file"
            }
            GradiatorError::TransportError(_) | GradiatorError::SessionClosed { .. } => {
                "Check host, port, protocol and the SMTP password"
            }
            GradiatorError::AddressError(_) => "Check the sender and roster mail addresses",
            GradiatorError::ConfigError { .. }
            | GradiatorError::MissingConfigError { .. }
            | GradiatorError::InvalidConfigValueError { .. } => {
                "Check the configuration file and command line options"
            }
            GradiatorError::CommandError { .. } => "Run with --help to list the commands",
            _ => "Check file permissions and paths",
        }
    }
}

pub type Result<T> = std::result::Result<T, GradiatorError>;
