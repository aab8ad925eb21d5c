use crate::adapters::mail::build_message;
use crate::domain::model::Digest;
use crate::domain::ports::Dispatcher;
use crate::utils::error::{GradiatorError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTBOX: &str = "mails";

/// Dry-run delivery: every digest becomes `<nick>.eml` in the outbox directory.
#[derive(Debug, Clone)]
pub struct OutboxDispatcher {
    base_path: PathBuf,
    written: usize,
}

impl OutboxDispatcher {
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).map_err(|source| GradiatorError::FileError {
            path: base_path.clone(),
            source,
        })?;

        Ok(Self {
            base_path,
            written: 0,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// `<outbox>/<nick>.eml`; the nick must stay a single file name.
    pub fn message_path(&self, nick: &str) -> Result<PathBuf> {
        let reason = if nick.is_empty() {
            Some("empty nick")
        } else if nick == "." || nick == ".." {
            Some("nick is a relative directory")
        } else if nick.chars().any(|c| std::path::is_separator(c) || c == '/' || c == '\\') {
            Some("nick contains a path separator")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(GradiatorError::InvalidNick {
                nick: nick.to_string(),
                reason: reason.to_string(),
            }),
            None => Ok(self.base_path.join(format!("{}.eml", nick))),
        }
    }
}

impl Dispatcher for OutboxDispatcher {
    fn dispatch(&mut self, nick: &str, digest: &Digest) -> Result<()> {
        let full_path = self.message_path(nick)?;
        let message = build_message(digest)?;

        fs::write(&full_path, message.formatted()).map_err(|source| GradiatorError::FileError {
            path: full_path.clone(),
            source,
        })?;
        tracing::debug!("Wrote {}", full_path.display());
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        tracing::info!(
            "Dry run: {} messages written to {}",
            self.written,
            self.base_path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Sender;
    use chrono::Utc;
    use tempfile::TempDir;

    fn digest(body: &str) -> Digest {
        Digest {
            from: Sender {
                name: "Tutor".to_string(),
                address: "tutor@uni.example".to_string(),
            },
            to_name: "Bob Albers".to_string(),
            to_address: "bob@uni.example".to_string(),
            date: Utc::now(),
            subject: "Ergebnisse".to_string(),
            body: body.to_string(),
            attachments: Vec::new(),
        }
    }

    #[test]
    fn test_writes_one_file_per_nick() {
        let temp_dir = TempDir::new().unwrap();
        let outbox = temp_dir.path().join("mails");
        let mut dispatcher = OutboxDispatcher::new(&outbox).unwrap();

        dispatcher.dispatch("bob", &digest("Hallo Bob")).unwrap();
        dispatcher.finish().unwrap();

        let written = fs::read_to_string(outbox.join("bob.eml")).unwrap();
        assert!(written.contains("Subject: Ergebnisse"));
        assert!(written.contains("Hallo Bob"));
        assert_eq!(fs::read_dir(&outbox).unwrap().count(), 1);
    }

    #[test]
    fn test_nick_cannot_leave_outbox() {
        let temp_dir = TempDir::new().unwrap();
        let outbox = temp_dir.path().join("mails");
        let mut dispatcher = OutboxDispatcher::new(&outbox).unwrap();

        for nick in ["../escaped", "a/b", "a\\b", "..", ".", ""] {
            let err = dispatcher.dispatch(nick, &digest("Hallo")).unwrap_err();
            assert!(
                matches!(err, GradiatorError::InvalidNick { nick: ref n, .. } if n == nick),
                "nick {nick:?} was accepted"
            );
        }

        assert!(!temp_dir.path().join("escaped.eml").exists());
        assert_eq!(fs::read_dir(&outbox).unwrap().count(), 0);
        assert_eq!(
            dispatcher.message_path("bob").unwrap(),
            outbox.join("bob.eml")
        );
        assert_eq!(dispatcher.base_path(), outbox.as_path());
    }

    #[test]
    fn test_existing_outbox_is_reused() {
        let temp_dir = TempDir::new().unwrap();
        OutboxDispatcher::new(temp_dir.path()).unwrap();
        assert!(OutboxDispatcher::new(temp_dir.path()).is_ok());
    }
}
