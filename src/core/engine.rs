use crate::adapters::outbox::OutboxDispatcher;
use crate::adapters::roster;
use crate::adapters::smtp::SmtpDispatcher;
use crate::config::command::Command;
use crate::config::credentials::MailCredentials;
use crate::config::settings::{DeliveryTarget, Settings};
use crate::core::aggregate::aggregate;
use crate::core::crawler;
use crate::core::digest::{self, DigestTemplate};
use crate::core::grade_file::GradeFile;
use crate::core::summary;
use crate::domain::model::Roster;
use crate::domain::ports::Dispatcher;
use crate::utils::error::{GradiatorError, Result};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::Path;

/// Runs a command sequence against one shared roster and grade file set.
pub struct GradeEngine {
    settings: Settings,
    roster: Roster,
    grade_files: Vec<GradeFile>,
    dispatch_time: DateTime<Utc>,
}

impl GradeEngine {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            roster: Roster::new(),
            grade_files: Vec::new(),
            dispatch_time: Utc::now(),
        }
    }

    pub fn with_dispatch_time(mut self, dispatch_time: DateTime<Utc>) -> Self {
        self.dispatch_time = dispatch_time;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn grade_files(&self) -> &[GradeFile] {
        &self.grade_files
    }

    pub fn run<W: Write>(&mut self, commands: &[Command], out: &mut W) -> Result<()> {
        tracing::info!("Running {} command(s)", commands.len());

        for command in commands {
            tracing::debug!("Executing {}", command.name());
            self.execute(command, out)?;
        }

        out.flush()?;
        Ok(())
    }

    pub fn execute<W: Write>(&mut self, command: &Command, out: &mut W) -> Result<()> {
        match command {
            Command::IngestRoster(path) => {
                self.ingest_roster(path)?;
            }
            Command::CrawlDirectory(path) => {
                self.crawl_directory(path)?;
            }
            Command::PrintSummaryTable => {
                out.write_all(self.summary_table()?.as_bytes())?;
            }
            Command::PrintRosterListing => {
                out.write_all(self.roster_listing().as_bytes())?;
            }
            Command::SendDigests {
                credentials,
                header,
                subject,
            } => {
                self.send_digests(credentials, header, subject)?;
            }
        }
        Ok(())
    }

    pub fn ingest_roster(&mut self, path: &Path) -> Result<usize> {
        roster::extend_from_file(&mut self.roster, path)
    }

    /// Appends every grade file below `path`. Crawling the same directory
    /// twice yields duplicates, which aggregation then resolves.
    pub fn crawl_directory(&mut self, path: &Path) -> Result<usize> {
        let found = crawler::crawl(path)?;
        let count = found.len();
        self.grade_files.extend(found);
        tracing::info!("Found {} grade files below {}", count, path.display());
        Ok(count)
    }

    pub fn summary_table(&self) -> Result<String> {
        let index = aggregate(&self.grade_files, self.settings.duplicates)?;
        let rows = summary::summarize(&index, &self.roster)?;
        Ok(summary::render_table(&rows, self.settings.delimiter))
    }

    pub fn roster_listing(&self) -> String {
        roster::render_listing(&self.roster)
    }

    /// Checks the grade data against the roster before any transport is
    /// opened, so a data error leaves no SMTP session and no outbox behind.
    pub fn send_digests(&self, credentials: &Path, header: &Path, subject: &str) -> Result<usize> {
        let index = aggregate(&self.grade_files, self.settings.duplicates)?;
        if let Some(nick) = index.nicks().find(|nick| self.roster.get(nick).is_none()) {
            return Err(GradiatorError::UnknownStudent {
                nick: nick.to_string(),
            });
        }

        let credentials = MailCredentials::from_file(credentials)?;
        let template = self.template(&credentials, header, subject)?;

        let mut dispatcher: Box<dyn Dispatcher> = match &self.settings.delivery {
            DeliveryTarget::Smtp { secret } => {
                Box::new(SmtpDispatcher::connect(&credentials, secret)?)
            }
            DeliveryTarget::DryRun { outbox } => Box::new(OutboxDispatcher::new(outbox)?),
        };

        digest::send_digests(&index, &self.roster, &template, dispatcher.as_mut())
    }

    /// Aggregates and dispatches with a caller-supplied transport.
    pub fn send_digests_with(
        &self,
        template: &DigestTemplate,
        dispatcher: &mut dyn Dispatcher,
    ) -> Result<usize> {
        let index = aggregate(&self.grade_files, self.settings.duplicates)?;
        digest::send_digests(&index, &self.roster, template, dispatcher)
    }

    fn template(
        &self,
        credentials: &MailCredentials,
        header: &Path,
        subject: &str,
    ) -> Result<DigestTemplate> {
        let header = std::fs::read_to_string(header).map_err(|source| GradiatorError::FileError {
            path: header.to_path_buf(),
            source,
        })?;

        Ok(DigestTemplate {
            from: credentials.sender(),
            header,
            subject: subject.to_string(),
            date: self.dispatch_time,
        })
    }
}
