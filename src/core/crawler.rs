use crate::core::grade_file::{GradeFile, GRADE_SUFFIX};
use crate::utils::error::Result;
use std::path::Path;
use walkdir::WalkDir;

/// Lazily walks a directory tree and parses every `*.grade` file on the way.
///
/// The iterator is one-shot; walk order is whatever the file system yields.
/// Callers that want the whole crawl to abort on the first malformed file
/// should collect into `Result<Vec<_>>` (see [`crawl`]).
pub struct GradeCrawler {
    walker: walkdir::IntoIter,
}

impl GradeCrawler {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        let base_dir = base_dir.as_ref();
        tracing::debug!("Crawling grade files below {}", base_dir.display());

        Self {
            walker: WalkDir::new(base_dir).follow_links(false).into_iter(),
        }
    }
}

impl Iterator for GradeCrawler {
    type Item = Result<GradeFile>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e.into())),
            };
            if entry.file_type().is_dir() {
                continue;
            }

            if entry.file_name().to_str().is_none() {
                tracing::warn!(
                    "Skipping {}: file name is not valid UTF-8",
                    entry.path().display()
                );
                continue;
            }
            if !is_grade_file(entry.path()) {
                continue;
            }
            // linked files count, linked directories are not descended into
            if entry.path_is_symlink() {
                if !entry.path().is_file() {
                    tracing::warn!(
                        "Skipping {}: link does not lead to a regular file",
                        entry.path().display()
                    );
                    continue;
                }
            } else if !entry.file_type().is_file() {
                tracing::warn!("Skipping {}: not a regular file", entry.path().display());
                continue;
            }

            tracing::trace!("Found grade file: {}", entry.path().display());
            let parsed = GradeFile::from_file(entry.path());
            if parsed.is_err() {
                tracing::error!("Failed to read grade file {}", entry.path().display());
            }
            return Some(parsed);
        }
    }
}

pub fn is_grade_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(GRADE_SUFFIX))
}

/// Crawls `base_dir` eagerly, aborting on the first unreadable or malformed file.
pub fn crawl(base_dir: impl AsRef<Path>) -> Result<Vec<GradeFile>> {
    let files = GradeCrawler::new(base_dir).collect::<Result<Vec<_>>>()?;
    tracing::debug!("Collected {} grade files", files.len());
    Ok(files)
}
