use crate::core::parser;
use crate::domain::model::{Points, Topic};
use crate::utils::error::{GradiatorError, Result};
use rust_decimal::Decimal;
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const GRADE_SUFFIX: &str = ".grade";

pub const STUDENTS_TOPIC: &str = "Studenten";
pub const POINTS_TOPIC: &str = "Punktzahl";
pub const ATTACHMENTS_TOPIC: &str = "datei";
pub const TASK_KEY: &str = "task";

/// One parsed grade file: its topics plus the task it grades.
#[derive(Debug, Clone)]
pub struct GradeFile {
    path: PathBuf,
    topics: Vec<Topic>,
    /// lowercase topic name -> index of its first occurrence
    index: HashMap<String, usize>,
    task_name: String,
}

impl PartialEq for GradeFile {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.topics == other.topics
    }
}

impl Eq for GradeFile {}

impl GradeFile {
    pub fn new(topics: Vec<Topic>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut index = HashMap::new();
        for (position, topic) in topics.iter().enumerate() {
            index.entry(topic.name.to_lowercase()).or_insert(position);
        }

        Self {
            task_name: task_name_from_path(&path),
            path,
            topics,
            index,
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| GradiatorError::FileError {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_str_at(&content, path)
    }

    pub fn from_str_at(content: &str, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let topics = parser::parse_str(content, path)?;
        Ok(Self::new(topics, path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    fn lookup(&self, name: &str) -> Option<&Topic> {
        self.index
            .get(&name.to_lowercase())
            .map(|&position| &self.topics[position])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    /// Lines of the first topic called `name`, ignoring case. `task` falls
    /// back to the task name derived from the file name.
    pub fn get(&self, name: &str) -> Result<Cow<'_, [String]>> {
        if let Some(topic) = self.lookup(name) {
            return Ok(Cow::Borrowed(topic.lines.as_slice()));
        }

        if name.eq_ignore_ascii_case(TASK_KEY) {
            return Ok(Cow::Owned(vec![self.task_name.clone()]));
        }

        Err(self.not_found(name))
    }

    pub fn task(&self) -> Result<String> {
        let lines = self.get(TASK_KEY)?;
        let first = self.first_line(TASK_KEY, &lines)?;
        Ok(first.to_string())
    }

    pub fn students(&self) -> Result<Vec<String>> {
        let lines = self.get(STUDENTS_TOPIC)?;
        let first = self.first_line(STUDENTS_TOPIC, &lines)?;

        let mut nicks = Vec::new();
        for token in first.split(',').map(str::trim) {
            if token.is_empty() {
                tracing::warn!(path = %self.path.display(), "Skipping empty student nick");
                continue;
            }
            nicks.push(token.to_string());
        }

        if nicks.is_empty() {
            return Err(GradiatorError::FieldFormat {
                path: self.path.clone(),
                field: STUDENTS_TOPIC.to_string(),
                value: first.to_string(),
                reason: "no student nick given".to_string(),
            });
        }

        Ok(nicks)
    }

    pub fn points(&self) -> Result<Points> {
        let lines = self.get(POINTS_TOPIC)?;
        let first = self.first_line(POINTS_TOPIC, &lines)?;

        let parts: Vec<&str> = first.split('/').map(str::trim).collect();
        let [achieved, total] = parts.as_slice() else {
            return Err(self.bad_points(first, "expected 'achieved/total'".to_string()));
        };

        let parse = |token: &str| {
            Decimal::from_str(token)
                .map_err(|e| self.bad_points(first, format!("'{}' is not a decimal: {}", token, e)))
        };

        Ok(Points::new(parse(*achieved)?, parse(*total)?))
    }

    /// Files listed under `datei`, resolved against this file's directory.
    pub fn attachments(&self) -> Vec<(String, PathBuf)> {
        let Some(topic) = self.lookup(ATTACHMENTS_TOPIC) else {
            return Vec::new();
        };

        let directory = self.directory();
        topic
            .lines
            .iter()
            .filter(|line| !line.is_empty())
            .map(|name| (name.clone(), directory.join(name)))
            .collect()
    }

    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    fn first_line<'a>(&self, field: &str, lines: &'a [String]) -> Result<&'a str> {
        lines
            .first()
            .map(String::as_str)
            .ok_or_else(|| GradiatorError::FieldFormat {
                path: self.path.clone(),
                field: field.to_string(),
                value: String::new(),
                reason: "topic has no content".to_string(),
            })
    }

    fn not_found(&self, field: &str) -> GradiatorError {
        GradiatorError::FieldNotFound {
            path: self.path.clone(),
            field: field.to_string(),
        }
    }

    fn bad_points(&self, value: &str, reason: String) -> GradiatorError {
        GradiatorError::FieldFormat {
            path: self.path.clone(),
            field: POINTS_TOPIC.to_string(),
            value: value.to_string(),
            reason,
        }
    }
}

/// `some_task.grade` -> `some task`
pub fn task_name_from_path(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    let stem = file_name.strip_suffix(GRADE_SUFFIX).unwrap_or(&*file_name);
    stem.replace('_', " ")
}
