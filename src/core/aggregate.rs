use crate::core::grade_file::GradeFile;
use crate::utils::error::{GradiatorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// What to do when two grade files assign the same task to the same student.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Later file replaces the earlier one, with a warning.
    #[default]
    Overwrite,
    /// Earlier file is kept, with a warning.
    KeepFirst,
    /// Abort the aggregation.
    Fail,
}

/// Tasks of one student, ordered by task name.
pub type TaskMap<'a> = BTreeMap<String, &'a GradeFile>;

/// nick -> task name -> grade file
#[derive(Debug, Default)]
pub struct SubmissionIndex<'a> {
    students: BTreeMap<String, TaskMap<'a>>,
}

impl<'a> SubmissionIndex<'a> {
    pub fn get(&self, nick: &str) -> Option<&TaskMap<'a>> {
        self.students.get(nick)
    }

    pub fn task(&self, nick: &str, task: &str) -> Option<&'a GradeFile> {
        self.students.get(nick)?.get(task).copied()
    }

    pub fn nicks(&self) -> impl Iterator<Item = &str> {
        self.students.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TaskMap<'a>)> {
        self.students
            .iter()
            .map(|(nick, tasks)| (nick.as_str(), tasks))
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

/// Builds the per-student view of all crawled grade files.
///
/// Every file must name its students and carry readable points; the first
/// file that does not aborts the whole aggregation.
pub fn aggregate<'a, I>(files: I, policy: DuplicatePolicy) -> Result<SubmissionIndex<'a>>
where
    I: IntoIterator<Item = &'a GradeFile>,
{
    let mut index = SubmissionIndex::default();
    let mut file_count = 0usize;

    for file in files {
        file_count += 1;
        let fields = file.students().and_then(|nicks| {
            file.points()?;
            Ok((nicks, file.task()?))
        });
        let (nicks, task) = match fields {
            Ok(fields) => fields,
            Err(e) => {
                tracing::error!("Cannot aggregate {}", file.path().display());
                return Err(e);
            }
        };

        for nick in nicks {
            let tasks = index.students.entry(nick.clone()).or_default();
            match tasks.entry(task.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(file);
                }
                Entry::Occupied(mut slot) => {
                    let previous = *slot.get();
                    match policy {
                        DuplicatePolicy::Overwrite => {
                            tracing::warn!(
                                "Task '{}' of '{}' graded twice, {} replaces {}",
                                task,
                                nick,
                                file.path().display(),
                                previous.path().display()
                            );
                            slot.insert(file);
                        }
                        DuplicatePolicy::KeepFirst => {
                            tracing::warn!(
                                "Task '{}' of '{}' graded twice, ignoring {} in favour of {}",
                                task,
                                nick,
                                file.path().display(),
                                previous.path().display()
                            );
                        }
                        DuplicatePolicy::Fail => {
                            tracing::error!("Cannot aggregate {}", file.path().display());
                            return Err(GradiatorError::DuplicateAssignment {
                                nick,
                                task,
                                first: previous.path().to_path_buf(),
                                second: file.path().to_path_buf(),
                            });
                        }
                    }
                }
            }
        }
    }

    tracing::debug!(
        "Aggregated {} grade files for {} students",
        file_count,
        index.len()
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn grade(path: &str, students: &str, points: &str) -> GradeFile {
        GradeFile::from_str_at(
            &format!("Studenten:\n {}\nPunktzahl:\n {}\n", students, points),
            path,
        )
        .unwrap()
    }

    #[test]
    fn test_group_file_is_indexed_for_each_student() {
        let file = grade("alice_bob.grade", "alice, bob", "7.5/10");
        let files = vec![file];

        let index = aggregate(&files, DuplicatePolicy::Overwrite).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.task("alice", "alice bob"), Some(&files[0]));
        assert_eq!(index.task("bob", "alice bob"), Some(&files[0]));
        let points = index.task("alice", "alice bob").unwrap().points().unwrap();
        assert_eq!(points.achieved, Decimal::new(75, 1));
        assert_eq!(points.total, Decimal::new(10, 0));
    }

    #[test]
    fn test_last_duplicate_wins_by_default() {
        let files = vec![
            grade("a/task_1.grade", "alice", "1/10"),
            grade("b/task_1.grade", "alice", "9/10"),
        ];

        let index = aggregate(&files, DuplicatePolicy::default()).unwrap();

        assert_eq!(index.get("alice").unwrap().len(), 1);
        assert_eq!(index.task("alice", "task 1"), Some(&files[1]));
    }

    #[test]
    fn test_keep_first_policy() {
        let files = vec![
            grade("a/task_1.grade", "alice", "1/10"),
            grade("b/task_1.grade", "alice, bob", "9/10"),
        ];

        let index = aggregate(&files, DuplicatePolicy::KeepFirst).unwrap();

        assert_eq!(index.task("alice", "task 1"), Some(&files[0]));
        assert_eq!(index.task("bob", "task 1"), Some(&files[1]));
    }

    #[test]
    fn test_fail_policy() {
        let files = vec![
            grade("a/task_1.grade", "alice", "1/10"),
            grade("b/task_1.grade", "alice", "9/10"),
        ];

        let err = aggregate(&files, DuplicatePolicy::Fail).unwrap_err();
        match err {
            GradiatorError::DuplicateAssignment {
                nick,
                task,
                first,
                second,
            } => {
                assert_eq!(nick, "alice");
                assert_eq!(task, "task 1");
                assert_eq!(first, std::path::Path::new("a/task_1.grade"));
                assert_eq!(second, std::path::Path::new("b/task_1.grade"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_students_fails_whole_batch() {
        let files = vec![
            grade("task_1.grade", "alice", "1/10"),
            GradeFile::from_str_at("Punktzahl:\n 3/5\n", "broken.grade").unwrap(),
            grade("task_2.grade", "bob", "1/10"),
        ];

        let err = aggregate(&files, DuplicatePolicy::Overwrite).unwrap_err();
        assert!(matches!(err, GradiatorError::FieldNotFound { .. }));
        assert_eq!(err.grade_file(), Some(std::path::Path::new("broken.grade")));
    }

    #[test]
    fn test_missing_points_fails_whole_batch() {
        let files = vec![
            grade("task_1.grade", "alice", "1/10"),
            GradeFile::from_str_at("Studenten:\n bob\n", "no_points.grade").unwrap(),
        ];

        let err = aggregate(&files, DuplicatePolicy::Overwrite).unwrap_err();
        assert!(matches!(
            err,
            GradiatorError::FieldNotFound { ref field, .. } if field == "Punktzahl"
        ));
    }

    #[test]
    fn test_policy_names_in_config() {
        #[derive(Deserialize)]
        struct Wrapper {
            duplicates: DuplicatePolicy,
        }

        let parsed: Wrapper = toml::from_str("duplicates = \"keep-first\"").unwrap();
        assert_eq!(parsed.duplicates, DuplicatePolicy::KeepFirst);
    }
}
