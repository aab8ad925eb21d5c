use crate::core::aggregate::SubmissionIndex;
use crate::domain::model::{Points, Roster, SummaryRow};
use crate::utils::error::{GradiatorError, Result};

pub const DEFAULT_DELIMITER: char = ';';

const HEADER_NICK: &str = "Kürzel";
const HEADER_NAME: &str = "Vorname Nachname";
const HEADER_ACHIEVED: &str = "Punktzahl erreicht";
const HEADER_TOTAL: &str = "Punktzahl möglich";

/// Sums every student's points over all of their tasks.
///
/// Rows come back sorted by last name (plain string order); students with
/// the same last name keep nick order.
pub fn summarize(index: &SubmissionIndex<'_>, roster: &Roster) -> Result<Vec<SummaryRow>> {
    let mut rows = Vec::with_capacity(index.len());

    for (nick, tasks) in index.iter() {
        let student = roster
            .get(nick)
            .ok_or_else(|| GradiatorError::UnknownStudent {
                nick: nick.to_string(),
            })?;

        let mut sum = Points::default();
        for file in tasks.values() {
            sum = sum.checked_add(file.points()?).ok_or_else(|| {
                GradiatorError::PointsOverflow {
                    nick: nick.to_string(),
                    path: file.path().to_path_buf(),
                }
            })?;
        }

        rows.push(SummaryRow {
            nick: nick.to_string(),
            first_name: student.first_name.clone(),
            last_name: student.last_name.clone(),
            achieved: sum.achieved,
            total: sum.total,
        });
    }

    rows.sort_by(|a, b| a.last_name.cmp(&b.last_name));
    Ok(rows)
}

pub fn render_table(rows: &[SummaryRow], delimiter: char) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(format!(
        "{nick}{d}\"{name}\"{d}{achieved}{d}{total}",
        nick = HEADER_NICK,
        name = HEADER_NAME,
        achieved = HEADER_ACHIEVED,
        total = HEADER_TOTAL,
        d = delimiter
    ));

    for row in rows {
        lines.push(format!(
            "{nick}{d}\"{first} {last}\"{d}{achieved}{d}{total}",
            nick = row.nick,
            first = row.first_name,
            last = row.last_name,
            achieved = row.achieved,
            total = row.total,
            d = delimiter
        ));
    }

    let mut table = lines.join("\n");
    table.push('\n');
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::{aggregate, DuplicatePolicy};
    use crate::core::grade_file::GradeFile;
    use crate::domain::model::Student;
    use rust_decimal::Decimal;

    fn grade(path: &str, students: &str, points: &str) -> GradeFile {
        GradeFile::from_str_at(
            &format!("Studenten:\n {}\nPunktzahl:\n {}\n", students, points),
            path,
        )
        .unwrap()
    }

    fn student(first: &str, last: &str) -> Student {
        Student {
            first_name: first.to_string(),
            last_name: last.to_string(),
            mail_address: format!("{}@uni.example", first.to_lowercase()),
        }
    }

    fn roster() -> Roster {
        let mut roster = Roster::new();
        roster.insert("alice", student("Alice", "Zeller"));
        roster.insert("bob", student("Bob", "Albers"));
        roster.insert("carol", student("Carol", "Meier"));
        roster
    }

    #[test]
    fn test_sums_are_exact_decimals() {
        let files = vec![
            grade("task_1.grade", "alice", "7.5/10"),
            grade("task_2.grade", "alice", "3/5"),
        ];
        let index = aggregate(&files, DuplicatePolicy::Overwrite).unwrap();

        let rows = summarize(&index, &roster()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].achieved, Decimal::new(105, 1));
        assert_eq!(rows[0].total, Decimal::new(15, 0));
        assert_eq!(rows[0].achieved.to_string(), "10.5");
        assert_eq!(rows[0].total.to_string(), "15");
    }

    #[test]
    fn test_overflowing_sum_is_an_error() {
        let huge = "79228162514264337593543950335/79228162514264337593543950335";
        let files = vec![
            grade("task_1.grade", "alice", huge),
            grade("task_2.grade", "alice", huge),
        ];
        let index = aggregate(&files, DuplicatePolicy::Overwrite).unwrap();

        let err = summarize(&index, &roster()).unwrap_err();

        match err {
            GradiatorError::PointsOverflow { ref nick, ref path } => {
                assert_eq!(nick, "alice");
                assert_eq!(path, std::path::Path::new("task_2.grade"));
            }
            ref other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_many_small_awards_do_not_drift() {
        let files: Vec<GradeFile> = (0..10)
            .map(|i| grade(&format!("task_{}.grade", i), "bob", "0.1/0.3"))
            .collect();
        let index = aggregate(&files, DuplicatePolicy::Overwrite).unwrap();

        let rows = summarize(&index, &roster()).unwrap();

        assert_eq!(rows[0].achieved.to_string(), "1.0");
        assert_eq!(rows[0].total.to_string(), "3.0");
    }

    #[test]
    fn test_rows_sorted_by_last_name() {
        let files = vec![
            grade("task_1.grade", "alice, bob, carol", "1/1"),
            grade("task_2.grade", "carol", "2/2"),
        ];
        let index = aggregate(&files, DuplicatePolicy::Overwrite).unwrap();

        let rows = summarize(&index, &roster()).unwrap();

        let last_names: Vec<&str> = rows.iter().map(|r| r.last_name.as_str()).collect();
        assert_eq!(last_names, vec!["Albers", "Meier", "Zeller"]);
        assert_eq!(rows[1].achieved, Decimal::new(3, 0));
    }

    #[test]
    fn test_unknown_student_fails() {
        let files = vec![grade("task_1.grade", "mallory", "1/1")];
        let index = aggregate(&files, DuplicatePolicy::Overwrite).unwrap();

        let err = summarize(&index, &roster()).unwrap_err();
        assert!(matches!(err, GradiatorError::UnknownStudent { ref nick } if nick == "mallory"));
    }

    #[test]
    fn test_render_table() {
        let rows = vec![SummaryRow {
            nick: "bob".to_string(),
            first_name: "Bob".to_string(),
            last_name: "Albers".to_string(),
            achieved: Decimal::new(105, 1),
            total: Decimal::new(15, 0),
        }];

        assert_eq!(
            render_table(&rows, DEFAULT_DELIMITER),
            "Kürzel;\"Vorname Nachname\";Punktzahl erreicht;Punktzahl möglich\nbob;\"Bob Albers\";10.5;15\n"
        );
        assert!(render_table(&rows, '\t').contains("bob\t\"Bob Albers\"\t10.5\t15"));
    }
}
