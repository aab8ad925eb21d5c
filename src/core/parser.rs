use crate::domain::model::Topic;
use crate::utils::error::{GradiatorError, Result};
use std::path::Path;

enum LineKind<'a> {
    Opener(&'a str),
    Continuation(&'a str),
    Malformed,
}

fn classify(line: &str) -> LineKind<'_> {
    match line.chars().next() {
        None => LineKind::Continuation(""),
        Some(' ') => LineKind::Continuation(line[1..].trim_end()),
        Some('\t') => LineKind::Continuation(line.trim_end()),
        Some(c) if c.is_whitespace() => LineKind::Malformed,
        Some(_) => match line.trim_end().strip_suffix(':') {
            Some(name) => LineKind::Opener(name.trim()),
            None => LineKind::Malformed,
        },
    }
}

/// Splits grade file lines into topics.
///
/// Un-indented lines ending in `:` open a topic; indented or blank lines
/// belong to the most recent topic. Anything else, including content before
/// the first topic, is rejected with the 1-based line number.
pub fn parse_lines<I, S>(lines: I, path: &Path) -> Result<Vec<Topic>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut topics: Vec<Topic> = Vec::new();

    for (index, raw) in lines.into_iter().enumerate() {
        let raw = raw.as_ref();
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        match classify(line) {
            LineKind::Opener(name) => topics.push(Topic::new(name)),
            LineKind::Continuation(content) => match topics.last_mut() {
                Some(topic) => topic.lines.push(content.to_string()),
                None => {
                    return Err(GradiatorError::Parse {
                        path: path.to_path_buf(),
                        line: index + 1,
                        content: line.to_string(),
                    })
                }
            },
            LineKind::Malformed => {
                return Err(GradiatorError::Parse {
                    path: path.to_path_buf(),
                    line: index + 1,
                    content: line.to_string(),
                })
            }
        }
    }

    Ok(topics)
}

pub fn parse_str(content: &str, path: &Path) -> Result<Vec<Topic>> {
    parse_lines(content.lines(), path)
}
