use crate::utils::error::{GradiatorError, Result};
use std::path::PathBuf;

/// One step of a command sequence. Steps share roster and grade files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    IngestRoster(PathBuf),
    CrawlDirectory(PathBuf),
    PrintSummaryTable,
    PrintRosterListing,
    SendDigests {
        credentials: PathBuf,
        header: PathBuf,
        subject: String,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::IngestRoster(_) => "ingest-roster",
            Command::CrawlDirectory(_) => "crawl-directory",
            Command::PrintSummaryTable => "print-summary-table",
            Command::PrintRosterListing => "print-roster-listing",
            Command::SendDigests { .. } => "send-digests",
        }
    }
}

// (name, legacy alias, arguments)
const COMMANDS: &[(&str, &str, &[&str])] = &[
    ("ingest-roster", "read_student_map", &["CSV"]),
    ("crawl-directory", "crawl_grades", &["DIR"]),
    ("print-summary-table", "print_sum_csv", &[]),
    ("print-roster-listing", "pretty_student_map", &[]),
    ("send-digests", "send_mails", &["CREDENTIALS", "HEADER", "SUBJECT"]),
];

pub fn usage() -> String {
    COMMANDS
        .iter()
        .map(|(name, alias, args)| {
            let mut line = format!("  {}", name);
            for arg in args.iter() {
                line.push(' ');
                line.push_str(arg);
            }
            format!("{:40} (alias: {})", line, alias)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses the whole sequence up front so a typo in a late step fails
/// before any earlier step has side effects.
pub fn parse_sequence<I, S>(args: I) -> Result<Vec<Command>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
    let mut commands = Vec::new();
    let mut position = 0;

    while position < args.len() {
        let word = &args[position];
        let (name, _, params) = COMMANDS
            .iter()
            .find(|(name, alias, _)| word == name || word == alias)
            .ok_or_else(|| GradiatorError::CommandError {
                message: format!("unknown command '{}'", word),
            })?;

        let start = position + 1;
        let end = start + params.len();
        if end > args.len() {
            return Err(GradiatorError::CommandError {
                message: format!(
                    "'{}' expects {} argument(s): {}",
                    word,
                    params.len(),
                    params.join(" ")
                ),
            });
        }
        let operands = &args[start..end];

        let command = match *name {
            "ingest-roster" => Command::IngestRoster(PathBuf::from(&operands[0])),
            "crawl-directory" => Command::CrawlDirectory(PathBuf::from(&operands[0])),
            "print-summary-table" => Command::PrintSummaryTable,
            "print-roster-listing" => Command::PrintRosterListing,
            _ => Command::SendDigests {
                credentials: PathBuf::from(&operands[0]),
                header: PathBuf::from(&operands[1]),
                subject: operands[2].clone(),
            },
        };
        commands.push(command);
        position = end;
    }

    if commands.is_empty() {
        return Err(GradiatorError::CommandError {
            message: "no command given".to_string(),
        });
    }

    Ok(commands)
}
