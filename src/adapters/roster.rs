use crate::domain::model::{Roster, Student};
use crate::utils::error::{GradiatorError, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const DELIMITER: u8 = b';';

// title;first name;last name;title2;nick;postal address;phone;mail;joined;status;comment
const FIELD_COUNT: usize = 11;
const FIRST_NAME: usize = 1;
const LAST_NAME: usize = 2;
const NICK: usize = 4;
const MAIL_ADDRESS: usize = 7;

pub fn extend_from_file(roster: &mut Roster, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| GradiatorError::FileError {
        path: path.to_path_buf(),
        source,
    })?;
    let added = extend_from_reader(roster, file, path)?;
    tracing::info!("Loaded {} students from {}", added, path.display());
    Ok(added)
}

/// Reads `;`-separated roster rows; the header row is skipped.
pub fn extend_from_reader<R: Read>(roster: &mut Roster, reader: R, source: &Path) -> Result<usize> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut added = 0;
    for record in csv_reader.byte_records() {
        let record = record?;
        let row = record.position().map(|p| p.line()).unwrap_or_default();

        if record.len() != FIELD_COUNT {
            return Err(GradiatorError::Roster {
                path: source.to_path_buf(),
                row,
                reason: format!("expected {} fields, found {}", FIELD_COUNT, record.len()),
            });
        }

        let field = |position: usize| decode(&record[position]).trim().to_string();
        let nick = field(NICK);
        if nick.is_empty() {
            return Err(GradiatorError::Roster {
                path: source.to_path_buf(),
                row,
                reason: "empty nick".to_string(),
            });
        }

        roster.insert(
            nick,
            Student {
                first_name: field(FIRST_NAME),
                last_name: field(LAST_NAME),
                mail_address: field(MAIL_ADDRESS),
            },
        );
        added += 1;
    }

    Ok(added)
}

/// UTF-8 when valid, otherwise ISO-8859-4, the code page of the roster export.
fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => encoding_rs::ISO_8859_4
            .decode_without_bom_handling(bytes)
            .0
            .into_owned(),
    }
}

/// One aligned line per student, sorted by display name.
pub fn render_listing(roster: &Roster) -> String {
    let mut lines: Vec<String> = roster
        .iter()
        .map(|(nick, student)| {
            format!(
                "{:35} {:12} {:15}",
                student.display_name(),
                nick,
                student.mail_address
            )
        })
        .collect();
    lines.sort();

    let mut listing = lines.join("\n");
    if !listing.is_empty() {
        listing.push('\n');
    }
    listing
}
