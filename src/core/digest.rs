use crate::core::aggregate::{SubmissionIndex, TaskMap};
use crate::domain::model::{Attachment, Digest, Roster, Sender, Student};
use crate::domain::ports::Dispatcher;
use crate::utils::error::{GradiatorError, Result};
use chrono::{DateTime, Utc};

/// Batch-wide parts of every digest.
#[derive(Debug, Clone)]
pub struct DigestTemplate {
    pub from: Sender,
    pub header: String,
    pub subject: String,
    /// Logical dispatch time of the whole batch.
    pub date: DateTime<Utc>,
}

/// Renders the body text for one student's tasks, in task name order.
pub fn render_body(header: &str, tasks: &TaskMap<'_>) -> String {
    let mut body = header.to_string();

    for (task_name, file) in tasks {
        body.push_str("\n\n");
        body.push_str(task_name);
        body.push('\n');
        body.push_str(&"#".repeat(task_name.chars().count()));
        body.push_str("\n\n");

        for topic in file.topics() {
            body.push_str(&topic.name);
            body.push_str(":\n");
            for line in &topic.lines {
                body.push_str("  ");
                body.push_str(line);
                body.push('\n');
            }
        }
    }

    body
}

/// Reads every file listed under `datei` in any of the tasks.
pub fn collect_attachments(tasks: &TaskMap<'_>) -> Result<Vec<Attachment>> {
    let mut attachments = Vec::new();

    for file in tasks.values() {
        for (filename, path) in file.attachments() {
            let content = std::fs::read(&path)
                .map_err(|source| GradiatorError::Attachment { path, source })?;
            tracing::debug!("Attaching {} ({} bytes)", filename, content.len());
            attachments.push(Attachment { filename, content });
        }
    }

    Ok(attachments)
}

pub fn compose_digest(
    template: &DigestTemplate,
    student: &Student,
    tasks: &TaskMap<'_>,
) -> Result<Digest> {
    Ok(Digest {
        from: template.from.clone(),
        to_name: student.display_name(),
        to_address: student.mail_address.clone(),
        date: template.date,
        subject: template.subject.clone(),
        body: render_body(&template.header, tasks),
        attachments: collect_attachments(tasks)?,
    })
}

/// Composes and hands over one digest per student in the index.
///
/// The first failing student aborts the batch; already dispatched digests
/// are not rolled back.
pub fn send_digests(
    index: &SubmissionIndex<'_>,
    roster: &Roster,
    template: &DigestTemplate,
    dispatcher: &mut dyn Dispatcher,
) -> Result<usize> {
    let mut sent = 0;

    for (nick, tasks) in index.iter() {
        let student = roster
            .get(nick)
            .ok_or_else(|| GradiatorError::UnknownStudent {
                nick: nick.to_string(),
            })?;

        let digest = compose_digest(template, student, tasks)?;
        dispatcher.dispatch(nick, &digest)?;
        sent += 1;
    }

    dispatcher.finish()?;
    tracing::info!("Dispatched {} digests", sent);
    Ok(sent)
}
