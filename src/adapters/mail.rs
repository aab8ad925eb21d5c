use crate::domain::model::{Digest, Sender};
use crate::utils::error::{GradiatorError, Result};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::{Address, Message};
use std::time::SystemTime;

const ATTACHMENT_CONTENT_TYPE: &str = "application/octet-stream";

pub fn mailbox(name: &str, address: &str) -> Result<Mailbox> {
    let address: Address = address.trim().parse()?;
    let name = Some(name.to_string()).filter(|n| !n.trim().is_empty());
    Ok(Mailbox::new(name, address))
}

pub fn sender_mailbox(sender: &Sender) -> Result<Mailbox> {
    mailbox(&sender.name, &sender.address)
}

/// Turns a composed digest into a MIME message: plain text body first,
/// then one part per attachment.
pub fn build_message(digest: &Digest) -> Result<Message> {
    let content_type =
        ContentType::parse(ATTACHMENT_CONTENT_TYPE).map_err(|e| GradiatorError::ConfigError {
            message: format!("invalid attachment content type: {}", e),
        })?;

    let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(digest.body.clone()));
    for attachment in &digest.attachments {
        parts = parts.singlepart(
            Attachment::new(attachment.filename.clone())
                .body(attachment.content.clone(), content_type.clone()),
        );
    }

    let message = Message::builder()
        .from(sender_mailbox(&digest.from)?)
        .to(mailbox(&digest.to_name, &digest.to_address)?)
        .date(SystemTime::from(digest.date))
        .subject(digest.subject.clone())
        .multipart(parts)?;

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Attachment as DigestAttachment;
    use chrono::{TimeZone, Utc};

    fn digest() -> Digest {
        Digest {
            from: Sender {
                name: "Tutor Team".to_string(),
                address: "tutor@uni.example".to_string(),
            },
            to_name: "Alice Zeller".to_string(),
            to_address: "alice@uni.example".to_string(),
            date: Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap(),
            subject: "Ergebnisse".to_string(),
            body: "Hallo Alice".to_string(),
            attachments: vec![DigestAttachment {
                filename: "feedback.txt".to_string(),
                content: b"notes".to_vec(),
            }],
        }
    }

    #[test]
    fn test_build_message_headers_and_parts() {
        let message = build_message(&digest()).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Tutor Team"));
        assert!(raw.contains("<tutor@uni.example>"));
        assert!(raw.contains("Alice Zeller"));
        assert!(raw.contains("<alice@uni.example>"));
        assert!(raw.contains("Subject: Ergebnisse"));
        assert!(raw.contains("Date: Mon, 19 Oct 2026 12:00:00"));
        assert!(raw.contains("Hallo Alice"));
        assert!(raw.contains("filename=\"feedback.txt\""));
        assert!(raw.contains("application/octet-stream"));

        let recipients = message.envelope().to();
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].to_string(), "alice@uni.example");
    }

    #[test]
    fn test_invalid_address_is_rejected() {
        let mut digest = digest();
        digest.to_address = "not an address".to_string();
        assert!(matches!(
            build_message(&digest),
            Err(GradiatorError::AddressError(_))
        ));
    }
}
