//! Draft attachments: files queued for the next message.

use aichat_types::chat::Attachment;
use aichat_types::error::AttachmentError;
use uuid::Uuid;

use super::data_url::{encode_data_url, text_preview};

pub const MAX_FILE_SIZE_MB: u64 = 8;
pub const MAX_FILE_SIZE_BYTES: u64 = MAX_FILE_SIZE_MB * 1024 * 1024;

/// Content-type prefixes the model can make sense of.
pub const READABLE_FILE_TYPES: &[&str] = &[
    "image/",
    "text/",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument",
    "application/json",
    "application/rtf",
    "application/vnd.ms-powerpoint",
    "application/vnd.ms-excel",
];

pub fn is_supported_type(content_type: &str) -> bool {
    READABLE_FILE_TYPES
        .iter()
        .any(|prefix| content_type.starts_with(prefix))
}

/// Check a file's size and type before its contents are read.
pub fn check_file(name: &str, content_type: &str, size: u64) -> Result<(), AttachmentError> {
    if size > MAX_FILE_SIZE_BYTES {
        return Err(AttachmentError::TooLarge {
            name: name.to_string(),
            limit_mb: MAX_FILE_SIZE_MB,
        });
    }
    if !is_supported_type(content_type) {
        return Err(AttachmentError::UnsupportedType {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// A file picked by the user whose contents have been read.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A validated file waiting to be sent with the next message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftAttachment {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub content_type: String,
    pub data_url: String,
    /// Set for text and JSON files.
    pub text_preview: Option<String>,
}

impl DraftAttachment {
    /// The wire form sent to the relay.
    pub fn to_attachment(&self) -> Attachment {
        Attachment {
            name: Some(self.name.clone()),
            content_type: Some(self.content_type.clone()),
            url: self.data_url.clone(),
        }
    }
}

/// Validate one file and encode it as a draft.
pub fn prepare_draft(file: PendingFile) -> Result<DraftAttachment, AttachmentError> {
    let size = file.bytes.len() as u64;
    check_file(&file.name, &file.content_type, size)?;

    let data_url = encode_data_url(&file.content_type, &file.bytes);
    let preview = if file.content_type.starts_with("text/") || file.content_type.contains("json") {
        Some(text_preview(&data_url)).filter(|p| !p.is_empty())
    } else {
        None
    };

    Ok(DraftAttachment {
        id: Uuid::now_v7().to_string(),
        name: file.name,
        size,
        content_type: file.content_type,
        data_url,
        text_preview: preview,
    })
}

/// Result of adding several files at once.
#[derive(Debug, Default)]
pub struct DraftBatch {
    pub accepted: Vec<DraftAttachment>,
    pub rejected: Vec<AttachmentError>,
}

/// Validate a batch. A rejected file never blocks the others.
pub fn prepare_drafts(files: impl IntoIterator<Item = PendingFile>) -> DraftBatch {
    let mut batch = DraftBatch::default();
    for file in files {
        match prepare_draft(file) {
            Ok(draft) => batch.accepted.push(draft),
            Err(e) => {
                tracing::debug!(error = %e, "attachment rejected");
                batch.rejected.push(e);
            }
        }
    }
    batch
}

/// Human-readable byte size: `512 B`, `1.5 KB`, `8.0 MB`.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, content_type: &str, bytes: &[u8]) -> PendingFile {
        PendingFile {
            name: name.to_string(),
            content_type: content_type.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_supported_types() {
        for ok in [
            "image/png",
            "text/markdown",
            "application/pdf",
            "application/json",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "application/vnd.ms-excel",
        ] {
            assert!(is_supported_type(ok), "{ok}");
        }
        for bad in ["application/zip", "video/mp4", "", "application/octet-stream"] {
            assert!(!is_supported_type(bad), "{bad}");
        }
    }

    #[test]
    fn test_text_draft_gets_preview() {
        let draft =
            prepare_draft(file("notes.txt", "text/plain", b"  remember the milk \n")).unwrap();
        assert_eq!(draft.size, 21);
        assert_eq!(draft.text_preview.as_deref(), Some("remember the milk"));
        assert!(draft.data_url.starts_with("data:text/plain;base64,"));

        let attachment = draft.to_attachment();
        assert_eq!(attachment.name.as_deref(), Some("notes.txt"));
        assert_eq!(attachment.url, draft.data_url);
    }

    #[test]
    fn test_image_draft_has_no_preview() {
        let draft = prepare_draft(file("cat.png", "image/png", &[0x89, 0x50])).unwrap();
        assert!(draft.text_preview.is_none());
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        assert!(check_file("a.txt", "text/plain", MAX_FILE_SIZE_BYTES).is_ok());
        assert_eq!(
            check_file("a.txt", "text/plain", MAX_FILE_SIZE_BYTES + 1),
            Err(AttachmentError::TooLarge {
                name: "a.txt".to_string(),
                limit_mb: 8
            })
        );
    }

    #[test]
    fn test_batch_keeps_valid_files() {
        let batch = prepare_drafts([
            file("a.txt", "text/plain", b"a"),
            file("b.zip", "application/zip", b"b"),
            file("c.json", "application/json", b"{}"),
        ]);
        assert_eq!(batch.accepted.len(), 2);
        assert_eq!(batch.accepted[0].name, "a.txt");
        assert_eq!(batch.accepted[1].name, "c.json");
        assert_eq!(
            batch.rejected,
            vec![AttachmentError::UnsupportedType {
                name: "b.zip".to_string()
            }]
        );
        assert_eq!(batch.rejected[0].to_string(), "\"b.zip\" has an unsupported type.");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(MAX_FILE_SIZE_BYTES), "8.0 MB");
    }
}
