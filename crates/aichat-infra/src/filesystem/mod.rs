//! Filesystem helpers: data directory resolution and reading attachments
//! from disk.

use std::path::{Path, PathBuf};

use aichat_core::attachment::PendingFile;
use aichat_core::attachment::draft::check_file;
use aichat_types::error::AttachmentError;

/// Environment variable overriding the data directory.
pub const DATA_DIR_VAR: &str = "AICHAT_DATA_DIR";

/// Resolve the data directory.
///
/// `AICHAT_DATA_DIR` if set, else `~/.aichat`, else `./.aichat`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_VAR) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".aichat");
    }

    PathBuf::from(".aichat")
}

/// Guess a MIME type from a file name's extension.
pub fn detect_mime(filename: &str) -> String {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        // Text
        "txt" | "log" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "xml" => "text/xml",
        "yaml" | "yml" => "text/yaml",
        "json" => "application/json",

        // Code
        "rs" => "text/x-rust",
        "py" => "text/x-python",
        "js" => "text/javascript",
        "ts" => "text/typescript",

        // Documents
        "pdf" => "application/pdf",
        "rtf" => "application/rtf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",

        // Archives
        "zip" => "application/zip",
        "gz" => "application/gzip",

        _ => "application/octet-stream",
    }
    .to_string()
}

/// Read a file for attaching to a message.
///
/// Size and type are checked from metadata and the extension before any
/// bytes are read, so an oversized file is never loaded.
pub async fn read_pending_file(path: &Path) -> Result<PendingFile, AttachmentError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let read_error = |e: std::io::Error| AttachmentError::Read {
        name: name.clone(),
        message: e.to_string(),
    };

    let metadata = tokio::fs::metadata(path).await.map_err(read_error)?;
    let content_type = detect_mime(&name);
    check_file(&name, &content_type, metadata.len())?;

    let bytes = tokio::fs::read(path).await.map_err(read_error)?;
    tracing::debug!(
        file = %name,
        size = bytes.len(),
        content_type = %content_type,
        "read attachment"
    );
    Ok(PendingFile {
        name,
        content_type,
        bytes,
    })
}
