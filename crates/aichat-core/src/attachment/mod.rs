//! File attachments: data URL encoding, previews and draft validation.

pub mod data_url;
pub mod draft;

pub use data_url::{DataUrl, DataUrlError, encode_data_url, text_preview};
pub use draft::{
    DraftAttachment, DraftBatch, PendingFile, format_size, prepare_draft, prepare_drafts,
};
