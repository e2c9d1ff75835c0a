//! Response body framing for relayed chunks.
//!
//! The `data` format is line-oriented, one record per line:
//!
//! ```text
//! 0:"Hel"
//! 0:"lo"
//! d:{"finishReason":"stop","usage":{"promptTokens":12,"completionTokens":2}}
//! ```
//!
//! `0` carries a JSON string of model text, `3` a JSON string error reason,
//! `d` the finish record. The `text` format is the bare model text.

use serde::{Deserialize, Serialize};

use aichat_types::chat::{FinishInfo, RelayChunk};
use aichat_types::llm::{StopReason, Usage};

/// Body format selected with the `format` query parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamFormat {
    #[default]
    Data,
    Text,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinishRecord {
    finish_reason: StopReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    usage: Option<UsageRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageRecord {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl StreamFormat {
    /// Encode one chunk. May be empty when the format has nothing to say.
    pub fn encode(self, chunk: &RelayChunk) -> String {
        match self {
            StreamFormat::Data => encode_data(chunk),
            StreamFormat::Text => match chunk {
                RelayChunk::Text(text) => text.clone(),
                RelayChunk::Error(reason) => format!("\n\n[error] {reason}"),
                RelayChunk::Finish(_) => String::new(),
            },
        }
    }
}

fn encode_data(chunk: &RelayChunk) -> String {
    // Serializing a string or these plain structs cannot fail.
    let (code, payload) = match chunk {
        RelayChunk::Text(text) => ('0', serde_json::to_string(text)),
        RelayChunk::Error(reason) => ('3', serde_json::to_string(reason)),
        RelayChunk::Finish(info) => (
            'd',
            serde_json::to_string(&FinishRecord {
                finish_reason: info.stop_reason,
                usage: info.usage.map(|u| UsageRecord {
                    prompt_tokens: u.input_tokens,
                    completion_tokens: u.output_tokens,
                }),
            }),
        ),
    };
    format!("{code}:{}\n", payload.unwrap_or_else(|_| "null".to_string()))
}

/// A `data` frame that could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed frame: {0}")]
pub struct FrameError(pub String);

/// Decode one line of the `data` format.
///
/// Blank lines and record types this client does not use yield `Ok(None)`.
pub fn decode_frame(line: &str) -> Result<Option<RelayChunk>, FrameError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return Ok(None);
    }
    let (code, payload) = line
        .split_once(':')
        .ok_or_else(|| FrameError(format!("missing type prefix in {line:?}")))?;
    let bad = |e: serde_json::Error| FrameError(format!("{code}: {e}"));

    let chunk = match code {
        "0" => RelayChunk::Text(serde_json::from_str(payload).map_err(bad)?),
        "3" => RelayChunk::Error(serde_json::from_str(payload).map_err(bad)?),
        "d" => {
            let record: FinishRecord = serde_json::from_str(payload).map_err(bad)?;
            RelayChunk::Finish(FinishInfo {
                stop_reason: record.finish_reason,
                usage: record.usage.map(|u| Usage {
                    input_tokens: u.prompt_tokens,
                    output_tokens: u.completion_tokens,
                }),
            })
        }
        _ => return Ok(None),
    };
    Ok(Some(chunk))
}

/// Incremental decoder for a `data` body arriving in arbitrary pieces.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes; returns every chunk completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<RelayChunk>, FrameError> {
        self.buffer.extend_from_slice(bytes);
        let mut chunks = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(chunk) = decode_line(&line)? {
                chunks.push(chunk);
            }
        }
        Ok(chunks)
    }

    /// Decode whatever is left once the body has ended.
    pub fn finish(mut self) -> Result<Option<RelayChunk>, FrameError> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest)
    }
}

fn decode_line(line: &[u8]) -> Result<Option<RelayChunk>, FrameError> {
    let line = std::str::from_utf8(line).map_err(|e| FrameError(e.to_string()))?;
    decode_frame(line)
}
