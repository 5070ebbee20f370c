//! Workflow items flowing into and out of the node.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Key under which the generated video is attached to an output record.
pub const VIDEO_BINARY_KEY: &str = "video";

/// File name given to every generated video.
pub const VIDEO_FILE_NAME: &str = "video.mp4";

/// One input record of a workflow batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputItem {
    /// Structured data of the item.
    #[serde(default)]
    pub json: Map<String, Value>,
}

impl InputItem {
    /// Creates an item carrying only a `prompt` field.
    pub fn with_prompt(prompt: impl Into<String>) -> Self {
        let mut json = Map::new();
        json.insert("prompt".into(), Value::String(prompt.into()));
        Self { json }
    }

    /// Returns a string field of the item, if present.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.json.get(name).and_then(Value::as_str)
    }
}

/// Raw file-like data attached to an output record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryAttachment {
    /// File contents, base64 encoded on the wire.
    #[serde(with = "base64_data")]
    pub data: Vec<u8>,
    /// MIME type of the contents.
    pub mime_type: String,
    /// File name shown by the host.
    pub file_name: String,
    /// Extension derived from `file_name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,
    /// Size of `data` in bytes.
    pub file_size: usize,
}

impl BinaryAttachment {
    /// Wraps raw bytes as a named attachment.
    pub fn prepare(data: Vec<u8>, file_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let file_extension = Path::new(&file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_string);
        Self {
            file_size: data.len(),
            data,
            mime_type: mime_type.into(),
            file_name,
            file_extension,
        }
    }

    /// Writes the attachment into `dir` under `file_name`, returning the path.
    pub fn save_in(&self, dir: impl AsRef<Path>, file_name: &str) -> Result<PathBuf> {
        let path = dir.as_ref().join(file_name);
        std::fs::write(&path, &self.data)?;
        Ok(path)
    }
}

/// Link from an output record back to the input item it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedItem {
    /// Index of the input item.
    pub item: usize,
}

/// One output record, produced per input item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRecord {
    /// Operation response (or error details) as plain JSON.
    pub json: Value,
    /// Attachments keyed by name. Absent when no video was produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<BTreeMap<String, BinaryAttachment>>,
    /// Input item this record was produced from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paired_item: Option<PairedItem>,
}

impl OutputRecord {
    /// Creates a metadata-only record for input item `index`.
    pub fn new(json: Value, index: usize) -> Self {
        Self {
            json,
            binary: None,
            paired_item: Some(PairedItem { item: index }),
        }
    }

    /// Record describing a failed item.
    pub fn error(index: usize, message: impl Into<String>) -> Self {
        Self::new(serde_json::json!({ "error": message.into() }), index)
    }

    /// Attaches binary data under `key`.
    pub fn with_binary(mut self, key: impl Into<String>, attachment: BinaryAttachment) -> Self {
        self.binary
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), attachment);
        self
    }

    /// Returns the generated video, if attached.
    pub fn video(&self) -> Option<&BinaryAttachment> {
        self.binary.as_ref()?.get(VIDEO_BINARY_KEY)
    }
}

mod base64_data {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)
    }
}
