//! Long-running operation envelope and video payload classification.

use crate::error::{Result, VeoNodeError};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// MIME type used when the API does not declare one.
pub const DEFAULT_VIDEO_MIME: &str = "video/mp4";

/// A Google long-running operation, as returned by submit and poll calls.
///
/// Each poll replaces the previous value wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Operation handle used for polling, e.g. `models/veo/operations/abc`.
    pub name: String,
    /// Whether the operation has finished. Missing means pending.
    #[serde(default)]
    pub done: bool,
    /// Operation result payload, present once done.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    /// Failure status, present when the operation finished with an error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
}

/// Status attached to a failed operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationError {
    /// gRPC status code.
    #[serde(default)]
    pub code: Option<i32>,
    /// Human readable message.
    #[serde(default)]
    pub message: Option<String>,
}

impl Operation {
    /// Converts a finished operation into its response JSON.
    ///
    /// A missing response becomes an empty object. An attached error becomes
    /// [`VeoNodeError::VideoGeneration`].
    pub fn into_response(self) -> Result<Value> {
        if let Some(err) = self.error {
            return Err(VeoNodeError::VideoGeneration(
                err.message.unwrap_or_else(|| "Unknown error".into()),
            ));
        }
        Ok(self
            .response
            .unwrap_or_else(|| Value::Object(Default::default())))
    }
}

/// Where the generated video lives, decided once per completed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoPayload {
    /// Base64 video bytes delivered in the response body.
    Inline {
        /// Base64-encoded video contents.
        base64: String,
        /// Declared MIME type, `video/mp4` when absent.
        mime_type: String,
    },
    /// URI the caller must fetch separately.
    Remote {
        /// Download location of the video.
        uri: String,
        /// Declared MIME type, `video/mp4` when absent.
        mime_type: String,
    },
    /// The operation succeeded without a video.
    None,
}

impl VideoPayload {
    /// Classifies an operation response.
    ///
    /// Inline bytes take precedence over a URI. A structurally invalid
    /// response is an [`VeoNodeError::UnexpectedResponse`], distinct from a
    /// response that simply carries no video.
    pub fn classify(response: Option<&Value>) -> Result<Self> {
        let Some(response) = response else {
            return Ok(Self::None);
        };

        let shape: VideoResponse = serde_json::from_value(response.clone()).map_err(|e| {
            VeoNodeError::UnexpectedResponse(format!("malformed video response: {e}"))
        })?;

        if let Some(ref gen_resp) = shape.generate_video_response {
            let no_samples = gen_resp
                .generated_samples
                .as_ref()
                .is_none_or(|s| s.is_empty());
            if gen_resp.rai_media_filtered_count.unwrap_or(0) > 0 && no_samples {
                tracing::warn!(
                    reasons = ?gen_resp.rai_media_filtered_reasons.as_deref().unwrap_or_default(),
                    "video was filtered by safety filters"
                );
            }
        }

        let descriptor = shape
            .generated_videos
            .and_then(|v| v.into_iter().next())
            .or_else(|| {
                shape
                    .generate_video_response
                    .and_then(|r| r.generated_samples)
                    .and_then(|s| s.into_iter().next())
            })
            .and_then(|entry| entry.video);

        let Some(video) = descriptor else {
            return Ok(Self::None);
        };

        let mime_type = non_empty(video.mime_type)
            .or_else(|| non_empty(video.encoding))
            .unwrap_or_else(|| DEFAULT_VIDEO_MIME.to_string());

        if let Some(base64) =
            non_empty(video.video_bytes).or_else(|| non_empty(video.bytes_base64_encoded))
        {
            return Ok(Self::Inline { base64, mime_type });
        }
        if let Some(uri) = non_empty(video.uri) {
            return Ok(Self::Remote { uri, mime_type });
        }
        Ok(Self::None)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Decodes base64 video bytes, accepting padded and unpadded input.
pub fn decode_video_bytes(base64_data: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(base64_data)
        .or_else(|_| base64::engine::general_purpose::STANDARD_NO_PAD.decode(base64_data))
        .map_err(|e| VeoNodeError::Decode(format!("invalid base64 video data: {e}")))
}

// ── Response wire format ────────────────────────────────────────────────────

/// Accepts both the normalized `generatedVideos` shape and the raw REST
/// `generateVideoResponse.generatedSamples` shape.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoResponse {
    #[serde(default)]
    generated_videos: Option<Vec<GeneratedVideo>>,
    #[serde(default)]
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Option<Vec<GeneratedVideo>>,
    #[serde(default)]
    rai_media_filtered_count: Option<u32>,
    #[serde(default)]
    rai_media_filtered_reasons: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct GeneratedVideo {
    #[serde(default)]
    video: Option<VideoDescriptor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoDescriptor {
    #[serde(default)]
    video_bytes: Option<String>,
    /// Vertex-style spelling of `videoBytes`.
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
    /// Vertex-style spelling of `mimeType`.
    #[serde(default)]
    encoding: Option<String>,
}
