//! Video generation module.

pub mod client;
pub mod operation;
pub mod poller;
mod types;

pub use client::{GeminiVideoClient, GeminiVideoClientBuilder, VideoClient, DEFAULT_BASE_URL};
pub use operation::{decode_video_bytes, Operation, OperationError, VideoPayload, DEFAULT_VIDEO_MIME};
pub use poller::{poll_until_done, CancelSignal};
pub use types::{GenerationRequest, PollConfig, VeoModel, DEFAULT_POLL_INTERVAL};
