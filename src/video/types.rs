//! Core types for video generation.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default interval between operation status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Veo model variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VeoModel {
    /// Veo 3.1 Preview.
    #[default]
    Veo31Preview,
    /// Any other model identifier accepted by the API.
    Custom(String),
}

impl VeoModel {
    /// Returns the Gemini Developer API model identifier string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Veo31Preview => "veo-3.1-generate-preview",
            Self::Custom(id) => id,
        }
    }
}

impl From<&str> for VeoModel {
    fn from(id: &str) -> Self {
        if id == Self::Veo31Preview.as_str() {
            Self::Veo31Preview
        } else {
            Self::Custom(id.to_string())
        }
    }
}

impl std::fmt::Display for VeoModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to generate a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The text prompt describing the desired video.
    pub prompt: String,
    /// Model to run the request against.
    pub model: VeoModel,
}

impl GenerationRequest {
    /// Creates a new request for the default model.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: VeoModel::default(),
        }
    }

    /// Sets the model.
    pub fn with_model(mut self, model: VeoModel) -> Self {
        self.model = model;
        self
    }
}

/// How the operation is polled until it completes.
///
/// Both bounds default to `None`, which polls until the operation reports
/// `done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Fixed delay between status checks.
    pub interval: Duration,
    /// Maximum total wait before giving up. The wait before the last poll
    /// is shortened to end at the deadline, so a timeout shorter than
    /// `interval` still gets one poll.
    pub timeout: Option<Duration>,
    /// Maximum number of status polls after submission.
    pub max_attempts: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
            max_attempts: None,
        }
    }
}

impl PollConfig {
    /// Sets the polling interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the maximum time to wait for completion.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the maximum number of polls.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }
}
