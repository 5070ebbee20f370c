//! Credential store capability and Gemini API credentials.
//!
//! The host owns credential storage. The node only asks a [`CredentialStore`]
//! for a named credential at execution time.

use crate::error::{Result, VeoNodeError};
use async_trait::async_trait;
use std::collections::HashMap;

/// Name under which the Gemini API credential is registered.
pub const GEMINI_CREDENTIAL: &str = "geminiApi";

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API credentials.
#[derive(Clone)]
pub struct GeminiCredentials {
    api_key: String,
}

impl GeminiCredentials {
    /// Creates credentials from an API key. Rejects empty keys.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(VeoNodeError::Auth("Gemini API key is empty".into()));
        }
        Ok(Self { api_key })
    }

    /// Returns the raw API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Attaches the API key header to an outgoing request.
    pub fn authenticate(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header(API_KEY_HEADER, &self.api_key)
    }
}

impl std::fmt::Debug for GeminiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiCredentials")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Source of named credentials, supplied by the host.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetches the credential registered under `name`.
    async fn fetch_credential(&self, name: &str) -> Result<GeminiCredentials>;
}

/// In-memory credential store.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialStore {
    entries: HashMap<String, GeminiCredentials>,
}

impl StaticCredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `credentials` under `name`.
    pub fn with_credential(mut self, name: impl Into<String>, credentials: GeminiCredentials) -> Self {
        self.entries.insert(name.into(), credentials);
        self
    }

    /// Store holding a single `geminiApi` credential.
    pub fn gemini(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self::new().with_credential(GEMINI_CREDENTIAL, GeminiCredentials::new(api_key)?))
    }
}

#[async_trait]
impl CredentialStore for StaticCredentialStore {
    async fn fetch_credential(&self, name: &str) -> Result<GeminiCredentials> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| VeoNodeError::Auth(format!("credential '{name}' not found")))
    }
}

/// Reads the Gemini API key from `GOOGLE_API_KEY`, falling back to `GEMINI_API_KEY`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentialStore;

#[async_trait]
impl CredentialStore for EnvCredentialStore {
    async fn fetch_credential(&self, name: &str) -> Result<GeminiCredentials> {
        if name != GEMINI_CREDENTIAL {
            return Err(VeoNodeError::Auth(format!("credential '{name}' not found")));
        }
        let key = std::env::var("GOOGLE_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .map_err(|_| {
                VeoNodeError::Auth(
                    "GOOGLE_API_KEY not set. Get a key at https://aistudio.google.com/apikey"
                        .into(),
                )
            })?;
        GeminiCredentials::new(key)
    }
}
