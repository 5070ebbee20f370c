#![warn(missing_docs)]
//! veo-node - Google Veo video generation as a workflow node.
//!
//! The node takes a batch of input items, submits one Veo generation job per
//! item, polls each long-running operation until it completes and returns one
//! output record per item. A record carries the operation response as JSON
//! and, when a video was produced, the video as a `video.mp4` attachment,
//! either decoded from inline base64 bytes or downloaded from its URI.
//!
//! # Quick Start
//!
//! ```no_run
//! use veo_node::{EnvCredentialStore, InputItem, VeoNode};
//!
//! #[tokio::main]
//! async fn main() -> veo_node::Result<()> {
//!     let node = VeoNode::builder().build();
//!     let items = vec![InputItem::with_prompt("A golden retriever playing in autumn leaves")];
//!     let records = node.execute(&items, &EnvCredentialStore, None).await?;
//!     if let Some(video) = records[0].video() {
//!         video.save_in(".", "retriever.mp4")?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `cli` (default): the `veo-node` command-line host

pub mod credentials;
mod error;
pub mod node;
pub mod video;

// Re-export error types at crate root
pub use error::{Result, VeoNodeError};

pub use credentials::{
    CredentialStore, EnvCredentialStore, GeminiCredentials, StaticCredentialStore,
    API_KEY_HEADER, GEMINI_CREDENTIAL,
};
pub use node::{
    BinaryAttachment, FailurePolicy, InputItem, NodeDescription, OutputRecord, VeoNode,
    VeoNodeBuilder,
};
pub use video::{
    CancelSignal, GeminiVideoClient, GenerationRequest, Operation, PollConfig, VeoModel,
    VideoClient, VideoPayload,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::credentials::{CredentialStore, EnvCredentialStore, StaticCredentialStore};
    pub use crate::error::{Result, VeoNodeError};
    pub use crate::node::{FailurePolicy, InputItem, OutputRecord, VeoNode};
    pub use crate::video::{PollConfig, VeoModel, VideoClient};
}
