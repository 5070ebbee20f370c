//! The Veo workflow node: one generated video per input item.

mod description;
mod item;

pub use description::{
    CredentialRequirement, NodeDefaults, NodeDescription, NodeProperty, NODE_NAME,
};
pub use item::{
    BinaryAttachment, InputItem, OutputRecord, PairedItem, VIDEO_BINARY_KEY, VIDEO_FILE_NAME,
};

use crate::credentials::{CredentialStore, GEMINI_CREDENTIAL};
use crate::error::{Result, VeoNodeError};
use crate::video::{
    decode_video_bytes, poll_until_done, CancelSignal, GeminiVideoClient, GenerationRequest,
    PollConfig, VeoModel, VideoClient, VideoPayload,
};
use std::time::Duration;

/// What to do when one item of a batch fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the batch and return the error.
    #[default]
    Abort,
    /// Emit `{"error": ...}` for the failed item and keep going.
    ContinueOnFail,
}

/// Builder for [`VeoNode`].
#[derive(Debug, Clone, Default)]
pub struct VeoNodeBuilder {
    prompt: Option<String>,
    model: VeoModel,
    poll: PollConfig,
    failure_policy: FailurePolicy,
    base_url: Option<String>,
}

impl VeoNodeBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixes the prompt for every item. Without it, each item's
    /// `json.prompt` field is used.
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Sets the Veo model.
    pub fn model(mut self, model: VeoModel) -> Self {
        self.model = model;
        self
    }

    /// Sets the interval between status checks.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll.interval = interval;
        self
    }

    /// Gives up polling after `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.poll.timeout = Some(timeout);
        self
    }

    /// Gives up polling after `attempts` status checks.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.poll.max_attempts = Some(attempts);
        self
    }

    /// Replaces the whole polling configuration.
    pub fn poll_config(mut self, config: PollConfig) -> Self {
        self.poll = config;
        self
    }

    /// Sets the batch failure policy.
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Overrides the API endpoint.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the node.
    pub fn build(self) -> VeoNode {
        VeoNode {
            prompt: self.prompt,
            model: self.model,
            poll: self.poll,
            failure_policy: self.failure_policy,
            base_url: self.base_url,
        }
    }
}

/// Generates a video per input item with Google Veo.
///
/// Items are processed strictly in order, one at a time. Each item is
/// submitted, polled until the operation is done, and turned into an
/// [`OutputRecord`] holding the operation response and, when one was
/// produced, the video under the `video` binary key.
#[derive(Debug, Clone)]
pub struct VeoNode {
    prompt: Option<String>,
    model: VeoModel,
    poll: PollConfig,
    failure_policy: FailurePolicy,
    base_url: Option<String>,
}

impl Default for VeoNode {
    fn default() -> Self {
        VeoNodeBuilder::new().build()
    }
}

impl VeoNode {
    /// Creates a new `VeoNodeBuilder`.
    pub fn builder() -> VeoNodeBuilder {
        VeoNodeBuilder::new()
    }

    /// Host-facing description of this node.
    pub fn description() -> NodeDescription {
        NodeDescription::veo()
    }

    /// Returns the polling configuration.
    pub fn poll_config(&self) -> &PollConfig {
        &self.poll
    }

    /// Runs the node over `items`, authenticating through `credentials`.
    pub async fn execute(
        &self,
        items: &[InputItem],
        credentials: &dyn CredentialStore,
        cancel: Option<&CancelSignal>,
    ) -> Result<Vec<OutputRecord>> {
        let creds = credentials.fetch_credential(GEMINI_CREDENTIAL).await?;
        let mut builder = GeminiVideoClient::builder(creds);
        if let Some(ref url) = self.base_url {
            builder = builder.base_url(url.clone());
        }
        let client = builder.build();
        self.execute_with_client(items, &client, cancel).await
    }

    /// Runs the node over `items` with an explicit transport.
    pub async fn execute_with_client<C>(
        &self,
        items: &[InputItem],
        client: &C,
        cancel: Option<&CancelSignal>,
    ) -> Result<Vec<OutputRecord>>
    where
        C: VideoClient + ?Sized,
    {
        let mut records = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            match self.process_item(index, item, client, cancel).await {
                Ok(record) => records.push(record),
                Err(VeoNodeError::Cancelled) => return Err(VeoNodeError::Cancelled),
                Err(e) => match self.failure_policy {
                    FailurePolicy::Abort => return Err(e),
                    FailurePolicy::ContinueOnFail => {
                        tracing::warn!(item = index, "video generation failed: {e}");
                        records.push(OutputRecord::error(index, e.to_string()));
                    }
                },
            }
        }

        Ok(records)
    }

    async fn process_item<C>(
        &self,
        index: usize,
        item: &InputItem,
        client: &C,
        cancel: Option<&CancelSignal>,
    ) -> Result<OutputRecord>
    where
        C: VideoClient + ?Sized,
    {
        let prompt = self.resolve_prompt(item)?;
        let request = GenerationRequest::new(prompt).with_model(self.model.clone());

        let operation = client.submit(&request).await?;
        let operation = poll_until_done(client, operation, &self.poll, cancel).await?;
        let operation_name = operation.name.clone();
        let json = operation.into_response()?;

        let data = match VideoPayload::classify(Some(&json))? {
            VideoPayload::Inline { base64, mime_type } => {
                Some((decode_video_bytes(&base64)?, mime_type))
            }
            VideoPayload::Remote { uri, mime_type } => Some((client.fetch(&uri).await?, mime_type)),
            VideoPayload::None => None,
        };

        tracing::info!(
            item = index,
            operation = %operation_name,
            video_bytes = data.as_ref().map(|(d, _)| d.len()),
            "video generation complete"
        );

        let record = OutputRecord::new(json, index);
        Ok(match data {
            Some((bytes, mime_type)) => record.with_binary(
                VIDEO_BINARY_KEY,
                BinaryAttachment::prepare(bytes, VIDEO_FILE_NAME, mime_type),
            ),
            None => record,
        })
    }

    fn resolve_prompt(&self, item: &InputItem) -> Result<String> {
        let prompt = match self.prompt {
            Some(ref p) => p.as_str(),
            None => item.str_field("prompt").unwrap_or_default(),
        };
        if prompt.trim().is_empty() {
            return Err(VeoNodeError::InvalidRequest("prompt must not be empty".into()));
        }
        Ok(prompt.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticCredentialStore;
    use crate::video::poller::tests::{finished, pending, ScriptedClient};
    use crate::video::Operation;
    use serde_json::json;
    use tokio::time::Instant;

    fn inline_response(bytes: &str) -> serde_json::Value {
        json!({"generatedVideos": [{"video": {"videoBytes": bytes, "mimeType": "video/mp4"}}]})
    }

    #[tokio::test(start_paused = true)]
    async fn test_inline_video_after_one_wait() {
        let client = ScriptedClient::new(
            vec![pending("op1")],
            vec![finished("op1", inline_response("AAAA"))],
        );
        let node = VeoNode::default();
        let items = [InputItem::with_prompt(
            "A golden retriever playing in autumn leaves",
        )];
        let start = Instant::now();

        let records = node.execute_with_client(&items, &client, None).await.unwrap();

        // Submission is the first status check, the poll is the second.
        assert_eq!(client.poll_count(), 1);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
        assert_eq!(
            client.submits.lock().unwrap().as_slice(),
            ["A golden retriever playing in autumn leaves"]
        );

        assert_eq!(records.len(), 1);
        let video = records[0].video().unwrap();
        assert_eq!(video.file_name, "video.mp4");
        assert_eq!(video.mime_type, "video/mp4");
        assert_eq!(video.data, vec![0u8, 0, 0]);
        assert_eq!(records[0].json, inline_response("AAAA"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_uri_fetched_once_without_waiting() {
        let response = json!({
            "generatedVideos": [{"video": {"uri": "https://files.example/v.mp4"}}]
        });
        let client = ScriptedClient::new(vec![finished("op1", response.clone())], vec![])
            .with_fetch_body(vec![9, 8, 7]);
        let start = Instant::now();

        let records = VeoNode::default()
            .execute_with_client(&[InputItem::with_prompt("waves")], &client, None)
            .await
            .unwrap();

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(client.poll_count(), 0);
        assert_eq!(
            client.fetches.lock().unwrap().as_slice(),
            ["https://files.example/v.mp4"]
        );
        let video = records[0].video().unwrap();
        assert_eq!(video.data, vec![9, 8, 7]);
        assert_eq!(video.mime_type, "video/mp4");
        assert_eq!(records[0].json, response);
    }

    #[tokio::test]
    async fn test_no_video_emits_metadata_only() {
        let client = ScriptedClient::new(vec![finished("op1", json!({"generatedVideos": []}))], vec![]);

        let records = VeoNode::default()
            .execute_with_client(&[InputItem::with_prompt("empty")], &client, None)
            .await
            .unwrap();

        assert!(records[0].binary.is_none());
        assert_eq!(records[0].json, json!({"generatedVideos": []}));
        assert!(client.fetches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_response_is_empty_object() {
        let done = Operation {
            name: "op1".into(),
            done: true,
            response: None,
            error: None,
        };
        let client = ScriptedClient::new(vec![done], vec![]);

        let records = VeoNode::default()
            .execute_with_client(&[InputItem::with_prompt("x")], &client, None)
            .await
            .unwrap();
        assert_eq!(records[0].json, json!({}));
        assert!(records[0].binary.is_none());
    }

    #[tokio::test]
    async fn test_outputs_follow_input_order() {
        let client = ScriptedClient::new(
            vec![
                finished("a", json!({"n": 0})),
                finished("b", inline_response("AAE=")),
                finished("c", json!({"n": 2})),
            ],
            vec![],
        );
        let items = [
            InputItem::with_prompt("first"),
            InputItem::with_prompt("second"),
            InputItem::with_prompt("third"),
        ];

        let records = VeoNode::default()
            .execute_with_client(&items, &client, None)
            .await
            .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(
            client.submits.lock().unwrap().as_slice(),
            ["first", "second", "third"]
        );
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.paired_item, Some(PairedItem { item: i }));
        }
        assert_eq!(records[0].json, json!({"n": 0}));
        assert_eq!(records[1].video().unwrap().data, vec![0, 1]);
        assert_eq!(records[2].json, json!({"n": 2}));
    }

    #[tokio::test]
    async fn test_fixed_prompt_overrides_item_field() {
        let client = ScriptedClient::new(vec![finished("a", json!({}))], vec![]);
        let node = VeoNode::builder().prompt("fixed prompt").build();

        node.execute_with_client(&[InputItem::default()], &client, None)
            .await
            .unwrap();
        assert_eq!(client.submits.lock().unwrap().as_slice(), ["fixed prompt"]);
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_before_submit() {
        let client = ScriptedClient::new(vec![], vec![]);

        let err = VeoNode::default()
            .execute_with_client(&[InputItem::with_prompt("   ")], &client, None)
            .await
            .unwrap_err();

        assert!(matches!(err, VeoNodeError::InvalidRequest(_)));
        assert!(client.submits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_abort_policy_stops_batch() {
        let client = ScriptedClient::new(
            vec![finished("a", inline_response("!!!!")), finished("b", json!({}))],
            vec![],
        );
        let items = [InputItem::with_prompt("one"), InputItem::with_prompt("two")];

        let err = VeoNode::default()
            .execute_with_client(&items, &client, None)
            .await
            .unwrap_err();

        assert!(matches!(err, VeoNodeError::Decode(_)));
        assert_eq!(client.submits.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_continue_on_fail_isolates_item() {
        let failed = Operation {
            name: "a".into(),
            done: true,
            response: None,
            error: Some(crate::video::OperationError {
                code: Some(3),
                message: Some("prompt rejected".into()),
            }),
        };
        let client = ScriptedClient::new(vec![failed, finished("b", json!({"ok": true}))], vec![]);
        let node = VeoNode::builder()
            .failure_policy(FailurePolicy::ContinueOnFail)
            .build();
        let items = [InputItem::with_prompt("one"), InputItem::with_prompt("two")];

        let records = node.execute_with_client(&items, &client, None).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].json,
            json!({"error": "video generation failed: prompt rejected"})
        );
        assert_eq!(records[1].json, json!({"ok": true}));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_aborts_even_with_continue_on_fail() {
        let client = ScriptedClient::new(vec![pending("a")], vec![]);
        let node = VeoNode::builder()
            .failure_policy(FailurePolicy::ContinueOnFail)
            .build();
        let (tx, rx) = tokio::sync::watch::channel(false);
        tx.send(true).unwrap();

        let err = node
            .execute_with_client(&[InputItem::with_prompt("x")], &client, Some(&rx))
            .await
            .unwrap_err();
        assert!(matches!(err, VeoNodeError::Cancelled));
    }

    #[tokio::test]
    async fn test_execute_requires_credential() {
        let err = VeoNode::default()
            .execute(&[InputItem::with_prompt("x")], &StaticCredentialStore::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, VeoNodeError::Auth(_)));
    }

    #[tokio::test]
    async fn test_execute_over_http_fetches_remote_video() {
        use crate::credentials::API_KEY_HEADER;
        use wiremock::matchers::{body_json, header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        let op_name = "models/veo-3.1-generate-preview/operations/op1";
        let video_uri = format!("{}/files/op1.mp4", server.uri());

        Mock::given(method("POST"))
            .and(path("/v1beta/models/veo-3.1-generate-preview:predictLongRunning"))
            .and(header(API_KEY_HEADER, "node-key"))
            .and(body_json(json!({"instances": [{"prompt": "A golden retriever"}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": op_name})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/v1beta/{op_name}")))
            .and(header(API_KEY_HEADER, "node-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": op_name,
                "done": true,
                "response": {
                    "generateVideoResponse": {
                        "generatedSamples": [{"video": {"uri": video_uri}}]
                    }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/op1.mp4"))
            .and(header(API_KEY_HEADER, "node-key"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8, 7, 7, 7]))
            .expect(1)
            .mount(&server)
            .await;

        let node = VeoNode::builder()
            .base_url(server.uri())
            .poll_interval(Duration::from_millis(10))
            .build();
        let credentials = StaticCredentialStore::gemini("node-key").unwrap();

        let records = node
            .execute(&[InputItem::with_prompt("A golden retriever")], &credentials, None)
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        let video = records[0].video().unwrap();
        assert_eq!(video.data, vec![7, 7, 7, 7]);
        assert_eq!(video.file_name, "video.mp4");
        assert_eq!(video.mime_type, "video/mp4");
        assert_eq!(
            records[0].json["generateVideoResponse"]["generatedSamples"][0]["video"]["uri"],
            json!(video_uri)
        );
        server.verify().await;
    }

    #[test]
    fn test_builder_settings() {
        let node = VeoNode::builder()
            .poll_interval(Duration::from_secs(2))
            .timeout(Duration::from_secs(60))
            .max_attempts(3)
            .build();
        assert_eq!(node.poll_config().interval, Duration::from_secs(2));
        assert_eq!(node.poll_config().timeout, Some(Duration::from_secs(60)));
        assert_eq!(node.poll_config().max_attempts, Some(3));
        assert_eq!(VeoNode::default().poll_config().interval, Duration::from_secs(10));
    }
}
