//! Image description service and the queue that feeds its answers back
//! into the document.
//!
//! Requests run as detached tasks. Each task sends `(layer id, result)` on a
//! channel; the editor drains the channel on its own thread and patches the
//! matching layer if it still exists.

use std::sync::Arc;

use async_trait::async_trait;
use memeforge_core::{Document, LayerId};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::{EditorError, EditorResult};

/// Produces a short text description of an image.
#[async_trait]
pub trait DescriptionService: Send + Sync {
    /// Describe the image encoded in `data_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the service is unreachable or its answer has no
    /// description in it.
    async fn describe(&self, data_url: &str) -> EditorResult<String>;
}

/// Description service reached over HTTP.
///
/// Posts `{"image": "<data url>"}` as JSON and reads the description from
/// the response.
#[derive(Debug, Clone)]
pub struct HttpDescriptionService {
    http: Client,
    endpoint: Url,
}

impl HttpDescriptionService {
    /// Create a client for `base_url`.
    ///
    /// A bare host gets `/describe` appended.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Config`] if the URL is malformed, or
    /// [`EditorError::Description`] if the HTTP client fails to build.
    pub fn new(base_url: &str) -> EditorResult<Self> {
        let mut endpoint =
            Url::parse(base_url).map_err(|e| EditorError::Config(format!("{base_url}: {e}")))?;
        if endpoint.path().is_empty() || endpoint.path() == "/" {
            endpoint.set_path("/describe");
        }

        let http = Client::builder()
            .user_agent(concat!("memeforge/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .build()?;

        Ok(Self { http, endpoint })
    }

    /// Endpoint requests are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn parse_response(value: &Value) -> EditorResult<String> {
        for field in ["description", "text"] {
            if let Some(text) = value.get(field).and_then(Value::as_str) {
                return Ok(text.to_string());
            }
        }

        // Chat-style content array.
        if let Some(text) = value
            .get("content")
            .and_then(Value::as_array)
            .and_then(|content| content.first())
            .and_then(|first| first.get("text"))
            .and_then(Value::as_str)
        {
            return Ok(text.to_string());
        }

        Err(EditorError::Description(
            "response did not contain a description".to_string(),
        ))
    }

    /// Message for a failed request: the service's `error` field when the
    /// body carries one, the HTTP status otherwise.
    fn error_message(status: StatusCode, body: &str) -> String {
        serde_json::from_str::<DescribeError>(body).map_or_else(|_| status.to_string(), |e| e.error)
    }
}

#[derive(Debug, Serialize)]
struct DescribeRequest<'a> {
    image: &'a str,
}

#[derive(Debug, Deserialize)]
struct DescribeError {
    error: String,
}

#[async_trait]
impl DescriptionService for HttpDescriptionService {
    async fn describe(&self, data_url: &str) -> EditorResult<String> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&DescribeRequest { image: data_url })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EditorError::Description(Self::error_message(status, &body)));
        }
        let body: Value = response.json().await?;
        Self::parse_response(&body)
    }
}

type Answer = (LayerId, EditorResult<String>);

/// Fire-and-forget description requests whose answers are applied later.
pub struct DescriptionQueue {
    service: Option<Arc<dyn DescriptionService>>,
    tx: mpsc::UnboundedSender<Answer>,
    rx: mpsc::UnboundedReceiver<Answer>,
    in_flight: usize,
}

impl std::fmt::Debug for DescriptionQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptionQueue")
            .field("enabled", &self.service.is_some())
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl Default for DescriptionQueue {
    fn default() -> Self {
        Self::new(None)
    }
}

impl DescriptionQueue {
    /// Create a queue. Without a service, requests are ignored.
    #[must_use]
    pub fn new(service: Option<Arc<dyn DescriptionService>>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            service,
            tx,
            rx,
            in_flight: 0,
        }
    }

    /// Whether a service is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.service.is_some()
    }

    /// Requests sent but not yet applied.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.in_flight
    }

    /// Ask for a description of `data_url` on behalf of layer `id`.
    ///
    /// Returns `true` if a request was started. Needs a tokio runtime.
    pub fn request(&mut self, id: LayerId, data_url: String) -> bool {
        let Some(service) = self.service.clone() else {
            return false;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime, skipping description for layer {id}");
            return false;
        };

        tracing::debug!("Requesting description for layer {id}");
        self.in_flight += 1;
        let tx = self.tx.clone();
        runtime.spawn(async move {
            let result = service.describe(&data_url).await;
            let _ = tx.send((id, result));
        });
        true
    }

    /// Apply every answer that has arrived. Returns how many layers changed.
    pub fn drain(&mut self, doc: &mut Document) -> usize {
        let mut applied = 0;
        while let Ok(answer) = self.rx.try_recv() {
            applied += usize::from(self.apply(doc, answer));
        }
        applied
    }

    /// Wait for every outstanding request and apply the answers.
    /// Returns how many layers changed.
    pub async fn settle(&mut self, doc: &mut Document) -> usize {
        let mut applied = self.drain(doc);
        while self.in_flight > 0 {
            match self.rx.recv().await {
                Some(answer) => applied += usize::from(self.apply(doc, answer)),
                None => break,
            }
        }
        applied
    }

    fn apply(&mut self, doc: &mut Document, (id, result): Answer) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        match result {
            Ok(description) => doc.apply_description(&id, description),
            Err(e) => {
                tracing::warn!("Description for layer {id} failed: {e}");
                false
            }
        }
    }
}
