//! Broker collaborator interfaces and the HTTP implementation.
//!
//! Two seams, mirroring the broker's two surfaces: [`BrokerAdmin`] for
//! topic creation and [`BrokerTransport`] for the data plane. The producer
//! core programs against the traits; [`HttpBrokerClient`] implements both
//! over the broker's REST interface.

use crate::config::ClientConfig;
use crate::error::BrokerError;
use crate::provisioner::TopicSpec;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Capacity of the in-process send queue. `try_send` fails with
/// [`SubmitError::QueueFull`] once this many messages are waiting.
const SEND_QUEUE_CAPACITY: usize = 10_000;

/// How often the flush wait re-checks the in-flight counter.
const FLUSH_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How a create-topic request concluded on the broker.
///
/// "Already exists" is a success arm, not an error: another producer or
/// process won the race and the topic is usable either way. The two arms
/// stay distinct so callers can log them differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateTopicOutcome {
    Created,
    AlreadyExists,
}

/// Non-blocking submission failures from the data plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// The bounded send queue is at capacity.
    QueueFull,
    /// The background sender has shut down.
    Disconnected,
}

/// Administrative interface: topic creation.
#[async_trait]
pub trait BrokerAdmin: Send + Sync {
    async fn create_topic(&self, spec: &TopicSpec) -> Result<CreateTopicOutcome, BrokerError>;
}

/// Data plane: asynchronous send plus flush-with-timeout.
///
/// `try_send` hands the message to an internal buffer and returns without
/// waiting for broker acknowledgment. `flush` drains for up to `timeout`
/// and returns the number of messages still unacknowledged; that return
/// value is the authoritative in-flight count.
#[async_trait]
pub trait BrokerTransport: Send + Sync {
    fn try_send(&self, topic: &str, key: Bytes, value: Option<Bytes>)
        -> Result<(), SubmitError>;

    async fn flush(&self, timeout: Duration) -> usize;

    fn in_flight(&self) -> usize;
}

#[derive(Debug, Serialize)]
struct CreateTopicRequest<'a> {
    name: &'a str,
    partitions: u32,
    replication_factor: u32,
}

#[derive(Debug, Serialize)]
struct ProduceRequest {
    topic: String,
    key: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

struct QueuedMessage {
    topic: String,
    key: Bytes,
    value: Option<Bytes>,
}

/// HTTP client for the broker's administrative and data-plane REST APIs.
///
/// Sends are queued to a background task that POSTs them in arrival order.
/// Binary payloads travel base64-encoded inside the JSON body.
pub struct HttpBrokerClient {
    base_url: String,
    http: reqwest::Client,
    queue: mpsc::Sender<QueuedMessage>,
    in_flight: Arc<AtomicUsize>,
}

impl HttpBrokerClient {
    /// Build a client and spawn its background send task. Must be called
    /// from within a tokio runtime.
    pub fn new(config: &ClientConfig) -> Result<Self, BrokerError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| BrokerError::Transport(format!("failed to build HTTP client: {e}")))?;

        let (queue, rx) = mpsc::channel(SEND_QUEUE_CAPACITY);
        let in_flight = Arc::new(AtomicUsize::new(0));

        tokio::spawn(drain_queue(
            rx,
            http.clone(),
            config.broker_url.clone(),
            in_flight.clone(),
        ));

        Ok(Self {
            base_url: config.broker_url.clone(),
            http,
            queue,
            in_flight,
        })
    }
}

#[async_trait]
impl BrokerAdmin for HttpBrokerClient {
    async fn create_topic(&self, spec: &TopicSpec) -> Result<CreateTopicOutcome, BrokerError> {
        let url = format!("{}/api/v1/topics", self.base_url);
        let request = CreateTopicRequest {
            name: spec.name(),
            partitions: spec.partitions(),
            replication_factor: spec.replication_factor(),
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BrokerError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(CreateTopicOutcome::Created)
        } else if status == reqwest::StatusCode::CONFLICT {
            Ok(CreateTopicOutcome::AlreadyExists)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(BrokerError::Rejected {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl BrokerTransport for HttpBrokerClient {
    fn try_send(
        &self,
        topic: &str,
        key: Bytes,
        value: Option<Bytes>,
    ) -> Result<(), SubmitError> {
        let message = QueuedMessage {
            topic: topic.to_string(),
            key,
            value,
        };

        // Count before hand-off so a concurrent flush never observes a
        // queued message as already drained.
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        match self.queue.try_send(message) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                Err(SubmitError::QueueFull)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                Err(SubmitError::Disconnected)
            }
        }
    }

    async fn flush(&self, timeout: Duration) -> usize {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let remaining = self.in_flight.load(Ordering::SeqCst);
            if remaining == 0 || tokio::time::Instant::now() >= deadline {
                return remaining;
            }
            tokio::time::sleep(FLUSH_POLL_INTERVAL).await;
        }
    }

    fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

/// Background task: POST queued messages to the broker in arrival order.
///
/// Delivery failures are logged and the message is dropped; per-message
/// delivery is independent and a failure must not wedge the queue.
async fn drain_queue(
    mut rx: mpsc::Receiver<QueuedMessage>,
    http: reqwest::Client,
    base_url: String,
    in_flight: Arc<AtomicUsize>,
) {
    let url = format!("{base_url}/api/v1/produce");

    while let Some(message) = rx.recv().await {
        let request = ProduceRequest {
            topic: message.topic,
            key: BASE64.encode(&message.key),
            value: message.value.as_ref().map(|v| BASE64.encode(v)),
        };

        match http.post(&url).json(&request).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(topic = %request.topic, "message acknowledged");
            }
            Ok(response) => {
                error!(
                    topic = %request.topic,
                    status = %response.status(),
                    "broker rejected message"
                );
            }
            Err(e) => {
                error!(topic = %request.topic, error = %e, "failed to deliver message");
            }
        }

        // Acknowledged or failed, the message is no longer in flight.
        in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    info!("broker send queue closed");
}
