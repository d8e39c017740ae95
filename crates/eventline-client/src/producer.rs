//! Producer core: schema-bound publishing with managed topic lifecycle.
//!
//! Construction is two-phase and fail-fast: gather endpoint configuration,
//! provision the topic, resolve schemas, and only then hand back a usable
//! handle. A producer that exists is ready to publish; every failure mode
//! is observable before the first message.

use crate::broker::{BrokerAdmin, BrokerTransport, HttpBrokerClient, SubmitError};
use crate::config::ClientConfig;
use crate::error::{ConfigError, ProducerError, ProvisionError, PublishError};
use crate::provisioner::{TopicProvisioner, TopicRegistry, TopicSpec};
use apache_avro::types::Value;
use eventline_schema::{HttpSchemaRegistry, SchemaBinding, SchemaRegistry};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of a close: how many messages were still unacknowledged when the
/// flush deadline passed. Zero is a clean drain; anything else is potential
/// data loss the operator should see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseReport {
    pub in_flight: usize,
}

impl CloseReport {
    pub fn is_clean(&self) -> bool {
        self.in_flight == 0
    }
}

/// Schema-bound producer for a single topic.
///
/// Each instance owns its broker client handle exclusively; the only state
/// shared across instances is the topic registry. Publish is fire-and-forget
/// from the caller's perspective: the broker client runs its own send loop.
pub struct ProducerCore {
    spec: TopicSpec,
    binding: SchemaBinding,
    transport: Arc<dyn BrokerTransport>,
    closed: AtomicBool,
}

impl std::fmt::Debug for ProducerCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProducerCore")
            .field("spec", &self.spec)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl ProducerCore {
    pub fn builder() -> ProducerBuilder {
        ProducerBuilder::new()
    }

    /// Topic this producer publishes to.
    pub fn topic(&self) -> &str {
        self.spec.name()
    }

    /// Wall-clock milliseconds since the Unix epoch, for use as event
    /// timestamps and keys.
    pub fn time_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Publish one message.
    ///
    /// Serializes the key (and the value, when a value schema is bound) and
    /// hands the result to the broker client's send buffer. Returns once the
    /// hand-off completes; acknowledgment happens in the background and is
    /// accounted for at [`close`](Self::close) time.
    pub async fn publish(&self, key: &Value, value: Option<&Value>) -> Result<(), PublishError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PublishError::Closed);
        }

        let encoded_key = self.binding.serialize_key(key).await?;
        let encoded_value = match value {
            Some(v) => Some(self.binding.serialize_value(v).await?),
            None => None,
        };

        match self
            .transport
            .try_send(self.spec.name(), encoded_key, encoded_value)
        {
            Ok(()) => Ok(()),
            Err(SubmitError::QueueFull) => Err(PublishError::BufferFull),
            Err(SubmitError::Disconnected) => Err(PublishError::Closed),
        }
    }

    /// Drain outstanding sends and retire the producer.
    ///
    /// Blocks up to `timeout` and then always returns; a flush shortfall is
    /// reported, not thrown, because shutdown proceeds regardless. Publish
    /// calls made after close fail with [`PublishError::Closed`].
    pub async fn close(&self, timeout: Duration) -> CloseReport {
        if self.closed.swap(true, Ordering::AcqRel) {
            // Already closed; report the current transport state without
            // starting another flush.
            return CloseReport {
                in_flight: self.transport.in_flight(),
            };
        }

        let in_flight = self.transport.flush(timeout).await;
        if in_flight == 0 {
            info!(topic = self.spec.name(), "producer closed, all messages acknowledged");
        } else {
            warn!(
                topic = self.spec.name(),
                in_flight, "producer closed with messages still in flight"
            );
        }

        CloseReport { in_flight }
    }
}

/// Builder for [`ProducerCore`].
///
/// `topic` and `key_schema` are required. Collaborators default to the HTTP
/// implementations configured from the environment; tests inject their own.
pub struct ProducerBuilder {
    topic: Option<String>,
    key_schema: Option<String>,
    value_schema: Option<String>,
    partitions: u32,
    replication_factor: u32,
    config: Option<ClientConfig>,
    topic_registry: Option<TopicRegistry>,
    admin: Option<Arc<dyn BrokerAdmin>>,
    transport: Option<Arc<dyn BrokerTransport>>,
    schema_registry: Option<Arc<dyn SchemaRegistry>>,
}

impl ProducerBuilder {
    pub fn new() -> Self {
        Self {
            topic: None,
            key_schema: None,
            value_schema: None,
            partitions: 1,
            replication_factor: 1,
            config: None,
            topic_registry: None,
            admin: None,
            transport: None,
            schema_registry: None,
        }
    }

    pub fn topic(mut self, name: impl Into<String>) -> Self {
        self.topic = Some(name.into());
        self
    }

    /// Avro schema definition for message keys (required).
    pub fn key_schema(mut self, definition: impl Into<String>) -> Self {
        self.key_schema = Some(definition.into());
        self
    }

    /// Avro schema definition for message values. Producers without one
    /// publish key-only messages.
    pub fn value_schema(mut self, definition: impl Into<String>) -> Self {
        self.value_schema = Some(definition.into());
        self
    }

    pub fn partitions(mut self, partitions: u32) -> Self {
        self.partitions = partitions;
        self
    }

    pub fn replication_factor(mut self, replication_factor: u32) -> Self {
        self.replication_factor = replication_factor;
        self
    }

    /// Endpoint configuration. Defaults to reading the environment.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Registry recording which topics this process has provisioned.
    /// Defaults to the process-wide instance.
    pub fn topic_registry(mut self, registry: TopicRegistry) -> Self {
        self.topic_registry = Some(registry);
        self
    }

    /// Override the administrative collaborator.
    pub fn admin(mut self, admin: Arc<dyn BrokerAdmin>) -> Self {
        self.admin = Some(admin);
        self
    }

    /// Override the data-plane collaborator.
    pub fn transport(mut self, transport: Arc<dyn BrokerTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Override the schema-registry collaborator.
    pub fn schema_registry(mut self, registry: Arc<dyn SchemaRegistry>) -> Self {
        self.schema_registry = Some(registry);
        self
    }

    /// Build the producer: configuration, then topic provisioning, then
    /// schema resolution. Any failure aborts construction.
    pub async fn build(self) -> Result<ProducerCore, ProducerError> {
        let topic = self.topic.ok_or(ConfigError::MissingField("topic"))?;
        let key_schema = self
            .key_schema
            .ok_or(ConfigError::MissingField("key_schema"))?;

        let spec = TopicSpec::new(topic, self.partitions, self.replication_factor)?;

        // Endpoints are only needed when some collaborator falls back to its
        // HTTP default.
        let needs_config =
            self.admin.is_none() || self.transport.is_none() || self.schema_registry.is_none();
        let config = match (self.config, needs_config) {
            (Some(config), _) => Some(config),
            (None, true) => Some(ClientConfig::from_env()?),
            (None, false) => None,
        };

        let (admin, transport) = match (self.admin, self.transport) {
            (Some(admin), Some(transport)) => (admin, transport),
            (admin, transport) => {
                let config = config
                    .as_ref()
                    .ok_or(ConfigError::MissingField("config"))?;
                let client =
                    Arc::new(HttpBrokerClient::new(config).map_err(ProvisionError::from)?);
                (
                    admin.unwrap_or_else(|| client.clone() as Arc<dyn BrokerAdmin>),
                    transport.unwrap_or(client as Arc<dyn BrokerTransport>),
                )
            }
        };

        let schema_registry = match self.schema_registry {
            Some(registry) => registry,
            None => {
                let config = config
                    .as_ref()
                    .ok_or(ConfigError::MissingField("config"))?;
                Arc::new(HttpSchemaRegistry::new(config.schema_registry_url.clone())?)
                    as Arc<dyn SchemaRegistry>
            }
        };

        let registry = self.topic_registry.unwrap_or_else(TopicRegistry::process_wide);
        TopicProvisioner::new(admin, registry)
            .ensure_topic(&spec)
            .await?;

        let binding = SchemaBinding::new(spec.name(), key_schema, self.value_schema, schema_registry);
        binding.resolve().await?;

        info!(
            topic = spec.name(),
            partitions = spec.partitions(),
            "producer ready"
        );

        Ok(ProducerCore {
            spec,
            binding,
            transport,
            closed: AtomicBool::new(false),
        })
    }
}

impl Default for ProducerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
