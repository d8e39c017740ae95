//! eventline client: producers with managed topic lifecycle, plus the
//! consumer-side adapter.
//!
//! A [`ProducerCore`] publishes schema-validated events onto one topic of
//! the broker. Construction provisions the topic (idempotently, once per
//! process per name) and resolves schemas before the first publish; close
//! drains outstanding sends with a bounded wait and reports what was left.
//!
//! # Producer
//!
//! ```ignore
//! use eventline_client::ProducerCore;
//! use std::time::Duration;
//!
//! let producer = ProducerCore::builder()
//!     .topic("weather")
//!     .key_schema(KEY_SCHEMA)
//!     .value_schema(VALUE_SCHEMA)
//!     .partitions(1)
//!     .replication_factor(1)
//!     .build()
//!     .await?;
//!
//! producer.publish(&key, Some(&value)).await?;
//!
//! let report = producer.close(Duration::from_secs(10)).await;
//! assert!(report.is_clean());
//! ```
//!
//! # Consumer
//!
//! ```ignore
//! use eventline_client::ConsumerAdapter;
//!
//! let mut adapter = ConsumerAdapter::new(binding, |value| model.apply(&value));
//!
//! // Inside the subscription loop:
//! adapter.on_message(raw_key, raw_value).await;
//! ```

pub mod broker;
pub mod config;
pub mod consumer;
pub mod error;
pub mod producer;
pub mod provisioner;

pub use broker::{
    BrokerAdmin, BrokerTransport, CreateTopicOutcome, HttpBrokerClient, SubmitError,
};
pub use config::ClientConfig;
pub use consumer::ConsumerAdapter;
pub use error::{BrokerError, ConfigError, ProducerError, ProvisionError, PublishError};
pub use producer::{CloseReport, ProducerBuilder, ProducerCore};
pub use provisioner::{TopicProvisioner, TopicRegistry, TopicSpec};
