//! Error types for eventline client operations.
//!
//! Construction-time failures (`ConfigError`, `ProvisionError`, the
//! `ProducerError` umbrella) abort producer construction and propagate to
//! the caller. `PublishError` is per-message and never terminates the
//! producer instance. Close-time shortfalls are reported via
//! [`CloseReport`](crate::producer::CloseReport), not an error.

use eventline_schema::SchemaError;
use thiserror::Error;

/// Missing or malformed endpoint configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("builder field `{0}` is required")]
    MissingField(&'static str),
}

/// Broker collaborator failures.
#[derive(Error, Debug)]
pub enum BrokerError {
    /// The broker could not be reached at all.
    #[error("broker transport error: {0}")]
    Transport(String),

    /// The broker answered and said no. "Already exists" is never reported
    /// here; it is a success arm of topic creation.
    #[error("broker rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// Topic provisioning failures.
///
/// Not retried automatically; the registry is left unmodified so a later
/// call may try again.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("invalid topic spec: {0}")]
    InvalidSpec(String),

    #[error(transparent)]
    Broker(#[from] BrokerError),
}

/// Per-message publish failures.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error(transparent)]
    Serialization(#[from] SchemaError),

    #[error("send buffer is full")]
    BufferFull,

    #[error("producer is closed")]
    Closed,
}

/// Construction-time failures for a producer. Nothing partially usable is
/// ever returned alongside one of these.
#[derive(Error, Debug)]
pub enum ProducerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
