//! Schema Error Types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SchemaError>;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("value does not conform to schema for subject '{subject}': {reason}")]
    Incompatible { subject: String, reason: String },

    #[error("no value schema configured for topic '{0}'")]
    NoValueSchema(String),

    #[error("invalid schema definition: {0}")]
    InvalidSchema(String),

    #[error("schema registry error: {0}")]
    Registry(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),
}
