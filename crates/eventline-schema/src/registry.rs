//! Schema registry collaborator.
//!
//! The [`SchemaRegistry`] trait is the seam the rest of eventline programs
//! against; [`HttpSchemaRegistry`] speaks the registry's REST surface.

use crate::error::{Result, SchemaError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wire format identifiers accepted by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaFormat {
    Avro,
    Protobuf,
    Json,
}

impl SchemaFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaFormat::Avro => "AVRO",
            SchemaFormat::Protobuf => "PROTOBUF",
            SchemaFormat::Json => "JSON",
        }
    }
}

/// Resolve-or-register contract.
///
/// Registering a definition that already exists for the subject returns the
/// existing id, so `register` doubles as lookup.
#[async_trait]
pub trait SchemaRegistry: Send + Sync {
    async fn register(
        &self,
        subject: &str,
        definition: &str,
        format: SchemaFormat,
    ) -> Result<i32>;
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    schema: &'a str,

    #[serde(rename = "schemaType")]
    schema_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct RegisterResponse {
    id: i32,
}

/// HTTP client for a Confluent-compatible schema registry.
pub struct HttpSchemaRegistry {
    base_url: String,
    http: reqwest::Client,
}

impl HttpSchemaRegistry {
    /// Create a client for the registry at `base_url`
    /// (e.g. "http://localhost:8081").
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SchemaError::Registry(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into(),
            http,
        })
    }
}

#[async_trait]
impl SchemaRegistry for HttpSchemaRegistry {
    async fn register(
        &self,
        subject: &str,
        definition: &str,
        format: SchemaFormat,
    ) -> Result<i32> {
        let url = format!("{}/subjects/{}/versions", self.base_url, subject);
        let request = RegisterRequest {
            schema: definition,
            schema_type: format.as_str(),
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SchemaError::Registry(format!("register request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SchemaError::Registry(format!(
                "registration of '{subject}' rejected with status {status}: {body}"
            )));
        }

        let parsed: RegisterResponse = response
            .json()
            .await
            .map_err(|e| SchemaError::Registry(format!("malformed registry response: {e}")))?;

        tracing::debug!(subject, schema_id = parsed.id, "schema registered");
        Ok(parsed.id)
    }
}
