//! Topic-to-schema binding with cached registry resolution.
//!
//! A [`SchemaBinding`] pairs one topic with its key schema and optional
//! value schema. Schemas are resolved against the registry lazily, at most
//! once per binding; concurrent `resolve` calls share a single in-flight
//! registration instead of issuing duplicates.

use crate::error::{Result, SchemaError};
use crate::registry::{SchemaFormat, SchemaRegistry};
use crate::wire;
use apache_avro::types::Value;
use apache_avro::Schema;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// A schema resolved against the registry: the registry-assigned id plus
/// the parsed Avro schema used for encoding.
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    pub id: i32,
    pub schema: Schema,
}

/// Resolved key and (optional) value schemas for one topic.
#[derive(Debug, Clone)]
pub struct ResolvedSchemas {
    pub key: ResolvedSchema,
    pub value: Option<ResolvedSchema>,
}

/// Binds a topic to its schemas and serializes values under them.
///
/// Each producer or consumer owns its binding exclusively; the resolution
/// cache lives and dies with the instance.
pub struct SchemaBinding {
    topic: String,
    key_schema: String,
    value_schema: Option<String>,
    registry: Arc<dyn SchemaRegistry>,
    resolved: OnceCell<ResolvedSchemas>,
}

impl SchemaBinding {
    pub fn new(
        topic: impl Into<String>,
        key_schema: impl Into<String>,
        value_schema: Option<String>,
        registry: Arc<dyn SchemaRegistry>,
    ) -> Self {
        Self {
            topic: topic.into(),
            key_schema: key_schema.into(),
            value_schema,
            registry,
            resolved: OnceCell::new(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn has_value_schema(&self) -> bool {
        self.value_schema.is_some()
    }

    /// Resolve the bound schemas against the registry.
    ///
    /// The first caller performs the registration; everyone else waits on it
    /// and shares the cached result.
    pub async fn resolve(&self) -> Result<&ResolvedSchemas> {
        self.resolved
            .get_or_try_init(|| async {
                let key = self
                    .resolve_one(&key_subject(&self.topic), &self.key_schema)
                    .await?;

                let value = match &self.value_schema {
                    Some(definition) => Some(
                        self.resolve_one(&value_subject(&self.topic), definition)
                            .await?,
                    ),
                    None => None,
                };

                debug!(
                    topic = %self.topic,
                    key_schema_id = key.id,
                    value_schema_id = value.as_ref().map(|v| v.id),
                    "schemas resolved"
                );

                Ok(ResolvedSchemas { key, value })
            })
            .await
    }

    async fn resolve_one(&self, subject: &str, definition: &str) -> Result<ResolvedSchema> {
        let schema = Schema::parse_str(definition)
            .map_err(|e| SchemaError::InvalidSchema(format!("{subject}: {e}")))?;

        let id = self
            .registry
            .register(subject, definition, SchemaFormat::Avro)
            .await?;

        Ok(ResolvedSchema { id, schema })
    }

    /// Serialize a key under the resolved key schema.
    pub async fn serialize_key(&self, value: &Value) -> Result<Bytes> {
        let resolved = self.resolve().await?;
        encode(&resolved.key, value, &key_subject(&self.topic))
    }

    /// Serialize a value under the resolved value schema.
    ///
    /// Fails with [`SchemaError::NoValueSchema`] when the binding was built
    /// without one.
    pub async fn serialize_value(&self, value: &Value) -> Result<Bytes> {
        let resolved = self.resolve().await?;
        let value_schema = resolved
            .value
            .as_ref()
            .ok_or_else(|| SchemaError::NoValueSchema(self.topic.clone()))?;

        encode(value_schema, value, &value_subject(&self.topic))
    }

    /// Decode a framed value payload under the resolved value schema.
    pub async fn decode_value(&self, raw: &[u8]) -> Result<Value> {
        let resolved = self.resolve().await?;
        let value_schema = resolved
            .value
            .as_ref()
            .ok_or_else(|| SchemaError::NoValueSchema(self.topic.clone()))?;

        let (schema_id, datum) = wire::unframe(raw)?;
        if schema_id != value_schema.id {
            // Writer may have registered under a different id; the datum is
            // still read with this binding's schema.
            debug!(
                topic = %self.topic,
                writer_schema_id = schema_id,
                reader_schema_id = value_schema.id,
                "schema id mismatch on decode"
            );
        }

        apache_avro::from_avro_datum(&value_schema.schema, &mut &datum[..], None)
            .map_err(|e| SchemaError::Deserialization(e.to_string()))
    }
}

fn key_subject(topic: &str) -> String {
    format!("{topic}-key")
}

fn value_subject(topic: &str) -> String {
    format!("{topic}-value")
}

fn encode(resolved: &ResolvedSchema, value: &Value, subject: &str) -> Result<Bytes> {
    // Validate the shape first so a mismatch is reported as incompatibility
    // rather than a generic encoding failure.
    if !value.validate(&resolved.schema) {
        return Err(SchemaError::Incompatible {
            subject: subject.to_string(),
            reason: "value shape does not match the resolved schema".to_string(),
        });
    }

    let datum = apache_avro::to_avro_datum(&resolved.schema, value.clone())
        .map_err(|e| SchemaError::Serialization(e.to_string()))?;

    Ok(wire::frame(resolved.id, &datum))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const STRING_SCHEMA: &str = r#"{"type": "string"}"#;
    const WEATHER_SCHEMA: &str = r#"{
        "type": "record",
        "name": "Weather",
        "fields": [
            {"name": "temperature", "type": "double"},
            {"name": "status", "type": "string"}
        ]
    }"#;

    struct CountingRegistry {
        calls: AtomicUsize,
    }

    impl CountingRegistry {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SchemaRegistry for CountingRegistry {
        async fn register(&self, _: &str, _: &str, _: SchemaFormat) -> Result<i32> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(n as i32 + 1)
        }
    }

    fn weather_value() -> Value {
        Value::Record(vec![
            ("temperature".to_string(), Value::Double(70.0)),
            ("status".to_string(), Value::String("sunny".to_string())),
        ])
    }

    #[tokio::test]
    async fn resolve_is_cached() {
        let registry = CountingRegistry::new();
        let binding = SchemaBinding::new(
            "weather",
            STRING_SCHEMA,
            Some(WEATHER_SCHEMA.to_string()),
            registry.clone(),
        );

        binding.resolve().await.unwrap();
        binding.resolve().await.unwrap();

        // One registration per subject, cached thereafter.
        assert_eq!(registry.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_resolve_registers_once() {
        let registry = CountingRegistry::new();
        let binding =
            SchemaBinding::new("weather", STRING_SCHEMA, None, registry.clone());

        let (a, b) = tokio::join!(binding.resolve(), binding.resolve());
        a.unwrap();
        b.unwrap();

        assert_eq!(registry.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn serialize_key_frames_schema_id() {
        let binding =
            SchemaBinding::new("weather", STRING_SCHEMA, None, CountingRegistry::new());

        let encoded = binding
            .serialize_key(&Value::String("k1".to_string()))
            .await
            .unwrap();

        let (id, datum) = wire::unframe(&encoded).unwrap();
        assert_eq!(id, 1);
        assert!(!datum.is_empty());
    }

    #[tokio::test]
    async fn serialize_value_without_schema_fails() {
        let binding =
            SchemaBinding::new("weather", STRING_SCHEMA, None, CountingRegistry::new());

        let err = binding
            .serialize_value(&weather_value())
            .await
            .unwrap_err();

        assert!(matches!(err, SchemaError::NoValueSchema(_)));
    }

    #[tokio::test]
    async fn incompatible_value_rejected() {
        let binding = SchemaBinding::new(
            "weather",
            STRING_SCHEMA,
            Some(WEATHER_SCHEMA.to_string()),
            CountingRegistry::new(),
        );

        // Missing the required "status" field.
        let partial = Value::Record(vec![(
            "temperature".to_string(),
            Value::Double(70.0),
        )]);

        let err = binding.serialize_value(&partial).await.unwrap_err();
        assert!(matches!(err, SchemaError::Incompatible { .. }));
    }

    #[tokio::test]
    async fn decode_roundtrip() {
        let binding = SchemaBinding::new(
            "weather",
            STRING_SCHEMA,
            Some(WEATHER_SCHEMA.to_string()),
            CountingRegistry::new(),
        );

        let encoded = binding.serialize_value(&weather_value()).await.unwrap();
        let decoded = binding.decode_value(&encoded).await.unwrap();

        assert_eq!(decoded, weather_value());
    }

    #[tokio::test]
    async fn decode_rejects_garbage() {
        let binding = SchemaBinding::new(
            "weather",
            STRING_SCHEMA,
            Some(WEATHER_SCHEMA.to_string()),
            CountingRegistry::new(),
        );

        assert!(binding.decode_value(b"\x01junk").await.is_err());
    }
}
