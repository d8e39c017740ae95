//! Fold weather events into an in-memory model through a ConsumerAdapter.
//!
//! The broker subscription itself is broker-specific; this example feeds
//! the adapter directly to show the contract. Wire `adapter.on_message`
//! into your subscription loop's message callback.

use apache_avro::types::Value;
use eventline_client::{ClientConfig, ConsumerAdapter};
use eventline_schema::{HttpSchemaRegistry, SchemaBinding};
use std::sync::Arc;

const KEY_SCHEMA: &str = r#"{"type": "long"}"#;
const VALUE_SCHEMA: &str = r#"{
    "type": "record",
    "name": "Weather",
    "fields": [
        {"name": "temperature", "type": "double"},
        {"name": "status", "type": "string"}
    ]
}"#;

#[derive(Debug, Default)]
struct Weather {
    temperature: f64,
    status: String,
}

impl Weather {
    fn apply(&mut self, value: &Value) -> anyhow::Result<()> {
        let Value::Record(fields) = value else {
            anyhow::bail!("expected a weather record");
        };

        for (name, field) in fields {
            match (name.as_str(), field) {
                ("temperature", Value::Double(t)) => self.temperature = *t,
                ("status", Value::String(s)) => self.status = s.clone(),
                _ => {}
            }
        }

        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = ClientConfig::from_env()?;
    let registry = Arc::new(HttpSchemaRegistry::new(config.schema_registry_url.clone())?);

    let binding = SchemaBinding::new(
        "weather",
        KEY_SCHEMA,
        Some(VALUE_SCHEMA.to_string()),
        registry.clone(),
    );

    // A second binding stands in for the producer side of the pipeline.
    let producer_side = SchemaBinding::new(
        "weather",
        KEY_SCHEMA,
        Some(VALUE_SCHEMA.to_string()),
        registry,
    );
    let raw_value = producer_side
        .serialize_value(&Value::Record(vec![
            ("temperature".to_string(), Value::Double(70.0)),
            ("status".to_string(), Value::String("sunny".to_string())),
        ]))
        .await?;

    let mut weather = Weather::default();
    let mut adapter = ConsumerAdapter::new(binding, |value| weather.apply(&value));

    adapter.on_message(b"0", &raw_value).await;
    drop(adapter);

    println!("weather is now {:?}", weather);

    Ok(())
}
