//! Publish a handful of weather events to the "weather" topic.
//!
//! Expects EVENTLINE_BROKER_URL and EVENTLINE_SCHEMA_REGISTRY_URL to point
//! at a running broker and schema registry.

use apache_avro::types::Value;
use eventline_client::ProducerCore;
use std::time::Duration;

const KEY_SCHEMA: &str = r#"{"type": "long"}"#;
const VALUE_SCHEMA: &str = r#"{
    "type": "record",
    "name": "Weather",
    "fields": [
        {"name": "temperature", "type": "double"},
        {"name": "status", "type": "string"}
    ]
}"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let producer = ProducerCore::builder()
        .topic("weather")
        .key_schema(KEY_SCHEMA)
        .value_schema(VALUE_SCHEMA)
        .partitions(1)
        .replication_factor(1)
        .build()
        .await?;

    for (temperature, status) in [(70.0, "sunny"), (48.5, "cloudy"), (33.2, "windy")] {
        let key = Value::Long(ProducerCore::time_millis());
        let value = Value::Record(vec![
            ("temperature".to_string(), Value::Double(temperature)),
            ("status".to_string(), Value::String(status.to_string())),
        ]);

        producer.publish(&key, Some(&value)).await?;
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    let report = producer.close(Duration::from_secs(10)).await;
    println!("closed with {} messages still in flight", report.in_flight);

    Ok(())
}
