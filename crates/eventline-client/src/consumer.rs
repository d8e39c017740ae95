//! Consumer-side adapter: decode, forward, isolate failures.

use apache_avro::types::Value;
use eventline_schema::SchemaBinding;
use std::fmt::Display;
use tracing::{trace, warn};

/// Bridges raw broker messages to a typed model-update callback.
///
/// Decode failures and callback failures are logged and dropped, so a
/// single malformed or unexpected message never halts the subscription
/// loop driving this adapter. A bad message costs one update, not the
/// pipeline.
pub struct ConsumerAdapter<F, E>
where
    F: FnMut(Value) -> Result<(), E>,
    E: Display,
{
    binding: SchemaBinding,
    apply: F,
}

impl<F, E> ConsumerAdapter<F, E>
where
    F: FnMut(Value) -> Result<(), E>,
    E: Display,
{
    pub fn new(binding: SchemaBinding, apply: F) -> Self {
        Self { binding, apply }
    }

    pub fn topic(&self) -> &str {
        self.binding.topic()
    }

    /// Handle one raw message from the subscription loop.
    ///
    /// The callback is only ever invoked with a successfully decoded value;
    /// a message that fails to decode is dropped before the model sees it.
    pub async fn on_message(&mut self, raw_key: &[u8], raw_value: &[u8]) {
        let decoded = match self.binding.decode_value(raw_value).await {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    topic = self.binding.topic(),
                    key_len = raw_key.len(),
                    error = %e,
                    "dropping message that failed to decode"
                );
                return;
            }
        };

        match (self.apply)(decoded) {
            Ok(()) => trace!(topic = self.binding.topic(), "model updated"),
            Err(e) => {
                warn!(
                    topic = self.binding.topic(),
                    error = %e,
                    "model update failed, continuing"
                );
            }
        }
    }
}
