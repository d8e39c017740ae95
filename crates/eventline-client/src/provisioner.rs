//! Idempotent topic provisioning.
//!
//! A process creates each topic at most once, no matter how many producer
//! instances reference it. The bookkeeping lives in a [`TopicRegistry`];
//! the broker call happens in [`TopicProvisioner::ensure_topic`].

use crate::broker::{BrokerAdmin, CreateTopicOutcome};
use crate::error::ProvisionError;
use lazy_static::lazy_static;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Desired shape of a topic, validated at construction and immutable
/// thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSpec {
    name: String,
    partitions: u32,
    replication_factor: u32,
}

impl TopicSpec {
    pub fn new(
        name: impl Into<String>,
        partitions: u32,
        replication_factor: u32,
    ) -> Result<Self, ProvisionError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ProvisionError::InvalidSpec("topic name is empty".to_string()));
        }
        if partitions == 0 {
            return Err(ProvisionError::InvalidSpec(format!(
                "topic '{name}' needs at least one partition"
            )));
        }
        if replication_factor == 0 {
            return Err(ProvisionError::InvalidSpec(format!(
                "topic '{name}' needs a replication factor of at least 1"
            )));
        }

        Ok(Self {
            name,
            partitions,
            replication_factor,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn partitions(&self) -> u32 {
        self.partitions
    }

    pub fn replication_factor(&self) -> u32 {
        self.replication_factor
    }
}

lazy_static! {
    static ref PROCESS_REGISTRY: TopicRegistry = TopicRegistry::new();
}

/// Set of topic names already provisioned.
///
/// Membership is monotonic: names are added on successful provisioning,
/// never removed. Clones share the same underlying set. The registry is an
/// explicit constructor parameter everywhere it is used; the only implicit
/// thing about [`TopicRegistry::process_wide`] is its lifetime.
#[derive(Clone)]
pub struct TopicRegistry {
    provisioned: Arc<Mutex<HashSet<String>>>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self {
            provisioned: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// The process-lifetime default instance, shared by every producer that
    /// does not inject its own registry. Reset only by process restart.
    pub fn process_wide() -> TopicRegistry {
        PROCESS_REGISTRY.clone()
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.provisioned.lock().await.contains(name)
    }

    pub async fn len(&self) -> usize {
        self.provisioned.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.provisioned.lock().await.is_empty()
    }
}

impl Default for TopicRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Ensures topics exist on the broker, with at most one create attempt per
/// name per registry.
pub struct TopicProvisioner {
    admin: Arc<dyn BrokerAdmin>,
    registry: TopicRegistry,
}

impl TopicProvisioner {
    pub fn new(admin: Arc<dyn BrokerAdmin>, registry: TopicRegistry) -> Self {
        Self { admin, registry }
    }

    /// Ensure the topic described by `spec` exists.
    ///
    /// A name already in the registry returns immediately without touching
    /// the broker. Otherwise one create request is issued; `Created` and
    /// `AlreadyExists` both succeed and mark the name. Any other rejection
    /// propagates and leaves the registry unmodified, so a later call may
    /// retry. Retry policy belongs to the caller, not here.
    ///
    /// The registry lock is held across the broker call: two instances
    /// racing on the same name issue exactly one create request.
    pub async fn ensure_topic(&self, spec: &TopicSpec) -> Result<(), ProvisionError> {
        let mut provisioned = self.registry.provisioned.lock().await;

        if provisioned.contains(spec.name()) {
            debug!(topic = spec.name(), "topic already provisioned, skipping");
            return Ok(());
        }

        match self.admin.create_topic(spec).await? {
            CreateTopicOutcome::Created => {
                info!(
                    topic = spec.name(),
                    partitions = spec.partitions(),
                    replication_factor = spec.replication_factor(),
                    "topic created"
                );
            }
            CreateTopicOutcome::AlreadyExists => {
                debug!(topic = spec.name(), "topic already exists on the broker");
            }
        }

        provisioned.insert(spec.name().to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BrokerError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockAdmin {
        calls: AtomicUsize,
        outcome: fn() -> Result<CreateTopicOutcome, BrokerError>,
    }

    impl MockAdmin {
        fn new(outcome: fn() -> Result<CreateTopicOutcome, BrokerError>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                outcome,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BrokerAdmin for MockAdmin {
        async fn create_topic(
            &self,
            _spec: &TopicSpec,
        ) -> Result<CreateTopicOutcome, BrokerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.outcome)()
        }
    }

    fn spec(name: &str) -> TopicSpec {
        TopicSpec::new(name, 1, 1).unwrap()
    }

    #[test]
    fn spec_rejects_zero_partitions() {
        assert!(matches!(
            TopicSpec::new("t", 0, 1),
            Err(ProvisionError::InvalidSpec(_))
        ));
    }

    #[test]
    fn spec_rejects_zero_replication() {
        assert!(matches!(
            TopicSpec::new("t", 1, 0),
            Err(ProvisionError::InvalidSpec(_))
        ));
    }

    #[test]
    fn spec_rejects_empty_name() {
        assert!(matches!(
            TopicSpec::new("", 1, 1),
            Err(ProvisionError::InvalidSpec(_))
        ));
    }

    #[tokio::test]
    async fn ensure_twice_creates_once() {
        let admin = MockAdmin::new(|| Ok(CreateTopicOutcome::Created));
        let provisioner = TopicProvisioner::new(admin.clone(), TopicRegistry::new());

        provisioner.ensure_topic(&spec("weather")).await.unwrap();
        provisioner.ensure_topic(&spec("weather")).await.unwrap();

        assert_eq!(admin.calls(), 1);
    }

    #[tokio::test]
    async fn already_exists_counts_as_success() {
        let admin = MockAdmin::new(|| Ok(CreateTopicOutcome::AlreadyExists));
        let registry = TopicRegistry::new();
        let provisioner = TopicProvisioner::new(admin.clone(), registry.clone());

        provisioner.ensure_topic(&spec("weather")).await.unwrap();

        assert!(registry.contains("weather").await);
        assert_eq!(admin.calls(), 1);
    }

    #[tokio::test]
    async fn rejection_leaves_registry_unmodified() {
        let admin = MockAdmin::new(|| {
            Err(BrokerError::Rejected {
                status: 403,
                message: "not authorized".to_string(),
            })
        });
        let registry = TopicRegistry::new();
        let provisioner = TopicProvisioner::new(admin.clone(), registry.clone());

        let err = provisioner.ensure_topic(&spec("weather")).await.unwrap_err();
        assert!(matches!(err, ProvisionError::Broker(_)));
        assert!(!registry.contains("weather").await);

        // The failed attempt was not recorded, so a retry reaches the broker.
        let _ = provisioner.ensure_topic(&spec("weather")).await;
        assert_eq!(admin.calls(), 2);
    }

    #[tokio::test]
    async fn concurrent_ensure_creates_once() {
        let admin = MockAdmin::new(|| Ok(CreateTopicOutcome::Created));
        let registry = TopicRegistry::new();

        let a = TopicProvisioner::new(admin.clone(), registry.clone());
        let b = TopicProvisioner::new(admin.clone(), registry.clone());

        let spec_a = spec("weather");
        let spec_b = spec("weather");
        let (ra, rb) = tokio::join!(
            a.ensure_topic(&spec_a),
            b.ensure_topic(&spec_b)
        );
        ra.unwrap();
        rb.unwrap();

        assert_eq!(admin.calls(), 1);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn distinct_topics_each_get_created() {
        let admin = MockAdmin::new(|| Ok(CreateTopicOutcome::Created));
        let registry = TopicRegistry::new();
        let provisioner = TopicProvisioner::new(admin.clone(), registry.clone());

        provisioner.ensure_topic(&spec("weather")).await.unwrap();
        provisioner.ensure_topic(&spec("arrivals")).await.unwrap();

        assert_eq!(admin.calls(), 2);
        assert_eq!(registry.len().await, 2);
    }
}
