//! Collectors, one per metric family group
//!
//! A collector performs one poll: it calls the API, decodes each response into
//! a typed record, and writes gauges to the sink. Any error ends the poll;
//! gauges written before the error keep their new values and everything else
//! keeps its previous value.
mod capacity;
mod chart;
mod effective_sla;
mod failed_jobs;
mod live_mount;
mod node;
mod relic;
mod sla_domain;
mod storage;

pub use capacity::{ObjectCapacityCollector, ObjectType};
pub use chart::ChartCollector;
pub use effective_sla::EffectiveSlaCollector;
pub use failed_jobs::{EventDetail, EventSeries, FailedJobsCollector};
pub use live_mount::LiveMountCollector;
pub use node::NodeCollector;
pub use relic::RelicCollector;
pub use sla_domain::SlaDomainCollector;
pub use storage::StorageCollector;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::client::{ApiClient, DEFAULT_TIMEOUT_SECS};
use crate::config::Intervals;
use crate::error::Result;
use crate::identity::ClusterIdentity;
use crate::metrics::{MetricFamily, MetricSink};

/// Everything a poll needs, shared read-only by all collector tasks
#[derive(Clone)]
pub struct CollectContext {
    pub client: Arc<dyn ApiClient>,
    pub identity: Arc<ClusterIdentity>,
    pub sink: Arc<dyn MetricSink>,
    /// Timeout passed to every API call
    pub timeout_secs: u64,
}

impl CollectContext {
    pub fn new(client: Arc<dyn ApiClient>, identity: ClusterIdentity, sink: Arc<dyn MetricSink>) -> Self {
        Self {
            client,
            identity: Arc::new(identity),
            sink,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn cluster_name(&self) -> &str {
        &self.identity.name
    }

    /// GET through the shared client with the configured timeout
    pub async fn get(&self, api_version: &str, path: &str) -> Result<serde_json::Value> {
        self.client.get(api_version, path, self.timeout_secs).await
    }

    pub fn set(&self, family: &MetricFamily, label_values: &[&str], value: f64) -> Result<()> {
        self.sink.set_gauge(family, label_values, value)
    }

    /// Set the gauge only when a value was observed
    pub fn set_present(&self, family: &MetricFamily, label_values: &[&str], value: Option<f64>) -> Result<()> {
        match value {
            Some(value) => self.set(family, label_values, value),
            None => Ok(()),
        }
    }
}

/// A unit of polling work run on its own fixed interval
#[async_trait]
pub trait Collector: Send + Sync + 'static {
    /// Get the collector name
    fn name(&self) -> &str;

    /// Delay between the end of one poll and the start of the next
    fn interval(&self) -> Duration;

    /// Perform one poll
    async fn run(&self, ctx: &CollectContext) -> Result<()>;
}

/// Every collector the exporter runs, with intervals taken from `intervals`
pub fn all(intervals: &Intervals) -> Vec<Arc<dyn Collector>> {
    let secs = Duration::from_secs;
    vec![
        Arc::new(StorageCollector::new(secs(intervals.storage_secs))),
        Arc::new(NodeCollector::new(secs(intervals.node_secs))),
        Arc::new(ChartCollector::job_stats(secs(intervals.job_stats_secs))),
        Arc::new(ChartCollector::compliance(secs(intervals.compliance_secs))),
        Arc::new(ObjectCapacityCollector::new(ObjectType::Mssql, secs(intervals.capacity_secs))),
        Arc::new(ObjectCapacityCollector::new(ObjectType::VsphereVm, secs(intervals.capacity_secs))),
        Arc::new(RelicCollector::new(secs(intervals.relic_secs))),
        Arc::new(LiveMountCollector::new(secs(intervals.live_mount_secs))),
        Arc::new(SlaDomainCollector::new(secs(intervals.sla_domain_secs))),
        Arc::new(EffectiveSlaCollector::new(secs(intervals.effective_sla_secs))),
        Arc::new(FailedJobsCollector::new(secs(intervals.failed_jobs_secs))),
    ]
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_collectors_have_distinct_names() {
        let collectors = all(&Intervals::default());
        let names: HashSet<_> = collectors.iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names.len(), collectors.len());
        assert_eq!(collectors.len(), 11);
    }

    #[test]
    fn test_default_intervals() {
        let collectors = all(&Intervals::default());
        let interval = |name: &str| collectors.iter().find(|c| c.name() == name).unwrap().interval();

        assert_eq!(interval("storage"), Duration::from_secs(60));
        assert_eq!(interval("node"), Duration::from_secs(60));
        assert_eq!(interval("sla_compliance"), Duration::from_secs(3600));
        assert_eq!(interval("mssql_capacity"), Duration::from_secs(3600));
        assert_eq!(interval("live_mount"), Duration::from_secs(3600));
        assert_eq!(interval("failed_jobs"), Duration::from_secs(300));
    }
}
