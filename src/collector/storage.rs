use async_trait::async_trait;
use log::debug;
use std::time::Duration;

use super::{CollectContext, Collector};
use crate::error::Result;
use crate::extract::{FromNode, Node, decode};
use crate::metrics::families;

/// Cluster-wide storage summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemStorage {
    pub total: Option<f64>,
    pub used: Option<f64>,
    pub available: Option<f64>,
    pub snapshot: Option<f64>,
    pub live_mount: Option<f64>,
    pub miscellaneous: Option<f64>,
}

impl FromNode for SystemStorage {
    fn from_node(node: &Node<'_>) -> Self {
        Self {
            total: node.number("total"),
            used: node.number("used"),
            available: node.number("available"),
            snapshot: node.number("snapshot"),
            live_mount: node.number("liveMount"),
            miscellaneous: node.number("miscellaneous"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunwayRemaining {
    pub days: Option<f64>,
}

impl FromNode for RunwayRemaining {
    fn from_node(node: &Node<'_>) -> Self {
        Self { days: node.number("days") }
    }
}

/// Storage summary and runway gauges
pub struct StorageCollector {
    interval: Duration,
}

impl StorageCollector {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

#[async_trait]
impl Collector for StorageCollector {
    fn name(&self) -> &str {
        "storage"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self, ctx: &CollectContext) -> Result<()> {
        let cluster = [ctx.cluster_name()];

        let path = "/stats/system_storage";
        let storage: SystemStorage = decode(&ctx.get("internal", path).await?, path)?;
        debug!("System storage: {:?}", storage);

        ctx.set_present(&families::TOTAL_STORAGE, &cluster, storage.total)?;
        ctx.set_present(&families::USED_STORAGE, &cluster, storage.used)?;
        ctx.set_present(&families::AVAILABLE_STORAGE, &cluster, storage.available)?;
        ctx.set_present(&families::SNAPSHOT_STORAGE, &cluster, storage.snapshot)?;
        ctx.set_present(&families::LIVEMOUNT_STORAGE, &cluster, storage.live_mount)?;
        ctx.set_present(&families::MISC_STORAGE, &cluster, storage.miscellaneous)?;

        let path = "/stats/runway_remaining";
        let runway: RunwayRemaining = decode(&ctx.get("internal", path).await?, path)?;
        ctx.set_present(&families::RUNWAY_REMAINING, &cluster, runway.days)
    }
}
