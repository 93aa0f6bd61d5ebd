use async_trait::async_trait;
use log::warn;
use std::time::Duration;

use super::{CollectContext, Collector};
use crate::error::Result;
use crate::extract::{FromNode, Node, decode, decode_data};
use crate::metrics::families;

struct NodeSummary {
    id: Option<String>,
}

impl FromNode for NodeSummary {
    fn from_node(node: &Node<'_>) -> Self {
        Self { id: node.string("id") }
    }
}

struct NodeDetail {
    status: Option<String>,
}

impl FromNode for NodeDetail {
    fn from_node(node: &Node<'_>) -> Self {
        Self { status: node.string("status") }
    }
}

impl NodeDetail {
    fn is_ok(&self) -> bool {
        self.status.as_deref() == Some("OK")
    }
}

/// Most recent samples from a node's stats window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeStats {
    /// CPU usage as a ratio (the API reports a percentage)
    pub cpu_ratio: Option<f64>,
    pub bytes_received: Option<f64>,
    pub bytes_transmitted: Option<f64>,
}

fn last_stat(samples: &[Node<'_>]) -> Option<f64> {
    samples.last().and_then(|sample| sample.number("stat"))
}

impl FromNode for NodeStats {
    fn from_node(node: &Node<'_>) -> Self {
        let network = node.child("networkStat");
        Self {
            cpu_ratio: last_stat(&node.objects("cpuStat")).map(|pct| pct / 100.0),
            bytes_received: network.and_then(|n| last_stat(&n.objects("bytesReceived"))),
            bytes_transmitted: network.and_then(|n| last_stat(&n.objects("bytesTransmitted"))),
        }
    }
}

/// Per-node status, CPU and network gauges
pub struct NodeCollector {
    interval: Duration,
}

impl NodeCollector {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

#[async_trait]
impl Collector for NodeCollector {
    fn name(&self) -> &str {
        "node"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self, ctx: &CollectContext) -> Result<()> {
        let nodes: Vec<NodeSummary> = decode_data(&ctx.get("internal", "/node").await?, "/node")?;

        for node_id in nodes.into_iter().filter_map(|n| n.id) {
            let labels = [ctx.cluster_name(), node_id.as_str()];

            let path = format!("/node/{}", node_id);
            let detail: NodeDetail = decode(&ctx.get("internal", &path).await?, &path)?;
            if detail.status.is_none() {
                warn!("Node {} reported no status", node_id);
            }
            ctx.set(&families::NODE_STATUS, &labels, if detail.is_ok() { 1.0 } else { 0.0 })?;

            let path = format!("/node/{}/stats?range=-6min", node_id);
            let stats: NodeStats = decode(&ctx.get("internal", &path).await?, &path)?;
            ctx.set_present(&families::NODE_CPU, &labels, stats.cpu_ratio)?;
            ctx.set_present(&families::NODE_NETWORK_RECEIVED, &labels, stats.bytes_received)?;
            ctx.set_present(&families::NODE_NETWORK_TRANSMITTED, &labels, stats.bytes_transmitted)?;
        }
        Ok(())
    }
}
