use async_trait::async_trait;
use std::time::Duration;

use super::{CollectContext, Collector};
use crate::error::Result;
use crate::extract::{FromNode, Node, decode_data, format_label};
use crate::metrics::families;

const PATH: &str = "/sla_domain";

/// Snapshot cadence tiers, in label order
const TIERS: [&str; 6] = ["hourly", "daily", "weekly", "monthly", "quarterly", "yearly"];

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Frequency {
    pub frequency: f64,
    pub retention: f64,
}

/// An SLA domain definition
#[derive(Debug, Clone, PartialEq)]
pub struct SlaDomain {
    pub primary_cluster_id: String,
    pub name: String,
    pub id: String,
    pub max_local_retention_limit: f64,
    pub archival_location: String,
    pub replication_target: String,
    /// Indexed like `TIERS`; a tier the domain does not use is all zero
    pub frequencies: [Frequency; 6],
}

fn first_location(node: &Node<'_>, key: &str, default: &str) -> String {
    node.objects(key)
        .first()
        .map(|spec| spec.str_or("locationName", default))
        .unwrap_or_else(|| default.to_string())
}

impl FromNode for SlaDomain {
    fn from_node(node: &Node<'_>) -> Self {
        let mut frequencies = [Frequency::default(); 6];
        if let Some(schedule) = node.child("frequencies") {
            for (slot, tier) in frequencies.iter_mut().zip(TIERS) {
                if let Some(tier) = schedule.child(tier) {
                    *slot = Frequency {
                        frequency: tier.number_or("frequency", 0.0),
                        retention: tier.number_or("retention", 0.0),
                    };
                }
            }
        }

        Self {
            primary_cluster_id: node.str_or("primaryClusterId", "null"),
            name: node.str_or("name", "null"),
            id: node.str_or("id", "null"),
            max_local_retention_limit: node.number_or("maxLocalRetentionLimit", 0.0),
            archival_location: first_location(node, "archivalSpecs", "Not Archived"),
            replication_target: first_location(node, "replicationSpecs", "Not Replicated"),
            frequencies,
        }
    }
}

impl SlaDomain {
    /// Label values in the order the summary family declares them
    pub fn label_values(&self) -> Vec<String> {
        let mut labels = vec![
            self.primary_cluster_id.clone(),
            self.name.clone(),
            self.id.clone(),
            format_label(self.max_local_retention_limit),
            self.archival_location.clone(),
            self.replication_target.clone(),
        ];
        for tier in &self.frequencies {
            labels.push(format_label(tier.frequency));
            labels.push(format_label(tier.retention));
        }
        labels
    }
}

/// Publishes each SLA domain definition as an info-style gauge
pub struct SlaDomainCollector {
    interval: Duration,
}

impl SlaDomainCollector {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

#[async_trait]
impl Collector for SlaDomainCollector {
    fn name(&self) -> &str {
        "sla_domain"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self, ctx: &CollectContext) -> Result<()> {
        let domains: Vec<SlaDomain> = decode_data(&ctx.get("v2", PATH).await?, PATH)?;
        for domain in &domains {
            let labels = domain.label_values();
            let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
            ctx.set(&families::SLA_DOMAIN_SUMMARY, &labels, 0.0)?;
        }
        Ok(())
    }
}
