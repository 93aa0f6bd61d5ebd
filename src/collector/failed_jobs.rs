//! Failed SQL Server backup jobs
//!
//! Clusters before 5.2 list failed event series on the internal API and carry
//! the object and timing fields on each listing entry; one gauge is set per
//! failed series. Later clusters list the latest failed events on v1, and the
//! series record itself carries the object and timing fields; one gauge is set
//! per detail event of a failed series, keyed by that event's time.
use async_trait::async_trait;
use log::{debug, warn};
use std::time::Duration;

use super::{CollectContext, Collector};
use crate::error::Result;
use crate::extract::{FromNode, Node, decode_data};
use crate::metrics::families;
use crate::version::{VersionStrategy, route_cluster};

const LEGACY_LISTING: &str = "/event_series?status=Failure&event_type=Backup&object_type=Mssql";
const MODERN_LISTING: &str = "/event/latest?event_status=Failure&event_type=Backup&object_type=Mssql";
const FAILURE: &str = "Failure";

/// One status event inside an event series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventDetail {
    pub status: Option<String>,
    pub time: Option<String>,
}

impl EventDetail {
    fn from_node(node: &Node<'_>, status_key: &str) -> Self {
        Self {
            status: node.string(status_key),
            time: node.string("time"),
        }
    }
}

/// A backup job execution and the status events it produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSeries {
    pub id: String,
    pub details: Vec<EventDetail>,
}

impl EventSeries {
    fn from_node(id: &str, node: &Node<'_>, status_key: &str) -> Self {
        Self {
            id: id.to_string(),
            details: node
                .objects("eventDetailList")
                .iter()
                .map(|detail| EventDetail::from_node(detail, status_key))
                .collect(),
        }
    }

    /// True when any detail event reports a failure
    pub fn has_failed(&self) -> bool {
        self.details.iter().any(|d| d.status.as_deref() == Some(FAILURE))
    }
}

/// Object and timing labels of a failed job; absent fields render as "null"
#[derive(Debug, Clone, PartialEq)]
struct JobLabels {
    object_name: String,
    object_id: String,
    location: String,
    start_time: String,
    end_time: String,
    logical_size: String,
    duration: String,
    event_date: String,
}

impl FromNode for JobLabels {
    fn from_node(node: &Node<'_>) -> Self {
        let info = node.child("objectInfo");
        let object_field = |key: &str| match info {
            Some(info) => info.str_or(key, "null"),
            None => node.str_or(key, "null"),
        };

        Self {
            object_name: object_field("objectName"),
            object_id: object_field("objectId"),
            location: node.str_or("location", "null"),
            start_time: node.str_or("startTime", "null"),
            end_time: node.str_or("endTime", "null"),
            logical_size: node.str_or("objectLogicalSize", "null"),
            duration: node.str_or("duration", "null"),
            event_date: node.str_or("eventDate", "null"),
        }
    }
}

struct LegacyEntry {
    series_id: Option<String>,
    labels: JobLabels,
}

impl FromNode for LegacyEntry {
    fn from_node(node: &Node<'_>) -> Self {
        Self {
            series_id: node.string("eventSeriesId"),
            labels: JobLabels::from_node(node),
        }
    }
}

struct LatestEvent {
    series_id: Option<String>,
}

impl FromNode for LatestEvent {
    fn from_node(node: &Node<'_>) -> Self {
        Self {
            series_id: node.child("latestEvent").and_then(|e| e.string("eventSeriesId")),
        }
    }
}

pub struct FailedJobsCollector {
    interval: Duration,
}

impl FailedJobsCollector {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    fn emit(&self, ctx: &CollectContext, labels: &JobLabels) -> Result<()> {
        ctx.set(
            &families::MSSQL_FAILED_JOB,
            &[
                ctx.cluster_name(),
                labels.object_name.as_str(),
                labels.object_id.as_str(),
                labels.location.as_str(),
                labels.start_time.as_str(),
                labels.end_time.as_str(),
                labels.logical_size.as_str(),
                labels.duration.as_str(),
                labels.event_date.as_str(),
            ],
            1.0,
        )
    }

    async fn run_legacy(&self, ctx: &CollectContext) -> Result<()> {
        let entries: Vec<LegacyEntry> = decode_data(&ctx.get("internal", LEGACY_LISTING).await?, LEGACY_LISTING)?;

        for entry in &entries {
            let Some(id) = entry.series_id.as_deref() else {
                warn!("Failed job entry without an event series id, skipping");
                continue;
            };
            let path = format!("/event_series/{}", id);
            let body = ctx.get("internal", &path).await?;
            let series = EventSeries::from_node(id, &Node::new(&body, &path)?, "status");

            if series.has_failed() {
                self.emit(ctx, &entry.labels)?;
            }
        }
        Ok(())
    }

    async fn run_modern(&self, ctx: &CollectContext) -> Result<()> {
        let events: Vec<LatestEvent> = decode_data(&ctx.get("v1", MODERN_LISTING).await?, MODERN_LISTING)?;

        for id in events.into_iter().filter_map(|e| e.series_id) {
            let path = format!("/event_series/{}", id);
            let body = ctx.get("v1", &path).await?;
            let node = Node::new(&body, &path)?;
            let series = EventSeries::from_node(&id, &node, "eventStatus");
            if !series.has_failed() {
                continue;
            }

            let mut labels = JobLabels::from_node(&node);
            for detail in &series.details {
                labels.event_date = detail.time.clone().unwrap_or_else(|| "null".to_string());
                self.emit(ctx, &labels)?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Collector for FailedJobsCollector {
    fn name(&self) -> &str {
        "failed_jobs"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self, ctx: &CollectContext) -> Result<()> {
        let strategy = route_cluster(ctx.client.as_ref(), ctx.timeout_secs).await?;
        debug!("Collecting failed jobs with the {:?} recipe", strategy);
        match strategy {
            VersionStrategy::Legacy => self.run_legacy(ctx).await,
            VersionStrategy::Modern => self.run_modern(ctx).await,
        }
    }
}
