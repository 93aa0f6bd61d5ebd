use async_trait::async_trait;
use log::debug;
use std::time::Duration;

use super::{CollectContext, Collector};
use crate::error::Result;
use crate::metrics::{MetricFamily, families};
use crate::report::{self, ReportHandle};

const CHART_ID: &str = "chart0";

const JOB_OUTCOMES: &[(&str, MetricFamily)] = &[
    ("Succeeded", families::JOBS_SUCCEEDED_24H),
    ("Failed", families::JOBS_FAILED_24H),
    ("Canceled", families::JOBS_CANCELLED_24H),
];

const COMPLIANCE: &[(&str, MetricFamily)] = &[
    ("InCompliance", families::SLA_COMPLIANT),
    ("NonCompliance", families::SLA_NON_COMPLIANT),
];

/// Reads the first chart of a canned report and maps column labels to gauges
pub struct ChartCollector {
    name: &'static str,
    template: &'static str,
    columns: &'static [(&'static str, MetricFamily)],
    interval: Duration,
}

impl ChartCollector {
    /// Succeeded, failed and cancelled jobs over the last 24 hours
    pub fn job_stats(interval: Duration) -> Self {
        Self {
            name: "job_stats",
            template: report::PROTECTION_TASKS_DETAILS,
            columns: JOB_OUTCOMES,
            interval,
        }
    }

    /// Objects in and out of SLA compliance
    pub fn compliance(interval: Duration) -> Self {
        Self {
            name: "sla_compliance",
            template: report::SLA_COMPLIANCE_SUMMARY,
            columns: COMPLIANCE,
            interval,
        }
    }

    fn family_for(&self, label: &str) -> Option<&MetricFamily> {
        self.columns
            .iter()
            .find(|(column, _)| *column == label)
            .map(|(_, family)| family)
    }
}

#[async_trait]
impl Collector for ChartCollector {
    fn name(&self) -> &str {
        self.name
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self, ctx: &CollectContext) -> Result<()> {
        let client = ctx.client.as_ref();
        let handle = ReportHandle::resolve(client, self.template, ctx.timeout_secs).await?;

        for column in handle.chart(client, CHART_ID, ctx.timeout_secs).await? {
            match self.family_for(&column.label) {
                Some(family) => ctx.set(family, &[ctx.cluster_name()], column.value)?,
                None => debug!("Ignoring chart column {} of {}", column.label, self.template),
            }
        }
        Ok(())
    }
}
