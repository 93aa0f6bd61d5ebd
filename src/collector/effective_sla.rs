use async_trait::async_trait;
use std::time::Duration;

use super::{CollectContext, Collector};
use crate::error::Result;
use crate::metrics::families;
use crate::paginate::Row;
use crate::report::{self, ReportHandle};

/// The SLA domain in effect for one protected object
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveSla {
    pub object_name: String,
    pub object_type: String,
    pub object_id: String,
    pub location: String,
    pub sla_domain: String,
}

impl EffectiveSla {
    pub fn from_row(row: &Row) -> Self {
        Self {
            object_name: row.text("ObjectName", "null"),
            object_type: row.text("ObjectType", "null"),
            object_id: row.text_last_of(&["ObjectId", "ObjectLinkingId"], "null"),
            location: row.text("Location", "null"),
            sla_domain: row.text("SlaDomain", "null"),
        }
    }
}

pub struct EffectiveSlaCollector {
    interval: Duration,
}

impl EffectiveSlaCollector {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

#[async_trait]
impl Collector for EffectiveSlaCollector {
    fn name(&self) -> &str {
        "effective_sla"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self, ctx: &CollectContext) -> Result<()> {
        let client = ctx.client.as_ref();
        let handle = ReportHandle::resolve(client, report::OBJECT_PROTECTION_SUMMARY, ctx.timeout_secs).await?;

        let mut rows = handle.table(client, None, ctx.timeout_secs);
        while let Some(row) = rows.next_row().await? {
            let sla = EffectiveSla::from_row(&row);
            let labels = [
                ctx.cluster_name(),
                sla.object_name.as_str(),
                sla.object_type.as_str(),
                sla.object_id.as_str(),
                sla.location.as_str(),
                sla.sla_domain.as_str(),
            ];
            ctx.set(&families::SNAPPABLE_EFFECTIVE_SLA, &labels, 0.0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockClient;
    use crate::collector::testing::context;
    use serde_json::json;

    #[tokio::test]
    async fn test_unfiltered_table() {
        let client = MockClient::new()
            .on_get(
                "/report?report_template=ObjectProtectionSummary&report_type=Canned",
                json!({"data": [{"id": "OPS"}]}),
            )
            .on_post(
                "/report/OPS/table",
                json!({
                    "columns": ["ObjectName", "ObjectType", "ObjectLinkingId", "Location", "SlaDomain"],
                    "dataGrid": [
                        ["web01", "VmwareVirtualMachine", "vm-1", "vc01", "Gold"],
                        ["sales", "Mssql", "db-1", "sql01", null]
                    ],
                    "hasMore": false
                }),
            );
        let (ctx, client, sink) = context(client);

        EffectiveSlaCollector::new(Duration::from_secs(3600)).run(&ctx).await.unwrap();

        assert_eq!(
            sink.get(
                "rubrik_snappable_effective_sla",
                &["brik", "web01", "VmwareVirtualMachine", "vm-1", "vc01", "Gold"]
            ),
            Some(0.0)
        );
        assert_eq!(
            sink.get("rubrik_snappable_effective_sla", &["brik", "sales", "Mssql", "db-1", "sql01", "null"]),
            Some(0.0)
        );

        let body = client.calls().into_iter().find_map(|c| c.body).unwrap();
        assert_eq!(body, json!({"limit": 100}));
    }
}
