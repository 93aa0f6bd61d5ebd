use async_trait::async_trait;
use log::debug;
use serde_json::json;
use std::time::Duration;

use super::{CollectContext, Collector};
use crate::error::Result;
use crate::metrics::{MetricFamily, families};
use crate::paginate::Row;
use crate::report::{self, ReportHandle};

/// Object types with their own capacity gauges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Mssql,
    VsphereVm,
}

impl ObjectType {
    /// Value of the report's `objectType` filter
    pub fn filter(&self) -> &'static str {
        match self {
            ObjectType::Mssql => "Mssql",
            ObjectType::VsphereVm => "VmwareVirtualMachine",
        }
    }

    fn families(&self) -> (&'static MetricFamily, &'static MetricFamily) {
        match self {
            ObjectType::Mssql => (&families::MSSQL_CAPACITY_LOCAL, &families::MSSQL_CAPACITY_ARCHIVE),
            ObjectType::VsphereVm => (&families::VSPHERE_CAPACITY_LOCAL, &families::VSPHERE_CAPACITY_ARCHIVE),
        }
    }
}

/// Storage consumed by one protected object
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectCapacity {
    pub object_name: String,
    pub object_id: String,
    pub location: String,
    pub local_bytes: f64,
    pub archive_bytes: f64,
}

impl ObjectCapacity {
    pub fn from_row(row: &Row) -> Self {
        Self {
            object_name: row.text("ObjectName", "null"),
            object_id: row.text_last_of(&["ObjectId", "ObjectLinkingId"], "null"),
            location: row.text("Location", "null"),
            local_bytes: row.number("LocalStorage", 0.0),
            archive_bytes: row.number("ArchiveStorage", 0.0),
        }
    }
}

/// Local and archive capacity for every object of one type
pub struct ObjectCapacityCollector {
    object_type: ObjectType,
    interval: Duration,
}

impl ObjectCapacityCollector {
    pub fn new(object_type: ObjectType, interval: Duration) -> Self {
        Self { object_type, interval }
    }
}

#[async_trait]
impl Collector for ObjectCapacityCollector {
    fn name(&self) -> &str {
        match self.object_type {
            ObjectType::Mssql => "mssql_capacity",
            ObjectType::VsphereVm => "vsphere_capacity",
        }
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self, ctx: &CollectContext) -> Result<()> {
        let client = ctx.client.as_ref();
        let handle = ReportHandle::resolve(client, report::OBJECT_PROTECTION_SUMMARY, ctx.timeout_secs).await?;
        let (local, archive) = self.object_type.families();

        let filters = json!({ "objectType": self.object_type.filter() });
        let mut rows = handle.table(client, Some(filters), ctx.timeout_secs);
        while let Some(row) = rows.next_row().await? {
            let object = ObjectCapacity::from_row(&row);
            let labels = [
                ctx.cluster_name(),
                object.object_name.as_str(),
                object.object_id.as_str(),
                object.location.as_str(),
            ];
            ctx.set(local, &labels, object.local_bytes)?;
            ctx.set(archive, &labels, object.archive_bytes)?;
        }

        debug!(
            "{} objects of type {} over {} pages",
            rows.rows_yielded(),
            self.object_type.filter(),
            rows.pages_fetched()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockClient;
    use crate::collector::testing::context;
    use serde_json::Value;

    const LOOKUP: &str = "/report?report_template=ObjectProtectionSummary&report_type=Canned";
    const TABLE: &str = "/report/OPS/table";

    fn page(start: usize, rows: usize, cursor: Option<&str>) -> Value {
        let grid: Vec<Value> = (start..start + rows)
            .map(|i| json!([format!("db{}", i), format!("id{}", i), "sql01", "1024", "0"]))
            .collect();
        json!({
            "columns": ["ObjectName", "ObjectId", "Location", "LocalStorage", "ArchiveStorage"],
            "dataGrid": grid,
            "hasMore": cursor.is_some(),
            "cursor": cursor.unwrap_or("")
        })
    }

    #[tokio::test]
    async fn test_two_pages_emit_every_row() {
        let client = MockClient::new()
            .on_get(LOOKUP, json!({"data": [{"id": "OPS"}]}))
            .on_post(TABLE, page(0, 100, Some("X")))
            .on_post(TABLE, page(100, 37, None));
        let (ctx, client, sink) = context(client);

        ObjectCapacityCollector::new(ObjectType::Mssql, Duration::from_secs(3600))
            .run(&ctx)
            .await
            .unwrap();

        assert_eq!(sink.count("rubrik_mssql_db_capacity_local_used_bytes"), 137);
        assert_eq!(sink.count("rubrik_mssql_db_capacity_archive_used_bytes"), 137);
        assert_eq!(
            sink.get("rubrik_mssql_db_capacity_local_used_bytes", &["brik", "db136", "id136", "sql01"]),
            Some(1024.0)
        );
        assert_eq!(client.count("POST", TABLE), 2);
    }

    #[tokio::test]
    async fn test_vsphere_filter_and_defaults() {
        let client = MockClient::new()
            .on_get(LOOKUP, json!({"data": [{"id": "OPS"}]}))
            .on_post(
                TABLE,
                json!({
                    "columns": ["ObjectId", "ObjectName", "ObjectLinkingId", "LocalStorage"],
                    "dataGrid": [["vm-1", "web", "link-1", "not a number"]],
                    "hasMore": false
                }),
            );
        let (ctx, client, sink) = context(client);

        ObjectCapacityCollector::new(ObjectType::VsphereVm, Duration::from_secs(3600))
            .run(&ctx)
            .await
            .unwrap();

        let labels = ["brik", "web", "link-1", "null"];
        assert_eq!(sink.get("rubrik_vsphere_vm_capacity_local_used_bytes", &labels), Some(0.0));
        assert_eq!(sink.get("rubrik_vsphere_vm_capacity_archive_used_bytes", &labels), Some(0.0));

        let body = client.calls().into_iter().find_map(|c| c.body).unwrap();
        assert_eq!(body["requestFilters"]["objectType"], "VmwareVirtualMachine");
    }

    #[tokio::test]
    async fn test_second_page_failure_keeps_first_page() {
        let client = MockClient::new()
            .on_get(LOOKUP, json!({"data": [{"id": "OPS"}]}))
            .on_post(TABLE, page(0, 10, Some("X")))
            .on_post(TABLE, json!("not a table"));
        let (ctx, _, sink) = context(client);

        let result = ObjectCapacityCollector::new(ObjectType::Mssql, Duration::from_secs(3600))
            .run(&ctx)
            .await;

        assert!(result.is_err());
        assert_eq!(sink.count("rubrik_mssql_db_capacity_local_used_bytes"), 10);
    }
}
