use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::warn;
use std::time::Duration;

use super::{CollectContext, Collector};
use crate::error::Result;
use crate::extract::{FromNode, Node, decode_data};
use crate::metrics::families;

const PATH: &str = "/mssql/db/mount";

/// A live-mounted SQL Server database
#[derive(Debug, Clone, PartialEq)]
pub struct LiveMount {
    pub source_database_name: String,
    pub source_database_id: String,
    pub mounted_database_name: String,
    pub creation_date: Option<String>,
}

impl FromNode for LiveMount {
    fn from_node(node: &Node<'_>) -> Self {
        Self {
            source_database_name: node.str_or("sourceDatabaseName", "null"),
            source_database_id: node.str_or("sourceDatabaseId", "null"),
            mounted_database_name: node.str_or("mountedDatabaseName", "null"),
            creation_date: node.string("creationDate"),
        }
    }
}

impl LiveMount {
    /// Seconds between the mount's creation and `now`
    pub fn age_secs(&self, now: DateTime<Utc>) -> Option<f64> {
        let created = self.creation_date.as_deref()?;
        match DateTime::parse_from_rfc3339(created) {
            Ok(created) => {
                let age = now.signed_duration_since(created.with_timezone(&Utc));
                Some(age.num_milliseconds() as f64 / 1000.0)
            }
            Err(e) => {
                warn!(
                    "Live mount {} has unparsable creation date '{}': {}",
                    self.mounted_database_name, created, e
                );
                None
            }
        }
    }
}

pub struct LiveMountCollector {
    interval: Duration,
}

impl LiveMountCollector {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

#[async_trait]
impl Collector for LiveMountCollector {
    fn name(&self) -> &str {
        "live_mount"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self, ctx: &CollectContext) -> Result<()> {
        let mounts: Vec<LiveMount> = decode_data(&ctx.get("v1", PATH).await?, PATH)?;
        let now = Utc::now();

        for mount in &mounts {
            let Some(age) = mount.age_secs(now) else {
                continue;
            };
            let labels = [
                ctx.cluster_name(),
                mount.source_database_name.as_str(),
                mount.source_database_id.as_str(),
                mount.mounted_database_name.as_str(),
            ];
            ctx.set(&families::MSSQL_LIVE_MOUNT_AGE, &labels, age)?;
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

    fn mount(created: Option<&str>) -> LiveMount {
        LiveMount {
            source_database_name: "sales".into(),
            source_database_id: "MssqlDatabase:::1".into(),
            mounted_database_name: "sales_lm".into(),
            creation_date: created.map(str::to_string),
        }
    }

    #[test]
    fn test_age_from_creation_date() {
        let now = DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z").unwrap().with_timezone(&Utc);
        assert_eq!(mount(Some("2024-03-01T11:00:00Z")).age_secs(now), Some(3600.0));
        assert_eq!(mount(Some("2024-03-01T13:00:00+02:00")).age_secs(now), Some(3600.0));
        assert_eq!(mount(Some("yesterday")).age_secs(now), None);
        assert_eq!(mount(None).age_secs(now), None);
    }

    #[tokio::test]
    async fn test_unparsable_rows_are_skipped() {
        let client = MockClient::new().on_get(
            PATH,
            json!({"data": [
                {"sourceDatabaseName": "sales", "sourceDatabaseId": "DB1", "mountedDatabaseName": "lm1",
                 "creationDate": "2020-01-01T00:00:00.000Z"},
                {"sourceDatabaseName": "hr", "sourceDatabaseId": "DB2", "mountedDatabaseName": "lm2",
                 "creationDate": "garbage"}
            ]}),
        );
        let (ctx, _, sink) = context(client);

        LiveMountCollector::new(Duration::from_secs(3600)).run(&ctx).await.unwrap();

        assert_eq!(sink.count("rubrik_mssql_live_mount_age_seconds"), 1);
        let age = sink
            .get("rubrik_mssql_live_mount_age_seconds", &["brik", "sales", "DB1", "lm1"])
            .unwrap();
        assert!(age > 4.0 * 365.0 * 86400.0);
    }
}
