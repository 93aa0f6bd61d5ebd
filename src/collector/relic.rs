use async_trait::async_trait;
use std::time::Duration;

use super::{CollectContext, Collector};
use crate::error::Result;
use crate::extract::{FromNode, Node, decode_data};
use crate::metrics::families;

const PATH: &str = "/unmanaged_object?unmanaged_status=Relic";

/// An object no longer protected whose snapshots still consume storage
#[derive(Debug, Clone, PartialEq)]
pub struct Relic {
    pub name: String,
    pub id: String,
    pub local_storage: f64,
    pub archive_storage: f64,
}

impl FromNode for Relic {
    fn from_node(node: &Node<'_>) -> Self {
        Self {
            name: node.str_or("name", "null"),
            id: node.str_or("id", "null"),
            local_storage: node.number_or("localStorage", 0.0),
            archive_storage: node.number_or("archiveStorage", 0.0),
        }
    }
}

pub struct RelicCollector {
    interval: Duration,
}

impl RelicCollector {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

#[async_trait]
impl Collector for RelicCollector {
    fn name(&self) -> &str {
        "relic"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self, ctx: &CollectContext) -> Result<()> {
        let relics: Vec<Relic> = decode_data(&ctx.get("v1", PATH).await?, PATH)?;
        for relic in &relics {
            let labels = [ctx.cluster_name(), relic.name.as_str(), relic.id.as_str()];
            ctx.set(&families::RELIC_LOCAL_STORAGE, &labels, relic.local_storage)?;
            ctx.set(&families::RELIC_ARCHIVE_STORAGE, &labels, relic.archive_storage)?;
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
    async fn test_relic_storage() {
        let client = MockClient::new().on_get(
            PATH,
            json!({"data": [
                {"name": "old-vm", "id": "VM:::1", "localStorage": 500, "archiveStorage": 1500},
                {"name": "gone-db", "id": "DB:::2", "localStorage": null}
            ]}),
        );
        let (ctx, client, sink) = context(client);

        RelicCollector::new(Duration::from_secs(3600)).run(&ctx).await.unwrap();

        assert_eq!(sink.get("rubrik_relic_local_storage_bytes", &["brik", "old-vm", "VM:::1"]), Some(500.0));
        assert_eq!(sink.get("rubrik_relic_archive_storage_bytes", &["brik", "old-vm", "VM:::1"]), Some(1500.0));
        assert_eq!(sink.get("rubrik_relic_local_storage_bytes", &["brik", "gone-db", "DB:::2"]), Some(0.0));
        assert_eq!(client.calls()[0].api_version, "v1");
    }

    #[tokio::test]
    async fn test_missing_data_fails_cycle() {
        let client = MockClient::new().on_get(PATH, json!({"total": 0}));
        let (ctx, _, sink) = context(client);

        assert!(RelicCollector::new(Duration::from_secs(3600)).run(&ctx).await.is_err());
        assert!(sink.is_empty());
    }
}
