use log::info;
use serde_json::Value;

use crate::client::{ApiClient, DEFAULT_TIMEOUT_SECS};
use crate::error::{ExporterError, Result};
use crate::extract::{FromNode, Node, decode};
use crate::version::ClusterVersion;

/// Name and version of the polled cluster, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterIdentity {
    pub name: String,
    pub version_major: u32,
    pub version_minor: u32,
}

struct ClusterMe {
    name: Option<String>,
    version: Option<String>,
}

impl FromNode for ClusterMe {
    fn from_node(node: &Node<'_>) -> Self {
        Self {
            name: node.string("name"),
            version: node.string("version"),
        }
    }
}

impl ClusterIdentity {
    /// Build an identity from a `/cluster/me` body
    pub fn from_cluster_me(body: &Value) -> Result<Self> {
        let me: ClusterMe = decode(body, "/cluster/me").map_err(|e| ExporterError::Startup(e.to_string()))?;

        let name = me
            .name
            .ok_or_else(|| ExporterError::Startup("cluster name missing from /cluster/me".to_string()))?;
        let version = me
            .version
            .ok_or_else(|| ExporterError::Startup("cluster version missing from /cluster/me".to_string()))?;
        let parsed: ClusterVersion = version
            .parse()
            .map_err(|e: ExporterError| ExporterError::Startup(e.to_string()))?;

        Ok(Self {
            name,
            version_major: parsed.major,
            version_minor: parsed.minor,
        })
    }

    /// Resolve the identity of the cluster behind `client`
    ///
    /// Every failure is startup-fatal.
    pub async fn resolve(client: &dyn ApiClient) -> Result<Self> {
        let body = client
            .get("v1", "/cluster/me", DEFAULT_TIMEOUT_SECS)
            .await
            .map_err(|e| ExporterError::Startup(format!("cannot reach cluster: {}", e)))?;

        let identity = Self::from_cluster_me(&body)?;
        info!(
            "Cluster name: {} (version {}.{})",
            identity.name, identity.version_major, identity.version_minor
        );
        Ok(identity)
    }

    #[cfg(test)]
    pub(crate) fn test(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version_major: 5,
            version_minor: 1,
        }
    }
}
