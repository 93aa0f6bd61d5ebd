//! Version routing for collectors whose endpoints changed between releases
use log::debug;
use std::fmt;
use std::str::FromStr;

use crate::client::ApiClient;
use crate::error::{ExporterError, Result};

/// First release served by the modern endpoint set
pub const MODERN_SINCE: (u32, u32) = (5, 2);

/// A parsed `major.minor[.patch]` cluster version
///
/// Build suffixes such as `5.1.2-p3-12345` are tolerated on the patch
/// component; major and minor must be plain integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClusterVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
}

impl FromStr for ClusterVersion {
    type Err = ExporterError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ExporterError::Version(format!("cannot parse cluster version '{}'", s));

        let mut parts = s.trim().splitn(3, '.');
        let major = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        let minor = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        let patch = match parts.next() {
            None => None,
            Some(rest) => {
                let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
                Some(digits.parse().map_err(|_| invalid())?)
            }
        };

        Ok(Self { major, minor, patch })
    }
}

impl fmt::Display for ClusterVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.patch {
            Some(patch) => write!(f, "{}.{}.{}", self.major, self.minor, patch),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}

/// Which endpoint and parsing recipe a version-sensitive collector runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionStrategy {
    Legacy,
    Modern,
}

impl ClusterVersion {
    pub fn strategy(&self) -> VersionStrategy {
        if (self.major, self.minor) < MODERN_SINCE {
            VersionStrategy::Legacy
        } else {
            VersionStrategy::Modern
        }
    }
}

/// Select the strategy for a reported version string
pub fn route(cluster_version: &str) -> Result<VersionStrategy> {
    let version: ClusterVersion = cluster_version.parse()?;
    Ok(version.strategy())
}

/// Ask the cluster for its version and route on it
pub async fn route_cluster(client: &dyn ApiClient, timeout_secs: u64) -> Result<VersionStrategy> {
    let reported = client.cluster_version(timeout_secs).await?;
    let strategy = route(&reported)?;
    debug!("Cluster version {} routes to {:?}", reported, strategy);
    Ok(strategy)
}
