//! Polls a Rubrik CDM cluster and republishes selected fields as Prometheus gauges

pub mod client;
pub mod collector;
pub mod config;
pub mod error;
pub mod extract;
pub mod identity;
pub mod metrics;
pub mod paginate;
pub mod report;
pub mod scheduler;
pub mod server;
pub mod util;
pub mod version;

/// Re-export of commonly used types for convenience
pub mod prelude {
    pub use crate::client::{ApiClient, CdmClient};
    pub use crate::collector::{CollectContext, Collector};
    pub use crate::config::{ExporterConfig, Intervals, LogLevel};
    pub use crate::error::{ExporterError, Result};
    pub use crate::extract::{FromNode, Node};
    pub use crate::identity::ClusterIdentity;
    pub use crate::metrics::{MetricFamily, MetricRegistry, MetricSink};
    pub use crate::paginate::{PageSource, Paginator};
    pub use crate::scheduler::Scheduler;
    pub use crate::version::VersionStrategy;
}

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
