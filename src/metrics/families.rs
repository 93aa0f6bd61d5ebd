//! Every gauge family the exporter publishes
use super::MetricFamily;

const CLUSTER: &[&str] = &["clusterName"];
const NODE: &[&str] = &["clusterName", "nodeId"];
const OBJECT_CAPACITY: &[&str] = &["clusterName", "objectName", "objectID", "location"];
const RELIC: &[&str] = &["ClusterName", "ObjectName", "ObjectId"];

// storage summary
pub const TOTAL_STORAGE: MetricFamily =
    MetricFamily::new("rubrik_total_storage_bytes", "Total storage in Rubrik cluster.", CLUSTER);
pub const USED_STORAGE: MetricFamily =
    MetricFamily::new("rubrik_used_storage_bytes", "Used storage in Rubrik cluster.", CLUSTER);
pub const AVAILABLE_STORAGE: MetricFamily =
    MetricFamily::new("rubrik_available_storage_bytes", "Available storage in Rubrik cluster.", CLUSTER);
pub const SNAPSHOT_STORAGE: MetricFamily =
    MetricFamily::new("rubrik_snapshot_storage_bytes", "Snapshot storage in Rubrik cluster.", CLUSTER);
pub const LIVEMOUNT_STORAGE: MetricFamily =
    MetricFamily::new("rubrik_livemount_storage_bytes", "Live Mount storage in Rubrik cluster.", CLUSTER);
pub const MISC_STORAGE: MetricFamily =
    MetricFamily::new("rubrik_misc_storage_bytes", "Miscellaneous storage in Rubrik cluster.", CLUSTER);
pub const RUNWAY_REMAINING: MetricFamily =
    MetricFamily::new("rubrik_runway_remaining", "Runway remaining, in days, on Rubrik cluster.", CLUSTER);

// node
pub const NODE_STATUS: MetricFamily = MetricFamily::new(
    "rubrik_node_status",
    "Status of node in Rubrik cluster (1 is OK, 0 is anything else).",
    NODE,
);
pub const NODE_CPU: MetricFamily =
    MetricFamily::new("rubrik_node_cpu_ratio", "Percentage CPU usage of Rubrik node.", NODE);
pub const NODE_NETWORK_RECEIVED: MetricFamily = MetricFamily::new(
    "rubrik_node_network_received_bytes",
    "Network received byte statistic of Rubrik node.",
    NODE,
);
pub const NODE_NETWORK_TRANSMITTED: MetricFamily = MetricFamily::new(
    "rubrik_node_network_transmitted_bytes",
    "Network transmitted byte statistic of Rubrik node.",
    NODE,
);

// 24h job outcomes
pub const JOBS_SUCCEEDED_24H: MetricFamily =
    MetricFamily::new("rubrik_24h_succeeded_jobs", "Last 24 hours succeeded jobs in Rubrik cluster.", CLUSTER);
pub const JOBS_FAILED_24H: MetricFamily =
    MetricFamily::new("rubrik_24h_failed_jobs", "Last 24 hours failed jobs in Rubrik cluster.", CLUSTER);
pub const JOBS_CANCELLED_24H: MetricFamily =
    MetricFamily::new("rubrik_24h_cancelled_jobs", "Last 24 hours cancelled jobs in Rubrik cluster.", CLUSTER);

// SLA compliance
pub const SLA_COMPLIANT: MetricFamily = MetricFamily::new(
    "rubrik_compliant_object_count",
    "Number of SLA compliant objects in Rubrik cluster.",
    CLUSTER,
);
pub const SLA_NON_COMPLIANT: MetricFamily = MetricFamily::new(
    "rubrik_non_compliant_object_count",
    "Number of non-SLA compliant objects in Rubrik cluster.",
    CLUSTER,
);

// per-object capacity
pub const MSSQL_CAPACITY_LOCAL: MetricFamily = MetricFamily::new(
    "rubrik_mssql_db_capacity_local_used_bytes",
    "Local storage consumption for SQL DB snapshots.",
    OBJECT_CAPACITY,
);
pub const MSSQL_CAPACITY_ARCHIVE: MetricFamily = MetricFamily::new(
    "rubrik_mssql_db_capacity_archive_used_bytes",
    "Archive storage consumption for SQL DB snapshots.",
    OBJECT_CAPACITY,
);
pub const VSPHERE_CAPACITY_LOCAL: MetricFamily = MetricFamily::new(
    "rubrik_vsphere_vm_capacity_local_used_bytes",
    "Local storage consumption for VMware vSphere VM snapshots.",
    OBJECT_CAPACITY,
);
pub const VSPHERE_CAPACITY_ARCHIVE: MetricFamily = MetricFamily::new(
    "rubrik_vsphere_vm_capacity_archive_used_bytes",
    "Archive storage consumption for VMware vSphere VM snapshots.",
    OBJECT_CAPACITY,
);

// relics
pub const RELIC_LOCAL_STORAGE: MetricFamily = MetricFamily::new(
    "rubrik_relic_local_storage_bytes",
    "Total storage used on local Rubrik cluster by relic objects",
    RELIC,
);
pub const RELIC_ARCHIVE_STORAGE: MetricFamily = MetricFamily::new(
    "rubrik_relic_archive_storage_bytes",
    "Total storage used in archive locations by relic objects",
    RELIC,
);

pub const MSSQL_LIVE_MOUNT_AGE: MetricFamily = MetricFamily::new(
    "rubrik_mssql_live_mount_age_seconds",
    "Age of SQL DB live mounts.",
    &["clusterName", "sourceDatabaseName", "sourceDatabaseId", "mountedDatabaseName"],
);

pub const MSSQL_FAILED_JOB: MetricFamily = MetricFamily::new(
    "rubrik_mssql_failed_job",
    "Information for failed Rubrik MSSQL Backup job.",
    &[
        "clusterName",
        "objectName",
        "objectID",
        "location",
        "startTime",
        "endTime",
        "objectLogicalSize",
        "duration",
        "eventDate",
    ],
);

pub const SLA_DOMAIN_SUMMARY: MetricFamily = MetricFamily::new(
    "rubrik_sla_domain_summary",
    "Return summary information for an SLA domain",
    &[
        "primaryClusterId",
        "slaDomainName",
        "slaDomainId",
        "maxLocalRetentionLimit",
        "archivalLocationName",
        "replicationTargetname",
        "hourlyFrequency",
        "hourlyRetention",
        "dailyFrequency",
        "dailyRetention",
        "weeklyFrequency",
        "weeklyRetention",
        "monthlyFrequency",
        "monthlyRetention",
        "quarterlyFrequency",
        "quarterlyRetention",
        "yearlyFrequency",
        "yearlyRetention",
    ],
);

pub const SNAPPABLE_EFFECTIVE_SLA: MetricFamily = MetricFamily::new(
    "rubrik_snappable_effective_sla",
    "Return the slaDomain information for snappables",
    &["clusterName", "objectName", "objectType", "objectID", "location", "slaDomain"],
);

/// All families, in registration order
pub const ALL: &[MetricFamily] = &[
    TOTAL_STORAGE,
    USED_STORAGE,
    AVAILABLE_STORAGE,
    SNAPSHOT_STORAGE,
    LIVEMOUNT_STORAGE,
    MISC_STORAGE,
    RUNWAY_REMAINING,
    NODE_STATUS,
    NODE_CPU,
    NODE_NETWORK_RECEIVED,
    NODE_NETWORK_TRANSMITTED,
    JOBS_SUCCEEDED_24H,
    JOBS_FAILED_24H,
    JOBS_CANCELLED_24H,
    SLA_COMPLIANT,
    SLA_NON_COMPLIANT,
    MSSQL_CAPACITY_LOCAL,
    MSSQL_CAPACITY_ARCHIVE,
    VSPHERE_CAPACITY_LOCAL,
    VSPHERE_CAPACITY_ARCHIVE,
    RELIC_LOCAL_STORAGE,
    RELIC_ARCHIVE_STORAGE,
    MSSQL_LIVE_MOUNT_AGE,
    MSSQL_FAILED_JOB,
    SLA_DOMAIN_SUMMARY,
    SNAPPABLE_EFFECTIVE_SLA,
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = ALL.iter().map(|f| f.name).collect();
        assert_eq!(names.len(), ALL.len());
    }

    #[test]
    fn test_label_sets() {
        assert_eq!(NODE_STATUS.labels, &["clusterName", "nodeId"]);
        assert_eq!(SLA_DOMAIN_SUMMARY.labels.len(), 18);
        assert_eq!(ALL.len(), 26);
    }
}
