//! Gauge families and the sinks observations are written to
pub mod families;
pub mod memory;

pub use memory::MemorySink;

use log::debug;
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;

use crate::error::{ExporterError, Result};

/// A gauge family: name, help text, and the label names every series carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricFamily {
    pub name: &'static str,
    pub help: &'static str,
    pub labels: &'static [&'static str],
}

impl MetricFamily {
    pub const fn new(name: &'static str, help: &'static str, labels: &'static [&'static str]) -> Self {
        Self { name, help, labels }
    }

    /// Fail unless `label_values` matches the declared label arity
    pub fn check_arity(&self, label_values: &[&str]) -> Result<()> {
        if label_values.len() == self.labels.len() {
            Ok(())
        } else {
            Err(ExporterError::Metric(format!(
                "{} takes {} labels, got {}",
                self.name,
                self.labels.len(),
                label_values.len()
            )))
        }
    }
}

/// One gauge value for one label combination
#[derive(Debug, Clone, PartialEq)]
pub struct MetricObservation {
    pub family: String,
    pub label_values: Vec<String>,
    pub value: f64,
}

/// Destination for gauge values
///
/// Implementations must accept concurrent writes from every collector task.
/// Setting a label combination again replaces its value; nothing is ever
/// evicted, so a series that stops appearing keeps its last value.
pub trait MetricSink: Send + Sync + 'static {
    fn set_gauge(&self, family: &MetricFamily, label_values: &[&str], value: f64) -> Result<()>;
}

/// Prometheus registry holding one `GaugeVec` per declared family
///
/// Built once at startup and shared by reference with every collector.
pub struct MetricRegistry {
    registry: Registry,
    gauges: HashMap<&'static str, (MetricFamily, GaugeVec)>,
}

impl MetricRegistry {
    /// Register every family in `families`
    pub fn new(families: &[MetricFamily]) -> Result<Self> {
        let registry = Registry::new();
        let mut gauges = HashMap::with_capacity(families.len());

        for family in families {
            let gauge = GaugeVec::new(Opts::new(family.name, family.help), family.labels)?;
            registry.register(Box::new(gauge.clone()))?;
            gauges.insert(family.name, (*family, gauge));
        }

        debug!("Registered {} metric families", gauges.len());
        Ok(Self { registry, gauges })
    }

    /// Registry with every family the exporter publishes
    pub fn with_all_families() -> Result<Self> {
        Self::new(families::ALL)
    }

    /// Encode every family in the Prometheus text exposition format
    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::with_capacity(8192);
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| ExporterError::Metric(e.to_string()))
    }
}

impl MetricSink for MetricRegistry {
    fn set_gauge(&self, family: &MetricFamily, label_values: &[&str], value: f64) -> Result<()> {
        let (declared, gauge) = self
            .gauges
            .get(family.name)
            .ok_or_else(|| ExporterError::Metric(format!("{} is not registered", family.name)))?;
        declared.check_arity(label_values)?;
        gauge.get_metric_with_label_values(label_values)?.set(value);
        Ok(())
    }
}
