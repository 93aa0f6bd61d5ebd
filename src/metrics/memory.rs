use std::collections::HashMap;
use std::sync::RwLock;

use super::{MetricFamily, MetricObservation, MetricSink};
use crate::error::{ExporterError, Result};

type SeriesKey = (String, Vec<String>);

/// A minimal in-memory sink, used in tests and for inspecting a single poll
#[derive(Default)]
pub struct MemorySink {
    series: RwLock<HashMap<SeriesKey, f64>>,
}

impl MemorySink {
    /// Create a new, empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of one series, if it has been set
    pub fn get(&self, family: &str, label_values: &[&str]) -> Option<f64> {
        let key = (
            family.to_string(),
            label_values.iter().map(|v| v.to_string()).collect(),
        );
        self.series.read().ok()?.get(&key).copied()
    }

    /// Number of series set for one family
    pub fn count(&self, family: &str) -> usize {
        self.series
            .read()
            .map(|series| series.keys().filter(|(name, _)| name == family).count())
            .unwrap_or(0)
    }

    /// Total number of series across all families
    pub fn len(&self) -> usize {
        self.series.read().map(|series| series.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every series of one family, sorted by label values
    pub fn observations(&self, family: &str) -> Vec<MetricObservation> {
        let mut found: Vec<MetricObservation> = self
            .series
            .read()
            .map(|series| {
                series
                    .iter()
                    .filter(|((name, _), _)| name == family)
                    .map(|((name, labels), value)| MetricObservation {
                        family: name.clone(),
                        label_values: labels.clone(),
                        value: *value,
                    })
                    .collect()
            })
            .unwrap_or_default();
        found.sort_by(|a, b| a.label_values.cmp(&b.label_values));
        found
    }
}

impl MetricSink for MemorySink {
    fn set_gauge(&self, family: &MetricFamily, label_values: &[&str], value: f64) -> Result<()> {
        family.check_arity(label_values)?;

        let mut series = self
            .series
            .write()
            .map_err(|_| ExporterError::Metric("Lock poisoned".to_string()))?;
        series.insert(
            (
                family.name.to_string(),
                label_values.iter().map(|v| v.to_string()).collect(),
            ),
            value,
        );
        Ok(())
    }
}
