//! Runs every collector on its own fixed interval
use log::{error, info};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::collector::{CollectContext, Collector};

/// Owns the collector set and one polling task per collector
///
/// Each task polls, then sleeps for the collector's interval, so polls of one
/// collector never overlap. A failed poll is logged and the schedule carries on.
pub struct Scheduler {
    collectors: Vec<Arc<dyn Collector>>,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    /// Create a scheduler with no collectors
    pub fn new() -> Self {
        Self {
            collectors: Vec::new(),
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Add several collectors
    pub fn with_collectors(mut self, collectors: Vec<Arc<dyn Collector>>) -> Self {
        self.collectors.extend(collectors);
        self
    }

    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    /// Spawn one polling task per collector
    pub async fn start(&self, ctx: CollectContext) -> Vec<JoinHandle<()>> {
        *self.running.write().await = true;

        self.collectors
            .iter()
            .map(|collector| {
                let collector = Arc::clone(collector);
                let running = Arc::clone(&self.running);
                let ctx = ctx.clone();

                tokio::spawn(async move {
                    info!(
                        "Starting collector {} every {:?}",
                        collector.name(),
                        collector.interval()
                    );

                    while *running.read().await {
                        if let Err(e) = collector.run(&ctx).await {
                            error!("Error from collector {}: {}", collector.name(), e);
                        }
                        tokio::time::sleep(collector.interval()).await;
                    }

                    info!("Stopped collector {}", collector.name());
                })
            })
            .collect()
    }

    /// Ask every task to exit after its current sleep
    pub async fn stop(&self) {
        *self.running.write().await = false;
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
