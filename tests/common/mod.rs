#![allow(dead_code)]

use async_trait::async_trait;
use nidsboard::config::Config;
use nidsboard::logger::EventJournal;
use nidsboard::models::FeatureRecord;
use nidsboard::scorer::{ModelStatus, Scorer, ScorerError};
use nidsboard::service::DashboardService;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Modèle de score simulé : motif de scores répété, latence et panne réglables
pub struct ScriptedScorer {
    pattern: Vec<f64>,
    delay: Option<Duration>,
    failing: AtomicBool,
}

impl ScriptedScorer {
    pub fn new(pattern: Vec<f64>) -> Self {
        Self {
            pattern,
            delay: None,
            failing: AtomicBool::new(false),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Scorer for ScriptedScorer {
    async fn score(&self, records: &[FeatureRecord]) -> Result<Vec<f64>, ScorerError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ScorerError::Status(503));
        }
        Ok(self.pattern.iter().copied().cycle().take(records.len()).collect())
    }

    async fn status(&self) -> ModelStatus {
        ModelStatus {
            model_loaded: !self.failing.load(Ordering::SeqCst),
            features: Some(8),
            score_min: Some(0.0),
            score_max: Some(1.0),
        }
    }
}

pub fn test_config(tick_interval_ms: u64, batch_size: usize) -> Config {
    let mut config = Config::default();
    config.monitor.tick_interval_ms = tick_interval_ms;
    config.monitor.batch_size = batch_size;
    config
}

pub fn service_with(config: Config, scorer: Arc<ScriptedScorer>) -> DashboardService {
    DashboardService::new(config, scorer, Arc::new(EventJournal::console()))
}
