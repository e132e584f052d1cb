//! Surface de commande du tableau de bord
//!
//! Valide les commandes opérateur, les transmet au store et orchestre la
//! surveillance, les simulations, le rendu et l'export.

use crate::config::Config;
use crate::error::CommandError;
use crate::export::ExportDocument;
use crate::ingest::monitor::run_ticks;
use crate::ingest::{
    CapturedFlow, IngestPipeline, IngestReport, LiveMonitor, PendingBatch, ScenarioKind,
    MAX_CAPTURED_FLOWS,
};
use crate::logger::EventJournal;
use crate::models::{ConfigUpdate, DashboardSummary, DetectorConfig, SessionState};
use crate::render::{to_svg, Frame, TimelineRenderer};
use crate::scorer::{HttpScorer, ModelStatus, Scorer};
use crate::store::{StateStore, StoreCommand};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const MIN_THRESHOLD: f64 = 0.1;
pub const MAX_THRESHOLD: f64 = 0.9;

/// État du modèle tel que présenté à l'opérateur
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelReport {
    #[serde(flatten)]
    pub status: ModelStatus,
    pub scorer_degraded: bool,
}

/// Vérifie une mise à jour partielle de la configuration du détecteur
pub fn validate_update(update: &ConfigUpdate) -> Result<(), CommandError> {
    if let Some(threshold) = update.threshold {
        if !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&threshold) {
            return Err(CommandError::InvalidThreshold(threshold));
        }
    }
    if let Some(n_estimators) = update.n_estimators {
        if n_estimators == 0 {
            return Err(CommandError::InvalidEstimators(n_estimators));
        }
    }
    if let Some(max_samples) = update.max_samples {
        if !(max_samples > 0.0 && max_samples <= 1.0) {
            return Err(CommandError::InvalidMaxSamples(max_samples));
        }
    }
    Ok(())
}

/// Vérifie une configuration complète du détecteur avec les mêmes règles
pub fn validate_detector(config: &DetectorConfig) -> Result<(), CommandError> {
    validate_update(&ConfigUpdate {
        threshold: Some(config.threshold),
        features: None,
        n_estimators: Some(config.n_estimators),
        max_samples: Some(config.max_samples),
    })
}

pub struct DashboardService {
    config: Config,
    store: Arc<StateStore>,
    pipeline: Arc<IngestPipeline>,
    monitor: LiveMonitor,
    journal: Arc<EventJournal>,
}

impl DashboardService {
    pub fn new(config: Config, scorer: Arc<dyn Scorer>, journal: Arc<EventJournal>) -> Self {
        let mut initial = SessionState::new(config.detector.clone(), config.avg_response_time_ms);
        initial.is_live = config.monitor.start_live;

        let store = Arc::new(StateStore::new(initial));
        let pipeline = Arc::new(IngestPipeline::new(scorer, Arc::clone(&journal)));
        let monitor = LiveMonitor::new(
            Arc::clone(&store),
            Arc::clone(&pipeline),
            Arc::clone(&journal),
            Duration::from_millis(config.monitor.tick_interval_ms.max(1)),
            config.monitor.batch_size,
        );

        Self {
            config,
            store,
            pipeline,
            monitor,
            journal,
        }
    }

    /// Service complet : client HTTP du modèle et journal selon la configuration
    pub fn from_config(config: Config) -> Result<Self> {
        validate_detector(&config.detector).context("Configuration du détecteur invalide")?;

        let scorer = HttpScorer::new(
            &config.scorer.base_url,
            Duration::from_millis(config.scorer.timeout_ms),
        )
        .context("Initialisation du client du modèle de score")?;
        let journal = Arc::new(EventJournal::new(config.log_file.clone(), config.log_mode));

        info!(
            "Modèle de score: {} | journal des événements: {}",
            scorer.base_url(),
            journal.mode()
        );
        Ok(Self::new(config, Arc::new(scorer), journal))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> Arc<StateStore> {
        Arc::clone(&self.store)
    }

    pub fn monitor(&self) -> &LiveMonitor {
        &self.monitor
    }

    pub fn snapshot(&self) -> Arc<SessionState> {
        self.store.snapshot()
    }

    pub fn summary(&self) -> DashboardSummary {
        DashboardSummary::from_state(&self.store.snapshot(), self.pipeline.is_degraded())
    }

    pub fn start_monitoring(&self) {
        self.monitor.start();
    }

    pub fn shutdown(&self) {
        self.monitor.stop();
    }

    pub fn update_config(&self, update: ConfigUpdate) -> Result<Arc<SessionState>, CommandError> {
        if let Err(e) = validate_update(&update) {
            warn!("Mise à jour de configuration refusée: {}", e);
            return Err(e);
        }

        let detail = serde_json::to_string(&update).unwrap_or_default();
        let snapshot = self.store.dispatch(StoreCommand::UpdateConfig(update));
        self.journal.log_command("config", &detail);
        Ok(snapshot)
    }

    pub fn set_threshold(&self, threshold: f64) -> Result<Arc<SessionState>, CommandError> {
        self.update_config(ConfigUpdate::threshold(threshold))
    }

    pub fn pause(&self) -> Arc<SessionState> {
        let current = self.store.snapshot();
        if !current.is_live {
            return current;
        }

        // Store d'abord : un tick qui obtient son ticket entre-temps voit la pause
        let snapshot = self.store.dispatch(StoreCommand::PauseMonitoring);
        self.monitor.pause();
        self.journal.log_command("pause", "");
        snapshot
    }

    pub fn resume(&self) -> Arc<SessionState> {
        let current = self.store.snapshot();
        if current.is_live {
            return current;
        }

        self.monitor.resume();
        let snapshot = self.store.dispatch(StoreCommand::ResumeMonitoring);
        self.journal.log_command("resume", "");
        snapshot
    }

    pub fn resolve_incident(&self, id: &str) -> Arc<SessionState> {
        let snapshot = self
            .store
            .dispatch(StoreCommand::ResolveIncident(id.to_string()));
        self.journal.log_command("resolve", id);
        snapshot
    }

    pub fn investigate_incident(&self, id: &str) -> Arc<SessionState> {
        let snapshot = self
            .store
            .dispatch(StoreCommand::InvestigateIncident(id.to_string()));
        self.journal.log_command("investigate", id);
        snapshot
    }

    pub fn set_response_time(&self, ms: f64) -> Result<Arc<SessionState>, CommandError> {
        if !ms.is_finite() || ms < 0.0 {
            return Err(CommandError::InvalidResponseTime(ms));
        }
        Ok(self.store.dispatch(StoreCommand::SetResponseTime(ms)))
    }

    /// Injecte un lot de simulation ; accepté aussi pendant une pause
    pub async fn simulate(&self, kind: ScenarioKind) -> IngestReport {
        let mut rng = StdRng::from_os_rng();
        let pending = PendingBatch::scenario(kind, &mut rng);
        let report = self.pipeline.ingest(&self.store, pending, &mut rng).await;

        self.journal.log_command("simulate", kind.name());
        self.journal.log_batch(&report);
        report
    }

    pub async fn simulate_named(&self, name: &str) -> Result<IngestReport, CommandError> {
        let kind: ScenarioKind = name.parse()?;
        Ok(self.simulate(kind).await)
    }

    /// Lot posté par un capteur réseau ; ignoré tant que la session est en pause
    pub async fn ingest_captured(
        &self,
        flows: Vec<CapturedFlow>,
    ) -> Result<IngestReport, CommandError> {
        if flows.is_empty() {
            return Err(CommandError::EmptyCapture);
        }
        if flows.len() > MAX_CAPTURED_FLOWS {
            return Err(CommandError::CaptureTooLarge(flows.len()));
        }
        if !self.store.snapshot().is_live {
            debug!("Lot capturé de {} flux ignoré: surveillance en pause", flows.len());
            return Err(CommandError::MonitoringPaused);
        }

        let mut rng = StdRng::from_os_rng();
        let report = self
            .pipeline
            .ingest(&self.store, PendingBatch::captured(&flows), &mut rng)
            .await;
        self.journal.log_batch(&report);
        Ok(report)
    }

    /// Lots de trafic courant produits immédiatement, hors cadence
    pub async fn run_ticks(&self, ticks: u32) -> Vec<IngestReport> {
        let reports = run_ticks(
            &self.store,
            &self.pipeline,
            ticks,
            self.config.monitor.batch_size,
        )
        .await;
        for report in &reports {
            self.journal.log_batch(report);
        }
        reports
    }

    pub async fn model_status(&self) -> ModelReport {
        ModelReport {
            status: self.pipeline.model_status().await,
            scorer_degraded: self.pipeline.is_degraded(),
        }
    }

    pub fn export(&self) -> ExportDocument {
        ExportDocument::from_state(&self.store.snapshot())
    }

    pub fn export_to(&self, dir: Option<&Path>) -> Result<PathBuf> {
        let dir = dir.unwrap_or_else(|| Path::new(&self.config.export_dir));
        let path = self.export().write_to(dir)?;
        self.journal
            .log_command("export", &path.display().to_string());
        Ok(path)
    }

    /// Renderer configuré, dimensions éventuellement surchargées
    pub fn renderer(&self, width: Option<f64>, height: Option<f64>) -> TimelineRenderer {
        let chart = &self.config.chart;
        let valid = |v: f64| v.is_finite() && v > 0.0;

        TimelineRenderer::new(
            width.filter(|w| valid(*w)).unwrap_or(chart.width),
            height.filter(|h| valid(*h)).unwrap_or(chart.height),
        )
        .with_padding(chart.padding)
        .with_device_pixel_ratio(chart.device_pixel_ratio)
    }

    pub fn render_timeline(&self, width: Option<f64>, height: Option<f64>) -> Frame {
        let state = self.store.snapshot();
        self.renderer(width, height)
            .render(&state.scores, state.config.threshold)
    }

    pub fn render_svg(&self, width: Option<f64>, height: Option<f64>) -> String {
        to_svg(&self.render_timeline(width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_threshold_range() {
        assert!(validate_update(&ConfigUpdate::threshold(0.1)).is_ok());
        assert!(validate_update(&ConfigUpdate::threshold(0.9)).is_ok());
        assert_eq!(
            validate_update(&ConfigUpdate::threshold(0.95)),
            Err(CommandError::InvalidThreshold(0.95))
        );
        assert!(validate_update(&ConfigUpdate::threshold(0.05)).is_err());
        assert!(validate_update(&ConfigUpdate::threshold(f64::NAN)).is_err());
    }

    #[test]
    fn test_validate_model_parameters() {
        let zero_estimators = ConfigUpdate {
            n_estimators: Some(0),
            ..ConfigUpdate::default()
        };
        assert_eq!(
            validate_update(&zero_estimators),
            Err(CommandError::InvalidEstimators(0))
        );

        let bad_samples = ConfigUpdate {
            max_samples: Some(1.5),
            ..ConfigUpdate::default()
        };
        assert!(validate_update(&bad_samples).is_err());

        let full = ConfigUpdate {
            max_samples: Some(1.0),
            n_estimators: Some(100),
            ..ConfigUpdate::default()
        };
        assert!(validate_update(&full).is_ok());
    }

    #[test]
    fn test_detector_from_file_is_validated() {
        let mut config = Config::default();
        assert!(validate_detector(&config.detector).is_ok());
        assert!(DashboardService::from_config(config.clone()).is_ok());

        config.detector.threshold = 0.95;
        assert_eq!(
            validate_detector(&config.detector),
            Err(CommandError::InvalidThreshold(0.95))
        );
        assert!(DashboardService::from_config(config).is_err());
    }
}
