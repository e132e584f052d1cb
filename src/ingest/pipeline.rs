//! Pipeline d'ingestion par lots
//!
//! Transforme un lot de descripteurs de flux et leurs scores en flux classés et
//! en incidents dérivés, puis livre le tout au store en une seule commande.

use super::capture::{captured_features, CapturedFlow};
use super::scenario::ScenarioKind;
use super::synth::{random_flows, FlowDescriptor};
use crate::logger::EventJournal;
use crate::models::{
    Batch, FeatureRecord, FlowRecord, Incident, IncidentStatus, SessionState, Severity,
};
use crate::scorer::{check_scores, ModelStatus, Scorer};
use crate::store::{StateStore, StoreCommand};
use chrono::Utc;
use log::{debug, info, warn};
use rand::Rng;
use serde::Serialize;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Volume (octets émis) au-delà duquel une anomalie est étiquetée DDoS
pub const DDOS_BYTES_HEURISTIC: u64 = 4000;

/// Origine d'un lot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestContext {
    /// Trafic courant synthétisé à chaque tick
    Live,
    /// Flux posté par un capteur réseau
    Captured,
    Scenario(ScenarioKind),
}

impl IngestContext {
    /// Plage des scores de repli quand le modèle est injoignable
    pub fn fallback_range(&self) -> Range<f64> {
        match self {
            IngestContext::Live | IngestContext::Captured => 0.2..0.5,
            IngestContext::Scenario(_) => 0.7..1.0,
        }
    }

    fn incident_kind(&self, flow: &FlowDescriptor) -> String {
        match self {
            IngestContext::Live | IngestContext::Captured
                if flow.src_bytes > DDOS_BYTES_HEURISTIC =>
            {
                "Potential DDoS attack".to_string()
            }
            IngestContext::Live | IngestContext::Captured => "Suspicious activity".to_string(),
            IngestContext::Scenario(kind) => kind.incident_label().to_string(),
        }
    }

    fn description(&self, flow: &FlowDescriptor) -> String {
        match self {
            IngestContext::Live | IngestContext::Captured => format!(
                "Anomalous traffic detected from {} to {}",
                flow.src_ip, flow.dst_ip
            ),
            IngestContext::Scenario(kind) => format!(
                "Simulated {} attack: {} → {}",
                kind, flow.src_ip, flow.dst_ip
            ),
        }
    }
}

/// Lot en attente de score
#[derive(Debug, Clone)]
pub struct PendingBatch {
    pub context: IngestContext,
    pub flows: Vec<FlowDescriptor>,
    pub features: Vec<FeatureRecord>,
}

impl PendingBatch {
    pub fn live<R: Rng + ?Sized>(rng: &mut R, size: usize) -> Self {
        let flows = random_flows(rng, size);
        let features = flows.iter().map(FlowDescriptor::live_features).collect();
        Self {
            context: IngestContext::Live,
            flows,
            features,
        }
    }

    pub fn captured(flows: &[CapturedFlow]) -> Self {
        let (flows, features) = captured_features(flows);
        Self {
            context: IngestContext::Captured,
            flows,
            features,
        }
    }

    pub fn scenario<R: Rng + ?Sized>(kind: ScenarioKind, rng: &mut R) -> Self {
        let (flows, features) = kind.generate(rng).into_iter().unzip();
        Self {
            context: IngestContext::Scenario(kind),
            flows,
            features,
        }
    }
}

/// Lot scoré, prêt à être classé
#[derive(Debug, Clone)]
pub struct ScoredBatch {
    pub context: IngestContext,
    pub flows: Vec<FlowDescriptor>,
    pub scores: Vec<f64>,
    /// Scores de repli utilisés à la place de ceux du modèle
    pub degraded: bool,
    pub elapsed: Duration,
}

impl ScoredBatch {
    /// Classe chaque flux contre le seuil en vigueur et dérive les incidents
    pub fn classify(self, threshold: f64) -> Batch {
        let now = Utc::now();
        let context = self.context;
        let mut flows = Vec::with_capacity(self.flows.len());
        let mut incidents = Vec::new();

        for (descriptor, score) in self.flows.iter().zip(self.scores.iter().copied()) {
            let is_anomaly = score >= threshold;

            if is_anomaly {
                incidents.push(Incident {
                    id: Uuid::new_v4().to_string(),
                    kind: context.incident_kind(descriptor),
                    severity: Severity::from_score(score),
                    timestamp: now,
                    description: context.description(descriptor),
                    affected_hosts: vec![descriptor.src_ip.to_string(), descriptor.dst_ip.to_string()],
                    status: IncidentStatus::Active,
                    score,
                });
            }

            flows.push(FlowRecord {
                id: Uuid::new_v4().to_string(),
                timestamp: now,
                src_ip: descriptor.src_ip.to_string(),
                dst_ip: descriptor.dst_ip.to_string(),
                src_port: descriptor.src_port,
                dst_port: descriptor.dst_port,
                protocol: descriptor.protocol,
                src_bytes: descriptor.src_bytes,
                dst_bytes: descriptor.dst_bytes,
                anomaly_score: score,
                is_anomaly,
            });
        }

        let scores = flows.iter().map(|f| f.anomaly_score).collect();
        Batch {
            flows,
            scores,
            incidents,
        }
    }
}

/// Bilan d'une ingestion appliquée au store
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub flows: usize,
    pub anomalies: usize,
    pub incidents: Vec<Incident>,
    pub degraded: bool,
    pub threshold: f64,
    #[serde(skip)]
    pub snapshot: Arc<SessionState>,
}

pub struct IngestPipeline {
    scorer: Arc<dyn Scorer>,
    journal: Arc<EventJournal>,
    degraded: AtomicBool,
}

impl IngestPipeline {
    pub fn new(scorer: Arc<dyn Scorer>, journal: Arc<EventJournal>) -> Self {
        Self {
            scorer,
            journal,
            degraded: AtomicBool::new(false),
        }
    }

    /// Vrai si le dernier lot a été scoré en mode dégradé
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    pub async fn model_status(&self) -> ModelStatus {
        self.scorer.status().await
    }

    /// Obtient un score par flux, ou des scores de repli si le modèle échoue
    pub async fn score<R: Rng + Send + ?Sized>(&self, pending: PendingBatch, rng: &mut R) -> ScoredBatch {
        let started = Instant::now();
        // Une réponse de mauvaise longueur est un échec du modèle, quel qu'il soit
        let result = self
            .scorer
            .score(&pending.features)
            .await
            .and_then(|scores| check_scores(pending.features.len(), scores));
        let elapsed = started.elapsed();

        let (scores, degraded) = match result {
            Ok(scores) => (scores, false),
            Err(e) => {
                let range = pending.context.fallback_range();
                warn!(
                    "Modèle de score indisponible ({}), scores de repli dans [{}, {})",
                    e, range.start, range.end
                );
                let scores = pending
                    .features
                    .iter()
                    .map(|_| rng.random_range(range.clone()))
                    .collect();
                (scores, true)
            }
        };

        let was_degraded = self.degraded.swap(degraded, Ordering::SeqCst);
        if was_degraded != degraded {
            if !degraded {
                info!("Modèle de score de nouveau joignable, fin du mode dégradé");
            }
            self.journal.log_degraded(degraded);
        }

        ScoredBatch {
            context: pending.context,
            flows: pending.flows,
            scores,
            degraded,
            elapsed,
        }
    }

    /// Chemin complet : score, classification au seuil courant, une commande ApplyBatch
    pub async fn ingest<R: Rng + Send + ?Sized>(
        &self,
        store: &StateStore,
        pending: PendingBatch,
        rng: &mut R,
    ) -> IngestReport {
        let scored = self.score(pending, rng).await;
        self.apply(store, scored)
    }

    /// Classe un lot scoré avec le seuil lu dans le store, puis le livre
    pub fn apply(&self, store: &StateStore, scored: ScoredBatch) -> IngestReport {
        let degraded = scored.degraded;
        debug!(
            "Lot de {} flux scoré en {} ms",
            scored.flows.len(),
            scored.elapsed.as_millis()
        );
        let threshold = store.snapshot().config.threshold;
        let batch = scored.classify(threshold);

        let flows = batch.flows.len();
        let anomalies = batch.flows.iter().filter(|f| f.is_anomaly).count();
        let incidents = batch.incidents.clone();
        let snapshot = store.dispatch(StoreCommand::ApplyBatch(batch));

        IngestReport {
            flows,
            anomalies,
            incidents,
            degraded,
            threshold,
            snapshot,
        }
    }
}
