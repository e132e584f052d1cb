//! Store d'état de la session
//!
//! Ce module détient l'unique `SessionState` de la session et ne le fait évoluer
//! qu'en réponse à des commandes discrètes. Chaque commande publie un nouvel
//! instantané complet ; un instantané déjà publié n'est jamais modifié.

use crate::models::{
    Batch, ConfigUpdate, IncidentStatus, SessionState, MAX_INCIDENTS, MAX_RECENT_FLOWS,
    MAX_SCORES,
};
use log::debug;
use std::sync::Arc;
use tokio::sync::watch;

/// Commandes acceptées par le store
#[derive(Debug, Clone)]
pub enum StoreCommand {
    /// Fusionne les champs présents dans la configuration (aucune validation)
    UpdateConfig(ConfigUpdate),
    /// Retire l'incident portant cet identifiant
    ResolveIncident(String),
    /// Passe un incident actif en cours d'investigation
    InvestigateIncident(String),
    PauseMonitoring,
    ResumeMonitoring,
    /// Seule commande qui fait grandir les fenêtres et avancer les compteurs
    ApplyBatch(Batch),
    /// Temps de réponse moyen fourni par une sonde externe
    SetResponseTime(f64),
}

impl StoreCommand {
    fn name(&self) -> &'static str {
        match self {
            StoreCommand::UpdateConfig(_) => "UpdateConfig",
            StoreCommand::ResolveIncident(_) => "ResolveIncident",
            StoreCommand::InvestigateIncident(_) => "InvestigateIncident",
            StoreCommand::PauseMonitoring => "PauseMonitoring",
            StoreCommand::ResumeMonitoring => "ResumeMonitoring",
            StoreCommand::ApplyBatch(_) => "ApplyBatch",
            StoreCommand::SetResponseTime(_) => "SetResponseTime",
        }
    }
}

/// Concatène deux séquences et ne garde que les `cap` éléments les plus récents
fn append_bounded<T: Clone>(old: &[T], new: Vec<T>, cap: usize) -> Vec<T> {
    let mut merged = Vec::with_capacity(old.len() + new.len());
    merged.extend_from_slice(old);
    merged.extend(new);
    if merged.len() > cap {
        let excess = merged.len() - cap;
        merged.drain(..excess);
    }
    merged
}

/// Transition pure : calcule l'état suivant sans toucher à l'état courant
pub fn reduce(state: &SessionState, command: StoreCommand) -> SessionState {
    match command {
        StoreCommand::UpdateConfig(update) => SessionState {
            config: update.merge_into(&state.config),
            ..state.clone()
        },
        StoreCommand::ResolveIncident(id) => SessionState {
            incidents: state
                .incidents
                .iter()
                .filter(|incident| incident.id != id)
                .cloned()
                .collect(),
            ..state.clone()
        },
        StoreCommand::InvestigateIncident(id) => {
            let mut next = state.clone();
            if let Some(incident) = next
                .incidents
                .iter_mut()
                .find(|incident| incident.id == id && incident.status == IncidentStatus::Active)
            {
                incident.status = IncidentStatus::Investigating;
            }
            next
        }
        StoreCommand::PauseMonitoring => SessionState {
            is_live: false,
            ..state.clone()
        },
        StoreCommand::ResumeMonitoring => SessionState {
            is_live: true,
            ..state.clone()
        },
        StoreCommand::ApplyBatch(batch) => {
            let new_flows = batch.flows.len() as u64;
            let anomalies = batch.flows.iter().filter(|f| f.is_anomaly).count() as u64;

            let mut metrics = state.metrics.clone();
            metrics.total_flows += new_flows;
            metrics.anomalies_detected += anomalies;
            metrics.uptime += 1;

            SessionState {
                recent_flows: append_bounded(&state.recent_flows, batch.flows, MAX_RECENT_FLOWS),
                scores: append_bounded(&state.scores, batch.scores, MAX_SCORES),
                incidents: append_bounded(&state.incidents, batch.incidents, MAX_INCIDENTS),
                metrics,
                config: state.config.clone(),
                is_live: state.is_live,
            }
        }
        StoreCommand::SetResponseTime(ms) => {
            let mut next = state.clone();
            next.metrics.avg_response_time = ms;
            next
        }
    }
}

/// Conteneur d'état partagé par référence entre tous les composants
pub struct StateStore {
    tx: watch::Sender<Arc<SessionState>>,
}

impl StateStore {
    pub fn new(initial: SessionState) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self { tx }
    }

    /// Dernier instantané publié
    pub fn snapshot(&self) -> Arc<SessionState> {
        self.tx.borrow().clone()
    }

    /// Abonnement aux instantanés successifs
    pub fn subscribe(&self) -> watch::Receiver<Arc<SessionState>> {
        self.tx.subscribe()
    }

    /// Applique une commande et retourne l'instantané qu'elle a produit
    pub fn dispatch(&self, command: StoreCommand) -> Arc<SessionState> {
        let name = command.name();
        let mut published = None;

        // send_modify sérialise les commandes : un lecteur ne voit jamais d'état partiel
        self.tx.send_modify(|current| {
            let next = Arc::new(reduce(current, command));
            published = Some(Arc::clone(&next));
            *current = next;
        });

        let snapshot = published.unwrap_or_else(|| self.snapshot());
        debug!(
            "Commande {} appliquée: {} flux, {} scores, {} incidents, uptime {}",
            name,
            snapshot.recent_flows.len(),
            snapshot.scores.len(),
            snapshot.incidents.len(),
            snapshot.metrics.uptime
        );
        snapshot
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(SessionState::default())
    }
}
