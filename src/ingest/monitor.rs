//! Cadence d'ingestion du trafic courant
//!
//! Chaque tick prend un ticket `(génération, séquence)`. La pause et la reprise
//! changent de génération : un tick dont le score arrive après ce changement,
//! ou après un tick plus récent, est écarté sans toucher au store.

use super::pipeline::{IngestPipeline, IngestReport, PendingBatch};
use crate::logger::EventJournal;
use crate::store::StateStore;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickTicket {
    pub generation: u64,
    pub sequence: u64,
}

/// Verrou d'ordre entre ticks concurrents
#[derive(Debug, Default)]
pub struct TickGate {
    generation: AtomicU64,
    next_sequence: AtomicU64,
    last_applied: Mutex<Option<u64>>,
}

impl TickGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<u64>> {
        self.last_applied
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Ticket pour un nouveau tick
    pub fn begin(&self) -> TickTicket {
        TickTicket {
            generation: self.generation(),
            sequence: self.next_sequence.fetch_add(1, Ordering::SeqCst),
        }
    }

    /// Invalide tous les ticks en vol et retourne la nouvelle génération
    pub fn cancel_pending(&self) -> u64 {
        let _guard = self.lock();
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Exécute `apply` si le ticket est encore valide ; `None` si le tick est écarté
    pub fn try_apply<T>(&self, ticket: TickTicket, apply: impl FnOnce() -> T) -> Option<T> {
        let mut last_applied = self.lock();

        if ticket.generation != self.generation() {
            debug!(
                "Tick {} écarté: génération {} périmée (courante {})",
                ticket.sequence,
                ticket.generation,
                self.generation()
            );
            return None;
        }
        if matches!(*last_applied, Some(last) if last >= ticket.sequence) {
            debug!("Tick {} écarté: dépassé par un tick plus récent", ticket.sequence);
            return None;
        }

        let result = apply();
        *last_applied = Some(ticket.sequence);
        Some(result)
    }
}

/// Tâche périodique qui produit un lot de trafic par tick tant que la session est live
pub struct LiveMonitor {
    store: Arc<StateStore>,
    pipeline: Arc<IngestPipeline>,
    journal: Arc<EventJournal>,
    gate: Arc<TickGate>,
    period: Duration,
    batch_size: usize,
    resumed: Arc<Notify>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl LiveMonitor {
    pub fn new(
        store: Arc<StateStore>,
        pipeline: Arc<IngestPipeline>,
        journal: Arc<EventJournal>,
        period: Duration,
        batch_size: usize,
    ) -> Self {
        Self {
            store,
            pipeline,
            journal,
            gate: Arc::new(TickGate::new()),
            period,
            batch_size,
            resumed: Arc::new(Notify::new()),
            handle: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle_guard()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    fn handle_guard(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Démarre la boucle de ticks ; sans effet si elle tourne déjà
    pub fn start(&self) {
        let mut handle = self.handle_guard();
        if handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false) {
            info!("La surveillance est déjà en cours d'exécution");
            return;
        }

        let store = Arc::clone(&self.store);
        let pipeline = Arc::clone(&self.pipeline);
        let journal = Arc::clone(&self.journal);
        let gate = Arc::clone(&self.gate);
        let resumed = Arc::clone(&self.resumed);
        let period = self.period;
        let batch_size = self.batch_size;

        info!(
            "Démarrage de la surveillance: un lot de {} flux toutes les {} ms",
            batch_size,
            period.as_millis()
        );

        *handle = Some(tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = resumed.notified() => {
                        // Même période, sans rattrapage des ticks manqués pendant la pause
                        interval.reset();
                        continue;
                    }
                }

                if !store.snapshot().is_live {
                    continue;
                }

                let ticket = gate.begin();
                let store = Arc::clone(&store);
                let pipeline = Arc::clone(&pipeline);
                let journal = Arc::clone(&journal);
                let gate = Arc::clone(&gate);

                tokio::spawn(async move {
                    if let Some(report) =
                        run_tick(&store, &pipeline, &gate, ticket, batch_size).await
                    {
                        journal.log_batch(&report);
                    }
                });
            }
        }));
    }

    /// Invalide les ticks en vol ; la boucle continue mais ne produit plus de lots
    pub fn pause(&self) {
        let generation = self.gate.cancel_pending();
        debug!("Surveillance en pause (génération {})", generation);
    }

    /// Nouvelle génération et redémarrage de la période
    pub fn resume(&self) {
        let generation = self.gate.cancel_pending();
        self.resumed.notify_one();
        debug!("Surveillance reprise (génération {})", generation);
    }

    pub fn stop(&self) {
        self.gate.cancel_pending();
        if let Some(handle) = self.handle_guard().take() {
            handle.abort();
            info!("Surveillance arrêtée");
        }
    }
}

impl Drop for LiveMonitor {
    fn drop(&mut self) {
        if let Some(handle) = self.handle_guard().take() {
            handle.abort();
        }
    }
}

/// Un tick : lot synthétique, score, puis application si le ticket est encore valide
pub async fn run_tick(
    store: &StateStore,
    pipeline: &IngestPipeline,
    gate: &TickGate,
    ticket: TickTicket,
    batch_size: usize,
) -> Option<IngestReport> {
    let mut rng = StdRng::from_os_rng();
    let pending = PendingBatch::live(&mut rng, batch_size);
    let scored = pipeline.score(pending, &mut rng).await;

    let applied = gate.try_apply(ticket, || {
        // Une pause survenue pendant le score laisse le store intact
        if store.snapshot().is_live {
            Some(pipeline.apply(store, scored))
        } else {
            None
        }
    });

    match applied {
        Some(Some(report)) => Some(report),
        Some(None) => {
            debug!("Tick {} écarté: session en pause", ticket.sequence);
            None
        }
        None => None,
    }
}

/// Enchaîne `ticks` lots sans cadence ni verrou (commandes ponctuelles de la CLI)
pub async fn run_ticks(
    store: &StateStore,
    pipeline: &IngestPipeline,
    ticks: u32,
    batch_size: usize,
) -> Vec<IngestReport> {
    let mut rng = StdRng::from_os_rng();
    let mut reports = Vec::with_capacity(ticks as usize);
    for _ in 0..ticks {
        let pending = PendingBatch::live(&mut rng, batch_size);
        reports.push(pipeline.ingest(store, pending, &mut rng).await);
    }
    reports
}
