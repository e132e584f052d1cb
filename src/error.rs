use crate::ingest::UnknownScenario;
use thiserror::Error;

/// Commandes opérateur refusées avant d'atteindre le store
#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("seuil {0} hors de la plage autorisée [0.1, 0.9]")]
    InvalidThreshold(f64),
    #[error("nombre d'estimateurs invalide: {0} (doit être > 0)")]
    InvalidEstimators(u32),
    #[error("max_samples invalide: {0} (doit être dans ]0, 1])")]
    InvalidMaxSamples(f64),
    #[error("temps de réponse invalide: {0} ms")]
    InvalidResponseTime(f64),
    #[error("lot capturé vide")]
    EmptyCapture,
    #[error("lot capturé trop volumineux: {0} flux (maximum {})", crate::ingest::MAX_CAPTURED_FLOWS)]
    CaptureTooLarge(usize),
    #[error("surveillance en pause, lot capturé ignoré")]
    MonitoringPaused,
    #[error(transparent)]
    UnknownScenario(#[from] UnknownScenario),
}
