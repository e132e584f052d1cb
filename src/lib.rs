//! Bibliothèque nidsboard : cœur d'un tableau de bord temps réel de détection d'intrusions
//!
//! Un store d'état unique agrège les lots de flux scorés par un modèle externe,
//! maintient des fenêtres bornées (flux récents, scores, incidents) et expose
//! des commandes opérateur. La frise des scores est rendue en primitives de dessin.

// Modules principaux
pub mod models; // Structures de données et modèles
pub mod store;  // Store d'état et commandes
pub mod ingest; // Pipeline d'ingestion et cadence
pub mod render; // Rendu de la frise des scores
pub mod scorer; // Client du modèle de score

// Surface de commande
pub mod service; // Orchestration et validation des commandes
pub mod api;     // API HTTP de contrôle
pub mod cli;     // Interface en ligne de commande
pub mod export;  // Export JSON des incidents et métriques

// Modules utilitaires
pub mod config;   // Configuration du système
pub mod error;    // Erreurs des commandes opérateur
pub mod logger;   // Journal des événements
pub mod log_mode; // Modes de journalisation

// Re-export des structures principales pour faciliter l'utilisation
pub use error::CommandError;
pub use ingest::{IngestPipeline, LiveMonitor, ScenarioKind};
pub use log_mode::LogMode;
pub use models::{Batch, DashboardSummary, FlowRecord, Incident, SessionState, Severity};
pub use render::{Frame, TimelineRenderer};
pub use scorer::{HttpScorer, Scorer, ScorerError};
pub use service::DashboardService;
pub use store::{StateStore, StoreCommand};
