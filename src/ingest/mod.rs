//! Ingestion des lots de flux : synthèse, capture, scénarios, score, classification et cadence

pub mod capture;
pub mod monitor;
pub mod pipeline;
pub mod scenario;
pub mod synth;

pub use capture::{CapturedFlow, MAX_CAPTURED_FLOWS};
pub use monitor::{LiveMonitor, TickGate, TickTicket};
pub use pipeline::{IngestContext, IngestPipeline, IngestReport, PendingBatch, ScoredBatch};
pub use scenario::{ScenarioKind, UnknownScenario, SCENARIO_BATCH_SIZE};
pub use synth::FlowDescriptor;
