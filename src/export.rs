//! Export des incidents et des métriques de la session

use crate::models::{Incident, Metrics, SessionState};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportDocument {
    pub incidents: Vec<Incident>,
    pub metrics: Metrics,
    pub timestamp: DateTime<Utc>,
}

impl ExportDocument {
    pub fn from_state(state: &SessionState) -> Self {
        Self {
            incidents: state.incidents.clone(),
            metrics: state.metrics.clone(),
            timestamp: Utc::now(),
        }
    }

    /// `nids-export-{millisecondes unix}.json`
    pub fn file_name(&self) -> String {
        format!("nids-export-{}.json", self.timestamp.timestamp_millis())
    }

    /// Écrit le document dans `dir` et retourne le chemin créé
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Impossible de créer le répertoire {}", dir.display()))?;

        let path = dir.join(self.file_name());
        let json = serde_json::to_string_pretty(self).context("Sérialisation de l'export")?;
        fs::write(&path, json)
            .with_context(|| format!("Impossible d'écrire {}", path.display()))?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IncidentStatus, Severity};
    use tempfile::tempdir;

    #[test]
    fn test_export_document_written_to_disk() {
        let mut state = SessionState::default();
        state.metrics.total_flows = 42;
        state.incidents.push(Incident {
            id: "inc-1".to_string(),
            kind: "Suspicious activity".to_string(),
            severity: Severity::Medium,
            timestamp: Utc::now(),
            description: "test".to_string(),
            affected_hosts: vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()],
            status: IncidentStatus::Active,
            score: 0.7,
        });

        let document = ExportDocument::from_state(&state);
        let dir = tempdir().unwrap();
        let path = document.write_to(dir.path()).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("nids-export-"));
        assert!(name.ends_with(".json"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["metrics"]["totalFlows"], 42);
        assert_eq!(json["incidents"][0]["type"], "Suspicious activity");
        let timestamp = json["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());
    }
}
