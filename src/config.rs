use crate::log_mode::LogMode;
use crate::models::DetectorConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "/etc/nidsboard/config.json";

/// Collaborateur de score
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ScorerSettings {
    /// URL de base du service (`/score`, `/status`)
    pub base_url: String,
    /// Délai maximal d'une requête, en millisecondes
    pub timeout_ms: u64,
}

impl Default for ScorerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_ms: 5000,
        }
    }
}

/// Cadence de la surveillance
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MonitorSettings {
    pub tick_interval_ms: u64,
    /// Nombre de flux par lot
    pub batch_size: usize,
    /// Démarrer la session en mode live
    pub start_live: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            batch_size: 5,
            start_live: true,
        }
    }
}

/// API HTTP de contrôle
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ApiSettings {
    pub enabled: bool,
    pub listen_address: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Dimensions de la frise
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ChartSettings {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    pub device_pixel_ratio: f64,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            width: 840.0,
            height: 280.0,
            padding: 40.0,
            device_pixel_ratio: 1.0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Version actuelle du logiciel
    pub version: String,

    pub scorer: ScorerSettings,
    pub monitor: MonitorSettings,
    pub api: ApiSettings,
    pub chart: ChartSettings,

    /// Paramètres initiaux du détecteur
    pub detector: DetectorConfig,

    /// Temps de réponse moyen affiché au démarrage (ms)
    pub avg_response_time_ms: f64,

    /// Répertoire des exports JSON
    pub export_dir: String,

    /// Chemin vers le journal des événements
    pub log_file: String,

    /// Niveau de log
    pub log_level: String,

    /// Mode de journalisation (console, fichier ou systemd-journal)
    pub log_mode: LogMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            version: env!("CARGO_PKG_VERSION").to_string(),
            scorer: ScorerSettings::default(),
            monitor: MonitorSettings::default(),
            api: ApiSettings::default(),
            chart: ChartSettings::default(),
            detector: DetectorConfig::default(),
            avg_response_time_ms: 12.0,
            export_dir: ".".to_string(),
            log_file: "/var/log/nidsboard/events.log".to_string(),
            log_level: "info".to_string(),
            log_mode: LogMode::Console,
        }
    }
}

impl Config {
    /// Charge la configuration depuis `path`, en la créant avec les valeurs par défaut si absente
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let default_config = Config::default();
            default_config.save_to(path)?;
            return Ok(default_config);
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("Lecture de {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("Configuration invalide dans {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Créer le répertoire si nécessaire
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Création du répertoire {}", parent.display()))?;
            }
        }

        let config_json = serde_json::to_string_pretty(self)?;
        fs::write(path, config_json).with_context(|| format!("Écriture de {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nidsboard").join("config.json");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"monitor": {"batch_size": 12}, "log_mode": "File", "detector": {"threshold": 0.75, "features": [], "nEstimators": 100, "maxSamples": 0.5}}"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.monitor.batch_size, 12);
        assert_eq!(config.monitor.tick_interval_ms, 1000);
        assert_eq!(config.log_mode, LogMode::File);
        assert_eq!(config.detector.threshold, 0.75);
        assert_eq!(config.scorer.timeout_ms, 5000);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ pas du json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_partial_detector_section_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"detector": {"threshold": 0.7}}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.detector.threshold, 0.7);
        assert_eq!(config.detector.n_estimators, 300);
        assert_eq!(config.detector.max_samples, 0.8);
        assert_eq!(config.detector.features.len(), 8);
    }
}
