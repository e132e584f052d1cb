use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Taille maximale de la fenêtre des flux récents
pub const MAX_RECENT_FLOWS: usize = 50;
/// Taille maximale de l'historique des scores
pub const MAX_SCORES: usize = 200;
/// Nombre maximal d'incidents conservés
pub const MAX_INCIDENTS: usize = 10;

/// Protocole de transport d'un flux
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    /// Protocole capturé hors TCP, UDP et ICMP
    Other,
}

impl Protocol {
    /// Protocoles du trafic synthétique
    pub const ALL: [Protocol; 3] = [Protocol::Tcp, Protocol::Udp, Protocol::Icmp];

    /// Nom attendu par le modèle de détection (`protocol_type`)
    pub fn feature_name(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Icmp => "icmp",
            Protocol::Other => "other",
        }
    }

    /// Nom de protocole ou numéro IP tel que rapporté par une capture
    pub fn from_capture(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "tcp" | "6" => Protocol::Tcp,
            "udp" | "17" => Protocol::Udp,
            "icmp" | "1" => Protocol::Icmp,
            _ => Protocol::Other,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
            Protocol::Icmp => "ICMP",
            Protocol::Other => "OTHER",
        };
        write!(f, "{}", name)
    }
}

/// Flux réseau observé ou simulé, classé au moment de l'ingestion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlowRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub src_ip: String,
    pub dst_ip: String,
    pub src_port: u16,
    pub dst_port: u16,
    pub protocol: Protocol,
    pub src_bytes: u64,
    pub dst_bytes: u64,
    pub anomaly_score: f64,
    /// Calculé avec le seuil en vigueur à l'ingestion, jamais recalculé
    pub is_anomaly: bool,
}

/// Sévérité d'un incident
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Sévérité déterministe dérivée du score déclencheur
    pub fn from_score(score: f64) -> Self {
        if score > 0.9 {
            Severity::Critical
        } else if score > 0.8 {
            Severity::High
        } else if score > 0.6 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        write!(f, "{}", name)
    }
}

/// État de traitement d'un incident
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Active,
    Investigating,
    Resolved,
}

/// Événement de sécurité dérivé d'un ou plusieurs flux
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub affected_hosts: Vec<String>,
    pub status: IncidentStatus,
    pub score: f64,
}

/// Compteurs globaux de la session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_flows: u64,
    pub anomalies_detected: u64,
    /// Fourni de l'extérieur, en millisecondes
    pub avg_response_time: f64,
    /// Compteur logique de lots appliqués
    pub uptime: u64,
}

impl Metrics {
    pub fn new(avg_response_time: f64) -> Self {
        Self {
            total_flows: 0,
            anomalies_detected: 0,
            avg_response_time,
            uptime: 0,
        }
    }

    /// Pourcentage de flux marqués anormaux
    pub fn detection_rate(&self) -> f64 {
        if self.total_flows == 0 {
            0.0
        } else {
            self.anomalies_detected as f64 / self.total_flows as f64 * 100.0
        }
    }

    /// Durée de fonctionnement au format HH:MM:SS (un tick par seconde)
    pub fn formatted_uptime(&self) -> String {
        let hours = self.uptime / 3600;
        let minutes = (self.uptime % 3600) / 60;
        let secs = self.uptime % 60;
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new(12.0)
    }
}

/// Paramètres du détecteur contrôlés par l'opérateur
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectorConfig {
    pub threshold: f64,
    /// Informatif : colonnes utilisées par le modèle externe
    pub features: Vec<String>,
    pub n_estimators: u32,
    pub max_samples: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            features: [
                "duration",
                "src_bytes",
                "dst_bytes",
                "count",
                "srv_count",
                "same_srv_rate",
                "dst_host_count",
                "dst_host_srv_count",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            n_estimators: 300,
            max_samples: 0.8,
        }
    }
}

/// Mise à jour partielle de la configuration du détecteur
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_estimators: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_samples: Option<f64>,
}

impl ConfigUpdate {
    pub fn threshold(threshold: f64) -> Self {
        Self {
            threshold: Some(threshold),
            ..Self::default()
        }
    }

    /// Fusionne les champs présents dans la configuration donnée
    pub fn merge_into(self, config: &DetectorConfig) -> DetectorConfig {
        DetectorConfig {
            threshold: self.threshold.unwrap_or(config.threshold),
            features: self.features.unwrap_or_else(|| config.features.clone()),
            n_estimators: self.n_estimators.unwrap_or(config.n_estimators),
            max_samples: self.max_samples.unwrap_or(config.max_samples),
        }
    }
}

/// État complet de la session d'affichage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub recent_flows: Vec<FlowRecord>,
    pub scores: Vec<f64>,
    pub incidents: Vec<Incident>,
    pub metrics: Metrics,
    pub config: DetectorConfig,
    pub is_live: bool,
}

impl SessionState {
    pub fn new(config: DetectorConfig, avg_response_time: f64) -> Self {
        Self {
            recent_flows: Vec::new(),
            scores: Vec::new(),
            incidents: Vec::new(),
            metrics: Metrics::new(avg_response_time),
            config,
            is_live: true,
        }
    }

    /// Score le plus récent, 0 si aucun score
    pub fn current_threat_score(&self) -> f64 {
        self.scores.last().copied().unwrap_or(0.0)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(DetectorConfig::default(), 12.0)
    }
}

/// Lot de flux classés, livré au store en une seule commande
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Batch {
    pub flows: Vec<FlowRecord>,
    pub scores: Vec<f64>,
    pub incidents: Vec<Incident>,
}

/// Enregistrement de caractéristiques envoyé au modèle de score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureRecord {
    pub duration: f64,
    pub src_bytes: u64,
    pub dst_bytes: u64,
    pub count: u32,
    pub srv_count: u32,
    pub same_srv_rate: f64,
    pub dst_host_count: u32,
    pub dst_host_srv_count: u32,
    pub protocol_type: String,
    pub service: String,
    pub flag: String,
}

/// Niveau de menace affiché par la jauge
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            ThreatLevel::Critical
        } else if score >= 0.6 {
            ThreatLevel::High
        } else if score >= 0.4 {
            ThreatLevel::Medium
        } else {
            ThreatLevel::Low
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ThreatLevel::Low => "LOW",
            ThreatLevel::Medium => "MEDIUM",
            ThreatLevel::High => "HIGH",
            ThreatLevel::Critical => "CRITICAL",
        };
        write!(f, "{}", name)
    }
}

/// Résumé des panneaux du tableau de bord
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub is_live: bool,
    pub total_flows: u64,
    pub anomalies_detected: u64,
    pub active_incidents: usize,
    pub detection_rate: f64,
    pub uptime: String,
    pub avg_response_time: f64,
    pub threat_score: f64,
    pub threat_level: ThreatLevel,
    pub threshold: f64,
    pub scorer_degraded: bool,
}

impl DashboardSummary {
    pub fn from_state(state: &SessionState, scorer_degraded: bool) -> Self {
        let threat_score = state.current_threat_score();
        Self {
            is_live: state.is_live,
            total_flows: state.metrics.total_flows,
            anomalies_detected: state.metrics.anomalies_detected,
            active_incidents: state.incidents.len(),
            detection_rate: state.metrics.detection_rate(),
            uptime: state.metrics.formatted_uptime(),
            avg_response_time: state.metrics.avg_response_time,
            threat_score,
            threat_level: ThreatLevel::from_score(threat_score),
            threshold: state.config.threshold,
            scorer_degraded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_cutoffs() {
        assert_eq!(Severity::from_score(0.95), Severity::Critical);
        assert_eq!(Severity::from_score(0.9), Severity::High);
        assert_eq!(Severity::from_score(0.85), Severity::High);
        assert_eq!(Severity::from_score(0.8), Severity::Medium);
        assert_eq!(Severity::from_score(0.7), Severity::Medium);
        assert_eq!(Severity::from_score(0.6), Severity::Low);
        assert_eq!(Severity::from_score(0.1), Severity::Low);
    }

    #[test]
    fn test_threat_level() {
        assert_eq!(ThreatLevel::from_score(0.8), ThreatLevel::Critical);
        assert_eq!(ThreatLevel::from_score(0.65), ThreatLevel::High);
        assert_eq!(ThreatLevel::from_score(0.4), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::from_score(0.0), ThreatLevel::Low);
    }

    #[test]
    fn test_config_update_merges_present_fields() {
        let base = DetectorConfig::default();
        let update = ConfigUpdate {
            n_estimators: Some(50),
            ..ConfigUpdate::default()
        };
        let merged = update.merge_into(&base);
        assert_eq!(merged.n_estimators, 50);
        assert_eq!(merged.threshold, base.threshold);
        assert_eq!(merged.features, base.features);
    }

    #[test]
    fn test_metrics_formatting() {
        let mut metrics = Metrics::new(12.0);
        assert_eq!(metrics.detection_rate(), 0.0);
        metrics.total_flows = 200;
        metrics.anomalies_detected = 5;
        metrics.uptime = 3725;
        assert!((metrics.detection_rate() - 2.5).abs() < 1e-9);
        assert_eq!(metrics.formatted_uptime(), "01:02:05");
    }

    #[test]
    fn test_incident_wire_format() {
        let incident = Incident {
            id: "abc".to_string(),
            kind: "Suspicious activity".to_string(),
            severity: Severity::High,
            timestamp: Utc::now(),
            description: "desc".to_string(),
            affected_hosts: vec!["10.0.0.1".to_string()],
            status: IncidentStatus::Active,
            score: 0.85,
        };
        let json = serde_json::to_value(&incident).unwrap();
        assert_eq!(json["type"], "Suspicious activity");
        assert_eq!(json["severity"], "high");
        assert_eq!(json["status"], "active");
        assert_eq!(json["affectedHosts"][0], "10.0.0.1");
    }
}
