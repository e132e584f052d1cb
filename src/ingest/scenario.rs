//! Scénarios d'attaque simulés
//!
//! Chaque variante produit un lot canonique de caractéristiques typées,
//! injecté ensuite par le même chemin d'ingestion que le trafic courant.

use super::synth::{ephemeral_port, random_ip, service_port, FlowDescriptor};
use crate::models::{FeatureRecord, Protocol};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Nombre de flux par simulation
pub const SCENARIO_BATCH_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    Ddos,
    Portscan,
    Exfiltration,
}

#[derive(Debug, Error, PartialEq)]
#[error("scénario inconnu: {0} (ddos, portscan, exfiltration)")]
pub struct UnknownScenario(pub String);

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 3] = [
        ScenarioKind::Ddos,
        ScenarioKind::Portscan,
        ScenarioKind::Exfiltration,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::Ddos => "ddos",
            ScenarioKind::Portscan => "portscan",
            ScenarioKind::Exfiltration => "exfiltration",
        }
    }

    /// Libellé des incidents créés par ce scénario
    pub fn incident_label(&self) -> &'static str {
        match self {
            ScenarioKind::Ddos => "DDoS Attack Pattern",
            ScenarioKind::Portscan => "Port Scanning Detected",
            ScenarioKind::Exfiltration => "Potential Data Exfiltration",
        }
    }

    /// Un enregistrement de caractéristiques du scénario
    pub fn features<R: Rng + ?Sized>(&self, rng: &mut R) -> FeatureRecord {
        match self {
            ScenarioKind::Ddos => FeatureRecord {
                duration: 0.0,
                src_bytes: rng.random_range(50_000..150_000),
                dst_bytes: rng.random_range(50..1_050),
                count: rng.random_range(10..30),
                srv_count: 1,
                same_srv_rate: 0.1,
                dst_host_count: 50,
                dst_host_srv_count: 2,
                protocol_type: "udp".to_string(),
                service: "unknown".to_string(),
                flag: "S0".to_string(),
            },
            ScenarioKind::Portscan => FeatureRecord {
                duration: 0.0,
                src_bytes: 64,
                dst_bytes: 0,
                count: 1,
                srv_count: 1,
                same_srv_rate: 0.05,
                dst_host_count: 100,
                dst_host_srv_count: 1,
                protocol_type: "tcp".to_string(),
                service: "unknown".to_string(),
                flag: "S0".to_string(),
            },
            ScenarioKind::Exfiltration => FeatureRecord {
                duration: 0.0,
                src_bytes: rng.random_range(10_000..60_000),
                dst_bytes: rng.random_range(50..1_050),
                count: 1,
                srv_count: 1,
                same_srv_rate: 0.9,
                dst_host_count: 5,
                dst_host_srv_count: 1,
                protocol_type: "tcp".to_string(),
                service: "unknown".to_string(),
                flag: "SF".to_string(),
            },
        }
    }

    fn protocol(&self) -> Protocol {
        match self {
            ScenarioKind::Ddos => Protocol::Udp,
            ScenarioKind::Portscan | ScenarioKind::Exfiltration => Protocol::Tcp,
        }
    }

    /// Lot complet : descripteurs de flux et caractéristiques associées
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<(FlowDescriptor, FeatureRecord)> {
        (0..SCENARIO_BATCH_SIZE)
            .map(|_| {
                let features = self.features(rng);
                let flow = FlowDescriptor {
                    src_ip: random_ip(rng),
                    dst_ip: random_ip(rng),
                    src_port: ephemeral_port(rng),
                    dst_port: service_port(rng),
                    protocol: self.protocol(),
                    src_bytes: features.src_bytes,
                    dst_bytes: features.dst_bytes,
                };
                (flow, features)
            })
            .collect()
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ScenarioKind {
    type Err = UnknownScenario;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ddos" => Ok(ScenarioKind::Ddos),
            "portscan" | "port_scan" => Ok(ScenarioKind::Portscan),
            "exfiltration" | "exfil" => Ok(ScenarioKind::Exfiltration),
            other => Err(UnknownScenario(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parse_names() {
        assert_eq!("ddos".parse::<ScenarioKind>(), Ok(ScenarioKind::Ddos));
        assert_eq!("PortScan".parse::<ScenarioKind>(), Ok(ScenarioKind::Portscan));
        assert_eq!("exfil".parse::<ScenarioKind>(), Ok(ScenarioKind::Exfiltration));
        assert!("smurf".parse::<ScenarioKind>().is_err());
    }

    #[test]
    fn test_templates() {
        let mut rng = StdRng::seed_from_u64(1);
        for kind in ScenarioKind::ALL {
            let batch = kind.generate(&mut rng);
            assert_eq!(batch.len(), SCENARIO_BATCH_SIZE);
            for (flow, features) in batch {
                assert_eq!(flow.src_bytes, features.src_bytes);
                assert_eq!(flow.protocol.feature_name(), features.protocol_type);
                match kind {
                    ScenarioKind::Ddos => {
                        assert!((50_000..150_000).contains(&features.src_bytes));
                        assert!((10..30).contains(&features.count));
                        assert_eq!(features.flag, "S0");
                    }
                    ScenarioKind::Portscan => {
                        assert_eq!(features.src_bytes, 64);
                        assert_eq!(features.dst_bytes, 0);
                        assert_eq!(features.dst_host_count, 100);
                    }
                    ScenarioKind::Exfiltration => {
                        assert!((10_000..60_000).contains(&features.src_bytes));
                        assert_eq!(features.same_srv_rate, 0.9);
                    }
                }
            }
        }
    }
}
