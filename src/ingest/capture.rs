//! Flux issus d'une capture réseau réelle
//!
//! Un capteur externe agrège les paquets en flux sur une courte fenêtre et
//! poste le lot. Les caractéristiques de fenêtre (hôtes et services distincts)
//! sont calculées sur l'ensemble du lot reçu.

use super::synth::FlowDescriptor;
use crate::models::{FeatureRecord, Protocol};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;

/// Nombre maximal de flux acceptés dans un lot capturé
pub const MAX_CAPTURED_FLOWS: usize = 5000;

const TCP_FIN: u16 = 0x01;
const TCP_SYN: u16 = 0x02;
const TCP_RST: u16 = 0x04;
const TCP_ACK: u16 = 0x10;

/// Flux agrégé tel que posté par le capteur
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CapturedFlow {
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
    #[serde(default)]
    pub src_port: u16,
    #[serde(default)]
    pub dst_port: u16,
    /// Nom (`tcp`) ou numéro IP (`6`)
    #[serde(default)]
    pub protocol: String,
    /// Octets émis par la source
    #[serde(default)]
    pub bytes_out: u64,
    /// Octets du sens retour
    #[serde(default)]
    pub bytes_in: u64,
    #[serde(default = "default_packets")]
    pub packets: u32,
    /// Secondes entre le premier et le dernier paquet
    #[serde(default)]
    pub duration: f64,
    /// Drapeaux TCP, en lettres (`SA`) ou en hexadécimal (`0x012`)
    #[serde(default)]
    pub flags: String,
}

fn default_packets() -> u32 {
    1
}

/// Service NSL-KDD déduit du port de destination
pub fn map_service(dst_port: u16) -> &'static str {
    match dst_port {
        80 | 8080 | 8000 => "http",
        443 | 8443 => "https",
        53 => "domain",
        22 => "ssh",
        25 | 465 | 587 => "smtp",
        110 | 995 => "pop3",
        143 | 993 => "imap4",
        _ => "other",
    }
}

/// Catégorie de drapeau NSL-KDD (`SF`, `S0`, `RSTR`, `OTH`)
pub fn map_flag(flags: &str) -> &'static str {
    let flags = flags.trim();

    let letters: HashSet<char> = flags
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let hex = flags
        .strip_prefix("0x")
        .or_else(|| flags.strip_prefix("0X"))
        .unwrap_or(flags);

    let (syn, ack, rst, fin) = match u16::from_str_radix(hex, 16) {
        // Un résumé en lettres comme "FA" est aussi de l'hexadécimal valide
        Ok(bits) if flags.starts_with("0x") || flags.starts_with("0X") || letters.is_empty() => (
            bits & TCP_SYN != 0,
            bits & TCP_ACK != 0,
            bits & TCP_RST != 0,
            bits & TCP_FIN != 0,
        ),
        _ if !letters.is_empty() => (
            letters.contains(&'S'),
            letters.contains(&'A'),
            letters.contains(&'R'),
            letters.contains(&'F'),
        ),
        _ => return "OTH",
    };

    if syn && ack {
        "SF"
    } else if syn {
        "S0"
    } else if rst {
        "RSTR"
    } else if fin {
        "SF"
    } else {
        "OTH"
    }
}

impl CapturedFlow {
    pub fn descriptor(&self) -> FlowDescriptor {
        FlowDescriptor {
            src_ip: self.src_ip,
            dst_ip: self.dst_ip,
            src_port: self.src_port,
            dst_port: self.dst_port,
            protocol: Protocol::from_capture(&self.protocol),
            src_bytes: self.bytes_out,
            dst_bytes: self.bytes_in,
        }
    }
}

/// Descripteurs et caractéristiques d'un lot capturé, dans l'ordre reçu
pub fn captured_features(flows: &[CapturedFlow]) -> (Vec<FlowDescriptor>, Vec<FeatureRecord>) {
    let mut dst_hosts = HashSet::new();
    let mut dst_host_services = HashSet::new();
    let mut service_counts: HashMap<&'static str, u32> = HashMap::new();

    for flow in flows {
        let service = map_service(flow.dst_port);
        dst_hosts.insert(flow.dst_ip);
        dst_host_services.insert((flow.dst_ip, service));
        *service_counts.entry(service).or_insert(0) += 1;
    }

    let dst_host_count = (dst_hosts.len() as u32).max(1);
    let dst_host_srv_count = (dst_host_services.len() as u32).max(1);

    flows
        .iter()
        .map(|flow| {
            let descriptor = flow.descriptor();
            let service = map_service(flow.dst_port);
            let srv_count = service_counts.get(service).copied().unwrap_or(1).max(1);

            let features = FeatureRecord {
                duration: flow.duration.max(0.0),
                src_bytes: flow.bytes_out,
                dst_bytes: flow.bytes_in,
                count: flow.packets,
                srv_count,
                same_srv_rate: srv_count as f64 / dst_host_count as f64,
                dst_host_count,
                dst_host_srv_count,
                protocol_type: descriptor.protocol.feature_name().to_string(),
                service: service.to_string(),
                flag: map_flag(&flow.flags).to_string(),
            };
            (descriptor, features)
        })
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow(dst: [u8; 4], dst_port: u16, flags: &str) -> CapturedFlow {
        CapturedFlow {
            src_ip: Ipv4Addr::new(10, 0, 0, 5),
            dst_ip: Ipv4Addr::from(dst),
            src_port: 51000,
            dst_port,
            protocol: "6".to_string(),
            bytes_out: 1200,
            bytes_in: 800,
            packets: 7,
            duration: 1.5,
            flags: flags.to_string(),
        }
    }

    #[test]
    fn test_map_service() {
        assert_eq!(map_service(8080), "http");
        assert_eq!(map_service(993), "imap4");
        assert_eq!(map_service(53), "domain");
        assert_eq!(map_service(3306), "other");
    }

    #[test]
    fn test_map_flag_letters_and_hex() {
        assert_eq!(map_flag("SA"), "SF");
        assert_eq!(map_flag("S"), "S0");
        assert_eq!(map_flag("R"), "RSTR");
        assert_eq!(map_flag("FA"), "SF");
        assert_eq!(map_flag("0x012"), "SF");
        assert_eq!(map_flag("0x002"), "S0");
        assert_eq!(map_flag("0x004"), "RSTR");
        assert_eq!(map_flag("0x010"), "OTH");
        assert_eq!(map_flag(""), "OTH");
    }

    #[test]
    fn test_window_features() {
        let flows = vec![
            flow([192, 168, 1, 10], 443, "SA"),
            flow([192, 168, 1, 10], 22, "S"),
            flow([192, 168, 1, 11], 443, "0x012"),
        ];
        let (descriptors, features) = captured_features(&flows);

        assert_eq!(descriptors.len(), 3);
        assert_eq!(descriptors[0].protocol, Protocol::Tcp);
        assert_eq!(descriptors[0].src_bytes, 1200);

        assert_eq!(features[0].service, "https");
        assert_eq!(features[0].srv_count, 2);
        assert_eq!(features[0].dst_host_count, 2);
        assert_eq!(features[0].dst_host_srv_count, 3);
        assert!((features[0].same_srv_rate - 1.0).abs() < 1e-9);
        assert_eq!(features[1].flag, "S0");
        assert_eq!(features[1].service, "ssh");
        assert_eq!(features[1].protocol_type, "tcp");
        assert_eq!(features[2].count, 7);
    }

    #[test]
    fn test_wire_defaults() {
        let flow: CapturedFlow = serde_json::from_str(
            r#"{"srcIp": "10.0.0.1", "dstIp": "10.0.0.2", "protocol": "gre"}"#,
        )
        .unwrap();
        assert_eq!(flow.packets, 1);
        assert_eq!(flow.dst_port, 0);
        assert_eq!(flow.descriptor().protocol, Protocol::Other);
    }
}
