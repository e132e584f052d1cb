//! Génération de flux synthétiques pour la démonstration et la simulation

use crate::models::{FeatureRecord, Protocol};
use rand::Rng;
use std::net::Ipv4Addr;

/// Description brute d'un flux avant score et classification
#[derive(Debug, Clone, PartialEq)]
pub struct FlowDescriptor {
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
    pub src_port: u16,
    pub dst_port: u16,
    pub protocol: Protocol,
    pub src_bytes: u64,
    pub dst_bytes: u64,
}

impl FlowDescriptor {
    /// Caractéristiques transmises au modèle pour le trafic courant
    pub fn live_features(&self) -> FeatureRecord {
        FeatureRecord {
            duration: 0.0,
            src_bytes: self.src_bytes,
            dst_bytes: self.dst_bytes,
            count: 1,
            srv_count: 1,
            same_srv_rate: 0.7,
            dst_host_count: 20,
            dst_host_srv_count: 5,
            protocol_type: self.protocol.feature_name().to_string(),
            service: "unknown".to_string(),
            flag: "SF".to_string(),
        }
    }
}

pub fn random_ip<R: Rng + ?Sized>(rng: &mut R) -> Ipv4Addr {
    Ipv4Addr::new(rng.random(), rng.random(), rng.random(), rng.random())
}

/// Port éphémère (source)
pub fn ephemeral_port<R: Rng + ?Sized>(rng: &mut R) -> u16 {
    rng.random_range(1024..=65535)
}

/// Port de service connu (destination)
pub fn service_port<R: Rng + ?Sized>(rng: &mut R) -> u16 {
    rng.random_range(1..=1024)
}

/// Flux aléatoire représentatif du trafic de fond
pub fn random_flow<R: Rng + ?Sized>(rng: &mut R) -> FlowDescriptor {
    let protocol = Protocol::ALL[rng.random_range(0..Protocol::ALL.len())];

    FlowDescriptor {
        src_ip: random_ip(rng),
        dst_ip: random_ip(rng),
        src_port: ephemeral_port(rng),
        dst_port: service_port(rng),
        protocol,
        src_bytes: rng.random_range(100..10_100),
        dst_bytes: rng.random_range(50..5_050),
    }
}

pub fn random_flows<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<FlowDescriptor> {
    (0..count).map(|_| random_flow(rng)).collect()
}
