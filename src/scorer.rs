//! Client du modèle de détection externe
//!
//! Le modèle est traité comme une fonction distante opaque : une liste
//! d'enregistrements en entrée, un score par enregistrement en sortie, dans le
//! même ordre. Toute réponse qui ne respecte pas ce contrat est une erreur.

use crate::models::FeatureRecord;
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Échecs possibles lors d'un appel au modèle
#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("erreur réseau: {0}")]
    Network(String),
    #[error("réponse HTTP {0}")]
    Status(u16),
    #[error("réponse mal formée: {0}")]
    Malformed(String),
    #[error("nombre de scores invalide: {expected} attendus, {got} reçus")]
    LengthMismatch { expected: usize, got: usize },
}

/// État du modèle rapporté par le collaborateur
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModelStatus {
    pub model_loaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_max: Option<f64>,
}

/// Interface du collaborateur de score
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Un score par enregistrement, même longueur et même ordre
    async fn score(&self, records: &[FeatureRecord]) -> Result<Vec<f64>, ScorerError>;

    /// État du modèle ; un échec se traduit par `model_loaded: false`
    async fn status(&self) -> ModelStatus;
}

#[derive(Serialize)]
struct ScoreRequest<'a> {
    records: &'a [FeatureRecord],
}

#[derive(Deserialize)]
struct ScoreResponse {
    scores: Vec<f64>,
}

/// Vérifie que la réponse respecte le contrat de longueur
pub fn check_scores(expected: usize, scores: Vec<f64>) -> Result<Vec<f64>, ScorerError> {
    if scores.len() != expected {
        return Err(ScorerError::LengthMismatch {
            expected,
            got: scores.len(),
        });
    }
    Ok(scores)
}

/// Client HTTP du service de score (`/score` et `/status`)
pub struct HttpScorer {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpScorer {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ScorerError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScorerError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Scorer for HttpScorer {
    async fn score(&self, records: &[FeatureRecord]) -> Result<Vec<f64>, ScorerError> {
        let url = format!("{}/score", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .json(&ScoreRequest { records })
            .send()
            .await
            .map_err(|e| ScorerError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ScorerError::Status(response.status().as_u16()));
        }

        let body: ScoreResponse = response
            .json()
            .await
            .map_err(|e| ScorerError::Malformed(e.to_string()))?;

        debug!("{} scores reçus de {}", body.scores.len(), url);
        check_scores(records.len(), body.scores)
    }

    async fn status(&self) -> ModelStatus {
        let url = format!("{}/status", self.base_url);

        let response = match self.http_client.get(&url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!("Statut du modèle indisponible: HTTP {}", response.status());
                return ModelStatus::default();
            }
            Err(e) => {
                debug!("Statut du modèle indisponible: {}", e);
                return ModelStatus::default();
            }
        };

        response.json().await.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_mismatch_is_rejected() {
        assert!(check_scores(2, vec![0.1, 0.2]).is_ok());
        match check_scores(3, vec![0.1]) {
            Err(ScorerError::LengthMismatch { expected, got }) => {
                assert_eq!(expected, 3);
                assert_eq!(got, 1);
            }
            other => panic!("résultat inattendu: {:?}", other),
        }
    }

    #[test]
    fn test_status_body_defaults() {
        let status: ModelStatus = serde_json::from_str(r#"{"model_loaded": true}"#).unwrap();
        assert!(status.model_loaded);
        assert_eq!(status.features, None);
        assert!(!ModelStatus::default().model_loaded);
    }

    #[test]
    fn test_base_url_is_normalized() {
        let scorer = HttpScorer::new("http://127.0.0.1:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(scorer.base_url(), "http://127.0.0.1:8000");
    }

    #[tokio::test]
    async fn test_unreachable_status_means_not_loaded() {
        // Port 9 (discard) : aucune écoute attendue en local
        let scorer = HttpScorer::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        let status = scorer.status().await;
        assert!(!status.model_loaded);
        assert!(scorer.score(&[]).await.is_err());
    }
}
