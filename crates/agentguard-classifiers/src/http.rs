//! HTTP adapters for hosted inference endpoints
//!
//! Both adapters speak the request/response shapes of the common hosted
//! inference APIs:
//!
//! ```text
//! zero-shot:  POST {"inputs": "...", "parameters": {"candidate_labels": [...], "multi_label": false}}
//!             <- {"labels": [...], "scores": [...]}   or   [{"label": "...", "score": 0.9}, ...]
//! image:      POST <raw image bytes>
//!             <- [{"label": "nsfw", "score": 0.9}, {"label": "normal", "score": 0.1}]
//! ```

use crate::classifier::{
    ClassificationMetadata, ClassificationResult, ImageClassifier, ZeroShotClassifier,
};
use crate::config::EndpointConfig;
use agentguard_core::{preview, Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Zero-shot classifier backed by an HTTP inference endpoint
pub struct HttpZeroShotClassifier {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    model: Option<String>,
}

impl HttpZeroShotClassifier {
    /// Create a client for `endpoint` with a request timeout
    pub fn new(endpoint: &EndpointConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            url: endpoint.url.clone(),
            token: endpoint.resolve_token(),
            model: endpoint.model.clone(),
        })
    }
}

#[async_trait]
impl ZeroShotClassifier for HttpZeroShotClassifier {
    async fn classify(&self, text: &str, candidate_labels: &[String]) -> Result<ClassificationResult> {
        let body = json!({
            "inputs": text,
            "parameters": {
                "candidate_labels": candidate_labels,
                "multi_label": false,
            },
        });

        let request = with_auth(self.client.post(&self.url), self.token.as_deref()).json(&body);
        let payload = send(request, self.name()).await?;

        let mut result = parse_zero_shot(payload)?;
        result.metadata.model = self.model.clone();
        Ok(result)
    }

    fn name(&self) -> &str {
        "http-zero-shot"
    }
}

/// Image classifier backed by an HTTP inference endpoint
pub struct HttpImageClassifier {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    model: Option<String>,
}

impl HttpImageClassifier {
    /// Create a client for `endpoint` with a request timeout
    pub fn new(endpoint: &EndpointConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            url: endpoint.url.clone(),
            token: endpoint.resolve_token(),
            model: endpoint.model.clone(),
        })
    }
}

#[async_trait]
impl ImageClassifier for HttpImageClassifier {
    async fn classify_image(&self, image: &[u8]) -> Result<ClassificationResult> {
        let request = with_auth(self.client.post(&self.url), self.token.as_deref())
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec());
        let payload = send(request, self.name()).await?;

        let scores: Vec<LabelScore> = serde_json::from_value(payload)
            .map_err(|e| Error::service(format!("malformed image classification response: {}", e)))?;

        let mut result = top_of(scores)?;
        result.metadata.model = self.model.clone();
        Ok(result)
    }

    fn name(&self) -> &str {
        "http-image"
    }
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ZeroShotResponse {
    Ranked { labels: Vec<String>, scores: Vec<f32> },
    Scored(Vec<LabelScore>),
}

/// Parse a zero-shot response body into its top label
pub fn parse_zero_shot(payload: serde_json::Value) -> Result<ClassificationResult> {
    let response: ZeroShotResponse = serde_json::from_value(payload)
        .map_err(|e| Error::service(format!("malformed zero-shot response: {}", e)))?;

    let scores = match response {
        ZeroShotResponse::Ranked { labels, scores } => {
            if labels.len() != scores.len() {
                return Err(Error::service(format!(
                    "zero-shot response has {} labels but {} scores",
                    labels.len(),
                    scores.len()
                )));
            }
            labels
                .into_iter()
                .zip(scores)
                .map(|(label, score)| LabelScore { label, score })
                .collect()
        }
        ZeroShotResponse::Scored(scores) => scores,
    };

    top_of(scores)
}

fn top_of(scores: Vec<LabelScore>) -> Result<ClassificationResult> {
    if let Some(bad) = scores.iter().find(|s| !s.score.is_finite()) {
        return Err(Error::service(format!("non-finite score for '{}'", bad.label)));
    }

    let top = scores
        .iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(|| Error::service("classification response contained no labels"))?;

    let mut result = ClassificationResult::new(top.label.clone(), top.score);
    result.metadata = ClassificationMetadata {
        model: None,
        all_scores: Some(scores.iter().map(|s| (s.label.clone(), s.score)).collect()),
    };
    Ok(result)
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))
}

fn with_auth(request: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

async fn send(request: reqwest::RequestBuilder, name: &str) -> Result<serde_json::Value> {
    let response = request.send().await.map_err(|e| map_reqwest(e, name))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::service(format!(
            "{} returned {}: {}",
            name,
            status,
            preview(&body, 200)
        )));
    }

    response.json().await.map_err(|e| map_reqwest(e, name))
}

fn map_reqwest(err: reqwest::Error, name: &str) -> Error {
    if err.is_timeout() {
        Error::Timeout
    } else {
        Error::service(format!("{} request failed: {}", name, err))
    }
}
