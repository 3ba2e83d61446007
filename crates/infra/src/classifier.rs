//! Client for the external skin-image classifier.
//!
//! The classifier is an opaque HTTP service: `POST {base}/predict` with the
//! image as multipart field `file`, answering
//! `{"condition": ..., "confidence": ..., "alternative_predictions": [...]}`.
//! Anything else it sends back is ignored.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;

use aurora_triage::{Alternative, ClassificationResult, Condition};

/// Default bound on one classifier round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("classifier did not answer within {0:?}")]
    Timeout(Duration),

    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    #[error("classifier answered with status {0}")]
    UpstreamStatus(u16),

    #[error("classifier response invalid: {0}")]
    InvalidResponse(String),
}

/// An image handed to the classifier.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn predict(&self, image: ImagePayload) -> Result<ClassificationResult, ClassifierError>;
}

/// Wire shape of a `/predict` answer.
#[derive(Debug, Deserialize)]
pub struct PredictResponse {
    pub condition: String,
    pub confidence: f64,
    #[serde(default)]
    pub alternative_predictions: Vec<AlternativePrediction>,
}

#[derive(Debug, Deserialize)]
pub struct AlternativePrediction {
    pub condition: String,
    pub confidence: f64,
}

impl PredictResponse {
    /// Validate into a [`ClassificationResult`].
    pub fn into_result(self) -> Result<ClassificationResult, ClassifierError> {
        let invalid = |e: aurora_triage::TriageError| ClassifierError::InvalidResponse(e.to_string());

        let mut alternatives = Vec::with_capacity(self.alternative_predictions.len());
        for alt in self.alternative_predictions {
            let label: Condition = alt.condition.parse().map_err(invalid)?;
            alternatives.push(Alternative {
                label,
                confidence: alt.confidence,
            });
        }

        ClassificationResult::from_raw(&self.condition, self.confidence)
            .and_then(|r| r.with_alternatives(alternatives))
            .map_err(invalid)
    }
}

/// reqwest-backed [`Classifier`].
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: reqwest::Client,
    predict_url: String,
    timeout: Duration,
}

impl HttpClassifier {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClassifierError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClassifierError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            predict_url: format!("{}/predict", base_url.trim_end_matches('/')),
            timeout,
        })
    }

    pub fn predict_url(&self) -> &str {
        &self.predict_url
    }

    fn map_transport(&self, err: reqwest::Error) -> ClassifierError {
        if err.is_timeout() {
            ClassifierError::Timeout(self.timeout)
        } else {
            ClassifierError::Unavailable(err.to_string())
        }
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn predict(&self, image: ImagePayload) -> Result<ClassificationResult, ClassifierError> {
        let size = image.bytes.len();
        let form = Form::new().part("file", Part::bytes(image.bytes).file_name(image.filename));

        let started = Instant::now();
        let response = self
            .client
            .post(&self.predict_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_transport(e));

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    latency_ms = started.elapsed().as_millis() as u64,
                    "classifier request failed"
                );
                return Err(e);
            }
        };

        let status = response.status();
        tracing::info!(
            status = status.as_u16(),
            bytes = size,
            latency_ms = started.elapsed().as_millis() as u64,
            "classifier responded"
        );

        if !status.is_success() {
            return Err(ClassifierError::UpstreamStatus(status.as_u16()));
        }

        let body: PredictResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ClassifierError::Timeout(self.timeout)
            } else {
                ClassifierError::InvalidResponse(e.to_string())
            }
        })?;

        body.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ImagePayload {
        ImagePayload {
            filename: "face.jpg".to_string(),
            bytes: vec![0xff, 0xd8, 0xff],
        }
    }

    #[test]
    fn predict_response_parses_display_names() {
        let body: PredictResponse = serde_json::from_value(serde_json::json!({
            "condition": "Oily Skin",
            "confidence": 0.93,
            "alternative_predictions": [
                {"condition": "Acne", "confidence": 0.04},
                {"condition": "Normal", "confidence": 0.02}
            ],
            "recommendation_type": "cautious_products"
        }))
        .unwrap();

        let result = body.into_result().unwrap();
        assert_eq!(result.label, Condition::OilySkin);
        assert_eq!(result.alternatives.len(), 2);
        assert_eq!(result.alternatives[0].label, Condition::Acne);
    }

    #[test]
    fn unknown_label_or_bad_confidence_is_invalid_response() {
        let unknown = PredictResponse {
            condition: "Sunburn".to_string(),
            confidence: 0.5,
            alternative_predictions: vec![],
        };
        assert!(matches!(unknown.into_result(), Err(ClassifierError::InvalidResponse(_))));

        let out_of_range = PredictResponse {
            condition: "Acne".to_string(),
            confidence: 1.7,
            alternative_predictions: vec![],
        };
        assert!(matches!(out_of_range.into_result(), Err(ClassifierError::InvalidResponse(_))));
    }

    #[test]
    fn predict_url_is_joined_once() {
        let c = HttpClassifier::new("http://classifier:5000/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(c.predict_url(), "http://classifier:5000/predict");
    }

    #[tokio::test]
    async fn refused_connection_is_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let c = HttpClassifier::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap();
        let err = c.predict(payload()).await.unwrap_err();
        assert!(matches!(err, ClassifierError::Unavailable(_)), "{err:?}");
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hold = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((sock, _)) = listener.accept().await {
                open.push(sock);
            }
        });

        let timeout = Duration::from_millis(200);
        let c = HttpClassifier::new(&format!("http://{addr}"), timeout).unwrap();
        let err = c.predict(payload()).await.unwrap_err();
        assert_eq!(err, ClassifierError::Timeout(timeout));

        hold.abort();
    }
}
