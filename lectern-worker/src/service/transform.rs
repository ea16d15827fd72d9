//! Transformation service
//!
//! Turns an input document into structured study material. The real
//! implementation calls a vision-model gateway over HTTP; the offline one
//! derives placeholder sections from the document itself.

use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use lectern_core::domain::job::{JobOptions, bounded_text};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Language used when the job does not ask for one
pub const DEFAULT_LANGUAGE: &str = "Spanish";

/// Characters of a failed gateway response kept in the error
pub const UPSTREAM_BODY_LIMIT: usize = 1024;

/// Structured result of a transformation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyMaterial {
    #[serde(default)]
    pub title: String,
    pub sections: Vec<StudySection>,
}

/// One explained slide or page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySection {
    pub number: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub explanation: Vec<String>,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub connections: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub flashcards: Vec<Flashcard>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

/// What the transformer is asked to do
#[derive(Debug, Clone)]
pub struct TransformRequest<'a> {
    pub input: &'a [u8],
    pub language: &'a str,
    pub options: &'a JobOptions,
}

impl<'a> TransformRequest<'a> {
    pub fn new(input: &'a [u8], options: &'a JobOptions) -> Self {
        let language = options
            .get("language")
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE);

        Self {
            input,
            language,
            options,
        }
    }
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("transformer request failed: {0}")]
    Request(String),

    #[error("transformer returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("transformer response is invalid: {0}")]
    InvalidResponse(String),

    #[error("transformer produced no sections")]
    NoSections,
}

/// Service trait for document transformation
#[async_trait]
pub trait Transformer: Send + Sync {
    async fn transform(&self, request: TransformRequest<'_>) -> Result<StudyMaterial, TransformError>;
}

/// [`Transformer`] backed by an HTTP vision-model gateway
///
/// Posts `{document_base64, content_type, language, options}` and expects a
/// [`StudyMaterial`] body back.
pub struct HttpTransformer {
    client: Client,
    url: String,
}

impl HttpTransformer {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TransformError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransformError::Request(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Transformer for HttpTransformer {
    async fn transform(&self, request: TransformRequest<'_>) -> Result<StudyMaterial, TransformError> {
        let body = serde_json::json!({
            "document_base64": general_purpose::STANDARD.encode(request.input),
            "content_type": "application/pdf",
            "language": request.language,
            "options": request.options,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransformError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransformError::Upstream {
                status,
                body: bounded_text(&body, UPSTREAM_BODY_LIMIT, "..."),
            });
        }

        let raw = response
            .bytes()
            .await
            .map_err(|e| TransformError::Request(e.to_string()))?;
        let material: StudyMaterial = serde_json::from_slice(&raw).map_err(|e| {
            tracing::error!(raw_response = %String::from_utf8_lossy(&raw), "Failed to parse transformer JSON");
            TransformError::InvalidResponse(e.to_string())
        })?;

        if material.sections.is_empty() {
            return Err(TransformError::NoSections);
        }
        Ok(material)
    }
}

/// Offline [`Transformer`] for local runs and tests
///
/// Produces one section per PDF page (one section when no page markers are
/// found) with fixed placeholder text.
#[derive(Debug, Default, Clone)]
pub struct EchoTransformer;

#[async_trait]
impl Transformer for EchoTransformer {
    async fn transform(&self, request: TransformRequest<'_>) -> Result<StudyMaterial, TransformError> {
        let pages = count_pdf_pages(request.input).max(1);

        let sections = (1..=pages)
            .map(|n| StudySection {
                number: n,
                title: format!("Slide {}", n),
                explanation: vec![format!(
                    "Offline explanation for slide {} of {} ({}).",
                    n, pages, request.language
                )],
                key_points: vec![format!("Key point of slide {}", n)],
                connections: String::new(),
                summary: format!("Slide {} summary.", n),
                flashcards: vec![Flashcard {
                    question: format!("What is slide {} about?", n),
                    answer: format!("Slide {} of the lecture.", n),
                }],
            })
            .collect();

        Ok(StudyMaterial {
            title: "Lecture".to_string(),
            sections,
        })
    }
}

/// Count `/Type /Page` objects, ignoring the `/Pages` tree nodes
fn count_pdf_pages(input: &[u8]) -> u32 {
    const MARKER: &[u8] = b"/Type";
    let mut count = 0;
    let mut i = 0;

    while i + MARKER.len() <= input.len() {
        if &input[i..i + MARKER.len()] != MARKER {
            i += 1;
            continue;
        }
        let mut j = i + MARKER.len();
        while j < input.len() && input[j].is_ascii_whitespace() {
            j += 1;
        }
        let rest = &input[j..];
        if rest.starts_with(b"/Page") && !rest[5..].starts_with(b"s") {
            count += 1;
        }
        i = j.max(i + 1);
    }

    count
}
