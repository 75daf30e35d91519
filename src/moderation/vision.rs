//! # Remote Vision Classifier
//! Optional moderation capability: a remote endpoint that looks at the photo
//! payload plus description and returns AI-generation, spam and category
//! signals. Treated as unreliable by contract: any network, status or parse
//! failure degrades to `None` ("unavailable") and the pipeline continues on
//! local heuristics alone.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::complaint::Category;
use crate::config::VisionConfig;

/// Findings returned by a vision provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionFindings {
    pub ai_generated: bool,
    pub ai_reason: Option<String>,
    pub spam: bool,
    pub spam_reason: Option<String>,
    pub category: Category,
    pub confidence: f32,
}

/// Trait object used by the moderation coordinator and tests.
pub trait VisionClassifier: Send + Sync {
    /// Classify one submission. `None` means the capability is unavailable
    /// right now; it is never an error.
    fn classify<'a>(
        &'a self,
        photo: &'a str,
        description: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<VisionFindings>> + Send + 'a>>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynVisionClassifier = Arc<dyn VisionClassifier>;

/// Factory: build a classifier from config and environment.
///
/// * `VISION_TEST_MODE=static` returns a deterministic benign client.
/// * A disabled or endpoint-less config returns [`DisabledVision`].
pub fn build_from_config(config: &VisionConfig) -> DynVisionClassifier {
    if std::env::var("VISION_TEST_MODE")
        .map(|v| v == "static")
        .unwrap_or(false)
    {
        return Arc::new(StaticVision {
            fixed: VisionFindings {
                ai_generated: false,
                ai_reason: None,
                spam: false,
                spam_reason: None,
                category: Category::Other,
                confidence: 0.0,
            },
        });
    }
    if !config.enabled || config.endpoint.trim().is_empty() {
        return Arc::new(DisabledVision);
    }
    Arc::new(HttpVisionClassifier::new(config))
}

/// Returns `None` always; used when the vision endpoint is not configured.
pub struct DisabledVision;

impl VisionClassifier for DisabledVision {
    fn classify<'a>(
        &'a self,
        _photo: &'a str,
        _description: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<VisionFindings>> + Send + 'a>> {
        Box::pin(async { None })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Fixed-answer client for tests and local runs.
#[derive(Clone)]
pub struct StaticVision {
    pub fixed: VisionFindings,
}

impl VisionClassifier for StaticVision {
    fn classify<'a>(
        &'a self,
        _photo: &'a str,
        _description: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<VisionFindings>> + Send + 'a>> {
        let out = self.fixed.clone();
        Box::pin(async move { Some(out) })
    }
    fn provider_name(&self) -> &'static str {
        "static"
    }
}

/// HTTP provider posting `{description, photo_base64}` to the configured
/// moderation endpoint.
pub struct HttpVisionClassifier {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpVisionClassifier {
    pub fn new(config: &VisionConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("civic-intake/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("reqwest client");
        Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.resolved_api_key(),
        }
    }
}

impl VisionClassifier for HttpVisionClassifier {
    fn classify<'a>(
        &'a self,
        photo: &'a str,
        description: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<VisionFindings>> + Send + 'a>> {
        Box::pin(async move {
            #[derive(Serialize)]
            struct Req<'a> {
                description: &'a str,
                photo_base64: &'a str,
            }

            let mut req = self.http.post(&self.endpoint).json(&Req {
                description,
                photo_base64: photo,
            });
            if !self.api_key.is_empty() {
                req = req.bearer_auth(&self.api_key);
            }

            let resp = req.send().await.ok()?;
            if !resp.status().is_success() {
                return None;
            }
            let wire: WireFindings = resp.json().await.ok()?;
            Some(wire.into())
        })
    }
    fn provider_name(&self) -> &'static str {
        "http"
    }
}

/// Wire shape of the endpoint response. Defaults keep older moderation
/// deployments that omit the spam fields parseable.
#[derive(Debug, Deserialize)]
struct WireFindings {
    ai_generated: bool,
    #[serde(default)]
    ai_reason: Option<String>,
    #[serde(default)]
    spam: bool,
    #[serde(default)]
    spam_reason: Option<String>,
    category: String,
    confidence: f32,
}

impl From<WireFindings> for VisionFindings {
    fn from(w: WireFindings) -> Self {
        VisionFindings {
            ai_generated: w.ai_generated,
            ai_reason: w.ai_reason.map(|r| sanitize_reason(&r)).filter(|r| !r.is_empty()),
            spam: w.spam,
            spam_reason: w.spam_reason.map(|r| sanitize_reason(&r)).filter(|r| !r.is_empty()),
            category: Category::parse_lenient(&w.category),
            confidence: clamp01(w.confidence),
        }
    }
}

/// Ensure ASCII-only, single line, and <=160 chars. Collapses whitespace.
/// Provider text ends up in citizen-facing rejection messages.
fn sanitize_reason(input: &str) -> String {
    let mut out = String::with_capacity(160);
    let mut prev_space = false;
    for ch in input.chars() {
        let c = match ch {
            '\r' | '\n' | '\t' => ' ',
            c if c.is_ascii() => c,
            _ => ' ',
        };
        if c == ' ' {
            if !prev_space && !out.is_empty() {
                out.push(' ');
            }
            prev_space = true;
        } else {
            out.push(c);
            prev_space = false;
        }
        if out.len() >= 160 {
            break;
        }
    }
    out.trim().to_string()
}

fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}
