// src/moderation/mod.rs
//! Moderation coordinator: gathers fingerprint, duplicate, spam and
//! classifier signals into one report, then applies the accept/reject policy.

pub mod classify;
pub mod fingerprint;
pub mod spam;
pub mod vision;

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};

use crate::complaint::{Category, ClassifierSource, Status};
use crate::store::ComplaintStore;

// Re-export convenient types.
pub use crate::moderation::vision::{DynVisionClassifier, VisionFindings};

/// Classifier opinions at or above this confidence override the citizen's
/// own category choice.
pub const CLASSIFIER_TRUST_THRESHOLD: f32 = 0.6;

/// Prior complaint sharing the photo fingerprint.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateMatch {
    pub prior_id: String,
    pub prior_status: Status,
}

/// Everything moderation learned about one submission. Ephemeral; the
/// orchestrator folds the relevant bits into the Complaint record.
#[derive(Debug, Clone, PartialEq)]
pub struct ModerationReport {
    pub fingerprint: Option<String>,
    pub ai_generated: bool,
    pub ai_reason: Option<String>,
    pub spam: bool,
    pub spam_reasons: Vec<String>,
    pub duplicate: Option<DuplicateMatch>,
    /// Classifier opinion (vision when available, else text keywords).
    pub category: Category,
    pub confidence: f32,
    pub source: ClassifierSource,
}

/// Accept/reject policy outcome, evaluated in a fixed order.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accept,
    /// Authenticity failure: the photo looks machine-generated.
    RejectAiGenerated { reason: String },
    /// The same issue is already filed and still open.
    RejectDuplicate { prior_id: String },
    /// Content-quality failure from the heuristics or the vision endpoint.
    RejectSpam { reasons: String },
}

impl ModerationReport {
    /// Policy order: authenticity beats everything, an open duplicate beats
    /// spam, spam beats acceptance.
    pub fn verdict(&self) -> Verdict {
        if self.ai_generated {
            let reason = self
                .ai_reason
                .clone()
                .unwrap_or_else(|| "photo appears to be AI-generated".to_string());
            return Verdict::RejectAiGenerated { reason };
        }
        if let Some(dup) = &self.duplicate {
            if dup.prior_status.is_open() {
                return Verdict::RejectDuplicate {
                    prior_id: dup.prior_id.clone(),
                };
            }
        }
        if self.spam {
            return Verdict::RejectSpam {
                reasons: self.spam_reasons.join("; "),
            };
        }
        Verdict::Accept
    }

    /// Final category for priority and routing. Low-confidence classifier
    /// guesses never override explicit citizen intent.
    pub fn final_category(&self, citizen_category: Category) -> Category {
        if self.confidence >= CLASSIFIER_TRUST_THRESHOLD {
            self.category
        } else {
            citizen_category
        }
    }
}

/// Runs the moderation steps for one submission.
pub struct ModerationCoordinator {
    store: Arc<dyn ComplaintStore>,
    vision: DynVisionClassifier,
}

impl ModerationCoordinator {
    pub fn new(store: Arc<dyn ComplaintStore>, vision: DynVisionClassifier) -> Self {
        Self { store, vision }
    }

    /// Gather all signals. Store reads and the vision call degrade silently;
    /// this function itself never fails.
    pub async fn run(
        &self,
        reporter: &str,
        citizen_category: Category,
        description: &str,
        photo: &str,
    ) -> ModerationReport {
        let fingerprint = fingerprint::photo_fingerprint(photo);

        let duplicate = match &fingerprint {
            Some(fp) => match self.store.find_by_fingerprint(fp).await {
                Ok(hits) => hits.first().map(|prior| DuplicateMatch {
                    prior_id: prior.id.clone(),
                    prior_status: prior.status,
                }),
                Err(err) => {
                    warn!(target: "moderation", error = %err, "fingerprint lookup failed; continuing without duplicate signal");
                    None
                }
            },
            None => None,
        };

        let normalized = spam::normalize_description(description);
        let recent_same_text = match self
            .store
            .count_recent_descriptions(reporter, &normalized, spam::REPEAT_WINDOW_DAYS)
            .await
        {
            Ok(n) => n,
            Err(err) => {
                warn!(target: "moderation", error = %err, "repetition lookup failed; continuing without repetition signal");
                0
            }
        };

        let scan = spam::scan(description, recent_same_text);
        let mut spam_flag = scan.flagged;
        let mut spam_reasons = scan.reasons;

        let (mut category, mut confidence) = classify::classify_text(description, citizen_category);
        let mut source = ClassifierSource::Text;
        let mut ai_generated = false;
        let mut ai_reason = None;

        match self.vision.classify(photo, description).await {
            Some(findings) => {
                ai_generated = findings.ai_generated;
                ai_reason = findings.ai_reason;
                if findings.spam {
                    spam_flag = true;
                    spam_reasons.push(
                        findings
                            .spam_reason
                            .unwrap_or_else(|| "flagged by the vision endpoint".to_string()),
                    );
                }
                category = findings.category;
                confidence = findings.confidence;
                source = ClassifierSource::Vision;
            }
            None => {
                counter!("moderation_vision_unavailable_total").increment(1);
                debug!(target: "moderation", provider = self.vision.provider_name(), "vision classifier unavailable; using text classifier only");
            }
        }

        // A duplicate of an already-resolved complaint is stale noise, not a
        // conflict.
        if let Some(dup) = &duplicate {
            if dup.prior_status.is_resolved_like() {
                spam_flag = true;
                spam_reasons.push(format!(
                    "duplicate of resolved complaint {}",
                    fingerprint::short_id(&dup.prior_id)
                ));
            }
        }

        let report = ModerationReport {
            fingerprint,
            ai_generated,
            ai_reason,
            spam: spam_flag,
            spam_reasons,
            duplicate,
            category,
            confidence,
            source,
        };

        debug!(
            target: "moderation",
            fp = report.fingerprint.as_deref().map(fingerprint::short_id).unwrap_or("-"),
            ai = report.ai_generated,
            spam = report.spam,
            duplicate = report.duplicate.is_some(),
            category = %report.category,
            confidence = report.confidence,
            "moderation signals gathered"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk_report() -> ModerationReport {
        ModerationReport {
            fingerprint: Some("f".repeat(64)),
            ai_generated: false,
            ai_reason: None,
            spam: false,
            spam_reasons: Vec::new(),
            duplicate: None,
            category: Category::Water,
            confidence: 0.75,
            source: ClassifierSource::Text,
        }
    }

    #[test]
    fn clean_report_is_accepted() {
        assert_eq!(mk_report().verdict(), Verdict::Accept);
    }

    #[test]
    fn ai_flag_wins_over_everything() {
        let mut r = mk_report();
        r.ai_generated = true;
        r.ai_reason = Some("synthetic texture".into());
        r.spam = true;
        r.spam_reasons.push("also spammy".into());
        r.duplicate = Some(DuplicateMatch {
            prior_id: "prior-1".into(),
            prior_status: Status::Submitted,
        });
        assert_eq!(
            r.verdict(),
            Verdict::RejectAiGenerated {
                reason: "synthetic texture".into()
            }
        );
    }

    #[test]
    fn open_duplicate_beats_spam() {
        let mut r = mk_report();
        r.spam = true;
        r.spam_reasons.push("contains a URL-like token".into());
        r.duplicate = Some(DuplicateMatch {
            prior_id: "prior-7".into(),
            prior_status: Status::InProgress,
        });
        assert_eq!(
            r.verdict(),
            Verdict::RejectDuplicate {
                prior_id: "prior-7".into()
            }
        );
    }

    #[test]
    fn resolved_duplicate_is_not_a_conflict() {
        let mut r = mk_report();
        r.duplicate = Some(DuplicateMatch {
            prior_id: "prior-9".into(),
            prior_status: Status::Closed,
        });
        assert_eq!(r.verdict(), Verdict::Accept);

        // With the stale-duplicate spam signal applied it rejects as spam.
        r.spam = true;
        r.spam_reasons.push("duplicate of resolved complaint prior-9".into());
        assert!(matches!(r.verdict(), Verdict::RejectSpam { .. }));
    }

    #[test]
    fn spam_reasons_are_concatenated() {
        let mut r = mk_report();
        r.spam = true;
        r.spam_reasons = vec!["reason one".into(), "reason two".into()];
        assert_eq!(
            r.verdict(),
            Verdict::RejectSpam {
                reasons: "reason one; reason two".into()
            }
        );
    }

    #[test]
    fn confidence_gate_protects_citizen_intent() {
        let mut r = mk_report();
        r.category = Category::Road;
        r.confidence = 0.75;
        assert_eq!(r.final_category(Category::Garbage), Category::Road);

        r.confidence = 0.55;
        assert_eq!(r.final_category(Category::Garbage), Category::Garbage);

        // At exactly the threshold the classifier is trusted.
        r.confidence = CLASSIFIER_TRUST_THRESHOLD;
        assert_eq!(r.final_category(Category::Garbage), Category::Road);
    }
}
