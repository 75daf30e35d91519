// src/intake.rs
//! Intake orchestrator: validating → moderating → (rejected | routing) →
//! assigning → notifying → persisted. After moderation, nothing but the
//! store insert itself can fail a submission; geocoding, routing, assignment
//! and notification all degrade to defaults.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use metrics::{counter, gauge, histogram};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::complaint::{Category, Complaint, Officer, Status};
use crate::config::GeocoderConfig;
use crate::moderation::{DynVisionClassifier, ModerationCoordinator, ModerationReport, Verdict};
use crate::notify::{DispatchOutcome, DynMailer, NotificationDispatcher};
use crate::priority::assign_priority;
use crate::routing::{
    division_for_ward, GeocodeSummary, OfficerDirectory, ReverseGeocoder, ZoneTable,
    UNASSIGNED_WARD,
};
use crate::store::ComplaintStore;

/// One submission as received from the API edge, pre-validation.
#[derive(Debug, Clone)]
pub struct NewComplaint {
    pub reporter: String,
    /// Citizen-chosen category string; normalized leniently.
    pub category: String,
    pub description: String,
    /// Opaque photo payload; empty when the citizen sent none.
    pub photo: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// The only errors that cross the pipeline boundary: validation, the three
/// hard rejections, and a failed insert. Everything else degrades.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("invalid submission: {0}")]
    Validation(String),
    #[error("rejected: {reason}")]
    AiGenerated { reason: String },
    #[error("rejected: this issue is already filed and open (complaint {prior_id})")]
    DuplicateActive { prior_id: String },
    #[error("rejected as spam: {reasons}")]
    Spam { reasons: String },
    #[error("failed to persist complaint")]
    Store(anyhow::Error),
}

/// Accepted submission: the persisted record plus what the dispatcher
/// managed to do for it.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub complaint: Complaint,
    pub officer: Option<Officer>,
    pub dispatch: DispatchOutcome,
}

pub struct IntakePipeline {
    store: Arc<dyn ComplaintStore>,
    moderation: ModerationCoordinator,
    geocoder: Arc<dyn ReverseGeocoder>,
    zones: ZoneTable,
    officers: OfficerDirectory,
    dispatcher: NotificationDispatcher,
    fallback_city: String,
    fallback_state: String,
}

impl IntakePipeline {
    pub fn new(
        store: Arc<dyn ComplaintStore>,
        vision: DynVisionClassifier,
        geocoder: Arc<dyn ReverseGeocoder>,
        zones: ZoneTable,
        officers: OfficerDirectory,
        mailer: DynMailer,
        geocoder_config: &GeocoderConfig,
    ) -> Self {
        Self {
            moderation: ModerationCoordinator::new(store.clone(), vision),
            dispatcher: NotificationDispatcher::new(store.clone(), mailer),
            store,
            geocoder,
            zones,
            officers,
            fallback_city: geocoder_config.fallback_city.clone(),
            fallback_state: geocoder_config.fallback_state.clone(),
        }
    }

    /// Run one submission through the whole pipeline.
    pub async fn submit(&self, new: NewComplaint) -> Result<SubmitOutcome, IntakeError> {
        let started = Instant::now();
        counter!("intake_submissions_total").increment(1);
        gauge!("intake_last_submission_ts").set(Utc::now().timestamp() as f64);

        // validating
        validate(&new)?;
        let citizen_category = Category::parse_lenient(&new.category);

        // moderating
        let report = self
            .moderation
            .run(&new.reporter, citizen_category, &new.description, &new.photo)
            .await;
        match report.verdict() {
            Verdict::Accept => {}
            Verdict::RejectAiGenerated { reason } => {
                counter!("intake_rejected_ai_total").increment(1);
                info!(target: "intake", "submission rejected: ai-generated");
                return Err(IntakeError::AiGenerated { reason });
            }
            Verdict::RejectDuplicate { prior_id } => {
                counter!("intake_rejected_duplicate_total").increment(1);
                info!(target: "intake", %prior_id, "submission rejected: active duplicate");
                return Err(IntakeError::DuplicateActive { prior_id });
            }
            Verdict::RejectSpam { reasons } => {
                counter!("intake_rejected_spam_total").increment(1);
                info!(target: "intake", %reasons, "submission rejected: spam");
                return Err(IntakeError::Spam { reasons });
            }
        }

        // routing
        let category = report.final_category(citizen_category);
        let priority = assign_priority(category, &new.description);
        let geo = self.geocode_or_fallback(new.latitude, new.longitude).await;
        let ward = self
            .zones
            .resolve_ward(new.latitude, new.longitude, &geo.ward_hint);
        if ward == UNASSIGNED_WARD {
            counter!("routing_unassigned_total").increment(1);
        }
        let division = division_for_ward(&ward);

        // assigning
        let officer = self.officers.find_for(&ward, &division).cloned();
        let complaint = build_complaint(
            &new,
            category,
            priority,
            &geo,
            ward,
            division,
            officer.as_ref(),
            &report,
        );

        // persisted — the one fatal failure point.
        self.store
            .insert_complaint(&complaint)
            .await
            .map_err(|err| {
                counter!("intake_store_failures_total").increment(1);
                warn!(target: "intake", error = %err, "complaint insert failed");
                IntakeError::Store(err)
            })?;

        // notifying — strictly after the insert so a dispatch failure can
        // never undo it.
        let dispatch = self.dispatcher.dispatch(&complaint, officer.as_ref()).await;

        counter!("intake_accepted_total").increment(1);
        histogram!("intake_pipeline_ms").record(started.elapsed().as_secs_f64() * 1000.0);
        info!(
            target: "intake",
            complaint_id = %complaint.id,
            category = %complaint.category,
            priority = %complaint.priority,
            ward = %complaint.ward,
            officer = officer.as_ref().map(|o| o.id.as_str()).unwrap_or("-"),
            "complaint accepted"
        );

        Ok(SubmitOutcome {
            complaint,
            officer,
            dispatch,
        })
    }

    async fn geocode_or_fallback(&self, latitude: f64, longitude: f64) -> GeocodeSummary {
        match self.geocoder.lookup(latitude, longitude).await {
            Ok(summary) => summary,
            Err(err) => {
                counter!("geocode_fallback_total").increment(1);
                warn!(
                    target: "intake",
                    provider = self.geocoder.name(),
                    error = %err,
                    "reverse geocode failed; using fallback address"
                );
                GeocodeSummary::fallback(&self.fallback_city, &self.fallback_state)
            }
        }
    }
}

fn validate(new: &NewComplaint) -> Result<(), IntakeError> {
    if new.reporter.trim().is_empty() {
        return Err(IntakeError::Validation("reporter must not be empty".into()));
    }
    if !new.latitude.is_finite() || !new.longitude.is_finite() {
        return Err(IntakeError::Validation(
            "latitude and longitude must be finite numbers".into(),
        ));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn build_complaint(
    new: &NewComplaint,
    category: Category,
    priority: crate::complaint::Priority,
    geo: &GeocodeSummary,
    ward: String,
    division: String,
    officer: Option<&Officer>,
    report: &ModerationReport,
) -> Complaint {
    // With an officer on file the complaint starts already in progress and
    // takes the officer's department; otherwise the category stands in.
    let (status, worker_name, officer_id, department) = match officer {
        Some(o) => (
            Status::InProgress,
            Some(o.name.clone()),
            Some(o.id.clone()),
            o.department.clone(),
        ),
        None => (Status::Submitted, None, None, category.as_str().to_string()),
    };

    Complaint {
        id: Uuid::new_v4().to_string(),
        reporter: new.reporter.trim().to_string(),
        category,
        description: new.description.clone(),
        photo: new.photo.clone(),
        latitude: new.latitude,
        longitude: new.longitude,
        priority,
        status,
        worker_name,
        officer_id,
        ward,
        division,
        department,
        address: geo.full_address.clone(),
        fingerprint: report.fingerprint.clone(),
        ai_flagged: report.ai_generated,
        spam_flagged: report.spam,
        duplicate_flagged: report.duplicate.is_some(),
        classified_category: report.category,
        classifier_confidence: report.confidence,
        classifier_source: report.source,
        created_at: Utc::now(),
    }
}
