// src/notify/mod.rs
//! Notification dispatcher: after a complaint is persisted, write the
//! admin ASSIGNED row and email the assigned officer. Both effects carry a
//! "never fails the caller" contract — failures are logged, counted and
//! absorbed, and neither rolls back the insert.

pub mod email;

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::{debug, warn};

use crate::complaint::{Complaint, Notification, Officer};
use crate::store::ComplaintStore;

pub use email::{DynMailer, Mailer};

// Officer email is awaited but bounded; a hung relay must not hold the
// submission response hostage.
const EMAIL_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// What the dispatcher managed to do for one complaint. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub notification_persisted: bool,
    pub email_sent: bool,
}

pub struct NotificationDispatcher {
    store: Arc<dyn ComplaintStore>,
    mailer: DynMailer,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<dyn ComplaintStore>, mailer: DynMailer) -> Self {
        Self { store, mailer }
    }

    /// Run both best-effort effects for a persisted complaint. Never fails.
    pub async fn dispatch(&self, complaint: &Complaint, officer: Option<&Officer>) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        let Some(officer) = officer else {
            debug!(target: "notify", complaint_id = %complaint.id, "no officer assigned; nothing to dispatch");
            return outcome;
        };

        let row = Notification::assigned(
            &complaint.id,
            format!(
                "Complaint {} ({}) assigned to {} — {} / {}",
                complaint.id, complaint.category, officer.name, complaint.ward, complaint.division
            ),
        );
        match self.store.insert_notification(&row).await {
            Ok(()) => outcome.notification_persisted = true,
            Err(err) => {
                counter!("notify_persist_failures_total").increment(1);
                warn!(target: "notify", complaint_id = %complaint.id, error = %err, "failed to persist assignment notification");
            }
        }

        if let Some(to) = officer.mail_address() {
            let subject = format!(
                "[{}] New {} complaint in {}",
                complaint.priority, complaint.category, complaint.ward
            );
            let html = assignment_email_html(complaint);
            let send = self.mailer.send(to, &subject, &html);
            match tokio::time::timeout(EMAIL_SEND_TIMEOUT, send).await {
                Ok(Ok(())) => {
                    outcome.email_sent = true;
                    debug!(target: "notify", complaint_id = %complaint.id, mailer = self.mailer.name(), "officer email sent");
                }
                Ok(Err(err)) => {
                    counter!("notify_email_failures_total").increment(1);
                    warn!(target: "notify", complaint_id = %complaint.id, error = %err, "officer email failed");
                }
                Err(_) => {
                    counter!("notify_email_failures_total").increment(1);
                    warn!(target: "notify", complaint_id = %complaint.id, "officer email timed out");
                }
            }
        } else {
            debug!(target: "notify", complaint_id = %complaint.id, officer = %officer.id, "officer has no email on file");
        }

        outcome
    }
}

fn assignment_email_html(c: &Complaint) -> String {
    // Citizen text goes into HTML; escape it.
    let description = html_escape::encode_text(&c.description);
    let address = html_escape::encode_text(&c.address);
    format!(
        "<h3>New complaint assigned to you</h3>\
         <p><b>Id:</b> {id}<br>\
         <b>Category:</b> {category}<br>\
         <b>Priority:</b> {priority}<br>\
         <b>Ward:</b> {ward}<br>\
         <b>Division:</b> {division}</p>\
         <p><b>Description:</b> {description}</p>\
         <p><b>Address:</b> {address}<br>\
         <b>Coordinates:</b> {lat:.6}, {lon:.6}</p>",
        id = c.id,
        category = c.category,
        priority = c.priority,
        ward = c.ward,
        division = c.division,
        description = description,
        address = address,
        lat = c.latitude,
        lon = c.longitude,
    )
}

#[cfg(test)]
mod tests {
    use super::email::{FailingMailer, RecordingMailer};
    use super::*;
    use crate::complaint::{Category, ClassifierSource, NotificationKind, Priority, Status};
    use crate::store::MemoryStore;
    use chrono::Utc;

    fn complaint() -> Complaint {
        Complaint {
            id: "c-42".into(),
            reporter: "r-1".into(),
            category: Category::Water,
            description: "Major pipe burst flooding the <street>".into(),
            photo: String::new(),
            latitude: 12.97,
            longitude: 77.64,
            priority: Priority::High,
            status: Status::InProgress,
            worker_name: Some("R. Gowda".into()),
            officer_id: Some("OFF-101".into()),
            ward: "Indiranagar".into(),
            division: "East Division".into(),
            department: "Water Supply".into(),
            address: "12th Main Rd, Indiranagar".into(),
            fingerprint: None,
            ai_flagged: false,
            spam_flagged: false,
            duplicate_flagged: false,
            classified_category: Category::Water,
            classifier_confidence: 0.75,
            classifier_source: ClassifierSource::Text,
            created_at: Utc::now(),
        }
    }

    fn officer(email: Option<&str>) -> Officer {
        Officer {
            id: "OFF-101".into(),
            name: "R. Gowda".into(),
            email: email.map(str::to_string),
            ward: "Indiranagar".into(),
            division: "East Division".into(),
            department: "Water Supply".into(),
        }
    }

    #[tokio::test]
    async fn assignment_persists_row_and_sends_email() {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::new());
        let dispatcher = NotificationDispatcher::new(store.clone(), mailer.clone());

        let out = dispatcher
            .dispatch(&complaint(), Some(&officer(Some("r.gowda@city.example"))))
            .await;
        assert!(out.notification_persisted);
        assert!(out.email_sent);

        let rows = store.snapshot_notifications();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, NotificationKind::Assigned);
        assert_eq!(rows[0].complaint_id, "c-42");
        assert!(rows[0].message.contains("R. Gowda"));

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "r.gowda@city.example");
        assert!(sent[0].subject.contains("High"));
        assert!(sent[0].html.contains("c-42"));
        // Citizen text is escaped before it lands in HTML.
        assert!(sent[0].html.contains("&lt;street&gt;"));
    }

    #[tokio::test]
    async fn no_officer_means_no_effects() {
        let store = Arc::new(MemoryStore::new());
        let dispatcher =
            NotificationDispatcher::new(store.clone(), Arc::new(RecordingMailer::new()));
        let out = dispatcher.dispatch(&complaint(), None).await;
        assert_eq!(out, DispatchOutcome::default());
        assert!(store.snapshot_notifications().is_empty());
    }

    #[tokio::test]
    async fn mailer_failure_is_absorbed_and_row_still_persists() {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = NotificationDispatcher::new(store.clone(), Arc::new(FailingMailer));
        let out = dispatcher
            .dispatch(&complaint(), Some(&officer(Some("r.gowda@city.example"))))
            .await;
        assert!(out.notification_persisted);
        assert!(!out.email_sent);
        assert_eq!(store.snapshot_notifications().len(), 1);
    }

    #[tokio::test]
    async fn officer_without_email_still_gets_the_admin_row() {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::new());
        let dispatcher = NotificationDispatcher::new(store.clone(), mailer.clone());
        let out = dispatcher.dispatch(&complaint(), Some(&officer(None))).await;
        assert!(out.notification_persisted);
        assert!(!out.email_sent);
        assert!(mailer.sent().is_empty());
    }
}
