//! # Complaint Domain Types
//! Core records shared across the intake pipeline: categories, priorities,
//! lifecycle status, officers and notifications. Pure data, no I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Complaint category as understood by the city departments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Garbage,
    Water,
    Road,
    Streetlight,
    Sanitation,
    Other,
}

impl Category {
    /// Parse a citizen-submitted category string. Unknown or empty values fall
    /// back to `Other` so the intake stays permissive; the classifier may
    /// still lift the final category later.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "garbage" => Category::Garbage,
            "water" => Category::Water,
            "road" => Category::Road,
            "streetlight" => Category::Streetlight,
            "sanitation" => Category::Sanitation,
            _ => Category::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Garbage => "Garbage",
            Category::Water => "Water",
            Category::Road => "Road",
            Category::Streetlight => "Streetlight",
            Category::Sanitation => "Sanitation",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority assigned once at intake; High items surface first in officer queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complaint lifecycle. Transitions run forward only, except that an admin
/// rejecting a resolution returns the complaint to `InProgress` (that
/// mutation lives outside the intake pipeline).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Submitted,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Resolved (Pending Admin)")]
    ResolvedPendingAdmin,
    Resolved,
    Closed,
}

impl Status {
    /// Still actionable: a matching open complaint blocks re-submission.
    pub fn is_open(&self) -> bool {
        matches!(self, Status::Submitted | Status::InProgress)
    }

    /// Resolved in any sense, including awaiting admin confirmation.
    /// Duplicates of these are stale, not conflicts.
    pub fn is_resolved_like(&self) -> bool {
        matches!(
            self,
            Status::ResolvedPendingAdmin | Status::Resolved | Status::Closed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Submitted => "Submitted",
            Status::InProgress => "In Progress",
            Status::ResolvedPendingAdmin => "Resolved (Pending Admin)",
            Status::Resolved => "Resolved",
            Status::Closed => "Closed",
        }
    }

    /// Citizen-facing label. `ResolvedPendingAdmin` reads as plain "Resolved"
    /// until the admin confirms; everything else shows its stored name.
    pub fn public_label(&self) -> &'static str {
        match self {
            Status::ResolvedPendingAdmin => "Resolved",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which classifier produced the recorded category opinion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierSource {
    /// Remote vision endpoint looked at photo + text.
    Vision,
    /// Local keyword classifier over the description.
    Text,
}

/// A complaint as persisted by the store and returned by the API.
///
/// Coordinates are immutable once set; `priority`, `ward`, `division` and the
/// moderation flags are computed exactly once at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Complaint {
    pub id: String,
    /// Opaque reporter identity handed in by the upstream auth layer.
    pub reporter: String,
    /// Final category after the classifier confidence gate.
    pub category: Category,
    pub description: String,
    /// Opaque photo payload reference; empty when the citizen sent none.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub photo: String,
    pub latitude: f64,
    pub longitude: f64,
    pub priority: Priority,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub officer_id: Option<String>,
    pub ward: String,
    pub division: String,
    pub department: String,
    pub address: String,
    /// SHA-256 hex of the photo payload bytes; `None` without a photo.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    pub ai_flagged: bool,
    pub spam_flagged: bool,
    pub duplicate_flagged: bool,
    /// What the classifier thought, kept even when the gate preferred the
    /// citizen's own category.
    pub classified_category: Category,
    pub classifier_confidence: f32,
    pub classifier_source: ClassifierSource,
    pub created_at: DateTime<Utc>,
}

/// City officer reference record from the directory file. Read-only during
/// intake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Officer {
    pub id: String,
    pub name: String,
    /// Missing or empty means the officer cannot be emailed.
    #[serde(default)]
    pub email: Option<String>,
    pub ward: String,
    pub division: String,
    pub department: String,
}

impl Officer {
    /// Deliverable address, if the directory carries a non-empty one.
    pub fn mail_address(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Assigned,
    ResolvedPending,
    Resolved,
}

/// Admin-facing notification row created by the dispatcher. Marking as read
/// happens outside the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub complaint_id: String,
    pub kind: NotificationKind,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn assigned(complaint_id: &str, message: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            complaint_id: complaint_id.to_string(),
            kind: NotificationKind::Assigned,
            message: message.into(),
            read: false,
            created_at: Utc::now(),
        }
    }
}
