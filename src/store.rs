//! # Store Port
//! Persistence boundary of the pipeline. Real deployments plug a database in
//! here; [`MemoryStore`] is the reference implementation used by the demo
//! wiring and the test suite.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::complaint::{Complaint, Notification};
use crate::moderation::spam::normalize_description;

#[async_trait]
pub trait ComplaintStore: Send + Sync {
    /// Insert the finished complaint. This is the only fatal failure point
    /// of a submission.
    async fn insert_complaint(&self, complaint: &Complaint) -> Result<()>;

    /// Prior complaints sharing the fingerprint, most recent first.
    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Vec<Complaint>>;

    /// How many complaints this reporter filed with an identical normalized
    /// description inside the trailing window.
    async fn count_recent_descriptions(
        &self,
        reporter: &str,
        normalized_description: &str,
        window_days: i64,
    ) -> Result<u32>;

    /// Persist an admin notification row.
    async fn insert_notification(&self, notification: &Notification) -> Result<()>;
}

/// In-memory store guarded by plain mutexes; capped so a long-lived demo
/// process cannot grow without bound.
#[derive(Debug)]
pub struct MemoryStore {
    complaints: Mutex<Vec<Complaint>>,
    notifications: Mutex<Vec<Notification>>,
    cap: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.clamp(1, 10_000);
        Self {
            complaints: Mutex::new(Vec::new()),
            notifications: Mutex::new(Vec::new()),
            cap,
        }
    }

    /// Copy of all stored complaints, insertion order.
    pub fn snapshot_complaints(&self) -> Vec<Complaint> {
        self.complaints
            .lock()
            .expect("complaints mutex poisoned")
            .clone()
    }

    /// Copy of all stored notifications, insertion order.
    pub fn snapshot_notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .expect("notifications mutex poisoned")
            .clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComplaintStore for MemoryStore {
    async fn insert_complaint(&self, complaint: &Complaint) -> Result<()> {
        let mut v = self.complaints.lock().expect("complaints mutex poisoned");
        v.push(complaint.clone());
        if v.len() > self.cap {
            let excess = v.len() - self.cap;
            v.drain(0..excess);
        }
        Ok(())
    }

    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Vec<Complaint>> {
        let v = self.complaints.lock().expect("complaints mutex poisoned");
        let mut hits: Vec<Complaint> = v
            .iter()
            .filter(|c| c.fingerprint.as_deref() == Some(fingerprint))
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(hits)
    }

    async fn count_recent_descriptions(
        &self,
        reporter: &str,
        normalized_description: &str,
        window_days: i64,
    ) -> Result<u32> {
        let cutoff = Utc::now() - Duration::days(window_days);
        let v = self.complaints.lock().expect("complaints mutex poisoned");
        let n = v
            .iter()
            .filter(|c| {
                c.reporter == reporter
                    && c.created_at >= cutoff
                    && normalize_description(&c.description) == normalized_description
            })
            .count();
        Ok(n as u32)
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<()> {
        let mut v = self
            .notifications
            .lock()
            .expect("notifications mutex poisoned");
        v.push(notification.clone());
        if v.len() > self.cap {
            let excess = v.len() - self.cap;
            v.drain(0..excess);
        }
        Ok(())
    }
}
