// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod complaint;
pub mod config;
pub mod intake;
pub mod metrics;
pub mod moderation;
pub mod notify;
pub mod priority;
pub mod routing;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::complaint::{Category, Complaint, Notification, Officer, Priority, Status};
pub use crate::intake::{IntakeError, IntakePipeline, NewComplaint, SubmitOutcome};
