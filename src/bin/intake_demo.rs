//! Demo that walks a few submissions through an offline wiring (in-memory
//! store, embedded reference data, no network).

use std::sync::Arc;

use civic_intake::config::GeocoderConfig;
use civic_intake::intake::{IntakePipeline, NewComplaint};
use civic_intake::moderation::vision::DisabledVision;
use civic_intake::notify::email::RecordingMailer;
use civic_intake::routing::geocode::FailingGeocoder;
use civic_intake::routing::{OfficerDirectory, ZoneTable};
use civic_intake::store::MemoryStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(RecordingMailer::new());
    let pipeline = IntakePipeline::new(
        store.clone(),
        Arc::new(DisabledVision),
        Arc::new(FailingGeocoder),
        ZoneTable::embedded(),
        OfficerDirectory::embedded(),
        mailer.clone(),
        &GeocoderConfig::default(),
    );

    let submissions = [
        ("Water", "Major pipe burst flooding the street", 12.97, 77.64),
        ("Garbage", "minor smell near the park bins", 12.93, 77.62),
        ("Road", "test test test", 12.92, 77.58),
        ("Streetlight", "lamp out since last week", 11.0, 76.0),
    ];

    for (category, description, lat, lon) in submissions {
        let result = pipeline
            .submit(NewComplaint {
                reporter: "demo-citizen".into(),
                category: category.into(),
                description: description.into(),
                photo: String::new(),
                latitude: lat,
                longitude: lon,
            })
            .await;
        match result {
            Ok(outcome) => println!(
                "accepted: {} [{} / {}] ward={} status={} worker={}",
                outcome.complaint.id,
                outcome.complaint.category,
                outcome.complaint.priority,
                outcome.complaint.ward,
                outcome.complaint.status,
                outcome.complaint.worker_name.as_deref().unwrap_or("-"),
            ),
            Err(err) => println!("rejected: {err}"),
        }
    }

    println!(
        "stored {} complaints, {} notifications, {} emails",
        store.snapshot_complaints().len(),
        store.snapshot_notifications().len(),
        mailer.sent().len()
    );
}
