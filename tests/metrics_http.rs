// tests/metrics_http.rs
//
// Scrape tests for the merged /metrics route: drive real submissions through
// the router, then assert the intake series show up in the Prometheus
// exposition with sane values.

use std::sync::{Arc, OnceLock};

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::json;
use tower::ServiceExt;

use civic_intake::api::{create_router, AppState};
use civic_intake::config::GeocoderConfig;
use civic_intake::intake::IntakePipeline;
use civic_intake::metrics::Metrics;
use civic_intake::moderation::vision::DisabledVision;
use civic_intake::notify::email::RecordingMailer;
use civic_intake::routing::geocode::FailingGeocoder;
use civic_intake::routing::{OfficerDirectory, ZoneTable};
use civic_intake::store::MemoryStore;

// The Prometheus recorder is process-global; install it exactly once and
// share it across tests.
fn metrics() -> &'static Metrics {
    static METRICS: OnceLock<Metrics> = OnceLock::new();
    METRICS.get_or_init(Metrics::init)
}

/// Fresh offline pipeline router merged with the shared /metrics route,
/// the same shape the binary serves.
fn app() -> Router {
    let store = Arc::new(MemoryStore::new());
    let pipeline = IntakePipeline::new(
        store,
        Arc::new(DisabledVision),
        Arc::new(FailingGeocoder),
        ZoneTable::embedded(),
        OfficerDirectory::embedded(),
        Arc::new(RecordingMailer::new()),
        &GeocoderConfig::default(),
    );
    create_router(AppState {
        pipeline: Arc::new(pipeline),
    })
    .merge(metrics().router())
}

fn submit(reporter: &str, description: &str, photo: &str) -> Request<Body> {
    let payload = json!({
        "reporter": reporter,
        "category": "Water",
        "description": description,
        "photo": photo,
        "latitude": 12.97,
        "longitude": 77.64
    });
    Request::post("/complaints")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

async fn scrape(app: Router) -> String {
    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap(); // 1 MiB
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Value of an unlabeled series in the exposition, if present.
fn series_value(text: &str, name: &str) -> Option<f64> {
    text.lines()
        .filter(|l| !l.starts_with('#'))
        .find(|l| l.starts_with(name) && l.as_bytes().get(name.len()) == Some(&b' '))
        .and_then(|l| l.rsplit(' ').next())
        .and_then(|v| v.parse().ok())
}

#[tokio::test]
async fn metrics_exposition_contains_intake_series() {
    let app = app();

    // One accepted submission (geocode degrades, vision unavailable) and one
    // spam rejection, so the series below all have data.
    let r1 = app
        .clone()
        .oneshot(submit("m-citizen-1", "Major pipe burst flooding the street", ""))
        .await
        .unwrap();
    assert_eq!(r1.status(), StatusCode::CREATED);
    let r2 = app
        .clone()
        .oneshot(submit("m-citizen-1", "test test test", ""))
        .await
        .unwrap();
    assert_eq!(r2.status(), StatusCode::BAD_REQUEST);

    let text = scrape(app).await;
    for needle in [
        "intake_submissions_total",
        "intake_accepted_total",
        "intake_rejected_spam_total",
        "geocode_fallback_total",
        "moderation_vision_unavailable_total",
        "intake_pipeline_ms",
        "intake_last_submission_ts",
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }

    // Counters are monotonic and the recorder is shared, so >= is the safe
    // assertion even with other tests running.
    assert!(series_value(&text, "intake_submissions_total").unwrap_or(0.0) >= 2.0);
    assert!(series_value(&text, "intake_accepted_total").unwrap_or(0.0) >= 1.0);
    assert!(series_value(&text, "intake_rejected_spam_total").unwrap_or(0.0) >= 1.0);
}

#[tokio::test]
async fn duplicate_conflict_increments_its_counter() {
    let app = app();
    let photo = "bWV0cmljcyBkdXBsaWNhdGU=";

    let r1 = app
        .clone()
        .oneshot(submit("m-citizen-2", "Major pipe burst flooding the street", photo))
        .await
        .unwrap();
    assert_eq!(r1.status(), StatusCode::CREATED);

    let r2 = app
        .clone()
        .oneshot(submit("m-citizen-3", "water pooling by the same gate", photo))
        .await
        .unwrap();
    assert_eq!(r2.status(), StatusCode::CONFLICT);

    let text = scrape(app).await;
    assert!(series_value(&text, "intake_rejected_duplicate_total").unwrap_or(0.0) >= 1.0);
}
