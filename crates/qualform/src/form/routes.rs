use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use super::domain::{RecordDraft, Tier};
use super::persistence::BlobStore;
use super::service::{FormServiceError, QualificationFormService};

/// Router exposing the form contract to the presentation layer.
pub fn form_router<S>(service: Arc<QualificationFormService<S>>) -> Router
where
    S: BlobStore + 'static,
{
    Router::new()
        .route("/api/v1/form", get(form_view_handler::<S>))
        .route("/api/v1/form/levels", get(levels_handler::<S>))
        .route("/api/v1/form/progress", get(progress_handler::<S>))
        .route("/api/v1/form/note", put(note_handler::<S>))
        .route("/api/v1/form/submission", post(submission_handler::<S>))
        .route("/api/v1/form/:tier/records", post(add_record_handler::<S>))
        .route(
            "/api/v1/form/:tier/records/:index",
            axum::routing::delete(remove_record_handler::<S>),
        )
        .with_state(service)
}

fn unknown_tier_response(tier: &str) -> Response {
    let payload = json!({ "error": format!("unknown qualification tier '{tier}'") });
    (StatusCode::NOT_FOUND, Json(payload)).into_response()
}

async fn form_view_handler<S>(
    State(service): State<Arc<QualificationFormService<S>>>,
) -> Response
where
    S: BlobStore + 'static,
{
    let snapshot = service.snapshot();
    let payload = json!({
        "gcse": snapshot.gcse,
        "l3": snapshot.l3,
        "higher": snapshot.higher,
        "extenuating": snapshot.extenuating,
        "progress": service.progress(),
    });
    (StatusCode::OK, Json(payload)).into_response()
}

async fn levels_handler<S>(State(service): State<Arc<QualificationFormService<S>>>) -> Response
where
    S: BlobStore + 'static,
{
    (StatusCode::OK, Json(service.catalog().clone())).into_response()
}

async fn progress_handler<S>(State(service): State<Arc<QualificationFormService<S>>>) -> Response
where
    S: BlobStore + 'static,
{
    (StatusCode::OK, Json(service.progress_breakdown())).into_response()
}

async fn add_record_handler<S>(
    State(service): State<Arc<QualificationFormService<S>>>,
    Path(tier): Path<String>,
    Json(draft): Json<RecordDraft>,
) -> Response
where
    S: BlobStore + 'static,
{
    let Ok(tier) = tier.parse::<Tier>() else {
        return unknown_tier_response(&tier);
    };

    match service.add_record(tier, &draft) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(FormServiceError::Validation(error)) => {
            let payload = json!({
                "error": error.to_string(),
                "field": error.field(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

async fn remove_record_handler<S>(
    State(service): State<Arc<QualificationFormService<S>>>,
    Path((tier, index)): Path<(String, String)>,
) -> Response
where
    S: BlobStore + 'static,
{
    let Ok(tier) = tier.parse::<Tier>() else {
        return unknown_tier_response(&tier);
    };

    // A non-numeric or out-of-range index is deliberately a silent no-op.
    if let Ok(index) = index.parse::<usize>() {
        service.remove_record(tier, index);
    }

    StatusCode::NO_CONTENT.into_response()
}

#[derive(Debug, Deserialize)]
struct NoteUpdate {
    #[serde(default)]
    text: String,
}

async fn note_handler<S>(
    State(service): State<Arc<QualificationFormService<S>>>,
    Json(update): Json<NoteUpdate>,
) -> Response
where
    S: BlobStore + 'static,
{
    service.set_note(update.text);
    let payload = json!({ "progress": service.progress() });
    (StatusCode::OK, Json(payload)).into_response()
}

async fn submission_handler<S>(State(service): State<Arc<QualificationFormService<S>>>) -> Response
where
    S: BlobStore + 'static,
{
    match service.submit() {
        Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
        Err(FormServiceError::SubmissionBlocked { problems }) => {
            let payload = json!({ "problems": problems });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::domain::LevelCatalog;
    use crate::form::persistence::StorageError;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Default)]
    struct MemoryStore {
        blobs: Mutex<HashMap<String, String>>,
    }

    impl BlobStore for MemoryStore {
        fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
            Ok(self.blobs.lock().expect("lock").get(key).cloned())
        }

        fn save(&self, key: &str, blob: &str) -> Result<(), StorageError> {
            self.blobs
                .lock()
                .expect("lock")
                .insert(key.to_string(), blob.to_string());
            Ok(())
        }
    }

    fn service() -> Arc<QualificationFormService<MemoryStore>> {
        Arc::new(
            QualificationFormService::open(
                Arc::new(MemoryStore::default()),
                LevelCatalog::standard(),
            )
            .expect("opens"),
        )
    }

    fn draft(subject: &str, level: &str, grade: &str, year: &str) -> RecordDraft {
        RecordDraft {
            subject: subject.to_string(),
            level: level.to_string(),
            grade: grade.to_string(),
            year: year.to_string(),
        }
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn add_record_handler_returns_created_with_normalized_record() {
        let response = add_record_handler(
            State(service()),
            Path("gcse".to_string()),
            Json(draft(" Mathematics ", "GCSE", "9", "2024")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body.get("subject").and_then(Value::as_str), Some("Mathematics"));
    }

    #[tokio::test]
    async fn add_record_handler_reports_first_failing_field() {
        let response = add_record_handler(
            State(service()),
            Path("gcse".to_string()),
            Json(draft("", "", "", "24")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body.get("field").and_then(Value::as_str), Some("subject"));
    }

    #[tokio::test]
    async fn add_record_handler_rejects_unknown_tier() {
        let response = add_record_handler(
            State(service()),
            Path("degrees".to_string()),
            Json(draft("Maths", "GCSE", "9", "")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn remove_record_handler_is_silent_for_bad_indexes() {
        let service = service();
        service
            .add_record(Tier::Gcse, &draft("Maths", "GCSE", "9", ""))
            .expect("valid draft");

        for index in ["7", "-1", "abc"] {
            let response = remove_record_handler(
                State(service.clone()),
                Path(("gcse".to_string(), index.to_string())),
            )
            .await;
            assert_eq!(response.status(), StatusCode::NO_CONTENT);
        }

        assert_eq!(service.snapshot().gcse.len(), 1);
    }

    #[tokio::test]
    async fn submission_handler_lists_problems_when_blocked() {
        let response = submission_handler(State(service())).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        let problems = body
            .get("problems")
            .and_then(Value::as_array)
            .expect("problems array");
        assert_eq!(problems.len(), 3);
    }

    #[tokio::test]
    async fn note_handler_returns_updated_progress() {
        let response = note_handler(
            State(service()),
            Json(NoteUpdate {
                text: "a note comfortably longer than twenty characters".to_string(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body.get("progress").and_then(Value::as_u64), Some(10));
    }

    #[tokio::test]
    async fn router_serves_form_view_and_levels() {
        let app = form_router(service());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/form")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("routed");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body.get("progress").and_then(Value::as_u64), Some(0));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/form/levels")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("routed");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let gcse = body.get("gcse").and_then(Value::as_array).expect("gcse options");
        assert!(gcse.iter().any(|option| option == "GCSE"));
    }
}
