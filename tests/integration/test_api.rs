//! HTTP API tests over the scoring router.
//!
//! Exercises the wire surface end to end: lesson fetch, answer grading with
//! the exact disclosure shapes per question kind, and completion accounting.

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use lexquest_content::Lesson;
use lexquest_scoring::{create_router, AppState, LocalBackend};
use serde_json::{json, Value};
use tower::ServiceExt;

fn fixture_lesson() -> Lesson {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/lesson.json");
    let raw = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture at {path:?}: {e}"));
    serde_json::from_str(&raw).expect("Failed to parse lesson fixture")
}

fn router() -> Router {
    let backend = LocalBackend::with_lessons([fixture_lesson()]).expect("valid fixture");
    create_router(AppState::new(backend))
}

async fn get(router: Router, uri: &str) -> Response {
    router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_json(router: Router, uri: &str, body: Value) -> Response {
    router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn post_empty(router: Router, uri: &str) -> Response {
    router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_value(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_get_lesson_returns_full_document() {
    let response = get(router(), "/lessons/7").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_value(response).await;
    assert_eq!(body["id"], 7);
    assert_eq!(body["module_id"], 3);
    assert_eq!(body["blocks"].as_array().unwrap().len(), 3);
    assert_eq!(body["blocks"][0]["block_type"], "theory");
    assert_eq!(body["is_completed_by_user"], false);
}

#[tokio::test]
async fn test_get_unknown_lesson_returns_404() {
    let response = get(router(), "/lessons/99").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_value(response).await;
    assert_eq!(body["detail"], "lesson 99 not found");
}

#[tokio::test]
async fn test_submit_single_choice_wire_shape() {
    let response = post_json(
        router(),
        "/lessons/questions/100/submit_answer",
        json!({ "question_id": 100, "user_answer": 2 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_value(response).await;
    assert_eq!(body["is_correct"], true);
    assert_eq!(body["xp_awarded"], 10);
    assert_eq!(body["correct_answer_details"]["correct_option_id"], 2);
    assert_eq!(
        body["correct_answer_details"]["correct_option_text"],
        "Государственная Дума"
    );
}

#[tokio::test]
async fn test_submit_multiple_choice_wire_shape() {
    // Wrong subset: verdict false, full disclosure of the correct set.
    let response = post_json(
        router(),
        "/lessons/questions/101/submit_answer",
        json!({ "question_id": 101, "user_answer": [10, 11] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_value(response).await;
    assert_eq!(body["is_correct"], false);
    assert_eq!(body["xp_awarded"], 0);
    assert_eq!(body["correct_answer_details"]["correct_option_ids"], json!([10, 12]));
    assert_eq!(
        body["correct_answer_details"]["correct_option_texts"],
        json!(["Закон", "Правовой обычай"])
    );
}

#[tokio::test]
async fn test_submit_true_false_and_fill_in_blank_wire_shapes() {
    let router = router();

    let response = post_json(
        router.clone(),
        "/lessons/questions/102/submit_answer",
        json!({ "question_id": 102, "user_answer": true }),
    )
    .await;
    let body = body_value(response).await;
    assert_eq!(body["is_correct"], true);
    assert_eq!(body["correct_answer_details"]["correct_bool_answer"], true);

    let response = post_json(
        router,
        "/lessons/questions/103/submit_answer",
        json!({ "question_id": 103, "user_answer": " конституция " }),
    )
    .await;
    let body = body_value(response).await;
    assert_eq!(body["is_correct"], true);
    assert_eq!(
        body["correct_answer_details"]["correct_text_answer"],
        "Конституция"
    );
}

#[tokio::test]
async fn test_submit_unknown_question_returns_404() {
    let response = post_json(
        router(),
        "/lessons/questions/999/submit_answer",
        json!({ "question_id": 999, "user_answer": 1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submit_malformed_payload_returns_422() {
    let response = post_json(
        router(),
        "/lessons/questions/100/submit_answer",
        json!({ "question_id": 100, "user_answer": "текст вместо номера" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_completion_accounting_across_requests() {
    let router = router();

    let response = post_empty(router.clone(), "/users/me/progress/lessons/7/complete").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_value(response).await;
    assert_eq!(body["is_first_completion"], true);
    assert_eq!(body["xp_earned_for_this_completion"], 25);
    assert_eq!(body["current_total_user_xp"], 25);

    let response = post_empty(router.clone(), "/users/me/progress/lessons/7/complete").await;
    let body = body_value(response).await;
    assert_eq!(body["is_first_completion"], false);
    assert_eq!(body["xp_earned_for_this_completion"], 0);
    assert_eq!(body["current_total_user_xp"], 25);

    // A completed lesson is reported as such on the next fetch.
    let response = get(router, "/lessons/7").await;
    let body = body_value(response).await;
    assert_eq!(body["is_completed_by_user"], true);
}
