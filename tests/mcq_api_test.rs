mod support;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use mcq_generator::{
    routes,
    services::generation_service::{GenerationService, GenerationSettings},
    AppState,
};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use support::{completion_json, question, StubCompletion, StubSearch};
use tower::ServiceExt;

fn app(completion: Arc<StubCompletion>) -> Router {
    let service = GenerationService::new(
        Arc::new(StubSearch::default()),
        completion,
        GenerationSettings::default(),
    );
    routes::api_router(AppState::with_service(service))
}

fn post_json(uri: &str, body: JsonValue) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// Insertion order is kept on the wire (serde_json `preserve_order`).
fn question_set(n: usize) -> JsonValue {
    let mut map = serde_json::Map::new();
    for i in 1..=n {
        map.insert(i.to_string(), question("Cloud Computing", "a"));
    }
    JsonValue::Object(map)
}

#[tokio::test]
async fn health_reports_model() {
    let app = app(Arc::new(StubCompletion::replying("{}")));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["search_enabled"], false);
}

#[tokio::test]
async fn generate_returns_questions_and_first_page() {
    let completion = Arc::new(StubCompletion::replying(completion_json(vec![
        question("Cloud Computing", "a"),
        question("Cloud Computing", "b"),
    ])));
    let app = app(completion.clone());

    let response = app
        .oneshot(post_json(
            "/api/mcq/generate",
            json!({
                "topics": [
                    {
                        "topic": "Cloud Computing",
                        "difficulty": ["easy"],
                        "count": 2,
                        "recent": false
                    }
                ]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["questions"]["1"]["Answer"], "a");
    assert_eq!(body["questions"]["2"]["Answer"], "b");
    assert_eq!(body["page"]["page"], 1);
    assert_eq!(body["page"]["total_pages"], 1);
    assert_eq!(body["page"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(completion.calls(), 1);
}

#[tokio::test]
async fn generate_without_topics_is_a_bad_request() {
    let completion = Arc::new(StubCompletion::replying("{}"));
    let app = app(completion.clone());

    let response = app
        .oneshot(post_json("/api/mcq/generate", json!({ "topics": [] })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["kind"], "InvalidInput");
    assert_eq!(completion.calls(), 0);
}

#[tokio::test]
async fn completion_outage_maps_to_bad_gateway() {
    let app = app(Arc::new(StubCompletion::failing_with_status(500)));

    let response = app
        .oneshot(post_json(
            "/api/mcq/generate",
            json!({ "topics": [{"topic": "Linux", "difficulty": ["hard"], "count": 1}] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["kind"], "CompletionServiceFailure");
}

#[tokio::test]
async fn third_page_of_twelve_holds_the_last_two() {
    let app = app(Arc::new(StubCompletion::replying("{}")));

    let response = app
        .oneshot(post_json(
            "/api/mcq/page",
            json!({ "questions": question_set(12), "page": 3, "page_size": 5 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["page"], 3);
    assert_eq!(body["total_pages"], 3);
    assert_eq!(body["from"], 11);
    assert_eq!(body["to"], 12);
    let ids: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["11", "12"]);
}

#[tokio::test]
async fn page_past_the_end_is_clamped() {
    let app = app(Arc::new(StubCompletion::replying("{}")));

    let response = app
        .oneshot(post_json(
            "/api/mcq/page",
            json!({ "questions": question_set(7), "page": 9, "page_size": 5 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["page"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn export_streams_a_workbook() {
    let app = app(Arc::new(StubCompletion::replying("{}")));

    let response = app
        .oneshot(post_json("/api/mcq/export", json!({ "questions": question_set(12) })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"MCQ_Questions_"));
    assert!(disposition.ends_with(".xlsx\""));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..2], b"PK");
}

#[tokio::test]
async fn exporting_nothing_is_rejected() {
    let app = app(Arc::new(StubCompletion::replying("{}")));

    let response = app
        .oneshot(post_json("/api/mcq/export", json!({ "questions": {} })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn generated_order_survives_the_round_trip_to_paging() {
    let records = (0..12).map(|_| question("Cloud Computing", "a")).collect();
    let app = app(Arc::new(StubCompletion::replying(completion_json(records))));

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/mcq/generate",
            json!({ "topics": [{"topic": "Cloud Computing", "difficulty": ["easy"], "count": 12}] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let generated = json_body(response).await;

    let wire_order: Vec<&String> = generated["questions"].as_object().unwrap().keys().collect();
    let expected: Vec<String> = (1..=12).map(|i| i.to_string()).collect();
    assert_eq!(wire_order, expected.iter().collect::<Vec<_>>());

    let first_page_ids = |body: &JsonValue| -> Vec<String> {
        body["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|q| q["id"].as_str().unwrap().to_string())
            .collect()
    };
    assert_eq!(first_page_ids(&generated["page"]), vec!["1", "2", "3", "4", "5"]);

    for (page, ids) in [(1, vec!["1", "2", "3", "4", "5"]), (3, vec!["11", "12"])] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/mcq/page",
                json!({ "questions": generated["questions"].clone(), "page": page }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(first_page_ids(&body), ids);
    }
}

#[tokio::test]
async fn difficulty_may_be_sent_as_a_label_string() {
    let completion = Arc::new(StubCompletion::replying(completion_json(vec![
        question("Cloud Computing", "a"),
        question("Cloud Computing", "b"),
    ])));
    let app = app(completion.clone());

    let response = app
        .oneshot(post_json(
            "/api/mcq/generate",
            json!({ "topics": [
                {"topic": "Cloud Computing", "difficulty": "Easy", "count": 2, "recent": false},
                {"topic": "Databases", "difficulty": "Easy, Medium", "count": 1}
            ] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(completion.calls(), 1);
    let prompt = completion.last_prompt().unwrap();
    assert!(prompt.contains("Cloud Computing - Easy - generate 2 questions"));
    assert!(prompt.contains("Databases - Easy, Medium - generate 1 questions"));
}

#[tokio::test]
async fn malformed_completion_reports_the_raw_text() {
    let app = app(Arc::new(StubCompletion::replying("Sorry, here you go: {oops")));

    let response = app
        .oneshot(post_json(
            "/api/mcq/generate",
            json!({ "topics": [{"topic": "Linux", "difficulty": ["easy"], "count": 1}] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["kind"], "MalformedResponse");
    assert_eq!(body["stage"], "Parsing");
    assert_eq!(body["raw"], "Sorry, here you go: {oops");
}

#[tokio::test]
async fn unreadable_request_body_gets_a_json_error() {
    let completion = Arc::new(StubCompletion::replying("{}"));
    let app = app(completion.clone());

    let response = app
        .oneshot(post_json(
            "/api/mcq/generate",
            json!({ "topics": [{"topic": "Linux", "difficulty": ["extreme"], "count": 1}] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("unknown difficulty"));
    assert_eq!(completion.calls(), 0);
}
