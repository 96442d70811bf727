//! Integration tests for the campus feed client.

mod support;

use signage_core::EventSource;
use signage_domain::{SignageError, SourceConfig, TimeWindow};
use signage_infra::CampusEventSource;
use wiremock::matchers::{header, method, path, query_param_contains};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::ts;

fn config(server: &MockServer, token: Option<&str>) -> SourceConfig {
    SourceConfig {
        base_url: server.uri(),
        token: token.map(str::to_string),
        timeout_seconds: 2,
    }
}

fn window() -> TimeWindow {
    TimeWindow::new(ts(2, 8, 0), ts(9, 8, 0))
}

#[tokio::test]
async fn fetches_and_maps_event_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events"))
        .and(query_param_contains("from", "2026-03-02"))
        .and(query_param_contains("until", "2026-03-09"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "id": "evt-1",
                "room": "room-101",
                "start": "2026-03-02T09:00:00Z",
                "end": "2026-03-02T10:00:00Z",
                "title": "Anatomy",
                "lecturers": ["Dr. Gruber", "Dr. Huber"]
            },
            {
                "id": "evt-2",
                "room": "room-202",
                "start": "2026-03-02T10:00:00Z",
                "end": "2026-03-02T11:00:00Z",
                "title": "Physiology"
            }
        ])))
        .mount(&server)
        .await;

    let source = CampusEventSource::new(&config(&server, None)).expect("client built");
    let records = source.fetch_events(window()).await.expect("fetch succeeds");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].external_key, "evt-1");
    assert_eq!(records[0].location_id, "room-101");
    assert_eq!(records[0].start, ts(2, 9, 0));
    assert_eq!(records[0].lecturers, vec!["Dr. Gruber", "Dr. Huber"]);
    // lecturers field is optional in the wire format
    assert!(records[1].lecturers.is_empty());
}

#[tokio::test]
async fn sends_bearer_token_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let source =
        CampusEventSource::new(&config(&server, Some("secret-token"))).expect("client built");
    let records = source.fetch_events(window()).await.expect("fetch succeeds");
    assert!(records.is_empty());
}

#[tokio::test]
async fn server_error_maps_to_source_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let source = CampusEventSource::new(&config(&server, None)).expect("client built");
    let err = source.fetch_events(window()).await.unwrap_err();
    assert!(matches!(err, SignageError::SourceUnavailable(_)));
}

#[tokio::test]
async fn malformed_body_maps_to_source_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let source = CampusEventSource::new(&config(&server, None)).expect("client built");
    let err = source.fetch_events(window()).await.unwrap_err();
    assert!(matches!(err, SignageError::SourceUnavailable(_)));
}

#[tokio::test]
async fn unreachable_server_maps_to_source_unavailable() {
    // Bind-then-drop gives a port nothing listens on.
    let server = MockServer::start().await;
    let config = config(&server, None);
    drop(server);

    let source = CampusEventSource::new(&config).expect("client built");
    let err = source.fetch_events(window()).await.unwrap_err();
    assert!(matches!(err, SignageError::SourceUnavailable(_)));
}
