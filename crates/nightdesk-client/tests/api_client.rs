//! HTTP contract tests for the REST client

use nightdesk_client::{ApiClient, ListFilter, ResourceApi};
use nightdesk_core::Error;
use nightdesk_core::types::{Event, EventPatch, EventStatus, NewEvent};
use pretty_assertions::assert_eq;
use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn event_json(id: i64, name: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "venue": "Warehouse",
        "category": "club_night",
        "status": status,
        "starts_at": "2026-05-01T22:00:00Z",
        "capacity": 300,
        "tickets_sold": 120
    })
}

#[tokio::test]
async fn test_list_sends_filter_and_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events"))
        .and(query_param("status", "past"))
        .and(header("X-API-Key", "door-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([event_json(2, "Closing", "past")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri()).with_api_key("door-key");
    let events: Vec<Event> = client
        .list(&ListFilter::new().status(EventStatus::Past))
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, 2);
    assert_eq!(events[0].status, EventStatus::Past);
}

#[tokio::test]
async fn test_list_accepts_wrapped_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [event_json(1, "Opening", "upcoming"), event_json(2, "Closing", "past")]
        })))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let events: Vec<Event> = client.list(&ListFilter::new()).await.unwrap();
    assert_eq!(events.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2]);
}

#[tokio::test]
async fn test_create_posts_payload_and_returns_server_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/events"))
        .and(body_partial_json(json!({ "name": "Opening", "capacity": 300 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(event_json(11, "Opening", "upcoming")))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let payload = NewEvent {
        name: "Opening".to_string(),
        description: None,
        venue: "Warehouse".to_string(),
        category: "club_night".to_string(),
        starts_at: Utc.with_ymd_and_hms(2026, 5, 1, 22, 0, 0).unwrap(),
        ends_at: None,
        capacity: 300,
    };

    let created: Event = client.create(&payload).await.unwrap();
    assert_eq!(created.id, 11);
}

#[tokio::test]
async fn test_update_patches_only_provided_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/events/4"))
        .and(body_partial_json(json!({ "status": "cancelled" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(event_json(4, "Rained out", "cancelled")))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let patch = EventPatch {
        status: Some(EventStatus::Cancelled),
        ..EventPatch::default()
    };

    let updated: Event = client.update(4, &patch).await.unwrap();
    assert_eq!(updated.status, EventStatus::Cancelled);
}

#[tokio::test]
async fn test_delete_accepts_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/events/5"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    ResourceApi::<Event>::delete(&client, 5).await.unwrap();
}

#[tokio::test]
async fn test_missing_record_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/events/5"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let err = ResourceApi::<Event>::delete(&client, 5).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { ref resource } if resource == "/api/events/5"));
}

#[tokio::test]
async fn test_error_message_is_taken_from_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/events"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "message": "Venue is double booked" })),
        )
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let payload = NewEvent {
        name: "Clash".to_string(),
        description: None,
        venue: "Warehouse".to_string(),
        category: "concert".to_string(),
        starts_at: Utc.with_ymd_and_hms(2026, 5, 1, 22, 0, 0).unwrap(),
        ends_at: None,
        capacity: 10,
    };

    let err = ResourceApi::<Event>::create(&client, &payload)
        .await
        .unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "Venue is double booked");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unexpected_shape_is_a_serialization_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let err = ResourceApi::<Event>::list(&client, &ListFilter::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Serialization(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_a_transport_error() {
    // Nothing listens on the discard port
    let client = ApiClient::new("http://127.0.0.1:9");
    let err = ResourceApi::<Event>::list(&client, &ListFilter::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(err.user_message(), "Could not reach the server");
}
