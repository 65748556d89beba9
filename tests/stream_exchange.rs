//! Range fulfillment through the full router, with in-process peers.

use std::time::Duration;

use axum::body::{to_bytes, Body, Bytes};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use tower::ServiceExt;
use virtual_stream::config::StreamConfig;
use virtual_stream::http::AppState;
use virtual_stream::peer::{ClientType, DataMessage};
use virtual_stream::HttpServer;

mod common;

const PATH: &str = "/virtual-stream/abc123/5000000";
const MIB: u64 = 1024 * 1024;

fn server(config: StreamConfig) -> (axum::Router, AppState) {
    let server = HttpServer::new(config, virtual_stream::Shutdown::new());
    (server.router(), server.state().clone())
}

async fn get(router: &axum::Router, path: &str, range: Option<&str>) -> Response {
    let mut request = Request::builder().uri(path);
    if let Some(range) = range {
        request = request.header(header::RANGE, range);
    }
    router
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body(response: Response) -> Bytes {
    to_bytes(response.into_body(), usize::MAX).await.unwrap()
}

#[tokio::test]
async fn test_scenario_a_explicit_range() {
    let (router, state) = server(common::test_config());
    let (_peer, mut seen) = common::spawn_programmable_peer(&state, |start, end| {
        Some(common::pattern(start, end))
    });

    let response = get(&router, PATH, Some("bytes=0-999999")).await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);

    let headers = response.headers().clone();
    assert_eq!(headers[header::CONTENT_RANGE], "bytes 0-999999/5000000");
    assert_eq!(headers[header::CONTENT_LENGTH], "1000000");
    assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
    assert!(headers.contains_key("x-request-id"));

    let bytes = body(response).await;
    assert_eq!(bytes, common::pattern(0, 999_999));

    let message = seen.recv().await.unwrap();
    assert_eq!(
        message,
        DataMessage::RequestData {
            request_id: "req-1".into(),
            start: 0,
            end: 999_999,
            file_id: "abc123".into(),
        }
    );
    assert!(seen.try_recv().is_err());
    assert!(state.table.is_empty());
}

#[tokio::test]
async fn test_scenario_b_open_ended_range_near_end() {
    let (router, state) = server(common::test_config());
    let (_peer, _seen) = common::spawn_programmable_peer(&state, |start, end| {
        Some(common::pattern(start, end))
    });

    let response = get(&router, PATH, Some("bytes=4999000-")).await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers()[header::CONTENT_RANGE],
        "bytes 4999000-4999999/5000000"
    );
    assert_eq!(body(response).await.len(), 1000);
}

#[tokio::test]
async fn test_scenario_c_no_peer() {
    let (router, state) = server(common::test_config());

    let response = get(&router, PATH, Some("bytes=0-99")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body(response).await, "Error fetching data");
    assert!(state.table.is_empty());
}

#[tokio::test]
async fn test_worker_clients_are_not_asked() {
    let (router, state) = server(common::test_config());
    let (_worker, mut rx) = state.peers.register(ClientType::Worker, 4);

    let response = get(&router, PATH, None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_scenario_d_peer_error() {
    let (router, state) = server(common::test_config());
    let (_peer, _seen) = common::spawn_programmable_peer(&state, |_, _| None);

    let response = get(&router, PATH, Some("bytes=0-99")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(state.table.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_scenario_e_peer_never_replies() {
    let (router, state) = server(common::test_config());
    let (_peer, mut rx) = state.peers.register(ClientType::Window, 4);

    let started = tokio::time::Instant::now();
    let response = get(&router, PATH, Some("bytes=0-99")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(started.elapsed() >= Duration::from_secs(15));

    // The request did reach the peer, and its entry is gone.
    let DataMessage::RequestData { request_id, .. } = rx.recv().await.unwrap() else {
        panic!("expected REQUEST_DATA");
    };
    assert!(!state.table.contains(&request_id));
    assert!(!state.table.fulfill(&request_id, Some(Bytes::from_static(b"late"))));
}

#[tokio::test(start_paused = true)]
async fn test_stalled_peer_queue_fails_at_exchange_timeout() {
    let (router, state) = server(common::test_config());
    let (peer, _rx) = state.peers.register(ClientType::Window, 1);
    peer.send(DataMessage::DataError {
        request_id: "backlog".into(),
    })
    .await
    .unwrap();

    let started = tokio::time::Instant::now();
    let response = get(&router, PATH, Some("bytes=0-99")).await;
    let elapsed = started.elapsed();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(elapsed >= Duration::from_secs(15));
    assert!(elapsed < Duration::from_secs(30));
    assert!(state.table.is_empty());
}

#[tokio::test]
async fn test_head_does_not_contact_peer() {
    let (router, state) = server(common::test_config());
    let (_peer, mut rx) = state.peers.register(ClientType::Window, 4);

    let response = router
        .oneshot(
            Request::builder()
                .method(Method::HEAD)
                .uri(PATH)
                .header(header::RANGE, "bytes=4999000-")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers()[header::CONTENT_RANGE],
        "bytes 4999000-4999999/5000000"
    );
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "1000");
    assert!(rx.try_recv().is_err());
    assert!(state.table.is_empty());
}

#[tokio::test]
async fn test_no_range_header_serves_first_chunk() {
    let (router, state) = server(common::test_config());
    let (_peer, _seen) = common::spawn_programmable_peer(&state, |start, end| {
        Some(common::pattern(start, end))
    });

    let response = get(&router, PATH, None).await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers()[header::CONTENT_RANGE],
        format!("bytes 0-{}/5000000", MIB - 1)
    );
    assert_eq!(body(response).await.len() as u64, MIB);
}

#[tokio::test]
async fn test_oversized_window_is_capped() {
    let (router, state) = server(common::test_config());
    let (_peer, mut seen) = common::spawn_programmable_peer(&state, |start, end| {
        Some(common::pattern(start, end))
    });

    let response = get(&router, PATH, Some("bytes=100-4000000")).await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    let DataMessage::RequestData { start, end, .. } = seen.recv().await.unwrap() else {
        panic!("expected REQUEST_DATA");
    };
    assert_eq!((start, end), (100, 100 + MIB - 1));
}

#[tokio::test]
async fn test_short_chunk_shrinks_content_range() {
    let (router, state) = server(common::test_config());
    let (_peer, _seen) =
        common::spawn_programmable_peer(&state, |_, _| Some(Bytes::from_static(b"0123456789")));

    let response = get(&router, PATH, Some("bytes=50-149")).await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 50-59/5000000");
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "10");
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let (router, state) = server(common::test_config());
    let (_peer, _seen) = common::spawn_programmable_peer(&state, |start, end| {
        Some(common::pattern(start, end))
    });

    let ranges = ["bytes=0-9", "bytes=1000-1999", "bytes=4999990-"];
    let responses = futures_util::future::join_all(
        ranges.iter().map(|r| get(&router, PATH, Some(*r))),
    )
    .await;

    let expected = [
        "bytes 0-9/5000000",
        "bytes 1000-1999/5000000",
        "bytes 4999990-4999999/5000000",
    ];
    for (response, expected) in responses.into_iter().zip(expected) {
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()[header::CONTENT_RANGE], expected);
    }
    assert!(state.table.is_empty());
}

#[tokio::test]
async fn test_path_errors() {
    let (router, _state) = server(common::test_config());

    assert_eq!(get(&router, "/elsewhere", None).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        get(&router, "/virtual-stream/abc123", None).await.status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        get(&router, "/virtual-stream/abc123/lots", None).await.status(),
        StatusCode::BAD_REQUEST
    );

    let response = get(&router, PATH, Some("bytes=6000000-")).await;
    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes */5000000");
}

#[tokio::test]
async fn test_post_is_not_allowed() {
    let (router, _state) = server(common::test_config());
    let response = router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(PATH)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_health() {
    let (router, _state) = server(common::test_config());
    let response = get(&router, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response).await, "ok");
}

#[tokio::test]
async fn test_admin_requires_token() {
    let mut config = common::test_config();
    config.admin.enabled = true;
    config.admin.api_key = "secret".into();
    let (router, state) = server(config);
    let (_peer, _rx) = state.peers.register(ClientType::Window, 4);

    let response = get(&router, "/admin/status", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/admin/status")
                .header(header::AUTHORIZATION, "Bearer secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let status: serde_json::Value = serde_json::from_slice(&body(response).await).unwrap();
    assert_eq!(status["connected_peers"], 1);
    assert_eq!(status["has_controlling_peer"], true);
    assert_eq!(status["pending_exchanges"], 0);
}
