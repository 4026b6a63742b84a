//! Integration Tests for the reqwest Transport
//!
//! Serves canned HTTP responses from a local socket and checks what the
//! transport sends and how it reports statuses and network failures.

use std::sync::Arc;
use std::time::Duration;

use food_lookup::upstream::{
    ReqwestTransport, Transport, TransportErrorKind, UpstreamRequest, UpstreamResponse,
};
use food_lookup::{Config, FoodService};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

// == Helper Functions ==

const USER_AGENT: &str = "food-lookup-tests/1.0";

/// Accepts one connection, answers with `response` and returns the raw
/// request head it received.
async fn serve_once(response: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut head = Vec::new();
        let mut chunk = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&chunk[..n]);
        }
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        String::from_utf8_lossy(&head).into_owned()
    });

    (base_url, handle)
}

/// Transport that talks to the local socket directly, ignoring proxy settings.
fn local_transport() -> ReqwestTransport {
    local_transport_with(reqwest::Client::builder())
}

fn local_transport_with(builder: reqwest::ClientBuilder) -> ReqwestTransport {
    ReqwestTransport::with_client(builder.no_proxy().build().unwrap())
}

fn http_response(status_line: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\
         connection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    )
}

/// Value of header `name` in a raw request head, matched case-insensitively.
fn header<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim().eq_ignore_ascii_case(name).then_some(value.trim())
    })
}

// == Transport Tests ==

#[tokio::test]
async fn test_get_sends_user_agent_and_reads_body() {
    let (base_url, server) = serve_once(http_response("200 OK", r#"{"products":[]}"#)).await;
    let transport = local_transport();
    let request = UpstreamRequest::new(format!("{}/cgi/search.pl?json=1", base_url), USER_AGENT);

    let response = transport.get(&request).await.unwrap();

    assert_eq!(response, UpstreamResponse::ok(r#"{"products":[]}"#));
    let head = server.await.unwrap();
    assert!(head.starts_with("GET /cgi/search.pl?json=1 HTTP/1.1\r\n"));
    assert_eq!(header(&head, "user-agent"), Some(USER_AGENT));
    assert_eq!(header(&head, "accept"), Some("application/json"));
}

#[tokio::test]
async fn test_error_status_is_returned_not_raised() {
    let (base_url, server) = serve_once(http_response("503 Service Unavailable", "")).await;
    let transport = local_transport();

    let response = transport
        .get(&UpstreamRequest::new(base_url, USER_AGENT))
        .await
        .unwrap();

    assert_eq!(response.status, 503);
    assert_eq!(response.status_text, "Service Unavailable");
    assert!(!response.is_success());
    server.await.unwrap();
}

#[tokio::test]
async fn test_closed_port_is_connect_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let transport = local_transport();

    let err = transport
        .get(&UpstreamRequest::new(format!("http://{}/", addr), USER_AGENT))
        .await
        .unwrap_err();

    assert_eq!(err.kind, TransportErrorKind::Connect);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_client_timeout_is_timeout_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Accepts and then never answers
    let server = tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });
    let transport =
        local_transport_with(reqwest::Client::builder().timeout(Duration::from_millis(200)));

    let err = transport
        .get(&UpstreamRequest::new(format!("http://{}/", addr), USER_AGENT))
        .await
        .unwrap_err();

    assert_eq!(err.kind, TransportErrorKind::Timeout);
    assert!(err.is_retryable());
    server.abort();
}

// == Service over the network ==

#[tokio::test]
async fn test_search_over_local_server() {
    let body = json!({
        "count": 1,
        "products": [{
            "code": "42",
            "product_name": "Oat milk",
            "nutriments": {"energy-kcal_100g": 46}
        }]
    })
    .to_string();
    let (base_url, server) = serve_once(http_response("200 OK", &body)).await;
    let config = Config {
        base_url,
        user_agent: USER_AGENT.to_string(),
        ..Config::default()
    };
    let service = FoodService::with_transport(&config, Arc::new(local_transport())).unwrap();

    let foods = service.search_foods("Oat Milk").await.unwrap();

    assert_eq!(foods.len(), 1);
    assert_eq!(foods[0].food_id, "42");
    assert_eq!(foods[0].nutrients.energy_kcal, 46.0);
    let head = server.await.unwrap();
    assert!(head.starts_with("GET /cgi/search.pl?search_terms=oat+milk&"));
    assert_eq!(header(&head, "user-agent"), Some(USER_AGENT));
}
