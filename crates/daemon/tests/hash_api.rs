//! Hash requests through the HTTP API of daemons talking over real iroh endpoints

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::routing::get;
use axum::Router;
use tower::ServiceExt;

use common::client::{HashTally, PrivateHashSession, PublicHashSession};
use common::fetch::content_hash;
use common::request::{HashPrivateResponse, HashPublicResponse};
use common::roster::{Roster, ServerIdentity};
use vantage_daemon::http_server::{self, Config as HttpConfig};
use vantage_daemon::{ServiceConfig, ServiceState};

const PAGE: &str = "<html><body>vantage over iroh</body></html>";

struct Node {
    state: ServiceState,
    _shutdown: tokio::sync::watch::Sender<()>,
}

/// Serves `PAGE` at `/page.html` and returns its URL.
async fn content_server() -> String {
    let app = Router::new().route(
        "/page.html",
        get(|| async { ([(header::CONTENT_TYPE, "text/html")], PAGE) }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/page.html", addr)
}

async fn spawn_node(timeout: Duration) -> Node {
    let config = ServiceConfig {
        node_listen_addr: Some("127.0.0.1:0".parse().unwrap()),
        node_secret: None,
        peer_discovery: false,
        api_port: 0,
        file_root: std::env::temp_dir(),
        protocol_timeout: timeout,
        min_contributions: 1,
        log_level: tracing::Level::INFO,
        log_dir: None,
    };
    let state = ServiceState::from_config(&config).await.unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(());
    let endpoint = state.endpoint().clone();
    let handler = state.handler();
    tokio::spawn(async move {
        vantage_daemon::peer::spawn(endpoint, handler, shutdown_rx)
            .await
            .unwrap();
    });

    Node {
        state,
        _shutdown: shutdown_tx,
    }
}

fn roster_entry(node: &Node) -> ServerIdentity {
    let identity = node.state.identity();
    let addrs = identity
        .peer_addrs
        .iter()
        .copied()
        .filter(SocketAddr::is_ipv4)
        .collect();
    identity.with_peer_addrs(addrs)
}

async fn network(size: usize) -> (Vec<Node>, Roster) {
    let mut nodes = Vec::with_capacity(size);
    for _ in 0..size {
        nodes.push(spawn_node(Duration::from_secs(10)).await);
    }
    let roster = Roster::new(nodes.iter().map(roster_entry).collect()).unwrap();
    (nodes, roster)
}

fn api(node: &Node) -> Router {
    let config = HttpConfig::new("127.0.0.1:0".parse().unwrap());
    http_server::router(config, node.state.clone())
}

async fn post_json(
    router: Router,
    path: &str,
    body: &impl serde::Serialize,
) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn test_public_hash_over_iroh() {
    let url = content_server().await;
    let (nodes, roster) = network(3).await;

    let session = PublicHashSession::new(roster, url).unwrap();
    let (status, body) = post_json(api(&nodes[0]), "/api/v0/hash/public", session.request()).await;
    assert_eq!(status, StatusCode::OK, "{}", String::from_utf8_lossy(&body));

    let response: HashPublicResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(response.responses.len(), 2);
    assert!(response.missing.is_empty());

    let hashes = session.verify(&response).unwrap();
    let expected = content_hash(PAGE.as_bytes()).to_vec();
    assert!(hashes.values().all(|hash| hash == &expected));
    assert!(HashTally::new(&hashes).is_unanimous());
}

#[tokio::test]
async fn test_private_hash_over_iroh() {
    let url = content_server().await;
    let (nodes, roster) = network(3).await;

    let session = PrivateHashSession::new(roster, url).unwrap();
    let (status, body) = post_json(api(&nodes[1]), "/api/v0/hash/private", session.request()).await;
    assert_eq!(status, StatusCode::OK, "{}", String::from_utf8_lossy(&body));

    let response: HashPrivateResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(response.responses.len(), 2);
    assert!(!response.responses.contains_key(&nodes[1].state.public_key()));

    let hashes = session.open(&response).unwrap();
    let expected = content_hash(PAGE.as_bytes()).to_vec();
    assert!(hashes.values().all(|hash| hash == &expected));
}

#[tokio::test]
async fn test_unreachable_member_is_missing() {
    let url = content_server().await;
    let (nodes, roster) = network(2).await;

    // a roster member with no known address and no discovery to find one
    let ghost = common::crypto::SecretKey::generate().public();
    let mut servers = roster.servers().to_vec();
    servers.push(ServerIdentity::new(ghost));
    let roster = Roster::new(servers).unwrap();

    let session = PublicHashSession::new(roster, url).unwrap();
    let (status, body) = post_json(api(&nodes[0]), "/api/v0/hash/public", session.request()).await;
    assert_eq!(status, StatusCode::OK, "{}", String::from_utf8_lossy(&body));

    let response: HashPublicResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(response.responses.len(), 1);
    assert_eq!(response.missing, vec![ghost]);
    session.verify(&response).unwrap();
}

#[tokio::test]
async fn test_unsupported_content_is_rejected() {
    let (nodes, roster) = network(2).await;

    // every child aborts, so the leader never reaches one contribution
    let session = PublicHashSession::new(roster, "ftp://example.com/page.html").unwrap();
    let (status, _) = post_json(api(&nodes[0]), "/api/v0/hash/public", session.request()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_leader_outside_roster_is_bad_request() {
    let url = content_server().await;
    let (nodes, _) = network(2).await;
    let outsider = spawn_node(Duration::from_secs(5)).await;

    let roster = Roster::new(nodes.iter().map(roster_entry).collect()).unwrap();
    let session = PublicHashSession::new(roster, url).unwrap();
    let (status, _) = post_json(api(&outsider), "/api/v0/hash/public", session.request()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_routes() {
    let (nodes, _) = network(1).await;

    let request = Request::builder()
        .uri("/_status/identity")
        .body(Body::empty())
        .unwrap();
    let response = api(&nodes[0]).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let identity: ServerIdentity = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(identity.public_key, nodes[0].state.public_key());

    let request = Request::builder()
        .uri("/_status/livez")
        .body(Body::empty())
        .unwrap();
    let response = api(&nodes[0]).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .uri("/nope")
        .body(Body::empty())
        .unwrap();
    let response = api(&nodes[0]).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
