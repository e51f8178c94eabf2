use std::time::Duration;

use serde_json::Value;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ANALYTICS_PATH: &str = "/api/analytics";

/// Start a mock analytics endpoint answering every POST with `response`.
pub async fn analytics_server(response: ResponseTemplate) -> (MockServer, Url) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ANALYTICS_PATH))
        .respond_with(response)
        .mount(&server)
        .await;

    let endpoint = Url::parse(&format!("{}{}", server.uri(), ANALYTICS_PATH)).unwrap();
    (server, endpoint)
}

/// JSON bodies the server has received so far
pub async fn received_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|request| serde_json::from_slice(&request.body).ok())
        .collect()
}

/// Wait until at least `count` bodies have arrived, or give up after `limit`.
pub async fn wait_for_bodies(server: &MockServer, count: usize, limit: Duration) -> Vec<Value> {
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        let bodies = received_bodies(server).await;
        if bodies.len() >= count || tokio::time::Instant::now() >= deadline {
            return bodies;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Address nothing listens on
pub fn closed_endpoint() -> Url {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{}{}", addr, ANALYTICS_PATH)).unwrap()
}

/// Let spawned tasks on the current-thread runtime run
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
