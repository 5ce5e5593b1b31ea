//! Shared helpers for REST client integration tests.
//!
//! Spins up an in-process axum server on an ephemeral port and records
//! the JSON bodies it receives.

use std::sync::{Arc, Mutex};

use axum::Router;
use studio_client::StudioApi;

/// Bodies received by the test server, as `(route, body)` pairs.
#[derive(Clone, Default)]
pub struct Received(Arc<Mutex<Vec<(String, serde_json::Value)>>>);

impl Received {
    pub fn push(&self, route: &str, body: serde_json::Value) {
        self.0.lock().unwrap().push((route.to_string(), body));
    }

    pub fn all(&self) -> Vec<(String, serde_json::Value)> {
        self.0.lock().unwrap().clone()
    }
}

/// Serve `router` on `127.0.0.1:0` and return a client pointed at it.
pub async fn serve(router: Router) -> StudioApi {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    StudioApi::new(format!("http://{addr}/"))
}
