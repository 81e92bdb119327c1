pub use axum::http::header::AUTHORIZATION;
pub use axum_test::TestServer;
pub use serde_json::{json, Value};

use std::sync::Arc;

use axum::http::HeaderValue;

use crate::{config::Config, route, store::MemoryStore, State};

/// A server over a fresh in-memory store, without rate limiting.
pub fn app() -> TestServer {
	let config =
		Config::from_lookup(|key| (key == "JWT_SECRET").then(|| "test secret".to_owned())).unwrap();
	let state = State::new(config, Arc::new(MemoryStore::default()));

	TestServer::new(route::app(state)).unwrap()
}

pub fn bearer(token: &str) -> HeaderValue {
	HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

/// Registers a user, returning their token and profile.
pub async fn register(app: &TestServer, email: &str) -> (String, Value) {
	let response = app
		.post("/auth/register")
		.json(&json!({
			"email": email,
			"password": "hunter2hunter",
			"full_name": "Test User",
		}))
		.await;

	assert_eq!(response.status_code(), 200);

	let body = response.json::<Value>();

	(body["token"].as_str().unwrap().to_owned(), body["user"].clone())
}
