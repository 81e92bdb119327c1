use std::sync::Arc;

use aide::{axum::ApiRouter, openapi::OpenApi};
use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::{
	compression::CompressionLayer,
	cors::CorsLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use crate::{openapi, AppState};

pub mod auth;
pub mod comment;
pub mod docs;
pub mod model;
pub mod post;

/// Builds the application router with its documentation and middleware.
///
/// Rate limiting needs the peer address of each connection, so it is
/// applied by the server instead.
pub fn app(state: AppState) -> Router {
	let mut api = OpenApi::default();

	ApiRouter::new()
		.nest("/auth", auth::routes())
		.nest("/posts", post::routes())
		.nest("/comments", comment::routes())
		.nest("/docs", docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.layer(
			ServiceBuilder::new()
				.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
				.layer(TraceLayer::new_for_http())
				.layer(PropagateRequestIdLayer::x_request_id())
				.layer(CompressionLayer::new())
				.layer(CorsLayer::permissive()),
		)
		.with_state(state)
}
