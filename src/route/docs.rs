use std::sync::Arc;

use aide::{
	axum::{
		routing::{get, get_with},
		ApiRouter, IntoApiResponse,
	},
	openapi::OpenApi,
	redoc::Redoc,
};
use axum::{response::IntoResponse, Extension};

use crate::{extract::Json, AppState};

pub const API_JSON: &str = "/docs/private/api.json";

pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new()
		.api_route(
			"/",
			get_with(
				Redoc::new(API_JSON).with_title("Blog API").axum_handler(),
				|op| op.description("This documentation page."),
			),
		)
		.route("/private/api.json", get(serve_docs))
}

async fn serve_docs(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoApiResponse {
	Json(&*api).into_response()
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_docs() {
		let app = app();

		let response = app.get("/docs/private/api.json").await;

		assert_eq!(response.status_code(), 200);

		let spec = response.json::<Value>();

		assert_eq!(spec["info"]["title"], "Blog API");
		assert!(spec["paths"]["/posts/{id}"].is_object());
		assert!(spec["paths"]["/comments/{id}/like"]["post"].is_object());

		assert_eq!(app.get("/docs").await.status_code(), 200);
	}
}
