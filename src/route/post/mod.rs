use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};

use crate::{blog, error, AppState};

pub mod model;
pub mod route;

pub type RouteError = error::RouteError<blog::Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/",
			get_with(get_posts, get_posts_docs).post_with(create_post, create_post_docs),
		)
		.api_route("/tags", get_with(get_tags, get_tags_docs))
		.api_route(
			"/:id",
			get_with(get_post, get_post_docs)
				.put_with(update_post, update_post_docs)
				.delete_with(delete_post, delete_post_docs),
		)
		.api_route(
			"/:id/reconcile",
			post_with(reconcile_post, reconcile_post_docs),
		)
}
