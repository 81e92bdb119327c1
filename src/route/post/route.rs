use axum::extract::State;
use macros::route;

use crate::{
	blog::{self, cascade, comments, tags},
	extract::{Json, Path, Query, Session},
	openapi::tag,
	AppState, Database,
};

use super::{model, RouteError};

/// Get all posts
/// Returns a paginated response of posts, optionally filtered by tags or author.
#[route(tag = tag::POST)]
pub async fn get_posts(
	State(database): State<Database>,
	Query(input): Query<model::ListPostsInput>,
) -> Result<Json<model::Page<model::Post>>, RouteError> {
	let filter = input.filter();
	let posts = database
		.list_posts(&filter, input.sort, input.paginate.window())
		.await?;
	let total = database.count_posts(&filter).await?;

	Ok(Json(model::Page::new(posts, total, &input.paginate)))
}

/// Get single post
/// Returns a single post by its unique id, counting it as a view.
#[route(tag = tag::POST)]
pub async fn get_post(
	State(database): State<Database>,
	Path(model::IdInput { id }): Path<model::IdInput>,
) -> Result<Json<model::Post>, RouteError> {
	let post = database.view_post(id).await?;

	Ok(Json(post.ok_or(blog::Error::UnknownPost(id))?))
}

/// Create post
/// Creates a new post. Its text must not match the text of another post.
#[route(tag = tag::POST)]
pub async fn create_post(
	State(database): State<Database>,
	session: Session,
	Json(input): Json<model::CreatePostInput>,
) -> Result<Json<model::Post>, RouteError> {
	let post = database
		.insert_post(session.user.id, &input)
		.await
		.map_err(blog::Error::from)?;

	tracing::info!(post = %post.id, "created post");

	Ok(Json(post))
}

/// Update post
/// Updates the fields given for an existing post. Only its author may do so.
#[route(tag = tag::POST)]
pub async fn update_post(
	State(database): State<Database>,
	session: Session,
	Path(model::IdInput { id }): Path<model::IdInput>,
	Json(input): Json<model::UpdatePostInput>,
) -> Result<Json<model::Post>, RouteError> {
	let post = database
		.find_post(id)
		.await?
		.ok_or(blog::Error::UnknownPost(id))?;

	if post.user_id != session.user.id {
		return Err(blog::Error::NotAuthor.into());
	}

	let post = database
		.update_post(id, &input)
		.await
		.map_err(blog::Error::from)?;

	Ok(Json(post.ok_or(blog::Error::UnknownPost(id))?))
}

/// Delete post
/// Deletes an existing post along with all of its comments. Only its author may do so.
#[route(tag = tag::POST)]
pub async fn delete_post(
	State(database): State<Database>,
	session: Session,
	Path(model::IdInput { id }): Path<model::IdInput>,
) -> Result<Json<model::PostDeleted>, RouteError> {
	let comments_deleted = cascade::delete_post(&*database, id, session.user.id).await?;

	Ok(Json(model::PostDeleted { comments_deleted }))
}

/// Reconcile post
/// Recomputes the comment count of a post from its comments. Only its author may do so.
#[route(tag = tag::POST)]
pub async fn reconcile_post(
	State(database): State<Database>,
	session: Session,
	Path(model::IdInput { id }): Path<model::IdInput>,
) -> Result<Json<model::Post>, RouteError> {
	let post = comments::reconcile_post(&*database, id, session.user.id).await?;

	Ok(Json(post))
}

/// Get top tags
/// Returns the most used tags, either across the latest posts or across every post.
#[route(tag = tag::POST)]
pub async fn get_tags(
	State(state): State<AppState>,
	Query(input): Query<model::TagsInput>,
) -> Result<Json<Vec<model::TagCount>>, RouteError> {
	let tags = tags::top_tags(&*state.database, input.sort, input.limit, state.config.tag_window).await?;

	Ok(Json(tags))
}
