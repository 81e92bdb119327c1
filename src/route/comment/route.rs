use axum::extract::State;
use macros::route;

use crate::{
	blog::{self, comments},
	extract::{Json, Path, Query, Session},
	model::ReactionKind,
	openapi::tag,
	Database,
};

use super::{model, RouteError};

/// Get all comments
/// Returns a paginated response of comments, optionally limited to a post or to the replies of a comment.
#[route(tag = tag::COMMENT)]
pub async fn get_comments(
	State(database): State<Database>,
	Query(input): Query<model::ListCommentsInput>,
) -> Result<Json<model::Page<model::CommentView>>, RouteError> {
	let filter = input.filter();
	let comments = database
		.list_comments(&filter, input.sort, input.paginate.window())
		.await?;
	let total = database.count_comments(&filter).await?;

	Ok(Json(model::Page::new(
		comments.into_iter().map(Into::into).collect(),
		total,
		&input.paginate,
	)))
}

/// Get single comment
/// Returns a single comment by its unique id.
#[route(tag = tag::COMMENT)]
pub async fn get_comment(
	State(database): State<Database>,
	Path(model::IdInput { id }): Path<model::IdInput>,
) -> Result<Json<model::CommentView>, RouteError> {
	let comment = database
		.find_comment(id)
		.await?
		.ok_or(blog::Error::UnknownComment(id))?;

	Ok(Json(comment.into()))
}

/// Create comment
/// Comments on a post, optionally replying to another comment on the same post.
#[route(tag = tag::COMMENT)]
pub async fn create_comment(
	State(database): State<Database>,
	session: Session,
	Json(input): Json<model::CreateCommentInput>,
) -> Result<Json<model::CommentView>, RouteError> {
	let comment = comments::create_comment(
		&*database,
		input.post,
		session.user.id,
		input.text,
		input.parent_comment,
	)
	.await?;

	Ok(Json(comment.into()))
}

/// Update comment
/// Replaces the text of a comment. Only its author may do so.
#[route(tag = tag::COMMENT)]
pub async fn update_comment(
	State(database): State<Database>,
	session: Session,
	Path(model::IdInput { id }): Path<model::IdInput>,
	Json(input): Json<model::UpdateCommentInput>,
) -> Result<Json<model::CommentView>, RouteError> {
	let comment = comments::update_comment(&*database, id, session.user.id, &input.text).await?;

	Ok(Json(comment.into()))
}

/// Delete comment
/// Deletes a comment, returning it. Replies to it are kept. Only its author may do so.
#[route(tag = tag::COMMENT)]
pub async fn delete_comment(
	State(database): State<Database>,
	session: Session,
	Path(model::IdInput { id }): Path<model::IdInput>,
) -> Result<Json<model::CommentView>, RouteError> {
	let comment = comments::delete_comment(&*database, id, session.user.id).await?;

	Ok(Json(comment.into()))
}

/// Like comment
/// Toggles a like on a comment, removing a dislike from the same user.
#[route(tag = tag::COMMENT)]
pub async fn like_comment(
	State(database): State<Database>,
	session: Session,
	Path(model::IdInput { id }): Path<model::IdInput>,
) -> Result<Json<model::Reaction>, RouteError> {
	let reaction = comments::react(&*database, id, session.user.id, ReactionKind::Like).await?;

	Ok(Json(reaction))
}

/// Dislike comment
/// Toggles a dislike on a comment, removing a like from the same user.
#[route(tag = tag::COMMENT)]
pub async fn dislike_comment(
	State(database): State<Database>,
	session: Session,
	Path(model::IdInput { id }): Path<model::IdInput>,
) -> Result<Json<model::Reaction>, RouteError> {
	let reaction = comments::react(&*database, id, session.user.id, ReactionKind::Dislike).await?;

	Ok(Json(reaction))
}
