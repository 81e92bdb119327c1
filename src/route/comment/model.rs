pub use crate::{
	blog::comments::Reaction,
	route::model::{IdInput, Page, Paginate},
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
	model::Comment,
	store::{CommentFilter, CommentSort},
};

fn validate_not_blank(text: &str) -> Result<(), ValidationError> {
	if text.trim().is_empty() {
		return Err(ValidationError::new("blank"));
	}

	Ok(())
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct ListCommentsInput {
	#[serde(flatten)]
	#[validate(nested)]
	pub paginate: Paginate,
	#[serde(default)]
	pub sort: CommentSort,
	/// Only return comments on this post.
	pub post: Option<Uuid>,
	/// Only return replies to this comment.
	pub parent: Option<Uuid>,
}

impl ListCommentsInput {
	pub fn filter(&self) -> CommentFilter {
		CommentFilter {
			post_id: self.post,
			parent_comment_id: self.parent,
		}
	}
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct CreateCommentInput {
	/// The post to comment on.
	pub post: Uuid,
	/// The content of the comment.
	#[validate(length(min = 1, max = 500), custom(function = "validate_not_blank"))]
	pub text: String,
	/// The comment to reply to, which must be on the same post.
	pub parent_comment: Option<Uuid>,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct UpdateCommentInput {
	/// The new content of the comment.
	#[validate(length(min = 1, max = 500), custom(function = "validate_not_blank"))]
	pub text: String,
}

/// A comment along with its reaction counts.
#[derive(Debug, Serialize, JsonSchema)]
pub struct CommentView {
	#[serde(flatten)]
	pub comment: Comment,
	pub likes_count: usize,
	pub dislikes_count: usize,
}

impl From<Comment> for CommentView {
	fn from(comment: Comment) -> Self {
		Self {
			likes_count: comment.likes_count(),
			dislikes_count: comment.dislikes_count(),
			comment,
		}
	}
}
