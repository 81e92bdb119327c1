use chrono::{DateTime, Utc};
use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// The maximum length of a single tag.
pub const MAX_TAG_LENGTH: usize = 32;

#[allow(clippy::ptr_arg)]
fn validate_tags(tags: &Vec<String>) -> Result<(), ValidationError> {
	if tags
		.iter()
		.any(|tag| tag.trim().is_empty() || tag.chars().count() > MAX_TAG_LENGTH)
	{
		return Err(ValidationError::new("tags must be non-empty and at most 32 characters"));
	}

	Ok(())
}

/// A single user.
///
/// Use this when fetching from the store and returning to the client.
/// The `email` and `password` fields are never serialized.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct User {
	/// The unique identifier of the user.
	pub id: Uuid,
	/// The user's email address, used for logging in.
	#[serde(skip_serializing)]
	pub email: String,
	/// Argon2 hash, salted with `id`.
	#[serde(skip)]
	pub password: Vec<u8>,
	/// The name that is displayed to the public.
	pub full_name: String,
	/// An optional link to the user's avatar.
	pub avatar_url: Option<String>,
	/// The creation time of the user.
	pub created_at: DateTime<Utc>,
}

/// The public profile of a user, attached to what they write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Author {
	pub id: Uuid,
	pub full_name: String,
	pub avatar_url: Option<String>,
}

impl From<&User> for Author {
	fn from(user: &User) -> Self {
		Self {
			id: user.id,
			full_name: user.full_name.clone(),
			avatar_url: user.avatar_url.clone(),
		}
	}
}

/// A single post, created by a user.
#[model]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
pub struct Post {
	/// The unique identifier of the post.
	#[serde(skip_deserializing)]
	pub id: Uuid,
	/// The user that created the post.
	#[serde(skip_deserializing)]
	pub user_id: Uuid,
	/// The profile of the user that created the post.
	#[serde(skip_deserializing)]
	pub author: Option<Author>,
	/// The title of the post.
	#[validate(length(min = 3, max = 128))]
	pub title: String,
	/// The content of the post in Markdown format. Unique across posts.
	#[validate(length(min = 5, max = 65536))]
	pub text: String,
	/// An optional link to the cover image of the post.
	pub image_url: Option<String>,
	/// The tags of the post, in the order they were given.
	#[serde(default)]
	#[validate(length(max = 16), custom(function = "validate_tags"))]
	pub tags: Vec<String>,
	/// The number of times the post has been viewed.
	#[serde(skip_deserializing)]
	pub views_count: i64,
	/// The number of comments on the post.
	#[serde(skip_deserializing)]
	pub comments_count: i64,
	/// The creation time of the post.
	#[serde(skip_deserializing)]
	pub created_at: DateTime<Utc>,
	/// The last time the post was edited.
	#[serde(skip_deserializing)]
	pub updated_at: DateTime<Utc>,
}

/// A comment on a post, optionally replying to another comment.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Comment {
	/// The unique identifier of the comment.
	pub id: Uuid,
	/// The user that wrote the comment.
	pub user_id: Uuid,
	/// The profile of the user that wrote the comment.
	pub author: Option<Author>,
	/// The post the comment belongs to.
	pub post_id: Uuid,
	/// The comment this one replies to. May point at a deleted comment.
	pub parent_comment_id: Option<Uuid>,
	/// The content of the comment.
	pub text: String,
	/// Users that liked the comment.
	pub likes: Vec<Uuid>,
	/// Users that disliked the comment.
	pub dislikes: Vec<Uuid>,
	/// The creation time of the comment.
	pub created_at: DateTime<Utc>,
	/// The last time the comment was edited.
	pub updated_at: DateTime<Utc>,
}

impl Comment {
	pub fn likes_count(&self) -> usize {
		self.likes.len()
	}

	pub fn dislikes_count(&self) -> usize {
		self.dislikes.len()
	}

	/// The reaction `user` currently has on this comment.
	pub fn action_of(&self, user: Uuid) -> UserAction {
		if self.likes.contains(&user) {
			UserAction::Liked
		} else if self.dislikes.contains(&user) {
			UserAction::Disliked
		} else {
			UserAction::None
		}
	}
}

/// A reaction a user can toggle on a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
	Like,
	Dislike,
}

/// The state of a user's reaction after toggling it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserAction {
	None,
	Liked,
	Disliked,
}
