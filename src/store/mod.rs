//! Persistence for users, posts and comments.
//!
//! Every method is atomic with respect to the single document it touches:
//! counter adjustments and reaction toggles never lose concurrent updates.
//! Sequences spanning several documents (such as inserting a comment and
//! then bumping its post's counter) are composed by the callers in
//! [`crate::blog`].

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use schemars::JsonSchema;
use serde::Deserialize;
use uuid::Uuid;

use crate::model::{Comment, CreatePostInput, Post, ReactionKind, UpdatePostInput, User};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
	/// A uniqueness constraint was violated.
	#[error("duplicate {0}")]
	Duplicate(Unique),
}

/// The uniqueness constraints enforced by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unique {
	UserEmail,
	PostText,
}

impl std::fmt::Display for Unique {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			Self::UserEmail => "user email",
			Self::PostText => "post text",
		})
	}
}

/// A page of records to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
	pub limit: i64,
	pub offset: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PostSort {
	/// Newest first.
	#[default]
	New,
	/// Oldest first.
	Old,
	/// Most viewed first.
	Popular,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CommentSort {
	/// Newest first.
	#[default]
	New,
	/// Oldest first.
	Old,
}

#[derive(Debug, Clone, Default)]
pub struct PostFilter {
	/// Posts must carry at least one of these tags, unless empty.
	pub any_tags: Vec<String>,
	/// Posts must carry every one of these tags.
	pub all_tags: Vec<String>,
	pub user_id: Option<Uuid>,
}

impl PostFilter {
	pub fn matches(&self, post: &Post) -> bool {
		(self.any_tags.is_empty() || self.any_tags.iter().any(|tag| post.tags.contains(tag)))
			&& self.all_tags.iter().all(|tag| post.tags.contains(tag))
			&& self.user_id.map_or(true, |user_id| post.user_id == user_id)
	}
}

#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
	pub post_id: Option<Uuid>,
	pub parent_comment_id: Option<Uuid>,
}

impl CommentFilter {
	pub fn post(post_id: Uuid) -> Self {
		Self {
			post_id: Some(post_id),
			parent_comment_id: None,
		}
	}

	pub fn matches(&self, comment: &Comment) -> bool {
		self.post_id.map_or(true, |post_id| comment.post_id == post_id)
			&& self
				.parent_comment_id
				.map_or(true, |parent| comment.parent_comment_id == Some(parent))
	}
}

/// A user about to be registered. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
	pub id: Uuid,
	pub email: String,
	pub password: Vec<u8>,
	pub full_name: String,
	pub avatar_url: Option<String>,
}

/// A comment about to be inserted, starting with no reactions.
#[derive(Debug, Clone)]
pub struct NewComment {
	pub user_id: Uuid,
	pub post_id: Uuid,
	pub parent_comment_id: Option<Uuid>,
	pub text: String,
}

#[async_trait::async_trait]
pub trait Store: Send + Sync {
	/// Fails with [`Error::Duplicate`] if the email is taken.
	async fn create_user(&self, user: NewUser) -> Result<User, Error>;

	async fn find_user(&self, id: Uuid) -> Result<Option<User>, Error>;

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Error>;

	/// Fails with [`Error::Duplicate`] if another post has the same text.
	async fn insert_post(&self, user_id: Uuid, input: &CreatePostInput) -> Result<Post, Error>;

	async fn find_post(&self, id: Uuid) -> Result<Option<Post>, Error>;

	/// Increments the view count of the post and returns it.
	async fn view_post(&self, id: Uuid) -> Result<Option<Post>, Error>;

	/// Applies the fields present in `input`. Fails with [`Error::Duplicate`]
	/// if the new text belongs to another post.
	async fn update_post(&self, id: Uuid, input: &UpdatePostInput) -> Result<Option<Post>, Error>;

	/// Returns whether the post existed.
	async fn delete_post(&self, id: Uuid) -> Result<bool, Error>;

	async fn list_posts(
		&self,
		filter: &PostFilter,
		sort: PostSort,
		window: Window,
	) -> Result<Vec<Post>, Error>;

	async fn count_posts(&self, filter: &PostFilter) -> Result<i64, Error>;

	/// The tags of each post in `sort` order, limited to the first `limit` posts when given.
	async fn post_tags(&self, sort: PostSort, limit: Option<i64>) -> Result<Vec<Vec<String>>, Error>;

	/// Adds `delta` to the comment count of the post, never going below zero.
	/// Returns the new count, or `None` if the post does not exist.
	async fn add_comments_count(&self, post_id: Uuid, delta: i64) -> Result<Option<i64>, Error>;

	async fn set_comments_count(&self, post_id: Uuid, count: i64) -> Result<Option<Post>, Error>;

	/// Returns `None` without inserting if the post does not exist.
	async fn insert_comment(&self, comment: NewComment) -> Result<Option<Comment>, Error>;

	async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, Error>;

	async fn update_comment(&self, id: Uuid, text: &str) -> Result<Option<Comment>, Error>;

	/// Returns the deleted comment.
	async fn delete_comment(&self, id: Uuid) -> Result<Option<Comment>, Error>;

	/// Returns the number of deleted comments.
	async fn delete_comments_by_post(&self, post_id: Uuid) -> Result<u64, Error>;

	async fn list_comments(
		&self,
		filter: &CommentFilter,
		sort: CommentSort,
		window: Window,
	) -> Result<Vec<Comment>, Error>;

	async fn count_comments(&self, filter: &CommentFilter) -> Result<i64, Error>;

	/// Toggles the reaction of `user_id` on the comment.
	///
	/// If the user is already in the set matching `kind` they are removed from it.
	/// Otherwise they are added to it and removed from the opposite set.
	async fn toggle_reaction(
		&self,
		id: Uuid,
		user_id: Uuid,
		kind: ReactionKind,
	) -> Result<Option<Comment>, Error>;
}
