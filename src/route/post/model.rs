pub use crate::{
	blog::tags::{TagCount, TagRanking},
	model::{CreatePostInput, Post, UpdatePostInput},
	route::model::{IdInput, Page, Paginate},
};

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::store::{PostFilter, PostSort};

fn split_tags(raw: Option<&str>) -> Vec<String> {
	raw.map(|raw| {
		raw.split(',')
			.map(str::trim)
			.filter(|tag| !tag.is_empty())
			.map(str::to_owned)
			.collect()
	})
	.unwrap_or_default()
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct ListPostsInput {
	#[serde(flatten)]
	#[validate(nested)]
	pub paginate: Paginate,
	#[serde(default)]
	pub sort: PostSort,
	/// Comma separated tags. Posts must carry at least one of them.
	pub tag: Option<String>,
	/// Comma separated tags. Posts must carry all of them.
	pub tags: Option<String>,
	/// Only return posts created by this user.
	pub user: Option<Uuid>,
}

impl ListPostsInput {
	pub fn filter(&self) -> PostFilter {
		PostFilter {
			any_tags: split_tags(self.tag.as_deref()),
			all_tags: split_tags(self.tags.as_deref()),
			user_id: self.user,
		}
	}
}

/// Negative limits become 0 so that validation rejects them.
fn tag_limit_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
	let limit: i64 = crate::route::model::number_or(deserializer, 10)?;

	Ok(usize::try_from(limit).unwrap_or(0))
}

#[inline]
fn ten() -> usize {
	10
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct TagsInput {
	/// `new` ranks the tags of the most recent posts, `popular` ranks every post.
	#[serde(default)]
	pub sort: TagRanking,
	/// The maximum number of tags to return.
	#[validate(range(min = 1, max = 100))]
	#[serde(default = "ten", deserialize_with = "tag_limit_or_default")]
	#[schemars(with = "usize")]
	pub limit: usize,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PostDeleted {
	/// The number of comments deleted along with the post.
	pub comments_deleted: u64,
}
