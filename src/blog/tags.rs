use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Error;
use crate::store::{PostSort, Store};

/// Which posts contribute to the tag ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
pub enum TagRanking {
	/// Only the most recent posts, giving trending tags.
	#[default]
	#[serde(rename = "new")]
	Recency,
	/// Every post.
	#[serde(rename = "popular")]
	Popularity,
}

/// A tag and the number of posts carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct TagCount {
	pub name: String,
	pub count: i64,
}

/// Counts exact tag strings, most frequent first with ties broken by name,
/// keeping at most `limit` of them.
pub fn count_tags<'a>(tags: impl IntoIterator<Item = &'a String>, limit: usize) -> Vec<TagCount> {
	let mut counts = HashMap::<&str, i64>::new();

	for tag in tags {
		*counts.entry(tag.as_str()).or_default() += 1;
	}

	let mut counts = counts
		.into_iter()
		.map(|(name, count)| TagCount {
			name: name.to_owned(),
			count,
		})
		.collect::<Vec<_>>();

	counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
	counts.truncate(limit);
	counts
}

/// The most used tags. `window` is the number of recent posts considered
/// when ranking by recency.
#[tracing::instrument(skip(store))]
pub async fn top_tags(
	store: &dyn Store,
	ranking: TagRanking,
	limit: usize,
	window: i64,
) -> Result<Vec<TagCount>, Error> {
	let posts = match ranking {
		TagRanking::Recency => store.post_tags(PostSort::New, Some(window)).await?,
		TagRanking::Popularity => store.post_tags(PostSort::New, None).await?,
	};

	Ok(count_tags(posts.iter().flatten(), limit))
}
