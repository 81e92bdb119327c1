use uuid::Uuid;

use super::Error;
use crate::store::Store;

/// Deletes a post along with every comment on it, returning the number
/// of comments removed.
///
/// Comments go first, so an interrupted deletion leaves the post in place
/// and can be retried.
#[tracing::instrument(skip(store))]
pub async fn delete_post(store: &dyn Store, post_id: Uuid, requester_id: Uuid) -> Result<u64, Error> {
	let post = store
		.find_post(post_id)
		.await?
		.ok_or(Error::UnknownPost(post_id))?;

	if post.user_id != requester_id {
		return Err(Error::NotAuthor);
	}

	let removed = store.delete_comments_by_post(post_id).await?;

	tracing::info!(removed, "deleted comments of post");

	if !store.delete_post(post_id).await? {
		return Err(Error::UnknownPost(post_id));
	}

	Ok(removed)
}
