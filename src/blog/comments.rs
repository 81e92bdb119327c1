use schemars::JsonSchema;
use serde::Serialize;
use uuid::Uuid;

use super::Error;
use crate::{
	model::{Comment, Post, ReactionKind, UserAction},
	store::{CommentFilter, NewComment, Store},
};

/// The reaction counts of a comment after a toggle, along with the
/// reaction the user now has on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Reaction {
	pub likes_count: usize,
	pub dislikes_count: usize,
	pub user_action: UserAction,
}

/// Creates a comment on a post, then increments the post's comment count.
///
/// A reply must point at an existing comment on the same post.
#[tracing::instrument(skip(store, text))]
pub async fn create_comment(
	store: &dyn Store,
	post_id: Uuid,
	author_id: Uuid,
	text: String,
	parent_id: Option<Uuid>,
) -> Result<Comment, Error> {
	if store.find_post(post_id).await?.is_none() {
		return Err(Error::UnknownPost(post_id));
	}

	if let Some(parent_id) = parent_id {
		let parent = store
			.find_comment(parent_id)
			.await?
			.ok_or(Error::UnknownParentComment(parent_id))?;

		if parent.post_id != post_id {
			return Err(Error::ParentCommentMismatch {
				parent: parent_id,
				post: post_id,
			});
		}
	}

	let comment = store
		.insert_comment(NewComment {
			user_id: author_id,
			post_id,
			parent_comment_id: parent_id,
			text,
		})
		.await?
		// the post was deleted after the check above
		.ok_or(Error::UnknownPost(post_id))?;

	if store.add_comments_count(post_id, 1).await?.is_none() {
		tracing::warn!(comment = %comment.id, "post removed before its comment count was incremented");
	}

	Ok(comment)
}

/// Edits the text of a comment. Only its author may do so.
#[tracing::instrument(skip(store, text))]
pub async fn update_comment(
	store: &dyn Store,
	comment_id: Uuid,
	requester_id: Uuid,
	text: &str,
) -> Result<Comment, Error> {
	let comment = store
		.find_comment(comment_id)
		.await?
		.ok_or(Error::UnknownComment(comment_id))?;

	if comment.user_id != requester_id {
		return Err(Error::NotAuthor);
	}

	store
		.update_comment(comment_id, text)
		.await?
		.ok_or(Error::UnknownComment(comment_id))
}

/// Deletes a comment, then decrements its post's comment count.
///
/// Replies to the comment are left in place.
#[tracing::instrument(skip(store))]
pub async fn delete_comment(
	store: &dyn Store,
	comment_id: Uuid,
	requester_id: Uuid,
) -> Result<Comment, Error> {
	let comment = store
		.find_comment(comment_id)
		.await?
		.ok_or(Error::UnknownComment(comment_id))?;

	if comment.user_id != requester_id {
		return Err(Error::NotAuthor);
	}

	let comment = store
		.delete_comment(comment_id)
		.await?
		.ok_or(Error::UnknownComment(comment_id))?;

	// The post is already gone when this races with a post deletion.
	if store.add_comments_count(comment.post_id, -1).await?.is_none() {
		tracing::debug!(post = %comment.post_id, "skipped decrement of removed post");
	}

	Ok(comment)
}

/// Toggles a like or dislike of `user_id` on a comment.
#[tracing::instrument(skip(store))]
pub async fn react(
	store: &dyn Store,
	comment_id: Uuid,
	user_id: Uuid,
	kind: ReactionKind,
) -> Result<Reaction, Error> {
	let comment = store
		.toggle_reaction(comment_id, user_id, kind)
		.await?
		.ok_or(Error::UnknownComment(comment_id))?;

	Ok(Reaction {
		likes_count: comment.likes_count(),
		dislikes_count: comment.dislikes_count(),
		user_action: comment.action_of(user_id),
	})
}

/// Recomputes the comment count of a post from its live comments.
#[tracing::instrument(skip(store))]
pub async fn reconcile_post(
	store: &dyn Store,
	post_id: Uuid,
	requester_id: Uuid,
) -> Result<Post, Error> {
	let post = store
		.find_post(post_id)
		.await?
		.ok_or(Error::UnknownPost(post_id))?;

	if post.user_id != requester_id {
		return Err(Error::NotAuthor);
	}

	let count = store.count_comments(&CommentFilter::post(post_id)).await?;

	if count != post.comments_count {
		tracing::info!(stored = post.comments_count, actual = count, "repairing comment count");
	}

	store
		.set_comments_count(post_id, count)
		.await?
		.ok_or(Error::UnknownPost(post_id))
}

#[cfg(test)]
mod test {
	use uuid::Uuid;

	use super::*;
	use crate::{
		blog::test::post,
		store::{CommentSort, MemoryStore, Window},
	};

	async fn comments_count(store: &MemoryStore, post_id: Uuid) -> i64 {
		store.find_post(post_id).await.unwrap().unwrap().comments_count
	}

	#[tokio::test]
	async fn test_comment_lifecycle() {
		let store = MemoryStore::default();
		let user = Uuid::new_v4();
		let p = post(&store, user, "a post about comments", &[]).await;

		let c1 = create_comment(&store, p.id, user, "first comment".into(), None)
			.await
			.unwrap();
		assert_eq!(comments_count(&store, p.id).await, 1);

		let c2 = create_comment(&store, p.id, user, "a reply to it".into(), Some(c1.id))
			.await
			.unwrap();
		assert_eq!(comments_count(&store, p.id).await, 2);

		delete_comment(&store, c1.id, user).await.unwrap();
		assert_eq!(comments_count(&store, p.id).await, 1);

		let orphan = store.find_comment(c2.id).await.unwrap().unwrap();
		assert_eq!(orphan.parent_comment_id, Some(c1.id));
	}

	#[tokio::test]
	async fn test_delete_comment_after_post() {
		let store = MemoryStore::default();
		let user = Uuid::new_v4();
		let p = post(&store, user, "short lived post", &[]).await;
		let comment = create_comment(&store, p.id, user, "left behind".into(), None)
			.await
			.unwrap();

		assert!(store.delete_post(p.id).await.unwrap());

		let deleted = delete_comment(&store, comment.id, user).await.unwrap();

		assert_eq!(deleted.id, comment.id);
		assert!(store.find_comment(comment.id).await.unwrap().is_none());
		assert!(store.find_post(p.id).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_count_matches_live_comments() {
		let store = MemoryStore::default();
		let user = Uuid::new_v4();
		let p = post(&store, user, "counting comments", &[]).await;

		let mut ids = Vec::new();

		for i in 0..5 {
			let comment = create_comment(&store, p.id, user, format!("comment {i}"), None)
				.await
				.unwrap();
			ids.push(comment.id);
		}

		for id in ids.iter().step_by(2) {
			delete_comment(&store, *id, user).await.unwrap();
		}

		let live = store
			.list_comments(
				&CommentFilter::post(p.id),
				CommentSort::New,
				Window {
					limit: 100,
					offset: 0,
				},
			)
			.await
			.unwrap();

		assert_eq!(live.len(), 2);
		assert_eq!(comments_count(&store, p.id).await, 2);
	}

	#[tokio::test]
	async fn test_create_comment_errors() {
		let store = MemoryStore::default();
		let user = Uuid::new_v4();
		let p = post(&store, user, "first post", &[]).await;
		let other = post(&store, user, "second post", &[]).await;
		let missing = Uuid::new_v4();

		let error = create_comment(&store, missing, user, "hello".into(), None)
			.await
			.unwrap_err();
		assert!(matches!(error, Error::UnknownPost(id) if id == missing));

		let error = create_comment(&store, p.id, user, "hello".into(), Some(missing))
			.await
			.unwrap_err();
		assert!(matches!(error, Error::UnknownParentComment(id) if id == missing));

		let parent = create_comment(&store, other.id, user, "elsewhere".into(), None)
			.await
			.unwrap();
		let error = create_comment(&store, p.id, user, "hello".into(), Some(parent.id))
			.await
			.unwrap_err();
		assert!(matches!(error, Error::ParentCommentMismatch { .. }));

		assert_eq!(comments_count(&store, p.id).await, 0);
	}

	#[tokio::test]
	async fn test_only_author_mutates() {
		let store = MemoryStore::default();
		let (author, stranger) = (Uuid::new_v4(), Uuid::new_v4());
		let p = post(&store, author, "guarded post", &[]).await;
		let comment = create_comment(&store, p.id, author, "mine".into(), None)
			.await
			.unwrap();

		assert!(matches!(
			delete_comment(&store, comment.id, stranger).await,
			Err(Error::NotAuthor)
		));
		assert!(matches!(
			update_comment(&store, comment.id, stranger, "theirs").await,
			Err(Error::NotAuthor)
		));
		assert!(matches!(
			reconcile_post(&store, p.id, stranger).await,
			Err(Error::NotAuthor)
		));

		let updated = update_comment(&store, comment.id, author, "edited")
			.await
			.unwrap();
		assert_eq!(updated.text, "edited");
		assert_eq!(comments_count(&store, p.id).await, 1);
	}

	#[tokio::test]
	async fn test_reaction_toggle() {
		let store = MemoryStore::default();
		let user = Uuid::new_v4();
		let p = post(&store, user, "reactions", &[]).await;
		let x = create_comment(&store, p.id, user, "react to me".into(), None)
			.await
			.unwrap();

		let liked = react(&store, x.id, user, ReactionKind::Like).await.unwrap();
		assert_eq!((liked.likes_count, liked.dislikes_count), (1, 0));
		assert_eq!(liked.user_action, UserAction::Liked);

		let disliked = react(&store, x.id, user, ReactionKind::Dislike).await.unwrap();
		assert_eq!((disliked.likes_count, disliked.dislikes_count), (0, 1));
		assert_eq!(disliked.user_action, UserAction::Disliked);

		let cleared = react(&store, x.id, user, ReactionKind::Dislike).await.unwrap();
		assert_eq!((cleared.likes_count, cleared.dislikes_count), (0, 0));
		assert_eq!(cleared.user_action, UserAction::None);

		let missing = Uuid::new_v4();
		assert!(matches!(
			react(&store, missing, user, ReactionKind::Like).await,
			Err(Error::UnknownComment(id)) if id == missing
		));
	}

	#[tokio::test]
	async fn test_reactions_stay_exclusive() {
		let store = MemoryStore::default();
		let user = Uuid::new_v4();
		let p = post(&store, user, "many reactions", &[]).await;
		let x = create_comment(&store, p.id, user, "popular".into(), None)
			.await
			.unwrap();
		let users = (0..4).map(|_| Uuid::new_v4()).collect::<Vec<_>>();

		let kinds = [
			ReactionKind::Like,
			ReactionKind::Dislike,
			ReactionKind::Like,
			ReactionKind::Like,
			ReactionKind::Dislike,
		];

		for (i, kind) in kinds.iter().cycle().take(20).enumerate() {
			react(&store, x.id, users[i % users.len()], *kind).await.unwrap();

			let comment = store.find_comment(x.id).await.unwrap().unwrap();
			assert!(comment.likes.iter().all(|u| !comment.dislikes.contains(u)));
		}
	}

	#[tokio::test]
	async fn test_reconcile_repairs_drift() {
		let store = MemoryStore::default();
		let user = Uuid::new_v4();
		let p = post(&store, user, "drifting", &[]).await;

		create_comment(&store, p.id, user, "one".into(), None).await.unwrap();
		create_comment(&store, p.id, user, "two".into(), None).await.unwrap();
		store.set_comments_count(p.id, 7).await.unwrap();

		let repaired = reconcile_post(&store, p.id, user).await.unwrap();

		assert_eq!(repaired.comments_count, 2);
	}
}
