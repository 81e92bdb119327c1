use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
	CommentFilter, CommentSort, Error, NewComment, NewUser, PostFilter, PostSort, Store, Unique,
	Window,
};
use crate::model::{Author, Comment, CreatePostInput, Post, ReactionKind, UpdatePostInput, User};

/// A store that keeps everything in memory, in insertion order.
///
/// Each operation holds the lock for its whole duration, which makes it
/// atomic with respect to every other operation.
#[derive(Debug, Default)]
pub struct MemoryStore {
	inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
	users: Vec<User>,
	posts: Vec<Post>,
	comments: Vec<Comment>,
}

impl Inner {
	fn author(&self, user_id: Uuid) -> Option<Author> {
		self.users.iter().find(|u| u.id == user_id).map(Author::from)
	}

	fn post_with_author(&self, mut post: Post) -> Post {
		post.author = self.author(post.user_id);
		post
	}

	fn comment_with_author(&self, mut comment: Comment) -> Comment {
		comment.author = self.author(comment.user_id);
		comment
	}
}

fn page<T>(items: Vec<T>, window: Window) -> Vec<T> {
	let offset = usize::try_from(window.offset).unwrap_or(0);
	let limit = usize::try_from(window.limit).unwrap_or(0);

	items.into_iter().skip(offset).take(limit).collect()
}

fn count(n: usize) -> i64 {
	i64::try_from(n).unwrap_or(i64::MAX)
}

/// Sorts newest first, keeping the most recently inserted first among equal timestamps.
fn newest_first<T>(items: &mut Vec<T>, created_at: impl Fn(&T) -> chrono::DateTime<Utc>) {
	items.reverse();
	items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
}

#[async_trait::async_trait]
impl Store for MemoryStore {
	async fn create_user(&self, user: NewUser) -> Result<User, Error> {
		let mut inner = self.inner.write().await;

		if inner.users.iter().any(|u| u.email == user.email) {
			return Err(Error::Duplicate(Unique::UserEmail));
		}

		let user = User {
			id: user.id,
			email: user.email,
			password: user.password,
			full_name: user.full_name,
			avatar_url: user.avatar_url,
			created_at: Utc::now(),
		};

		inner.users.push(user.clone());
		Ok(user)
	}

	async fn find_user(&self, id: Uuid) -> Result<Option<User>, Error> {
		let inner = self.inner.read().await;

		Ok(inner.users.iter().find(|u| u.id == id).cloned())
	}

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
		let inner = self.inner.read().await;

		Ok(inner.users.iter().find(|u| u.email == email).cloned())
	}

	async fn insert_post(&self, user_id: Uuid, input: &CreatePostInput) -> Result<Post, Error> {
		let mut inner = self.inner.write().await;

		if inner.posts.iter().any(|p| p.text == input.text) {
			return Err(Error::Duplicate(Unique::PostText));
		}

		let now = Utc::now();
		let post = Post {
			id: Uuid::new_v4(),
			user_id,
			author: None,
			title: input.title.clone(),
			text: input.text.clone(),
			image_url: input.image_url.clone(),
			tags: input.tags.clone(),
			views_count: 0,
			comments_count: 0,
			created_at: now,
			updated_at: now,
		};

		inner.posts.push(post.clone());
		Ok(inner.post_with_author(post))
	}

	async fn find_post(&self, id: Uuid) -> Result<Option<Post>, Error> {
		let inner = self.inner.read().await;

		Ok(inner
			.posts
			.iter()
			.find(|p| p.id == id)
			.cloned()
			.map(|post| inner.post_with_author(post)))
	}

	async fn view_post(&self, id: Uuid) -> Result<Option<Post>, Error> {
		let mut inner = self.inner.write().await;

		let post = inner.posts.iter_mut().find(|p| p.id == id).map(|post| {
			post.views_count += 1;
			post.clone()
		});

		Ok(post.map(|post| inner.post_with_author(post)))
	}

	async fn update_post(&self, id: Uuid, input: &UpdatePostInput) -> Result<Option<Post>, Error> {
		let mut inner = self.inner.write().await;

		if let Some(ref text) = input.text {
			if inner.posts.iter().any(|p| p.id != id && p.text == *text) {
				return Err(Error::Duplicate(Unique::PostText));
			}
		}

		let Some(post) = inner.posts.iter_mut().find(|p| p.id == id) else {
			return Ok(None);
		};

		if let Some(ref title) = input.title {
			post.title.clone_from(title);
		}

		if let Some(ref text) = input.text {
			post.text.clone_from(text);
		}

		if let Some(ref image_url) = input.image_url {
			post.image_url.clone_from(image_url);
		}

		if let Some(ref tags) = input.tags {
			post.tags.clone_from(tags);
		}

		post.updated_at = Utc::now();

		let post = post.clone();

		Ok(Some(inner.post_with_author(post)))
	}

	async fn delete_post(&self, id: Uuid) -> Result<bool, Error> {
		let mut inner = self.inner.write().await;
		let before = inner.posts.len();

		inner.posts.retain(|p| p.id != id);

		Ok(inner.posts.len() != before)
	}

	async fn list_posts(
		&self,
		filter: &PostFilter,
		sort: PostSort,
		window: Window,
	) -> Result<Vec<Post>, Error> {
		let inner = self.inner.read().await;
		let mut posts = inner
			.posts
			.iter()
			.filter(|p| filter.matches(p))
			.cloned()
			.map(|post| inner.post_with_author(post))
			.collect::<Vec<_>>();

		match sort {
			PostSort::New => newest_first(&mut posts, |p| p.created_at),
			PostSort::Old => posts.sort_by_key(|p| p.created_at),
			PostSort::Popular => {
				newest_first(&mut posts, |p| p.created_at);
				posts.sort_by(|a, b| b.views_count.cmp(&a.views_count));
			}
		}

		Ok(page(posts, window))
	}

	async fn count_posts(&self, filter: &PostFilter) -> Result<i64, Error> {
		let inner = self.inner.read().await;

		Ok(count(inner.posts.iter().filter(|p| filter.matches(p)).count()))
	}

	async fn post_tags(&self, sort: PostSort, limit: Option<i64>) -> Result<Vec<Vec<String>>, Error> {
		let window = Window {
			limit: limit.unwrap_or(i64::MAX),
			offset: 0,
		};

		Ok(self
			.list_posts(&PostFilter::default(), sort, window)
			.await?
			.into_iter()
			.map(|post| post.tags)
			.collect())
	}

	async fn add_comments_count(&self, post_id: Uuid, delta: i64) -> Result<Option<i64>, Error> {
		let mut inner = self.inner.write().await;

		Ok(inner.posts.iter_mut().find(|p| p.id == post_id).map(|post| {
			post.comments_count = (post.comments_count + delta).max(0);
			post.comments_count
		}))
	}

	async fn set_comments_count(&self, post_id: Uuid, count: i64) -> Result<Option<Post>, Error> {
		let mut inner = self.inner.write().await;

		let post = inner.posts.iter_mut().find(|p| p.id == post_id).map(|post| {
			post.comments_count = count.max(0);
			post.clone()
		});

		Ok(post.map(|post| inner.post_with_author(post)))
	}

	async fn insert_comment(&self, comment: NewComment) -> Result<Option<Comment>, Error> {
		let mut inner = self.inner.write().await;

		if !inner.posts.iter().any(|p| p.id == comment.post_id) {
			return Ok(None);
		}

		let now = Utc::now();
		let comment = Comment {
			id: Uuid::new_v4(),
			user_id: comment.user_id,
			author: None,
			post_id: comment.post_id,
			parent_comment_id: comment.parent_comment_id,
			text: comment.text,
			likes: Vec::new(),
			dislikes: Vec::new(),
			created_at: now,
			updated_at: now,
		};

		inner.comments.push(comment.clone());
		Ok(Some(inner.comment_with_author(comment)))
	}

	async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, Error> {
		let inner = self.inner.read().await;

		Ok(inner
			.comments
			.iter()
			.find(|c| c.id == id)
			.cloned()
			.map(|comment| inner.comment_with_author(comment)))
	}

	async fn update_comment(&self, id: Uuid, text: &str) -> Result<Option<Comment>, Error> {
		let mut inner = self.inner.write().await;

		let comment = inner.comments.iter_mut().find(|c| c.id == id).map(|comment| {
			text.clone_into(&mut comment.text);
			comment.updated_at = Utc::now();
			comment.clone()
		});

		Ok(comment.map(|comment| inner.comment_with_author(comment)))
	}

	async fn delete_comment(&self, id: Uuid) -> Result<Option<Comment>, Error> {
		let mut inner = self.inner.write().await;
		let index = inner.comments.iter().position(|c| c.id == id);
		let comment = index.map(|index| inner.comments.remove(index));

		Ok(comment.map(|comment| inner.comment_with_author(comment)))
	}

	async fn delete_comments_by_post(&self, post_id: Uuid) -> Result<u64, Error> {
		let mut inner = self.inner.write().await;
		let before = inner.comments.len();

		inner.comments.retain(|c| c.post_id != post_id);

		Ok(u64::try_from(before - inner.comments.len()).unwrap_or(u64::MAX))
	}

	async fn list_comments(
		&self,
		filter: &CommentFilter,
		sort: CommentSort,
		window: Window,
	) -> Result<Vec<Comment>, Error> {
		let inner = self.inner.read().await;
		let mut comments = inner
			.comments
			.iter()
			.filter(|c| filter.matches(c))
			.cloned()
			.map(|comment| inner.comment_with_author(comment))
			.collect::<Vec<_>>();

		match sort {
			CommentSort::New => newest_first(&mut comments, |c| c.created_at),
			CommentSort::Old => comments.sort_by_key(|c| c.created_at),
		}

		Ok(page(comments, window))
	}

	async fn count_comments(&self, filter: &CommentFilter) -> Result<i64, Error> {
		let inner = self.inner.read().await;

		Ok(count(inner.comments.iter().filter(|c| filter.matches(c)).count()))
	}

	async fn toggle_reaction(
		&self,
		id: Uuid,
		user_id: Uuid,
		kind: ReactionKind,
	) -> Result<Option<Comment>, Error> {
		let mut inner = self.inner.write().await;

		let comment = inner.comments.iter_mut().find(|c| c.id == id).map(|comment| {
			let (target, opposite) = match kind {
				ReactionKind::Like => (&mut comment.likes, &mut comment.dislikes),
				ReactionKind::Dislike => (&mut comment.dislikes, &mut comment.likes),
			};

			if target.contains(&user_id) {
				target.retain(|u| *u != user_id);
			} else {
				target.push(user_id);
				opposite.retain(|u| *u != user_id);
			}

			comment.clone()
		});

		Ok(comment.map(|comment| inner.comment_with_author(comment)))
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn post_input(text: &str, tags: &[&str]) -> CreatePostInput {
		CreatePostInput {
			title: "A title".into(),
			text: text.into(),
			image_url: None,
			tags: tags.iter().map(|t| (*t).to_owned()).collect(),
		}
	}

	const ALL: Window = Window {
		limit: 100,
		offset: 0,
	};

	#[tokio::test]
	async fn test_duplicate_post_text() {
		let store = MemoryStore::default();
		let user = Uuid::new_v4();

		store.insert_post(user, &post_input("same text", &[])).await.unwrap();
		let error = store
			.insert_post(user, &post_input("same text", &[]))
			.await
			.unwrap_err();

		assert!(matches!(error, Error::Duplicate(Unique::PostText)));
	}

	#[tokio::test]
	async fn test_tag_filters() {
		let store = MemoryStore::default();
		let user = Uuid::new_v4();

		store.insert_post(user, &post_input("first", &["rust", "web"])).await.unwrap();
		store.insert_post(user, &post_input("second", &["rust"])).await.unwrap();
		store.insert_post(user, &post_input("third", &["go", "web"])).await.unwrap();

		let any = PostFilter {
			any_tags: vec!["rust".into(), "go".into()],
			..Default::default()
		};
		let all = PostFilter {
			all_tags: vec!["rust".into(), "web".into()],
			..Default::default()
		};

		assert_eq!(store.count_posts(&any).await.unwrap(), 3);
		assert_eq!(store.count_posts(&all).await.unwrap(), 1);

		let posts = store.list_posts(&all, PostSort::New, ALL).await.unwrap();

		assert_eq!(posts[0].text, "first");
	}

	#[tokio::test]
	async fn test_sorting_and_window() {
		let store = MemoryStore::default();
		let user = Uuid::new_v4();

		for text in ["one", "two", "three"] {
			store.insert_post(user, &post_input(text, &[])).await.unwrap();
		}

		let second = store.list_posts(&PostFilter::default(), PostSort::New, ALL).await.unwrap()[1].id;
		store.view_post(second).await.unwrap();

		let texts = |posts: Vec<Post>| posts.into_iter().map(|p| p.text).collect::<Vec<_>>();

		let new = store.list_posts(&PostFilter::default(), PostSort::New, ALL).await.unwrap();
		let old = store.list_posts(&PostFilter::default(), PostSort::Old, ALL).await.unwrap();
		let popular = store
			.list_posts(&PostFilter::default(), PostSort::Popular, ALL)
			.await
			.unwrap();
		let window = store
			.list_posts(
				&PostFilter::default(),
				PostSort::Old,
				Window {
					limit: 1,
					offset: 1,
				},
			)
			.await
			.unwrap();

		assert_eq!(texts(new), ["three", "two", "one"]);
		assert_eq!(texts(old), ["one", "two", "three"]);
		assert_eq!(texts(popular), ["two", "three", "one"]);
		assert_eq!(texts(window), ["two"]);
	}

	#[tokio::test]
	async fn test_comments_count_never_negative() {
		let store = MemoryStore::default();
		let post = store
			.insert_post(Uuid::new_v4(), &post_input("counted", &[]))
			.await
			.unwrap();

		assert_eq!(store.add_comments_count(post.id, 1).await.unwrap(), Some(1));
		assert_eq!(store.add_comments_count(post.id, -1).await.unwrap(), Some(0));
		assert_eq!(store.add_comments_count(post.id, -1).await.unwrap(), Some(0));
		assert_eq!(store.add_comments_count(Uuid::new_v4(), 1).await.unwrap(), None);
	}

	fn new_comment(user_id: Uuid, post_id: Uuid) -> NewComment {
		NewComment {
			user_id,
			post_id,
			parent_comment_id: None,
			text: "a comment".into(),
		}
	}

	#[tokio::test]
	async fn test_comment_needs_live_post() {
		let store = MemoryStore::default();
		let user = Uuid::new_v4();

		assert!(store.insert_comment(new_comment(user, Uuid::new_v4())).await.unwrap().is_none());

		let post = store.insert_post(user, &post_input("commented", &[])).await.unwrap();

		store.delete_post(post.id).await.unwrap();

		assert!(store.insert_comment(new_comment(user, post.id)).await.unwrap().is_none());
		assert_eq!(store.count_comments(&CommentFilter::default()).await.unwrap(), 0);
	}

	#[tokio::test]
	async fn test_author_attached() {
		let store = MemoryStore::default();
		let user = store
			.create_user(NewUser {
				id: Uuid::new_v4(),
				email: "ada@example.com".into(),
				password: Vec::new(),
				full_name: "Ada Lovelace".into(),
				avatar_url: Some("https://example.com/ada.png".into()),
			})
			.await
			.unwrap();

		let post = store.insert_post(user.id, &post_input("authored", &[])).await.unwrap();
		let comment = store.insert_comment(new_comment(user.id, post.id)).await.unwrap().unwrap();

		let expected = Some(Author::from(&user));

		assert_eq!(post.author, expected);
		assert_eq!(comment.author, expected);
		assert_eq!(store.find_post(post.id).await.unwrap().unwrap().author, expected);
		assert_eq!(
			store.list_comments(&CommentFilter::post(post.id), CommentSort::New, ALL).await.unwrap()[0].author,
			expected
		);

		let orphan = store.insert_post(Uuid::new_v4(), &post_input("no author", &[])).await.unwrap();

		assert_eq!(orphan.author, None);
	}
}
