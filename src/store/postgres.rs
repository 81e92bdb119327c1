use sqlx::{
	postgres::{PgPoolOptions, PgRow},
	PgPool, Row,
};
use uuid::Uuid;

use super::{
	CommentFilter, CommentSort, Error, NewComment, NewUser, PostFilter, PostSort, Store, Unique,
	Window,
};
use crate::model::{Author, Comment, CreatePostInput, Post, ReactionKind, UpdatePostInput, User};

/// A store backed by PostgreSQL. Migrations are applied on connect.
#[derive(Debug, Clone)]
pub struct PgStore {
	pool: PgPool,
}

impl PgStore {
	pub async fn connect(url: &str) -> Result<Self, Error> {
		let pool = PgPoolOptions::new().max_connections(16).connect(url).await?;

		sqlx::migrate!().run(&pool).await?;

		Ok(Self { pool })
	}
}

/// Maps unique violations to the constraint they broke.
fn unique_violation(error: sqlx::Error) -> Error {
	let unique = match &error {
		sqlx::Error::Database(d) => match d.constraint() {
			Some("user_email_key") => Some(Unique::UserEmail),
			Some("post_text_key") => Some(Unique::PostText),
			_ => None,
		},
		_ => None,
	};

	unique.map_or(Error::Database(error), Error::Duplicate)
}

/// Whether a comment was refused because its post does not exist.
fn missing_post(error: &sqlx::Error) -> bool {
	matches!(error, sqlx::Error::Database(d) if d.constraint() == Some("comment_post_id_fkey"))
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
	Ok(User {
		id: row.try_get("id")?,
		email: row.try_get("email")?,
		password: row.try_get("password")?,
		full_name: row.try_get("full_name")?,
		avatar_url: row.try_get("avatar_url")?,
		created_at: row.try_get("created_at")?,
	})
}

/// Reads the author columns added by [`POST_SELECT`] and [`COMMENT_SELECT`].
fn author_from_row(row: &PgRow) -> Result<Option<Author>, sqlx::Error> {
	let Some(full_name) = row.try_get::<Option<String>, _>("author_full_name")? else {
		return Ok(None);
	};

	Ok(Some(Author {
		id: row.try_get("user_id")?,
		full_name,
		avatar_url: row.try_get("author_avatar_url")?,
	}))
}

fn post_from_row(row: &PgRow) -> Result<Post, sqlx::Error> {
	Ok(Post {
		id: row.try_get("id")?,
		user_id: row.try_get("user_id")?,
		author: author_from_row(row)?,
		title: row.try_get("title")?,
		text: row.try_get("text")?,
		image_url: row.try_get("image_url")?,
		tags: row.try_get("tags")?,
		views_count: row.try_get("views_count")?,
		comments_count: row.try_get("comments_count")?,
		created_at: row.try_get("created_at")?,
		updated_at: row.try_get("updated_at")?,
	})
}

fn comment_from_row(row: &PgRow) -> Result<Comment, sqlx::Error> {
	Ok(Comment {
		id: row.try_get("id")?,
		user_id: row.try_get("user_id")?,
		author: author_from_row(row)?,
		post_id: row.try_get("post_id")?,
		parent_comment_id: row.try_get("parent_comment_id")?,
		text: row.try_get("text")?,
		likes: row.try_get("likes")?,
		dislikes: row.try_get("dislikes")?,
		created_at: row.try_get("created_at")?,
		updated_at: row.try_get("updated_at")?,
	})
}

fn post_order(sort: PostSort) -> &'static str {
	match sort {
		PostSort::New => "post.created_at DESC, post.id",
		PostSort::Old => "post.created_at ASC, post.id",
		PostSort::Popular => "post.views_count DESC, post.created_at DESC",
	}
}

fn comment_order(sort: CommentSort) -> &'static str {
	match sort {
		CommentSort::New => "comment.created_at DESC, comment.id",
		CommentSort::Old => "comment.created_at ASC, comment.id",
	}
}

const POST_FILTER: &str = r#"
	(cardinality($1::text[]) = 0 OR post.tags && $1::text[])
	AND post.tags @> $2::text[]
	AND ($3::uuid IS NULL OR post.user_id = $3)
"#;

const COMMENT_FILTER: &str = r#"
	($1::uuid IS NULL OR comment.post_id = $1)
	AND ($2::uuid IS NULL OR comment.parent_comment_id = $2)
"#;

/// Posts along with their author's profile.
const POST_SELECT: &str = r#"
	SELECT post.*, author.full_name AS author_full_name, author.avatar_url AS author_avatar_url
	FROM post
	LEFT JOIN "user" AS author ON author.id = post.user_id
"#;

/// Comments along with their author's profile.
const COMMENT_SELECT: &str = r#"
	SELECT comment.*, author.full_name AS author_full_name, author.avatar_url AS author_avatar_url
	FROM comment
	LEFT JOIN "user" AS author ON author.id = comment.user_id
"#;

/// Runs `statement`, which must end in `RETURNING *`, and selects the changed
/// posts with their author. The CTE shadows the table for the outer query.
fn returning_post(statement: &str) -> String {
	format!("WITH post AS ({statement}) {POST_SELECT}")
}

fn returning_comment(statement: &str) -> String {
	format!("WITH comment AS ({statement}) {COMMENT_SELECT}")
}

#[async_trait::async_trait]
impl Store for PgStore {
	async fn create_user(&self, user: NewUser) -> Result<User, Error> {
		let row = sqlx::query(
			r#"
				INSERT INTO "user" (id, email, password, full_name, avatar_url)
				VALUES ($1, $2, $3, $4, $5)
				RETURNING *
			"#,
		)
		.bind(user.id)
		.bind(&user.email)
		.bind(&user.password)
		.bind(&user.full_name)
		.bind(user.avatar_url.as_deref())
		.fetch_one(&self.pool)
		.await
		.map_err(unique_violation)?;

		Ok(user_from_row(&row)?)
	}

	async fn find_user(&self, id: Uuid) -> Result<Option<User>, Error> {
		let row = sqlx::query(r#"SELECT * FROM "user" WHERE id = $1"#)
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(row.as_ref().map(user_from_row).transpose()?)
	}

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
		let row = sqlx::query(r#"SELECT * FROM "user" WHERE email = $1"#)
			.bind(email)
			.fetch_optional(&self.pool)
			.await?;

		Ok(row.as_ref().map(user_from_row).transpose()?)
	}

	async fn insert_post(&self, user_id: Uuid, input: &CreatePostInput) -> Result<Post, Error> {
		let sql = returning_post(
			r#"
				INSERT INTO post (id, user_id, title, text, image_url, tags)
				VALUES ($1, $2, $3, $4, $5, $6)
				RETURNING *
			"#,
		);

		let row = sqlx::query(&sql)
			.bind(Uuid::new_v4())
			.bind(user_id)
			.bind(&input.title)
			.bind(&input.text)
			.bind(input.image_url.as_deref())
			.bind(input.tags.clone())
			.fetch_one(&self.pool)
			.await
			.map_err(unique_violation)?;

		Ok(post_from_row(&row)?)
	}

	async fn find_post(&self, id: Uuid) -> Result<Option<Post>, Error> {
		let sql = format!("{POST_SELECT} WHERE post.id = $1");

		let row = sqlx::query(&sql)
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(row.as_ref().map(post_from_row).transpose()?)
	}

	async fn view_post(&self, id: Uuid) -> Result<Option<Post>, Error> {
		let sql = returning_post(
			r#"
				UPDATE post
				SET views_count = views_count + 1
				WHERE id = $1
				RETURNING *
			"#,
		);

		let row = sqlx::query(&sql)
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(row.as_ref().map(post_from_row).transpose()?)
	}

	async fn update_post(&self, id: Uuid, input: &UpdatePostInput) -> Result<Option<Post>, Error> {
		// $4 tells a cleared image apart from one that is left alone
		let sql = returning_post(
			r#"
				UPDATE post
				SET title = COALESCE($2, title),
					text = COALESCE($3, text),
					image_url = CASE WHEN $4 THEN $5 ELSE image_url END,
					tags = COALESCE($6, tags),
					updated_at = now()
				WHERE id = $1
				RETURNING *
			"#,
		);

		let row = sqlx::query(&sql)
			.bind(id)
			.bind(input.title.as_deref())
			.bind(input.text.as_deref())
			.bind(input.image_url.is_some())
			.bind(input.image_url.clone().flatten())
			.bind(input.tags.clone())
			.fetch_optional(&self.pool)
			.await
			.map_err(unique_violation)?;

		Ok(row.as_ref().map(post_from_row).transpose()?)
	}

	async fn delete_post(&self, id: Uuid) -> Result<bool, Error> {
		let status = sqlx::query("DELETE FROM post WHERE id = $1")
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(status.rows_affected() > 0)
	}

	async fn list_posts(
		&self,
		filter: &PostFilter,
		sort: PostSort,
		window: Window,
	) -> Result<Vec<Post>, Error> {
		let sql = format!(
			"{POST_SELECT} WHERE {POST_FILTER} ORDER BY {} LIMIT $4 OFFSET $5",
			post_order(sort)
		);

		let rows = sqlx::query(&sql)
			.bind(filter.any_tags.clone())
			.bind(filter.all_tags.clone())
			.bind(filter.user_id)
			.bind(window.limit)
			.bind(window.offset)
			.fetch_all(&self.pool)
			.await?;

		Ok(rows.iter().map(post_from_row).collect::<Result<_, _>>()?)
	}

	async fn count_posts(&self, filter: &PostFilter) -> Result<i64, Error> {
		let sql = format!("SELECT COUNT(*) FROM post WHERE {POST_FILTER}");

		Ok(sqlx::query_scalar::<_, i64>(&sql)
			.bind(filter.any_tags.clone())
			.bind(filter.all_tags.clone())
			.bind(filter.user_id)
			.fetch_one(&self.pool)
			.await?)
	}

	async fn post_tags(&self, sort: PostSort, limit: Option<i64>) -> Result<Vec<Vec<String>>, Error> {
		// LIMIT NULL is the same as no limit
		let sql = format!("SELECT tags FROM post ORDER BY {} LIMIT $1", post_order(sort));

		Ok(sqlx::query_scalar::<_, Vec<String>>(&sql)
			.bind(limit)
			.fetch_all(&self.pool)
			.await?)
	}

	async fn add_comments_count(&self, post_id: Uuid, delta: i64) -> Result<Option<i64>, Error> {
		Ok(sqlx::query_scalar::<_, i64>(
			r#"
				UPDATE post
				SET comments_count = GREATEST(comments_count + $2, 0)
				WHERE id = $1
				RETURNING comments_count
			"#,
		)
		.bind(post_id)
		.bind(delta)
		.fetch_optional(&self.pool)
		.await?)
	}

	async fn set_comments_count(&self, post_id: Uuid, count: i64) -> Result<Option<Post>, Error> {
		let sql = returning_post(
			r#"
				UPDATE post
				SET comments_count = GREATEST($2, 0)
				WHERE id = $1
				RETURNING *
			"#,
		);

		let row = sqlx::query(&sql)
			.bind(post_id)
			.bind(count)
			.fetch_optional(&self.pool)
			.await?;

		Ok(row.as_ref().map(post_from_row).transpose()?)
	}

	async fn insert_comment(&self, comment: NewComment) -> Result<Option<Comment>, Error> {
		let sql = returning_comment(
			r#"
				INSERT INTO comment (id, user_id, post_id, parent_comment_id, text)
				VALUES ($1, $2, $3, $4, $5)
				RETURNING *
			"#,
		);

		let row = sqlx::query(&sql)
			.bind(Uuid::new_v4())
			.bind(comment.user_id)
			.bind(comment.post_id)
			.bind(comment.parent_comment_id)
			.bind(&comment.text)
			.fetch_one(&self.pool)
			.await;

		match row {
			Ok(row) => Ok(Some(comment_from_row(&row)?)),
			Err(error) if missing_post(&error) => Ok(None),
			Err(error) => Err(error.into()),
		}
	}

	async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, Error> {
		let sql = format!("{COMMENT_SELECT} WHERE comment.id = $1");

		let row = sqlx::query(&sql)
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(row.as_ref().map(comment_from_row).transpose()?)
	}

	async fn update_comment(&self, id: Uuid, text: &str) -> Result<Option<Comment>, Error> {
		let sql = returning_comment(
			r#"
				UPDATE comment
				SET text = $2, updated_at = now()
				WHERE id = $1
				RETURNING *
			"#,
		);

		let row = sqlx::query(&sql)
			.bind(id)
			.bind(text)
			.fetch_optional(&self.pool)
			.await?;

		Ok(row.as_ref().map(comment_from_row).transpose()?)
	}

	async fn delete_comment(&self, id: Uuid) -> Result<Option<Comment>, Error> {
		let sql = returning_comment("DELETE FROM comment WHERE id = $1 RETURNING *");

		let row = sqlx::query(&sql)
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(row.as_ref().map(comment_from_row).transpose()?)
	}

	async fn delete_comments_by_post(&self, post_id: Uuid) -> Result<u64, Error> {
		let status = sqlx::query("DELETE FROM comment WHERE post_id = $1")
			.bind(post_id)
			.execute(&self.pool)
			.await?;

		Ok(status.rows_affected())
	}

	async fn list_comments(
		&self,
		filter: &CommentFilter,
		sort: CommentSort,
		window: Window,
	) -> Result<Vec<Comment>, Error> {
		let sql = format!(
			"{COMMENT_SELECT} WHERE {COMMENT_FILTER} ORDER BY {} LIMIT $3 OFFSET $4",
			comment_order(sort)
		);

		let rows = sqlx::query(&sql)
			.bind(filter.post_id)
			.bind(filter.parent_comment_id)
			.bind(window.limit)
			.bind(window.offset)
			.fetch_all(&self.pool)
			.await?;

		Ok(rows.iter().map(comment_from_row).collect::<Result<_, _>>()?)
	}

	async fn count_comments(&self, filter: &CommentFilter) -> Result<i64, Error> {
		let sql = format!("SELECT COUNT(*) FROM comment WHERE {COMMENT_FILTER}");

		Ok(sqlx::query_scalar::<_, i64>(&sql)
			.bind(filter.post_id)
			.bind(filter.parent_comment_id)
			.fetch_one(&self.pool)
			.await?)
	}

	async fn toggle_reaction(
		&self,
		id: Uuid,
		user_id: Uuid,
		kind: ReactionKind,
	) -> Result<Option<Comment>, Error> {
		// Both arrays are rewritten in one statement, so the row lock
		// serializes concurrent reactions on the same comment.
		let sql = match kind {
			ReactionKind::Like => {
				r#"
					UPDATE comment
					SET likes = CASE
							WHEN $2::uuid = ANY(likes) THEN array_remove(likes, $2::uuid)
							ELSE array_append(likes, $2::uuid)
						END,
						dislikes = array_remove(dislikes, $2::uuid)
					WHERE id = $1
					RETURNING *
				"#
			}
			ReactionKind::Dislike => {
				r#"
					UPDATE comment
					SET dislikes = CASE
							WHEN $2::uuid = ANY(dislikes) THEN array_remove(dislikes, $2::uuid)
							ELSE array_append(dislikes, $2::uuid)
						END,
						likes = array_remove(likes, $2::uuid)
					WHERE id = $1
					RETURNING *
				"#
			}
		};

		let sql = returning_comment(sql);

		let row = sqlx::query(&sql)
			.bind(id)
			.bind(user_id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(row.as_ref().map(comment_from_row).transpose()?)
	}
}
