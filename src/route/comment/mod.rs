use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};

use crate::{blog, error, AppState};

pub mod model;
pub mod route;

pub type RouteError = error::RouteError<blog::Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/",
			get_with(get_comments, get_comments_docs).post_with(create_comment, create_comment_docs),
		)
		.api_route(
			"/:id",
			get_with(get_comment, get_comment_docs)
				.put_with(update_comment, update_comment_docs)
				.delete_with(delete_comment, delete_comment_docs),
		)
		.api_route("/:id/like", post_with(like_comment, like_comment_docs))
		.api_route(
			"/:id/dislike",
			post_with(dislike_comment, dislike_comment_docs),
		)
}

#[cfg(test)]
mod test {
	use crate::test::*;

	async fn create_post(app: &TestServer, token: &str, text: &str) -> String {
		let response = app
			.post("/posts")
			.add_header(AUTHORIZATION, bearer(token))
			.json(&json!({ "title": "Discussion", "text": text }))
			.await;

		assert_eq!(response.status_code(), 200);

		response.json::<Value>()["id"].as_str().unwrap().to_owned()
	}

	async fn comment(app: &TestServer, token: &str, body: Value) -> Value {
		let response = app
			.post("/comments")
			.add_header(AUTHORIZATION, bearer(token))
			.json(&body)
			.await;

		assert_eq!(response.status_code(), 200);

		response.json()
	}

	async fn comments_count(app: &TestServer, post: &str) -> Value {
		app.get(&format!("/posts/{post}")).await.json::<Value>()["comments_count"].clone()
	}

	#[tokio::test]
	async fn test_thread_lifecycle() {
		let app = app();
		let (token, _) = register(&app, "thread@blog.com").await;
		let post = create_post(&app, &token, "a threaded post").await;

		let c1 = comment(&app, &token, json!({ "post": post, "text": "top level" })).await;

		assert_eq!(c1["author"]["full_name"], "Test User");
		assert_eq!(c1["likes_count"], 0);

		let c1 = c1["id"].as_str().unwrap().to_owned();

		assert_eq!(comments_count(&app, &post).await, 1);

		let c2 = comment(
			&app,
			&token,
			json!({ "post": post, "text": "a reply", "parent_comment": c1 }),
		)
		.await;
		let c2 = c2["id"].as_str().unwrap().to_owned();

		assert_eq!(comments_count(&app, &post).await, 2);

		let replies = app
			.get("/comments")
			.add_query_param("parent", &c1)
			.await
			.json::<Value>();

		assert_eq!(replies["total"], 1);
		assert_eq!(replies["items"][0]["id"], c2.as_str());

		let response = app
			.delete(&format!("/comments/{c1}"))
			.add_header(AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(comments_count(&app, &post).await, 1);

		let orphan = app.get(&format!("/comments/{c2}")).await.json::<Value>();

		assert_eq!(orphan["parent_comment_id"], c1.as_str());
		assert_eq!(orphan["author"]["full_name"], "Test User");

		let response = app
			.delete(&format!("/posts/{post}"))
			.add_header(AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.json::<Value>()["comments_deleted"], 1);

		let response = app.get(&format!("/comments/{c2}")).await;

		assert_eq!(response.status_code(), 404);
		assert_eq!(response.json::<Value>()["errors"][0]["content"], "unknown_comment");
	}

	#[tokio::test]
	async fn test_comment_sorting() {
		let app = app();
		let (token, _) = register(&app, "chatty@blog.com").await;
		let post = create_post(&app, &token, "a busy post").await;
		let other = create_post(&app, &token, "a quiet post").await;

		let mut ids = Vec::new();

		for text in ["first word", "second word", "third word"] {
			let c = comment(&app, &token, json!({ "post": post, "text": text })).await;
			ids.push(c["id"].clone());
		}

		comment(&app, &token, json!({ "post": other, "text": "off topic" })).await;

		let listed = |sort: &'static str| {
			app.get("/comments")
				.add_query_param("post", &post)
				.add_query_param("sort", sort)
		};

		let body = listed("old").await.json::<Value>();
		let oldest = body["items"]
			.as_array()
			.unwrap()
			.iter()
			.map(|c| c["id"].clone())
			.collect::<Vec<_>>();

		assert_eq!(body["total"], 3);
		assert_eq!(oldest, ids);

		let body = listed("new").await.json::<Value>();
		let newest = body["items"]
			.as_array()
			.unwrap()
			.iter()
			.map(|c| c["id"].clone())
			.collect::<Vec<_>>();

		ids.reverse();

		assert_eq!(newest, ids);
	}

	#[tokio::test]
	async fn test_reactions() {
		let app = app();
		let (token, _) = register(&app, "author@react.com").await;
		let (reader, _) = register(&app, "reader@react.com").await;
		let post = create_post(&app, &token, "react to this").await;
		let x = comment(&app, &token, json!({ "post": post, "text": "some opinion" })).await;
		let x = x["id"].as_str().unwrap();

		let react = |kind: &'static str| {
			app.post(&format!("/comments/{x}/{kind}"))
				.add_header(AUTHORIZATION, bearer(&reader))
		};

		let body = react("like").await.json::<Value>();
		assert_eq!(body, json!({ "likes_count": 1, "dislikes_count": 0, "user_action": "liked" }));

		let body = react("dislike").await.json::<Value>();
		assert_eq!(body, json!({ "likes_count": 0, "dislikes_count": 1, "user_action": "disliked" }));

		let body = react("dislike").await.json::<Value>();
		assert_eq!(body, json!({ "likes_count": 0, "dislikes_count": 0, "user_action": "none" }));

		let view = app.get(&format!("/comments/{x}")).await.json::<Value>();

		assert_eq!(view["likes_count"], 0);
		assert_eq!(view["likes"], json!([]));

		let response = app
			.post(&format!("/comments/{}/like", uuid::Uuid::new_v4()))
			.add_header(AUTHORIZATION, bearer(&reader))
			.await;

		assert_eq!(response.status_code(), 404);
	}

	#[tokio::test]
	async fn test_comment_errors() {
		let app = app();
		let (token, _) = register(&app, "strict@blog.com").await;
		let (stranger, _) = register(&app, "other@blog.com").await;
		let post = create_post(&app, &token, "strict rules").await;
		let other = create_post(&app, &token, "another post").await;

		let response = app
			.post("/comments")
			.add_header(AUTHORIZATION, bearer(&token))
			.json(&json!({ "post": post, "text": "   " }))
			.await;

		assert_eq!(response.status_code(), 400);

		let response = app
			.post("/comments")
			.add_header(AUTHORIZATION, bearer(&token))
			.json(&json!({ "post": uuid::Uuid::new_v4(), "text": "lost comment" }))
			.await;

		assert_eq!(response.status_code(), 404);

		let elsewhere = comment(&app, &token, json!({ "post": other, "text": "elsewhere" })).await;

		let response = app
			.post("/comments")
			.add_header(AUTHORIZATION, bearer(&token))
			.json(&json!({ "post": post, "text": "crossed", "parent_comment": elsewhere["id"] }))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(comments_count(&app, &post).await, 0);

		let id = elsewhere["id"].as_str().unwrap();

		let response = app
			.put(&format!("/comments/{id}"))
			.add_header(AUTHORIZATION, bearer(&stranger))
			.json(&json!({ "text": "not mine" }))
			.await;

		assert_eq!(response.status_code(), 403);

		let response = app
			.delete(&format!("/comments/{id}"))
			.add_header(AUTHORIZATION, bearer(&stranger))
			.await;

		assert_eq!(response.status_code(), 403);

		let response = app
			.put(&format!("/comments/{id}"))
			.add_header(AUTHORIZATION, bearer(&token))
			.json(&json!({ "text": "edited text" }))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["text"], "edited text");
		assert_eq!(comments_count(&app, &other).await, 1);
	}
}
