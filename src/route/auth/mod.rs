use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid email or password")]
	InvalidEmailOrPassword,
	#[error("password validation error")]
	Argon(#[from] argon2::Error),
	#[error("token error")]
	Token(#[from] jsonwebtoken::errors::Error),
	#[error("no bearer token")]
	MissingToken,
	#[error("invalid bearer token")]
	InvalidToken,
	#[error("email already taken")]
	EmailTaken,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/login", post_with(login, login_docs))
		.api_route("/register", post_with(register, register_docs))
		.api_route("/me", get_with(get_me, get_me_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidEmailOrPassword | Self::MissingToken | Self::InvalidToken => {
				StatusCode::UNAUTHORIZED
			}
			Self::Argon(..) | Self::Token(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::EmailTaken => StatusCode::CONFLICT,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		let message = match self {
			Self::InvalidEmailOrPassword => "invalid_email_or_password",
			Self::Argon(..) | Self::Token(..) => "internal_error",
			Self::MissingToken => "missing_token",
			Self::InvalidToken => "invalid_token",
			Self::EmailTaken => return vec![error::Message::new("email_taken").field("email")],
		};

		vec![error::Message::new(message)]
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_signup_flow() {
		let app = app();

		let response = app
			.post("/auth/register")
			.json(&json!({
				"email": "john@smith.com",
				"password": "hunter2hunter",
				"full_name": "John Smith",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		let body = response.json::<Value>();

		assert!(body["token"].as_str().is_some_and(|token| !token.is_empty()));
		assert_eq!(body["user"]["full_name"], "John Smith");
		assert!(body["user"].get("email").is_none());
		assert!(body["user"].get("password").is_none());

		let response = app
			.post("/auth/login")
			.json(&json!({
				"email": "john@smith.com",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		let token = response.json::<Value>()["token"]
			.as_str()
			.unwrap()
			.to_owned();

		let response = app
			.get("/auth/me")
			.add_header(AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["full_name"], "John Smith");
	}

	#[tokio::test]
	async fn test_auth_failures() {
		let app = app();

		register(&app, "jane@smith.com").await;

		let response = app
			.post("/auth/register")
			.json(&json!({
				"email": "jane@smith.com",
				"password": "another password",
				"full_name": "Jane Again",
			}))
			.await;

		assert_eq!(response.status_code(), 409);

		let response = app
			.post("/auth/login")
			.json(&json!({
				"email": "jane@smith.com",
				"password": "wrong password",
			}))
			.await;

		assert_eq!(response.status_code(), 401);

		assert_eq!(app.get("/auth/me").await.status_code(), 401);

		let response = app
			.get("/auth/me")
			.add_header(AUTHORIZATION, bearer("not.a.token"))
			.await;

		assert_eq!(response.status_code(), 401);
		assert_eq!(response.json::<Value>()["errors"][0]["content"], "invalid_token");
	}
}
