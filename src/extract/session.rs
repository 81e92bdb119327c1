use std::sync::Arc;

use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};

use crate::{
	error::RouteError, model::User, openapi::SECURITY_SCHEME_BEARER, route::auth, token::Keys,
	Database,
};

pub const AUTHORIZATION_PREFIX: &str = "Bearer ";

/// The authenticated user of a request.
///
/// If there is no bearer token, a [`auth::Error::MissingToken`] is returned.
/// If the token is invalid, expired or belongs to a user that no longer
/// exists, a [`auth::Error::InvalidToken`] is returned.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub user: User,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Database: FromRef<S>,
	Arc<Keys>: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let header = parts
			.headers
			.get(header::AUTHORIZATION)
			.ok_or(auth::Error::MissingToken)?;

		let token = header
			.to_str()
			.ok()
			.and_then(|value| value.strip_prefix(AUTHORIZATION_PREFIX))
			.ok_or(auth::Error::InvalidToken)?;

		let claims = Arc::<Keys>::from_ref(state).verify(token).map_err(|error| {
			tracing::debug!(%error, "rejected bearer token");
			auth::Error::InvalidToken
		})?;

		let user = Database::from_ref(state)
			.find_user(claims.sub)
			.await?
			.ok_or(auth::Error::InvalidToken)?;

		Ok(Session { user })
	}
}

impl OperationInput for Session {
	/// Adds the bearer token requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.push(
			[(SECURITY_SCHEME_BEARER.to_string(), Vec::new())]
				.into_iter()
				.collect(),
		);
	}
}
