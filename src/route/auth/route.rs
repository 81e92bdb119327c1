use argon2::Argon2;
use axum::extract::State;
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Json, Session},
	openapi::tag,
	store::{self, NewUser, Unique},
	AppState,
};

use super::{model, Error, RouteError};

pub const KEY_LENGTH: usize = 32;

/// Hashes a password with Argon2, using the user's id as a salt.
fn hash_password(
	hasher: &Argon2,
	password: &str,
	id: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

/// Log in
/// Logs in to an account, returning a bearer token.
#[route(tag = tag::AUTH)]
pub async fn login(
	State(state): State<AppState>,
	Json(auth): Json<model::LoginInput>,
) -> Result<Json<model::AuthResponse>, RouteError> {
	let user = state
		.database
		.find_user_by_email(&auth.email)
		.await?
		.ok_or(Error::InvalidEmailOrPassword)?;

	let hashed = hash_password(&state.hasher, &auth.password, &user.id).map_err(Error::Argon)?;

	if user.password != hashed {
		return Err(Error::InvalidEmailOrPassword.into());
	}

	let token = state.keys.issue(user.id).map_err(Error::Token)?;

	tracing::info!(user = %user.id, "logged in");

	Ok(Json(model::AuthResponse { token, user }))
}

/// Register account
/// Registers a new account, returning a bearer token.
#[route(tag = tag::AUTH)]
pub async fn register(
	State(state): State<AppState>,
	Json(auth): Json<model::RegisterInput>,
) -> Result<Json<model::AuthResponse>, RouteError> {
	let user_id = Uuid::new_v4();
	let hashed = hash_password(&state.hasher, &auth.password, &user_id).map_err(Error::Argon)?;

	let user = state
		.database
		.create_user(NewUser {
			id: user_id,
			email: auth.email,
			password: hashed.to_vec(),
			full_name: auth.full_name,
			avatar_url: auth.avatar_url,
		})
		.await
		.map_err(|e| match e {
			store::Error::Duplicate(Unique::UserEmail) => Error::EmailTaken.into(),
			e => RouteError::from(e),
		})?;

	let token = state.keys.issue(user.id).map_err(Error::Token)?;

	tracing::info!(user = %user.id, "registered");

	Ok(Json(model::AuthResponse { token, user }))
}

/// Get user
/// Returns the authenticated user.
#[route(tag = tag::AUTH)]
pub async fn get_me(session: Session) -> Json<model::User> {
	Json(session.user)
}
