pub use crate::model::User;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Deserialize, Validate, JsonSchema)]
pub struct LoginInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 5, max = 128))]
	pub password: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct RegisterInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 5, max = 128))]
	pub password: String,
	/// The name that is displayed to the public.
	#[validate(length(min = 3, max = 64))]
	pub full_name: String,
	/// An optional link to the user's avatar.
	#[validate(url)]
	pub avatar_url: Option<String>,
}

/// A bearer token along with the user it was issued to.
#[derive(Debug, Serialize, JsonSchema)]
pub struct AuthResponse {
	/// Send as `Authorization: Bearer <token>` on authenticated routes.
	pub token: String,
	pub user: User,
}
