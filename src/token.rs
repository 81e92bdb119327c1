use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The claims carried by a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
	/// The user the token was issued to.
	pub sub: Uuid,
	pub iat: i64,
	pub exp: i64,
}

/// Signs and verifies HS256 bearer tokens.
pub struct Keys {
	encoding: EncodingKey,
	decoding: DecodingKey,
	validation: Validation,
	ttl: chrono::Duration,
}

impl Keys {
	pub fn new(secret: &[u8], ttl: chrono::Duration) -> Self {
		Self {
			encoding: EncodingKey::from_secret(secret),
			decoding: DecodingKey::from_secret(secret),
			validation: Validation::new(Algorithm::HS256),
			ttl,
		}
	}

	/// Issues a token for `user_id` that expires after the configured lifetime.
	pub fn issue(&self, user_id: Uuid) -> Result<String, jsonwebtoken::errors::Error> {
		let now = Utc::now();
		let claims = Claims {
			sub: user_id,
			iat: now.timestamp(),
			exp: (now + self.ttl).timestamp(),
		};

		jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
	}

	/// Checks the signature and expiry of a token, returning its claims.
	pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
		jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_issue_and_verify() {
		let keys = Keys::new(b"secret", chrono::Duration::hours(1));
		let user = Uuid::new_v4();

		let token = keys.issue(user).unwrap();
		let claims = keys.verify(&token).unwrap();

		assert_eq!(claims.sub, user);
		assert!(claims.exp > claims.iat);
	}

	#[test]
	fn test_reject_foreign_and_expired() {
		let keys = Keys::new(b"secret", chrono::Duration::hours(1));
		let other = Keys::new(b"another secret", chrono::Duration::hours(1));
		let expired = Keys::new(b"secret", chrono::Duration::hours(-1));

		let user = Uuid::new_v4();

		assert!(keys.verify(&other.issue(user).unwrap()).is_err());
		assert!(keys.verify(&expired.issue(user).unwrap()).is_err());
		assert!(keys.verify("not a token").is_err());
	}
}
