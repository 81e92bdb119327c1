use std::{fmt::Display, net::IpAddr, str::FromStr};

use tracing::Level;

/// An error raised while reading the configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0} must be set")]
	Missing(&'static str),
	#[error("invalid value for {key}: {reason}")]
	Invalid { key: &'static str, reason: String },
}

/// Limits applied to every client IP address.
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
	/// Seconds between two replenished request slots.
	pub period: u64,
	/// The number of requests a client can make before being limited.
	pub burst: u32,
}

/// Process-wide configuration, read once at start-up and passed down explicitly.
#[derive(Clone)]
pub struct Config {
	pub host: IpAddr,
	pub port: u16,
	/// When absent, the service runs against an in-memory store.
	pub database_url: Option<String>,
	/// Secret used to sign and verify bearer tokens.
	pub jwt_secret: String,
	pub token_ttl: chrono::Duration,
	pub log_level: Level,
	/// Export traces and metrics over OTLP.
	pub otlp: bool,
	/// The number of most recent posts considered when ranking tags by recency.
	pub tag_window: i64,
	pub rate_limit: RateLimit,
}

impl std::fmt::Debug for Config {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Config")
			.field("host", &self.host)
			.field("port", &self.port)
			.field("database", &self.database_url.is_some())
			.field("token_ttl", &self.token_ttl)
			.field("log_level", &self.log_level)
			.field("otlp", &self.otlp)
			.field("tag_window", &self.tag_window)
			.field("rate_limit", &self.rate_limit)
			.finish_non_exhaustive()
	}
}

impl Config {
	/// Reads the configuration from the process environment.
	///
	/// Call [`dotenvy::dotenv`] beforehand to pick up a `.env` file.
	pub fn from_env() -> Result<Self, Error> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Reads the configuration through `lookup`, which maps a key to its raw value.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
		let jwt_secret = lookup("JWT_SECRET")
			.filter(|secret| !secret.is_empty())
			.ok_or(Error::Missing("JWT_SECRET"))?;

		let token_ttl_hours = parse_or(&lookup, "TOKEN_TTL_HOURS", 720_i64)?;

		if token_ttl_hours <= 0 {
			return Err(Error::Invalid {
				key: "TOKEN_TTL_HOURS",
				reason: "must be positive".into(),
			});
		}

		let tag_window = parse_or(&lookup, "TAG_WINDOW", 5_i64)?;

		if tag_window <= 0 {
			return Err(Error::Invalid {
				key: "TAG_WINDOW",
				reason: "must be positive".into(),
			});
		}

		Ok(Self {
			host: parse_or(&lookup, "HOST", IpAddr::from([127, 0, 0, 1]))?,
			port: parse_or(&lookup, "PORT", 3000)?,
			database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
			jwt_secret,
			token_ttl: chrono::Duration::hours(token_ttl_hours),
			log_level: parse_or(&lookup, "LOG_LEVEL", Level::INFO)?,
			otlp: parse_or(&lookup, "OTLP_ENABLED", false)?,
			tag_window,
			rate_limit: RateLimit {
				period: parse_or(&lookup, "RATE_LIMIT_PERIOD", 1)?,
				burst: parse_or(&lookup, "RATE_LIMIT_BURST", 50)?,
			},
		})
	}
}

fn parse_or<T>(lookup: impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, Error>
where
	T: FromStr,
	T::Err: Display,
{
	let Some(raw) = lookup(key) else {
		return Ok(default);
	};

	raw.trim().parse().map_err(|e: T::Err| Error::Invalid {
		key,
		reason: e.to_string(),
	})
}
