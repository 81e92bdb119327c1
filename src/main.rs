#![warn(clippy::pedantic)]

mod blog;
mod config;
mod error;
mod extract;
mod model;
mod openapi;
mod ratelimit;
mod route;
mod store;
#[cfg(test)]
mod test;
mod token;
mod trace;

use std::{net::SocketAddr, sync::Arc};

use argon2::Argon2;
use tower_governor::GovernorLayer;

use crate::{config::Config, store::Store, token::Keys};

pub type Database = Arc<dyn Store>;
pub type AppState = State;

/// The shared application state.
///
/// Handlers extract the parts they need through [`axum::extract::FromRef`],
/// such as `State<Database>`.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub keys: Arc<Keys>,
	pub config: Arc<Config>,
}

impl State {
	pub fn new(config: Config, database: Database) -> Self {
		Self {
			database,
			hasher: Argon2::default(),
			keys: Arc::new(Keys::new(config.jwt_secret.as_bytes(), config.token_ttl)),
			config: Arc::new(config),
		}
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	dotenvy::dotenv().ok();

	let config = Config::from_env()?;
	let _guard = trace::init_tracing_subscriber(&config)?;

	tracing::info!(?config, "loaded configuration");

	let database: Database = if let Some(url) = &config.database_url {
		Arc::new(store::PgStore::connect(url).await?)
	} else {
		tracing::warn!("DATABASE_URL is not set, data will not outlive the process");
		Arc::new(store::MemoryStore::default())
	};

	let governor = ratelimit::per_ip(config.rate_limit).ok_or(config::Error::Invalid {
		key: "RATE_LIMIT_PERIOD",
		reason: "period and burst must be positive".into(),
	})?;

	ratelimit::cleanup_old_limits(&[&governor]);

	let addr = SocketAddr::new(config.host, config.port);
	let app = route::app(State::new(config, database)).layer(GovernorLayer { config: governor });

	let listener = tokio::net::TcpListener::bind(addr).await?;

	tracing::info!(%addr, "listening");

	axum::serve(
		listener,
		app.into_make_service_with_connect_info::<SocketAddr>(),
	)
	.await?;

	Ok(())
}
