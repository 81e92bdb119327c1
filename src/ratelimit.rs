use std::{sync::Arc, time::Duration};

use axum::{
	body::Body,
	response::{IntoResponse, Response},
};
use governor::{
	clock::QuantaInstant,
	middleware::{RateLimitingMiddleware, StateInformationMiddleware},
};
use tower_governor::{
	governor::{GovernorConfig, GovernorConfigBuilder},
	key_extractor::{KeyExtractor, PeerIpKeyExtractor},
	GovernorError,
};

use crate::{config::RateLimit, error::AppError};

pub type Config = GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Builds a per-IP limiter from the configured period and burst size.
///
/// Returns `None` when the period or burst is zero.
pub fn per_ip(limit: RateLimit) -> Option<Arc<Config>> {
	GovernorConfigBuilder::default()
		.per_second(limit.period)
		.burst_size(limit.burst)
		.use_headers()
		.error_handler(error_handler)
		.finish()
		.map(Arc::new)
}

fn error_handler(error: GovernorError) -> Response<Body> {
	AppError::from(error).into_response()
}

/// Periodically drops the state of clients that are no longer limited.
pub fn cleanup_old_limits<T, M>(configs: &[&Arc<GovernorConfig<T, M>>])
where
	T: KeyExtractor,
	<T as KeyExtractor>::Key: Send + Sync + 'static,
	M: RateLimitingMiddleware<QuantaInstant> + Send + Sync + 'static,
{
	let limiters = configs
		.iter()
		.map(|config| config.limiter().clone())
		.collect::<Vec<_>>();
	let interval = Duration::from_secs(60);

	std::thread::spawn(move || loop {
		std::thread::sleep(interval);

		for limiter in &limiters {
			tracing::debug!("rate limiting storage size: {}", limiter.len());

			limiter.retain_recent();
		}
	});
}
