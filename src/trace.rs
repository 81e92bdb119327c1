use opentelemetry::{global, metrics::MetricsError, trace::TraceError, KeyValue};
use opentelemetry_sdk::{
	metrics::{
		reader::{DefaultAggregationSelector, DefaultTemporalitySelector},
		Aggregation, Instrument, MeterProviderBuilder, PeriodicReader, SdkMeterProvider, Stream,
	},
	runtime,
	trace::{BatchConfig, Sampler, Tracer},
	Resource,
};
use opentelemetry_semantic_conventions::{
	resource::{DEPLOYMENT_ENVIRONMENT, SERVICE_NAME, SERVICE_VERSION},
	SCHEMA_URL,
};
use tracing::level_filters::LevelFilter;
use tracing_opentelemetry::MetricsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("failed to build metrics exporter: {0}")]
	Metrics(#[from] MetricsError),
	#[error("failed to install tracer: {0}")]
	Trace(#[from] TraceError),
}

/// Constructs a [`Resource`] which describes the service.
fn resource() -> Resource {
	Resource::from_schema_url(
		[
			KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
			KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
			KeyValue::new(
				DEPLOYMENT_ENVIRONMENT,
				if cfg!(debug_assertions) {
					"development"
				} else {
					"production"
				},
			),
		],
		SCHEMA_URL,
	)
}

/// Constructs an [`SdkMeterProvider`] exporting over OTLP, with a view for request latency.
fn init_meter_provider() -> Result<SdkMeterProvider, MetricsError> {
	let exporter = opentelemetry_otlp::new_exporter()
		.tonic()
		.build_metrics_exporter(
			Box::new(DefaultAggregationSelector::new()),
			Box::new(DefaultTemporalitySelector::new()),
		)?;

	let reader = PeriodicReader::builder(exporter, runtime::Tokio)
		.with_interval(std::time::Duration::from_secs(5))
		.build();

	// Mirrors metrics to stdout in development
	#[cfg(debug_assertions)]
	let stdout_reader = PeriodicReader::builder(
		opentelemetry_stdout::MetricsExporter::default(),
		runtime::Tokio,
	)
	.build();

	let view_latency = |instrument: &Instrument| -> Option<Stream> {
		(instrument.name == "latency_ms").then(|| {
			Stream::new()
				.name("latency_ms")
				.aggregation(Aggregation::Default)
		})
	};

	let meter_provider = MeterProviderBuilder::default();
	#[cfg(debug_assertions)]
	let meter_provider = meter_provider.with_reader(stdout_reader);

	let meter_provider = meter_provider
		.with_resource(resource())
		.with_reader(reader)
		.with_view(view_latency)
		.build();

	global::set_meter_provider(meter_provider.clone());

	Ok(meter_provider)
}

/// Constructs a [`Tracer`] that samples every trace and exports over OTLP.
fn init_tracer() -> Result<Tracer, TraceError> {
	opentelemetry_otlp::new_pipeline()
		.tracing()
		.with_trace_config(
			opentelemetry_sdk::trace::Config::default()
				.with_sampler(Sampler::TraceIdRatioBased(1.0))
				.with_resource(resource()),
		)
		.with_batch_config(BatchConfig::default())
		.with_exporter(opentelemetry_otlp::new_exporter().tonic())
		.install_batch(runtime::Tokio)
}

/// Initializes the tracing subscriber at the configured level. When OTLP
/// export is enabled, traces and metrics are also sent to the collector.
///
/// The returned guard flushes the exporters when dropped.
pub fn init_tracing_subscriber(config: &Config) -> Result<OtelGuard, Error> {
	let meter_provider = config.otlp.then(init_meter_provider).transpose()?;
	let tracer = config.otlp.then(init_tracer).transpose()?;

	tracing_subscriber::registry()
		.with(LevelFilter::from_level(config.log_level))
		.with(tracing_subscriber::fmt::layer().with_ansi(true))
		.with(meter_provider.clone().map(MetricsLayer::new))
		.with(tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer)))
		.init();

	Ok(OtelGuard { meter_provider })
}

pub struct OtelGuard {
	meter_provider: Option<SdkMeterProvider>,
}

impl Drop for OtelGuard {
	fn drop(&mut self) {
		let Some(meter_provider) = &self.meter_provider else {
			return;
		};

		if let Err(err) = meter_provider.shutdown() {
			eprintln!("{err:?}");
		}

		global::shutdown_tracer_provider();
	}
}
