use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

/// Metric names emitted by the cache gateway, the memory store and export workers.
pub mod names {
    pub const CACHE_HIT: &str = "carte_cache_hit_total";
    pub const CACHE_MISS: &str = "carte_cache_miss_total";
    pub const CACHE_ERROR: &str = "carte_cache_error_total";
    pub const CACHE_EVICT: &str = "carte_cache_evict_total";
    pub const CACHE_INVALIDATE_MS: &str = "carte_cache_invalidate_ms";
    pub const EXPORT_JOBS: &str = "carte_export_jobs_total";
}

enum MetricKind {
    Counter,
    Histogram,
}

const METRICS: &[(&str, MetricKind, &str)] = &[
    (
        names::CACHE_HIT,
        MetricKind::Counter,
        "Catalog reads answered from the cache, by key kind.",
    ),
    (
        names::CACHE_MISS,
        MetricKind::Counter,
        "Catalog reads that fell through to the store, by key kind.",
    ),
    (
        names::CACHE_ERROR,
        MetricKind::Counter,
        "Cache backend failures, by operation.",
    ),
    (
        names::CACHE_EVICT,
        MetricKind::Counter,
        "Entries evicted from the memory cache due to capacity.",
    ),
    (
        names::CACHE_INVALIDATE_MS,
        MetricKind::Histogram,
        "Time spent applying an invalidation plan before a write.",
    ),
    (
        names::EXPORT_JOBS,
        MetricKind::Counter,
        "Finished export jobs, by outcome.",
    ),
];

/// Per-query sqlx logs drown out catalog events at `info`.
const QUIET_DIRECTIVES: &[&str] = &["sqlx::query=warn"];

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install the global subscriber: env filter, span traces for errors, and the
/// configured output format.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let mut env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();
    for directive in QUIET_DIRECTIVES {
        let directive = directive
            .parse()
            .map_err(|err| InfraError::telemetry(format!("bad directive `{directive}`: {err}")))?;
        env_filter = env_filter.add_directive(directive);
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(output_layer(logging.format))
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn output_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
{
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    }
}

/// Register descriptions with whatever metrics recorder is installed. Runs once.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        for (name, kind, description) in METRICS {
            match kind {
                MetricKind::Counter => describe_counter!(*name, Unit::Count, *description),
                MetricKind::Histogram => {
                    describe_histogram!(*name, Unit::Milliseconds, *description)
                }
            }
        }
    });
}
