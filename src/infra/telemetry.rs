use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "brusio_timeline_pages_total",
            Unit::Count,
            "Total number of timeline pages served by the query executor."
        );
        describe_counter!(
            "brusio_feed_page_append_total",
            Unit::Count,
            "Total number of pages appended to feed cache entries."
        );
        describe_counter!(
            "brusio_feed_patch_total",
            Unit::Count,
            "Total number of in-place item patches applied to cached pages."
        );
        describe_counter!(
            "brusio_feed_patch_miss_total",
            Unit::Count,
            "Total number of patch attempts whose target was not cached."
        );
        describe_counter!(
            "brusio_feed_reconcile_total",
            Unit::Count,
            "Total number of like mutations reconciled into the cache."
        );
    });
}
