use std::borrow::Cow;
use std::io::stderr;

use humantime::FormattedDuration;
use sentry::integrations::tracing::EventFilter;
use sentry::{ClientInitGuard, ClientOptions};
use tracing::{Level, Metadata};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::prelude::*;

/// Initialises Sentry and the tracing registry. Sentry stays disabled without a DSN.
pub fn init(sentry_dsn: Option<String>) -> Result<ClientInitGuard> {
    let guard = sentry::init((
        sentry_dsn,
        ClientOptions {
            release: Some(Cow::Borrowed(env!("CARGO_PKG_VERSION"))),
            ..Default::default()
        },
    ));

    let sentry_layer = sentry::integrations::tracing::layer()
        .event_filter(sentry_event_filter)
        .span_filter(|metadata| metadata.level() <= &Level::DEBUG)
        .with_filter(env_filter("LINREG_SENTRY_LOG", "linreg=trace")?);

    // Standard output is reserved for the regression formula.
    let format_layer = tracing_subscriber::fmt::layer()
        .without_time()
        .with_writer(stderr)
        .with_filter(env_filter("LINREG_LOG", "linreg=info")?);

    tracing_subscriber::Registry::default()
        .with(sentry_layer)
        .with(format_layer)
        .init();

    Ok(guard)
}

/// Warnings and errors become Sentry events, the rest are breadcrumbs.
fn sentry_event_filter(metadata: &Metadata) -> EventFilter {
    if metadata.level() <= &Level::WARN {
        EventFilter::Event
    } else {
        EventFilter::Breadcrumb
    }
}

fn env_filter(variable: &str, default: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_env(variable)
        .or_else(|_| EnvFilter::try_new(default))
        .with_context(|| format!("invalid `{}` filter", variable))
}

pub fn format_elapsed(instant: Instant) -> FormattedDuration {
    humantime::format_duration(instant.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_filter_default_ok() -> Result {
        let filter = env_filter("LINREG_TEST_UNSET_LOG", "linreg=debug")?;
        assert_eq!(filter.to_string(), "linreg=debug");
        Ok(())
    }
}
