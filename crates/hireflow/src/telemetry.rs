use crate::config::{LogFormat, TelemetryConfig};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

/// Target the engine logs its optimistic moves, rollbacks, and stale results under.
pub const PIPELINE_TARGET: &str = "hireflow::pipeline";

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log directives '{directives}'")]
    Directives {
        directives: String,
        #[source]
        source: ParseError,
    },
    #[error("a global subscriber is already installed")]
    AlreadyInstalled(#[from] TryInitError),
}

/// Directive string built from config: the service-wide level, then the pipeline override.
pub fn directives(config: &TelemetryConfig) -> String {
    match config.pipeline_level.as_deref() {
        Some(level) => format!("{},{PIPELINE_TARGET}={level}", config.log_level),
        None => config.log_level.clone(),
    }
}

/// `RUST_LOG` replaces the configured directives entirely when set.
pub fn filter_for(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directives = directives(config);
    EnvFilter::try_new(&directives).map_err(|source| TelemetryError::Directives {
        directives,
        source,
    })
}

pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = filter_for(config)?;

    let (compact, json) = match config.format {
        LogFormat::Compact => (
            Some(fmt::layer().with_target(true).compact().with_ansi(false)),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(false),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(compact)
        .with(json)
        .try_init()?;
    Ok(())
}
