//! Structured logging setup.
//!
//! One `tracing-subscriber` registry with a `Targets` filter and either a
//! JSON or a pretty fmt layer. Redirect decisions are logged by the handler
//! with the correlation id as a field; access spans come from `TraceLayer`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::LogLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[must_use]
pub fn resolve_format(pretty: bool, json: bool) -> LogFormat {
    if json {
        LogFormat::Json
    } else if pretty || std::io::IsTerminal::is_terminal(&std::io::stdout()) {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    }
}

pub fn init(level: &LogLevel, format: LogFormat) {
    let tracing_level = level.to_tracing_level();
    // hickory logs every upstream query at debug
    let filter = tracing_subscriber::filter::Targets::new()
        .with_default(tracing_level)
        .with_target("hickory_proto", tracing::Level::WARN.min(tracing_level))
        .with_target("hickory_resolver", tracing::Level::WARN.min(tracing_level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(false))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}
