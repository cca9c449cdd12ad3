//! Structured logging setup

use livepub_core::{LogLevel, PublishError};
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber
#[derive(Debug, Default)]
pub struct DebugLogger;

impl DebugLogger {
    /// Filter for the given level; `RUST_LOG` takes precedence when set
    pub fn filter_for(level: LogLevel) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_directive()))
    }

    /// Initialize logging system.
    ///
    /// Fails when a global subscriber is already installed.
    pub fn init_logging(level: LogLevel) -> Result<(), PublishError> {
        tracing_subscriber::fmt()
            .with_env_filter(Self::filter_for(level))
            .with_target(false)
            .try_init()
            .map_err(|e| PublishError::Initialization {
                reason: format!("Failed to install tracing subscriber: {}", e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let _ = DebugLogger::init_logging(LogLevel::Warn);
        let err = DebugLogger::init_logging(LogLevel::Trace).unwrap_err();
        assert!(matches!(err, PublishError::Initialization { .. }));
    }
}
