//! Tracing subscriber setup shared by every binary in the workspace.

use crate::settings::{get_or, parse_or, ConfigError, Lookup, Threshold, TimeUnit};
use std::str::FromStr;
use tracing::Span;
use tracing_subscriber::{fmt, EnvFilter};

/// Output format for log lines (`LOG_FORMAT`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Full,
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" | "text" => Ok(LogFormat::Full),
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!(
                "unknown log format '{}', expected full, compact, pretty or json",
                other
            )),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Service name recorded on the root span (`LOG_NAME`)
    pub name: String,
    /// Default filter directive (`LOG_LEVEL`)
    pub level: String,
    pub format: LogFormat,
    /// Minimum gap between request logs on keep-alive connections
    pub threshold: Threshold,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            name: "backend".to_string(),
            level: "debug".to_string(),
            format: LogFormat::Full,
            threshold: Threshold::new(TimeUnit::Minutes, 1),
        }
    }
}

impl LogConfig {
    pub fn from_lookup(lookup: &impl Lookup) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let level = get_or(lookup, "LOG_LEVEL", &defaults.level).to_ascii_lowercase();
        if !matches!(
            level.as_str(),
            "trace" | "debug" | "info" | "warn" | "warning" | "error" | "critical"
        ) {
            return Err(ConfigError::invalid(
                "LOG_LEVEL",
                &level,
                "expected trace, debug, info, warn or error",
            ));
        }
        let level = match level.as_str() {
            "warning" => "warn".to_string(),
            "critical" => "error".to_string(),
            _ => level,
        };

        Ok(Self {
            name: get_or(lookup, "LOG_NAME", &defaults.name),
            level,
            format: parse_or(lookup, "LOG_FORMAT", defaults.format)?,
            threshold: Threshold::from_lookup(lookup, "LOG_THRESHOLD", defaults.threshold)?,
        })
    }
}

/// Installs the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `LOG_LEVEL` when both are set.
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let builder = fmt().with_env_filter(filter).with_target(true);

    let result = match config.format {
        LogFormat::Json => builder
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Full => builder.try_init(),
    };

    if result.is_ok() {
        tracing::debug!(
            name = %config.name,
            level = %config.level,
            format = ?config.format,
            "Logging initialized"
        );
    }
}

/// Root span for a server process, recording `LOG_NAME`
pub fn server_span(config: &LogConfig) -> Span {
    tracing::info_span!("server", name = %config.name)
}

/// Per-request span carrying the service name alongside method and URI
pub fn request_span(service: &str, method: &str, uri: &str) -> Span {
    tracing::info_span!("request", service = %service, method = %method, uri = %uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> fmt::MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    impl Capture {
        fn output(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn captured(f: impl FnOnce()) -> String {
        let capture = Capture::default();
        let subscriber = fmt()
            .with_writer(capture.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        capture.output()
    }

    #[test]
    fn test_defaults() {
        let config = LogConfig::from_lookup(&|_: &str| None).unwrap();
        assert_eq!(config.name, "backend");
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Full);
        assert_eq!(config.threshold.as_duration(), chrono::Duration::minutes(1));
    }

    #[test]
    fn test_level_aliases() {
        let vars = HashMap::from([
            ("LOG_LEVEL".to_string(), "WARNING".to_string()),
            ("LOG_FORMAT".to_string(), "JSON".to_string()),
        ]);
        let config = LogConfig::from_lookup(&|k: &str| vars.get(k).cloned()).unwrap();
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_server_span_records_log_name() {
        let vars = HashMap::from([("LOG_NAME".to_string(), "orders".to_string())]);
        let config = LogConfig::from_lookup(&|k: &str| vars.get(k).cloned()).unwrap();

        let output = captured(|| {
            let _guard = server_span(&config).entered();
            tracing::info!("listening");
        });

        assert!(output.contains("server{name=orders}"), "{}", output);
        assert!(output.contains("listening"));
    }

    #[test]
    fn test_request_span_records_service() {
        let output = captured(|| {
            let _guard = request_span("orders", "GET", "/v1/todos").entered();
            tracing::info!("handled");
        });

        assert!(output.contains("service=orders"), "{}", output);
        assert!(output.contains("uri=/v1/todos"));
    }

    #[test]
    fn test_rejects_unknown_level() {
        let vars = HashMap::from([("LOG_LEVEL".to_string(), "loud".to_string())]);
        assert!(LogConfig::from_lookup(&|k: &str| vars.get(k).cloned()).is_err());
    }
}
