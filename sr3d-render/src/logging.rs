/// Logger setup for the renderer binary
use std::sync::Once;

use env_logger::WriteStyle;

/// Level used when neither `--log` nor `RUST_LOG` says otherwise
const DEFAULT_FILTER: &str = "info";

/// How the renderer's log output is filtered and colored.
///
/// `filter` takes `env_logger` directives, e.g. "debug" to see per-draw
/// statistics or "sr3d_core::raster=trace" to see skipped faces.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter: Option<String>,
    pub write_style: WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            write_style: WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    /// Config for a `--log` value given on the command line
    pub fn with_filter(filter: Option<String>) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// The directives actually applied: `--log`, then `RUST_LOG`, then info
    fn directives(&self, env: Option<String>) -> String {
        self.filter
            .clone()
            .or(env)
            .unwrap_or_else(|| DEFAULT_FILTER.to_string())
    }
}

static INIT: Once = Once::new();

/// Install the global logger. Only the first call has any effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let directives = config.directives(std::env::var("RUST_LOG").ok());
        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&directives);
        builder.write_style(config.write_style);

        // A test harness may own the logger already
        if builder.try_init().is_ok() {
            log::debug!("logging initialized with \"{}\"", directives);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_precedence() {
        let explicit = LoggingConfig::with_filter(Some("sr3d_core=trace".to_string()));
        assert_eq!(explicit.directives(Some("warn".to_string())), "sr3d_core=trace");

        let unset = LoggingConfig::default();
        assert_eq!(unset.directives(Some("warn".to_string())), "warn");
        assert_eq!(unset.directives(None), DEFAULT_FILTER);
    }

    #[test]
    fn test_repeated_init_is_harmless() {
        init_logging(LoggingConfig::default());
        init_logging(LoggingConfig::with_filter(Some("debug".to_string())));
    }
}
