//! Logging utilities and subscriber setup for lawkit.
//!
//! The engine only emits `tracing` events and spans; installing a subscriber
//! is left to the embedding application. [`setup::init_logging`] is the
//! ready-made subscriber the `lawkit` binary uses.

/// Longest field value written to logs before truncation.
pub const MAX_FIELD_LENGTH: usize = 64;

/// Truncates a string to at most `max_length` bytes, on a char boundary.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    let mut end = max_length;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &value[..end])
}

/// Subscriber configuration and installation.
pub mod setup {
    use tracing::Level;

    /// Configuration for the lawkit logging setup.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for everything outside lawkit
        pub level: Level,
        /// Log level for the lawkit crates
        pub lawkit_level: Level,
        /// Whether to write JSON lines instead of text
        pub json_format: bool,
        /// Environment filter override
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::WARN,
                lawkit_level: Level::INFO,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// Creates a configuration that only reports warnings and errors.
        pub fn quiet() -> Self {
            Self {
                level: Level::ERROR,
                lawkit_level: Level::WARN,
                ..Self::default()
            }
        }

        /// Creates a configuration for debugging analyses.
        pub fn development() -> Self {
            Self {
                level: Level::INFO,
                lawkit_level: Level::DEBUG,
                ..Self::default()
            }
        }

        /// Creates a configuration emitting JSON lines for log collectors.
        pub fn structured() -> Self {
            Self {
                json_format: true,
                ..Self::default()
            }
        }

        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        pub fn with_lawkit_level(mut self, level: Level) -> Self {
            self.lawkit_level = level;
            self
        }

        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        /// Sets a custom filter directive, replacing the level settings.
        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the filter directive string.
        pub fn env_filter(&self) -> String {
            if let Some(ref filter) = self.env_filter {
                filter.clone()
            } else {
                let lawkit = self.lawkit_level.as_str().to_lowercase();
                format!(
                    "{},lawkit_core={lawkit},lawkit={lawkit}",
                    self.level.as_str().to_lowercase()
                )
            }
        }
    }

    /// Installs a global subscriber writing to stderr.
    ///
    /// `RUST_LOG`, when set, takes precedence over the configured levels.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use lawkit_core::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::development().with_json_format(true)).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::setup::LoggingConfig;
    use super::*;
    use tracing::Level;

    #[test]
    fn test_env_filter_directives() {
        assert_eq!(
            LoggingConfig::default().env_filter(),
            "warn,lawkit_core=info,lawkit=info"
        );
        assert_eq!(
            LoggingConfig::development().env_filter(),
            "info,lawkit_core=debug,lawkit=debug"
        );
        let custom = LoggingConfig::quiet().with_env_filter("lawkit_core=trace");
        assert_eq!(custom.env_filter(), "lawkit_core=trace");
    }

    #[test]
    fn test_builders() {
        let config = LoggingConfig::structured()
            .with_level(Level::ERROR)
            .with_lawkit_level(Level::TRACE);
        assert!(config.json_format);
        assert_eq!(config.level, Level::ERROR);
        assert_eq!(config.lawkit_level, Level::TRACE);
    }

    #[test]
    fn test_truncate_field() {
        assert_eq!(truncate_field("hello", 10), "hello");
        assert_eq!(
            truncate_field("this is a very long cell value", 10),
            "this is a ...(truncated)"
        );
        // never splits a multi-byte character
        assert_eq!(truncate_field("１２３", 4), "１...(truncated)");
    }
}
