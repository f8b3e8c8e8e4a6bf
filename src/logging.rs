//=========================================================================
// Logging
//
// One-shot `env_logger` installation for host programs.
//
// Runtime modules log through the `log` facade with a per-subsystem
// target, so output can be filtered by area:
//
//   RUST_LOG=runtime=debug,display=info,resource=trace
//
// Targets: `runtime`, `display`, `input`, `resource`, `platform`.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::sync::Once;

//=== External Crates =====================================================

use log::LevelFilter;

//=== LoggingConfig =======================================================

/// Logger configuration.
///
/// `filter` uses `env_logger` syntax ("info", "runtime=debug,input=warn").
/// When unset, `RUST_LOG` is read; without either, the level is `Info`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl LoggingConfig {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

static INIT: Once = Once::new();

/// Installs the global logger. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match config.filter.or_else(|| std::env::var("RUST_LOG").ok()) {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => {
                builder.filter_level(LevelFilter::Info);
            }
        }

        builder.write_style(config.write_style);

        // Another logger may already be installed (test harness, host).
        if builder.try_init().is_err() {
            return;
        }

        log::debug!(target: "runtime", "Logging initialized");
    });
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reads_environment() {
        let config = LoggingConfig::default();
        assert!(config.filter.is_none());
    }

    #[test]
    fn repeated_init_is_ignored() {
        init_logging(LoggingConfig::default().with_filter("warn"));
        init_logging(LoggingConfig::default().with_filter("trace"));

        log::info!(target: "runtime", "still alive");
    }
}
