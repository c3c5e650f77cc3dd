use crate::config::AppConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Log file for one process, e.g. `bank2.interbank.log`.
pub fn log_file_name(config: &AppConfig, component: &str) -> String {
    format!("{}.{}", component, config.log_file)
}

fn file_appender(config: &AppConfig, file_name: &str) -> RollingFileAppender {
    match config.rotation.as_str() {
        "hourly" => tracing_appender::rolling::hourly(&config.log_dir, file_name),
        "daily" => tracing_appender::rolling::daily(&config.log_dir, file_name),
        _ => tracing_appender::rolling::never(&config.log_dir, file_name),
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `log_level`.
///
/// Keep the returned guard alive for the life of the process, dropping it
/// flushes the file writer.
pub fn init_logging(config: &AppConfig, component: &str) -> WorkerGuard {
    let file_name = log_file_name(config, component);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender(config, &file_name));

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if config.use_json {
        let file_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_writer(non_blocking)
            .with_ansi(false);
        registry.with(file_layer).init();
    } else {
        let file_layer = fmt::layer()
            .with_target(false)
            .with_writer(non_blocking)
            .with_ansi(false);
        let stdout_layer = fmt::layer().with_target(false).with_ansi(true);
        registry.with(file_layer).with(stdout_layer).init();
    }

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_name_per_component() {
        let config = AppConfig::default();
        assert_eq!(log_file_name(&config, "gateway"), "gateway.interbank.log");
        assert_eq!(log_file_name(&config, "bank3"), "bank3.interbank.log");
    }
}
