//! Logging setup

use std::path::Path;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "booking_cloud=info,booking_engine=info,tower_http=info";

/// Stdout logging, or daily-rolling files when `log_dir` exists.
///
/// The returned guard flushes the file writer and must live as long as the
/// process.
pub fn init(log_dir: Option<&str>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir
        && Path::new(dir).is_dir()
    {
        let appender = tracing_appender::rolling::daily(dir, "booking-cloud");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        subscriber.with_ansi(false).with_writer(writer).init();
        return Some(guard);
    }

    subscriber.init();
    None
}
