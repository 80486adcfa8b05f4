use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, time::OffsetTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Filter used when `RUST_LOG` is unset. `tower_http` reports request
/// status and latency at `debug`; gate stages stay at `info` and above.
const DEFAULT_FILTER: &str = "info,tower_http=debug";

/// Initialize logging with a daily rolling file in `logs_dir` plus console output.
///
/// Must run before the Tokio runtime starts: the local UTC offset can only be
/// determined while the process is single-threaded.
pub fn init_logging(
    logs_dir: &Path,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(logs_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("photoflash")
        .filename_suffix("log")
        .build(logs_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let timer = OffsetTime::local_rfc_3339().unwrap_or_else(|_| {
        // Fallback to UTC if local time fails (can happen in some environments)
        OffsetTime::new(
            time::UtcOffset::UTC,
            time::format_description::well_known::Rfc3339,
        )
    });

    let subscriber = tracing_subscriber::registry()
        // Audit trail: every line carries the request span, and closing a
        // request span records how long the request held it
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_timer(timer.clone())
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE),
        )
        .with(
            fmt::layer()
                .compact()
                .with_timer(timer)
                .with_target(false)
                .with_file(false)
                .with_line_number(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)));

    subscriber.init();

    tracing::info!("Logging system initialized");
    tracing::info!("Log files are being written to: {:?}", logs_dir);
    tracing::info!("Gate lines are correlated by the request_id span field (header x-request-id)");

    Ok(guard)
}

/// Log application shutdown
pub fn log_shutdown() {
    tracing::info!("=== PhotoFlash gateway shutdown complete ===");
}
