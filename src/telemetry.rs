use color_eyre::Result;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Installs the error report hook and the log subscriber
///
/// Call once at the top of every binary. `debug` raises the level to DEBUG,
/// which turns on per-tick diagnostics.
pub fn setup(debug: bool) -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", if debug { "debug" } else { "info" })
    }
    setup_logging_env(if debug { Level::DEBUG } else { Level::INFO });
    Ok(())
}

fn setup_logging_env(level: Level) {
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}
