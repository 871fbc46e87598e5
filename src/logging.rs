/// Logging configuration.
///
/// Logs go to `{data_dir}/logs/doorwatch.log` and to stderr. Each run
/// appends to the log file after a separator line.
use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Path of the log file inside `data_dir`.
pub fn log_file_path(data_dir: &Path) -> PathBuf {
    data_dir.join("logs").join("doorwatch.log")
}

/// Initializes logging for one run of `command`.
///
/// # Arguments
///
/// * `data_dir` - Data directory; logs are written under `logs/`
/// * `command` - Name of the command being run, for the session separator
pub fn init_logging(data_dir: &Path, command: &str) -> Result<()> {
    let log_dir = data_dir.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    // Write session separator before the appender opens the file
    let separator = format!(
        "\n{sep}\n[{ts}] New {command} session\n{sep}\n",
        sep = "=".repeat(80),
        ts = chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        command = command
    );
    use std::io::Write;
    if let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path(data_dir))
    {
        let _ = writeln!(file, "{}", separator);
    }

    let file_appender = tracing_appender::rolling::never(&log_dir, "doorwatch.log");

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false);

    // Default to INFO level, but allow override via RUST_LOG env var
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .ok(); // Ignore error if already initialized

    tracing::debug!(command, "Logging initialized");

    Ok(())
}
