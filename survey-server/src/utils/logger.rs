//! Logging Infrastructure
//!
//! Structured logging setup with support for both development and production environments
//! Features:
//! - Daily rotating application logs (deleted after 14 days)
//! - JSON format in production, pretty format in development

use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, prelude::*};

const LOG_RETENTION_DAYS: i64 = 14;

/// Clean up old application log files (older than 14 days)
///
/// Call this periodically (e.g., daily) to maintain log size
pub fn cleanup_old_logs(log_dir: &Path) -> anyhow::Result<()> {
    use chrono::{Local, TimeZone};

    let cutoff = Local::now() - chrono::Duration::days(LOG_RETENTION_DAYS);

    let app_log_dir = log_dir.join("app");
    if app_log_dir.exists() {
        // Read directory and filter old app-YYYY-MM-DD.log files
        for entry in fs::read_dir(app_log_dir)? {
            let entry = entry?;
            let path = entry.path();

            if let Some(name) = path.file_name().and_then(|n| n.to_str())
                && name.starts_with("app-")
                && name.ends_with(".log")
            {
                // Extract date from filename
                if let Some(date_part) = name
                    .strip_prefix("app-")
                    .and_then(|d| d.strip_suffix(".log"))
                    && let Ok(naive_date) =
                        chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                    && let Some(local_datetime) = Local
                        .from_local_datetime(&naive_date.and_hms_opt(0, 0, 0).unwrap())
                        .single()
                    && local_datetime < cutoff
                {
                    fs::remove_file(&path)?;
                    tracing::info!(file = %name, "Deleted old log file");
                }
            }
        }
    }

    Ok(())
}

/// Run cleanup once a day
async fn periodic_cleanup(log_dir: PathBuf) {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(24 * 60 * 60));
    loop {
        interval.tick().await;
        if let Err(e) = cleanup_old_logs(&log_dir) {
            tracing::warn!("Log cleanup failed: {}", e);
        }
    }
}

/// Initialize the logging system (console only)
pub fn init_logger(level: &str, json_format: bool) -> anyhow::Result<()> {
    init_logger_with_file(level, json_format, None)
}

/// Initialize the logging system with daily rotating logs
///
/// # Arguments
/// * `level` - Log level (e.g., "info", "debug", "warn")
/// * `json_format` - Whether to use JSON format (true for production, false for development)
/// * `log_dir` - Optional directory for file logging (e.g., Some("./work_dir/logs"))
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&str>,
) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if json_format {
        // JSON format for production
        let console_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(EnvFilter::new(level));

        if let Some(dir) = log_dir {
            let log_dir = Path::new(dir);
            let app_log_dir = log_dir.join("app");
            fs::create_dir_all(&app_log_dir)?;

            // Daily rotating appender (rotated daily, subject to 14-day cleanup)
            let app_log = RollingFileAppender::new(Rotation::DAILY, app_log_dir, "app");
            let app_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::sync::Mutex::new(app_log))
                .with_filter(EnvFilter::new(level));

            tokio::spawn(periodic_cleanup(log_dir.to_path_buf()));

            subscriber.with(console_layer).with(app_layer).init();
        } else {
            subscriber.with(console_layer).init();
        }
    } else {
        // Pretty format for development
        let console_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .with_filter(EnvFilter::new(level));

        if let Some(dir) = log_dir {
            let log_dir = Path::new(dir);
            let app_log_dir = log_dir.join("app");
            fs::create_dir_all(&app_log_dir)?;

            let app_log = RollingFileAppender::new(Rotation::DAILY, app_log_dir, "app");
            let app_layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::sync::Mutex::new(app_log))
                .with_filter(EnvFilter::new(level));

            tokio::spawn(periodic_cleanup(log_dir.to_path_buf()));

            subscriber.with(console_layer).with(app_layer).init();
        } else {
            subscriber.with(console_layer).init();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_ignores_recent_and_foreign_files() {
        let tmp = tempfile::tempdir().unwrap();
        let app_dir = tmp.path().join("app");
        fs::create_dir_all(&app_dir).unwrap();

        let today = chrono::Local::now().format("%Y-%m-%d").to_string();
        let recent = app_dir.join(format!("app-{today}.log"));
        let old = app_dir.join("app-2000-01-01.log");
        let foreign = app_dir.join("notes.txt");
        for p in [&recent, &old, &foreign] {
            fs::write(p, b"x").unwrap();
        }

        cleanup_old_logs(tmp.path()).unwrap();

        assert!(recent.exists());
        assert!(!old.exists());
        assert!(foreign.exists());
    }
}
