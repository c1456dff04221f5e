use anyhow::Result;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

pub fn level_filter(log_level: &str) -> log::LevelFilter {
    match log_level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    }
}

/// Installs the global logger: colored console output plus a timestamped
/// file in `log_dir`. Returns the path of the new log file.
pub fn setup_logging(log_dir: &Path, log_level: &str) -> Result<PathBuf> {
    if !log_dir.exists() {
        fs::create_dir_all(log_dir)?;
    }

    // Earlier runs' logs go; the file created below is the only one left.
    cleanup_old_logs(log_dir)?;

    let log_file_name = format!("nsc_mapper_{}.log", chrono::Local::now().format("%Y-%m-%d_%H-%M-%S"));
    let log_path = log_dir.join(log_file_name);

    let console = fern::Dispatch::new()
        .format(|out, message, record| {
            let level = match record.level() {
                log::Level::Error => record.level().as_str().bright_red(),
                log::Level::Warn => record.level().as_str().bright_yellow(),
                log::Level::Info => record.level().as_str().bright_green(),
                log::Level::Debug => record.level().as_str().bright_white(),
                log::Level::Trace => record.level().as_str().bright_cyan(),
            };
            out.finish(format_args!(
                "{}[{}] {}",
                chrono::Local::now().format("[%Y-%m-%d %H:%M:%S]").to_string().as_str().truecolor(128, 128, 128),
                level,
                message
            ))
        })
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d %H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .chain(fern::log_file(&log_path)?);

    fern::Dispatch::new()
        .level(level_filter(log_level))
        // reqwest/hyper internals are noise at debug and below.
        .level_for("hyper_util", log::LevelFilter::Info)
        .level_for("reqwest", log::LevelFilter::Info)
        .chain(console)
        .chain(file)
        .apply()?;

    Ok(log_path)
}

fn cleanup_old_logs(log_dir: &Path) -> Result<()> {
    let old_logs = fs::read_dir(log_dir)?
        .filter_map(|res| res.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().map_or(false, |ext| ext == "log"));

    for path in old_logs {
        if let Err(e) = fs::remove_file(&path) {
            eprintln!("Failed to delete old log file {:?}: {}", path, e);
        }
    }

    Ok(())
}
