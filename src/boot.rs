use chrono::Local;
use log::LevelFilter;
use std::io::{self, Write};

use env_logger::{Builder, Target};

/// Environment variable naming an append-mode log file.
pub const LOG_FILE_ENV: &str = "MARAUDER_LOG_FILE";

/// Common initialization used by the binary entrypoint.
///
/// Logs go to the file named by `MARAUDER_LOG_FILE` when set, otherwise to
/// stderr at warn level so they don't interleave with console output.
/// `RUST_LOG` overrides the level either way.
pub fn init_common() {
    if let Ok(path) = std::env::var(LOG_FILE_ENV) {
        if let Err(err) = init_file_logger(&path) {
            eprintln!("Failed to initialize file logger at '{path}': {err}");
            init_stderr_logger();
        }
    } else {
        init_stderr_logger();
    }
}

fn init_stderr_logger() {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .target(Target::Stderr)
        .filter_level(LevelFilter::Warn)
        .parse_default_env();
    if builder.try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}

fn init_file_logger(path: &str) -> io::Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{}:{} {} [{}] - {}",
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(file)))
        .filter_level(LevelFilter::Debug)
        .parse_default_env();
    if builder.try_init().is_err() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "a logger is already installed",
        ));
    }

    log::info!("File logger initialized at {path}");

    Ok(())
}
