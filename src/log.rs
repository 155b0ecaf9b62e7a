//! Logging for cost model runs.
//!
//! Progress messages from building and running an analysis are printed to the terminal, with
//! warnings and errors on stderr. For `bevcost run` they are also kept next to the result tables,
//! in `bevcost_info.log` and `bevcost_error.log`. The level comes from `settings.toml` unless the
//! `BEVCOST_LOG_LEVEL` environment variable is set.
use anyhow::{Context, Result, bail};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};
use std::env;
use std::fmt::{Arguments, Display};
use std::fs::{File, OpenOptions};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::OnceLock;

/// Set once the global logger is installed
static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// Log level used when neither the settings file nor the environment chooses one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable which takes precedence over the settings file
const LOG_LEVEL_ENV_VAR: &str = "BEVCOST_LOG_LEVEL";

/// Log of analysis progress, written alongside the results
const LOG_INFO_FILE_NAME: &str = "bevcost_info.log";

/// Log of input warnings and errors, written alongside the results
const LOG_ERROR_FILE_NAME: &str = "bevcost_error.log";

/// Whether [`init`] has already installed the logger
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Convert a log level name (case-insensitive) into a [`LevelFilter`]
fn parse_log_level(log_level: &str) -> Result<LevelFilter> {
    let level = match log_level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {unknown}"),
    };

    Ok(level)
}

/// Pick the log level name: environment first, then settings, then [`DEFAULT_LOG_LEVEL`]
fn choose_log_level(from_env: Option<String>, from_settings: Option<&str>) -> String {
    from_env.unwrap_or_else(|| from_settings.unwrap_or(DEFAULT_LOG_LEVEL).to_string())
}

/// Create (or truncate) one of the run's log files in `output_dir`
fn open_log_file(output_dir: &Path, file_name: &str) -> Result<File> {
    let file_path = output_dir.join(file_name);
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&file_path)
        .with_context(|| format!("Could not create log file {}", file_path.display()))
}

/// Install the global logger.
///
/// Level names are `off`, `error`, `warn`, `info`, `debug` and `trace`.
///
/// # Arguments
///
/// * `log_level_from_settings`: The `log_level` entry of `settings.toml`, if any
/// * `output_dir`: Where the results of a run are written. If given, the log files go here too.
pub fn init(log_level_from_settings: Option<&str>, output_dir: Option<&Path>) -> Result<()> {
    let log_level = choose_log_level(env::var(LOG_LEVEL_ENV_VAR).ok(), log_level_from_settings);
    let log_level = parse_log_level(&log_level)?;

    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);

    // Piped output stays plain
    let colour_stdout = std::io::stdout().is_terminal();
    let colour_stderr = std::io::stderr().is_terminal();

    let progress = Dispatch::new()
        .filter(|metadata| metadata.level() > LevelFilter::Warn)
        .format(move |out, message, record| {
            write_log_colour(out, message, record, colour_stdout, &colours);
        })
        .level(log_level)
        .chain(std::io::stdout());
    let problems = Dispatch::new()
        .format(move |out, message, record| {
            write_log_colour(out, message, record, colour_stderr, &colours);
        })
        .level(log_level.min(LevelFilter::Warn))
        .chain(std::io::stderr());
    let mut dispatch = Dispatch::new().chain(progress).chain(problems);

    if let Some(output_dir) = output_dir {
        // The files always record at least info and warnings, whatever the terminal shows
        let progress_file = Dispatch::new()
            .filter(|metadata| metadata.level() > LevelFilter::Warn)
            .format(write_log_plain)
            .level(log_level.max(LevelFilter::Info))
            .chain(open_log_file(output_dir, LOG_INFO_FILE_NAME)?);
        let problems_file = Dispatch::new()
            .format(write_log_plain)
            .level(LevelFilter::Warn)
            .chain(open_log_file(output_dir, LOG_ERROR_FILE_NAME)?);
        dispatch = dispatch.chain(progress_file).chain(problems_file);
    }

    dispatch.apply().context("Logger already initialised")?;
    LOGGER_INIT.get_or_init(|| ());

    Ok(())
}

/// Format one log line as `[time level module] message`
fn write_log<T: Display>(out: FormatCallback, level: T, target: &str, message: &Arguments) {
    let timestamp = Local::now().format("%H:%M:%S");

    out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
}

fn write_log_plain(out: FormatCallback, message: &Arguments, record: &Record) {
    write_log(out, record.level(), record.target(), message);
}

fn write_log_colour(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    use_colour: bool,
    colours: &ColoredLevelConfig,
) {
    if use_colour {
        write_log(out, colours.color(record.level()), record.target(), message);
    } else {
        write_log_plain(out, message, record);
    }
}
