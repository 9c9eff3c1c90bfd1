#![forbid(unsafe_code)]

//! Logging initialisation via tracing-subscriber.
//!
//! The console owns the terminal, so logs never go to stdout or stderr.
//! They are written to the file named by `VCON_LOG_FILE`; without it no
//! subscriber is installed and every event is discarded.
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `VCON_LOG_FILE` | log file path (appended) |
//! | `VCON_LOG` | `EnvFilter` directives, default `info` |
//! | `VCON_LOG_JSON` | `1`/`true` for JSON lines |

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::Error;

/// Default filter when `VCON_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Where and how to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Log file; `None` disables logging.
    pub file: Option<PathBuf>,
    /// `EnvFilter` directives.
    pub filter: String,
    /// Emit JSON lines instead of text.
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            file: None,
            filter: DEFAULT_FILTER.into(),
            json: false,
        }
    }
}

impl LogSettings {
    /// Read settings from the `VCON_LOG*` variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::with_env(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup` instead of the process environment.
    #[must_use]
    pub fn with_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let file = lookup("VCON_LOG_FILE")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        let filter = lookup("VCON_LOG")
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.into());
        let json = lookup("VCON_LOG_JSON").is_some_and(|v| {
            matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        });
        Self { file, filter, json }
    }
}

/// Install the global subscriber from the environment.
///
/// Returns `Ok(false)` when `VCON_LOG_FILE` is unset.
///
/// # Errors
///
/// [`Error::Logging`] if the filter is invalid, the file cannot be opened
/// or a subscriber is already installed.
pub fn init() -> Result<bool, Error> {
    init_with(&LogSettings::from_env())
}

/// Install the global subscriber from explicit settings.
///
/// # Errors
///
/// As [`init`].
pub fn init_with(settings: &LogSettings) -> Result<bool, Error> {
    let Some(path) = &settings.file else {
        return Ok(false);
    };
    let filter = EnvFilter::try_new(&settings.filter)
        .map_err(|e| Error::Logging(format!("invalid filter '{}': {e}", settings.filter)))?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            Error::Logging(format!(
                "failed to open log file '{}': {e}",
                path.display()
            ))
        })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_thread_names(true);
    let installed = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| Error::Logging(format!("failed to set subscriber: {e}")))?;

    tracing::info!(path = %path.display(), json = settings.json, "logging initialised");
    Ok(true)
}
