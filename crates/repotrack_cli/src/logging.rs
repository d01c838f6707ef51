//! Log sinks.
//!
//! Everything at the filtered level goes to `app.log`; warnings and errors are
//! also written to `error.log`. When stdout is not a terminal (CI, pipes,
//! `watch` under a service manager) the same events go to stderr too, since
//! progress bars are not drawn there.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

const DEFAULT_FILTER: &str = "repotrack=info,repotrack_cli=info";
pub(crate) const APP_LOG: &str = "app.log";
pub(crate) const ERROR_LOG: &str = "error.log";

#[derive(Debug, thiserror::Error)]
pub(crate) enum LoggingError {
    #[error("cannot create log directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("cannot open log file {}: {source}", path.display())]
    OpenFile { path: PathBuf, source: io::Error },
    #[error("cannot install log subscriber: {0}")]
    Init(String),
}

fn open_append(path: &Path) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::OpenFile {
            path: path.to_path_buf(),
            source,
        })
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the default filter. Without a log directory only the
/// stderr sink is installed (and only when stdout is not a terminal).
pub(crate) fn init(log_dir: Option<&Path>, interactive: bool) -> Result<(), LoggingError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let (app_layer, error_layer) = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
            let app = open_append(&dir.join(APP_LOG))?;
            let errors = open_append(&dir.join(ERROR_LOG))?;

            (
                Some(
                    fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(app)),
                ),
                Some(
                    fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(errors))
                        .with_filter(LevelFilter::WARN),
                ),
            )
        }
        None => (None, None),
    };

    let stderr_layer = (!interactive).then(|| fmt::layer().with_writer(io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(app_layer)
        .with(error_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))
}
