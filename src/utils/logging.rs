// Logging bootstrap.
//
// Wraps flexi_logger initialization and shutdown so async log output is
// flushed before process exit.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use parking_lot::Mutex;

use crate::config::Config;

/// Global logger handle kept for the final flush.
static LOGGER_HANDLE: Mutex<Option<LoggerHandle>> = Mutex::new(None);

/// Initialize the logging system from the application config.
///
/// Logs go to a size-rotated file under `config.log.dir` with asynchronous
/// writes; at most `config.log.max_files` rotated files are kept.
pub fn init(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let handle = Logger::try_with_str(&config.log.level)?
        .log_to_file(
            FileSpec::default()
                .basename(&config.log.file)
                .directory(&config.log.dir),
        )
        .rotate(
            Criterion::Size(config.log.max_file_size),
            Naming::Numbers,
            Cleanup::KeepLogFiles(config.log.max_files),
        )
        .write_mode(WriteMode::Async)
        .append()
        .start()?;

    *LOGGER_HANDLE.lock() = Some(handle);

    log::info!("logging initialized: {}/{}", config.log.dir, config.log.file);
    Ok(())
}

/// Flush and shut down the logging system. Blocks until the async writer
/// thread has drained.
pub fn shutdown() {
    let mut guard = LOGGER_HANDLE.lock();
    if let Some(handle) = guard.take() {
        handle.flush();
    }
}

pub fn is_initialized() -> bool {
    LOGGER_HANDLE.lock().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_and_shutdown() {
        let dir = tempfile::tempdir().expect("create temp log dir");
        let mut config = Config::default();
        config.log.dir = dir.path().to_string_lossy().into_owned();

        let result = init(&config);
        assert!(result.is_ok(), "logging init failed: {:?}", result.err());
        assert!(is_initialized());

        log::info!("test log line");

        shutdown();
        assert!(!is_initialized());
    }
}
