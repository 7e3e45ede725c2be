//! FFI logging backend that routes logs to the host app via callback
//!
//! A `log` backend that forwards records to a UniFFI callback so inbox logs
//! show up in the platform logger (os_log on Apple, Logcat on Android).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, RwLock};

use log::{Level, Log, Metadata, Record, SetLoggerError};

use super::types::{FfiLogLevel, LogCallback};

static FFI_LOGGER: OnceLock<FfiLogger> = OnceLock::new();

/// Set once the FFI logger holds the global logger slot
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Logger that forwards to a callback when one is set
struct FfiLogger {
    callback: RwLock<Option<Arc<dyn LogCallback>>>,
    max_level: RwLock<Level>,
}

impl FfiLogger {
    fn new(max_level: Level) -> Self {
        Self {
            callback: RwLock::new(None),
            max_level: RwLock::new(max_level),
        }
    }

    fn set_callback(&self, callback: Option<Arc<dyn LogCallback>>) {
        if let Ok(mut guard) = self.callback.write() {
            *guard = callback;
        }
    }

    fn set_max_level(&self, level: Level) {
        if let Ok(mut guard) = self.max_level.write() {
            *guard = level;
        }
    }

    fn max_level(&self) -> Level {
        self.max_level.read().map(|l| *l).unwrap_or(Level::Info)
    }
}

impl Log for FfiLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level()
            && self.callback.read().is_ok_and(|cb| cb.is_some())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        if let Ok(guard) = self.callback.read()
            && let Some(callback) = guard.as_ref()
        {
            callback.on_log(
                FfiLogLevel::from(record.level()),
                record.target().to_string(),
                record.args().to_string(),
            );
        }
    }

    fn flush(&self) {}
}

fn is_installed() -> bool {
    INSTALLED.load(Ordering::Acquire)
}

/// Install the FFI logger as the global logger
///
/// Fails if another logger (e.g. env_logger in the console) is already set.
/// Records are dropped until a callback is registered.
pub fn init_ffi_logger(max_level: Level) -> Result<(), SetLoggerError> {
    let logger = FFI_LOGGER.get_or_init(|| FfiLogger::new(max_level));
    log::set_logger(logger)?;
    INSTALLED.store(true, Ordering::Release);
    log::set_max_level(max_level.to_level_filter());
    Ok(())
}

/// Set or clear the callback receiving log records
pub fn set_log_callback(callback: Option<Arc<dyn LogCallback>>) {
    if let Some(logger) = FFI_LOGGER.get() {
        logger.set_callback(callback);
    }
}

/// Update the maximum level forwarded to the callback
///
/// The global `log` filter is only changed while the FFI logger is the
/// installed logger.
pub fn set_log_level(level: Level) {
    if let Some(logger) = FFI_LOGGER.get() {
        logger.set_max_level(level);
        if is_installed() {
            log::set_max_level(level.to_level_filter());
        }
    }
}

/// Route inbox logs to `callback`
///
/// Later calls swap the callback and level. Returns false if a different
/// global logger was installed first.
#[uniffi::export]
pub fn initialize_logging(callback: Box<dyn LogCallback>, max_level: FfiLogLevel) -> bool {
    let level = Level::from(max_level);
    let installed = init_ffi_logger(level).is_ok() || is_installed();

    set_log_callback(Some(Arc::from(callback)));
    set_log_level(level);
    installed
}

/// Change the level of an initialized FFI logger
#[uniffi::export]
pub fn set_logging_level(max_level: FfiLogLevel) {
    set_log_level(Level::from(max_level));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const TARGET: &str = "inbox::ffi::logging::tests";

    struct Collector(Arc<Mutex<Vec<String>>>);

    impl LogCallback for Collector {
        fn on_log(&self, _level: FfiLogLevel, target: String, message: String) {
            if target == TARGET {
                self.0.lock().unwrap().push(message);
            }
        }
    }

    #[test]
    fn test_forwards_records_at_the_configured_level() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        assert!(initialize_logging(Box::new(Collector(seen.clone())), FfiLogLevel::Info));

        log::debug!(target: TARGET, "hidden");
        log::info!(target: TARGET, "loaded 3 threads");

        set_logging_level(FfiLogLevel::Debug);
        assert_eq!(log::max_level(), log::LevelFilter::Debug);
        log::debug!(target: TARGET, "merged 2 replies");

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["loaded 3 threads".to_string(), "merged 2 replies".to_string()]
        );
    }
}
