use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::{self, Write};

static STDERR_LOGGER: StderrLogger = StderrLogger;

/// Routes driver log records to standard error.
///
/// Filtering is left to [`log::max_level`], so the logger itself is stateless
/// and can live in a `static`.
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut err = io::stderr().lock();
        let _ = match record.line() {
            Some(line) => writeln!(
                err,
                "{:>5} {}:{line} {}",
                record.level(),
                record.target(),
                record.args()
            ),
            None => writeln!(err, "{:>5} {} {}", record.level(), record.target(), record.args()),
        };
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Install the stderr logger with `level` as the global ceiling.
///
/// # Errors
/// If some other logger was installed first.
pub fn install(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&STDERR_LOGGER)?;
    log::set_max_level(level);
    Ok(())
}
