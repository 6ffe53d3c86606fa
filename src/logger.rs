/*
 * Console Logger
 *
 * Minimal `log` backend for host runs: every record goes to stderr as
 * "LEVEL - message". Demo binaries pick the level from their -v flags.
 */

use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};
use std::io::Write;

struct SimpleLogger;

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            // One locked write per record keeps lines from different harts intact.
            let mut err = std::io::stderr().lock();
            let _ = writeln!(err, "{} - {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: SimpleLogger = SimpleLogger;

/// Install the console logger, showing records up to `level`
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}

/// Map a `-v` count onto a level: 0 is Info, 1 Debug, 2 or more Trace
pub fn level_from_verbosity(verbosity: usize) -> LevelFilter {
    match verbosity {
        0 => Level::Info.to_level_filter(),
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_from_verbosity(0), LevelFilter::Info);
        assert_eq!(level_from_verbosity(1), LevelFilter::Debug);
        assert_eq!(level_from_verbosity(5), LevelFilter::Trace);
    }
}
