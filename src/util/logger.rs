use crate::error::{ds_error, DeltaSurgeError};
use chrono::Local;
use log::{Level, Log, Metadata, Record};

/// Logger for benchmark runs: millisecond timestamps plus the log target,
/// so interleaved loader, scheduler, and verifier output can be told apart.
struct EngineLogger {
    max_level: Level,
}

impl Log for EngineLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    #[allow(clippy::print_stdout)]
    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        println!(
            "{} {:<5} [{}] {}",
            Local::now().format("%H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}

pub fn init_logger_with_level(level: Level) -> Result<(), DeltaSurgeError> {
    log::set_boxed_logger(Box::new(EngineLogger { max_level: level }))
        .map_err(|e| ds_error(format!("A logger is already installed: {}", e)))?;
    log::set_max_level(level.to_level_filter());
    Ok(())
}
