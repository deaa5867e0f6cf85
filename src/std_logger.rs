use chrono::Local;
use log::{max_level, LevelFilter, Metadata, Record, SetLoggerError};

/// Dependency targets kept at `warn` unless the gateway runs at `trace`.
const NOISY_TARGETS: [&str; 5] = ["actix", "hyper", "reqwest", "h2", "mio"];

static LOGGER: StdLogger = StdLogger;

pub struct StdLogger;

impl StdLogger {
  fn is_noisy(target: &str) -> bool {
    NOISY_TARGETS.iter().any(|prefix| target.starts_with(prefix))
  }
}

impl log::Log for StdLogger {
  fn enabled(&self, metadata: &Metadata) -> bool {
    if metadata.level() > max_level() {
      return false;
    }

    max_level() == LevelFilter::Trace
      || metadata.level() <= LevelFilter::Warn
      || !StdLogger::is_noisy(metadata.target())
  }

  fn log(&self, record: &Record) {
    if self.enabled(record.metadata()) {
      let time_str = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f");
      println!("{0} {1:<5} [{2}] {3}", time_str, record.level(), record.target(), record.args())
    }
  }

  fn flush(&self) {}
}

pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
  log::set_logger(&LOGGER)?;
  log::set_max_level(level);
  Ok(())
}
