//! Append-only CSV log of redirection sessions
//!
//! One file per logger, named after the local time it was opened at. Each
//! normally ended session appends `name,duration,rotation` with `.` decimals.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDateTime};

use crate::error::UsageLogError;
use crate::redirect::SessionStats;

/// Column names written once at the top of a new file
pub const CSV_HEADER: [&str; 3] = ["RotatorID", "Rotation Duration", "Added up Rotation Degree"];

/// File name prefix, followed by `MM-dd-yyyy_HH-mm`
pub const FILE_PREFIX: &str = "SpaceExtenderLogging";

/// Log file name for a logger opened at `at`
pub fn log_file_name(at: NaiveDateTime) -> String {
    format!("{FILE_PREFIX}{}.csv", at.format("%m-%d-%Y_%H-%M"))
}

pub struct UsageLogger {
    path: Option<PathBuf>,
    writer: Mutex<Option<csv::Writer<File>>>,
}

impl fmt::Debug for UsageLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsageLogger")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .finish()
    }
}

impl UsageLogger {
    /// Open (or continue) the log file for the current minute in `dir`
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, UsageLogError> {
        Self::open_at(dir, Local::now().naive_local())
    }

    /// Open the log file named after `at`
    pub fn open_at(dir: impl AsRef<Path>, at: NaiveDateTime) -> Result<Self, UsageLogError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(log_file_name(at));

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let is_new = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer.write_record(CSV_HEADER)?;
            writer.flush()?;
        }

        log::info!("Logging redirection sessions to {}", path.display());
        Ok(Self {
            path: Some(path),
            writer: Mutex::new(Some(writer)),
        })
    }

    /// Logger that accepts sessions and writes nothing
    pub fn disabled() -> Self {
        Self {
            path: None,
            writer: Mutex::new(None),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.writer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Append one session row
    pub fn log(&self, name: &str, stats: &SessionStats) -> Result<(), UsageLogError> {
        let mut guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let Some(writer) = guard.as_mut() else {
            return Ok(());
        };
        writer.write_record([
            name.to_string(),
            stats.duration_secs.to_string(),
            stats.total_real_rotation_deg.to_string(),
        ])?;
        writer.flush()?;
        Ok(())
    }

    /// Flush and stop writing; later sessions are dropped
    pub fn close(&self) -> Result<(), UsageLogError> {
        let mut guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(mut writer) = guard.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

/// Holds the one logger of a process; a second install is refused
#[derive(Debug, Clone, Default)]
pub struct LoggerSlot {
    logger: Option<Arc<UsageLogger>>,
}

impl LoggerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&mut self, logger: Arc<UsageLogger>) -> Result<(), UsageLogError> {
        if let Some(existing) = &self.logger {
            let err = UsageLogError::AlreadyInstalled {
                existing: existing.path().map(Path::to_path_buf).unwrap_or_default(),
                rejected: logger.path().map(Path::to_path_buf).unwrap_or_default(),
            };
            log::error!("{err}");
            return Err(err);
        }
        self.logger = Some(logger);
        Ok(())
    }

    pub fn get(&self) -> Option<&Arc<UsageLogger>> {
        self.logger.as_ref()
    }

    pub fn take(&mut self) -> Option<Arc<UsageLogger>> {
        self.logger.take()
    }

    /// Log a finished session; failures are reported and swallowed
    pub fn log_session(&self, name: &str, stats: &SessionStats) {
        let Some(logger) = &self.logger else {
            return;
        };
        if let Err(e) = logger.log(name, stats) {
            log::error!("Failed to log session of {name}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .and_then(|d| d.and_hms_opt(14, 5, 30))
            .unwrap()
    }

    fn stats(duration_secs: f32, total_real_rotation_deg: f32) -> SessionStats {
        SessionStats {
            duration_secs,
            total_real_rotation_deg,
        }
    }

    #[test]
    fn test_file_name_uses_month_first() {
        assert_eq!(log_file_name(at()), "SpaceExtenderLogging03-07-2024_14-05.csv");
    }

    #[test]
    fn test_two_sessions_append_two_rows() {
        let dir = TempDir::new().unwrap();
        let logger = UsageLogger::open_at(dir.path(), at()).unwrap();
        logger.log("rotator", &stats(1.5, 90.25)).unwrap();
        logger.log("curve", &stats(2.0, 12.5)).unwrap();

        let path = logger.path().unwrap().to_path_buf();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "RotatorID,Rotation Duration,Added up Rotation Degree",
                "rotator,1.5,90.25",
                "curve,2,12.5",
            ]
        );
    }

    #[test]
    fn test_reopening_same_minute_keeps_single_header() {
        let dir = TempDir::new().unwrap();
        {
            let logger = UsageLogger::open_at(dir.path(), at()).unwrap();
            logger.log("a", &stats(1.0, 1.0)).unwrap();
        }
        let logger = UsageLogger::open_at(dir.path(), at()).unwrap();
        logger.log("b", &stats(0.5, 2.0)).unwrap();

        let content = fs::read_to_string(logger.path().unwrap()).unwrap();
        assert_eq!(content.matches("RotatorID").count(), 1);
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_closed_logger_drops_sessions() {
        let dir = TempDir::new().unwrap();
        let logger = UsageLogger::open_at(dir.path(), at()).unwrap();
        logger.close().unwrap();
        assert!(!logger.is_open());
        logger.log("late", &stats(1.0, 1.0)).unwrap();

        let content = fs::read_to_string(logger.path().unwrap()).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_second_install_is_rejected() {
        let dir = TempDir::new().unwrap();
        let first = Arc::new(UsageLogger::open_at(dir.path(), at()).unwrap());
        let mut slot = LoggerSlot::new();
        slot.install(first.clone()).unwrap();

        let err = slot.install(Arc::new(UsageLogger::disabled())).unwrap_err();
        assert!(matches!(err, UsageLogError::AlreadyInstalled { .. }));
        assert!(Arc::ptr_eq(slot.get().unwrap(), &first));

        slot.log_session("kept", &stats(3.0, 4.0));
        let content = fs::read_to_string(first.path().unwrap()).unwrap();
        assert!(content.contains("kept,3,4"));
    }

    #[test]
    fn test_empty_slot_ignores_sessions() {
        let slot = LoggerSlot::new();
        slot.log_session("nobody", &stats(1.0, 1.0));
        assert!(slot.get().is_none());
    }
}
