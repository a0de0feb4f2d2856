//! Logging configuration
//!
//! Describes where log output goes and how much of it is kept. The subscriber
//! itself is installed by the application, this only carries the settings and
//! the file housekeeping.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

const LOG_FILE_PREFIX: &str = "bandsense_";
const LOG_FILE_SUFFIX: &str = ".log";

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level name (`trace`, `debug`, `info`, `warn`, `error`)
    pub level: String,
    /// Write to stderr
    pub console_output: bool,
    /// Write to a file in `log_directory`
    pub file_output: bool,
    /// Directory for log files
    pub log_directory: PathBuf,
    /// Number of log files to keep
    pub max_log_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            log_directory: default_log_directory(),
            max_log_files: 10,
        }
    }
}

fn default_log_directory() -> PathBuf {
    dirs::data_local_dir()
        .map(|mut p| {
            p.push("BandSense");
            p.push("logs");
            p
        })
        .unwrap_or_else(|| PathBuf::from("logs"))
}

impl LogConfig {
    /// Parse `level`, defaulting to INFO when unrecognised
    pub fn parse_level(&self) -> LevelFilter {
        match self.level.to_ascii_lowercase().as_str() {
            "trace" => LevelFilter::TRACE,
            "debug" => LevelFilter::DEBUG,
            "info" => LevelFilter::INFO,
            "warn" | "warning" => LevelFilter::WARN,
            "error" => LevelFilter::ERROR,
            "off" => LevelFilter::OFF,
            _ => LevelFilter::INFO,
        }
    }

    /// Create the log directory if needed
    pub fn ensure_log_directory(&self) -> io::Result<()> {
        fs::create_dir_all(&self.log_directory)
    }

    /// Path of today's log file
    pub fn current_log_path(&self) -> PathBuf {
        let name = format!(
            "{}{}{}",
            LOG_FILE_PREFIX,
            Local::now().format("%Y-%m-%d"),
            LOG_FILE_SUFFIX
        );
        self.log_directory.join(name)
    }

    /// Delete the oldest log files so at most `max_log_files` remain.
    ///
    /// Returns the number of files removed.
    pub fn cleanup_old_logs(&self) -> io::Result<usize> {
        if !self.log_directory.exists() {
            return Ok(0);
        }

        let mut logs: Vec<(std::time::SystemTime, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&self.log_directory)? {
            let entry = entry?;
            let path = entry.path();
            let is_log = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(LOG_FILE_PREFIX) && n.ends_with(LOG_FILE_SUFFIX))
                .unwrap_or(false);
            if !is_log || !path.is_file() {
                continue;
            }
            let modified = entry
                .metadata()?
                .modified()
                .unwrap_or(std::time::UNIX_EPOCH);
            logs.push((modified, path));
        }

        if logs.len() <= self.max_log_files {
            return Ok(0);
        }

        // Newest first; names sort by date as a tie breaker
        logs.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

        let mut removed = 0;
        for (_, path) in logs.into_iter().skip(self.max_log_files) {
            fs::remove_file(&path)?;
            removed += 1;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        let mut config = LogConfig::default();
        assert_eq!(config.parse_level(), LevelFilter::INFO);
        config.level = "DEBUG".to_string();
        assert_eq!(config.parse_level(), LevelFilter::DEBUG);
        config.level = "nonsense".to_string();
        assert_eq!(config.parse_level(), LevelFilter::INFO);
    }

    #[test]
    fn test_current_log_path_in_directory() {
        let config = LogConfig {
            log_directory: PathBuf::from("/tmp/bandsense-logs"),
            ..Default::default()
        };
        let path = config.current_log_path();
        assert!(path.starts_with("/tmp/bandsense-logs"));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(LOG_FILE_PREFIX));
        assert!(name.ends_with(LOG_FILE_SUFFIX));
    }

    #[test]
    fn test_cleanup_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            log_directory: dir.path().join("logs"),
            max_log_files: 2,
            ..Default::default()
        };
        config.ensure_log_directory().unwrap();

        for day in 1..=4 {
            let name = format!("bandsense_2024-01-0{}.log", day);
            fs::write(config.log_directory.join(name), "x").unwrap();
        }
        fs::write(config.log_directory.join("unrelated.txt"), "keep").unwrap();

        let removed = config.cleanup_old_logs().unwrap();
        assert_eq!(removed, 2);
        assert!(config.log_directory.join("unrelated.txt").exists());

        let remaining = fs::read_dir(&config.log_directory)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".log"))
            .count();
        assert_eq!(remaining, 2);
    }

    #[test]
    fn test_cleanup_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            log_directory: dir.path().join("does-not-exist"),
            ..Default::default()
        };
        assert_eq!(config.cleanup_old_logs().unwrap(), 0);
    }
}
