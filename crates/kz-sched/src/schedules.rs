//! Anneal-schedule catalog.
//!
//! Device schedules are published as CSV files whose names contain the
//! device name and end in `schedule.csv`. A file matches a sampler if it
//! contains the sampler name up to the first `.` (the device family and
//! generation); it is an exact match only if it contains the full name.
//! Samplers without a matching file use the built-in fallback schedule.

use std::path::{Path, PathBuf};

use kz_physics::AnnealSchedule;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Display name of the built-in schedule.
pub const FALLBACK_SCHEDULE_NAME: &str = "FALLBACK_SCHEDULE.csv";

/// How well a schedule file fits the selected sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleMatch {
    /// File names the exact device revision.
    Exact,
    /// File belongs to another revision of the same device.
    Approximate,
    /// No file matched; the generic schedule is used.
    Fallback,
}

/// A resolved schedule with its provenance.
#[derive(Debug, Clone)]
pub struct ScheduleSelection {
    /// File name shown to the user.
    pub file_name: String,
    /// Match quality.
    pub quality: ScheduleMatch,
    /// The schedule table.
    pub schedule: AnnealSchedule,
}

impl ScheduleSelection {
    /// The built-in schedule.
    pub fn fallback() -> Self {
        Self {
            file_name: FALLBACK_SCHEDULE_NAME.to_string(),
            quality: ScheduleMatch::Fallback,
            schedule: AnnealSchedule::fallback(),
        }
    }
}

/// Directory of schedule CSV files.
#[derive(Debug, Clone)]
pub struct ScheduleCatalog {
    dir: PathBuf,
}

impl ScheduleCatalog {
    /// Catalog over `dir`. The directory need not exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Catalog directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Schedule file names in the directory, sorted.
    pub fn files(&self) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Schedule directory {:?} not readable: {}", self.dir, e);
                return vec![];
            }
        };
        let mut files: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| name.to_lowercase().contains("schedule.csv"))
            .collect();
        files.sort();
        files
    }

    /// Pick a file name for `sampler_name` among `files`.
    pub fn match_file<'a>(sampler_name: &str, files: &'a [String]) -> Option<(&'a str, ScheduleMatch)> {
        let family = sampler_name.split('.').next().unwrap_or(sampler_name);
        if family.is_empty() {
            return None;
        }
        files
            .iter()
            .find(|f| f.contains(sampler_name))
            .map(|f| (f.as_str(), ScheduleMatch::Exact))
            .or_else(|| {
                files
                    .iter()
                    .find(|f| f.contains(family))
                    .map(|f| (f.as_str(), ScheduleMatch::Approximate))
            })
    }

    /// Resolve the schedule for a sampler. Unreadable files degrade to the
    /// fallback schedule.
    pub fn resolve(&self, sampler_name: &str) -> ScheduleSelection {
        let files = self.files();
        let Some((file_name, quality)) = Self::match_file(sampler_name, &files) else {
            debug!("No schedule file for {}; using fallback", sampler_name);
            return ScheduleSelection::fallback();
        };
        match AnnealSchedule::from_csv_path(self.dir.join(file_name)) {
            Ok(schedule) => ScheduleSelection {
                file_name: file_name.to_string(),
                quality,
                schedule,
            },
            Err(e) => {
                warn!("Failed to load schedule {}: {}", file_name, e);
                ScheduleSelection::fallback()
            }
        }
    }
}
