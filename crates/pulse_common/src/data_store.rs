//! In-memory snapshot of the four review tables.
//!
//! Built once at startup and shared by reference; there is no mutating API.

use crate::error::PulseError;
use crate::pulse_config::DataConfig;
use crate::types::{compare_versions, PersistenceFlag, PriorityItem, Review, VersionSignal};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct DataStore {
    reviews: Vec<Review>,
    priority: Vec<PriorityItem>,
    persistence: Vec<PersistenceFlag>,
    version_signal: Vec<VersionSignal>,
}

impl DataStore {
    pub fn new(
        reviews: Vec<Review>,
        priority: Vec<PriorityItem>,
        persistence: Vec<PersistenceFlag>,
        version_signal: Vec<VersionSignal>,
    ) -> Self {
        Self {
            reviews,
            priority,
            persistence,
            version_signal,
        }
    }

    /// Load all tables from `dir`.
    ///
    /// Reviews and the backlog are required. Persistence and version-signal
    /// tables are optional and load as empty when their file is absent.
    pub fn load(dir: &Path, files: &DataConfig) -> Result<Self, PulseError> {
        let reviews = read_reviews(&dir.join(&files.reviews_file))?;
        let priority = read_table::<PriorityItem>(&dir.join(&files.priority_file))?;
        let persistence = read_optional_table::<PersistenceFlag>(&dir.join(&files.persistence_file))?;
        let version_signal =
            read_optional_table::<VersionSignal>(&dir.join(&files.version_signal_file))?;

        info!(
            reviews = reviews.len(),
            backlog = priority.len(),
            persistence = persistence.len(),
            version_signal = version_signal.len(),
            dir = %dir.display(),
            "loaded review tables"
        );

        Ok(Self::new(reviews, priority, persistence, version_signal))
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    pub fn priority(&self) -> &[PriorityItem] {
        &self.priority
    }

    pub fn persistence(&self) -> &[PersistenceFlag] {
        &self.persistence
    }

    pub fn version_signal(&self) -> &[VersionSignal] {
        &self.version_signal
    }

    /// Distinct theme labels in order of first appearance
    pub fn review_themes(&self) -> Vec<&str> {
        distinct(self.reviews.iter().filter_map(Review::theme))
    }

    /// Distinct app versions with reviews, oldest first
    pub fn review_versions(&self) -> Vec<&str> {
        let mut versions = distinct(self.reviews.iter().filter_map(Review::version));
        versions.sort_by(|a, b| compare_versions(a, b));
        versions
    }

    pub fn latest_review_version(&self) -> Option<&str> {
        self.reviews
            .iter()
            .filter_map(Review::version)
            .max_by(|a, b| compare_versions(a, b))
    }

    pub fn latest_signal_version(&self) -> Option<&str> {
        self.version_signal
            .iter()
            .map(|s| s.app_version.as_str())
            .max_by(|a, b| compare_versions(a, b))
    }

    /// Reviews for one release
    pub fn reviews_for_version<'a>(&'a self, version: &'a str) -> impl Iterator<Item = &'a Review> + 'a {
        self.reviews
            .iter()
            .filter(move |r| r.version() == Some(version))
    }

    /// Whether the persistence table flags `theme`
    pub fn is_persistent(&self, theme: &str) -> bool {
        self.persistence
            .iter()
            .find(|p| p.theme == theme)
            .map(|p| p.is_persistent)
            .unwrap_or(false)
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    values.filter(|v| seen.insert(*v)).collect()
}

/// Review columns a row cannot be scored without
const REQUIRED_REVIEW_CELLS: [&str; 2] = ["score", "final_weight"];

fn load_error(path: &Path, reason: String) -> PulseError {
    PulseError::DataLoad {
        path: path.display().to_string(),
        reason,
    }
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>, PulseError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(|e| load_error(path, e.to_string()))
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, PulseError> {
    let mut reader = open_reader(path)?;
    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<T>().enumerate() {
        // Header is line 1, so data row N sits on line N + 2
        let row = record.map_err(|e| load_error(path, format!("row {}: {}", index + 2, e)))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Like `read_table`, but rows with a blank score or weight are skipped
/// with a warning instead of failing the load.
fn read_reviews(path: &Path) -> Result<Vec<Review>, PulseError> {
    let mut reader = open_reader(path)?;
    let headers = reader
        .headers()
        .map_err(|e| load_error(path, e.to_string()))?
        .clone();
    let required: Vec<usize> = REQUIRED_REVIEW_CELLS
        .iter()
        .filter_map(|name| headers.iter().position(|h| h == *name))
        .collect();

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for (index, record) in reader.records().enumerate() {
        let line = index + 2;
        let record = record.map_err(|e| load_error(path, format!("row {}: {}", line, e)))?;
        let blank = required
            .iter()
            .any(|&i| record.get(i).map_or(true, |cell| cell.trim().is_empty()));
        if blank {
            debug!(row = line, "review row has a blank score or weight, skipping");
            skipped += 1;
            continue;
        }
        let row = record
            .deserialize::<Review>(Some(&headers))
            .map_err(|e| load_error(path, format!("row {}: {}", line, e)))?;
        rows.push(row);
    }

    if skipped > 0 {
        warn!(path = %path.display(), skipped, "skipped review rows with blank score or weight");
    }
    Ok(rows)
}

fn read_optional_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, PulseError> {
    if !path.exists() {
        warn!(path = %path.display(), "optional table missing, using an empty table");
        return Ok(Vec::new());
    }
    read_table(path)
}
