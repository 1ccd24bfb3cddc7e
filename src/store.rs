use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::geojson::FeatureCollection;
use crate::week::IsoWeek;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no predictions for week {week}")]
    NotFound { week: IsoWeek },
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not a valid prediction collection", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to list prediction directory {}", path.display())]
    Listing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read-only access to the weekly prediction exports, one
/// `<YYYY-Www>.geojson` file per week under a single directory.
#[derive(Debug, Clone)]
pub struct PredictionStore {
    root: PathBuf,
}

impl PredictionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, week: IsoWeek) -> PathBuf {
        self.root.join(week.file_name())
    }

    pub async fn load_week(&self, week: IsoWeek) -> Result<FeatureCollection, StoreError> {
        let (path, raw) = self.read_week(week).await?;
        serde_json::from_slice(&raw).map_err(|source| StoreError::Parse { path, source })
    }

    /// The export as plain JSON, without interpreting any of it.
    pub async fn load_week_raw(&self, week: IsoWeek) -> Result<Value, StoreError> {
        let (path, raw) = self.read_week(week).await?;
        serde_json::from_slice(&raw).map_err(|source| StoreError::Parse { path, source })
    }

    async fn read_week(&self, week: IsoWeek) -> Result<(PathBuf, Vec<u8>), StoreError> {
        let path = self.path_for(week);

        match tokio::fs::read(&path).await {
            Ok(raw) => Ok((path, raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound { week }),
            Err(source) => Err(StoreError::Read { path, source }),
        }
    }

    /// Weeks with an export on disk, oldest first.
    ///
    /// Files that are not named after an ISO week are ignored, and a missing
    /// directory simply means nothing has been exported yet.
    pub async fn available_weeks(&self) -> Result<Vec<IsoWeek>, StoreError> {
        let listing_err = |source: std::io::Error| StoreError::Listing {
            path: self.root.clone(),
            source,
        };

        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(listing_err(e)),
        };

        let mut weeks = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(listing_err)? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("geojson") {
                continue;
            }
            let week = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<IsoWeek>().ok());
            if let Some(week) = week {
                weeks.push(week);
            }
        }

        weeks.sort();
        Ok(weeks)
    }
}
