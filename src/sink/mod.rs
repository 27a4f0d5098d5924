//! Append-only observation log.

use std::path::{Path, PathBuf};

use tokio::{fs, io::AsyncWriteExt};

use crate::errors::MonitorError;
use crate::models::PoolObservation;

/// NDJSON file receiving one line per observation.
///
/// The file is opened in append mode for every record and closed right after,
/// so external tools may rotate it between writes. The monitor never reads it.
#[derive(Debug, Clone)]
pub struct ObservationLog {
    path: PathBuf,
}

impl ObservationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, observation: &PoolObservation) -> Result<(), MonitorError> {
        let mut line = observation
            .to_json_line()
            .map_err(|e| MonitorError::Sink(e.into()))?;
        line.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}
