//! Raw fare responses persisted as JSON files, one per route and date pair.
//!
//! Files are named `ORIG-DEST_DEPART_RETURN.json` (or `ORIG-DEST_DEPART.json`
//! for one-way searches) and hold the provider body byte for byte, so a
//! report can be rebuilt without paying for the queries again.

use super::types::{FareError, FareResponse};
use crate::plan::DatePair;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

pub struct ResponseStore {
    dir: PathBuf,
}

impl ResponseStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn file_name(origin: &str, destination: &str, dates: &DatePair) -> String {
        match dates.ret {
            Some(ret) => format!("{}-{}_{}_{}.json", origin, destination, dates.depart, ret),
            None => format!("{}-{}_{}.json", origin, destination, dates.depart),
        }
    }

    pub fn path_for(&self, origin: &str, destination: &str, dates: &DatePair) -> PathBuf {
        self.dir.join(Self::file_name(origin, destination, dates))
    }

    /// Write a raw response body. Returns the file written.
    pub fn save(
        &self,
        origin: &str,
        destination: &str,
        dates: &DatePair,
        raw: &str,
    ) -> Result<PathBuf, FareError> {
        fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;
        let path = self.path_for(origin, destination, dates);
        fs::write(&path, raw).map_err(|e| io_error(&path, e))?;
        info!("Saved {}", path.display());
        Ok(path)
    }
}

/// Read and parse one persisted response.
pub fn load(path: &Path) -> Result<FareResponse, FareError> {
    let raw = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    FareResponse::from_json(&raw).map_err(|e| match e {
        FareError::InvalidResponse(msg) => FareError::InvalidResponse(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

fn io_error(path: &Path, source: std::io::Error) -> FareError {
    FareError::Io {
        path: path.display().to_string(),
        source,
    }
}
