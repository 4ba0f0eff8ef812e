//! Settings file at ~/.farescout/config.json.
//!
//! Every field has a default, so a missing or partial file is fine.
//! Command-line flags override whatever is loaded here.

use crate::fare::{DEFAULT_ENDPOINT, DEFAULT_SOLUTIONS};
use crate::places::{builtin_groups, CityGroup, PlaceError, PlaceIndex};
use log::debug;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that takes precedence over the key file.
pub const API_KEY_ENV: &str = "FARESCOUT_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("no API key: set {env} or create {file}")]
    MissingApiKey { env: &'static str, file: String },
    #[error(transparent)]
    CityGroups(#[from] PlaceError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    pub api_key_file: PathBuf,
    pub solutions: u32,
    pub drive_threshold_miles: f64,
    pub drive_cost_per_mile: f64,
    pub airports_file: PathBuf,
    pub output_dir: PathBuf,
    /// Replaces the built-in city groups when present.
    pub city_groups: Option<Vec<CityGroup>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key_file: PathBuf::from("google_api_key.txt"),
            solutions: DEFAULT_SOLUTIONS,
            drive_threshold_miles: 500.0,
            drive_cost_per_mile: 0.19,
            airports_file: PathBuf::from("airports.dat"),
            output_dir: PathBuf::from("."),
            city_groups: None,
        }
    }
}

impl Config {
    /// Load from the default location. A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path())
    }

    /// Load from a specific path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read { path: path.display().to_string(), source })
            }
        };
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".farescout")
            .join("config.json")
    }

    /// The place index for this configuration.
    pub fn place_index(&self) -> Result<PlaceIndex, ConfigError> {
        match &self.city_groups {
            Some(groups) => Ok(PlaceIndex::new(groups)?),
            None => Ok(PlaceIndex::new(&builtin_groups())?),
        }
    }

    /// API key from the environment, else the first line of the key file.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        if let Ok(key) = env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                return Ok(key.trim().to_string());
            }
        }
        read_key_file(&self.api_key_file)
    }
}

fn read_key_file(path: &Path) -> Result<String, ConfigError> {
    let missing = || ConfigError::MissingApiKey {
        env: API_KEY_ENV,
        file: path.display().to_string(),
    };
    match fs::read_to_string(path) {
        Ok(data) if !data.trim().is_empty() => Ok(data.trim().to_string()),
        Ok(_) => Err(missing()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(missing()),
        Err(source) => Err(ConfigError::Read { path: path.display().to_string(), source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.solutions, 20);
        assert!((cfg.drive_threshold_miles - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"drive_cost_per_mile": 0.25, "output_dir": "results"}"#).unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert!((cfg.drive_cost_per_mile - 0.25).abs() < 1e-9);
        assert_eq!(cfg.output_dir, PathBuf::from("results"));
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_custom_city_groups() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"city_groups": [{"city": "LON", "airports": ["LHR", "LGW", "STN"]}]}"#,
        )
        .unwrap();

        let places = Config::load_from(&path).unwrap().place_index().unwrap();
        assert!(places.is_same_place("LHR", "STN"));
        assert!(!places.is_same_place("LGA", "JFK"));
    }

    #[test]
    fn test_overlapping_city_groups_rejected() {
        let cfg = Config {
            city_groups: Some(vec![
                CityGroup { city: "AAA".into(), airports: vec!["XYZ".into()] },
                CityGroup { city: "BBB".into(), airports: vec!["XYZ".into()] },
            ]),
            ..Config::default()
        };
        assert!(matches!(cfg.place_index(), Err(ConfigError::CityGroups(_))));
    }

    #[test]
    fn test_key_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key.txt");
        fs::write(&path, "  secret-key\n").unwrap();
        assert_eq!(read_key_file(&path).unwrap(), "secret-key");

        fs::write(&path, "\n").unwrap();
        assert!(matches!(read_key_file(&path), Err(ConfigError::MissingApiKey { .. })));
        assert!(matches!(
            read_key_file(&dir.path().join("none.txt")),
            Err(ConfigError::MissingApiKey { .. })
        ));
    }
}
