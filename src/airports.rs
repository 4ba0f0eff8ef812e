//! Airport coordinate table loaded from an OpenFlights-style `airports.dat`.
//!
//! The file has no header. Columns are read by position:
//! 4 = IATA code, 6 = latitude, 7 = longitude. Anything that does not
//! have that shape is rejected with the offending line number.

use crate::geodesy::Coordinate;
use crate::places::PlaceIndex;
use log::{debug, info};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

const CODE_COLUMN: usize = 4;
const LAT_COLUMN: usize = 6;
const LON_COLUMN: usize = 7;
const MIN_COLUMNS: usize = LON_COLUMN + 1;

/// OpenFlights marks missing values with `\N`.
const MISSING: &str = "\\N";

#[derive(Debug, Error)]
pub enum AirportError {
    #[error("cannot read airport data: {0}")]
    Csv(#[from] csv::Error),
    #[error("airport data line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },
}

/// Airport code -> coordinate.
#[derive(Debug, Clone, Default)]
pub struct AirportTable {
    coords: HashMap<String, Coordinate>,
}

impl AirportTable {
    pub fn load(path: &Path) -> Result<Self, AirportError> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;
        let table = Self::from_csv(reader)?;
        info!("Loaded {} airports from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn from_reader<R: Read>(rdr: R) -> Result<Self, AirportError> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(rdr);
        Self::from_csv(reader)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, AirportError> {
        let mut coords = HashMap::new();

        for (i, record) in reader.records().enumerate() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or(i as u64 + 1);

            if record.len() < MIN_COLUMNS {
                return Err(AirportError::MalformedRow {
                    line,
                    reason: format!("expected at least {} columns, found {}", MIN_COLUMNS, record.len()),
                });
            }

            let code = record[CODE_COLUMN].trim();
            if code.is_empty() || code == MISSING {
                debug!("Skipping line {} without an IATA code", line);
                continue;
            }

            let lat = parse_degrees(&record[LAT_COLUMN], line, "latitude")?;
            let lon = parse_degrees(&record[LON_COLUMN], line, "longitude")?;
            let coord = Coordinate::new(lat, lon).map_err(|e| AirportError::MalformedRow {
                line,
                reason: e.to_string(),
            })?;

            coords.insert(code.to_uppercase(), coord);
        }

        Ok(Self { coords })
    }

    /// Build a table directly (tests, config-provided coordinates).
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Coordinate)>,
        S: AsRef<str>,
    {
        Self {
            coords: entries
                .into_iter()
                .map(|(code, c)| (code.as_ref().to_uppercase(), c))
                .collect(),
        }
    }

    pub fn get(&self, code: &str) -> Option<Coordinate> {
        self.coords.get(&code.to_uppercase()).copied()
    }

    /// Coordinate for an airport or city code. City codes use their
    /// representative airport; a code present in the table wins.
    pub fn coordinate_of(&self, code: &str, places: &PlaceIndex) -> Option<Coordinate> {
        self.get(&places.representative_airport(code))
            .or_else(|| self.get(code))
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

fn parse_degrees(raw: &str, line: u64, what: &str) -> Result<f64, AirportError> {
    raw.trim().parse::<f64>().map_err(|_| AirportError::MalformedRow {
        line,
        reason: format!("{} '{}' is not a number", what, raw),
    })
}
