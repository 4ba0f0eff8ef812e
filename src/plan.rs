//! Trip planning: traveller groups, date pairs and the drive-or-fly call.
//!
//! The same [`TravelPolicy::decide`] runs when queries are issued and when
//! the report is built, so both phases agree on which legs are driven.

use crate::airports::AirportTable;
use crate::geodesy::distance_in_miles;
use crate::places::PlaceIndex;
use chrono::NaiveDate;
use log::warn;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("empty location in list '{0}'")]
    EmptyLocation(String),
    #[error("invalid headcount '{count}' for {code}")]
    InvalidHeadcount { code: String, count: String },
    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),
    #[error("no usable date pairs: every return date is before every departure date")]
    NoDatePairs,
}

/// One origin or destination with the number of people attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyMember {
    pub code: String,
    pub headcount: u32,
}

/// Ordered list of locations parsed from `"PHL:3,ORD:2,NYC"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Party {
    pub members: Vec<PartyMember>,
}

impl Party {
    /// Parse a comma-separated list of codes, each with an optional
    /// `:count` suffix (default 1). A repeated code keeps its first
    /// position and takes the later count.
    pub fn parse(s: &str) -> Result<Self, PlanError> {
        let mut members: Vec<PartyMember> = Vec::new();

        for token in s.trim().split(',') {
            let token = token.trim();
            let (code, count) = match token.split_once(':') {
                Some((code, count)) => (code.trim(), Some(count.trim())),
                None => (token, None),
            };
            if code.is_empty() {
                return Err(PlanError::EmptyLocation(s.to_string()));
            }
            let code = code.to_uppercase();

            let headcount = match count {
                Some(c) => match c.parse::<u32>() {
                    Ok(n) if n > 0 => n,
                    _ => {
                        return Err(PlanError::InvalidHeadcount {
                            code,
                            count: c.to_string(),
                        })
                    }
                },
                None => 1,
            };

            match members.iter_mut().find(|m| m.code == code) {
                Some(existing) => existing.headcount = headcount,
                None => members.push(PartyMember { code, headcount }),
            }
        }

        Ok(Self { members })
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.code.as_str())
    }
}

/// Outbound date and optional return date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatePair {
    pub depart: NaiveDate,
    pub ret: Option<NaiveDate>,
}

impl DatePair {
    pub fn new(depart: NaiveDate, ret: Option<NaiveDate>) -> Self {
        Self { depart, ret }
    }

    /// Every departure combined with every return on or after it.
    pub fn combine(departs: &[NaiveDate], returns: &[NaiveDate]) -> Result<Vec<Self>, PlanError> {
        if returns.is_empty() {
            return Ok(departs.iter().map(|d| Self::new(*d, None)).collect());
        }

        let pairs: Vec<Self> = departs
            .iter()
            .flat_map(|d| {
                returns
                    .iter()
                    .filter(move |r| *r >= d)
                    .map(move |r| Self::new(*d, Some(*r)))
            })
            .collect();

        if pairs.is_empty() {
            return Err(PlanError::NoDatePairs);
        }
        Ok(pairs)
    }
}

impl fmt::Display for DatePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ret {
            Some(r) => write!(f, "{} {}", self.depart, r),
            None => write!(f, "{}", self.depart),
        }
    }
}

/// Parse a comma-separated list of `YYYY-MM-DD` dates.
pub fn parse_dates(s: &str) -> Result<Vec<NaiveDate>, PlanError> {
    s.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").map_err(|_| PlanError::InvalidDate(d.to_string())))
        .collect()
}

/// How one origin reaches one destination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TravelMode {
    Drive { round_trip_miles: f64, cost: f64 },
    Fly,
}

/// Settings for the drive-or-fly decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelPolicy {
    /// One-way distance below which people drive. `None` disables driving.
    pub drive_threshold_miles: Option<f64>,
    pub drive_cost_per_mile: f64,
}

impl Default for TravelPolicy {
    fn default() -> Self {
        Self {
            drive_threshold_miles: Some(500.0),
            drive_cost_per_mile: 0.19,
        }
    }
}

impl TravelPolicy {
    /// Drive when the one-way distance is known and under the threshold.
    /// Unknown coordinates and coincident points both fall back to flying.
    pub fn decide(
        &self,
        origin: &str,
        destination: &str,
        airports: &AirportTable,
        places: &PlaceIndex,
    ) -> TravelMode {
        let Some(threshold) = self.drive_threshold_miles else {
            return TravelMode::Fly;
        };

        let (Some(from), Some(to)) = (
            airports.coordinate_of(origin, places),
            airports.coordinate_of(destination, places),
        ) else {
            warn!("No coordinates for {} or {}; assuming a flight", origin, destination);
            return TravelMode::Fly;
        };

        match distance_in_miles(from, to) {
            Some(dist) if dist < threshold => TravelMode::Drive {
                round_trip_miles: dist * 2.0,
                cost: self.drive_cost_per_mile * dist * 2.0,
            },
            Some(_) => TravelMode::Fly,
            None => {
                warn!("Distance {} to {} is undefined; assuming a flight", origin, destination);
                TravelMode::Fly
            }
        }
    }
}

/// One origin/destination/date combination to price.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedTrip {
    pub origin: String,
    pub destination: String,
    pub dates: DatePair,
    pub mode: TravelMode,
}

/// The full batch of trips for a query run.
#[derive(Debug, Clone, Default)]
pub struct TripPlan {
    pub trips: Vec<PlannedTrip>,
}

impl TripPlan {
    /// Cartesian product of origins, destinations and date pairs.
    ///
    /// Codes are resolved to their city first; same-place pairs and
    /// repeats after resolution are dropped.
    pub fn build(
        origins: &Party,
        destinations: &Party,
        dates: &[DatePair],
        policy: &TravelPolicy,
        airports: &AirportTable,
        places: &PlaceIndex,
    ) -> Self {
        let mut seen = HashSet::new();
        let mut trips = Vec::new();

        for origin in origins.codes() {
            let origin = places.resolve_city(origin);
            for destination in destinations.codes() {
                let destination = places.resolve_city(destination);
                if places.is_same_place(&origin, &destination) {
                    continue;
                }
                if !seen.insert((origin.clone(), destination.clone())) {
                    continue;
                }

                let mode = policy.decide(&origin, &destination, airports, places);
                for d in dates {
                    trips.push(PlannedTrip {
                        origin: origin.clone(),
                        destination: destination.clone(),
                        dates: *d,
                        mode,
                    });
                }
            }
        }

        Self { trips }
    }

    pub fn flights(&self) -> impl Iterator<Item = &PlannedTrip> {
        self.trips.iter().filter(|t| t.mode == TravelMode::Fly)
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }
}
