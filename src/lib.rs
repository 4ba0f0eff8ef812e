//! Fare Scout — batch airfare queries and group trip-cost reports.
//!
//! The crate is split into a small pure core ([`geodesy`], [`places`]) and the
//! plumbing around it: airport coordinates, trip planning, the fare provider
//! client, response persistence and the final report.

pub mod airports;
pub mod config;
pub mod fare;
pub mod geodesy;
pub mod places;
pub mod plan;
pub mod report;

pub use geodesy::{distance_in_miles, Coordinate};
pub use places::{is_same_place, resolve_city, PlaceIndex};
