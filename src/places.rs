//! Airport and city-code equivalence.
//!
//! Some IATA codes name a metropolitan area rather than a single airport
//! (NYC covers LGA, JFK, EWR and HPN). [`PlaceIndex`] answers whether two
//! codes overlap physically. All lookups uppercase their input.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

/// Built-in city groups: city code and the airports it covers.
pub const BUILTIN_CITY_GROUPS: &[(&str, &[&str])] = &[
    ("CHI", &["ORD", "MDW", "RFD"]),
    ("NYC", &["LGA", "JFK", "EWR", "HPN"]),
    ("DFW", &["DFW", "DAL"]),
    ("DTT", &["DTW", "DET", "YIP"]),
    ("YEA", &["YEG"]),
    ("HOU", &["IAH", "HOU"]),
    ("QMI", &["MIA", "FLL", "PBI"]),
    ("WAS", &["IAD", "DCA", "BWI"]),
];

/// One city and its member airports, in preference order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityGroup {
    pub city: String,
    pub airports: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaceError {
    #[error("airport {airport} is listed under both {first} and {second}")]
    DuplicateAirport {
        airport: String,
        first: String,
        second: String,
    },
    #[error("city {0} is defined more than once")]
    DuplicateCity(String),
}

/// City groups plus the derived airport -> city reverse index.
#[derive(Debug, Clone)]
pub struct PlaceIndex {
    airports_in_city: HashMap<String, Vec<String>>,
    city_of_airport: HashMap<String, String>,
}

impl PlaceIndex {
    /// Build the index from a group table.
    ///
    /// Every airport may belong to at most one city.
    pub fn new(groups: &[CityGroup]) -> Result<Self, PlaceError> {
        let mut airports_in_city = HashMap::new();
        let mut city_of_airport: HashMap<String, String> = HashMap::new();

        for group in groups {
            let city = group.city.to_uppercase();
            let airports: Vec<String> = group.airports.iter().map(|a| a.to_uppercase()).collect();

            for airport in &airports {
                if let Some(first) = city_of_airport.get(airport) {
                    if *first != city {
                        return Err(PlaceError::DuplicateAirport {
                            airport: airport.clone(),
                            first: first.clone(),
                            second: city,
                        });
                    }
                }
                city_of_airport.insert(airport.clone(), city.clone());
            }

            if airports_in_city.insert(city.clone(), airports).is_some() {
                return Err(PlaceError::DuplicateCity(city));
            }
        }

        Ok(Self { airports_in_city, city_of_airport })
    }

    /// The built-in group table. The table is a constant with disjoint
    /// groups, so building it cannot fail.
    pub fn builtin() -> Self {
        Self::new(&builtin_groups()).expect("built-in city groups are disjoint")
    }

    /// City owning `code`, or `code` itself when it is not a grouped airport.
    pub fn resolve_city(&self, code: &str) -> String {
        let code = code.to_uppercase();
        match self.city_of_airport.get(&code) {
            Some(city) => city.clone(),
            None => code,
        }
    }

    /// Airports covered by `code` after city resolution.
    fn airport_set(&self, code: &str) -> Vec<String> {
        let city = self.resolve_city(code);
        match self.airports_in_city.get(&city) {
            Some(airports) => airports.clone(),
            None => vec![city],
        }
    }

    /// Whether two codes denote overlapping physical locations.
    pub fn is_same_place(&self, a: &str, b: &str) -> bool {
        let (a, b) = (a.to_uppercase(), b.to_uppercase());
        if a == b {
            return true;
        }

        let set_a = self.airport_set(&a);
        let set_b = self.airport_set(&b);
        set_a.iter().any(|x| set_b.contains(x)) || set_b.iter().any(|x| set_a.contains(x))
    }

    /// A concrete airport for `code`: the first member of its city group,
    /// or the code itself. Used to pick coordinates for city codes.
    pub fn representative_airport(&self, code: &str) -> String {
        let code = code.to_uppercase();
        self.airports_in_city
            .get(&code)
            .and_then(|airports| airports.first().cloned())
            .unwrap_or(code)
    }
}

/// The built-in table as owned groups (for config files and tests).
pub fn builtin_groups() -> Vec<CityGroup> {
    BUILTIN_CITY_GROUPS
        .iter()
        .map(|(city, airports)| CityGroup {
            city: city.to_string(),
            airports: airports.iter().map(|a| a.to_string()).collect(),
        })
        .collect()
}

fn builtin_index() -> &'static PlaceIndex {
    static INDEX: OnceLock<PlaceIndex> = OnceLock::new();
    INDEX.get_or_init(PlaceIndex::builtin)
}

/// [`PlaceIndex::resolve_city`] against the built-in table.
pub fn resolve_city(code: &str) -> String {
    builtin_index().resolve_city(code)
}

/// [`PlaceIndex::is_same_place`] against the built-in table.
pub fn is_same_place(a: &str, b: &str) -> bool {
    builtin_index().is_same_place(a, b)
}
