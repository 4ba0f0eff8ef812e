//! Request and response shapes for the fare-search provider.

use crate::plan::DatePair;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of trip options requested per search.
pub const DEFAULT_SOLUTIONS: u32 = 20;

/// Fare client and store errors.
#[derive(Debug, Error)]
pub enum FareError {
    #[error("network error: {0}")]
    Network(String),
    #[error("provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("invalid fare response: {0}")]
    InvalidResponse(String),
    #[error("no trip options in response")]
    NoTrips,
    #[error("cannot parse sale total '{0}'")]
    SaleTotal(String),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level payload: `{"request": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareRequest {
    pub request: TripRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub slice: Vec<SliceRequest>,
    pub passengers: Passengers,
    pub solutions: u32,
    pub refundable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceRequest {
    pub origin: String,
    pub destination: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passengers {
    pub adult_count: u32,
    pub infant_in_lap_count: u32,
    pub infant_in_seat_count: u32,
    pub child_count: u32,
    pub senior_count: u32,
}

impl Default for Passengers {
    fn default() -> Self {
        Self {
            adult_count: 1,
            infant_in_lap_count: 0,
            infant_in_seat_count: 0,
            child_count: 0,
            senior_count: 0,
        }
    }
}

impl FareRequest {
    /// One adult, outbound slice plus a return slice when the dates have one.
    pub fn new(origin: &str, destination: &str, dates: &DatePair, solutions: u32) -> Self {
        let mut slice = vec![SliceRequest {
            origin: origin.to_string(),
            destination: destination.to_string(),
            date: dates.depart.format("%Y-%m-%d").to_string(),
        }];
        if let Some(ret) = dates.ret {
            slice.push(SliceRequest {
                origin: destination.to_string(),
                destination: origin.to_string(),
                date: ret.format("%Y-%m-%d").to_string(),
            });
        }

        Self {
            request: TripRequest {
                slice,
                passengers: Passengers::default(),
                solutions,
                refundable: false,
            },
        }
    }
}

// ─── Response ───────────────────────────────────────────────────
// Only the fields the report needs; everything else is ignored.

#[derive(Debug, Clone, Deserialize)]
pub struct FareResponse {
    pub trips: Trips,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Trips {
    #[serde(rename = "tripOption", default)]
    pub trip_option: Vec<TripOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TripOption {
    #[serde(rename = "saleTotal")]
    pub sale_total: String,
    #[serde(default)]
    pub slice: Vec<Slice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Slice {
    #[serde(default)]
    pub segment: Vec<Segment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Segment {
    #[serde(default)]
    pub leg: Vec<Leg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Leg {
    pub origin: String,
}

impl FareResponse {
    pub fn from_json(raw: &str) -> Result<Self, FareError> {
        serde_json::from_str(raw).map_err(|e| FareError::InvalidResponse(e.to_string()))
    }

    /// The first (cheapest) trip option.
    pub fn best(&self) -> Result<&TripOption, FareError> {
        self.trips.trip_option.first().ok_or(FareError::NoTrips)
    }

    /// Price of the best option, with the currency prefix stripped.
    pub fn sale_total_amount(&self) -> Result<f64, FareError> {
        parse_sale_total(&self.best()?.sale_total)
    }

    /// `(origin, destination)` of the best option: where the first slice
    /// departs and where the last slice departs from.
    pub fn route(&self) -> Result<(String, String), FareError> {
        let best = self.best()?;
        let first_leg = |slice: Option<&Slice>| -> Result<String, FareError> {
            slice
                .and_then(|s| s.segment.first())
                .and_then(|seg| seg.leg.first())
                .map(|leg| leg.origin.clone())
                .ok_or_else(|| FareError::InvalidResponse("trip option has no legs".into()))
        };
        Ok((first_leg(best.slice.first())?, first_leg(best.slice.last())?))
    }
}

/// "USD123.45" -> 123.45
pub fn parse_sale_total(raw: &str) -> Result<f64, FareError> {
    let amount = raw
        .get(3..)
        .filter(|_| raw.chars().take(3).all(|c| c.is_ascii_alphabetic()))
        .ok_or_else(|| FareError::SaleTotal(raw.to_string()))?;
    amount
        .trim()
        .parse::<f64>()
        .map_err(|_| FareError::SaleTotal(raw.to_string()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    /// Minimal provider response with the given legs and price.
    pub(crate) fn sample_response(origin: &str, destination: &str, total: &str) -> String {
        json!({
            "kind": "qpxExpress#tripsSearch",
            "trips": {
                "tripOption": [{
                    "saleTotal": total,
                    "slice": [
                        {"segment": [{"leg": [{"origin": origin, "destination": destination}]}]},
                        {"segment": [{"leg": [{"origin": destination, "destination": origin}]}]}
                    ]
                }, {
                    "saleTotal": "USD999.00",
                    "slice": []
                }]
            }
        })
        .to_string()
    }

    #[test]
    fn test_request_payload() {
        let dates = DatePair::new(
            NaiveDate::from_ymd_opt(2018, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2018, 1, 5),
        );
        let req = FareRequest::new("PHL", "STL", &dates, DEFAULT_SOLUTIONS);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "request": {
                    "slice": [
                        {"origin": "PHL", "destination": "STL", "date": "2018-01-02"},
                        {"origin": "STL", "destination": "PHL", "date": "2018-01-05"}
                    ],
                    "passengers": {
                        "adultCount": 1,
                        "infantInLapCount": 0,
                        "infantInSeatCount": 0,
                        "childCount": 0,
                        "seniorCount": 0
                    },
                    "solutions": 20,
                    "refundable": false
                }
            })
        );
    }

    #[test]
    fn test_one_way_payload() {
        let dates = DatePair::new(NaiveDate::from_ymd_opt(2018, 1, 2).unwrap(), None);
        let req = FareRequest::new("PHL", "STL", &dates, 5);
        assert_eq!(req.request.slice.len(), 1);
        assert_eq!(req.request.solutions, 5);
    }

    #[test]
    fn test_parse_response() {
        let resp = FareResponse::from_json(&sample_response("LGA", "ORD", "USD231.10")).unwrap();
        assert_eq!(resp.route().unwrap(), ("LGA".to_string(), "ORD".to_string()));
        assert!((resp.sale_total_amount().unwrap() - 231.10).abs() < 1e-9);
    }

    #[test]
    fn test_empty_response() {
        let resp = FareResponse::from_json(r#"{"trips": {}}"#).unwrap();
        assert!(matches!(resp.best(), Err(FareError::NoTrips)));
        assert!(FareResponse::from_json("not json").is_err());
    }

    #[test]
    fn test_parse_sale_total() {
        assert!((parse_sale_total("USD123.45").unwrap() - 123.45).abs() < 1e-9);
        assert!((parse_sale_total("EUR7").unwrap() - 7.0).abs() < 1e-9);
        assert!(parse_sale_total("12").is_err());
        assert!(parse_sale_total("123.45").is_err());
        assert!(parse_sale_total("USDabc").is_err());
    }
}
