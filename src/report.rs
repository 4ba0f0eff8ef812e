//! Per-destination cost report built from persisted fare responses.
//!
//! For every origin and destination the report either charges a drive
//! (once per origin) or the best fare times the origin's headcount, then
//! totals each destination. Building is pure; rendering returns text.

use crate::airports::AirportTable;
use crate::fare::FareResponse;
use crate::places::PlaceIndex;
use crate::plan::{Party, TravelMode, TravelPolicy};
use log::warn;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::Write;

/// Best fare per normalized `(origin, destination)` route.
#[derive(Debug, Default)]
pub struct FareIndex {
    fares: HashMap<(String, String), f64>,
}

impl FareIndex {
    /// Index responses by route, keeping the cheapest fare when several
    /// responses (e.g. different dates) cover the same route. Unusable
    /// responses are skipped with a warning.
    pub fn build<'a, I>(responses: I, places: &PlaceIndex) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a FareResponse)>,
    {
        let mut fares = HashMap::new();
        for (label, resp) in responses {
            let (origin, destination) = match resp.route() {
                Ok(route) => route,
                Err(e) => {
                    warn!("Skipping {}: {}", label, e);
                    continue;
                }
            };
            let total = match resp.sale_total_amount() {
                Ok(t) => t,
                Err(e) => {
                    warn!("Skipping {}: {}", label, e);
                    continue;
                }
            };

            let key = (places.resolve_city(&origin), places.resolve_city(&destination));
            match fares.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(total);
                }
                Entry::Occupied(mut slot) => {
                    let kept = *slot.get();
                    let (origin, destination) = slot.key();
                    warn!(
                        "{}: several fares for {} to {}; keeping ${:.2}, dropping ${:.2}",
                        label,
                        origin,
                        destination,
                        kept.min(total),
                        kept.max(total)
                    );
                    slot.insert(kept.min(total));
                }
            }
        }
        Self { fares }
    }

    pub fn insert(&mut self, origin: &str, destination: &str, total: f64) {
        self.fares.insert((origin.to_string(), destination.to_string()), total);
    }

    pub fn get(&self, origin: &str, destination: &str) -> Option<f64> {
        self.fares.get(&(origin.to_string(), destination.to_string())).copied()
    }

    pub fn len(&self) -> usize {
        self.fares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fares.is_empty()
    }
}

/// One origin/destination line of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReportLine {
    Drive {
        origin: String,
        destination: String,
        round_trip_miles: f64,
        cost: f64,
    },
    Flight {
        origin: String,
        destination: String,
        fare: f64,
        people: u32,
    },
    Missing {
        origin: String,
        destination: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestinationTotal {
    pub destination: String,
    pub total: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub lines: Vec<ReportLine>,
    /// Costliest destination first.
    pub totals: Vec<DestinationTotal>,
}

impl Report {
    pub fn build(
        origins: &Party,
        destinations: &Party,
        fares: &FareIndex,
        policy: &TravelPolicy,
        airports: &AirportTable,
        places: &PlaceIndex,
    ) -> Self {
        let mut lines = Vec::new();
        let mut totals: Vec<DestinationTotal> = Vec::new();

        for member in &origins.members {
            let origin = places.resolve_city(&member.code);
            for dest_code in destinations.codes() {
                let destination = places.resolve_city(dest_code);
                if places.is_same_place(&origin, &destination) {
                    continue;
                }

                let idx = match totals.iter().position(|t| t.destination == destination) {
                    Some(i) => i,
                    None => {
                        totals.push(DestinationTotal { destination: destination.clone(), total: 0.0 });
                        totals.len() - 1
                    }
                };

                if let TravelMode::Drive { round_trip_miles, cost } =
                    policy.decide(&origin, &destination, airports, places)
                {
                    totals[idx].total += cost;
                    lines.push(ReportLine::Drive {
                        origin: origin.clone(),
                        destination,
                        round_trip_miles,
                        cost,
                    });
                    continue;
                }

                match fares.get(&origin, &destination) {
                    Some(fare) => {
                        totals[idx].total += fare * member.headcount as f64;
                        lines.push(ReportLine::Flight {
                            origin: origin.clone(),
                            destination,
                            fare,
                            people: member.headcount,
                        });
                    }
                    None => lines.push(ReportLine::Missing { origin: origin.clone(), destination }),
                }
            }
        }

        totals.sort_by(|a, b| {
            b.total
                .total_cmp(&a.total)
                .then_with(|| a.destination.cmp(&b.destination))
        });

        Self { lines, totals }
    }

    pub fn missing(&self) -> impl Iterator<Item = &ReportLine> {
        self.lines.iter().filter(|l| matches!(l, ReportLine::Missing { .. }))
    }

    /// Cost lines, a blank line, then totals. Missing fares are left out;
    /// see [`Report::warnings`].
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                ReportLine::Drive { origin, destination, round_trip_miles, cost } => {
                    let _ = writeln!(
                        out,
                        "{} to {}: Drive {:.0} miles total (${:.2})",
                        origin, destination, round_trip_miles, cost
                    );
                }
                ReportLine::Flight { origin, destination, fare, people } => {
                    let suffix = if *people > 1 {
                        format!(" (for {} people, ${:.2})", people, fare * *people as f64)
                    } else {
                        String::new()
                    };
                    let _ = writeln!(out, "{} to {}: ${:.2}{}", origin, destination, fare, suffix);
                }
                ReportLine::Missing { .. } => {}
            }
        }

        out.push('\n');
        for t in &self.totals {
            let _ = writeln!(out, "{}: ${:.2}", t.destination, t.total);
        }
        out
    }

    pub fn warnings(&self) -> Vec<String> {
        self.missing()
            .filter_map(|l| match l {
                ReportLine::Missing { origin, destination } => Some(format!(
                    "*** WARNING: Missing flight pricing for {} to {}! ***",
                    origin, destination
                )),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fare::types::tests::sample_response;
    use crate::plan::tests::test_airports;
    use approx::assert_relative_eq;

    fn build(orig: &str, dest: &str, fares: &FareIndex) -> Report {
        Report::build(
            &Party::parse(orig).unwrap(),
            &Party::parse(dest).unwrap(),
            fares,
            &TravelPolicy::default(),
            &test_airports(),
            &PlaceIndex::builtin(),
        )
    }

    #[test]
    fn test_fare_index_normalizes_routes() {
        let r1 = FareResponse::from_json(&sample_response("LGA", "ORD", "USD200.00")).unwrap();
        let r2 = FareResponse::from_json(&sample_response("PHL", "MDW", "USD150.50")).unwrap();
        let r3 = FareResponse::from_json(&sample_response("JFK", "ORD", "USD180.00")).unwrap();
        let index = FareIndex::build(
            [("a.json", &r1), ("b.json", &r2), ("c.json", &r3)],
            &PlaceIndex::builtin(),
        );
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("NYC", "CHI"), Some(180.0));
        assert_eq!(index.get("PHL", "CHI"), Some(150.5));
    }

    #[test]
    fn test_fare_index_keeps_cheapest_per_route() {
        let cheap = FareResponse::from_json(&sample_response("PHL", "STL", "USD149.00")).unwrap();
        let dear = FareResponse::from_json(&sample_response("PHL", "STL", "USD310.00")).unwrap();
        let index = FareIndex::build(
            [("PHL-STL_2018-01-02.json", &cheap), ("PHL-STL_2018-01-03.json", &dear)],
            &PlaceIndex::builtin(),
        );
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("PHL", "STL"), Some(149.0));
    }

    #[test]
    fn test_fare_index_skips_bad_responses() {
        let empty = FareResponse::from_json(r#"{"trips": {"tripOption": []}}"#).unwrap();
        let index = FareIndex::build([("empty.json", &empty)], &PlaceIndex::builtin());
        assert!(index.is_empty());
    }

    #[test]
    fn test_report_totals() {
        let mut fares = FareIndex::default();
        fares.insert("PHL", "STL", 200.0);
        fares.insert("MCI", "CHI", 120.0);
        fares.insert("PHL", "CHI", 150.0);
        fares.insert("NYC", "STL", 210.0);

        let report = build("PHL:4,MCI:2,LGA", "STL,ORD,PHL", &fares);

        // STL: PHL flies 4 x 200, MCI drives, NYC flies 1 x 210.
        // CHI: PHL flies 4 x 150, MCI drives (403 mi < 500), NYC has no fare.
        // PHL: MCI has no fare, NYC drives.
        let stl = report.totals.iter().find(|t| t.destination == "STL").unwrap();
        let mci_stl_drive = match &report.lines[2] {
            ReportLine::Drive { cost, .. } => *cost,
            other => panic!("expected MCI drive, got {:?}", other),
        };
        assert_relative_eq!(stl.total, 800.0 + 210.0 + mci_stl_drive, epsilon = 1e-9);

        assert_eq!(report.totals.len(), 3);
        assert_eq!(report.totals[0].destination, "STL");
        assert!(report.totals.windows(2).all(|w| w[0].total >= w[1].total));

        let missing: Vec<_> = report.missing().cloned().collect();
        assert_eq!(
            missing,
            vec![
                ReportLine::Missing { origin: "MCI".into(), destination: "PHL".into() },
                ReportLine::Missing { origin: "NYC".into(), destination: "CHI".into() },
            ]
        );
    }

    #[test]
    fn test_report_skips_same_place() {
        let mut fares = FareIndex::default();
        fares.insert("NYC", "CHI", 100.0);
        let report = build("JFK", "EWR,NYC,MDW", &fares);
        assert_eq!(
            report.lines,
            vec![ReportLine::Flight { origin: "NYC".into(), destination: "CHI".into(), fare: 100.0, people: 1 }]
        );
        assert_eq!(report.totals, vec![DestinationTotal { destination: "CHI".into(), total: 100.0 }]);
    }

    #[test]
    fn test_report_json() {
        let mut fares = FareIndex::default();
        fares.insert("PHL", "LAX", 320.0);
        let report = build("PHL:3,NYC", "LAX,PHL", &fares);
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["lines"][0]["kind"], "flight");
        assert_eq!(value["lines"][0]["people"], 3);
        assert_eq!(value["lines"][1]["kind"], "missing");
        assert_eq!(value["lines"][2]["kind"], "drive");
        assert_eq!(value["lines"][2]["origin"], "NYC");
        assert_eq!(value["totals"][0]["destination"], "LAX");
        assert_eq!(value["totals"][0]["total"], 960.0);
    }

    #[test]
    fn test_render() {
        let mut fares = FareIndex::default();
        fares.insert("PHL", "LAX", 320.0);
        fares.insert("CHI", "LAX", 250.5);
        let report = build("PHL:3,ORD", "LAX", &fares);
        assert_eq!(
            report.render(),
            "PHL to LAX: $320.00 (for 3 people, $960.00)\n\
             CHI to LAX: $250.50\n\
             \n\
             LAX: $1210.50\n"
        );
        assert!(report.warnings().is_empty());
    }

    #[test]
    fn test_render_drive_and_warning() {
        let report = build("PHL:2", "NYC,LAX", &FareIndex::default());
        let text = report.render();
        assert!(text.starts_with("PHL to NYC: Drive 191 miles total ($36.30)\n"), "{text}");
        assert_eq!(report.warnings(), vec!["*** WARNING: Missing flight pricing for PHL to LAX! ***"]);
        assert!(text.ends_with("NYC: $36.30\nLAX: $0.00\n"), "{text}");
    }
}
