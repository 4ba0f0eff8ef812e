//! Runs a [`TripPlan`] against a fare provider.
//!
//! Driven trips are logged and skipped. Without a client (dry run) nothing
//! is sent. A failing route is logged and counted and the batch carries on.

use super::client::FareSearch;
use super::store::ResponseStore;
use super::types::{FareError, FareRequest, FareResponse};
use crate::plan::{PlannedTrip, TravelMode, TripPlan};
use log::{error, info};
use std::path::PathBuf;

/// What happened to a batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub driven: usize,
    pub skipped: usize,
    pub queried: usize,
    /// Every response written, including ones that failed to parse.
    pub saved: Vec<PathBuf>,
    pub failures: usize,
}

/// Price every flight in `plan`. `client == None` is a dry run.
pub fn execute(
    plan: &TripPlan,
    client: Option<&dyn FareSearch>,
    store: &ResponseStore,
    solutions: u32,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for trip in &plan.trips {
        if let TravelMode::Drive { round_trip_miles, cost } = trip.mode {
            info!(
                "{} {}: Drive {:.0} miles total (${:.2})",
                trip.origin, trip.destination, round_trip_miles, cost
            );
            outcome.driven += 1;
            continue;
        }

        let Some(client) = client else {
            info!("{} {}: Did not query because this is a dry run", trip.origin, trip.destination);
            outcome.skipped += 1;
            continue;
        };

        outcome.queried += 1;
        match price_trip(client, store, trip, solutions) {
            Ok(path) => outcome.saved.push(path),
            Err((path, e)) => {
                error!("{} to {} {}: {}", trip.origin, trip.destination, trip.dates, e);
                outcome.saved.extend(path);
                outcome.failures += 1;
            }
        }
    }

    outcome
}

/// Search, persist, then parse. The body is stored before parsing since
/// it has been paid for even when unusable; the saved path comes back with
/// the error in that case.
fn price_trip(
    client: &dyn FareSearch,
    store: &ResponseStore,
    trip: &PlannedTrip,
    solutions: u32,
) -> Result<PathBuf, (Option<PathBuf>, FareError)> {
    let request = FareRequest::new(&trip.origin, &trip.destination, &trip.dates, solutions);
    let raw = client.search(&request).map_err(|e| (None, e))?;
    let path = store
        .save(&trip.origin, &trip.destination, &trip.dates, &raw)
        .map_err(|e| (None, e))?;

    let parsed = FareResponse::from_json(&raw).and_then(|r| Ok(r.best()?.sale_total.clone()));
    match parsed {
        Ok(total) => {
            info!("{} to {} {}: {}", trip.origin, trip.destination, trip.dates, total);
            Ok(path)
        }
        Err(e) => Err((Some(path), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fare::types::tests::sample_response;
    use crate::places::PlaceIndex;
    use crate::plan::tests::test_airports;
    use crate::plan::{DatePair, Party, TravelPolicy};
    use chrono::NaiveDate;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::TempDir;

    /// Canned provider: errors for `fail`, garbage for `garbage`, a fare otherwise.
    struct StubSearch {
        fail: (&'static str, &'static str),
        garbage: (&'static str, &'static str),
        seen: RefCell<Vec<(String, String)>>,
    }

    impl StubSearch {
        fn new() -> Self {
            Self {
                fail: ("PHL", "CHI"),
                garbage: ("NYC", "STL"),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl FareSearch for StubSearch {
        fn search(&self, request: &FareRequest) -> Result<String, FareError> {
            let out = &request.request.slice[0];
            let route = (out.origin.as_str(), out.destination.as_str());
            self.seen.borrow_mut().push((out.origin.clone(), out.destination.clone()));
            if route == self.fail {
                return Err(FareError::Http { status: 403, body: "quota".into() });
            }
            if route == self.garbage {
                return Ok("<html>oops</html>".into());
            }
            Ok(sample_response(route.0, route.1, "USD199.00"))
        }
    }

    fn plan() -> TripPlan {
        let dates = vec![DatePair::new(
            NaiveDate::from_ymd_opt(2018, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2018, 1, 5),
        )];
        // Flights: PHL-STL, PHL-CHI, MCI-NYC, NYC-STL, NYC-CHI. Drives: PHL-NYC, MCI-STL, MCI-CHI.
        TripPlan::build(
            &Party::parse("PHL:4,MCI:2,JFK").unwrap(),
            &Party::parse("STL,NYC,ORD").unwrap(),
            &dates,
            &TravelPolicy::default(),
            &test_airports(),
            &PlaceIndex::builtin(),
        )
    }

    fn file_names(dir: &std::path::Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_execute_continues_after_failure() {
        let dir = TempDir::new().unwrap();
        let store = ResponseStore::new(dir.path());
        let stub = StubSearch::new();

        let outcome = execute(&plan(), Some(&stub as &dyn FareSearch), &store, 20);

        assert_eq!(outcome.driven, 3);
        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.failures, 2);
        assert_eq!(outcome.queried, 5);
        assert_eq!(outcome.saved.len(), 4);
        assert_eq!(stub.seen.borrow().len(), 5);
        assert!(!stub.seen.borrow().contains(&("PHL".to_string(), "NYC".to_string())));

        // The refused route writes nothing; the unparsable body is still kept.
        assert_eq!(
            file_names(dir.path()),
            vec![
                "MCI-NYC_2018-01-02_2018-01-05.json",
                "NYC-CHI_2018-01-02_2018-01-05.json",
                "NYC-STL_2018-01-02_2018-01-05.json",
                "PHL-STL_2018-01-02_2018-01-05.json",
            ]
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("NYC-STL_2018-01-02_2018-01-05.json")).unwrap(),
            "<html>oops</html>"
        );
    }

    #[test]
    fn test_dry_run_sends_nothing() {
        let dir = TempDir::new().unwrap();
        let store = ResponseStore::new(dir.path().join("out"));

        let outcome = execute(&plan(), None, &store, 20);

        assert_eq!(outcome.driven, 3);
        assert_eq!(outcome.skipped, 5);
        assert_eq!(outcome.failures, 0);
        assert!(outcome.saved.is_empty());
        assert!(!dir.path().join("out").exists());
    }
}
