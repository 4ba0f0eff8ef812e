use clap::{ArgAction, Parser, ValueEnum};
use fare_scout::airports::AirportTable;
use fare_scout::config::Config;
use fare_scout::fare::{self, store, FareSearch, QpxClient, ResponseStore};
use fare_scout::places::PlaceIndex;
use fare_scout::plan::{parse_dates, DatePair, Party, TravelPolicy, TripPlan};
use fare_scout::report::{FareIndex, Report};
use log::{info, warn};
use std::path::PathBuf;
use std::process::ExitCode;

/// Fare Scout — make a batch of airfare queries at once, or total them up.
///
/// `query` prices every origin/destination pair and writes each provider
/// response to a JSON file. `report` reads those files back and prints the
/// total cost of getting everybody to each destination, driving where the
/// trip is short. Queries cost money, so reports never re-query.
///
/// Examples:
///   farescout query --orig PHL:4,MCI:2 --dest STL,LAS,ORD --depart-date 2018-01-02 --return-date 2018-01-05
///   farescout report --orig PHL:4,MCI:2 --dest STL,LAS,ORD --result-files *.json
///   farescout report --orig PHL:4 --dest STL --result-files *.json --json
#[derive(Parser)]
#[command(name = "farescout", version, about, long_about)]
struct Cli {
    /// What to do.
    #[arg(value_enum)]
    command: Command,

    /// Comma-separated origin codes with optional headcount (e.g. PHL:3,ORD:2,NYC).
    #[arg(long)]
    orig: Option<String>,

    /// Comma-separated destination codes (e.g. HNL,LAX).
    #[arg(long)]
    dest: Option<String>,

    /// Departure date(s), YYYY-MM-DD, comma-separated.
    #[arg(long)]
    depart_date: Option<String>,

    /// Return date(s), YYYY-MM-DD, comma-separated.
    #[arg(long)]
    return_date: Option<String>,

    /// One-way distance in miles below which people drive instead.
    #[arg(long)]
    drive_instead: Option<f64>,

    /// Never substitute driving for flying.
    #[arg(long, conflicts_with = "drive_instead")]
    no_drive: bool,

    /// Cost per mile to drive.
    #[arg(long)]
    drive_cpm: Option<f64>,

    /// Airport coordinate table (OpenFlights airports.dat).
    #[arg(long)]
    airports: Option<PathBuf>,

    /// Result JSON files to parse.
    #[arg(long, num_args = 1..)]
    result_files: Vec<PathBuf>,

    /// Directory for query results.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// File holding the provider API key.
    #[arg(long)]
    api_key_file: Option<PathBuf>,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Don't actually send the queries.
    #[arg(long)]
    dry_run: bool,

    /// Config file (defaults to ~/.farescout/config.json).
    #[arg(long)]
    config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Command {
    Query,
    #[value(alias = "parse_results")]
    Report,
}

/// Everything both commands need, resolved from config and flags.
struct Setup {
    config: Config,
    origins: Party,
    destinations: Party,
    policy: TravelPolicy,
    places: PlaceIndex,
    airports: AirportTable,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let setup = match prepare(&cli) {
        Ok(s) => s,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Query => run_query(&cli, &setup),
        Command::Report => run_report(&cli, &setup),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "fare_scout=info",
        1 => "fare_scout=debug",
        _ => "fare_scout=trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn prepare(cli: &Cli) -> Result<Setup, String> {
    // ── Config ──────────────────────────────────────────────────

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .map_err(|e| e.to_string())?;

    if let Some(ref f) = cli.api_key_file {
        config.api_key_file = f.clone();
    }
    if let Some(ref f) = cli.airports {
        config.airports_file = f.clone();
    }
    if let Some(ref d) = cli.output_dir {
        config.output_dir = d.clone();
    }

    // ── Parties ─────────────────────────────────────────────────

    let (Some(orig), Some(dest)) = (&cli.orig, &cli.dest) else {
        return Err("You must specify at least one origin and one destination.".into());
    };
    let origins = Party::parse(orig).map_err(|e| e.to_string())?;
    let destinations = Party::parse(dest).map_err(|e| e.to_string())?;

    // ── Drive policy ────────────────────────────────────────────

    let policy = TravelPolicy {
        drive_threshold_miles: if cli.no_drive {
            None
        } else {
            Some(cli.drive_instead.unwrap_or(config.drive_threshold_miles))
        },
        drive_cost_per_mile: cli.drive_cpm.unwrap_or(config.drive_cost_per_mile),
    };

    let places = config.place_index().map_err(|e| e.to_string())?;

    let airports = if policy.drive_threshold_miles.is_some() {
        AirportTable::load(&config.airports_file).map_err(|e| e.to_string())?
    } else {
        AirportTable::default()
    };

    Ok(Setup { config, origins, destinations, policy, places, airports })
}

// ── query ───────────────────────────────────────────────────────

fn run_query(cli: &Cli, setup: &Setup) -> Result<(), String> {
    let (Some(departs), Some(returns)) = (&cli.depart_date, &cli.return_date) else {
        return Err("You must specify both departure and return dates.".into());
    };
    let departs = parse_dates(departs).map_err(|e| e.to_string())?;
    let returns = parse_dates(returns).map_err(|e| e.to_string())?;
    let dates = DatePair::combine(&departs, &returns).map_err(|e| e.to_string())?;

    let plan = TripPlan::build(
        &setup.origins,
        &setup.destinations,
        &dates,
        &setup.policy,
        &setup.airports,
        &setup.places,
    );
    info!("{} trips planned, {} to price", plan.len(), plan.flights().count());

    let client: Option<QpxClient> = if cli.dry_run {
        None
    } else {
        let key = setup.config.api_key().map_err(|e| e.to_string())?;
        Some(QpxClient::new(&setup.config.endpoint, &key))
    };
    let store = ResponseStore::new(&setup.config.output_dir);

    let outcome = fare::execute(
        &plan,
        client.as_ref().map(|c| c as &dyn FareSearch),
        &store,
        setup.config.solutions,
    );
    info!(
        "{} driven, {} queried, {} saved, {} skipped",
        outcome.driven,
        outcome.queried,
        outcome.saved.len(),
        outcome.skipped
    );

    if outcome.failures > 0 {
        return Err(format!("{} of {} queries failed", outcome.failures, outcome.queried));
    }
    Ok(())
}

// ── report ──────────────────────────────────────────────────────

fn run_report(cli: &Cli, setup: &Setup) -> Result<(), String> {
    if cli.result_files.is_empty() {
        return Err("Please specify some result files to parse, using --result-files.".into());
    }

    let mut responses = Vec::new();
    for path in &cli.result_files {
        match store::load(path) {
            Ok(resp) => responses.push((path.display().to_string(), resp)),
            Err(e) => warn!("{}", e),
        }
    }
    let fares = FareIndex::build(
        responses.iter().map(|(label, resp)| (label.as_str(), resp)),
        &setup.places,
    );

    let report = Report::build(
        &setup.origins,
        &setup.destinations,
        &fares,
        &setup.policy,
        &setup.airports,
        &setup.places,
    );

    for w in report.warnings() {
        eprintln!("{}", w);
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        println!("{}", json);
    } else {
        print!("{}", report.render());
    }
    Ok(())
}
