use std::collections::BTreeMap;
use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use chrono::NaiveDate;
use flowlens_core::actions::UserAction;
use flowlens_core::config::DashboardConfig;
use flowlens_core::datasets::metadata_from_spec;
use flowlens_core::datasets::DatasetRegistry;
use flowlens_core::datasets::Subaction;
use flowlens_core::datasets::VisualizationType;
use flowlens_core::filters::Location;
use flowlens_core::geometry::GeometryConfig;
use flowlens_core::periods::reference_year;
use flowlens_core::periods::resolve_period_at;
use flowlens_core::periods::time_periods;
use flowlens_core::periods::today;
use flowlens_core::periods::PeriodId;
use flowlens_core::persistence::FileSelectionStore;
use flowlens_core::persistence::SelectionStore;
use flowlens_core::pipeline::ChartData;
use flowlens_core::reducer::ViewEffect;
use flowlens_core::session::ViewSession;
use flowlens_source::fetch::BackgroundFetcher;
use flowlens_source::source::DatasetSource;
use flowlens_source::source::JsonDirectorySource;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut args = env::args().skip(1);
    let Some(command) = args.next() else {
        print_help();
        return Ok(());
    };
    let rest: Vec<String> = args.collect();

    match command.as_str() {
        "--help" | "-h" | "help" => {
            print_help();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("flowlens {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "datasets" => {
            parse_flags(&rest, &[])?;
            list_datasets();
            Ok(())
        }
        "periods" => {
            let flags = parse_flags(&rest, &["--dataset", "--year"])?;
            let dataset_id = required(&flags, "--dataset")?;
            let year = match flags.get("--year") {
                Some(value) => Some(value.parse::<i32>().map_err(|_| format!("invalid year: {value}"))?),
                None => None,
            };
            list_periods(dataset_id, year, today())
        }
        "chart" => {
            let args = ChartArgs::parse(&rest)?;
            let report = build_chart(&args, today())?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        _ => {
            print_help();
            Err(format!("unknown command: {command}").into())
        }
    }
}

fn parse_flags(
    args: &[String],
    allowed: &[&str],
) -> Result<BTreeMap<String, String>, Box<dyn Error>> {
    let mut flags = BTreeMap::new();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        if !allowed.contains(&flag) {
            return Err(format!("unsupported argument: {flag}").into());
        }
        let Some(value) = args.get(i + 1) else {
            return Err(format!("{flag} requires a value").into());
        };
        flags.insert(flag.to_string(), value.clone());
        i += 2;
    }
    Ok(flags)
}

fn required<'a>(flags: &'a BTreeMap<String, String>, flag: &str) -> Result<&'a str, Box<dyn Error>> {
    flags
        .get(flag)
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} is required").into())
}

fn parse_date(flag: &str, value: &str) -> Result<NaiveDate, Box<dyn Error>> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("{flag} expects YYYY-MM-DD, got {value}").into())
}

#[derive(Debug, Clone, PartialEq)]
struct ChartArgs {
    data_dir: PathBuf,
    dataset_id: String,
    locations: Vec<Location>,
    visualization: VisualizationType,
    subaction: Subaction,
    period: Option<PeriodId>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    config: Option<PathBuf>,
    state: Option<PathBuf>,
    zoom: f64,
}

impl ChartArgs {
    fn parse(args: &[String]) -> Result<Self, Box<dyn Error>> {
        let flags = parse_flags(
            args,
            &[
                "--data-dir",
                "--dataset",
                "--locations",
                "--viz",
                "--subaction",
                "--period",
                "--start",
                "--end",
                "--config",
                "--state",
                "--zoom",
            ],
        )?;

        let viz = required(&flags, "--viz")?;
        let subaction = required(&flags, "--subaction")?;
        let locations = required(&flags, "--locations")?
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| Location::new(id, id))
            .collect();
        let period = match flags.get("--period") {
            Some(value) => Some(PeriodId::parse(value).ok_or_else(|| format!("unknown period: {value}"))?),
            None => None,
        };
        let start_date = flags
            .get("--start")
            .map(|value| parse_date("--start", value))
            .transpose()?;
        let end_date = flags
            .get("--end")
            .map(|value| parse_date("--end", value))
            .transpose()?;
        let zoom = match flags.get("--zoom") {
            Some(value) => value.parse::<f64>().map_err(|_| format!("invalid zoom: {value}"))?,
            None => 1.0,
        };

        Ok(Self {
            data_dir: PathBuf::from(required(&flags, "--data-dir")?),
            dataset_id: required(&flags, "--dataset")?.to_string(),
            locations,
            visualization: VisualizationType::parse(viz)
                .ok_or_else(|| format!("unknown visualization: {viz}"))?,
            subaction: Subaction::parse(subaction)
                .ok_or_else(|| format!("unknown subaction: {subaction}"))?,
            period,
            start_date,
            end_date,
            config: flags.get("--config").map(PathBuf::from),
            state: flags.get("--state").map(PathBuf::from),
            zoom,
        })
    }

    /// The period to select, if any was given. Dates alone imply a custom period.
    fn time_period(&self) -> Option<UserAction> {
        let period_id = match (self.period, self.start_date, self.end_date) {
            (Some(period_id), _, _) => period_id,
            (None, Some(_), _) | (None, _, Some(_)) => PeriodId::Custom,
            (None, None, None) => return None,
        };
        Some(UserAction::SetTimePeriod {
            period_id,
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Marker {
    location_id: String,
    total: f64,
    radius: f64,
    stroke_width: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChartReport {
    dataset_id: String,
    visualization: VisualizationType,
    subaction: Subaction,
    time_period: PeriodId,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<ChartData>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    markers: Vec<Marker>,
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("flowlens").join("flowlens.toml"))
        .unwrap_or_else(|| PathBuf::from("flowlens.toml"))
}

fn default_state_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("flowlens").join("selection.json"))
        .unwrap_or_else(|| PathBuf::from("selection.json"))
}

fn build_chart(args: &ChartArgs, today: NaiveDate) -> Result<ChartReport, Box<dyn Error>> {
    let config = DashboardConfig::load(args.config.clone().unwrap_or_else(default_config_path))?;
    let state_path = args
        .state
        .clone()
        .or_else(|| config.storage.selection_path.clone())
        .unwrap_or_else(default_state_path);
    let store = FileSelectionStore::open(&state_path)?;
    let mut fetcher = BackgroundFetcher::new(JsonDirectorySource::new(&args.data_dir));
    let now = Instant::now();

    let mut session = ViewSession::new(store, &config.view);
    let effects = session.mount(today, now)?;
    settle(&mut session, &mut fetcher, effects, now)?;

    let effects = session.dispatch(UserAction::SetDatasetId(Some(args.dataset_id.clone())), now);
    settle(&mut session, &mut fetcher, effects, now)?;
    if session.state().dataset_metadata.is_none() {
        return Err(format!("unknown dataset: {}", args.dataset_id).into());
    }
    if !session
        .state()
        .supported_visualizations
        .contains(&args.visualization)
    {
        return Err(format!(
            "{} does not support the {} visualization",
            args.dataset_id,
            args.visualization.as_str()
        )
        .into());
    }
    let effects = session.dispatch(UserAction::SetVisualizationType(args.visualization), now);
    settle(&mut session, &mut fetcher, effects, now)?;
    if !session.state().supported_subactions.contains(&args.subaction) {
        return Err(format!(
            "{} cannot show {} on a {} chart",
            args.dataset_id,
            args.subaction.as_str(),
            args.visualization.as_str()
        )
        .into());
    }

    let mut actions = vec![UserAction::SetSubaction(args.subaction)];
    actions.extend(args.time_period());
    actions.push(UserAction::SetLocations(args.locations.clone()));
    actions.push(UserAction::Visualize);
    for action in actions {
        let effects = session.dispatch(action, now);
        settle(&mut session, &mut fetcher, effects, now)?;
    }
    let effects = session.flush(now)?;
    settle(&mut session, &mut fetcher, effects, now)?;

    report(&session, &config.geometry, args.zoom)
}

/// Carries out the effects the session hands back. Fetches run on the
/// background fetcher and every one started here is waited for.
fn settle<S: SelectionStore, D: DatasetSource + Send + Sync + 'static>(
    session: &mut ViewSession<S>,
    fetcher: &mut BackgroundFetcher<D>,
    effects: Vec<ViewEffect>,
    now: Instant,
) -> Result<(), Box<dyn Error>> {
    let mut pending = effects;
    loop {
        for effect in pending.drain(..) {
            match effect {
                ViewEffect::FetchDataset(ticket) => fetcher.spawn(ticket),
                ViewEffect::ShowValidation(message) => return Err(message.into()),
                ViewEffect::PersistSelection(_)
                | ViewEffect::LoadMetadata(_)
                | ViewEffect::RequestRender => {}
            }
        }
        match fetcher.recv() {
            Some(action) => pending = session.dispatch(action, now),
            None => return Ok(()),
        }
    }
}

fn report<S: SelectionStore>(
    session: &ViewSession<S>,
    geometry: &GeometryConfig,
    zoom: f64,
) -> Result<ChartReport, Box<dyn Error>> {
    let state = session.state();
    let Some(active) = state.active.as_ref() else {
        return Err("no chart was produced".into());
    };
    if let Some(err) = state.chart.error() {
        return Err(format!("chart failed: {err}").into());
    }
    let data = state.chart.data().cloned();
    let markers = match (&data, active.visualization) {
        (Some(ChartData::Series(rows)), VisualizationType::Map) => markers(rows, geometry, zoom),
        _ => Vec::new(),
    };
    Ok(ChartReport {
        dataset_id: active.dataset_id.clone(),
        visualization: active.visualization,
        subaction: active.subaction,
        time_period: active.time_period,
        start_date: active.range.start_date,
        end_date: active.range.end_date,
        status: state.chart.label(),
        data,
        markers,
    })
}

/// One circle per location, sized by the absolute total over all periods.
fn markers(
    rows: &[flowlens_core::pipeline::SeriesRow],
    geometry: &GeometryConfig,
    zoom: f64,
) -> Vec<Marker> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for row in rows {
        for (location_id, value) in &row.values {
            *totals.entry(location_id.as_str()).or_default() += value.abs();
        }
    }
    totals
        .into_iter()
        .map(|(location_id, total)| Marker {
            location_id: location_id.to_string(),
            total,
            radius: geometry.radius(total, zoom),
            stroke_width: geometry.stroke_width(1.0, zoom),
        })
        .collect()
}

fn list_datasets() {
    for spec in DatasetRegistry::list() {
        let metadata = metadata_from_spec(spec);
        let visualizations: Vec<&str> = metadata
            .supported_visualizations
            .iter()
            .map(|viz| viz.as_str())
            .collect();
        let subactions: Vec<&str> = metadata
            .supported_subactions
            .iter()
            .map(|subaction| subaction.as_str())
            .collect();
        let coverage = match (metadata.start_date, metadata.end_date) {
            (Some(start), Some(end)) => format!("{start} - {end}"),
            _ => "open".to_string(),
        };
        println!(
            "{:<22} {:<34} viz={:<15} measures={:<22} coverage={}",
            metadata.id,
            metadata.title,
            visualizations.join(","),
            subactions.join(","),
            coverage
        );
    }
}

fn list_periods(dataset_id: &str, year: Option<i32>, today: NaiveDate) -> Result<(), Box<dyn Error>> {
    let metadata = DatasetRegistry::capabilities_for(dataset_id)
        .ok_or_else(|| format!("unknown dataset: {dataset_id}"))?;
    let year = year.unwrap_or_else(|| reference_year(Some(&metadata), today));
    for period in time_periods(Some(&metadata), today) {
        let range = if period.id == PeriodId::Custom {
            "choose start and end dates".to_string()
        } else {
            resolve_period_at(period.id, year, metadata.month_granularity, None, None, today).summary()
        };
        let marker = if period.id == metadata.default_period {
            "*"
        } else {
            " "
        };
        let enabled = if period.is_enabled { "" } else { " (outside coverage)" };
        println!("{marker} {:<10} {:<16} {range}{enabled}", period.id.as_str(), period.label);
    }
    Ok(())
}

fn print_help() {
    println!("flowlens {}", env!("CARGO_PKG_VERSION"));
    println!("Usage:");
    println!("  flowlens datasets");
    println!("  flowlens periods --dataset ID [--year Y]");
    println!("  flowlens chart --data-dir DIR --dataset ID --locations A,B --viz V --subaction S");
    println!("                 [--period P] [--start YYYY-MM-DD --end YYYY-MM-DD]");
    println!("                 [--config PATH] [--state PATH] [--zoom K]");
    println!("  flowlens --help");
    println!("  flowlens --version");
}
