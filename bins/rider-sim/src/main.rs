//! rider-sim: exercise the rider location and proximity core from the terminal.

mod output;
mod replay;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use output::{Status, format_amount, format_count};
use rider_core::config::Config;
use rider_core::exit_codes;
use rider_geo::{GeoPoint, LocatedReading, distance_meters, format_distance};
use rider_location::LocationStatus;
use rider_proximity::{
    ArrivalDetector, DeliverySession, HistoryFilter, OrderAction, ScreenView,
    average_delivery_minutes, filter_history, group_by_day, load_orders, total_earnings,
    weekly_counts,
};
use rider_telemetry::TelemetryConfig;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "rider-sim")]
#[command(about = "Simulate the rider app's location and proximity logic")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to .rider.toml / rider.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Great-circle distance between two points
    #[command(allow_negative_numbers = true)]
    Distance {
        from_lat: f64,
        from_lng: f64,
        to_lat: f64,
        to_lng: f64,
    },
    /// Rank open orders from a position
    #[command(allow_negative_numbers = true)]
    Rank {
        /// Order snapshot (backend JSON array)
        #[arg(long)]
        orders: PathBuf,
        #[arg(long)]
        lat: f64,
        #[arg(long)]
        lng: f64,
        /// Reported accuracy radius in meters
        #[arg(long, default_value_t = 10.0)]
        accuracy: f64,
    },
    /// Replay a device trace through the monitor and a delivery session
    Replay {
        /// Order snapshot (backend JSON array)
        #[arg(long)]
        orders: PathBuf,
        /// Trace of permission, services, foreground and fix events
        #[arg(long)]
        trace: PathBuf,
    },
    /// Summarize delivery history
    History {
        /// Order snapshot (backend JSON array)
        #[arg(long)]
        orders: PathBuf,
        #[arg(long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
        /// Last day of the weekly chart (defaults to today, UTC)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FilterArg {
    All,
    Delivered,
    Cancelled,
}

impl From<FilterArg> for HistoryFilter {
    fn from(filter: FilterArg) -> Self {
        match filter {
            FilterArg::All => HistoryFilter::All,
            FilterArg::Delivered => HistoryFilter::Delivered,
            FilterArg::Cancelled => HistoryFilter::Cancelled,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let json = cli.json;

    match run(cli).await {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(err) => {
            if json {
                eprintln!("{}", serde_json::json!({ "error": format!("{err:#}") }));
            } else {
                Status::error(&format!("{err:#}"));
            }
            ExitCode::FAILURE
        }
    }
}

/// Run one command and return its process exit code.
///
/// Coded failures are reported here; the log guard is dropped before
/// the process exits.
async fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = match Config::load(cli.config.as_deref().and_then(Path::to_str)) {
        Ok(config) => config,
        Err(err) => return Ok(report_error(&err, exit_codes::CONFIG_ERROR, cli.json)),
    };
    let mut telemetry = TelemetryConfig::from(&config.schema.telemetry);
    if cli.verbose {
        telemetry.log_level = "debug".to_string();
    } else if cli.json {
        telemetry.log_level = "warn".to_string();
    }
    let _guard = rider_telemetry::init_with_config(telemetry)?;

    match cli.command {
        Commands::Distance { from_lat, from_lng, to_lat, to_lng } => {
            let from = GeoPoint::new(from_lat, from_lng);
            let to = GeoPoint::new(to_lat, to_lng);
            let meters = distance_meters(Some(&from), Some(&to));

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "from": from,
                        "to": to,
                        "meters": meters,
                        "formatted": format_distance(meters),
                    }))?
                );
            } else {
                println!("{} ({:.1} m)", format_distance(meters), meters);
            }
        }

        Commands::Rank { orders, lat, lng, accuracy } => {
            let orders = match read_orders(&orders) {
                Ok(orders) => orders,
                Err(err) => return Ok(report_error(&err, exit_codes::DATA_ERROR, cli.json)),
            };
            let fix = LocatedReading::new(GeoPoint::new(lat, lng), accuracy, Utc::now().timestamp_millis());
            let mut session = DeliverySession::new(orders, ArrivalDetector::from(&config.schema.arrival));
            let view = session.view(LocationStatus::Ready, Some(&fix));

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print_view(&view);
            }
        }

        Commands::Replay { orders, trace } => {
            let orders = match read_orders(&orders) {
                Ok(orders) => orders,
                Err(err) => return Ok(report_error(&err, exit_codes::DATA_ERROR, cli.json)),
            };
            let events = std::fs::read_to_string(&trace)
                .with_context(|| format!("reading trace {}", trace.display()))?;
            let events = replay::parse_trace(&events)
                .with_context(|| format!("parsing trace {}", trace.display()))?;

            let report = replay::run(events, orders, &config.schema).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                Status::header("Replay");
                for step in &report.steps {
                    Status::location(step.status);
                    println!("  [{}] {}", step.step, step.event);
                    if let Some(nearest) = &step.nearest {
                        println!("      nearest: {}{}", nearest, if step.arrived { " (arrived)" } else { "" });
                    }
                    if let Some(id) = &step.delivered {
                        Status::success(&format!("delivered {}", id));
                    }
                }
                println!();
                Status::info(&format!(
                    "{} delivered, {} remaining",
                    format_count(report.delivered.len(), "order", "orders"),
                    report.remaining.len()
                ));
                if let Some(counters) = report.metrics["counters"].as_object() {
                    let mut counters: Vec<_> = counters.iter().collect();
                    counters.sort_by(|a, b| a.0.cmp(b.0));
                    for (name, value) in counters {
                        println!("  {:<28} {}", name, value);
                    }
                }
            }
        }

        Commands::History { orders, filter, today } => {
            let orders = match read_orders(&orders) {
                Ok(orders) => orders,
                Err(err) => return Ok(report_error(&err, exit_codes::DATA_ERROR, cli.json)),
            };
            let today = today.unwrap_or_else(|| Utc::now().date_naive());
            let shown = filter_history(&orders, filter.into());
            let week = weekly_counts(&orders, today);
            let average = average_delivery_minutes(&orders);
            let earnings = total_earnings(&orders);

            if cli.json {
                let ids: Vec<&str> = shown.iter().map(|o| o.id.as_str()).collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "orders": ids,
                        "weekly": week,
                        "average_delivery_minutes": average,
                        "total_earnings": earnings,
                    }))?
                );
            } else {
                let owned: Vec<_> = shown.into_iter().cloned().collect();
                for (day, orders) in group_by_day(&owned) {
                    Status::header(&day);
                    for order in orders {
                        println!("  {:<24} {:<18} {}", order.id, order.status, format_amount(order.total_amount));
                    }
                }

                Status::header("Last 7 days");
                for day in &week {
                    println!("  {} {:>3} {}", day.label, day.count, "▇".repeat(day.count));
                }
                println!();
                match average {
                    Some(minutes) => Status::info(&format!("average delivery time {:.0} min", minutes)),
                    None => Status::info("no timed deliveries yet"),
                }
                Status::info(&format!("earnings {}", format_amount(earnings)));
            }
        }
    }

    Ok(exit_codes::SUCCESS)
}

fn read_orders(path: &Path) -> rider_core::Result<Vec<rider_proximity::Order>> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        rider_core::Error::from(e).with_context(format!("While reading {}", path.display()))
    })?;
    load_orders(&json).map_err(|e| {
        rider_core::Error::from(e).with_context(format!("While loading {}", path.display()))
    })
}

/// Print a coded error and hand back the exit code to use
fn report_error(err: &rider_core::Error, code: i32, json: bool) -> i32 {
    if json {
        match serde_json::to_string_pretty(&err.to_report()) {
            Ok(report) => eprintln!("{}", report),
            Err(_) => eprintln!("{}", err),
        }
    } else {
        Status::error(&err.to_string());
    }
    code
}

fn print_view(view: &ScreenView) {
    match view {
        ScreenView::Blank => Status::info("checking location..."),
        ScreenView::PermissionPrompt => Status::warning("location permission required"),
        ScreenView::EnableGpsPrompt => Status::warning("turn on location services"),
        ScreenView::NoActiveOrders => Status::info("no active orders"),
        ScreenView::Orders { nearest, arrived, cards } => {
            Status::header(&format_count(cards.len(), "open order", "open orders"));
            for card in cards {
                let marker = if card.active { "▶" } else { " " };
                let action = match &card.action {
                    OrderAction::MarkDelivered => "mark delivered".to_string(),
                    OrderAction::Navigate { .. } => "navigate".to_string(),
                };
                println!(
                    "{} {:<24} {:>9}  {}",
                    marker,
                    card.order.id,
                    card.distance.as_deref().unwrap_or("-"),
                    action
                );
            }
            if let Some(nearest) = nearest {
                println!();
                if *arrived {
                    Status::success(&format!("arrived at {}", nearest.id));
                } else {
                    Status::info(&format!("nearest: {}", nearest.id));
                }
            }
        }
    }
}
