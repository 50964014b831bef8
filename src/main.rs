//! EventLens command line front end
//!
//! Runs a single query against the configured event source and prints the
//! resulting day sections.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use EventLens::{
    config::Settings,
    engine::LocalizedLabels,
    i18n::I18n,
    models::{Coordinate, EventGroup, FilterCriteria, SortMode},
    services::{self, QueryCoordinator, QueryIssue, QueryOutcome, QueryState},
    utils::{helpers, logging},
};

#[derive(Parser, Debug)]
#[command(name = "eventlens", version, about = "Find, order and group nearby events")]
struct Args {
    /// Configuration file (defaults to ./config.toml if present)
    #[arg(long)]
    config: Option<String>,

    /// Free-text search over title and description
    #[arg(long)]
    search: Option<String>,

    /// Latitude of the search center
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude of the search center
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Search radius in kilometers
    #[arg(long)]
    radius: Option<f64>,

    /// Earliest scheduled time, RFC 3339
    #[arg(long)]
    from: Option<DateTime<Utc>>,

    /// Latest scheduled time, RFC 3339
    #[arg(long)]
    to: Option<DateTime<Utc>>,

    #[arg(long)]
    category: Option<String>,

    /// May be repeated
    #[arg(long = "sub-category")]
    sub_categories: Vec<String>,

    /// One of date-ascending, date-descending, distance-ascending,
    /// recency-descending, recency-ascending, capacity-descending,
    /// popularity-descending
    #[arg(long)]
    sort: Option<SortMode>,

    /// Language for labels and messages
    #[arg(long)]
    lang: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    state: QueryState,
    issue: Option<String>,
    groups: &'a [EventGroup],
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    // Load configuration
    let settings = Settings::load(args.config.as_deref()).context("Failed to load configuration")?;
    settings.validate()?;

    if args.print_config {
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    // Initialize logging
    let _log_guard = logging::init_logging(&settings.logging)?;
    info!("Starting {}", EventLens::info());

    // Initialize i18n system
    let mut i18n = I18n::with_builtin_catalog(&settings.i18n);
    if let Err(e) = i18n.load_translations().await {
        warn!(error = %e, "Falling back to built-in translations");
    }
    let i18n = Arc::new(i18n);
    let language = i18n.detect_language(args.lang.as_deref());

    let source = services::build_event_source(&settings).await?;
    let coordinator = QueryCoordinator::from_settings(&settings, source)?
        .with_labels(Arc::new(LocalizedLabels::new(Arc::clone(&i18n), language.clone())));

    let criteria = criteria_from_args(&args, &coordinator.snapshot().criteria)?;
    let reference = criteria.coordinate();

    if !args.json {
        eprintln!("{}", i18n.t("status.loading", &language, None));
    }
    let outcome = coordinator.set_criteria(criteria).await;
    if let QueryOutcome::Failed { issue, .. } = &outcome {
        warn!(issue = %issue, "Query did not complete");
    }

    let snapshot = coordinator.snapshot();
    let issue = snapshot.issue.as_ref().map(|issue| describe_issue(&i18n, &language, issue));

    if args.json {
        let report = JsonReport {
            state: snapshot.state,
            issue,
            groups: &snapshot.groups,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if let Some(issue) = issue {
        eprintln!("{}", issue);
    }
    if snapshot.groups.is_empty() {
        println!("{}", i18n.t("status.empty", &language, None));
        return Ok(());
    }

    let zone = coordinator.day_zone();
    let total = snapshot.event_count() as i64;
    println!("{}", i18n.tp("summary.events", &language, total, None));

    for group in snapshot.groups.iter() {
        println!();
        println!("{}", group.label);
        for event in &group.events {
            let mut line = format!(
                "  {}  {}  [{} / {}]",
                zone.format_timestamp(event.scheduled_at),
                helpers::truncate_text(&event.title, 48),
                event.effective_participants(),
                helpers::format_capacity(event.capacity),
            );
            if let Some(reference) = reference {
                line.push_str(&format!("  {}", helpers::format_distance(reference.distance_to(&event.location))));
            }
            println!("{}", line);
        }
    }

    Ok(())
}

/// Apply command line overrides on top of the configured defaults
fn criteria_from_args(args: &Args, defaults: &FilterCriteria) -> anyhow::Result<FilterCriteria> {
    let mut builder = defaults.to_builder();

    match (args.lat, args.lon) {
        (Some(latitude), Some(longitude)) => {
            builder = builder.coordinate(Some(Coordinate::new(latitude, longitude)));
        }
        (None, None) => {}
        _ => bail!("--lat and --lon must be given together"),
    }
    if let Some(radius) = args.radius {
        builder = builder.radius_km(radius);
    }
    if let Some(search) = &args.search {
        builder = builder.search(search.as_str());
    }
    if let Some(category) = &args.category {
        builder = builder.category(Some(category.clone()));
    }
    if !args.sub_categories.is_empty() {
        builder = builder.sub_categories(args.sub_categories.iter().cloned());
    }
    if let Some(sort) = args.sort {
        builder = builder.sort(sort);
    }

    let criteria = builder
        .starts_after(args.from)
        .ends_before(args.to)
        .build()
        .context("Invalid query")?;
    Ok(criteria)
}

fn describe_issue(i18n: &I18n, language: &str, issue: &QueryIssue) -> String {
    let (key, reason) = match issue {
        QueryIssue::RetrievalFailed(e) => ("status.retrieval_failed", e.to_string()),
        QueryIssue::LocationUnavailable(reason) => ("status.location_unavailable", reason.clone()),
    };
    let params = HashMap::from([("reason".to_string(), reason)]);
    i18n.t(key, language, Some(&params))
}
