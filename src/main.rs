//! Storefront Analytics CLI
//!
//! Loads order and location tables, applies the approval date window,
//! and writes the dashboard report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing file, schema mismatch, invalid config, etc.)
//!   2 - A panel had no data in range and --fail-on-empty was set

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Instant;
use storefront_analytics::cli::{Args, OutputFormat};
use storefront_analytics::config::{Config, CONFIG_FILE};
use storefront_analytics::ingest::{self, DateRange};
use storefront_analytics::models::{OrderFact, ReportMetadata};
use storefront_analytics::report;
use storefront_analytics::{AggregationEngine, GeoSampler};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is read before logging so its `verbose` key can take effect
    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(config.log_level(&args));

    info!("storefront-analytics v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_source {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    match run_dashboard(&args, &config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Dashboard failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .storefront.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the date window, ranking size, and base map.");
    Ok(())
}

/// Initialize logging at the merged verbosity level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Build the dashboard report. Returns the exit code (0 or 2).
fn run_dashboard(args: &Args, config: &Config) -> Result<i32> {
    let start_time = Instant::now();

    let orders_path = args
        .orders
        .clone()
        .context("--orders is required")?;

    // Step 1: Load the order table
    println!("📥 Loading orders: {}", orders_path.display());
    let orders = ingest::load_orders(&orders_path)
        .with_context(|| format!("Failed to load orders from {}", orders_path.display()))?;
    let rows_loaded = orders.len();
    info!("Loaded {} order rows", rows_loaded);

    // Step 2: Apply the date window
    let date_range = resolve_date_range(args, &orders)?;
    let filtered = match date_range {
        Some(range) => {
            println!("📅 Date range: {}", range);
            range.filter(&orders)
        }
        None => orders,
    };
    let rows_in_range = filtered.len();
    info!("{} order rows in range", rows_in_range);

    // Step 3: Load customer locations
    let locations = match args.geolocation {
        Some(ref path) => {
            println!("🗺️  Loading customer locations: {}", path.display());
            let raw = ingest::load_locations(path)
                .with_context(|| format!("Failed to load locations from {}", path.display()))?;
            ingest::dedup_locations(raw)
        }
        None => {
            debug!("No location table given, map panel will be empty");
            Vec::new()
        }
    };

    if args.dry_run {
        return handle_dry_run(rows_loaded, rows_in_range, locations.len());
    }

    // Step 4: Compute the panels
    println!("\n🔬 Aggregating {} rows...", rows_in_range);
    let engine = AggregationEngine::with_options(filtered, config.engine_options())?;
    let sampler = GeoSampler::new(locations, config.base_map())?
        .with_max_points(config.map.max_points);

    let metadata = ReportMetadata {
        orders_source: orders_path.display().to_string(),
        locations_source: args.geolocation.as_ref().map(|p| p.display().to_string()),
        generated_at: Utc::now(),
        date_range,
        rows_loaded,
        rows_in_range,
        duration_seconds: 0.0,
    };

    let (mut report, points) =
        report::build_report(&engine, &sampler, metadata, config.engine.top_n);
    report.metadata.duration_seconds = start_time.elapsed().as_secs_f64();

    // Step 5: Write the outputs
    println!("\n📝 Generating report...");
    let output = match config.general.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    std::fs::write(&config.general.output, &output)
        .with_context(|| format!("Failed to write report to {}", config.general.output))?;

    if let Some(ref points_path) = args.points_output {
        let json = report::generate_points_json(&points)?;
        std::fs::write(points_path, json).with_context(|| {
            format!("Failed to write map points to {}", points_path.display())
        })?;
        info!("Wrote {} map points to {}", points.len(), points_path.display());
    }

    // Print summary
    let unavailable = report.unavailable_panels();
    println!("\n📊 Dashboard Summary:");
    if let Some(daily) = report.daily_orders.ready() {
        println!("   Orders: {} | Revenue: {:.2}", daily.total_orders(), daily.total_revenue());
    }
    println!("   Map: {}", report.customer_map);
    if !unavailable.is_empty() {
        println!("   ⚠️  No data in range for: {}", unavailable.join(", "));
    }
    println!("   Duration: {:.2}s", start_time.elapsed().as_secs_f64());
    println!(
        "\n✅ Report saved to: {}",
        config.general.output
    );

    if args.fail_on_empty && !unavailable.is_empty() {
        eprintln!(
            "\n⛔ {} panel(s) had no data. Failing (exit code 2).",
            unavailable.len()
        );
        return Ok(2);
    }

    Ok(0)
}

/// Work out the date window from --start/--end.
///
/// A missing bound falls back to the earliest or latest approval date; a
/// window entirely outside the data is kept and yields empty panels.
fn resolve_date_range(args: &Args, orders: &[OrderFact]) -> Result<Option<DateRange>> {
    if args.has_date_filter() && DateRange::covering(orders).is_none() {
        warn!("No order has an approval date; the date filter leaves nothing");
    }
    Ok(DateRange::from_bounds(args.start, args.end, orders)?)
}

/// Handle --dry-run: report what was loaded and exit.
fn handle_dry_run(rows_loaded: usize, rows_in_range: usize, locations: usize) -> Result<i32> {
    println!("\n🔍 Dry run: inputs loaded and validated\n");
    println!("   Order rows loaded:   {}", rows_loaded);
    println!("   Order rows in range: {}", rows_in_range);
    println!("   Unique customers:    {}", locations);
    println!("\n✅ Dry run complete. No report was written.");
    Ok(0)
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
/// Returns the config and the file it came from, if any.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, Some(PathBuf::from(CONFIG_FILE)))),
        Ok(None) => Ok((Config::default(), None)),
        Err(e) => {
            eprintln!("⚠️  Failed to load config, using defaults: {:#}", e);
            Ok((Config::default(), None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use storefront_analytics::geo::BaseMap;
    use storefront_analytics::models::PanelOutcome;

    fn fixture(name: &str) -> String {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("fixtures")
            .join(name)
            .display()
            .to_string()
    }

    fn parse(extra: &[&str]) -> Args {
        let orders = fixture("orders.csv");
        let mut argv = vec!["storefront-analytics", "--orders", orders.as_str()];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    fn fixture_orders() -> Vec<OrderFact> {
        ingest::load_orders(Path::new(&fixture("orders.csv"))).unwrap()
    }

    #[test]
    fn test_no_bounds_means_no_window() {
        let args = parse(&[]);
        assert_eq!(resolve_date_range(&args, &fixture_orders()).unwrap(), None);
    }

    #[test]
    fn test_start_after_data_gives_empty_panels() {
        let args = parse(&["--start", "2030-01-01"]);
        let orders = fixture_orders();

        let range = resolve_date_range(&args, &orders).unwrap().unwrap();
        assert_eq!(range.start, range.end);
        let filtered = range.filter(&orders);
        assert!(filtered.is_empty());

        let engine = AggregationEngine::new(filtered);
        let sampler = GeoSampler::new(Vec::new(), BaseMap::default()).unwrap();
        let metadata = ReportMetadata {
            orders_source: fixture("orders.csv"),
            locations_source: None,
            generated_at: Utc::now(),
            date_range: Some(range),
            rows_loaded: orders.len(),
            rows_in_range: 0,
            duration_seconds: 0.0,
        };
        let (report, _) = report::build_report(&engine, &sampler, metadata, 5);
        assert_eq!(report.unavailable_panels().len(), 6);
        assert!(matches!(
            report.daily_orders,
            PanelOutcome::Unavailable { .. }
        ));
    }

    #[test]
    fn test_end_before_data_keeps_window() {
        let args = parse(&["--end", "2010-01-01"]);
        let orders = fixture_orders();
        let range = resolve_date_range(&args, &orders).unwrap().unwrap();
        assert_eq!(range.end, chrono::NaiveDate::from_ymd_opt(2010, 1, 1).unwrap());
        assert!(range.filter(&orders).is_empty());
    }

    #[test]
    fn test_empty_window_fails_with_exit_code_two() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.md");
        let output_arg = output.display().to_string();
        let args = parse(&[
            "--start",
            "2030-01-01",
            "--fail-on-empty",
            "--output",
            output_arg.as_str(),
        ]);
        let mut config = Config::default();
        config.merge_with_args(&args);

        assert_eq!(run_dashboard(&args, &config).unwrap(), 2);
        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.contains("2030-01-01"));
    }

    #[test]
    fn test_full_window_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.json");
        let output_arg = output.display().to_string();
        let args = parse(&["--format", "json", "--output", output_arg.as_str()]);
        let mut config = Config::default();
        config.merge_with_args(&args);

        assert_eq!(run_dashboard(&args, &config).unwrap(), 0);
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert!(json["metadata"]["duration_seconds"].as_f64().unwrap() >= 0.0);
    }
}
