//! Alignment scan binary.
//!
//! Loads the configuration, fetches reference elements for the configured
//! planets, and runs the selected mode over the scan window.
//!
//! # Usage
//!
//! ```bash
//! # Defaults from ./alignment.toml (or built-in defaults), queried from Horizons
//! cargo run --bin ecliptic-scan
//!
//! # Explicit config, offline synthetic sky
//! EPHEMERIS_TYPE=local cargo run --bin ecliptic-scan -- demo.toml
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log level (default: info)
//! - `ALIGN_*` and `EPHEMERIS_*`: configuration overrides, see [`AlignmentConfig`]

use std::env;
use std::path::PathBuf;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ecliptic_align::config::{OutputFormat, OutputMode};
use ecliptic_align::ephemeris::EphemerisFactory;
use ecliptic_align::services::{compare_strategies, load_configured_bodies, span_series};
use ecliptic_align::{AlignmentConfig, ScanOrchestrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config_path = env::args().nth(1).map(PathBuf::from);
    let config = AlignmentConfig::load(config_path.as_deref())?;
    let window = config.window();
    let threshold = config.scan.threshold_deg;

    info!(
        "Scanning {} to {} for {} (threshold {}°, {} strategy)",
        window.start,
        window.end,
        config.scan.planets.join(", "),
        threshold,
        config.scan.strategy
    );

    let client = EphemerisFactory::create(&config.ephemeris)?;
    if !client.health_check().await? {
        anyhow::bail!("ephemeris service is not reachable");
    }

    let (bodies, observer) = load_configured_bodies(client.as_ref(), &config).await?;
    let orchestrator = ScanOrchestrator::new(client)
        .with_max_concurrency(config.ephemeris.max_concurrency)
        .with_margin_factor(config.candidates.margin_factor)
        .with_projection(config.candidates.projection)
        .with_observer(observer);

    match config.output.mode {
        OutputMode::Scan => {
            let report = orchestrator
                .scan(config.scan.strategy, &bodies, &window, threshold)
                .await?;
            match config.output.format {
                OutputFormat::Text => println!("{}", report),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
        OutputMode::Compare => {
            let report = compare_strategies(&orchestrator, &bodies, &window, threshold).await?;
            match config.output.format {
                OutputFormat::Text => {
                    println!("{}", report.exhaustive);
                    println!();
                    println!("{}", report);
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
        OutputMode::Spans => {
            let series = span_series(&orchestrator, &bodies, &window, threshold).await?;
            match config.output.format {
                OutputFormat::Text => print!("{}", series.to_tsv()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&series)?),
            }
            if let Some((date, spread)) = series.minimum() {
                info!("Tightest grouping on {}: {:.2}°", date, spread.value());
            }
        }
    }

    Ok(())
}
