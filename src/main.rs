use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use favorites_scenario::browser::capabilities::DEFAULT_CDP_ENDPOINT;
use favorites_scenario::browser::{CapabilityPreset, Connector, LocalConnector, VendorConnector};
use favorites_scenario::config::{Credentials, ScenarioPlan};
use favorites_scenario::scenario::storefront::DEFAULT_BASE_URL;
use favorites_scenario::scenario::{ScenarioReport, ScenarioRunner, Storefront};

/// favorites-scenario: sign in, filter, favorite and verify on the demo storefront
#[derive(Parser)]
#[command(name = "favorites-scenario", version, about)]
struct Cli {
    /// Remote environment to run in
    #[arg(long, value_enum, default_value_t = CapabilityPreset::WindowsChrome)]
    capability: CapabilityPreset,

    /// Vendor CDP websocket endpoint
    #[arg(long, env = "SERVICE_CDP_ENDPOINT", default_value = DEFAULT_CDP_ENDPOINT)]
    endpoint: String,

    /// Launch a local Chrome instead of a vendor session
    #[arg(long)]
    local: bool,

    /// Show the local Chrome window (default: headless)
    #[arg(long, requires = "local")]
    headed: bool,

    /// Storefront base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Brand to filter the catalog by
    #[arg(long, default_value = "Samsung")]
    brand: String,

    /// Product to favorite
    #[arg(long, default_value = "Galaxy S20+")]
    item: String,

    /// Directory for failure screenshots
    #[arg(long)]
    artifacts_dir: Option<PathBuf>,

    /// Write the JSON report here
    #[arg(long)]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();
    let capability = cli.capability.descriptor();

    let connector: Arc<dyn Connector> = if cli.local {
        Arc::new(LocalConnector::new(!cli.headed))
    } else {
        Arc::new(VendorConnector::new(cli.endpoint.clone()))
    };

    let mut runner = ScenarioRunner::new(connector, Storefront::new(&cli.base_url));
    if let Some(dir) = cli.artifacts_dir {
        runner = runner.with_artifacts_dir(dir);
    }

    let plan = ScenarioPlan {
        brand: cli.brand,
        item: cli.item,
        ..Default::default()
    };
    let credentials = Credentials::from_env();

    tracing::info!(
        "Running favorites scenario on {} (local: {})",
        capability.name,
        cli.local
    );
    let mut report = ScenarioReport::new(&capability.name);
    let result = runner
        .run_into(&capability, credentials.as_ref(), &plan, &mut report)
        .await;

    if let Some(path) = &cli.report {
        report.write_json(path).await?;
        tracing::info!("Report written to {}", path.display());
    }
    result?;

    if report.passed() {
        tracing::info!("Scenario passed ({} checks)", report.outcomes.len());
        Ok(ExitCode::SUCCESS)
    } else {
        for failure in report.failures() {
            tracing::error!("{}: {}", failure.check, failure.detail);
        }
        Ok(ExitCode::FAILURE)
    }
}
