//! `pan-checkin` binary: one daily run, report on stdout.
//!
//! Diagnostics go to stderr (`RUST_LOG` controls verbosity). The rendered
//! run log is printed to stdout when the run completes. The exit status is
//! non-zero only for configuration problems detected before the run.

use clap::Parser;
use pan_checkin::{CheckinConfig, Secrets, Workflow, notify};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "pan-checkin", version, about)]
struct Cli {
    /// Config file (TOML). Defaults to `$XDG_CONFIG_HOME/pan-checkin/config.toml`.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Skip the randomized startup delay and all pauses between requests.
    #[arg(long)]
    no_delay: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("pan_checkin=info,checkin_http=info")
            }),
        )
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => CheckinConfig::from_file(path)
            .map_err(|e| anyhow::anyhow!("failed to load {}: {e}", path.display()))?,
        None => CheckinConfig::load_or_default(&CheckinConfig::default_config_path())?,
    };
    if cli.no_delay {
        config = config.with_no_delay();
    }
    config.validate()?;

    let secrets = Secrets::from_env();
    let client = checkin_http::build_client()?;
    let notifier = notify::from_config(&config.notify, &secrets, client.clone());

    tracing::info!(base_url = %config.base_url, "pan-checkin starting");
    let report = Workflow::new(config, client)
        .with_notifier(notifier)
        .run(secrets.cookie_str())
        .await;

    println!("{}", report.log.render());
    tracing::info!(
        status = report.summary.status(),
        notified = report.notified,
        "pan-checkin finished"
    );
    Ok(())
}
