//! ACME DNS-01 challenge hook for SberCloud DNS.
//!
//! `present` creates the `_acme-challenge` TXT record for a domain,
//! `cleanup` removes it again. Credentials and region come from flags or the
//! `SBC_*` environment variables, matching what ACME clients export for
//! exec-style DNS hooks.

use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sbercloud_dns::SberCloudDns;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(
    name = "sbercloud-acme-hook",
    version,
    about = "ACME DNS-01 challenge hook for SberCloud DNS"
)]
struct Cli {
    /// Access key id for API request signing
    #[arg(long, env = "SBC_ACCESS_KEY", hide_env_values = true)]
    access_key: String,

    /// Secret access key for API request signing
    #[arg(long, env = "SBC_SECRET_KEY", hide_env_values = true)]
    secret_key: String,

    /// Project (tenant) name; when set, DNS calls are scoped to it
    #[arg(long, env = "SBC_PROJECT_NAME")]
    project_name: Option<String>,

    /// SberCloud region, e.g. ru-moscow-1
    #[arg(long, env = "SBC_REGION_NAME")]
    region: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the challenge TXT record
    Present {
        /// Challenge record name, e.g. _acme-challenge.example.com.
        fqdn: String,
        /// Challenge token value
        challenge: String,
    },
    /// Remove the challenge TXT record
    Cleanup {
        /// Challenge record name, e.g. _acme-challenge.example.com.
        fqdn: String,
        /// Challenge token value
        challenge: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // ACME clients surface hook stdout to the user.
            println!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr so stdout stays clean for the ACME client.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut dns = SberCloudDns::for_region(cli.access_key, cli.secret_key, &cli.region)
        .context("failed to build DNS client")?;

    if let Some(project_name) = &cli.project_name {
        let project_id = dns.find_project_id(project_name).await?;
        dns.set_project_id(project_id);
    }

    let (fqdn, challenge) = match &cli.command {
        Command::Present { fqdn, challenge } | Command::Cleanup { fqdn, challenge } => {
            (fqdn.as_str(), challenge.as_str())
        }
    };

    let zone = registrable_zone(fqdn)?;
    let zone_id = dns.find_zone_id(&zone).await?;

    match cli.command {
        Command::Present { .. } => {
            let record_id = dns.present(&zone_id, fqdn, challenge).await?;
            info!(%record_id, %zone, "challenge record created");
        }
        Command::Cleanup { .. } => {
            dns.cleanup(&zone_id, fqdn, challenge).await?;
            info!(%zone, "challenge record removed");
        }
    }

    Ok(())
}

/// Derives the hosted zone from the challenge FQDN: the registrable domain
/// (public-suffix list) with the trailing dot the DNS API expects.
fn registrable_zone(fqdn: &str) -> anyhow::Result<String> {
    let name = fqdn.trim_end_matches('.');
    let domain = psl::domain_str(name)
        .with_context(|| format!("cannot determine registrable domain for '{fqdn}'"))?;
    Ok(format!("{domain}."))
}
