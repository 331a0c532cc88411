//! Screen applicants from a JSON file (or stdin) and print the outcomes
//!
//! Usage: `kyc-screen [applicants.json]`
//!
//! Input is a single attribute object or an array of them. Configuration is
//! read from the TOML file named by `KYC_CONFIG`, then `KYC_*` overrides.

use anyhow::Context;
use screening_engine::{Attributes, Config, NoAdverseMedia, ScreeningService};
use serde::Deserialize;
use std::io::Read;
use std::sync::Arc;

#[derive(Deserialize)]
#[serde(untagged)]
enum Input {
    Many(Vec<Attributes>),
    One(Attributes),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::var("KYC_CONFIG") {
        Ok(path) => Config::from_file(&path)?.with_env_overrides()?,
        Err(_) => Config::from_env()?,
    };
    tracing::info!("Starting {}", config.service_name);

    let mut raw = String::new();
    match std::env::args().nth(1) {
        Some(path) => {
            raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading applicants from {}", path))?;
        }
        None => {
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("reading applicants from stdin")?;
        }
    }

    let applicants = match serde_json::from_str(&raw).context("parsing applicants")? {
        Input::Many(applicants) => applicants,
        Input::One(applicant) => vec![applicant],
    };

    let service = ScreeningService::from_config(&config, Arc::new(NoAdverseMedia));
    let outcomes = service.screen_batch(applicants).await;

    let report = serde_json::json!({
        "total": outcomes.len(),
        "results": outcomes,
        "metrics": service.get_metrics(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
