//! Mini Miner - Main Application
//!
//! Fetches a proof-of-work problem, solves it and submits the nonce.

use mini_miner::{
    client::ChallengeClient,
    config::Config,
    utils::{init_logging, redact},
    Error, Miner, Result, APP_DESCRIPTION, APP_NAME, APP_VERSION,
};
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // Load and validate configuration
    let config = match Config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    // Handle special commands
    if config.info {
        print_info();
        return ExitCode::SUCCESS;
    }

    if config.print_config {
        return match print_configuration(&config) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::from(e.exit_code())
            }
        };
    }

    init_logging(config.log_level.as_str(), config.log_format.as_str());

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(category = e.category(), "{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

/// Fetch, solve, submit
async fn run(config: Config) -> Result<()> {
    // Fails here, before any network or search work, when the token is missing
    let client_config = config.client_config()?;
    let miner = Miner::new(config.search_policy()?).with_progress_interval(config.progress_interval);

    info!("Starting {} v{}", APP_NAME, APP_VERSION);
    info!(
        token = %redact(&client_config.token),
        base_url = %client_config.base_url,
        challenge = %client_config.challenge,
        "Using HACKATTIC_TOKEN"
    );

    let client = ChallengeClient::new(client_config)?;
    let problem = client.fetch_problem().await?;

    // CPU-bound; keep it off the runtime's worker threads
    let outcome = tokio::task::spawn_blocking(move || miner.solve(problem)).await??;

    if config.dry_run {
        info!(nonce = %outcome.solution.nonce, "Dry run, not submitting");
        println!(
            "{}",
            serde_json::to_string(&outcome.solution).map_err(Error::encoding)?
        );
        return Ok(());
    }

    let response = client.submit_solution(&outcome.solution).await?;
    match response.json() {
        Some(body) => info!(status = response.status, %body, "Got response to solution"),
        None => info!(status = response.status, body = %response.body.trim(), "Got response to solution"),
    }
    println!("{}", response.body.trim());

    Ok(())
}

/// Print basic program information
fn print_info() {
    println!("{} v{}", APP_NAME, APP_VERSION);
    println!("{}", APP_DESCRIPTION);
    println!();
    println!("Set HACKATTIC_TOKEN (or pass --token) before running.");
}

/// Print current configuration
fn print_configuration(config: &Config) -> Result<()> {
    let config_yaml = serde_yaml::to_string(config)?;
    println!("{}", config_yaml);
    Ok(())
}
