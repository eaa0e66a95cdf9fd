use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use tripplan::cli::{Cli, Command, render_routes};
use tripplan::{AgentSet, PlanOrchestrator, TripPlanConfig, telemetry};

/// Exit code for a run that produced no plan
const NO_PLAN: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = TripPlanConfig::load_from_path(cli.config.clone())
        .context("Failed to load configuration")?;
    if let Some(mode) = cli.mode {
        config.mode = mode;
        config.validate()?;
    }
    let _telemetry = telemetry::init(&config.logging, cli.verbose)?;

    let args = match cli.command {
        Command::Routes => {
            print!("{}", render_routes());
            return Ok(ExitCode::SUCCESS);
        }
        Command::Plan(args) => args,
    };

    let agents = AgentSet::for_mode(&config)?;
    let orchestrator = PlanOrchestrator::new(agents, &config);
    let request = args.to_request();
    info!(mode = %config.mode, "Planning trip");

    match orchestrator.plan(&request).await {
        Ok(plan) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                println!("{plan}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            if args.json {
                let failure = serde_json::json!({
                    "status": "failed",
                    "code": e.code(),
                    "message": e.user_message(),
                    "detail": e.to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&failure)?);
            } else {
                eprintln!("❌ {}", e.user_message());
                eprintln!("   [{}] {e}", e.code());
            }
            Ok(ExitCode::from(NO_PLAN))
        }
    }
}
