//! Terminal client for the SpaceTraders API.
//!
//! ```bash
//! # interactive tabs for status, agent, ships, contracts and factions
//! spaceterminal
//!
//! # one-shot commands
//! spaceterminal --token "$TOKEN" agent
//! spaceterminal register ZER0_SH0T --faction cosmic --save
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use itertools::Itertools;

mod astronomicon;
mod captains_log;
mod duties;
mod endpoints;
mod envelope;
mod identity_manager;
mod log;
mod settings;
mod signaller;
mod ui;

use captains_log::{AgentPhase, CaptainsLog};
use envelope::Fault;
use identity_manager::IdentityManager;
use log::LogTarget;
use settings::{LoadedSettings, Settings};
use signaller::{Credentials, Signaller};

#[derive(Parser)]
#[command(name = "spaceterminal")]
#[command(version)]
#[command(about = "Terminal client for the SpaceTraders API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Settings file (yaml)
    #[arg(long, short, global = true, default_value = settings::DEFAULT_SETTINGS_FILE)]
    config: PathBuf,

    /// Access token, overrides SPACETRADERS_TOKEN and the token file
    #[arg(long, global = true)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive terminal interface (default)
    Tui,
    /// Server status
    Status,
    /// Current agent profile
    Agent,
    /// Owned ships as a tree
    Ships,
    /// Contracts as a tree
    Contracts,
    /// Factions currently recruiting
    Factions,
    /// Register a new agent
    Register {
        /// Call sign, e.g. ZER0_SH0T
        symbol: String,
        /// Starting faction
        #[arg(long, short, default_value = "COSMIC")]
        faction: String,
        /// Write the new token to the token file
        #[arg(long)]
        save: bool,
    },
    /// Write the current token to the token file
    SaveToken,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let LoadedSettings {
        settings,
        file_found,
        warnings,
    } = Settings::load(&cli.config)?;
    let command = cli.command.unwrap_or(Commands::Tui);
    let target = match command {
        Commands::Tui => LogTarget::File,
        _ => LogTarget::Stderr,
    };
    log::init(target, &settings.log_file)
        .with_context(|| format!("Failed to open log file {}", settings.log_file.display()))?;
    if !file_found {
        tracing::debug!("No settings file at {}, using defaults", cli.config.display());
    }
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    let identity = IdentityManager::new(settings.token_file.clone());
    let token = match cli.token.or_else(|| std::env::var("SPACETRADERS_TOKEN").ok()) {
        Some(token) => Some(token),
        None => identity.load_token()?,
    };
    let signaller = Signaller::from_settings(&settings, Credentials::new(token))
        .context("Failed to create HTTP client")?;
    tracing::debug!("Using {}", settings.base_url);

    match command {
        Commands::Tui => {
            let app = ui::app::App::new(CaptainsLog::new(signaller), identity);
            ui::run(app).await.context("Terminal interface failed")?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Status => {
            let status = duties::fetch_status(&signaller).await;
            report(status.map(|status| {
                println!("Status: {}", status.status);
                println!("Version: {}", status.version);
                println!("Reset Date: {}", status.reset_date);
                println!(
                    "Agents: {} | Ships: {} | Systems: {} | Waypoints: {}",
                    status.stats.agents,
                    status.stats.ships,
                    status.stats.systems,
                    status.stats.waypoints
                );
                println!(
                    "Next reset: {} ({})",
                    status.server_resets.next, status.server_resets.frequency
                );
            }))
        }
        Commands::Agent => {
            let mut log = CaptainsLog::new(signaller);
            log.refresh(None).await;
            Ok(print_agent(&log))
        }
        Commands::Ships => report(duties::fetch_ships(&signaller).await.map(|tree| print!("{}", tree))),
        Commands::Contracts => {
            report(duties::fetch_contracts(&signaller).await.map(|tree| print!("{}", tree)))
        }
        Commands::Factions => report(duties::fetch_factions(&signaller).await.map(|factions| {
            println!(
                "Recruiting: {}",
                factions.iter().map(|f| f.symbol.as_str()).join(", ")
            );
        })),
        Commands::Register {
            symbol,
            faction,
            save,
        } => {
            let mut log = CaptainsLog::new(signaller);
            log.register(&symbol, &faction).await;
            let code = print_agent(&log);
            if log.record().last_error.is_none() {
                if let Some(token) = log.signaller().token() {
                    println!("Access token: {}", token);
                    if save {
                        identity.save_token(Some(&token))?;
                        println!("Token saved to {}", identity.path().display());
                    }
                }
            }
            Ok(code)
        }
        Commands::SaveToken => {
            identity.save_token(signaller.token().as_deref())?;
            println!("Token saved to {}", identity.path().display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn report(result: Result<(), Fault>) -> anyhow::Result<ExitCode> {
    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(fault) => {
            eprintln!("{}", fault);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_agent(log: &CaptainsLog) -> ExitCode {
    let record = log.record();
    if let Some(fault) = &record.last_error {
        eprintln!("{}", fault);
    }
    if record.phase() == AgentPhase::Unauthenticated {
        return ExitCode::FAILURE;
    }
    let profile = &record.profile;
    println!("Account ID: {}", profile.account_id);
    println!("Symbol: {}", profile.symbol);
    println!("Headquarters: {}", profile.headquarters);
    println!("Credits: {}", profile.credits);
    println!("Starting Faction: {}", profile.starting_faction);
    match record.phase() {
        AgentPhase::PopulatedWithError => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}
