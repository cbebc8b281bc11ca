//! Voting client CLI
//!
//! Drives the wallet session and the voting contract from a terminal, with
//! a local key standing in for the browser wallet.

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use voting_dapp_client::contract::CandidateApplication;
use voting_dapp_client::provider::WalletProvider;
use voting_dapp_client::ui::{render, JsonLinesSink, LogSink, RenderSink};
use voting_dapp_client::wallet::{
    ApprovalPrompt, AutoApprove, ConsolePrompt, LocalWalletProvider, SecureWallet,
};
use voting_dapp_client::{
    ActionOrchestrator, ActionOutcome, Config, Error, Result, RpcConfig, VotingApp,
    PRIVATE_KEY_ENV,
};

#[derive(Parser)]
#[command(name = "voting-client")]
#[command(about = "Wallet and contract client for the on-chain voting app")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// How page updates are reported
    #[arg(long, global = true, value_enum, default_value_t = Output::Text)]
    output: Output,

    /// Approve wallet prompts without asking
    #[arg(short = 'y', long, global = true)]
    yes: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Output {
    /// Banners through the log
    Text,
    /// One render instruction per line on stdout
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect the wallet and check voter registration
    Connect,

    /// Show eligibility and the voting window for an election
    Status {
        #[arg(short, long)]
        election: u64,
    },

    /// Register the connected account as a voter
    RegisterVoter {
        #[arg(long, allow_negative_numbers = true)]
        age: i64,
    },

    /// Apply as a candidate
    RegisterCandidate {
        #[arg(long)]
        name: String,
        #[arg(long)]
        manifesto: String,
        #[arg(long)]
        age: u64,
        #[arg(long)]
        email: String,
    },

    /// Cast a vote
    Vote {
        #[arg(short, long)]
        election: u64,
        #[arg(short = 'C', long)]
        candidate: u64,
    },

    /// Show election details
    Election {
        #[arg(long)]
        id: u64,
    },

    /// List approved candidates
    Candidates,

    /// Show vote counts for an election
    Results {
        #[arg(short, long)]
        election: u64,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Commands::Config = cli.command {
        print_json(&config)?;
        return Ok(());
    }

    let sink: Arc<dyn RenderSink> = match cli.output {
        Output::Text => Arc::new(LogSink),
        Output::Json => Arc::new(JsonLinesSink),
    };
    let prompt: Arc<dyn ApprovalPrompt> = if cli.yes {
        Arc::new(AutoApprove)
    } else {
        Arc::new(ConsolePrompt)
    };

    let provider = local_provider(&config, prompt);
    let app = VotingApp::start(&config, provider, sink).await?;
    let orchestrator = app.orchestrator();

    match cli.command {
        Commands::Connect => {
            finish(orchestrator.connect_wallet().await)?;
        }
        Commands::Status { election } => {
            show_status(orchestrator, election).await?;
        }
        Commands::RegisterVoter { age } => {
            connect_then(orchestrator).await?;
            finish(orchestrator.register_voter(age).await)?;
        }
        Commands::RegisterCandidate {
            name,
            manifesto,
            age,
            email,
        } => {
            connect_then(orchestrator).await?;
            let application = CandidateApplication {
                name,
                manifesto,
                age,
                email,
            };
            finish(orchestrator.register_candidate(application).await)?;
        }
        Commands::Vote {
            election,
            candidate,
        } => {
            finish(orchestrator.cast_vote(election, candidate).await)?;
        }
        Commands::Election { id } => {
            print_json(&orchestrator.contract()?.get_election(id).await?)?;
        }
        Commands::Candidates => {
            print_json(&orchestrator.contract()?.get_approved_candidates().await?)?;
        }
        Commands::Results { election } => {
            print_json(&orchestrator.contract()?.get_election_results(election).await?)?;
        }
        Commands::Config => {}
    }

    Ok(())
}

fn init_logging(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
}

/// The local wallet, or `None` when no key or RPC endpoint is available
fn local_provider(
    config: &Config,
    prompt: Arc<dyn ApprovalPrompt>,
) -> Option<Arc<dyn WalletProvider>> {
    let wallet = match SecureWallet::from_env(PRIVATE_KEY_ENV) {
        Ok(wallet) => wallet,
        Err(e) => {
            tracing::warn!(error = %e, "No local wallet");
            return None;
        }
    };

    let rpc = RpcConfig::from_env();
    let Some(url) = rpc.get(config.chain_id) else {
        tracing::warn!(chain_id = config.chain_id, "No RPC URL configured");
        return None;
    };

    match LocalWalletProvider::new(wallet, url, prompt) {
        Ok(provider) => {
            tracing::info!(address = %provider.address(), chain_id = config.chain_id, "Loaded wallet from PRIVATE_KEY");
            Some(Arc::new(provider))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to start local wallet");
            None
        }
    }
}

async fn connect_then(orchestrator: &ActionOrchestrator) -> Result<()> {
    if orchestrator.session().current_account().is_none() {
        finish(orchestrator.connect_wallet().await)?;
    }
    Ok(())
}

fn finish(outcome: ActionOutcome) -> Result<()> {
    match outcome {
        ActionOutcome::Connected(account) => {
            println!("Connected {}", account);
            Ok(())
        }
        ActionOutcome::Submitted(tx) => print_json(&tx),
        ActionOutcome::Failed(e) => Err(e),
    }
}

async fn show_status(orchestrator: &ActionOrchestrator, election_id: u64) -> Result<()> {
    connect_then(orchestrator).await?;
    let verdict = orchestrator.eligibility()?.verdict(election_id).await?;
    orchestrator
        .notifier()
        .render(render::voting_status(verdict.is_voting_open));

    let election = orchestrator.contract()?.get_election(election_id).await?;
    if let Some(end) = election
        .fields
        .get("endTime")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<i64>().ok())
    {
        let end = chrono::DateTime::from_timestamp(end, 0)
            .ok_or_else(|| Error::Abi(format!("endTime {} out of range", end)))?;
        orchestrator
            .notifier()
            .render(render::countdown(end - chrono::Utc::now()));
    }

    #[derive(Serialize)]
    struct Status<'a> {
        eligible: bool,
        reason: Option<&'static str>,
        verdict: &'a voting_dapp_client::eligibility::EligibilityVerdict,
    }
    print_json(&Status {
        eligible: verdict.is_eligible(),
        reason: verdict.reason(),
        verdict: &verdict,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
