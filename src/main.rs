use clap::{Parser, Subcommand};
use fridata::config::Config;
use fridata::gateway::{HttpGateway, JobGateway};
use fridata::runner::{run_headless, RunOptions};
use fridata::utils::{init_logging, with_retry, ConsoleMode, RetryPolicy};
use fridata::workflow::WorkflowController;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "fridata", version, about = "Human-in-the-loop data cleaning client")]
struct Cli {
    /// Backend API base URL (overrides FRIDATA_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Enable verbose logging on stderr
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive terminal UI (default)
    Tui,

    /// Upload a file, request a plan and optionally execute it
    Run {
        /// CSV or Excel file to clean
        #[arg(short, long)]
        file: PathBuf,

        /// Cleaning instruction in plain language
        #[arg(short, long)]
        prompt: String,

        /// Execute the proposed plan without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Check that the backend is reachable
    Health,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(url) = cli.api_url.clone() {
        config.gateway.base_url = url;
    }
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let command = cli.command.unwrap_or(Commands::Tui);
    let mode = match command {
        Commands::Tui => ConsoleMode::Tui,
        _ => ConsoleMode::Headless { verbose: cli.verbose },
    };
    let _log_guard = init_logging(&config.logging, mode);
    info!(base_url = %config.gateway.base_url, "Configuration loaded");

    match run(command, config).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: Config) -> anyhow::Result<ExitCode> {
    let gateway: Arc<dyn JobGateway> = Arc::new(HttpGateway::from_config(&config.gateway)?);

    match command {
        Commands::Tui => {
            fridata::tui::run(config, gateway).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run { file, prompt, yes } => {
            let controller = WorkflowController::new(gateway)
                .with_size_advisory(config.upload.size_advisory_bytes);
            let options = RunOptions {
                file,
                prompt,
                confirm: yes,
            };
            let mut stdout = std::io::stdout().lock();
            run_headless(&controller, &options, &mut stdout).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Health => {
            let healthy = with_retry(RetryPolicy::default(), || gateway.health()).await?;
            if healthy {
                println!("Backend at {} is up", config.gateway.base_url);
                Ok(ExitCode::SUCCESS)
            } else {
                println!("Backend at {} answered but is not ready", config.gateway.base_url);
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
