pub mod commands;
pub mod logging;

use clap::{Parser, Subcommand};
use leadflow_core::config::{ConfigOverrides, LlmProvider};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "leadflow",
    about = "Leadflow sales-qualification CLI",
    long_about = "Run sales-qualification conversations against the configured inference service and inspect configuration.",
    after_help = "Examples:\n  leadflow run --message \"Hi, we're evaluating tools\" --tenant tenant.toml\n  leadflow config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run one qualification conversation and print the outcome as JSON")]
    Run {
        #[arg(long, help = "Opening customer message")]
        message: String,
        #[arg(long, help = "Tenant configuration file (.toml or .json)")]
        tenant: PathBuf,
        #[arg(long, help = "Application config file (defaults to leadflow.toml)")]
        config: Option<PathBuf>,
        #[arg(long, help = "Override llm.provider (openai|anthropic|ollama)")]
        provider: Option<LlmProvider>,
        #[arg(long, help = "Override llm.model")]
        model: Option<String>,
        #[arg(long, help = "Override engine.max_steps")]
        max_steps: Option<u32>,
        #[arg(long, help = "Override logging.level")]
        log_level: Option<String>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config {
        #[arg(long, help = "Application config file (defaults to leadflow.toml)")]
        config: Option<PathBuf>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run { message, tenant, config, provider, model, max_steps, log_level } => {
            let overrides = ConfigOverrides {
                log_level,
                llm_provider: provider,
                llm_model: model,
                max_steps,
                ..ConfigOverrides::default()
            };
            commands::run::run(&commands::run::RunArgs { message, tenant, config, overrides })
        }
        Command::Config { config } => commands::config::run(config.as_deref()),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
