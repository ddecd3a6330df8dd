use std::io;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plugin_studio_core::Result;

mod args;
mod commands;
mod logger;
mod prompt;

use args::{Cli, Commands, Shell};
use commands::Context;
use logger::{Logger, Verbosity};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbosity = Verbosity::from_flags(cli.verbose, cli.quiet);
    init_tracing(verbosity);

    match run(cli, verbosity).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(cli: Cli, verbosity: Verbosity) -> Result<()> {
    let command = cli.command.unwrap_or(Commands::Watch);
    if let Commands::Completions { shell } = command {
        handle_completions(shell);
        return Ok(());
    }

    let ctx = Context::new(cli.dir, cli.config.as_deref(), Logger::new(verbosity))?;

    match command {
        Commands::Watch => commands::watch::run(&ctx).await,
        Commands::Validate => commands::validate::run(&ctx).await,
        Commands::Create => commands::create::run(&ctx),
        Commands::Completions { .. } => Ok(()),
    }
}

fn init_tracing(verbosity: Verbosity) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| verbosity.tracing_filter().into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
        Shell::Elvish => clap_complete::Shell::Elvish,
    };
    generate(shell, &mut cmd, "cps", &mut io::stdout());
}
