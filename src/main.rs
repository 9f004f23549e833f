use clap::Parser;
use oddsfeed::cli::{self, CheckCommand, Cli, Commands};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Run(args) => cli::run::execute(args).await,
        Commands::Check(CheckCommand::Config(arg)) => cli::check::execute_config(&arg.config),
        Commands::Inspect(args) => cli::inspect::execute(args),
    };

    if let Err(e) = result {
        if matches!(cli.command, Commands::Run(_)) {
            tracing::error!(error = %e, "Fatal error");
        }
        cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
