use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
use commands::scan::ScanArgs;

#[derive(Parser)]
#[command(name = "kansa")]
#[command(about = "LLM-backed security scanning for remote repositories")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a repository and report security findings per file.
    Scan(ScanArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => {
            init_logging(args.verbose);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(commands::scan::execute(args))
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_args_parse() {
        let cli = Cli::try_parse_from([
            "kansa",
            "scan",
            "https://github.com/acme/webapp",
            "-j",
            "4",
            "--model",
            "gpt-4o",
            "--format",
            "json",
        ])
        .unwrap();

        let Commands::Scan(args) = cli.command;
        assert_eq!(args.repo, "https://github.com/acme/webapp");
        assert_eq!(args.concurrency, Some(4));
        assert_eq!(args.model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn test_repo_argument_is_required() {
        assert!(Cli::try_parse_from(["kansa", "scan"]).is_err());
    }
}
