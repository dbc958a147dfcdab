use crate::demo::{run_demo, run_distribution, run_lookup, DistributionArgs, LookupArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use open_advocacy::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Open Advocacy",
    about = "Find your representatives and track where they stand on advocacy projects",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Resolve an address to its districts and representatives
    Lookup(LookupArgs),
    /// Print a project's status distribution
    Distribution(DistributionArgs),
    /// Walk through the Chicago scenario against the built-in demo data
    Demo,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Lookup(args) => run_lookup(args).await,
        Command::Distribution(args) => run_distribution(args),
        Command::Demo => run_demo().await,
    }
}
