use crate::server;
use clap::{Args, Parser, Subcommand};
use fin_insight::error::AppError;
use fin_insight::presentation::SegmentCatalog;

#[derive(Parser, Debug)]
#[command(
    name = "FinInsight Platform",
    about = "Serve the FinInsight loan checker and segmentation analysis",
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
    /// Print the built-in segment catalog as JSON, a starting point for SEGMENT_CATALOG_PATH
    Catalog,
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
        Command::Catalog => print_catalog(),
    }
}

fn print_catalog() -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(&SegmentCatalog::standard())
        .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
    println!("{rendered}");
    Ok(())
}
