use clap::Parser;
use tracing_subscriber::EnvFilter;
use unidash::cli::commands::Cli;
use unidash::cli::handlers;

fn main() {
    let filter = EnvFilter::try_from_env("UNIDASH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();
    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
