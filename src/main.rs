use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod core;
mod pairing;
mod parsing;
mod segmentation;
mod utils;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("mrf_tools=debug,info")
    } else {
        EnvFilter::new("mrf_tools=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::View(args) => {
            cli::view::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Convert(args) => {
            cli::convert::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Segment(args) => {
            cli::segment::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Filter(args) => {
            cli::filter::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
