use anyhow::Result;
use clap::Parser;
use route_planner_client::cli;
use route_planner_client::logging::{self, LogSink};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_non_tui = !args.is_interactive();

    let sink = match (args.log_file.as_deref(), is_non_tui) {
        (Some(path), _) => LogSink::File(path),
        (None, true) => LogSink::Stderr,
        (None, false) => LogSink::Off,
    };
    logging::init(sink)?;

    cli::run(args).await?;
    // Explicitly exit with code 0 on success, especially for non-TUI modes
    if is_non_tui {
        std::process::exit(0);
    }
    Ok(())
}
