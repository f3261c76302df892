use crate::config::FileConfig;
use crate::model::{Endpoint, SessionConfig, SessionView};
use crate::session::{CompletionOutcome, MapSession};
use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "route-planner",
    version,
    about = "Edit bus stop pairs and fetch ant-colony routes from a route planning backend"
)]
pub struct Cli {
    /// Base URL of the route planning backend
    #[arg(long)]
    pub base_url: Option<String>,

    /// Stop pair as START:END; repeat for more pairs, order is kept
    #[arg(long = "stop", value_name = "START:END", value_parser = parse_stop_pair)]
    pub stops: Vec<(String, String)>,

    /// Number of ants, sent as-is
    #[arg(long)]
    pub ants: Option<String>,

    /// Number of iterations, sent as-is
    #[arg(long)]
    pub iterations: Option<String>,

    /// Selected mode
    #[arg(long)]
    pub mode: Option<String>,

    /// Mode tokens offered by the selector (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub modes: Option<Vec<String>>,

    /// Mode to send when none is selected (otherwise the request is refused)
    #[arg(long)]
    pub fallback_mode: Option<String>,

    /// Send stop pairs only, without ants/iterations/mode
    #[arg(long)]
    pub reduced: bool,

    /// Fetch the default stop layout (on launch in the TUI)
    #[arg(long)]
    pub new_map: bool,

    /// Request timeout (none by default)
    #[arg(long)]
    pub timeout: Option<humantime::Duration>,

    /// Name of the render target region
    #[arg(long)]
    pub render_target: Option<String>,

    /// Write the rendered fragment to this file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Print the rendered fragment and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Print a JSON report and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Config file (defaults to <config dir>/route-planner/config.json)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write logs to this file (the TUI logs nowhere otherwise)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn is_interactive(&self) -> bool {
        cfg!(feature = "tui") && !self.text && !self.json
    }
}

fn parse_stop_pair(s: &str) -> std::result::Result<(String, String), String> {
    s.split_once(':')
        .map(|(start, end)| (start.to_string(), end.to_string()))
        .ok_or_else(|| format!("expected START:END, got '{s}'"))
}

pub async fn run(args: Cli) -> Result<()> {
    if args.text && args.json {
        return Err(anyhow::anyhow!("--text and --json are mutually exclusive"));
    }

    let file = crate::config::load(args.config.as_deref())?;
    let cfg = build_config(&args, &file);

    if args.is_interactive() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args, cfg).await;
        }
    }

    run_once(&args, &cfg).await
}

/// Build a `SessionConfig` from CLI arguments over the config file.
pub fn build_config(args: &Cli, file: &FileConfig) -> SessionConfig {
    let defaults = SessionConfig::default();
    let pick = |cli: &Option<String>, file: &Option<String>, default: String| {
        cli.clone().or_else(|| file.clone()).unwrap_or(default)
    };

    SessionConfig {
        base_url: pick(&args.base_url, &file.base_url, defaults.base_url),
        user_agent: defaults.user_agent,
        timeout: args.timeout.map(Into::into).or(file.timeout),
        initial_stops: if args.stops.is_empty() {
            file.stops.clone()
        } else {
            args.stops.clone()
        },
        mode_options: args
            .modes
            .clone()
            .or_else(|| file.modes.clone())
            .unwrap_or(defaults.mode_options),
        selected_mode: args.mode.clone().or_else(|| file.mode.clone()),
        fallback_mode: args.fallback_mode.clone().or_else(|| file.fallback_mode.clone()),
        ant_count: pick(&args.ants, &file.ants, defaults.ant_count),
        iteration_count: pick(&args.iterations, &file.iterations, defaults.iteration_count),
        include_run_parameters: !(args.reduced || file.reduced.unwrap_or(false)),
        render_target: pick(
            &args.render_target,
            &file.render_target,
            defaults.render_target,
        ),
    }
}

/// Result of a one-shot run, printed in JSON mode.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub endpoint: Endpoint,
    pub url: String,
    pub outcome: String,
    #[serde(skip)]
    pub failure: Option<String>,
    pub view: SessionView,
}

/// Issue a single request (default layout with `--new-map`, routes otherwise)
/// and wait for it to settle. A failed request is reported, not returned as `Err`.
pub async fn execute_once(args: &Cli, cfg: &SessionConfig) -> Result<RunReport> {
    let (completion_tx, mut completion_rx) = mpsc::unbounded_channel();
    let mut session = MapSession::new(cfg, completion_tx).context("set up session")?;

    let (endpoint, url) = if args.new_map {
        session.initialize();
        (Endpoint::Stops, session.client().url_for(Endpoint::Stops, None))
    } else {
        let query = session.route_query().context("build route query")?;
        let url = session.client().url_for(Endpoint::Routes, Some(&query));
        session.recompute().context("compute routes")?;
        (Endpoint::Routes, url)
    };

    let mut outcome = None;
    while session.in_flight() > 0 {
        let completion = completion_rx
            .recv()
            .await
            .context("request task ended without reporting")?;
        outcome = Some(session.complete(completion));
    }
    let outcome = outcome.context("no request was issued")?;

    Ok(RunReport {
        endpoint,
        url: url.to_string(),
        failure: match &outcome {
            CompletionOutcome::Failed(f) => Some(f.message.clone()),
            _ => None,
        },
        outcome: describe(&outcome),
        view: session.view(),
    })
}

/// One-shot mode: run the request, write `--output` on success, print the
/// fragment or the JSON report. A failed request is an `Err`.
pub async fn run_once(args: &Cli, cfg: &SessionConfig) -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();
    let report = execute_once(args, cfg).await?;
    let _ = out_tx.send(OutputLine::Stderr(format!("GET {}", report.url)));

    if report.failure.is_none() {
        if let Some(path) = args.output.as_deref() {
            std::fs::write(path, &report.view.target.content)
                .with_context(|| format!("write {}", path.display()))?;
            let _ = out_tx.send(OutputLine::Stderr(format!("Saved: {}", path.display())));
        }
    }

    if args.json {
        let _ = out_tx.send(OutputLine::Stdout(serde_json::to_string_pretty(&report)?));
    } else if report.failure.is_none() {
        let _ = out_tx.send(OutputLine::Stdout(report.view.target.content.clone()));
    }

    drop(out_tx);
    let _ = out_handle.await;

    match report.failure {
        Some(msg) => Err(anyhow::anyhow!("{msg}")),
        None => Ok(()),
    }
}

fn describe(outcome: &CompletionOutcome) -> String {
    match outcome {
        CompletionOutcome::Rendered { seq, endpoint } => format!("rendered #{seq} from {endpoint}"),
        CompletionOutcome::Stale { seq, latest } => format!("stale #{seq} (latest #{latest})"),
        CompletionOutcome::Failed(f) => format!("failed: {}", f.message),
    }
}
