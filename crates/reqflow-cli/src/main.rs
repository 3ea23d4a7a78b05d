//! reqflow command-line host
//!
//! Loads a flow document and prints its execution path, graph summary or a
//! timed playback of its highlights.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use reqflow_core::gherkin;
use reqflow_core::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "reqflow", version, about = "Requirement flow paths and playback")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the execution path of a flow document
    Path {
        /// Flow document (.json, .yaml, .yml)
        file: PathBuf,
        /// Print the path as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report entry points, cycles and dangling connections
    Inspect {
        /// Flow document (.json, .yaml, .yml)
        file: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Play the execution path, printing each highlight as it happens
    Simulate {
        /// Flow document (.json, .yaml, .yml)
        file: PathBuf,
        /// Milliseconds between steps, overrides the configuration
        #[arg(long)]
        interval_ms: Option<u64>,
    },
    /// Parse a Gherkin scenario file into steps
    Parse {
        /// Scenario text file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => ReqflowConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => ReqflowConfig::default(),
    };

    match cli.command {
        Command::Path { file, json } => print_path(&config, &file, json),
        Command::Inspect { file, json } => print_summary(&file, json),
        Command::Simulate { file, interval_ms } => {
            let mut config = config;
            if let Some(ms) = interval_ms {
                config.playback = config
                    .playback
                    .with_tick_interval(Duration::from_millis(ms));
            }
            simulate(&config, &file).await
        }
        Command::Parse { file } => print_scenario(&file),
    }
}

fn load_flow(file: &Path) -> anyhow::Result<(Vec<RequirementNode>, Vec<Connection>)> {
    let document = FlowDocument::load(file)
        .with_context(|| format!("loading flow document {}", file.display()))?;
    let nodes = document.nodes()?;
    Ok((nodes, document.connections))
}

fn print_path(config: &ReqflowConfig, file: &Path, json: bool) -> anyhow::Result<()> {
    let (nodes, connections) = load_flow(file)?;
    let path = ExecutionPathBuilder::new(config.builder).build(&nodes, &connections);

    if json {
        println!("{}", serde_json::to_string_pretty(&path)?);
        return Ok(());
    }

    println!("Execution path ({} steps)", path.len());
    for (i, entry) in path.iter().enumerate() {
        println!(
            "  {:>3}. [{}#{}] {} {}",
            i + 1,
            entry.node_id,
            entry.step_index,
            entry.kind.keyword(),
            entry.text
        );
    }
    Ok(())
}

fn print_summary(file: &Path, json: bool) -> anyhow::Result<()> {
    let (nodes, connections) = load_flow(file)?;
    let summary = inspect(&nodes, &connections);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Flow Summary");
    println!("============");
    println!("Nodes: {}", summary.node_count);
    println!("Connections: {}", summary.edge_count);
    println!("Entry nodes: {}", list(&summary.entry_nodes));
    println!("Unreachable nodes: {}", list(&summary.unreachable_nodes));
    println!("Duplicate nodes: {}", list(&summary.duplicate_nodes));
    println!("Cycle: {}", if summary.has_cycle { "yes" } else { "no" });
    println!("Dangling connections: {}", list(&summary.dangling_connections));
    println!("Self loops: {}", list(&summary.self_loops));
    println!("Status: {}", if summary.is_clean() { "CLEAN" } else { "WARNINGS" });
    Ok(())
}

fn list<T: ToString>(items: &[T]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    }
}

async fn simulate(config: &ReqflowConfig, file: &Path) -> anyhow::Result<()> {
    let (nodes, connections) = load_flow(file)?;
    let path = ExecutionPathBuilder::new(config.builder).build(&nodes, &connections);
    if path.is_empty() {
        bail!("{} has no steps to play", file.display());
    }

    let total = path.len();
    let steps = path.clone();
    let (observer, mut highlights) = ChannelObserver::new();
    let (handle, task) = PlaybackDriver::spawn_with_path(
        config,
        ExecutionPathBuilder::new(config.builder),
        path,
        observer,
    );

    handle.play().await?;
    let mut shown = 0usize;
    loop {
        tokio::select! {
            highlight = highlights.recv() => match highlight {
                Some(Highlight::Step { node_id, step_index }) => {
                    shown += 1;
                    let text = steps
                        .iter()
                        .find(|e| e.node_id == node_id && e.step_index == step_index)
                        .map_or(String::new(), |e| format!("{} {}", e.kind.keyword(), e.text));
                    println!("Step {shown} of {total}  [{node_id}#{step_index}] {text}");
                }
                Some(Highlight::Cleared) | None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                handle.reset().await?;
                println!("Interrupted");
                break;
            }
        }
    }

    handle.shutdown().await?;
    task.await.context("playback driver panicked")?;
    println!("Simulation finished");
    Ok(())
}

fn print_scenario(file: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading scenario {}", file.display()))?;
    let steps = gherkin::validate(&text)?;

    for step in &steps {
        let references = gherkin::domain_references(&step.text);
        if references.is_empty() {
            println!("{} {}", step.kind.keyword(), step.text);
        } else {
            let refs: Vec<String> = references.iter().map(ToString::to_string).collect();
            println!("{} {}    <{}>", step.kind.keyword(), step.text, refs.join(", "));
        }
    }
    Ok(())
}
