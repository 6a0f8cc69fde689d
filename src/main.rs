use clap::{Parser, Subcommand};
use ollama_direct::config::Config;
use ollama_direct::error::Result;
use ollama_direct::lookup::{Lookup, Resolved, Resolver};
use ollama_direct::models::format_bytes;
use ollama_direct::relay::{ErrorEnvelope, Relay};
use ollama_direct::server::{self, AppState};
use ollama_direct::session::{SearchOutcome, SearchSession};
use ollama_direct::telemetry;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ollama-direct")]
#[command(about = "Direct download links for Ollama registry models", long_about = None)]
struct Cli {
    /// Config file (default: ~/.config/ollama-direct/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Registry base URL, overrides config
    #[arg(long, global = true)]
    registry: Option<String>,
    /// Output machine-readable JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print registry URLs for a model without contacting the registry
    Resolve {
        /// e.g. gemma2:2b, huihui_ai/qwen3-abliterated, "ollama pull mistral"
        model: String,
    },
    /// Fetch the manifest and list direct download links
    Fetch { model: String },
    /// Search repeatedly, one model per line
    Shell,
    /// Run the HTTP relay
    Serve {
        /// Listen address, overrides config
        #[arg(long)]
        addr: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(matches!(cli.command, Commands::Serve { .. }));

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(url) = &cli.registry {
        config.registry.url.clone_from(url);
    }

    match cli.command {
        Commands::Resolve { model } => {
            let resolver = Resolver::from_config(&config)?;
            match resolver.resolve(&model) {
                Ok(resolved) => {
                    print_resolved(&resolved, cli.json);
                    Ok(())
                }
                Err(e) => {
                    print_failure(&ErrorEnvelope::new(e.to_string(), 400, None), cli.json);
                    std::process::exit(1);
                }
            }
        }
        Commands::Fetch { model } => {
            let resolver = Resolver::from_config(&config)?;
            match resolver.fetch(&model).await {
                Ok(lookup) => {
                    print_lookup(&lookup, cli.json);
                    Ok(())
                }
                Err(e) => {
                    print_failure(&e.to_envelope(), cli.json);
                    std::process::exit(1);
                }
            }
        }
        Commands::Shell => run_shell(&Resolver::from_config(&config)?, cli.json).await,
        Commands::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| config.server.addr.clone());
            let state = AppState::new(
                Relay::new(&config.relay)?,
                telemetry::from_config(&config.telemetry)?,
            );
            tracing::info!("Starting relay on {addr}");
            server::serve(&addr, state).await
        }
    }
}

/// Logs go to stderr; stdout carries results only
fn init_logging(serving: bool) {
    let default_level = if serving { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_shell(resolver: &Resolver, json: bool) -> Result<()> {
    telemetry::record_page_load(resolver.telemetry().as_ref()).await;

    let mut session = SearchSession::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    eprintln!("Enter a model tag e.g. gemma2:2b (empty line or 'exit' to quit)");
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() || input == "exit" || input == "quit" {
            break;
        }

        match session.search(resolver, input).await {
            SearchOutcome::Fetched(lookup) => print_lookup(&lookup, json),
            SearchOutcome::AlreadyFetched(id) => {
                println!("You have already searched for {id} successfully");
            }
            SearchOutcome::Failed(envelope) => print_failure(&envelope, json),
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => tracing::error!("Failed to serialize output: {e}"),
    }
}

fn print_resolved(resolved: &Resolved, json: bool) {
    if json {
        print_json(resolved);
        return;
    }

    println!(
        "Model:       {}/{}:{}",
        resolved.namespace, resolved.model, resolved.tag
    );
    println!("Model page:  {}", resolved.model_page_url);
    println!("Manifest:    {}", resolved.manifest_url);
    println!();
    println!("Save the manifest as {}", resolved.manifest_file);
    println!("Save the blobs in    {}", resolved.blobs_folder);
}

fn print_lookup(lookup: &Lookup, json: bool) {
    if json {
        print_json(lookup);
        return;
    }

    print_resolved(&lookup.resolved, false);
    println!();

    if lookup.downloads.is_empty() {
        // Unexpected manifest shape; show it as received
        print_json(&lookup.manifest);
        return;
    }

    println!("Downloads:");
    for download in &lookup.downloads {
        println!(
            "  {:<10} {:>10}  {}",
            download.kind,
            format_bytes(download.size),
            download.url
        );
        println!("  {:<10} {:>10}  save as {}", "", "", download.filename);
    }

    println!();
    println!("Total: {}", format_bytes(lookup.total_size()));
    println!("The server may rename files on download; rename them to the names above.");
}

fn print_failure(envelope: &ErrorEnvelope, json: bool) {
    if json {
        print_json(envelope);
        return;
    }

    eprintln!("Error: {}", envelope.error);
    if let Some(original) = &envelope.original_message {
        eprintln!("Original error details: {original}");
    }
}
