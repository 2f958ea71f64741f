use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use widgetc::{
    EngineConfig, MemorySources, ProcessTable, Providers, SchemaColumn, WidgetEngine, WidgetKind,
};

#[derive(Parser)]
#[command(name = "widgetc")]
#[command(about = "Compile and inspect low-code widget definitions")]
struct Cli {
    /// Application root (definitions are read from <root>/<kind dir>)
    #[arg(long, env = "WIDGETC_ROOT", default_value = ".")]
    root: PathBuf,
    #[arg(long, env = "WIDGETC_KIND", default_value = "table")]
    kind: WidgetKind,
    #[arg(long, env = "WIDGETC_NAMESPACE", default_value = "__yao")]
    namespace: String,
    #[arg(long, env = "WIDGETC_PREFIX", default_value = "")]
    prefix: String,
    #[arg(long, env = "WIDGETC_LOCALE")]
    locale: Option<String>,
    /// Compile files one after another
    #[arg(long)]
    sequential: bool,
    /// JSON file describing the models, stores and processes to bind against
    #[arg(long)]
    providers: Option<PathBuf>,
    /// Log compile details (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load every definition and report failures
    Check,
    /// Print a compiled widget
    Show {
        id: String,
        /// Print the authored definition instead of the client settings
        #[arg(long)]
        dsl: bool,
    },
    /// List the endpoints of a widget
    Routes { id: String },
}

#[derive(Debug, Default, Deserialize)]
struct ProvidersFile {
    #[serde(default)]
    models: BTreeMap<String, Vec<SchemaColumn>>,
    #[serde(default)]
    stores: Vec<String>,
    #[serde(default)]
    processes: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = EngineConfig::new(&cli.root)
        .kind(cli.kind)
        .api_namespace(&cli.namespace)
        .id_prefix(&cli.prefix)
        .parallel(!cli.sequential);
    if let Some(locale) = &cli.locale {
        config = config.locale(locale);
    }

    let providers = match &cli.providers {
        Some(path) => load_providers(path)?,
        None => Providers::default(),
    };

    let engine = Arc::new(WidgetEngine::new(config, providers).context("invalid configuration")?);

    match cli.command {
        Command::Check => check(engine).await,
        Command::Show { id, dsl } => {
            load_quiet(&engine).await;
            let widget = engine.get(&id)?;
            let value = if dsl { widget.to_value() } else { widget.settings().clone() };
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Command::Routes { id } => {
            load_quiet(&engine).await;
            let widget = engine.get(&id)?;
            for route in widget.routes(&engine.config().api_namespace) {
                println!("{:<7} {:<60} {}", route.method.as_str(), route.path, route.process);
            }
            Ok(())
        }
    }
}

async fn check(engine: Arc<WidgetEngine>) -> Result<()> {
    let registry = engine.registry();
    match Arc::clone(&engine).reload_async().await {
        Ok(report) => {
            println!(
                "{} widgets loaded from {} in {}ms",
                report.loaded.len(),
                report.root.display(),
                report.elapsed_ms()
            );
            Ok(())
        }
        Err(widgetc::WidgetError::Batch(batch)) => {
            for failure in &batch.failures {
                eprintln!("error: {}", failure);
            }
            Err(anyhow!(
                "{} of {} definitions failed",
                batch.len(),
                batch.len() + registry.len()
            ))
        }
        Err(err) => Err(err.into()),
    }
}

/// Load for inspection; failures of other widgets are only logged.
async fn load_quiet(engine: &Arc<WidgetEngine>) {
    if let Err(err) = Arc::clone(engine).reload_async().await {
        tracing::warn!(error = %err, "some definitions failed to load");
    }
}

fn load_providers(path: &Path) -> Result<Providers> {
    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file: ProvidersFile = serde_json::from_slice(&data)
        .with_context(|| format!("invalid providers file {}", path.display()))?;

    let mut sources = MemorySources::new();
    for (name, columns) in file.models {
        sources = sources.with_model(&name, columns);
    }
    for name in &file.stores {
        sources = sources.with_store(name);
    }

    let mut processes = ProcessTable::new();
    for name in &file.processes {
        processes = processes.with(name);
    }

    Ok(Providers::new(Arc::new(sources), Arc::new(processes)))
}
