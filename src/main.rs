//! ORM Conformance CLI Entry Point
//!
//! Subcommands:
//! - `capabilities` - Capability report of a backend at a given version
//! - `evaluate` - Run/skip plan of a requirement manifest against a backend
//! - `probe` - Detect the version of a configured backend and report it
//! - `backends` - List configured backends
//!
//! All output to stdout is JSON-only. Logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use orm_conformance::engine::detect_capabilities;
use orm_conformance::{
    list_backends, plan, provider_by_name, resolve_backend, BackendIdentity, CapabilityCache,
    ErrorEnvelope, Metadata, RequirementManifest, ServerVersion, SuccessEnvelope, SuiteError,
};

/// ORM Conformance - backend capability negotiation for conformance suites
#[derive(Parser)]
#[command(name = "orm-conformance")]
#[command(about = "Decide which conformance tests a database backend can run")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report the capabilities of a backend at a server version
    Capabilities {
        /// Backend name (sqlite, mysql, postgres)
        #[arg(long)]
        backend: String,

        /// Server version (e.g. 3.35.0)
        #[arg(long = "version")]
        server_version: String,
    },

    /// Evaluate a requirement manifest against a backend
    Evaluate {
        /// Backend name (sqlite, mysql, postgres)
        #[arg(long)]
        backend: String,

        /// Server version (e.g. 8.0.31)
        #[arg(long = "version")]
        server_version: String,

        /// Path to the requirement manifest (JSON)
        #[arg(long)]
        manifest: PathBuf,
    },

    /// Detect the version of a configured backend and report its capabilities
    Probe {
        /// Name of the configured backend
        #[arg(long)]
        name: String,
    },

    /// List configured backends
    Backends,
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Capabilities { .. } => "capabilities",
            Self::Evaluate { .. } => "evaluate",
            Self::Probe { .. } => "probe",
            Self::Backends => "backends",
        }
    }
}

/// Result of a successful command before it is wrapped in an envelope
struct CommandOutput {
    backend: String,
    data: Value,
    counts: Option<(usize, usize)>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let command = cli.command.name();
    let start = Instant::now();

    match run(cli.command).await {
        Ok(output) => {
            let execution_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            let meta = match output.counts {
                Some((tests, skipped)) => Metadata::with_counts(execution_ms, tests, skipped),
                None => Metadata::new(execution_ms),
            };
            print_json(&SuccessEnvelope::new(output.backend, command, output.data, meta))?;
            Ok(ExitCode::SUCCESS)
        }
        Err((backend, err)) => {
            print_json(&ErrorEnvelope::from_error(backend, command, &err))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

/// Dispatch a command; errors carry the backend they relate to (or "")
async fn run(command: Commands) -> Result<CommandOutput, (String, SuiteError)> {
    match command {
        Commands::Capabilities { backend, server_version } => {
            capabilities(&backend, &server_version).map_err(|e| (backend, e))
        }
        Commands::Evaluate { backend, server_version, manifest } => {
            evaluate(&backend, &server_version, &manifest).map_err(|e| (backend, e))
        }
        Commands::Probe { name } => probe(&name).await.map_err(|e| (name, e)),
        Commands::Backends => backends().map_err(|e| (String::new(), e)),
    }
}

fn capabilities(backend: &str, server_version: &str) -> orm_conformance::Result<CommandOutput> {
    let provider = provider_by_name(backend)?;
    let version = ServerVersion::parse(server_version)?;
    let caps = provider.capabilities_for(&version);
    let identity = BackendIdentity::new(provider.backend_name(), version);

    Ok(CommandOutput {
        backend: identity.to_string(),
        data: json!(caps.report()),
        counts: None,
    })
}

fn evaluate(
    backend: &str,
    server_version: &str,
    manifest: &std::path::Path,
) -> orm_conformance::Result<CommandOutput> {
    let provider = provider_by_name(backend)?;
    let version = ServerVersion::parse(server_version)?;
    let registry = RequirementManifest::load(manifest)?.into_registry()?;

    let mut cache = CapabilityCache::new();
    let caps = cache.get_or_compute(provider, &version);
    let identity = BackendIdentity::new(provider.backend_name(), version);

    let decisions = plan(&registry, &identity, &caps);
    let skipped = decisions.iter().filter(|d| !d.evaluation.can_run).count();
    info!(backend = %identity, tests = decisions.len(), skipped, "evaluated manifest");

    Ok(CommandOutput {
        backend: identity.to_string(),
        counts: Some((decisions.len(), skipped)),
        data: json!({ "decisions": decisions }),
    })
}

async fn probe(name: &str) -> orm_conformance::Result<CommandOutput> {
    let resolved = resolve_backend(name)?;
    let mut cache = CapabilityCache::new();
    let (identity, caps) =
        detect_capabilities(&resolved.config, resolved.pinned_version.as_deref(), &mut cache)
            .await?;

    Ok(CommandOutput {
        backend: identity.to_string(),
        data: json!({
            "name": resolved.name,
            "engine": resolved.config.engine,
            "pinned": resolved.pinned_version.is_some(),
            "report": caps.report(),
        }),
        counts: None,
    })
}

fn backends() -> orm_conformance::Result<CommandOutput> {
    let entries: Vec<Value> = list_backends()?
        .into_iter()
        .map(|(name, config)| json!({ "name": name, "engine": config.engine }))
        .collect();

    Ok(CommandOutput {
        backend: String::new(),
        data: json!({ "backends": entries }),
        counts: None,
    })
}
