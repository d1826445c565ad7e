//! Package documentation tool
//!
//! Usage: `ssis_doc [--out-dir DIR] [--app-config FILE] [--summary-json] <package.dtsx>...`

use anyhow::Context;
use clap::Parser;
use indexmap::IndexMap;
use rayon::prelude::*;
use ssis_doc::doc::connections::connection_strings;
use ssis_doc::{build_summary, document_package, load_package, summary_to_json, write_connections_to_file};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ssis_doc")]
#[command(about = "Describe ETL packages as markdown documentation")]
struct Args {
    /// Package files to document
    #[arg(required = true)]
    packages: Vec<PathBuf>,

    /// Directory for generated files (default: next to each package)
    #[arg(long, env = "SSIS_DOC_OUT_DIR")]
    out_dir: Option<PathBuf>,

    /// Also write every connection string into this app.config file
    #[arg(long)]
    app_config: Option<PathBuf>,

    /// Also write a JSON summary next to each document
    #[arg(long)]
    summary_json: bool,
}

/// What documenting one package produced
struct Outcome {
    markdown_path: PathBuf,
    warnings: usize,
    connections: Vec<(String, String)>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn output_path(args: &Args, package: &Path, extension: &str) -> PathBuf {
    let mut file_name = package
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "package".into());
    file_name.push(".");
    file_name.push(extension);
    let dir = match &args.out_dir {
        Some(dir) => dir.clone(),
        None => package.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    dir.join(file_name)
}

fn document_one(args: &Args, package: &Path) -> anyhow::Result<Outcome> {
    let start = Instant::now();
    let (graph, diagnostics) = load_package(package)?;
    info!("Loaded {} ({} nodes) in {:.2?}", package.display(), graph.len(), start.elapsed());

    let document = document_package(&graph)
        .with_context(|| format!("Failed to document {}", package.display()))?;
    let markdown_path = output_path(args, package, "md");
    std::fs::write(&markdown_path, &document.markdown)
        .with_context(|| format!("Failed to write {}", markdown_path.display()))?;

    if args.summary_json {
        let summary = build_summary(&graph)?;
        let json_path = output_path(args, package, "json");
        std::fs::write(&json_path, summary_to_json(&summary)?)
            .with_context(|| format!("Failed to write {}", json_path.display()))?;
    }

    let connections = connection_strings(&document.connections);

    Ok(Outcome {
        markdown_path,
        warnings: diagnostics.warnings().len() + document.warnings.len(),
        connections,
    })
}

fn main() {
    init_logging();

    let args = Args::parse();

    if let Some(dir) = &args.out_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            error!("Cannot create output directory '{}': {}", dir.display(), e);
            process::exit(1);
        }
    }

    let results: Vec<(PathBuf, anyhow::Result<Outcome>)> = args
        .packages
        .par_iter()
        .map(|p| (p.clone(), document_one(&args, p)))
        .collect();

    let mut failed = 0;
    let mut all_connections: Vec<(String, String)> = Vec::new();
    let mut first_owner: IndexMap<String, PathBuf> = IndexMap::new();
    for (package, result) in results {
        match result {
            Ok(outcome) => {
                if outcome.warnings > 0 {
                    warn!("{}: {} warnings", package.display(), outcome.warnings);
                }
                info!("Wrote {}", outcome.markdown_path.display());
                for (name, value) in outcome.connections {
                    match first_owner.get(&name) {
                        Some(owner) => warn!(
                            "Connection '{}' in {} repeats a name already used in {}; both are written",
                            name,
                            package.display(),
                            owner.display()
                        ),
                        None => {
                            first_owner.insert(name.clone(), package.clone());
                        }
                    }
                    all_connections.push((name, value));
                }
            }
            Err(e) => {
                error!("{}: {:#}", package.display(), e);
                failed += 1;
            }
        }
    }

    if let Some(config_path) = &args.app_config {
        match write_connections_to_file(&all_connections, config_path) {
            Ok(()) => info!("Wrote {} connection strings to {}", all_connections.len(), config_path.display()),
            Err(e) => {
                error!("{:#}", e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        process::exit(1);
    }
}
