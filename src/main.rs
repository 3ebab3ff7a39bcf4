use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use tblsplit::batch::{
    bundle_zip, combined_bundle, document_bundle_name, process_batch, DocumentInput,
    DocumentOutcome, DocumentReport, COMBINED_BUNDLE_NAME,
};
use tblsplit::config::Config;
use tblsplit::verify::verify_extraction;
use tblsplit::{count_tables, BundleMode, RetentionPolicy, TopologyPolicy};

#[derive(Parser, Debug)]
#[command(name = "tblsplit")]
#[command(about = "Split every top-level table of Word documents into standalone .docx files")]
#[command(version)]
struct Cli {
    /// Word documents to split
    #[arg(required_unless_present = "init_config")]
    files: Vec<PathBuf>,

    /// Directory the outputs are written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Which parts travel with each table
    #[arg(long, value_enum)]
    policy: Option<RetentionPolicy>,

    /// Whether tables wrapped in a block content control count as top-level
    #[arg(long, value_enum)]
    topology: Option<TopologyPolicy>,

    /// How outputs are written
    #[arg(long, value_enum)]
    bundle: Option<BundleMode>,

    /// Only report the number of top-level tables per document
    #[arg(long)]
    count: bool,

    /// Print a JSON report on stdout
    #[arg(long)]
    json: bool,

    /// Re-open every output and compare it with its source table
    #[arg(long)]
    verify: bool,

    /// Extract one table at a time
    #[arg(long)]
    sequential: bool,

    /// Write the default configuration file and exit
    #[arg(long)]
    init_config: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.init_config {
        Config::init_default()?;
        if let Some(path) = Config::get_config_path() {
            println!("Wrote default configuration to {}", path.display());
        }
        return Ok(());
    }

    let mut config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load config: {err}. Using defaults.");
            Config::default()
        }
    };
    if let Some(policy) = cli.policy {
        config.retention = policy;
    }
    if let Some(topology) = cli.topology {
        config.topology = topology;
    }
    if let Some(bundle) = cli.bundle {
        config.bundle = bundle;
    }
    if cli.output_dir.is_some() {
        config.output_dir = cli.output_dir.clone();
    }
    if cli.sequential {
        config.parallel = false;
    }

    let inputs = read_inputs(&cli.files).await;

    if cli.count {
        return print_counts(&inputs, config.topology, cli.json);
    }

    let options = config.extract_options();
    let documents: Vec<DocumentInput> = inputs
        .iter()
        .filter_map(|(_, input)| input.as_ref().ok().cloned())
        .collect();
    let mut processed = tokio::task::spawn_blocking(move || process_batch(&documents, &options))
        .await
        .context("batch worker panicked")?
        .into_iter();

    // Re-interleave read failures with processed documents in input order
    let reports: Vec<DocumentReport> = inputs
        .iter()
        .filter_map(|(name, input)| match input {
            Ok(_) => processed.next(),
            Err(message) => Some(DocumentReport::failed(name.clone(), message.clone())),
        })
        .collect();

    let output_dir = config.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    tokio::fs::create_dir_all(&output_dir)
        .await
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    write_outputs(&reports, &output_dir, config.bundle).await?;

    let mut verification_failed = false;
    if cli.verify {
        for (report, (_, input)) in reports.iter().zip(&inputs) {
            let Ok(input) = input else { continue };
            for table in report.tables() {
                let issues = verify_extraction(&input.bytes, table, config.topology)?;
                for issue in &issues {
                    eprintln!("{} {}: {issue}", report.file_name, table.name);
                }
                verification_failed |= !issues.is_empty();
            }
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print_summary(&reports);
    }

    let any_failed = reports
        .iter()
        .any(|r| matches!(r.outcome, DocumentOutcome::Failed { .. }));
    if any_failed || verification_failed {
        std::process::exit(1);
    }
    Ok(())
}

/// Read every input; a read failure is kept as that document's error message
async fn read_inputs(files: &[PathBuf]) -> Vec<(String, std::result::Result<DocumentInput, String>)> {
    let mut inputs = Vec::with_capacity(files.len());
    for path in files {
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("document.docx")
            .to_string();
        let input = tokio::fs::read(path)
            .await
            .map(|bytes| DocumentInput {
                file_name: file_name.clone(),
                bytes,
            })
            .map_err(|err| format!("Failed to read {}: {err}", path.display()));
        inputs.push((file_name, input));
    }
    inputs
}

fn print_counts(
    inputs: &[(String, std::result::Result<DocumentInput, String>)],
    topology: TopologyPolicy,
    json: bool,
) -> Result<()> {
    let mut counts = Vec::new();
    for (name, input) in inputs {
        let count = match input {
            Ok(input) => count_tables(&input.bytes, topology).map_err(|err| err.to_string()),
            Err(message) => Err(message.clone()),
        };
        counts.push((name.clone(), count));
    }

    if json {
        let value: Vec<serde_json::Value> = counts
            .iter()
            .map(|(name, count)| match count {
                Ok(count) => serde_json::json!({ "file_name": name, "tables": count }),
                Err(message) => serde_json::json!({ "file_name": name, "error": message }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        for (name, count) in &counts {
            match count {
                Ok(count) => println!("{name}: {count} top-level table(s)"),
                Err(message) => println!("{name}: error: {message}"),
            }
        }
    }
    Ok(())
}

async fn write_outputs(reports: &[DocumentReport], output_dir: &Path, bundle: BundleMode) -> Result<()> {
    match bundle {
        BundleMode::None => {
            for report in reports {
                for (name, bytes) in report.named_outputs() {
                    write_file(&output_dir.join(name), bytes).await?;
                }
            }
        }
        BundleMode::PerDocument => {
            for report in reports {
                let outputs = report.named_outputs();
                match outputs.as_slice() {
                    [] => {}
                    [(name, bytes)] => write_file(&output_dir.join(name), bytes).await?,
                    _ => {
                        let archive = bundle_zip(outputs.iter().map(|(n, b)| (n.clone(), *b)))?;
                        let name = document_bundle_name(&report.file_name);
                        write_file(&output_dir.join(name), &archive).await?;
                    }
                }
            }
        }
        BundleMode::Combined => {
            if reports.iter().any(|r| !r.tables().is_empty()) {
                let archive = combined_bundle(reports)?;
                write_file(&output_dir.join(COMBINED_BUNDLE_NAME), &archive).await?;
            }
        }
    }
    Ok(())
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if path.exists() && path.is_dir() {
        bail!("Cannot write {}: a directory with that name exists", path.display());
    }
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn print_summary(reports: &[DocumentReport]) {
    for report in reports {
        match &report.outcome {
            DocumentOutcome::Split { tables } => {
                println!("{}: found {} top-level table(s)", report.file_name, tables.len());
            }
            DocumentOutcome::NoTables { message } => {
                println!("{}: {message}", report.file_name);
            }
            DocumentOutcome::Failed { message } => {
                eprintln!("Error with {}: {message}", report.file_name);
            }
        }
    }

    if !reports.is_empty() && reports.iter().all(|r| r.tables().is_empty()) {
        eprintln!("No tables were found in any of the documents.");
    }
}
