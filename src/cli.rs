//! Command line interface
//!
//! `pdf-batch` with no subcommand (or `serve`) runs the MCP server on stdio.
//! The other subcommands run one batch operation over the given files and
//! exit with status 1 when anything failed.

use crate::batch::{self, BatchReport, OperationKind};
use crate::error::{Error, Result};
use crate::server::{run_server_with_config, ServerConfig};
use crate::source::{IngestSource, SuffixPolicy, WorkingSet};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "pdf-batch", version, about = "Batch operations over sets of PDF files")]
pub struct Cli {
    /// Directories the server may read PDFs from (comma separated); unrestricted if empty
    #[arg(
        long = "resource-dir",
        env = "PDF_BATCH_RESOURCE_DIRS",
        value_delimiter = ',',
        global = true
    )]
    pub resource_dirs: Vec<String>,

    /// Only accept paths ending in lowercase ".pdf"
    #[arg(long, env = "PDF_BATCH_STRICT_SUFFIX", global = true)]
    pub strict_suffix: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the MCP server on stdio (default)
    Serve,
    /// Extract embedded images into {stem}-output/images/
    Images(BatchArgs),
    /// Convert to {stem}-output/{stem}.docx
    Docx(BatchArgs),
    /// Convert to {stem}-output/{stem}.txt
    Text(BatchArgs),
    /// Split into {stem}-output/einzelne-seiten/Seite-{n}.pdf
    Split(BatchArgs),
    /// Merge all files into {name}.pdf beside the first file
    Merge {
        /// Name of the merged file
        #[arg(long)]
        name: String,
        #[command(flatten)]
        batch: BatchArgs,
    },
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// PDF files or directories to process, in order
    pub files: Vec<PathBuf>,

    /// Scan directories recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn suffix_policy(&self) -> SuffixPolicy {
        if self.strict_suffix {
            SuffixPolicy::Exact
        } else {
            SuffixPolicy::CaseInsensitive
        }
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            resource_dirs: self.resource_dirs.clone(),
            suffix_policy: self.suffix_policy(),
        }
    }
}

/// Dispatch a parsed command line
pub async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let policy = cli.suffix_policy();
    let (kind, args, merge_name) = match cli.command {
        None | Some(Command::Serve) => {
            run_server_with_config(cli.server_config()).await?;
            return Ok(ExitCode::SUCCESS);
        }
        Some(Command::Images(args)) => (OperationKind::ExtractImages, args, None),
        Some(Command::Docx(args)) => (OperationKind::ConvertToDocx, args, None),
        Some(Command::Text(args)) => (OperationKind::ConvertToTxt, args, None),
        Some(Command::Split(args)) => (OperationKind::SplitFiles, args, None),
        Some(Command::Merge { name, batch }) => (OperationKind::MergeFiles, batch, Some(name)),
    };

    let working_set = build_working_set(&args.files, args.recursive, policy)?;
    for path in working_set.iter() {
        eprintln!("added {}", path.display());
    }

    let paths = working_set.paths().to_vec();
    let outcome = tokio::task::spawn_blocking(move || match merge_name {
        Some(name) => batch::merge(&paths, &name),
        None => batch::run(kind, &paths),
    })
    .await
    .map_err(|e| Error::TaskJoin {
        reason: e.to_string(),
    })
    .and_then(|r| r);

    match outcome {
        Ok(report) => {
            print_report(&report, args.json)?;
            Ok(exit_code(&report))
        }
        Err(e) => {
            tracing::warn!(error = %e, operation = %kind, "batch rejected");
            eprintln!("{}: {}", kind, e.client_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Ingest command line arguments: files as dialog picks, directories scanned
pub fn build_working_set(
    inputs: &[PathBuf],
    recursive: bool,
    policy: SuffixPolicy,
) -> Result<WorkingSet> {
    let cwd = std::env::current_dir()?;
    let mut set = WorkingSet::new(policy);

    for input in inputs {
        let path = absolute(&cwd, input);
        if path.is_dir() {
            set.ingest_directory(&path, recursive, None)?;
        } else {
            let added = set.ingest([&path], IngestSource::Dialog);
            if added.is_empty() && !set.contains(&path) {
                tracing::warn!(path = %path.display(), "skipped, not a PDF file name");
            }
        }
    }
    Ok(set)
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

fn print_report(report: &BatchReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("{}", report.summary());
    for outcome in &report.outcomes {
        match &outcome.status {
            batch::OutcomeStatus::Failed { message, .. } => {
                println!("  {}: {}", outcome.path, message);
            }
            batch::OutcomeStatus::Succeeded { skipped, .. } => {
                for note in skipped {
                    println!("  {}: skipped {}", outcome.path, note);
                }
            }
        }
    }
    Ok(())
}

fn exit_code(report: &BatchReport) -> ExitCode {
    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
