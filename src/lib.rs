//! PDF batch server library
//!
//! Collects PDF files into a deduplicated working set and runs batch
//! operations over it:
//! - `extract_images`: Save embedded images per page
//! - `convert_to_docx`: One DOCX paragraph per page
//! - `convert_to_txt`: Page texts behind `Seite {n}` headers
//! - `split_files`: One PDF per page
//! - `merge_files`: Concatenate the whole set into one PDF
//!
//! The operations are exposed as MCP tools ([`server`]) and as CLI
//! subcommands ([`cli`]).

pub mod batch;
pub mod cli;
pub mod error;
pub mod pdf;
pub mod server;
pub mod source;

pub use batch::{BatchReport, FileOutcome, OperationKind, OutcomeStatus};
pub use error::{Error, FailureKind, Result};
pub use server::{run_server, run_server_with_config, PdfBatchServer, PdfFileInfo, ServerConfig};
pub use source::{IngestSource, SuffixPolicy, WorkingSet, WorkingSetEvent};
