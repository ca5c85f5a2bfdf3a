//! File selection: the working set and path resolution

pub mod resolver;
pub mod working_set;

pub use resolver::{check_pdf_header, resolve_path, ResolvedPdf};
pub use working_set::{
    collect_pdfs, normalize, IngestSource, SuffixPolicy, WorkingSet, WorkingSetEvent,
};
