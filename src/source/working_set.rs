//! The working set: an ordered, duplicate-free collection of PDF paths
//!
//! Candidates arrive from three sources (file picker, drag-and-drop, directory
//! scan). Each batch is filtered by the active [`SuffixPolicy`], reduced to the
//! set difference against the known paths and appended in candidate order.
//! Every mutation that changes the set is broadcast as a [`WorkingSetEvent`].

use crate::error::{Error, Result};
use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 64;
const DIALOG_FILTER: &str = "*.pdf";

/// How the `.pdf` suffix of a candidate path is checked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuffixPolicy {
    /// The path string must end in exactly `.pdf` (lowercase)
    Exact,
    /// The file extension must be `pdf`, ignoring ASCII case
    #[default]
    CaseInsensitive,
}

impl SuffixPolicy {
    /// Check whether a path passes the suffix filter
    pub fn accepts(&self, path: &Path) -> bool {
        match self {
            SuffixPolicy::Exact => path.to_string_lossy().ends_with(".pdf"),
            SuffixPolicy::CaseInsensitive => path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false),
        }
    }

    fn match_options(&self) -> MatchOptions {
        MatchOptions {
            case_sensitive: matches!(self, SuffixPolicy::Exact),
            require_literal_separator: false,
            require_literal_leading_dot: false,
        }
    }
}

/// Where a batch of candidate paths came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IngestSource {
    /// Multi-file picker with a `*.pdf` name filter
    Dialog,
    /// Dropped URLs (`file://...`) or plain paths
    Drop,
    /// Result of a directory scan
    Directory,
}

/// Change notification published by [`WorkingSet`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkingSetEvent {
    Added(Vec<PathBuf>),
    Removed(Vec<PathBuf>),
}

/// Ordered, duplicate-free set of PDF paths
pub struct WorkingSet {
    paths: Vec<PathBuf>,
    index: HashSet<PathBuf>,
    policy: SuffixPolicy,
    dialog_filter: Option<Pattern>,
    events: broadcast::Sender<WorkingSetEvent>,
}

impl WorkingSet {
    pub fn new(policy: SuffixPolicy) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            paths: Vec::new(),
            index: HashSet::new(),
            policy,
            dialog_filter: Pattern::new(DIALOG_FILTER).ok(),
            events,
        }
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<WorkingSetEvent> {
        self.events.subscribe()
    }

    /// Ingest a batch of candidates and return the paths that were newly added.
    ///
    /// Candidates failing the source's filter are dropped. Paths already in the
    /// set, and repeats inside the batch, are skipped. Accepted paths are
    /// normalized lexically (`.` and `..` segments folded).
    pub fn ingest<I, S>(&mut self, candidates: I, source: IngestSource) -> Vec<PathBuf>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let filtered: Vec<PathBuf> = candidates
            .into_iter()
            .filter_map(|candidate| self.accept(candidate.as_ref(), source))
            .collect();

        let mut added = Vec::new();
        for path in filtered {
            if self.index.insert(path.clone()) {
                self.paths.push(path.clone());
                added.push(path);
            }
        }

        if !added.is_empty() {
            tracing::debug!(count = added.len(), ?source, "working set grew");
            let _ = self.events.send(WorkingSetEvent::Added(added.clone()));
        }
        added
    }

    /// Scan a directory for PDFs and ingest them in path order
    pub fn ingest_directory(
        &mut self,
        dir: &Path,
        recursive: bool,
        pattern: Option<&str>,
    ) -> Result<Vec<PathBuf>> {
        let found = collect_pdfs(dir, recursive, pattern, self.policy)?;
        Ok(self.ingest(found, IngestSource::Directory))
    }

    /// Remove the given paths; each present path is removed once.
    pub fn remove<P: AsRef<Path>>(&mut self, targets: &[P]) -> Vec<PathBuf> {
        let mut removed = Vec::new();
        for target in targets {
            let target = normalize(target.as_ref());
            if self.index.remove(&target) {
                if let Some(pos) = self.paths.iter().position(|p| *p == target) {
                    removed.push(self.paths.remove(pos));
                }
            }
        }
        self.publish_removed(&removed);
        removed
    }

    /// Remove entries by position, as for a multi-selection delete.
    ///
    /// Returns removed paths in ascending position order.
    pub fn remove_indices(&mut self, indices: &[usize]) -> Vec<PathBuf> {
        let mut positions: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < self.paths.len())
            .collect();
        positions.sort_unstable();
        positions.dedup();

        let mut removed = Vec::with_capacity(positions.len());
        for &pos in positions.iter().rev() {
            let path = self.paths.remove(pos);
            self.index.remove(&path);
            removed.push(path);
        }
        removed.reverse();
        self.publish_removed(&removed);
        removed
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.paths.iter()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.index.contains(&normalize(path))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Turn a raw candidate into a local path without filtering it.
    ///
    /// Dropped items may be `file://` URLs; other URL schemes yield `None`.
    pub fn candidate_path(item: &OsStr, source: IngestSource) -> Option<PathBuf> {
        if item.is_empty() {
            return None;
        }
        match source {
            IngestSource::Drop => local_path_from_drop(item),
            _ => Some(PathBuf::from(item)),
        }
    }

    fn publish_removed(&self, removed: &[PathBuf]) {
        if !removed.is_empty() {
            tracing::debug!(count = removed.len(), "working set shrank");
            let _ = self.events.send(WorkingSetEvent::Removed(removed.to_vec()));
        }
    }

    fn accept(&self, candidate: &OsStr, source: IngestSource) -> Option<PathBuf> {
        let path = Self::candidate_path(candidate, source)?;
        if !self.policy.accepts(&path) {
            return None;
        }
        if source == IngestSource::Dialog {
            let name = path.file_name()?.to_string_lossy();
            let matched = self
                .dialog_filter
                .as_ref()
                .is_some_and(|p| p.matches_with(&name, self.policy.match_options()));
            if !matched {
                return None;
            }
        }
        Some(normalize(&path))
    }
}

impl Default for WorkingSet {
    fn default() -> Self {
        Self::new(SuffixPolicy::default())
    }
}

/// Turn a dropped item into a local path. Non-file URLs yield `None`.
fn local_path_from_drop(item: &OsStr) -> Option<PathBuf> {
    match item.to_str() {
        Some(text) if text.contains("://") => {
            let url = url::Url::parse(text).ok()?;
            if url.scheme() != "file" {
                return None;
            }
            url.to_file_path().ok()
        }
        _ => Some(PathBuf::from(item)),
    }
}

/// Fold `.` and `..` segments without touching the filesystem.
///
/// `..` at the root stays at the root, as `file://` URLs resolve it.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Collect PDF files under `dir`, sorted by path
pub fn collect_pdfs(
    dir: &Path,
    recursive: bool,
    pattern: Option<&str>,
    policy: SuffixPolicy,
) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(Error::PdfNotFound {
            path: dir.display().to_string(),
        });
    }
    if !dir.is_dir() {
        return Err(Error::InvalidInput {
            reason: format!("{} is not a directory", dir.display()),
        });
    }

    let pattern = match pattern {
        Some(p) => Some(Pattern::new(p).map_err(|e| Error::InvalidInput {
            reason: format!("bad pattern {:?}: {}", p, e),
        })?),
        None => None,
    };

    let mut files = Vec::new();
    walk(dir, recursive, pattern.as_ref(), policy, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk(
    dir: &Path,
    recursive: bool,
    pattern: Option<&Pattern>,
    policy: SuffixPolicy,
    files: &mut Vec<PathBuf>,
) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::from_io(dir, e))?;

    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let path = entry.path();

        if path.is_dir() {
            if recursive {
                let _ = walk(&path, recursive, pattern, policy, files);
            }
        } else if path.is_file() && policy.accepts(&path) {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if let Some(pat) = pattern {
                if !pat.matches_with(&name, policy.match_options()) {
                    continue;
                }
            }
            files.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[rstest]
    #[case("/docs/report.pdf", true)]
    #[case("/docs/report.PDF", false)]
    #[case("/docs/report.pdfx", false)]
    #[case("/docs/report.docx", false)]
    #[case("pdf", false)]
    #[case("", false)]
    fn test_exact_suffix(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(SuffixPolicy::Exact.accepts(Path::new(path)), expected);
    }

    #[rstest]
    #[case("/docs/report.pdf", true)]
    #[case("/docs/report.PDF", true)]
    #[case("/docs/report.Pdf", true)]
    #[case("/docs/report.txt", false)]
    #[case("/docs/.pdf", false)]
    #[case("pdf", false)]
    fn test_case_insensitive_suffix(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(
            SuffixPolicy::CaseInsensitive.accepts(Path::new(path)),
            expected
        );
    }

    #[test]
    fn test_ingest_adds_set_difference() {
        let mut set = WorkingSet::default();
        set.ingest(["/a.pdf", "/b.pdf"], IngestSource::Dialog);

        let added = set.ingest(["/b.pdf", "/c.pdf", "/a.pdf", "/d.pdf"], IngestSource::Dialog);

        assert_eq!(added, paths(&["/c.pdf", "/d.pdf"]));
        assert_eq!(
            set.paths(),
            paths(&["/a.pdf", "/b.pdf", "/c.pdf", "/d.pdf"]).as_slice()
        );
    }

    #[test]
    fn test_ingest_collapses_repeats_within_batch() {
        let mut set = WorkingSet::default();
        let added = set.ingest(["/a.pdf", "/a.pdf", "/b.pdf"], IngestSource::Drop);
        assert_eq!(added, paths(&["/a.pdf", "/b.pdf"]));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_ingest_filters_non_pdf_from_every_source() {
        let mut set = WorkingSet::new(SuffixPolicy::Exact);
        set.ingest(["/a.txt", "/b.pdf"], IngestSource::Dialog);
        set.ingest(["file:///c.png", "/d.pdf"], IngestSource::Drop);
        set.ingest(["/e.docx"], IngestSource::Directory);
        assert_eq!(set.paths(), paths(&["/b.pdf", "/d.pdf"]).as_slice());
    }

    #[test]
    fn test_exact_policy_rejects_uppercase_dialog_entries() {
        let mut set = WorkingSet::new(SuffixPolicy::Exact);
        let added = set.ingest(["/scan.PDF"], IngestSource::Dialog);
        assert!(added.is_empty());

        let mut relaxed = WorkingSet::new(SuffixPolicy::CaseInsensitive);
        let added = relaxed.ingest(["/scan.PDF"], IngestSource::Dialog);
        assert_eq!(added, paths(&["/scan.PDF"]));
    }

    #[test]
    fn test_drop_converts_file_urls() {
        let mut set = WorkingSet::default();
        let added = set.ingest(
            [
                "file:///home/user/My%20Scans/a.pdf",
                "https://example.com/b.pdf",
                "/plain/c.pdf",
            ],
            IngestSource::Drop,
        );
        assert_eq!(added, paths(&["/home/user/My Scans/a.pdf", "/plain/c.pdf"]));
    }

    #[test]
    fn test_ingest_normalizes_dot_segments() {
        let mut set = WorkingSet::default();
        let added = set.ingest(
            ["/x/../y.pdf", "/y.pdf", "/a/./b.pdf", "file:///a/b.pdf"],
            IngestSource::Drop,
        );
        assert_eq!(added, paths(&["/y.pdf", "/a/b.pdf"]));
        assert!(set.contains(Path::new("/q/../y.pdf")));
        assert_eq!(set.remove(&["/a/c/../b.pdf"]), paths(&["/a/b.pdf"]));
    }

    #[rstest]
    #[case("/a/b/../c.pdf", "/a/c.pdf")]
    #[case("/../a.pdf", "/a.pdf")]
    #[case("a/../../b.pdf", "../b.pdf")]
    #[case("./a.pdf", "a.pdf")]
    #[case("/plain/c.pdf", "/plain/c.pdf")]
    fn test_normalize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(Path::new(input)), PathBuf::from(expected));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_survive_ingestion() {
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(OsStr::from_bytes(b"caf\xe9.pdf"));
        std::fs::write(&file, b"%PDF-1.4").unwrap();

        let mut scanned = WorkingSet::default();
        let added = scanned.ingest_directory(dir.path(), false, None).unwrap();
        assert_eq!(added, vec![file.clone()]);
        assert!(added[0].exists());

        let mut picked = WorkingSet::default();
        assert_eq!(picked.ingest([&file], IngestSource::Dialog), vec![file.clone()]);
        let mut dropped = WorkingSet::default();
        assert_eq!(dropped.ingest([&file], IngestSource::Drop), vec![file]);
    }

    #[test]
    fn test_remove_each_path_once() {
        let mut set = WorkingSet::default();
        set.ingest(["/a.pdf", "/b.pdf", "/c.pdf"], IngestSource::Dialog);

        let removed = set.remove(&["/b.pdf", "/b.pdf", "/zzz.pdf"]);

        assert_eq!(removed, paths(&["/b.pdf"]));
        assert_eq!(set.paths(), paths(&["/a.pdf", "/c.pdf"]).as_slice());
        assert!(!set.contains(Path::new("/b.pdf")));
    }

    #[test]
    fn test_remove_indices_multi_selection() {
        let mut set = WorkingSet::default();
        set.ingest(
            ["/a.pdf", "/b.pdf", "/c.pdf", "/d.pdf"],
            IngestSource::Dialog,
        );

        let removed = set.remove_indices(&[3, 1, 1, 9]);

        assert_eq!(removed, paths(&["/b.pdf", "/d.pdf"]));
        assert_eq!(set.paths(), paths(&["/a.pdf", "/c.pdf"]).as_slice());

        // Removed paths can come back
        let added = set.ingest(["/b.pdf"], IngestSource::Dialog);
        assert_eq!(added, paths(&["/b.pdf"]));
    }

    #[test]
    fn test_events_published_only_on_change() {
        let mut set = WorkingSet::default();
        let mut rx = set.subscribe();

        set.ingest(["/a.pdf"], IngestSource::Dialog);
        set.ingest(["/a.pdf"], IngestSource::Dialog);
        set.remove(&["/missing.pdf"]);
        set.remove(&["/a.pdf"]);

        assert_eq!(
            rx.try_recv().unwrap(),
            WorkingSetEvent::Added(paths(&["/a.pdf"]))
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            WorkingSetEvent::Removed(paths(&["/a.pdf"]))
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_ingest_directory_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"%PDF-1.4").unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"%PDF-1.4").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("c.pdf"), b"%PDF-1.4").unwrap();

        let mut set = WorkingSet::default();
        let added = set.ingest_directory(dir.path(), false, None).unwrap();
        assert_eq!(
            added,
            vec![dir.path().join("a.pdf"), dir.path().join("b.pdf")]
        );

        let added = set.ingest_directory(dir.path(), true, None).unwrap();
        assert_eq!(added, vec![dir.path().join("sub").join("c.pdf")]);
    }

    #[test]
    fn test_ingest_directory_with_pattern() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("invoice-1.pdf"), b"%PDF-1.4").unwrap();
        std::fs::write(dir.path().join("letter.pdf"), b"%PDF-1.4").unwrap();

        let mut set = WorkingSet::default();
        let added = set
            .ingest_directory(dir.path(), false, Some("invoice*"))
            .unwrap();
        assert_eq!(added, vec![dir.path().join("invoice-1.pdf")]);
    }

    #[test]
    fn test_ingest_directory_missing() {
        let mut set = WorkingSet::default();
        let result = set.ingest_directory(Path::new("/nonexistent/dir"), false, None);
        assert!(matches!(result, Err(Error::PdfNotFound { .. })));
    }
}
