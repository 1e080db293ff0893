//! Filesystem document loading.
//!
//! [`FsLoader`] resolves a directory scan (or an explicit file list,
//! which takes precedence when configured) into [`Document`]s, tagging
//! every document's metadata with a `source` path. Plain-text formats are
//! read whole; CSV files become one document per row. Unsupported or
//! unreadable files are logged and skipped — they never abort the batch.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::document::Document;
use crate::error::Result;

/// File extensions read as whole-text documents.
const TEXT_EXTENSIONS: [&str; 2] = ["txt", "md"];

/// The documents and resolved source identifiers produced by one load.
#[derive(Debug, Clone)]
pub struct LoadedCorpus {
    /// Extracted documents, in source order.
    pub documents: Vec<Document>,
    /// The source paths that produced at least one document.
    pub sources: Vec<String>,
}

/// A collaborator that resolves raw documents for ingestion.
pub trait DocumentLoader: Send + Sync {
    /// Load all available documents with their source identifiers.
    fn load(&self) -> Result<LoadedCorpus>;
}

/// Loads documents from the local filesystem.
///
/// Scans the configured directory (non-recursively, in sorted order) for
/// supported files, unless an explicit file list is set — a named-files
/// configuration always overrides directory scanning.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::FsLoader;
///
/// let loader = FsLoader::new("data");
/// let corpus = loader.load()?;
/// ```
#[derive(Debug, Clone)]
pub struct FsLoader {
    directory: PathBuf,
    files: Option<Vec<PathBuf>>,
}

impl FsLoader {
    /// Create a loader scanning the given directory.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self { directory: directory.into(), files: None }
    }

    /// Restrict loading to an explicit file list, overriding the
    /// directory scan. An empty list clears the override.
    pub fn with_files(mut self, files: Vec<PathBuf>) -> Self {
        self.files = if files.is_empty() { None } else { Some(files) };
        self
    }

    /// Resolve the paths to load: the explicit file list when present,
    /// otherwise the supported files directly inside the directory.
    fn resolve_paths(&self) -> Vec<PathBuf> {
        if let Some(files) = &self.files {
            info!(count = files.len(), "using explicitly configured files");
            return files.clone();
        }

        if !self.directory.is_dir() {
            warn!(directory = %self.directory.display(), "document directory does not exist");
            return Vec::new();
        }

        let mut paths: Vec<PathBuf> = WalkDir::new(&self.directory)
            .max_depth(1)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| is_supported(path))
            .collect();

        paths.sort();
        paths
    }
}

impl DocumentLoader for FsLoader {
    fn load(&self) -> Result<LoadedCorpus> {
        let mut documents = Vec::new();
        let mut sources = Vec::new();

        for path in self.resolve_paths() {
            if !path.exists() {
                warn!(path = %path.display(), "file not found, skipping");
                continue;
            }

            let loaded = match extension_of(&path).as_deref() {
                Some(ext) if TEXT_EXTENSIONS.contains(&ext) => load_text(&path),
                Some("csv") => load_csv(&path),
                _ => {
                    warn!(path = %path.display(), "unsupported file type, skipping");
                    continue;
                }
            };

            match loaded {
                Ok(docs) if docs.is_empty() => {
                    debug!(path = %path.display(), "file produced no documents");
                }
                Ok(docs) => {
                    info!(path = %path.display(), documents = docs.len(), "loaded file");
                    sources.push(path.display().to_string());
                    documents.extend(docs);
                }
                Err(message) => {
                    warn!(path = %path.display(), error = %message, "unreadable file, skipping");
                }
            }
        }

        Ok(LoadedCorpus { documents, sources })
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

fn is_supported(path: &Path) -> bool {
    matches!(
        extension_of(path).as_deref(),
        Some("txt") | Some("md") | Some("csv") | Some("pdf") | Some("docx") | Some("xls")
            | Some("xlsx")
    )
}

fn source_metadata(path: &Path) -> HashMap<String, String> {
    HashMap::from([("source".to_string(), path.display().to_string())])
}

fn load_text(path: &Path) -> std::result::Result<Vec<Document>, String> {
    let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![Document { text, metadata: source_metadata(path) }])
}

/// Read a CSV file into one document per row, rendering each row as
/// `header: value` pairs the way a human would read the record aloud.
fn load_csv(path: &Path) -> std::result::Result<Vec<Document>, String> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| e.to_string())?;
    let headers = reader.headers().map_err(|e| e.to_string())?.clone();

    let mut documents = Vec::new();
    for (row_index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| e.to_string())?;
        let text = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| format!("{header}: {value}"))
            .collect::<Vec<_>>()
            .join(", ");
        if text.is_empty() {
            continue;
        }

        let mut metadata = source_metadata(path);
        metadata.insert("row".to_string(), row_index.to_string());
        documents.push(Document { text, metadata });
    }

    Ok(documents)
}
