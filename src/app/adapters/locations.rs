//! Input location handling
//!
//! Resolves the textual input identifiers accepted by the reader (paths,
//! `file:` URLs, `-` for standard input) into openable sources, and expands
//! directory and glob arguments into concrete file lists.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;
use walkdir::WalkDir;

use crate::constants::{SDF_EXTENSIONS, STDIN_LOCATION};
use crate::{Error, Result};

/// Where the bytes of an input location come from
#[derive(Debug, Clone)]
pub enum LocationSource {
    File(PathBuf),
    Stdin,
    Memory(Arc<[u8]>),
}

/// One readable input location
///
/// The identifier is the literal text the location was created from and is
/// what appears in source-location columns.
#[derive(Debug, Clone)]
pub struct InputLocation {
    identifier: String,
    source: LocationSource,
}

impl InputLocation {
    /// Resolve an identifier into a location
    ///
    /// Accepts plain paths, `file:` URLs and `-`. Any other URL scheme is a
    /// configuration error.
    pub fn parse(identifier: &str) -> Result<Self> {
        let trimmed = identifier.trim();
        if trimmed.is_empty() {
            return Err(Error::configuration("Empty input location"));
        }

        let source = if trimmed == STDIN_LOCATION {
            LocationSource::Stdin
        } else if let Some(path) = file_url_path(trimmed) {
            LocationSource::File(PathBuf::from(path))
        } else if let Some(scheme) = url_scheme(trimmed) {
            return Err(Error::configuration(format!(
                "Unsupported location scheme '{}' in '{}' (only local files, file: URLs and '-' are readable)",
                scheme, trimmed
            )));
        } else {
            LocationSource::File(PathBuf::from(trimmed))
        };

        Ok(Self {
            identifier: identifier.to_string(),
            source,
        })
    }

    /// Create a location over in-memory data
    pub fn in_memory(identifier: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        let data: Vec<u8> = data.into();
        Self {
            identifier: identifier.into(),
            source: LocationSource::Memory(Arc::from(data)),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn source(&self) -> &LocationSource {
        &self.source
    }

    /// Local file path, if this location is a file
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            LocationSource::File(path) => Some(path),
            _ => None,
        }
    }

    /// Size in bytes when it can be known before reading
    pub fn size_hint(&self) -> Option<u64> {
        match &self.source {
            LocationSource::File(path) => std::fs::metadata(path).ok().map(|m| m.len()),
            LocationSource::Stdin => None,
            LocationSource::Memory(data) => Some(data.len() as u64),
        }
    }

    /// Check that the location can be opened for reading
    pub fn check_accessible(&self) -> Result<()> {
        match &self.source {
            LocationSource::File(path) => {
                if !path.is_file() {
                    return Err(Error::file_not_found(path.display().to_string()));
                }
                File::open(path).map(|_| ()).map_err(|e| {
                    Error::io(format!("Cannot open input location '{}'", self.identifier), e)
                })
            }
            LocationSource::Stdin | LocationSource::Memory(_) => Ok(()),
        }
    }

    /// Open the location as a buffered reader
    pub fn open(&self) -> Result<Box<dyn BufRead + Send>> {
        match &self.source {
            LocationSource::File(path) => {
                let file = File::open(path).map_err(|e| {
                    if e.kind() == io::ErrorKind::NotFound {
                        Error::file_not_found(path.display().to_string())
                    } else {
                        Error::io(format!("Failed to open '{}'", self.identifier), e)
                    }
                })?;
                Ok(Box::new(BufReader::new(file)))
            }
            LocationSource::Stdin => Ok(Box::new(BufReader::new(io::stdin()))),
            LocationSource::Memory(data) => Ok(Box::new(Cursor::new(Arc::clone(data)))),
        }
    }
}

fn file_url_path(identifier: &str) -> Option<&str> {
    let rest = identifier
        .strip_prefix("file:")
        .or_else(|| identifier.strip_prefix("FILE:"))?;
    // file:///abs/path, file://localhost/abs/path and file:/abs/path
    let rest = rest
        .strip_prefix("//localhost")
        .or_else(|| rest.strip_prefix("//"))
        .unwrap_or(rest);
    Some(rest)
}

fn url_scheme(identifier: &str) -> Option<&str> {
    let (scheme, _) = identifier.split_once("://")?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        Some(scheme)
    } else {
        None
    }
}

/// Expand command-line input arguments into location identifiers
///
/// Directories are walked recursively for SD files (sorted by path), glob
/// patterns are expanded, everything else is passed through unchanged.
pub fn expand_inputs(inputs: &[String]) -> Result<Vec<String>> {
    let mut expanded = Vec::new();

    for input in inputs {
        let path = Path::new(input);
        if input != STDIN_LOCATION && path.is_dir() {
            let files = discover_sdf_files(path)?;
            debug!("Expanded directory {} to {} files", input, files.len());
            expanded.extend(files.into_iter().map(|p| p.display().to_string()));
        } else if is_glob_pattern(input) && !path.exists() {
            let matches = expand_glob(input)?;
            debug!("Expanded pattern {} to {} files", input, matches.len());
            expanded.extend(matches.into_iter().map(|p| p.display().to_string()));
        } else {
            expanded.push(input.clone());
        }
    }

    Ok(expanded)
}

/// Find all SD files below a directory
pub fn discover_sdf_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            Error::directory_traversal(format!("Failed to walk {}", root.display()), e)
        })?;
        if entry.file_type().is_file() && has_sdf_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

fn has_sdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SDF_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern).map_err(|source| Error::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut files: Vec<PathBuf> = paths
        .filter_map(|entry| match entry {
            Ok(path) if path.is_file() => Some(path),
            Ok(_) => None,
            Err(e) => {
                debug!("Skipping unreadable glob match: {}", e);
                None
            }
        })
        .collect();
    files.sort();
    Ok(files)
}
