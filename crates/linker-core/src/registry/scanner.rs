//! Recursive model directory scanning.

use super::folders::FolderPaths;
use crate::config::{is_asset_category, is_model_extension, ScanSettings};
use crate::error::{LinkerError, Result};
use crate::matcher::split_extension;
use crate::models::AssetRecord;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

fn accepts(filename: &str, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    let (_, ext) = split_extension(filename);
    let ext = ext.to_lowercase();
    extensions.iter().any(|e| *e == ext) || is_model_extension(&ext)
}

/// Recursively scan one directory for model files.
///
/// An empty `extensions` list accepts every file. Otherwise a file is kept
/// when its extension is in `extensions` or is a known model extension.
/// Unreadable entries are logged and skipped.
pub fn scan_directory(
    dir: &Path,
    extensions: &[String],
    category: &str,
    settings: &ScanSettings,
) -> Result<Vec<AssetRecord>> {
    if !dir.is_dir() {
        return Err(LinkerError::NotADirectory(dir.to_path_buf()));
    }
    let base = std::path::absolute(dir).map_err(|e| LinkerError::io_with_path(e, dir))?;
    let base_directory = base.to_string_lossy().to_string();

    let mut walker = WalkDir::new(&base)
        .min_depth(1)
        .follow_links(settings.follow_symlinks);
    if settings.max_depth > 0 {
        walker = walker.max_depth(settings.max_depth);
    }

    let mut records = Vec::new();
    let entries = walker
        .into_iter()
        .filter_entry(|e| !(settings.skip_hidden && e.file_type().is_dir() && is_hidden(e)));

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error scanning {}: {}", base.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let filename = entry.file_name().to_string_lossy().to_string();
        if !accepts(&filename, extensions) {
            continue;
        }

        let relative_path = entry
            .path()
            .strip_prefix(&base)
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|_| filename.clone());

        records.push(AssetRecord {
            absolute_path: entry.path().to_string_lossy().to_string(),
            filename,
            relative_path,
            category: category.to_string(),
            base_directory: base_directory.clone(),
        });
    }

    Ok(records)
}

/// Scan every asset directory in `folders`.
///
/// Directories that are missing or unreadable are skipped; a record whose
/// absolute path was already produced by an earlier directory is dropped.
pub fn scan_all(folders: &FolderPaths, settings: &ScanSettings) -> Vec<AssetRecord> {
    info!("Scanning {} model categories", folders.len());

    let mut seen = HashSet::new();
    let mut all = Vec::new();
    for entry in folders.iter() {
        if !is_asset_category(&entry.category) {
            continue;
        }
        for dir in &entry.paths {
            match scan_directory(dir, &entry.extensions, &entry.category, settings) {
                Ok(records) => {
                    let before = all.len();
                    all.extend(
                        records
                            .into_iter()
                            .filter(|r| seen.insert(r.absolute_path.clone())),
                    );
                    debug!(
                        "Found {} models in {} -> {}",
                        all.len() - before,
                        entry.category,
                        dir.display()
                    );
                }
                Err(LinkerError::NotADirectory(_)) => {
                    debug!("Skipping missing directory {}", dir.display());
                }
                Err(e) => {
                    warn!("Error scanning {} directory {}: {}", entry.category, dir.display(), e);
                }
            }
        }
    }

    info!("Total models found: {}", all.len());
    all
}
