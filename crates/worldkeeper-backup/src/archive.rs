//! Archive creation for backup units.
//!
//! Packages a populated unit directory into a single zip file. Entry names
//! are relative to the unit directory (`Level/...`, `Players/...`) with no
//! wrapping top-level entry. The unit directory itself is left in place.

use crate::error::{BackupError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Component, Path, PathBuf};
use std::time::Instant;
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Deflate level used for backups (maximum)
pub const DEFAULT_COMPRESSION_LEVEL: i64 = 9;

/// Result of packaging a unit.
#[derive(Debug, Clone)]
pub struct ArchiveResult {
    /// Path to the created archive
    pub archive_path: PathBuf,

    /// Size of the archive in bytes
    pub size_bytes: u64,

    /// Number of files included
    pub file_count: usize,

    /// Duration of the operation in seconds
    pub duration_seconds: f64,
}

/// Configuration for archive creation.
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    /// Deflate level (1-9)
    pub compression_level: i64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl ArchiveConfig {
    /// Sets the compression level.
    pub fn with_compression_level(mut self, level: i64) -> Self {
        self.compression_level = level.clamp(1, 9);
        self
    }
}

/// One entry to write, relative to the unit directory
#[derive(Debug)]
enum ArchiveEntry {
    File { path: PathBuf, name: String },
    EmptyDir { name: String },
}

/// Zip builder for backup units.
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    config: ArchiveConfig,
}

impl ArchiveBuilder {
    /// Creates a new archive builder.
    pub fn new(config: ArchiveConfig) -> Self {
        Self { config }
    }

    /// Packages `source_dir` into `output_path`.
    ///
    /// Fails if `output_path` already exists. Blocking; run it off the
    /// async executor.
    pub fn create(&self, source_dir: &Path, output_path: &Path) -> Result<ArchiveResult> {
        let start_time = Instant::now();

        let entries = self.scan_directory(source_dir)?;

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(output_path)
            .map_err(|e| BackupError::archive(output_path, e))?;
        let file_count = self.write_zip(BufWriter::new(file), &entries, output_path)?;

        let size_bytes = fs::metadata(output_path)
            .map_err(|e| BackupError::archive(output_path, e))?
            .len();
        let duration_seconds = start_time.elapsed().as_secs_f64();

        debug!(
            "Archived {} files from {} into {} ({} bytes)",
            file_count,
            source_dir.display(),
            output_path.display(),
            size_bytes
        );

        Ok(ArchiveResult {
            archive_path: output_path.to_path_buf(),
            size_bytes,
            file_count,
            duration_seconds,
        })
    }

    /// Walks the unit directory in a stable order.
    fn scan_directory(&self, source_dir: &Path) -> Result<Vec<ArchiveEntry>> {
        let mut entries = Vec::new();

        for entry in WalkDir::new(source_dir)
            .min_depth(1)
            .sort_by_file_name()
            .follow_links(false)
        {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(source_dir).to_path_buf();
                BackupError::read_dir(path, io::Error::from(e))
            })?;

            let relative = entry
                .path()
                .strip_prefix(source_dir)
                .map_err(|e| BackupError::read_dir(entry.path(), io::Error::other(e)))?;
            let name = entry_name(relative);

            if entry.file_type().is_dir() {
                let mut children = fs::read_dir(entry.path())
                    .map_err(|e| BackupError::read_dir(entry.path(), e))?;
                if children.next().is_none() {
                    entries.push(ArchiveEntry::EmptyDir { name });
                }
            } else if entry.file_type().is_file() {
                entries.push(ArchiveEntry::File {
                    path: entry.path().to_path_buf(),
                    name,
                });
            }
        }

        Ok(entries)
    }

    fn write_zip(
        &self,
        output: BufWriter<File>,
        entries: &[ArchiveEntry],
        output_path: &Path,
    ) -> Result<usize> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(self.config.compression_level));

        let mut zip = ZipWriter::new(output);
        let mut file_count = 0;

        for entry in entries {
            match entry {
                ArchiveEntry::File { path, name } => {
                    zip.start_file(name.as_str(), options)
                        .map_err(|e| BackupError::archive(output_path, e))?;
                    let mut source =
                        File::open(path).map_err(|e| BackupError::archive(path, e))?;
                    io::copy(&mut source, &mut zip)
                        .map_err(|e| BackupError::archive(output_path, e))?;
                    file_count += 1;
                }
                ArchiveEntry::EmptyDir { name } => {
                    zip.add_directory(name.as_str(), options)
                        .map_err(|e| BackupError::archive(output_path, e))?;
                }
            }
        }

        let mut output = zip
            .finish()
            .map_err(|e| BackupError::archive(output_path, e))?;
        io::Write::flush(&mut output).map_err(|e| BackupError::archive(output_path, e))?;

        Ok(file_count)
    }
}

/// Zip entry name for a path relative to the unit directory
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
