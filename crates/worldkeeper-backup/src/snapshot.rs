//! Snapshotter: copies the world's and the players' save files into a new
//! backup unit directory.
//!
//! Only top-level `.dat` files are copied; subdirectories of a save
//! directory are never descended into. Copies never overwrite: a file that
//! already exists at the destination fails the snapshot.

use crate::error::{BackupError, Result};
use crate::host::WorldHost;
use crate::layout::{is_save_file, LEVEL_DIR, PLAYERS_DIR, PLAYER_DIR};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Everything a snapshot needs from the host, captured up front
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPlan {
    pub world_name: String,
    pub world_dir: PathBuf,
    pub player_root: PathBuf,
    pub player_ids: Vec<String>,
}

impl SnapshotPlan {
    /// Queries the host for the current world and its players
    pub fn from_host(host: &dyn WorldHost) -> Result<Self> {
        Ok(Self {
            world_name: host.current_world_name(),
            world_dir: host.world_save_directory(),
            player_root: host.player_save_root(),
            player_ids: host.enumerate_player_ids()?,
        })
    }

    /// Source directory of one player's saves for the current world
    pub fn player_source(&self, player_id: &str) -> PathBuf {
        self.player_root
            .join(player_id)
            .join(&self.world_name)
            .join(PLAYER_DIR)
    }

    /// Copies the planned files into `unit_dir`, creating it as needed
    pub fn take(&self, unit_dir: &Path) -> Result<SnapshotStats> {
        let mut stats = SnapshotStats::default();

        let level_dest = unit_dir.join(LEVEL_DIR);
        create_dir(&level_dest)?;
        let copied = copy_save_files(&self.world_dir, &level_dest)?;
        stats.level_files = copied.files;
        stats.bytes += copied.bytes;

        let players_dest = unit_dir.join(PLAYERS_DIR);
        create_dir(&players_dest)?;

        for player_id in &self.player_ids {
            let source = self.player_source(player_id);
            if !source.is_dir() {
                debug!(
                    "Skipping player {}: no save for world {}",
                    player_id, self.world_name
                );
                stats.players_skipped += 1;
                continue;
            }

            let dest = players_dest
                .join(player_id)
                .join(&self.world_name)
                .join(PLAYER_DIR);
            create_dir(&dest)?;
            let copied = copy_save_files(&source, &dest)?;
            stats.players += 1;
            stats.player_files += copied.files;
            stats.bytes += copied.bytes;
        }

        debug!(
            "Snapshot {}: {} level files, {} players ({} skipped), {} bytes",
            unit_dir.display(),
            stats.level_files,
            stats.players,
            stats.players_skipped,
            stats.bytes
        );
        Ok(stats)
    }
}

/// What a snapshot copied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotStats {
    /// Save files copied into `Level/`
    pub level_files: usize,
    /// Players whose saves were copied
    pub players: usize,
    /// Players without a save for the current world
    pub players_skipped: usize,
    /// Save files copied under `Players/`
    pub player_files: usize,
    /// Total bytes copied
    pub bytes: u64,
}

impl SnapshotStats {
    pub fn total_files(&self) -> usize {
        self.level_files + self.player_files
    }
}

#[derive(Default)]
struct Copied {
    files: usize,
    bytes: u64,
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| BackupError::create_dir(path, e))
}

/// Copies the top-level save files of `source` into `dest`
fn copy_save_files(source: &Path, dest: &Path) -> Result<Copied> {
    let entries = fs::read_dir(source).map_err(|e| BackupError::read_dir(source, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BackupError::read_dir(source, e))?;
        let path = entry.path();
        if path.is_file() && is_save_file(&path) {
            files.push((entry.file_name(), path));
        }
    }
    files.sort();

    let mut copied = Copied::default();
    for (name, file) in files {
        copied.bytes += copy_new(&file, &dest.join(name))?;
        copied.files += 1;
    }
    Ok(copied)
}

/// Copies `from` to `to`, failing if `to` already exists
fn copy_new(from: &Path, to: &Path) -> Result<u64> {
    let mut reader = File::open(from).map_err(|e| BackupError::copy(from, to, e))?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(to)
        .map_err(|e| BackupError::copy(from, to, e))?;
    io::copy(&mut reader, &mut writer).map_err(|e| BackupError::copy(from, to, e))
}
