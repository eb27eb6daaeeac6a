//! On-disk layout of the server saves and of the backups produced from them.
//!
//! ```text
//! <data-dir>/Backups/
//!   <backup-id>/
//!     Level/*.dat
//!     Players/<player-id>/<world-name>/Player/*.dat
//!   <backup-id>.zip
//! ```

use crate::backup_id::BackupId;
use std::path::{Path, PathBuf};

/// Backup root directory name under the data directory
pub const BACKUPS_DIR: &str = "Backups";

/// World save subtree, both on the server and inside a unit
pub const LEVEL_DIR: &str = "Level";

/// Per-player saves root, both on the server and inside a unit
pub const PLAYERS_DIR: &str = "Players";

/// Leaf directory holding one player's save files for one world
pub const PLAYER_DIR: &str = "Player";

/// Extension of the save files that get copied
pub const SAVE_FILE_EXTENSION: &str = "dat";

/// Extension of packaged backup units
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Backup root for a data directory
pub fn backup_root(data_dir: impl AsRef<Path>) -> PathBuf {
    data_dir.as_ref().join(BACKUPS_DIR)
}

/// Directory of one backup unit
pub fn unit_dir(root: &Path, id: BackupId) -> PathBuf {
    root.join(id.to_string())
}

/// Archive of one backup unit
pub fn archive_path(root: &Path, id: BackupId) -> PathBuf {
    root.join(format!("{}.{}", id, ARCHIVE_EXTENSION))
}

/// Whether `path` is a save file (case-insensitive `.dat`)
pub fn is_save_file(path: &Path) -> bool {
    has_extension(path, SAVE_FILE_EXTENSION)
}

pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}
