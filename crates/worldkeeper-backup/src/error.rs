//! Error types for the backup engine

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using the backup engine's error type
pub type Result<T> = std::result::Result<T, BackupError>;

/// Failures that abort a backup cycle
///
/// Nothing inside a cycle recovers from these; they travel unchanged to
/// [`crate::BackupWorker::join`].
#[derive(Error, Debug)]
pub enum BackupError {
    /// A destination directory could not be created
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A source directory (or the backup root) could not be listed
    #[error("Failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A save file could not be copied, including when the target already exists
    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The zip archive could not be written
    #[error("Failed to write archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// An expired backup could not be deleted
    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The worker task was cancelled by the runtime before it finished
    #[error("Backup worker was cancelled before it finished")]
    WorkerCancelled,
}

impl BackupError {
    /// Create a directory creation error
    pub fn create_dir(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::CreateDir {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a directory listing error
    pub fn read_dir(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::ReadDir {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a copy error
    pub fn copy(from: impl AsRef<Path>, to: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Copy {
            from: from.as_ref().to_path_buf(),
            to: to.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create an archive error
    pub fn archive(path: impl AsRef<Path>, source: impl Into<zip::result::ZipError>) -> Self {
        Self::Archive {
            path: path.as_ref().to_path_buf(),
            source: source.into(),
        }
    }

    /// Create a removal error
    pub fn remove(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Remove {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Path the failed operation was working on, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::CreateDir { path, .. }
            | Self::ReadDir { path, .. }
            | Self::Archive { path, .. }
            | Self::Remove { path, .. } => Some(path),
            Self::Copy { to, .. } => Some(to),
            Self::Io(_) | Self::WorkerCancelled => None,
        }
    }

    /// Check if the error is a copy collision with an existing file
    pub fn is_collision(&self) -> bool {
        matches!(
            self,
            Self::Copy { source, .. } if source.kind() == io::ErrorKind::AlreadyExists
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_path() {
        let err = BackupError::read_dir(
            "/srv/game/Level/Survival",
            io::Error::new(io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(
            err.to_string(),
            "Failed to read directory /srv/game/Level/Survival: missing"
        );
        assert_eq!(err.path(), Some(Path::new("/srv/game/Level/Survival")));
    }

    #[test]
    fn test_collision_detection() {
        let err = BackupError::copy(
            "a.dat",
            "dest/a.dat",
            io::Error::new(io::ErrorKind::AlreadyExists, "exists"),
        );
        assert!(err.is_collision());

        let err = BackupError::copy(
            "a.dat",
            "dest/a.dat",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_collision());
    }

    #[test]
    fn test_archive_error_from_io() {
        let err = BackupError::archive(
            "Backups/1.zip",
            io::Error::new(io::ErrorKind::AlreadyExists, "exists"),
        );
        assert!(matches!(err, BackupError::Archive { .. }));
        assert!(err.to_string().starts_with("Failed to write archive Backups/1.zip"));
    }
}
