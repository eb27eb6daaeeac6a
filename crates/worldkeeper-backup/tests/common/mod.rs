//! Shared fixtures for backup engine integration tests

#![allow(dead_code)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use worldkeeper_backup::{backup_root, DirectoryHost};

pub const WORLD: &str = "Survival";

/// A server directory plus a data directory in one temp dir
pub struct ServerFixture {
    pub temp: TempDir,
    pub server_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl ServerFixture {
    /// Level with `a.dat`, `b.dat`, `c.txt`; player P1 has a save for the
    /// world, P2 only for another world
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let server_dir = temp.path().join("server");
        let data_dir = temp.path().join("data");

        let level = server_dir.join("Level").join(WORLD);
        fs::create_dir_all(&level).unwrap();
        fs::write(level.join("a.dat"), b"level a").unwrap();
        fs::write(level.join("b.dat"), b"level b").unwrap();
        fs::write(level.join("c.txt"), b"not a save").unwrap();

        let p1 = server_dir.join("Players/P1").join(WORLD).join("Player");
        fs::create_dir_all(&p1).unwrap();
        fs::write(p1.join("Inventory.dat"), b"p1 inventory").unwrap();
        fs::write(p1.join("Skills.dat"), b"p1 skills").unwrap();

        fs::create_dir_all(server_dir.join("Players/P2/Arena/Player")).unwrap();

        Self {
            temp,
            server_dir,
            data_dir,
        }
    }

    pub fn host(&self) -> DirectoryHost {
        DirectoryHost::new(&self.server_dir, WORLD)
    }

    pub fn backup_root(&self) -> PathBuf {
        backup_root(&self.data_dir)
    }

    /// Names directly under the backup root, sorted
    pub fn root_entries(&self) -> Vec<String> {
        let root = self.backup_root();
        if !root.exists() {
            return Vec::new();
        }
        let mut names: Vec<String> = fs::read_dir(root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Relative file paths under `dir`, '/'-separated and sorted
pub fn file_tree(dir: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(dir)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(dir)
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect();
    files.sort();
    files
}

/// Captures formatted log output for the current thread
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
