//! Interface between the backup engine and the game server hosting it.
//!
//! The engine reads world identity and save locations through [`WorldHost`]
//! and asks for a world save through [`SaveTrigger`]. The save routine is
//! not safe to call from the worker, so [`QueuedSave`] hands it to the
//! host's main thread through a [`MainThreadQueue`] that the host drains
//! from its own update loop.

use crate::error::{BackupError, Result};
use crate::layout::{LEVEL_DIR, PLAYERS_DIR};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Read-only view of the host's world state
pub trait WorldHost: Send + Sync {
    /// Name of the loaded world
    fn current_world_name(&self) -> String;

    /// Directory holding the world's save files
    fn world_save_directory(&self) -> PathBuf;

    /// Directory holding one subdirectory per player
    fn player_save_root(&self) -> PathBuf;

    /// IDs of every player with a save directory under [`Self::player_save_root`]
    fn enumerate_player_ids(&self) -> Result<Vec<String>>;
}

/// Fire-and-forget request for the host to persist the world
pub trait SaveTrigger: Send + Sync {
    fn request_save(&self);
}

/// Zero-argument action to run on the host's main thread
pub type MainThreadTask = Box<dyn FnOnce() + Send + 'static>;

/// Creates a linked dispatcher and queue
pub fn main_thread_channel() -> (MainThreadDispatcher, MainThreadQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MainThreadDispatcher { tx }, MainThreadQueue { rx })
}

/// Sending half, usable from any thread
#[derive(Clone)]
pub struct MainThreadDispatcher {
    tx: mpsc::UnboundedSender<MainThreadTask>,
}

impl MainThreadDispatcher {
    /// Queues `task`. Returns `false` if the queue has been dropped.
    pub fn dispatch<F>(&self, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.tx.send(Box::new(task)).is_ok()
    }
}

/// Receiving half, owned by the host's main loop
pub struct MainThreadQueue {
    rx: mpsc::UnboundedReceiver<MainThreadTask>,
}

impl MainThreadQueue {
    /// Runs every task queued so far and returns how many ran
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Waits for the next task. `None` once every dispatcher is gone.
    pub async fn next(&mut self) -> Option<MainThreadTask> {
        self.rx.recv().await
    }
}

/// [`SaveTrigger`] that runs the host's save routine on the main thread
pub struct QueuedSave {
    dispatcher: MainThreadDispatcher,
    save: Arc<dyn Fn() + Send + Sync>,
}

impl QueuedSave {
    pub fn new<F>(dispatcher: MainThreadDispatcher, save: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            dispatcher,
            save: Arc::new(save),
        }
    }
}

impl SaveTrigger for QueuedSave {
    fn request_save(&self) {
        let save = Arc::clone(&self.save);
        if self.dispatcher.dispatch(move || save()) {
            debug!("World save queued on the main thread");
        } else {
            warn!("Main thread queue is closed; world save request dropped");
        }
    }
}

/// [`WorldHost`] backed by a server directory:
/// `<server>/Level/<world>/` and `<server>/Players/<player-id>/`
#[derive(Debug, Clone)]
pub struct DirectoryHost {
    server_dir: PathBuf,
    world_name: String,
}

impl DirectoryHost {
    pub fn new(server_dir: impl Into<PathBuf>, world_name: impl Into<String>) -> Self {
        Self {
            server_dir: server_dir.into(),
            world_name: world_name.into(),
        }
    }
}

impl WorldHost for DirectoryHost {
    fn current_world_name(&self) -> String {
        self.world_name.clone()
    }

    fn world_save_directory(&self) -> PathBuf {
        self.server_dir.join(LEVEL_DIR).join(&self.world_name)
    }

    fn player_save_root(&self) -> PathBuf {
        self.server_dir.join(PLAYERS_DIR)
    }

    fn enumerate_player_ids(&self) -> Result<Vec<String>> {
        let root = self.player_save_root();
        let entries = fs::read_dir(&root).map_err(|e| BackupError::read_dir(&root, e))?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| BackupError::read_dir(&root, e))?;
            if !entry.path().is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(id) => ids.push(id),
                Err(name) => debug!("Skipping non UTF-8 player directory {:?}", name),
            }
        }
        ids.sort();
        Ok(ids)
    }
}
