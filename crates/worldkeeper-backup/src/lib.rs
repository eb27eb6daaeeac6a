//! # worldkeeper-backup
//!
//! Self-scheduling backup engine for a game world.
//!
//! A background worker repeatedly runs a backup cycle:
//!
//! 1. wait for the configured interval
//! 2. ask the host to save the world (on the host's main thread)
//! 3. wait for the save to settle
//! 4. copy the world's `.dat` files and every player's save into a new
//!    directory named after a timestamped [`BackupId`]
//! 5. optionally package that directory as `<backup-id>.zip`
//! 6. log the new backup ID
//! 7. delete backups older than the retention window
//!
//! Any failure aborts the cycle and surfaces, unchanged, from
//! [`BackupWorker::join`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use worldkeeper_backup::{
//!     backup_root, main_thread_channel, BackupCycle, BackupWorker, DirectoryHost, QueuedSave,
//! };
//! use worldkeeper_core::BackupSettings;
//!
//! # async fn example() -> worldkeeper_backup::Result<()> {
//! let (dispatcher, mut queue) = main_thread_channel();
//! let host = Arc::new(DirectoryHost::new("/srv/game", "Survival"));
//! let save = Arc::new(QueuedSave::new(dispatcher, || println!("saving")));
//!
//! let cycle = BackupCycle::new(BackupSettings::default(), backup_root("/srv/data"), host, save);
//! let worker = BackupWorker::new(cycle);
//! worker.on_load(true);
//!
//! // The host drains `queue` from its own update loop.
//! queue.run_pending();
//! worker.request_stop();
//! worker.join().await
//! # }
//! ```

pub mod archive;
pub mod backup_id;
pub mod cycle;
pub mod error;
pub mod host;
pub mod layout;
pub mod retention;
pub mod snapshot;
pub mod worker;

// Re-export commonly used types
pub use archive::{ArchiveBuilder, ArchiveConfig, ArchiveResult};
pub use backup_id::BackupId;
pub use cycle::{BackupCycle, BackupReport};
pub use error::{BackupError, Result};
pub use host::{
    main_thread_channel, DirectoryHost, MainThreadDispatcher, MainThreadQueue, MainThreadTask,
    QueuedSave, SaveTrigger, WorldHost,
};
pub use layout::backup_root;
pub use retention::{list_units, BackupUnit, RetentionPruner};
pub use snapshot::{SnapshotPlan, SnapshotStats};
pub use worker::{BackupWorker, StopHandle};

/// Current version of the backup engine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
