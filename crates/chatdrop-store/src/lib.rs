pub mod error;
pub mod import;
pub mod layout;
pub mod queries;
pub mod samples;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::info;

pub use error::{Result, StoreError};

/// File-backed chat store.
///
/// Every conversation lives in its own JSON file and is rewritten whole on
/// each mutation. Writers to the same conversation are serialized through a
/// per-conversation lock, and files are replaced atomically, so concurrent
/// appends never lose updates.
pub struct Store {
    root: PathBuf,
    current_user_id: u64,
    next_conversation_id: AtomicU64,
    next_message_id: AtomicU64,
    conversation_locks: Mutex<HashMap<u64, Arc<AsyncMutex<()>>>>,
    users_lock: AsyncMutex<()>,
}

impl Store {
    pub async fn open(root: impl Into<PathBuf>, current_user_id: u64) -> Result<Self> {
        let root = root.into();
        layout::prepare(&root).await?;

        let ids = layout::scan_ids(&root.join(layout::CONVERSATIONS_DIR)).await?;

        info!(
            "Store opened at {} ({} conversations, current user {})",
            root.display(),
            ids.conversations,
            current_user_id
        );
        Ok(Self {
            root,
            current_user_id,
            next_conversation_id: AtomicU64::new(ids.max_conversation_id + 1),
            next_message_id: AtomicU64::new(ids.max_message_id + 1),
            conversation_locks: Mutex::new(HashMap::new()),
            users_lock: AsyncMutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn current_user_id(&self) -> u64 {
        self.current_user_id
    }

    /// Directory watched for dropped-in conversation definitions.
    pub fn inbox_dir(&self) -> PathBuf {
        self.root.join(layout::INBOX_DIR)
    }

    pub(crate) fn users_path(&self) -> PathBuf {
        self.root.join(layout::USERS_FILE)
    }

    pub(crate) fn conversations_dir(&self) -> PathBuf {
        self.root.join(layout::CONVERSATIONS_DIR)
    }

    pub(crate) fn conversation_path(&self, id: u64) -> PathBuf {
        self.conversations_dir().join(format!("{id}.json"))
    }

    pub(crate) fn allocate_conversation_id(&self) -> u64 {
        self.next_conversation_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn allocate_message_id(&self) -> u64 {
        self.next_message_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Exclusive access to one conversation file for a read-modify-write.
    pub(crate) async fn lock_conversation(&self, id: u64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self
                .conversation_locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            locks.entry(id).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub(crate) async fn lock_users(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.users_lock.lock().await
    }
}
