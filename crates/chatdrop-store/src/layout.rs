use std::path::Path;

use chatdrop_types::models::ConversationRecord;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tracing::{info, warn};

use crate::Result;

pub const USERS_FILE: &str = "users.json";
pub const CONVERSATIONS_DIR: &str = "conversations";
pub const INBOX_DIR: &str = "new-conversations";
pub const PROCESSED_DIR: &str = "processed";
pub const REJECTED_DIR: &str = "rejected";

/// Highest ids found on disk, used to seed the allocators.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IdScan {
    pub conversations: usize,
    pub max_conversation_id: u64,
    pub max_message_id: u64,
}

/// Create the data directory tree and an empty user list if absent.
pub async fn prepare(root: &Path) -> Result<()> {
    fs::create_dir_all(root.join(CONVERSATIONS_DIR)).await?;
    fs::create_dir_all(root.join(INBOX_DIR)).await?;

    let users = root.join(USERS_FILE);
    if !fs::try_exists(&users).await? {
        write_json(&users, &Vec::<serde_json::Value>::new()).await?;
        info!("Created empty user list at {}", users.display());
    }
    Ok(())
}

/// `<id>.json` in the conversations directory.
pub fn record_id(path: &Path) -> Option<u64> {
    if path.extension()? != "json" {
        return None;
    }
    path.file_stem()?.to_str()?.parse().ok()
}

pub async fn scan_ids(dir: &Path) -> Result<IdScan> {
    let mut scan = IdScan::default();
    let mut entries = fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let Some(id) = record_id(&path) else {
            continue;
        };
        scan.conversations += 1;
        scan.max_conversation_id = scan.max_conversation_id.max(id);

        match read_json::<ConversationRecord>(&path).await {
            Ok(record) => {
                let max_msg = record.messages.iter().map(|m| m.id).max().unwrap_or(0);
                scan.max_message_id = scan.max_message_id.max(max_msg);
            }
            Err(e) => warn!("Unreadable conversation file {}: {}", path.display(), e),
        }
    }

    Ok(scan)
}

pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Pretty-printed write through a temporary sibling and a rename, so readers
/// never observe a half-written file.
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");

    fs::write(&tmp, &bytes).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
