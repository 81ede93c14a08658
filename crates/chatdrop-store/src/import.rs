use std::path::Path;

use chatdrop_types::api::{ConversationDefinition, DraftMessage};
use chatdrop_types::models::ConversationRecord;
use tracing::{info, warn};

use crate::layout::read_json;
use crate::{Result, Store, StoreError};

impl Store {
    /// Turn a definition into a new conversation.
    ///
    /// The participant is the first `userId` that is not the current user.
    /// Messages that are malformed, empty, or sent by a non-member are
    /// dropped with a warning instead of failing the whole import.
    pub async fn import_definition(
        &self,
        definition: ConversationDefinition,
    ) -> Result<ConversationRecord> {
        let me = self.current_user_id();
        let participant_id = definition
            .participants
            .iter()
            .filter_map(|p| p.user_id)
            .find(|id| *id != me)
            .ok_or_else(|| {
                StoreError::Invalid("No valid participant found in the conversation definition".into())
            })?;

        let mut drafts = Vec::with_capacity(definition.messages.len());
        for (i, raw) in definition.messages.into_iter().enumerate() {
            match serde_json::from_value::<DraftMessage>(raw) {
                Ok(d) if d.sender_id != me && d.sender_id != participant_id => {
                    warn!("Skipping message {}: sender {} is not a member", i, d.sender_id)
                }
                Ok(d) if d.content.trim().is_empty() => {
                    warn!("Skipping message {}: empty content", i)
                }
                Ok(d) => drafts.push(d),
                Err(e) => warn!("Skipping message {}: {}", i, e),
            }
        }

        self.create_conversation(participant_id, drafts).await
    }

    /// Import a definition file that sits in the data root.
    ///
    /// `file_name` must be a bare file name; paths are refused.
    pub async fn load_definition_file(&self, file_name: &str) -> Result<ConversationRecord> {
        if !is_bare_file_name(file_name) {
            return Err(StoreError::Invalid(format!("Invalid file name: {file_name}")));
        }

        let path = self.root().join(file_name);
        let definition = match read_definition(&path).await {
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::FileNotFound(file_name.to_string()));
            }
            other => other?,
        };

        let record = self.import_definition(definition).await?;
        info!("Conversation loaded from {} with id {}", file_name, record.id);
        Ok(record)
    }
}

/// Read a definition file. Contents that are not a definition are the
/// caller's mistake, so they come back as `Invalid` rather than `Json`.
pub async fn read_definition(path: &Path) -> Result<ConversationDefinition> {
    match read_json(path).await {
        Err(StoreError::Json(e)) => Err(StoreError::Invalid(format!(
            "Failed to load conversation from file: {e}"
        ))),
        other => other,
    }
}

fn is_bare_file_name(name: &str) -> bool {
    !name.is_empty()
        && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name)
        && !name.contains(['/', '\\'])
}
