use chatdrop_types::api::DraftMessage;
use chatdrop_types::models::{ConversationRecord, Message, MessageStatus, User};
use chrono::{Duration, Utc};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::layout::{read_json, record_id, write_json};
use crate::{Result, Store, StoreError};

impl Store {
    // -- Users --

    pub async fn users(&self) -> Result<Vec<User>> {
        read_json(&self.users_path()).await
    }

    pub async fn user(&self, id: u64) -> Result<User> {
        self.users()
            .await?
            .into_iter()
            .find(|u| u.id == id)
            .ok_or(StoreError::UserNotFound(id))
    }

    pub async fn current_user(&self) -> Result<User> {
        self.user(self.current_user_id()).await
    }

    pub async fn save_users(&self, users: &[User]) -> Result<()> {
        let _guard = self.lock_users().await;
        write_json(&self.users_path(), users).await
    }

    // -- Conversations --

    /// All conversations, most recently active first. Unreadable files are
    /// skipped.
    pub async fn list_conversations(&self) -> Result<Vec<ConversationRecord>> {
        let mut entries = fs::read_dir(self.conversations_dir()).await?;
        let mut records = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if record_id(&path).is_none() {
                continue;
            }
            match read_json::<ConversationRecord>(&path).await {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping conversation file {}: {}", path.display(), e),
            }
        }

        records.sort_by(|a, b| {
            b.last_message_at
                .cmp(&a.last_message_at)
                .then(b.id.cmp(&a.id))
        });
        Ok(records)
    }

    pub async fn conversation(&self, id: u64) -> Result<ConversationRecord> {
        match fs::read(self.conversation_path(id)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::ConversationNotFound(id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Create a conversation between the current user and `participant_id`.
    ///
    /// Drafts without a timestamp are spaced one minute apart, the last one
    /// landing at creation time.
    pub async fn create_conversation(
        &self,
        participant_id: u64,
        drafts: Vec<DraftMessage>,
    ) -> Result<ConversationRecord> {
        if participant_id == self.current_user_id() {
            return Err(StoreError::Invalid(
                "A conversation needs a participant other than the current user".into(),
            ));
        }
        let participant = self.user(participant_id).await?;
        for draft in &drafts {
            self.check_draft(participant_id, draft)?;
        }

        let id = self.allocate_conversation_id();
        let now = Utc::now();
        let count = drafts.len() as i64;

        let mut messages: Vec<Message> = drafts
            .into_iter()
            .enumerate()
            .map(|(i, draft)| {
                let at = draft
                    .created_at
                    .unwrap_or_else(|| now - Duration::minutes(count - 1 - i as i64));
                build_message(0, id, draft, at)
            })
            .collect();
        messages.sort_by_key(|m| m.created_at);
        for message in &mut messages {
            message.id = self.allocate_message_id();
        }

        let record = ConversationRecord {
            id,
            last_message_at: messages.last().map(|m| m.created_at).unwrap_or(now),
            participant_id,
            messages,
        };

        let _guard = self.lock_conversation(id).await;
        write_json(&self.conversation_path(id), &record).await?;

        info!(
            "Created conversation {} with {} ({} messages)",
            id,
            participant.display_name,
            record.messages.len()
        );
        Ok(record)
    }

    pub async fn add_message(&self, conversation_id: u64, draft: DraftMessage) -> Result<Message> {
        let _guard = self.lock_conversation(conversation_id).await;
        let mut record = self.conversation(conversation_id).await?;
        self.check_draft(record.participant_id, &draft)?;

        let at = draft.created_at.unwrap_or_else(Utc::now);
        let message = build_message(self.allocate_message_id(), conversation_id, draft, at);

        let pos = record
            .messages
            .partition_point(|m| m.created_at <= message.created_at);
        record.messages.insert(pos, message.clone());
        record.last_message_at = record.last_message_at.max(message.created_at);

        write_json(&self.conversation_path(conversation_id), &record).await?;

        debug!(
            "Added {:?} message {} to conversation {}",
            message.kind, message.id, conversation_id
        );
        Ok(message)
    }

    /// Move a message forward to `status`. Setting the current status again
    /// is a no-op; moving backwards is rejected.
    pub async fn update_message_status(
        &self,
        message_id: u64,
        status: MessageStatus,
    ) -> Result<Message> {
        let conversation_id = self
            .find_conversation_of(message_id)
            .await?
            .ok_or(StoreError::MessageNotFound(message_id))?;

        let _guard = self.lock_conversation(conversation_id).await;
        let mut record = self.conversation(conversation_id).await?;
        let message = record
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or(StoreError::MessageNotFound(message_id))?;

        if status < message.status {
            return Err(StoreError::StatusRegression {
                id: message_id,
                current: message.status,
                requested: status,
            });
        }
        if status == message.status {
            return Ok(message.clone());
        }

        message.status = status;
        let updated = message.clone();
        write_json(&self.conversation_path(conversation_id), &record).await?;

        debug!("Message {} is now {}", message_id, status);
        Ok(updated)
    }

    async fn find_conversation_of(&self, message_id: u64) -> Result<Option<u64>> {
        Ok(self
            .list_conversations()
            .await?
            .into_iter()
            .find(|r| r.messages.iter().any(|m| m.id == message_id))
            .map(|r| r.id))
    }

    fn check_draft(&self, participant_id: u64, draft: &DraftMessage) -> Result<()> {
        if draft.sender_id != participant_id && draft.sender_id != self.current_user_id() {
            return Err(StoreError::Invalid(format!(
                "Sender {} is not a member of this conversation",
                draft.sender_id
            )));
        }
        if draft.content.trim().is_empty() {
            return Err(StoreError::Invalid("Message content must not be empty".into()));
        }
        Ok(())
    }
}

fn build_message(
    id: u64,
    conversation_id: u64,
    draft: DraftMessage,
    created_at: chrono::DateTime<Utc>,
) -> Message {
    Message {
        id,
        conversation_id,
        sender_id: draft.sender_id,
        kind: draft.kind,
        content: draft.content,
        metadata: draft.metadata.filter(|m| !m.is_empty()),
        created_at,
        status: draft.status.unwrap_or_default(),
    }
}
