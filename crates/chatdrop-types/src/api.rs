use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Message, MessageKind, MessageMetadata, MessageStatus, User};

// -- Drafts --

/// A message before the store assigns it an id and a conversation.
///
/// Also the per-message shape of conversation definition files, so unknown
/// fields are ignored rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftMessage {
    pub sender_id: u64,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MessageStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl DraftMessage {
    pub fn text(sender_id: u64, content: impl Into<String>) -> Self {
        Self {
            sender_id,
            kind: MessageKind::Text,
            content: content.into(),
            metadata: None,
            status: None,
            created_at: None,
        }
    }

    pub fn image(sender_id: u64, url: impl Into<String>, caption: Option<&str>) -> Self {
        Self {
            sender_id,
            kind: MessageKind::Image,
            content: url.into(),
            metadata: caption.map(|c| MessageMetadata {
                caption: Some(c.to_string()),
                ..Default::default()
            }),
            status: None,
            created_at: None,
        }
    }

    pub fn audio(sender_id: u64, url: impl Into<String>, duration_secs: u32) -> Self {
        Self {
            sender_id,
            kind: MessageKind::Audio,
            content: url.into(),
            metadata: Some(MessageMetadata {
                duration: Some(duration_secs),
                ..Default::default()
            }),
            status: None,
            created_at: None,
        }
    }

    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_status(mut self, status: MessageStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

// -- Conversation definitions --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRef {
    #[serde(default)]
    pub user_id: Option<u64>,
}

/// Input format for inbox files and `load-from-file`.
///
/// Messages stay as raw JSON so one malformed entry can be skipped without
/// rejecting the whole file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDefinition {
    #[serde(default)]
    pub participants: Vec<ParticipantRef>,
    #[serde(default)]
    pub messages: Vec<serde_json::Value>,
}

// -- Requests --

/// Accepts both `{ "userId": 3 }` and `{ "participantUserIds": [3, 5] }`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub participant_user_ids: Vec<u64>,
    #[serde(default)]
    pub messages: Vec<DraftMessage>,
}

impl CreateConversationRequest {
    /// The participant other than `current_user_id`, if one was named.
    pub fn participant(&self, current_user_id: u64) -> Option<u64> {
        self.user_id.or_else(|| {
            self.participant_user_ids
                .iter()
                .copied()
                .find(|id| *id != current_user_id)
        })
    }
}

/// Fields are optional so missing ones produce a readable 400 instead of a
/// generic extractor rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub sender_id: Option<u64>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub metadata: Option<MessageMetadata>,
}

impl SendMessageRequest {
    pub fn into_draft(self) -> Result<DraftMessage, &'static str> {
        let (Some(sender_id), Some(kind), Some(content)) = (self.sender_id, self.kind, self.content)
        else {
            return Err("Sender ID, type, and content are required");
        };
        if content.trim().is_empty() {
            return Err("Sender ID, type, and content are required");
        }
        let kind = kind
            .parse::<MessageKind>()
            .map_err(|_| "Type must be 'text', 'image', or 'audio'")?;

        Ok(DraftMessage {
            sender_id,
            kind,
            content,
            metadata: self.metadata.filter(|m| !m.is_empty()),
            status: Some(MessageStatus::Sent),
            created_at: None,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoadFromFileRequest {
    #[serde(default)]
    pub filename: Option<String>,
}

// -- Responses --

/// One row of the conversation list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: u64,
    pub last_message_at: DateTime<Utc>,
    pub participant: User,
    pub last_message: Option<Message>,
    pub preview: String,
    pub time_label: String,
    pub unread_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDetail {
    pub id: u64,
    pub last_message_at: DateTime<Utc>,
    pub participant: User,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}
