use chatdrop_types::models::MessageStatus;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Conversation {0} not found")]
    ConversationNotFound(u64),

    #[error("User {0} not found")]
    UserNotFound(u64),

    #[error("Message {0} not found")]
    MessageNotFound(u64),

    #[error("File {0} not found")]
    FileNotFound(String),

    #[error("{0}")]
    Invalid(String),

    #[error("Message {id} is already {current}, cannot move back to {requested}")]
    StatusRegression {
        id: u64,
        current: MessageStatus,
        requested: MessageStatus,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}
