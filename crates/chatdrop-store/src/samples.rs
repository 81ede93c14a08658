use chatdrop_types::api::DraftMessage;
use chatdrop_types::models::{MessageMetadata, MessageStatus, User};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tokio::fs;
use tracing::info;

use crate::layout::write_json;
use crate::{Result, Store};

pub const INBOX_TEMPLATE: &str = "conversation-template.json";

struct Contact {
    username: &'static str,
    display_name: &'static str,
    avatar: &'static str,
    last_seen_hours: i64,
}

const CONTACTS: [Contact; 4] = [
    Contact {
        username: "fabian",
        display_name: "Fabian",
        avatar: "https://images.unsplash.com/photo-1599566150163-29194dcaad36",
        last_seen_hours: 0,
    },
    Contact {
        username: "peter",
        display_name: "Peter Drucker",
        avatar: "https://images.unsplash.com/photo-1570295999919-56ceb5ecca61",
        last_seen_hours: 1,
    },
    Contact {
        username: "madeleine",
        display_name: "Madeleine Ythu",
        avatar: "https://images.unsplash.com/photo-1544005313-94ddf0286df2",
        last_seen_hours: 24,
    },
    Contact {
        username: "nicolas",
        display_name: "Nicolas Domenech",
        avatar: "https://images.unsplash.com/photo-1573497019940-1c28c88b4f3e",
        last_seen_hours: 2,
    },
];

/// The demo cast. Contacts take the lowest ids that are not
/// `current_user_id`; the current user is always last.
pub fn sample_users(current_user_id: u64, now: DateTime<Utc>) -> Vec<User> {
    let ids = (1..).filter(|id| *id != current_user_id);
    let mut users: Vec<User> = CONTACTS
        .iter()
        .zip(ids)
        .map(|(c, id)| User {
            id,
            username: c.username.to_string(),
            display_name: c.display_name.to_string(),
            avatar: Some(c.avatar.to_string()),
            last_seen: Some(now - Duration::hours(c.last_seen_hours)),
        })
        .collect();

    users.push(User {
        id: current_user_id,
        username: "currentUser".to_string(),
        display_name: "Current User".to_string(),
        avatar: Some("https://images.unsplash.com/photo-1535713875002-d1d0cf377fde".to_string()),
        last_seen: Some(now),
    });
    users
}

fn minutes_ago(now: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    now - Duration::minutes(minutes)
}

/// Sample threads, one per contact, in the order of `sample_users`.
fn sample_threads(me: u64, contacts: &[u64], now: DateTime<Utc>) -> Vec<Vec<DraftMessage>> {
    let read = MessageStatus::Read;
    let [fabian, _peter, madeleine, nicolas] = [contacts[0], contacts[1], contacts[2], contacts[3]];

    vec![
        vec![
            DraftMessage::text(fabian, "Quick question. Did Nicolas tell you about the consulting idea Arnaud suggested last week?")
                .at(minutes_ago(now, 134))
                .with_status(read),
            DraftMessage::text(me, "I ain't reading all that\nI'm happy for u tho\nor sorry that happened")
                .with_metadata(MessageMetadata {
                    is_quote: Some(true),
                    ..Default::default()
                })
                .at(minutes_ago(now, 130))
                .with_status(read),
            DraftMessage::text(fabian, "I hope that won't be your answer haha")
                .at(minutes_ago(now, 128))
                .with_status(read),
            DraftMessage::image(
                me,
                "https://images.unsplash.com/photo-1488521787991-ed7bbaae773c",
                Some("People queueing for two hours for this. Where was this taken?"),
            )
            .at(minutes_ago(now, 123))
            .with_status(read),
            DraftMessage::text(fabian, "No.")
                .at(minutes_ago(now, 75))
                .with_status(read),
            DraftMessage::audio(me, "/assets/audio/message1.mp3", 42)
                .at(minutes_ago(now, 73))
                .with_status(read),
            DraftMessage::text(fabian, "The problem with that approach is that it's very recruiting-centric.")
                .at(minutes_ago(now, 72))
                .with_status(MessageStatus::Delivered),
        ],
        vec![
            DraftMessage::text(me, "Management is doing things right...")
                .at(minutes_ago(now, 2 * 24 * 60))
                .with_status(read),
        ],
        vec![
            DraftMessage::text(madeleine, "Shall we meet tomorrow for coffee?")
                .at(minutes_ago(now, 24 * 60))
                .with_status(read),
        ],
        vec![
            DraftMessage::text(nicolas, "I finished the report - check it out")
                .at(minutes_ago(now, 3 * 24 * 60)),
        ],
    ]
}

impl Store {
    /// Write the demo users and one conversation per contact, but only into
    /// an empty store. Returns the number of conversations created.
    pub async fn seed_samples(&self) -> Result<usize> {
        if !self.users().await?.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let me = self.current_user_id();
        let users = sample_users(me, now);
        self.save_users(&users).await?;

        let contacts: Vec<u64> = users.iter().map(|u| u.id).filter(|id| *id != me).collect();
        let threads = sample_threads(me, &contacts, now);

        let mut created = 0;
        for (contact, drafts) in contacts.iter().zip(threads) {
            self.create_conversation(*contact, drafts).await?;
            created += 1;
        }

        info!("Seeded {} users and {} sample conversations", users.len(), created);
        Ok(created)
    }

    /// Drop a starter definition into the inbox so users have something to
    /// copy. Ingestion skips it because of its name.
    pub async fn write_inbox_template(&self) -> Result<bool> {
        let path = self.inbox_dir().join(INBOX_TEMPLATE);
        if fs::try_exists(&path).await? {
            return Ok(false);
        }

        let me = self.current_user_id();
        let Some(contact) = self.users().await?.into_iter().find(|u| u.id != me) else {
            return Ok(false);
        };

        let template = json!({
            "participants": [{ "userId": contact.id }, { "userId": me }],
            "messages": [
                {
                    "senderId": contact.id,
                    "type": "text",
                    "content": "Hello! This is a new conversation.",
                    "status": "read"
                },
                {
                    "senderId": me,
                    "type": "text",
                    "content": "Hi! I created this by dropping a file into the new-conversations folder!",
                    "status": "read"
                }
            ]
        });
        write_json(&path, &template).await?;

        info!("Created conversation template at {}", path.display());
        Ok(true)
    }
}
