//! Display strings for the conversation list: timestamps, audio lengths and
//! one-line message previews.

use chrono::{DateTime, Utc};

use crate::models::{Message, MessageKind};

const PREVIEW_CHARS: usize = 40;

/// `m:ss`, e.g. `0:42` or `12:05`.
pub fn format_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Relative label for a timestamp as seen at `now`.
///
/// Same day gives `HH:MM`, the day before gives `Yesterday`, anything less
/// than seven full days old gives the weekday name, older dates give
/// `dd/mm/yyyy`.
pub fn format_timestamp(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let day = at.date_naive();
    let today = now.date_naive();

    if day == today {
        return at.format("%H:%M").to_string();
    }
    if today.pred_opt() == Some(day) {
        return "Yesterday".to_string();
    }
    if (now - at).num_days() < 7 {
        return at.format("%A").to_string();
    }
    at.format("%d/%m/%Y").to_string()
}

pub fn message_preview(message: &Message) -> String {
    let meta = message.metadata.as_ref();
    match message.kind {
        MessageKind::Text => {
            let mut chars = message.content.chars();
            let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
            if chars.next().is_some() {
                format!("{head}...")
            } else {
                head
            }
        }
        MessageKind::Image => match meta.and_then(|m| m.caption.as_deref()) {
            Some(caption) if !caption.is_empty() => format!("📷 {caption}"),
            _ => "📷 Photo".to_string(),
        },
        MessageKind::Audio => match meta.and_then(|m| m.duration) {
            Some(secs) => format!("🎵 Audio message ({})", format_duration(secs)),
            None => "🎵 Audio message".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageMetadata, MessageStatus};
    use chrono::TimeZone;

    fn msg(kind: MessageKind, content: &str, metadata: Option<MessageMetadata>) -> Message {
        Message {
            id: 1,
            conversation_id: 1,
            sender_id: 1,
            kind,
            content: content.to_string(),
            metadata,
            created_at: Utc::now(),
            status: MessageStatus::Read,
        }
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(42), "0:42");
        assert_eq!(format_duration(725), "12:05");
    }

    #[test]
    fn timestamp_labels() {
        // Wednesday
        let now = Utc.with_ymd_and_hms(2025, 3, 12, 18, 30, 0).unwrap();

        let same_day = Utc.with_ymd_and_hms(2025, 3, 12, 9, 5, 0).unwrap();
        assert_eq!(format_timestamp(same_day, now), "09:05");

        let yesterday = Utc.with_ymd_and_hms(2025, 3, 11, 23, 59, 0).unwrap();
        assert_eq!(format_timestamp(yesterday, now), "Yesterday");

        let this_week = Utc.with_ymd_and_hms(2025, 3, 8, 12, 0, 0).unwrap();
        assert_eq!(format_timestamp(this_week, now), "Saturday");

        // Six days and 22.5 hours ago is still within the week.
        let last_wednesday = Utc.with_ymd_and_hms(2025, 3, 5, 20, 0, 0).unwrap();
        assert_eq!(format_timestamp(last_wednesday, now), "Wednesday");

        let seven_days = Utc.with_ymd_and_hms(2025, 3, 5, 18, 0, 0).unwrap();
        assert_eq!(format_timestamp(seven_days, now), "05/03/2025");

        let older = Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0).unwrap();
        assert_eq!(format_timestamp(older, now), "01/02/2025");
    }

    #[test]
    fn text_preview_truncates_on_char_boundary() {
        let long = "é".repeat(50);
        let preview = message_preview(&msg(MessageKind::Text, &long, None));
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));

        assert_eq!(message_preview(&msg(MessageKind::Text, "Non.", None)), "Non.");
    }

    #[test]
    fn media_previews() {
        assert_eq!(message_preview(&msg(MessageKind::Image, "http://x", None)), "📷 Photo");

        let captioned = MessageMetadata {
            caption: Some("Queue".into()),
            ..Default::default()
        };
        assert_eq!(
            message_preview(&msg(MessageKind::Image, "http://x", Some(captioned))),
            "📷 Queue"
        );

        let timed = MessageMetadata {
            duration: Some(42),
            ..Default::default()
        };
        assert_eq!(
            message_preview(&msg(MessageKind::Audio, "/a.mp3", Some(timed))),
            "🎵 Audio message (0:42)"
        );
    }
}
