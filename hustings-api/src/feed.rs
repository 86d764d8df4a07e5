use crate::{CommentId, PostId, ReplyId, Time, UserId, UserType};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Comments,
    Replies,
}

/// A realtime subscription, scoped to the changes of one post
#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Subscription {
    pub table: Table,
    pub post_id: PostId,
}

impl Subscription {
    /// Both subscriptions the comments panel of a post needs
    pub fn for_post(post_id: &PostId) -> [Subscription; 2] {
        [
            Subscription {
                table: Table::Comments,
                post_id: post_id.clone(),
            },
            Subscription {
                table: Table::Replies,
                post_id: post_id.clone(),
            },
        ]
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Row-level change notification. `new` is set for inserts and updates, `old` for deletes.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ChangePayload<R> {
    #[serde(rename = "eventType")]
    pub event_type: ChangeKind,
    pub new: Option<R>,
    #[serde(default)]
    pub old: Option<KeyRow>,
}

/// The primary key columns delivered along with a delete
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct KeyRow {
    pub id: String,
    #[serde(default)]
    pub comment_id: Option<CommentId>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentRow {
    pub id: CommentId,
    pub post_id: PostId,
    pub user_id: UserId,
    pub user_type: UserType,
    pub content: String,
    pub created_at: Time,
    pub updated_at: Time,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ReplyRow {
    pub id: ReplyId,
    pub comment_id: CommentId,
    pub user_id: UserId,
    pub user_type: UserType,
    pub content: String,
    pub created_at: Time,
    pub updated_at: Time,
}

/// Client to server
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum FeedRequest {
    Ping,
    Subscribe(Subscription),
}

/// Server to client
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum FeedMessage {
    Pong,
    Subscribed(Subscription),
    Comments(ChangePayload<CommentRow>),
    Replies(ChangePayload<ReplyRow>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_payload_without_new() {
        let p: ChangePayload<ReplyRow> = serde_json::from_str(
            r#"{"eventType":"DELETE","old":{"id":"r-7","comment_id":"c-101"}}"#,
        )
        .expect("parsing delete payload");
        assert_eq!(p.event_type, ChangeKind::Delete);
        assert_eq!(p.new, None);
        let old = p.old.unwrap();
        assert_eq!(old.id, "r-7");
        assert_eq!(old.comment_id, Some(CommentId::from("c-101")));
    }

    #[test]
    fn comment_insert_message() {
        let msg: FeedMessage = serde_json::from_value(serde_json::json!({
            "Comments": {
                "eventType": "INSERT",
                "new": {
                    "id": "c-101",
                    "post_id": "p-1",
                    "user_id": "2f1d5a8e-7a7c-4a57-9a39-53c63c4f4e0b",
                    "user_type": "student",
                    "content": "Great initiative!",
                    "created_at": "2024-03-01T10:00:00Z",
                    "updated_at": "2024-03-01T10:00:00Z",
                },
            }
        }))
        .expect("parsing insert message");
        let FeedMessage::Comments(p) = msg else {
            panic!("expected a comments change, got {msg:?}");
        };
        assert_eq!(p.event_type, ChangeKind::Insert);
        assert_eq!(p.old, None);
        let row = p.new.unwrap();
        assert_eq!(row.id, CommentId::from("c-101"));
        assert_eq!(row.content, "Great initiative!");
    }

    #[test]
    fn feed_message_is_tagged() {
        let msg = FeedMessage::Subscribed(Subscription {
            table: Table::Replies,
            post_id: PostId::from("p-1"),
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "Subscribed": { "table": "replies", "post_id": "p-1" } })
        );
    }
}
