use std::fmt;

use uuid::Uuid;

use crate::{Author, Time, UserId, UserType, PLACEHOLDER_PREFIX};

macro_rules! string_id {
    ($name:ident) => {
        #[derive(
            Clone,
            Debug,
            Eq,
            Hash,
            Ord,
            PartialEq,
            PartialOrd,
            serde::Deserialize,
            serde::Serialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// A fresh, locally-unique id for an entity that is not persisted yet
            pub fn placeholder() -> $name {
                $name(format!("{}{}", PLACEHOLDER_PREFIX, Uuid::new_v4()))
            }

            pub fn is_placeholder(&self) -> bool {
                self.0.starts_with(PLACEHOLDER_PREFIX)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> $name {
                $name(String::from(s))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(PostId);
string_id!(CommentId);
string_id!(ReplyId);

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub content: String,
    pub created_at: Time,
    pub updated_at: Time,
    pub user_id: UserId,
    pub user_type: UserType,
    pub author: Author,

    /// Must match `replies.len()` once reconciled with the server
    pub reply_count: usize,

    /// Replies in chronological order
    #[serde(default)]
    pub replies: Vec<Reply>,
}

impl Comment {
    pub fn find_reply(&self, id: &ReplyId) -> Option<&Reply> {
        self.replies.iter().find(|r| r.id == *id)
    }

    pub fn find_reply_mut(&mut self, id: &ReplyId) -> Option<&mut Reply> {
        self.replies.iter_mut().find(|r| r.id == *id)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Reply {
    pub id: ReplyId,
    pub comment_id: CommentId,
    pub content: String,
    pub created_at: Time,
    pub updated_at: Time,
    pub user_id: UserId,
    pub user_type: UserType,
    pub author: Author,
}
