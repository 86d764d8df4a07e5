use chrono::TimeZone;

use crate::{
    api::{Author, Comment, PostId, Reply, Time, UserId, UserType},
    CommentStore, Identity,
};

pub fn at(minutes: i64) -> Time {
    let start = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
    start + chrono::Duration::minutes(minutes)
}

pub fn post() -> PostId {
    PostId::from("p-1")
}

pub fn ada() -> Author {
    Author {
        display_name: String::from("Ada Lovelace"),
        email: String::from("ada@uni.edu"),
        avatar_initial: 'A',
    }
}

pub fn identity() -> Identity {
    Identity {
        user_id: UserId::stub(),
        user_type: UserType::Student,
        author: ada(),
    }
}

pub fn comment(id: &str, content: &str, minutes: i64) -> Comment {
    Comment {
        id: id.into(),
        post_id: post(),
        content: String::from(content),
        created_at: at(minutes),
        updated_at: at(minutes),
        user_id: UserId::stub(),
        user_type: UserType::Student,
        author: ada(),
        reply_count: 0,
        replies: Vec::new(),
    }
}

pub fn reply(id: &str, comment_id: &str, content: &str, minutes: i64) -> Reply {
    Reply {
        id: id.into(),
        comment_id: comment_id.into(),
        content: String::from(content),
        created_at: at(minutes),
        updated_at: at(minutes),
        user_id: UserId::stub(),
        user_type: UserType::Student,
        author: ada(),
    }
}

pub fn with_replies(mut c: Comment, replies: Vec<Reply>) -> Comment {
    c.reply_count = replies.len();
    c.replies = replies;
    c
}

pub fn ids(s: &CommentStore) -> Vec<&str> {
    s.comments().iter().map(|c| &c.id.0 as &str).collect()
}
