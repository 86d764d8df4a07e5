use crate::{
    validate_content, Comment, CommentId, Error, PostId, Profile, ProfileSource, Reply, ReplyId,
    UserId, UserType,
};

// Each `validate` checks only what the client can know without asking the server:
// no null byte anywhere, and no blank content.

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewComment {
    pub post_id: PostId,
    pub user_id: UserId,
    pub user_type: UserType,
    pub content: String,
}

impl NewComment {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.post_id.0)?;
        validate_content(&self.content)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewReply {
    pub comment_id: CommentId,
    pub user_id: UserId,
    pub user_type: UserType,
    pub content: String,
}

impl NewReply {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.comment_id.0)?;
        validate_content(&self.content)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct EditComment {
    pub comment_id: CommentId,
    pub user_id: UserId,
    pub user_type: UserType,
    pub content: String,
}

impl EditComment {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.comment_id.0)?;
        validate_content(&self.content)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct EditReply {
    pub reply_id: ReplyId,
    pub user_id: UserId,
    pub user_type: UserType,
    pub content: String,
}

impl EditReply {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.reply_id.0)?;
        validate_content(&self.content)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct DeleteComment {
    pub comment_id: CommentId,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct DeleteReply {
    pub reply_id: ReplyId,
}

/// Answer of `GET /api/get-comments?post_id=...`
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentList {
    pub comments: Vec<Comment>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CreatedComment {
    pub comment: Comment,
}

/// `add-reply` only guarantees its status code, the body may be empty
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CreatedReply {
    #[serde(default)]
    pub reply: Option<Reply>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ProfileQuery {
    pub source: ProfileSource,
    pub user_id: UserId,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ProfileAnswer {
    #[serde(default)]
    pub profile: Option<Profile>,
}
