pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<chrono::Utc>;

mod backend;
pub use backend::Backend;

mod comment;
pub use comment::{Comment, CommentId, PostId, Reply, ReplyId};

mod error;
pub use error::Error;

mod feed;
pub use feed::{
    ChangeKind, ChangePayload, CommentRow, FeedMessage, FeedRequest, KeyRow, ReplyRow,
    Subscription, Table,
};

mod request;
pub use request::{
    CommentList, CreatedComment, CreatedReply, DeleteComment, DeleteReply, EditComment,
    EditReply, NewComment, NewReply, ProfileAnswer, ProfileQuery,
};

mod user;
pub use user::{Author, Profile, ProfileSource, UserId, UserType};

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

/// Prefix of the ids the client makes up for entities the server did not confirm yet
pub const PLACEHOLDER_PREFIX: &str = "temp-";

// Postgres does not accept null bytes in text columns
pub fn validate_string(s: &str) -> Result<(), Error> {
    if s.contains('\0') {
        return Err(Error::NullByteInString(String::from(s)));
    }
    Ok(())
}

pub fn validate_content(s: &str) -> Result<(), Error> {
    validate_string(s)?;
    if s.trim().is_empty() {
        return Err(Error::EmptyContent);
    }
    Ok(())
}
