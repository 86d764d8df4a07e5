use async_trait::async_trait;

use crate::{
    Comment, DeleteComment, DeleteReply, EditComment, EditReply, Error, NewComment, NewReply,
    PostId, Profile, ProfileSource, Reply, UserId,
};

/// The authoritative side of the comment feed.
///
/// Futures are not `Send`: in the browser they are driven by the single UI thread.
#[async_trait(?Send)]
pub trait Backend {
    async fn fetch_comments(&self, post: &PostId) -> Result<Vec<Comment>, Error>;

    async fn add_comment(&self, c: &NewComment) -> Result<Comment, Error>;

    /// `Ok(None)` when the server accepted the reply without echoing it back
    async fn add_reply(&self, r: &NewReply) -> Result<Option<Reply>, Error>;

    async fn edit_comment(&self, e: &EditComment) -> Result<(), Error>;
    async fn edit_reply(&self, e: &EditReply) -> Result<(), Error>;
    async fn delete_comment(&self, d: &DeleteComment) -> Result<(), Error>;
    async fn delete_reply(&self, d: &DeleteReply) -> Result<(), Error>;

    async fn fetch_profile(
        &self,
        source: ProfileSource,
        user: UserId,
    ) -> Result<Option<Profile>, Error>;
}
