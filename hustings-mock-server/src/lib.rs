use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use hustings_api::{
    Author, Backend, ChangeKind, ChangePayload, Comment, CommentId, CommentRow, DeleteComment,
    DeleteReply, EditComment, EditReply, Error, FeedMessage, KeyRow, NewComment, NewReply, PostId,
    Profile, ProfileSource, Reply, ReplyId, ReplyRow, Time, UserId, UserType,
};
use tokio::sync::mpsc;

/// In-memory stand-in for the hosted backend, change feed included
pub struct MockServer {
    // most recent first, like the real `get-comments`
    comments: Vec<Comment>,
    profiles: HashMap<(ProfileSource, UserId), Profile>,
    next_id: usize,
    fail_next: Option<Error>,
    reply_echo: bool,
    feeds: Vec<(PostId, mpsc::UnboundedSender<FeedMessage>)>,
}

fn now() -> Time {
    chrono::Utc::now()
}

fn comment_row(c: &Comment) -> CommentRow {
    CommentRow {
        id: c.id.clone(),
        post_id: c.post_id.clone(),
        user_id: c.user_id,
        user_type: c.user_type,
        content: c.content.clone(),
        created_at: c.created_at,
        updated_at: c.updated_at,
    }
}

fn reply_row(r: &Reply) -> ReplyRow {
    ReplyRow {
        id: r.id.clone(),
        comment_id: r.comment_id.clone(),
        user_id: r.user_id,
        user_type: r.user_type,
        content: r.content.clone(),
        created_at: r.created_at,
        updated_at: r.updated_at,
    }
}

fn payload<R>(event_type: ChangeKind, new: Option<R>, old: Option<KeyRow>) -> ChangePayload<R> {
    ChangePayload {
        event_type,
        new,
        old,
    }
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer {
            comments: Vec::new(),
            profiles: HashMap::new(),
            next_id: 1,
            fail_next: None,
            reply_echo: true,
            feeds: Vec::new(),
        }
    }

    pub fn add_profile(&mut self, source: ProfileSource, user: UserId, profile: Profile) {
        self.profiles.insert((source, user), profile);
    }

    /// Replaces all comments, without notifying anyone. Most recent first.
    pub fn seed(&mut self, comments: Vec<Comment>) {
        self.comments = comments;
        for c in self.comments.iter_mut() {
            c.reply_count = c.replies.len();
        }
    }

    /// Number the next created entity will carry, as in `c-{n}` or `r-{n}`
    pub fn set_next_id(&mut self, n: usize) {
        self.next_id = n;
    }

    /// Makes the next write fail with `err`
    pub fn fail_next(&mut self, err: Error) {
        self.fail_next = Some(err);
    }

    /// Whether `add-reply` answers with the created reply
    pub fn set_reply_echo(&mut self, echo: bool) {
        self.reply_echo = echo;
    }

    pub fn subscribe(&mut self, post: &PostId) -> mpsc::UnboundedReceiver<FeedMessage> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.feeds.push((post.clone(), sender));
        receiver
    }

    fn relay(&mut self, post: &PostId, msg: FeedMessage) {
        self.feeds
            .retain_mut(|(p, f)| *p != *post || matches!(f.send(msg.clone()), Ok(())));
    }

    fn fresh_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn check_failure(&mut self) -> Result<(), Error> {
        match self.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn fetch_profile(&self, source: ProfileSource, user: UserId) -> Option<Profile> {
        self.profiles.get(&(source, user)).cloned()
    }

    fn author_of(&self, user: UserId) -> Author {
        [ProfileSource::Students, ProfileSource::Admins]
            .iter()
            .filter_map(|s| self.profiles.get(&(*s, user)))
            .find_map(Author::from_profile)
            .unwrap_or_else(Author::unknown)
    }

    fn comment_mut(&mut self, id: &CommentId) -> Result<&mut Comment, Error> {
        self.comments
            .iter_mut()
            .find(|c| c.id == *id)
            .ok_or_else(|| Error::NotFound(format!("comment {id}")))
    }

    fn reply_mut(&mut self, id: &ReplyId) -> Result<(PostId, &mut Reply), Error> {
        self.comments
            .iter_mut()
            .find_map(|c| {
                let post = c.post_id.clone();
                c.find_reply_mut(id).map(|r| (post, r))
            })
            .ok_or_else(|| Error::NotFound(format!("reply {id}")))
    }

    pub fn comments_of(&self, post: &PostId) -> Vec<Comment> {
        self.comments
            .iter()
            .filter(|c| c.post_id == *post)
            .cloned()
            .collect()
    }

    /// Changes a comment's content without notifying subscribers, like a missed notification
    pub fn overwrite_content(&mut self, id: &CommentId, content: &str) {
        if let Ok(c) = self.comment_mut(id) {
            c.content = String::from(content);
            c.updated_at = now();
        }
    }

    /// Another user commenting, bypassing the failure injection
    pub fn add_comment_as(
        &mut self,
        post: &PostId,
        user_id: UserId,
        user_type: UserType,
        content: &str,
    ) -> Comment {
        let id = self.fresh_id();
        let t = now();
        let c = Comment {
            id: CommentId(format!("c-{id}")),
            post_id: post.clone(),
            content: String::from(content),
            created_at: t,
            updated_at: t,
            user_id,
            user_type,
            author: self.author_of(user_id),
            reply_count: 0,
            replies: Vec::new(),
        };
        self.comments.insert(0, c.clone());
        self.relay(
            post,
            FeedMessage::Comments(payload(ChangeKind::Insert, Some(comment_row(&c)), None)),
        );
        c
    }

    /// Another user replying. `None` if the comment does not exist.
    pub fn add_reply_as(
        &mut self,
        comment: &CommentId,
        user_id: UserId,
        user_type: UserType,
        content: &str,
    ) -> Option<Reply> {
        let id = self.fresh_id();
        let t = now();
        let author = self.author_of(user_id);
        let c = self.comment_mut(comment).ok()?;
        let r = Reply {
            id: ReplyId(format!("r-{id}")),
            comment_id: comment.clone(),
            content: String::from(content),
            created_at: t,
            updated_at: t,
            user_id,
            user_type,
            author,
        };
        c.replies.push(r.clone());
        c.reply_count = c.replies.len();
        let post = c.post_id.clone();
        self.relay(
            &post,
            FeedMessage::Replies(payload(ChangeKind::Insert, Some(reply_row(&r)), None)),
        );
        Some(r)
    }

    /// Deletes a comment and its replies. Only the comment deletion is notified.
    pub fn remove_comment(&mut self, id: &CommentId) -> bool {
        let Some(idx) = self.comments.iter().position(|c| c.id == *id) else {
            return false;
        };
        let c = self.comments.remove(idx);
        let old = KeyRow {
            id: c.id.0,
            comment_id: None,
        };
        self.relay(
            &c.post_id,
            FeedMessage::Comments(payload(ChangeKind::Delete, None, Some(old))),
        );
        true
    }

    pub fn add_comment(&mut self, c: &NewComment) -> Result<Comment, Error> {
        self.check_failure()?;
        c.validate()?;
        Ok(self.add_comment_as(&c.post_id, c.user_id, c.user_type, &c.content))
    }

    pub fn add_reply(&mut self, r: &NewReply) -> Result<Option<Reply>, Error> {
        self.check_failure()?;
        r.validate()?;
        let reply = self
            .add_reply_as(&r.comment_id, r.user_id, r.user_type, &r.content)
            .ok_or_else(|| Error::NotFound(format!("comment {}", r.comment_id)))?;
        Ok(Some(reply).filter(|_| self.reply_echo))
    }

    pub fn edit_comment(&mut self, e: &EditComment) -> Result<(), Error> {
        self.check_failure()?;
        e.validate()?;
        let c = self.comment_mut(&e.comment_id)?;
        if c.user_id != e.user_id {
            return Err(Error::PermissionDenied);
        }
        c.content = e.content.clone();
        c.updated_at = now();
        let (post, row) = (c.post_id.clone(), comment_row(c));
        self.relay(
            &post,
            FeedMessage::Comments(payload(ChangeKind::Update, Some(row), None)),
        );
        Ok(())
    }

    pub fn edit_reply(&mut self, e: &EditReply) -> Result<(), Error> {
        self.check_failure()?;
        e.validate()?;
        let (post, r) = self.reply_mut(&e.reply_id)?;
        if r.user_id != e.user_id {
            return Err(Error::PermissionDenied);
        }
        r.content = e.content.clone();
        r.updated_at = now();
        let row = reply_row(r);
        self.relay(
            &post,
            FeedMessage::Replies(payload(ChangeKind::Update, Some(row), None)),
        );
        Ok(())
    }

    pub fn delete_comment(&mut self, d: &DeleteComment) -> Result<(), Error> {
        self.check_failure()?;
        match self.remove_comment(&d.comment_id) {
            true => Ok(()),
            false => Err(Error::NotFound(format!("comment {}", d.comment_id))),
        }
    }

    pub fn delete_reply(&mut self, d: &DeleteReply) -> Result<(), Error> {
        self.check_failure()?;
        let found = self.comments.iter_mut().find_map(|c| {
            let idx = c.replies.iter().position(|r| r.id == d.reply_id)?;
            let r = c.replies.remove(idx);
            c.reply_count = c.replies.len();
            Some((c.post_id.clone(), r))
        });
        let Some((post, r)) = found else {
            return Err(Error::NotFound(format!("reply {}", d.reply_id)));
        };
        let old = KeyRow {
            id: r.id.0,
            comment_id: Some(r.comment_id),
        };
        self.relay(
            &post,
            FeedMessage::Replies(payload(ChangeKind::Delete, None, Some(old))),
        );
        Ok(())
    }
}

impl Default for MockServer {
    fn default() -> MockServer {
        MockServer::new()
    }
}

/// Shareable handle implementing `Backend` over a `MockServer`
#[derive(Clone, Default)]
pub struct MockBackend(Arc<parking_lot::Mutex<MockServer>>);

impl MockBackend {
    pub fn new() -> MockBackend {
        MockBackend::default()
    }

    pub fn lock(&self) -> parking_lot::MutexGuard<'_, MockServer> {
        self.0.lock()
    }
}

#[async_trait(?Send)]
impl Backend for MockBackend {
    async fn fetch_comments(&self, post: &PostId) -> Result<Vec<Comment>, Error> {
        Ok(self.lock().comments_of(post))
    }

    async fn add_comment(&self, c: &NewComment) -> Result<Comment, Error> {
        self.lock().add_comment(c)
    }

    async fn add_reply(&self, r: &NewReply) -> Result<Option<Reply>, Error> {
        self.lock().add_reply(r)
    }

    async fn edit_comment(&self, e: &EditComment) -> Result<(), Error> {
        self.lock().edit_comment(e)
    }

    async fn edit_reply(&self, e: &EditReply) -> Result<(), Error> {
        self.lock().edit_reply(e)
    }

    async fn delete_comment(&self, d: &DeleteComment) -> Result<(), Error> {
        self.lock().delete_comment(d)
    }

    async fn delete_reply(&self, d: &DeleteReply) -> Result<(), Error> {
        self.lock().delete_reply(d)
    }

    async fn fetch_profile(
        &self,
        source: ProfileSource,
        user: UserId,
    ) -> Result<Option<Profile>, Error> {
        let res = self.lock().fetch_profile(source, user);
        tracing::trace!(?source, ?user, found = res.is_some(), "mock profile lookup");
        Ok(res)
    }
}
