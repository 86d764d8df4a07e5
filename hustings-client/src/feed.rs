use std::collections::HashMap;

use chrono::Duration;

use crate::{
    api::{Comment, CommentId, Error, PostId, ReplyId, Time},
    mutation::{self, Input, PendingMutation, Settled, WriteOutcome},
    Change, CommentStore, Coordinator, Identity, PollSnapshot, PollVerdict, SortOrder,
    UpdateSource,
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeedConfig {
    pub poll_interval: Duration,
    pub refresh_indicator: Duration,
    pub error_display: Duration,
    pub order: SortOrder,
}

impl Default for FeedConfig {
    fn default() -> FeedConfig {
        FeedConfig {
            poll_interval: Duration::seconds(5),
            refresh_indicator: Duration::seconds(1),
            error_display: Duration::seconds(3),
            order: SortOrder::default(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FeedState {
    Idle,
    Active(PostId),
}

/// The comments panel of one post: its store, the reconciliation bookkeeping, and the
/// user's half-typed inputs.
///
/// `CommentFeed` never does I/O itself. Drivers fetch, poll, listen and send, then hand
/// the results back tagged with the post they were started for, so that completions for a
/// post that is no longer active are dropped.
#[derive(Clone, Debug)]
pub struct CommentFeed {
    config: FeedConfig,
    state: FeedState,
    identity: Option<Identity>,
    store: CommentStore,
    snapshot: PollSnapshot,
    coordinator: Coordinator,
    comment_input: String,
    reply_inputs: HashMap<CommentId, String>,
    refreshing_until: Option<Time>,
    error: Option<(String, Time)>,
}

impl CommentFeed {
    pub fn new(config: FeedConfig, identity: Option<Identity>) -> CommentFeed {
        CommentFeed {
            config,
            state: FeedState::Idle,
            identity,
            store: CommentStore::new(),
            snapshot: PollSnapshot::default(),
            coordinator: Coordinator::new(),
            comment_input: String::new(),
            reply_inputs: HashMap::new(),
            refreshing_until: None,
            error: None,
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn post(&self) -> Option<&PostId> {
        match &self.state {
            FeedState::Idle => None,
            FeedState::Active(p) => Some(p),
        }
    }

    pub fn is_active_for(&self, post: &PostId) -> bool {
        self.post() == Some(post)
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn set_identity(&mut self, identity: Option<Identity>) {
        self.identity = identity;
    }

    /// Returns `true` if the drivers must (re)subscribe, restart the poll timer and fetch
    pub fn open(&mut self, post: PostId) -> bool {
        if self.is_active_for(&post) {
            return false;
        }
        tracing::debug!(?post, "opening comments panel");
        self.reset();
        self.state = FeedState::Active(post);
        true
    }

    pub fn close(&mut self) {
        if let FeedState::Active(post) = &self.state {
            tracing::debug!(?post, "closing comments panel");
        }
        self.reset();
        self.state = FeedState::Idle;
    }

    fn reset(&mut self) {
        self.store = CommentStore::new();
        self.snapshot = PollSnapshot::default();
        self.coordinator.reset();
        self.comment_input.clear();
        self.reply_inputs.clear();
        self.refreshing_until = None;
        self.error = None;
    }

    pub fn store(&self) -> &CommentStore {
        &self.store
    }

    pub fn last_source(&self) -> UpdateSource {
        self.coordinator.last_source()
    }

    /// Comments in display order
    pub fn comments(&self) -> Vec<&Comment> {
        self.store.sorted(self.config.order)
    }

    pub fn set_order(&mut self, order: SortOrder) {
        self.config.order = order;
    }

    pub fn comment_input(&self) -> &str {
        &self.comment_input
    }

    pub fn set_comment_input(&mut self, s: String) {
        self.comment_input = s;
    }

    pub fn reply_input(&self, comment: &CommentId) -> &str {
        self.reply_inputs.get(comment).map(|s| s as &str).unwrap_or("")
    }

    pub fn set_reply_input(&mut self, comment: CommentId, s: String) {
        self.reply_inputs.insert(comment, s);
    }

    fn stale(&self, post: &PostId, what: &str) -> bool {
        if self.is_active_for(post) {
            return false;
        }
        tracing::debug!(?post, active = ?self.post(), "dropping stale {what}");
        true
    }

    /// Takes the result of the initial fetch, or of any full refresh
    pub fn on_loaded(&mut self, post: &PostId, res: Result<Vec<Comment>, Error>) -> bool {
        if self.stale(post, "fetch") {
            return false;
        }
        match res {
            Ok(comments) => {
                self.snapshot = PollSnapshot::of(&comments);
                self.store.replace_all(comments);
                true
            }
            Err(err) => {
                tracing::warn!(?post, ?err, "failed fetching comments");
                false
            }
        }
    }

    /// Whether a poll tick should actually fetch. A tick right after a realtime update is
    /// skipped, once.
    pub fn should_poll(&mut self, post: &PostId) -> bool {
        if !self.is_active_for(post) {
            return false;
        }
        if self.coordinator.consume_realtime_flag() {
            tracing::trace!(?post, "skipping poll, change feed is ahead");
            return false;
        }
        true
    }

    pub fn on_polled(
        &mut self,
        post: &PostId,
        res: Result<Vec<Comment>, Error>,
        now: Time,
    ) -> Option<PollVerdict> {
        if self.stale(post, "poll") {
            return None;
        }
        let fetched = match res {
            Ok(f) => f,
            Err(err) => {
                tracing::warn!(?post, ?err, "poll failed");
                return None;
            }
        };
        let verdict = self.snapshot.reconcile(&fetched);
        if verdict != PollVerdict::Quiet {
            tracing::debug!(?post, ?verdict, "poll found changes");
            self.store.replace_all(fetched);
            self.coordinator.record(UpdateSource::Polling);
            self.refreshing_until = Some(now + self.config.refresh_indicator);
        }
        Some(verdict)
    }

    /// Returns `true` if the change did modify the store
    pub fn on_change(&mut self, post: &PostId, change: Change, now: Time) -> bool {
        if self.stale(post, "change") {
            return false;
        }
        if !change.apply(&mut self.store) {
            return false;
        }
        self.coordinator.record(UpdateSource::Realtime);
        self.refreshing_until = Some(now + self.config.refresh_indicator);
        true
    }

    fn context(&self) -> Result<(Identity, PostId), Error> {
        let who = self.identity.clone().ok_or(Error::PermissionDenied)?;
        let post = self
            .post()
            .cloned()
            .ok_or_else(|| Error::NotFound(String::from("no post is open")))?;
        Ok((who, post))
    }

    fn failed<T>(&mut self, res: Result<T, Error>, now: Time) -> Result<T, Error> {
        if let Err(err) = &res {
            self.show_error(err.to_string(), now);
        }
        res
    }

    fn show_error(&mut self, message: String, now: Time) {
        self.error = Some((message, now + self.config.error_display));
    }

    /// Posts the comment input. On success the input is cleared and the comment shows up
    /// at once; the caller must `send` the mutation and `settle` it.
    pub fn submit_comment(&mut self, now: Time) -> Result<PendingMutation, Error> {
        let content = self.comment_input.clone();
        let res = self.context().and_then(|(who, post)| {
            mutation::begin_add_comment(&mut self.store, &who, &post, content, now)
        });
        let p = self.failed(res, now)?;
        self.comment_input.clear();
        Ok(p)
    }

    pub fn submit_reply(
        &mut self,
        comment: &CommentId,
        now: Time,
    ) -> Result<PendingMutation, Error> {
        let content = self.reply_input(comment).to_string();
        let res = self.context().and_then(|(who, post)| {
            mutation::begin_add_reply(&mut self.store, &who, &post, comment, content, now)
        });
        let p = self.failed(res, now)?;
        self.reply_inputs.remove(comment);
        Ok(p)
    }

    pub fn edit_comment(
        &mut self,
        id: &CommentId,
        content: String,
        now: Time,
    ) -> Result<PendingMutation, Error> {
        let res = self.context().and_then(|(who, post)| {
            mutation::begin_edit_comment(&mut self.store, &who, &post, id, content, now)
        });
        self.failed(res, now)
    }

    pub fn edit_reply(
        &mut self,
        id: &ReplyId,
        content: String,
        now: Time,
    ) -> Result<PendingMutation, Error> {
        let res = self.context().and_then(|(who, post)| {
            mutation::begin_edit_reply(&mut self.store, &who, &post, id, content, now)
        });
        self.failed(res, now)
    }

    pub fn delete_comment(&mut self, id: &CommentId, now: Time) -> Result<PendingMutation, Error> {
        let res = self.context().and_then(|(who, post)| {
            mutation::begin_delete_comment(&mut self.store, &who, &post, id)
        });
        self.failed(res, now)
    }

    pub fn delete_reply(&mut self, id: &ReplyId, now: Time) -> Result<PendingMutation, Error> {
        let res = self.context().and_then(|(who, post)| {
            mutation::begin_delete_reply(&mut self.store, &who, &post, id)
        });
        self.failed(res, now)
    }

    /// Hands back the server's answer to a mutation started on this feed.
    ///
    /// Returns `None` if the mutation belongs to a post that is no longer open. When the
    /// settlement `needs_refetch`, the caller should fetch and pass the result to
    /// `on_loaded`.
    pub fn settle(
        &mut self,
        pending: PendingMutation,
        res: Result<WriteOutcome, Error>,
        now: Time,
    ) -> Option<Settled> {
        if self.stale(&pending.post_id, "write result") {
            return None;
        }
        let settled = mutation::settle(&mut self.store, pending, res);
        if let Settled::RolledBack {
            message,
            restore_input,
            ..
        } = &settled
        {
            match restore_input.clone() {
                Some((Input::Comment, s)) => self.comment_input = s,
                Some((Input::Reply(c), s)) => {
                    self.reply_inputs.insert(c, s);
                }
                None => (),
            }
            self.show_error(message.clone(), now);
        }
        Some(settled)
    }

    pub fn is_refreshing(&self, now: Time) -> bool {
        self.refreshing_until.map(|t| now < t).unwrap_or(false)
    }

    pub fn error_message(&self, now: Time) -> Option<&str> {
        match &self.error {
            Some((msg, until)) if now < *until => Some(msg),
            _ => None,
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}
