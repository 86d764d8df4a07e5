use crate::{
    api::{Comment, CommentId, Reply, ReplyId, Time},
    SortOrder,
};

/// Fields an edit can change in place
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Patch {
    pub content: Option<String>,
    pub updated_at: Option<Time>,
}

impl Patch {
    pub fn edit(content: String, updated_at: Time) -> Patch {
        Patch {
            content: Some(content),
            updated_at: Some(updated_at),
        }
    }

    fn apply(self, content: &mut String, updated_at: &mut Time) {
        if let Some(c) = self.content {
            *content = c;
        }
        if let Some(t) = self.updated_at {
            *updated_at = t;
        }
    }
}

/// Best-known view of the comments of one post
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommentStore {
    // head is the most recently inserted comment
    comments: Vec<Comment>,
}

impl CommentStore {
    pub fn new() -> CommentStore {
        CommentStore::default()
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// Comments in store order, head first
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn sorted(&self, order: SortOrder) -> Vec<&Comment> {
        let mut res = self.comments.iter().collect::<Vec<_>>();
        order.sort(&mut res);
        res
    }

    pub fn reply_total(&self) -> usize {
        self.comments.iter().map(|c| c.replies.len()).sum()
    }

    pub fn get(&self, id: &CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == *id)
    }

    fn get_mut(&mut self, id: &CommentId) -> Option<&mut Comment> {
        self.comments.iter_mut().find(|c| c.id == *id)
    }

    pub fn find_reply(&self, id: &ReplyId) -> Option<(&Comment, &Reply)> {
        self.comments
            .iter()
            .find_map(|c| c.find_reply(id).map(|r| (c, r)))
    }

    fn find_reply_mut(&mut self, id: &ReplyId) -> Option<&mut Reply> {
        self.comments
            .iter_mut()
            .find_map(|c| c.find_reply_mut(id))
    }

    /// Full replace after a reconciling fetch. Optimistic entries that the fetch did not
    /// catch up with yet are lost; the next fetch brings them back once persisted.
    pub fn replace_all(&mut self, mut comments: Vec<Comment>) {
        for c in comments.iter_mut() {
            c.reply_count = c.replies.len();
        }
        self.comments = comments;
    }

    /// Returns `false` if a comment with the same id is already there
    pub fn insert_at_head(&mut self, comment: Comment) -> bool {
        if self.get(&comment.id).is_some() {
            return false;
        }
        self.comments.insert(0, comment);
        true
    }

    pub fn update_fields(&mut self, id: &CommentId, patch: Patch) -> bool {
        match self.get_mut(id) {
            None => false,
            Some(c) => {
                patch.apply(&mut c.content, &mut c.updated_at);
                true
            }
        }
    }

    pub fn remove(&mut self, id: &CommentId) -> Option<Comment> {
        let idx = self.comments.iter().position(|c| c.id == *id)?;
        Some(self.comments.remove(idx))
    }

    /// Gives its server-issued id to an optimistic comment, in place.
    ///
    /// If a comment with `real` is already in the store (a realtime insert won the race
    /// against the create response), the optimistic copy is dropped instead.
    pub fn confirm_id(&mut self, temp: &CommentId, real: CommentId) -> bool {
        if self.get(&real).is_some() {
            tracing::debug!(?temp, ?real, "comment already confirmed by the change feed");
            return self.remove(temp).is_some();
        }
        match self.get_mut(temp) {
            None => false,
            Some(c) => {
                for r in c.replies.iter_mut() {
                    r.comment_id = real.clone();
                }
                c.id = real;
                true
            }
        }
    }

    /// Appends a reply to its parent, keeping `reply_count` in lockstep.
    ///
    /// Returns `false` if the parent is unknown or the reply is already there.
    pub fn insert_reply(&mut self, reply: Reply) -> bool {
        if self.find_reply(&reply.id).is_some() {
            return false;
        }
        match self.get_mut(&reply.comment_id) {
            None => false,
            Some(c) => {
                c.replies.push(reply);
                c.reply_count += 1;
                true
            }
        }
    }

    pub fn update_reply_fields(&mut self, id: &ReplyId, patch: Patch) -> bool {
        match self.find_reply_mut(id) {
            None => false,
            Some(r) => {
                patch.apply(&mut r.content, &mut r.updated_at);
                true
            }
        }
    }

    pub fn remove_reply(&mut self, id: &ReplyId) -> Option<Reply> {
        for c in self.comments.iter_mut() {
            if let Some(idx) = c.replies.iter().position(|r| r.id == *id) {
                c.reply_count = c.reply_count.saturating_sub(1);
                return Some(c.replies.remove(idx));
            }
        }
        None
    }

    /// Same as `confirm_id`, for replies
    pub fn confirm_reply_id(&mut self, temp: &ReplyId, real: ReplyId) -> bool {
        if self.find_reply(&real).is_some() {
            tracing::debug!(?temp, ?real, "reply already confirmed by the change feed");
            return self.remove_reply(temp).is_some();
        }
        match self.find_reply_mut(temp) {
            None => false,
            Some(r) => {
                r.id = real;
                true
            }
        }
    }
}
