use std::collections::HashMap;

use crate::api::{Comment, CommentId, ReplyId};

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
enum Key {
    Comment(CommentId),
    Reply(ReplyId),
}

/// What the last reconciling fetch looked like
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PollSnapshot {
    comments: usize,
    replies: usize,
    contents: HashMap<Key, String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PollVerdict {
    /// Nothing changed since the last fetch
    Quiet,

    /// Something was added or removed
    Structural,

    /// Same entities, but some content was edited
    Edited,
}

impl PollSnapshot {
    pub fn of(comments: &[Comment]) -> PollSnapshot {
        let mut contents = HashMap::new();
        let mut replies = 0;
        for c in comments {
            contents.insert(Key::Comment(c.id.clone()), c.content.clone());
            for r in c.replies.iter() {
                contents.insert(Key::Reply(r.id.clone()), r.content.clone());
            }
            replies += c.replies.len();
        }
        PollSnapshot {
            comments: comments.len(),
            replies,
            contents,
        }
    }

    pub fn comment_count(&self) -> usize {
        self.comments
    }

    pub fn reply_count(&self) -> usize {
        self.replies
    }

    /// Compares a fresh fetch against the last one, remembering it unless nothing changed.
    ///
    /// Entities are matched by id, so a server that returns them in another order does not
    /// hide an edit.
    pub fn reconcile(&mut self, fetched: &[Comment]) -> PollVerdict {
        let next = PollSnapshot::of(fetched);
        let verdict = if next.comments != self.comments || next.replies != self.replies {
            PollVerdict::Structural
        } else if next.contents.keys().any(|k| !self.contents.contains_key(k)) {
            // as many removed as added
            PollVerdict::Structural
        } else if next.contents.iter().any(|(k, v)| self.contents.get(k) != Some(v)) {
            PollVerdict::Edited
        } else {
            PollVerdict::Quiet
        };
        if verdict != PollVerdict::Quiet {
            *self = next;
        }
        verdict
    }
}
