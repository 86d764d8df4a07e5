use crate::{
    api::{
        Backend, Comment, CommentId, DeleteComment, DeleteReply, EditComment, EditReply, Error,
        NewComment, NewReply, PostId, Reply, ReplyId, Time, UserId, UserType,
    },
    CommentStore, Identity, Patch,
};

/// The authoritative write a user action boils down to
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Write {
    AddComment(NewComment),
    AddReply(NewReply),
    EditComment(EditComment),
    EditReply(EditReply),
    DeleteComment(DeleteComment),
    DeleteReply(DeleteReply),
}

/// The input field a create was typed in
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Input {
    Comment,
    Reply(CommentId),
}

// How to undo the optimistic half of a write
#[derive(Clone, Debug, Eq, PartialEq)]
enum Rollback {
    RemoveComment(CommentId),
    RemoveReply(ReplyId),
    RestoreComment(CommentId, Patch),
    RestoreReply(ReplyId, Patch),
    // deletes cannot be re-inserted faithfully, the local copy may be stale
    Refetch,
}

/// A write that was already applied locally and awaits the server's verdict
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PendingMutation {
    pub post_id: PostId,
    pub write: Write,
    rollback: Rollback,
    restore_input: Option<(Input, String)>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WriteOutcome {
    Comment(Comment),
    Reply(Option<Reply>),
    Done,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Settled {
    Confirmed,

    /// The write went through but the local copy cannot be confirmed in place
    Refetch,

    RolledBack {
        message: String,
        restore_input: Option<(Input, String)>,
        refetch: bool,
    },
}

impl Settled {
    pub fn needs_refetch(&self) -> bool {
        match self {
            Settled::Confirmed => false,
            Settled::Refetch => true,
            Settled::RolledBack { refetch, .. } => *refetch,
        }
    }
}

impl PendingMutation {
    /// Temporary id of the entity this mutation created, if any
    pub fn placeholder(&self) -> Option<&str> {
        match &self.rollback {
            Rollback::RemoveComment(id) => Some(&id.0),
            Rollback::RemoveReply(id) => Some(&id.0),
            _ => None,
        }
    }

    pub async fn send<B: ?Sized + Backend>(&self, backend: &B) -> Result<WriteOutcome, Error> {
        match &self.write {
            Write::AddComment(c) => backend.add_comment(c).await.map(WriteOutcome::Comment),
            Write::AddReply(r) => backend.add_reply(r).await.map(WriteOutcome::Reply),
            Write::EditComment(e) => backend.edit_comment(e).await.map(|()| WriteOutcome::Done),
            Write::EditReply(e) => backend.edit_reply(e).await.map(|()| WriteOutcome::Done),
            Write::DeleteComment(d) => backend
                .delete_comment(d)
                .await
                .map(|()| WriteOutcome::Done),
            Write::DeleteReply(d) => backend.delete_reply(d).await.map(|()| WriteOutcome::Done),
        }
    }
}

pub fn begin_add_comment(
    store: &mut CommentStore,
    who: &Identity,
    post_id: &PostId,
    content: String,
    now: Time,
) -> Result<PendingMutation, Error> {
    let req = NewComment {
        post_id: post_id.clone(),
        user_id: who.user_id,
        user_type: who.user_type,
        content: content.clone(),
    };
    req.validate()?;
    let temp = CommentId::placeholder();
    store.insert_at_head(Comment {
        id: temp.clone(),
        post_id: post_id.clone(),
        content: content.clone(),
        created_at: now,
        updated_at: now,
        user_id: who.user_id,
        user_type: who.user_type,
        author: who.author.clone(),
        reply_count: 0,
        replies: Vec::new(),
    });
    Ok(PendingMutation {
        post_id: post_id.clone(),
        write: Write::AddComment(req),
        rollback: Rollback::RemoveComment(temp),
        restore_input: Some((Input::Comment, content)),
    })
}

fn persisted_comment<'a>(store: &'a CommentStore, id: &CommentId) -> Result<&'a Comment, Error> {
    match store.get(id) {
        Some(c) if !c.id.is_placeholder() => Ok(c),
        _ => Err(Error::NotFound(format!("comment {id}"))),
    }
}

fn persisted_reply<'a>(store: &'a CommentStore, id: &ReplyId) -> Result<&'a Reply, Error> {
    match store.find_reply(id) {
        Some((_, r)) if !r.id.is_placeholder() => Ok(r),
        _ => Err(Error::NotFound(format!("reply {id}"))),
    }
}

pub fn begin_add_reply(
    store: &mut CommentStore,
    who: &Identity,
    post_id: &PostId,
    comment_id: &CommentId,
    content: String,
    now: Time,
) -> Result<PendingMutation, Error> {
    persisted_comment(store, comment_id)?;
    let req = NewReply {
        comment_id: comment_id.clone(),
        user_id: who.user_id,
        user_type: who.user_type,
        content: content.clone(),
    };
    req.validate()?;
    let temp = ReplyId::placeholder();
    store.insert_reply(Reply {
        id: temp.clone(),
        comment_id: comment_id.clone(),
        content: content.clone(),
        created_at: now,
        updated_at: now,
        user_id: who.user_id,
        user_type: who.user_type,
        author: who.author.clone(),
    });
    Ok(PendingMutation {
        post_id: post_id.clone(),
        write: Write::AddReply(req),
        rollback: Rollback::RemoveReply(temp),
        restore_input: Some((Input::Reply(comment_id.clone()), content)),
    })
}

pub fn begin_edit_comment(
    store: &mut CommentStore,
    who: &Identity,
    post_id: &PostId,
    id: &CommentId,
    content: String,
    now: Time,
) -> Result<PendingMutation, Error> {
    let c = persisted_comment(store, id)?;
    if c.user_id != who.user_id {
        return Err(Error::PermissionDenied);
    }
    let req = EditComment {
        comment_id: id.clone(),
        user_id: who.user_id,
        user_type: who.user_type,
        content: content.clone(),
    };
    req.validate()?;
    let snapshot = Patch::edit(c.content.clone(), c.updated_at);
    store.update_fields(id, Patch::edit(content, now));
    Ok(PendingMutation {
        post_id: post_id.clone(),
        write: Write::EditComment(req),
        rollback: Rollback::RestoreComment(id.clone(), snapshot),
        restore_input: None,
    })
}

pub fn begin_edit_reply(
    store: &mut CommentStore,
    who: &Identity,
    post_id: &PostId,
    id: &ReplyId,
    content: String,
    now: Time,
) -> Result<PendingMutation, Error> {
    let r = persisted_reply(store, id)?;
    if r.user_id != who.user_id {
        return Err(Error::PermissionDenied);
    }
    let req = EditReply {
        reply_id: id.clone(),
        user_id: who.user_id,
        user_type: who.user_type,
        content: content.clone(),
    };
    req.validate()?;
    let snapshot = Patch::edit(r.content.clone(), r.updated_at);
    store.update_reply_fields(id, Patch::edit(content, now));
    Ok(PendingMutation {
        post_id: post_id.clone(),
        write: Write::EditReply(req),
        rollback: Rollback::RestoreReply(id.clone(), snapshot),
        restore_input: None,
    })
}

// Authors may delete their own entries, admins anyone's
fn may_delete(who: &Identity, author: &UserId) -> bool {
    who.user_id == *author || who.user_type == UserType::Admin
}

pub fn begin_delete_comment(
    store: &mut CommentStore,
    who: &Identity,
    post_id: &PostId,
    id: &CommentId,
) -> Result<PendingMutation, Error> {
    let c = persisted_comment(store, id)?;
    if !may_delete(who, &c.user_id) {
        return Err(Error::PermissionDenied);
    }
    store.remove(id);
    Ok(PendingMutation {
        post_id: post_id.clone(),
        write: Write::DeleteComment(DeleteComment {
            comment_id: id.clone(),
        }),
        rollback: Rollback::Refetch,
        restore_input: None,
    })
}

pub fn begin_delete_reply(
    store: &mut CommentStore,
    who: &Identity,
    post_id: &PostId,
    id: &ReplyId,
) -> Result<PendingMutation, Error> {
    let r = persisted_reply(store, id)?;
    if !may_delete(who, &r.user_id) {
        return Err(Error::PermissionDenied);
    }
    store.remove_reply(id);
    Ok(PendingMutation {
        post_id: post_id.clone(),
        write: Write::DeleteReply(DeleteReply {
            reply_id: id.clone(),
        }),
        rollback: Rollback::Refetch,
        restore_input: None,
    })
}

/// Confirms or undoes the optimistic half of `pending`, given the server's answer
pub fn settle(
    store: &mut CommentStore,
    pending: PendingMutation,
    result: Result<WriteOutcome, Error>,
) -> Settled {
    let PendingMutation {
        write,
        rollback,
        restore_input,
        ..
    } = pending;
    match (rollback, result) {
        (Rollback::RemoveComment(temp), Ok(WriteOutcome::Comment(c))) => {
            match store.confirm_id(&temp, c.id) {
                true => Settled::Confirmed,
                // a reconciling fetch replaced the store in the meantime
                false => Settled::Refetch,
            }
        }
        (Rollback::RemoveReply(temp), Ok(WriteOutcome::Reply(Some(r)))) => {
            match store.confirm_reply_id(&temp, r.id) {
                true => Settled::Confirmed,
                false => Settled::Refetch,
            }
        }
        (Rollback::RemoveReply(_), Ok(WriteOutcome::Reply(None))) => Settled::Refetch,
        (
            Rollback::RestoreComment(..) | Rollback::RestoreReply(..) | Rollback::Refetch,
            Ok(WriteOutcome::Done),
        ) => Settled::Confirmed,
        (rollback, Ok(outcome)) => {
            tracing::warn!(?rollback, ?outcome, ?write, "answer does not match the write");
            Settled::Refetch
        }
        (rollback, Err(err)) => {
            tracing::warn!(?err, ?write, "write rejected, rolling back");
            let refetch = match rollback {
                Rollback::RemoveComment(temp) => {
                    store.remove(&temp);
                    false
                }
                Rollback::RemoveReply(temp) => {
                    store.remove_reply(&temp);
                    false
                }
                Rollback::RestoreComment(id, snapshot) => {
                    store.update_fields(&id, snapshot);
                    false
                }
                Rollback::RestoreReply(id, snapshot) => {
                    store.update_reply_fields(&id, snapshot);
                    false
                }
                Rollback::Refetch => true,
            };
            Settled::RolledBack {
                message: err.to_string(),
                restore_input,
                refetch,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use hustings_api::Uuid;
    use hustings_mock_server::MockBackend;

    use super::*;
    use crate::test_util::*;

    #[test]
    fn create_then_confirm() {
        let mut store = CommentStore::new();
        let p = begin_add_comment(
            &mut store,
            &identity(),
            &post(),
            "Great initiative!".into(),
            at(0),
        )
        .unwrap();
        assert_eq!(store.len(), 1);
        let c = &store.comments()[0];
        assert!(c.id.is_placeholder());
        assert_eq!(c.content, "Great initiative!");
        assert_eq!(Some(&c.id.0 as &str), p.placeholder());

        let mut confirmed = comment("c-101", "Great initiative!", 0);
        confirmed.reply_count = 0;
        let s = settle(&mut store, p, Ok(WriteOutcome::Comment(confirmed)));
        assert_eq!(s, Settled::Confirmed);
        assert_eq!(ids(&store), vec!["c-101"]);
        assert_eq!(store.comments()[0].content, "Great initiative!");
        assert_eq!(store.comments()[0].reply_count, 0);
    }

    #[test]
    fn rejected_create_restores_everything() {
        let mut store = CommentStore::new();
        store.insert_at_head(comment("c-1", "hello", 0));
        let before = store.clone();
        let p = begin_add_comment(&mut store, &identity(), &post(), "spam".into(), at(1)).unwrap();
        let s = settle(&mut store, p, Err(Error::Unknown("rate limited".into())));
        assert_eq!(store, before);
        assert_eq!(
            s,
            Settled::RolledBack {
                message: String::from("rate limited"),
                restore_input: Some((Input::Comment, String::from("spam"))),
                refetch: false,
            }
        );
    }

    #[test]
    fn blank_content_changes_nothing() {
        let mut store = CommentStore::new();
        let err = begin_add_comment(&mut store, &identity(), &post(), "  ".into(), at(0));
        assert_eq!(err, Err(Error::EmptyContent));
        assert!(store.is_empty());
    }

    #[test]
    fn rejected_reply_restores_count_and_input() {
        let mut store = CommentStore::new();
        store.insert_at_head(comment("c-101", "Great initiative!", 0));
        let p = begin_add_reply(
            &mut store,
            &identity(),
            &post(),
            &"c-101".into(),
            "Agreed".into(),
            at(1),
        )
        .unwrap();
        let c = store.get(&"c-101".into()).unwrap();
        assert_eq!(c.reply_count, 1);
        assert_eq!(c.replies[0].content, "Agreed");

        let s = settle(&mut store, p, Err(Error::PermissionDenied));
        let c = store.get(&"c-101".into()).unwrap();
        assert_eq!(c.reply_count, 0);
        assert!(c.replies.is_empty());
        match s {
            Settled::RolledBack { restore_input, .. } => assert_eq!(
                restore_input,
                Some((Input::Reply("c-101".into()), String::from("Agreed")))
            ),
            s => panic!("unexpected settlement {s:?}"),
        }
    }

    #[test]
    fn reply_without_echo_asks_for_refetch() {
        let mut store = CommentStore::new();
        store.insert_at_head(comment("c-1", "x", 0));
        let who = identity();
        let p =
            begin_add_reply(&mut store, &who, &post(), &"c-1".into(), "y".into(), at(1)).unwrap();
        let s = settle(&mut store, p, Ok(WriteOutcome::Reply(None)));
        assert_eq!(s, Settled::Refetch);
        assert!(s.needs_refetch());
    }

    #[test]
    fn mismatched_answer_asks_for_refetch() {
        let mut store = CommentStore::new();
        let p = begin_add_comment(&mut store, &identity(), &post(), "x".into(), at(0)).unwrap();
        let s = settle(&mut store, p, Ok(WriteOutcome::Done));
        assert_eq!(s, Settled::Refetch);
        assert!(store.comments()[0].id.is_placeholder());
    }

    #[test]
    fn cannot_reply_to_unconfirmed_comment() {
        let mut store = CommentStore::new();
        let p = begin_add_comment(&mut store, &identity(), &post(), "x".into(), at(0)).unwrap();
        let temp = CommentId(String::from(p.placeholder().unwrap()));
        let err = begin_add_reply(&mut store, &identity(), &post(), &temp, "y".into(), at(1));
        assert!(matches!(err, Err(Error::NotFound(_))));
    }

    #[test]
    fn rejected_edit_restores_snapshot() {
        let mut store = CommentStore::new();
        store.insert_at_head(comment("c-1", "original", 0));
        let p = begin_edit_comment(
            &mut store,
            &identity(),
            &post(),
            &"c-1".into(),
            "edited".into(),
            at(5),
        )
        .unwrap();
        assert_eq!(store.get(&"c-1".into()).unwrap().content, "edited");
        settle(&mut store, p, Err(Error::Network("offline".into())));
        let c = store.get(&"c-1".into()).unwrap();
        assert_eq!(c.content, "original");
        assert_eq!(c.updated_at, at(0));
    }

    #[test]
    fn editing_someone_else_is_refused() {
        let mut store = CommentStore::new();
        let mut c = comment("c-1", "theirs", 0);
        c.user_id = UserId(Uuid::new_v4());
        store.insert_at_head(c);
        let err = begin_edit_comment(
            &mut store,
            &identity(),
            &post(),
            &"c-1".into(),
            "mine now".into(),
            at(1),
        );
        assert_eq!(err, Err(Error::PermissionDenied));
        assert_eq!(store.get(&"c-1".into()).unwrap().content, "theirs");
    }

    #[test]
    fn admins_may_delete_anything() {
        let mut store = CommentStore::new();
        let mut c = comment("c-1", "theirs", 0);
        c.user_id = UserId(Uuid::new_v4());
        store.insert_at_head(c);
        let mut admin = identity();
        admin.user_type = UserType::Admin;
        begin_delete_comment(&mut store, &admin, &post(), &"c-1".into()).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn rejected_delete_asks_for_refetch() {
        let mut store = CommentStore::new();
        store.insert_at_head(with_replies(
            comment("c-1", "x", 0),
            vec![reply("r-1", "c-1", "y", 1)],
        ));
        let p = begin_delete_reply(&mut store, &identity(), &post(), &"r-1".into()).unwrap();
        assert_eq!(store.get(&"c-1".into()).unwrap().reply_count, 0);
        let s = settle(&mut store, p, Err(Error::Unknown("nope".into())));
        assert!(s.needs_refetch());
    }

    #[tokio::test]
    async fn send_reaches_the_backend() {
        let mock = MockBackend::new();
        mock.lock().set_next_id(101);
        let mut store = CommentStore::new();
        let p = begin_add_comment(
            &mut store,
            &identity(),
            &post(),
            "Great initiative!".into(),
            at(0),
        )
        .unwrap();
        let res = p.send(&mock).await;
        assert_eq!(settle(&mut store, p, res), Settled::Confirmed);
        assert_eq!(ids(&store), vec!["c-101"]);
        assert_eq!(mock.lock().comments_of(&post()).len(), 1);
    }
}
