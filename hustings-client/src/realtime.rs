use crate::{
    api::{
        Backend, ChangeKind, ChangePayload, Comment, CommentId, CommentRow, FeedMessage, PostId,
        Reply, ReplyId, ReplyRow,
    },
    resolve_from_profiles, CommentStore, Patch,
};

/// A row-level change notification, as delivered by the change feed
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Notification {
    Comments(ChangePayload<CommentRow>),
    Replies(ChangePayload<ReplyRow>),
}

impl Notification {
    /// `None` for feed housekeeping messages
    pub fn from_feed(msg: FeedMessage) -> Option<Notification> {
        match msg {
            FeedMessage::Comments(p) => Some(Notification::Comments(p)),
            FeedMessage::Replies(p) => Some(Notification::Replies(p)),
            FeedMessage::Pong | FeedMessage::Subscribed(_) => None,
        }
    }
}

/// A notification that is ready to be applied to the store
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Change {
    CommentInserted(Comment),
    CommentUpdated(CommentId, Patch),
    CommentDeleted(CommentId),
    ReplyInserted(Reply),
    ReplyUpdated(ReplyId, Patch),
    ReplyDeleted(ReplyId),
}

/// Turns a notification into a store change, looking up the author of inserted entities.
///
/// Returns `None` for malformed notifications and for comments of another post.
pub async fn prepare<B: ?Sized + Backend>(
    backend: &B,
    post: &PostId,
    n: Notification,
) -> Option<Change> {
    match n {
        Notification::Comments(p) => match (p.event_type, p.new, p.old) {
            (ChangeKind::Delete, _, Some(old)) => Some(Change::CommentDeleted(CommentId(old.id))),
            (ChangeKind::Insert | ChangeKind::Update, Some(row), _) if row.post_id != *post => {
                tracing::trace!(
                    id = ?row.id,
                    post = ?row.post_id,
                    "ignoring change on another post"
                );
                None
            }
            (ChangeKind::Insert, Some(row), _) => {
                let author = resolve_from_profiles(backend, row.user_id).await;
                Some(Change::CommentInserted(Comment {
                    id: row.id,
                    post_id: row.post_id,
                    content: row.content,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                    user_id: row.user_id,
                    user_type: row.user_type,
                    author,
                    reply_count: 0,
                    replies: Vec::new(),
                }))
            }
            (ChangeKind::Update, Some(row), _) => Some(Change::CommentUpdated(
                row.id,
                Patch::edit(row.content, row.updated_at),
            )),
            (kind, _, _) => {
                tracing::warn!(?kind, "comment notification without its row");
                None
            }
        },
        Notification::Replies(p) => match (p.event_type, p.new, p.old) {
            (ChangeKind::Delete, _, Some(old)) => Some(Change::ReplyDeleted(ReplyId(old.id))),
            (ChangeKind::Insert, Some(row), _) => {
                let author = resolve_from_profiles(backend, row.user_id).await;
                Some(Change::ReplyInserted(Reply {
                    id: row.id,
                    comment_id: row.comment_id,
                    content: row.content,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                    user_id: row.user_id,
                    user_type: row.user_type,
                    author,
                }))
            }
            (ChangeKind::Update, Some(row), _) => Some(Change::ReplyUpdated(
                row.id,
                Patch::edit(row.content, row.updated_at),
            )),
            (kind, _, _) => {
                tracing::warn!(?kind, "reply notification without its row");
                None
            }
        },
    }
}

impl Change {
    /// Returns `true` if the store changed. Duplicates, unknown ids and replies to
    /// comments not in the store are no-ops.
    pub fn apply(self, store: &mut CommentStore) -> bool {
        match self {
            Change::CommentInserted(c) => store.insert_at_head(c),
            Change::CommentUpdated(id, patch) => store.update_fields(&id, patch),
            Change::CommentDeleted(id) => store.remove(&id).is_some(),
            Change::ReplyInserted(r) => {
                let parent = r.comment_id.clone();
                let inserted = store.insert_reply(r);
                if !inserted && store.get(&parent).is_none() {
                    tracing::debug!(?parent, "dropping reply to a comment not in the store");
                }
                inserted
            }
            Change::ReplyUpdated(id, patch) => store.update_reply_fields(&id, patch),
            Change::ReplyDeleted(id) => store.remove_reply(&id).is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use hustings_api::{KeyRow, Profile, ProfileSource, UserId, UserType, Uuid};
    use hustings_mock_server::MockBackend;

    use super::*;
    use crate::test_util::*;

    fn row(id: &str, post: &str, user_id: UserId, content: &str) -> CommentRow {
        CommentRow {
            id: id.into(),
            post_id: post.into(),
            user_id,
            user_type: UserType::Student,
            content: String::from(content),
            created_at: at(0),
            updated_at: at(0),
        }
    }

    fn insert(r: CommentRow) -> Notification {
        Notification::Comments(ChangePayload {
            event_type: ChangeKind::Insert,
            new: Some(r),
            old: None,
        })
    }

    fn reply_insert(id: &str, comment_id: &str) -> Notification {
        Notification::Replies(ChangePayload {
            event_type: ChangeKind::Insert,
            new: Some(ReplyRow {
                id: id.into(),
                comment_id: comment_id.into(),
                user_id: UserId::stub(),
                user_type: UserType::Student,
                content: String::from("re"),
                created_at: at(1),
                updated_at: at(1),
            }),
            old: None,
        })
    }

    fn reply_delete(id: &str) -> Notification {
        Notification::Replies(ChangePayload {
            event_type: ChangeKind::Delete,
            new: None,
            old: Some(KeyRow {
                id: String::from(id),
                comment_id: None,
            }),
        })
    }

    #[tokio::test]
    async fn insert_resolves_author() {
        let mock = MockBackend::new();
        let user = UserId(Uuid::new_v4());
        mock.lock().add_profile(
            ProfileSource::Students,
            user,
            Profile {
                first_name: Some(String::from("Grace")),
                last_name: Some(String::from("Hopper")),
                email: Some(String::from("grace@uni.edu")),
            },
        );
        let change = prepare(&mock, &post(), insert(row("c-1", "p-1", user, "hi")))
            .await
            .unwrap();
        match &change {
            Change::CommentInserted(c) => {
                assert_eq!(c.author.display_name, "Grace Hopper");
                assert_eq!(c.author.avatar_initial, 'G');
                assert_eq!(c.reply_count, 0);
            }
            c => panic!("unexpected change {c:?}"),
        }
        let mut store = CommentStore::new();
        assert!(change.clone().apply(&mut store));
        assert!(!change.apply(&mut store));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn other_post_is_ignored() {
        let mock = MockBackend::new();
        let n = insert(row("c-1", "p-2", UserId::stub(), "elsewhere"));
        assert_eq!(prepare(&mock, &post(), n).await, None);
    }

    #[tokio::test]
    async fn delete_without_key_is_dropped() {
        let mock = MockBackend::new();
        let n = Notification::Comments(ChangePayload {
            event_type: ChangeKind::Delete,
            new: None,
            old: None,
        });
        assert_eq!(prepare(&mock, &post(), n).await, None);
    }

    #[tokio::test]
    async fn orphan_reply_is_dropped() {
        let mock = MockBackend::new();
        let mut store = CommentStore::new();
        store.insert_at_head(comment("c-1", "x", 0));
        let change = prepare(&mock, &post(), reply_insert("r-1", "c-404"))
            .await
            .unwrap();
        assert!(!change.apply(&mut store));
        assert_eq!(store.reply_total(), 0);
    }

    #[tokio::test]
    async fn reply_count_never_goes_negative() {
        let mock = MockBackend::new();
        let mut store = CommentStore::new();
        store.insert_at_head(comment("c-1", "x", 0));
        for n in [reply_insert("r-1", "c-1"), reply_delete("r-1"), reply_delete("r-1")] {
            if let Some(change) = prepare(&mock, &post(), n).await {
                change.apply(&mut store);
            }
        }
        let c = store.get(&"c-1".into()).unwrap();
        assert_eq!(c.reply_count, 0);
        assert!(c.replies.is_empty());
    }

    #[tokio::test]
    async fn update_patches_in_place() {
        let mock = MockBackend::new();
        let mut store = CommentStore::new();
        store.insert_at_head(comment("c-1", "before", 0));
        let mut r = row("c-1", "p-1", UserId::stub(), "after");
        r.updated_at = at(9);
        let n = Notification::Comments(ChangePayload {
            event_type: ChangeKind::Update,
            new: Some(r),
            old: None,
        });
        assert!(prepare(&mock, &post(), n).await.unwrap().apply(&mut store));
        let c = store.get(&"c-1".into()).unwrap();
        assert_eq!(c.content, "after");
        assert_eq!(c.updated_at, at(9));
        assert_eq!(c.created_at, at(0));
    }

    #[test]
    fn housekeeping_is_not_a_notification() {
        assert_eq!(Notification::from_feed(FeedMessage::Pong), None);
    }
}
