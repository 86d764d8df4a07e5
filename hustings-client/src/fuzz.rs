#![cfg(test)]

use std::{collections::HashSet, panic::AssertUnwindSafe};

use hustings_api::{Backend, FeedMessage, UserId, UserType, Uuid};
use hustings_mock_server::MockBackend;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    api::Error, prepare, test_util::*, CommentFeed, FeedConfig, Notification, PendingMutation,
};

macro_rules! do_tokio_test {
    ( $name:ident, $ty:ty, $fn:expr ) => {
        #[test]
        fn $name() {
            if std::env::var("RUST_LOG").is_ok() {
                tracing_subscriber::fmt::init();
            }
            let runtime = AssertUnwindSafe(
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("failed initializing tokio runtime"),
            );
            bolero::check!()
                .with_type::<$ty>()
                .cloned()
                .for_each(move |v| {
                    let () = runtime.block_on($fn(v));
                })
        }
    };
}

const CONTENTS: &[&str] = &[
    "",
    "   ",
    "Great initiative!",
    "Agreed",
    "nul\0byte",
    "See you at the hustings",
];

// (kind, target, content, fail, echo, deliver_first)
type RawOp = (u8, u8, u8, bool, bool, bool);

#[derive(Clone, Debug)]
enum FuzzOp {
    Comment {
        content: String,
        fail: bool,
        deliver_first: bool,
    },
    Reply {
        target: usize,
        content: String,
        fail: bool,
        echo: bool,
        deliver_first: bool,
    },
    EditComment {
        target: usize,
        content: String,
        fail: bool,
    },
    DeleteComment {
        target: usize,
        fail: bool,
    },
    DeleteReply {
        target: usize,
        fail: bool,
    },
    SomeoneComments,
    SomeoneReplies {
        target: usize,
    },
    SomeoneDeletes {
        target: usize,
    },
    Deliver,
    Poll,
}

impl From<RawOp> for FuzzOp {
    fn from((kind, target, content, fail, echo, deliver_first): RawOp) -> FuzzOp {
        let target = usize::from(target);
        let content = String::from(CONTENTS[usize::from(content) % CONTENTS.len()]);
        match kind % 10 {
            0 => FuzzOp::Comment {
                content,
                fail,
                deliver_first,
            },
            1 => FuzzOp::Reply {
                target,
                content,
                fail,
                echo,
                deliver_first,
            },
            2 => FuzzOp::EditComment {
                target,
                content,
                fail,
            },
            3 => FuzzOp::DeleteComment { target, fail },
            4 => FuzzOp::DeleteReply { target, fail },
            5 => FuzzOp::SomeoneComments,
            6 => FuzzOp::SomeoneReplies { target },
            7 => FuzzOp::SomeoneDeletes { target },
            8 => FuzzOp::Deliver,
            _ => FuzzOp::Poll,
        }
    }
}

struct Harness {
    mock: MockBackend,
    feed: CommentFeed,
    rx: UnboundedReceiver<FeedMessage>,
    someone: UserId,
    tick: i64,
}

impl Harness {
    fn new() -> Harness {
        let mock = MockBackend::new();
        let rx = mock.lock().subscribe(&post());
        let mut feed = CommentFeed::new(FeedConfig::default(), Some(identity()));
        feed.open(post());
        Harness {
            mock,
            feed,
            rx,
            someone: UserId(Uuid::new_v4()),
            tick: 0,
        }
    }

    async fn deliver(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            let Some(n) = Notification::from_feed(msg) else {
                continue;
            };
            if let Some(change) = prepare(&self.mock, &post(), n).await {
                self.feed.on_change(&post(), change, at(self.tick));
            }
        }
    }

    async fn refetch(&mut self) {
        let res = self.mock.fetch_comments(&post()).await;
        self.feed.on_loaded(&post(), res);
    }

    async fn run(&mut self, p: Result<PendingMutation, Error>, fail: bool, deliver_first: bool) {
        let Ok(p) = p else {
            return;
        };
        if fail {
            self.mock
                .lock()
                .fail_next(Error::Unknown(String::from("rejected")));
        }
        let res = p.send(&self.mock).await;
        if deliver_first {
            self.deliver().await;
        }
        let settled = self
            .feed
            .settle(p, res, at(self.tick))
            .expect("feed stays on the same post");
        if settled.needs_refetch() {
            self.refetch().await;
        }
    }

    fn nth_comment(&self, target: usize) -> Option<crate::api::CommentId> {
        let comments = self.feed.store().comments();
        comments.get(target % comments.len().max(1)).map(|c| c.id.clone())
    }

    fn nth_reply(&self, target: usize) -> Option<crate::api::ReplyId> {
        let replies = self
            .feed
            .store()
            .comments()
            .iter()
            .flat_map(|c| c.replies.iter())
            .collect::<Vec<_>>();
        replies.get(target % replies.len().max(1)).map(|r| r.id.clone())
    }

    async fn execute(&mut self, op: FuzzOp) {
        self.tick += 1;
        let now = at(self.tick);
        match op {
            FuzzOp::Comment {
                content,
                fail,
                deliver_first,
            } => {
                self.feed.set_comment_input(content);
                let p = self.feed.submit_comment(now);
                self.run(p, fail, deliver_first).await;
            }
            FuzzOp::Reply {
                target,
                content,
                fail,
                echo,
                deliver_first,
            } => {
                let Some(c) = self.nth_comment(target) else {
                    return;
                };
                self.mock.lock().set_reply_echo(echo);
                self.feed.set_reply_input(c.clone(), content);
                let p = self.feed.submit_reply(&c, now);
                self.run(p, fail, deliver_first).await;
            }
            FuzzOp::EditComment {
                target,
                content,
                fail,
            } => {
                let Some(c) = self.nth_comment(target) else {
                    return;
                };
                let p = self.feed.edit_comment(&c, content, now);
                self.run(p, fail, false).await;
            }
            FuzzOp::DeleteComment { target, fail } => {
                let Some(c) = self.nth_comment(target) else {
                    return;
                };
                let p = self.feed.delete_comment(&c, now);
                self.run(p, fail, false).await;
            }
            FuzzOp::DeleteReply { target, fail } => {
                let Some(r) = self.nth_reply(target) else {
                    return;
                };
                let p = self.feed.delete_reply(&r, now);
                self.run(p, fail, false).await;
            }
            FuzzOp::SomeoneComments => {
                self.mock.lock().add_comment_as(
                    &post(),
                    self.someone,
                    UserType::Admin,
                    "hello from someone",
                );
            }
            FuzzOp::SomeoneReplies { target } => {
                let comments = self.mock.lock().comments_of(&post());
                if let Some(c) = comments.get(target % comments.len().max(1)) {
                    self.mock.lock().add_reply_as(
                        &c.id,
                        self.someone,
                        UserType::Admin,
                        "reply from someone",
                    );
                }
            }
            FuzzOp::SomeoneDeletes { target } => {
                let comments = self.mock.lock().comments_of(&post());
                if let Some(c) = comments.get(target % comments.len().max(1)) {
                    self.mock.lock().remove_comment(&c.id);
                }
            }
            FuzzOp::Deliver => self.deliver().await,
            FuzzOp::Poll => {
                if self.feed.should_poll(&post()) {
                    let res = self.mock.fetch_comments(&post()).await;
                    self.feed.on_polled(&post(), res, now);
                }
            }
        }
        self.check_invariants();
    }

    fn check_invariants(&self) {
        let mut comment_ids = HashSet::new();
        let mut reply_ids = HashSet::new();
        for c in self.feed.store().comments() {
            assert_eq!(c.reply_count, c.replies.len(), "reply count of {}", c.id);
            assert!(comment_ids.insert(c.id.clone()), "duplicate comment {}", c.id);
            assert_eq!(c.post_id, post());
            for r in c.replies.iter() {
                assert_eq!(r.comment_id, c.id);
                assert!(reply_ids.insert(r.id.clone()), "duplicate reply {}", r.id);
            }
        }
    }

    /// Once every notification is delivered, the store matches the server
    fn check_converged(&self) {
        let view = |comments: &[crate::api::Comment]| {
            let mut res = comments
                .iter()
                .map(|c| {
                    let mut replies = c
                        .replies
                        .iter()
                        .map(|r| (r.id.0.clone(), r.content.clone()))
                        .collect::<Vec<_>>();
                    replies.sort();
                    (c.id.0.clone(), c.content.clone(), replies)
                })
                .collect::<Vec<_>>();
            res.sort();
            res
        };
        let server = self.mock.lock().comments_of(&post());
        assert_eq!(view(self.feed.store().comments()), view(&server));
    }
}

do_tokio_test!(
    store_converges_with_server,
    Vec<RawOp>,
    |ops: Vec<RawOp>| async move {
        let mut h = Harness::new();
        for op in ops.into_iter().take(50) {
            h.execute(FuzzOp::from(op)).await;
        }
        h.deliver().await;
        h.check_invariants();
        h.check_converged();
    }
);
