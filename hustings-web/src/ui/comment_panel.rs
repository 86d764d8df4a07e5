use futures::channel::oneshot;
use hustings_client::{
    api::{Backend, Comment, CommentId, Error, PostId, ReplyId},
    prepare, resolve_from_profiles, Change, CommentFeed, FeedConfig, HttpBackend, Identity,
    Notification, OrderType, PendingMutation, PollVerdict, Settled, SortOrder, WriteOutcome,
};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::{api, ui, LoginInfo};

#[derive(Clone, PartialEq, Properties)]
pub struct CommentPanelProps {
    pub login: LoginInfo,
    pub post: PostId,
}

pub enum PanelMsg {
    IdentityResolved(Identity),
    Loaded(PostId, Result<Vec<Comment>, Error>),

    PollTick(PostId),
    Polled(PostId, Result<Vec<Comment>, Error>),

    FeedConnected(PostId),
    FeedDisconnected(PostId),
    Notification(PostId, Notification),
    Changed(PostId, Option<Change>),

    CommentInput(String),
    ReplyInput(CommentId, String),
    SubmitComment,
    SubmitReply(CommentId),
    EditComment(CommentId, String),
    EditReply(ReplyId, String),
    DeleteComment(CommentId),
    DeleteReply(ReplyId),
    Settled(PendingMutation, Result<WriteOutcome, Error>),

    ToggleOrder,
    Redraw,
}

pub struct CommentPanel {
    backend: HttpBackend,
    feed: CommentFeed,
    realtime: bool,
    feed_canceller: oneshot::Receiver<()>,
    timer_canceller: oneshot::Receiver<()>,
}

fn now() -> hustings_client::api::Time {
    chrono::Utc::now()
}

impl CommentPanel {
    fn start(&mut self, ctx: &Context<Self>) {
        let post = ctx.props().post.clone();
        if !self.feed.open(post.clone()) {
            return;
        }
        self.realtime = false;

        // Dropping the previous receivers stops the previous post's drivers
        let (feed_cancel, feed_canceller) = oneshot::channel();
        self.feed_canceller = feed_canceller;
        spawn_local(api::start_change_feed(
            ctx.props().login.clone(),
            post.clone(),
            ctx.link().clone(),
            feed_cancel,
        ));

        let (timer_cancel, timer_canceller) = oneshot::channel();
        self.timer_canceller = timer_canceller;
        spawn_local(api::start_poll_timer(
            post.clone(),
            self.feed.config().poll_interval,
            ctx.link().clone(),
            timer_cancel,
        ));

        self.fetch(ctx, post);
    }

    fn resolve_identity(&self, ctx: &Context<Self>) {
        let backend = self.backend.clone();
        let login = ctx.props().login.clone();
        ctx.link().send_future(async move {
            let author = resolve_from_profiles(&backend, login.user_id).await;
            PanelMsg::IdentityResolved(Identity {
                user_id: login.user_id,
                user_type: login.user_type,
                author,
            })
        });
    }

    fn fetch(&self, ctx: &Context<Self>, post: PostId) {
        let backend = self.backend.clone();
        ctx.link().send_future(async move {
            let res = backend.fetch_comments(&post).await;
            PanelMsg::Loaded(post, res)
        });
    }

    fn send(&self, ctx: &Context<Self>, res: Result<PendingMutation, Error>) {
        match res {
            Ok(pending) => {
                let backend = self.backend.clone();
                ctx.link().send_future(async move {
                    let res = pending.send(&backend).await;
                    PanelMsg::Settled(pending, res)
                });
            }
            Err(err) => {
                tracing::debug!(?err, "write refused locally");
                self.redraw_after(ctx, self.feed.config().error_display);
            }
        }
    }

    fn redraw_after(&self, ctx: &Context<Self>, d: chrono::Duration) {
        ctx.link().send_future(async move {
            api::sleep_for(d).await;
            PanelMsg::Redraw
        });
    }
}

impl Component for CommentPanel {
    type Message = PanelMsg;
    type Properties = CommentPanelProps;

    fn create(ctx: &Context<Self>) -> Self {
        let login = &ctx.props().login;
        let (_, feed_canceller) = oneshot::channel();
        let (_, timer_canceller) = oneshot::channel();
        let mut this = CommentPanel {
            backend: HttpBackend::new(login.host.clone(), login.token.clone()),
            feed: CommentFeed::new(FeedConfig::default(), None),
            realtime: false,
            feed_canceller,
            timer_canceller,
        };
        this.resolve_identity(ctx);
        this.start(ctx);
        this
    }

    fn changed(&mut self, ctx: &Context<Self>, old_props: &Self::Properties) -> bool {
        let login = &ctx.props().login;
        if *login != old_props.login {
            self.backend = HttpBackend::new(login.host.clone(), login.token.clone());
            self.feed.set_identity(None);
            self.feed.close();
            self.resolve_identity(ctx);
        }
        self.start(ctx);
        true
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            PanelMsg::IdentityResolved(i) => self.feed.set_identity(Some(i)),
            PanelMsg::Loaded(post, res) => return self.feed.on_loaded(&post, res),
            PanelMsg::PollTick(post) => {
                if self.feed.should_poll(&post) {
                    let backend = self.backend.clone();
                    ctx.link().send_future(async move {
                        let res = backend.fetch_comments(&post).await;
                        PanelMsg::Polled(post, res)
                    });
                }
                return false;
            }
            PanelMsg::Polled(post, res) => match self.feed.on_polled(&post, res, now()) {
                None | Some(PollVerdict::Quiet) => return false,
                Some(_) => self.redraw_after(ctx, self.feed.config().refresh_indicator),
            },
            PanelMsg::FeedConnected(post) => self.realtime = self.feed.is_active_for(&post),
            PanelMsg::FeedDisconnected(post) => {
                if self.feed.is_active_for(&post) {
                    self.realtime = false;
                }
            }
            PanelMsg::Notification(post, n) => {
                if !self.feed.is_active_for(&post) {
                    return false;
                }
                let backend = self.backend.clone();
                ctx.link().send_future(async move {
                    let change = prepare(&backend, &post, n).await;
                    PanelMsg::Changed(post, change)
                });
                return false;
            }
            PanelMsg::Changed(post, change) => {
                let Some(change) = change else {
                    return false;
                };
                if !self.feed.on_change(&post, change, now()) {
                    return false;
                }
                self.redraw_after(ctx, self.feed.config().refresh_indicator);
            }
            PanelMsg::CommentInput(s) => {
                self.feed.set_comment_input(s);
                return false;
            }
            PanelMsg::ReplyInput(c, s) => {
                self.feed.set_reply_input(c, s);
                return false;
            }
            PanelMsg::SubmitComment => {
                let res = self.feed.submit_comment(now());
                self.send(ctx, res);
            }
            PanelMsg::SubmitReply(c) => {
                let res = self.feed.submit_reply(&c, now());
                self.send(ctx, res);
            }
            PanelMsg::EditComment(c, content) => {
                let res = self.feed.edit_comment(&c, content, now());
                self.send(ctx, res);
            }
            PanelMsg::EditReply(r, content) => {
                let res = self.feed.edit_reply(&r, content, now());
                self.send(ctx, res);
            }
            PanelMsg::DeleteComment(c) => {
                let res = self.feed.delete_comment(&c, now());
                self.send(ctx, res);
            }
            PanelMsg::DeleteReply(r) => {
                let res = self.feed.delete_reply(&r, now());
                self.send(ctx, res);
            }
            PanelMsg::Settled(pending, res) => {
                let post = pending.post_id.clone();
                let Some(settled) = self.feed.settle(pending, res, now()) else {
                    return false;
                };
                if settled.needs_refetch() {
                    self.fetch(ctx, post);
                }
                if let Settled::RolledBack { .. } = settled {
                    self.redraw_after(ctx, self.feed.config().error_display);
                }
            }
            PanelMsg::ToggleOrder => {
                let order = self.feed.config().order.toggled();
                self.feed.set_order(order);
            }
            PanelMsg::Redraw => (),
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let t = now();
        let login = &ctx.props().login;
        let comments = self.feed.comments();
        let reply_total = self.feed.store().reply_total();

        let on_comment_input = ctx.link().callback(|e: InputEvent| {
            let input: web_sys::HtmlTextAreaElement = e.target_unchecked_into();
            PanelMsg::CommentInput(input.value())
        });
        let on_submit = ctx.link().callback(|e: SubmitEvent| {
            e.prevent_default();
            PanelMsg::SubmitComment
        });
        let on_reply_input = ctx.link().callback(|(c, s)| PanelMsg::ReplyInput(c, s));
        let on_reply = ctx.link().callback(PanelMsg::SubmitReply);
        let on_edit = ctx.link().callback(|(c, s)| PanelMsg::EditComment(c, s));
        let on_delete = ctx.link().callback(PanelMsg::DeleteComment);
        let on_edit_reply = ctx.link().callback(|(r, s)| PanelMsg::EditReply(r, s));
        let on_delete_reply = ctx.link().callback(PanelMsg::DeleteReply);

        html! {
            <section class="comments-panel card">
                <header class="card-header d-flex justify-content-between align-items-center">
                    <h5 class="m-0">
                        { format!("{} comments, {} replies", comments.len(), reply_total) }
                    </h5>
                    <ui::RefreshIndicator
                        refreshing={ self.feed.is_refreshing(t) }
                        realtime={ self.realtime }
                    />
                    <button class="btn btn-sm btn-outline-secondary" onclick={ ctx.link().callback(|_| PanelMsg::ToggleOrder) }>
                        { match self.feed.config().order {
                            SortOrder::CreationDate(OrderType::Desc) => "Newest first",
                            SortOrder::CreationDate(OrderType::Asc) => "Oldest first",
                        } }
                    </button>
                </header>
                { for self.feed.error_message(t).map(|e| html! {
                    <div class="alert alert-danger m-2" role="alert">{ e }</div>
                }) }
                <form class="card-body" onsubmit={ on_submit }>
                    <textarea
                        class="form-control mb-2"
                        placeholder="Write a comment..."
                        value={ self.feed.comment_input().to_string() }
                        oninput={ on_comment_input }
                    />
                    <button type="submit" class="btn btn-primary" disabled={ self.feed.identity().is_none() }>
                        { "Comment" }
                    </button>
                </form>
                <ul class="list-group list-group-flush">
                    { for comments.into_iter().map(|c| html! {
                        <ui::CommentItem
                            key={ c.id.0.clone() }
                            comment={ c.clone() }
                            me={ login.user_id }
                            admin={ login.user_type == hustings_client::api::UserType::Admin }
                            reply_input={ self.feed.reply_input(&c.id).to_string() }
                            on_reply_input={ on_reply_input.clone() }
                            on_reply={ on_reply.clone() }
                            on_edit={ on_edit.clone() }
                            on_delete={ on_delete.clone() }
                            on_edit_reply={ on_edit_reply.clone() }
                            on_delete_reply={ on_delete_reply.clone() }
                        />
                    }) }
                </ul>
            </section>
        }
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        self.feed.close();
        self.feed_canceller.close();
        self.timer_canceller.close();
    }
}
