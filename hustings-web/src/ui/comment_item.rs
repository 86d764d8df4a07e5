use hustings_client::api::{Author, Comment, CommentId, Reply, ReplyId, Time, UserId};
use yew::prelude::*;

#[derive(Clone, PartialEq, Properties)]
pub struct CommentItemProps {
    pub comment: Comment,
    pub me: UserId,
    pub admin: bool,
    pub reply_input: String,
    pub on_reply_input: Callback<(CommentId, String)>,
    pub on_reply: Callback<CommentId>,
    pub on_edit: Callback<(CommentId, String)>,
    pub on_delete: Callback<CommentId>,
    pub on_edit_reply: Callback<(ReplyId, String)>,
    pub on_delete_reply: Callback<ReplyId>,
}

pub enum ItemMsg {
    ToggleReplies,
    StartEdit,
    EditInput(String),
    SaveEdit,
    StartEditReply(ReplyId, String),
    SaveEditReply,
    CancelEdit,
}

pub struct CommentItem {
    show_replies: bool,
    editing: Option<String>,
    editing_reply: Option<(ReplyId, String)>,
}

fn avatar(a: &Author) -> Html {
    html! {
        <div class="avatar rounded-circle me-2" title={ a.email.clone() }>
            { a.avatar_initial.to_string() }
        </div>
    }
}

fn timestamp(created_at: Time, updated_at: Time) -> Html {
    html! {
        <small class="text-muted ms-2">
            { created_at.format("%Y-%m-%d %H:%M").to_string() }
            { for (updated_at > created_at).then(|| " (edited)") }
        </small>
    }
}

impl CommentItem {
    fn view_reply(&self, ctx: &Context<Self>, r: &Reply) -> Html {
        let p = ctx.props();
        let pending = r.id.is_placeholder();
        let mine = r.user_id == p.me;
        let body = match &self.editing_reply {
            Some((id, draft)) if *id == r.id => html! {
                <div class="d-flex">
                    <input
                        type="text"
                        class="form-control form-control-sm me-2"
                        value={ draft.clone() }
                        oninput={ ctx.link().callback(|e: InputEvent| {
                            let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                            ItemMsg::EditInput(input.value())
                        }) }
                    />
                    <button class="btn btn-sm btn-primary me-1" onclick={ ctx.link().callback(|_| ItemMsg::SaveEditReply) }>
                        { "Save" }
                    </button>
                    <button class="btn btn-sm btn-secondary" onclick={ ctx.link().callback(|_| ItemMsg::CancelEdit) }>
                        { "Cancel" }
                    </button>
                </div>
            },
            _ => html! { <p class="mb-1">{ &r.content }</p> },
        };
        let actions = (!pending).then(|| {
            let edit = mine.then(|| {
                let (id, content) = (r.id.clone(), r.content.clone());
                html! {
                    <button
                        class="btn btn-sm btn-link"
                        onclick={ ctx.link().callback(move |_| ItemMsg::StartEditReply(id.clone(), content.clone())) }
                    >
                        { "Edit" }
                    </button>
                }
            });
            let delete = (mine || p.admin).then(|| {
                let id = r.id.clone();
                html! {
                    <button
                        class="btn btn-sm btn-link text-danger"
                        onclick={ p.on_delete_reply.reform(move |_| id.clone()) }
                    >
                        { "Delete" }
                    </button>
                }
            });
            html! { <>{ for edit }{ for delete }</> }
        });
        html! {
            <li class={ classes!("list-group-item", "d-flex", pending.then(|| "opacity-50")) }>
                { avatar(&r.author) }
                <div class="flex-grow-1">
                    <div>
                        <strong>{ &r.author.display_name }</strong>
                        { timestamp(r.created_at, r.updated_at) }
                    </div>
                    { body }
                    { for actions }
                </div>
            </li>
        }
    }
}

impl Component for CommentItem {
    type Message = ItemMsg;
    type Properties = CommentItemProps;

    fn create(_ctx: &Context<Self>) -> Self {
        CommentItem {
            show_replies: false,
            editing: None,
            editing_reply: None,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        let p = ctx.props();
        match msg {
            ItemMsg::ToggleReplies => self.show_replies = !self.show_replies,
            ItemMsg::StartEdit => {
                self.editing_reply = None;
                self.editing = Some(p.comment.content.clone());
            }
            ItemMsg::EditInput(s) => {
                if let Some(draft) = &mut self.editing {
                    *draft = s;
                } else if let Some((_, draft)) = &mut self.editing_reply {
                    *draft = s;
                }
                return false;
            }
            ItemMsg::SaveEdit => {
                if let Some(draft) = self.editing.take() {
                    p.on_edit.emit((p.comment.id.clone(), draft));
                }
            }
            ItemMsg::StartEditReply(id, content) => {
                self.editing = None;
                self.editing_reply = Some((id, content));
            }
            ItemMsg::SaveEditReply => {
                if let Some(edit) = self.editing_reply.take() {
                    p.on_edit_reply.emit(edit);
                }
            }
            ItemMsg::CancelEdit => {
                self.editing = None;
                self.editing_reply = None;
            }
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let p = ctx.props();
        let c = &p.comment;
        let pending = c.id.is_placeholder();
        let mine = c.user_id == p.me;

        let body = match &self.editing {
            Some(draft) => html! {
                <div class="d-flex">
                    <textarea
                        class="form-control me-2"
                        value={ draft.clone() }
                        oninput={ ctx.link().callback(|e: InputEvent| {
                            let input: web_sys::HtmlTextAreaElement = e.target_unchecked_into();
                            ItemMsg::EditInput(input.value())
                        }) }
                    />
                    <button class="btn btn-sm btn-primary me-1" onclick={ ctx.link().callback(|_| ItemMsg::SaveEdit) }>
                        { "Save" }
                    </button>
                    <button class="btn btn-sm btn-secondary" onclick={ ctx.link().callback(|_| ItemMsg::CancelEdit) }>
                        { "Cancel" }
                    </button>
                </div>
            },
            None => html! { <p class="mb-1">{ &c.content }</p> },
        };

        let actions = if pending {
            html! { <small class="text-muted">{ "Posting..." }</small> }
        } else {
            let id = c.id.clone();
            let on_reply_input = p.on_reply_input.reform(move |e: InputEvent| {
                let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                (id.clone(), input.value())
            });
            let id = c.id.clone();
            let on_reply = p.on_reply.reform(move |e: SubmitEvent| {
                e.prevent_default();
                id.clone()
            });
            let id = c.id.clone();
            let on_delete = p.on_delete.reform(move |_| id.clone());
            html! {
                <>
                    <button class="btn btn-sm btn-link" onclick={ ctx.link().callback(|_| ItemMsg::ToggleReplies) }>
                        { format!("{} replies", c.reply_count) }
                    </button>
                    { for mine.then(|| html! {
                        <button class="btn btn-sm btn-link" onclick={ ctx.link().callback(|_| ItemMsg::StartEdit) }>
                            { "Edit" }
                        </button>
                    }) }
                    { for (mine || p.admin).then(|| html! {
                        <button class="btn btn-sm btn-link text-danger" onclick={ on_delete }>
                            { "Delete" }
                        </button>
                    }) }
                    { for self.show_replies.then(|| html! {
                        <form class="d-flex mt-2" onsubmit={ on_reply }>
                            <input
                                type="text"
                                class="form-control form-control-sm me-2"
                                placeholder="Write a reply..."
                                value={ p.reply_input.clone() }
                                oninput={ on_reply_input }
                            />
                            <button type="submit" class="btn btn-sm btn-primary">{ "Reply" }</button>
                        </form>
                    }) }
                </>
            }
        };

        html! {
            <li class={ classes!("list-group-item", pending.then(|| "opacity-50")) }>
                <div class="d-flex">
                    { avatar(&c.author) }
                    <div class="flex-grow-1">
                        <div>
                            <strong>{ &c.author.display_name }</strong>
                            { timestamp(c.created_at, c.updated_at) }
                        </div>
                        { body }
                        { actions }
                    </div>
                </div>
                { for self.show_replies.then(|| html! {
                    <ul class="list-group list-group-flush ms-5">
                        { for c.replies.iter().map(|r| self.view_reply(ctx, r)) }
                    </ul>
                }) }
            </li>
        }
    }
}
