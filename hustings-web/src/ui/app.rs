use hustings_client::api::PostId;
use yew::prelude::*;

use crate::{ui, LoginInfo};

pub enum AppMsg {
    UserLogin(LoginInfo),
    Logout,
    PostInput(String),
    OpenPost,
    ClosePost,
}

pub struct App {
    login: Option<LoginInfo>,
    logout: Option<LoginInfo>, // login info saved for prefilling the form
    post_input: String,
    post: Option<PostId>,
}

impl Component for App {
    type Message = AppMsg;
    type Properties = ();

    fn create(_ctx: &Context<Self>) -> Self {
        App {
            login: LoginInfo::load(),
            logout: None,
            post_input: String::new(),
            post: None,
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            AppMsg::UserLogin(login) => {
                login.save();
                self.login = Some(login);
            }
            AppMsg::Logout => {
                LoginInfo::forget();
                self.post = None;
                self.logout = self.login.take().map(|mut i| {
                    i.token = None;
                    i
                });
            }
            AppMsg::PostInput(p) => {
                self.post_input = p;
                return false;
            }
            AppMsg::OpenPost => {
                let post = self.post_input.trim();
                if post.is_empty() {
                    return false;
                }
                self.post = Some(PostId::from(post));
            }
            AppMsg::ClosePost => self.post = None,
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let Some(login) = &self.login else {
            return html! {
                <div class="container">
                    <ui::Login
                        info={ self.logout.clone() }
                        on_submit={ ctx.link().callback(AppMsg::UserLogin) }
                    />
                </div>
            };
        };
        let on_post_input = ctx.link().callback(|e: web_sys::Event| {
            let input: web_sys::HtmlInputElement = e.target_unchecked_into();
            AppMsg::PostInput(input.value())
        });
        let on_open = ctx.link().callback(|e: SubmitEvent| {
            e.prevent_default();
            AppMsg::OpenPost
        });
        html! {
            <div class="container">
                <nav class="d-flex justify-content-between align-items-center my-3">
                    <form class="d-flex" onsubmit={ on_open }>
                        <input
                            type="text"
                            class="form-control me-2"
                            placeholder="Post id"
                            value={ self.post_input.clone() }
                            onchange={ on_post_input }
                        />
                        <button type="submit" class="btn btn-outline-primary">{ "Open" }</button>
                    </form>
                    <button class="btn btn-outline-secondary" onclick={ ctx.link().callback(|_| AppMsg::Logout) }>
                        { "Logout" }
                    </button>
                </nav>
                { for self.post.clone().map(|post| html! {
                    <>
                        <button class="btn btn-link" onclick={ ctx.link().callback(|_| AppMsg::ClosePost) }>
                            { "Hide comments" }
                        </button>
                        <ui::CommentPanel login={ login.clone() } { post } />
                    </>
                }) }
            </div>
        }
    }
}
