use hustings_client::api::{UserId, UserType, Uuid};
use yew::prelude::*;

use crate::LoginInfo;

#[derive(Clone, PartialEq, Properties)]
pub struct LoginProps {
    pub info: Option<LoginInfo>,
    pub on_submit: Callback<LoginInfo>,
}

pub struct Login {
    host: String,
    token: String,
    user: String,
    admin: bool,
    error: Option<String>,
}

pub enum LoginMsg {
    HostChanged(String),
    TokenChanged(String),
    UserChanged(String),
    AdminChanged(bool),
    SubmitClicked,
}

impl Component for Login {
    type Message = LoginMsg;
    type Properties = LoginProps;

    fn create(ctx: &Context<Self>) -> Self {
        let (host, user, admin) = match &ctx.props().info {
            Some(i) => (
                i.host.clone(),
                i.user_id.0.to_string(),
                i.user_type == UserType::Admin,
            ),
            None => (String::new(), String::new(), false),
        };
        Self {
            host,
            token: String::new(),
            user,
            admin,
            error: None,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            LoginMsg::HostChanged(h) => self.host = h,
            LoginMsg::TokenChanged(t) => self.token = t,
            LoginMsg::UserChanged(u) => self.user = u,
            LoginMsg::AdminChanged(a) => self.admin = a,
            LoginMsg::SubmitClicked => {
                let user_id = match Uuid::parse_str(self.user.trim()) {
                    Ok(u) => UserId(u),
                    Err(err) => {
                        self.error = Some(format!("Invalid user id: {err}"));
                        return true;
                    }
                };
                self.error = None;
                ctx.props().on_submit.emit(LoginInfo {
                    host: String::from(self.host.trim_end_matches('/')),
                    token: Some(self.token.clone()).filter(|t| !t.is_empty()),
                    user_id,
                    user_type: match self.admin {
                        true => UserType::Admin,
                        false => UserType::Student,
                    },
                });
                return false;
            }
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        macro_rules! callback_for {
            ($msg:ident) => {
                ctx.link().callback(|e: web_sys::Event| {
                    let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                    LoginMsg::$msg(input.value())
                })
            };
        }
        let on_admin = ctx.link().callback(|e: web_sys::Event| {
            let input: web_sys::HtmlInputElement = e.target_unchecked_into();
            LoginMsg::AdminChanged(input.checked())
        });
        let on_submit = ctx.link().callback(|e: SubmitEvent| {
            e.prevent_default();
            LoginMsg::SubmitClicked
        });
        html! {<>
            <div class="text-center my-4">
                <h1>{ "Sign in" }</h1>
            </div>
            <form class="login-form" onsubmit={on_submit}>
                <div class="input-group mb-3">
                    <label class="input-group-text col-xl-1" for="host">{ "Host" }</label>
                    <input
                        type="url"
                        class="form-control form-control-lg"
                        id="host"
                        placeholder="https://example.org"
                        value={self.host.clone()}
                        onchange={callback_for!(HostChanged)}
                    />
                </div>
                <div class="input-group mb-3">
                    <label class="input-group-text col-xl-1" for="token">{ "Token" }</label>
                    <input
                        type="password"
                        class="form-control form-control-lg"
                        id="token"
                        placeholder="session token"
                        value={self.token.clone()}
                        onchange={callback_for!(TokenChanged)}
                    />
                </div>
                <div class="input-group mb-3">
                    <label class="input-group-text col-xl-1" for="user">{ "User id" }</label>
                    <input
                        type="text"
                        class="form-control form-control-lg"
                        id="user"
                        placeholder="00000000-0000-0000-0000-000000000000"
                        value={self.user.clone()}
                        onchange={callback_for!(UserChanged)}
                    />
                </div>
                <div class="form-check mb-3">
                    <input
                        type="checkbox"
                        class="form-check-input"
                        id="admin"
                        checked={self.admin}
                        onchange={on_admin}
                    />
                    <label class="form-check-label" for="admin">{ "Administrator" }</label>
                </div>
                { for self.error.as_ref().map(|e| html! {
                    <div class="alert alert-danger">{ e }</div>
                }) }
                <button type="submit" class="btn btn-primary">
                    { "Connect" }
                </button>
            </form>
        </>}
    }
}
