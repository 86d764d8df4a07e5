use gloo_storage::{LocalStorage, Storage};
use hustings_client::api::{UserId, UserType};

mod api;
mod ui;

const KEY_LOGIN: &str = "login";

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LoginInfo {
    pub host: String,
    pub token: Option<String>,
    pub user_id: UserId,
    pub user_type: UserType,
}

impl LoginInfo {
    fn load() -> Option<LoginInfo> {
        LocalStorage::get(KEY_LOGIN).ok()
    }

    fn save(&self) {
        if let Err(err) = LocalStorage::set(KEY_LOGIN, self) {
            tracing::warn!(?err, "failed saving login info to local storage");
        }
    }

    fn forget() {
        LocalStorage::delete(KEY_LOGIN);
    }
}

fn main() {
    tracing_wasm::set_as_global_default();
    yew::Renderer::<ui::App>::new().render();
}
