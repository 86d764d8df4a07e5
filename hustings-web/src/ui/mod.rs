mod app;
pub use app::{App, AppMsg};

mod comment_item;
pub use comment_item::CommentItem;

mod comment_panel;
pub use comment_panel::{CommentPanel, PanelMsg};

mod login;
pub use login::Login;

mod refresh_indicator;
pub use refresh_indicator::RefreshIndicator;
