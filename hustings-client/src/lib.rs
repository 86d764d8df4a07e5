mod author;
pub use author::{resolve_author, resolve_from_profiles, AuthorResolver, Identity, ProfileTable};

mod coordinator;
pub use coordinator::{Coordinator, UpdateSource};

mod feed;
pub use feed::{CommentFeed, FeedConfig, FeedState};

mod http;
pub use http::HttpBackend;

pub mod mutation;
pub use mutation::{PendingMutation, Settled, WriteOutcome};

mod order;
pub use order::{OrderType, SortOrder};

mod polling;
pub use polling::{PollSnapshot, PollVerdict};

mod realtime;
pub use realtime::{prepare, Change, Notification};

mod store;
pub use store::{CommentStore, Patch};

#[cfg(test)]
mod fuzz;
#[cfg(test)]
mod test_util;

pub mod api {
    pub use hustings_api::*;
}
