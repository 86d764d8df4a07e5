use std::cmp::Reverse;

use crate::api::Comment;

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum OrderType {
    Asc,
    Desc,
}

/// User-selectable ordering of the comments panel
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum SortOrder {
    CreationDate(OrderType),
}

impl Default for SortOrder {
    fn default() -> SortOrder {
        SortOrder::CreationDate(OrderType::Desc)
    }
}

impl SortOrder {
    pub fn toggled(self) -> SortOrder {
        match self {
            SortOrder::CreationDate(OrderType::Asc) => SortOrder::CreationDate(OrderType::Desc),
            SortOrder::CreationDate(OrderType::Desc) => SortOrder::CreationDate(OrderType::Asc),
        }
    }

    /// Stable, so comments created at the same instant keep their store order
    pub fn sort(&self, comments: &mut [&Comment]) {
        match self {
            SortOrder::CreationDate(OrderType::Asc) => comments.sort_by_key(|c| c.created_at),
            SortOrder::CreationDate(OrderType::Desc) => {
                comments.sort_by_key(|c| Reverse(c.created_at))
            }
        }
    }
}
