use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::models::{MenuCategory, OrderStatus};

const DEFAULT_PER_PAGE: u64 = 20;
const MAX_PER_PAGE: u64 = 100;

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    /// Only orders in this status.
    pub status: Option<OrderStatus>,
    /// Substring of the contact phone number.
    pub phone: Option<String>,
    /// Earliest `createdAt`, inclusive (RFC 3339).
    pub from: Option<DateTime<Utc>>,
    /// Latest `createdAt`, inclusive (RFC 3339).
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl OrderListQuery {
    /// `(page, per_page, offset)` when the caller asked for a page; `None`
    /// lists everything.
    pub fn pagination(&self) -> Option<(u64, u64, u64)> {
        if self.page.is_none() && self.per_page.is_none() {
            return None;
        }
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        Some((page, per_page, (page - 1) * per_page))
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MenuQuery {
    pub category: Option<MenuCategory>,
    pub available: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_paging_parameters_lists_everything() {
        assert_eq!(OrderListQuery::default().pagination(), None);
    }

    #[test]
    fn paging_is_normalized() {
        let query = OrderListQuery {
            page: Some(0),
            per_page: Some(500),
            ..Default::default()
        };
        assert_eq!(query.pagination(), Some((1, MAX_PER_PAGE, 0)));

        let query = OrderListQuery {
            page: Some(3),
            ..Default::default()
        };
        assert_eq!(query.pagination(), Some((3, DEFAULT_PER_PAGE, 40)));
    }
}
