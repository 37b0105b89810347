use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Rating;

/// Sort order offered on the watched and review listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListOrder {
    #[default]
    #[serde(rename = "date-desc")]
    DateDesc,
    #[serde(rename = "date-asc")]
    DateAsc,
    #[serde(rename = "rating-desc")]
    RatingDesc,
    #[serde(rename = "rating-asc")]
    RatingAsc,
}

impl ListOrder {
    /// SQL `ORDER BY` body for a table whose timestamp column is `date_column`
    pub fn order_by(self, date_column: &str) -> String {
        match self {
            ListOrder::DateDesc => format!("{} DESC", date_column),
            ListOrder::DateAsc => format!("{} ASC", date_column),
            ListOrder::RatingDesc => format!("rating DESC, {} DESC", date_column),
            ListOrder::RatingAsc => format!("rating ASC, {} DESC", date_column),
        }
    }

    /// Sorts in memory with the same semantics as `order_by`
    pub fn sort<T, D, R>(self, items: &mut [T], date: D, rating: R)
    where
        D: Fn(&T) -> DateTime<Utc>,
        R: Fn(&T) -> Rating,
    {
        items.sort_by(|a, b| {
            let by_date = date(b).cmp(&date(a));
            match self {
                ListOrder::DateDesc => by_date,
                ListOrder::DateAsc => by_date.reverse(),
                ListOrder::RatingDesc => rating(b)
                    .value()
                    .total_cmp(&rating(a).value())
                    .then(by_date),
                ListOrder::RatingAsc => rating(a)
                    .value()
                    .total_cmp(&rating(b).value())
                    .then(by_date),
            }
        });
    }
}
