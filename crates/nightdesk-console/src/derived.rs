//! Derived views: filtering, pagination and aggregates
//!
//! Everything here is a pure function of the stored collection and the
//! current filters. Inputs are never mutated.

use nightdesk_core::types::{
    Artist, Employee, Event, PaymentMethod, PosDevice, Promotion, Ticket, TicketType, Transaction,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use nightdesk_core::utils::percentage;

/// Filter value meaning "do not filter on this dimension"
pub const ALL: &str = "all";

/// Active filters of a collection page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    /// Free-text search, case-insensitive
    pub search: String,
    /// Exact status key or [`ALL`]
    pub status: String,
    /// Exact category key or [`ALL`]
    pub category: String,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: ALL.to_string(),
            category: ALL.to_string(),
        }
    }
}

impl Filters {
    /// Whether every item passes these filters
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        self.search.trim().is_empty() && is_wildcard(&self.status) && is_wildcard(&self.category)
    }

    /// Whether one item passes these filters
    pub fn matches<R: Filterable + ?Sized>(&self, item: &R) -> bool {
        let needle = self.search.trim().to_lowercase();
        let search_ok = needle.is_empty()
            || item
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));

        search_ok
            && key_matches(&self.status, item.status_key())
            && key_matches(&self.category, item.category_key())
    }
}

fn is_wildcard(value: &str) -> bool {
    value.is_empty() || value == ALL
}

fn key_matches(filter: &str, key: Option<&str>) -> bool {
    is_wildcard(filter) || key == Some(filter)
}

/// Records that can be searched and filtered on a page
pub trait Filterable {
    /// Text fields the free-text search looks at
    fn search_fields(&self) -> Vec<&str>;

    /// Value compared against the status filter
    fn status_key(&self) -> Option<&str> {
        None
    }

    /// Value compared against the category filter
    fn category_key(&self) -> Option<&str> {
        None
    }
}

const fn active_key(active: bool) -> &'static str {
    if active { "active" } else { "inactive" }
}

impl Filterable for Event {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.venue.as_str(), self.category.as_str()];
        fields.extend(self.description.as_deref());
        fields
    }

    fn status_key(&self) -> Option<&str> {
        Some(self.status.as_str())
    }

    fn category_key(&self) -> Option<&str> {
        Some(self.category.as_str())
    }
}

impl Filterable for TicketType {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }

    fn status_key(&self) -> Option<&str> {
        Some(active_key(self.active))
    }
}

impl Filterable for Ticket {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.holder_name.as_str(), self.holder_email.as_str()]
    }

    fn status_key(&self) -> Option<&str> {
        Some(self.status.as_str())
    }
}

impl Filterable for Artist {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.genre.as_str()];
        fields.extend(self.bio.as_deref());
        fields
    }

    fn category_key(&self) -> Option<&str> {
        Some(self.genre.as_str())
    }
}

impl Filterable for Promotion {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.code.as_str(), self.description.as_str()]
    }

    fn status_key(&self) -> Option<&str> {
        Some(active_key(self.active))
    }
}

impl Filterable for PosDevice {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.serial_number.as_str(), self.location.as_str()]
    }

    fn status_key(&self) -> Option<&str> {
        Some(self.status.as_str())
    }

    fn category_key(&self) -> Option<&str> {
        Some(self.location.as_str())
    }
}

impl Filterable for Employee {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.email.as_str()]
    }

    fn status_key(&self) -> Option<&str> {
        Some(active_key(self.active))
    }

    fn category_key(&self) -> Option<&str> {
        Some(self.role.as_str())
    }
}

impl Filterable for Transaction {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.description.as_str()]
    }

    fn status_key(&self) -> Option<&str> {
        Some(self.status.as_str())
    }

    fn category_key(&self) -> Option<&str> {
        Some(self.kind.as_str())
    }
}

impl Filterable for PaymentMethod {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.label.as_str()];
        fields.extend(self.last_four.as_deref());
        fields
    }

    fn category_key(&self) -> Option<&str> {
        Some(self.kind.as_str())
    }
}

/// Items passing `filters`, in their original order
pub fn derived_view<'a, R: Filterable>(items: &'a [R], filters: &Filters) -> Vec<&'a R> {
    items.iter().filter(|item| filters.matches(*item)).collect()
}

/// One page of a list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSlice<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Requested page, 1-based
    pub page: usize,
    /// Items per page
    pub per_page: usize,
    /// Items across all pages
    pub total_items: usize,
    /// Number of pages, 0 when there is nothing to show
    pub total_pages: usize,
}

impl<T> PageSlice<T> {
    /// Whether a later page exists
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Whether an earlier page exists
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1 && self.total_pages > 0
    }

    /// Transform the items, keeping the paging metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageSlice<U> {
        PageSlice {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

/// Cut `items` into pages of `per_page` and return page `page` (1-based)
///
/// Page 0 and pages past the end are empty. A `per_page` of 0 is treated as 1.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> PageSlice<T> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page);

    let slice = match page.checked_sub(1) {
        Some(index) if page <= total_pages => {
            let start = index * per_page;
            let end = (start + per_page).min(total_items);
            items.get(start..end).map_or_else(Vec::new, <[T]>::to_vec)
        }
        _ => Vec::new(),
    };

    PageSlice {
        items: slice,
        page,
        per_page,
        total_items,
        total_pages,
    }
}

/// Sum of amounts
pub fn sum(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values.into_iter().sum()
}

/// Mean of amounts, zero for an empty input
pub fn average(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    let (total, count) = values
        .into_iter()
        .fold((Decimal::ZERO, 0u32), |(total, count), v| (total + v, count + 1));
    if count == 0 {
        Decimal::ZERO
    } else {
        total / Decimal::from(count)
    }
}

/// Share of capacity sold, as a percentage
#[must_use]
pub fn fill_rate(sold: u32, capacity: u32) -> f64 {
    percentage(f64::from(sold), f64::from(capacity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use nightdesk_core::types::EventStatus;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn event(id: i64, name: &str, category: &str, status: EventStatus) -> Event {
        Event {
            id,
            name: name.to_string(),
            description: None,
            venue: "Warehouse".to_string(),
            category: category.to_string(),
            status,
            starts_at: Utc.with_ymd_and_hms(2026, 5, 1, 22, 0, 0).unwrap(),
            ends_at: None,
            capacity: 100,
            tickets_sold: 0,
        }
    }

    fn sample() -> Vec<Event> {
        vec![
            event(1, "Techno Tuesday", "club_night", EventStatus::Upcoming),
            event(2, "Jazz Brunch", "concert", EventStatus::Past),
            event(3, "TECHNO marathon", "club_night", EventStatus::Live),
        ]
    }

    fn ids(view: &[&Event]) -> Vec<i64> {
        view.iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_status_filter_selects_exact_match() {
        let items = vec![
            event(1, "A", "concert", EventStatus::Upcoming),
            event(2, "B", "concert", EventStatus::Past),
        ];
        let filters = Filters {
            status: "past".to_string(),
            ..Filters::default()
        };
        assert_eq!(ids(&derived_view(&items, &filters)), vec![2]);
    }

    #[test]
    fn test_search_is_case_insensitive_and_keeps_order() {
        let items = sample();
        let filters = Filters {
            search: "techno".to_string(),
            ..Filters::default()
        };
        assert_eq!(ids(&derived_view(&items, &filters)), vec![1, 3]);
    }

    #[rstest]
    #[case(ALL)]
    #[case("")]
    fn test_wildcards_return_everything(#[case] wildcard: &str) {
        let items = sample();
        let filters = Filters {
            search: String::new(),
            status: wildcard.to_string(),
            category: wildcard.to_string(),
        };
        assert!(filters.is_unfiltered());
        assert_eq!(ids(&derived_view(&items, &filters)), vec![1, 2, 3]);
    }

    #[test]
    fn test_filters_combine() {
        let items = sample();
        let filters = Filters {
            search: "techno".to_string(),
            status: "live".to_string(),
            category: "club_night".to_string(),
        };
        assert_eq!(ids(&derived_view(&items, &filters)), vec![3]);
    }

    #[test]
    fn test_search_looks_at_optional_fields() {
        let mut items = sample();
        items[1].description = Some("Brass quartet on the terrace".to_string());
        let filters = Filters {
            search: "terrace".to_string(),
            ..Filters::default()
        };
        assert_eq!(ids(&derived_view(&items, &filters)), vec![2]);
    }

    #[rstest]
    #[case(1, vec![1, 2], true, false)]
    #[case(2, vec![3, 4], true, true)]
    #[case(3, vec![5], false, true)]
    #[case(4, vec![], false, true)]
    #[case(0, vec![], true, false)]
    fn test_paginate(
        #[case] page: usize,
        #[case] expected: Vec<u32>,
        #[case] has_next: bool,
        #[case] has_prev: bool,
    ) {
        let items = [1, 2, 3, 4, 5];
        let slice = paginate(&items, page, 2);
        assert_eq!(slice.items, expected);
        assert_eq!(slice.total_pages, 3);
        assert_eq!(slice.total_items, 5);
        assert_eq!(slice.has_next(), has_next);
        assert_eq!(slice.has_prev(), has_prev);
    }

    #[test]
    fn test_paginate_empty_input() {
        let slice = paginate::<u32>(&[], 1, 20);
        assert!(slice.items.is_empty());
        assert_eq!(slice.total_pages, 0);
        assert!(!slice.has_next());
        assert!(!slice.has_prev());
    }

    #[test]
    fn test_aggregates_with_empty_input() {
        assert_eq!(sum(Vec::new()), Decimal::ZERO);
        assert_eq!(average(Vec::new()), Decimal::ZERO);
        assert!(percentage(5.0, 0.0).abs() < f64::EPSILON);
        assert!(fill_rate(0, 0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_aggregates() {
        let values = vec![dec("10.00"), dec("20.00"), dec("30.00")];
        assert_eq!(sum(values.clone()), dec("60.00"));
        assert_eq!(average(values), dec("20"));
        assert!((fill_rate(150, 200) - 75.0).abs() < f64::EPSILON);
    }

    proptest! {
        #[test]
        fn prop_derived_view_is_an_ordered_subset(
            statuses in proptest::collection::vec(0u8..4, 0..40),
            pick in 0u8..5,
        ) {
            let all = [EventStatus::Upcoming, EventStatus::Live, EventStatus::Past, EventStatus::Cancelled];
            let items: Vec<Event> = statuses
                .iter()
                .enumerate()
                .map(|(i, s)| event(i64::try_from(i).unwrap(), "Night", "concert", all[usize::from(*s)]))
                .collect();
            let before = items.clone();
            let status = all.get(usize::from(pick)).map_or(ALL, |s| s.as_str());
            let filters = Filters { status: status.to_string(), ..Filters::default() };

            let view = derived_view(&items, &filters);

            prop_assert_eq!(&items, &before);
            prop_assert!(view.windows(2).all(|w| w[0].id < w[1].id));
            prop_assert!(view.iter().all(|e| status == ALL || e.status.as_str() == status));
            let expected = items.iter().filter(|e| status == ALL || e.status.as_str() == status).count();
            prop_assert_eq!(view.len(), expected);
        }

        #[test]
        fn prop_pages_cover_every_item_once(len in 0usize..60, per_page in 1usize..15) {
            let items: Vec<usize> = (0..len).collect();
            let total_pages = paginate(&items, 1, per_page).total_pages;
            let rejoined: Vec<usize> = (1..=total_pages)
                .flat_map(|page| paginate(&items, page, per_page).items)
                .collect();
            prop_assert_eq!(rejoined, items);
        }
    }
}
