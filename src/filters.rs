//! Filter/sort engine.
//!
//! `visible_orders` is a pure function of its inputs: it never mutates
//! lifecycle state and produces a subset of the given orders in the
//! requested display order. An empty result is a valid outcome the
//! caller renders as an empty state, not an error.

use crate::model::{Order, OrderStatus, OrderType, Priority};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    TimeAscending,
    TimeDescending,
    /// High before normal before low; elapsed ascending as tie-break.
    Priority,
}

#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    pub status: StatusFilter,
    pub order_type: Option<OrderType>,
    pub priority: Option<Priority>,
    /// Case-insensitive substring over id, table label, item names and
    /// item notes. Empty matches everything.
    pub search: String,
    pub sort: SortKey,
}

/// Derive the visible subset and ordering for the current criteria.
pub fn visible_orders(orders: &[Order], criteria: &FilterCriteria) -> Vec<Order> {
    let needle = criteria.search.trim().to_lowercase();

    let mut visible: Vec<Order> = orders
        .iter()
        .filter(|o| match criteria.status {
            StatusFilter::All => true,
            StatusFilter::Only(status) => o.status == status,
        })
        .filter(|o| criteria.order_type.map_or(true, |t| o.order_type == t))
        .filter(|o| criteria.priority.map_or(true, |p| o.priority == p))
        .filter(|o| needle.is_empty() || search_haystack(o).contains(&needle))
        .cloned()
        .collect();

    match criteria.sort {
        SortKey::TimeAscending => visible.sort_by_key(|o| o.elapsed_minutes),
        SortKey::TimeDescending => {
            visible.sort_by(|a, b| b.elapsed_minutes.cmp(&a.elapsed_minutes))
        }
        SortKey::Priority => {
            visible.sort_by_key(|o| (o.priority.rank(), o.elapsed_minutes));
        }
    }

    visible
}

fn search_haystack(order: &Order) -> String {
    let mut haystack = String::with_capacity(64);
    haystack.push_str(&order.id);
    if let Some(table) = &order.table_label {
        haystack.push(' ');
        haystack.push_str(table);
    }
    for item in &order.items {
        haystack.push(' ');
        haystack.push_str(&item.name);
        if let Some(note) = &item.note {
            haystack.push(' ');
            haystack.push_str(note);
        }
    }
    haystack.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OrderItem;

    fn order(id: &str, status: OrderStatus, priority: Priority, elapsed: u32) -> Order {
        let mut o = Order::new(id, OrderType::DineIn);
        o.status = status;
        o.priority = priority;
        o.elapsed_minutes = elapsed;
        o
    }

    fn board() -> Vec<Order> {
        let mut souvlaki = order("10", OrderStatus::Pending, Priority::Normal, 5);
        souvlaki.items.push(OrderItem {
            quantity: "2".into(),
            name: "Souvlaki".into(),
            note: Some("extra sauce".into()),
        });
        souvlaki.table_label = Some("07".into());
        vec![
            souvlaki,
            order("11", OrderStatus::Preparing, Priority::High, 12),
            order("12", OrderStatus::Ready, Priority::Low, 3),
            order("13", OrderStatus::Pending, Priority::High, 9),
        ]
    }

    #[test]
    fn all_filter_passes_everything() {
        let orders = board();
        let visible = visible_orders(&orders, &FilterCriteria::default());
        assert_eq!(visible.len(), orders.len());
    }

    #[test]
    fn status_filter_is_exact_match() {
        let orders = board();
        let criteria = FilterCriteria {
            status: StatusFilter::Only(OrderStatus::Pending),
            ..Default::default()
        };
        let visible = visible_orders(&orders, &criteria);
        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|o| o.status == OrderStatus::Pending));
    }

    #[test]
    fn search_matches_item_names_and_table_case_insensitively() {
        let orders = board();
        let by_item = visible_orders(
            &orders,
            &FilterCriteria {
                search: "SOUVLAKI".into(),
                ..Default::default()
            },
        );
        assert_eq!(by_item.len(), 1);
        assert_eq!(by_item[0].id, "10");

        let by_note = visible_orders(
            &orders,
            &FilterCriteria {
                search: "extra sauce".into(),
                ..Default::default()
            },
        );
        assert_eq!(by_note.len(), 1);

        let none = visible_orders(
            &orders,
            &FilterCriteria {
                search: "pizza".into(),
                ..Default::default()
            },
        );
        assert!(none.is_empty());
    }

    #[test]
    fn time_sorts_are_mirrors() {
        let orders = board();
        let asc = visible_orders(
            &orders,
            &FilterCriteria {
                sort: SortKey::TimeAscending,
                ..Default::default()
            },
        );
        let desc = visible_orders(
            &orders,
            &FilterCriteria {
                sort: SortKey::TimeDescending,
                ..Default::default()
            },
        );
        let asc_ids: Vec<&str> = asc.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(asc_ids, vec!["12", "10", "13", "11"]);
        let mut reversed: Vec<&str> = desc.iter().map(|o| o.id.as_str()).collect();
        reversed.reverse();
        assert_eq!(asc_ids, reversed);
    }

    #[test]
    fn priority_sort_breaks_ties_by_elapsed() {
        let orders = board();
        let visible = visible_orders(
            &orders,
            &FilterCriteria {
                sort: SortKey::Priority,
                ..Default::default()
            },
        );
        let ids: Vec<&str> = visible.iter().map(|o| o.id.as_str()).collect();
        // High(9) before High(12), then normal, then low.
        assert_eq!(ids, vec!["13", "11", "10", "12"]);
    }

    #[test]
    fn engine_is_pure_and_idempotent() {
        let orders = board();
        let criteria = FilterCriteria {
            status: StatusFilter::Only(OrderStatus::Pending),
            search: "souvlaki".into(),
            sort: SortKey::Priority,
            ..Default::default()
        };
        let first = visible_orders(&orders, &criteria);
        let second = visible_orders(&orders, &criteria);
        assert_eq!(first, second);
        // Output is a subset of the input, no extraneous entries.
        for o in &first {
            assert!(orders.iter().any(|src| src == o));
        }
    }
}
