//! Business-intelligence aggregates for the dashboard

use crate::derived::{average, fill_rate, sum};
use crate::notify::{Notification, Notifier};
use chrono::NaiveDate;
use nightdesk_client::{ListFilter, ResourceApi};
use nightdesk_core::types::{
    Event, EventStatus, PaymentMethod, TicketType, Transaction, TransactionKind,
    TransactionStatus,
};
use nightdesk_core::{RecordId, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Collections the dashboard is computed from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardData {
    /// Every event
    pub events: Vec<Event>,
    /// Every transaction
    pub transactions: Vec<Transaction>,
}

impl DashboardData {
    /// Fetch events and transactions concurrently
    ///
    /// A failed fetch becomes an error notification and an empty collection;
    /// the other collection is still shown.
    pub async fn load(
        events_api: &dyn ResourceApi<Event>,
        transactions_api: &dyn ResourceApi<Transaction>,
        notifier: &dyn Notifier,
    ) -> Self {
        let filter = ListFilter::new();
        let (events, transactions) =
            tokio::join!(events_api.list(&filter), transactions_api.list(&filter));

        let data = Self {
            events: or_notify(events, "events", notifier),
            transactions: or_notify(transactions, "transactions", notifier),
        };
        info!(
            events = data.events.len(),
            transactions = data.transactions.len(),
            "dashboard loaded"
        );
        data
    }

    /// Headline figures
    #[must_use]
    pub fn summary(&self) -> Summary {
        let sales: Vec<Decimal> = self
            .transactions
            .iter()
            .filter(|t| is_completed(t, TransactionKind::Sale))
            .map(|t| t.amount)
            .collect();
        let (sold, capacity) = self.events.iter().fold((0u32, 0u32), |(s, c), e| {
            (s.saturating_add(e.tickets_sold), c.saturating_add(e.capacity))
        });

        Summary {
            total_events: self.events.len(),
            live_events: self.count_events(EventStatus::Live),
            upcoming_events: self.count_events(EventStatus::Upcoming),
            revenue_total: revenue_total(&self.transactions),
            sales_count: sales.len(),
            average_sale: average(sales),
            overall_fill_rate: fill_rate(sold, capacity),
        }
    }

    fn count_events(&self, status: EventStatus) -> usize {
        self.events.iter().filter(|e| e.status == status).count()
    }
}

fn or_notify<T>(result: Result<Vec<T>>, what: &str, notifier: &dyn Notifier) -> Vec<T> {
    result.unwrap_or_else(|err| {
        warn!(collection = what, error = %err, "dashboard fetch failed");
        notifier.notify(Notification::error(format!(
            "Could not load {what}: {}",
            err.user_message()
        )));
        Vec::new()
    })
}

/// Headline dashboard figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Number of events
    pub total_events: usize,
    /// Events currently running
    pub live_events: usize,
    /// Events still ahead
    pub upcoming_events: usize,
    /// Completed sales minus completed refunds
    pub revenue_total: Decimal,
    /// Number of completed sales
    pub sales_count: usize,
    /// Mean completed sale, zero when there are none
    pub average_sale: Decimal,
    /// Tickets sold over capacity across all events, as a percentage
    pub overall_fill_rate: f64,
}

fn is_completed(t: &Transaction, kind: TransactionKind) -> bool {
    t.kind == kind && t.status == TransactionStatus::Completed
}

/// Contribution of a transaction to revenue: sales add, refunds subtract
fn revenue_effect(t: &Transaction) -> Option<Decimal> {
    if t.status != TransactionStatus::Completed {
        return None;
    }
    match t.kind {
        TransactionKind::Sale => Some(t.amount),
        TransactionKind::Refund => Some(-t.amount),
        TransactionKind::TopUp => None,
    }
}

/// Completed sales minus completed refunds
#[must_use]
pub fn revenue_total(transactions: &[Transaction]) -> Decimal {
    sum(transactions.iter().filter_map(revenue_effect))
}

/// Completed top-ups plus refunds, minus sales
#[must_use]
pub fn wallet_balance(transactions: &[Transaction]) -> Decimal {
    sum(transactions
        .iter()
        .filter(|t| t.status == TransactionStatus::Completed)
        .map(|t| match t.kind {
            TransactionKind::TopUp | TransactionKind::Refund => t.amount,
            TransactionKind::Sale => -t.amount,
        }))
}

/// Revenue of one calendar day (UTC)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyRevenue {
    /// Day
    pub date: NaiveDate,
    /// Net revenue
    pub total: Decimal,
    /// Transactions counted
    pub transactions: usize,
}

/// Net revenue per UTC day, newest first
#[must_use]
pub fn daily_revenue(transactions: &[Transaction]) -> Vec<DailyRevenue> {
    let mut days: BTreeMap<NaiveDate, (Decimal, usize)> = BTreeMap::new();
    for t in transactions {
        if let Some(effect) = revenue_effect(t) {
            let day = days.entry(t.created_at.date_naive()).or_default();
            day.0 += effect;
            day.1 += 1;
        }
    }
    days.into_iter()
        .rev()
        .map(|(date, (total, transactions))| DailyRevenue {
            date,
            total,
            transactions,
        })
        .collect()
}

/// Revenue attributed to one payment method
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodRevenue {
    /// Payment method, `None` for transactions without one
    pub payment_method_id: Option<RecordId>,
    /// Display label
    pub label: String,
    /// Net revenue
    pub total: Decimal,
}

/// Net revenue per payment method, largest first
#[must_use]
pub fn revenue_by_payment_method(
    transactions: &[Transaction],
    methods: &[PaymentMethod],
) -> Vec<MethodRevenue> {
    let mut totals: BTreeMap<Option<RecordId>, Decimal> = BTreeMap::new();
    for t in transactions {
        if let Some(effect) = revenue_effect(t) {
            *totals.entry(t.payment_method_id).or_default() += effect;
        }
    }

    let mut rows: Vec<MethodRevenue> = totals
        .into_iter()
        .map(|(id, total)| {
            let label = match id {
                None => "Unassigned".to_string(),
                Some(id) => methods
                    .iter()
                    .find(|m| m.id == id)
                    .map_or_else(|| format!("Method #{id}"), |m| m.label.clone()),
            };
            MethodRevenue {
                payment_method_id: id,
                label,
                total,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total));
    rows
}

/// How full one event is
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventFill {
    /// Event
    pub event_id: RecordId,
    /// Event name
    pub name: String,
    /// Tickets sold
    pub sold: u32,
    /// Capacity
    pub capacity: u32,
    /// Sold over capacity, as a percentage
    pub rate: f64,
}

/// Fill rate of every event, in input order
#[must_use]
pub fn event_fill_rates(events: &[Event]) -> Vec<EventFill> {
    events
        .iter()
        .map(|e| EventFill {
            event_id: e.id,
            name: e.name.clone(),
            sold: e.tickets_sold,
            capacity: e.capacity,
            rate: fill_rate(e.tickets_sold, e.capacity),
        })
        .collect()
}

/// The `limit` fullest events; ties keep input order
#[must_use]
pub fn top_events_by_fill(events: &[Event], limit: usize) -> Vec<EventFill> {
    let mut rates = event_fill_rates(events);
    rates.sort_by(|a, b| b.rate.total_cmp(&a.rate));
    rates.truncate(limit);
    rates
}

/// Gross sales of one ticket type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketTypeRevenue {
    /// Ticket type
    pub ticket_type_id: RecordId,
    /// Event the type belongs to
    pub event_id: RecordId,
    /// Ticket type name
    pub name: String,
    /// Tickets sold
    pub sold: u32,
    /// Price times tickets sold
    pub revenue: Decimal,
}

/// Gross revenue per ticket type, largest first
#[must_use]
pub fn ticket_type_revenue(ticket_types: &[TicketType]) -> Vec<TicketTypeRevenue> {
    let mut rows: Vec<TicketTypeRevenue> = ticket_types
        .iter()
        .map(|t| TicketTypeRevenue {
            ticket_type_id: t.id,
            event_id: t.event_id,
            name: t.name.clone(),
            sold: t.sold,
            revenue: t.price * Decimal::from(t.sold),
        })
        .collect();
    rows.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn tx(
        id: RecordId,
        kind: TransactionKind,
        status: TransactionStatus,
        amount: &str,
        day: u32,
        method: Option<RecordId>,
    ) -> Transaction {
        Transaction {
            id,
            amount: dec(amount),
            kind,
            status,
            payment_method_id: method,
            device_id: None,
            employee_id: None,
            description: format!("tx {id}"),
            created_at: Utc.with_ymd_and_hms(2026, 3, day, 23, 30, 0).unwrap(),
        }
    }

    fn ledger() -> Vec<Transaction> {
        use TransactionKind::{Refund, Sale, TopUp};
        use TransactionStatus::{Completed, Failed, Pending};
        vec![
            tx(1, Sale, Completed, "40.00", 1, Some(1)),
            tx(2, Sale, Completed, "60.00", 2, Some(2)),
            tx(3, Refund, Completed, "15.00", 2, Some(1)),
            tx(4, TopUp, Completed, "100.00", 2, None),
            tx(5, Sale, Pending, "999.00", 2, Some(1)),
            tx(6, Sale, Failed, "500.00", 3, None),
        ]
    }

    #[test]
    fn test_revenue_total_ignores_unsettled_and_top_ups() {
        assert_eq!(revenue_total(&ledger()), dec("85.00"));
        assert_eq!(revenue_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_wallet_balance() {
        // 100 top-up + 15 refund - 40 - 60 sales
        assert_eq!(wallet_balance(&ledger()), dec("15.00"));
    }

    #[test]
    fn test_daily_revenue_newest_first() {
        let days = daily_revenue(&ledger());
        assert_eq!(
            days,
            vec![
                DailyRevenue {
                    date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                    total: dec("45.00"),
                    transactions: 2,
                },
                DailyRevenue {
                    date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                    total: dec("40.00"),
                    transactions: 1,
                },
            ]
        );
    }

    #[test]
    fn test_revenue_by_payment_method() {
        let methods = vec![PaymentMethod {
            id: 2,
            label: "Card reader".to_string(),
            kind: nightdesk_core::types::PaymentKind::Card,
            last_four: None,
            is_default: true,
        }];

        let rows = revenue_by_payment_method(&ledger(), &methods);

        let labels: Vec<(&str, Decimal)> =
            rows.iter().map(|r| (r.label.as_str(), r.total)).collect();
        assert_eq!(
            labels,
            vec![("Card reader", dec("60.00")), ("Method #1", dec("25.00"))]
        );
    }

    fn event(id: RecordId, name: &str, sold: u32, capacity: u32) -> Event {
        Event {
            id,
            name: name.to_string(),
            description: None,
            venue: "Warehouse".to_string(),
            category: "club_night".to_string(),
            status: EventStatus::Upcoming,
            starts_at: Utc.with_ymd_and_hms(2026, 4, 1, 22, 0, 0).unwrap(),
            ends_at: None,
            capacity,
            tickets_sold: sold,
        }
    }

    #[test]
    fn test_top_events_by_fill() {
        let events = vec![
            event(1, "Half", 50, 100),
            event(2, "Empty venue", 0, 0),
            event(3, "Sold out", 200, 200),
            event(4, "Also half", 10, 20),
        ];

        let top = top_events_by_fill(&events, 3);
        let names: Vec<&str> = top.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Sold out", "Half", "Also half"]);
        assert!(event_fill_rates(&events)[1].rate.abs() < f64::EPSILON);
    }

    #[test]
    fn test_ticket_type_revenue() {
        let types = vec![
            TicketType {
                id: 1,
                event_id: 9,
                name: "GA".to_string(),
                price: dec("20.00"),
                quantity: 500,
                sold: 120,
                active: true,
            },
            TicketType {
                id: 2,
                event_id: 9,
                name: "VIP".to_string(),
                price: dec("80.00"),
                quantity: 50,
                sold: 40,
                active: true,
            },
        ];

        let rows = ticket_type_revenue(&types);
        assert_eq!(rows[0].name, "VIP");
        assert_eq!(rows[0].revenue, dec("3200.00"));
        assert_eq!(rows[1].revenue, dec("2400.00"));
    }

    #[test]
    fn test_summary_of_empty_data() {
        let summary = DashboardData::default().summary();
        assert_eq!(summary.total_events, 0);
        assert_eq!(summary.average_sale, Decimal::ZERO);
        assert!(summary.overall_fill_rate.abs() < f64::EPSILON);
    }
}
