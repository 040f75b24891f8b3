//! Shared fixtures for console integration tests

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use nightdesk_core::RecordId;
use nightdesk_core::types::{
    Event, EventStatus, PaymentKind, PaymentMethod, Transaction, TransactionKind,
    TransactionStatus,
};
use rust_decimal::Decimal;
use std::sync::Once;

static INIT: Once = Once::new();

/// Route tracing output through the test harness once per binary
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}

/// Fixed reference instant so date grouping is deterministic
pub fn opening_night() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 22, 0, 0).unwrap()
}

pub fn money(text: &str) -> Decimal {
    text.parse().unwrap()
}

pub fn event(id: RecordId, name: &str, status: EventStatus) -> Event {
    Event {
        id,
        name: name.to_string(),
        description: None,
        venue: "Warehouse".to_string(),
        category: "club_night".to_string(),
        status,
        starts_at: opening_night() + Duration::days(id),
        ends_at: None,
        capacity: 200,
        tickets_sold: 50,
    }
}

pub fn sale(id: RecordId, amount: &str, days_after: i64) -> Transaction {
    Transaction {
        id,
        amount: money(amount),
        kind: TransactionKind::Sale,
        status: TransactionStatus::Completed,
        payment_method_id: Some(1),
        device_id: Some(12),
        employee_id: Some(3),
        description: format!("Bar tab {id}"),
        created_at: opening_night() + Duration::days(days_after),
    }
}

pub fn card(id: RecordId, label: &str) -> PaymentMethod {
    PaymentMethod {
        id,
        label: label.to_string(),
        kind: PaymentKind::Card,
        last_four: Some("4242".to_string()),
        is_default: id == 1,
    }
}
