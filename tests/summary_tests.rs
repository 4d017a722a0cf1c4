// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pursebook::commands::{categories, reports};
use pursebook::commands::transactions::{self, NewTransaction};
use pursebook::db;
use pursebook::errors::LedgerError;
use pursebook::models::{TransactionType, YearMonth};
use pursebook::utils::parse_datetime;
use pursebook::watch::{ChangeTracker, MonthlySummaryView};
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn add(conn: &Connection, kind: TransactionType, amount: Decimal, cat: &str, date: &str) -> i64 {
    transactions::insert(
        conn,
        &NewTransaction::new(kind, amount, cat, parse_datetime(date).unwrap()),
    )
    .unwrap()
}

fn march() -> YearMonth {
    YearMonth::new(2024, 3).unwrap()
}

#[test]
fn summary_balances_and_groups() {
    let conn = db::open_in_memory().unwrap();
    add(&conn, TransactionType::Income, dec!(5000), "Salary", "2024-03-01");
    add(&conn, TransactionType::Income, dec!(300), "Bonus", "2024-03-31T23:59:59");
    add(&conn, TransactionType::Expense, dec!(120.50), "Food", "2024-03-02");
    add(&conn, TransactionType::Expense, dec!(79.50), "Food", "2024-03-20");
    add(&conn, TransactionType::Expense, dec!(1500), "Housing", "2024-03-05");
    // neighbouring months stay out
    add(&conn, TransactionType::Expense, dec!(999), "Food", "2024-02-29T23:59:59");
    add(&conn, TransactionType::Income, dec!(999), "Salary", "2024-04-01");

    let s = reports::monthly_summary(&conn, march()).unwrap();
    assert_eq!(s.income, dec!(5300));
    assert_eq!(s.expense, dec!(1700));
    assert_eq!(s.balance, s.income - s.expense);
    assert_eq!(s.expense_categories.len(), 2);
    assert_eq!(s.expense_categories[0].category, "Housing");
    assert_eq!(s.expense_categories[1].total, dec!(200));
    assert_eq!(s.income_categories[0].category, "Salary");

    let (start, end) = march().range();
    assert_eq!(
        transactions::total_by_type_and_range(&conn, TransactionType::Expense, start, end).unwrap(),
        dec!(1700)
    );
}

#[test]
fn empty_month_is_all_zero() {
    let conn = db::open_in_memory().unwrap();
    let s = reports::monthly_summary(&conn, march()).unwrap();
    assert_eq!(s.income, Decimal::ZERO);
    assert_eq!(s.expense, Decimal::ZERO);
    assert_eq!(s.balance, Decimal::ZERO);
    assert!(s.expense_categories.is_empty());
    assert!(s.income_categories.is_empty());
}

#[test]
fn summary_serializes_month_as_string() {
    let conn = db::open_in_memory().unwrap();
    add(&conn, TransactionType::Expense, dec!(10), "Food", "2024-03-02");
    let s = reports::monthly_summary(&conn, march()).unwrap();
    let v = serde_json::to_value(&s).unwrap();
    assert_eq!(v["month"], "2024-03");
    assert!(v.get("expenseCategories").is_some());
}

#[test]
fn view_recomputes_only_after_changes() {
    let conn = db::open_in_memory().unwrap();
    let tracker = ChangeTracker::attach(&conn);
    let mut view = MonthlySummaryView::new(tracker.clone(), march());

    assert_eq!(view.current(&conn).unwrap().expense, Decimal::ZERO);
    view.current(&conn).unwrap();
    assert_eq!(view.recomputes(), 1);

    let id = add(&conn, TransactionType::Expense, dec!(42), "Food", "2024-03-09");
    assert!(tracker.generation() > 0);
    assert_eq!(view.current(&conn).unwrap().expense, dec!(42));
    assert_eq!(view.recomputes(), 2);

    transactions::delete(&conn, id).unwrap();
    assert_eq!(view.current(&conn).unwrap().expense, Decimal::ZERO);
    assert_eq!(view.recomputes(), 3);

    view.set_month(march());
    view.current(&conn).unwrap();
    assert_eq!(view.recomputes(), 3);

    view.set_month(march().succ());
    assert_eq!(view.month().to_string(), "2024-04");
    view.current(&conn).unwrap();
    assert_eq!(view.recomputes(), 4);
}

#[test]
fn oversized_amounts_fail_instead_of_panicking() {
    let conn = db::open_in_memory().unwrap();
    add(&conn, TransactionType::Expense, Decimal::MAX, "Food", "2024-03-02");
    add(&conn, TransactionType::Expense, Decimal::MAX, "Food", "2024-03-03");

    let err = reports::monthly_summary(&conn, march()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::Overflow(_))
    ));
    let (start, end) = march().range();
    assert!(transactions::total_by_type_and_range(&conn, TransactionType::Expense, start, end).is_err());
    assert!(transactions::category_totals(&conn, TransactionType::Expense, start, end).is_err());
    assert!(categories::with_stats(&conn, TransactionType::Expense).is_err());

    // other months are unaffected
    let s = reports::monthly_summary(&conn, march().succ()).unwrap();
    assert_eq!(s.expense, Decimal::ZERO);
}
