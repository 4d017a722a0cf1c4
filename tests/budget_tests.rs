// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDateTime;
use pursebook::commands::budgets::{self, NewBudget};
use pursebook::commands::transactions::{self, NewTransaction};
use pursebook::{cli, db};
use pursebook::errors::LedgerError;
use pursebook::models::{Period, TransactionType};
use pursebook::utils::parse_datetime;
use rusqlite::Connection;
use rust_decimal_macros::dec;

fn ts(s: &str) -> NaiveDateTime {
    parse_datetime(s).unwrap()
}

fn setup() -> Connection {
    db::open_in_memory().unwrap()
}

fn add_tx(conn: &Connection, kind: TransactionType, amount: rust_decimal::Decimal, cat: &str, date: &str) {
    transactions::insert(conn, &NewTransaction::new(kind, amount, cat, ts(date))).unwrap();
}

fn food_budget(amount: rust_decimal::Decimal) -> NewBudget {
    NewBudget {
        category: Some("Food".into()),
        amount,
        period: Period::Monthly,
        start_date: ts("2024-03-01"),
        end_date: Some(ts("2024-03-31T23:59:59")),
    }
}

#[test]
fn usage_counts_matching_expenses_only() {
    let conn = setup();
    budgets::insert(&conn, &food_budget(dec!(1500))).unwrap();
    add_tx(&conn, TransactionType::Expense, dec!(700), "Food", "2024-03-05");
    add_tx(&conn, TransactionType::Expense, dec!(500), "Food", "2024-03-31T23:59:59");
    // outside the window, other category, income
    add_tx(&conn, TransactionType::Expense, dec!(90), "Food", "2024-04-01");
    add_tx(&conn, TransactionType::Expense, dec!(40), "Transport", "2024-03-10");
    add_tx(&conn, TransactionType::Income, dec!(3000), "Food", "2024-03-10");

    let usage = budgets::usage(&conn).unwrap();
    assert_eq!(usage.len(), 1);
    let u = &usage[0];
    assert_eq!(u.used_amount, dec!(1200));
    assert_eq!(u.remaining_amount, dec!(300));
    assert_eq!(u.usage_percentage, dec!(0.8));
    assert!(u.is_near_limit());
    assert!(!u.is_over_budget());
}

#[test]
fn total_budget_spans_all_categories() {
    let conn = setup();
    budgets::insert(
        &conn,
        &NewBudget {
            category: None,
            ..food_budget(dec!(100))
        },
    )
    .unwrap();
    add_tx(&conn, TransactionType::Expense, dec!(60), "Food", "2024-03-02");
    add_tx(&conn, TransactionType::Expense, dec!(55), "Transport", "2024-03-03");

    let usage = budgets::usage(&conn).unwrap();
    assert_eq!(usage[0].used_amount, dec!(115));
    assert_eq!(usage[0].remaining_amount, dec!(-15));
    assert!(usage[0].is_over_budget());
    assert_eq!(usage[0].budget.label(), "Total budget");
}

#[test]
fn inactive_budgets_are_skipped() {
    let conn = setup();
    let id = budgets::insert(&conn, &food_budget(dec!(100))).unwrap();
    budgets::set_active(&conn, id, false).unwrap();
    assert!(budgets::usage(&conn).unwrap().is_empty());
    assert_eq!(budgets::active_count(&conn).unwrap(), 0);
    assert_eq!(budgets::list(&conn, false).unwrap().len(), 1);
}

#[test]
fn zero_amount_budget_reports_zero_percentage() {
    let conn = setup();
    budgets::insert(&conn, &food_budget(dec!(0))).unwrap();
    add_tx(&conn, TransactionType::Expense, dec!(25), "Food", "2024-03-02");
    let usage = budgets::usage(&conn).unwrap();
    assert_eq!(usage[0].usage_percentage, dec!(0));
    assert!(usage[0].is_over_budget());
}

#[test]
fn alerts_cover_near_and_over_budgets() {
    let conn = setup();
    budgets::insert(&conn, &food_budget(dec!(100))).unwrap();
    budgets::insert(
        &conn,
        &NewBudget {
            category: Some("Transport".into()),
            ..food_budget(dec!(100))
        },
    )
    .unwrap();
    budgets::insert(
        &conn,
        &NewBudget {
            category: Some("Shopping".into()),
            ..food_budget(dec!(100))
        },
    )
    .unwrap();
    add_tx(&conn, TransactionType::Expense, dec!(85), "Food", "2024-03-02");
    add_tx(&conn, TransactionType::Expense, dec!(130), "Transport", "2024-03-02");
    add_tx(&conn, TransactionType::Expense, dec!(10), "Shopping", "2024-03-02");

    let alerts = budgets::alerts(&conn).unwrap();
    assert_eq!(alerts.len(), 2);
    let messages: Vec<&str> = alerts.iter().map(|a| a.message.as_str()).collect();
    assert!(messages.contains(&"Transport is over budget by 30.00"));
    assert!(messages.contains(&"Food has used 85.0% of its budget"));
}

#[test]
fn end_before_start_is_rejected() {
    let conn = setup();
    let err = budgets::insert(
        &conn,
        &NewBudget {
            end_date: Some(ts("2024-02-01")),
            ..food_budget(dec!(10))
        },
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::InvalidDateRange { .. })
    ));
    assert!(budgets::list(&conn, false).unwrap().is_empty());
}

#[test]
fn end_date_derived_from_period() {
    let conn = setup();
    let id = budgets::insert(
        &conn,
        &NewBudget {
            category: None,
            amount: dec!(500),
            period: Period::Monthly,
            start_date: ts("2024-02-10"),
            end_date: None,
        },
    )
    .unwrap();
    let b = budgets::get(&conn, id).unwrap().unwrap();
    assert_eq!(b.end_date, ts("2024-02-29T23:59:59"));
    assert_eq!(budgets::total_budget(&conn).unwrap().map(|b| b.id), Some(id));
    assert_eq!(budgets::covering(&conn, ts("2024-02-20")).unwrap().len(), 1);
    assert!(budgets::covering(&conn, ts("2024-03-01")).unwrap().is_empty());
}

#[test]
fn negative_amount_is_rejected() {
    let conn = setup();
    let err = budgets::insert(&conn, &food_budget(dec!(-1))).unwrap_err();
    assert_eq!(
        err.downcast_ref::<LedgerError>(),
        Some(&LedgerError::InvalidAmount(dec!(-1)))
    );
}

#[test]
fn tiny_budget_against_large_spend_reports_overflow() {
    let conn = setup();
    budgets::insert(&conn, &food_budget(dec!(0.0000000000000000000000000001))).unwrap();
    add_tx(&conn, TransactionType::Expense, dec!(1000), "Food", "2024-03-05");
    let err = budgets::usage(&conn).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::Overflow(_))
    ));
    assert!(budgets::alerts(&conn).is_err());
}

#[test]
fn set_requires_a_change_and_an_existing_budget() {
    let conn = setup();
    assert!(
        cli::build_cli()
            .try_get_matches_from(["pursebook", "budget", "set", "1"])
            .is_err()
    );

    let matches =
        cli::build_cli().get_matches_from(["pursebook", "budget", "set", "42", "--amount", "10"]);
    let (_, budget_m) = matches.subcommand().unwrap();
    let err = budgets::handle(&conn, budget_m).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::NotFound { entity: "Budget", .. })
    ));

    let id = budgets::insert(&conn, &food_budget(dec!(100))).unwrap();
    let id_arg = id.to_string();
    let matches = cli::build_cli().get_matches_from([
        "pursebook", "budget", "set", id_arg.as_str(), "--end", "2024-03-15",
    ]);
    let (_, budget_m) = matches.subcommand().unwrap();
    budgets::handle(&conn, budget_m).unwrap();
    let b = budgets::get(&conn, id).unwrap().unwrap();
    assert_eq!(b.end_date, ts("2024-03-15T23:59:59"));
    assert_eq!(b.amount, dec!(100));
}
