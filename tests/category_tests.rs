// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pursebook::commands::categories::{self, NewCategory};
use pursebook::commands::transactions::{self, NewTransaction};
use pursebook::db;
use pursebook::errors::LedgerError;
use pursebook::models::TransactionType;
use pursebook::utils::parse_datetime;
use rust_decimal_macros::dec;

#[test]
fn defaults_are_seeded_per_type() {
    let conn = db::open_in_memory().unwrap();
    assert_eq!(categories::count_by_type(&conn, TransactionType::Expense).unwrap(), 8);
    assert_eq!(categories::count_by_type(&conn, TransactionType::Income).unwrap(), 5);
    assert_eq!(categories::list_defaults(&conn).unwrap().len(), 13);
    let expense = categories::list(&conn, Some(TransactionType::Expense), true).unwrap();
    assert_eq!(expense[0].name, "Food");
    assert!(expense.iter().all(|c| c.is_default && c.is_active));
}

#[test]
fn duplicate_name_and_type_is_rejected() {
    let conn = db::open_in_memory().unwrap();
    let err = categories::insert(&conn, &NewCategory::new("Food", TransactionType::Expense))
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<LedgerError>(),
        Some(&LedgerError::DuplicateCategory {
            name: "Food".into(),
            kind: TransactionType::Expense,
        })
    );
    // same name under the other type is fine
    let id = categories::insert(&conn, &NewCategory::new("Food", TransactionType::Income)).unwrap();
    let cat = categories::get(&conn, id).unwrap().unwrap();
    assert!(!cat.is_default);
    assert_eq!(cat.sort_order, 6);
}

#[test]
fn search_and_disable() {
    let conn = db::open_in_memory().unwrap();
    let hits = categories::search(&conn, "port", TransactionType::Expense).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Transport");

    categories::set_active(&conn, hits[0].id, false).unwrap();
    let active = categories::list(&conn, Some(TransactionType::Expense), true).unwrap();
    assert_eq!(active.len(), 7);
    assert!(active.iter().all(|c| c.name != "Transport"));
    assert!(categories::set_active(&conn, 9999, true).is_err());
}

#[test]
fn delete_cascades_only_when_asked() {
    let mut conn = db::open_in_memory().unwrap();
    let date = parse_datetime("2024-05-02").unwrap();
    for cat in ["Food", "Food", "Housing"] {
        transactions::insert(
            &conn,
            &NewTransaction::new(TransactionType::Expense, dec!(10), cat, date),
        )
        .unwrap();
    }
    // income transaction with the same category name survives
    transactions::insert(
        &conn,
        &NewTransaction::new(TransactionType::Income, dec!(10), "Other", date),
    )
    .unwrap();

    let housing = categories::find(&conn, "Housing", TransactionType::Expense)
        .unwrap()
        .unwrap();
    assert_eq!(categories::delete(&mut conn, housing.id, false).unwrap(), 0);
    assert!(categories::get(&conn, housing.id).unwrap().is_none());

    let food = categories::find(&conn, "Food", TransactionType::Expense)
        .unwrap()
        .unwrap();
    assert_eq!(categories::delete(&mut conn, food.id, true).unwrap(), 2);

    let other = categories::find(&conn, "Other", TransactionType::Expense)
        .unwrap()
        .unwrap();
    assert_eq!(categories::delete(&mut conn, other.id, true).unwrap(), 0);
    assert_eq!(transactions::list(&conn, &Default::default()).unwrap().len(), 2);
}

#[test]
fn stats_sum_per_category() {
    let conn = db::open_in_memory().unwrap();
    let rows = [
        ("Food", dec!(12.5), "2024-05-01"),
        ("Food", dec!(7.5), "2024-05-09"),
        ("Transport", dec!(30), "2024-05-03"),
    ];
    for (cat, amount, date) in rows {
        transactions::insert(
            &conn,
            &NewTransaction::new(
                TransactionType::Expense,
                amount,
                cat,
                parse_datetime(date).unwrap(),
            ),
        )
        .unwrap();
    }
    let stats = categories::with_stats(&conn, TransactionType::Expense).unwrap();
    assert_eq!(stats.len(), 8);
    assert_eq!(stats[0].category.name, "Transport");
    assert_eq!(stats[1].category.name, "Food");
    assert_eq!(stats[1].total_amount, dec!(20));
    assert_eq!(stats[1].transaction_count, 2);
    assert_eq!(stats[1].last_used, Some(parse_datetime("2024-05-09").unwrap()));
    assert_eq!(stats[7].transaction_count, 0);
    assert_eq!(stats[7].last_used, None);
}
