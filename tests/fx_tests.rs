// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pursebook::commands::currencies::{self, NewCurrency};
use pursebook::{cli, db};
use pursebook::errors::LedgerError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn close(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < dec!(0.0001)
}

#[test]
fn same_currency_is_identity() {
    let conn = db::open_in_memory().unwrap();
    assert_eq!(
        currencies::convert(&conn, dec!(123.45), "USD", "usd").unwrap(),
        dec!(123.45)
    );
}

#[test]
fn converts_through_base_rates() {
    let conn = db::open_in_memory().unwrap();
    assert_eq!(
        currencies::convert(&conn, dec!(100), "CNY", "USD").unwrap(),
        dec!(14)
    );
    assert!(close(
        currencies::convert(&conn, dec!(14), "USD", "JPY").unwrap(),
        dec!(2050)
    ));
    let there = currencies::convert(&conn, dec!(250), "EUR", "KRW").unwrap();
    let back = currencies::convert(&conn, there, "KRW", "EUR").unwrap();
    assert!(close(back, dec!(250)));
}

#[test]
fn unknown_code_is_not_found() {
    let conn = db::open_in_memory().unwrap();
    let err = currencies::convert(&conn, dec!(1), "CNY", "XYZ").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::NotFound { entity: "Currency", .. })
    ));
}

#[test]
fn set_base_keeps_single_base_and_rescales() {
    let mut conn = db::open_in_memory().unwrap();
    let before = currencies::convert(&conn, dec!(100), "EUR", "GBP").unwrap();

    currencies::set_base(&mut conn, "usd").unwrap();

    let all = currencies::list(&conn, false).unwrap();
    let bases: Vec<_> = all.iter().filter(|c| c.is_base).collect();
    assert_eq!(bases.len(), 1);
    assert_eq!(bases[0].code, "USD");
    assert_eq!(bases[0].exchange_rate, Decimal::ONE);
    let after = currencies::convert(&conn, dec!(100), "EUR", "GBP").unwrap();
    assert!(close(before, after));
    assert!(close(
        currencies::convert(&conn, dec!(100), "CNY", "USD").unwrap(),
        dec!(14)
    ));
}

#[test]
fn base_currency_cannot_be_removed() {
    let conn = db::open_in_memory().unwrap();
    let err = currencies::delete(&conn, "CNY").unwrap_err();
    assert_eq!(
        err.downcast_ref::<LedgerError>(),
        Some(&LedgerError::BaseCurrencyLocked("CNY".into()))
    );
    currencies::delete(&conn, "KRW").unwrap();
    assert!(currencies::by_code(&conn, "KRW").unwrap().is_none());
}

#[test]
fn non_positive_rates_are_rejected() {
    let conn = db::open_in_memory().unwrap();
    let err = currencies::insert(
        &conn,
        &NewCurrency {
            code: "chf".into(),
            name: "Swiss Franc".into(),
            symbol: "Fr".into(),
            exchange_rate: Decimal::ZERO,
            sort_order: None,
        },
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::InvalidRate { .. })
    ));
    assert!(currencies::update_rate(&conn, "USD", dec!(-0.5)).is_err());
    assert_eq!(
        currencies::by_code(&conn, "USD").unwrap().unwrap().exchange_rate,
        dec!(0.14)
    );
}

#[test]
fn added_currency_is_uppercased_and_formatted() {
    let conn = db::open_in_memory().unwrap();
    currencies::insert(
        &conn,
        &NewCurrency {
            code: "chf".into(),
            name: "Swiss Franc".into(),
            symbol: "Fr".into(),
            exchange_rate: dec!(0.12),
            sort_order: None,
        },
    )
    .unwrap();
    let chf = currencies::by_code(&conn, "CHF").unwrap().unwrap();
    assert!(!chf.is_base);
    assert_eq!(chf.format_amount(dec!(12.5)), "Fr12.50");
    assert_eq!(currencies::list(&conn, true).unwrap().len(), 8);
}

#[test]
fn conversion_out_of_range_is_an_error() {
    let conn = db::open_in_memory().unwrap();
    let err = currencies::convert(&conn, Decimal::MAX, "CNY", "KRW").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::Overflow(_))
    ));
    assert!(currencies::convert(&conn, Decimal::MAX, "KRW", "CNY").unwrap() > Decimal::ZERO);
}

#[test]
fn enable_and_disable_through_cli() {
    let mut conn = db::open_in_memory().unwrap();
    let matches = cli::build_cli().get_matches_from(["pursebook", "currency", "disable", "gbp"]);
    let (_, m) = matches.subcommand().unwrap();
    currencies::handle(&mut conn, m).unwrap();
    assert!(!currencies::by_code(&conn, "GBP").unwrap().unwrap().is_active);

    let matches = cli::build_cli().get_matches_from(["pursebook", "currency", "enable", "GBP"]);
    let (_, m) = matches.subcommand().unwrap();
    currencies::handle(&mut conn, m).unwrap();
    assert!(currencies::by_code(&conn, "GBP").unwrap().unwrap().is_active);
}
