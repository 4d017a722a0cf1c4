// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pursebook::commands::budgets::{self, NewBudget};
use pursebook::commands::exporter::{self, ExportFormat};
use pursebook::commands::transactions::{self, NewTransaction};
use pursebook::errors::LedgerError;
use pursebook::models::{Period, TransactionType};
use pursebook::utils::parse_datetime;
use pursebook::{cli, db};
use rusqlite::Connection;
use rust_decimal_macros::dec;
use tempfile::tempdir;

fn setup() -> Connection {
    let conn = db::open_in_memory().unwrap();
    for (kind, amount, cat) in [
        (TransactionType::Expense, dec!(12.30), "Food"),
        (TransactionType::Income, dec!(800), "Salary"),
    ] {
        transactions::insert(
            &conn,
            &NewTransaction::new(kind, amount, cat, parse_datetime("2025-06-15").unwrap()),
        )
        .unwrap();
    }
    budgets::insert(
        &conn,
        &NewBudget {
            category: Some("Food".into()),
            amount: dec!(300),
            period: Period::Monthly,
            start_date: parse_datetime("2025-06-01").unwrap(),
            end_date: None,
        },
    )
    .unwrap();
    conn
}

#[test]
fn export_json_via_cli() {
    let conn = setup();
    let dir = tempdir().unwrap();
    let out = dir.path().join("backup.json");
    let matches = cli::build_cli().get_matches_from([
        "pursebook",
        "export",
        "--format",
        "json",
        "--out",
        out.to_str().unwrap(),
    ]);
    if let Some(("export", m)) = matches.subcommand() {
        exporter::handle(&conn, m).unwrap();
    } else {
        panic!("no export subcommand");
    }
    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(doc["version"], "1.0");
    assert_eq!(doc["totalTransactions"], 2);
    assert_eq!(doc["totalCategories"], 13);
    assert_eq!(doc["totalBudgets"], 1);
    assert_eq!(doc["totalCurrencies"], 7);
    assert_eq!(doc["transactions"][1]["type"], "EXPENSE");
    assert!(doc["exportDate"].is_string());
}

#[test]
fn export_csv_has_every_section() {
    let conn = setup();
    let dir = tempdir().unwrap();
    let out = dir.path().join("backup.csv");
    let msg = exporter::export(&conn, ExportFormat::Csv, &out).unwrap();
    assert!(msg.starts_with("Exported 2 transactions"));

    let text = std::fs::read_to_string(&out).unwrap();
    let sections = [
        "=== Transactions ===",
        "=== Categories ===",
        "=== Budgets ===",
        "=== Currencies ===",
    ];
    let mut last = 0;
    for s in sections {
        let pos = text.find(s).unwrap();
        assert!(pos >= last);
        last = pos;
    }
    assert!(text.contains("Salary"));
    assert!(text.contains("12.30"));
}

#[test]
fn excel_is_rejected_without_writing() {
    let conn = setup();
    let dir = tempdir().unwrap();
    let out = dir.path().join("backup.xlsx");
    let format: ExportFormat = "Excel".parse().unwrap();
    let err = exporter::export(&conn, format, &out).unwrap_err();
    assert_eq!(
        err.downcast_ref::<LedgerError>(),
        Some(&LedgerError::UnsupportedFormat("excel".into()))
    );
    assert!(!out.exists());
}

#[test]
fn unknown_format_fails_to_parse() {
    assert_eq!(
        "pdf".parse::<ExportFormat>(),
        Err(LedgerError::UnsupportedFormat("pdf".into()))
    );
}
