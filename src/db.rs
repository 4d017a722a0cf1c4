// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::utils::{fmt_ts, now};

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Pursebook", "pursebook"));

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(APP.0, APP.1, APP.2)
}

pub fn default_db_path() -> Result<PathBuf> {
    let proj = project_dirs().context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("pursebook.sqlite"))
}

pub fn open_or_init(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let mut conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

/// Fresh, seeded in-memory store.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    init_schema(&mut conn)?;
    Ok(conn)
}

fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        type TEXT NOT NULL CHECK(type IN ('INCOME','EXPENSE')),
        amount TEXT NOT NULL,
        category TEXT NOT NULL,
        date TEXT NOT NULL,
        note TEXT NOT NULL DEFAULT '',
        image_path TEXT,
        location TEXT,
        tags TEXT, -- comma separated
        is_recurring INTEGER NOT NULL DEFAULT 0,
        recurring_pattern TEXT,
        created_at TEXT,
        updated_at TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
    CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category, type);

    CREATE TABLE IF NOT EXISTS transaction_images(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        transaction_id INTEGER NOT NULL,
        image_path TEXT NOT NULL,
        thumbnail_path TEXT,
        description TEXT,
        created_at TEXT,
        FOREIGN KEY(transaction_id) REFERENCES transactions(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('INCOME','EXPENSE')),
        icon TEXT NOT NULL DEFAULT 'default_icon',
        color TEXT NOT NULL DEFAULT '#2196F3',
        is_default INTEGER NOT NULL DEFAULT 0,
        is_active INTEGER NOT NULL DEFAULT 1,
        sort_order INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT,
        UNIQUE(name, type)
    );

    CREATE TABLE IF NOT EXISTS budgets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        category TEXT, -- NULL = total budget
        amount TEXT NOT NULL,
        period TEXT NOT NULL,
        start_date TEXT NOT NULL,
        end_date TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT,
        updated_at TEXT,
        CHECK(start_date <= end_date)
    );

    -- exchange_rate: units of this currency per one unit of the base currency
    CREATE TABLE IF NOT EXISTS currencies(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        symbol TEXT NOT NULL,
        exchange_rate TEXT NOT NULL DEFAULT '1',
        is_base INTEGER NOT NULL DEFAULT 0,
        is_active INTEGER NOT NULL DEFAULT 1,
        sort_order INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT
    );
    CREATE UNIQUE INDEX IF NOT EXISTS idx_currencies_single_base
        ON currencies(is_base) WHERE is_base = 1;
    "#,
    )?;
    seed_defaults(conn)?;
    Ok(())
}

// (name, icon, color)
const DEFAULT_EXPENSE_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Food", "restaurant", "#FF5722"),
    ("Transport", "directions_car", "#2196F3"),
    ("Shopping", "shopping_cart", "#9C27B0"),
    ("Entertainment", "movie", "#FF9800"),
    ("Medical", "local_hospital", "#4CAF50"),
    ("Education", "school", "#607D8B"),
    ("Housing", "home", "#795548"),
    ("Other", "more_horiz", "#9E9E9E"),
];

const DEFAULT_INCOME_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Salary", "account_balance_wallet", "#4CAF50"),
    ("Bonus", "stars", "#8BC34A"),
    ("Investment", "trending_up", "#009688"),
    ("Part-time", "work", "#00BCD4"),
    ("Other", "add_circle", "#9E9E9E"),
];

// (code, name, symbol, rate against CNY)
const DEFAULT_CURRENCIES: &[(&str, &str, &str, &str)] = &[
    ("CNY", "Chinese Yuan", "¥", "1"),
    ("USD", "US Dollar", "$", "0.14"),
    ("EUR", "Euro", "€", "0.13"),
    ("JPY", "Japanese Yen", "¥", "20.5"),
    ("GBP", "British Pound", "£", "0.11"),
    ("HKD", "Hong Kong Dollar", "HK$", "1.1"),
    ("KRW", "South Korean Won", "₩", "180"),
];

/// Inserts default categories and currencies once, on first initialization.
fn seed_defaults(conn: &mut Connection) -> Result<()> {
    let seeded: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key='seeded_at'", [], |r| {
            r.get(0)
        })
        .optional()?;
    if seeded.is_some() {
        return Ok(());
    }

    let ts = fmt_ts(&now());
    let tx = conn.transaction()?;
    for (kind, defaults) in [
        ("EXPENSE", DEFAULT_EXPENSE_CATEGORIES),
        ("INCOME", DEFAULT_INCOME_CATEGORIES),
    ] {
        for (i, (name, icon, color)) in defaults.iter().enumerate() {
            tx.execute(
                "INSERT OR IGNORE INTO categories(name, type, icon, color, is_default, is_active, sort_order, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, 1, 1, ?5, ?6, ?6)",
                params![name, kind, icon, color, i as i64 + 1, ts],
            )?;
        }
    }
    for (i, (code, name, symbol, rate)) in DEFAULT_CURRENCIES.iter().enumerate() {
        tx.execute(
            "INSERT OR IGNORE INTO currencies(code, name, symbol, exchange_rate, is_base, is_active, sort_order, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7, ?7)",
            params![code, name, symbol, rate, i == 0, i as i64 + 1, ts],
        )?;
    }
    tx.execute(
        "INSERT INTO settings(key, value) VALUES('seeded_at', ?1)",
        params![ts],
    )?;
    tx.commit()?;
    info!("seeded default categories and currencies");
    Ok(())
}
