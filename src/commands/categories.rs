// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::analytics;
use crate::commands::transactions::{self, TransactionFilter};
use crate::errors::LedgerError;
use crate::models::{Category, CategoryWithStats, TransactionType};
use crate::utils::{fmt_money, fmt_ts, maybe_print_json, now, opt_ts_col, parsed_col, pretty_table};
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

const COLUMNS: &str =
    "id, name, type, icon, color, is_default, is_active, sort_order, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub kind: TransactionType,
    pub icon: Option<String>,
    pub color: Option<String>,
    /// Appended after the last category of the same type when unset.
    pub sort_order: Option<i32>,
}

impl NewCategory {
    pub fn new(name: impl Into<String>, kind: TransactionType) -> Self {
        NewCategory {
            name: name.into(),
            kind,
            icon: None,
            color: None,
            sort_order: None,
        }
    }
}

fn from_row(r: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: r.get(0)?,
        name: r.get(1)?,
        kind: parsed_col(r, 2)?,
        icon: r.get(3)?,
        color: r.get(4)?,
        is_default: r.get(5)?,
        is_active: r.get(6)?,
        sort_order: r.get(7)?,
        created_at: opt_ts_col(r, 8)?,
        updated_at: opt_ts_col(r, 9)?,
    })
}

fn collect(conn: &Connection, sql: &str, p: impl rusqlite::Params) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(p, from_row)?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}

pub fn insert(conn: &Connection, c: &NewCategory) -> Result<i64> {
    let name = c.name.trim();
    if find(conn, name, c.kind)?.is_some() {
        return Err(LedgerError::DuplicateCategory {
            name: name.to_string(),
            kind: c.kind,
        }
        .into());
    }
    let sort_order = match c.sort_order {
        Some(s) => s,
        None => {
            let max: Option<i32> = conn.query_row(
                "SELECT MAX(sort_order) FROM categories WHERE type=?1",
                params![c.kind.as_str()],
                |r| r.get(0),
            )?;
            max.unwrap_or(0) + 1
        }
    };
    let ts = fmt_ts(&now());
    conn.execute(
        "INSERT INTO categories(name, type, icon, color, is_default, is_active, sort_order, created_at, updated_at)
         VALUES (?1, ?2, COALESCE(?3, 'default_icon'), COALESCE(?4, '#2196F3'), 0, 1, ?5, ?6, ?6)",
        params![name, c.kind.as_str(), c.icon, c.color, sort_order, ts],
    )?;
    let id = conn.last_insert_rowid();
    info!(id, name, kind = %c.kind, "category added");
    Ok(id)
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<Category>> {
    let sql = format!("SELECT {COLUMNS} FROM categories WHERE id=?1");
    Ok(conn.query_row(&sql, params![id], from_row).optional()?)
}

pub fn find(conn: &Connection, name: &str, kind: TransactionType) -> Result<Option<Category>> {
    let sql = format!("SELECT {COLUMNS} FROM categories WHERE name=?1 AND type=?2 LIMIT 1");
    Ok(conn
        .query_row(&sql, params![name, kind.as_str()], from_row)
        .optional()?)
}

/// Categories in display order, optionally narrowed by type and to active ones.
pub fn list(
    conn: &Connection,
    kind: Option<TransactionType>,
    active_only: bool,
) -> Result<Vec<Category>> {
    let mut sql = format!("SELECT {COLUMNS} FROM categories WHERE (?1 IS NULL OR type=?1)");
    if active_only {
        sql.push_str(" AND is_active=1");
    }
    sql.push_str(" ORDER BY type DESC, sort_order ASC, id ASC");
    collect(conn, &sql, params![kind.map(|k| k.as_str())])
}

pub fn list_defaults(conn: &Connection) -> Result<Vec<Category>> {
    let sql = format!("SELECT {COLUMNS} FROM categories WHERE is_default=1 ORDER BY type DESC, sort_order");
    collect(conn, &sql, [])
}

pub fn search(conn: &Connection, query: &str, kind: TransactionType) -> Result<Vec<Category>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM categories WHERE name LIKE '%' || ?1 || '%' AND type=?2 ORDER BY sort_order"
    );
    collect(conn, &sql, params![query, kind.as_str()])
}

fn touch(conn: &Connection, sql: &str, id: i64, value: impl rusqlite::ToSql) -> Result<()> {
    let n = conn.execute(sql, params![id, value, fmt_ts(&now())])?;
    if n == 0 {
        return Err(LedgerError::not_found("Category", id).into());
    }
    Ok(())
}

pub fn set_active(conn: &Connection, id: i64, active: bool) -> Result<()> {
    touch(
        conn,
        "UPDATE categories SET is_active=?2, updated_at=?3 WHERE id=?1",
        id,
        active,
    )
}

pub fn set_sort_order(conn: &Connection, id: i64, sort_order: i32) -> Result<()> {
    touch(
        conn,
        "UPDATE categories SET sort_order=?2, updated_at=?3 WHERE id=?1",
        id,
        sort_order,
    )
}

pub fn count_by_type(conn: &Connection, kind: TransactionType) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM categories WHERE type=?1",
        params![kind.as_str()],
        |r| r.get(0),
    )?)
}

/// Removes a category. With `cascade`, transactions filed under the same
/// name and type go with it; otherwise they are left untouched.
/// Returns the number of transactions removed.
pub fn delete(conn: &mut Connection, id: i64, cascade: bool) -> Result<usize> {
    let cat = get(conn, id)?.ok_or_else(|| LedgerError::not_found("Category", id))?;
    let tx = conn.transaction()?;
    let removed = if cascade {
        tx.execute(
            "DELETE FROM transactions WHERE category=?1 AND type=?2",
            params![cat.name, cat.kind.as_str()],
        )?
    } else {
        0
    };
    tx.execute("DELETE FROM categories WHERE id=?1", params![id])?;
    tx.commit()?;
    info!(id, name = %cat.name, removed, "category deleted");
    Ok(removed)
}

/// Active categories of `kind` with their transaction totals, largest first.
pub fn with_stats(conn: &Connection, kind: TransactionType) -> Result<Vec<CategoryWithStats>> {
    let txs = transactions::list(
        conn,
        &TransactionFilter {
            kind: Some(kind),
            ..Default::default()
        },
    )?;
    let mut stats = list(conn, Some(kind), true)?
        .into_iter()
        .map(|category| {
            let matching: Vec<_> = txs.iter().filter(|t| t.category == category.name).collect();
            Ok(CategoryWithStats {
                total_amount: analytics::checked_sum(
                    matching.iter().map(|t| t.amount),
                    "category stats",
                )?,
                transaction_count: matching.len(),
                last_used: matching.iter().map(|t| t.date).max(),
                category,
            })
        })
        .collect::<Result<Vec<_>, LedgerError>>()?;
    stats.sort_by(|a, b| b.total_amount.cmp(&a.total_amount));
    Ok(stats)
}

fn id_for(conn: &Connection, sub: &clap::ArgMatches) -> Result<i64> {
    let name = sub.get_one::<String>("name").unwrap();
    let kind: TransactionType = sub.get_one::<String>("type").unwrap().parse()?;
    let cat = find(conn, name, kind)?
        .ok_or_else(|| LedgerError::not_found("Category", format!("{name} ({kind})")))?;
    Ok(cat.id)
}

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let kind: TransactionType = sub.get_one::<String>("type").unwrap().parse()?;
            let c = NewCategory {
                icon: sub.get_one::<String>("icon").cloned(),
                color: sub.get_one::<String>("color").cloned(),
                sort_order: sub.get_one::<i32>("sort").copied(),
                ..NewCategory::new(name.as_str(), kind)
            };
            insert(conn, &c)?;
            println!("Added category '{}' ({})", name, kind);
        }
        Some(("list", sub)) => {
            let kind = sub
                .get_one::<String>("type")
                .map(|s| s.parse::<TransactionType>())
                .transpose()?;
            let data = list(conn, kind, sub.get_flag("active"))?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .into_iter()
                    .map(|c| {
                        vec![
                            c.name,
                            c.kind.to_string(),
                            c.icon,
                            c.color,
                            c.sort_order.to_string(),
                            if c.is_active { "yes" } else { "no" }.into(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Category", "Type", "Icon", "Color", "Order", "Active"], rows)
                );
            }
        }
        Some(("search", sub)) => {
            let query = sub.get_one::<String>("query").unwrap();
            let kind: TransactionType = sub.get_one::<String>("type").unwrap().parse()?;
            let rows = search(conn, query, kind)?
                .into_iter()
                .map(|c| vec![c.name, c.kind.to_string()])
                .collect();
            println!("{}", pretty_table(&["Category", "Type"], rows));
        }
        Some(("enable", sub)) => {
            set_active(conn, id_for(conn, sub)?, true)?;
            println!("Enabled category '{}'", sub.get_one::<String>("name").unwrap());
        }
        Some(("disable", sub)) => {
            set_active(conn, id_for(conn, sub)?, false)?;
            println!("Disabled category '{}'", sub.get_one::<String>("name").unwrap());
        }
        Some(("rm", sub)) => {
            let id = id_for(conn, sub)?;
            let removed = delete(conn, id, sub.get_flag("cascade"))?;
            println!(
                "Removed category '{}' ({} transaction(s) removed)",
                sub.get_one::<String>("name").unwrap(),
                removed
            );
        }
        Some(("stats", sub)) => {
            let kind: TransactionType = sub.get_one::<String>("type").unwrap().parse()?;
            let data = with_stats(conn, kind)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .into_iter()
                    .map(|s| {
                        vec![
                            s.category.name,
                            fmt_money(&s.total_amount),
                            s.transaction_count.to_string(),
                            s.last_used.map(|d| d.to_string()).unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Category", "Total", "Count", "Last used"], rows)
                );
            }
        }
        _ => {}
    }
    Ok(())
}
