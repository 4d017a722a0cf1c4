// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::LedgerError;
use crate::models::TransactionImage;
use crate::utils::{fmt_ts, now, opt_ts_col, pretty_table};
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

/// Attaches an image to an existing transaction.
pub fn attach(
    conn: &Connection,
    transaction_id: i64,
    image_path: &str,
    thumbnail_path: Option<&str>,
    description: Option<&str>,
) -> Result<i64> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT id FROM transactions WHERE id=?1",
            params![transaction_id],
            |r| r.get(0),
        )
        .optional()?;
    if exists.is_none() {
        return Err(LedgerError::not_found("Transaction", transaction_id).into());
    }
    conn.execute(
        "INSERT INTO transaction_images(transaction_id, image_path, thumbnail_path, description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![transaction_id, image_path, thumbnail_path, description, fmt_ts(&now())],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_for(conn: &Connection, transaction_id: i64) -> Result<Vec<TransactionImage>> {
    let mut stmt = conn.prepare(
        "SELECT id, transaction_id, image_path, thumbnail_path, description, created_at
         FROM transaction_images WHERE transaction_id=?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![transaction_id], |r| {
        Ok(TransactionImage {
            id: r.get(0)?,
            transaction_id: r.get(1)?,
            image_path: r.get(2)?,
            thumbnail_path: r.get(3)?,
            description: r.get(4)?,
            created_at: opt_ts_col(r, 5)?,
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}

pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
    Ok(conn.execute("DELETE FROM transaction_images WHERE id=?1", params![id])? > 0)
}

pub fn delete_for(conn: &Connection, transaction_id: i64) -> Result<usize> {
    Ok(conn.execute(
        "DELETE FROM transaction_images WHERE transaction_id=?1",
        params![transaction_id],
    )?)
}

pub fn count_for(conn: &Connection, transaction_id: i64) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM transaction_images WHERE transaction_id=?1",
        params![transaction_id],
        |r| r.get(0),
    )?)
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let tx_id = *sub.get_one::<i64>("transaction").unwrap();
            let path = sub.get_one::<String>("path").unwrap();
            let thumb = sub.get_one::<String>("thumbnail").map(String::as_str);
            let desc = sub.get_one::<String>("description").map(String::as_str);
            let id = attach(conn, tx_id, path, thumb, desc)?;
            println!("Attached image #{} to transaction #{}", id, tx_id);
        }
        Some(("list", sub)) => {
            let tx_id = *sub.get_one::<i64>("transaction").unwrap();
            let data: Vec<Vec<String>> = list_for(conn, tx_id)?
                .into_iter()
                .map(|i| {
                    vec![
                        i.id.to_string(),
                        i.image_path,
                        i.thumbnail_path.unwrap_or_default(),
                        i.description.unwrap_or_default(),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["ID", "Path", "Thumbnail", "Description"], data)
            );
        }
        Some(("rm", sub)) => {
            if let Some(id) = sub.get_one::<i64>("id") {
                if !delete(conn, *id)? {
                    return Err(LedgerError::not_found("Image", id).into());
                }
                println!("Removed image #{}", id);
            } else if let Some(tx_id) = sub.get_one::<i64>("transaction") {
                let n = delete_for(conn, *tx_id)?;
                println!("Removed {} image(s) from transaction #{}", n, tx_id);
            }
        }
        _ => {}
    }
    Ok(())
}
