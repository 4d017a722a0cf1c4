// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rusqlite::types::Type;
use rusqlite::Row;
use rust_decimal::Decimal;

use crate::models::YearMonth;

/// Storage format for every timestamp column; sorts lexically in time order.
pub const TS_FMT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FMT).to_string()
}

pub fn now() -> NaiveDateTime {
    let n = Local::now().naive_local();
    n.with_nanosecond(0).unwrap_or(n)
}

pub fn current_month() -> YearMonth {
    YearMonth::from_date(Local::now().date_naive())
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Accepts `YYYY-MM-DD` (midnight), `YYYY-MM-DDTHH:MM` or `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim().replacen(' ', "T", 1);
    if let Ok(ts) = NaiveDateTime::parse_from_str(&s, TS_FMT) {
        return Ok(ts);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M") {
        return Ok(ts);
    }
    let d = NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
        format!("Invalid timestamp '{}', expected YYYY-MM-DD[THH:MM[:SS]]", s)
    })?;
    Ok(d.and_time(NaiveTime::MIN))
}

/// Like `parse_datetime`, but a bare date means the last second of that day.
pub fn parse_end_datetime(s: &str) -> Result<NaiveDateTime> {
    let ts = parse_datetime(s)?;
    if s.trim().len() == 10 {
        let eod = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        return Ok(ts.date().and_time(eod));
    }
    Ok(ts)
}

pub fn parse_month(s: &str) -> Result<YearMonth> {
    s.parse()
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn fmt_percent(d: &Decimal) -> String {
    format!("{:.1}%", (*d * Decimal::ONE_HUNDRED).round_dp(1))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

fn conversion_failure(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

// Column readers for values stored as TEXT.

pub fn decimal_col(r: &Row, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = r.get(idx)?;
    s.parse::<Decimal>().map_err(|e| conversion_failure(idx, e))
}

pub fn ts_col(r: &Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let s: String = r.get(idx)?;
    NaiveDateTime::parse_from_str(&s, TS_FMT).map_err(|e| conversion_failure(idx, e))
}

pub fn opt_ts_col(r: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDateTime>> {
    let s: Option<String> = r.get(idx)?;
    s.filter(|s| !s.is_empty())
        .map(|s| NaiveDateTime::parse_from_str(&s, TS_FMT).map_err(|e| conversion_failure(idx, e)))
        .transpose()
}

pub fn parsed_col<T>(r: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = anyhow::Error>,
{
    let s: String = r.get(idx)?;
    s.parse::<T>()
        .map_err(|e| conversion_failure(idx, std::io::Error::other(e.to_string())))
}

pub fn opt_parsed_col<T>(r: &Row, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: std::str::FromStr<Err = anyhow::Error>,
{
    let s: Option<String> = r.get(idx)?;
    s.filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<T>()
                .map_err(|e| conversion_failure(idx, std::io::Error::other(e.to_string())))
        })
        .transpose()
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
