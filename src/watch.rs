// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use rusqlite::hooks::Action;
use rusqlite::Connection;
use tracing::{debug, trace};

use crate::commands::reports;
use crate::models::{MonthlySummary, YearMonth};

/// Counts row writes on a connection through SQLite's update hook.
/// A connection carries one update hook, so attach a single tracker per connection.
#[derive(Debug, Clone, Default)]
pub struct ChangeTracker {
    generation: Arc<AtomicU64>,
}

impl ChangeTracker {
    pub fn attach(conn: &Connection) -> Self {
        let tracker = ChangeTracker::default();
        let generation = Arc::clone(&tracker.generation);
        conn.update_hook(Some(
            move |action: Action, _db: &str, table: &str, rowid: i64| {
                trace!(?action, table, rowid, "row changed");
                generation.fetch_add(1, Ordering::Release);
            },
        ));
        tracker
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

/// The monthly summary for a selected month, recomputed only when the month
/// changes or the store has been written since the last read.
#[derive(Debug)]
pub struct MonthlySummaryView {
    tracker: ChangeTracker,
    month: YearMonth,
    cached: Option<(u64, MonthlySummary)>,
    recomputes: usize,
}

impl MonthlySummaryView {
    pub fn new(tracker: ChangeTracker, month: YearMonth) -> Self {
        MonthlySummaryView {
            tracker,
            month,
            cached: None,
            recomputes: 0,
        }
    }

    pub fn month(&self) -> YearMonth {
        self.month
    }

    pub fn set_month(&mut self, month: YearMonth) {
        if month != self.month {
            self.month = month;
            self.cached = None;
        }
    }

    /// Number of times the summary has been computed so far.
    pub fn recomputes(&self) -> usize {
        self.recomputes
    }

    pub fn current(&mut self, conn: &Connection) -> Result<&MonthlySummary> {
        let generation = self.tracker.generation();
        match self.cached.take() {
            Some((g, summary)) if g == generation => Ok(&self.cached.insert((g, summary)).1),
            _ => {
                let summary = reports::monthly_summary(conn, self.month)?;
                self.recomputes += 1;
                debug!(month = %self.month, generation, "monthly summary refreshed");
                Ok(&self.cached.insert((generation, summary)).1)
            }
        }
    }
}
