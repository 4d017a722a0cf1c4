// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use pursebook::settings::Settings;
use pursebook::{cli, commands, db};

fn main() -> Result<()> {
    let settings = Settings::new().context("failed to load settings")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli::build_cli().get_matches();

    let path = match matches.get_one::<String>("db") {
        Some(p) => PathBuf::from(p),
        None => settings.database_path()?,
    };
    debug!(path = %path.display(), "opening database");
    let mut conn = db::open_or_init(&path)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", path.display());
        }
        Some(("tx", sub)) => commands::transactions::handle(&conn, sub)?,
        Some(("image", sub)) => commands::images::handle(&conn, sub)?,
        Some(("category", sub)) => commands::categories::handle(&mut conn, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&conn, sub)?,
        Some(("currency", sub)) => commands::currencies::handle(&mut conn, sub)?,
        Some(("report", sub)) => commands::reports::handle(&conn, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
