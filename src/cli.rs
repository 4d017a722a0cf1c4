// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{crate_version, value_parser, Arg, ArgAction, ArgGroup, Command};

const TYPES: [&str; 2] = ["income", "expense"];
const PERIODS: [&str; 4] = ["daily", "weekly", "monthly", "yearly"];

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print as JSON lines"),
    )
}

fn type_arg(required: bool) -> Arg {
    Arg::new("type")
        .long("type")
        .short('t')
        .value_parser(TYPES)
        .ignore_case(true)
        .required(required)
}

fn month_arg() -> Arg {
    Arg::new("month")
        .long("month")
        .help("YYYY-MM, defaults to the current month")
}

fn tx_cmd() -> Command {
    Command::new("tx")
        .about("Record and browse transactions")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Record an income or expense")
                .arg(type_arg(true))
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(Arg::new("category").long("category").short('c').required(true))
                .arg(Arg::new("date").long("date").help("YYYY-MM-DD[THH:MM[:SS]], defaults to now"))
                .arg(Arg::new("note").long("note"))
                .arg(Arg::new("image").long("image"))
                .arg(Arg::new("location").long("location"))
                .arg(Arg::new("tags").long("tags").help("Comma separated"))
                .arg(
                    Arg::new("recurring")
                        .long("recurring")
                        .value_parser(PERIODS)
                        .ignore_case(true),
                ),
        )
        .subcommand(
            Command::new("edit")
                .about("Change fields of a transaction")
                .arg(Arg::new("id").required(true).value_parser(value_parser!(i64)))
                .arg(type_arg(false))
                .arg(Arg::new("amount").long("amount"))
                .arg(Arg::new("category").long("category").short('c'))
                .arg(Arg::new("date").long("date"))
                .arg(Arg::new("note").long("note"))
                .arg(Arg::new("image").long("image"))
                .arg(Arg::new("location").long("location"))
                .arg(Arg::new("tags").long("tags"))
                .arg(
                    Arg::new("recurring")
                        .long("recurring")
                        .value_parser(PERIODS)
                        .ignore_case(true),
                )
                .arg(
                    Arg::new("clear")
                        .long("clear")
                        .num_args(1..)
                        .action(ArgAction::Append)
                        .value_parser(["image", "location", "tags", "recurring"])
                        .help("Unset optional fields; applied before any new values"),
                ),
        )
        .subcommand(
            Command::new("rm").about("Delete transactions").arg(
                Arg::new("ids")
                    .required(true)
                    .num_args(1..)
                    .value_parser(value_parser!(i64)),
            ),
        )
        .subcommand(
            Command::new("show")
                .about("Show one transaction as JSON")
                .arg(Arg::new("id").required(true).value_parser(value_parser!(i64))),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about("List transactions, newest first")
                .arg(type_arg(false))
                .arg(Arg::new("category").long("category").short('c'))
                .arg(month_arg().conflicts_with_all(["from", "to"]))
                .arg(Arg::new("from").long("from"))
                .arg(Arg::new("to").long("to"))
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize)),
                ),
        ))
}

fn image_cmd() -> Command {
    let tx_arg = || {
        Arg::new("transaction")
            .long("tx")
            .value_parser(value_parser!(i64))
    };
    Command::new("image")
        .about("Attach images to transactions")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .arg(tx_arg().required(true))
                .arg(Arg::new("path").required(true))
                .arg(Arg::new("thumbnail").long("thumbnail"))
                .arg(Arg::new("description").long("description")),
        )
        .subcommand(Command::new("list").arg(tx_arg().required(true)))
        .subcommand(
            Command::new("rm")
                .arg(
                    Arg::new("id")
                        .long("id")
                        .value_parser(value_parser!(i64)),
                )
                .arg(tx_arg())
                .group(
                    ArgGroup::new("target")
                        .args(["id", "transaction"])
                        .required(true),
                ),
        )
}

fn category_cmd() -> Command {
    let named = |name: &'static str| {
        Command::new(name)
            .arg(Arg::new("name").required(true))
            .arg(type_arg(true))
    };
    Command::new("category")
        .about("Manage categories")
        .subcommand_required(true)
        .subcommand(
            named("add")
                .arg(Arg::new("icon").long("icon"))
                .arg(Arg::new("color").long("color"))
                .arg(Arg::new("sort").long("sort").value_parser(value_parser!(i32))),
        )
        .subcommand(json_flags(
            Command::new("list")
                .arg(type_arg(false))
                .arg(Arg::new("active").long("active").action(ArgAction::SetTrue)),
        ))
        .subcommand(
            Command::new("search")
                .arg(Arg::new("query").required(true))
                .arg(type_arg(true)),
        )
        .subcommand(named("enable"))
        .subcommand(named("disable"))
        .subcommand(
            named("rm").arg(
                Arg::new("cascade")
                    .long("cascade")
                    .action(ArgAction::SetTrue)
                    .help("Also delete transactions filed under this category"),
            ),
        )
        .subcommand(json_flags(Command::new("stats").arg(type_arg(true))))
}

fn budget_cmd() -> Command {
    let id_cmd = |name: &'static str| {
        Command::new(name).arg(Arg::new("id").required(true).value_parser(value_parser!(i64)))
    };
    Command::new("budget")
        .about("Manage budgets and check their usage")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .arg(
                    Arg::new("category")
                        .long("category")
                        .short('c')
                        .help("Omit for a total budget across all categories"),
                )
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(
                    Arg::new("period")
                        .long("period")
                        .value_parser(PERIODS)
                        .ignore_case(true)
                        .default_value("monthly"),
                )
                .arg(Arg::new("start").long("start").help("Defaults to now"))
                .arg(Arg::new("end").long("end").help("Defaults to the end of the period")),
        )
        .subcommand(json_flags(
            Command::new("list").arg(
                Arg::new("all")
                    .long("all")
                    .action(ArgAction::SetTrue)
                    .help("Include inactive budgets"),
            ),
        ))
        .subcommand(id_cmd("rm"))
        .subcommand(id_cmd("enable"))
        .subcommand(id_cmd("disable"))
        .subcommand(
            id_cmd("set")
                .arg(Arg::new("amount").long("amount"))
                .arg(Arg::new("end").long("end"))
                .group(
                    ArgGroup::new("changes")
                        .args(["amount", "end"])
                        .multiple(true)
                        .required(true),
                ),
        )
        .subcommand(json_flags(Command::new("usage")))
        .subcommand(json_flags(Command::new("alerts")))
}

fn currency_cmd() -> Command {
    let code_cmd = |name: &'static str| Command::new(name).arg(Arg::new("code").required(true));
    Command::new("currency")
        .about("Manage currencies and convert amounts")
        .subcommand_required(true)
        .subcommand(
            code_cmd("add")
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("symbol").long("symbol").required(true))
                .arg(
                    Arg::new("rate")
                        .long("rate")
                        .required(true)
                        .help("Units per one unit of the base currency"),
                ),
        )
        .subcommand(json_flags(
            Command::new("list").arg(Arg::new("active").long("active").action(ArgAction::SetTrue)),
        ))
        .subcommand(code_cmd("set-base"))
        .subcommand(code_cmd("set-rate").arg(Arg::new("rate").required(true)))
        .subcommand(code_cmd("enable"))
        .subcommand(code_cmd("disable"))
        .subcommand(code_cmd("rm"))
        .subcommand(
            Command::new("convert")
                .arg(Arg::new("amount").required(true))
                .arg(Arg::new("from").long("from").required(true))
                .arg(Arg::new("to").long("to").required(true)),
        )
}

fn report_cmd() -> Command {
    Command::new("report")
        .about("Monthly summaries")
        .subcommand_required(true)
        .subcommand(json_flags(Command::new("summary").arg(month_arg())))
        .subcommand(json_flags(
            Command::new("categories")
                .arg(type_arg(false).default_value("expense"))
                .arg(month_arg()),
        ))
}

fn export_cmd() -> Command {
    Command::new("export")
        .about("Export every record to a file")
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .default_value("json")
                .help("csv | json | excel (excel is not supported yet)"),
        )
        .arg(Arg::new("out").long("out").short('o').required(true))
}

pub fn build_cli() -> Command {
    Command::new("pursebook")
        .version(crate_version!())
        .about("Personal finance ledger: transactions, budgets, monthly summaries")
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .help("Database file, overrides database.path from settings"),
        )
        .subcommand(Command::new("init").about("Create the database and seed defaults"))
        .subcommand(tx_cmd())
        .subcommand(image_cmd())
        .subcommand(category_cmd())
        .subcommand(budget_cmd())
        .subcommand(currency_cmd())
        .subcommand(report_cmd())
        .subcommand(export_cmd())
}
