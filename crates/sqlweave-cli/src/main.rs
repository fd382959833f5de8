//! sqlweave command-line interface

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use sqlweave::cli::commands::{self, SelectConfig};
use sqlweave::cli::output;
use std::path::PathBuf;

/// sqlweave command-line tool
#[derive(Parser)]
#[command(name = "sqlweave")]
#[command(author, version, about = "SQL type inference, coercion and column resolution", long_about = None)]
struct Cli {
    /// Log resolution steps (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true, value_parser = ["auto", "always", "never"])]
    color: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse, validate and print normalized types
    Type {
        /// Type strings, e.g. 'decimal(7, 2)'
        #[arg(required = true)]
        types: Vec<String>,
    },

    /// Print the common supertype of the given types
    Coerce {
        #[arg(required = true)]
        types: Vec<String>,
    },

    /// Print the result type of CONCAT over the given types
    Concat {
        #[arg(required = true)]
        types: Vec<String>,
    },

    /// Print the result type of an arithmetic operator
    Arith {
        /// One of + - * / %
        #[arg(allow_hyphen_values = true)]
        op: String,
        left: String,
        right: String,
    },

    /// Print the inferred type of a SQL literal
    Infer {
        /// Literal as written in SQL, e.g. 1.50, 'abc', "DATE '2020-01-01'"
        #[arg(allow_hyphen_values = true)]
        literal: String,
    },

    /// Resolve a select list against tables from a catalog
    Select {
        /// Catalog file (JSON) mapping tables to column types
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Resolution options file (JSON)
        #[arg(long)]
        options: Option<PathBuf>,

        /// Table in the FROM clause, repeat to cross join
        #[arg(short, long = "from")]
        from: Vec<String>,

        /// Fail on column references that match nothing
        #[arg(short, long)]
        strict: bool,

        /// Columns: name, table.name, * or table.*
        #[arg(required = true)]
        columns: Vec<String>,
    },
}

fn run(command: Commands) -> Result<String> {
    let out = match command {
        Commands::Type { types } => commands::normalize(&types)?,
        Commands::Coerce { types } => commands::coerce(&types)?,
        Commands::Concat { types } => commands::concat(&types)?,
        Commands::Arith { op, left, right } => commands::arith(&op, &left, &right)?,
        Commands::Infer { literal } => commands::infer(&literal)?,
        Commands::Select {
            catalog,
            options,
            from,
            strict,
            columns,
        } => commands::select(&SelectConfig {
            catalog,
            options,
            from,
            columns,
            strict,
        })?,
    };
    Ok(out)
}

fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    output::setup_colors(&cli.color);

    if cli.verbose {
        env_logger::builder().filter_level(LevelFilter::Debug).init();
    } else {
        env_logger::init();
    }

    match run(cli.command) {
        Ok(out) => println!("{out}"),
        Err(e) => {
            eprintln!("{}", output::format_error(&e));
            std::process::exit(1);
        }
    }
}
