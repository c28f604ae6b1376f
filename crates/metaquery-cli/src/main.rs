//! metaquery CLI - key/value meta store over SQLite
//!
//! Usage:
//!   metaquery init                          Create the meta table
//!   metaquery get <id> <key>                Print a value
//!   metaquery get <id> <key> --list         Print a stored string list
//!   metaquery set <id> <key> <value>...     Store a value (several values store a list)
//!   metaquery delete <id> <key>             Remove one entry
//!   metaquery purge <id>                    Remove every entry of an id
//!   metaquery keys <id>                     List keys of an id
//!   metaquery find <column> <pattern>       Find entries by REGEXP
//!   metaquery explain <column> <pattern>    Print the SQL a find would run

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use metaquery_sql::query::{Column, MatchKind};
use metaquery_sql::{find_query, Connection, MetaStore, PoolConfig, SqliteExecutor, Table, TableMapping};

#[derive(Parser, Debug)]
#[command(name = "metaquery")]
#[command(about = "Key/value meta store over SQLite", long_about = None)]
#[command(version)]
struct Cli {
    /// SQLite URI (e.g. sqlite://meta.db)
    #[arg(short, long, env = "METAQUERY_DATABASE_URL")]
    database: String,

    /// JSON file mapping logical columns to physical columns
    #[arg(long, value_name = "FILE")]
    table_config: Option<PathBuf>,

    /// Table name used with the default column mapping
    #[arg(long, default_value = "meta")]
    table: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the meta table if it does not exist
    Init,
    /// Print the value stored under a key
    Get {
        total_id: String,
        key: String,

        /// Decode the value as a string list
        #[arg(long)]
        list: bool,
    },
    /// Store a value; more than one value stores a string list
    Set {
        total_id: String,
        key: String,
        #[arg(required = true)]
        values: Vec<String>,
    },
    /// Remove one entry
    Delete { total_id: String, key: String },
    /// Remove every entry of an id
    Purge { total_id: String },
    /// List the keys stored for an id
    Keys { total_id: String },
    /// Find entries whose column matches a pattern
    Find(FindArgs),
    /// Print the compiled SQL and parameters of a find without running it
    Explain(FindArgs),
}

#[derive(clap::Args, Debug)]
struct FindArgs {
    #[arg(value_enum)]
    column: ColumnArg,

    /// Regular expression matched with REGEXP
    pattern: String,

    /// Anchoring applied to the pattern
    #[arg(long, value_enum, default_value = "contains")]
    kind: KindArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ColumnArg {
    TotalId,
    Key,
    Value,
}

impl From<ColumnArg> for Column {
    fn from(arg: ColumnArg) -> Self {
        match arg {
            ColumnArg::TotalId => Column::TotalId,
            ColumnArg::Key => Column::Key,
            ColumnArg::Value => Column::Value,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Contains,
    Exact,
    StartsWith,
    EndsWith,
    Full,
}

impl From<KindArg> for MatchKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Contains => MatchKind::Contains,
            KindArg::Exact => MatchKind::Exact,
            KindArg::StartsWith => MatchKind::StartsWith,
            KindArg::EndsWith => MatchKind::EndsWith,
            KindArg::Full => MatchKind::Full,
        }
    }
}

fn load_table(cli: &Cli) -> Result<TableMapping> {
    match &cli.table_config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read table config {}", path.display()))?;
            TableMapping::from_json(&json)
                .with_context(|| format!("Invalid table config {}", path.display()))
        }
        None => TableMapping::default_meta(&cli.table)
            .with_context(|| format!("Invalid table name {}", cli.table)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let table = load_table(&cli)?;
    debug!(table = ?table, "Table mapping loaded");

    // Explain only compiles, so it never touches the database
    if let Commands::Explain(args) = &cli.command {
        return explain(&table, args);
    }

    let conn = Connection::open(&cli.database, PoolConfig::default())
        .await
        .with_context(|| format!("Failed to open {}", cli.database))?;
    let store = MetaStore::new(SqliteExecutor::new(&conn), table)?;

    let result = run(&store, cli.command).await;
    conn.close().await;
    result
}

async fn run(store: &MetaStore<SqliteExecutor>, command: Commands) -> Result<()> {
    match command {
        Commands::Init => {
            store.ensure_table().await.context("Failed to create meta table")?;
            println!("Table {} ready", store.table().table_name());
        }
        Commands::Get { total_id, key, list } => {
            if list {
                for item in store.get_string_list(&total_id, &key).await? {
                    println!("{}", item);
                }
            } else {
                match store.get_string(&total_id, &key).await? {
                    Some(value) => println!("{}", value),
                    None => bail!("No value for {} / {}", total_id, key),
                }
            }
        }
        Commands::Set { total_id, key, values } => {
            if values.len() == 1 {
                store.set_string(&total_id, &key, Some(values[0].as_str())).await?;
            } else {
                store.set_string_list(&total_id, &key, Some(values.as_slice())).await?;
            }
        }
        Commands::Delete { total_id, key } => {
            let removed = store.delete(&total_id, &key).await?;
            println!("Removed {} entr{}", removed, if removed == 1 { "y" } else { "ies" });
        }
        Commands::Purge { total_id } => {
            let removed = store.purge(&total_id).await?;
            println!("Removed {} entr{}", removed, if removed == 1 { "y" } else { "ies" });
        }
        Commands::Keys { total_id } => {
            for key in store.keys(&total_id).await? {
                println!("{}", key);
            }
        }
        Commands::Find(args) => {
            let entries = store
                .find(args.column.into(), &args.pattern, args.kind.into())
                .await?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        Commands::Explain(args) => explain(store.table(), &args)?,
    }
    Ok(())
}

fn explain(table: &TableMapping, args: &FindArgs) -> Result<()> {
    let compiled = find_query(args.column.into(), &args.pattern, args.kind.into())?.compile(table)?;
    println!("{}", compiled.sql);
    println!("{}", serde_json::to_string(&compiled.params)?);
    Ok(())
}
