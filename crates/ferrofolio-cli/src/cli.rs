//! CLI argument definitions for ferrofolio.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `quote` | Price one or more symbols |
//! | `value` | Value the portfolios in a file |
//! | `bench` | Time fetch strategies over portfolios of growing size |
//! | `compare` | Speedup of one strategy over another, per portfolio |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `table` | Output format (table, json, csv) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--endpoint` | env or built-in | Quote service URL |
//! | `--currency` | env or `USD` | Quote currency |
//! | `--timeout-ms` | `10000` | Per-request timeout |
//! | `--mock` | `false` | Serve demo prices in-process |
//! | `--verbose` | `false` | Debug logging on stderr |
//!
//! # Examples
//!
//! ```bash
//! ferrofolio quote BTC ETH --strategy batched-sequential
//! ferrofolio value portfolios.txt --format json --pretty
//! ferrofolio bench --random 3,5,10,15,20 --seed 7 --output timings.csv
//! ferrofolio compare portfolios.txt --mock
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use ferrofolio_core::StrategyKind;

/// Concurrent crypto portfolio valuation and fetch benchmarking.
#[derive(Debug, Parser)]
#[command(name = "ferrofolio", author, version, about)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Quote service URL; overrides FERROFOLIO_ENDPOINT.
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Quote currency; overrides FERROFOLIO_CURRENCY.
    #[arg(long, global = true)]
    pub currency: Option<String>,

    /// Per-request timeout in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Answer from built-in demo prices instead of the network.
    #[arg(long, global = true, default_value_t = false)]
    pub mock: bool,

    /// Log at debug level unless RUST_LOG is set.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns for terminal display.
    Table,
    /// Single JSON document.
    Json,
    /// Comma-separated rows with a header line.
    Csv,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch prices for one or more symbols.
    ///
    ///   ferrofolio quote BTC ETH SOL
    ///   ferrofolio quote BTC ETH --strategy batched-sequential
    Quote(QuoteArgs),

    /// Value every portfolio in a holdings file.
    ///
    /// Lines are `SYMBOL QUANTITY`; a `# <label>: ...` line opens a new
    /// portfolio and any other `#` line is a comment.
    Value(ValueArgs),

    /// Time fetch strategies over a sequence of portfolios.
    ///
    ///   ferrofolio bench --random 3,5,10 --strategy sequential --strategy concurrent
    ///   ferrofolio bench portfolios.txt --output timings.csv
    Bench(BenchArgs),

    /// Compare two strategies portfolio by portfolio.
    Compare(CompareArgs),
}

#[derive(Debug, Args)]
pub struct StrategyArgs {
    /// Fetch strategy.
    #[arg(long, default_value_t = StrategyKind::Concurrent)]
    pub strategy: StrategyKind,

    /// Symbols per request for batched-concurrent.
    #[arg(long, default_value_t = 10)]
    pub batch_size: usize,
}

#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// One or more symbols (e.g., BTC, ETH).
    #[arg(required = true, num_args = 1..)]
    pub symbols: Vec<String>,

    #[command(flatten)]
    pub strategy: StrategyArgs,
}

#[derive(Debug, Args)]
pub struct ValueArgs {
    /// Holdings file.
    pub file: PathBuf,

    /// Only value the group with this label (the header text before `:`).
    #[arg(long)]
    pub group: Option<String>,

    #[command(flatten)]
    pub strategy: StrategyArgs,
}

/// Where benchmark portfolios come from.
///
/// Without a file, random portfolios are drawn from the screened default
/// universe.
#[derive(Debug, Args)]
pub struct PortfolioArgs {
    /// Holdings file; one portfolio per `# <label>:` group.
    #[arg(conflicts_with = "random")]
    pub file: Option<PathBuf>,

    /// Sizes of random portfolios, comma-separated.
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub random: Option<Vec<usize>>,

    /// Seed for random portfolio generation.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Args)]
pub struct BenchArgs {
    #[command(flatten)]
    pub portfolios: PortfolioArgs,

    /// Strategies to time, in order. Defaults to sequential then concurrent.
    #[arg(long = "strategy")]
    pub strategies: Vec<StrategyKind>,

    /// Symbols per request for batched-concurrent.
    #[arg(long, default_value_t = 10)]
    pub batch_size: usize,

    /// Also write `strategy,num_assets,time_seconds` rows to this file.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    #[command(flatten)]
    pub portfolios: PortfolioArgs,

    #[arg(long, default_value_t = StrategyKind::Sequential)]
    pub baseline: StrategyKind,

    #[arg(long, default_value_t = StrategyKind::Concurrent)]
    pub candidate: StrategyKind,

    /// Symbols per request for batched-concurrent.
    #[arg(long, default_value_t = 10)]
    pub batch_size: usize,
}
