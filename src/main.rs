use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tally::index::stats::show_stats;
use tally::index::{AccumulatorKind, Indexer};
use tally::store::Store;
use tally::utils::app_data::AppConfig;
use tally::{ErrorKind, output, query};
use termcolor::ColorChoice;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Word-frequency index over file paths and contents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Index database (overrides the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Config file (default: <app data dir>/tally/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a file or every file below a directory, then commit
    Index {
        path: PathBuf,

        /// Use the bounded hash table accumulator
        #[arg(long)]
        table: bool,

        /// Only index files with these extensions (comma separated)
        #[arg(long, value_delimiter = ',')]
        ext: Vec<String>,

        /// Bytes read per block
        #[arg(long)]
        block_size: Option<usize>,
    },
    /// Look up a single word
    Search {
        word: String,

        #[arg(long)]
        limit: Option<usize>,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        #[arg(long, value_enum, default_value_t = ColorWhen::Auto)]
        color: ColorWhen,
    },
    /// Show index statistics
    Stats,
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorWhen {
    Auto,
    Always,
    Never,
}

impl From<ColorWhen> for ColorChoice {
    fn from(when: ColorWhen) -> Self {
        match when {
            ColorWhen::Auto => ColorChoice::Auto,
            ColorWhen::Always => ColorChoice::Always,
            ColorWhen::Never => ColorChoice::Never,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // --help and --version are not failures
            return if err.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            let invalid = err
                .chain()
                .filter_map(|e| e.downcast_ref::<tally::Error>())
                .any(|e| e.kind() == ErrorKind::InvalidArgument);
            ExitCode::from(if invalid { 1 } else { 2 })
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    let db_path = match cli.db {
        Some(path) => path,
        None => config.resolve_db_path()?,
    };

    match cli.command {
        Commands::Index {
            path,
            table,
            ext,
            block_size,
        } => {
            let mut index_config = config.index;
            if table {
                index_config.accumulator = AccumulatorKind::Table;
            }
            if !ext.is_empty() {
                index_config.extensions = ext;
            }
            if let Some(size) = block_size {
                index_config.block_size = size;
            }

            let mut store = Store::open(&db_path)
                .with_context(|| format!("Failed to open index {}", db_path.display()))?;
            let mut indexer = Indexer::new(&mut store, index_config)?.with_progress(true);
            indexer.index_path(&path)?;
            let flushed = indexer.commit()?;
            output::print_index_summary(&indexer.stats(), &flushed);
        }
        Commands::Search {
            word,
            limit,
            offset,
            color,
        } => {
            let store = Store::open(&db_path)
                .with_context(|| format!("Failed to open index {}", db_path.display()))?;
            let hits = query::search(&store, &word, limit, offset)?;
            output::print_hits(&hits, color.into())?;
        }
        Commands::Stats => {
            let store = Store::open(&db_path)
                .with_context(|| format!("Failed to open index {}", db_path.display()))?;
            show_stats(&store)?;
        }
    }

    Ok(())
}
