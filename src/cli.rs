//! CLI definition and dispatch.

use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_grid_adapter::CsvGridAdapter;
use crate::adapters::csv_segment_adapter::CsvSegmentAdapter;
use crate::adapters::csv_sink_adapter::CsvSinkAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::validate_config;
use crate::domain::deal::DealRecord;
use crate::domain::error::ReconError;
use crate::domain::extractor::NormalizeContext;
use crate::domain::order::OrderRecord;
use crate::domain::reconcile::reconcile;
use crate::domain::report::{ReportExtraction, extract_report};
use crate::domain::segment::SegmentBatch;
use crate::domain::settings::{
    DEFAULT_SEGMENT_DELIMITER, ExtractSettings, StoreBackend, StoreSettings, output_dir,
    read_delimiter,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::grid_port::GridPort;
use crate::ports::segment_port::SegmentPort;
use crate::ports::sink_port::write_relation;
use crate::ports::store_port::StorePort;

#[derive(Parser, Debug)]
#[command(
    name = "reportrecon",
    about = "Extract tester report tables and reconcile them into trade summaries"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract orders and deals from a report export
    Extract {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        report: PathBuf,
        #[arg(long)]
        csv_dir: Option<PathBuf>,
        /// Upsert the extracted rows into the configured store
        #[arg(long)]
        store: bool,
    },
    /// Load a segment annotation file
    Segments {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        file: PathBuf,
        #[arg(long)]
        csv_dir: Option<PathBuf>,
        /// Replace the store's segment table
        #[arg(long)]
        store: bool,
    },
    /// Reconcile stored orders, deals and segments into the summary table
    Summarize {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        csv_dir: Option<PathBuf>,
    },
    /// Extract, load segments and reconcile in one pass
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        report: PathBuf,
        #[arg(short, long)]
        segments: PathBuf,
        #[arg(long)]
        csv_dir: Option<PathBuf>,
        /// Persist all four relations
        #[arg(long)]
        store: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

impl Command {
    pub fn config_path(&self) -> &Path {
        match self {
            Command::Extract { config, .. }
            | Command::Segments { config, .. }
            | Command::Summarize { config, .. }
            | Command::Run { config, .. }
            | Command::Validate { config } => config,
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let config = match load_config(cli.command.config_path()) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let result = match &cli.command {
        Command::Extract {
            report,
            csv_dir,
            store,
            ..
        } => run_extract(&config, report, csv_dir.as_deref(), *store),
        Command::Segments {
            file,
            csv_dir,
            store,
            ..
        } => run_segments(&config, file, csv_dir.as_deref(), *store),
        Command::Summarize { csv_dir, .. } => run_summarize(&config, csv_dir.as_deref()),
        Command::Run {
            report,
            segments,
            csv_dir,
            store,
            ..
        } => run_all(&config, report, segments, csv_dir.as_deref(), *store),
        Command::Validate { .. } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = ReconError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Opens the configured store and makes sure its tables exist.
pub fn open_store(config: &dyn ConfigPort) -> Result<Box<dyn StorePort>, ReconError> {
    let settings = StoreSettings::from_config(config)?;
    let store: Box<dyn StorePort> = match settings.backend {
        #[cfg(feature = "sqlite")]
        StoreBackend::Sqlite => Box::new(
            crate::adapters::sqlite_adapter::SqliteAdapter::from_settings(&settings)?,
        ),
        #[cfg(feature = "postgres")]
        StoreBackend::Postgres => Box::new(
            crate::adapters::postgres_adapter::PostgresAdapter::from_settings(&settings)?,
        ),
        #[allow(unreachable_patterns)]
        other => {
            return Err(ReconError::ConfigInvalid {
                section: "store".into(),
                key: "backend".into(),
                reason: format!("{other:?} support is not compiled in"),
            });
        }
    };
    store.initialize_schema()?;
    Ok(store)
}

fn processing_context() -> NormalizeContext {
    NormalizeContext {
        fallback_time: Local::now().naive_local(),
    }
}

pub fn extract_from_file(
    config: &dyn ConfigPort,
    report: &Path,
) -> Result<ReportExtraction, ReconError> {
    let settings = ExtractSettings::from_config(config)?;
    let grid = CsvGridAdapter::new(settings.delimiter).read_grid(report)?;
    let extraction = extract_report(&grid, &settings, &processing_context());
    extraction.require_orders()?;
    for w in extraction.warnings() {
        warn!("{}: {w}", report.display());
    }
    Ok(extraction)
}

pub fn segments_from_file(
    config: &dyn ConfigPort,
    file: &Path,
) -> Result<SegmentBatch, ReconError> {
    let delimiter = read_delimiter(config, "segments", DEFAULT_SEGMENT_DELIMITER)?;
    CsvSegmentAdapter::new(delimiter).read_segments(file)
}

fn print_written(path: &Path) {
    println!("wrote {}", path.display());
}

fn write_tables(
    sink: &CsvSinkAdapter,
    orders: &[OrderRecord],
    deals: &[DealRecord],
) -> Result<(), ReconError> {
    print_written(&write_relation(sink, orders)?);
    print_written(&write_relation(sink, deals)?);
    Ok(())
}

fn run_extract(
    config: &FileConfigAdapter,
    report: &Path,
    csv_dir: Option<&Path>,
    store: bool,
) -> Result<(), ReconError> {
    validate_config(config, store)?;
    let extraction = extract_from_file(config, report)?;

    println!("orders: {}", extraction.orders().len());
    println!("deals: {}", extraction.deals().len());
    println!("warnings: {}", extraction.warnings().count());

    if let Some(dir) = csv_dir {
        let sink = CsvSinkAdapter::new(dir.to_path_buf());
        write_tables(&sink, extraction.orders(), extraction.deals())?;
    }

    if store {
        let store = open_store(config)?;
        let orders = store.upsert_orders(extraction.orders())?;
        let deals = store.upsert_deals(extraction.deals())?;
        println!("stored orders: {orders}, deals: {deals}");
    }
    Ok(())
}

fn run_segments(
    config: &FileConfigAdapter,
    file: &Path,
    csv_dir: Option<&Path>,
    store: bool,
) -> Result<(), ReconError> {
    validate_config(config, store)?;
    let batch = segments_from_file(config, file)?;

    println!("segments: {}", batch.records.len());
    println!("skipped: {}", batch.warnings.len());

    if let Some(dir) = csv_dir {
        let sink = CsvSinkAdapter::new(dir.to_path_buf());
        print_written(&write_relation(&sink, &batch.records)?);
    }

    if store {
        let stored = open_store(config)?.replace_segments(&batch.records)?;
        println!("stored segments: {stored}");
    }
    Ok(())
}

fn run_summarize(config: &FileConfigAdapter, csv_dir: Option<&Path>) -> Result<(), ReconError> {
    validate_config(config, true)?;
    let store = open_store(config)?;

    let orders = store.load_orders()?;
    let deals = store.load_deals()?;
    let segments = store.load_segments()?;
    info!(
        orders = orders.len(),
        deals = deals.len(),
        segments = segments.len(),
        "loaded relations from store"
    );

    let summary = reconcile(&orders, &deals, &segments);
    let stored = store.replace_summary(&summary)?;
    println!("summary rows: {stored}");

    if let Some(dir) = csv_dir {
        let sink = CsvSinkAdapter::new(dir.to_path_buf());
        print_written(&write_relation(&sink, &summary)?);
    }
    Ok(())
}

fn run_all(
    config: &FileConfigAdapter,
    report: &Path,
    segments_file: &Path,
    csv_dir: Option<&Path>,
    store: bool,
) -> Result<(), ReconError> {
    validate_config(config, store)?;
    let extraction = extract_from_file(config, report)?;
    let batch = segments_from_file(config, segments_file)?;

    let summary = reconcile(extraction.orders(), extraction.deals(), &batch.records);
    println!("orders: {}", extraction.orders().len());
    println!("deals: {}", extraction.deals().len());
    println!("segments: {}", batch.records.len());
    println!("summary rows: {}", summary.len());

    let dir = csv_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| output_dir(config));
    let sink = CsvSinkAdapter::new(dir);
    write_tables(&sink, extraction.orders(), extraction.deals())?;
    print_written(&write_relation(&sink, &batch.records)?);
    print_written(&write_relation(&sink, &summary)?);

    if store {
        let store = open_store(config)?;
        store.upsert_orders(extraction.orders())?;
        store.upsert_deals(extraction.deals())?;
        store.replace_segments(&batch.records)?;
        store.replace_summary(&summary)?;
        println!("stored all relations");
    }
    Ok(())
}

fn run_validate(config: &FileConfigAdapter) -> Result<(), ReconError> {
    let has_store = config.get_string("store", "backend").is_some()
        || config.get_string("store", "path").is_some();
    validate_config(config, has_store)?;
    println!("config ok");
    Ok(())
}
