mod config;
mod flavor;
mod logging;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use seedsheet_core::{Error as CoreError, TypePolicy};
use seedsheet_export::{ExportError, ExportOptions, ScaffoldBuilder};
use seedsheet_import::{Flavor, ImportError, ImportOptions, SeedSourceGenerator};
use seedsheet_introspect::{EnumerateOptions, PostgresReader, SchemaReader, SnapshotReader};
use seedsheet_workbook::{read_xlsx, render_xlsx, Workbook, WorkbookError};
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use uuid::Uuid;

use config::{load_settings, ConfigError, Settings, TypeMappingKind};
use flavor::{parse_flavor, FlavorArg};
use logging::{init_logging, TracingObserver};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("export error: {0}")]
    Export(#[from] ExportError),
    #[error("import error: {0}")]
    Import(#[from] ImportError),
    #[error("workbook error: {0}")]
    Workbook(#[from] WorkbookError),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

#[derive(Parser, Debug)]
#[command(name = "seedsheet", version, about = "Schema to spreadsheet to seed data")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,
    /// Settings file (defaults to ./seedsheet.toml when present).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scaffold a workbook from a database schema.
    Export(ExportArgs),
    /// Generate seed-data source from filled-in workbooks.
    Import(ImportArgs),
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// PostgreSQL connection string.
    #[arg(long, value_name = "CONNECTION_STRING", conflicts_with = "snapshot")]
    conn: Option<String>,
    /// JSON file holding a table snapshot.
    #[arg(long, value_name = "PATH", required_unless_present = "conn")]
    snapshot: Option<PathBuf>,
    /// Workbook document to create or extend.
    #[arg(long, value_name = "PATH")]
    workbook: PathBuf,
    /// Also render the workbook as an .xlsx file.
    #[arg(long, value_name = "PATH")]
    xlsx: Option<PathBuf>,
    /// Schema name(s) to include.
    #[arg(long, value_name = "SCHEMA")]
    schema: Vec<String>,
    /// Seed for sheet-name suffixes.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// Namespace module of the generated source.
    #[arg(long = "ns", value_name = "NAMESPACE")]
    namespace: Option<String>,
    /// Output file for the generated source.
    #[arg(long, short = 'o', value_name = "PATH")]
    output: PathBuf,
    /// Workbook flavor as name=path; repeatable.
    #[arg(long, short = 'f', value_name = "NAME=PATH", value_parser = parse_flavor)]
    flavor: Vec<FlavorArg>,
    /// Fail on the first cell that cannot be converted.
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(cli.log_json).map_err(CliError::Logging)?;
    let settings = load_settings(cli.config.as_deref())?;

    let run_id = Uuid::new_v4().to_string();
    let started_at = chrono::Utc::now();
    let timer = Instant::now();
    tracing::info!(event = "run_started", run_id = %run_id, started_at = %started_at.to_rfc3339());

    let summary = match cli.command {
        Command::Export(args) => run_export(args, &settings).await?,
        Command::Import(args) => run_import(args, &settings)?,
    };

    tracing::info!(
        event = "run_finished",
        run_id = %run_id,
        duration_ms = timer.elapsed().as_millis() as u64
    );
    println!("{summary}");
    Ok(())
}

async fn run_export(args: ExportArgs, settings: &Settings) -> Result<String, CliError> {
    let ExportArgs {
        conn,
        snapshot,
        workbook,
        xlsx,
        schema,
        seed,
    } = args;

    let schemas = if schema.is_empty() {
        settings.export.schemas.clone()
    } else {
        schema
    };
    let enumerate = EnumerateOptions {
        schemas: if schemas.is_empty() { None } else { Some(schemas) },
        ..EnumerateOptions::default()
    };

    let default_kind = if conn.is_some() {
        TypeMappingKind::Postgres
    } else {
        TypeMappingKind::SqlServer
    };
    let mapping = settings
        .export
        .type_mapping
        .unwrap_or(default_kind)
        .mapping();

    let tables = match (conn, snapshot) {
        (Some(conn), None) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(10))
                .connect(&conn)
                .await?;
            let reader = PostgresReader::with_mapping(pool, mapping.clone());
            read_tables(&reader, &enumerate).await?
        }
        (None, Some(path)) => {
            let reader = SnapshotReader::with_mapping(path, mapping.clone());
            read_tables(&reader, &enumerate).await?
        }
        _ => {
            return Err(CliError::InvalidArgs(
                "use exactly one of --conn or --snapshot".to_string(),
            ));
        }
    };

    let mut document = open_workbook(&workbook)?;
    let options = ExportOptions {
        sheet_seed: seed
            .or(settings.export.sheet_seed)
            .unwrap_or(ExportOptions::default().sheet_seed),
    };
    let mut builder = ScaffoldBuilder::new(TypePolicy::new(mapping), &options);
    let mut observer = TracingObserver::default();
    let report = builder.export(&mut document, tables, &mut observer)?;

    document.save(&workbook)?;
    tracing::info!(
        event = "workbook_written",
        path = %workbook.display(),
        progress_events = observer.events()
    );
    if let Some(path) = &xlsx {
        render_xlsx(&document, path)?;
        tracing::info!(event = "xlsx_written", path = %path.display());
    }

    Ok(format!(
        "Exported {} table(s), skipped {}, {} unresolved reference(s) -> {}",
        report.exported.len(),
        report.skipped.len(),
        report.unresolved_references.len(),
        workbook.display()
    ))
}

async fn read_tables(
    reader: &dyn SchemaReader,
    options: &EnumerateOptions,
) -> Result<Vec<seedsheet_core::Table>, CliError> {
    tracing::info!(event = "schema_read_started", engine = reader.engine());
    let tables = reader.enumerate_tables(options).await?;
    tracing::info!(
        event = "schema_read_finished",
        engine = reader.engine(),
        tables = tables.len()
    );
    Ok(tables)
}

fn open_workbook(path: &Path) -> Result<Workbook, CliError> {
    if path.exists() {
        tracing::info!(event = "workbook_opened", path = %path.display());
        Ok(Workbook::load(path)?)
    } else {
        Ok(Workbook::new())
    }
}

/// `.xlsx` files go through the spreadsheet reader; anything else is the JSON
/// workbook document.
fn load_filled_workbook(path: &Path) -> Result<Workbook, CliError> {
    let is_xlsx = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
    if is_xlsx {
        Ok(read_xlsx(path)?)
    } else {
        Ok(Workbook::load(path)?)
    }
}

fn run_import(args: ImportArgs, settings: &Settings) -> Result<String, CliError> {
    let ImportArgs {
        namespace,
        output,
        flavor,
        strict,
    } = args;

    let namespace = namespace
        .or_else(|| settings.import.namespace.clone())
        .ok_or_else(|| CliError::InvalidArgs("--ns is required".to_string()))?;

    let flavor_args = if flavor.is_empty() {
        settings
            .import
            .flavors
            .iter()
            .map(|entry| FlavorArg {
                name: entry.name.clone(),
                path: entry.path.clone(),
            })
            .collect()
    } else {
        flavor
    };
    if flavor_args.is_empty() {
        return Err(CliError::InvalidArgs(
            "at least one --flavor name=path is required".to_string(),
        ));
    }

    let mut flavors = Vec::with_capacity(flavor_args.len());
    for FlavorArg { name, path } in flavor_args {
        let document = load_filled_workbook(&path)?;
        tracing::info!(event = "workbook_opened", flavor = %name, path = %path.display());
        flavors.push(Flavor::new(name, document));
    }

    let options = ImportOptions {
        strict: strict || settings.import.strict.unwrap_or(false),
    };
    let generator = SeedSourceGenerator::new(options)?;
    let mut observer = TracingObserver::default();
    let generated = generator.generate(&namespace, &flavors, &mut observer)?;

    for issue in &generated.issues {
        tracing::warn!(
            event = "import_issue",
            code = %issue.code,
            sheet = %issue.sheet,
            row = ?issue.row,
            column = ?issue.column,
            "{}",
            issue.message
        );
    }

    generated.write_to(&output)?;
    tracing::info!(
        event = "source_written",
        path = %output.display(),
        progress_events = observer.events()
    );

    Ok(format!(
        "Generated {} table function(s) for {} flavor(s), {} issue(s) -> {}",
        generated.tables,
        flavors.len(),
        generated.issues.len(),
        output.display()
    ))
}
