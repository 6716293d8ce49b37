// beantrack CLI - headless reports over the beneficiary dashboard data

mod exit_codes;
mod filters;
mod view;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use beantrack_config::{Settings, SettingsError};
use beantrack_engine::{
    catalog, query, EntityDataSource, EntityKind, ExportSpec, ReportError, ReportPlan, ReportQuery,
};
use beantrack_io::layout::{DocumentOptions, Margins, Orientation, PaperSize};
use beantrack_io::json::JsonDirSource;
use beantrack_io::{csv as csv_export, document, ExportError};
use beantrack_source::{HttpSource, DEFAULT_TIMEOUT};

use exit_codes::{EXIT_DATA_FETCH, EXIT_ERROR, EXIT_EXPORT, EXIT_OUTPUT, EXIT_SETTINGS, EXIT_SUCCESS, EXIT_USAGE};

const LOG_ENV: &str = "BEANTRACK_LOG";

#[derive(Parser)]
#[command(name = "beantrack")]
#[command(about = "Reports and exports for the coffee-program beneficiary dashboard")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a report and print it or export it to CSV/PDF
    #[command(after_help = "\
Examples:
  beantrack report --entity beneficiaries --filter gender=Female --format table
  beantrack report -e farm-plots --filter 'hectares>=1' --filter 'address=Malaybalay' -f csv -o exports/
  beantrack report -a ben_id,ben_fullname,farm_hectares -f pdf --orientation landscape --paper legal
  beantrack report -e activity-logs --from 2024-01-01 --to 2024-03-31 --search export -f json

Filters (single-entity reports only):
  key=value     text fragment, exact choice, or exact number
  key>=n        inclusive lower bound on a numeric key
  key<=n        inclusive upper bound on a numeric key
  --from/--to   inclusive date range over the entity's date fields

Selecting attributes from more than one entity produces a merged report:
every row of each involved entity, tagged by source. Filters do not apply to
merged reports; --search does.")]
    Report(ReportArgs),

    /// List exportable attributes
    #[command(after_help = "\
Examples:
  beantrack attributes
  beantrack attributes --entity crop-surveys
  beantrack attributes --json")]
    Attributes {
        /// Only attributes of this entity
        #[arg(long, short = 'e')]
        entity: Option<EntityKind>,

        /// Print as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// List paper size presets for --paper
    Papers,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Aligned text table on stdout
    Table,
    /// The export table as one JSON object on stdout
    Json,
    /// <name>_<date>.csv in --out
    Csv,
    /// <title>_<date>.pdf in --out
    Pdf,
}

#[derive(clap::Args)]
struct ReportArgs {
    /// Entity to report on when no attributes are selected
    /// (beneficiaries, farm-plots, seedlings, crop-surveys, activity-logs)
    #[arg(long, short = 'e', default_value = "beneficiaries")]
    entity: EntityKind,

    /// Attribute ids to include, comma-separated (see `beantrack attributes`)
    #[arg(long, short = 'a', value_delimiter = ',')]
    attributes: Vec<String>,

    /// Filter clause, repeatable: key=value, key>=n, key<=n
    #[arg(long = "filter", short = 'w')]
    filters: Vec<String>,

    /// Earliest date (inclusive), YYYY-MM-DD
    #[arg(long)]
    from: Option<String>,

    /// Latest date (inclusive), YYYY-MM-DD
    #[arg(long)]
    to: Option<String>,

    /// Case-insensitive text search over the entity's searchable fields
    #[arg(long, short = 's')]
    search: Option<String>,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "table")]
    format: OutputFormat,

    /// Directory for csv/pdf output (default: settings export.out_dir, then ".")
    #[arg(long, short = 'o')]
    out: Option<PathBuf>,

    /// Report name used for the CSV filename (default: entity label or "Merged Report")
    #[arg(long)]
    name: Option<String>,

    /// Document title, also the PDF filename stem (default: report name)
    #[arg(long)]
    title: Option<String>,

    /// portrait or landscape
    #[arg(long)]
    orientation: Option<Orientation>,

    /// Paper preset (see `beantrack papers`)
    #[arg(long)]
    paper: Option<PaperSize>,

    /// Document font size in points
    #[arg(long)]
    font_size: Option<f32>,

    /// Margins in mm: one value, or top,left,right,bottom
    #[arg(long)]
    margins: Option<Margins>,

    /// Directory of <entity>.json listings (takes precedence over --api-base)
    #[arg(long, env = "BEANTRACK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Dashboard API base URL
    #[arg(long, env = "BEANTRACK_API_BASE")]
    api_base: Option<String>,

    /// API bearer token
    #[arg(long, env = "BEANTRACK_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Suppress notes and warnings on stderr
    #[arg(long, short = 'q')]
    quiet: bool,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            // No subcommand = show usage
            eprintln!("Usage: beantrack <command> [options]");
            eprintln!("       beantrack --help for more information");
            Ok(())
        }
        Some(Commands::Report(args)) => cmd_report(args),
        Some(Commands::Attributes { entity, json }) => cmd_attributes(entity, json),
        Some(Commands::Papers) => cmd_papers(),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            log::debug!("exiting with {} ({})", code, exit_codes::describe(code));
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// stderr subscriber; `BEANTRACK_LOG` takes the usual env-filter syntax, default `warn`.
/// Library crates log through `log`, which the subscriber picks up.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn output(err: io::Error) -> Self {
        Self { code: EXIT_OUTPUT, message: format!("cannot write output: {}", err), hint: None }
    }

    pub fn settings(err: SettingsError) -> Self {
        let hint = beantrack_config::settings_path()
            .map(|p| format!("check {} (or set BEANTRACK_CONFIG)", p.display()));
        Self { code: EXIT_SETTINGS, message: err.to_string(), hint }
    }

    pub fn report(err: ReportError) -> Self {
        match err {
            ReportError::DataFetch(fetch) => Self {
                code: EXIT_DATA_FETCH,
                message: fetch.to_string(),
                hint: Some("check --data-dir / --api-base and that the data service is reachable".into()),
            },
        }
    }

    pub fn export(err: ExportError) -> Self {
        let hint = match &err {
            ExportError::MissingDir(_) => Some("create the directory or pass a different --out".to_string()),
            ExportError::Layout(_) => Some("use a smaller --font-size or --margins, or landscape".to_string()),
            _ => None,
        };
        Self { code: EXIT_EXPORT, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// report
// ============================================================================

fn cmd_report(args: ReportArgs) -> Result<(), CliError> {
    let settings = Settings::load().map_err(CliError::settings)?;

    let criteria = filters::build_criteria(&args.filters, args.from.as_deref(), args.to.as_deref())?;
    let query = ReportQuery::new(args.entity)
        .with_attributes(&args.attributes)
        .with_filters(criteria)
        .with_search(args.search.as_deref().unwrap_or(""));

    if !args.quiet {
        warn_about_ignored_input(&query);
    }

    let source = open_source(&args, &settings)?;
    let report = query::run(&query, source.as_ref()).map_err(CliError::report)?;
    let spec = ExportSpec::from_report(&report, &query.selected_attribute_ids, args.name.as_deref());

    match args.format {
        OutputFormat::Table => write_stdout(&view::render_table(&spec)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&spec)
                .map_err(|e| CliError::general(format!("cannot serialize report: {}", e)))?;
            write_stdout(&format!("{}\n", json))
        }
        OutputFormat::Csv => {
            let dir = out_dir(&args, &settings);
            let today = chrono::Local::now().date_naive();
            let written = csv_export::export(&spec, &dir, today).map_err(CliError::export)?;
            report_written(written, &args)
        }
        OutputFormat::Pdf => {
            let options = document_options(&args, &settings)?;
            let dir = out_dir(&args, &settings);
            let now = chrono::Local::now().naive_local();
            let written = document::export(&spec, &options, &dir, now).map_err(CliError::export)?;
            report_written(written, &args)
        }
    }
}

fn warn_about_ignored_input(query: &ReportQuery) {
    for id in &query.selected_attribute_ids {
        if catalog::lookup(id).is_none() {
            eprintln!("warning: unknown attribute {:?} ignored", id);
        }
    }
    match query.plan() {
        ReportPlan::Single(kind) => {
            for key in query.filters.unrecognised_keys(kind) {
                eprintln!("warning: filter {:?} does not apply to {} and was ignored", key, kind.slug());
            }
        }
        ReportPlan::Merged(_) if !query.filters.is_empty() => {
            eprintln!("warning: filters are ignored for merged reports");
        }
        ReportPlan::Merged(_) => {}
    }
}

/// `--data-dir` beats `--api-base`; flags beat settings.
fn open_source(args: &ReportArgs, settings: &Settings) -> Result<Box<dyn EntityDataSource>, CliError> {
    let source = &settings.source;
    if let Some(dir) = args.data_dir.clone().or_else(|| source.data_dir.clone()) {
        if !dir.is_dir() {
            return Err(CliError::args(format!("data directory not found: {}", dir.display())));
        }
        log::debug!("reading entity data from {}", dir.display());
        return Ok(Box::new(JsonDirSource::new(dir)));
    }

    if let Some(base) = args.api_base.clone().or_else(|| source.api_base.clone()) {
        let timeout = source.timeout_secs.map(Duration::from_secs).unwrap_or(DEFAULT_TIMEOUT);
        let mut http = HttpSource::new(&base, timeout).map_err(|e| CliError::general(e.to_string()))?;
        if let Some(token) = args.token.clone().or_else(|| source.token.clone()) {
            http = http.with_token(token);
        }
        log::debug!("fetching entity data from {}", http.api_base());
        return Ok(Box::new(http));
    }

    Err(CliError::args("no data source configured")
        .with_hint("pass --data-dir <dir> or --api-base <url>, or set [source] in settings.toml"))
}

fn out_dir(args: &ReportArgs, settings: &Settings) -> PathBuf {
    args.out
        .clone()
        .or_else(|| settings.export.out_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn document_options(args: &ReportArgs, settings: &Settings) -> Result<DocumentOptions, CliError> {
    let mut options = settings.document.to_options().map_err(CliError::settings)?;
    if let Some(orientation) = args.orientation {
        options.orientation = orientation;
    }
    if let Some(paper) = args.paper {
        options.paper = paper;
    }
    if let Some(margins) = args.margins {
        options.margins = margins;
    }
    if let Some(size) = args.font_size {
        if !(4.0..=24.0).contains(&size) {
            return Err(CliError::args(format!("--font-size must be between 4 and 24, got {}", size)));
        }
        options.font_size = size;
    }
    options.title = args.title.clone().or_else(|| args.name.clone());
    options
        .validate()
        .map_err(|e| CliError::args(e).with_hint("use smaller --margins or a larger --paper"))?;
    Ok(options)
}

fn report_written(written: Option<PathBuf>, args: &ReportArgs) -> Result<(), CliError> {
    match written {
        Some(path) => write_stdout(&format!("{}\n", path.display())),
        None => {
            if !args.quiet {
                eprintln!("note: no rows match; nothing exported");
            }
            Ok(())
        }
    }
}

fn write_stdout(text: &str) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes()).map_err(CliError::output)?;
    stdout.flush().map_err(CliError::output)
}

// ============================================================================
// attributes / papers
// ============================================================================

fn cmd_attributes(entity: Option<EntityKind>, json: bool) -> Result<(), CliError> {
    let attrs: Vec<_> = match entity {
        Some(kind) => catalog::attributes_of(kind),
        None => catalog::all().iter().collect(),
    };

    if json {
        let text = serde_json::to_string_pretty(&attrs)
            .map_err(|e| CliError::general(format!("cannot serialize catalog: {}", e)))?;
        return write_stdout(&format!("{}\n", text));
    }

    let id_width = attrs.iter().map(|a| a.id.len()).max().unwrap_or(0);
    let label_width = attrs.iter().map(|a| a.label.len()).max().unwrap_or(0);
    let mut out = String::new();
    for attr in attrs {
        out.push_str(&format!(
            "{:<id_width$}  {:<label_width$}  {}\n",
            attr.id,
            attr.label,
            attr.entity.slug(),
        ));
    }
    write_stdout(&out)
}

fn cmd_papers() -> Result<(), CliError> {
    let mut out = String::new();
    for paper in PaperSize::ALL {
        out.push_str(&format!("{:<7} {:>6.1} x {:>6.1} mm\n", paper.name, paper.width_mm, paper.height_mm));
    }
    out.push_str("(Folio is accepted as an alias for Long)\n");
    write_stdout(&out)
}
