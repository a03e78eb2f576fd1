//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

use dokmerge_core::{
    run_batch, scan_placeholders, BatchReport, MergeConfig, OutputNamer, Progress,
    RowErrorPolicy,
};
use dokmerge_data::{open_source, RowSet};
use dokmerge_ooxml::Template;

/// What to do with a row that cannot be generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnError {
    /// Stop at the first failing row
    Abort,
    /// Report the row and continue with the next one
    Skip,
}

impl From<OnError> for RowErrorPolicy {
    fn from(value: OnError) -> Self {
        match value {
            OnError::Abort => RowErrorPolicy::Abort,
            OnError::Skip => RowErrorPolicy::Skip,
        }
    }
}

#[derive(Parser)]
#[command(name = "dokmerge")]
#[command(author, version, about = "Fill Word templates from spreadsheet rows", long_about = None)]
struct Cli {
    /// Show per-row detail
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one document per data row
    Merge(MergeArgs),

    /// List the {{placeholders}} a template contains
    Placeholders {
        /// Template DOTX/DOCX file
        #[arg(short, long)]
        template: PathBuf,

        /// Also look inside tables nested in table cells
        #[arg(long)]
        nested_tables: bool,
    },

    /// Show the sheets, columns and row count of a data file
    Inspect {
        /// Data file (xlsx, xls, ods, csv, tsv)
        #[arg(short, long)]
        data: PathBuf,

        /// Worksheet to read (default: first sheet)
        #[arg(short, long)]
        sheet: Option<String>,
    },
}

/// Arguments of the merge command
///
/// Flags left unset fall back to the configuration file, then to the
/// built-in defaults.
#[derive(Debug, Clone, Default, Args)]
pub struct MergeArgs {
    /// Template DOTX/DOCX file
    #[arg(short, long)]
    pub template: PathBuf,

    /// Data file (xlsx, xls, ods, csv, tsv)
    #[arg(short, long)]
    pub data: PathBuf,

    /// Worksheet to read (default: first sheet)
    #[arg(short, long)]
    pub sheet: Option<String>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// The two columns naming each output file, e.g. "id,name"
    #[arg(long, value_delimiter = ',')]
    pub name_fields: Option<Vec<String>>,

    /// Configuration file (default: ./dokmerge.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Failing row handling
    #[arg(long, value_enum)]
    pub on_error: Option<OnError>,

    /// Give replaced text the formatting of the paragraph's first run
    #[arg(long)]
    pub inherit_style: bool,

    /// Also fill tables nested in table cells
    #[arg(long)]
    pub nested_tables: bool,
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Merge(args) => {
            merge_command(&args)?;
        }
        Commands::Placeholders {
            template,
            nested_tables,
        } => {
            for name in placeholders_command(&template, nested_tables)? {
                println!("{}", name);
            }
        }
        Commands::Inspect { data, sheet } => {
            inspect_command(&data, sheet.as_deref())?;
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` adds to the default level
fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

/// Execute the merge command
pub fn merge_command(args: &MergeArgs) -> Result<BatchReport> {
    println!("dokmerge v{}", dokmerge_core::VERSION);
    println!("Merging: {}", args.template.display());

    let config = load_config(args)?;
    let options = {
        let mut options = config.batch_options();
        if let Some(dir) = &args.output {
            options.output_dir = dir.clone();
        }
        if let Some(fields) = &args.name_fields {
            let [id, name] = fields.as_slice() else {
                anyhow::bail!("--name-fields takes exactly two column names");
            };
            options.namer = OutputNamer::new(id, name).with_extension(&config.naming.extension);
        }
        if let Some(policy) = args.on_error {
            options.on_error = policy.into();
        }
        options.merge.inherit_run_style |= args.inherit_style;
        options.merge.nested_tables |= args.nested_tables;
        options
    };
    debug!("{:?}", options);

    let template = load_template(&args.template)?;
    let sheet = args.sheet.as_deref().or(config.data.sheet.as_deref());
    let rows = read_rows(&args.data, sheet)?;

    let report = run_batch(&template, &rows, &options, |progress| match progress {
        Progress::Generated { path, .. } => println!("  Created: {}", path.display()),
        Progress::Skipped { index, error } => {
            eprintln!("  Skipped row {}: {}", index + 1, error_chain(*error))
        }
        _ => {}
    })
    .with_context(|| format!("Failed to merge {}", args.data.display()))?;

    println!();
    println!(
        "Merge complete! {} document(s) in {}",
        report.generated.len(),
        options.output_dir.display()
    );
    if !report.is_complete() {
        anyhow::bail!("{} row(s) could not be generated", report.failed.len());
    }

    Ok(report)
}

/// Execute the placeholders command
pub fn placeholders_command(template: &Path, nested_tables: bool) -> Result<Vec<String>> {
    let template = load_template(template)?;
    Ok(scan_placeholders(template.document(), nested_tables)
        .into_iter()
        .collect())
}

/// Execute the inspect command
pub fn inspect_command(data: &Path, sheet: Option<&str>) -> Result<RowSet> {
    let source =
        open_source(data).with_context(|| format!("Failed to open data file: {}", data.display()))?;

    let sheets = source
        .list_sheets()
        .with_context(|| format!("Failed to list sheets: {}", data.display()))?;
    println!("Sheets: {}", sheets.join(", "));

    let rows = source
        .read_rows(sheet)
        .with_context(|| format!("Failed to read rows: {}", data.display()))?;
    let sheet = sheet
        .map(str::to_string)
        .or_else(|| source.default_sheet())
        .unwrap_or_default();

    println!("Sheet: {}", sheet);
    println!("Columns:");
    for header in rows.headers() {
        println!("  {}", header);
    }
    println!("Rows: {}", rows.len());

    Ok(rows)
}

fn load_config(args: &MergeArgs) -> Result<MergeConfig> {
    MergeConfig::discover(args.config.as_deref()).context("Failed to load configuration")
}

fn load_template(path: &Path) -> Result<Template> {
    if !path.exists() {
        anyhow::bail!("Template file not found: {}", path.display());
    }
    Template::load(path).with_context(|| format!("Failed to load template: {}", path.display()))
}

fn read_rows(path: &Path, sheet: Option<&str>) -> Result<RowSet> {
    if !path.exists() {
        anyhow::bail!("Data file not found: {}", path.display());
    }
    let source =
        open_source(path).with_context(|| format!("Failed to open data file: {}", path.display()))?;
    source
        .read_rows(sheet)
        .with_context(|| format!("Failed to read rows: {}", path.display()))
}

/// `error: cause: cause` on one line
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
