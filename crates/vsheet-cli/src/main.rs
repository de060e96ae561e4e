//! vsheet CLI - export GHG inventory cycles into V-Sheet workbooks

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vsheet_core::CellRange;
use vsheet_export::{
    build_preview, run_validations, CanonicalBuilder, CanonicalCycleData, CompanyAdapter,
    DirectorySink, ExportJob, Exporter, FeatureOverrides, FileTemplateSource, JsonDirStore,
    NoopAdapter, SheetPreview, TemplateRegistry, TemplateSource, TemplateSpec,
};
use vsheet_xlsx::XlsxDocument;

const DEFAULT_TEMPLATE_ID: &str = "vsheet-standard";

#[derive(Parser)]
#[command(name = "vsheet")]
#[command(author, version, about = "Template-driven V-Sheet export tool")]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill a template workbook with a cycle's data
    Export {
        /// Template workbook (path, or URL with the `http` feature)
        #[arg(short, long)]
        template: String,

        /// Canonical cycle data as JSON
        #[arg(long, conflicts_with = "store", required_unless_present = "store")]
        data: Option<PathBuf>,

        /// Directory of persisted cycle documents
        #[arg(long, requires = "cycle")]
        store: Option<PathBuf>,

        /// Cycle id to load from the store
        #[arg(long)]
        cycle: Option<String>,

        /// Registered template id (a `::variant` suffix is ignored)
        #[arg(long, default_value = DEFAULT_TEMPLATE_ID)]
        template_id: String,

        /// Template spec JSON replacing the registered one
        #[arg(long)]
        spec: Option<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Output file name (default: <template-id>-<cycle>.xlsx)
        #[arg(short, long)]
        name: Option<String>,

        /// Feature flag override, e.g. `xlookup=true` (repeatable)
        #[arg(short, long = "feature", value_parser = parse_feature)]
        features: Vec<(String, bool)>,

        /// Do not require every sheet the spec declares
        #[arg(long)]
        no_required_check: bool,

        /// Exit with an error when any validation fails
        #[arg(long)]
        strict: bool,
    },

    /// Run a spec's validation rules against a workbook
    Validate {
        input: PathBuf,

        #[arg(long, default_value = DEFAULT_TEMPLATE_ID)]
        template_id: String,

        #[arg(long)]
        spec: Option<PathBuf>,
    },

    /// Show a range of a sheet
    Preview {
        input: PathBuf,

        #[arg(short, long)]
        sheet: String,

        /// Range such as A1:F20
        #[arg(short, long)]
        range: String,

        /// Print CSV instead of JSON
        #[arg(long)]
        csv: bool,
    },

    /// List all sheets in a workbook
    Sheets { input: PathBuf },

    /// List registered templates
    Templates,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Export {
            template,
            data,
            store,
            cycle,
            template_id,
            spec,
            out,
            name,
            features,
            no_required_check,
            strict,
        } => {
            let data = load_data(data.as_deref(), store.as_deref(), cycle.as_deref())?;
            let options = ExportOptions {
                template,
                template_id,
                spec,
                out,
                name,
                features,
                require_sheets: !no_required_check,
                strict,
            };
            export(&options, &data)
        }
        Commands::Validate {
            input,
            template_id,
            spec,
        } => validate(&input, &template_id, spec.as_deref()),
        Commands::Preview {
            input,
            sheet,
            range,
            csv,
        } => preview(&input, &sheet, &range, csv),
        Commands::Sheets { input } => list_sheets(&input),
        Commands::Templates => list_templates(),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

/// Parse `name=bool`
fn parse_feature(s: &str) -> Result<(String, bool), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=true|false, got {s:?}"))?;
    let value = match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        other => return Err(format!("invalid flag value {other:?}")),
    };
    Ok((name.trim().to_string(), value))
}

fn load_data(
    data: Option<&Path>,
    store: Option<&Path>,
    cycle: Option<&str>,
) -> Result<CanonicalCycleData> {
    match (data, store, cycle) {
        (Some(path), _, _) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read '{}'", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse canonical data '{}'", path.display()))
        }
        (None, Some(store), Some(cycle)) => CanonicalBuilder::build(&JsonDirStore::new(store), cycle)
            .with_context(|| format!("Failed to load cycle {cycle} from '{}'", store.display())),
        _ => bail!("either --data or --store with --cycle is required"),
    }
}

/// Spec and adapter for a template id, with an optional spec file
/// replacing the registered spec
fn resolve_template(
    template_id: &str,
    spec_path: Option<&Path>,
) -> Result<(TemplateSpec, Arc<dyn CompanyAdapter>)> {
    let registry = TemplateRegistry::builtin().context("Failed to load built-in templates")?;
    let spec = match spec_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read '{}'", path.display()))?;
            Some(TemplateSpec::from_json(&text).with_context(|| format!("Invalid spec '{}'", path.display()))?)
        }
        None => None,
    };

    let lookup_id = spec.as_ref().map_or(template_id, |s| s.template_id.as_str());
    match (registry.resolve(lookup_id), spec) {
        (Some(entry), Some(spec)) => Ok((spec, Arc::clone(&entry.adapter))),
        (Some(entry), None) => Ok((entry.spec.clone(), Arc::clone(&entry.adapter))),
        (None, Some(spec)) => {
            log::info!("no adapter registered for {}; declarative sections only", spec.template_id);
            let adapter: Arc<dyn CompanyAdapter> = Arc::new(NoopAdapter::new([spec.template_id.clone()]));
            Ok((spec, adapter))
        }
        (None, None) => bail!(
            "Unknown template '{template_id}' (registered: {})",
            registry.template_ids().join(", ")
        ),
    }
}

struct ExportOptions {
    template: String,
    template_id: String,
    spec: Option<PathBuf>,
    out: PathBuf,
    name: Option<String>,
    features: Vec<(String, bool)>,
    require_sheets: bool,
    strict: bool,
}

#[cfg(feature = "http")]
fn template_source(locator: &str) -> Result<Box<dyn TemplateSource>> {
    if locator.starts_with("http://") || locator.starts_with("https://") {
        let source =
            vsheet_export::HttpTemplateSource::new().context("Failed to build HTTP client")?;
        return Ok(Box::new(source));
    }
    Ok(Box::new(FileTemplateSource::new(".")))
}

#[cfg(not(feature = "http"))]
fn template_source(_locator: &str) -> Result<Box<dyn TemplateSource>> {
    Ok(Box::new(FileTemplateSource::new(".")))
}

fn export(options: &ExportOptions, data: &CanonicalCycleData) -> Result<()> {
    let (spec, adapter) = resolve_template(&options.template_id, options.spec.as_deref())?;

    let mut overrides = FeatureOverrides::default();
    for (name, value) in &options.features {
        if !overrides.set(name, *value) {
            bail!("Unknown feature flag '{name}'");
        }
    }

    let cycle = if data.cycle_id.is_empty() {
        "export"
    } else {
        data.cycle_id.as_str()
    };
    let name = options
        .name
        .clone()
        .unwrap_or_else(|| format!("{}-{cycle}.xlsx", spec.template_id));

    let mut job = ExportJob::new(&spec, adapter.as_ref(), data, name).with_feature_overrides(overrides);
    if options.require_sheets {
        job = job.requiring_spec_sheets();
    }

    let exporter = Exporter::new(DirectorySink::new(&options.out));
    let source = template_source(&options.template)?;
    let report = exporter
        .export_from_source(source.as_ref(), &options.template, job)
        .with_context(|| format!("Export of '{}' failed", options.template))?;

    let json = serde_json::to_string_pretty(&report).context("Failed to render report")?;
    println!("{json}");

    let failed = report.failures().count();
    if failed > 0 {
        eprintln!("{failed} validation(s) failed");
        if options.strict {
            bail!("{failed} validation(s) failed (--strict)");
        }
    }
    Ok(())
}

fn validate(input: &Path, template_id: &str, spec_path: Option<&Path>) -> Result<()> {
    let (spec, _) = resolve_template(template_id, spec_path)?;
    let doc = XlsxDocument::open(input)
        .with_context(|| format!("Failed to open '{}'", input.display()))?;

    let results = run_validations(&doc, &spec);
    let json = serde_json::to_string_pretty(&results).context("Failed to render results")?;
    println!("{json}");

    let failed = results.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        bail!("{failed} of {} validation(s) failed", results.len());
    }
    Ok(())
}

fn preview(input: &Path, sheet: &str, range: &str, csv: bool) -> Result<()> {
    let doc = XlsxDocument::open(input)
        .with_context(|| format!("Failed to open '{}'", input.display()))?;
    let range = CellRange::parse(range).with_context(|| format!("Invalid range '{range}'"))?;
    let worksheet = doc
        .worksheet(sheet)
        .with_context(|| format!("Sheet '{sheet}' not found"))?;

    let preview = build_preview(worksheet, &range);
    if csv {
        write_csv(&preview, io::stdout().lock())
    } else {
        let json = serde_json::to_string_pretty(&preview).context("Failed to render preview")?;
        println!("{json}");
        Ok(())
    }
}

/// Header row of column letters, then one line per row led by its number
fn write_csv<W: Write>(preview: &SheetPreview, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    let mut header = vec![String::new()];
    header.extend(preview.columns.iter().cloned());
    writer.write_record(&header)?;
    for row in &preview.rows {
        let mut record = vec![row.number.to_string()];
        record.extend(row.cells.iter().map(|cell| cell.display()));
        writer.write_record(&record)?;
    }
    writer.flush().context("Failed to write CSV")?;
    Ok(())
}

fn list_sheets(input: &Path) -> Result<()> {
    let doc = XlsxDocument::open(input)
        .with_context(|| format!("Failed to open '{}'", input.display()))?;

    for (i, name) in doc.sheet_names().iter().enumerate() {
        let formulas = doc
            .worksheet(name)
            .map_or(0, |ws| ws.formula_cells().count());
        println!("{i}\t{name}\t{formulas} formulas");
    }
    Ok(())
}

fn list_templates() -> Result<()> {
    let registry = TemplateRegistry::builtin().context("Failed to load built-in templates")?;
    for id in registry.template_ids() {
        if let Some(entry) = registry.resolve(id) {
            println!(
                "{id}\tv{}\t{}\t{}",
                entry.spec.version,
                entry.adapter.name(),
                entry.locator
            );
        }
    }
    Ok(())
}
