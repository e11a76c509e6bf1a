//! The report pipeline: load → aggregate → chart → template → PDF.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use crate::aggregate::{self, KpiSet};
use crate::chart;
use crate::cleanup::TempArtifacts;
use crate::config::ReportConfig;
use crate::data::filter;
use crate::data::loader;
use crate::data::model::{Table, TableSchema};
use crate::error::{ReportError, Result};
use crate::format::{format_currency, format_generated_at};
use crate::pdf;
use crate::state::{RunState, Stage};
use crate::template::{self, ReportContext};

/// Per-call inputs supplied by whoever asked for the report.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub author: String,
    /// Overrides `ReportConfig::title`.
    pub title: Option<String>,
    /// Timestamp printed in the header; now when `None`.
    pub generated_at: Option<NaiveDateTime>,
}

impl ReportRequest {
    pub fn new(author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            title: None,
            generated_at: None,
        }
    }
}

impl Default for ReportRequest {
    fn default() -> Self {
        Self::new("Sistema")
    }
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub output: PathBuf,
    pub pdf: Vec<u8>,
    pub kpis: KpiSet,
    pub schema: TableSchema,
    /// Rows that made it into the report.
    pub rows: usize,
    /// Rows removed by `drop_missing`.
    pub dropped_rows: usize,
    /// Whether the weekly chart was drawn.
    pub has_time_chart: bool,
}

/// Generate a PDF report for `input`, writing it to `output`.
///
/// Chart files live in `config.work_dir` only for the duration of the call;
/// they are removed on success and on failure.
pub fn generate_report(
    input: &Path,
    output: &Path,
    request: &ReportRequest,
    config: &ReportConfig,
) -> Result<ReportOutcome> {
    let mut run = RunState::new();
    let mut temps = TempArtifacts::new();

    let result = run_stages(&mut run, &mut temps, input, output, request, config);
    match &result {
        Ok(_) => run.advance(Stage::Done),
        Err(e) => run.fail(e),
    }
    let removed = temps.cleanup();
    log::debug!("cleanup removed {removed} temp file(s)");
    result
}

fn run_stages(
    run: &mut RunState,
    temps: &mut TempArtifacts,
    input: &Path,
    output: &Path,
    request: &ReportRequest,
    config: &ReportConfig,
) -> Result<ReportOutcome> {
    config.validate()?;

    // Loading
    let mut table = loader::load_file(input, &config.columns.date)?;
    let dropped_rows = if config.drop_missing {
        let n = filter::drop_missing(&mut table);
        log::info!("dropped {n} row(s) with missing values");
        n
    } else {
        0
    };

    run.advance(Stage::Aggregating);
    let schema = TableSchema::detect(&table, &config.columns);
    log::debug!("schema: {schema:?}");
    let aggregates = aggregate::aggregate(&table, &schema, &config.columns)?;

    run.advance(Stage::Charting);
    let work_dir = prepare_work_dir(&config.work_dir)?;
    let bar_chart = chart::render_bar_chart(&aggregates.category_totals, config, &work_dir, temps)?;
    let time_chart = match &aggregates.weekly_totals {
        Some(weeks) => Some(chart::render_line_chart(weeks, config, &work_dir, temps)?),
        None => {
            log::info!("no '{}' column, skipping weekly chart", config.columns.date);
            None
        }
    };

    run.advance(Stage::Templating);
    let context = ReportContext {
        title: request.title.clone().unwrap_or_else(|| config.title.clone()),
        author: request.author.clone(),
        generated_at: format_generated_at(
            request
                .generated_at
                .unwrap_or_else(|| Local::now().naive_local()),
        ),
        kpi_total: format_currency(aggregates.kpis.total),
        kpi_average: format_currency(aggregates.kpis.average),
        kpi_top: aggregates.kpis.top_entity.clone(),
        table_html: template::table_to_html(&table),
        bar_chart: template::file_reference(Some(bar_chart.as_path())),
        time_chart: template::file_reference(time_chart.as_deref()),
    };
    let html = template::render_template(&template::load_template(config)?, &context)?;

    run.advance(Stage::Rendering);
    let pdf = pdf::render_pdf(&html, &work_dir, output)?;
    log::info!("wrote {} ({} bytes)", output.display(), pdf.len());

    Ok(ReportOutcome {
        output: output.to_path_buf(),
        pdf,
        kpis: aggregates.kpis,
        schema,
        rows: table.len(),
        dropped_rows,
        has_time_chart: time_chart.is_some(),
    })
}

/// Make sure the work directory exists and return its absolute form, so the
/// chart references placed in the HTML are absolute.
pub fn prepare_work_dir(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    std::fs::canonicalize(dir).map_err(ReportError::from)
}

/// Load and aggregate without drawing anything; used by `--summary`.
pub fn summarize(input: &Path, config: &ReportConfig) -> Result<(Table, KpiSet)> {
    let mut table = loader::load_file(input, &config.columns.date)?;
    if config.drop_missing {
        filter::drop_missing(&mut table);
    }
    let schema = TableSchema::detect(&table, &config.columns);
    let aggregates = aggregate::aggregate(&table, &schema, &config.columns)?;
    Ok((table, aggregates.kpis))
}
