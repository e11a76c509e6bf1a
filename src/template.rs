use std::path::Path;

use serde::Serialize;
use tera::{Context, Tera};

use crate::config::ReportConfig;
use crate::data::model::{ColumnKind, Table, cell};
use crate::error::{ReportError, Result};
use crate::format::format_currency;

const BUNDLED_TEMPLATE: &str = include_str!("../templates/report.html");
const TEMPLATE_NAME: &str = "report.html";

/// Values substituted into the report template.
#[derive(Debug, Clone, Serialize)]
pub struct ReportContext {
    pub title: String,
    pub author: String,
    pub generated_at: String,
    pub kpi_total: String,
    pub kpi_average: String,
    pub kpi_top: String,
    /// Pre-rendered `<table>`; inserted without escaping.
    pub table_html: String,
    /// `file://` reference to the bar chart.
    pub bar_chart: String,
    /// `file://` reference to the weekly chart, empty when it was skipped.
    pub time_chart: String,
}

/// Read the configured template, or fall back to the bundled one.
pub fn load_template(config: &ReportConfig) -> Result<String> {
    match &config.template_path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| ReportError::Template(format!("{}: {e}", path.display()))),
        None => Ok(BUNDLED_TEMPLATE.to_string()),
    }
}

/// Render a Tera template with the report context.
///
/// The template uses Jinja2 syntax. `.html` autoescaping applies, so
/// free-text fields like author and title are escaped; `table_html` and the
/// chart references must be marked `| safe` in the template.
pub fn render_template(template_content: &str, context: &ReportContext) -> Result<String> {
    let mut tera = Tera::default();
    tera.add_raw_template(TEMPLATE_NAME, template_content)
        .map_err(|e| ReportError::Template(format!("parse error: {e}")))?;

    let context = Context::from_serialize(context)?;
    let rendered = tera.render(TEMPLATE_NAME, &context)?;
    Ok(rendered)
}

/// A `file://` reference for an image, or `""` when there is none.
pub fn file_reference(path: Option<&Path>) -> String {
    path.map(|p| format!("file://{}", p.display()))
        .unwrap_or_default()
}

/// HTML rendition of every row, shaped like
/// `DataFrame.to_html(index=False, classes="table-content")`.
///
/// Cells of float columns go through the currency formatter, everything else
/// is shown as loaded (escaped). Missing cells are blank.
pub fn table_to_html(table: &Table) -> String {
    let mut html = String::new();
    html.push_str("<table border=\"1\" class=\"dataframe table-content\">\n");
    html.push_str("  <thead>\n    <tr style=\"text-align: right;\">\n");
    for name in &table.column_names {
        html.push_str(&format!("      <th>{}</th>\n", tera::escape_html(name)));
    }
    html.push_str("    </tr>\n  </thead>\n  <tbody>\n");

    for row in &table.rows {
        html.push_str("    <tr>\n");
        for (name, kind) in table.column_names.iter().zip(&table.column_kinds) {
            let value = cell(row, name);
            let text = match (kind, value.as_f64()) {
                (ColumnKind::Float, Some(v)) => format_currency(v),
                _ => tera::escape_html(&value.to_string()),
            };
            html.push_str(&format!("      <td>{text}</td>\n"));
        }
        html.push_str("    </tr>\n");
    }

    html.push_str("  </tbody>\n</table>");
    html
}
