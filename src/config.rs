use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::color::parse_hex;
use crate::error::{ReportError, Result};

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

/// Names of the columns the report knows how to use.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ColumnNames {
    pub date: String,
    pub product: String,
    pub category: String,
    pub value: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            date: "Data".into(),
            product: "Produto".into(),
            category: "Categoria".into(),
            value: "Valor".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ReportConfig
// ---------------------------------------------------------------------------

/// Settings shared by every invocation. Built once at startup and passed by
/// reference into the pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Where temp charts, uploads and outputs live. Also the base directory
    /// for resolving image references during PDF conversion.
    pub work_dir: PathBuf,
    /// External HTML template; the bundled one is used when `None`.
    pub template_path: Option<PathBuf>,
    pub title: String,
    /// Drop every row that has a missing cell before aggregating.
    pub drop_missing: bool,
    /// How many categories the bar chart keeps.
    pub top_n: usize,
    /// Chart size in pixels (width, height).
    pub chart_size: (u32, u32),
    pub columns: ColumnNames,
    pub bar_color: String,
    pub line_color: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir(),
            template_path: None,
            title: "Relatório Executivo de Vendas".into(),
            drop_missing: false,
            top_n: 10,
            chart_size: (1000, 400),
            columns: ColumnNames::default(),
            bar_color: "#2c3e50".into(),
            line_color: "#27ae60".into(),
        }
    }
}

impl ReportConfig {
    /// Load a JSON config file. Missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ReportError::Config(format!("{}: {e}", path.display())))?;
        let config: ReportConfig = serde_json::from_str(&text)
            .map_err(|e| ReportError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(ReportError::Config("top_n must be at least 1".into()));
        }
        let (w, h) = self.chart_size;
        if w == 0 || h == 0 {
            return Err(ReportError::Config(format!("chart_size {w}x{h} is empty")));
        }
        parse_hex(&self.bar_color)?;
        parse_hex(&self.line_color)?;
        Ok(())
    }
}
