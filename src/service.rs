//! Upload-oriented entry point for a request/response front end.
//!
//! The front end (HTTP, mail, queue worker) is not part of this crate. It
//! hands over the uploaded bytes, streams [`GeneratedReport::bytes`] back to
//! its caller and then calls [`GeneratedReport::finish`] to reclaim disk.

use std::io::Write;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::cleanup::TempArtifacts;
use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::pipeline::{self, ReportOutcome, ReportRequest};

/// Extensions an upload may carry; anything else is rejected up front.
const UPLOAD_EXTENSIONS: &[&str] = &["csv", "xlsx", "xlsm", "xls", "xlsb", "ods", "parquet", "pq", "json"];

/// Runs the pipeline for uploaded files. Holds no per-request state, so one
/// instance can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct ReportService {
    config: ReportConfig,
}

/// A rendered report waiting to be delivered. Its input and output files are
/// deleted by [`finish`](Self::finish), or when it is dropped.
#[derive(Debug)]
pub struct GeneratedReport {
    pub id: Uuid,
    pub pdf_path: PathBuf,
    /// Suggested attachment / download file name.
    pub download_name: String,
    pub outcome: ReportOutcome,
    temps: TempArtifacts,
}

impl GeneratedReport {
    pub fn bytes(&self) -> &[u8] {
        &self.outcome.pdf
    }

    /// Delete the temp input and output. Never fails.
    pub fn finish(mut self) {
        let removed = self.temps.cleanup();
        log::debug!("report {} cleaned up {removed} file(s)", self.id);
    }
}

impl ReportService {
    pub fn new(config: ReportConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Persist `upload` as `temp_input_<id>.<ext>`, render
    /// `relatorio_<id>.pdf` next to it and hand both back for deferred
    /// cleanup. On failure the input copy is removed before returning.
    pub fn generate_from_upload(
        &self,
        upload: &[u8],
        file_name: &str,
        author: &str,
    ) -> Result<GeneratedReport> {
        let ext = upload_extension(file_name)?;
        let work_dir = pipeline::prepare_work_dir(&self.config.work_dir)?;
        let id = Uuid::new_v4();
        let input = work_dir.join(format!("temp_input_{id}.{ext}"));
        let output = work_dir.join(format!("relatorio_{id}.pdf"));

        let mut temps = TempArtifacts::new();
        write_new(&input, upload, &mut temps)?;
        temps.track(&output);

        log::info!("report {id}: {} byte upload '{file_name}' by {author}", upload.len());
        let request = ReportRequest::new(author);
        // temps drops on the error path and removes the input copy
        let outcome = pipeline::generate_report(&input, &output, &request, &self.config)?;

        Ok(GeneratedReport {
            id,
            pdf_path: output,
            download_name: format!("Relatorio_{author}.pdf"),
            outcome,
            temps,
        })
    }
}

fn upload_extension(file_name: &str) -> Result<String> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if UPLOAD_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(ReportError::DataFormat(format!(
            "unsupported upload '{file_name}'"
        )))
    }
}

fn write_new(path: &Path, bytes: &[u8], temps: &mut TempArtifacts) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    temps.track(path);
    file.write_all(bytes)?;
    Ok(())
}
