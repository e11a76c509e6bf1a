//! Spreadsheet → PDF sales report.
//!
//! ```text
//!  loader ─▶ filter ─▶ aggregate ─▶ chart ─▶ template ─▶ pdf
//!                                     └──── cleanup ◀────┘
//! ```
//!
//! [`pipeline::generate_report`] runs one file end to end;
//! [`service::ReportService`] wraps it for uploads with deferred cleanup.

pub mod aggregate;
pub mod chart;
pub mod cleanup;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod format;
pub mod pdf;
pub mod pipeline;
pub mod service;
pub mod state;
pub mod template;

pub use config::ReportConfig;
pub use error::ReportError;
pub use pipeline::{ReportOutcome, ReportRequest, generate_report};
pub use service::{GeneratedReport, ReportService};
