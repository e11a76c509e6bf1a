use thiserror::Error;

/// Every way a report invocation can fail. Each variant aborts the whole
/// pipeline; none are retried.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("could not read input data: {0}")]
    DataFormat(String),

    #[error("required column '{0}' is missing")]
    MissingColumn(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tera::Error> for ReportError {
    fn from(e: tera::Error) -> Self {
        // tera nests the interesting cause one level down
        let mut msg = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            msg.push_str(": ");
            msg.push_str(&cause.to_string());
            source = cause.source();
        }
        ReportError::Template(msg)
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
