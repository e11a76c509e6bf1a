#![allow(dead_code)]

use std::path::{Path, PathBuf};

use rusty_report::ReportConfig;

/// The five-row sample the report was first built around.
pub const SALES_CSV: &str = "\
Data,Produto,Categoria,Valor
2023-01-01,Teclado,Periféricos,150.00
2023-01-02,Mouse,Periféricos,80.50
2023-01-03,Monitor,Telas,1200.00
2023-01-04,Cadeira,Móveis,850.00
2023-01-05,Headset,Áudio,250.00
";

pub const NO_DATE_CSV: &str = "\
Categoria,Valor
A,10.0
B,30.0
C,20.0
";

pub const EMPTY_CSV: &str = "Data,Produto,Categoria,Valor\n";

/// A committed input file under `tests/fixtures`.
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

pub fn write_input(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Config whose temp files land in `work_dir`.
pub fn config_in(work_dir: &Path) -> ReportConfig {
    ReportConfig {
        work_dir: work_dir.to_path_buf(),
        ..ReportConfig::default()
    }
}

/// Names of the files currently in `dir` that start with `prefix`.
pub fn files_with_prefix(dir: &Path, prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with(prefix))
        .collect();
    names.sort();
    names
}

/// Open the PDF with lopdf and return its page count.
pub fn assert_valid_pdf(bytes: &[u8]) -> usize {
    assert!(bytes.starts_with(b"%PDF-"), "missing PDF header");
    let doc = lopdf::Document::load_mem(bytes).expect("PDF should parse");
    let pages = doc.get_pages().len();
    assert!(pages >= 1, "PDF has no pages");
    pages
}
