mod common;

use common::*;
use rusty_report::{ReportError, ReportService};

#[test]
fn upload_round_trip_and_deferred_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    let service = ReportService::new(config_in(dir.path())).unwrap();

    let report = service
        .generate_from_upload(SALES_CSV.as_bytes(), "vendas.csv", "Gabriel")
        .unwrap();

    assert_eq!(report.download_name, "Relatorio_Gabriel.pdf");
    assert_valid_pdf(report.bytes());
    // both temp files stay until the caller is done streaming
    assert_eq!(files_with_prefix(dir.path(), "temp_input_").len(), 1);
    assert!(report.pdf_path.exists());
    assert!(files_with_prefix(dir.path(), "chart_").is_empty());

    let pdf_path = report.pdf_path.clone();
    report.finish();
    assert!(files_with_prefix(dir.path(), "temp_input_").is_empty());
    assert!(!pdf_path.exists());
}

#[test]
fn xlsx_upload_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let service = ReportService::new(config_in(dir.path())).unwrap();
    let upload = std::fs::read(fixture("vendas.xlsx")).unwrap();

    let report = service
        .generate_from_upload(&upload, "vendas_mock.xlsx", "Gabriel")
        .unwrap();

    assert!(report.outcome.has_time_chart);
    assert_eq!(report.outcome.kpis.top_entity, "Monitor");
    assert_valid_pdf(report.bytes());
    report.finish();
    assert!(files_with_prefix(dir.path(), "temp_input_").is_empty());
}

#[test]
fn failed_upload_removes_input_copy() {
    let dir = tempfile::tempdir().unwrap();
    let service = ReportService::new(config_in(dir.path())).unwrap();

    let err = service
        .generate_from_upload(b"Categoria\nA\n", "vendas.csv", "Gabriel")
        .unwrap_err();

    assert!(matches!(err, ReportError::MissingColumn(_)), "{err}");
    assert!(files_with_prefix(dir.path(), "temp_input_").is_empty());
    assert!(files_with_prefix(dir.path(), "relatorio_").is_empty());
    assert!(files_with_prefix(dir.path(), "chart_").is_empty());
}

#[test]
fn unsupported_upload_is_rejected_before_touching_disk() {
    let dir = tempfile::tempdir().unwrap();
    let service = ReportService::new(config_in(dir.path())).unwrap();

    let err = service
        .generate_from_upload(b"MZ", "planilha.exe", "Gabriel")
        .unwrap_err();

    assert!(matches!(err, ReportError::DataFormat(_)));
    assert!(files_with_prefix(dir.path(), "").is_empty());
}

#[test]
fn concurrent_uploads_get_distinct_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let service = ReportService::new(config_in(dir.path())).unwrap();

    let reports: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let service = &service;
                scope.spawn(move || {
                    service
                        .generate_from_upload(SALES_CSV.as_bytes(), "vendas.csv", &format!("autor{i}"))
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(files_with_prefix(dir.path(), "relatorio_").len(), 4);
    for report in reports {
        assert_valid_pdf(report.bytes());
        report.finish();
    }
    assert!(files_with_prefix(dir.path(), "relatorio_").is_empty());
}
