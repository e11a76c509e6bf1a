//! HTML → PDF conversion with `printpdf`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use printpdf::{Base64OrRaw, GeneratePdfOptions, PdfDocument, PdfSaveOptions};
use regex::Regex;

use crate::error::{ReportError, Result};

fn img_src_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)<img\b[^>]*?\ssrc\s*=\s*"([^"]*)""#).expect("static regex is valid")
    })
}

/// Every non-empty `<img src="...">` value, in document order, deduplicated.
pub fn image_references(html: &str) -> Vec<String> {
    let mut refs: Vec<String> = Vec::new();
    for caps in img_src_regex().captures_iter(html) {
        let src = caps[1].trim();
        if !src.is_empty() && !refs.iter().any(|r| r == src) {
            refs.push(src.to_string());
        }
    }
    refs
}

/// Where an image reference points on disk. `file://` URLs are taken as-is,
/// relative paths are resolved against `base_dir`.
pub fn resolve_reference(src: &str, base_dir: &Path) -> PathBuf {
    let raw = src.strip_prefix("file://").unwrap_or(src);
    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Load every image the HTML references, keyed by its `src` text.
/// A reference that cannot be read fails the whole render.
fn collect_images(html: &str, base_dir: &Path) -> Result<BTreeMap<String, Base64OrRaw>> {
    let mut images = BTreeMap::new();
    for src in image_references(html) {
        let path = resolve_reference(&src, base_dir);
        let bytes = std::fs::read(&path).map_err(|e| {
            ReportError::Render(format!("image '{src}' ({}): {e}", path.display()))
        })?;
        log::debug!("embedding {} ({} bytes)", path.display(), bytes.len());
        images.insert(src, Base64OrRaw::Raw(bytes));
    }
    Ok(images)
}

/// Convert the filled HTML to PDF bytes.
pub fn html_to_pdf(html: &str, base_dir: &Path) -> Result<Vec<u8>> {
    let images = collect_images(html, base_dir)?;
    let fonts = BTreeMap::new();
    let options = GeneratePdfOptions::default();
    let mut warnings = Vec::new();

    let doc = PdfDocument::from_html(html, &images, &fonts, &options, &mut warnings)
        .map_err(|e| ReportError::Render(format!("HTML layout failed: {e}")))?;
    for w in &warnings {
        log::debug!("pdf layout warning: {w:?}");
    }

    let mut save_warnings = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut save_warnings);
    for w in &save_warnings {
        log::debug!("pdf save warning: {w:?}");
    }
    if bytes.is_empty() {
        return Err(ReportError::Render("PDF writer produced no output".into()));
    }
    Ok(bytes)
}

/// Convert and write the PDF to `output`, returning the bytes as well.
pub fn render_pdf(html: &str, base_dir: &Path, output: &Path) -> Result<Vec<u8>> {
    let bytes = html_to_pdf(html, base_dir)?;
    std::fs::write(output, &bytes)
        .map_err(|e| ReportError::Render(format!("writing {}: {e}", output.display())))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_image_references() {
        let html = r#"<p>x</p><img class="chart" src="file:///tmp/a.png"><IMG SRC="b.png"/><img src=""><img src="file:///tmp/a.png">"#;
        assert_eq!(image_references(html), ["file:///tmp/a.png", "b.png"]);
    }

    #[test]
    fn resolves_relative_and_file_urls() {
        let base = Path::new("/srv/reports");
        assert_eq!(
            resolve_reference("file:///tmp/a.png", base),
            PathBuf::from("/tmp/a.png")
        );
        assert_eq!(
            resolve_reference("charts/b.png", base),
            PathBuf::from("/srv/reports/charts/b.png")
        );
    }

    #[test]
    fn missing_image_is_a_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let html = r#"<html><body><img src="gone.png"></body></html>"#;
        let err = html_to_pdf(html, dir.path()).unwrap_err();
        assert!(matches!(err, ReportError::Render(_)), "{err}");
    }
}
