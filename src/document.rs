//! Document source: the single uploaded PDF of the session.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::pdf::PdfError;

/// Session-local reference to uploaded document bytes.
#[derive(Debug, Clone)]
pub struct DocumentHandle {
    id: String,
    name: Option<String>,
    bytes: Arc<[u8]>,
}

impl DocumentHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }
}

/// Holds at most one document; each upload replaces the previous one.
#[derive(Debug)]
pub struct DocumentSource {
    current: Option<DocumentHandle>,
    next_id: u32,
}

impl DocumentSource {
    pub fn new() -> Self {
        Self {
            current: None,
            next_id: 1,
        }
    }

    fn generate_id(&mut self) -> String {
        let current = self.next_id;
        self.next_id += 1;
        format!("doc_{}", current)
    }

    /// Take ownership of uploaded bytes, dropping any previous document.
    pub fn upload(&mut self, bytes: Vec<u8>, name: Option<String>) -> Result<DocumentHandle, PdfError> {
        if bytes.is_empty() {
            return Err(PdfError::UnsupportedInput("no file content".to_string()));
        }

        let handle = DocumentHandle {
            id: self.generate_id(),
            name,
            bytes: bytes.into(),
        };
        self.current = Some(handle.clone());
        Ok(handle)
    }

    pub fn current(&self) -> Option<&DocumentHandle> {
        self.current.as_ref()
    }

    pub fn is_current(&self, id: &str) -> bool {
        self.current.as_ref().map(|h| h.id == id).unwrap_or(false)
    }

    pub fn close(&mut self) -> Option<DocumentHandle> {
        self.current.take()
    }
}

impl Default for DocumentSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if a path looks like a PDF (extension check only).
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Turn a picker result into a filesystem path.
///
/// Accepts plain paths, `file://` URLs and percent-encoded paths (e.g. spaces
/// as %20).
pub fn resolve_pdf_path(input: &str) -> Result<PathBuf, PdfError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(PdfError::UnsupportedInput("no file chosen".to_string()));
    }

    let path = if input.starts_with("file://") {
        url::Url::parse(input)
            .ok()
            .and_then(|url| url.to_file_path().ok())
            .ok_or_else(|| PdfError::UnsupportedInput(format!("not a file URL: {}", input)))?
    } else {
        let plain = PathBuf::from(input);
        match urlencoding::decode(input) {
            Ok(decoded) if !plain.exists() && decoded != input => PathBuf::from(decoded.as_ref()),
            _ => plain,
        }
    };

    if !has_pdf_extension(&path) {
        return Err(PdfError::UnsupportedInput(format!(
            "not a PDF file: {}",
            path.display()
        )));
    }
    Ok(path)
}

/// Read a picked PDF from disk. Returns the bytes and the file name.
pub fn read_pdf_file(path: &Path) -> Result<(Vec<u8>, Option<String>), PdfError> {
    let bytes = std::fs::read(path)
        .map_err(|e| PdfError::UnsupportedInput(format!("{}: {}", path.display(), e)))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string());
    Ok((bytes, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_upload_is_rejected() {
        let mut source = DocumentSource::new();
        assert!(matches!(
            source.upload(Vec::new(), None),
            Err(PdfError::UnsupportedInput(_))
        ));
        assert!(source.current().is_none());
    }

    #[test]
    fn upload_replaces_previous_document() {
        let mut source = DocumentSource::new();
        let first = source.upload(b"%PDF one".to_vec(), Some("one.pdf".to_string())).unwrap();
        let second = source.upload(b"%PDF two".to_vec(), None).unwrap();

        assert_ne!(first.id(), second.id());
        assert!(!source.is_current(first.id()));
        assert!(source.is_current(second.id()));
        assert_eq!(&source.current().unwrap().bytes()[..], b"%PDF two");

        source.close();
        assert!(source.current().is_none());
        assert!(!source.is_current(second.id()));
    }

    #[test]
    fn test_resolve_file_url() {
        let path = resolve_pdf_path("file:///tmp/site%20plan.pdf").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/site plan.pdf"));
    }

    #[test]
    fn test_resolve_percent_encoded_path() {
        let path = resolve_pdf_path("/tmp/no-such-dir/site%20plan.pdf").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/no-such-dir/site plan.pdf"));
    }

    #[test]
    fn non_pdf_paths_are_rejected() {
        assert!(matches!(
            resolve_pdf_path("/tmp/photo.png"),
            Err(PdfError::UnsupportedInput(_))
        ));
        assert!(matches!(resolve_pdf_path("  "), Err(PdfError::UnsupportedInput(_))));
        assert!(has_pdf_extension(Path::new("PLAN.PDF")));
    }

    #[test]
    fn read_pdf_file_returns_bytes_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.pdf");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"%PDF-1.4")
            .unwrap();

        let (bytes, name) = read_pdf_file(&path).unwrap();
        assert_eq!(bytes, b"%PDF-1.4");
        assert_eq!(name.as_deref(), Some("plan.pdf"));

        assert!(matches!(
            read_pdf_file(&dir.path().join("missing.pdf")),
            Err(PdfError::UnsupportedInput(_))
        ));
    }
}
