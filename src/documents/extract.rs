//! Upload persistence and text extraction.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::documents::errors::{DocumentError, DocumentResult};

const PDF_MAGIC: &[u8] = b"%PDF";
const TEXT_EXTENSIONS: [&str; 4] = ["txt", "md", "markdown", "csv"];

/// How an upload is turned into text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    /// Portable Document Format.
    Pdf,
    /// UTF-8 text.
    PlainText,
}

impl DocumentKind {
    /// Detect the kind from the file name, then from the content.
    #[must_use]
    pub fn detect(file_name: &str, bytes: &[u8]) -> Option<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("pdf") => return Some(Self::Pdf),
            Some(ext) if TEXT_EXTENSIONS.contains(&ext) => return Some(Self::PlainText),
            _ => {}
        }

        if bytes.starts_with(PDF_MAGIC) {
            Some(Self::Pdf)
        } else if std::str::from_utf8(bytes).is_ok() {
            Some(Self::PlainText)
        } else {
            None
        }
    }
}

/// Reduce a client-supplied file name to a safe single path component.
///
/// Directory parts are dropped and anything outside `[A-Za-z0-9._-]` becomes
/// `_`. Returns `None` when nothing usable is left.
#[must_use]
pub fn sanitize_file_name(file_name: &str) -> Option<String> {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let cleaned: String = base
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches(['.', '_']).to_string();

    if cleaned.is_empty() { None } else { Some(cleaned) }
}

/// Write the upload under `dir`, creating the directory if needed.
///
/// # Errors
/// Returns [`DocumentError::NoFileSelected`] for an unusable name, or an I/O
/// error if the file cannot be written.
pub async fn save_upload(dir: &Path, file_name: &str, bytes: &[u8]) -> DocumentResult<PathBuf> {
    let name = sanitize_file_name(file_name).ok_or(DocumentError::NoFileSelected)?;
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(name);
    tokio::fs::write(&path, bytes).await?;
    debug!("Saved upload to {}", path.display());
    Ok(path)
}

/// Extract the text of an upload.
///
/// PDF parsing runs on the blocking pool. A parser panic is reported as
/// [`DocumentError::Pdf`].
///
/// # Errors
/// Returns [`DocumentError::NoReadableText`] when nothing but whitespace is
/// recovered, or [`DocumentError::Pdf`] when the PDF cannot be parsed.
pub async fn extract_text(file_name: &str, bytes: Vec<u8>) -> DocumentResult<String> {
    let text = match DocumentKind::detect(file_name, &bytes) {
        Some(DocumentKind::Pdf) => tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| DocumentError::Pdf(e.to_string()))
        })
        .await
        .map_err(|e| DocumentError::Pdf(e.to_string()))??,
        Some(DocumentKind::PlainText) => String::from_utf8_lossy(&bytes).into_owned(),
        None => return Err(DocumentError::NoReadableText),
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(DocumentError::NoReadableText);
    }
    Ok(text.to_string())
}
