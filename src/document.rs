use crate::error::PageReadError;
use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Plain-text page separator produced by `pdftotext` and friends.
pub const PAGE_SEPARATOR: char = '\u{c}';

/// Read-only paginated text, shared by every request.
pub trait DocumentSource: Send + Sync {
    fn page_count(&self) -> usize;

    fn page_text(&self, index: usize) -> Result<String, PageReadError>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryDocument {
    pages: Vec<String>,
}

impl InMemoryDocument {
    pub fn from_pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pages: pages.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_text(raw: &str) -> Self {
        Self::from_pages(raw.split(PAGE_SEPARATOR))
    }
}

fn read_page(pages: &[String], index: usize) -> Result<String, PageReadError> {
    let page = pages.get(index).ok_or(PageReadError::OutOfRange {
        index,
        page_count: pages.len(),
    })?;
    if page.trim().is_empty() {
        return Err(PageReadError::NoText { index });
    }
    Ok(page.clone())
}

impl DocumentSource for InMemoryDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String, PageReadError> {
        read_page(&self.pages, index)
    }
}

/// A PDF whose text is extracted once, page by page, at load time.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    pages: Vec<String>,
}

impl PdfDocument {
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| anyhow::anyhow!("pdf text extraction failed: {e:?}"))?;
        Ok(Self { pages })
    }

    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
        Self::from_bytes(&bytes).with_context(|| format!("cannot parse {}", path.display()))
    }
}

impl DocumentSource for PdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String, PageReadError> {
        read_page(&self.pages, index)
    }
}

/// Opens the reference document, choosing the reader by file extension.
pub fn load_document(path: impl AsRef<Path>) -> anyhow::Result<Arc<dyn DocumentSource>> {
    let path = path.as_ref();
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    let document: Arc<dyn DocumentSource> = if is_pdf {
        Arc::new(PdfDocument::open(path)?)
    } else {
        let raw = std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
        Arc::new(InMemoryDocument::from_text(&raw))
    };
    info!("loaded reference document {} ({} pages)", path.display(), document.page_count());
    Ok(document)
}
