//! PDF document-info extraction

use super::{PdfInfo, PdfInspector};
use crate::convert::clean_text;
use lopdf::{Document, Object};
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// [`PdfInspector`] backed by lopdf
///
/// Reads the `Title` entry of the trailer's `Info` dictionary and counts
/// pages. Many PDFs omit the title; those yield an empty string.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfInspector;

impl LopdfInspector {
    pub fn new() -> Self {
        Self
    }
}

impl PdfInspector for LopdfInspector {
    fn inspect(&self, bytes: &[u8]) -> PdfInfo {
        // lopdf can panic on corrupt cross-reference tables
        let loaded = panic::catch_unwind(AssertUnwindSafe(|| Document::load_mem(bytes)));

        match loaded {
            Ok(Ok(doc)) => PdfInfo {
                title: document_title(&doc).unwrap_or_default(),
                pages: Some(doc.get_pages().len()),
            },
            Ok(Err(e)) => {
                debug!(error = %e, "Unreadable PDF");
                PdfInfo::default()
            }
            Err(_) => {
                debug!("PDF parser panicked");
                PdfInfo::default()
            }
        }
    }
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn document_title(doc: &Document) -> Option<String> {
    let info = resolve(doc, doc.trailer.get(b"Info").ok()?)?;
    let dict = info.as_dict().ok()?;
    let title = resolve(doc, dict.get(b"Title").ok()?)?;

    match title {
        Object::String(bytes, _) => {
            let text = clean_text(&decode_text_string(bytes));
            if text.is_empty() {
                None
            } else {
                Some(text)
            }
        }
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE or UTF-8 with BOM, else PDFDocEncoding
///
/// PDFDocEncoding agrees with Latin-1 for printable characters, which is
/// close enough for a chat line.
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    bytes.iter().map(|&b| b as char).collect()
}
