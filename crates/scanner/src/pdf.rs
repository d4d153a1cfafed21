use std::path::Path;

use lopdf::{Dictionary, Document, Object};

use crate::error::Result;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PdfMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub pages: i64,
}

/// Page count plus the optional `Title` / `Author` entries of the Info dictionary.
pub fn read_pdf(path: &Path) -> Result<PdfMetadata> {
    let doc = Document::load(path)?;
    let pages = doc.get_pages().len() as i64;

    let (title, author) = match info_dictionary(&doc) {
        Some(info) => (text_entry(info, b"Title"), text_entry(info, b"Author")),
        None => (None, None),
    };

    Ok(PdfMetadata {
        title,
        author,
        pages,
    })
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn text_entry(dict: &Dictionary, key: &[u8]) -> Option<String> {
    let text = match dict.get(key).ok()? {
        Object::String(data, _) => decode_text_string(data),
        Object::Name(data) => String::from_utf8_lossy(data).into_owned(),
        _ => return None,
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// PDF text strings are UTF-16BE when they start with a byte order mark,
/// PDFDocEncoding (close enough to Latin-1 for metadata) otherwise.
fn decode_text_string(data: &[u8]) -> String {
    if let Some(utf16) = data.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(data) {
        Ok(text) => text.to_string(),
        Err(_) => data.iter().map(|&byte| byte as char).collect(),
    }
}
