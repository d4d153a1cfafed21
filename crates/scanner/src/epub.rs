//! EPUB metadata and cover extraction.
//!
//! The package document is located through `META-INF/container.xml`. Title and
//! author come from the Dublin Core `title` / `creator` elements. The cover is
//! looked up in the manifest first, then through the guide's cover page, and
//! finally by guessing from the archive contents.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::{Result, ScanError};

const CONTAINER_PATH: &str = "META-INF/container.xml";
const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

#[derive(Debug, Default)]
pub struct EpubMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub cover: Option<CoverImage>,
}

/// Raw cover bytes plus the archive entry they were read from.
#[derive(Debug, Clone)]
pub struct CoverImage {
    pub entry: String,
    pub bytes: Vec<u8>,
}

impl CoverImage {
    /// Lowercase file extension of the source entry, `jpg` when it has none.
    pub fn extension(&self) -> String {
        Path::new(&self.entry)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_else(|| "jpg".to_string())
    }
}

#[derive(Debug)]
struct ManifestItem {
    id: String,
    href: String,
    properties: String,
}

#[derive(Debug, Default)]
struct Package {
    title: Option<String>,
    creator: Option<String>,
    cover_id: Option<String>,
    manifest: Vec<ManifestItem>,
    guide_cover: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum DcField {
    Title,
    Creator,
}

impl Package {
    fn visit(&mut self, element: &BytesStart) {
        match element.local_name().as_ref() {
            b"meta" => {
                if attribute(element, b"name").as_deref() == Some("cover") {
                    self.cover_id = attribute(element, b"content");
                }
            }
            b"item" => {
                if let Some(href) = attribute(element, b"href") {
                    self.manifest.push(ManifestItem {
                        id: attribute(element, b"id").unwrap_or_default(),
                        href,
                        properties: attribute(element, b"properties").unwrap_or_default(),
                    });
                }
            }
            b"reference" => {
                if self.guide_cover.is_none()
                    && attribute(element, b"type").as_deref() == Some("cover")
                {
                    self.guide_cover = attribute(element, b"href");
                }
            }
            _ => {}
        }
    }

    /// Archive path of the manifest image declared as, or named like, the cover.
    fn manifest_cover(&self, opf_path: &str) -> Option<String> {
        self.manifest
            .iter()
            .find(|item| {
                let declared = self.cover_id.as_deref() == Some(item.id.as_str());
                let named = item.id.to_lowercase().contains("cover")
                    || item.properties.to_lowercase().contains("cover");
                is_image(&item.href) && (declared || named)
            })
            .map(|item| resolve_href(opf_path, &item.href))
    }
}

/// Read title, author and cover from the EPUB at `path`.
///
/// Fails only when the file is not a readable zip archive. A missing or
/// malformed package document leaves title and author empty but still allows
/// the archive heuristics to find a cover.
pub fn read_epub(path: &Path) -> Result<EpubMetadata> {
    let file = File::open(path).map_err(|err| ScanError::io(path, err))?;
    let mut archive = ZipArchive::new(file)?;

    let package = match read_package(&mut archive) {
        Ok(found) => Some(found),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "EPUB package document unreadable");
            None
        }
    };

    let cover = find_cover(
        &mut archive,
        package.as_ref().map(|(opf_path, package)| (opf_path.as_str(), package)),
    );
    let (title, author) = match package {
        Some((_, package)) => (package.title, package.creator),
        None => (None, None),
    };

    Ok(EpubMetadata {
        title,
        author,
        cover,
    })
}

fn read_package<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<(String, Package)> {
    let container = read_entry_string(archive, CONTAINER_PATH)?;
    let opf_path = rootfile_path(&container)?;
    let opf = read_entry_string(archive, &opf_path)?;
    let package = parse_package(&opf, &opf_path)?;
    Ok((opf_path, package))
}

fn find_cover<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    package: Option<(&str, &Package)>,
) -> Option<CoverImage> {
    if let Some((opf_path, package)) = package {
        if let Some(entry) = package.manifest_cover(opf_path) {
            if let Some(cover) = read_image(archive, entry) {
                return Some(cover);
            }
        }
        if let Some(href) = &package.guide_cover {
            let page = resolve_href(opf_path, href);
            if let Some(cover) = guide_image(archive, &page).and_then(|e| read_image(archive, e)) {
                return Some(cover);
            }
        }
    }
    heuristic_cover(archive).and_then(|entry| read_image(archive, entry))
}

fn rootfile_path(container: &str) -> Result<String> {
    let mut reader = Reader::from_str(container);
    reader.trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"rootfile" {
                    if let Some(path) = attribute(e, b"full-path") {
                        return Ok(path);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(ScanError::xml(CONTAINER_PATH, err)),
            _ => {}
        }
        buf.clear();
    }
    Err(ScanError::MissingEntry("rootfile".to_string()))
}

fn parse_package(opf: &str, opf_path: &str) -> Result<Package> {
    let mut reader = Reader::from_str(opf);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut package = Package::default();
    let mut in_metadata = false;
    let mut capture: Option<DcField> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"metadata" => in_metadata = true,
                b"title" if in_metadata && package.title.is_none() => {
                    capture = Some(DcField::Title)
                }
                b"creator" if in_metadata && package.creator.is_none() => {
                    capture = Some(DcField::Creator)
                }
                _ => package.visit(e),
            },
            Ok(Event::Empty(ref e)) => package.visit(e),
            Ok(Event::Text(ref t)) => {
                if let Some(field) = capture {
                    let text = t.unescape().map_err(|err| ScanError::xml(opf_path, err))?;
                    let text = text.trim();
                    if !text.is_empty() {
                        match field {
                            DcField::Title => package.title = Some(text.to_string()),
                            DcField::Creator => package.creator = Some(text.to_string()),
                        }
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == b"metadata" {
                    in_metadata = false;
                }
                capture = None;
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(ScanError::xml(opf_path, err)),
            _ => {}
        }
        buf.clear();
    }

    Ok(package)
}

/// First image referenced by the cover page at `page`: `<img src>` or an SVG
/// `<image href>`.
fn guide_image<R: Read + Seek>(archive: &mut ZipArchive<R>, page: &str) -> Option<String> {
    let markup = read_entry_string(archive, page).ok()?;
    let mut reader = Reader::from_str(&markup);
    reader.trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                let src = match e.local_name().as_ref() {
                    b"img" => attribute(e, b"src"),
                    b"image" => attribute(e, b"href"),
                    _ => None,
                };
                if let Some(src) = src {
                    return Some(resolve_href(page, &src));
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
        buf.clear();
    }
}

/// An image with `cover` in its name, otherwise the largest image.
fn heuristic_cover<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Option<String> {
    let mut largest: Option<(u64, String)> = None;
    for index in 0..archive.len() {
        let Ok(entry) = archive.by_index(index) else {
            continue;
        };
        let name = entry.name().to_string();
        if !is_image(&name) {
            continue;
        }
        if name.to_lowercase().contains("cover") {
            return Some(name);
        }
        if largest.as_ref().map_or(true, |(size, _)| entry.size() > *size) {
            largest = Some((entry.size(), name));
        }
    }
    largest.map(|(_, name)| name)
}

fn read_image<R: Read + Seek>(archive: &mut ZipArchive<R>, entry: String) -> Option<CoverImage> {
    match read_entry_bytes(archive, &entry) {
        Ok(bytes) if !bytes.is_empty() => Some(CoverImage { entry, bytes }),
        Ok(_) => None,
        Err(err) => {
            tracing::debug!(entry = %entry, error = %err, "cover candidate unreadable");
            None
        }
    }
}

fn read_entry_bytes<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Vec<u8>> {
    let mut entry = archive
        .by_name(name)
        .map_err(|_| ScanError::MissingEntry(name.to_string()))?;
    let mut bytes = Vec::new();
    entry
        .read_to_end(&mut bytes)
        .map_err(|err| ScanError::io(name, err))?;
    Ok(bytes)
}

fn read_entry_string<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    let bytes = read_entry_bytes(archive, name)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn attribute(element: &BytesStart, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok().map(|value| value.into_owned()))
}

fn is_image(name: &str) -> bool {
    let lower = name.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Resolve `href` relative to the directory of the archive entry `base`,
/// dropping any fragment and collapsing `.` / `..` segments.
fn resolve_href(base: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or_default();
    let dir = base.rfind('/').map_or("", |idx| &base[..idx]);
    let mut parts: Vec<&str> = Vec::new();
    for segment in dir.split('/').chain(href.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            segment => parts.push(segment),
        }
    }
    parts.join("/")
}
