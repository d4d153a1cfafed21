//! Generated covers for books that ship without one.

use std::fmt;
use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;

use crate::error::{Result, ScanError};

// roughly the 2:3 aspect of an ebook cover
const WIDTH: u32 = 400;
const HEIGHT: u32 = 600;

const BORDER_WIDTH: u32 = 8;
const RULE_INSET: u32 = 20;
const TEXT_LEFT: i32 = 40;
const AUTHOR_TOP: i32 = 50;
const LINE_HEIGHT: i32 = 42;

const MAX_LINE_CHARS: usize = 18;
const MAX_TITLE_LINES: usize = 6;
const MAX_AUTHOR_CHARS: usize = 35;

const BACKGROUND: Rgba<u8> = Rgba([250, 245, 235, 255]);
const BORDER: Rgba<u8> = Rgba([180, 160, 140, 255]);
const RULE: Rgba<u8> = Rgba([160, 140, 120, 255]);
const TITLE_INK: Rgba<u8> = Rgba([60, 50, 40, 255]);
const AUTHOR_INK: Rgba<u8> = Rgba([100, 90, 80, 255]);

/// Tried in order when no font is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Renders a framed cover with the title and author.
///
/// Without a font the cover is still produced, with the frame only.
#[derive(Clone, Default)]
pub struct PlaceholderCover {
    font: Option<FontArc>,
}

impl fmt::Debug for PlaceholderCover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaceholderCover")
            .field("has_font", &self.has_font())
            .finish()
    }
}

impl PlaceholderCover {
    pub fn new(font: Option<FontArc>) -> Self {
        Self { font }
    }

    pub fn from_font_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|err| ScanError::io(path, err))?;
        let font = FontArc::try_from_vec(bytes).map_err(|err| ScanError::Font {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Ok(Self::new(Some(font)))
    }

    /// Use `configured` when it loads, otherwise the first usable system font.
    pub fn discover(configured: Option<&Path>) -> Self {
        if let Some(path) = configured {
            match Self::from_font_file(path) {
                Ok(cover) => return cover,
                Err(err) => tracing::warn!(error = %err, "configured cover font is unusable"),
            }
        }

        for candidate in SYSTEM_FONTS.iter().map(Path::new) {
            if !candidate.is_file() {
                continue;
            }
            if let Ok(cover) = Self::from_font_file(candidate) {
                tracing::debug!(font = %candidate.display(), "placeholder cover font loaded");
                return cover;
            }
        }

        tracing::debug!("no cover font found; placeholder covers will carry no text");
        Self::new(None)
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// PNG bytes of a cover for `title` by `author`.
    pub fn render(&self, title: &str, author: &str) -> Result<Vec<u8>> {
        let mut img = RgbaImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);
        draw_frame(&mut img);

        if let Some(font) = &self.font {
            draw_text_mut(
                &mut img,
                AUTHOR_INK,
                TEXT_LEFT,
                AUTHOR_TOP,
                PxScale::from(22.0),
                font,
                &truncate(author, MAX_AUTHOR_CHARS),
            );

            let lines = wrap_title(title);
            let start_y = (HEIGHT as i32 - lines.len() as i32 * LINE_HEIGHT) / 2;
            for (idx, line) in lines.iter().enumerate() {
                draw_text_mut(
                    &mut img,
                    TITLE_INK,
                    TEXT_LEFT,
                    start_y + idx as i32 * LINE_HEIGHT,
                    PxScale::from(32.0),
                    font,
                    line,
                );
            }
        }

        let mut png = Vec::new();
        PngEncoder::new(&mut png).write_image(
            img.as_raw(),
            WIDTH,
            HEIGHT,
            ExtendedColorType::Rgba8,
        )?;
        Ok(png)
    }
}

fn draw_frame(img: &mut RgbaImage) {
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let in_border = x < BORDER_WIDTH
            || y < BORDER_WIDTH
            || x >= WIDTH - BORDER_WIDTH
            || y >= HEIGHT - BORDER_WIDTH;
        let inside_rule = (RULE_INSET..WIDTH - RULE_INSET).contains(&x)
            && (RULE_INSET..HEIGHT - RULE_INSET).contains(&y);
        let on_rule = inside_rule
            && (x == RULE_INSET
                || y == RULE_INSET
                || x == WIDTH - RULE_INSET - 1
                || y == HEIGHT - RULE_INSET - 1);

        if in_border {
            *pixel = BORDER;
        } else if on_rule {
            *pixel = RULE;
        }
    }
}

/// Greedy word wrap; overflowing titles end in an ellipsis.
fn wrap_title(title: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in title.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= MAX_LINE_CHARS {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if lines.len() > MAX_TITLE_LINES {
        lines.truncate(MAX_TITLE_LINES - 1);
        if let Some(last) = lines.last_mut() {
            let kept: String = last.chars().take(MAX_LINE_CHARS - 3).collect();
            *last = format!("{kept}...");
        }
    }
    lines
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars - 3).collect();
    format!("{kept}...")
}
