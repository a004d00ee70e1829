//! Social-card compositor: per-event template + circular speaker avatars +
//! wrapped title + speaker names line.

use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;

use crate::avatars::AvatarCache;
use crate::error::CardError;
use crate::text::{speaker_names_line, text_width, wrap_text};

const TITLE_SCALE: f32 = 46.0;
const SUBTITLE_SCALE: f32 = 28.0;
const TITLE_LINE_HEIGHT: u32 = 80;
const TITLE_MAX_LINES: usize = 5;
const TITLE_X: i32 = 60;
// The title block is bottom-aligned so it ends at this baseline.
const TITLE_BLOCK_BOTTOM: u32 = 900;
const TEXT_SIDE_MARGIN: u32 = 80;

const AVATAR_MARGIN_X: u32 = 40;
const AVATAR_MARGIN_Y: u32 = 50;
const AVATAR_SPACING: u32 = 20;
const AVATAR_LIMIT: usize = 4;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Output encoding for generated cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardFormat {
    #[default]
    Webp,
    Jpeg,
}

impl CardFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Jpeg => "jpeg",
        }
    }
}

/// The subset of a speaker the card needs.
#[derive(Debug, Clone)]
pub struct CardSpeaker {
    pub name: String,
    pub avatar_url: Option<String>,
}

/// Renders social cards. Construction fails fast when the configured font is
/// missing or unreadable, since nothing can be measured or drawn without it.
pub struct CardGenerator {
    font: FontVec,
}

impl CardGenerator {
    pub fn new(font_path: Option<&Path>) -> Result<Self, CardError> {
        let path = font_path.ok_or(CardError::FontMissing { path: None })?;
        if !path.exists() {
            return Err(CardError::FontMissing {
                path: Some(path.to_path_buf()),
            });
        }
        let bytes = std::fs::read(path)?;
        let font = FontVec::try_from_vec(bytes).map_err(|_| CardError::FontInvalid {
            path: path.to_path_buf(),
        })?;
        Ok(Self { font })
    }

    /// Composes a card from the template at `template_path` and returns the
    /// encoded bytes. Avatars are resolved through `cache`, and any avatar
    /// that cannot be downloaded or decoded is skipped rather than failing
    /// the card.
    pub async fn generate(
        &self,
        template_path: &Path,
        title: &str,
        speakers: &[CardSpeaker],
        cache: &AvatarCache,
        client: &reqwest::Client,
        format: CardFormat,
    ) -> Result<Vec<u8>, CardError> {
        let template = image::open(template_path)
            .map_err(|source| CardError::Template {
                path: template_path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        let (width, height) = template.dimensions();

        // Flatten the template onto white so transparent regions encode cleanly.
        let mut canvas = RgbaImage::from_pixel(width, height, WHITE);
        image::imageops::overlay(&mut canvas, &template, 0, 0);

        let avatars = self.collect_avatars(speakers, cache, client).await;
        paste_avatars(&mut canvas, &avatars, height);

        self.draw_title(&mut canvas, title, width);
        self.draw_speaker_names(&mut canvas, speakers, height);

        encode(&canvas, format)
    }

    /// Default template location for an event: `<assets>/<slug>/talk_template.png`.
    #[must_use]
    pub fn template_path(assets_dir: &Path, event_slug: &str) -> PathBuf {
        assets_dir.join(event_slug).join("talk_template.png")
    }

    async fn collect_avatars(
        &self,
        speakers: &[CardSpeaker],
        cache: &AvatarCache,
        client: &reqwest::Client,
    ) -> Vec<DynamicImage> {
        let mut avatars = Vec::new();
        for speaker in speakers {
            let Some(url) = speaker.avatar_url.as_deref() else {
                continue;
            };
            let Some(bytes) = cache.fetch(client, url).await else {
                continue;
            };
            match image::load_from_memory(&bytes) {
                Ok(img) => avatars.push(img),
                Err(err) => {
                    tracing::warn!(url, error = %err, "skipping undecodable avatar");
                }
            }
            if avatars.len() >= AVATAR_LIMIT {
                break;
            }
        }
        avatars
    }

    fn draw_title(&self, canvas: &mut RgbaImage, title: &str, width: u32) {
        let scale = PxScale::from(TITLE_SCALE);
        #[allow(clippy::cast_precision_loss)]
        let max_width = width.saturating_sub(TEXT_SIDE_MARGIN) as f32;
        let lines = wrap_text(title, max_width, |s| text_width(&self.font, scale, s));
        let lines = &lines[..lines.len().min(TITLE_MAX_LINES)];

        #[allow(clippy::cast_possible_truncation)]
        let block_height = lines.len() as u32 * TITLE_LINE_HEIGHT;
        let mut y = TITLE_BLOCK_BOTTOM.saturating_sub(block_height);
        for line in lines {
            #[allow(clippy::cast_possible_wrap)]
            draw_text_mut(canvas, WHITE, TITLE_X, y as i32, scale, &self.font, line);
            y += TITLE_LINE_HEIGHT;
        }
    }

    fn draw_speaker_names(&self, canvas: &mut RgbaImage, speakers: &[CardSpeaker], height: u32) {
        let names: Vec<String> = speakers.iter().map(|s| s.name.clone()).collect();
        let line = speaker_names_line(&names);
        if line.is_empty() {
            return;
        }
        #[allow(clippy::cast_possible_wrap)]
        let y = height.saturating_sub(80) as i32;
        draw_text_mut(
            canvas,
            WHITE,
            TITLE_X,
            y,
            PxScale::from(SUBTITLE_SCALE),
            &self.font,
            &line,
        );
    }
}

/// Avatar size and grid column count for `count` avatars on a card of the
/// given height. One avatar fills half the card height; two share a wider
/// column pair; three or four form a 2x2 grid within the half-height area.
fn avatar_layout(count: usize, height: u32) -> (u32, u32) {
    let area_side = height / 2;
    match count {
        0 | 1 => (area_side, 1),
        2 => {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let area_width = (f64::from(height) * 0.7) as u32;
            (area_width.saturating_sub(AVATAR_SPACING) / 2, 2)
        }
        _ => (area_side.saturating_sub(AVATAR_SPACING) / 2, 2),
    }
}

fn paste_avatars(canvas: &mut RgbaImage, avatars: &[DynamicImage], height: u32) {
    let (size, cols) = avatar_layout(avatars.len(), height);
    for (idx, avatar) in avatars.iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let idx = idx as u32;
        let col = idx % cols;
        let row = idx / cols;
        let x = AVATAR_MARGIN_X + col * (size + AVATAR_SPACING);
        let y = AVATAR_MARGIN_Y + row * (size + AVATAR_SPACING);
        let circle = circular_avatar(avatar, size);
        image::imageops::overlay(canvas, &circle, i64::from(x), i64::from(y));
    }
}

/// Center-crops to a square, resizes, flattens transparency onto white, and
/// applies a circular alpha mask.
fn circular_avatar(avatar: &DynamicImage, size: u32) -> RgbaImage {
    let fitted = avatar.resize_to_fill(size, size, FilterType::Lanczos3).to_rgba8();

    let mut out = RgbaImage::from_pixel(size, size, WHITE);
    image::imageops::overlay(&mut out, &fitted, 0, 0);

    let radius = f64::from(size) / 2.0;
    let center = radius - 0.5;
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let dx = f64::from(x) - center;
        let dy = f64::from(y) - center;
        if dx * dx + dy * dy > radius * radius {
            pixel.0[3] = 0;
        }
    }
    out
}

fn encode(canvas: &RgbaImage, format: CardFormat) -> Result<Vec<u8>, CardError> {
    let rgb = DynamicImage::ImageRgba8(canvas.clone()).to_rgb8();
    match format {
        CardFormat::Webp => {
            let encoder = webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height());
            Ok(encoder.encode(82.0).to_vec())
        }
        CardFormat::Jpeg => {
            let mut buf = Vec::new();
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, 88);
            rgb.write_with_encoder(encoder)
                .map_err(|err| CardError::Encode {
                    format: "jpeg",
                    reason: err.to_string(),
                })?;
            Ok(buf)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_extensions_match_encoders() {
        assert_eq!(CardFormat::Webp.extension(), "webp");
        assert_eq!(CardFormat::Jpeg.extension(), "jpeg");
    }

    #[test]
    fn single_avatar_fills_half_the_height() {
        assert_eq!(avatar_layout(1, 1080), (540, 1));
        assert_eq!(avatar_layout(0, 1080), (540, 1));
    }

    #[test]
    fn two_avatars_share_a_wider_column_pair() {
        // 0.7 * 1080 = 756; (756 - 20) / 2 = 368.
        assert_eq!(avatar_layout(2, 1080), (368, 2));
    }

    #[test]
    fn three_or_four_avatars_form_a_two_by_two_grid() {
        // (540 - 20) / 2 = 260.
        assert_eq!(avatar_layout(3, 1080), (260, 2));
        assert_eq!(avatar_layout(4, 1080), (260, 2));
    }

    #[test]
    fn circular_mask_clears_corners_and_keeps_center() {
        let solid = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            64,
            64,
            Rgba([10, 20, 30, 255]),
        ));
        let circle = circular_avatar(&solid, 64);
        assert_eq!(circle.get_pixel(0, 0).0[3], 0);
        assert_eq!(circle.get_pixel(63, 63).0[3], 0);
        assert_eq!(circle.get_pixel(32, 32).0[3], 255);
    }

    #[test]
    fn unconfigured_font_is_rejected() {
        assert!(matches!(
            CardGenerator::new(None),
            Err(CardError::FontMissing { path: None })
        ));
    }

    #[test]
    fn missing_font_file_is_rejected() {
        let path = Path::new("/no/such/font.ttf");
        assert!(matches!(
            CardGenerator::new(Some(path)),
            Err(CardError::FontMissing { path: Some(_) })
        ));
    }

    #[test]
    fn invalid_font_file_is_rejected() {
        let path = std::env::temp_dir().join(format!(
            "talksync-not-a-font-{}.ttf",
            std::process::id()
        ));
        std::fs::write(&path, b"definitely not a font").unwrap();
        let result = CardGenerator::new(Some(&path));
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(CardError::FontInvalid { .. })));
    }

    #[test]
    fn template_path_is_per_event() {
        let path = CardGenerator::template_path(Path::new("assets/img"), "pycon-2026");
        assert_eq!(
            path,
            Path::new("assets/img/pycon-2026/talk_template.png")
        );
    }
}
