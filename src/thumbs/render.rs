//! Thumbnail rasterization through the render engine

use std::io::Cursor;
use std::num::NonZeroUsize;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, RgbImage};
use lru::LruCache;
use mupdf::{Colorspace, Document, Matrix, Pixmap};

use super::cache::IdentityCache;
use crate::error::{Error, Result};

/// Render scale used by thumbnail strips when the caller has no opinion.
pub const DEFAULT_THUMBNAIL_SCALE: f32 = 0.4;

const THUMBNAIL_CACHE_SIZE: usize = 256;

/// A document parsed for rendering.
///
/// Parsing hands the render engine its own copy of the bytes, so however the
/// engine treats that buffer, the caller's original stays intact.
pub struct RenderView {
    doc: Document,
    page_count: usize,
}

impl RenderView {
    fn parse(bytes: &[u8]) -> Result<Self> {
        // independent copy: the render engine owns what it is given
        let copy = bytes.to_vec();
        let doc = Document::from_bytes(&copy, "application/pdf")
            .map_err(|e| Error::RenderOpen(e.to_string()))?;
        let page_count = doc
            .page_count()
            .map_err(|e| Error::RenderOpen(e.to_string()))? as usize;
        Ok(Self { doc, page_count })
    }

    /// Number of pages in the parsed view.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Rasterize 1-indexed `page_num` at `scale` into a PNG data URL.
    ///
    /// Failures are scoped to this call; the parsed view stays usable for
    /// every other page.
    pub fn render_thumbnail(&self, page_num: usize, scale: f32) -> Result<String> {
        if page_num == 0 || page_num > self.page_count {
            return Err(Error::Render {
                page: page_num,
                detail: format!("page out of range (document has {} pages)", self.page_count),
            });
        }
        let render_err = |e: mupdf::error::Error| Error::Render {
            page: page_num,
            detail: e.to_string(),
        };

        let page = self
            .doc
            .load_page((page_num - 1) as i32)
            .map_err(render_err)?;
        let matrix = Matrix::new_scale(scale, scale);
        let rgb = Colorspace::device_rgb();
        let pixmap = page.to_pixmap(&matrix, &rgb, false, false).map_err(render_err)?;

        let pixels = pixmap_to_rgb(&pixmap).map_err(|detail| Error::Render {
            page: page_num,
            detail,
        })?;
        let img = RgbImage::from_raw(pixmap.width(), pixmap.height(), pixels).ok_or_else(|| {
            Error::Render {
                page: page_num,
                detail: "pixel buffer does not match pixmap dimensions".into(),
            }
        })?;

        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| Error::Render {
                page: page_num,
                detail: e.to_string(),
            })?;

        Ok(format!("data:image/png;base64,{}", STANDARD.encode(&png)))
    }
}

/// Strip the pixmap down to tightly packed RGB rows.
fn pixmap_to_rgb(pixmap: &Pixmap) -> std::result::Result<Vec<u8>, String> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(format!("unsupported pixmap format: {n} channels"));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        return Err("pixmap buffer size mismatch".into());
    }

    let mut out = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let row_start = y * stride;
        let row = &samples[row_start..row_start + row_bytes];
        if n == 3 {
            out.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                out.extend_from_slice(&px[..3]);
            }
        }
    }
    Ok(out)
}

/// Cache key for encoded thumbnails (scale stored as millionths for stable
/// hashing).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ThumbKey {
    buffer: usize,
    page: usize,
    scale_millionths: u32,
}

impl ThumbKey {
    fn new(bytes: &Arc<[u8]>, page: usize, scale: f32) -> Self {
        Self {
            buffer: Arc::as_ptr(bytes).cast::<u8>() as usize,
            page,
            scale_millionths: (scale * 1_000_000.0) as u32,
        }
    }
}

/// Thumbnail pipeline: parse views memoized by buffer identity, encoded
/// thumbnails memoized in a bounded LRU.
pub struct Thumbnailer {
    views: IdentityCache<RenderView>,
    thumbnails: LruCache<ThumbKey, String>,
}

impl Thumbnailer {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(THUMBNAIL_CACHE_SIZE)
    }

    /// Create a thumbnailer whose encoded-thumbnail LRU holds `capacity`
    /// entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            views: IdentityCache::new(),
            thumbnails: LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or_else(|| NonZeroUsize::new(1).expect("1 is non-zero")),
            ),
        }
    }

    /// Parsed render view for `bytes`, memoized by buffer identity: the same
    /// buffer object is parsed once; content-identical but distinct buffers
    /// get independent parses.
    pub fn get_render_view(&mut self, bytes: &Arc<[u8]>) -> Result<&RenderView> {
        self.views
            .get_or_try_insert_with(bytes, || RenderView::parse(bytes))
            .map(|view| &*view)
    }

    /// Render 1-indexed `page_num` of `bytes` at `scale` into a PNG data
    /// URL, reusing the cached parse and any previously encoded thumbnail.
    pub fn render_page_thumbnail(
        &mut self,
        bytes: &Arc<[u8]>,
        page_num: usize,
        scale: f32,
    ) -> Result<String> {
        let key = ThumbKey::new(bytes, page_num, scale);
        if let Some(url) = self.thumbnails.get(&key) {
            return Ok(url.clone());
        }

        let view = self
            .views
            .get_or_try_insert_with(bytes, || RenderView::parse(bytes))?;
        let url = view.render_thumbnail(page_num, scale)?;
        self.thumbnails.put(key, url.clone());
        Ok(url)
    }
}

impl Default for Thumbnailer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thumb_key_distinguishes_scale_and_page() {
        let bytes: Arc<[u8]> = Arc::from(&b"doc"[..]);
        let base = ThumbKey::new(&bytes, 1, 0.4);
        assert_ne!(base, ThumbKey::new(&bytes, 2, 0.4));
        assert_ne!(base, ThumbKey::new(&bytes, 1, 0.5));
        assert_eq!(base, ThumbKey::new(&bytes, 1, 0.4));
    }

    #[test]
    fn parse_failure_is_isolated_to_render_open() {
        let result = RenderView::parse(b"not a pdf at all");
        assert!(matches!(result, Err(Error::RenderOpen(_))));
    }
}
