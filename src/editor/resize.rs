//! Page resizing by embedding content onto a fresh target-size page

use std::collections::BTreeSet;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use super::{rebuild_page_tree, serialize};
use crate::document::{DocumentHandle, effective_media_box, effective_resources};
use crate::error::{Error, Result};

/// Name under which the wrapped source page is registered in the new page's
/// XObject resources.
const EMBED_NAME: &str = "Pg";

/// Target page dimensions in points with a contain-fit scale rule.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSizeTarget {
    width: f64,
    height: f64,
}

impl PageSizeTarget {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub const fn width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> f64 {
        self.height
    }

    /// Contain-fit scale for content of the given size: preserves aspect
    /// ratio and never upscales.
    #[must_use]
    pub fn scale_for(&self, orig_width: f64, orig_height: f64) -> f64 {
        (self.width / orig_width)
            .min(self.height / orig_height)
            .min(1.0)
    }

    /// Centering offsets for content already scaled by [`Self::scale_for`].
    #[must_use]
    pub fn offsets_for(&self, orig_width: f64, orig_height: f64) -> (f64, f64) {
        let scale = self.scale_for(orig_width, orig_height);
        (
            (self.width - orig_width * scale) / 2.0,
            (self.height - orig_height * scale) / 2.0,
        )
    }
}

/// Re-lay targeted pages onto blank pages of the target size: solid white
/// background, source content embedded as a Form XObject, scaled (never up)
/// and centered so nothing is cropped. Pages outside `target_indices` are
/// carried over unchanged; `None` targets every page.
pub fn resize_pages(
    handle: &DocumentHandle,
    target: PageSizeTarget,
    target_indices: Option<&BTreeSet<usize>>,
) -> Result<Vec<u8>> {
    let page_count = handle.page_count();
    if let Some(indices) = target_indices {
        for &index in indices {
            if index >= page_count {
                return Err(Error::PageIndex { index, page_count });
            }
        }
    }

    let mut doc = handle.doc().clone();
    let ids: Vec<ObjectId> = handle.page_ids().to_vec();
    rebuild_page_tree(&mut doc, &ids)?;

    for (index, &page_id) in ids.iter().enumerate() {
        let targeted = target_indices.is_none_or(|set| set.contains(&index));
        if targeted {
            embed_to_target(&mut doc, page_id, target)?;
        }
    }

    serialize(doc)
}

fn embed_to_target(doc: &mut Document, page_id: ObjectId, target: PageSizeTarget) -> Result<()> {
    let (llx, lly, urx, ury) = effective_media_box(doc, page_id)
        .ok_or_else(|| Error::Malformed("page has no MediaBox".into()))?;
    let orig_width = urx - llx;
    let orig_height = ury - lly;

    let scale = target.scale_for(orig_width, orig_height);
    let (offset_x, offset_y) = target.offsets_for(orig_width, orig_height);
    // translate so the source box's lower-left corner lands on the offset
    let tx = offset_x - scale * llx;
    let ty = offset_y - scale * lly;

    // Wrap the page's content streams into a Form XObject carrying the
    // page's resources; the form keeps the source coordinate system intact
    // behind its BBox.
    let content = page_content_bytes(doc, page_id)?;
    let mut form_dict = Dictionary::new();
    form_dict.set("Type", Object::Name(b"XObject".to_vec()));
    form_dict.set("Subtype", Object::Name(b"Form".to_vec()));
    form_dict.set("FormType", Object::Integer(1));
    form_dict.set(
        "BBox",
        Object::Array(vec![llx.into(), lly.into(), urx.into(), ury.into()]),
    );
    if let Some(resources) = effective_resources(doc, page_id) {
        form_dict.set("Resources", Object::Dictionary(resources));
    }
    let form_id = doc.add_object(Stream::new(form_dict, content));

    let ops = format!(
        "q\n1 1 1 rg\n0 0 {w:.3} {h:.3} re\nf\nQ\nq\n{s:.6} 0 0 {s:.6} {tx:.6} {ty:.6} cm\n/{EMBED_NAME} Do\nQ\n",
        w = target.width(),
        h = target.height(),
        s = scale,
    );
    let content_id = doc.add_object(Stream::new(Dictionary::new(), ops.into_bytes()));

    let mut xobjects = Dictionary::new();
    xobjects.set(EMBED_NAME, Object::Reference(form_id));
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Resources", Object::Dictionary(resources));
    page.set("Contents", Object::Reference(content_id));
    page.set(
        "MediaBox",
        Object::Array(vec![
            0.into(),
            0.into(),
            target.width().into(),
            target.height().into(),
        ]),
    );
    // geometry changed; stale boxes and rotation no longer apply
    page.remove(b"CropBox");
    page.remove(b"Rotate");
    Ok(())
}

/// Concatenated, decoded content of a page's stream(s).
fn page_content_bytes(doc: &Document, page_id: ObjectId) -> Result<Vec<u8>> {
    let mut streams: Vec<&Stream> = Vec::new();
    let page = doc.get_object(page_id)?.as_dict()?;
    if let Ok(contents) = page.get(b"Contents") {
        match contents {
            Object::Reference(id) => {
                streams.push(doc.get_object(*id)?.as_stream()?);
            }
            Object::Array(array) => {
                for entry in array {
                    if let Object::Reference(id) = entry {
                        streams.push(doc.get_object(*id)?.as_stream()?);
                    }
                }
            }
            Object::Stream(stream) => streams.push(stream),
            _ => {}
        }
    }

    let mut bytes = Vec::new();
    for stream in streams {
        match stream.decompressed_content() {
            Ok(content) => bytes.extend_from_slice(&content),
            Err(_) => bytes.extend_from_slice(&stream.content),
        }
        bytes.push(b'\n');
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const A4: PageSizeTarget = PageSizeTarget::new(595.28, 841.89);

    #[test]
    fn scale_never_exceeds_one() {
        // shrinking a Letter page onto A4 scales down
        let scale = A4.scale_for(612.0, 792.0);
        assert!(scale < 1.0);
        // small content is not upscaled
        assert_eq!(A4.scale_for(100.0, 100.0), 1.0);
    }

    #[test]
    fn scale_preserves_aspect_ratio() {
        let scale = A4.scale_for(612.0, 792.0);
        assert_eq!(scale, (595.28_f64 / 612.0).min(841.89 / 792.0));
    }

    #[test]
    fn offsets_center_content_within_target() {
        let (orig_w, orig_h) = (612.0, 792.0);
        let scale = A4.scale_for(orig_w, orig_h);
        let (offset_x, offset_y) = A4.offsets_for(orig_w, orig_h);
        assert!(offset_x >= 0.0 && offset_y >= 0.0);
        assert!(offset_x + orig_w * scale <= A4.width() + 1e-9);
        assert!(offset_y + orig_h * scale <= A4.height() + 1e-9);
        // centered: equal margins on both sides
        assert!((2.0 * offset_x + orig_w * scale - A4.width()).abs() < 1e-9);
        assert!((2.0 * offset_y + orig_h * scale - A4.height()).abs() < 1e-9);
    }
}
