//! Loaded PDF document handle

use std::sync::Arc;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::{Error, Result};

/// Options controlling how raw bytes are parsed into a handle.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoadOptions {
    /// Accept encrypted documents instead of refusing them at load.
    pub ignore_encryption: bool,
}

/// Parsed, queryable view of one PDF plus the raw bytes it was loaded from.
///
/// A handle is immutable after creation: every edit goes through the editor
/// operations, which produce a fresh byte buffer and leave the source handle
/// valid and unchanged.
pub struct DocumentHandle {
    bytes: Arc<[u8]>,
    doc: Document,
    pages: Vec<ObjectId>,
}

impl DocumentHandle {
    /// Parse `bytes` into a handle. Loading is side-effect-free on the
    /// input; the same bytes can be loaded any number of times.
    pub fn load(bytes: impl Into<Arc<[u8]>>) -> Result<Self> {
        Self::load_with(bytes, LoadOptions::default())
    }

    /// Parse `bytes` with explicit [`LoadOptions`].
    pub fn load_with(bytes: impl Into<Arc<[u8]>>, options: LoadOptions) -> Result<Self> {
        let bytes = bytes.into();
        let doc = Document::load_mem(&bytes)?;
        if doc.is_encrypted() && !options.ignore_encryption {
            return Err(Error::Encrypted);
        }
        let pages = doc.get_pages().into_values().collect();
        Ok(Self { bytes, doc, pages })
    }

    /// Number of pages in the document.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The raw bytes this handle was loaded from.
    #[must_use]
    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    /// Width and height of page `index` (0-indexed) in points.
    pub fn page_size(&self, index: usize) -> Result<(f64, f64)> {
        let id = self.page_id(index)?;
        let (llx, lly, urx, ury) = effective_media_box(&self.doc, id)
            .ok_or_else(|| Error::Malformed(format!("page {index} has no MediaBox")))?;
        Ok((urx - llx, ury - lly))
    }

    /// Rotation of page `index` (0-indexed) in degrees, normalized to
    /// `[0, 360)`.
    pub fn page_rotation(&self, index: usize) -> Result<i64> {
        let id = self.page_id(index)?;
        Ok(effective_rotation(&self.doc, id).rem_euclid(360))
    }

    pub(crate) fn doc(&self) -> &Document {
        &self.doc
    }

    pub(crate) fn page_ids(&self) -> &[ObjectId] {
        &self.pages
    }

    pub(crate) fn page_id(&self, index: usize) -> Result<ObjectId> {
        self.pages.get(index).copied().ok_or(Error::PageIndex {
            index,
            page_count: self.pages.len(),
        })
    }
}

impl std::fmt::Debug for DocumentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentHandle")
            .field("byte_len", &self.bytes.len())
            .field("page_count", &self.pages.len())
            .finish_non_exhaustive()
    }
}

fn as_f64(n: &Object) -> Option<f64> {
    match n {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

/// Look up an inheritable page attribute, walking the Parent chain when the
/// page dictionary does not carry it directly.
pub(crate) fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut dict = doc.get_object(page_id).ok()?.as_dict().ok()?;
    loop {
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => {
                dict = doc.get_object(*parent_id).ok()?.as_dict().ok()?;
            }
            _ => return None,
        }
    }
}

/// MediaBox of a page as `(llx, lly, urx, ury)`, resolving inheritance.
pub(crate) fn effective_media_box(
    doc: &Document,
    page_id: ObjectId,
) -> Option<(f64, f64, f64, f64)> {
    let value = inherited_attribute(doc, page_id, b"MediaBox")?;
    let array = match value {
        Object::Array(a) => a,
        Object::Reference(id) => doc.get_object(*id).ok()?.as_array().ok()?,
        _ => return None,
    };
    if array.len() != 4 {
        return None;
    }
    Some((
        as_f64(&array[0])?,
        as_f64(&array[1])?,
        as_f64(&array[2])?,
        as_f64(&array[3])?,
    ))
}

/// Current /Rotate of a page in degrees (0 when absent), resolving
/// inheritance.
pub(crate) fn effective_rotation(doc: &Document, page_id: ObjectId) -> i64 {
    match inherited_attribute(doc, page_id, b"Rotate") {
        Some(Object::Integer(deg)) => *deg,
        _ => 0,
    }
}

/// Resources dictionary in effect for a page, resolving inheritance.
pub(crate) fn effective_resources(doc: &Document, page_id: ObjectId) -> Option<Dictionary> {
    match inherited_attribute(doc, page_id, b"Resources")? {
        Object::Dictionary(d) => Some(d.clone()),
        Object::Reference(id) => Some(doc.get_object(*id).ok()?.as_dict().ok()?.clone()),
        _ => None,
    }
}
