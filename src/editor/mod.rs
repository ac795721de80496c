//! Page-tree transformation operations
//!
//! Every operation reads one or more loaded handles and produces freshly
//! serialized bytes; the source handles stay valid and unchanged.

mod merge;
mod pages;
mod resize;
mod rotate;
mod split;

pub use merge::merge;
pub use pages::{delete_pages, reorder_pages};
pub use resize::{PageSizeTarget, resize_pages};
pub use rotate::{RotationMap, rotate_pages};
pub use split::{RangeSpec, split};

use lopdf::{Document, Object, ObjectId};

use crate::document::{DocumentHandle, inherited_attribute};
use crate::error::{Error, Result};

/// Inheritable page-tree attributes that must be materialized onto a page
/// before it is reparented into a flat tree.
const INHERITED_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Build a new document from `selection` (0-indexed pages of `handle`, in
/// order, duplicates allowed) and serialize it.
pub(crate) fn assemble(handle: &DocumentHandle, selection: &[usize]) -> Result<Vec<u8>> {
    let ids = selection
        .iter()
        .map(|&index| handle.page_id(index))
        .collect::<Result<Vec<_>>>()?;
    let mut doc = handle.doc().clone();
    rebuild_page_tree(&mut doc, &ids)?;
    serialize(doc)
}

/// Rewire `doc` so its root page tree is flat and lists exactly `selection`
/// as Kids, in order. Inherited attributes are materialized onto each page
/// first so nothing is lost when intermediate tree nodes get pruned.
pub(crate) fn rebuild_page_tree(doc: &mut Document, selection: &[ObjectId]) -> Result<()> {
    for &page_id in selection {
        flatten_inherited(doc, page_id)?;
    }

    let root_id = pages_root_id(doc)?;
    for &page_id in selection {
        doc.get_object_mut(page_id)?
            .as_dict_mut()?
            .set("Parent", Object::Reference(root_id));
    }

    let kids: Vec<Object> = selection.iter().map(|&id| Object::Reference(id)).collect();
    let count = selection.len() as i64;
    let root = doc.get_object_mut(root_id)?.as_dict_mut()?;
    root.set("Kids", Object::Array(kids));
    root.set("Count", Object::Integer(count));
    // pages are self-contained now; leftover tree-level attributes would
    // silently re-apply to every page
    for key in INHERITED_KEYS {
        root.remove(key);
    }
    Ok(())
}

/// Copy inherited attributes down onto the page dictionary when absent.
pub(crate) fn flatten_inherited(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let mut found: Vec<(&'static [u8], Object)> = Vec::new();
    for key in INHERITED_KEYS {
        let missing = doc.get_object(page_id)?.as_dict()?.get(key).is_err();
        if missing {
            if let Some(value) = inherited_attribute(doc, page_id, key) {
                found.push((key, value.clone()));
            }
        }
    }
    if found.is_empty() {
        return Ok(());
    }
    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    for (key, value) in found {
        page.set(key, value);
    }
    Ok(())
}

/// Object id of the root Pages node referenced by the catalog.
pub(crate) fn pages_root_id(doc: &Document) -> Result<ObjectId> {
    match doc.catalog()?.get(b"Pages")? {
        Object::Reference(id) => Ok(*id),
        _ => Err(Error::Malformed("catalog /Pages is not a reference".into())),
    }
}

/// Prune unreferenced objects, renumber, compress streams, and write out.
pub(crate) fn serialize(mut doc: Document) -> Result<Vec<u8>> {
    doc.prune_objects();
    doc.renumber_objects();
    doc.compress();
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}
