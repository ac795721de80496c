//! Document concatenation

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId};

use super::{flatten_inherited, serialize};
use crate::document::DocumentHandle;
use crate::error::{Error, Result};

/// Concatenate `documents` in list order, appending all pages of each input
/// in their original order. Output page order is exactly input concatenation
/// order.
///
/// The engine accepts a single document (a plain rebuild); callers that
/// require at least two inputs enforce that policy themselves.
pub fn merge(documents: &[&DocumentHandle]) -> Result<Vec<u8>> {
    if documents.is_empty() {
        return Err(Error::EmptyInput);
    }

    let mut max_id = 1;
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut page_order: Vec<ObjectId> = Vec::new();

    for handle in documents {
        let mut donor = handle.doc().clone();
        donor.renumber_objects_with(max_id);
        max_id = donor.max_id + 1;

        let donor_pages: Vec<ObjectId> = donor.get_pages().into_values().collect();
        // materialize inherited attributes while the donor tree is intact
        for &page_id in &donor_pages {
            flatten_inherited(&mut donor, page_id)?;
        }
        page_order.extend(donor_pages);

        for (object_id, object) in donor.objects {
            // container nodes are rebuilt below; everything else carries over
            match object.type_name().unwrap_or(b"") {
                b"Catalog" | b"Pages" | b"Outlines" | b"Outline" => {}
                _ => {
                    objects.insert(object_id, object);
                }
            }
        }
    }

    let mut document = Document::with_version("1.5");
    document.objects = objects;
    document.max_id = max_id;

    let pages_id = document.new_object_id();
    for &page_id in &page_order {
        document
            .get_object_mut(page_id)?
            .as_dict_mut()?
            .set("Parent", Object::Reference(pages_id));
    }

    let kids: Vec<Object> = page_order.iter().map(|&id| Object::Reference(id)).collect();
    document.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(page_order.len() as i64)),
        ])),
    );

    let catalog_id = document.new_object_id();
    document.objects.insert(
        catalog_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ])),
    );
    document.trailer.set("Root", Object::Reference(catalog_id));

    log::info!(
        "merged {} documents into {} pages",
        documents.len(),
        page_order.len()
    );
    serialize(document)
}
