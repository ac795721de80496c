//! Additive page rotation

use std::collections::BTreeMap;
use std::collections::btree_map;

use lopdf::Object;

use super::serialize;
use crate::document::{DocumentHandle, effective_rotation};
use crate::error::Result;

/// Per-page rotation deltas in degrees, normalized to `[0, 360)` on insert.
///
/// Only pages present in the map are touched; entries beyond the page count
/// are silently ignored by [`rotate_pages`].
#[derive(Clone, Debug, Default)]
pub struct RotationMap {
    deltas: BTreeMap<usize, i64>,
}

impl RotationMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a delta for `page` (0-indexed). Negative angles are accepted
    /// and normalized, so `-90` stores `270`.
    pub fn set(&mut self, page: usize, delta_degrees: i64) {
        self.deltas.insert(page, delta_degrees.rem_euclid(360));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, usize, i64> {
        self.deltas.iter()
    }
}

/// Apply each delta on top of the page's current rotation:
/// `(current + delta) mod 360`.
pub fn rotate_pages(handle: &DocumentHandle, rotations: &RotationMap) -> Result<Vec<u8>> {
    let mut doc = handle.doc().clone();
    for (&page, &delta) in rotations.iter() {
        let Some(&page_id) = handle.page_ids().get(page) else {
            log::debug!("rotation for page {page} beyond page count, ignoring");
            continue;
        };
        let current = effective_rotation(&doc, page_id);
        let next = (current + delta).rem_euclid(360);
        doc.get_object_mut(page_id)?
            .as_dict_mut()?
            .set("Rotate", Object::Integer(next));
    }
    serialize(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_normalizes_negative_angles() {
        let mut map = RotationMap::new();
        map.set(0, -90);
        map.set(1, 450);
        let deltas: Vec<(usize, i64)> = map.iter().map(|(&p, &d)| (p, d)).collect();
        assert_eq!(deltas, vec![(0, 270), (1, 90)]);
    }

    #[test]
    fn set_overwrites_previous_delta() {
        let mut map = RotationMap::new();
        map.set(2, 90);
        map.set(2, 180);
        assert_eq!(map.len(), 1);
        assert_eq!(map.iter().next(), Some((&2, &180)));
    }
}
